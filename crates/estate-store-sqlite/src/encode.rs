//! Encoding and decoding helpers between Rust domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! Timestamps are stored as fixed-width RFC 3339 strings (nanosecond
//! precision, `Z` suffix) so that string order is time order. Enumerations
//! use their snake_case names. UUIDs are stored as hyphenated lowercase
//! strings.

use std::str::FromStr;

use chrono::{DateTime, SecondsFormat, Utc};
use estate_core::{
  asset::{Asset, MaintenanceSchedule},
  directory::{Property, User},
  history::{HistoryAction, HistoryEntry},
};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Uuid ────────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

fn decode_opt_uuid(s: Option<String>) -> Result<Option<Uuid>> {
  s.as_deref().map(decode_uuid).transpose()
}

// ─── DateTime<Utc> ───────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String {
  dt.to_rfc3339_opts(SecondsFormat::Nanos, true)
}

pub fn encode_opt_dt(dt: Option<DateTime<Utc>>) -> Option<String> { dt.map(encode_dt) }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

fn decode_opt_dt(s: Option<String>) -> Result<Option<DateTime<Utc>>> {
  s.as_deref().map(decode_dt).transpose()
}

// ─── Enumerations ────────────────────────────────────────────────────────────

pub fn decode_enum<T: FromStr>(column: &'static str, s: &str) -> Result<T> {
  s.parse()
    .map_err(|_| Error::UnknownVariant { column, value: s.to_owned() })
}

// ─── Property ids ────────────────────────────────────────────────────────────

pub fn encode_ids(ids: &[Uuid]) -> Result<String> { Ok(serde_json::to_string(ids)?) }

pub fn decode_ids(s: &str) -> Result<Vec<Uuid>> { Ok(serde_json::from_str(s)?) }

// ─── Row types ───────────────────────────────────────────────────────────────

/// Column list matching [`RawAsset::from_row`].
pub const ASSET_COLUMNS: &str = "asset_id, property_id, asset_tag, name, description,
  category, subcategory, brand, model, serial_number, purchase_date,
  purchase_price, current_value, condition, status, location, assigned_to,
  assigned_at, maintenance_interval_days, last_maintenance, next_maintenance,
  warranty_expiry, created_at, updated_at";

/// Raw values read directly from an `assets` row.
pub struct RawAsset {
  pub asset_id:                  String,
  pub property_id:               String,
  pub asset_tag:                 String,
  pub name:                      String,
  pub description:               String,
  pub category:                  String,
  pub subcategory:               Option<String>,
  pub brand:                     Option<String>,
  pub model:                     Option<String>,
  pub serial_number:             Option<String>,
  pub purchase_date:             Option<String>,
  pub purchase_price:            Option<f64>,
  pub current_value:             Option<f64>,
  pub condition:                 String,
  pub status:                    String,
  pub location:                  String,
  pub assigned_to:               Option<String>,
  pub assigned_at:               Option<String>,
  pub maintenance_interval_days: Option<u32>,
  pub last_maintenance:          Option<String>,
  pub next_maintenance:          Option<String>,
  pub warranty_expiry:           Option<String>,
  pub created_at:                String,
  pub updated_at:                String,
}

impl RawAsset {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      asset_id:                  row.get(0)?,
      property_id:               row.get(1)?,
      asset_tag:                 row.get(2)?,
      name:                      row.get(3)?,
      description:               row.get(4)?,
      category:                  row.get(5)?,
      subcategory:               row.get(6)?,
      brand:                     row.get(7)?,
      model:                     row.get(8)?,
      serial_number:             row.get(9)?,
      purchase_date:             row.get(10)?,
      purchase_price:            row.get(11)?,
      current_value:             row.get(12)?,
      condition:                 row.get(13)?,
      status:                    row.get(14)?,
      location:                  row.get(15)?,
      assigned_to:               row.get(16)?,
      assigned_at:               row.get(17)?,
      maintenance_interval_days: row.get(18)?,
      last_maintenance:          row.get(19)?,
      next_maintenance:          row.get(20)?,
      warranty_expiry:           row.get(21)?,
      created_at:                row.get(22)?,
      updated_at:                row.get(23)?,
    })
  }

  pub fn encode(asset: &Asset) -> Self {
    let schedule = asset.maintenance_schedule.as_ref();
    Self {
      asset_id:                  encode_uuid(asset.asset_id),
      property_id:               encode_uuid(asset.property_id),
      asset_tag:                 asset.asset_tag.clone(),
      name:                      asset.name.clone(),
      description:               asset.description.clone(),
      category:                  asset.category.as_ref().to_owned(),
      subcategory:               asset.subcategory.clone(),
      brand:                     asset.brand.clone(),
      model:                     asset.model.clone(),
      serial_number:             asset.serial_number.clone(),
      purchase_date:             encode_opt_dt(asset.purchase_date),
      purchase_price:            asset.purchase_price,
      current_value:             asset.current_value,
      condition:                 asset.condition.as_ref().to_owned(),
      status:                    asset.status.as_ref().to_owned(),
      location:                  asset.location.clone(),
      assigned_to:               asset.assigned_to.map(encode_uuid),
      assigned_at:               encode_opt_dt(asset.assigned_at),
      maintenance_interval_days: schedule.map(|s| s.interval_days),
      last_maintenance:          encode_opt_dt(schedule.and_then(|s| s.last_maintenance)),
      next_maintenance:          encode_opt_dt(schedule.and_then(|s| s.next_maintenance)),
      warranty_expiry:           encode_opt_dt(asset.warranty_expiry),
      created_at:                encode_dt(asset.created_at),
      updated_at:                encode_dt(asset.updated_at),
    }
  }

  pub fn into_asset(self) -> Result<Asset> {
    let maintenance_schedule = match self.maintenance_interval_days {
      Some(interval_days) => Some(MaintenanceSchedule {
        interval_days,
        last_maintenance: decode_opt_dt(self.last_maintenance)?,
        next_maintenance: decode_opt_dt(self.next_maintenance)?,
      }),
      None => None,
    };

    Ok(Asset {
      asset_id: decode_uuid(&self.asset_id)?,
      property_id: decode_uuid(&self.property_id)?,
      asset_tag: self.asset_tag,
      name: self.name,
      description: self.description,
      category: decode_enum("category", &self.category)?,
      subcategory: self.subcategory,
      brand: self.brand,
      model: self.model,
      serial_number: self.serial_number,
      purchase_date: decode_opt_dt(self.purchase_date)?,
      purchase_price: self.purchase_price,
      current_value: self.current_value,
      condition: decode_enum("condition", &self.condition)?,
      status: decode_enum("status", &self.status)?,
      location: self.location,
      assigned_to: decode_opt_uuid(self.assigned_to)?,
      assigned_at: decode_opt_dt(self.assigned_at)?,
      maintenance_schedule,
      warranty_expiry: decode_opt_dt(self.warranty_expiry)?,
      created_at: decode_dt(&self.created_at)?,
      updated_at: decode_dt(&self.updated_at)?,
    })
  }
}

/// Column list matching [`RawHistoryEntry::from_row`].
pub const HISTORY_COLUMNS: &str = "history_id, asset_id, property_id, action,
  from_user, to_user, from_location, to_location, notes, timestamp,
  performed_by";

/// Raw strings read directly from an `asset_history` row.
pub struct RawHistoryEntry {
  pub history_id:    String,
  pub asset_id:      String,
  pub property_id:   String,
  pub action:        String,
  pub from_user:     Option<String>,
  pub to_user:       Option<String>,
  pub from_location: Option<String>,
  pub to_location:   Option<String>,
  pub notes:         Option<String>,
  pub timestamp:     String,
  pub performed_by:  String,
}

impl RawHistoryEntry {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      history_id:    row.get(0)?,
      asset_id:      row.get(1)?,
      property_id:   row.get(2)?,
      action:        row.get(3)?,
      from_user:     row.get(4)?,
      to_user:       row.get(5)?,
      from_location: row.get(6)?,
      to_location:   row.get(7)?,
      notes:         row.get(8)?,
      timestamp:     row.get(9)?,
      performed_by:  row.get(10)?,
    })
  }

  pub fn encode(entry: &HistoryEntry) -> Self {
    Self {
      history_id:    encode_uuid(entry.history_id),
      asset_id:      encode_uuid(entry.asset_id),
      property_id:   encode_uuid(entry.property_id),
      action:        entry.action.as_tag(),
      from_user:     entry.from_user.map(encode_uuid),
      to_user:       entry.to_user.map(encode_uuid),
      from_location: entry.from_location.clone(),
      to_location:   entry.to_location.clone(),
      notes:         entry.notes.clone(),
      timestamp:     encode_dt(entry.timestamp),
      performed_by:  encode_uuid(entry.performed_by),
    }
  }

  pub fn into_entry(self) -> Result<HistoryEntry> {
    Ok(HistoryEntry {
      history_id:    decode_uuid(&self.history_id)?,
      asset_id:      decode_uuid(&self.asset_id)?,
      property_id:   decode_uuid(&self.property_id)?,
      action:        HistoryAction::from(self.action),
      from_user:     decode_opt_uuid(self.from_user)?,
      to_user:       decode_opt_uuid(self.to_user)?,
      from_location: self.from_location,
      to_location:   self.to_location,
      notes:         self.notes,
      timestamp:     decode_dt(&self.timestamp)?,
      performed_by:  decode_uuid(&self.performed_by)?,
    })
  }
}

/// Raw strings read directly from a `users` row.
pub struct RawUser {
  pub user_id:      String,
  pub name:         String,
  pub email:        String,
  pub role:         String,
  pub property_ids: String,
}

impl RawUser {
  pub fn into_user(self) -> Result<User> {
    Ok(User {
      user_id:      decode_uuid(&self.user_id)?,
      name:         self.name,
      email:        self.email,
      role:         decode_enum("role", &self.role)?,
      property_ids: decode_ids(&self.property_ids)?,
    })
  }
}

/// Raw strings read directly from a `properties` row.
pub struct RawProperty {
  pub property_id: String,
  pub name:        String,
  pub manager_id:  String,
}

impl RawProperty {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self { property_id: row.get(0)?, name: row.get(1)?, manager_id: row.get(2)? })
  }

  pub fn into_property(self) -> Result<Property> {
    Ok(Property {
      property_id: decode_uuid(&self.property_id)?,
      name:        self.name,
      manager_id:  decode_uuid(&self.manager_id)?,
    })
  }
}
