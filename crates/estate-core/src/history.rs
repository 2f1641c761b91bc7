//! The history ledger: an append-only audit trail of asset mutations.
//!
//! Entries are written in the same store transaction as the asset change they
//! document and are never updated or deleted afterwards.

use std::{convert::Infallible, fmt, str::FromStr};

use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::asset::{Asset, AssetStatus};

// ─── Action tag ──────────────────────────────────────────────────────────────

/// What kind of mutation a history entry documents.
///
/// Serialised as a flat string tag (`check_out`, `status_retired`, …). Tags
/// written by other systems round-trip through [`HistoryAction::Other`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum HistoryAction {
  Created,
  Updated,
  CheckOut,
  CheckIn,
  Assigned,
  Unassigned,
  BulkUpdate,
  /// A direct status change, tagged `status_<status>`.
  Status(AssetStatus),
  MaintenanceScheduled,
  MaintenanceCompleted,
  Retired,
  Reactivated,
  Other(String),
}

impl HistoryAction {
  const STATUS_PREFIX: &'static str = "status_";

  pub fn as_tag(&self) -> String {
    match self {
      Self::Created => "created".to_owned(),
      Self::Updated => "updated".to_owned(),
      Self::CheckOut => "check_out".to_owned(),
      Self::CheckIn => "check_in".to_owned(),
      Self::Assigned => "assigned".to_owned(),
      Self::Unassigned => "unassigned".to_owned(),
      Self::BulkUpdate => "bulk_update".to_owned(),
      Self::Status(s) => format!("{}{s}", Self::STATUS_PREFIX),
      Self::MaintenanceScheduled => "maintenance_scheduled".to_owned(),
      Self::MaintenanceCompleted => "maintenance_completed".to_owned(),
      Self::Retired => "retired".to_owned(),
      Self::Reactivated => "reactivated".to_owned(),
      Self::Other(tag) => tag.clone(),
    }
  }
}

impl fmt::Display for HistoryAction {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(&self.as_tag())
  }
}

impl FromStr for HistoryAction {
  type Err = Infallible;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    let action = match s {
      "created" => Self::Created,
      "updated" => Self::Updated,
      "check_out" => Self::CheckOut,
      "check_in" => Self::CheckIn,
      "assigned" => Self::Assigned,
      "unassigned" => Self::Unassigned,
      "bulk_update" => Self::BulkUpdate,
      "maintenance_scheduled" => Self::MaintenanceScheduled,
      "maintenance_completed" => Self::MaintenanceCompleted,
      "retired" => Self::Retired,
      "reactivated" => Self::Reactivated,
      other => match other
        .strip_prefix(Self::STATUS_PREFIX)
        .and_then(|rest| rest.parse::<AssetStatus>().ok())
      {
        Some(status) => Self::Status(status),
        None => Self::Other(other.to_owned()),
      },
    };
    Ok(action)
  }
}

impl From<String> for HistoryAction {
  fn from(s: String) -> Self {
    match s.parse() {
      Ok(action) => action,
      Err(never) => match never {},
    }
  }
}

impl From<HistoryAction> for String {
  fn from(a: HistoryAction) -> Self { a.as_tag() }
}

// ─── Entry ───────────────────────────────────────────────────────────────────

/// One immutable audit record of a state change to an asset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
  pub history_id:    Uuid,
  pub asset_id:      Uuid,
  pub property_id:   Uuid,
  pub action:        HistoryAction,
  pub from_user:     Option<Uuid>,
  pub to_user:       Option<Uuid>,
  pub from_location: Option<String>,
  pub to_location:   Option<String>,
  pub notes:         Option<String>,
  pub timestamp:     DateTime<Utc>,
  pub performed_by:  Uuid,
}

impl HistoryEntry {
  /// Start an entry documenting `action` on `asset`.
  pub fn new(
    asset: &Asset,
    action: HistoryAction,
    performed_by: Uuid,
    timestamp: DateTime<Utc>,
  ) -> Self {
    Self {
      history_id: Uuid::new_v4(),
      asset_id: asset.asset_id,
      property_id: asset.property_id,
      action,
      from_user: None,
      to_user: None,
      from_location: None,
      to_location: None,
      notes: None,
      timestamp,
      performed_by,
    }
  }

  pub fn users(mut self, from: Option<Uuid>, to: Option<Uuid>) -> Self {
    self.from_user = from;
    self.to_user = to;
    self
  }

  pub fn locations(mut self, from: Option<String>, to: Option<String>) -> Self {
    self.from_location = from;
    self.to_location = to;
    self
  }

  pub fn notes(mut self, notes: Option<String>) -> Self {
    self.notes = notes;
    self
  }
}

// ─── Queries ─────────────────────────────────────────────────────────────────

/// Optional filters for a history listing.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HistoryFilter {
  pub action:       Option<HistoryAction>,
  /// Inclusive lower bound on `timestamp`.
  pub from:         Option<DateTime<Utc>>,
  /// Inclusive upper bound on `timestamp`.
  pub to:           Option<DateTime<Utc>>,
  pub performed_by: Option<Uuid>,
}

/// Position of the last entry of a page; the next page starts strictly after
/// it in `(timestamp DESC, history_id DESC)` order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HistoryCursor {
  pub timestamp:  DateTime<Utc>,
  pub history_id: Uuid,
}

impl HistoryCursor {
  pub fn after(entry: &HistoryEntry) -> Self {
    Self { timestamp: entry.timestamp, history_id: entry.history_id }
  }

  /// Opaque URL-safe form handed to clients.
  pub fn encode(&self) -> String {
    let raw = format!(
      "{}|{}",
      self.timestamp.to_rfc3339_opts(SecondsFormat::Nanos, true),
      self.history_id.hyphenated()
    );
    URL_SAFE_NO_PAD.encode(raw)
  }

  /// `None` when the string is not a cursor this module produced.
  pub fn decode(s: &str) -> Option<Self> {
    let bytes = URL_SAFE_NO_PAD.decode(s).ok()?;
    let raw = String::from_utf8(bytes).ok()?;
    let (ts, id) = raw.split_once('|')?;
    Some(Self {
      timestamp:  DateTime::parse_from_rfc3339(ts).ok()?.with_timezone(&Utc),
      history_id: Uuid::parse_str(id).ok()?,
    })
  }
}

/// Parameters for [`AssetStore::list_history`](crate::store::AssetStore::list_history).
#[derive(Debug, Clone)]
pub struct HistoryQuery {
  pub asset_id: Uuid,
  pub filter:   HistoryFilter,
  pub after:    Option<HistoryCursor>,
  pub limit:    usize,
}

/// Parameters for [`AssetStore::count_history`](crate::store::AssetStore::count_history).
#[derive(Debug, Clone)]
pub struct HistoryCount {
  pub property_ids: Vec<Uuid>,
  pub action:       HistoryAction,
  /// Inclusive.
  pub from:         DateTime<Utc>,
  /// Exclusive.
  pub until:        DateTime<Utc>,
}

/// One page of a history listing, newest first.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryPage {
  pub page:            Vec<HistoryEntry>,
  pub is_done:         bool,
  /// Pass back to fetch the next page; `None` once `is_done`.
  pub continue_cursor: Option<String>,
}
