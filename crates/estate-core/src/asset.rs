//! Asset types, the aggregate root of the estate store.
//!
//! An asset is a trackable physical item owned by exactly one property. Its
//! status and assignment fields only ever change through the lifecycle
//! operations in [`crate::service`], each of which appends a
//! [`HistoryEntry`](crate::history::HistoryEntry).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ─── Enumerations ────────────────────────────────────────────────────────────

/// What kind of item an asset is.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Hash,
  PartialOrd,
  Ord,
  Serialize,
  Deserialize,
  strum::Display,
  strum::EnumString,
  strum::AsRefStr,
  strum::EnumIter,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum AssetCategory {
  Tool,
  Equipment,
  Material,
  Furniture,
  Appliance,
}

/// Physical condition, best to worst.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Hash,
  PartialOrd,
  Ord,
  Serialize,
  Deserialize,
  strum::Display,
  strum::EnumString,
  strum::AsRefStr,
  strum::EnumIter,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum AssetCondition {
  Excellent,
  Good,
  Fair,
  Poor,
  Broken,
}

/// Lifecycle status. Legal moves between statuses live in
/// [`crate::lifecycle`].
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Hash,
  PartialOrd,
  Ord,
  Default,
  Serialize,
  Deserialize,
  strum::Display,
  strum::EnumString,
  strum::AsRefStr,
  strum::EnumIter,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum AssetStatus {
  #[default]
  Available,
  CheckedOut,
  Maintenance,
  Retired,
  Lost,
}

// ─── Maintenance ─────────────────────────────────────────────────────────────

/// A stored interval-based maintenance recurrence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MaintenanceSchedule {
  /// Days between services; always positive.
  pub interval_days:    u32,
  pub last_maintenance: Option<DateTime<Utc>>,
  /// Always later than `last_maintenance` when both are present.
  pub next_maintenance: Option<DateTime<Utc>>,
}

/// Caller-supplied schedule, validated and completed by
/// [`crate::schedule::plan`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MaintenanceScheduleInput {
  /// Signed so that non-positive values can be rejected with
  /// [`Error::InvalidInterval`](crate::Error::InvalidInterval).
  pub interval_days:    i64,
  #[serde(default)]
  pub last_maintenance: Option<DateTime<Utc>>,
  #[serde(default)]
  pub next_maintenance: Option<DateTime<Utc>>,
}

// ─── Asset ───────────────────────────────────────────────────────────────────

/// A trackable physical item.
///
/// `assigned_to` and `assigned_at` are set if and only if `status` is
/// [`AssetStatus::CheckedOut`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Asset {
  pub asset_id:             Uuid,
  pub property_id:          Uuid,
  /// Business key; unique across the whole store.
  pub asset_tag:            String,

  pub name:                 String,
  pub description:          String,
  pub category:             AssetCategory,
  pub subcategory:          Option<String>,
  pub brand:                Option<String>,
  pub model:                Option<String>,
  pub serial_number:        Option<String>,

  pub purchase_date:        Option<DateTime<Utc>>,
  pub purchase_price:       Option<f64>,
  pub current_value:        Option<f64>,

  pub condition:            AssetCondition,
  pub status:               AssetStatus,
  pub location:             String,
  pub assigned_to:          Option<Uuid>,
  pub assigned_at:          Option<DateTime<Utc>>,

  pub maintenance_schedule: Option<MaintenanceSchedule>,
  pub warranty_expiry:      Option<DateTime<Utc>>,

  pub created_at:           DateTime<Utc>,
  pub updated_at:           DateTime<Utc>,
}

impl Asset {
  /// Whether the assignment fields agree with the status.
  pub fn assignment_consistent(&self) -> bool {
    let checked_out = self.status == AssetStatus::CheckedOut;
    checked_out == self.assigned_to.is_some()
      && checked_out == self.assigned_at.is_some()
  }

  pub fn next_maintenance(&self) -> Option<DateTime<Utc>> {
    self
      .maintenance_schedule
      .as_ref()
      .and_then(|s| s.next_maintenance)
  }

  pub fn last_maintenance(&self) -> Option<DateTime<Utc>> {
    self
      .maintenance_schedule
      .as_ref()
      .and_then(|s| s.last_maintenance)
  }
}

// ─── Inputs ──────────────────────────────────────────────────────────────────

/// Input to [`AssetService::create_asset`](crate::service::AssetService::create_asset).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewAsset {
  pub property_id:          Uuid,
  pub asset_tag:            String,
  pub name:                 String,
  #[serde(default)]
  pub description:          String,
  pub category:             AssetCategory,
  #[serde(default)]
  pub subcategory:          Option<String>,
  #[serde(default)]
  pub brand:                Option<String>,
  #[serde(default)]
  pub model:                Option<String>,
  #[serde(default)]
  pub serial_number:        Option<String>,
  #[serde(default)]
  pub purchase_date:        Option<DateTime<Utc>>,
  #[serde(default)]
  pub purchase_price:       Option<f64>,
  #[serde(default)]
  pub current_value:        Option<f64>,
  pub condition:            AssetCondition,
  #[serde(default)]
  pub status:               AssetStatus,
  pub location:             String,
  #[serde(default)]
  pub maintenance_schedule: Option<MaintenanceScheduleInput>,
  #[serde(default)]
  pub warranty_expiry:      Option<DateTime<Utc>>,
  #[serde(default)]
  pub notes:                Option<String>,
}

impl NewAsset {
  /// Convenience constructor with every optional field unset.
  pub fn new(
    property_id: Uuid,
    asset_tag: impl Into<String>,
    name: impl Into<String>,
    category: AssetCategory,
    location: impl Into<String>,
  ) -> Self {
    Self {
      property_id,
      asset_tag: asset_tag.into(),
      name: name.into(),
      description: String::new(),
      category,
      subcategory: None,
      brand: None,
      model: None,
      serial_number: None,
      purchase_date: None,
      purchase_price: None,
      current_value: None,
      condition: AssetCondition::Good,
      status: AssetStatus::Available,
      location: location.into(),
      maintenance_schedule: None,
      warranty_expiry: None,
      notes: None,
    }
  }
}

/// Partial edit of an asset's descriptive, financial, maintenance and
/// warranty fields. Status and assignment are not editable here.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AssetUpdate {
  pub name:                 Option<String>,
  pub description:          Option<String>,
  pub category:             Option<AssetCategory>,
  pub subcategory:          Option<String>,
  pub brand:                Option<String>,
  pub model:                Option<String>,
  pub serial_number:        Option<String>,
  pub purchase_date:        Option<DateTime<Utc>>,
  pub purchase_price:       Option<f64>,
  pub current_value:        Option<f64>,
  pub condition:            Option<AssetCondition>,
  pub location:             Option<String>,
  pub maintenance_schedule: Option<MaintenanceScheduleInput>,
  pub warranty_expiry:      Option<DateTime<Utc>>,
}

impl AssetUpdate {
  pub fn is_empty(&self) -> bool {
    self.name.is_none()
      && self.description.is_none()
      && self.category.is_none()
      && self.subcategory.is_none()
      && self.brand.is_none()
      && self.model.is_none()
      && self.serial_number.is_none()
      && self.purchase_date.is_none()
      && self.purchase_price.is_none()
      && self.current_value.is_none()
      && self.condition.is_none()
      && self.location.is_none()
      && self.maintenance_schedule.is_none()
      && self.warranty_expiry.is_none()
  }
}

/// Input to a check-out.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckOut {
  pub user_id:              Uuid,
  #[serde(default)]
  pub expected_return_date: Option<DateTime<Utc>>,
  #[serde(default)]
  pub location:             Option<String>,
  #[serde(default)]
  pub notes:                Option<String>,
}

/// Input to a check-in.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CheckIn {
  pub location:  Option<String>,
  pub condition: Option<AssetCondition>,
  pub notes:     Option<String>,
}

/// Fields applied to every asset of a bulk update.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BulkUpdate {
  pub status:    Option<AssetStatus>,
  pub condition: Option<AssetCondition>,
  pub location:  Option<String>,
}

impl BulkUpdate {
  pub fn is_empty(&self) -> bool {
    self.status.is_none() && self.condition.is_none() && self.location.is_none()
  }
}

/// Input to a maintenance completion.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CompleteMaintenance {
  /// When the service was done; defaults to now.
  pub performed_at: Option<DateTime<Utc>>,
  pub condition:    Option<AssetCondition>,
  pub notes:        Option<String>,
}

/// Why a bulk-update item was not applied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
  NotFound,
  AccessDenied,
  InvalidTransition { from: AssetStatus, to: AssetStatus },
  /// Changed by another request while the bulk update was running.
  Conflict,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedAsset {
  pub asset_id: Uuid,
  pub reason:   SkipReason,
}

/// Per-item outcome of a best-effort bulk update.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BulkUpdateReport {
  pub updated: Vec<Uuid>,
  pub skipped: Vec<SkippedAsset>,
}
