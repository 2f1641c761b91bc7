//! Maintenance and warranty arithmetic.
//!
//! Everything here is a pure function of its inputs; `now` is always passed
//! in. Day counts are derived from the UTC millisecond delta, never from
//! calendar subtraction: "until" counts round up, "since" counts round down.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::{
  Error, Result,
  asset::{Asset, MaintenanceSchedule, MaintenanceScheduleInput},
  error::DateField,
};

pub const DAY_MS: i64 = 86_400_000;

/// Maintenance falling due within this many days is reported as upcoming.
pub const MAINTENANCE_DUE_WINDOW_DAYS: i64 = 7;

/// Warranties ending within this many days are reported as expiring.
pub const WARRANTY_WINDOW_DAYS: i64 = 30;

pub fn days(n: i64) -> Duration { Duration::milliseconds(n * DAY_MS) }

/// `base + interval_days`, or [`Error::InvalidInterval`] past chrono's range.
fn after_interval(base: DateTime<Utc>, interval_days: u32) -> Result<DateTime<Utc>> {
  base
    .checked_add_signed(days(i64::from(interval_days)))
    .ok_or(Error::InvalidInterval(i64::from(interval_days)))
}

// ─── Planning ────────────────────────────────────────────────────────────────

/// Validate `input` and fill in `next_maintenance`.
///
/// The base for the computed date is, in order: the supplied
/// `last_maintenance`, the existing schedule's `last_maintenance`, `now`.
/// An explicit `next_maintenance` is kept as given once checked against the
/// base.
pub fn plan(
  input: &MaintenanceScheduleInput,
  existing: Option<&MaintenanceSchedule>,
  now: DateTime<Utc>,
) -> Result<MaintenanceSchedule> {
  let interval_days = u32::try_from(input.interval_days)
    .ok()
    .filter(|d| *d > 0)
    .ok_or(Error::InvalidInterval(input.interval_days))?;

  let last_maintenance = input
    .last_maintenance
    .or_else(|| existing.and_then(|s| s.last_maintenance));

  let next_maintenance = match (input.next_maintenance, last_maintenance) {
    (Some(next), Some(last)) if next <= last => {
      return Err(Error::InvalidSchedule(format!(
        "next maintenance {next} must be after last maintenance {last}"
      )));
    }
    (Some(next), None) if next <= now => {
      return Err(Error::InvalidSchedule(format!(
        "next maintenance {next} must be in the future"
      )));
    }
    (Some(next), _) => next,
    (None, Some(last)) => after_interval(last, interval_days)?,
    (None, None) => after_interval(now, interval_days)?,
  };

  Ok(MaintenanceSchedule {
    interval_days,
    last_maintenance,
    next_maintenance: Some(next_maintenance),
  })
}

/// Roll a schedule forward after a service performed at `performed_at`.
pub fn advance(
  schedule: &MaintenanceSchedule,
  performed_at: DateTime<Utc>,
) -> Result<MaintenanceSchedule> {
  Ok(MaintenanceSchedule {
    interval_days:    schedule.interval_days,
    last_maintenance: Some(performed_at),
    next_maintenance: Some(after_interval(performed_at, schedule.interval_days)?),
  })
}

/// Purchase dates may not lie in the future; warranties must still be
/// running.
pub fn validate_dates(
  purchase_date: Option<DateTime<Utc>>,
  warranty_expiry: Option<DateTime<Utc>>,
  now: DateTime<Utc>,
) -> Result<()> {
  if let Some(value) = purchase_date
    && value > now
  {
    return Err(Error::InvalidDate { field: DateField::PurchaseDate, value });
  }
  if let Some(value) = warranty_expiry
    && value <= now
  {
    return Err(Error::InvalidDate { field: DateField::WarrantyExpiry, value });
  }
  Ok(())
}

// ─── Day rounding ────────────────────────────────────────────────────────────

/// Whole days until `target`, rounded up. Negative once `target` has passed.
pub fn days_until(target: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
  let ms = (target - now).num_milliseconds();
  -(-ms).div_euclid(DAY_MS)
}

/// Whole days since `past`, rounded down.
pub fn days_since(past: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
  (now - past).num_milliseconds().div_euclid(DAY_MS)
}

// ─── Classification ──────────────────────────────────────────────────────────

/// Read-time classification of one asset; never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AssetInsights {
  /// `next_maintenance <= now`; due and overdue are not distinguished here.
  pub maintenance_due:             bool,
  /// `warranty_expiry <= now + 30 days`, already expired included.
  pub warranty_expiring:           bool,
  pub days_until_next_maintenance: Option<i64>,
  pub days_since_last_maintenance: Option<i64>,
  pub days_until_warranty_expiry:  Option<i64>,
}

pub fn classify(asset: &Asset, now: DateTime<Utc>) -> AssetInsights {
  let next = asset.next_maintenance();
  let last = asset.last_maintenance();
  let warranty = asset.warranty_expiry;

  AssetInsights {
    maintenance_due:             next.is_some_and(|n| n <= now),
    warranty_expiring:           warranty
      .is_some_and(|w| w <= now + days(WARRANTY_WINDOW_DAYS)),
    days_until_next_maintenance: next.map(|n| days_until(n, now)),
    days_since_last_maintenance: last.map(|l| days_since(l, now)),
    days_until_warranty_expiry:  warranty.map(|w| days_until(w, now)),
  }
}

/// An asset together with its classification at some instant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssetView {
  #[serde(flatten)]
  pub asset:    Asset,
  #[serde(flatten)]
  pub insights: AssetInsights,
}

impl AssetView {
  pub fn at(asset: Asset, now: DateTime<Utc>) -> Self {
    let insights = classify(&asset, now);
    Self { asset, insights }
  }
}
