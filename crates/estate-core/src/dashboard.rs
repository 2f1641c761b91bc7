//! Dashboard aggregation and alert derivation.
//!
//! A pure read-side projection over asset snapshots. Nothing computed here is
//! persisted: alerts and counts are rebuilt on every read from
//! `(assets, now)`. The only input that is not a snapshot is the per-day
//! check-out/check-in counts, which the service fetches from the history
//! ledger for the windows returned by [`trend_windows`].

use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use strum::IntoEnumIterator;
use uuid::Uuid;

use crate::{
  asset::{Asset, AssetCategory, AssetCondition, AssetStatus},
  schedule::{MAINTENANCE_DUE_WINDOW_DAYS, WARRANTY_WINDOW_DAYS, days, days_until},
};

/// Length of the utilization trend, in calendar days.
pub const TREND_DAYS: usize = 30;

// ─── Alerts ──────────────────────────────────────────────────────────────────

/// Declaration order is ranking order: `High` sorts first.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum AlertSeverity {
  High,
  Medium,
  Low,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertKind {
  MaintenanceOverdue,
  MaintenanceDue,
  WarrantyExpired,
  WarrantyExpiring,
}

impl AlertKind {
  pub fn severity(self) -> AlertSeverity {
    match self {
      Self::MaintenanceOverdue => AlertSeverity::High,
      Self::MaintenanceDue | Self::WarrantyExpired => AlertSeverity::Medium,
      Self::WarrantyExpiring => AlertSeverity::Low,
    }
  }
}

/// A derived, non-persisted notice about one asset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Alert {
  pub kind:        AlertKind,
  pub severity:    AlertSeverity,
  pub asset_id:    Uuid,
  pub property_id: Uuid,
  pub asset_tag:   String,
  pub asset_name:  String,
  /// The maintenance or warranty date the alert is about.
  pub due_at:      DateTime<Utc>,
  pub message:     String,
}

impl Alert {
  fn new(kind: AlertKind, asset: &Asset, due_at: DateTime<Utc>, message: String) -> Self {
    Self {
      kind,
      severity: kind.severity(),
      asset_id: asset.asset_id,
      property_id: asset.property_id,
      asset_tag: asset.asset_tag.clone(),
      asset_name: asset.name.clone(),
      due_at,
      message,
    }
  }
}

/// At most one maintenance alert and one warranty alert per asset.
pub fn alerts_for(asset: &Asset, now: DateTime<Utc>) -> Vec<Alert> {
  let mut out = Vec::new();

  if let Some(next) = asset.next_maintenance() {
    if next <= now {
      let overdue = -days_until(next, now);
      out.push(Alert::new(
        AlertKind::MaintenanceOverdue,
        asset,
        next,
        format!("{} maintenance is overdue by {overdue} day(s)", asset.name),
      ));
    } else if next <= now + days(MAINTENANCE_DUE_WINDOW_DAYS) {
      out.push(Alert::new(
        AlertKind::MaintenanceDue,
        asset,
        next,
        format!("{} maintenance is due in {} day(s)", asset.name, days_until(next, now)),
      ));
    }
  }

  if let Some(expiry) = asset.warranty_expiry {
    if expiry <= now {
      out.push(Alert::new(
        AlertKind::WarrantyExpired,
        asset,
        expiry,
        format!("{} warranty has expired", asset.name),
      ));
    } else if expiry <= now + days(WARRANTY_WINDOW_DAYS) {
      out.push(Alert::new(
        AlertKind::WarrantyExpiring,
        asset,
        expiry,
        format!("{} warranty expires in {} day(s)", asset.name, days_until(expiry, now)),
      ));
    }
  }

  out
}

/// All alerts for `assets`, highest severity first, then earliest date.
pub fn ranked_alerts(assets: &[Asset], now: DateTime<Utc>) -> Vec<Alert> {
  let mut alerts: Vec<Alert> =
    assets.iter().flat_map(|a| alerts_for(a, now)).collect();
  alerts.sort_by(|a, b| {
    a.severity
      .cmp(&b.severity)
      .then(a.due_at.cmp(&b.due_at))
      .then_with(|| a.asset_tag.cmp(&b.asset_tag))
  });
  alerts
}

// ─── Counts ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bucket {
  pub label: String,
  pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DashboardCounts {
  pub total:                usize,
  /// Every status appears, with zero counts included.
  pub by_status:            BTreeMap<AssetStatus, usize>,
  pub by_condition:         BTreeMap<AssetCondition, usize>,
  pub by_category:          BTreeMap<AssetCategory, usize>,
  pub maintenance_overdue:  usize,
  /// Due within the next week, overdue excluded.
  pub maintenance_due_soon: usize,
  pub warranty_expired:     usize,
  /// Expiring within 30 days, expired excluded.
  pub warranty_expiring:    usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Financials {
  pub total_purchase_price: f64,
  pub total_current_value:  f64,
  /// `total_purchase_price - total_current_value`.
  pub depreciation:         f64,
}

fn zeroed<K: IntoEnumIterator + Ord>() -> BTreeMap<K, usize> {
  K::iter().map(|k| (k, 0)).collect()
}

pub fn count(assets: &[Asset], now: DateTime<Utc>) -> DashboardCounts {
  let mut counts = DashboardCounts {
    total: assets.len(),
    by_status: zeroed(),
    by_condition: zeroed(),
    by_category: zeroed(),
    ..DashboardCounts::default()
  };
  let soon = now + days(MAINTENANCE_DUE_WINDOW_DAYS);
  let warranty_window = now + days(WARRANTY_WINDOW_DAYS);

  for asset in assets {
    *counts.by_status.entry(asset.status).or_default() += 1;
    *counts.by_condition.entry(asset.condition).or_default() += 1;
    *counts.by_category.entry(asset.category).or_default() += 1;

    match asset.next_maintenance() {
      Some(next) if next <= now => counts.maintenance_overdue += 1,
      Some(next) if next <= soon => counts.maintenance_due_soon += 1,
      _ => {}
    }
    match asset.warranty_expiry {
      Some(expiry) if expiry <= now => counts.warranty_expired += 1,
      Some(expiry) if expiry <= warranty_window => counts.warranty_expiring += 1,
      _ => {}
    }
  }
  counts
}

pub fn financials(assets: &[Asset]) -> Financials {
  let total_purchase_price: f64 = assets.iter().filter_map(|a| a.purchase_price).sum();
  let total_current_value: f64 = assets.iter().filter_map(|a| a.current_value).sum();
  Financials {
    total_purchase_price,
    total_current_value,
    depreciation: total_purchase_price - total_current_value,
  }
}

/// Asset counts per location, largest first, ties by name.
pub fn location_distribution(assets: &[Asset]) -> Vec<Bucket> {
  let mut by_location: HashMap<&str, usize> = HashMap::new();
  for asset in assets {
    *by_location.entry(asset.location.as_str()).or_default() += 1;
  }
  let mut buckets: Vec<Bucket> = by_location
    .into_iter()
    .map(|(label, count)| Bucket { label: label.to_owned(), count })
    .collect();
  buckets.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.label.cmp(&b.label)));
  buckets
}

// ─── Utilization trend ───────────────────────────────────────────────────────

/// One UTC calendar day of the trend, `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DayWindow {
  pub date:  NaiveDate,
  pub start: DateTime<Utc>,
  pub end:   DateTime<Utc>,
}

/// The [`TREND_DAYS`] calendar days ending with (and including) today,
/// oldest first.
pub fn trend_windows(now: DateTime<Utc>) -> Vec<DayWindow> {
  let today = now.date_naive();
  (0..TREND_DAYS as i64)
    .rev()
    .map(|back| {
      let date = today - Duration::days(back);
      let start = date.and_time(chrono::NaiveTime::MIN).and_utc();
      DayWindow { date, start, end: start + Duration::days(1) }
    })
    .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UtilizationPoint {
  pub date:       NaiveDate,
  pub checkouts:  u64,
  pub checkins:   u64,
  /// `checkouts - checkins`.
  pub net_change: i64,
}

impl UtilizationPoint {
  pub fn new(date: NaiveDate, checkouts: u64, checkins: u64) -> Self {
    let net_change = i64::try_from(checkouts).unwrap_or(i64::MAX)
      - i64::try_from(checkins).unwrap_or(i64::MAX);
    Self { date, checkouts, checkins, net_change }
  }
}

// ─── Dashboard ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dashboard {
  pub generated_at:          DateTime<Utc>,
  /// `None` when the dashboard spans every property the caller manages.
  pub property_id:           Option<Uuid>,
  pub counts:                DashboardCounts,
  pub financials:            Financials,
  pub alerts:                Vec<Alert>,
  pub location_distribution: Vec<Bucket>,
  pub utilization_trend:     Vec<UtilizationPoint>,
}

impl Dashboard {
  /// Project `assets` at `now`; `trend` comes from the history ledger.
  pub fn build(
    property_id: Option<Uuid>,
    assets: &[Asset],
    trend: Vec<UtilizationPoint>,
    now: DateTime<Utc>,
  ) -> Self {
    Self {
      generated_at: now,
      property_id,
      counts: count(assets, now),
      financials: financials(assets),
      alerts: ranked_alerts(assets, now),
      location_distribution: location_distribution(assets),
      utilization_trend: trend,
    }
  }
}
