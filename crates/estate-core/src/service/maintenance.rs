//! Maintenance scheduling, completion and due/expiry listings.

use uuid::Uuid;

use super::AssetService;
use crate::{
  Error, Result,
  asset::{Asset, AssetStatus, CompleteMaintenance, MaintenanceScheduleInput},
  auth::{self, Identity},
  error::DateField,
  history::{HistoryAction, HistoryEntry},
  lifecycle,
  schedule::{self, AssetView, days},
  store::{AssetQuery, AssetStore},
};

impl<S: AssetStore> AssetService<S> {
  /// Set or replace an asset's maintenance schedule.
  #[tracing::instrument(name = "assets.schedule_maintenance", skip(self, input, notes), err)]
  pub async fn schedule_maintenance(
    &self,
    identity: Identity,
    asset_id: Uuid,
    input: MaintenanceScheduleInput,
    notes: Option<String>,
  ) -> Result<Asset> {
    self
      .mutate(identity, asset_id, move |asset, performed_by, now| {
        let planned = schedule::plan(&input, asset.maintenance_schedule.as_ref(), now)?;
        asset.maintenance_schedule = Some(planned);
        asset.updated_at = now;
        Ok(
          HistoryEntry::new(asset, HistoryAction::MaintenanceScheduled, performed_by, now)
            .notes(notes),
        )
      })
      .await
  }

  /// Record a completed service: the schedule rolls forward from the
  /// service date, and an asset sitting in `maintenance` returns to
  /// `available`.
  #[tracing::instrument(name = "assets.complete_maintenance", skip(self, input), err)]
  pub async fn complete_maintenance(
    &self,
    identity: Identity,
    asset_id: Uuid,
    input: CompleteMaintenance,
  ) -> Result<Asset> {
    self
      .mutate(identity, asset_id, move |asset, performed_by, now| {
        let asset_id = asset.asset_id;
        let current = asset.maintenance_schedule.as_ref().ok_or_else(|| {
          Error::Validation(format!("asset {asset_id} has no maintenance schedule"))
        })?;
        let performed_at = input.performed_at.unwrap_or(now);
        if performed_at > now {
          return Err(Error::InvalidDate {
            field: DateField::MaintenancePerformedAt,
            value: performed_at,
          });
        }
        let rolled = schedule::advance(current, performed_at)?;
        asset.maintenance_schedule = Some(rolled);
        if let Some(condition) = input.condition {
          asset.condition = condition;
        }
        if asset.status == AssetStatus::Maintenance {
          lifecycle::set_status(asset, AssetStatus::Available, now)?;
        }
        asset.updated_at = now;
        Ok(
          HistoryEntry::new(asset, HistoryAction::MaintenanceCompleted, performed_by, now)
            .notes(input.notes),
        )
      })
      .await
  }

  /// Assets whose next maintenance falls within `within_days` (overdue
  /// included), soonest first.
  #[tracing::instrument(name = "assets.maintenance_due", skip(self), err)]
  pub async fn list_maintenance_due(
    &self,
    identity: Identity,
    property_id: Option<Uuid>,
    within_days: i64,
  ) -> Result<Vec<AssetView>> {
    let horizon = within_days_horizon(within_days)?;
    let now = self.now();
    let mut assets = self.scoped_assets(identity, property_id).await?;
    assets.retain(|a| a.next_maintenance().is_some_and(|n| n <= now + horizon));
    assets.sort_by_key(|a| a.next_maintenance());
    Ok(assets.into_iter().map(|a| AssetView::at(a, now)).collect())
  }

  /// Assets whose warranty ends within `within_days` (expired included),
  /// soonest first.
  #[tracing::instrument(name = "assets.expiring_warranties", skip(self), err)]
  pub async fn list_expiring_warranties(
    &self,
    identity: Identity,
    property_id: Option<Uuid>,
    within_days: i64,
  ) -> Result<Vec<AssetView>> {
    let horizon = within_days_horizon(within_days)?;
    let now = self.now();
    let mut assets = self.scoped_assets(identity, property_id).await?;
    assets.retain(|a| a.warranty_expiry.is_some_and(|w| w <= now + horizon));
    assets.sort_by_key(|a| a.warranty_expiry);
    Ok(assets.into_iter().map(|a| AssetView::at(a, now)).collect())
  }

  /// Every asset of the requested property, or of all managed properties.
  pub(super) async fn scoped_assets(
    &self,
    identity: Identity,
    property_id: Option<Uuid>,
  ) -> Result<Vec<Asset>> {
    let caller = auth::authenticate(&*self.store, identity).await?;
    let property_ids = auth::scope(&*self.store, &caller, property_id).await?;
    let query = AssetQuery { property_ids, ..AssetQuery::default() };
    self.store.list_assets(&query).await.map_err(Error::store)
  }
}

fn within_days_horizon(within_days: i64) -> Result<chrono::Duration> {
  if !(0..=3650).contains(&within_days) {
    return Err(Error::Validation(format!(
      "within_days must be between 0 and 3650, got {within_days}"
    )));
  }
  Ok(days(within_days))
}
