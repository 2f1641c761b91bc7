//! Check-out, check-in, assignment, status and bulk operations.

use std::collections::{HashMap, HashSet};

use tracing::{info, warn};
use uuid::Uuid;

use super::AssetService;
use crate::{
  Error, Result,
  asset::{
    Asset, AssetStatus, BulkUpdate, BulkUpdateReport, CheckIn, CheckOut, SkipReason,
    SkippedAsset,
  },
  auth::{self, Identity},
  error::{DateField, Entity},
  history::{HistoryAction, HistoryEntry},
  lifecycle,
  store::{AssetGuard, AssetStore},
};

impl<S: AssetStore> AssetService<S> {
  /// Check that `user_id` exists and may hold assets of `asset`'s property.
  async fn resolve_recipient(&self, asset: &Asset, user_id: Uuid) -> Result<()> {
    let user = self
      .store
      .get_user(user_id)
      .await
      .map_err(Error::store)?
      .ok_or(Error::NotFound(Entity::User, user_id))?;
    if !user.can_receive_assets_of(asset.property_id) {
      return Err(Error::AccessDenied(asset.property_id));
    }
    Ok(())
  }

  #[tracing::instrument(
    name = "assets.check_out",
    skip(self, input),
    fields(to_user = %input.user_id),
    err
  )]
  pub async fn check_out_asset(
    &self,
    identity: Identity,
    asset_id: Uuid,
    input: CheckOut,
  ) -> Result<Asset> {
    let caller = auth::authenticate(&*self.store, identity).await?;
    let mut asset = self.load_owned(&caller, asset_id).await?;
    let guard = AssetGuard::of(&asset);
    let now = self.now();

    if let Some(value) = input.expected_return_date
      && value <= now
    {
      return Err(Error::InvalidDate { field: DateField::ExpectedReturnDate, value });
    }
    self.resolve_recipient(&asset, input.user_id).await?;

    let from_location = asset.location.clone();
    lifecycle::check_out(&mut asset, input.user_id, input.location, now)?;
    let entry = HistoryEntry::new(&asset, HistoryAction::CheckOut, caller.user_id, now)
      .users(None, Some(input.user_id))
      .locations(Some(from_location), Some(asset.location.clone()))
      .notes(input.notes);

    if let Some(expected) = input.expected_return_date {
      info!(%asset_id, %expected, "expected return recorded");
    }
    self.commit(guard, asset, entry).await
  }

  #[tracing::instrument(name = "assets.check_in", skip(self, input), err)]
  pub async fn check_in_asset(
    &self,
    identity: Identity,
    asset_id: Uuid,
    input: CheckIn,
  ) -> Result<Asset> {
    self
      .mutate(identity, asset_id, move |asset, performed_by, now| {
        let from_location = asset.location.clone();
        let previous = lifecycle::release(asset, input.location, input.condition, now)?;
        Ok(
          HistoryEntry::new(asset, HistoryAction::CheckIn, performed_by, now)
            .users(Some(previous), None)
            .locations(Some(from_location), Some(asset.location.clone()))
            .notes(input.notes),
        )
      })
      .await
  }

  /// Assign to `user_id` from any status with a table edge to `checked_out`.
  #[tracing::instrument(name = "assets.assign", skip(self, location, notes), err)]
  pub async fn assign_asset(
    &self,
    identity: Identity,
    asset_id: Uuid,
    user_id: Uuid,
    location: Option<String>,
    notes: Option<String>,
  ) -> Result<Asset> {
    let caller = auth::authenticate(&*self.store, identity).await?;
    let mut asset = self.load_owned(&caller, asset_id).await?;
    let expected = AssetGuard::of(&asset);
    let now = self.now();
    self.resolve_recipient(&asset, user_id).await?;

    let from_location = asset.location.clone();
    lifecycle::assign(&mut asset, user_id, location, now)?;
    let entry = HistoryEntry::new(&asset, HistoryAction::Assigned, caller.user_id, now)
      .users(None, Some(user_id))
      .locations(Some(from_location), Some(asset.location.clone()))
      .notes(notes);
    self.commit(expected, asset, entry).await
  }

  #[tracing::instrument(name = "assets.unassign", skip(self, location, notes), err)]
  pub async fn unassign_asset(
    &self,
    identity: Identity,
    asset_id: Uuid,
    location: Option<String>,
    notes: Option<String>,
  ) -> Result<Asset> {
    self
      .mutate(identity, asset_id, move |asset, performed_by, now| {
        let from_location = asset.location.clone();
        let previous = lifecycle::release(asset, location, None, now)?;
        Ok(
          HistoryEntry::new(asset, HistoryAction::Unassigned, performed_by, now)
            .users(Some(previous), None)
            .locations(Some(from_location), Some(asset.location.clone()))
            .notes(notes),
        )
      })
      .await
  }

  #[tracing::instrument(name = "assets.update_status", skip(self, notes), err)]
  pub async fn update_asset_status(
    &self,
    identity: Identity,
    asset_id: Uuid,
    status: AssetStatus,
    notes: Option<String>,
  ) -> Result<Asset> {
    self
      .status_change(identity, asset_id, status, HistoryAction::Status(status), notes)
      .await
  }

  #[tracing::instrument(name = "assets.retire", skip(self, notes), err)]
  pub async fn retire_asset(
    &self,
    identity: Identity,
    asset_id: Uuid,
    notes: Option<String>,
  ) -> Result<Asset> {
    self
      .status_change(identity, asset_id, AssetStatus::Retired, HistoryAction::Retired, notes)
      .await
  }

  async fn status_change(
    &self,
    identity: Identity,
    asset_id: Uuid,
    status: AssetStatus,
    action: HistoryAction,
    notes: Option<String>,
  ) -> Result<Asset> {
    self
      .mutate(identity, asset_id, move |asset, performed_by, now| {
        let previous = asset.assigned_to;
        lifecycle::set_status(asset, status, now)?;
        Ok(
          HistoryEntry::new(asset, action, performed_by, now)
            .users(previous, None)
            .notes(notes),
        )
      })
      .await
  }

  /// Return a `retired` or `lost` asset to service.
  #[tracing::instrument(name = "assets.reactivate", skip(self, notes), err)]
  pub async fn reactivate_asset(
    &self,
    identity: Identity,
    asset_id: Uuid,
    notes: Option<String>,
  ) -> Result<Asset> {
    self
      .mutate(identity, asset_id, move |asset, performed_by, now| {
        lifecycle::reactivate(asset, now)?;
        Ok(HistoryEntry::new(asset, HistoryAction::Reactivated, performed_by, now).notes(notes))
      })
      .await
  }

  /// Best-effort update of many assets.
  ///
  /// Items that are missing, belong to a property the caller does not
  /// manage, cannot make the requested status move, or are changed by
  /// another request mid-update are skipped and reported; they never fail
  /// the call. Store failures still do.
  #[tracing::instrument(
    name = "assets.bulk_update",
    skip(self, asset_ids, update, notes),
    fields(requested = asset_ids.len(), updated = tracing::field::Empty),
    err
  )]
  pub async fn bulk_update_assets(
    &self,
    identity: Identity,
    asset_ids: Vec<Uuid>,
    update: BulkUpdate,
    notes: Option<String>,
  ) -> Result<BulkUpdateReport> {
    let caller = auth::authenticate(&*self.store, identity).await?;
    if update.is_empty() {
      return Err(Error::Validation("bulk update needs a status, condition or location".into()));
    }
    if update.status == Some(AssetStatus::CheckedOut) {
      return Err(Error::Validation("bulk updates cannot check assets out".into()));
    }

    let now = self.now();
    let mut report = BulkUpdateReport::default();
    let mut owned: HashMap<Uuid, bool> = HashMap::new();
    let mut seen = HashSet::new();

    for asset_id in asset_ids {
      if !seen.insert(asset_id) {
        continue;
      }
      let skip = |reason| SkippedAsset { asset_id, reason };

      let Some(mut asset) = self.store.get_asset(asset_id).await.map_err(Error::store)? else {
        warn!(%asset_id, "bulk update: asset not found, skipping");
        report.skipped.push(skip(SkipReason::NotFound));
        continue;
      };

      let allowed = match owned.get(&asset.property_id) {
        Some(allowed) => *allowed,
        None => {
          let allowed = self
            .store
            .get_property(asset.property_id)
            .await
            .map_err(Error::store)?
            .is_some_and(|p| auth::ensure_owner(&caller, &p).is_ok());
          owned.insert(asset.property_id, allowed);
          allowed
        }
      };
      if !allowed {
        warn!(%asset_id, property_id = %asset.property_id, "bulk update: access denied, skipping");
        report.skipped.push(skip(SkipReason::AccessDenied));
        continue;
      }

      let expected = AssetGuard::of(&asset);
      let previous_assignee = asset.assigned_to;
      let from_location = asset.location.clone();
      if let Some(status) = update.status {
        match lifecycle::set_status(&mut asset, status, now) {
          Ok(()) => {}
          Err(Error::InvalidTransition { from, to }) => {
            warn!(%asset_id, %from, %to, "bulk update: invalid transition, skipping");
            report.skipped.push(skip(SkipReason::InvalidTransition { from, to }));
            continue;
          }
          Err(e) => return Err(e),
        }
      }
      if let Some(condition) = update.condition {
        asset.condition = condition;
      }
      if let Some(location) = &update.location {
        asset.location = location.clone();
      }
      asset.updated_at = now;

      let mut entry = HistoryEntry::new(&asset, HistoryAction::BulkUpdate, caller.user_id, now)
        .users(previous_assignee.filter(|_| asset.assigned_to.is_none()), None)
        .notes(notes.clone());
      if from_location != asset.location {
        entry = entry.locations(Some(from_location), Some(asset.location.clone()));
      }

      match self.commit(expected, asset, entry).await {
        Ok(_) => report.updated.push(asset_id),
        Err(Error::Conflict(_)) => report.skipped.push(skip(SkipReason::Conflict)),
        Err(e) => return Err(e),
      }
    }

    tracing::Span::current().record("updated", report.updated.len());
    info!(
      updated = report.updated.len(),
      skipped = report.skipped.len(),
      "bulk update finished"
    );
    Ok(report)
  }
}
