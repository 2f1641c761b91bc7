//! [`AssetService`]: the request-level operations of the asset engine.
//!
//! Every operation authenticates the caller, re-validates property
//! ownership, applies the lifecycle/scheduler rules to an in-memory copy of
//! the asset, and hands the result to the store together with the history
//! entry documenting it. The entry is read back afterwards; an operation
//! whose audit record cannot be confirmed fails.

mod lifecycle;
mod maintenance;
mod reports;

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use crate::{
  Error, Result,
  asset::{Asset, AssetCategory, AssetCondition, AssetStatus, AssetUpdate, NewAsset},
  auth::{self, Identity},
  clock::{Clock, SystemClock},
  directory::User,
  error::Entity,
  history::{HistoryAction, HistoryEntry},
  schedule::{self, AssetView},
  store::{AssetGuard, AssetQuery, AssetStore},
};

pub use reports::{DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE};

/// Caller-facing asset listing filter; the property scope is resolved from
/// the caller's ownership.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AssetFilter {
  /// Restrict to one property; defaults to every property the caller
  /// manages.
  pub property_id: Option<Uuid>,
  pub status:      Option<AssetStatus>,
  pub category:    Option<AssetCategory>,
  pub condition:   Option<AssetCondition>,
  pub location:    Option<String>,
  pub search:      Option<String>,
  pub limit:       Option<usize>,
  pub offset:      Option<usize>,
}

/// The asset engine, generic over its storage backend.
pub struct AssetService<S> {
  store: Arc<S>,
  clock: Arc<dyn Clock>,
}

impl<S> Clone for AssetService<S> {
  fn clone(&self) -> Self {
    Self { store: Arc::clone(&self.store), clock: Arc::clone(&self.clock) }
  }
}

impl<S: AssetStore> AssetService<S> {
  pub fn new(store: Arc<S>) -> Self { Self::with_clock(store, Arc::new(SystemClock)) }

  pub fn with_clock(store: Arc<S>, clock: Arc<dyn Clock>) -> Self { Self { store, clock } }

  pub fn store(&self) -> &Arc<S> { &self.store }

  fn now(&self) -> DateTime<Utc> { self.clock.now() }

  // ── Shared steps ──────────────────────────────────────────────────────

  /// Load an asset and check that `caller` manages its property.
  async fn load_owned(&self, caller: &User, asset_id: Uuid) -> Result<Asset> {
    let asset = self
      .store
      .get_asset(asset_id)
      .await
      .map_err(Error::store)?
      .ok_or(Error::NotFound(Entity::Asset, asset_id))?;
    auth::authorize_property(&*self.store, caller, asset.property_id).await?;
    Ok(asset)
  }

  async fn confirm_entry(&self, entry_id: Uuid, failure: &'static str) -> Result<()> {
    match self.store.get_history_entry(entry_id).await {
      Ok(Some(_)) => Ok(()),
      Ok(None) => Err(Error::AuditWriteFailed(failure)),
      Err(e) => {
        tracing::error!(error = %e, %entry_id, "history entry read-back failed");
        Err(Error::AuditWriteFailed(failure))
      }
    }
  }

  /// Persist a changed asset with its history entry, provided the stored
  /// row still matches `expected`.
  async fn commit(
    &self,
    expected: AssetGuard,
    asset: Asset,
    entry: HistoryEntry,
  ) -> Result<Asset> {
    debug_assert!(asset.assignment_consistent());
    let entry_id = entry.history_id;
    let action = entry.action.clone();
    let applied = self
      .store
      .update_asset(expected, asset.clone(), entry)
      .await
      .map_err(Error::store)?;
    if !applied {
      warn!(asset_id = %asset.asset_id, %action, "asset changed since it was read, write refused");
      return Err(Error::Conflict(asset.asset_id));
    }
    self.confirm_entry(entry_id, "Failed to update asset").await?;
    info!(asset_id = %asset.asset_id, %action, status = %asset.status, "asset updated");
    Ok(asset)
  }

  /// Load, authorize, mutate through `apply`, commit.
  ///
  /// `apply` receives the asset, the acting user's id and `now`, and returns
  /// the history entry for the change.
  async fn mutate<F>(&self, identity: Identity, asset_id: Uuid, apply: F) -> Result<Asset>
  where
    F: FnOnce(&mut Asset, Uuid, DateTime<Utc>) -> Result<HistoryEntry> + Send,
  {
    let caller = auth::authenticate(&*self.store, identity).await?;
    let mut asset = self.load_owned(&caller, asset_id).await?;
    let expected = AssetGuard::of(&asset);
    let entry = apply(&mut asset, caller.user_id, self.now())?;
    self.commit(expected, asset, entry).await
  }

  // ── CRUD ──────────────────────────────────────────────────────────────

  #[tracing::instrument(
    name = "assets.create",
    skip(self, input),
    fields(property_id = %input.property_id, asset_tag = %input.asset_tag),
    err
  )]
  pub async fn create_asset(&self, identity: Identity, input: NewAsset) -> Result<Asset> {
    let caller = auth::authenticate(&*self.store, identity).await?;
    auth::authorize_property(&*self.store, &caller, input.property_id).await?;
    let now = self.now();

    let asset_tag = input.asset_tag.trim().to_owned();
    if asset_tag.is_empty() {
      return Err(Error::Validation("asset tag must not be empty".into()));
    }
    if input.name.trim().is_empty() {
      return Err(Error::Validation("name must not be empty".into()));
    }
    if input.status == AssetStatus::CheckedOut {
      return Err(Error::Validation(
        "assets cannot be created checked out; check them out after creation".into(),
      ));
    }
    validate_money(input.purchase_price, input.current_value)?;
    schedule::validate_dates(input.purchase_date, input.warranty_expiry, now)?;
    let maintenance_schedule = input
      .maintenance_schedule
      .as_ref()
      .map(|s| schedule::plan(s, None, now))
      .transpose()?;

    if self
      .store
      .find_asset_by_tag(&asset_tag)
      .await
      .map_err(Error::store)?
      .is_some()
    {
      return Err(Error::DuplicateTag(asset_tag));
    }

    let asset = Asset {
      asset_id: Uuid::new_v4(),
      property_id: input.property_id,
      asset_tag,
      name: input.name,
      description: input.description,
      category: input.category,
      subcategory: input.subcategory,
      brand: input.brand,
      model: input.model,
      serial_number: input.serial_number,
      purchase_date: input.purchase_date,
      purchase_price: input.purchase_price,
      current_value: input.current_value,
      condition: input.condition,
      status: input.status,
      location: input.location,
      assigned_to: None,
      assigned_at: None,
      maintenance_schedule,
      warranty_expiry: input.warranty_expiry,
      created_at: now,
      updated_at: now,
    };
    let entry = HistoryEntry::new(&asset, HistoryAction::Created, caller.user_id, now)
      .locations(None, Some(asset.location.clone()))
      .notes(input.notes);
    let entry_id = entry.history_id;

    self
      .store
      .insert_asset(asset.clone(), entry)
      .await
      .map_err(Error::store)?;
    self.confirm_entry(entry_id, "Failed to create asset").await?;

    info!(asset_id = %asset.asset_id, asset_tag = %asset.asset_tag, "asset created");
    Ok(asset)
  }

  #[tracing::instrument(name = "assets.get", skip(self), err)]
  pub async fn get_asset(&self, identity: Identity, asset_id: Uuid) -> Result<AssetView> {
    let caller = auth::authenticate(&*self.store, identity).await?;
    let asset = self.load_owned(&caller, asset_id).await?;
    Ok(AssetView::at(asset, self.now()))
  }

  #[tracing::instrument(name = "assets.list", skip(self), err)]
  pub async fn list_assets(
    &self,
    identity: Identity,
    filter: AssetFilter,
  ) -> Result<Vec<AssetView>> {
    let caller = auth::authenticate(&*self.store, identity).await?;
    let property_ids = auth::scope(&*self.store, &caller, filter.property_id).await?;
    let query = AssetQuery {
      property_ids,
      status: filter.status,
      category: filter.category,
      condition: filter.condition,
      location: filter.location,
      search: filter.search,
      limit: filter.limit,
      offset: filter.offset,
    };
    let now = self.now();
    let assets = self.store.list_assets(&query).await.map_err(Error::store)?;
    Ok(assets.into_iter().map(|a| AssetView::at(a, now)).collect())
  }

  /// Edit descriptive, financial, location, maintenance and warranty fields.
  #[tracing::instrument(name = "assets.update", skip(self, update, notes), err)]
  pub async fn update_asset(
    &self,
    identity: Identity,
    asset_id: Uuid,
    update: AssetUpdate,
    notes: Option<String>,
  ) -> Result<Asset> {
    if update.is_empty() {
      return Err(Error::Validation("no fields to update".into()));
    }
    self
      .mutate(identity, asset_id, move |asset, performed_by, now| {
        let previous_location = asset.location.clone();
        apply_update(asset, update, now)?;
        let moved = previous_location != asset.location;
        let entry = HistoryEntry::new(asset, HistoryAction::Updated, performed_by, now)
          .notes(notes);
        Ok(if moved {
          entry.locations(Some(previous_location), Some(asset.location.clone()))
        } else {
          entry
        })
      })
      .await
  }
}

fn validate_money(purchase_price: Option<f64>, current_value: Option<f64>) -> Result<()> {
  for (field, value) in [("purchase_price", purchase_price), ("current_value", current_value)] {
    if let Some(v) = value
      && !(v.is_finite() && v >= 0.0)
    {
      return Err(Error::Validation(format!("{field} must be a non-negative amount")));
    }
  }
  Ok(())
}

/// Apply an edit to `asset` in place.
fn apply_update(asset: &mut Asset, update: AssetUpdate, now: DateTime<Utc>) -> Result<()> {
  validate_money(update.purchase_price, update.current_value)?;
  schedule::validate_dates(update.purchase_date, update.warranty_expiry, now)?;
  if let Some(name) = &update.name
    && name.trim().is_empty()
  {
    return Err(Error::Validation("name must not be empty".into()));
  }
  if let Some(input) = &update.maintenance_schedule {
    asset.maintenance_schedule =
      Some(schedule::plan(input, asset.maintenance_schedule.as_ref(), now)?);
  }

  let AssetUpdate {
    name,
    description,
    category,
    subcategory,
    brand,
    model,
    serial_number,
    purchase_date,
    purchase_price,
    current_value,
    condition,
    location,
    maintenance_schedule: _,
    warranty_expiry,
  } = update;

  if let Some(v) = name {
    asset.name = v;
  }
  if let Some(v) = description {
    asset.description = v;
  }
  if let Some(v) = category {
    asset.category = v;
  }
  if let Some(v) = condition {
    asset.condition = v;
  }
  if let Some(v) = location {
    asset.location = v;
  }
  asset.subcategory = subcategory.or(asset.subcategory.take());
  asset.brand = brand.or(asset.brand.take());
  asset.model = model.or(asset.model.take());
  asset.serial_number = serial_number.or(asset.serial_number.take());
  asset.purchase_date = purchase_date.or(asset.purchase_date);
  asset.purchase_price = purchase_price.or(asset.purchase_price);
  asset.current_value = current_value.or(asset.current_value);
  asset.warranty_expiry = warranty_expiry.or(asset.warranty_expiry);
  asset.updated_at = now;
  Ok(())
}
