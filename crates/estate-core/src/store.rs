//! The `AssetStore` trait and supporting query types.
//!
//! The trait is implemented by storage backends (e.g. `estate-store-sqlite`).
//! [`AssetService`](crate::service::AssetService) depends on this
//! abstraction, not on any concrete backend.

use std::future::Future;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
  asset::{Asset, AssetCategory, AssetCondition, AssetStatus},
  directory::{Property, User},
  history::{HistoryCount, HistoryEntry, HistoryQuery},
};

// ─── Query type ──────────────────────────────────────────────────────────────

/// Parameters for [`AssetStore::list_assets`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AssetQuery {
  /// Restrict to assets of these properties. Empty matches nothing.
  pub property_ids: Vec<Uuid>,
  pub status:       Option<AssetStatus>,
  pub category:     Option<AssetCategory>,
  pub condition:    Option<AssetCondition>,
  /// Exact location match.
  pub location:     Option<String>,
  /// Substring match over name, tag, description and serial number.
  pub search:       Option<String>,
  pub limit:        Option<usize>,
  pub offset:       Option<usize>,
}

// ─── Write guard ─────────────────────────────────────────────────────────────

/// The stored state a conditional asset write expects to find.
///
/// Taken when the asset is loaded, before any change is applied. A write
/// whose guard no longer matches the stored row is refused, so two requests
/// that read the same row cannot both commit a change derived from it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AssetGuard {
  pub status:      AssetStatus,
  pub assigned_to: Option<Uuid>,
  pub updated_at:  DateTime<Utc>,
}

impl AssetGuard {
  pub fn of(asset: &Asset) -> Self {
    Self {
      status:      asset.status,
      assigned_to: asset.assigned_to,
      updated_at:  asset.updated_at,
    }
  }
}

// ─── Trait ───────────────────────────────────────────────────────────────────

/// Abstraction over an estate record store backend.
///
/// Asset writes always carry the history entry documenting them; a backend
/// must persist both or neither. History entries are never updated or
/// deleted.
///
/// All methods return `Send` futures so the trait can be used in multi-threaded
/// async runtimes (e.g. tokio with `axum`).
pub trait AssetStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  // ── Directory ─────────────────────────────────────────────────────────

  /// Insert or replace a user record.
  fn put_user(
    &self,
    user: User,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  fn get_user(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<User>, Self::Error>> + Send + '_;

  /// Insert or replace a property record.
  fn put_property(
    &self,
    property: Property,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  fn get_property(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<Property>, Self::Error>> + Send + '_;

  /// All properties whose manager is `manager_id`.
  fn list_managed_properties(
    &self,
    manager_id: Uuid,
  ) -> impl Future<Output = Result<Vec<Property>, Self::Error>> + Send + '_;

  // ── Assets ────────────────────────────────────────────────────────────

  fn get_asset(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<Asset>, Self::Error>> + Send + '_;

  /// Look up an asset by its store-wide unique tag.
  fn find_asset_by_tag<'a>(
    &'a self,
    asset_tag: &'a str,
  ) -> impl Future<Output = Result<Option<Asset>, Self::Error>> + Send + 'a;

  fn list_assets<'a>(
    &'a self,
    query: &'a AssetQuery,
  ) -> impl Future<Output = Result<Vec<Asset>, Self::Error>> + Send + 'a;

  /// Persist a new asset and its `created` entry in one transaction.
  fn insert_asset(
    &self,
    asset: Asset,
    entry: HistoryEntry,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  /// Overwrite an existing asset and append `entry` in one transaction,
  /// provided the stored row still matches `expected`.
  ///
  /// Returns `false`, having written nothing, when the row was changed since
  /// `expected` was taken.
  fn update_asset(
    &self,
    expected: AssetGuard,
    asset: Asset,
    entry: HistoryEntry,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  // ── History ───────────────────────────────────────────────────────────

  fn get_history_entry(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<HistoryEntry>, Self::Error>> + Send + '_;

  /// Entries of one asset, newest first, at most `query.limit`.
  fn list_history<'a>(
    &'a self,
    query: &'a HistoryQuery,
  ) -> impl Future<Output = Result<Vec<HistoryEntry>, Self::Error>> + Send + 'a;

  /// Number of entries with `query.action` in `[from, until)` across the
  /// given properties.
  fn count_history<'a>(
    &'a self,
    query: &'a HistoryCount,
  ) -> impl Future<Output = Result<u64, Self::Error>> + Send + 'a;
}
