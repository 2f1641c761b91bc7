//! Operations whose history entry cannot be read back must fail.

use std::sync::Arc;

use estate_core::{
  AssetService, Error,
  asset::{Asset, AssetCategory, NewAsset},
  auth::Identity,
  directory::{Property, Role, User},
  history::{HistoryCount, HistoryEntry, HistoryQuery},
  store::{AssetGuard, AssetQuery, AssetStore},
};
use estate_store_sqlite::SqliteStore;
use uuid::Uuid;

/// Delegates to a real store but never finds history entries by id.
struct LosingStore(SqliteStore);

impl AssetStore for LosingStore {
  type Error = estate_store_sqlite::Error;

  async fn put_user(&self, user: User) -> Result<(), Self::Error> { self.0.put_user(user).await }

  async fn get_user(&self, id: Uuid) -> Result<Option<User>, Self::Error> {
    self.0.get_user(id).await
  }

  async fn put_property(&self, property: Property) -> Result<(), Self::Error> {
    self.0.put_property(property).await
  }

  async fn get_property(&self, id: Uuid) -> Result<Option<Property>, Self::Error> {
    self.0.get_property(id).await
  }

  async fn list_managed_properties(&self, manager_id: Uuid) -> Result<Vec<Property>, Self::Error> {
    self.0.list_managed_properties(manager_id).await
  }

  async fn get_asset(&self, id: Uuid) -> Result<Option<Asset>, Self::Error> {
    self.0.get_asset(id).await
  }

  async fn find_asset_by_tag(&self, asset_tag: &str) -> Result<Option<Asset>, Self::Error> {
    self.0.find_asset_by_tag(asset_tag).await
  }

  async fn list_assets(&self, query: &AssetQuery) -> Result<Vec<Asset>, Self::Error> {
    self.0.list_assets(query).await
  }

  async fn insert_asset(&self, asset: Asset, entry: HistoryEntry) -> Result<(), Self::Error> {
    self.0.insert_asset(asset, entry).await
  }

  async fn update_asset(
    &self,
    expected: AssetGuard,
    asset: Asset,
    entry: HistoryEntry,
  ) -> Result<bool, Self::Error> {
    self.0.update_asset(expected, asset, entry).await
  }

  async fn get_history_entry(&self, _id: Uuid) -> Result<Option<HistoryEntry>, Self::Error> {
    Ok(None)
  }

  async fn list_history(&self, query: &HistoryQuery) -> Result<Vec<HistoryEntry>, Self::Error> {
    self.0.list_history(query).await
  }

  async fn count_history(&self, query: &HistoryCount) -> Result<u64, Self::Error> {
    self.0.count_history(query).await
  }
}

#[tokio::test]
async fn unconfirmed_history_fails_the_operation() {
  let store = Arc::new(LosingStore(
    SqliteStore::open_in_memory().await.expect("in-memory store"),
  ));
  let manager = User {
    user_id:      Uuid::new_v4(),
    name:         "Pat".into(),
    email:        "pat@example.com".into(),
    role:         Role::Manager,
    property_ids: vec![],
  };
  let property = Property {
    property_id: Uuid::new_v4(),
    name:        "Quay House".into(),
    manager_id:  manager.user_id,
  };
  store.put_user(manager.clone()).await.unwrap();
  store.put_property(property.clone()).await.unwrap();

  let service = AssetService::new(store.clone());
  let who = Identity::user(manager.user_id);
  let input = NewAsset::new(property.property_id, "Q-1", "Pump", AssetCategory::Equipment, "Plant");

  let err = service.create_asset(who, input).await.unwrap_err();
  assert!(matches!(err, Error::AuditWriteFailed("Failed to create asset")));

  let stored = store.find_asset_by_tag("Q-1").await.unwrap().unwrap();
  let err = service.retire_asset(who, stored.asset_id, None).await.unwrap_err();
  assert!(matches!(err, Error::AuditWriteFailed("Failed to update asset")));
}
