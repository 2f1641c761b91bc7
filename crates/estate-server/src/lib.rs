//! Server wiring for the estate asset engine: configuration, directory
//! seeding and the top-level router.

use std::path::PathBuf;

use axum::Router;
use estate_core::{
  AssetService,
  directory::{Property, User},
  store::AssetStore,
};
use serde::Deserialize;
use thiserror::Error;
use tower_http::trace::TraceLayer;
use uuid::Uuid;

// ─── Configuration ───────────────────────────────────────────────────────────

/// Runtime server configuration, deserialised from `estate.toml` and
/// `ESTATE_*` environment variables.
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
  #[serde(default = "default_host")]
  pub host:       String,
  #[serde(default = "default_port")]
  pub port:       u16,
  pub store_path: PathBuf,
  /// Optional JSON file of users and properties loaded at startup.
  #[serde(default)]
  pub seed_path:  Option<PathBuf>,
}

fn default_host() -> String { "127.0.0.1".to_owned() }

fn default_port() -> u16 { 8080 }

// ─── Directory seed ──────────────────────────────────────────────────────────

/// Users and properties owned by the surrounding back office.
#[derive(Debug, Default, Deserialize)]
pub struct Seed {
  #[serde(default)]
  pub users:      Vec<User>,
  #[serde(default)]
  pub properties: Vec<Property>,
}

#[derive(Debug, Error)]
pub enum SeedError {
  #[error("seed file is not valid JSON: {0}")]
  Parse(#[from] serde_json::Error),

  #[error("property {property} names unknown manager {manager}")]
  UnknownManager { property: Uuid, manager: Uuid },

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl Seed {
  pub fn from_json(raw: &str) -> Result<Self, SeedError> { Ok(serde_json::from_str(raw)?) }
}

/// Upsert every record of `seed` into `store`; returns the number of users
/// and properties written.
///
/// A property's manager must be one of the seeded users or already stored.
pub async fn load_seed<S: AssetStore>(store: &S, seed: Seed) -> Result<(usize, usize), SeedError> {
  let store_err = |e: S::Error| SeedError::Store(Box::new(e));

  for user in &seed.users {
    store.put_user(user.clone()).await.map_err(store_err)?;
  }
  for property in &seed.properties {
    if store.get_user(property.manager_id).await.map_err(store_err)?.is_none() {
      return Err(SeedError::UnknownManager {
        property: property.property_id,
        manager:  property.manager_id,
      });
    }
    store.put_property(property.clone()).await.map_err(store_err)?;
  }

  tracing::info!(
    users = seed.users.len(),
    properties = seed.properties.len(),
    "directory seeded"
  );
  Ok((seed.users.len(), seed.properties.len()))
}

// ─── Router ──────────────────────────────────────────────────────────────────

/// The API mounted under `/api`, with request tracing.
pub fn app<S: AssetStore + 'static>(service: AssetService<S>) -> Router {
  Router::new()
    .nest("/api", estate_api::api_router(service))
    .layer(TraceLayer::new_for_http())
}
