//! Handlers for `/assets` record endpoints.
//!
//! | Method  | Path | Notes |
//! |---------|------|-------|
//! | `GET`   | `/assets` | Optional `property_id`, `status`, `category`, `condition`, `location`, `search`, `limit`, `offset` |
//! | `POST`  | `/assets` | Body: [`NewAsset`]; returns 201 + stored asset |
//! | `GET`   | `/assets/{id}` | Asset plus maintenance/warranty insights |
//! | `PATCH` | `/assets/{id}` | Body: [`AssetUpdate`] fields plus optional `notes` |
//! | `POST`  | `/assets/bulk` | Body: [`BulkBody`]; returns the per-item report |

use std::sync::Arc;

use axum::{
  Json,
  extract::{Path, Query, State},
  http::StatusCode,
  response::IntoResponse,
};
use estate_core::{
  AssetService,
  asset::{Asset, AssetUpdate, BulkUpdate, BulkUpdateReport, NewAsset},
  schedule::AssetView,
  service::AssetFilter,
  store::AssetStore,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::{error::ApiError, identity::Caller};

// ─── List ────────────────────────────────────────────────────────────────────

/// `GET /assets[?property_id=..&status=..&search=..]`
pub async fn list<S: AssetStore>(
  State(service): State<Arc<AssetService<S>>>,
  Caller(identity): Caller,
  Query(filter): Query<AssetFilter>,
) -> Result<Json<Vec<AssetView>>, ApiError> {
  Ok(Json(service.list_assets(identity, filter).await?))
}

// ─── Create ──────────────────────────────────────────────────────────────────

/// `POST /assets`
pub async fn create<S: AssetStore>(
  State(service): State<Arc<AssetService<S>>>,
  Caller(identity): Caller,
  Json(body): Json<NewAsset>,
) -> Result<impl IntoResponse, ApiError> {
  let asset = service.create_asset(identity, body).await?;
  Ok((StatusCode::CREATED, Json(asset)))
}

// ─── Get one ─────────────────────────────────────────────────────────────────

/// `GET /assets/{id}`
pub async fn get_one<S: AssetStore>(
  State(service): State<Arc<AssetService<S>>>,
  Caller(identity): Caller,
  Path(id): Path<Uuid>,
) -> Result<Json<AssetView>, ApiError> {
  Ok(Json(service.get_asset(identity, id).await?))
}

// ─── Update ──────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct UpdateBody {
  #[serde(flatten)]
  pub update: AssetUpdate,
  pub notes:  Option<String>,
}

/// `PATCH /assets/{id}`
pub async fn update<S: AssetStore>(
  State(service): State<Arc<AssetService<S>>>,
  Caller(identity): Caller,
  Path(id): Path<Uuid>,
  Json(body): Json<UpdateBody>,
) -> Result<Json<Asset>, ApiError> {
  Ok(Json(service.update_asset(identity, id, body.update, body.notes).await?))
}

// ─── Bulk ────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct BulkBody {
  pub asset_ids: Vec<Uuid>,
  #[serde(flatten)]
  pub update:    BulkUpdate,
  pub notes:     Option<String>,
}

/// `POST /assets/bulk`
pub async fn bulk<S: AssetStore>(
  State(service): State<Arc<AssetService<S>>>,
  Caller(identity): Caller,
  Json(body): Json<BulkBody>,
) -> Result<Json<BulkUpdateReport>, ApiError> {
  if body.asset_ids.is_empty() {
    return Err(ApiError::BadRequest("asset_ids must not be empty".into()));
  }
  let report = service
    .bulk_update_assets(identity, body.asset_ids, body.update, body.notes)
    .await?;
  Ok(Json(report))
}
