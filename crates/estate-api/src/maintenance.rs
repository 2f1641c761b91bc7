//! Handlers for maintenance scheduling and the due/expiry listings.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `POST` | `/assets/{id}/maintenance` | Body: [`MaintenanceScheduleInput`] plus optional `notes` |
//! | `POST` | `/assets/{id}/maintenance/complete` | Body: [`CompleteMaintenance`] |
//! | `GET`  | `/maintenance/due` | Optional `property_id`; `within_days` defaults to 7 |
//! | `GET`  | `/warranties/expiring` | Optional `property_id`; `within_days` defaults to 30 |

use std::sync::Arc;

use axum::{
  Json,
  extract::{Path, Query, State},
};
use estate_core::{
  AssetService,
  asset::{Asset, CompleteMaintenance, MaintenanceScheduleInput},
  schedule::{AssetView, MAINTENANCE_DUE_WINDOW_DAYS, WARRANTY_WINDOW_DAYS},
  store::AssetStore,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::{error::ApiError, identity::Caller};

#[derive(Debug, Deserialize)]
pub struct ScheduleBody {
  #[serde(flatten)]
  pub schedule: MaintenanceScheduleInput,
  pub notes:    Option<String>,
}

/// `POST /assets/{id}/maintenance`
pub async fn schedule<S: AssetStore>(
  State(service): State<Arc<AssetService<S>>>,
  Caller(identity): Caller,
  Path(id): Path<Uuid>,
  Json(body): Json<ScheduleBody>,
) -> Result<Json<Asset>, ApiError> {
  Ok(Json(service.schedule_maintenance(identity, id, body.schedule, body.notes).await?))
}

/// `POST /assets/{id}/maintenance/complete`
pub async fn complete<S: AssetStore>(
  State(service): State<Arc<AssetService<S>>>,
  Caller(identity): Caller,
  Path(id): Path<Uuid>,
  Json(body): Json<CompleteMaintenance>,
) -> Result<Json<Asset>, ApiError> {
  Ok(Json(service.complete_maintenance(identity, id, body).await?))
}

#[derive(Debug, Deserialize)]
pub struct WindowParams {
  pub property_id: Option<Uuid>,
  pub within_days: Option<i64>,
}

/// `GET /maintenance/due[?property_id=..&within_days=..]`
pub async fn due<S: AssetStore>(
  State(service): State<Arc<AssetService<S>>>,
  Caller(identity): Caller,
  Query(params): Query<WindowParams>,
) -> Result<Json<Vec<AssetView>>, ApiError> {
  let within = params.within_days.unwrap_or(MAINTENANCE_DUE_WINDOW_DAYS);
  Ok(Json(service.list_maintenance_due(identity, params.property_id, within).await?))
}

/// `GET /warranties/expiring[?property_id=..&within_days=..]`
pub async fn expiring<S: AssetStore>(
  State(service): State<Arc<AssetService<S>>>,
  Caller(identity): Caller,
  Query(params): Query<WindowParams>,
) -> Result<Json<Vec<AssetView>>, ApiError> {
  let within = params.within_days.unwrap_or(WARRANTY_WINDOW_DAYS);
  Ok(Json(service.list_expiring_warranties(identity, params.property_id, within).await?))
}
