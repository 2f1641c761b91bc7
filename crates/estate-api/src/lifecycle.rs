//! Handlers for asset lifecycle transitions.
//!
//! | Method | Path | Body |
//! |--------|------|------|
//! | `POST` | `/assets/{id}/check-out` | [`CheckOut`] |
//! | `POST` | `/assets/{id}/check-in` | [`CheckIn`] |
//! | `POST` | `/assets/{id}/assign` | `{"user_id":..,"location"?,"notes"?}` |
//! | `POST` | `/assets/{id}/unassign` | `{"location"?,"notes"?}` |
//! | `POST` | `/assets/{id}/status` | `{"status":..,"notes"?}` |
//! | `POST` | `/assets/{id}/retire` | `{"notes"?}` |
//! | `POST` | `/assets/{id}/reactivate` | `{"notes"?}` |
//!
//! Each returns the asset as stored after the transition.

use std::sync::Arc;

use axum::{
  Json,
  extract::{Path, State},
};
use estate_core::{
  AssetService,
  asset::{Asset, AssetStatus, CheckIn, CheckOut},
  store::AssetStore,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::{error::ApiError, identity::Caller};

type Service<S> = State<Arc<AssetService<S>>>;

#[derive(Debug, Default, Deserialize)]
pub struct NotesBody {
  pub notes: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct AssignBody {
  pub user_id:  Uuid,
  pub location: Option<String>,
  pub notes:    Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct UnassignBody {
  pub location: Option<String>,
  pub notes:    Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct StatusBody {
  pub status: AssetStatus,
  pub notes:  Option<String>,
}

pub async fn check_out<S: AssetStore>(
  State(service): Service<S>,
  Caller(identity): Caller,
  Path(id): Path<Uuid>,
  Json(body): Json<CheckOut>,
) -> Result<Json<Asset>, ApiError> {
  Ok(Json(service.check_out_asset(identity, id, body).await?))
}

pub async fn check_in<S: AssetStore>(
  State(service): Service<S>,
  Caller(identity): Caller,
  Path(id): Path<Uuid>,
  Json(body): Json<CheckIn>,
) -> Result<Json<Asset>, ApiError> {
  Ok(Json(service.check_in_asset(identity, id, body).await?))
}

pub async fn assign<S: AssetStore>(
  State(service): Service<S>,
  Caller(identity): Caller,
  Path(id): Path<Uuid>,
  Json(body): Json<AssignBody>,
) -> Result<Json<Asset>, ApiError> {
  let asset = service
    .assign_asset(identity, id, body.user_id, body.location, body.notes)
    .await?;
  Ok(Json(asset))
}

pub async fn unassign<S: AssetStore>(
  State(service): Service<S>,
  Caller(identity): Caller,
  Path(id): Path<Uuid>,
  Json(body): Json<UnassignBody>,
) -> Result<Json<Asset>, ApiError> {
  Ok(Json(service.unassign_asset(identity, id, body.location, body.notes).await?))
}

pub async fn status<S: AssetStore>(
  State(service): Service<S>,
  Caller(identity): Caller,
  Path(id): Path<Uuid>,
  Json(body): Json<StatusBody>,
) -> Result<Json<Asset>, ApiError> {
  Ok(Json(service.update_asset_status(identity, id, body.status, body.notes).await?))
}

pub async fn retire<S: AssetStore>(
  State(service): Service<S>,
  Caller(identity): Caller,
  Path(id): Path<Uuid>,
  Json(body): Json<NotesBody>,
) -> Result<Json<Asset>, ApiError> {
  Ok(Json(service.retire_asset(identity, id, body.notes).await?))
}

pub async fn reactivate<S: AssetStore>(
  State(service): Service<S>,
  Caller(identity): Caller,
  Path(id): Path<Uuid>,
  Json(body): Json<NotesBody>,
) -> Result<Json<Asset>, ApiError> {
  Ok(Json(service.reactivate_asset(identity, id, body.notes).await?))
}
