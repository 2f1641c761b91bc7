//! Handlers for the history ledger and the dashboard.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/assets/{id}/history` | Optional `action`, `from`, `to`, `performed_by`, `cursor`, `limit` |
//! | `GET`  | `/dashboard` | Optional `property_id`; all managed properties otherwise |

use std::sync::Arc;

use axum::{
  Json,
  extract::{Path, Query, State},
};
use chrono::{DateTime, Utc};
use estate_core::{
  AssetService,
  dashboard::Dashboard,
  history::{HistoryAction, HistoryFilter, HistoryPage},
  store::AssetStore,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::{error::ApiError, identity::Caller};

// ─── History ─────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct HistoryParams {
  /// Action tag, e.g. `check_out` or `status_retired`.
  pub action:       Option<HistoryAction>,
  pub from:         Option<DateTime<Utc>>,
  pub to:           Option<DateTime<Utc>>,
  pub performed_by: Option<Uuid>,
  /// Opaque `continue_cursor` from a previous page.
  pub cursor:       Option<String>,
  pub limit:        Option<usize>,
}

/// `GET /assets/{id}/history`
pub async fn history<S: AssetStore>(
  State(service): State<Arc<AssetService<S>>>,
  Caller(identity): Caller,
  Path(id): Path<Uuid>,
  Query(params): Query<HistoryParams>,
) -> Result<Json<HistoryPage>, ApiError> {
  let filter = HistoryFilter {
    action:       params.action,
    from:         params.from,
    to:           params.to,
    performed_by: params.performed_by,
  };
  let page = service
    .list_asset_history(identity, id, filter, params.cursor.as_deref(), params.limit)
    .await?;
  Ok(Json(page))
}

// ─── Dashboard ───────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct DashboardParams {
  pub property_id: Option<Uuid>,
}

/// `GET /dashboard[?property_id=..]`
pub async fn dashboard<S: AssetStore>(
  State(service): State<Arc<AssetService<S>>>,
  Caller(identity): Caller,
  Query(params): Query<DashboardParams>,
) -> Result<Json<Dashboard>, ApiError> {
  Ok(Json(service.get_asset_dashboard(identity, params.property_id).await?))
}
