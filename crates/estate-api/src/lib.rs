//! JSON REST API for the estate asset engine.
//!
//! Exposes an axum [`Router`] backed by an [`AssetService`] over any
//! [`estate_core::store::AssetStore`]. The caller's identity travels in the
//! `x-user-id` header; TLS and upstream authentication are the caller's
//! responsibility.
//!
//! # Mounting
//!
//! ```rust,ignore
//! .nest("/api", estate_api::api_router(service))
//! ```

pub mod assets;
pub mod error;
pub mod identity;
pub mod lifecycle;
pub mod maintenance;
pub mod reports;

use std::sync::Arc;

use axum::{
  Router,
  routing::{get, post},
};
use estate_core::{AssetService, store::AssetStore};

pub use error::ApiError;
pub use identity::{Caller, USER_ID_HEADER};

/// Build a fully-materialised API router for `service`.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<S>(service: AssetService<S>) -> Router<()>
where
  S: AssetStore + 'static,
{
  Router::new()
    // Records
    .route("/assets", get(assets::list::<S>).post(assets::create::<S>))
    .route("/assets/bulk", post(assets::bulk::<S>))
    .route("/assets/{id}", get(assets::get_one::<S>).patch(assets::update::<S>))
    // Lifecycle
    .route("/assets/{id}/check-out", post(lifecycle::check_out::<S>))
    .route("/assets/{id}/check-in", post(lifecycle::check_in::<S>))
    .route("/assets/{id}/assign", post(lifecycle::assign::<S>))
    .route("/assets/{id}/unassign", post(lifecycle::unassign::<S>))
    .route("/assets/{id}/status", post(lifecycle::status::<S>))
    .route("/assets/{id}/retire", post(lifecycle::retire::<S>))
    .route("/assets/{id}/reactivate", post(lifecycle::reactivate::<S>))
    // Maintenance
    .route("/assets/{id}/maintenance", post(maintenance::schedule::<S>))
    .route("/assets/{id}/maintenance/complete", post(maintenance::complete::<S>))
    .route("/maintenance/due", get(maintenance::due::<S>))
    .route("/warranties/expiring", get(maintenance::expiring::<S>))
    // Reports
    .route("/assets/{id}/history", get(reports::history::<S>))
    .route("/dashboard", get(reports::dashboard::<S>))
    .with_state(Arc::new(service))
}
