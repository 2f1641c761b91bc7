//! API error type and [`axum::response::IntoResponse`] implementation.

use axum::{
  Json,
  http::StatusCode,
  response::{IntoResponse, Response},
};
use estate_core::Error;
use serde_json::json;
use thiserror::Error;

/// An error returned by an API handler.
#[derive(Debug, Error)]
pub enum ApiError {
  #[error(transparent)]
  Core(#[from] Error),

  #[error("bad request: {0}")]
  BadRequest(String),
}

impl ApiError {
  pub fn status(&self) -> StatusCode {
    match self {
      Self::BadRequest(_) => StatusCode::BAD_REQUEST,
      Self::Core(e) => match e {
        Error::Unauthorized => StatusCode::UNAUTHORIZED,
        Error::Forbidden(_) | Error::AccessDenied(_) => StatusCode::FORBIDDEN,
        Error::NotFound(..) => StatusCode::NOT_FOUND,
        Error::InvalidTransition { .. }
        | Error::NotAvailable { .. }
        | Error::NotAssigned(_)
        | Error::AlreadyAssigned { .. }
        | Error::DuplicateTag(_)
        | Error::Conflict(_) => StatusCode::CONFLICT,
        Error::InvalidInterval(_) | Error::InvalidSchedule(_) | Error::InvalidDate { .. } => {
          StatusCode::UNPROCESSABLE_ENTITY
        }
        Error::Validation(_) => StatusCode::BAD_REQUEST,
        Error::AuditWriteFailed(_) | Error::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
      },
    }
  }

  fn kind(&self) -> &'static str {
    match self {
      Self::Core(e) => e.kind(),
      Self::BadRequest(_) => "bad_request",
    }
  }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let status = self.status();
    if status.is_server_error() {
      tracing::error!(error = %self, "request failed");
    }
    let body = json!({ "error": self.to_string(), "kind": self.kind() });
    (status, Json(body)).into_response()
  }
}
