//! Caller identity from the `x-user-id` request header.
//!
//! Authentication proper happens upstream; this layer only forwards the
//! asserted user id to the service, which resolves and checks it.

use axum::{extract::FromRequestParts, http::request::Parts};
use estate_core::{Error, auth::Identity};
use uuid::Uuid;

use crate::error::ApiError;

pub const USER_ID_HEADER: &str = "x-user-id";

/// The identity a request was made under. A missing header yields an
/// anonymous caller; a malformed one is rejected as unauthorized.
#[derive(Debug, Clone, Copy)]
pub struct Caller(pub Identity);

impl<S: Send + Sync> FromRequestParts<S> for Caller {
  type Rejection = ApiError;

  async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
    let Some(value) = parts.headers.get(USER_ID_HEADER) else {
      return Ok(Self(Identity::anonymous()));
    };
    let user_id = value
      .to_str()
      .ok()
      .and_then(|s| Uuid::parse_str(s.trim()).ok())
      .ok_or(Error::Unauthorized)?;
    Ok(Self(Identity::user(user_id)))
  }
}
