//! Error types for `estate-core`.

use chrono::{DateTime, Utc};
use thiserror::Error;
use uuid::Uuid;

use crate::asset::AssetStatus;

/// The kind of record a [`Error::NotFound`] refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "snake_case")]
pub enum Entity {
  Asset,
  Property,
  User,
}

/// Which date field failed a [`Error::InvalidDate`] check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "snake_case")]
pub enum DateField {
  /// Must not lie in the future.
  PurchaseDate,
  /// Must lie strictly in the future.
  WarrantyExpiry,
  /// Must lie strictly in the future.
  ExpectedReturnDate,
  /// Must not lie in the future.
  MaintenancePerformedAt,
}

#[derive(Debug, Error)]
pub enum Error {
  #[error("authentication required")]
  Unauthorized,

  #[error("user {0} does not have the manager or field_technician role")]
  Forbidden(Uuid),

  #[error("{0} not found: {1}")]
  NotFound(Entity, Uuid),

  #[error("access denied to property {0}")]
  AccessDenied(Uuid),

  #[error("invalid status transition from {from} to {to}")]
  InvalidTransition { from: AssetStatus, to: AssetStatus },

  #[error("asset {asset_id} is not available (status {status})")]
  NotAvailable { asset_id: Uuid, status: AssetStatus },

  #[error("asset {0} is not assigned to anyone")]
  NotAssigned(Uuid),

  #[error("asset {asset_id} is already assigned to {user_id}")]
  AlreadyAssigned { asset_id: Uuid, user_id: Uuid },

  #[error("maintenance interval must be a positive number of days, got {0}")]
  InvalidInterval(i64),

  #[error("invalid maintenance schedule: {0}")]
  InvalidSchedule(String),

  #[error("invalid {field}: {value}")]
  InvalidDate { field: DateField, value: DateTime<Utc> },

  #[error("asset tag {0:?} is already in use")]
  DuplicateTag(String),

  /// Another request changed the asset between this request's read and its
  /// write.
  #[error("asset {0} was changed by another request")]
  Conflict(Uuid),

  #[error("validation failed: {0}")]
  Validation(String),

  /// The asset write went through but its history entry could not be read
  /// back.
  #[error("{0}")]
  AuditWriteFailed(&'static str),

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl Error {
  /// Wrap a storage backend error.
  pub fn store<E>(e: E) -> Self
  where
    E: std::error::Error + Send + Sync + 'static,
  {
    Self::Store(Box::new(e))
  }

  /// Stable snake_case name of the error kind, used in API responses.
  pub fn kind(&self) -> &'static str {
    match self {
      Self::Unauthorized => "unauthorized",
      Self::Forbidden(_) => "forbidden",
      Self::NotFound(..) => "not_found",
      Self::AccessDenied(_) => "access_denied",
      Self::InvalidTransition { .. } => "invalid_transition",
      Self::NotAvailable { .. } => "not_available",
      Self::NotAssigned(_) => "not_assigned",
      Self::AlreadyAssigned { .. } => "already_assigned",
      Self::InvalidInterval(_) => "invalid_interval",
      Self::InvalidSchedule(_) => "invalid_schedule",
      Self::InvalidDate { .. } => "invalid_date",
      Self::DuplicateTag(_) => "duplicate_tag",
      Self::Conflict(_) => "conflict",
      Self::Validation(_) => "validation",
      Self::AuditWriteFailed(_) => "audit_write_failed",
      Self::Store(_) => "store",
    }
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
