//! Error type for `estate-store-sqlite`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("json error: {0}")]
  Json(#[from] serde_json::Error),

  #[error("uuid parse error: {0}")]
  Uuid(#[from] uuid::Error),

  #[error("date/time parse error: {0}")]
  DateParse(String),

  /// A stored enum column holds a value this build does not know.
  #[error("unknown {column} value: {value:?}")]
  UnknownVariant { column: &'static str, value: String },

  /// `update_asset` was called for an asset that is not stored.
  #[error("asset not found: {0}")]
  AssetNotFound(uuid::Uuid),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
