//! Error type for `navoptima-store-sqlite`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("core error: {0}")]
  Core(#[from] navoptima_core::Error),

  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("json error: {0}")]
  Json(#[from] serde_json::Error),

  #[error("date/time parse error: {0}")]
  DateParse(String),

  /// A vessel type that was just ensured could not be read back.
  #[error("vessel type {0:?} missing after insert")]
  VesselTypeMissing(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
