//! Error type for `navoptima-loader`.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  /// The extract file does not exist. Raised before the warehouse is opened.
  #[error("extract not found: {}", .0.display())]
  MissingSource(PathBuf),

  #[error("malformed record at line {line}: {reason}")]
  MalformedRecord { line: u64, reason: String },

  #[error("csv error: {0}")]
  Csv(#[from] csv::Error),

  #[error("invalid configuration: {0}")]
  Config(String),

  #[error("warehouse error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl From<config::ConfigError> for Error {
  fn from(e: config::ConfigError) -> Self { Error::Config(e.to_string()) }
}

/// Box a backend error into [`Error::Store`].
pub(crate) fn store_err<E>(e: E) -> Error
where
  E: std::error::Error + Send + Sync + 'static,
{
  Error::Store(Box::new(e))
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
