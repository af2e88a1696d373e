//! Error types for `navoptima-core`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  /// A bucket value read back from storage is not on the 0.1 grid, so it
  /// cannot be matched against buckets derived from the extract.
  #[error("cannot coerce stored {column} value {value} to a 0.1 bucket")]
  BucketCoercion { column: &'static str, value: f64 },

  #[error("vessel {mmsi} has no current version")]
  VesselNotCurrent { mmsi: i64 },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
