//! The `Warehouse` trait: the star schema as seen by the loader.
//!
//! Implemented by storage backends (e.g. `navoptima-store-sqlite`). The
//! loader depends on this abstraction, not on any concrete backend.
//!
//! Dimension inserts are insert-if-absent: a backend must back every
//! dimension uniqueness rule with a storage-level constraint and silently
//! skip conflicting rows, so that repeated or overlapping loads never
//! duplicate dimension rows regardless of what the caller checked first.

use std::future::Future;

use chrono::{DateTime, Utc};

use crate::{
  fact::{BatchOutcome, NewPerformanceFact, PerformanceFact},
  run::LoadReport,
  vessel::{NewVessel, Vessel, VesselType},
  weather::{NewWeatherMetric, WeatherMetric},
};

/// Abstraction over a NavOptima warehouse backend.
///
/// All methods return `Send` futures so the trait can be used from a
/// multi-threaded tokio runtime.
pub trait Warehouse: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  // ── Vessel types ──────────────────────────────────────────────────────

  /// Insert `type_name` unless it exists, then return its row. Never
  /// updates an existing row.
  fn ensure_vessel_type(
    &self,
    type_name: String,
  ) -> impl Future<Output = Result<VesselType, Self::Error>> + Send + '_;

  fn list_vessel_types(
    &self,
  ) -> impl Future<Output = Result<Vec<VesselType>, Self::Error>> + Send + '_;

  // ── Weather ───────────────────────────────────────────────────────────

  /// Every row of the weather dimension, buckets coerced to tenths.
  fn list_weather_metrics(
    &self,
  ) -> impl Future<Output = Result<Vec<WeatherMetric>, Self::Error>> + Send + '_;

  /// Insert each metric whose bucket is absent. Returns how many rows were
  /// actually written.
  fn insert_weather_metrics(
    &self,
    metrics: Vec<NewWeatherMetric>,
  ) -> impl Future<Output = Result<usize, Self::Error>> + Send + '_;

  // ── Vessels ───────────────────────────────────────────────────────────

  /// Vessel versions; only `is_current` ones when `current_only`.
  fn list_vessels(
    &self,
    current_only: bool,
  ) -> impl Future<Output = Result<Vec<Vessel>, Self::Error>> + Send + '_;

  /// Insert each vessel as a current version unless its `mmsi` already has
  /// one. Returns how many rows were actually written.
  fn insert_vessels(
    &self,
    vessels: Vec<NewVessel>,
  ) -> impl Future<Output = Result<usize, Self::Error>> + Send + '_;

  /// Expire current version `vessel_sk` at `expire_at` and insert
  /// `replacement` as the new current version, atomically.
  ///
  /// Fails if `vessel_sk` is not a current version.
  fn supersede_vessel(
    &self,
    vessel_sk: i64,
    expire_at: DateTime<Utc>,
    replacement: NewVessel,
  ) -> impl Future<Output = Result<Vessel, Self::Error>> + Send + '_;

  // ── Facts (append-only) ───────────────────────────────────────────

  /// Append one batch of facts in a single transaction. Rows whose
  /// `fact_key` is already present are skipped.
  fn append_facts(
    &self,
    facts: Vec<NewPerformanceFact>,
  ) -> impl Future<Output = Result<BatchOutcome, Self::Error>> + Send + '_;

  fn count_facts(&self) -> impl Future<Output = Result<u64, Self::Error>> + Send + '_;

  fn facts_for_vessel(
    &self,
    vessel_sk: i64,
  ) -> impl Future<Output = Result<Vec<PerformanceFact>, Self::Error>> + Send + '_;

  // ── Run audit ─────────────────────────────────────────────────────────

  fn record_load_run(
    &self,
    report: LoadReport,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  /// Recorded runs, oldest first.
  fn list_load_runs(
    &self,
  ) -> impl Future<Output = Result<Vec<LoadReport>, Self::Error>> + Send + '_;
}
