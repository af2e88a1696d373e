//! The summary of one loader execution.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Counters collected while loading one extract. Persisted as an audit row in
/// the warehouse and printed by the loader binary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoadReport {
  pub run_id:       Uuid,
  pub started_at:   DateTime<Utc>,
  pub finished_at:  Option<DateTime<Utc>>,
  pub extract_path: String,

  pub extract_rows: usize,
  /// Rows removed for a missing required measurement.
  pub dropped_rows: usize,
  pub cleaned_rows: usize,

  pub vessel_type_id:   i64,
  pub weather_inserted: usize,
  pub vessels_inserted: usize,
  pub vessels_superseded: usize,
  pub vessel_changes_out_of_order: usize,

  /// Cleaned rows left out of the fact load because no vessel version could
  /// be resolved for them.
  pub missing_vessel:  usize,
  /// Cleaned rows left out of the fact load because their weather bucket is
  /// not in the dimension.
  pub missing_weather: usize,

  pub facts_inserted:  usize,
  pub duplicate_facts: usize,
  pub batches:         usize,
}

impl LoadReport {
  pub fn new(extract_path: impl Into<String>) -> Self {
    Self {
      run_id: Uuid::new_v4(),
      started_at: Utc::now(),
      finished_at: None,
      extract_path: extract_path.into(),
      extract_rows: 0,
      dropped_rows: 0,
      cleaned_rows: 0,
      vessel_type_id: 0,
      weather_inserted: 0,
      vessels_inserted: 0,
      vessels_superseded: 0,
      vessel_changes_out_of_order: 0,
      missing_vessel: 0,
      missing_weather: 0,
      facts_inserted: 0,
      duplicate_facts: 0,
      batches: 0,
    }
  }

  /// Total cleaned rows that did not reach the fact table through a join miss.
  pub fn excluded_rows(&self) -> usize { self.missing_vessel + self.missing_weather }
}
