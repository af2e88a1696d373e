//! Dropping rows the fact table cannot hold.

use navoptima_core::telemetry::{CleanRecord, TelemetryRecord};

/// Output of [`clean`].
#[derive(Debug, Clone, Default)]
pub struct Cleaned {
  pub records: Vec<CleanRecord>,
  /// Input rows missing at least one required measurement.
  pub dropped: usize,
}

/// Keep rows with speed, draft, wind speed, wave height and fuel consumption
/// all present; count the rest. Order is preserved.
pub fn clean(records: Vec<TelemetryRecord>) -> Cleaned {
  let total = records.len();
  let records: Vec<CleanRecord> = records
    .into_iter()
    .filter_map(TelemetryRecord::into_clean)
    .collect();
  Cleaned { dropped: total - records.len(), records }
}

#[cfg(test)]
mod tests {
  use chrono::{TimeZone, Utc};

  use super::*;

  fn row(line: u64, draft: Option<f64>, wind: Option<f64>) -> TelemetryRecord {
    TelemetryRecord {
      line,
      mmsi: Some(1),
      length: None,
      sog: Some(10.0),
      draft,
      wind_speed: wind,
      wave_height: Some(1.0),
      fuel_consumption: Some(800.0),
      timestamp: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
    }
  }

  #[test]
  fn one_null_draft_in_three_rows() {
    let cleaned = clean(vec![
      row(2, Some(7.0), Some(3.0)),
      row(3, None, Some(3.0)),
      row(4, Some(7.1), Some(3.0)),
    ]);
    assert_eq!(cleaned.records.len(), 2);
    assert_eq!(cleaned.dropped, 1);
    assert_eq!(cleaned.records[0].line, 2);
    assert_eq!(cleaned.records[1].line, 4);
  }

  #[test]
  fn row_with_several_nulls_counts_once() {
    let cleaned = clean(vec![row(2, None, None)]);
    assert!(cleaned.records.is_empty());
    assert_eq!(cleaned.dropped, 1);
  }

  #[test]
  fn empty_extract() {
    let cleaned = clean(Vec::new());
    assert_eq!(cleaned.dropped, 0);
    assert!(cleaned.records.is_empty());
  }
}
