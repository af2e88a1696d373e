//! Telemetry records as they come out of the extract, before and after
//! cleaning.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::weather::WeatherBucket;

/// One row of the bulk extract with its timestamp already parsed.
///
/// Every measurement is optional; which ones are required is decided by
/// [`TelemetryRecord::into_clean`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TelemetryRecord {
  /// 1-based line number in the source file, header included.
  pub line:             u64,
  pub mmsi:             Option<i64>,
  pub length:           Option<f64>,
  pub sog:              Option<f64>,
  pub draft:            Option<f64>,
  pub wind_speed:       Option<f64>,
  pub wave_height:      Option<f64>,
  pub fuel_consumption: Option<f64>,
  pub timestamp:        DateTime<Utc>,
}

/// A record with every field the fact table needs present and finite.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CleanRecord {
  pub line:             u64,
  /// Rows without a vessel identifier survive cleaning but can never be
  /// joined to the vessel dimension.
  pub mmsi:             Option<i64>,
  pub length:           Option<f64>,
  pub sog:              f64,
  pub draft:            f64,
  pub wind_speed:       f64,
  pub wave_height:      f64,
  pub fuel_consumption: f64,
  pub timestamp:        DateTime<Utc>,
}

impl CleanRecord {
  /// The weather-dimension match key for this row.
  pub fn weather_bucket(&self) -> WeatherBucket {
    WeatherBucket::from_measurements(self.wind_speed, self.wave_height)
  }
}

fn present(value: Option<f64>) -> Option<f64> { value.filter(|v| v.is_finite()) }

impl TelemetryRecord {
  /// Convert into a [`CleanRecord`], or `None` if any of speed, draft, wind
  /// speed, wave height or fuel consumption is missing. `NaN` and infinite
  /// readings count as missing.
  pub fn into_clean(self) -> Option<CleanRecord> {
    Some(CleanRecord {
      line:             self.line,
      mmsi:             self.mmsi,
      length:           present(self.length),
      sog:              present(self.sog)?,
      draft:            present(self.draft)?,
      wind_speed:       present(self.wind_speed)?,
      wave_height:      present(self.wave_height)?,
      fuel_consumption: present(self.fuel_consumption)?,
      timestamp:        self.timestamp,
    })
  }
}

#[cfg(test)]
mod tests {
  use chrono::TimeZone;

  use super::*;

  fn record() -> TelemetryRecord {
    TelemetryRecord {
      line:             2,
      mmsi:             Some(219_000_001),
      length:           Some(180.0),
      sog:              Some(12.5),
      draft:            Some(7.2),
      wind_speed:       Some(6.04),
      wave_height:      Some(1.26),
      fuel_consumption: Some(1_450.0),
      timestamp:        Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap(),
    }
  }

  #[test]
  fn complete_record_is_kept() {
    let clean = record().into_clean().unwrap();
    assert_eq!(clean.sog, 12.5);
    assert_eq!(clean.weather_bucket(), WeatherBucket::from_tenths(60, 13));
  }

  #[test]
  fn missing_required_field_drops_record() {
    let mut r = record();
    r.draft = None;
    assert!(r.into_clean().is_none());
  }

  #[test]
  fn nan_counts_as_missing() {
    let mut r = record();
    r.wave_height = Some(f64::NAN);
    assert!(r.into_clean().is_none());
  }

  #[test]
  fn optional_fields_do_not_drop_record() {
    let mut r = record();
    r.mmsi = None;
    r.length = Some(f64::NAN);
    let clean = r.into_clean().unwrap();
    assert_eq!(clean.mmsi, None);
    assert_eq!(clean.length, None);
  }
}
