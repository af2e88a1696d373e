//! Encoding and decoding helpers between domain types and the plain
//! representations stored in SQLite columns.
//!
//! Timestamps are stored as fixed-width RFC 3339 strings (microseconds, `Z`
//! suffix) so that lexical order in SQL matches chronological order. Weather
//! buckets are stored as `REAL` and coerced back to tenths on read.

use chrono::{DateTime, SecondsFormat, Utc};
use navoptima_core::{
  fact::PerformanceFact,
  run::LoadReport,
  vessel::Vessel,
  weather::{WeatherBucket, WeatherMetric},
};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Uuid ─────────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

// ─── DateTime<Utc> ────────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339_opts(SecondsFormat::Micros, true) }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(format!("{s:?}: {e}")))
}

// ─── LoadReport ───────────────────────────────────────────────────────────────

pub fn encode_report(report: &LoadReport) -> Result<String> { Ok(serde_json::to_string(report)?) }

pub fn decode_report(s: &str) -> Result<LoadReport> { Ok(serde_json::from_str(s)?) }

// ─── Raw row types ───────────────────────────────────────────────────────────

/// A `dim_weather_metrics` row exactly as read from SQLite.
pub struct RawWeatherMetric {
  pub weather_metric_id: i64,
  pub wind_speed_ms:     f64,
  pub wave_height_m:     f64,
  pub weather_category:  String,
}

impl RawWeatherMetric {
  pub fn into_metric(self) -> Result<WeatherMetric> {
    Ok(WeatherMetric {
      weather_metric_id: self.weather_metric_id,
      bucket:            WeatherBucket::from_stored(self.wind_speed_ms, self.wave_height_m)?,
      category:          self.weather_category,
    })
  }
}

/// A `dim_vessels` row exactly as read from SQLite.
pub struct RawVessel {
  pub vessel_sk:      i64,
  pub mmsi:           i64,
  pub length_m:       Option<f64>,
  pub width_m:        Option<f64>,
  pub vessel_type_id: i64,
  pub valid_from:     String,
  pub valid_to:       String,
  pub is_current:     bool,
}

impl RawVessel {
  pub const COLUMNS: &'static str = "vessel_sk, mmsi, length_m, width_m, vessel_type_id, \
                                     valid_from, valid_to, is_current";

  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      vessel_sk:      row.get(0)?,
      mmsi:           row.get(1)?,
      length_m:       row.get(2)?,
      width_m:        row.get(3)?,
      vessel_type_id: row.get(4)?,
      valid_from:     row.get(5)?,
      valid_to:       row.get(6)?,
      is_current:     row.get(7)?,
    })
  }

  pub fn into_vessel(self) -> Result<Vessel> {
    Ok(Vessel {
      vessel_sk:      self.vessel_sk,
      mmsi:           self.mmsi,
      length_m:       self.length_m,
      width_m:        self.width_m,
      vessel_type_id: self.vessel_type_id,
      valid_from:     decode_dt(&self.valid_from)?,
      valid_to:       decode_dt(&self.valid_to)?,
      is_current:     self.is_current,
    })
  }
}

/// A `fact_vessel_performance` row exactly as read from SQLite.
pub struct RawFact {
  pub fact_id:              i64,
  pub timestamp_utc:        String,
  pub vessel_sk:            i64,
  pub weather_metric_id:    i64,
  pub sog_knots:            f64,
  pub draft_m:              f64,
  pub fuel_consumption_kgh: f64,
  pub fuel_cost_usd:        f64,
  pub fact_key:             Option<String>,
}

impl RawFact {
  pub fn into_fact(self) -> Result<PerformanceFact> {
    Ok(PerformanceFact {
      fact_id:              self.fact_id,
      timestamp_utc:        decode_dt(&self.timestamp_utc)?,
      vessel_sk:            self.vessel_sk,
      weather_metric_id:    self.weather_metric_id,
      sog_knots:            self.sog_knots,
      draft_m:              self.draft_m,
      fuel_consumption_kgh: self.fuel_consumption_kgh,
      fuel_cost_usd:        self.fuel_cost_usd,
      fact_key:             self.fact_key,
    })
  }
}

#[cfg(test)]
mod tests {
  use chrono::TimeZone;
  use navoptima_core::vessel::open_ended;

  use super::*;

  #[test]
  fn timestamps_sort_lexically() {
    let a = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
    let b = a + chrono::Duration::milliseconds(500);
    assert!(encode_dt(a) < encode_dt(b));
    assert!(encode_dt(b) < encode_dt(open_ended()));
  }

  #[test]
  fn timestamp_round_trip() {
    let a = Utc.with_ymd_and_hms(2023, 7, 14, 8, 30, 15).unwrap();
    assert_eq!(decode_dt(&encode_dt(a)).unwrap(), a);
    assert_eq!(encode_dt(a), "2023-07-14T08:30:15.000000Z");
  }

  #[test]
  fn bad_timestamp_is_reported() {
    assert!(matches!(decode_dt("yesterday"), Err(Error::DateParse(_))));
  }
}
