//! Weather dimension types and the bucket key used to match raw readings
//! against it.
//!
//! A bucket is a `(wind speed, wave height)` pair rounded to one decimal
//! place. Internally both halves are held as integer tenths, which is the
//! only representation ever compared or hashed. Floating-point values only
//! exist at the edges: raw readings coming in, `REAL` columns going out.

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Round `value` to the nearest tenth, half away from zero, and return the
/// result as a count of tenths (`12.36 -> 124`).
pub fn round_to_tenths(value: f64) -> i64 { (value * 10.0).round() as i64 }

/// Coerce a value read back from storage into tenths.
///
/// Fails instead of guessing when the value is not finite or does not sit on
/// the 0.1 grid, since a silent mismatch would make the anti-join treat an
/// existing row as new.
pub fn stored_to_tenths(column: &'static str, value: f64) -> Result<i64> {
  if !value.is_finite() {
    return Err(Error::BucketCoercion { column, value });
  }
  let scaled = value * 10.0;
  let rounded = scaled.round();
  if (scaled - rounded).abs() > 1e-6 {
    return Err(Error::BucketCoercion { column, value });
  }
  Ok(rounded as i64)
}

/// The weather-dimension match key.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct WeatherBucket {
  wind_tenths: i64,
  wave_tenths: i64,
}

impl WeatherBucket {
  pub fn from_tenths(wind_tenths: i64, wave_tenths: i64) -> Self {
    Self { wind_tenths, wave_tenths }
  }

  /// Bucket raw readings from the extract.
  pub fn from_measurements(wind_speed: f64, wave_height: f64) -> Self {
    Self::from_tenths(round_to_tenths(wind_speed), round_to_tenths(wave_height))
  }

  /// Rebuild a bucket from the two `REAL` columns of the dimension table.
  pub fn from_stored(wind_speed_ms: f64, wave_height_m: f64) -> Result<Self> {
    Ok(Self::from_tenths(
      stored_to_tenths("wind_speed_ms", wind_speed_ms)?,
      stored_to_tenths("wave_height_m", wave_height_m)?,
    ))
  }

  pub fn wind_tenths(&self) -> i64 { self.wind_tenths }

  pub fn wave_tenths(&self) -> i64 { self.wave_tenths }

  /// Wind speed in m/s as written to storage.
  pub fn wind_speed_ms(&self) -> f64 { self.wind_tenths as f64 / 10.0 }

  /// Wave height in metres as written to storage.
  pub fn wave_height_m(&self) -> f64 { self.wave_tenths as f64 / 10.0 }
}

/// A row of `dim_weather_metrics`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherMetric {
  pub weather_metric_id: i64,
  pub bucket:            WeatherBucket,
  pub category:          String,
}

/// A weather row to be inserted if its bucket is absent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewWeatherMetric {
  pub bucket:   WeatherBucket,
  pub category: String,
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn rounds_to_one_decimal() {
    assert_eq!(round_to_tenths(12.34), 123);
    assert_eq!(round_to_tenths(12.36), 124);
    assert_eq!(round_to_tenths(0.0), 0);
  }

  #[test]
  fn rounds_half_away_from_zero() {
    assert_eq!(round_to_tenths(0.25), 3);
    assert_eq!(round_to_tenths(-0.25), -3);
    assert_eq!(round_to_tenths(1.75), 18);
  }

  #[test]
  fn nearby_readings_share_a_bucket() {
    let a = WeatherBucket::from_measurements(12.31, 2.04);
    let b = WeatherBucket::from_measurements(12.349, 1.96);
    assert_eq!(a, b);
  }

  #[test]
  fn readings_either_side_of_the_midpoint_split() {
    let a = WeatherBucket::from_measurements(12.34, 2.0);
    let b = WeatherBucket::from_measurements(12.36, 2.0);
    assert_ne!(a, b);
    assert_eq!(a.wind_tenths(), 123);
    assert_eq!(b.wind_tenths(), 124);
  }

  #[test]
  fn stored_values_round_trip_through_tenths() {
    let bucket = WeatherBucket::from_measurements(15.04, 2.55);
    let back = WeatherBucket::from_stored(bucket.wind_speed_ms(), bucket.wave_height_m())
      .unwrap();
    assert_eq!(bucket, back);
  }

  #[test]
  fn stored_value_off_grid_is_rejected() {
    let err = WeatherBucket::from_stored(12.34, 1.0).unwrap_err();
    assert!(matches!(err, Error::BucketCoercion { column: "wind_speed_ms", .. }));
  }

  #[test]
  fn stored_nan_is_rejected() {
    assert!(WeatherBucket::from_stored(1.0, f64::NAN).is_err());
  }
}
