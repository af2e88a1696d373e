//! Performance facts: one row per vessel per telemetry timestamp.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Bunker price used when none is configured, in USD per metric ton.
pub const DEFAULT_BUNKER_PRICE_PER_TON: f64 = 650.0;

/// Fuel cost in USD, rounded to cents, for a consumption rate in kg/h.
pub fn fuel_cost_usd(fuel_consumption_kgh: f64, bunker_price_per_ton: f64) -> f64 {
  (fuel_consumption_kgh / 1000.0 * bunker_price_per_ton * 100.0).round() / 100.0
}

/// Idempotency key of a fact: hex SHA-256 of `mmsi|timestamp`.
pub fn fact_key(mmsi: i64, timestamp: DateTime<Utc>) -> String {
  let digest = Sha256::digest(format!("{mmsi}|{}", timestamp.to_rfc3339()));
  hex::encode(digest)
}

/// A fact ready to append.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewPerformanceFact {
  pub timestamp_utc:        DateTime<Utc>,
  pub vessel_sk:            i64,
  pub weather_metric_id:    i64,
  pub sog_knots:            f64,
  pub draft_m:              f64,
  pub fuel_consumption_kgh: f64,
  pub fuel_cost_usd:        f64,
  /// `None` disables deduplication for this row.
  pub fact_key:             Option<String>,
}

/// A row of `fact_vessel_performance`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceFact {
  pub fact_id:              i64,
  pub timestamp_utc:        DateTime<Utc>,
  pub vessel_sk:            i64,
  pub weather_metric_id:    i64,
  pub sog_knots:            f64,
  pub draft_m:              f64,
  pub fuel_consumption_kgh: f64,
  pub fuel_cost_usd:        f64,
  pub fact_key:             Option<String>,
}

/// Result of appending one batch of facts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchOutcome {
  pub inserted:   usize,
  /// Rows skipped because their `fact_key` was already present.
  pub duplicates: usize,
}

#[cfg(test)]
mod tests {
  use chrono::TimeZone;

  use super::*;

  #[test]
  fn cost_uses_price_per_ton() {
    assert_eq!(fuel_cost_usd(1000.0, DEFAULT_BUNKER_PRICE_PER_TON), 650.0);
    assert_eq!(fuel_cost_usd(1234.0, 650.0), 802.1);
    assert_eq!(fuel_cost_usd(0.0, 650.0), 0.0);
  }

  #[test]
  fn cost_is_rounded_to_cents() {
    // 1.111 kg/h * 0.65 USD/kg = 0.72215
    assert_eq!(fuel_cost_usd(1.111, 650.0), 0.72);
  }

  #[test]
  fn fact_key_is_stable_and_distinct() {
    let t0 = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
    let t1 = Utc.with_ymd_and_hms(2024, 1, 1, 0, 5, 0).unwrap();
    assert_eq!(fact_key(1, t0), fact_key(1, t0));
    assert_ne!(fact_key(1, t0), fact_key(1, t1));
    assert_ne!(fact_key(1, t0), fact_key(2, t0));
    assert_eq!(fact_key(1, t0).len(), 64);
  }
}
