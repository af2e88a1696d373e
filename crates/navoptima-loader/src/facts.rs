//! Fact assembly and the batched append.

use navoptima_core::{
  fact::{NewPerformanceFact, fact_key, fuel_cost_usd},
  telemetry::CleanRecord,
  warehouse::Warehouse,
};

use crate::{
  Result,
  dimensions::{VesselLookup, WeatherLookup},
  error::store_err,
};

/// Facts ready to load plus the rows that could not be joined.
#[derive(Debug, Clone, Default)]
pub struct Assembled {
  pub facts:           Vec<NewPerformanceFact>,
  /// Rows with no `mmsi` or no resolvable vessel version. A row missing both
  /// its vessel and its weather bucket is counted here only.
  pub missing_vessel:  usize,
  pub missing_weather: usize,
}

/// Resolve surrogate keys for every cleaned row and compute its fuel cost.
pub fn assemble(
  records:              &[CleanRecord],
  vessels:              &VesselLookup,
  weather:              &WeatherLookup,
  bunker_price_per_ton: f64,
  dedup:                bool,
) -> Assembled {
  let mut out = Assembled::default();

  for r in records {
    let Some((mmsi, vessel_sk)) = r
      .mmsi
      .and_then(|mmsi| vessels.resolve(mmsi, r.timestamp).map(|sk| (mmsi, sk)))
    else {
      out.missing_vessel += 1;
      continue;
    };
    let Some(weather_metric_id) = weather.get(r.weather_bucket()) else {
      out.missing_weather += 1;
      continue;
    };

    out.facts.push(NewPerformanceFact {
      timestamp_utc: r.timestamp,
      vessel_sk,
      weather_metric_id,
      sog_knots: r.sog,
      draft_m: r.draft,
      fuel_consumption_kgh: r.fuel_consumption,
      fuel_cost_usd: fuel_cost_usd(r.fuel_consumption, bunker_price_per_ton),
      fact_key: dedup.then(|| fact_key(mmsi, r.timestamp)),
    });
  }

  out
}

/// Totals of [`load`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FactLoad {
  pub inserted:   usize,
  pub duplicates: usize,
  pub batches:    usize,
}

/// Append `facts` in batches of `batch_size`, one transaction per batch.
///
/// A failure leaves earlier batches committed; with idempotency keys a rerun
/// picks up where this one stopped.
pub async fn load<W: Warehouse>(
  warehouse:  &W,
  facts:      Vec<NewPerformanceFact>,
  batch_size: usize,
) -> Result<FactLoad> {
  let batch_size = batch_size.max(1);
  let total = facts.len();
  let mut totals = FactLoad::default();

  let mut facts = facts.into_iter().peekable();
  while facts.peek().is_some() {
    let batch: Vec<_> = facts.by_ref().take(batch_size).collect();
    let outcome = warehouse.append_facts(batch).await.map_err(store_err)?;
    totals.inserted += outcome.inserted;
    totals.duplicates += outcome.duplicates;
    totals.batches += 1;
    tracing::info!(
      batch = totals.batches,
      inserted = outcome.inserted,
      duplicates = outcome.duplicates,
      processed = totals.inserted + totals.duplicates,
      total,
      "fact batch committed"
    );
  }

  Ok(totals)
}

#[cfg(test)]
mod tests {
  use chrono::{DateTime, TimeZone, Utc};
  use navoptima_core::{
    vessel::{Vessel, open_ended},
    weather::WeatherBucket,
  };

  use super::*;

  fn at(minute: u32) -> DateTime<Utc> { Utc.with_ymd_and_hms(2024, 6, 1, 0, minute, 0).unwrap() }

  fn rec(mmsi: Option<i64>, wind: f64, minute: u32) -> CleanRecord {
    CleanRecord {
      line: 0,
      mmsi,
      length: None,
      sog: 11.0,
      draft: 8.0,
      wind_speed: wind,
      wave_height: 2.0,
      fuel_consumption: 1234.0,
      timestamp: at(minute),
    }
  }

  fn lookups() -> (VesselLookup, WeatherLookup) {
    let vessels = VesselLookup::from_versions(vec![Vessel {
      vessel_sk: 7,
      mmsi: 1,
      length_m: None,
      width_m: None,
      vessel_type_id: 1,
      valid_from: at(0),
      valid_to: open_ended(),
      is_current: true,
    }]);
    let weather = [(WeatherBucket::from_tenths(50, 20), 3)].into_iter().collect();
    (vessels, weather)
  }

  #[test]
  fn assembles_joined_rows_with_cost() {
    let (vessels, weather) = lookups();
    let out = assemble(&[rec(Some(1), 5.0, 1)], &vessels, &weather, 650.0, true);
    assert_eq!(out.facts.len(), 1);
    let f = &out.facts[0];
    assert_eq!(f.vessel_sk, 7);
    assert_eq!(f.weather_metric_id, 3);
    assert_eq!(f.fuel_cost_usd, 802.1);
    assert_eq!(f.fact_key.as_deref(), Some(fact_key(1, at(1)).as_str()));
  }

  #[test]
  fn counts_join_misses() {
    let (vessels, weather) = lookups();
    let out = assemble(
      &[
        rec(None, 5.0, 1),
        rec(Some(2), 5.0, 1),
        rec(Some(1), 9.9, 1),
        rec(Some(2), 9.9, 1),
        rec(Some(1), 5.0, 2),
      ],
      &vessels,
      &weather,
      650.0,
      false,
    );
    assert_eq!(out.facts.len(), 1);
    assert_eq!(out.missing_vessel, 3);
    assert_eq!(out.missing_weather, 1);
    assert_eq!(out.facts[0].fact_key, None);
  }
}
