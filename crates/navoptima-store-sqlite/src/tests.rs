//! Integration tests for `SqliteWarehouse` against an in-memory database.

use chrono::{DateTime, TimeZone, Utc};
use navoptima_core::{
  fact::{NewPerformanceFact, fact_key},
  run::LoadReport,
  vessel::{NewVessel, open_ended},
  warehouse::Warehouse,
  weather::{NewWeatherMetric, WeatherBucket},
};

use crate::{Error, SqliteWarehouse};

async fn store() -> SqliteWarehouse {
  SqliteWarehouse::open_in_memory()
    .await
    .expect("in-memory warehouse")
}

fn at(day: u32) -> DateTime<Utc> { Utc.with_ymd_and_hms(2024, 2, day, 0, 0, 0).unwrap() }

fn weather(wind: i64, wave: i64) -> NewWeatherMetric {
  NewWeatherMetric {
    bucket:   WeatherBucket::from_tenths(wind, wave),
    category: "Measured".into(),
  }
}

fn vessel(mmsi: i64, type_id: i64, day: u32) -> NewVessel {
  NewVessel {
    mmsi,
    length_m: Some(200.0),
    width_m: None,
    vessel_type_id: type_id,
    valid_from: at(day),
  }
}

fn fact(vessel_sk: i64, metric: i64, day: u32, key: Option<String>) -> NewPerformanceFact {
  NewPerformanceFact {
    timestamp_utc: at(day),
    vessel_sk,
    weather_metric_id: metric,
    sog_knots: 12.5,
    draft_m: 7.2,
    fuel_consumption_kgh: 1_500.0,
    fuel_cost_usd: 975.0,
    fact_key: key,
  }
}

// ─── Vessel types ────────────────────────────────────────────────────────────

#[tokio::test]
async fn ensure_vessel_type_is_idempotent() {
  let s = store().await;

  let first = s.ensure_vessel_type("Unknown".into()).await.unwrap();
  let second = s.ensure_vessel_type("Unknown".into()).await.unwrap();
  assert_eq!(first, second);

  let all = s.list_vessel_types().await.unwrap();
  assert_eq!(all.len(), 1);
  assert_eq!(all[0].type_name, "Unknown");
}

#[tokio::test]
async fn distinct_vessel_types_get_distinct_ids() {
  let s = store().await;
  let a = s.ensure_vessel_type("Unknown".into()).await.unwrap();
  let b = s.ensure_vessel_type("Tanker".into()).await.unwrap();
  assert_ne!(a.vessel_type_id, b.vessel_type_id);
}

// ─── Weather ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn weather_insert_skips_existing_buckets() {
  let s = store().await;

  let n = s
    .insert_weather_metrics(vec![weather(123, 20), weather(124, 20)])
    .await
    .unwrap();
  assert_eq!(n, 2);

  let n = s
    .insert_weather_metrics(vec![weather(124, 20), weather(150, 25)])
    .await
    .unwrap();
  assert_eq!(n, 1);

  let all = s.list_weather_metrics().await.unwrap();
  assert_eq!(all.len(), 3);
  assert_eq!(all[0].bucket, WeatherBucket::from_tenths(123, 20));
  assert_eq!(all[0].bucket.wind_speed_ms(), 12.3);
}

#[tokio::test]
async fn duplicate_buckets_within_one_batch_collapse() {
  let s = store().await;
  let n = s
    .insert_weather_metrics(vec![weather(10, 10), weather(10, 10)])
    .await
    .unwrap();
  assert_eq!(n, 1);
}

// ─── Vessels ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn insert_vessels_skips_vessels_with_a_current_version() {
  let s = store().await;
  let t = s.ensure_vessel_type("Unknown".into()).await.unwrap();

  let n = s
    .insert_vessels(vec![vessel(1, t.vessel_type_id, 1), vessel(2, t.vessel_type_id, 1)])
    .await
    .unwrap();
  assert_eq!(n, 2);

  let n = s
    .insert_vessels(vec![vessel(2, t.vessel_type_id, 3), vessel(3, t.vessel_type_id, 3)])
    .await
    .unwrap();
  assert_eq!(n, 1);

  let current = s.list_vessels(true).await.unwrap();
  assert_eq!(current.len(), 3);
  let v2 = current.iter().find(|v| v.mmsi == 2).unwrap();
  assert_eq!(v2.valid_from, at(1));
  assert_eq!(v2.valid_to, open_ended());
  assert!(v2.is_current);
}

#[tokio::test]
async fn supersede_expires_old_version() {
  let s = store().await;
  let t = s.ensure_vessel_type("Unknown".into()).await.unwrap();
  s.insert_vessels(vec![vessel(9, t.vessel_type_id, 1)]).await.unwrap();
  let old = s.list_vessels(true).await.unwrap().remove(0);

  let mut replacement = vessel(9, t.vessel_type_id, 10);
  replacement.length_m = Some(210.0);
  let new = s
    .supersede_vessel(old.vessel_sk, at(10), replacement)
    .await
    .unwrap();
  assert_ne!(new.vessel_sk, old.vessel_sk);

  let all = s.list_vessels(false).await.unwrap();
  assert_eq!(all.len(), 2);
  let expired = all.iter().find(|v| v.vessel_sk == old.vessel_sk).unwrap();
  assert!(!expired.is_current);
  assert_eq!(expired.valid_to, at(10));

  let current = s.list_vessels(true).await.unwrap();
  assert_eq!(current.len(), 1);
  assert_eq!(current[0].vessel_sk, new.vessel_sk);
  assert_eq!(current[0].length_m, Some(210.0));
}

#[tokio::test]
async fn supersede_of_expired_version_fails_and_rolls_back() {
  let s = store().await;
  let t = s.ensure_vessel_type("Unknown".into()).await.unwrap();
  s.insert_vessels(vec![vessel(9, t.vessel_type_id, 1)]).await.unwrap();
  let old = s.list_vessels(true).await.unwrap().remove(0);
  s.supersede_vessel(old.vessel_sk, at(5), vessel(9, t.vessel_type_id, 5))
    .await
    .unwrap();

  let err = s
    .supersede_vessel(old.vessel_sk, at(8), vessel(9, t.vessel_type_id, 8))
    .await
    .unwrap_err();
  assert!(matches!(
    err,
    Error::Core(navoptima_core::Error::VesselNotCurrent { mmsi: 9 })
  ));
  assert_eq!(s.list_vessels(false).await.unwrap().len(), 2);
}

// ─── Facts ───────────────────────────────────────────────────────────────────

#[tokio::test]
async fn facts_with_keys_are_deduplicated() {
  let s = store().await;
  let t = s.ensure_vessel_type("Unknown".into()).await.unwrap();
  s.insert_vessels(vec![vessel(1, t.vessel_type_id, 1)]).await.unwrap();
  s.insert_weather_metrics(vec![weather(10, 10)]).await.unwrap();
  let v = s.list_vessels(true).await.unwrap().remove(0);
  let w = s.list_weather_metrics().await.unwrap().remove(0);

  let batch = vec![
    fact(v.vessel_sk, w.weather_metric_id, 1, Some(fact_key(1, at(1)))),
    fact(v.vessel_sk, w.weather_metric_id, 2, Some(fact_key(1, at(2)))),
  ];
  let first = s.append_facts(batch.clone()).await.unwrap();
  assert_eq!(first.inserted, 2);
  assert_eq!(first.duplicates, 0);

  let second = s.append_facts(batch).await.unwrap();
  assert_eq!(second.inserted, 0);
  assert_eq!(second.duplicates, 2);
  assert_eq!(s.count_facts().await.unwrap(), 2);
}

#[tokio::test]
async fn facts_without_keys_are_append_only() {
  let s = store().await;
  let t = s.ensure_vessel_type("Unknown".into()).await.unwrap();
  s.insert_vessels(vec![vessel(1, t.vessel_type_id, 1)]).await.unwrap();
  s.insert_weather_metrics(vec![weather(10, 10)]).await.unwrap();
  let v = s.list_vessels(true).await.unwrap().remove(0);
  let w = s.list_weather_metrics().await.unwrap().remove(0);

  let batch = vec![fact(v.vessel_sk, w.weather_metric_id, 1, None)];
  s.append_facts(batch.clone()).await.unwrap();
  s.append_facts(batch).await.unwrap();

  let facts = s.facts_for_vessel(v.vessel_sk).await.unwrap();
  assert_eq!(facts.len(), 2);
  assert_eq!(facts[0].timestamp_utc, at(1));
  assert_eq!(facts[0].fuel_cost_usd, 975.0);
}

#[tokio::test]
async fn fact_with_unknown_vessel_is_rejected() {
  let s = store().await;
  s.insert_weather_metrics(vec![weather(10, 10)]).await.unwrap();
  let w = s.list_weather_metrics().await.unwrap().remove(0);

  let result = s
    .append_facts(vec![fact(404, w.weather_metric_id, 1, None)])
    .await;
  assert!(matches!(result, Err(Error::Database(_))));
  assert_eq!(s.count_facts().await.unwrap(), 0);
}

// ─── Run audit ───────────────────────────────────────────────────────────────

#[tokio::test]
async fn load_runs_round_trip() {
  let s = store().await;
  let mut report = LoadReport::new("extract.csv");
  report.facts_inserted = 42;
  report.finished_at = Some(Utc::now());

  s.record_load_run(report.clone()).await.unwrap();

  let runs = s.list_load_runs().await.unwrap();
  assert_eq!(runs.len(), 1);
  assert_eq!(runs[0].run_id, report.run_id);
  assert_eq!(runs[0].facts_inserted, 42);
}

// ─── Persistence ─────────────────────────────────────────────────────────────

#[tokio::test]
async fn reopening_a_file_keeps_dimensions() {
  let dir = tempfile::tempdir().unwrap();
  let path = dir.path().join("warehouse.db");

  {
    let s = SqliteWarehouse::open(&path).await.unwrap();
    s.ensure_vessel_type("Unknown".into()).await.unwrap();
    s.insert_weather_metrics(vec![weather(5, 5)]).await.unwrap();
  }

  let s = SqliteWarehouse::open(&path).await.unwrap();
  assert_eq!(s.list_vessel_types().await.unwrap().len(), 1);
  assert_eq!(s.list_weather_metrics().await.unwrap().len(), 1);
}
