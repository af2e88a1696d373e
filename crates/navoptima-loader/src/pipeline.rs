//! The load run, stage by stage.

use chrono::Utc;
use navoptima_core::{run::LoadReport, telemetry::TelemetryRecord, warehouse::Warehouse};

use crate::{
  Result,
  clean::clean,
  config::LoaderConfig,
  dimensions::{ensure_placeholder_type, reconcile_vessels, reconcile_weather},
  error::store_err,
  facts,
};

/// Load already-extracted `records` into `warehouse`.
///
/// Stages: clean, vessel type, weather, vessels, facts, audit. Each stage
/// commits on its own, so a failure part-way leaves earlier stages in place;
/// every stage is safe to repeat.
pub async fn run<W: Warehouse>(
  warehouse:    &W,
  config:       &LoaderConfig,
  extract_path: &str,
  records:      Vec<TelemetryRecord>,
) -> Result<LoadReport> {
  let mut report = LoadReport::new(extract_path);
  report.extract_rows = records.len();
  tracing::info!(run_id = %report.run_id, rows = report.extract_rows, "load started");

  let cleaned = clean(records);
  report.dropped_rows = cleaned.dropped;
  report.cleaned_rows = cleaned.records.len();
  if cleaned.dropped > 0 {
    tracing::warn!(
      dropped = cleaned.dropped,
      "rows dropped for missing speed, draft, weather or fuel readings"
    );
  }
  tracing::info!(rows = report.cleaned_rows, "extract cleaned");

  let vessel_type = ensure_placeholder_type(warehouse, &config.vessel_type_placeholder).await?;
  report.vessel_type_id = vessel_type.vessel_type_id;

  let weather = reconcile_weather(warehouse, &cleaned.records, &config.weather_category).await?;
  report.weather_inserted = weather.inserted;

  let vessels =
    reconcile_vessels(warehouse, &cleaned.records, vessel_type.vessel_type_id).await?;
  report.vessels_inserted = vessels.inserted;
  report.vessels_superseded = vessels.superseded;
  report.vessel_changes_out_of_order = vessels.out_of_order;

  let assembled = facts::assemble(
    &cleaned.records,
    &vessels.lookup,
    &weather.lookup,
    config.bunker_price_per_ton,
    config.fact_dedup,
  );
  report.missing_vessel = assembled.missing_vessel;
  report.missing_weather = assembled.missing_weather;
  if report.excluded_rows() > 0 {
    tracing::warn!(
      missing_vessel = assembled.missing_vessel,
      missing_weather = assembled.missing_weather,
      "rows excluded from the fact load"
    );
  }

  let loaded = facts::load(warehouse, assembled.facts, config.batch_size).await?;
  report.facts_inserted = loaded.inserted;
  report.duplicate_facts = loaded.duplicates;
  report.batches = loaded.batches;
  if loaded.duplicates > 0 {
    tracing::info!(duplicates = loaded.duplicates, "facts already present were skipped");
  }

  report.finished_at = Some(Utc::now());
  warehouse
    .record_load_run(report.clone())
    .await
    .map_err(store_err)?;

  tracing::info!(
    run_id = %report.run_id,
    facts_inserted = report.facts_inserted,
    batches = report.batches,
    "load finished"
  );
  Ok(report)
}
