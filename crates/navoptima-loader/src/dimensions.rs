//! Dimension reconciliation: bring the vessel-type, weather and vessel
//! dimensions up to date with a cleaned extract, then build the in-memory
//! lookups used to resolve surrogate keys for facts.
//!
//! Every insert goes through the warehouse's insert-if-absent primitives, so
//! a row that appeared between the read and the write (another loader, a
//! retried run) is skipped rather than duplicated. The read is still done to
//! know what is new and to report it.

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

use chrono::{DateTime, Utc};
use navoptima_core::{
  telemetry::CleanRecord,
  vessel::{ObservedVessel, Vessel, VesselTransition, VesselType, plan_transition},
  warehouse::Warehouse,
  weather::{NewWeatherMetric, WeatherBucket},
};

use crate::{Result, error::store_err};

// ─── Vessel types ────────────────────────────────────────────────────────────

/// Make sure the placeholder vessel type exists and return it.
pub async fn ensure_placeholder_type<W: Warehouse>(
  warehouse: &W,
  type_name: &str,
) -> Result<VesselType> {
  let vessel_type = warehouse
    .ensure_vessel_type(type_name.to_owned())
    .await
    .map_err(store_err)?;
  tracing::info!(
    type_name,
    vessel_type_id = vessel_type.vessel_type_id,
    "placeholder vessel type ready"
  );
  Ok(vessel_type)
}

// ─── Weather ─────────────────────────────────────────────────────────────────

/// Weather bucket → `weather_metric_id`.
#[derive(Debug, Clone, Default)]
pub struct WeatherLookup {
  ids: HashMap<WeatherBucket, i64>,
}

impl WeatherLookup {
  pub fn get(&self, bucket: WeatherBucket) -> Option<i64> { self.ids.get(&bucket).copied() }

  pub fn len(&self) -> usize { self.ids.len() }

  pub fn is_empty(&self) -> bool { self.ids.is_empty() }
}

impl FromIterator<(WeatherBucket, i64)> for WeatherLookup {
  fn from_iter<I: IntoIterator<Item = (WeatherBucket, i64)>>(iter: I) -> Self {
    Self { ids: iter.into_iter().collect() }
  }
}

#[derive(Debug, Clone)]
pub struct WeatherReconciliation {
  pub inserted: usize,
  pub lookup:   WeatherLookup,
}

/// Distinct weather buckets of `records`, ordered.
pub fn distinct_buckets(records: &[CleanRecord]) -> BTreeSet<WeatherBucket> {
  records.iter().map(CleanRecord::weather_bucket).collect()
}

/// Insert the buckets of `records` that the weather dimension lacks, tagged
/// with `category`, and return the full bucket lookup.
pub async fn reconcile_weather<W: Warehouse>(
  warehouse: &W,
  records:   &[CleanRecord],
  category:  &str,
) -> Result<WeatherReconciliation> {
  let wanted = distinct_buckets(records);

  let existing: HashSet<WeatherBucket> = warehouse
    .list_weather_metrics()
    .await
    .map_err(store_err)?
    .into_iter()
    .map(|m| m.bucket)
    .collect();

  let missing: Vec<NewWeatherMetric> = wanted
    .iter()
    .filter(|b| !existing.contains(b))
    .map(|&bucket| NewWeatherMetric { bucket, category: category.to_owned() })
    .collect();

  let inserted = if missing.is_empty() {
    0
  } else {
    let expected = missing.len();
    let n = warehouse
      .insert_weather_metrics(missing)
      .await
      .map_err(store_err)?;
    if n != expected {
      tracing::warn!(expected, inserted = n, "weather buckets appeared during reconciliation");
    }
    n
  };

  let lookup: WeatherLookup = warehouse
    .list_weather_metrics()
    .await
    .map_err(store_err)?
    .into_iter()
    .map(|m| (m.bucket, m.weather_metric_id))
    .collect();

  tracing::info!(
    distinct = wanted.len(),
    inserted,
    dimension_rows = lookup.len(),
    "weather dimension reconciled"
  );
  Ok(WeatherReconciliation { inserted, lookup })
}

// ─── Vessels ─────────────────────────────────────────────────────────────────

/// Natural key → every known version of that vessel, ordered by
/// `valid_from`.
#[derive(Debug, Clone, Default)]
pub struct VesselLookup {
  versions: HashMap<i64, Vec<Vessel>>,
}

impl VesselLookup {
  pub fn from_versions(vessels: Vec<Vessel>) -> Self {
    let mut versions: HashMap<i64, Vec<Vessel>> = HashMap::new();
    for v in vessels {
      versions.entry(v.mmsi).or_default().push(v);
    }
    for list in versions.values_mut() {
      list.sort_by_key(|v| v.valid_from);
    }
    Self { versions }
  }

  /// Surrogate key of the version of `mmsi` valid at `at`, or of its current
  /// version when no version covers `at`.
  pub fn resolve(&self, mmsi: i64, at: DateTime<Utc>) -> Option<i64> {
    let versions = self.versions.get(&mmsi)?;
    versions
      .iter()
      .find(|v| v.is_valid_at(at))
      .or_else(|| versions.iter().find(|v| v.is_current))
      .map(|v| v.vessel_sk)
  }

  /// Number of distinct vessels.
  pub fn len(&self) -> usize { self.versions.len() }

  pub fn is_empty(&self) -> bool { self.versions.is_empty() }
}

#[derive(Debug, Clone)]
pub struct VesselReconciliation {
  pub inserted:     usize,
  pub superseded:   usize,
  pub out_of_order: usize,
  pub lookup:       VesselLookup,
}

/// Aggregate the cleaned rows per vessel: earliest timestamp and the
/// time-ordered runs of non-null lengths. Rows without an `mmsi` are skipped.
pub fn observe_vessels(records: &[CleanRecord]) -> Vec<ObservedVessel> {
  let mut readings: BTreeMap<i64, Vec<(DateTime<Utc>, Option<f64>)>> = BTreeMap::new();
  for r in records {
    let Some(mmsi) = r.mmsi else { continue };
    readings
      .entry(mmsi)
      .or_default()
      .push((r.timestamp, r.length));
  }

  readings
    .into_iter()
    .filter_map(|(mmsi, rows)| ObservedVessel::from_readings(mmsi, rows))
    .collect()
}

fn current_versions(vessels: Vec<Vessel>) -> HashMap<i64, Vessel> {
  vessels.into_iter().map(|v| (v.mmsi, v)).collect()
}

/// Apply the SCD2 transitions implied by `records` and return the vessel
/// lookup. New vessels reference `vessel_type_id`.
///
/// A vessel whose length changes several times within the extract gets one
/// new version per change.
pub async fn reconcile_vessels<W: Warehouse>(
  warehouse:      &W,
  records:        &[CleanRecord],
  vessel_type_id: i64,
) -> Result<VesselReconciliation> {
  let observed = observe_vessels(records);

  let mut current = current_versions(warehouse.list_vessels(true).await.map_err(store_err)?);

  let inserts: Vec<_> = observed
    .iter()
    .filter_map(|obs| match plan_transition(current.get(&obs.mmsi), obs, vessel_type_id) {
      VesselTransition::Insert(new) => Some(new),
      _ => None,
    })
    .collect();

  let inserted = if inserts.is_empty() {
    0
  } else {
    let n = warehouse.insert_vessels(inserts).await.map_err(store_err)?;
    current = current_versions(warehouse.list_vessels(true).await.map_err(store_err)?);
    n
  };

  let mut superseded = 0;
  let mut out_of_order = 0;

  for obs in &observed {
    let mut version = current.remove(&obs.mmsi);
    loop {
      match plan_transition(version.as_ref(), obs, vessel_type_id) {
        VesselTransition::Supersede { vessel_sk, expire_at, replacement } => {
          tracing::info!(
            mmsi = obs.mmsi,
            vessel_sk,
            %expire_at,
            length_m = ?replacement.length_m,
            "vessel attributes changed; superseding version"
          );
          let next = warehouse
            .supersede_vessel(vessel_sk, expire_at, replacement)
            .await
            .map_err(store_err)?;
          superseded += 1;
          version = Some(next);
        }
        VesselTransition::OutOfOrder { vessel_sk, change_at } => {
          tracing::warn!(
            mmsi = obs.mmsi,
            vessel_sk,
            %change_at,
            "vessel change predates its current version; ignored"
          );
          out_of_order += 1;
          break;
        }
        // An insert here means the vessel vanished after it was written.
        VesselTransition::Insert(_) | VesselTransition::Unchanged => break,
      }
    }
  }

  let lookup = VesselLookup::from_versions(warehouse.list_vessels(false).await.map_err(store_err)?);

  tracing::info!(
    observed = observed.len(),
    inserted,
    superseded,
    out_of_order,
    "vessel dimension reconciled"
  );
  Ok(VesselReconciliation { inserted, superseded, out_of_order, lookup })
}
