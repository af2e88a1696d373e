//! [`SqliteWarehouse`], the SQLite implementation of [`Warehouse`].

use std::path::Path;

use chrono::{DateTime, Utc};
use rusqlite::OptionalExtension as _;

use navoptima_core::{
  fact::{BatchOutcome, NewPerformanceFact, PerformanceFact},
  run::LoadReport,
  vessel::{NewVessel, Vessel, VesselType, open_ended},
  warehouse::Warehouse,
  weather::{NewWeatherMetric, WeatherMetric},
};

use crate::{
  Error, Result,
  encode::{
    RawFact, RawVessel, RawWeatherMetric, decode_report, encode_dt, encode_report, encode_uuid,
  },
  schema::SCHEMA,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A NavOptima warehouse backed by a single SQLite file.
///
/// The file is attached to a private in-memory connection under the
/// `gold_navoptima` schema name. Cloning is cheap; the inner connection is
/// reference-counted.
#[derive(Clone)]
pub struct SqliteWarehouse {
  conn: tokio_rusqlite::Connection,
}

impl SqliteWarehouse {
  /// Open (or create) a warehouse at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    Self::attach(path.as_ref().to_string_lossy().into_owned()).await
  }

  /// Open an in-memory warehouse, for tests.
  pub async fn open_in_memory() -> Result<Self> { Self::attach(":memory:".to_owned()).await }

  async fn attach(location: String) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema(location).await?;
    Ok(store)
  }

  async fn init_schema(&self, location: String) -> Result<()> {
    tracing::debug!(%location, "attaching warehouse");
    self
      .conn
      .call(move |conn| {
        conn.execute(
          "ATTACH DATABASE ?1 AS gold_navoptima",
          rusqlite::params![location],
        )?;
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }
}

fn insert_vessel_sql() -> &'static str {
  "INSERT INTO gold_navoptima.dim_vessels (
     mmsi, length_m, width_m, vessel_type_id, valid_from, valid_to, is_current
   ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, 1)
   ON CONFLICT DO NOTHING"
}

// ─── Warehouse impl ──────────────────────────────────────────────────────────

impl Warehouse for SqliteWarehouse {
  type Error = Error;

  // ── Vessel types ──────────────────────────────────────────────────────────

  async fn ensure_vessel_type(&self, type_name: String) -> Result<VesselType> {
    let name = type_name.clone();

    let id: Option<i64> = self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO gold_navoptima.dim_vessel_types (type_name) VALUES (?1)
           ON CONFLICT (type_name) DO NOTHING",
          rusqlite::params![name],
        )?;
        Ok(
          conn
            .query_row(
              "SELECT vessel_type_id FROM gold_navoptima.dim_vessel_types
               WHERE type_name = ?1",
              rusqlite::params![name],
              |r| r.get(0),
            )
            .optional()?,
        )
      })
      .await?;

    match id {
      Some(vessel_type_id) => Ok(VesselType { vessel_type_id, type_name }),
      None => Err(Error::VesselTypeMissing(type_name)),
    }
  }

  async fn list_vessel_types(&self) -> Result<Vec<VesselType>> {
    let types = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare(
          "SELECT vessel_type_id, type_name FROM gold_navoptima.dim_vessel_types
           ORDER BY vessel_type_id",
        )?;
        let rows = stmt
          .query_map([], |row| {
            Ok(VesselType {
              vessel_type_id: row.get(0)?,
              type_name:      row.get(1)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;
    Ok(types)
  }

  // ── Weather ───────────────────────────────────────────────────────────────

  async fn list_weather_metrics(&self) -> Result<Vec<WeatherMetric>> {
    let raws: Vec<RawWeatherMetric> = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare(
          "SELECT weather_metric_id, wind_speed_ms, wave_height_m, weather_category
           FROM gold_navoptima.dim_weather_metrics
           ORDER BY weather_metric_id",
        )?;
        let rows = stmt
          .query_map([], |row| {
            Ok(RawWeatherMetric {
              weather_metric_id: row.get(0)?,
              wind_speed_ms:     row.get(1)?,
              wave_height_m:     row.get(2)?,
              weather_category:  row.get(3)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawWeatherMetric::into_metric).collect()
  }

  async fn insert_weather_metrics(&self, metrics: Vec<NewWeatherMetric>) -> Result<usize> {
    let inserted = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let mut inserted = 0;
        {
          let mut stmt = tx.prepare(
            "INSERT INTO gold_navoptima.dim_weather_metrics
               (wind_speed_ms, wave_height_m, weather_category)
             VALUES (?1, ?2, ?3)
             ON CONFLICT (wind_speed_ms, wave_height_m) DO NOTHING",
          )?;
          for m in &metrics {
            inserted += stmt.execute(rusqlite::params![
              m.bucket.wind_speed_ms(),
              m.bucket.wave_height_m(),
              m.category,
            ])?;
          }
        }
        tx.commit()?;
        Ok(inserted)
      })
      .await?;
    Ok(inserted)
  }

  // ── Vessels ───────────────────────────────────────────────────────────────

  async fn list_vessels(&self, current_only: bool) -> Result<Vec<Vessel>> {
    let filter = if current_only { "WHERE is_current = 1" } else { "" };
    let sql = format!(
      "SELECT {} FROM gold_navoptima.dim_vessels {filter} ORDER BY mmsi, valid_from",
      RawVessel::COLUMNS,
    );

    let raws: Vec<RawVessel> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map([], RawVessel::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawVessel::into_vessel).collect()
  }

  async fn insert_vessels(&self, vessels: Vec<NewVessel>) -> Result<usize> {
    let valid_to = encode_dt(open_ended());

    let inserted = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let mut inserted = 0;
        {
          let mut stmt = tx.prepare(insert_vessel_sql())?;
          for v in &vessels {
            inserted += stmt.execute(rusqlite::params![
              v.mmsi,
              v.length_m,
              v.width_m,
              v.vessel_type_id,
              encode_dt(v.valid_from),
              valid_to,
            ])?;
          }
        }
        tx.commit()?;
        Ok(inserted)
      })
      .await?;
    Ok(inserted)
  }

  async fn supersede_vessel(
    &self,
    vessel_sk:   i64,
    expire_at:   DateTime<Utc>,
    replacement: NewVessel,
  ) -> Result<Vessel> {
    let expire_str = encode_dt(expire_at);
    let from_str   = encode_dt(replacement.valid_from);
    let to_str     = encode_dt(open_ended());
    let new        = replacement.clone();

    let new_sk: Option<i64> = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let expired = tx.execute(
          "UPDATE gold_navoptima.dim_vessels
           SET valid_to = ?2, is_current = 0
           WHERE vessel_sk = ?1 AND is_current = 1",
          rusqlite::params![vessel_sk, expire_str],
        )?;
        if expired == 0 {
          // Dropping `tx` rolls back.
          return Ok(None);
        }
        let inserted = tx.execute(
          insert_vessel_sql(),
          rusqlite::params![
            new.mmsi,
            new.length_m,
            new.width_m,
            new.vessel_type_id,
            from_str,
            to_str,
          ],
        )?;
        if inserted == 0 {
          return Ok(None);
        }
        let sk = tx.last_insert_rowid();
        tx.commit()?;
        Ok(Some(sk))
      })
      .await?;

    let Some(vessel_sk) = new_sk else {
      return Err(navoptima_core::Error::VesselNotCurrent { mmsi: replacement.mmsi }.into());
    };
    tracing::debug!(mmsi = replacement.mmsi, vessel_sk, "vessel superseded");

    Ok(Vessel {
      vessel_sk,
      mmsi: replacement.mmsi,
      length_m: replacement.length_m,
      width_m: replacement.width_m,
      vessel_type_id: replacement.vessel_type_id,
      valid_from: replacement.valid_from,
      valid_to: open_ended(),
      is_current: true,
    })
  }

  // ── Facts (append-only) ───────────────────────────────────────────────

  async fn append_facts(&self, facts: Vec<NewPerformanceFact>) -> Result<BatchOutcome> {
    let outcome = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let mut outcome = BatchOutcome::default();
        {
          let mut stmt = tx.prepare(
            "INSERT INTO gold_navoptima.fact_vessel_performance (
               timestamp_utc, vessel_sk, weather_metric_id, sog_knots, draft_m,
               fuel_consumption_kgh, fuel_cost_usd, fact_key
             ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
             ON CONFLICT (fact_key) DO NOTHING",
          )?;
          for f in &facts {
            let n = stmt.execute(rusqlite::params![
              encode_dt(f.timestamp_utc),
              f.vessel_sk,
              f.weather_metric_id,
              f.sog_knots,
              f.draft_m,
              f.fuel_consumption_kgh,
              f.fuel_cost_usd,
              f.fact_key,
            ])?;
            if n == 0 {
              outcome.duplicates += 1;
            } else {
              outcome.inserted += n;
            }
          }
        }
        tx.commit()?;
        Ok(outcome)
      })
      .await?;
    Ok(outcome)
  }

  async fn count_facts(&self) -> Result<u64> {
    let count: i64 = self
      .conn
      .call(|conn| {
        Ok(conn.query_row(
          "SELECT COUNT(*) FROM gold_navoptima.fact_vessel_performance",
          [],
          |r| r.get(0),
        )?)
      })
      .await?;
    Ok(count as u64)
  }

  async fn facts_for_vessel(&self, vessel_sk: i64) -> Result<Vec<PerformanceFact>> {
    let raws: Vec<RawFact> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT fact_id, timestamp_utc, vessel_sk, weather_metric_id, sog_knots,
                  draft_m, fuel_consumption_kgh, fuel_cost_usd, fact_key
           FROM gold_navoptima.fact_vessel_performance
           WHERE vessel_sk = ?1
           ORDER BY timestamp_utc, fact_id",
        )?;
        let rows = stmt
          .query_map(rusqlite::params![vessel_sk], |row| {
            Ok(RawFact {
              fact_id:              row.get(0)?,
              timestamp_utc:        row.get(1)?,
              vessel_sk:            row.get(2)?,
              weather_metric_id:    row.get(3)?,
              sog_knots:            row.get(4)?,
              draft_m:              row.get(5)?,
              fuel_consumption_kgh: row.get(6)?,
              fuel_cost_usd:        row.get(7)?,
              fact_key:             row.get(8)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawFact::into_fact).collect()
  }

  // ── Run audit ─────────────────────────────────────────────────────────────

  async fn record_load_run(&self, report: LoadReport) -> Result<()> {
    let run_id      = encode_uuid(report.run_id);
    let started_at  = encode_dt(report.started_at);
    let finished_at = report.finished_at.map(encode_dt);
    let json        = encode_report(&report)?;

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO gold_navoptima.etl_load_runs (run_id, started_at, finished_at, report_json)
           VALUES (?1, ?2, ?3, ?4)",
          rusqlite::params![run_id, started_at, finished_at, json],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn list_load_runs(&self) -> Result<Vec<LoadReport>> {
    let raws: Vec<String> = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare(
          "SELECT report_json FROM gold_navoptima.etl_load_runs ORDER BY started_at, rowid",
        )?;
        let rows = stmt
          .query_map([], |r| r.get(0))?
          .collect::<rusqlite::Result<Vec<String>>>()?;
        Ok(rows)
      })
      .await?;

    raws.iter().map(|s| decode_report(s)).collect()
  }
}
