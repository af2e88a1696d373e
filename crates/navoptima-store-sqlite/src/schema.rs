//! SQL schema for the NavOptima SQLite warehouse.
//!
//! Executed once at connection startup after the warehouse file has been
//! attached as [`SCHEMA_NAME`]. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Name the warehouse database is attached under.
pub const SCHEMA_NAME: &str = "gold_navoptima";

/// Full schema DDL; idempotent thanks to `CREATE … IF NOT EXISTS`.
///
/// Table references inside `REFERENCES` and `ON` clauses are unqualified:
/// SQLite resolves them within the schema of the owning table.
pub const SCHEMA: &str = "
PRAGMA gold_navoptima.journal_mode = WAL;
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS gold_navoptima.dim_vessel_types (
    vessel_type_id INTEGER PRIMARY KEY AUTOINCREMENT,
    type_name      TEXT NOT NULL UNIQUE
);

-- Buckets are stored as tenths divided by ten; the pair is the natural key.
CREATE TABLE IF NOT EXISTS gold_navoptima.dim_weather_metrics (
    weather_metric_id INTEGER PRIMARY KEY AUTOINCREMENT,
    wind_speed_ms     REAL NOT NULL,
    wave_height_m     REAL NOT NULL,
    weather_category  TEXT NOT NULL,
    UNIQUE (wind_speed_ms, wave_height_m)
);

-- SCD type 2: one row per vessel version.
CREATE TABLE IF NOT EXISTS gold_navoptima.dim_vessels (
    vessel_sk      INTEGER PRIMARY KEY AUTOINCREMENT,
    mmsi           INTEGER NOT NULL,
    length_m       REAL,
    width_m        REAL,
    vessel_type_id INTEGER NOT NULL REFERENCES dim_vessel_types(vessel_type_id),
    valid_from     TEXT NOT NULL,   -- RFC 3339 UTC
    valid_to       TEXT NOT NULL,   -- RFC 3339 UTC; 9999-12-31 while current
    is_current     INTEGER NOT NULL DEFAULT 1,
    CHECK (valid_from < valid_to)
);

-- At most one current version per vessel.
CREATE UNIQUE INDEX IF NOT EXISTS gold_navoptima.dim_vessels_current_uq
    ON dim_vessels(mmsi) WHERE is_current = 1;
CREATE INDEX IF NOT EXISTS gold_navoptima.dim_vessels_mmsi_idx
    ON dim_vessels(mmsi);

-- Append-only. fact_key is NULL when deduplication is disabled; SQLite
-- treats NULLs as distinct under UNIQUE.
CREATE TABLE IF NOT EXISTS gold_navoptima.fact_vessel_performance (
    fact_id              INTEGER PRIMARY KEY AUTOINCREMENT,
    timestamp_utc        TEXT NOT NULL,
    vessel_sk            INTEGER NOT NULL REFERENCES dim_vessels(vessel_sk),
    weather_metric_id    INTEGER NOT NULL REFERENCES dim_weather_metrics(weather_metric_id),
    sog_knots            REAL NOT NULL,
    draft_m              REAL NOT NULL,
    fuel_consumption_kgh REAL NOT NULL,
    fuel_cost_usd        REAL NOT NULL,
    fact_key             TEXT UNIQUE
);

CREATE INDEX IF NOT EXISTS gold_navoptima.fact_vessel_idx
    ON fact_vessel_performance(vessel_sk);
CREATE INDEX IF NOT EXISTS gold_navoptima.fact_timestamp_idx
    ON fact_vessel_performance(timestamp_utc);

CREATE TABLE IF NOT EXISTS gold_navoptima.etl_load_runs (
    run_id      TEXT PRIMARY KEY,
    started_at  TEXT NOT NULL,
    finished_at TEXT,
    report_json TEXT NOT NULL
);

PRAGMA gold_navoptima.user_version = 1;
";
