//! Reading the bulk telemetry extract.
//!
//! The extract is a CSV file with a header row. The loader only looks at the
//! columns in [`REQUIRED_COLUMNS`]; any others are ignored. Empty cells are
//! nulls.

use std::{io, path::Path};

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use navoptima_core::telemetry::TelemetryRecord;
use serde::Deserialize;

use crate::{Error, Result};

/// Columns that must appear in the header, in no particular order.
pub const REQUIRED_COLUMNS: [&str; 8] = [
  "mmsi",
  "length",
  "sog",
  "draft",
  "wind_speed",
  "wave_height",
  "fuel_consumption",
  "timestamp",
];

const NAIVE_FORMATS: [&str; 2] = ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"];

#[derive(Debug, Deserialize)]
struct RawRow {
  // Written as a float by tools that widen integer columns containing nulls.
  mmsi:             Option<f64>,
  length:           Option<f64>,
  sog:              Option<f64>,
  draft:            Option<f64>,
  wind_speed:       Option<f64>,
  wave_height:      Option<f64>,
  fuel_consumption: Option<f64>,
  timestamp:        Option<String>,
}

/// Parse an event timestamp. Accepts RFC 3339, `YYYY-MM-DD HH:MM:SS[.f]`,
/// `YYYY-MM-DDTHH:MM:SS[.f]` and `YYYY-MM-DD`; values without an offset are
/// taken as UTC.
pub fn parse_timestamp(s: &str) -> Option<DateTime<Utc>> {
  if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
    return Some(dt.with_timezone(&Utc));
  }
  NAIVE_FORMATS
    .iter()
    .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
    .or_else(|| {
      NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
    })
    .map(|naive| naive.and_utc())
}

fn parse_mmsi(line: u64, value: Option<f64>) -> Result<Option<i64>> {
  match value {
    None => Ok(None),
    Some(v) if v.is_nan() => Ok(None),
    Some(v) if v.is_finite() && v.fract() == 0.0 => Ok(Some(v as i64)),
    Some(v) => Err(Error::MalformedRecord {
      line,
      reason: format!("mmsi {v} is not an integer"),
    }),
  }
}

/// Read the extract at `path` into memory.
///
/// Fails with [`Error::MissingSource`] if the file does not exist.
pub fn read_extract(path: &Path) -> Result<Vec<TelemetryRecord>> {
  if !path.is_file() {
    return Err(Error::MissingSource(path.to_path_buf()));
  }
  let file = std::fs::File::open(path).map_err(|e| Error::Csv(e.into()))?;
  read_extract_from(file)
}

/// Read an extract from any reader; see [`read_extract`].
pub fn read_extract_from<R: io::Read>(reader: R) -> Result<Vec<TelemetryRecord>> {
  let mut rdr = csv::ReaderBuilder::new()
    .trim(csv::Trim::All)
    .from_reader(reader);

  let headers = rdr.headers()?.clone();
  if let Some(missing) = REQUIRED_COLUMNS
    .into_iter()
    .find(|c| !headers.iter().any(|h| h == *c))
  {
    return Err(Error::MalformedRecord {
      line:   1,
      reason: format!("missing column {missing:?}"),
    });
  }

  let mut records = Vec::new();
  let mut raw = csv::StringRecord::new();
  while rdr.read_record(&mut raw)? {
    let line = raw.position().map_or(0, |p| p.line());
    let row: RawRow = raw
      .deserialize(Some(&headers))
      .map_err(|e| Error::MalformedRecord { line, reason: e.to_string() })?;

    let stamp = row.timestamp.as_deref().unwrap_or_default();
    let timestamp = parse_timestamp(stamp).ok_or_else(|| Error::MalformedRecord {
      line,
      reason: format!("unparseable timestamp {stamp:?}"),
    })?;

    records.push(TelemetryRecord {
      line,
      mmsi: parse_mmsi(line, row.mmsi)?,
      length: row.length,
      sog: row.sog,
      draft: row.draft,
      wind_speed: row.wind_speed,
      wave_height: row.wave_height,
      fuel_consumption: row.fuel_consumption,
      timestamp,
    });
  }

  Ok(records)
}
