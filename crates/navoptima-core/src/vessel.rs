//! Vessel and vessel-type dimensions, and the slowly-changing-dimension
//! (type 2) transitions of a vessel.
//!
//! A vessel moves through two states per version: `current` and `expired`.
//! The transitions are planned here, without touching storage, by
//! [`plan_transition`]; a backend applies them.
//!
//! ```text
//!   absent ──insert──▶ current ──attribute change──▶ expired
//!                                        └──────────▶ new current
//! ```

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

/// Lengths closer than this are the same observation.
const LENGTH_TOLERANCE: f64 = 1e-9;

/// `valid_to` of every current version: 9999-12-31T00:00:00Z.
pub fn open_ended() -> DateTime<Utc> {
  Utc
    .with_ymd_and_hms(9999, 12, 31, 0, 0, 0)
    .single()
    .expect("9999-12-31 is a valid UTC date")
}

// ─── Vessel types ────────────────────────────────────────────────────────────

/// A row of `dim_vessel_types`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VesselType {
  pub vessel_type_id: i64,
  pub type_name:      String,
}

// ─── Vessels ─────────────────────────────────────────────────────────────────

/// One version of a vessel in `dim_vessels`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Vessel {
  pub vessel_sk:      i64,
  pub mmsi:           i64,
  pub length_m:       Option<f64>,
  pub width_m:        Option<f64>,
  pub vessel_type_id: i64,
  pub valid_from:     DateTime<Utc>,
  pub valid_to:       DateTime<Utc>,
  pub is_current:     bool,
}

impl Vessel {
  /// Whether this version was the valid one at `at` (`valid_to` exclusive).
  pub fn is_valid_at(&self, at: DateTime<Utc>) -> bool {
    self.valid_from <= at && at < self.valid_to
  }
}

/// A vessel version about to be written. It is always inserted as current,
/// with `valid_to` set to [`open_ended`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewVessel {
  pub mmsi:           i64,
  pub length_m:       Option<f64>,
  pub width_m:        Option<f64>,
  pub vessel_type_id: i64,
  pub valid_from:     DateTime<Utc>,
}

/// A stretch of an extract during which a vessel reported one length.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LengthRun {
  pub length_m: f64,
  /// Earliest timestamp of the stretch.
  pub seen_at:  DateTime<Utc>,
}

/// What one load saw of a vessel, aggregated over its rows in the extract.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObservedVessel {
  pub mmsi:       i64,
  /// Earliest timestamp of any row for this vessel.
  pub first_seen: DateTime<Utc>,
  /// Non-null lengths in time order, consecutive repeats collapsed. Empty
  /// when no row had a length.
  pub lengths:    Vec<LengthRun>,
}

impl ObservedVessel {
  /// Aggregate `(timestamp, length)` readings of one vessel. Rows with the
  /// same timestamp keep their input order. `None` for no readings.
  pub fn from_readings(
    mmsi: i64,
    readings: impl IntoIterator<Item = (DateTime<Utc>, Option<f64>)>,
  ) -> Option<Self> {
    let mut readings: Vec<_> = readings.into_iter().collect();
    readings.sort_by_key(|&(at, _)| at);
    let first_seen = readings.first()?.0;

    let mut lengths: Vec<LengthRun> = Vec::new();
    for (seen_at, length_m) in readings {
      let Some(length_m) = length_m else { continue };
      if lengths
        .last()
        .is_some_and(|run| same_length(Some(run.length_m), length_m))
      {
        continue;
      }
      lengths.push(LengthRun { length_m, seen_at });
    }

    Some(Self { mmsi, first_seen, lengths })
  }

  /// Length reported by the earliest row that had one.
  pub fn first_length(&self) -> Option<f64> { self.lengths.first().map(|r| r.length_m) }
}

// ─── Transitions ─────────────────────────────────────────────────────────────

/// The storage operation that brings a vessel one step closer to an
/// observation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum VesselTransition {
  /// `absent → current`.
  Insert(NewVessel),
  /// The current version already matches.
  Unchanged,
  /// `current → expired + new current`.
  Supersede {
    vessel_sk:   i64,
    expire_at:   DateTime<Utc>,
    replacement: NewVessel,
  },
  /// The extract reports a different length at the start of the current
  /// version, so no later change can be applied on top of it.
  OutOfOrder {
    vessel_sk: i64,
    change_at: DateTime<Utc>,
  },
}

fn same_length(stored: Option<f64>, observed: f64) -> bool {
  stored.is_some_and(|a| (a - observed).abs() < LENGTH_TOLERANCE)
}

/// Decide the next step for the vessel whose current version is `current`.
///
/// Apply the result and call again with the new current version until the
/// answer is [`VesselTransition::Unchanged`] or
/// [`VesselTransition::OutOfOrder`]. Each supersede starts strictly later
/// than the version it closes, so the sequence ends. New vessels reference
/// `vessel_type_id`.
pub fn plan_transition(
  current:        Option<&Vessel>,
  observed:       &ObservedVessel,
  vessel_type_id: i64,
) -> VesselTransition {
  let Some(current) = current else {
    return VesselTransition::Insert(NewVessel {
      mmsi: observed.mmsi,
      length_m: observed.first_length(),
      width_m: None,
      vessel_type_id,
      valid_from: observed.first_seen,
    });
  };

  let (before, after): (Vec<&LengthRun>, Vec<&LengthRun>) = observed
    .lengths
    .iter()
    .partition(|r| r.seen_at <= current.valid_from);

  // The length in force when the current version started must agree with it.
  if let Some(in_force) = before.last()
    && !same_length(current.length_m, in_force.length_m)
  {
    return VesselTransition::OutOfOrder {
      vessel_sk: current.vessel_sk,
      change_at: in_force.seen_at,
    };
  }

  let Some(change) = after
    .into_iter()
    .find(|r| !same_length(current.length_m, r.length_m))
  else {
    return VesselTransition::Unchanged;
  };

  VesselTransition::Supersede {
    vessel_sk:   current.vessel_sk,
    expire_at:   change.seen_at,
    replacement: NewVessel {
      mmsi: observed.mmsi,
      length_m: Some(change.length_m),
      width_m: current.width_m,
      vessel_type_id: current.vessel_type_id,
      valid_from: change.seen_at,
    },
  }
}
