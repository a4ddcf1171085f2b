//! Row types, one levelling observation each.
//!
//! A row is appended once and never edited. Its computed levels are recorded
//! alongside it at commit time so a later change point can seed the next leg
//! without replaying the whole line.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::numeric::{lenient_f64, lenient_vec};

// ─── Readings ────────────────────────────────────────────────────────────────

/// The per-offset levels of a chainage row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChainageLevels {
  /// Staff readings, one per offset (Actual phase).
  IntermediateSight(#[serde(deserialize_with = "lenient_vec")] Vec<f64>),
  /// Design levels, one per offset (Proposal phase).
  ReducedLevel(#[serde(deserialize_with = "lenient_vec")] Vec<f64>),
}

impl ChainageLevels {
  pub fn len(&self) -> usize {
    match self {
      Self::IntermediateSight(v) | Self::ReducedLevel(v) => v.len(),
    }
  }

  pub fn is_empty(&self) -> bool { self.len() == 0 }

  /// Intermediate sights, or nothing for directly-entered levels.
  pub fn sights(&self) -> &[f64] {
    match self {
      Self::IntermediateSight(v) => v,
      Self::ReducedLevel(_) => &[],
    }
  }
}

/// A station along the line with its transverse offsets.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChainageReading {
  /// Station label, e.g. `0/020`.
  pub chainage:   String,
  #[serde(default, deserialize_with = "lenient_f64")]
  pub road_width: f64,
  #[serde(default, deserialize_with = "lenient_f64")]
  pub spacing:    f64,
  /// Signed distances from the centreline, ascending.
  #[serde(default, deserialize_with = "lenient_vec")]
  pub offsets:    Vec<f64>,
  #[serde(flatten)]
  pub levels:     ChainageLevels,
}

/// The typed payload of a row. The variant name is the row `type`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Reading {
  /// Starts the line on the survey's benchmark.
  InstrumentSetup {
    #[serde(default, deserialize_with = "lenient_f64")]
    back_sight: f64,
  },
  Chainage(ChainageReading),
  /// A temporary benchmark; read like an intermediate sight.
  Tbm {
    #[serde(default, deserialize_with = "lenient_f64")]
    intermediate_sight: f64,
  },
  /// Closes the current instrument station and opens the next.
  #[serde(rename = "cp")]
  ChangePoint {
    #[serde(default, deserialize_with = "lenient_f64")]
    fore_sight: f64,
    #[serde(default, deserialize_with = "lenient_f64")]
    back_sight: f64,
  },
}

impl Reading {
  /// The `type` tag, matching the serde representation.
  pub fn discriminant(&self) -> &'static str {
    match self {
      Self::InstrumentSetup { .. } => "instrument_setup",
      Self::Chainage(_) => "chainage",
      Self::Tbm { .. } => "tbm",
      Self::ChangePoint { .. } => "cp",
    }
  }

  pub fn is_change_point(&self) -> bool { matches!(self, Self::ChangePoint { .. }) }
}

// ─── Computed levels ─────────────────────────────────────────────────────────

/// Height of instrument and reduced level(s) attributed to one row, rounded to
/// millimetres.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Reduction {
  pub height_of_instrument: Option<f64>,
  pub reduced_levels:       Vec<f64>,
}

impl Reduction {
  /// The level that anchors whatever row follows.
  pub fn last_level(&self) -> Option<f64> { self.reduced_levels.last().copied() }
}

// ─── Row ─────────────────────────────────────────────────────────────────────

/// A committed observation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Row {
  /// Position within the purpose, starting at 1 with no gaps.
  pub seq:         u32,
  pub reading:     Reading,
  pub remarks:     Option<String>,
  /// Levels computed when the row was committed, if recorded.
  pub reduction:   Option<Reduction>,
  pub recorded_at: DateTime<Utc>,
}

impl Row {
  /// A row with no remarks and no recorded levels.
  pub fn new(seq: u32, reading: Reading) -> Self {
    Self {
      seq,
      reading,
      remarks: None,
      reduction: None,
      recorded_at: Utc::now(),
    }
  }
}

/// Input to [`crate::store::SurveyStore::append_row`].
/// `recorded_at` is always set by the store.
#[derive(Debug, Clone)]
pub struct NewRow {
  pub seq:       u32,
  pub reading:   Reading,
  pub remarks:   Option<String>,
  pub reduction: Reduction,
}
