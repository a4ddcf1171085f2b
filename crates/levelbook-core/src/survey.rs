//! Surveys and purposes, the envelopes that own a line of levels.
//!
//! A survey is one physical levelling job anchored on a starting benchmark.
//! Each purpose is one pass over that job (the original ground, a design
//! surface, a finished pavement layer) and owns its rows in capture order.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::row::{ChainageReading, Reading, Row};

// ─── Survey ──────────────────────────────────────────────────────────────────

/// One levelling job. Immutable after creation except for `finished`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Survey {
  pub survey_id:         Uuid,
  pub name:              String,
  pub instrument:        String,
  /// Reduced level of the starting benchmark.
  pub datum_rl:          f64,
  /// Station interval in metres, used to suggest the next chainage.
  pub chainage_multiple: u32,
  pub finished:          bool,
  pub created_at:        DateTime<Utc>,
}

/// Input to [`crate::store::SurveyStore::create_survey`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewSurvey {
  pub name:              String,
  #[serde(default)]
  pub instrument:        String,
  pub datum_rl:          f64,
  #[serde(default = "default_chainage_multiple")]
  pub chainage_multiple: u32,
}

fn default_chainage_multiple() -> u32 { 20 }

// ─── Purpose classification ──────────────────────────────────────────────────

/// Whether a purpose's levels come from staff readings or are typed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Phase {
  /// Field-measured; levels are reduced from intermediate sights.
  Actual,
  /// Design levels entered directly.
  Proposal,
}

impl fmt::Display for Phase {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(match self {
      Self::Actual => "Actual",
      Self::Proposal => "Proposal",
    })
  }
}

#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize,
)]
pub enum PurposeStatus {
  #[default]
  Active,
  /// The surveyor stepped away; the last row is provisional.
  Paused,
  /// Terminal. No further rows may be appended.
  Finished,
}

/// The pass a purpose records. Serialised as its display label.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum PurposeKind {
  InitialLevel,
  ProposedLevel,
  FinalGsb,
  FinalWmm,
  FinalDbm,
  FinalBc,
  Custom(String),
}

impl PurposeKind {
  /// The phase a purpose of this kind is created with unless overridden.
  pub fn default_phase(&self) -> Phase {
    match self {
      Self::ProposedLevel => Phase::Proposal,
      _ => Phase::Actual,
    }
  }
}

impl fmt::Display for PurposeKind {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(match self {
      Self::InitialLevel => "Initial Level",
      Self::ProposedLevel => "Proposed Level",
      Self::FinalGsb => "Final GSB",
      Self::FinalWmm => "Final WMM",
      Self::FinalDbm => "Final DBM",
      Self::FinalBc => "Final BC",
      Self::Custom(label) => label,
    })
  }
}

impl From<String> for PurposeKind {
  fn from(label: String) -> Self {
    match label.as_str() {
      "Initial Level" => Self::InitialLevel,
      "Proposed Level" => Self::ProposedLevel,
      "Final GSB" => Self::FinalGsb,
      "Final WMM" => Self::FinalWmm,
      "Final DBM" => Self::FinalDbm,
      "Final BC" => Self::FinalBc,
      _ => Self::Custom(label),
    }
  }
}

impl From<PurposeKind> for String {
  fn from(kind: PurposeKind) -> Self { kind.to_string() }
}

// ─── Purpose ─────────────────────────────────────────────────────────────────

/// One levelling pass over a survey, with its rows in append order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Purpose {
  pub purpose_id:       Uuid,
  pub survey_id:        Uuid,
  pub kind:             PurposeKind,
  pub phase:            Phase,
  pub status:           PurposeStatus,
  /// Foresight onto the starting benchmark, recorded when the pass closes.
  pub final_fore_sight: Option<f64>,
  pub rows:             Vec<Row>,
  pub created_at:       DateTime<Utc>,
}

impl Purpose {
  pub fn is_finished(&self) -> bool { self.status == PurposeStatus::Finished }

  /// Rows that count as committed. A paused purpose's last row is
  /// provisional and is left out.
  pub fn committed_rows(&self) -> &[Row] {
    match (self.status, self.rows.split_last()) {
      (PurposeStatus::Paused, Some((_, rest))) => rest,
      _ => &self.rows,
    }
  }

  pub fn last_seq(&self) -> u32 { self.rows.last().map_or(0, |r| r.seq) }

  /// Chainage rows in recorded order, with their row index.
  pub fn chainages(&self) -> impl Iterator<Item = (usize, &ChainageReading)> {
    self
      .rows
      .iter()
      .enumerate()
      .filter_map(|(i, row)| match &row.reading {
        Reading::Chainage(ch) => Some((i, ch)),
        _ => None,
      })
  }

  /// The first chainage row whose label equals `label` exactly.
  pub fn find_chainage(&self, label: &str) -> Option<(usize, &ChainageReading)> {
    self.chainages().find(|(_, ch)| ch.chainage == label)
  }
}

/// Input to [`crate::store::SurveyStore::create_purpose`].
#[derive(Debug, Clone)]
pub struct NewPurpose {
  pub survey_id: Uuid,
  pub kind:      PurposeKind,
  pub phase:     Phase,
}

impl NewPurpose {
  /// A purpose with the kind's default phase.
  pub fn new(survey_id: Uuid, kind: PurposeKind) -> Self {
    let phase = kind.default_phase();
    Self { survey_id, kind, phase }
  }
}
