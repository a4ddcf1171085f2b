//! Encoding and decoding helpers between Rust domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! All timestamps are stored as RFC 3339 strings. Readings and reductions are
//! stored as compact JSON. UUIDs are stored as hyphenated lowercase strings.

use chrono::{DateTime, Utc};
use levelbook_core::{
  row::{Reading, Reduction, Row},
  survey::{Phase, Purpose, PurposeKind, PurposeStatus, Survey},
};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Uuid ────────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

// ─── DateTime<Utc> ───────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339() }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

// ─── Phase ───────────────────────────────────────────────────────────────────

pub fn encode_phase(p: Phase) -> &'static str {
  match p {
    Phase::Actual => "actual",
    Phase::Proposal => "proposal",
  }
}

pub fn decode_phase(s: &str) -> Result<Phase> {
  match s {
    "actual" => Ok(Phase::Actual),
    "proposal" => Ok(Phase::Proposal),
    other => Err(Error::UnknownValue { column: "phase", value: other.to_owned() }),
  }
}

// ─── PurposeStatus ───────────────────────────────────────────────────────────

pub fn encode_status(s: PurposeStatus) -> &'static str {
  match s {
    PurposeStatus::Active => "active",
    PurposeStatus::Paused => "paused",
    PurposeStatus::Finished => "finished",
  }
}

pub fn decode_status(s: &str) -> Result<PurposeStatus> {
  match s {
    "active" => Ok(PurposeStatus::Active),
    "paused" => Ok(PurposeStatus::Paused),
    "finished" => Ok(PurposeStatus::Finished),
    other => Err(Error::UnknownValue { column: "status", value: other.to_owned() }),
  }
}

// ─── Reading / Reduction ─────────────────────────────────────────────────────

pub fn encode_reading(r: &Reading) -> Result<String> { Ok(serde_json::to_string(r)?) }

pub fn encode_reduction(r: &Reduction) -> Result<String> {
  Ok(serde_json::to_string(r)?)
}

// ─── Row types ───────────────────────────────────────────────────────────────

/// Raw values read directly from a `surveys` row.
pub struct RawSurvey {
  pub survey_id:         String,
  pub name:              String,
  pub instrument:        String,
  pub datum_rl:          f64,
  pub chainage_multiple: u32,
  pub finished:          bool,
  pub created_at:        String,
}

impl RawSurvey {
  pub const COLUMNS: &'static str =
    "survey_id, name, instrument, datum_rl, chainage_multiple, finished, created_at";

  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      survey_id:         row.get(0)?,
      name:              row.get(1)?,
      instrument:        row.get(2)?,
      datum_rl:          row.get(3)?,
      chainage_multiple: row.get(4)?,
      finished:          row.get(5)?,
      created_at:        row.get(6)?,
    })
  }

  pub fn into_survey(self) -> Result<Survey> {
    Ok(Survey {
      survey_id:         decode_uuid(&self.survey_id)?,
      name:              self.name,
      instrument:        self.instrument,
      datum_rl:          self.datum_rl,
      chainage_multiple: self.chainage_multiple,
      finished:          self.finished,
      created_at:        decode_dt(&self.created_at)?,
    })
  }
}

/// Raw values read directly from a `purposes` row.
pub struct RawPurpose {
  pub purpose_id:       String,
  pub survey_id:        String,
  pub kind:             String,
  pub phase:            String,
  pub status:           String,
  pub final_fore_sight: Option<f64>,
  pub created_at:       String,
}

impl RawPurpose {
  pub const COLUMNS: &'static str =
    "purpose_id, survey_id, kind, phase, status, final_fore_sight, created_at";

  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      purpose_id:       row.get(0)?,
      survey_id:        row.get(1)?,
      kind:             row.get(2)?,
      phase:            row.get(3)?,
      status:           row.get(4)?,
      final_fore_sight: row.get(5)?,
      created_at:       row.get(6)?,
    })
  }

  /// Assemble the purpose; `rows` must already be in `seq` order.
  pub fn into_purpose(self, rows: Vec<RawRow>) -> Result<Purpose> {
    Ok(Purpose {
      purpose_id:       decode_uuid(&self.purpose_id)?,
      survey_id:        decode_uuid(&self.survey_id)?,
      kind:             PurposeKind::from(self.kind),
      phase:            decode_phase(&self.phase)?,
      status:           decode_status(&self.status)?,
      final_fore_sight: self.final_fore_sight,
      rows:             rows.into_iter().map(RawRow::into_row).collect::<Result<_>>()?,
      created_at:       decode_dt(&self.created_at)?,
    })
  }
}

/// Raw values read directly from an `observations` row.
pub struct RawRow {
  pub purpose_id:     String,
  pub seq:            u32,
  pub reading_json:   String,
  pub remarks:        Option<String>,
  pub reduction_json: Option<String>,
  pub recorded_at:    String,
}

impl RawRow {
  pub const COLUMNS: &'static str =
    "purpose_id, seq, reading_json, remarks, reduction_json, recorded_at";

  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      purpose_id:     row.get(0)?,
      seq:            row.get(1)?,
      reading_json:   row.get(2)?,
      remarks:        row.get(3)?,
      reduction_json: row.get(4)?,
      recorded_at:    row.get(5)?,
    })
  }

  pub fn into_row(self) -> Result<Row> {
    Ok(Row {
      seq:         self.seq,
      reading:     serde_json::from_str(&self.reading_json)?,
      remarks:     self.remarks,
      reduction:   self
        .reduction_json
        .as_deref()
        .map(serde_json::from_str)
        .transpose()?,
      recorded_at: decode_dt(&self.recorded_at)?,
    })
  }
}
