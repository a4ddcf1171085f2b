//! Builders shared by the unit tests in this crate.

use chrono::Utc;
use uuid::Uuid;

use crate::{
  row::{ChainageLevels, ChainageReading, Reading, Row},
  survey::{Phase, Purpose, PurposeKind, PurposeStatus, Survey},
};

pub fn survey(datum_rl: f64) -> Survey {
  Survey {
    survey_id: Uuid::new_v4(),
    name: "NH-48 widening".into(),
    instrument: "Auto level AL-24".into(),
    datum_rl,
    chainage_multiple: 20,
    finished: false,
    created_at: Utc::now(),
  }
}

pub fn setup(back_sight: f64) -> Reading { Reading::InstrumentSetup { back_sight } }

pub fn tbm(intermediate_sight: f64) -> Reading { Reading::Tbm { intermediate_sight } }

pub fn cp(fore_sight: f64, back_sight: f64) -> Reading {
  Reading::ChangePoint { fore_sight, back_sight }
}

pub fn chainage(label: &str, offsets: &[f64], sights: &[f64]) -> Reading {
  Reading::Chainage(ChainageReading {
    chainage:   label.into(),
    road_width: 7.0,
    spacing:    offsets.windows(2).map(|w| w[1] - w[0]).next().unwrap_or(0.0),
    offsets:    offsets.to_vec(),
    levels:     ChainageLevels::IntermediateSight(sights.to_vec()),
  })
}

pub fn proposal_chainage(label: &str, offsets: &[f64], levels: &[f64]) -> Reading {
  Reading::Chainage(ChainageReading {
    chainage:   label.into(),
    road_width: 7.0,
    spacing:    0.0,
    offsets:    offsets.to_vec(),
    levels:     ChainageLevels::ReducedLevel(levels.to_vec()),
  })
}

pub fn purpose(kind: PurposeKind, phase: Phase, readings: Vec<Reading>) -> Purpose {
  Purpose {
    purpose_id: Uuid::new_v4(),
    survey_id: Uuid::new_v4(),
    kind,
    phase,
    status: PurposeStatus::Active,
    final_fore_sight: None,
    rows: readings
      .into_iter()
      .enumerate()
      .map(|(i, reading)| Row::new(i as u32 + 1, reading))
      .collect(),
    created_at: Utc::now(),
  }
}

pub fn actual_purpose(readings: Vec<Reading>) -> Purpose {
  purpose(PurposeKind::InitialLevel, Phase::Actual, readings)
}

pub fn proposal_purpose(readings: Vec<Reading>) -> Purpose {
  purpose(PurposeKind::ProposedLevel, Phase::Proposal, readings)
}
