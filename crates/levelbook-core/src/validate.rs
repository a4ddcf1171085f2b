//! Submission-time checks for rows.
//!
//! The reduction engine is total and never consults these rules; they run at
//! the boundary before a row is committed so that bad bookings are rejected
//! instead of silently reduced.

use std::collections::HashSet;

use crate::{
  Error, Result,
  row::{ChainageLevels, ChainageReading, Reading},
  survey::{Phase, Purpose},
};

impl Reading {
  /// Check this reading on its own against the phase of the purpose it is
  /// about to join.
  pub fn validate(&self, phase: Phase) -> Result<()> {
    match (self, phase) {
      (Self::Chainage(ch), _) => ch.validate(phase),
      (_, Phase::Proposal) => Err(Error::PhaseMismatch {
        phase,
        reading: self.discriminant(),
      }),
      (Self::InstrumentSetup { back_sight }, Phase::Actual) => {
        finite("back_sight", *back_sight)
      }
      (Self::Tbm { intermediate_sight }, Phase::Actual) => {
        finite("intermediate_sight", *intermediate_sight)
      }
      (Self::ChangePoint { fore_sight, back_sight }, Phase::Actual) => {
        finite("fore_sight", *fore_sight)?;
        finite("back_sight", *back_sight)
      }
    }
  }
}

impl ChainageReading {
  fn validate(&self, phase: Phase) -> Result<()> {
    if self.chainage.trim().is_empty() {
      return Err(Error::InvalidReading("chainage label is empty".into()));
    }
    finite("road_width", self.road_width)?;
    finite("spacing", self.spacing)?;

    match (&self.levels, phase) {
      (ChainageLevels::IntermediateSight(_), Phase::Actual)
      | (ChainageLevels::ReducedLevel(_), Phase::Proposal) => {}
      (ChainageLevels::IntermediateSight(_), Phase::Proposal) => {
        return Err(Error::PhaseMismatch { phase, reading: "intermediate_sight" });
      }
      (ChainageLevels::ReducedLevel(_), Phase::Actual) => {
        return Err(Error::PhaseMismatch { phase, reading: "reduced_level" });
      }
    }

    if self.offsets.is_empty() {
      return Err(Error::InvalidReading(format!(
        "chainage {} has no offsets",
        self.chainage
      )));
    }
    if self.levels.len() != self.offsets.len() {
      return Err(Error::InvalidReading(format!(
        "chainage {} has {} offsets but {} levels",
        self.chainage,
        self.offsets.len(),
        self.levels.len()
      )));
    }
    for (i, offset) in self.offsets.iter().enumerate() {
      finite("offset", *offset)?;
      if i > 0 && *offset <= self.offsets[i - 1] {
        return Err(Error::OffsetsNotAscending { index: i });
      }
    }
    match &self.levels {
      ChainageLevels::IntermediateSight(v) | ChainageLevels::ReducedLevel(v) => {
        v.iter().try_for_each(|x| finite("level", *x))
      }
    }
  }
}

impl ChainageReading {
  /// Check this row's offsets against another pass's booking of the same
  /// station. A shorter list is a partly entered row and only has to agree
  /// over the offsets it has.
  pub fn check_offsets(&self, booked: &ChainageReading) -> Result<()> {
    if self.offsets.iter().zip(&booked.offsets).all(|(a, b)| a == b) {
      Ok(())
    } else {
      Err(Error::OffsetMismatch(self.chainage.clone()))
    }
  }
}

fn finite(field: &str, value: f64) -> Result<()> {
  if value.is_finite() {
    Ok(())
  } else {
    Err(Error::InvalidReading(format!("{field} is not a finite number")))
  }
}

impl Purpose {
  /// Verify the append-order precondition: sequence numbers run 1, 2, 3, …
  pub fn check_sequence(&self) -> Result<()> {
    for (i, row) in self.rows.iter().enumerate() {
      let expected = i as u32 + 1;
      if row.seq != expected {
        return Err(Error::SequenceConflict { expected, found: row.seq });
      }
    }
    Ok(())
  }

  /// Check that `reading` may be committed as the next row of this purpose.
  ///
  /// For a paused purpose the provisional last row is ignored, since the new
  /// reading replaces it.
  pub fn validate_append(&self, reading: &Reading) -> Result<()> {
    if self.is_finished() {
      return Err(Error::PurposeFinished(self.purpose_id));
    }
    self.check_sequence()?;
    reading.validate(self.phase)?;

    let committed = self.committed_rows();
    if self.phase == Phase::Actual {
      let is_setup = matches!(reading, Reading::InstrumentSetup { .. });
      if committed.is_empty() && !is_setup {
        return Err(Error::InvalidReading(
          "the first row of a pass must be an instrument setup".into(),
        ));
      }
      if !committed.is_empty() && is_setup {
        return Err(Error::InvalidReading(
          "an instrument setup may only start a pass; use a change point".into(),
        ));
      }
    }

    if let Reading::Chainage(ch) = reading {
      let seen: HashSet<&str> = committed
        .iter()
        .filter_map(|row| match &row.reading {
          Reading::Chainage(c) => Some(c.chainage.as_str()),
          _ => None,
        })
        .collect();
      if seen.contains(ch.chainage.as_str()) {
        return Err(Error::DuplicateChainage(ch.chainage.clone()));
      }
    }
    Ok(())
  }

  /// Check that a chainage `reading` uses the same offsets as every other
  /// pass in `survey_purposes` that booked that station.
  pub fn validate_offsets_across(
    &self,
    reading: &Reading,
    survey_purposes: &[Purpose],
  ) -> Result<()> {
    let Reading::Chainage(ch) = reading else {
      return Ok(());
    };
    survey_purposes
      .iter()
      .filter(|p| p.purpose_id != self.purpose_id)
      .filter_map(|p| p.find_chainage(&ch.chainage))
      .try_for_each(|(_, booked)| ch.check_offsets(booked))
  }
}
