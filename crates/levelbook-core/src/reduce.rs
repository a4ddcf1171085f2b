//! Level reduction: turning staff readings into heights of instrument and
//! reduced levels by the height-of-collimation method.
//!
//! A line of levels is split into legs by change points. Each call replays
//! only the current leg, seeded from the change point that opened it, so rows
//! booked before that change point can never be disturbed by later entries.
//! Arithmetic runs unrounded; values are fixed to millimetres only when a
//! [`Reduction`] is emitted.

use crate::{
  numeric::round3,
  row::{ChainageLevels, Reading, Reduction, Row},
  survey::{Phase, Purpose, Survey},
};

// ─── Cursor ──────────────────────────────────────────────────────────────────

/// Running instrument state while walking a line of levels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LevelCursor {
  datum_rl:  f64,
  hi:        Option<f64>,
  rl:        Option<f64>,
  /// Row index of the change point that opened the current leg.
  leg_start: Option<usize>,
  /// Number of rows consumed so far.
  position:  usize,
}

impl LevelCursor {
  /// A cursor at the start of a line, before the instrument is set up.
  pub fn new(datum_rl: f64) -> Self {
    Self {
      datum_rl,
      hi: None,
      rl: None,
      leg_start: None,
      position: 0,
    }
  }

  /// A cursor positioned just after the change point at `cp_index`, seeded
  /// from the levels recorded for it. `None` if the record is incomplete.
  pub fn resume_after(
    datum_rl: f64,
    cp_index: usize,
    recorded: &Reduction,
  ) -> Option<Self> {
    Some(Self {
      datum_rl,
      hi: Some(recorded.height_of_instrument?),
      rl: Some(recorded.last_level()?),
      leg_start: Some(cp_index),
      position: cp_index + 1,
    })
  }

  pub fn height_of_instrument(&self) -> Option<f64> { self.hi }

  pub fn reduced_level(&self) -> Option<f64> { self.rl }

  pub fn leg_start(&self) -> Option<usize> { self.leg_start }

  pub fn position(&self) -> usize { self.position }

  /// Apply one row and return the levels attributable to it.
  pub fn advance(&mut self, reading: &Reading) -> Reduction {
    let levels = match reading {
      Reading::InstrumentSetup { back_sight } => {
        self.rl = Some(self.datum_rl);
        self.hi = Some(self.datum_rl + back_sight);
        vec![self.datum_rl]
      }
      Reading::Chainage(ch) => self.intermediate(ch.levels.sights()),
      Reading::Tbm { intermediate_sight } => {
        self.intermediate(std::slice::from_ref(intermediate_sight))
      }
      Reading::ChangePoint { fore_sight, back_sight } => match self.hi {
        Some(hi) => {
          let rl = hi - fore_sight;
          self.rl = Some(rl);
          self.hi = Some(rl + back_sight);
          self.leg_start = Some(self.position);
          vec![rl]
        }
        None => Vec::new(),
      },
    };
    self.position += 1;

    Reduction {
      height_of_instrument: self.hi.map(round3),
      reduced_levels:       levels.into_iter().map(round3).collect(),
    }
  }

  /// Apply a committed row. A change point with recorded levels re-anchors
  /// the cursor on that record, which is how [`reduce`] seeds the next leg,
  /// so a full replay agrees with the levels committed row by row.
  pub fn advance_row(&mut self, row: &Row) -> Reduction {
    let reduction = self.advance(&row.reading);
    if row.reading.is_change_point()
      && let Some(recorded) = &row.reduction
      && let (Some(hi), Some(rl)) = (recorded.height_of_instrument, recorded.last_level())
    {
      self.hi = Some(hi);
      self.rl = Some(rl);
    }
    reduction
  }

  /// `RL = HI − IS` for each sight; the last one anchors the next row.
  /// Without a height of instrument there is nothing to reduce against.
  fn intermediate(&mut self, sights: &[f64]) -> Vec<f64> {
    let Some(hi) = self.hi else {
      return Vec::new();
    };
    let levels: Vec<f64> = sights.iter().map(|is| hi - is).collect();
    if let Some(&last) = levels.last() {
      self.rl = Some(last);
    }
    levels
  }
}

// ─── Reduction ───────────────────────────────────────────────────────────────

/// Reduce the last row of `purpose`, or `new_row` if one is pending.
///
/// Returns the height of instrument and the reduced level(s) produced by that
/// row alone. A pending row is reduced as though it were appended, which lets
/// a form preview a booking before it is saved. A paused purpose's last row is
/// provisional and is discarded first.
pub fn reduce(survey: &Survey, purpose: &Purpose, new_row: Option<&Reading>) -> Reduction {
  let rows = purpose.committed_rows();
  let (history, target) = match new_row {
    Some(reading) => (rows, reading),
    None => match rows.split_last() {
      Some((last, rest)) => (rest, &last.reading),
      None => return Reduction::default(),
    },
  };

  if purpose.phase == Phase::Proposal {
    return design_levels(target);
  }

  let mut cursor = seed(survey, history);
  for row in &history[cursor.position()..] {
    cursor.advance_row(row);
  }
  tracing::debug!(
    purpose = %purpose.purpose_id,
    leg_start = ?cursor.leg_start(),
    replayed = history.len() - cursor.leg_start().map_or(0, |i| i + 1),
    "reduced pending row"
  );
  cursor.advance(target)
}

/// Reduce every row of `purpose` from the start of the line, one
/// [`Reduction`] per row. Legs opened by a recorded change point start from
/// that record.
pub fn reduce_all(survey: &Survey, purpose: &Purpose) -> Vec<Reduction> {
  match purpose.phase {
    Phase::Proposal => purpose.rows.iter().map(|r| design_levels(&r.reading)).collect(),
    Phase::Actual => {
      let mut cursor = LevelCursor::new(survey.datum_rl);
      purpose.rows.iter().map(|r| cursor.advance_row(r)).collect()
    }
  }
}

/// Position a cursor at the start of the current leg of `history`.
fn seed(survey: &Survey, history: &[Row]) -> LevelCursor {
  let Some(cp_index) = history.iter().rposition(|r| r.reading.is_change_point())
  else {
    return LevelCursor::new(survey.datum_rl);
  };

  if let Some(cursor) = history[cp_index]
    .reduction
    .as_ref()
    .and_then(|rec| LevelCursor::resume_after(survey.datum_rl, cp_index, rec))
  {
    return cursor;
  }

  // No usable record on the change point: rebuild it from the start.
  let mut cursor = LevelCursor::new(survey.datum_rl);
  for row in &history[..=cp_index] {
    cursor.advance_row(row);
  }
  cursor
}

/// Proposal rows carry their levels directly; reduction is the identity.
fn design_levels(reading: &Reading) -> Reduction {
  match reading {
    Reading::Chainage(ch) => match &ch.levels {
      ChainageLevels::ReducedLevel(levels) => Reduction {
        height_of_instrument: None,
        reduced_levels:       levels.iter().copied().map(round3).collect(),
      },
      ChainageLevels::IntermediateSight(_) => Reduction::default(),
    },
    _ => Reduction::default(),
  }
}
