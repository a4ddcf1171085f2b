//! The level book: a booking ledger for a whole pass, ending in the closing
//! check back onto the starting benchmark.

use serde::{Deserialize, Serialize};

use crate::{
  numeric::round3,
  reduce::LevelCursor,
  row::{ChainageLevels, Reading},
  survey::{Phase, Purpose, Survey},
};

// ─── Ledger ──────────────────────────────────────────────────────────────────

/// One line of the level book. Columns follow the printed field book.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LedgerLine {
  #[serde(rename = "CH")]
  pub chainage:             Option<String>,
  #[serde(rename = "BS")]
  pub back_sight:           Option<f64>,
  #[serde(rename = "IS")]
  pub intermediate_sight:   Option<f64>,
  #[serde(rename = "FS")]
  pub fore_sight:           Option<f64>,
  #[serde(rename = "HI")]
  pub height_of_instrument: Option<f64>,
  #[serde(rename = "RL")]
  pub reduced_level:        Option<f64>,
  #[serde(rename = "Offset")]
  pub offset:               Option<f64>,
  #[serde(rename = "Remarks")]
  pub remarks:              String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClosureStatus {
  /// The line closed exactly on the starting benchmark.
  Closed,
  /// A booking mistake somewhere along the line. Advisory only.
  Misclosure,
}

/// The result of closing back onto the starting benchmark.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Closure {
  pub final_rl:      f64,
  /// `final_rl − datum_rl`, to the millimetre.
  pub closing_error: f64,
  pub status:        ClosureStatus,
  pub remarks:       String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldBook {
  pub lines:   Vec<LedgerLine>,
  /// Present once a final foresight has been booked.
  pub closure: Option<Closure>,
}

/// The remark written on the closing line.
pub fn closure_remark(closing_error: f64) -> String {
  if closing_error == 0.0 {
    "Closed on Starting TBM at ±0.000".to_owned()
  } else {
    format!("Closed on Starting TBM at {closing_error:+.3}")
  }
}

// ─── Builder ─────────────────────────────────────────────────────────────────

/// Replay the whole of `purpose` from its first row and book every sight.
///
/// The chain is rebuilt end to end. Where a change point carries the levels
/// recorded when it was committed, the next leg continues from that record,
/// so the ledger shows the same levels the rows were booked with.
pub fn field_book(survey: &Survey, purpose: &Purpose) -> FieldBook {
  if purpose.phase == Phase::Proposal {
    return FieldBook { lines: design_lines(purpose), closure: None };
  }

  let mut cursor = LevelCursor::new(survey.datum_rl);
  let mut lines = Vec::new();

  for row in &purpose.rows {
    let reduction = cursor.advance_row(row);
    let hi = reduction.height_of_instrument;
    let rl = |i: usize| reduction.reduced_levels.get(i).copied();
    let remarks = |default: &str| row.remarks.clone().unwrap_or_else(|| default.to_owned());

    match &row.reading {
      Reading::InstrumentSetup { back_sight } => lines.push(LedgerLine {
        back_sight: Some(*back_sight),
        height_of_instrument: hi,
        reduced_level: rl(0),
        remarks: remarks("Instrument Setup"),
        ..LedgerLine::default()
      }),
      Reading::Chainage(ch) => {
        for (i, (offset, sight)) in ch.offsets.iter().zip(ch.levels.sights()).enumerate() {
          lines.push(LedgerLine {
            chainage: Some(ch.chainage.clone()),
            intermediate_sight: Some(*sight),
            height_of_instrument: hi,
            reduced_level: rl(i),
            offset: Some(*offset),
            remarks: if i == 0 { remarks("") } else { String::new() },
            ..LedgerLine::default()
          });
        }
      }
      Reading::Tbm { intermediate_sight } => lines.push(LedgerLine {
        intermediate_sight: Some(*intermediate_sight),
        height_of_instrument: hi,
        reduced_level: rl(0),
        remarks: remarks("TBM"),
        ..LedgerLine::default()
      }),
      Reading::ChangePoint { fore_sight, back_sight } => lines.push(LedgerLine {
        back_sight: Some(*back_sight),
        fore_sight: Some(*fore_sight),
        height_of_instrument: hi,
        reduced_level: rl(0),
        remarks: remarks("CP"),
        ..LedgerLine::default()
      }),
    }
  }

  let closure = purpose
    .final_fore_sight
    .zip(cursor.height_of_instrument())
    .map(|(final_fore_sight, hi)| {
      let final_rl = hi - final_fore_sight;
      let closing_error = round3(final_rl - survey.datum_rl);
      let status = if closing_error == 0.0 {
        ClosureStatus::Closed
      } else {
        ClosureStatus::Misclosure
      };
      let remarks = closure_remark(closing_error);
      lines.push(LedgerLine {
        fore_sight: Some(final_fore_sight),
        reduced_level: Some(round3(final_rl)),
        remarks: remarks.clone(),
        ..LedgerLine::default()
      });
      Closure {
        final_rl: round3(final_rl),
        closing_error,
        status,
        remarks,
      }
    });

  tracing::debug!(
    purpose = %purpose.purpose_id,
    lines = lines.len(),
    closing_error = ?closure.as_ref().map(|c| c.closing_error),
    "built field book"
  );

  FieldBook { lines, closure }
}

/// A proposal pass books its design levels against chainage and offset.
fn design_lines(purpose: &Purpose) -> Vec<LedgerLine> {
  purpose
    .chainages()
    .flat_map(|(_, ch)| {
      let levels: &[f64] = match &ch.levels {
        ChainageLevels::ReducedLevel(v) => v,
        ChainageLevels::IntermediateSight(_) => &[],
      };
      ch.offsets.iter().zip(levels).map(move |(offset, level)| LedgerLine {
        chainage: Some(ch.chainage.clone()),
        reduced_level: Some(round3(*level)),
        offset: Some(*offset),
        ..LedgerLine::default()
      })
    })
    .collect()
}
