//! Cutting and filling area of one cross-section by the average-ordinate
//! method.
//!
//! Each offset after the first spans the strip back to its neighbour. The
//! strip is booked as cutting where the initial surface stands above the
//! proposed one at that offset, and as filling where it stands below.

use serde::{Deserialize, Serialize};

use crate::{Error, Result, numeric::round3, section::ProfilePoint};

/// The contribution of one offset to its cross-section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OffsetArea {
  pub offset:         f64,
  pub initial_level:  f64,
  pub proposed_level: f64,
  /// Distance back to the previous offset; zero for the first.
  pub width:          f64,
  pub cutting:        f64,
  pub filling:        f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AreaReport {
  pub per_offset:    Vec<OffsetArea>,
  pub total_cutting: f64,
  pub total_filling: f64,
}

/// Compute cut and fill between two aligned profiles.
///
/// Offsets are taken from `initial`; only as many points as both profiles
/// share are used. Offsets must be strictly ascending. Where the two levels
/// are equal the strip is neither cutting nor filling.
pub fn compute_area(initial: &[ProfilePoint], proposed: &[ProfilePoint]) -> Result<AreaReport> {
  let mut per_offset = Vec::with_capacity(initial.len().min(proposed.len()));
  let mut total_cutting = 0.0;
  let mut total_filling = 0.0;

  for (i, (ground, design)) in initial.iter().zip(proposed).enumerate() {
    let width = match i {
      0 => 0.0,
      _ => ground.offset - initial[i - 1].offset,
    };
    if i > 0 && (width <= 0.0 || width.is_nan()) {
      return Err(Error::OffsetsNotAscending { index: i });
    }

    let strip = (ground.level + design.level) / 2.0 * width;
    let (cutting, filling) = if ground.level > design.level {
      (strip, 0.0)
    } else if ground.level < design.level {
      (0.0, strip)
    } else {
      (0.0, 0.0)
    };
    total_cutting += cutting;
    total_filling += filling;

    per_offset.push(OffsetArea {
      offset: ground.offset,
      initial_level: ground.level,
      proposed_level: design.level,
      width,
      cutting: round3(cutting),
      filling: round3(filling),
    });
  }

  Ok(AreaReport {
    per_offset,
    total_cutting: round3(total_cutting),
    total_filling: round3(total_filling),
  })
}
