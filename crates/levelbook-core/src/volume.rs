//! Earthwork volume by the average-end-area method.
//!
//! Sections are composed strictly in chainage order: each span averages a
//! section's areas with those of the section immediately before it.

use serde::{Deserialize, Serialize};

use crate::{Error, Result, numeric::round3};

/// The areas of one cross-section at its position along the line.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SectionArea {
  /// Chainage in metres.
  pub chainage:     f64,
  pub cutting_area: f64,
  pub filling_area: f64,
}

/// The span ending at one section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SectionVolume {
  pub chainage:                  f64,
  /// Distance from the previous section; zero for the first.
  pub chainage_difference:       f64,
  pub average_cutting_area:      f64,
  pub average_filling_area:      f64,
  pub cutting_volume:            f64,
  pub filling_volume:            f64,
  pub cumulative_cutting_volume: f64,
  pub cumulative_filling_volume: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VolumeReport {
  pub per_section:          Vec<SectionVolume>,
  pub total_cutting_volume: f64,
  pub total_filling_volume: f64,
}

/// Combine consecutive section areas into cutting and filling volumes.
///
/// `sections` must be ordered by chainage; a section that steps back along
/// the line is an error.
pub fn compute_volume(sections: &[SectionArea]) -> Result<VolumeReport> {
  let mut per_section = Vec::with_capacity(sections.len());
  let mut total_cutting = 0.0;
  let mut total_filling = 0.0;
  let mut previous: Option<&SectionArea> = None;

  for section in sections {
    let (difference, avg_cutting, avg_filling) = match previous {
      None => (0.0, 0.0, 0.0),
      Some(prev) => {
        let difference = section.chainage - prev.chainage;
        if difference < 0.0 || difference.is_nan() {
          return Err(Error::ChainageOutOfOrder { chainage: section.chainage });
        }
        (
          difference,
          (section.cutting_area + prev.cutting_area) / 2.0,
          (section.filling_area + prev.filling_area) / 2.0,
        )
      }
    };

    let cutting = difference * avg_cutting;
    let filling = difference * avg_filling;
    total_cutting += cutting;
    total_filling += filling;

    per_section.push(SectionVolume {
      chainage:                  section.chainage,
      chainage_difference:       round3(difference),
      average_cutting_area:      round3(avg_cutting),
      average_filling_area:      round3(avg_filling),
      cutting_volume:            round3(cutting),
      filling_volume:            round3(filling),
      cumulative_cutting_volume: round3(total_cutting),
      cumulative_filling_volume: round3(total_filling),
    });
    previous = Some(section);
  }

  Ok(VolumeReport {
    per_section,
    total_cutting_volume: round3(total_cutting),
    total_filling_volume: round3(total_filling),
  })
}

#[cfg(test)]
mod tests {
  use proptest::prelude::*;

  use super::*;

  fn section(chainage: f64, cutting_area: f64, filling_area: f64) -> SectionArea {
    SectionArea { chainage, cutting_area, filling_area }
  }

  #[test]
  fn three_sections() {
    let report = compute_volume(&[
      section(0.0, 0.0, 0.0),
      section(10.0, 4.0, 0.0),
      section(20.0, 6.0, 0.0),
    ])
    .unwrap();

    let volumes: Vec<f64> = report.per_section.iter().map(|s| s.cutting_volume).collect();
    assert_eq!(volumes, vec![0.0, 20.0, 50.0]);
    assert_eq!(report.per_section[2].cumulative_cutting_volume, 70.0);
    assert_eq!(report.total_cutting_volume, 70.0);
    assert_eq!(report.total_filling_volume, 0.0);
  }

  #[test]
  fn each_span_uses_its_immediate_predecessor() {
    let report = compute_volume(&[
      section(0.0, 2.0, 1.0),
      section(20.0, 4.0, 3.0),
      section(40.0, 0.0, 5.0),
    ])
    .unwrap();
    // (2+4)/2×20 = 60, (4+0)/2×20 = 40
    assert_eq!(report.per_section[1].cutting_volume, 60.0);
    assert_eq!(report.per_section[2].cutting_volume, 40.0);
    // (1+3)/2×20 = 40, (3+5)/2×20 = 80
    assert_eq!(report.total_filling_volume, 120.0);
  }

  #[test]
  fn backwards_chainage_is_rejected() {
    let err = compute_volume(&[section(20.0, 1.0, 0.0), section(10.0, 1.0, 0.0)]).unwrap_err();
    assert!(matches!(err, Error::ChainageOutOfOrder { chainage } if chainage == 10.0));
  }

  #[test]
  fn no_sections_no_volume() {
    let report = compute_volume(&[]).unwrap();
    assert!(report.per_section.is_empty());
    assert_eq!(report.total_cutting_volume, 0.0);
  }

  proptest! {
    #[test]
    fn scaling_cutting_areas_scales_cutting_volume(
      steps in proptest::collection::vec((1.0..50.0f64, 0.0..100.0f64), 1..15),
      k in 0.1..10.0f64,
    ) {
      let mut chainage = 0.0;
      let mut base = Vec::new();
      for (gap, area) in &steps {
        chainage += gap;
        base.push(section(chainage, *area, 0.0));
      }
      let scaled: Vec<SectionArea> = base
        .iter()
        .map(|s| section(s.chainage, s.cutting_area * k, 0.0))
        .collect();

      let v = compute_volume(&base).unwrap().total_cutting_volume;
      let kv = compute_volume(&scaled).unwrap().total_cutting_volume;
      // Both totals are rounded to the millimetre independently.
      prop_assert!((kv - k * v).abs() <= 0.001 * (k + 1.0) + 1e-9 * kv.abs());
    }
  }
}
