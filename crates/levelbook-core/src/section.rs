//! Cross-sections: the transverse profile of one chainage as seen by each
//! pass that recorded it.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
  reduce::reduce_all,
  row::Reduction,
  survey::{Phase, Purpose, PurposeKind, Survey},
};

/// One (offset, level) station on a profile.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProfilePoint {
  pub offset: f64,
  pub level:  f64,
}

/// The profile one purpose contributes to a cross-section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Series {
  pub purpose_id: Uuid,
  pub kind:       PurposeKind,
  pub phase:      Phase,
  pub points:     Vec<ProfilePoint>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CrossSection {
  pub chainage: String,
  /// Offsets shared by every series, ascending.
  pub offsets:  Vec<f64>,
  pub series:   Vec<Series>,
}

impl CrossSection {
  pub fn series_for(&self, purpose_id: Uuid) -> Option<&Series> {
    self.series.iter().find(|s| s.purpose_id == purpose_id)
  }
}

/// A purpose with every row's levels already reduced, so that many
/// cross-sections can be cut from one replay.
pub(crate) struct ReducedPurpose<'a> {
  purpose: &'a Purpose,
  levels:  Vec<Reduction>,
}

impl<'a> ReducedPurpose<'a> {
  pub(crate) fn new(survey: &Survey, purpose: &'a Purpose) -> Self {
    Self { purpose, levels: reduce_all(survey, purpose) }
  }

  fn series(&self, chainage: &str) -> Option<Series> {
    let (index, ch) = self.purpose.find_chainage(chainage)?;
    let mut points: Vec<ProfilePoint> = ch
      .offsets
      .iter()
      .zip(&self.levels[index].reduced_levels)
      .map(|(&offset, &level)| ProfilePoint { offset, level })
      .collect();
    points.sort_by(|a, b| a.offset.total_cmp(&b.offset));

    Some(Series {
      purpose_id: self.purpose.purpose_id,
      kind: self.purpose.kind.clone(),
      phase: self.purpose.phase,
      points,
    })
  }
}

/// Build the cross-section at `chainage` from whichever of `purposes`
/// recorded it.
///
/// Labels are matched exactly. Purposes without the chainage are left out.
/// Every series is cut back to the offsets all of them share, so a partially
/// entered pass still lines up offset for offset and a level is never paired
/// with another pass's level at a different offset.
pub fn build_cross_section(
  survey: &Survey,
  chainage: &str,
  purposes: &[&Purpose],
) -> CrossSection {
  let reduced: Vec<ReducedPurpose<'_>> = purposes
    .iter()
    .map(|&p| ReducedPurpose::new(survey, p))
    .collect();
  assemble(chainage, &reduced)
}

pub(crate) fn assemble(chainage: &str, purposes: &[ReducedPurpose<'_>]) -> CrossSection {
  let mut series: Vec<Series> = purposes.iter().filter_map(|p| p.series(chainage)).collect();

  let offsets: Vec<f64> = series
    .first()
    .map(|first| {
      first
        .points
        .iter()
        .map(|p| p.offset)
        .filter(|&offset| {
          series.iter().all(|s| s.points.iter().any(|p| p.offset == offset))
        })
        .collect()
    })
    .unwrap_or_default();
  for s in &mut series {
    s.points.retain(|p| offsets.contains(&p.offset));
  }

  CrossSection {
    chainage: chainage.to_owned(),
    offsets,
    series,
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::fixtures::{
    actual_purpose, chainage, proposal_chainage, proposal_purpose, setup, survey,
  };

  #[test]
  fn pairs_offsets_with_reduced_and_design_levels() {
    let s = survey(10.0);
    let initial = actual_purpose(vec![
      setup(1.0),
      chainage("0/000", &[0.0, 5.0], &[1.0, 2.0]),
    ]);
    let proposed =
      proposal_purpose(vec![proposal_chainage("0/000", &[0.0, 5.0], &[9.5, 9.5])]);

    let section = build_cross_section(&s, "0/000", &[&initial, &proposed]);
    assert_eq!(section.offsets, vec![0.0, 5.0]);
    assert_eq!(section.series.len(), 2);

    let ground = section.series_for(initial.purpose_id).unwrap();
    assert_eq!(ground.points, vec![
      ProfilePoint { offset: 0.0, level: 10.0 },
      ProfilePoint { offset: 5.0, level: 9.0 },
    ]);
    let design = section.series_for(proposed.purpose_id).unwrap();
    assert_eq!(design.phase, Phase::Proposal);
    assert_eq!(design.points[1].level, 9.5);
  }

  #[test]
  fn purpose_without_chainage_is_omitted() {
    let s = survey(10.0);
    let initial = actual_purpose(vec![setup(1.0), chainage("0/000", &[0.0], &[1.0])]);
    let proposed = proposal_purpose(vec![proposal_chainage("0/020", &[0.0], &[9.5])]);

    let section = build_cross_section(&s, "0/000", &[&initial, &proposed]);
    assert_eq!(section.series.len(), 1);
    assert!(section.series_for(proposed.purpose_id).is_none());
  }

  #[test]
  fn series_are_cut_to_the_shortest() {
    let s = survey(10.0);
    let initial = actual_purpose(vec![
      setup(1.0),
      chainage("0/000", &[-5.0, 0.0, 5.0], &[1.0, 1.0, 1.0]),
    ]);
    let proposed =
      proposal_purpose(vec![proposal_chainage("0/000", &[-5.0, 0.0, 5.0], &[9.5, 9.5])]);

    let section = build_cross_section(&s, "0/000", &[&initial, &proposed]);
    assert_eq!(section.offsets, vec![-5.0, 0.0]);
    assert!(section.series.iter().all(|s| s.points.len() == 2));
  }

  #[test]
  fn levels_pair_by_offset_not_position() {
    let s = survey(10.0);
    let initial = actual_purpose(vec![
      setup(1.0),
      chainage("0/000", &[-5.0, 0.0, 5.0], &[1.0, 1.0, 1.0]),
    ]);
    let proposed = proposal_purpose(vec![proposal_chainage(
      "0/000",
      &[0.0, 5.0, 10.0],
      &[9.0, 9.0, 12.0],
    )]);

    let section = build_cross_section(&s, "0/000", &[&initial, &proposed]);
    assert_eq!(section.offsets, vec![0.0, 5.0]);
    let design = section.series_for(proposed.purpose_id).unwrap();
    assert_eq!(design.points, vec![
      ProfilePoint { offset: 0.0, level: 9.0 },
      ProfilePoint { offset: 5.0, level: 9.0 },
    ]);
  }

  #[test]
  fn unknown_chainage_gives_empty_section() {
    let s = survey(10.0);
    let initial = actual_purpose(vec![setup(1.0), chainage("0/000", &[0.0], &[1.0])]);
    let section = build_cross_section(&s, "9/999", &[&initial]);
    assert!(section.series.is_empty());
    assert!(section.offsets.is_empty());
  }
}
