//! Earthwork take-off: cross-sections, areas and volumes between an initial
//! surface and a proposed one, station by station.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
  Result,
  area::{AreaReport, compute_area},
  chainage::Chainage,
  section::{CrossSection, ReducedPurpose, assemble},
  survey::{Purpose, Survey},
  volume::{SectionArea, VolumeReport, compute_volume},
};

/// The quantities at one station.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SectionQuantity {
  pub chainage:       String,
  /// `chainage` in metres.
  pub chainage_value: f64,
  pub cross_section:  CrossSection,
  pub area:           AreaReport,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EarthworkReport {
  pub initial_purpose_id:  Uuid,
  pub proposed_purpose_id: Uuid,
  pub sections:            Vec<SectionQuantity>,
  pub volume:              VolumeReport,
}

/// Take off cut and fill between `initial` and `proposed`.
///
/// Sections are reported in chainage order, whichever direction `initial`
/// was booked in. A station the proposed pass has not reached yet, or whose
/// label cannot be read as a chainage, is skipped.
pub fn earthwork(
  survey: &Survey,
  initial: &Purpose,
  proposed: &Purpose,
) -> Result<EarthworkReport> {
  let reduced = [
    ReducedPurpose::new(survey, initial),
    ReducedPurpose::new(survey, proposed),
  ];

  let mut sections = Vec::new();
  for (_, ch) in initial.chainages() {
    let Ok(station) = ch.chainage.parse::<Chainage>() else {
      tracing::warn!(chainage = %ch.chainage, "skipping unreadable chainage label");
      continue;
    };

    let cross_section = assemble(&ch.chainage, &reduced);
    let (Some(ground), Some(design)) = (
      cross_section.series_for(initial.purpose_id),
      cross_section.series_for(proposed.purpose_id),
    ) else {
      tracing::warn!(chainage = %ch.chainage, "no proposed levels at chainage; skipping");
      continue;
    };

    let area = compute_area(&ground.points, &design.points)?;
    sections.push(SectionQuantity {
      chainage: ch.chainage.clone(),
      chainage_value: station.metres(),
      cross_section,
      area,
    });
  }

  sections.sort_by(|a, b| a.chainage_value.total_cmp(&b.chainage_value));

  let areas: Vec<SectionArea> = sections
    .iter()
    .map(|s| SectionArea {
      chainage:     s.chainage_value,
      cutting_area: s.area.total_cutting,
      filling_area: s.area.total_filling,
    })
    .collect();
  let volume = compute_volume(&areas)?;

  tracing::info!(
    survey = %survey.survey_id,
    sections = sections.len(),
    cutting = volume.total_cutting_volume,
    filling = volume.total_filling_volume,
    "earthwork take-off complete"
  );

  Ok(EarthworkReport {
    initial_purpose_id: initial.purpose_id,
    proposed_purpose_id: proposed.purpose_id,
    sections,
    volume,
  })
}
