//! Handlers for cross-section and earthwork reports.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/surveys/:id/cross-section` | `?chainage=0/020` required; optional `purposes=<id>,<id>` |
//! | `GET`  | `/surveys/:id/earthwork` | Optional `initial=<id>&proposed=<id>` |

use std::sync::Arc;

use axum::{
  Json,
  extract::{Path, Query, State},
};
use levelbook_core::{
  earthwork::{EarthworkReport, earthwork as take_off},
  section::{CrossSection, build_cross_section},
  store::SurveyStore,
  survey::{Phase, Purpose, PurposeKind},
};
use serde::Deserialize;
use uuid::Uuid;

use crate::{error::ApiError, load_survey};

/// Pick `id` from the survey's purposes, or the first purpose matching
/// `kind` and `phase` when no id is given.
fn pick<'a>(
  purposes: &'a [Purpose],
  id: Option<Uuid>,
  kind: PurposeKind,
  phase: Phase,
) -> Result<&'a Purpose, ApiError> {
  match id {
    Some(id) => purposes
      .iter()
      .find(|p| p.purpose_id == id)
      .ok_or_else(|| ApiError::NotFound(format!("purpose {id} not found in survey"))),
    None => purposes
      .iter()
      .find(|p| p.kind == kind && p.phase == phase)
      .ok_or_else(|| ApiError::NotFound(format!("survey has no {kind} purpose"))),
  }
}

// ─── Cross-section ────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct CrossSectionParams {
  pub chainage: String,
  /// Comma-separated purpose ids. Defaults to every purpose of the survey.
  pub purposes: Option<String>,
}

/// `GET /surveys/:id/cross-section?chainage=<label>[&purposes=<id>,<id>]`
pub async fn cross_section<S: SurveyStore>(
  State(store): State<Arc<S>>,
  Path(id): Path<Uuid>,
  Query(params): Query<CrossSectionParams>,
) -> Result<Json<CrossSection>, ApiError> {
  let survey = load_survey(store.as_ref(), id).await?;
  let all = store.list_purposes(id).await.map_err(ApiError::store)?;

  let selected: Vec<&Purpose> = match params.purposes.as_deref() {
    None | Some("") => all.iter().collect(),
    Some(list) => list
      .split(',')
      .map(|raw| {
        let purpose_id = Uuid::parse_str(raw.trim())
          .map_err(|_| ApiError::BadRequest(format!("invalid purpose id: {raw:?}")))?;
        all
          .iter()
          .find(|p| p.purpose_id == purpose_id)
          .ok_or_else(|| ApiError::NotFound(format!("purpose {purpose_id} not found in survey")))
      })
      .collect::<Result<_, _>>()?,
  };

  Ok(Json(build_cross_section(&survey, &params.chainage, &selected)))
}

// ─── Earthwork ────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct EarthworkParams {
  /// Defaults to the first Initial Level purpose.
  pub initial:  Option<Uuid>,
  /// Defaults to the first Proposed Level purpose.
  pub proposed: Option<Uuid>,
}

/// `GET /surveys/:id/earthwork[?initial=<id>&proposed=<id>]`
pub async fn earthwork<S: SurveyStore>(
  State(store): State<Arc<S>>,
  Path(id): Path<Uuid>,
  Query(params): Query<EarthworkParams>,
) -> Result<Json<EarthworkReport>, ApiError> {
  let survey = load_survey(store.as_ref(), id).await?;
  let purposes = store.list_purposes(id).await.map_err(ApiError::store)?;

  let initial = pick(&purposes, params.initial, PurposeKind::InitialLevel, Phase::Actual)?;
  let proposed = pick(&purposes, params.proposed, PurposeKind::ProposedLevel, Phase::Proposal)?;

  Ok(Json(take_off(&survey, initial, proposed)?))
}
