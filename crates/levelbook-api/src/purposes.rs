//! Handlers for `/purposes` endpoints: booking rows and closing a pass.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/purposes/:id` | Purpose with all rows |
//! | `POST` | `/purposes/:id/preview` | Body: [`RowBody`]; reduces without committing |
//! | `POST` | `/purposes/:id/rows` | Body: [`RowBody`]; validates, reduces, commits; 201 |
//! | `POST` | `/purposes/:id/pause` | Last row becomes provisional |
//! | `POST` | `/purposes/:id/resume` | Body: [`RowBody`]; replaces the provisional row |
//! | `POST` | `/purposes/:id/finish` | Body: `{"final_fore_sight":1.5}` |
//! | `GET`  | `/purposes/:id/fieldbook` | Level book with closing check |
//! | `GET`  | `/purposes/:id/next-chainage` | Optional `?initial=<purpose id>` |

use std::sync::Arc;

use axum::{
  Json,
  extract::{Path, Query, State},
  http::StatusCode,
  response::IntoResponse,
};
use levelbook_core::{
  Error as CoreError,
  chainage::{NextChainage, next_chainage as compute_next_chainage},
  fieldbook::{FieldBook, field_book},
  reduce::reduce,
  row::{NewRow, Reading, Reduction, Row},
  store::SurveyStore,
  survey::{Phase, Purpose, PurposeKind, PurposeStatus, Survey},
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{error::ApiError, load_purpose, load_survey};

/// A pending row as submitted by the capture form.
#[derive(Debug, Deserialize)]
pub struct RowBody {
  pub reading: Reading,
  #[serde(default)]
  pub remarks: Option<String>,
}

async fn load_pair<S: SurveyStore>(store: &S, id: Uuid) -> Result<(Survey, Purpose), ApiError> {
  let purpose = load_purpose(store, id).await?;
  let survey = load_survey(store, purpose.survey_id).await?;
  Ok((survey, purpose))
}

/// Every rule `reading` must pass before it joins `purpose`, including
/// offset agreement with the survey's other passes.
async fn check_reading<S: SurveyStore>(
  store: &S,
  purpose: &Purpose,
  reading: &Reading,
) -> Result<Result<(), CoreError>, ApiError> {
  if let Err(err) = purpose.validate_append(reading) {
    return Ok(Err(err));
  }
  let survey_purposes = store
    .list_purposes(purpose.survey_id)
    .await
    .map_err(ApiError::store)?;
  Ok(purpose.validate_offsets_across(reading, &survey_purposes))
}

// ─── Get one ──────────────────────────────────────────────────────────────────

/// `GET /purposes/:id`
pub async fn get_one<S: SurveyStore>(
  State(store): State<Arc<S>>,
  Path(id): Path<Uuid>,
) -> Result<Json<Purpose>, ApiError> {
  Ok(Json(load_purpose(store.as_ref(), id).await?))
}

// ─── Preview ──────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct Preview {
  pub reduction: Reduction,
  /// Why the row would be refused on commit, if it would be.
  pub warning:   Option<String>,
}

/// `POST /purposes/:id/preview`
///
/// Always answers with the levels the row would reduce to; rule breaches come
/// back as a warning so the form can flag them while the surveyor types.
pub async fn preview<S: SurveyStore>(
  State(store): State<Arc<S>>,
  Path(id): Path<Uuid>,
  Json(body): Json<RowBody>,
) -> Result<Json<Preview>, ApiError> {
  let (survey, purpose) = load_pair(store.as_ref(), id).await?;

  let warning = check_reading(store.as_ref(), &purpose, &body.reading)
    .await?
    .err()
    .map(|e| e.to_string());
  let reduction = reduce(&survey, &purpose, Some(&body.reading));
  Ok(Json(Preview { reduction, warning }))
}

// ─── Append ───────────────────────────────────────────────────────────────────

/// `POST /purposes/:id/rows`
pub async fn append<S: SurveyStore>(
  State(store): State<Arc<S>>,
  Path(id): Path<Uuid>,
  Json(body): Json<RowBody>,
) -> Result<impl IntoResponse, ApiError> {
  let (survey, purpose) = load_pair(store.as_ref(), id).await?;
  match purpose.status {
    PurposeStatus::Paused => return Err(CoreError::PurposePaused(id).into()),
    PurposeStatus::Finished => return Err(CoreError::PurposeFinished(id).into()),
    PurposeStatus::Active => {}
  }
  check_reading(store.as_ref(), &purpose, &body.reading).await??;

  let row = NewRow {
    seq:       purpose.last_seq() + 1,
    reduction: reduce(&survey, &purpose, Some(&body.reading)),
    reading:   body.reading,
    remarks:   body.remarks,
  };
  let row = store.append_row(id, row).await.map_err(ApiError::store)?;
  Ok((StatusCode::CREATED, Json(row)))
}

// ─── Lifecycle ────────────────────────────────────────────────────────────────

/// `POST /purposes/:id/pause`
pub async fn pause<S: SurveyStore>(
  State(store): State<Arc<S>>,
  Path(id): Path<Uuid>,
) -> Result<Json<Purpose>, ApiError> {
  let purpose = store.pause_purpose(id).await.map_err(ApiError::store)?;
  Ok(Json(purpose))
}

/// `POST /purposes/:id/resume`
///
/// The provisional row is recomputed from the committed rows, never trusted.
pub async fn resume<S: SurveyStore>(
  State(store): State<Arc<S>>,
  Path(id): Path<Uuid>,
  Json(body): Json<RowBody>,
) -> Result<Json<Row>, ApiError> {
  let (survey, purpose) = load_pair(store.as_ref(), id).await?;
  if purpose.status != PurposeStatus::Paused {
    return Err(CoreError::PurposeNotPaused(id).into());
  }
  check_reading(store.as_ref(), &purpose, &body.reading).await??;

  let row = NewRow {
    seq:       purpose.committed_rows().last().map_or(0, |r| r.seq) + 1,
    reduction: reduce(&survey, &purpose, Some(&body.reading)),
    reading:   body.reading,
    remarks:   body.remarks,
  };
  let row = store.resume_purpose(id, row).await.map_err(ApiError::store)?;
  Ok(Json(row))
}

#[derive(Debug, Deserialize)]
pub struct FinishBody {
  /// Foresight onto the starting benchmark. Required for Actual passes.
  pub final_fore_sight: Option<f64>,
}

/// `POST /purposes/:id/finish`
pub async fn finish<S: SurveyStore>(
  State(store): State<Arc<S>>,
  Path(id): Path<Uuid>,
  Json(body): Json<FinishBody>,
) -> Result<Json<Purpose>, ApiError> {
  let purpose = load_purpose(store.as_ref(), id).await?;
  match (purpose.phase, body.final_fore_sight) {
    (Phase::Actual, None) => {
      return Err(ApiError::Unprocessable(
        "final_fore_sight is required to close an actual pass".into(),
      ));
    }
    (Phase::Proposal, Some(_)) => {
      return Err(ApiError::Unprocessable(
        "a proposal pass has no instrument line to close".into(),
      ));
    }
    (_, Some(fs)) if !fs.is_finite() => {
      return Err(ApiError::Unprocessable(
        "final_fore_sight is not a finite number".into(),
      ));
    }
    _ => {}
  }

  let purpose = store
    .finish_purpose(id, body.final_fore_sight)
    .await
    .map_err(ApiError::store)?;
  Ok(Json(purpose))
}

// ─── Reports ──────────────────────────────────────────────────────────────────

/// `GET /purposes/:id/fieldbook`
pub async fn fieldbook<S: SurveyStore>(
  State(store): State<Arc<S>>,
  Path(id): Path<Uuid>,
) -> Result<Json<FieldBook>, ApiError> {
  let (survey, purpose) = load_pair(store.as_ref(), id).await?;
  let book = field_book(&survey, &purpose);
  if let Some(closure) = &book.closure {
    tracing::info!(
      purpose = %id,
      closing_error = closure.closing_error,
      status = ?closure.status,
      "level book closed"
    );
  }
  Ok(Json(book))
}

#[derive(Debug, Deserialize)]
pub struct NextChainageParams {
  /// The pass a proposal follows. Defaults to the survey's first
  /// Initial Level purpose.
  pub initial: Option<Uuid>,
}

/// `GET /purposes/:id/next-chainage[?initial=<id>]`
///
/// Answers `null` once a proposal has covered every initial station.
pub async fn next_chainage<S: SurveyStore>(
  State(store): State<Arc<S>>,
  Path(id): Path<Uuid>,
  Query(params): Query<NextChainageParams>,
) -> Result<Json<Option<NextChainage>>, ApiError> {
  let (survey, purpose) = load_pair(store.as_ref(), id).await?;

  let initial = match (purpose.phase, params.initial) {
    (Phase::Actual, _) => None,
    (Phase::Proposal, Some(initial_id)) => {
      let initial = load_purpose(store.as_ref(), initial_id).await?;
      if initial.survey_id != survey.survey_id {
        return Err(ApiError::NotFound(format!(
          "purpose {initial_id} not found in survey {}",
          survey.survey_id
        )));
      }
      Some(initial)
    }
    (Phase::Proposal, None) => store
      .list_purposes(survey.survey_id)
      .await
      .map_err(ApiError::store)?
      .into_iter()
      .find(|p| p.kind == PurposeKind::InitialLevel && p.phase == Phase::Actual),
  };

  Ok(Json(compute_next_chainage(&survey, &purpose, initial.as_ref())))
}
