//! Handlers for `/surveys` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/surveys` | |
//! | `POST` | `/surveys` | Body: [`NewSurvey`]; returns 201 |
//! | `GET`  | `/surveys/:id` | 404 if not found |
//! | `POST` | `/surveys/:id/finish` | No new purposes afterwards |
//! | `GET`  | `/surveys/:id/purposes` | Purposes with their rows, oldest first |
//! | `POST` | `/surveys/:id/purposes` | Body: `{"kind":"Initial Level"}`; returns 201 |

use std::sync::Arc;

use axum::{
  Json,
  extract::{Path, State},
  http::StatusCode,
  response::IntoResponse,
};
use levelbook_core::{
  store::SurveyStore,
  survey::{NewPurpose, NewSurvey, Phase, Purpose, PurposeKind, Survey},
};
use serde::Deserialize;
use uuid::Uuid;

use crate::{error::ApiError, load_survey};

// ─── List ─────────────────────────────────────────────────────────────────────

/// `GET /surveys`
pub async fn list<S: SurveyStore>(
  State(store): State<Arc<S>>,
) -> Result<Json<Vec<Survey>>, ApiError> {
  let surveys = store.list_surveys().await.map_err(ApiError::store)?;
  Ok(Json(surveys))
}

// ─── Create ───────────────────────────────────────────────────────────────────

/// `POST /surveys`
pub async fn create<S: SurveyStore>(
  State(store): State<Arc<S>>,
  Json(body): Json<NewSurvey>,
) -> Result<impl IntoResponse, ApiError> {
  if body.name.trim().is_empty() {
    return Err(ApiError::Unprocessable("survey name is empty".into()));
  }
  if !body.datum_rl.is_finite() {
    return Err(ApiError::Unprocessable("datum_rl is not a finite number".into()));
  }
  if body.chainage_multiple == 0 {
    return Err(ApiError::Unprocessable("chainage_multiple must be positive".into()));
  }

  let survey = store.create_survey(body).await.map_err(ApiError::store)?;
  Ok((StatusCode::CREATED, Json(survey)))
}

// ─── Get one ──────────────────────────────────────────────────────────────────

/// `GET /surveys/:id`
pub async fn get_one<S: SurveyStore>(
  State(store): State<Arc<S>>,
  Path(id): Path<Uuid>,
) -> Result<Json<Survey>, ApiError> {
  Ok(Json(load_survey(store.as_ref(), id).await?))
}

// ─── Finish ───────────────────────────────────────────────────────────────────

/// `POST /surveys/:id/finish`
pub async fn finish<S: SurveyStore>(
  State(store): State<Arc<S>>,
  Path(id): Path<Uuid>,
) -> Result<Json<Survey>, ApiError> {
  let survey = store.finish_survey(id).await.map_err(ApiError::store)?;
  Ok(Json(survey))
}

// ─── Purposes ─────────────────────────────────────────────────────────────────

/// `GET /surveys/:id/purposes`
pub async fn list_purposes<S: SurveyStore>(
  State(store): State<Arc<S>>,
  Path(id): Path<Uuid>,
) -> Result<Json<Vec<Purpose>>, ApiError> {
  load_survey(store.as_ref(), id).await?;
  let purposes = store.list_purposes(id).await.map_err(ApiError::store)?;
  Ok(Json(purposes))
}

#[derive(Debug, Deserialize)]
pub struct CreatePurposeBody {
  pub kind:  PurposeKind,
  /// Defaults to the kind's usual phase.
  pub phase: Option<Phase>,
}

/// `POST /surveys/:id/purposes`
pub async fn create_purpose<S: SurveyStore>(
  State(store): State<Arc<S>>,
  Path(id): Path<Uuid>,
  Json(body): Json<CreatePurposeBody>,
) -> Result<impl IntoResponse, ApiError> {
  let mut input = NewPurpose::new(id, body.kind);
  if let Some(phase) = body.phase {
    input.phase = phase;
  }

  let purpose = store.create_purpose(input).await.map_err(ApiError::store)?;
  Ok((StatusCode::CREATED, Json(purpose)))
}
