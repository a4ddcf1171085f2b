//! API error type and [`axum::response::IntoResponse`] implementation.

use axum::{
  Json,
  http::StatusCode,
  response::{IntoResponse, Response},
};
use levelbook_core::{Error as CoreError, store::DomainError};
use serde_json::json;
use thiserror::Error;

/// An error returned by an API handler.
#[derive(Debug, Error)]
pub enum ApiError {
  #[error("not found: {0}")]
  NotFound(String),

  #[error("bad request: {0}")]
  BadRequest(String),

  /// The request was well-formed but the booking breaks a rule.
  #[error("unprocessable: {0}")]
  Unprocessable(String),

  /// Sequence or lifecycle conflict with the stored state.
  #[error("conflict: {0}")]
  Conflict(String),

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl ApiError {
  /// Map a backend error, surfacing any domain rule it carries.
  pub fn store<E>(err: E) -> Self
  where
    E: std::error::Error + DomainError + Send + Sync + 'static,
  {
    match err.domain().and_then(Self::from_domain) {
      Some(mapped) => mapped,
      None => Self::Store(Box::new(err)),
    }
  }

  fn from_domain(err: &CoreError) -> Option<Self> {
    let message = err.to_string();
    Some(match err {
      CoreError::SurveyNotFound(_) | CoreError::PurposeNotFound(_) => {
        Self::NotFound(message)
      }
      CoreError::SurveyFinished(_)
      | CoreError::PurposeFinished(_)
      | CoreError::PurposePaused(_)
      | CoreError::PurposeNotPaused(_)
      | CoreError::SequenceConflict { .. } => Self::Conflict(message),
      CoreError::InvalidReading(_)
      | CoreError::PhaseMismatch { .. }
      | CoreError::DuplicateChainage(_)
      | CoreError::InvalidChainage(_)
      | CoreError::OffsetMismatch(_)
      | CoreError::OffsetsNotAscending { .. }
      | CoreError::ChainageOutOfOrder { .. } => Self::Unprocessable(message),
      CoreError::Serialization(_) => return None,
    })
  }
}

impl From<CoreError> for ApiError {
  fn from(err: CoreError) -> Self {
    Self::from_domain(&err).unwrap_or_else(|| Self::Store(Box::new(err)))
  }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let (status, message) = match &self {
      ApiError::NotFound(m) => (StatusCode::NOT_FOUND, m.clone()),
      ApiError::BadRequest(m) => (StatusCode::BAD_REQUEST, m.clone()),
      ApiError::Unprocessable(m) => (StatusCode::UNPROCESSABLE_ENTITY, m.clone()),
      ApiError::Conflict(m) => (StatusCode::CONFLICT, m.clone()),
      ApiError::Store(e) => {
        tracing::error!(error = %e, "store failure");
        (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
      }
    };
    (status, Json(json!({ "error": message }))).into_response()
  }
}
