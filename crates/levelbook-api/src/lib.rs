//! JSON REST API for levelbook.
//!
//! Exposes an axum [`Router`] backed by any [`levelbook_core::store::SurveyStore`].
//! Auth, TLS, and transport concerns are the caller's responsibility.
//!
//! # Mounting
//!
//! ```rust,ignore
//! .nest("/api", levelbook_api::api_router(store.clone()))
//! ```

pub mod error;
pub mod purposes;
pub mod quantities;
pub mod surveys;

use std::sync::Arc;

use axum::{
  Router,
  routing::{get, post},
};
use levelbook_core::{
  store::SurveyStore,
  survey::{Purpose, Survey},
};
use uuid::Uuid;

pub use error::ApiError;

/// Build a fully-materialised API router for `store`.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<S>(store: Arc<S>) -> Router<()>
where
  S: SurveyStore + 'static,
{
  Router::new()
    // Surveys
    .route("/surveys", get(surveys::list::<S>).post(surveys::create::<S>))
    .route("/surveys/{id}", get(surveys::get_one::<S>))
    .route("/surveys/{id}/finish", post(surveys::finish::<S>))
    .route(
      "/surveys/{id}/purposes",
      get(surveys::list_purposes::<S>).post(surveys::create_purpose::<S>),
    )
    // Quantities
    .route("/surveys/{id}/cross-section", get(quantities::cross_section::<S>))
    .route("/surveys/{id}/earthwork", get(quantities::earthwork::<S>))
    // Purposes
    .route("/purposes/{id}", get(purposes::get_one::<S>))
    .route("/purposes/{id}/preview", post(purposes::preview::<S>))
    .route("/purposes/{id}/rows", post(purposes::append::<S>))
    .route("/purposes/{id}/pause", post(purposes::pause::<S>))
    .route("/purposes/{id}/resume", post(purposes::resume::<S>))
    .route("/purposes/{id}/finish", post(purposes::finish::<S>))
    .route("/purposes/{id}/fieldbook", get(purposes::fieldbook::<S>))
    .route("/purposes/{id}/next-chainage", get(purposes::next_chainage::<S>))
    .with_state(store)
}

// ─── Shared lookups ──────────────────────────────────────────────────────────

pub(crate) async fn load_survey<S: SurveyStore>(store: &S, id: Uuid) -> Result<Survey, ApiError> {
  store
    .get_survey(id)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::NotFound(format!("survey {id} not found")))
}

pub(crate) async fn load_purpose<S: SurveyStore>(store: &S, id: Uuid) -> Result<Purpose, ApiError> {
  store
    .get_purpose(id)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::NotFound(format!("purpose {id} not found")))
}

#[cfg(test)]
mod tests;
