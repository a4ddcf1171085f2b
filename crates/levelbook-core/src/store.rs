//! The `SurveyStore` trait.
//!
//! Storage backends (e.g. `levelbook-store-sqlite`) implement it; the HTTP
//! layer depends only on this abstraction. The reduction engine itself never
//! touches a store: it works on the snapshots a store hands out.
//!
//! Rows are replayed in append order, so a store must serialise appends per
//! purpose and refuse any row whose `seq` is not exactly one past the last.

use std::future::Future;

use uuid::Uuid;

use crate::{
  row::{NewRow, Row},
  survey::{NewPurpose, NewSurvey, Purpose, Survey},
};

/// Exposes the domain rule a backend error stems from, if any, so transports
/// can tell a conflict from an outage.
pub trait DomainError {
  fn domain(&self) -> Option<&crate::Error>;
}

/// Abstraction over a levelbook storage backend.
///
/// All methods return `Send` futures so the trait can be used in multi-threaded
/// async runtimes (e.g. tokio with `axum`).
pub trait SurveyStore: Send + Sync {
  type Error: std::error::Error + DomainError + Send + Sync + 'static;

  // ── Surveys ───────────────────────────────────────────────────────────

  fn create_survey(
    &self,
    input: NewSurvey,
  ) -> impl Future<Output = Result<Survey, Self::Error>> + Send + '_;

  /// Retrieve a survey by UUID. Returns `None` if not found.
  fn get_survey(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<Survey>, Self::Error>> + Send + '_;

  fn list_surveys(
    &self,
  ) -> impl Future<Output = Result<Vec<Survey>, Self::Error>> + Send + '_;

  /// Mark a survey finished. No purposes may be started on it afterwards.
  fn finish_survey(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Survey, Self::Error>> + Send + '_;

  // ── Purposes ──────────────────────────────────────────────────────────

  /// Start a new pass. Fails if the survey is missing or finished.
  fn create_purpose(
    &self,
    input: NewPurpose,
  ) -> impl Future<Output = Result<Purpose, Self::Error>> + Send + '_;

  /// Retrieve a purpose with all of its rows in append order.
  fn get_purpose(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<Purpose>, Self::Error>> + Send + '_;

  /// All purposes of a survey, oldest first, with their rows.
  fn list_purposes(
    &self,
    survey_id: Uuid,
  ) -> impl Future<Output = Result<Vec<Purpose>, Self::Error>> + Send + '_;

  // ── Rows: append-only writes ────────────────────────────────────────

  /// Append a row. `row.seq` must be one past the purpose's last row.
  ///
  /// Fails if the purpose is finished or paused.
  fn append_row(
    &self,
    purpose_id: Uuid,
    row: NewRow,
  ) -> impl Future<Output = Result<Row, Self::Error>> + Send + '_;

  // ── Lifecycle ─────────────────────────────────────────────────────────

  /// Pause a pass. Its last row becomes provisional.
  fn pause_purpose(
    &self,
    purpose_id: Uuid,
  ) -> impl Future<Output = Result<Purpose, Self::Error>> + Send + '_;

  /// Resume a paused pass, replacing its provisional last row with `row`.
  /// `row.seq` must equal the provisional row's `seq` (or 1 if the pass is
  /// still empty).
  fn resume_purpose(
    &self,
    purpose_id: Uuid,
    row: NewRow,
  ) -> impl Future<Output = Result<Row, Self::Error>> + Send + '_;

  /// Close a pass. Terminal.
  ///
  /// An Actual pass closes with its foresight onto the starting benchmark;
  /// a Proposal pass has no instrument line and closes with `None`.
  fn finish_purpose(
    &self,
    purpose_id: Uuid,
    final_fore_sight: Option<f64>,
  ) -> impl Future<Output = Result<Purpose, Self::Error>> + Send + '_;
}
