//! Error types for `levelbook-core`.

use thiserror::Error;
use uuid::Uuid;

use crate::survey::Phase;

#[derive(Debug, Error)]
pub enum Error {
  #[error("survey not found: {0}")]
  SurveyNotFound(Uuid),

  #[error("purpose not found: {0}")]
  PurposeNotFound(Uuid),

  #[error("survey {0} is finished")]
  SurveyFinished(Uuid),

  #[error("purpose {0} is finished")]
  PurposeFinished(Uuid),

  #[error("purpose {0} is paused; resume it with a replacement row")]
  PurposePaused(Uuid),

  #[error("purpose {0} is not paused")]
  PurposeNotPaused(Uuid),

  #[error("row sequence conflict: expected {expected}, got {found}")]
  SequenceConflict { expected: u32, found: u32 },

  #[error("invalid reading: {0}")]
  InvalidReading(String),

  #[error("{reading} rows are not accepted by {phase} purposes")]
  PhaseMismatch { phase: Phase, reading: &'static str },

  #[error("chainage {0:?} is already recorded in this purpose")]
  DuplicateChainage(String),

  #[error("invalid chainage label: {0:?}")]
  InvalidChainage(String),

  #[error("offsets at chainage {0:?} differ from another pass of this survey")]
  OffsetMismatch(String),

  #[error("offsets are not strictly ascending at index {index}")]
  OffsetsNotAscending { index: usize },

  #[error("chainage {chainage} comes before the previous section")]
  ChainageOutOfOrder { chainage: f64 },

  #[error("serialization error: {0}")]
  Serialization(#[from] serde_json::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
