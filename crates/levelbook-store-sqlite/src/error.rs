//! Error type for `levelbook-store-sqlite`.

use levelbook_core::store::DomainError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  /// A domain rule was refused (finished purpose, sequence conflict, …).
  #[error(transparent)]
  Core(#[from] levelbook_core::Error),

  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("json error: {0}")]
  Json(#[from] serde_json::Error),

  #[error("uuid parse error: {0}")]
  Uuid(#[from] uuid::Error),

  #[error("date/time parse error: {0}")]
  DateParse(String),

  #[error("unknown {column} value: {value:?}")]
  UnknownValue { column: &'static str, value: String },
}

impl DomainError for Error {
  fn domain(&self) -> Option<&levelbook_core::Error> {
    match self {
      Self::Core(e) => Some(e),
      _ => None,
    }
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
