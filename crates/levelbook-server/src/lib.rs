//! HTTP server wiring for levelbook.
//!
//! Mounts [`levelbook_api::api_router`] under `/api` with request tracing.
//! The binary in `main.rs` adds configuration loading and the listener.

use std::{path::PathBuf, sync::Arc};

use axum::Router;
use levelbook_core::store::SurveyStore;
use serde::Deserialize;
use tower_http::trace::TraceLayer;

// ─── Configuration ────────────────────────────────────────────────────────────

/// Runtime server configuration, deserialised from `levelbook.toml` and
/// `LEVELBOOK_*` environment variables.
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct ServerConfig {
  #[serde(default = "default_host")]
  pub host:       String,
  #[serde(default = "default_port")]
  pub port:       u16,
  /// SQLite database file. A leading `~/` is expanded.
  #[serde(default = "default_store_path")]
  pub store_path: PathBuf,
}

fn default_host() -> String { "127.0.0.1".to_owned() }

fn default_port() -> u16 { 8080 }

fn default_store_path() -> PathBuf { PathBuf::from("~/.local/share/levelbook/levelbook.db") }

impl ServerConfig {
  pub fn address(&self) -> String { format!("{}:{}", self.host, self.port) }
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// Build the application router for `store`.
pub fn app<S>(store: Arc<S>) -> Router
where
  S: SurveyStore + 'static,
{
  Router::new()
    .nest("/api", levelbook_api::api_router(store))
    .layer(TraceLayer::new_for_http())
}
