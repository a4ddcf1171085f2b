//! SQLite backend for the levelbook survey store.
//!
//! Wraps [`tokio_rusqlite`] so all database access runs on a dedicated thread
//! without blocking the async runtime. Row appends for a purpose are checked
//! and written inside one transaction, which is what serialises concurrent
//! submissions to the same pass.

mod encode;
mod schema;
mod store;

pub mod error;

pub use error::{Error, Result};
pub use store::SqliteStore;
