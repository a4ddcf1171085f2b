//! Core types and computations for levelbook, a levelling field book.
//!
//! Staff readings go in; reduced levels, closing errors, cross-sections and
//! earthwork quantities come out. Everything here is synchronous and pure
//! over the rows it is handed. The crate is deliberately free of HTTP and
//! database dependencies; storage is reached only through [`store`].

// We intentionally use native `async fn` in traits (stabilised in Rust 1.75).
// Suppress the advisory lint about `Send` bounds on the returned futures.
#![allow(async_fn_in_trait)]

pub mod area;
pub mod chainage;
pub mod earthwork;
pub mod error;
pub mod fieldbook;
pub mod numeric;
pub mod reduce;
pub mod row;
pub mod section;
pub mod store;
pub mod survey;
pub mod validate;
pub mod volume;

#[cfg(test)]
mod fixtures;

pub use error::{Error, Result};
