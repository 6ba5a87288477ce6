//! promfuse core: exposition-format primitives, the metric record model, and
//! the shared error surface.
//!
//! This crate defines the text exposition grammar (parsing and rendering),
//! the ordered-label record model, and the deterministic sort used to merge
//! many scraped responses into one document. It intentionally carries no
//! transport or runtime dependencies so it can be reused in multiple contexts.
//!
//! # Defensive guarantees
//! Panics, `unwrap`, and `expect` are compile-denied here
//! (`#![deny(clippy::panic, clippy::unwrap_used, clippy::expect_used)]`).
//! All fallible paths must surface as `PromFuseError`/`Result` so production
//! processes do not crash on malformed scrape bodies.

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

pub mod error;
pub mod exposition;

/// Shared result type.
pub use error::{PromFuseError, Result};
pub use exposition::MetricRecord;
