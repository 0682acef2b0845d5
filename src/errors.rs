// src/errors.rs

//! Crate-wide error aliases.
//!
//! Job-level failures are never represented as errors; they are converted to
//! [`crate::engine::JobResult`] data at the executor boundary. What remains
//! (config, IO, wiring) is plain `anyhow`, and this module gives a single
//! place to add more structured error types later.

pub use anyhow::{Error, Result};
