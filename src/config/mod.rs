// src/config/mod.rs

//! Pipeline configuration loading.
//!
//! Responsibilities:
//! - Define the YAML-backed data model with its field defaults (`model.rs`).
//! - Load a pipeline file from disk and extract the job declarations
//!   (`loader.rs`).
//!
//! Dependency and cycle checking is deliberately *not* done here: unknown
//! `needs` references are ignored by the graph, and cycles are only
//! detectable per stage, so both live in [`crate::dag::scheduler`].

pub mod loader;
pub mod model;

pub use loader::{load_from_path, parse_document};
pub use model::{ArtifactsConfig, JobConfig, PipelineConfig};
