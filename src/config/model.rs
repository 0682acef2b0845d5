// src/config/model.rs

use std::collections::BTreeMap;

use serde::Deserialize;

/// A single job declaration as it appears in the pipeline file.
///
/// Every top-level YAML key whose value is a mapping (other than `stages`
/// and `variables`) declares one job:
///
/// ```yaml
/// compile:
///   image: rust:1.82
///   stage: build
///   script:
///     - cargo build --release
///   artifacts:
///     paths:
///       - target/release/app
/// ```
///
/// All fields are optional and have fixed defaults.
#[derive(Debug, Clone, Deserialize)]
pub struct JobConfig {
    /// Execution-environment image reference.
    #[serde(default = "default_image")]
    pub image: String,

    /// Ordered command list; joined with `&&` before execution, so a failing
    /// command ends the job.
    #[serde(default)]
    pub script: Vec<String>,

    /// Stage this job belongs to. A job whose stage is not listed in the
    /// pipeline's `stages` never executes.
    #[serde(default = "default_stage")]
    pub stage: String,

    /// Output paths to persist after success.
    #[serde(default)]
    pub artifacts: ArtifactsConfig,

    /// Names of jobs whose artifacts this job requires and whose success is
    /// a precondition. Unknown names are ignored by the scheduler.
    #[serde(default)]
    pub needs: Vec<String>,

    /// Branch allow-list; empty means "all branches".
    #[serde(default)]
    pub only: Vec<String>,

    /// Wall-clock timeout in seconds. Must be >= 1.
    #[serde(default = "default_timeout")]
    pub timeout: u64,
}

/// The `artifacts:` sub-mapping of a job declaration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ArtifactsConfig {
    /// Workspace-relative paths to persist after the job succeeds.
    #[serde(default)]
    pub paths: Vec<String>,
}

fn default_image() -> String {
    "python:3.12".to_string()
}

fn default_stage() -> String {
    "test".to_string()
}

fn default_timeout() -> u64 {
    3600
}

/// A fully extracted pipeline declaration.
///
/// Produced by [`crate::config::loader::parse_document`]; the job map keys
/// are the job names, which makes name uniqueness structural.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Stage execution sequence.
    pub stages: Vec<String>,

    /// Variables substituted into `image` and `script` entries at job
    /// construction time (literal `$name` replacement).
    pub variables: BTreeMap<String, String>,

    /// All declared jobs, keyed by name.
    pub jobs: BTreeMap<String, JobConfig>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            stages: vec![default_stage()],
            variables: BTreeMap::new(),
            jobs: BTreeMap::new(),
        }
    }
}
