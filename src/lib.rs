// src/lib.rs

pub mod artifacts;
pub mod cli;
pub mod config;
pub mod dag;
pub mod engine;
pub mod errors;
pub mod exec;
pub mod git;
pub mod job;
pub mod logging;

use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, bail};
use tracing::debug;

use crate::errors::Result;

use crate::cli::CliArgs;
use crate::engine::{Pipeline, PipelineStatus};
use crate::exec::DockerBackend;

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - config loading
/// - branch detection (unless overridden on the CLI)
/// - pipeline construction (variables substituted, workspace resolved)
/// - the run itself, against the docker backend
pub async fn run(args: CliArgs) -> Result<PipelineStatus> {
    let config_path = PathBuf::from(&args.config);
    if !config_path.exists() {
        bail!("config file '{}' not found", args.config);
    }

    let cfg = config::loader::load_from_path(&config_path)?;

    let workspace = fs::canonicalize(&args.workspace)
        .with_context(|| format!("resolving workspace directory '{}'", args.workspace))?;

    let branch = match args.branch {
        Some(branch) => branch,
        None => git::current_branch().await,
    };
    debug!(branch = %branch, workspace = ?workspace, "pipeline context resolved");

    let config_name = config_path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| args.config.clone());

    let pipeline = Pipeline::new(cfg, branch, workspace, config_name);

    if args.dry_run {
        pipeline.print_plan()?;
        return Ok(PipelineStatus::Succeeded);
    }

    pipeline.run(Arc::new(DockerBackend)).await
}
