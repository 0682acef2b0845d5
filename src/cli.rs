// src/cli.rs

//! CLI argument parsing using `clap`.

use clap::{Parser, ValueEnum};

/// Command-line arguments for `pipedag`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "pipedag",
    version,
    about = "Run a staged CI pipeline with DAG-scheduled jobs.",
    long_about = None
)]
pub struct CliArgs {
    /// Path to the pipeline config file (YAML).
    #[arg(value_name = "CONFIG")]
    pub config: String,

    /// Workspace directory mounted into every job.
    #[arg(value_name = "WORKSPACE", default_value = ".")]
    pub workspace: String,

    /// Branch to evaluate `only:` filters against.
    ///
    /// If omitted, the current git branch is detected (falling back to
    /// "main" when the workspace is not a git checkout).
    #[arg(long, value_name = "NAME")]
    pub branch: Option<String>,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `PIPEDAG_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// Parse the config, print stages and execution generations, but don't
    /// run any job.
    #[arg(long)]
    pub dry_run: bool,
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}
