// src/git.rs

//! Branch detection.
//!
//! The engine only consumes the branch as an input string; this module is
//! the single external query that produces it. Any failure (no git, not a
//! repository, detached query hanging) falls back to `"main"`.

use std::time::Duration;

use anyhow::{Context, Result, bail};
use tokio::process::Command;
use tokio::time::timeout;
use tracing::debug;

const GIT_QUERY_TIMEOUT: Duration = Duration::from_secs(5);

/// Detect the current git branch, falling back to `"main"`.
pub async fn current_branch() -> String {
    match query_branch().await {
        Ok(branch) if !branch.is_empty() => branch,
        Ok(_) => "main".to_string(),
        Err(err) => {
            debug!(error = %err, "branch detection failed; assuming 'main'");
            "main".to_string()
        }
    }
}

async fn query_branch() -> Result<String> {
    let output = timeout(
        GIT_QUERY_TIMEOUT,
        Command::new("git")
            .args(["rev-parse", "--abbrev-ref", "HEAD"])
            .output(),
    )
    .await
    .context("git query timed out")?
    .context("running git")?;

    if !output.status.success() {
        bail!("git exited with {}", output.status);
    }

    Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
}
