// src/exec/work_unit.rs

use std::path::Path;
use std::process::Stdio;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tracing::{debug, info};

use crate::engine::executor::JobLogger;
use crate::exec::backend::ExecBackend;
use crate::job::Job;

/// Terminal state of one work-unit invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkUnitOutcome {
    /// The process ran to completion with this exit code (-1 when killed by
    /// a signal).
    Exited(i32),
    /// The process exceeded the job's wall-clock timeout and was killed.
    TimedOut,
}

/// Run one job's script through the backend, streaming combined output
/// through the job's logger line by line.
///
/// The timeout deadline starts when monitoring starts, immediately after
/// spawn, and fires even if the process never produces output. Launch and IO
/// errors surface as `Err`; the caller converts them into a failed job
/// result.
pub async fn run_work_unit(
    backend: &dyn ExecBackend,
    job: &Job,
    workspace: &Path,
    logger: &JobLogger,
) -> Result<WorkUnitOutcome> {
    let script = job.joined_script();
    debug!(job = %job.name, image = %job.image, "starting work unit");

    let mut cmd = backend.command(&job.image, &script, workspace);
    cmd.stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    let mut child = cmd
        .spawn()
        .with_context(|| format!("spawning work unit for job '{}'", job.name))?;

    // Both pipes feed the same logger, so interleaving happens only at line
    // granularity.
    let stdout_task = child.stdout.take().map(|pipe| forward_lines(pipe, logger.clone()));
    let stderr_task = child.stderr.take().map(|pipe| forward_lines(pipe, logger.clone()));

    let status = match timeout(Duration::from_secs(job.timeout), child.wait()).await {
        Ok(status) => {
            status.with_context(|| format!("waiting for work unit of job '{}'", job.name))?
        }
        Err(_) => {
            info!(job = %job.name, timeout = job.timeout, "work unit exceeded timeout; killing");
            child.kill().await.ok();
            drain(stdout_task, stderr_task).await;
            return Ok(WorkUnitOutcome::TimedOut);
        }
    };

    drain(stdout_task, stderr_task).await;

    let code = status.code().unwrap_or(-1);
    debug!(job = %job.name, exit_code = code, "work unit exited");
    Ok(WorkUnitOutcome::Exited(code))
}

/// Forward one pipe to the job logger until EOF.
fn forward_lines(pipe: impl AsyncRead + Unpin + Send + 'static, logger: JobLogger) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut lines = BufReader::new(pipe).lines();
        while let Ok(Some(line)) = lines.next_line().await {
            logger.line(line).await;
        }
    })
}

/// Wait for the forwarders to flush whatever the process wrote before it
/// exited (or was killed, which closes the pipes).
async fn drain(stdout_task: Option<JoinHandle<()>>, stderr_task: Option<JoinHandle<()>>) {
    if let Some(task) = stdout_task {
        task.await.ok();
    }
    if let Some(task) = stderr_task {
        task.await.ok();
    }
}
