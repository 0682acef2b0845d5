// src/engine/executor.rs

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use anyhow::Result;
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tracing::{debug, error};

use crate::artifacts::ArtifactStore;
use crate::exec::backend::ExecBackend;
use crate::exec::work_unit::{WorkUnitOutcome, run_work_unit};
use crate::job::Job;

/// One line of job output, tagged with the producing job's name so that
/// concurrent jobs can share a single sink without corrupting each other.
#[derive(Debug, Clone)]
pub struct OutputLine {
    pub job: String,
    pub text: String,
}

/// Per-job output handle.
///
/// For a generation of several jobs, every logger writes into the shared
/// channel and the executor's drain loop is the only writer to stdout. For
/// an inline single-job generation there is nothing to multiplex and lines
/// are printed directly.
#[derive(Clone)]
pub struct JobLogger {
    job: String,
    tx: Option<mpsc::Sender<OutputLine>>,
}

impl JobLogger {
    fn direct(job: &str) -> Self {
        Self {
            job: job.to_string(),
            tx: None,
        }
    }

    fn channel(job: &str, tx: mpsc::Sender<OutputLine>) -> Self {
        Self {
            job: job.to_string(),
            tx: Some(tx),
        }
    }

    /// Emit one line of output for this job.
    pub async fn line(&self, text: impl Into<String>) {
        let text = text.into();
        match &self.tx {
            Some(tx) => {
                let _ = tx
                    .send(OutputLine {
                        job: self.job.clone(),
                        text,
                    })
                    .await;
            }
            None => println!("[{}] {}", self.job, text),
        }
    }
}

/// Why a job failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureReason {
    /// The work unit exited non-zero.
    ExitCode(i32),
    /// The work unit exceeded the job's timeout (seconds) and was killed.
    Timeout(u64),
    /// The work unit could not be run at all (launch or IO error), or
    /// artifact handling failed.
    Error(String),
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureReason::ExitCode(code) => write!(f, "exit code {code}"),
            FailureReason::Timeout(secs) => write!(f, "timeout after {secs}s"),
            FailureReason::Error(msg) => write!(f, "{msg}"),
        }
    }
}

/// Terminal state of one executed job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobStatus {
    Success,
    Failed(FailureReason),
}

/// Produced exactly once per executed job; never for jobs skipped by branch
/// filter or stage mismatch.
#[derive(Debug, Clone)]
pub struct JobResult {
    pub name: String,
    pub status: JobStatus,
}

impl JobResult {
    pub fn is_success(&self) -> bool {
        matches!(self.status, JobStatus::Success)
    }
}

/// Runs one generation's jobs concurrently and collects their results.
pub struct Executor {
    backend: Arc<dyn ExecBackend>,
    workspace: PathBuf,
    store: Arc<ArtifactStore>,
}

impl Executor {
    pub fn new(backend: Arc<dyn ExecBackend>, workspace: PathBuf, store: Arc<ArtifactStore>) -> Self {
        Self {
            backend,
            workspace,
            store,
        }
    }

    /// Run every job of one generation and return one result per job.
    ///
    /// Concurrency is bounded by the generation's size: each job gets its
    /// own task, and the call returns only after all of them reached a
    /// terminal state. A failing job does not cancel its siblings; only the
    /// *next* generation is withheld, by the orchestrator.
    ///
    /// A single-job generation runs inline on the current task; that is an
    /// efficiency short-circuit only, with identical observable behavior.
    pub async fn run_generation(&self, generation: Vec<Job>) -> Vec<JobResult> {
        if generation.len() == 1 {
            let job = generation.into_iter().next().expect("one job");
            let logger = JobLogger::direct(&job.name);
            let result = run_job(
                Arc::clone(&self.backend),
                Arc::clone(&self.store),
                self.workspace.clone(),
                job,
                logger,
            )
            .await;
            return vec![result];
        }

        let (tx, mut rx) = mpsc::channel::<OutputLine>(64);
        let mut workers = JoinSet::new();

        for job in generation {
            let logger = JobLogger::channel(&job.name, tx.clone());
            workers.spawn(run_job(
                Arc::clone(&self.backend),
                Arc::clone(&self.store),
                self.workspace.clone(),
                job,
                logger,
            ));
        }
        drop(tx);

        // Sole consumer of the shared sink; ends when the last worker drops
        // its sender.
        while let Some(line) = rx.recv().await {
            println!("[{}] {}", line.job, line.text);
        }

        let mut results = Vec::new();
        while let Some(joined) = workers.join_next().await {
            match joined {
                Ok(result) => results.push(result),
                Err(err) => error!(error = %err, "job worker task failed to join"),
            }
        }
        results
    }
}

/// Drive one job to a terminal result.
///
/// Any error escaping the inner procedure (artifact IO, spawn failure) is
/// converted into a failed result here; nothing propagates past the job
/// boundary.
async fn run_job(
    backend: Arc<dyn ExecBackend>,
    store: Arc<ArtifactStore>,
    workspace: PathBuf,
    job: Job,
    logger: JobLogger,
) -> JobResult {
    let started = Instant::now();
    logger.line("Starting job...").await;
    logger.line(format!("Image: {}", job.image)).await;

    let status = match run_job_inner(&*backend, &store, &workspace, &job, &logger, started).await {
        Ok(status) => status,
        Err(err) => {
            let detail = format!("{err:#}");
            logger.line(format!("✗ Error: {detail}")).await;
            JobStatus::Failed(FailureReason::Error(detail))
        }
    };

    JobResult {
        name: job.name,
        status,
    }
}

async fn run_job_inner(
    backend: &dyn ExecBackend,
    store: &ArtifactStore,
    workspace: &Path,
    job: &Job,
    logger: &JobLogger,
    started: Instant,
) -> Result<JobStatus> {
    if !job.needs.is_empty() {
        logger.line("Loading artifacts from dependencies...").await;
        let count = store.load(&job.needs)?;
        if count > 0 {
            logger.line(format!("Loaded {count} artifact file(s)")).await;
        }
    }

    let outcome = run_work_unit(backend, job, workspace, logger).await?;

    match outcome {
        WorkUnitOutcome::TimedOut => {
            logger
                .line(format!("✗ Job timed out after {}s", job.timeout))
                .await;
            Ok(JobStatus::Failed(FailureReason::Timeout(job.timeout)))
        }
        WorkUnitOutcome::Exited(0) => {
            if !job.artifacts.is_empty() {
                logger.line("Saving artifacts...").await;
                let count = store.save(&job.name, &job.artifacts)?;
                if count > 0 {
                    logger.line(format!("Saved {count} artifact(s)")).await;
                }
            }
            debug!(job = %job.name, "job succeeded");
            logger
                .line(format!(
                    "✓ Job completed successfully ({:.1}s)",
                    started.elapsed().as_secs_f64()
                ))
                .await;
            Ok(JobStatus::Success)
        }
        WorkUnitOutcome::Exited(code) => {
            logger.line(format!("✗ Job failed: exit code {code}")).await;
            Ok(JobStatus::Failed(FailureReason::ExitCode(code)))
        }
    }
}
