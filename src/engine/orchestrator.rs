// src/engine/orchestrator.rs

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use anyhow::Result;
use tracing::{info, warn};

use crate::artifacts::ArtifactStore;
use crate::config::model::PipelineConfig;
use crate::dag::scheduler::plan_generations;
use crate::engine::executor::Executor;
use crate::exec::backend::ExecBackend;
use crate::job::Job;

const BANNER_WIDTH: usize = 60;

/// Terminal state of a pipeline run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineStatus {
    Succeeded,
    Failed,
}

impl PipelineStatus {
    pub fn is_success(self) -> bool {
        matches!(self, PipelineStatus::Succeeded)
    }

    /// Process exit code for this outcome.
    pub fn exit_code(self) -> i32 {
        if self.is_success() { 0 } else { 1 }
    }
}

/// A fully constructed pipeline: declared stage order, jobs with variables
/// already substituted, and the branch/workspace context injected at
/// construction time.
pub struct Pipeline {
    config_name: String,
    stages: Vec<String>,
    variables: BTreeMap<String, String>,
    jobs: Vec<Job>,
    branch: String,
    workspace: PathBuf,
}

impl Pipeline {
    pub fn new(
        cfg: PipelineConfig,
        branch: String,
        workspace: PathBuf,
        config_name: String,
    ) -> Self {
        let jobs = cfg
            .jobs
            .into_iter()
            .map(|(name, job_cfg)| Job::from_config(name, job_cfg, &cfg.variables))
            .collect();

        Self {
            config_name,
            stages: cfg.stages,
            variables: cfg.variables,
            jobs,
            branch,
            workspace,
        }
    }

    /// Execute the whole pipeline: stages in declared order, each stage's
    /// jobs scheduled into generations and dispatched through `backend`.
    ///
    /// Fail-fast semantics: a cycle or any failed job result ends the run
    /// after the current generation, skipping all later generations and
    /// stages. The artifact staging area is removed on every terminal path.
    pub async fn run(&self, backend: Arc<dyn ExecBackend>) -> Result<PipelineStatus> {
        self.print_banner();

        let stage_jobs = self.group_jobs_by_stage();
        let runnable: usize = self
            .stages
            .iter()
            .filter_map(|stage| stage_jobs.get(stage.as_str()))
            .map(|jobs| jobs.len())
            .sum();

        if runnable == 0 {
            println!("No jobs to run on this branch.");
            return Ok(PipelineStatus::Succeeded);
        }

        let store = Arc::new(ArtifactStore::create(&self.workspace)?);
        let executor = Executor::new(backend, self.workspace.clone(), Arc::clone(&store));
        let started = Instant::now();

        info!(
            branch = %self.branch,
            stages = self.stages.len(),
            jobs = runnable,
            "pipeline run starting"
        );

        // run_stages never bails, so cleanup is reached on every path.
        let status = self.run_stages(&executor, &stage_jobs, runnable, started).await;

        if let Err(err) = store.cleanup() {
            warn!(error = %err, "failed to remove artifact staging directory");
        }

        Ok(status)
    }

    async fn run_stages(
        &self,
        executor: &Executor,
        stage_jobs: &BTreeMap<String, Vec<Job>>,
        runnable: usize,
        started: Instant,
    ) -> PipelineStatus {
        for stage in &self.stages {
            let Some(jobs) = stage_jobs.get(stage.as_str()) else {
                continue;
            };
            if jobs.is_empty() {
                continue;
            }

            println!();
            println!("{}", "─".repeat(BANNER_WIDTH));
            println!("Stage: {} ({} job(s))", stage, jobs.len());
            println!("{}", "─".repeat(BANNER_WIDTH));
            println!();

            let generations = match plan_generations(jobs) {
                Ok(generations) => generations,
                Err(err) => {
                    println!("✗ Error in stage '{stage}': {err:#}");
                    return PipelineStatus::Failed;
                }
            };

            for generation in generations {
                let results = executor.run_generation(generation).await;

                let failed: Vec<&str> = results
                    .iter()
                    .filter(|result| !result.is_success())
                    .map(|result| result.name.as_str())
                    .collect();

                if !failed.is_empty() {
                    println!();
                    println!("{}", "=".repeat(BANNER_WIDTH));
                    println!("✗ Pipeline failed at stage '{stage}'");
                    println!("  Failed jobs: {}", failed.join(", "));
                    println!("{}", "=".repeat(BANNER_WIDTH));
                    println!();
                    return PipelineStatus::Failed;
                }
            }
        }

        println!();
        println!("{}", "=".repeat(BANNER_WIDTH));
        println!("✓ Pipeline completed successfully!");
        println!("  Duration: {:.1}s", started.elapsed().as_secs_f64());
        println!("  Jobs executed: {runnable}");
        println!("{}", "=".repeat(BANNER_WIDTH));
        println!();

        PipelineStatus::Succeeded
    }

    /// Print the plan without executing: stage sequence and the generations
    /// the scheduler would dispatch. Surfaces cycle errors the same way a
    /// real run would.
    pub fn print_plan(&self) -> Result<()> {
        self.print_banner();

        let stage_jobs = self.group_jobs_by_stage();

        for stage in &self.stages {
            let Some(jobs) = stage_jobs.get(stage.as_str()) else {
                continue;
            };
            if jobs.is_empty() {
                continue;
            }

            println!("Stage: {} ({} job(s))", stage, jobs.len());
            let generations = plan_generations(jobs)?;
            for (idx, generation) in generations.iter().enumerate() {
                let names: Vec<&str> = generation.iter().map(|job| job.name.as_str()).collect();
                println!("  generation {}: {}", idx + 1, names.join(", "));
            }
        }

        Ok(())
    }

    /// Branch-eligible jobs grouped by their stage name.
    ///
    /// Jobs pointing at an undeclared stage still land in the map but are
    /// never reached by the stage loop; they get a warning here since they
    /// will silently never run otherwise.
    fn group_jobs_by_stage(&self) -> BTreeMap<String, Vec<Job>> {
        let mut grouped: BTreeMap<String, Vec<Job>> = BTreeMap::new();

        for job in &self.jobs {
            if !job.should_run(&self.branch) {
                info!(job = %job.name, branch = %self.branch, "job filtered out by branch");
                continue;
            }
            if !self.stages.contains(&job.stage) {
                warn!(
                    job = %job.name,
                    stage = %job.stage,
                    "job's stage is not in the declared stage order; it will never run"
                );
            }
            grouped.entry(job.stage.clone()).or_default().push(job.clone());
        }

        grouped
    }

    fn print_banner(&self) {
        println!();
        println!("{}", "=".repeat(BANNER_WIDTH));
        println!("pipedag v{}", env!("CARGO_PKG_VERSION"));
        println!("{}", "=".repeat(BANNER_WIDTH));
        println!("Config: {}", self.config_name);
        println!("Branch: {}", self.branch);
        println!("Stages: {}", self.stages.join(" → "));
        println!("Total jobs: {}", self.jobs.len());
        if !self.variables.is_empty() {
            let rendered: Vec<String> = self
                .variables
                .iter()
                .map(|(name, value)| format!("{name}={value}"))
                .collect();
            println!("Variables: {}", rendered.join(", "));
        }
        println!("{}", "=".repeat(BANNER_WIDTH));
        println!();
    }
}
