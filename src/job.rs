// src/job.rs

//! The immutable job model.
//!
//! A [`Job`] is built once from its [`JobConfig`] declaration, with pipeline
//! variables already substituted into `image` and `script`; everything the
//! scheduler and executor touch afterwards is read-only.

use std::collections::BTreeMap;

use crate::config::model::JobConfig;

/// One unit of work in the pipeline.
#[derive(Debug, Clone)]
pub struct Job {
    /// Unique name within the pipeline; also the artifact namespace key.
    pub name: String,
    /// Execution-environment image, variables substituted.
    pub image: String,
    /// Command sequence, variables substituted.
    pub script: Vec<String>,
    /// Stage membership.
    pub stage: String,
    /// Jobs whose artifacts this job consumes.
    pub needs: Vec<String>,
    /// Branch allow-list; empty means all branches.
    pub only: Vec<String>,
    /// Workspace-relative output paths to persist after success.
    pub artifacts: Vec<String>,
    /// Wall-clock timeout in seconds.
    pub timeout: u64,
}

impl Job {
    /// Build a job from its declaration, applying variable substitution to
    /// `image` and each `script` entry.
    pub fn from_config(
        name: impl Into<String>,
        cfg: JobConfig,
        variables: &BTreeMap<String, String>,
    ) -> Self {
        Self {
            name: name.into(),
            image: substitute_variables(&cfg.image, variables),
            script: cfg
                .script
                .iter()
                .map(|cmd| substitute_variables(cmd, variables))
                .collect(),
            stage: cfg.stage,
            needs: cfg.needs,
            only: cfg.only,
            artifacts: cfg.artifacts.paths,
            timeout: cfg.timeout,
        }
    }

    /// Whether this job is eligible on the given branch.
    pub fn should_run(&self, branch: &str) -> bool {
        if self.only.is_empty() {
            return true;
        }
        self.only.iter().any(|b| b == branch)
    }

    /// The script joined into a single shell body. `&&` chaining means a
    /// mid-sequence failure ends the job.
    pub fn joined_script(&self) -> String {
        self.script.join(" && ")
    }
}

/// Replace every literal `$name` occurrence with the variable's value.
///
/// No braces and no word-boundary check: `$FOO` also matches as a prefix
/// inside `$FOOBAR`. Variables are applied in name order, so shorter names
/// sorting first can clobber longer ones sharing the prefix. This mirrors
/// the substitution the config format has always had.
pub fn substitute_variables(text: &str, variables: &BTreeMap<String, String>) -> String {
    let mut out = text.to_string();
    for (name, value) in variables {
        out = out.replace(&format!("${name}"), value);
    }
    out
}
