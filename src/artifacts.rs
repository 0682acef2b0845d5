// src/artifacts.rs

//! Artifact staging between dependent jobs.
//!
//! Successful jobs copy their declared output paths into a hidden staging
//! directory at the workspace root, one namespace per job name. Dependent
//! jobs materialize every staged file back into the workspace before their
//! own work unit runs. The staging directory lives for exactly one pipeline
//! run; [`ArtifactStore::cleanup`] removes it on every terminal path.
//!
//! Namespaces are write-once (a job runs at most once per pipeline
//! invocation) and read-many (each dependent reads independently).

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::debug;

/// Name of the staging directory created under the workspace root.
pub const STAGING_DIR: &str = ".pipedag_artifacts";

/// Staging area for job artifacts, keyed by job name.
#[derive(Debug)]
pub struct ArtifactStore {
    workspace: PathBuf,
    root: PathBuf,
}

impl ArtifactStore {
    /// Create the staging directory under the workspace root.
    pub fn create(workspace: &Path) -> Result<Self> {
        let root = workspace.join(STAGING_DIR);
        fs::create_dir_all(&root)
            .with_context(|| format!("creating artifact staging dir at {:?}", root))?;

        Ok(Self {
            workspace: workspace.to_path_buf(),
            root,
        })
    }

    /// Copy a job's declared output paths into its namespace.
    ///
    /// Paths that do not exist in the workspace are silently skipped; a
    /// declared-but-unproduced artifact is not an error. Directory trees are
    /// copied recursively, merging into any existing destination tree.
    /// Returns the number of paths actually copied.
    pub fn save(&self, job_name: &str, paths: &[String]) -> Result<usize> {
        if paths.is_empty() {
            return Ok(0);
        }

        let namespace = self.root.join(job_name);
        let mut saved = 0;

        for rel in paths {
            let src = self.workspace.join(rel);
            if !src.exists() {
                debug!(job = job_name, path = %rel, "declared artifact path missing; skipping");
                continue;
            }

            let dst = namespace.join(rel);
            if let Some(parent) = dst.parent() {
                fs::create_dir_all(parent)
                    .with_context(|| format!("creating artifact dir {:?}", parent))?;
            }

            if src.is_dir() {
                copy_tree(&src, &dst)?;
            } else {
                fs::copy(&src, &dst)
                    .with_context(|| format!("copying artifact {:?} to {:?}", src, dst))?;
            }
            saved += 1;
        }

        debug!(job = job_name, saved, "artifacts saved");
        Ok(saved)
    }

    /// Materialize every staged file of the given dependencies into the
    /// workspace, preserving relative paths. Dependencies that never saved
    /// artifacts are skipped. Returns the number of files materialized.
    pub fn load(&self, dependency_names: &[String]) -> Result<usize> {
        let mut loaded = 0;

        for dep in dependency_names {
            let namespace = self.root.join(dep);
            if !namespace.is_dir() {
                continue;
            }
            loaded += self.materialize_tree(&namespace, &namespace)?;
        }

        debug!(loaded, "artifact files materialized into workspace");
        Ok(loaded)
    }

    /// Remove the entire staging area. Idempotent.
    pub fn cleanup(&self) -> Result<()> {
        if self.root.exists() {
            fs::remove_dir_all(&self.root)
                .with_context(|| format!("removing artifact staging dir {:?}", self.root))?;
        }
        Ok(())
    }

    fn materialize_tree(&self, dir: &Path, namespace: &Path) -> Result<usize> {
        let mut count = 0;

        for entry in fs::read_dir(dir).with_context(|| format!("reading {:?}", dir))? {
            let entry = entry?;
            let path = entry.path();

            if path.is_dir() {
                count += self.materialize_tree(&path, namespace)?;
                continue;
            }

            let rel = path
                .strip_prefix(namespace)
                .with_context(|| format!("artifact {:?} outside namespace {:?}", path, namespace))?;
            let dst = self.workspace.join(rel);
            if let Some(parent) = dst.parent() {
                fs::create_dir_all(parent)
                    .with_context(|| format!("creating workspace dir {:?}", parent))?;
            }
            fs::copy(&path, &dst)
                .with_context(|| format!("materializing artifact {:?} to {:?}", path, dst))?;
            count += 1;
        }

        Ok(count)
    }
}

/// Recursively copy `src` into `dst`, merging with whatever already exists.
fn copy_tree(src: &Path, dst: &Path) -> Result<()> {
    fs::create_dir_all(dst).with_context(|| format!("creating dir {:?}", dst))?;

    for entry in fs::read_dir(src).with_context(|| format!("reading {:?}", src))? {
        let entry = entry?;
        let from = entry.path();
        let to = dst.join(entry.file_name());

        if from.is_dir() {
            copy_tree(&from, &to)?;
        } else {
            fs::copy(&from, &to).with_context(|| format!("copying {:?} to {:?}", from, to))?;
        }
    }

    Ok(())
}
