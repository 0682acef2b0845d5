// src/exec/backend.rs

use std::path::Path;

use tokio::process::Command;

/// Seam between the executor and whatever actually runs a job's script.
///
/// Implementations only build the [`Command`]; spawning, output streaming
/// and timeout enforcement are shared in [`crate::exec::work_unit`].
pub trait ExecBackend: Send + Sync {
    /// Build the command that runs `script` inside `image`, with `workspace`
    /// available as the working directory.
    fn command(&self, image: &str, script: &str, workspace: &Path) -> Command;
}

/// Default backend: run the script in a disposable container with the
/// workspace bind-mounted at a fixed path.
#[derive(Debug, Default)]
pub struct DockerBackend;

impl ExecBackend for DockerBackend {
    fn command(&self, image: &str, script: &str, workspace: &Path) -> Command {
        let mut cmd = Command::new("docker");
        cmd.arg("run")
            .arg("--rm")
            .arg("-v")
            .arg(format!("{}:/workspace", workspace.display()))
            .arg("-w")
            .arg("/workspace")
            .arg(image)
            .arg("sh")
            .arg("-c")
            .arg(script);
        cmd
    }
}
