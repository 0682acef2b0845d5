// tests/common/mod.rs

use std::path::Path;

use tokio::process::Command;

use pipedag::exec::ExecBackend;
use pipedag::job::Job;

/// Backend that runs scripts with the host shell instead of a container,
/// using the workspace as the working directory. Keeps the executor's
/// spawn/stream/timeout path fully exercised without docker.
#[allow(dead_code)]
pub struct LocalShell;

impl ExecBackend for LocalShell {
    fn command(&self, _image: &str, script: &str, workspace: &Path) -> Command {
        let mut cmd = Command::new("sh");
        cmd.arg("-c").arg(script);
        cmd.current_dir(workspace);
        cmd
    }
}

/// Minimal job with sensible defaults for scheduler-level tests.
#[allow(dead_code)]
pub fn job(name: &str, stage: &str, needs: &[&str]) -> Job {
    shell_job(name, stage, needs, &["true"])
}

/// Job running the given script lines, everything else defaulted.
#[allow(dead_code)]
pub fn shell_job(name: &str, stage: &str, needs: &[&str], script: &[&str]) -> Job {
    Job {
        name: name.to_string(),
        image: "unused".to_string(),
        script: script.iter().map(|s| s.to_string()).collect(),
        stage: stage.to_string(),
        needs: needs.iter().map(|s| s.to_string()).collect(),
        only: Vec::new(),
        artifacts: Vec::new(),
        timeout: 3600,
    }
}
