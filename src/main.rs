// src/main.rs

use pipedag::engine::PipelineStatus;
use pipedag::{cli, logging, run};

#[tokio::main]
async fn main() {
    match run_main().await {
        Ok(status) => std::process::exit(status.exit_code()),
        Err(err) => {
            eprintln!("pipedag error: {err:?}");
            std::process::exit(1);
        }
    }
}

async fn run_main() -> anyhow::Result<PipelineStatus> {
    let args = cli::parse();
    logging::init_logging(args.log_level)?;
    run(args).await
}
