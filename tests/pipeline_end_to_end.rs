mod common;

use std::error::Error;
use std::path::Path;
use std::sync::Arc;

use common::LocalShell;
use pipedag::artifacts::STAGING_DIR;
use pipedag::config::parse_document;
use pipedag::engine::{Pipeline, PipelineStatus};

type TestResult = Result<(), Box<dyn Error>>;

fn pipeline(yaml: &str, branch: &str, ws: &Path) -> Result<Pipeline, Box<dyn Error>> {
    let cfg = parse_document(yaml)?;
    Ok(Pipeline::new(
        cfg,
        branch.to_string(),
        ws.to_path_buf(),
        "pipeline.yml".to_string(),
    ))
}

#[tokio::test]
async fn build_then_test_runs_stages_in_order_and_succeeds() -> TestResult {
    let dir = tempfile::tempdir()?;
    let ws = dir.path();

    let yaml = r#"
stages: [build, test]

compile:
  stage: build
  script:
    - echo binary > out.txt
  artifacts:
    paths: [out.txt]

unit:
  stage: test
  needs: [compile]
  script:
    - grep binary out.txt
    - touch unit_ran
"#;

    let status = pipeline(yaml, "main", ws)?
        .run(Arc::new(LocalShell))
        .await?;

    assert_eq!(status, PipelineStatus::Succeeded);
    assert_eq!(status.exit_code(), 0);
    assert!(ws.join("unit_ran").exists());
    // The staging area is gone once the run ends.
    assert!(!ws.join(STAGING_DIR).exists());
    Ok(())
}

#[tokio::test]
async fn cycle_fails_the_stage_without_running_any_job() -> TestResult {
    let dir = tempfile::tempdir()?;
    let ws = dir.path();

    let yaml = r#"
a:
  needs: [b]
  script: [touch a_ran]

b:
  needs: [a]
  script: [touch b_ran]
"#;

    let status = pipeline(yaml, "main", ws)?
        .run(Arc::new(LocalShell))
        .await?;

    assert_eq!(status, PipelineStatus::Failed);
    assert_eq!(status.exit_code(), 1);
    assert!(!ws.join("a_ran").exists());
    assert!(!ws.join("b_ran").exists());
    assert!(!ws.join(STAGING_DIR).exists());
    Ok(())
}

#[tokio::test]
async fn failure_in_an_early_stage_skips_later_stages() -> TestResult {
    let dir = tempfile::tempdir()?;
    let ws = dir.path();

    let yaml = r#"
stages: [build, test]

broken:
  stage: build
  script: [exit 1]

later:
  stage: test
  script: [touch later_ran]
"#;

    let status = pipeline(yaml, "main", ws)?
        .run(Arc::new(LocalShell))
        .await?;

    assert_eq!(status, PipelineStatus::Failed);
    assert!(!ws.join("later_ran").exists());
    assert!(!ws.join(STAGING_DIR).exists());
    Ok(())
}

#[tokio::test]
async fn failure_withholds_the_next_generation_in_the_same_stage() -> TestResult {
    let dir = tempfile::tempdir()?;
    let ws = dir.path();

    let yaml = r#"
first:
  script: [exit 1]

second:
  needs: [first]
  script: [touch second_ran]
"#;

    let status = pipeline(yaml, "main", ws)?
        .run(Arc::new(LocalShell))
        .await?;

    assert_eq!(status, PipelineStatus::Failed);
    assert!(!ws.join("second_ran").exists());
    Ok(())
}

#[tokio::test]
async fn branch_filtered_jobs_never_run() -> TestResult {
    let dir = tempfile::tempdir()?;
    let ws = dir.path();

    let yaml = r#"
release-only:
  only: [release]
  script: [touch release_ran]
"#;

    let status = pipeline(yaml, "main", ws)?
        .run(Arc::new(LocalShell))
        .await?;

    // Nothing is eligible, which is a no-op success.
    assert_eq!(status, PipelineStatus::Succeeded);
    assert!(!ws.join("release_ran").exists());
    Ok(())
}

#[tokio::test]
async fn matching_branch_runs_the_filtered_job() -> TestResult {
    let dir = tempfile::tempdir()?;
    let ws = dir.path();

    let yaml = r#"
release-only:
  only: [release]
  script: [touch release_ran]
"#;

    let status = pipeline(yaml, "release", ws)?
        .run(Arc::new(LocalShell))
        .await?;

    assert_eq!(status, PipelineStatus::Succeeded);
    assert!(ws.join("release_ran").exists());
    Ok(())
}

#[tokio::test]
async fn job_with_undeclared_stage_never_runs() -> TestResult {
    let dir = tempfile::tempdir()?;
    let ws = dir.path();

    let yaml = r#"
stages: [test]

ghost:
  stage: deploy
  script: [touch ghost_ran]

ok:
  stage: test
  script: [touch ok_ran]
"#;

    let status = pipeline(yaml, "main", ws)?
        .run(Arc::new(LocalShell))
        .await?;

    assert_eq!(status, PipelineStatus::Succeeded);
    assert!(ws.join("ok_ran").exists());
    assert!(!ws.join("ghost_ran").exists());
    Ok(())
}

#[tokio::test]
async fn empty_pipeline_is_a_no_op_success() -> TestResult {
    let dir = tempfile::tempdir()?;

    let status = pipeline("stages: [test]\n", "main", dir.path())?
        .run(Arc::new(LocalShell))
        .await?;

    assert_eq!(status, PipelineStatus::Succeeded);
    Ok(())
}

#[tokio::test]
async fn variables_flow_into_job_scripts() -> TestResult {
    let dir = tempfile::tempdir()?;
    let ws = dir.path();

    let yaml = r#"
variables:
  OUT: result.txt

write:
  script:
    - echo done > $OUT
"#;

    let status = pipeline(yaml, "main", ws)?
        .run(Arc::new(LocalShell))
        .await?;

    assert_eq!(status, PipelineStatus::Succeeded);
    assert!(ws.join("result.txt").exists());
    Ok(())
}

#[tokio::test]
async fn dry_run_plan_reports_cycles() -> TestResult {
    let dir = tempfile::tempdir()?;

    let yaml = r#"
a:
  needs: [b]
  script: [true]

b:
  needs: [a]
  script: [true]
"#;

    let err = pipeline(yaml, "main", dir.path())?.print_plan().unwrap_err();
    assert!(err.to_string().contains("circular dependency"));
    Ok(())
}
