use std::error::Error;
use std::fs;

use pipedag::artifacts::{ArtifactStore, STAGING_DIR};

type TestResult = Result<(), Box<dyn Error>>;

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

#[test]
fn save_then_load_round_trips_a_file() -> TestResult {
    let dir = tempfile::tempdir()?;
    let ws = dir.path();
    let store = ArtifactStore::create(ws)?;

    fs::create_dir(ws.join("out"))?;
    fs::write(ws.join("out/binary.txt"), "payload")?;

    let saved = store.save("compile", &strings(&["out/binary.txt"]))?;
    assert_eq!(saved, 1);

    // Wipe the workspace copy; only the staged one remains.
    fs::remove_dir_all(ws.join("out"))?;

    let loaded = store.load(&strings(&["compile"]))?;
    assert_eq!(loaded, 1);
    assert_eq!(fs::read_to_string(ws.join("out/binary.txt"))?, "payload");
    Ok(())
}

#[test]
fn directory_artifacts_copy_recursively() -> TestResult {
    let dir = tempfile::tempdir()?;
    let ws = dir.path();
    let store = ArtifactStore::create(ws)?;

    fs::create_dir_all(ws.join("dist/assets"))?;
    fs::write(ws.join("dist/app.js"), "app")?;
    fs::write(ws.join("dist/assets/logo.svg"), "logo")?;

    let saved = store.save("bundle", &strings(&["dist"]))?;
    assert_eq!(saved, 1);

    fs::remove_dir_all(ws.join("dist"))?;

    let loaded = store.load(&strings(&["bundle"]))?;
    assert_eq!(loaded, 2);
    assert_eq!(fs::read_to_string(ws.join("dist/app.js"))?, "app");
    assert_eq!(fs::read_to_string(ws.join("dist/assets/logo.svg"))?, "logo");
    Ok(())
}

#[test]
fn missing_declared_paths_are_silently_skipped() -> TestResult {
    let dir = tempfile::tempdir()?;
    let ws = dir.path();
    let store = ArtifactStore::create(ws)?;

    fs::write(ws.join("real.txt"), "x")?;

    let saved = store.save("job", &strings(&["real.txt", "never-produced.txt"]))?;
    assert_eq!(saved, 1);
    Ok(())
}

#[test]
fn load_skips_dependencies_that_saved_nothing() -> TestResult {
    let dir = tempfile::tempdir()?;
    let store = ArtifactStore::create(dir.path())?;

    let loaded = store.load(&strings(&["ghost", "also-ghost"]))?;
    assert_eq!(loaded, 0);
    Ok(())
}

#[test]
fn namespaces_are_read_many() -> TestResult {
    let dir = tempfile::tempdir()?;
    let ws = dir.path();
    let store = ArtifactStore::create(ws)?;

    fs::write(ws.join("lib.a"), "obj")?;
    store.save("compile", &strings(&["lib.a"]))?;
    fs::remove_file(ws.join("lib.a"))?;

    assert_eq!(store.load(&strings(&["compile"]))?, 1);
    fs::remove_file(ws.join("lib.a"))?;
    assert_eq!(store.load(&strings(&["compile"]))?, 1);
    assert_eq!(fs::read_to_string(ws.join("lib.a"))?, "obj");
    Ok(())
}

#[test]
fn cleanup_removes_the_staging_area_and_is_idempotent() -> TestResult {
    let dir = tempfile::tempdir()?;
    let ws = dir.path();
    let store = ArtifactStore::create(ws)?;

    fs::write(ws.join("a.txt"), "a")?;
    store.save("job", &strings(&["a.txt"]))?;
    assert!(ws.join(STAGING_DIR).exists());

    store.cleanup()?;
    assert!(!ws.join(STAGING_DIR).exists());

    // Second cleanup is a no-op, not an error.
    store.cleanup()?;
    Ok(())
}
