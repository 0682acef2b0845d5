// src/config/loader.rs

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result, anyhow, bail};
use serde_yaml::Value;
use tracing::debug;

use crate::config::model::{JobConfig, PipelineConfig};

/// Load a pipeline file from a given path.
///
/// This is the entry point used by `lib.rs`: it reads the file, parses the
/// YAML document and extracts the job declarations. A missing or unparseable
/// file is a fatal configuration error, reported before any job runs.
pub fn load_from_path(path: impl AsRef<Path>) -> Result<PipelineConfig> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path)
        .with_context(|| format!("reading pipeline config at {:?}", path))?;

    parse_document(&contents).with_context(|| format!("parsing pipeline config from {:?}", path))
}

/// Parse a YAML pipeline document into a [`PipelineConfig`].
///
/// The document layout follows the usual CI convention: `stages` and
/// `variables` are reserved top-level keys, and every *other* top-level key
/// whose value is a mapping declares a job. Non-mapping entries (say, a
/// stray scalar) are skipped rather than rejected.
pub fn parse_document(contents: &str) -> Result<PipelineConfig> {
    let doc: Value = serde_yaml::from_str(contents).context("invalid YAML")?;

    let mapping = match doc {
        Value::Mapping(m) => m,
        Value::Null => return Ok(PipelineConfig::default()),
        _ => return Err(anyhow!("pipeline config must be a YAML mapping at the top level")),
    };

    let mut config = PipelineConfig::default();

    if let Some(stages) = mapping.get("stages") {
        config.stages = serde_yaml::from_value(stages.clone())
            .context("`stages` must be a list of stage names")?;
    }

    if let Some(variables) = mapping.get("variables") {
        config.variables = parse_variables(variables)?;
    }

    for (key, value) in &mapping {
        let Some(name) = key.as_str() else { continue };
        if name == "stages" || name == "variables" {
            continue;
        }

        // Only mapping-valued entries declare jobs.
        if !value.is_mapping() {
            debug!(key = name, "skipping non-mapping top-level entry");
            continue;
        }

        let job: JobConfig = serde_yaml::from_value(value.clone())
            .with_context(|| format!("invalid declaration for job '{name}'"))?;

        if job.timeout == 0 {
            bail!("job '{name}': timeout must be >= 1 second");
        }

        config.jobs.insert(name.to_string(), job);
    }

    debug!(
        stages = config.stages.len(),
        jobs = config.jobs.len(),
        "pipeline config parsed"
    );

    Ok(config)
}

/// `variables` values may be scalars of any YAML type; they are coerced to
/// their string form for substitution.
fn parse_variables(value: &Value) -> Result<BTreeMap<String, String>> {
    let mapping = value
        .as_mapping()
        .ok_or_else(|| anyhow!("`variables` must be a mapping"))?;

    let mut variables = BTreeMap::new();
    for (key, value) in mapping {
        let name = key
            .as_str()
            .ok_or_else(|| anyhow!("variable names must be strings"))?;
        let rendered = match value {
            Value::String(s) => s.clone(),
            Value::Bool(b) => b.to_string(),
            Value::Number(n) => n.to_string(),
            other => bail!("variable '{name}' has a non-scalar value: {other:?}"),
        };
        variables.insert(name.to_string(), rendered);
    }

    Ok(variables)
}
