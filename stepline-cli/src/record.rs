//! Pipeline record files
//!
//! A record is the JSON document a pipeline is saved as: its id, name, the
//! authored steps and the compiled definition text.

use std::path::Path;

use anyhow::{Context, Result};
use serde_json::Value;
use stepline_builder::StepBuilder;
use stepline_compiler::{ActivityOptions, PipelineDefinition, compile_pipeline, to_yaml};
use stepline_core::domain::pipeline::PipelineRecord;
use stepline_core::registry::parse_step;
use tracing::debug;

/// Read a record, decoding each step by its `type`
pub fn load_record(path: &Path) -> Result<PipelineRecord> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read record file: {}", path.display()))?;
    parse_record(&text).with_context(|| format!("Invalid record file: {}", path.display()))
}

pub fn parse_record(text: &str) -> Result<PipelineRecord> {
    let mut value: Value = serde_json::from_str(text)?;

    let raw_steps = match value.as_object_mut().and_then(|o| o.remove("steps")) {
        Some(Value::Array(steps)) => steps,
        Some(Value::Null) | None => Vec::new(),
        Some(other) => anyhow::bail!("`steps` must be an array, found {}", other),
    };

    let mut record: PipelineRecord = serde_json::from_value(value)?;
    record.steps = raw_steps
        .into_iter()
        .enumerate()
        .map(|(index, step)| {
            parse_step(step).with_context(|| format!("Step {} could not be decoded", index + 1))
        })
        .collect::<Result<_>>()?;

    debug!("Loaded record {} with {} step(s)", record.id, record.steps.len());
    Ok(record)
}

pub fn save_record(path: &Path, record: &PipelineRecord) -> Result<()> {
    let text = serde_json::to_string_pretty(record)?;
    std::fs::write(path, text)
        .with_context(|| format!("Failed to write record file: {}", path.display()))
}

/// Read engine activity options from a YAML file, or use the defaults
pub fn load_activity_options(path: Option<&Path>) -> Result<ActivityOptions> {
    let Some(path) = path else {
        return Ok(ActivityOptions::default());
    };
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read activity options: {}", path.display()))?;
    serde_yaml::from_str(&text)
        .with_context(|| format!("Invalid activity options: {}", path.display()))
}

/// Compile the builder's steps under the record's name
pub fn compile(
    record: &PipelineRecord,
    builder: &StepBuilder,
    options: ActivityOptions,
) -> Result<PipelineDefinition> {
    if !builder.is_ready() {
        anyhow::bail!("Pipeline {} has no steps to compile", record.id);
    }
    compile_pipeline(&record.name, builder.steps(), options)
        .with_context(|| format!("Failed to compile pipeline {}", record.id))
}

/// Store the builder's steps in the record along with their compiled text
pub fn update_record(
    record: &mut PipelineRecord,
    builder: &StepBuilder,
    options: ActivityOptions,
) -> Result<()> {
    record.steps = builder.steps().to_vec();
    record.yaml = if builder.is_ready() {
        to_yaml(&compile(record, builder, options)?)?
    } else {
        String::new()
    };
    Ok(())
}
