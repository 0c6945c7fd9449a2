//! Step conversion
//!
//! Projects each authored [`Step`] into its wire form. Conversion is an
//! exhaustive match over the step variants; ids come from the canonical path
//! of the referenced entity, so they are only known once the whole list is
//! converted and the linking pass has to run afterwards.

use serde_json::{Map, Value, json};
use std::collections::HashSet;
use tracing::debug;

use stepline_core::domain::pipeline::{
    ActivityOptions, CompiledStep, PipelineDefinition, PipelineRuntime, TemporalRuntime,
};
use stepline_core::domain::step::{Step, StepData};
use stepline_core::registry;

use crate::error::{CompileError, Result};
use crate::linker::{link_steps, placeholder_reference};

/// Compile an authored step list into a linked pipeline definition
///
/// # Errors
/// Returns an error if the list is empty or any step misses the data it
/// references. Nothing is returned for a partially converted list.
pub fn compile_pipeline(
    name: &str,
    steps: &[Step],
    activity_options: ActivityOptions,
) -> Result<PipelineDefinition> {
    if steps.is_empty() {
        return Err(CompileError::EmptyPipeline);
    }

    let mut compiled = compile_steps(steps)?;
    let linked = link_steps(&mut compiled);
    debug!(
        "Compiled pipeline '{}': {} step(s), {} deep-link(s) resolved",
        name,
        compiled.len(),
        linked
    );

    Ok(PipelineDefinition {
        name: name.to_string(),
        runtime: PipelineRuntime {
            temporal: TemporalRuntime { activity_options },
            global_runner_id: None,
        },
        steps: compiled,
    })
}

/// Convert every step, keeping compiled ids unique within the list
///
/// Two steps referencing the same entity get `<id>`, `<id>-2`, `<id>-3`, ...
pub fn compile_steps(steps: &[Step]) -> Result<Vec<CompiledStep>> {
    let mut taken = HashSet::with_capacity(steps.len());
    let mut compiled = Vec::with_capacity(steps.len());

    for step in steps {
        let mut out = compile_step(step)?;
        if !taken.insert(out.id.clone()) {
            let base = out.id.clone();
            let mut n = 2;
            while !taken.insert(format!("{base}-{n}")) {
                n += 1;
            }
            out.id = format!("{base}-{n}");
        }
        compiled.push(out);
    }

    Ok(compiled)
}

/// Convert one step into its wire form, without linking
pub fn compile_step(step: &Step) -> Result<CompiledStep> {
    let mut with = Map::new();

    let (uses, entity_path) = match &step.data {
        StepData::MobileAutomation(data) => {
            let action_path = required(step, &data.action.path, "automation action")?;
            let version_path = required(step, &data.version.path, "wallet version")?;
            with.insert("action_id".to_string(), json!(action_path));
            with.insert("version_id".to_string(), json!(version_path));
            if let Some(runner) = &data.runner {
                with.insert("runner_id".to_string(), json!(runner.path));
            }
            if data.action.needs_deeplink() {
                with.insert(
                    "parameters".to_string(),
                    json!({ "deeplink": placeholder_reference() }),
                );
            }
            (step.kind().as_str().to_string(), action_path.to_string())
        }
        StepData::CredentialOffer(item) => {
            let path = required(step, &item.path, "credential")?;
            with.insert("credential_id".to_string(), json!(path));
            (step.kind().as_str().to_string(), path.to_string())
        }
        StepData::UseCaseVerification(item) => {
            let path = required(step, &item.path, "use case verification")?;
            with.insert("use_case_id".to_string(), json!(path));
            (step.kind().as_str().to_string(), path.to_string())
        }
        StepData::CustomCheck(item) => {
            let path = required(step, &item.path, "custom check")?;
            with.insert("check_id".to_string(), json!(path));
            (step.kind().as_str().to_string(), path.to_string())
        }
        StepData::ConformanceCheck(check) => {
            for (part, field) in [
                (&check.standard, "conformance standard"),
                (&check.version, "standard version"),
                (&check.suite, "test suite"),
                (&check.test, "conformance test"),
            ] {
                required(step, part, field)?;
            }
            let path = check.path();
            with.insert("check_id".to_string(), json!(path));
            (step.kind().as_str().to_string(), path)
        }
        StepData::Utility(utility) => {
            if !utility.parameters.is_empty() {
                with.insert(
                    "parameters".to_string(),
                    Value::Object(utility.parameters.clone()),
                );
            }
            let uses = utility.action.as_str().to_string();
            (uses.clone(), uses)
        }
    };

    let id = registry::compiled_id(&entity_path)
        .ok_or_else(|| CompileError::MissingReference {
            step_id: step.id.clone(),
            field: "canonical path",
        })?
        .to_string();

    Ok(CompiledStep {
        uses,
        id,
        continue_on_error: step.continue_on_error,
        with,
    })
}

fn required<'a>(step: &Step, value: &'a str, field: &'static str) -> Result<&'a str> {
    if value.trim().is_empty() {
        return Err(CompileError::MissingReference {
            step_id: step.id.clone(),
            field,
        });
    }
    Ok(value)
}
