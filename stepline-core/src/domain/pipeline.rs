//! Pipeline domain types
//!
//! The compiled wire form handed to the workflow engine, and the persisted
//! record that keeps both the authored steps and the compiled text.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::domain::step::Step;
use crate::registry::StepKind;

/// One step of the compiled step graph
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompiledStep {
    /// Step type identifier understood by the engine
    #[serde(rename = "use")]
    pub uses: String,
    pub id: String,
    #[serde(default)]
    pub continue_on_error: bool,
    /// Type specific parameters
    #[serde(default, rename = "with", skip_serializing_if = "Map::is_empty")]
    pub with: Map<String, Value>,
}

impl CompiledStep {
    pub fn is_mobile_automation(&self) -> bool {
        self.uses == StepKind::MobileAutomation.as_str()
    }

    /// `with.runner_id`, when the step is pinned to a runner
    pub fn runner_id(&self) -> Option<&str> {
        self.with.get("runner_id").and_then(Value::as_str)
    }

    /// `with.parameters.deeplink`, when present
    pub fn deeplink(&self) -> Option<&str> {
        self.with
            .get("parameters")
            .and_then(|p| p.get("deeplink"))
            .and_then(Value::as_str)
    }

    /// Replace `with.parameters.deeplink`; no-op if the step has no parameters object
    pub fn set_deeplink(&mut self, reference: String) {
        if let Some(Value::Object(parameters)) = self.with.get_mut("parameters") {
            parameters.insert("deeplink".to_string(), Value::String(reference));
        }
    }
}

/// Retry policy handed to the engine for every step activity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetryPolicy {
    pub maximum_attempts: u32,
    pub initial_interval: String,
    pub maximum_interval: String,
    pub backoff_coefficient: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            maximum_attempts: 1,
            initial_interval: "1s".to_string(),
            maximum_interval: "1m".to_string(),
            backoff_coefficient: 2.0,
        }
    }
}

/// Per activity options, passed through to the engine uninterpreted
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityOptions {
    pub schedule_to_close_timeout: String,
    pub start_to_close_timeout: String,
    pub retry_policy: RetryPolicy,
}

impl Default for ActivityOptions {
    fn default() -> Self {
        Self {
            schedule_to_close_timeout: "10m".to_string(),
            start_to_close_timeout: "5m".to_string(),
            retry_policy: RetryPolicy::default(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TemporalRuntime {
    pub activity_options: ActivityOptions,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PipelineRuntime {
    pub temporal: TemporalRuntime,
    /// Runner used by every mobile-automation step without its own runner
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub global_runner_id: Option<String>,
}

/// The submitted artifact: name, engine runtime options and the step graph
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineDefinition {
    pub name: String,
    pub runtime: PipelineRuntime,
    pub steps: Vec<CompiledStep>,
}

impl PipelineDefinition {
    pub fn mobile_automation_steps(&self) -> impl Iterator<Item = &CompiledStep> {
        self.steps.iter().filter(|s| s.is_mobile_automation())
    }

    /// True unless every mobile-automation step is pinned to its own runner
    ///
    /// A pipeline without mobile-automation steps still takes the global
    /// runner, since nothing in it names a runner.
    pub fn requires_global_runner(&self) -> bool {
        let mut mobile = self.mobile_automation_steps().peekable();
        if mobile.peek().is_none() {
            return true;
        }
        mobile.any(|s| s.runner_id().is_none())
    }

    /// Copy of this definition with `runtime.global_runner_id` set
    pub fn with_global_runner(&self, runner_id: impl Into<String>) -> Self {
        let mut definition = self.clone();
        definition.runtime.global_runner_id = Some(runner_id.into());
        definition
    }
}

/// Persisted pipeline record as consumed by this workspace
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineRecord {
    pub id: String,
    pub name: String,
    /// Authored steps, used to reopen the builder
    #[serde(default)]
    pub steps: Vec<Step>,
    /// Compiled definition text
    #[serde(default)]
    pub yaml: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn mobile(id: &str, runner: Option<&str>) -> CompiledStep {
        let mut with = Map::new();
        with.insert("action_id".to_string(), json!(format!("acme/wallet/{id}")));
        if let Some(runner) = runner {
            with.insert("runner_id".to_string(), json!(runner));
        }
        CompiledStep {
            uses: "mobile-automation".to_string(),
            id: id.to_string(),
            continue_on_error: true,
            with,
        }
    }

    fn definition(steps: Vec<CompiledStep>) -> PipelineDefinition {
        PipelineDefinition {
            name: "test".to_string(),
            runtime: PipelineRuntime::default(),
            steps,
        }
    }

    #[test]
    fn test_requires_global_runner_when_no_step_is_pinned() {
        let def = definition(vec![mobile("a", None), mobile("b", None)]);
        assert!(def.requires_global_runner());
    }

    #[test]
    fn test_pinned_steps_do_not_require_global_runner() {
        let def = definition(vec![mobile("a", Some("r1")), mobile("b", Some("r2"))]);
        assert!(!def.requires_global_runner());
    }

    #[test]
    fn test_partially_pinned_pipeline_requires_global_runner() {
        let def = definition(vec![mobile("a", Some("r1")), mobile("b", None)]);
        assert!(def.requires_global_runner());
    }

    #[test]
    fn test_pipeline_without_mobile_steps_requires_global_runner() {
        assert!(definition(vec![]).requires_global_runner());
    }

    #[test]
    fn test_with_global_runner_leaves_original_untouched() {
        let def = definition(vec![mobile("a", None)]);
        let injected = def.with_global_runner("acme/runners/pixel");
        assert_eq!(def.runtime.global_runner_id, None);
        assert_eq!(
            injected.runtime.global_runner_id.as_deref(),
            Some("acme/runners/pixel")
        );
    }

    #[test]
    fn test_set_deeplink_requires_parameters_object() {
        let mut step = mobile("a", None);
        step.set_deeplink("x.outputs".to_string());
        assert_eq!(step.deeplink(), None);

        step.with
            .insert("parameters".to_string(), json!({"deeplink": "DEFAULT_ID.outputs"}));
        step.set_deeplink("offer.outputs".to_string());
        assert_eq!(step.deeplink(), Some("offer.outputs"));
    }

    #[test]
    fn test_compiled_step_serializes_use_first() {
        let text = serde_json::to_string(&mobile("a", None)).unwrap();
        assert!(text.starts_with(r#"{"use":"mobile-automation""#));
    }
}
