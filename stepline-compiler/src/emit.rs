//! YAML emission
//!
//! The emitted text is shown to users as the canonical definition of their
//! pipeline, so its spacing is normalized: one blank line before the
//! top-level `runtime:` and `steps:` keys, and one between sibling steps.

use stepline_core::domain::pipeline::PipelineDefinition;

use crate::error::{CompileError, Result};

/// Top-level keys that always get a blank line before them
const SECTION_KEYS: [&str; 2] = ["runtime:", "steps:"];

/// Top-level key of the step list
const STEPS_KEY: &str = "steps:";

/// Marker of a step list item
const STEP_MARKER: &str = "- use:";

/// Serialize a definition to normalized YAML text
pub fn to_yaml(definition: &PipelineDefinition) -> Result<String> {
    let raw = serde_yaml::to_string(definition).map_err(CompileError::Encode)?;
    Ok(normalize_spacing(&raw))
}

/// Parse a stored definition
pub fn from_yaml(text: &str) -> Result<PipelineDefinition> {
    serde_yaml::from_str(text).map_err(CompileError::Decode)
}

/// Force a blank line before each section key and before every step item
/// except the first. Applying it twice gives the same text.
///
/// Only items of the top-level `steps:` sequence count as steps; a `- use:`
/// line nested deeper, such as inside a multi-line parameter, is left as is.
pub fn normalize_spacing(yaml: &str) -> String {
    let mut lines: Vec<&str> = Vec::new();
    let mut in_steps = false;
    let mut item_indent: Option<usize> = None;
    let mut seen_step = false;

    for line in yaml.lines() {
        let trimmed = line.trim_start();
        let indent = line.len() - trimmed.len();

        let is_section = SECTION_KEYS.iter().any(|key| line.starts_with(key));
        if is_section {
            in_steps = line.starts_with(STEPS_KEY);
            item_indent = None;
        } else if indent == 0 && !trimmed.is_empty() && !trimmed.starts_with('-') {
            in_steps = false;
        }

        let is_step = in_steps
            && trimmed.starts_with(STEP_MARKER)
            && *item_indent.get_or_insert(indent) == indent;

        let wants_gap = is_section || (is_step && seen_step);
        if is_step {
            seen_step = true;
        }

        if wants_gap && lines.last().is_some_and(|prev| !prev.trim().is_empty()) {
            lines.push("");
        }
        lines.push(line);
    }

    let mut text = lines.join("\n");
    text.push('\n');
    text
}
