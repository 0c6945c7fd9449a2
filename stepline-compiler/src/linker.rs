//! Deep-link linking pass
//!
//! A wallet action whose script consumes a deep-link is compiled with a
//! placeholder reference in `with.parameters.deeplink`. Once every step has
//! its final id, the placeholder is rewritten to the outputs of the nearest
//! earlier step that is not itself a wallet action.

use tracing::{debug, warn};

use stepline_core::domain::pipeline::CompiledStep;
use stepline_core::registry::{self, DeeplinkOutput};

/// Id token standing in for the step that produces the deep-link
pub const DEFAULT_ID: &str = "DEFAULT_ID";

/// Placeholder written at conversion time: `DEFAULT_ID.outputs`
pub fn placeholder_reference() -> String {
    format!("{DEFAULT_ID}.outputs")
}

/// Resolve every deep-link placeholder in place
///
/// Steps without a placeholder are left untouched. A placeholder with no
/// eligible source step is kept as is; the engine decides what to do with
/// it at run time.
///
/// Returns the number of placeholders resolved.
pub fn link_steps(steps: &mut [CompiledStep]) -> usize {
    let placeholder = placeholder_reference();
    let mut resolved = 0;

    for index in 0..steps.len() {
        let Some(deeplink) = steps[index].deeplink() else {
            continue;
        };
        if !deeplink.contains(&placeholder) {
            continue;
        }

        let Some(source) = steps[..index]
            .iter()
            .rev()
            .find(|candidate| !candidate.is_mobile_automation())
        else {
            warn!(
                "No step before '{}' produces a deep-link, leaving placeholder",
                steps[index].id
            );
            continue;
        };

        let suffix = registry::output_shape(&source.uses)
            .unwrap_or(DeeplinkOutput::Direct)
            .reference_suffix();
        let reference = format!("{}.outputs{}", source.id, suffix);
        let rewritten = deeplink.replace(&placeholder, &reference);

        debug!("Linked '{}' to '{}'", steps[index].id, reference);
        steps[index].set_deeplink(rewritten);
        resolved += 1;
    }

    resolved
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{Map, json};

    fn step(uses: &str, id: &str, deeplink: Option<&str>) -> CompiledStep {
        let mut with = Map::new();
        with.insert("target".to_string(), json!(id));
        if let Some(deeplink) = deeplink {
            with.insert("parameters".to_string(), json!({ "deeplink": deeplink }));
        }
        CompiledStep {
            uses: uses.to_string(),
            id: id.to_string(),
            continue_on_error: true,
            with,
        }
    }

    fn placeholder() -> String {
        placeholder_reference()
    }

    #[test]
    fn test_skips_wallet_actions_and_takes_nearest_source() {
        let mut steps = vec![
            step("mobile-automation", "a", None),
            step("credential-offer", "b", None),
            step("mobile-automation", "c", Some(&placeholder())),
        ];
        assert_eq!(link_steps(&mut steps), 1);
        assert_eq!(steps[2].deeplink(), Some("b.outputs"));
    }

    #[test]
    fn test_nearest_source_wins_over_older_ones() {
        let mut steps = vec![
            step("credential-offer", "old", None),
            step("use-case-verification-deeplink", "new", None),
            step("mobile-automation", "login", None),
            step("mobile-automation", "scan", Some(&placeholder())),
        ];
        link_steps(&mut steps);
        assert_eq!(steps[3].deeplink(), Some("new.outputs"));
    }

    #[test]
    fn test_conformance_check_source_gets_deeplink_suffix() {
        let mut steps = vec![
            step("conformance-check", "a", None),
            step("mobile-automation", "b", Some(&placeholder())),
        ];
        link_steps(&mut steps);
        let reference = steps[1].deeplink().unwrap();
        assert_eq!(reference, "a.outputs.deeplink");
        assert!(reference.ends_with(".deeplink"));
    }

    #[test]
    fn test_unresolved_placeholder_is_left_untouched() {
        let mut steps = vec![
            step("mobile-automation", "a", None),
            step("mobile-automation", "b", Some(&placeholder())),
        ];
        assert_eq!(link_steps(&mut steps), 0);
        assert_eq!(steps[1].deeplink(), Some(placeholder().as_str()));
    }

    #[test]
    fn test_no_placeholders_leaves_parameters_untouched() {
        let mut steps = vec![
            step("credential-offer", "a", None),
            step("mobile-automation", "b", Some("https://example.org/fixed")),
            step("debug", "c", None),
        ];
        let before = steps.clone();
        assert_eq!(link_steps(&mut steps), 0);
        assert_eq!(steps, before);
    }

    #[test]
    fn test_utility_step_can_be_a_source() {
        let mut steps = vec![
            step("http-request", "fetch", None),
            step("mobile-automation", "open", Some(&placeholder())),
        ];
        link_steps(&mut steps);
        assert_eq!(steps[1].deeplink(), Some("fetch.outputs"));
    }

    #[test]
    fn test_placeholder_inside_larger_value_is_replaced() {
        let value = format!("prefix:{}", placeholder());
        let mut steps = vec![
            step("custom-check", "chk", None),
            step("mobile-automation", "open", Some(&value)),
        ];
        link_steps(&mut steps);
        assert_eq!(steps[1].deeplink(), Some("prefix:chk.outputs"));
    }
}
