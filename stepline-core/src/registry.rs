//! Step registry
//!
//! Static catalog of step types: wire identifiers, display metadata, the
//! shape of the deep-link output each type produces, and the helpers that
//! derive step ids and decode persisted steps.

use serde_json::Value;
use std::str::FromStr;
use uuid::Uuid;

use crate::domain::step::{Step, UtilityAction};
use crate::error::{CoreError, Result};

/// Length of the random suffix appended to authored step ids
const ID_SUFFIX_LEN: usize = 6;

/// Every step type a pipeline can contain
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StepKind {
    MobileAutomation,
    CredentialOffer,
    UseCaseVerification,
    CustomCheck,
    ConformanceCheck,
    Utility,
}

/// How a step exposes the deep-link it produces to later steps
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeeplinkOutput {
    /// The step output is the deep-link itself
    Direct,
    /// The deep-link sits under a `deeplink` key of the step output
    Nested,
}

impl DeeplinkOutput {
    /// Suffix appended to an `<id>.outputs` reference
    pub fn reference_suffix(self) -> &'static str {
        match self {
            DeeplinkOutput::Direct => "",
            DeeplinkOutput::Nested => ".deeplink",
        }
    }
}

impl StepKind {
    pub const ALL: [StepKind; 6] = [
        StepKind::MobileAutomation,
        StepKind::CredentialOffer,
        StepKind::UseCaseVerification,
        StepKind::CustomCheck,
        StepKind::ConformanceCheck,
        StepKind::Utility,
    ];

    /// The `type` discriminant of persisted steps
    pub fn as_str(self) -> &'static str {
        match self {
            StepKind::MobileAutomation => "mobile-automation",
            StepKind::CredentialOffer => "credential-offer",
            StepKind::UseCaseVerification => "use-case-verification-deeplink",
            StepKind::CustomCheck => "custom-check",
            StepKind::ConformanceCheck => "conformance-check",
            StepKind::Utility => "utility",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            StepKind::MobileAutomation => "Wallet action",
            StepKind::CredentialOffer => "Credential deep-link",
            StepKind::UseCaseVerification => "Use case verification",
            StepKind::CustomCheck => "Custom check",
            StepKind::ConformanceCheck => "Conformance check",
            StepKind::Utility => "Utility",
        }
    }

    pub fn deeplink_output(self) -> DeeplinkOutput {
        match self {
            StepKind::ConformanceCheck => DeeplinkOutput::Nested,
            _ => DeeplinkOutput::Direct,
        }
    }

    /// Kinds whose authoring form picks a record from the marketplace
    pub fn is_marketplace_item(self) -> bool {
        matches!(
            self,
            StepKind::CredentialOffer | StepKind::UseCaseVerification | StepKind::CustomCheck
        )
    }
}

impl std::fmt::Display for StepKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StepKind {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self> {
        StepKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| CoreError::UnknownStepType(s.to_string()))
    }
}

/// Resolve the kind behind a compiled `use` identifier
///
/// Utility steps compile to their action identifier rather than `utility`.
pub fn kind_for_use(uses: &str) -> Option<StepKind> {
    if UtilityAction::from_use(uses).is_some() {
        return Some(StepKind::Utility);
    }
    StepKind::from_str(uses).ok()
}

/// Deep-link output shape of a compiled step, `None` for unknown types
pub fn output_shape(uses: &str) -> Option<DeeplinkOutput> {
    kind_for_use(uses).map(StepKind::deeplink_output)
}

/// Lowercase, dash separated form of a display name
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    for c in name.chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c.to_ascii_lowercase());
        } else if !slug.is_empty() && !slug.ends_with('-') {
            slug.push('-');
        }
    }
    while slug.ends_with('-') {
        slug.pop();
    }
    if slug.is_empty() {
        slug.push_str("step");
    }
    slug
}

/// Derive an authoring id: slug of the canonical name plus a random suffix
pub fn derive_step_id(name: &str) -> String {
    let suffix = Uuid::new_v4().simple().to_string();
    format!("{}-{}", slugify(name), &suffix[..ID_SUFFIX_LEN])
}

/// Compile-time id of an entity: the last segment of its canonical path
pub fn compiled_id(path: &str) -> Option<&str> {
    path.trim_end_matches('/')
        .rsplit('/')
        .next()
        .filter(|segment| !segment.is_empty())
}

/// Decode one persisted step, failing fast on unknown step types
pub fn parse_step(value: Value) -> Result<Step> {
    let kind = match value.get("type") {
        Some(Value::String(kind)) => StepKind::from_str(kind)?,
        Some(other) => return Err(CoreError::UnknownStepType(other.to_string())),
        None => return Err(CoreError::MissingStepType),
    };

    serde_json::from_value(value).map_err(|source| CoreError::InvalidStep {
        kind: kind.to_string(),
        source,
    })
}

/// Decode the persisted `steps` field of a pipeline record
pub fn parse_steps(json: &str) -> Result<Vec<Step>> {
    let values: Vec<Value> = serde_json::from_str(json)?;
    let steps = values
        .into_iter()
        .map(parse_step)
        .collect::<Result<Vec<_>>>()?;
    tracing::debug!("Decoded {} persisted step(s)", steps.len());
    Ok(steps)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_kind_roundtrip_through_str() {
        for kind in StepKind::ALL {
            assert_eq!(StepKind::from_str(kind.as_str()).unwrap(), kind);
        }
    }

    #[test]
    fn test_unknown_kind_is_rejected() {
        let err = StepKind::from_str("teleport").unwrap_err();
        assert!(matches!(err, CoreError::UnknownStepType(ref t) if t == "teleport"));
    }

    #[test]
    fn test_only_conformance_check_nests_deeplink() {
        assert_eq!(
            StepKind::ConformanceCheck.deeplink_output(),
            DeeplinkOutput::Nested
        );
        assert_eq!(
            StepKind::CredentialOffer.deeplink_output(),
            DeeplinkOutput::Direct
        );
        assert_eq!(output_shape("conformance-check"), Some(DeeplinkOutput::Nested));
        assert_eq!(output_shape("email"), Some(DeeplinkOutput::Direct));
        assert_eq!(output_shape("no-such-step"), None);
    }

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("PID Credential (SD-JWT)"), "pid-credential-sd-jwt");
        assert_eq!(slugify("  --  "), "step");
        assert_eq!(slugify("Login"), "login");
    }

    #[test]
    fn test_derive_step_id_has_random_suffix() {
        let a = derive_step_id("Login flow");
        let b = derive_step_id("Login flow");
        assert!(a.starts_with("login-flow-"));
        assert_eq!(a.len(), "login-flow-".len() + ID_SUFFIX_LEN);
        assert_ne!(a, b);
    }

    #[test]
    fn test_compiled_id_takes_last_segment() {
        assert_eq!(compiled_id("acme/issuer/pid-offer"), Some("pid-offer"));
        assert_eq!(compiled_id("acme/issuer/pid-offer/"), Some("pid-offer"));
        assert_eq!(compiled_id("debug"), Some("debug"));
        assert_eq!(compiled_id(""), None);
    }

    #[test]
    fn test_parse_steps_rejects_unknown_type() {
        let json = json!([
            {"id": "x", "name": "x", "path": "a/x", "type": "teleport", "data": {}}
        ])
        .to_string();
        let err = parse_steps(&json).unwrap_err();
        assert!(matches!(err, CoreError::UnknownStepType(_)));
    }

    #[test]
    fn test_parse_steps_reports_invalid_payload() {
        let json = json!([
            {"id": "x", "name": "x", "path": "a/x", "type": "conformance-check", "data": {}}
        ])
        .to_string();
        let err = parse_steps(&json).unwrap_err();
        assert!(matches!(err, CoreError::InvalidStep { ref kind, .. } if kind == "conformance-check"));
    }

    #[test]
    fn test_parse_steps_decodes_utility() {
        let json = json!([{
            "id": "debug-1a2b3c",
            "name": "Debug",
            "path": "debug",
            "type": "utility",
            "data": {"action": "debug", "parameters": {"message": "hi"}}
        }])
        .to_string();
        let steps = parse_steps(&json).unwrap();
        assert_eq!(steps.len(), 1);
        assert_eq!(steps[0].kind(), StepKind::Utility);
        assert!(steps[0].continue_on_error);
    }

    #[test]
    fn test_missing_type_is_reported() {
        let err = parse_step(json!({"id": "x"})).unwrap_err();
        assert!(matches!(err, CoreError::MissingStepType));
    }
}
