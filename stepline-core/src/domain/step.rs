//! Authored step types
//!
//! A [`Step`] is one authored unit of a pipeline. Steps are value objects:
//! the builder replaces the whole list on every edit and never patches a step
//! that callers still hold.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::registry::StepKind;

/// Literal spellings of the deep-link placeholder inside automation scripts
pub const DEEPLINK_TOKENS: [&str; 2] = ["${DL}", "${deeplink}"];

/// An authored pipeline step
///
/// Serialized as the common fields plus a `type` discriminant and a
/// variant specific `data` payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Step {
    /// Slug unique within one pipeline
    pub id: String,
    /// Display name
    pub name: String,
    /// Canonical location of the referenced catalog entity
    pub path: String,
    /// Owning organization (display only)
    #[serde(default)]
    pub organization: String,
    #[serde(default = "default_continue_on_error")]
    pub continue_on_error: bool,
    #[serde(flatten)]
    pub data: StepData,
}

fn default_continue_on_error() -> bool {
    true
}

impl Step {
    /// The registry kind of this step
    pub fn kind(&self) -> StepKind {
        self.data.kind()
    }

    /// Runner pinned to this step, if it is a wallet action with one
    pub fn runner_path(&self) -> Option<&str> {
        match &self.data {
            StepData::MobileAutomation(data) => data.runner.as_ref().map(|r| r.path.as_str()),
            _ => None,
        }
    }

    /// Returns a copy of this step with `continue_on_error` replaced
    pub fn with_continue_on_error(&self, value: bool) -> Self {
        Self {
            continue_on_error: value,
            ..self.clone()
        }
    }
}

/// Variant specific payload of a [`Step`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "kebab-case")]
pub enum StepData {
    /// Scripted UI action on a wallet app
    MobileAutomation(WalletActionData),
    CredentialOffer(CatalogItem),
    #[serde(rename = "use-case-verification-deeplink")]
    UseCaseVerification(CatalogItem),
    CustomCheck(CatalogItem),
    ConformanceCheck(ConformanceCheckData),
    Utility(UtilityData),
}

impl StepData {
    pub fn kind(&self) -> StepKind {
        match self {
            StepData::MobileAutomation(_) => StepKind::MobileAutomation,
            StepData::CredentialOffer(_) => StepKind::CredentialOffer,
            StepData::UseCaseVerification(_) => StepKind::UseCaseVerification,
            StepData::CustomCheck(_) => StepKind::CustomCheck,
            StepData::ConformanceCheck(_) => StepKind::ConformanceCheck,
            StepData::Utility(_) => StepKind::Utility,
        }
    }
}

/// A marketplace/catalog record referenced by a step
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogItem {
    pub id: String,
    pub name: String,
    /// Canonical path, e.g. `acme/issuer/pid-credential`
    pub path: String,
    #[serde(default)]
    pub organization: String,
    /// Remaining record fields, kept verbatim
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl CatalogItem {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        path: impl Into<String>,
        organization: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            path: path.into(),
            organization: organization.into(),
            extra: Map::new(),
        }
    }
}

/// A released version of a wallet app
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WalletVersion {
    pub id: String,
    pub tag: String,
    pub path: String,
}

/// An automation script that drives a wallet app
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AutomationAction {
    pub id: String,
    pub name: String,
    pub path: String,
    #[serde(default)]
    pub code: String,
}

impl AutomationAction {
    /// True if the script consumes a deep-link produced by an earlier step
    pub fn needs_deeplink(&self) -> bool {
        DEEPLINK_TOKENS.iter().any(|token| self.code.contains(token))
    }
}

/// A runner pinned to a single step
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunnerRef {
    pub path: String,
    #[serde(default)]
    pub name: String,
}

/// Wallet and version picked together, cached between wallet actions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WalletSelection {
    pub wallet: CatalogItem,
    pub version: WalletVersion,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WalletActionData {
    pub wallet: CatalogItem,
    pub version: WalletVersion,
    pub action: AutomationAction,
    /// `None` means the pipeline-wide global runner executes this step
    #[serde(default)]
    pub runner: Option<RunnerRef>,
}

/// Reference to one test of a conformance suite
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConformanceCheckData {
    pub standard: String,
    pub version: String,
    pub suite: String,
    pub test: String,
}

impl ConformanceCheckData {
    /// Canonical path `standard/version/suite/test`
    pub fn path(&self) -> String {
        format!(
            "{}/{}/{}/{}",
            self.standard, self.version, self.suite, self.test
        )
    }
}

/// Built-in helper actions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum UtilityAction {
    Debug,
    Email,
    HttpRequest,
}

impl UtilityAction {
    pub const ALL: [UtilityAction; 3] = [
        UtilityAction::Debug,
        UtilityAction::Email,
        UtilityAction::HttpRequest,
    ];

    /// Identifier used as the compiled `use` value
    pub fn as_str(self) -> &'static str {
        match self {
            UtilityAction::Debug => "debug",
            UtilityAction::Email => "email",
            UtilityAction::HttpRequest => "http-request",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            UtilityAction::Debug => "Debug",
            UtilityAction::Email => "Send email",
            UtilityAction::HttpRequest => "HTTP request",
        }
    }

    pub fn from_use(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|a| a.as_str() == value)
    }
}

impl std::fmt::Display for UtilityAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UtilityData {
    pub action: UtilityAction,
    #[serde(default)]
    pub parameters: Map<String, Value>,
}
