//! Step-authoring sub-forms
//!
//! While a step is being added the builder holds exactly one form. Wallet
//! actions take three selections (wallet, version, action); every other step
//! type is a single selection. A form only collects input: nothing reaches
//! the committed step list until the builder submits it.

use serde_json::{Map, Value};
use stepline_core::domain::step::{
    AutomationAction, CatalogItem, ConformanceCheckData, RunnerRef, Step, StepData,
    UtilityAction, UtilityData, WalletActionData, WalletSelection, WalletVersion,
};
use stepline_core::registry::{self, StepKind};

use crate::error::{BuilderError, Result};

/// Whether a step form is open
#[derive(Debug, Clone, Default, PartialEq)]
pub enum FormState {
    #[default]
    Idle,
    EditingStep(StepForm),
}

impl FormState {
    /// Kind of the step being added, if any
    pub fn editing_kind(&self) -> Option<StepKind> {
        match self {
            FormState::Idle => None,
            FormState::EditingStep(form) => Some(form.kind()),
        }
    }
}

/// A step produced by a form, with the wallet it selected if any
pub(crate) struct FormOutput {
    pub step: Step,
    pub wallet: Option<WalletSelection>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum StepForm {
    WalletAction(WalletActionForm),
    MarketplaceItem(MarketplaceItemForm),
    ConformanceCheck(ConformanceCheckForm),
    Utility(UtilityForm),
}

impl StepForm {
    /// Fresh form for `kind`; wallet actions start from the cached wallet
    pub fn new(kind: StepKind, last_wallet: Option<&WalletSelection>) -> Self {
        match kind {
            StepKind::MobileAutomation => StepForm::WalletAction(match last_wallet {
                Some(selection) => WalletActionForm::prefilled(selection.clone()),
                None => WalletActionForm::default(),
            }),
            StepKind::CredentialOffer | StepKind::UseCaseVerification | StepKind::CustomCheck => {
                StepForm::MarketplaceItem(MarketplaceItemForm::new(kind))
            }
            StepKind::ConformanceCheck => {
                StepForm::ConformanceCheck(ConformanceCheckForm::default())
            }
            StepKind::Utility => StepForm::Utility(UtilityForm::default()),
        }
    }

    pub fn kind(&self) -> StepKind {
        match self {
            StepForm::WalletAction(_) => StepKind::MobileAutomation,
            StepForm::MarketplaceItem(form) => form.kind(),
            StepForm::ConformanceCheck(_) => StepKind::ConformanceCheck,
            StepForm::Utility(_) => StepKind::Utility,
        }
    }

    pub(crate) fn finish(&self) -> Result<FormOutput> {
        match self {
            StepForm::WalletAction(form) => form.finish(),
            StepForm::MarketplaceItem(form) => form.finish(),
            StepForm::ConformanceCheck(form) => form.finish(),
            StepForm::Utility(form) => form.finish(),
        }
    }
}

/// Authoring id derived from the entity's canonical name
fn authoring_id(path: &str, name: &str) -> String {
    registry::derive_step_id(registry::compiled_id(path).unwrap_or(name))
}

fn new_step(name: &str, path: &str, organization: &str, data: StepData) -> Step {
    Step {
        id: authoring_id(path, name),
        name: name.to_string(),
        path: path.to_string(),
        organization: organization.to_string(),
        continue_on_error: true,
        data,
    }
}

/// Stage of the wallet action flow
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WalletStage {
    SelectWallet,
    SelectVersion,
    SelectAction,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct WalletActionForm {
    wallet: Option<CatalogItem>,
    version: Option<WalletVersion>,
    action: Option<AutomationAction>,
    runner: Option<RunnerRef>,
}

impl WalletActionForm {
    /// Form that skips straight to action selection
    pub fn prefilled(selection: WalletSelection) -> Self {
        Self {
            wallet: Some(selection.wallet),
            version: Some(selection.version),
            action: None,
            runner: None,
        }
    }

    pub fn stage(&self) -> WalletStage {
        match (&self.wallet, &self.version) {
            (None, _) => WalletStage::SelectWallet,
            (Some(_), None) => WalletStage::SelectVersion,
            (Some(_), Some(_)) => WalletStage::SelectAction,
        }
    }

    /// Picking a wallet resets the later selections
    pub fn select_wallet(&mut self, wallet: CatalogItem) {
        self.wallet = Some(wallet);
        self.version = None;
        self.action = None;
    }

    pub fn select_version(&mut self, version: WalletVersion) -> Result<()> {
        if self.wallet.is_none() {
            return Err(BuilderError::OutOfOrder {
                selection: "version",
                requires: "wallet",
            });
        }
        self.version = Some(version);
        self.action = None;
        Ok(())
    }

    pub fn select_action(&mut self, action: AutomationAction) -> Result<()> {
        if self.version.is_none() {
            return Err(BuilderError::OutOfOrder {
                selection: "action",
                requires: "version",
            });
        }
        self.action = Some(action);
        Ok(())
    }

    /// Pin the step to a runner; `None` leaves it to the global runner
    pub fn set_runner(&mut self, runner: Option<RunnerRef>) {
        self.runner = runner;
    }

    /// Step back one stage, dropping that stage's selection
    pub fn back(&mut self) {
        match self.stage() {
            WalletStage::SelectAction => {
                self.version = None;
                self.action = None;
            }
            WalletStage::SelectVersion => self.wallet = None,
            WalletStage::SelectWallet => {}
        }
    }

    pub fn wallet(&self) -> Option<&CatalogItem> {
        self.wallet.as_ref()
    }

    pub fn version(&self) -> Option<&WalletVersion> {
        self.version.as_ref()
    }

    fn finish(&self) -> Result<FormOutput> {
        let missing = |what| BuilderError::IncompleteForm {
            kind: StepKind::MobileAutomation,
            missing: what,
        };
        let wallet = self.wallet.clone().ok_or_else(|| missing("wallet"))?;
        let version = self.version.clone().ok_or_else(|| missing("version"))?;
        let action = self.action.clone().ok_or_else(|| missing("action"))?;
        let name = action.name.clone();
        let path = action.path.clone();

        let step = new_step(
            &name,
            &path,
            &wallet.organization,
            StepData::MobileAutomation(WalletActionData {
                wallet: wallet.clone(),
                version: version.clone(),
                action,
                runner: self.runner.clone(),
            }),
        );

        Ok(FormOutput {
            step,
            wallet: Some(WalletSelection { wallet, version }),
        })
    }
}

/// Search-and-select form for credential offers, use case verifications and custom checks
#[derive(Debug, Clone, PartialEq)]
pub struct MarketplaceItemForm {
    kind: StepKind,
    query: String,
    selected: Option<CatalogItem>,
}

impl MarketplaceItemForm {
    fn new(kind: StepKind) -> Self {
        Self {
            kind,
            query: String::new(),
            selected: None,
        }
    }

    pub fn kind(&self) -> StepKind {
        self.kind
    }

    /// Current search text; the catalog lookup itself belongs to the caller
    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn set_query(&mut self, query: impl Into<String>) {
        self.query = query.into();
    }

    pub fn select(&mut self, item: CatalogItem) {
        self.selected = Some(item);
    }

    pub fn selected(&self) -> Option<&CatalogItem> {
        self.selected.as_ref()
    }

    fn finish(&self) -> Result<FormOutput> {
        let item = self
            .selected
            .clone()
            .ok_or(BuilderError::IncompleteForm {
                kind: self.kind,
                missing: "selection",
            })?;

        let (name, path, organization) =
            (item.name.clone(), item.path.clone(), item.organization.clone());
        let data = match self.kind {
            StepKind::UseCaseVerification => StepData::UseCaseVerification(item),
            StepKind::CustomCheck => StepData::CustomCheck(item),
            _ => StepData::CredentialOffer(item),
        };

        Ok(FormOutput {
            step: new_step(&name, &path, &organization, data),
            wallet: None,
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConformanceCheckForm {
    selected: Option<ConformanceCheckData>,
}

impl ConformanceCheckForm {
    pub fn select(&mut self, check: ConformanceCheckData) {
        self.selected = Some(check);
    }

    pub fn selected(&self) -> Option<&ConformanceCheckData> {
        self.selected.as_ref()
    }

    fn finish(&self) -> Result<FormOutput> {
        let check = self
            .selected
            .clone()
            .ok_or(BuilderError::IncompleteForm {
                kind: StepKind::ConformanceCheck,
                missing: "conformance test",
            })?;
        let name = check.test.clone();
        let organization = check.standard.clone();
        let path = check.path();

        Ok(FormOutput {
            step: new_step(&name, &path, &organization, StepData::ConformanceCheck(check)),
            wallet: None,
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct UtilityForm {
    action: Option<UtilityAction>,
    parameters: Map<String, Value>,
}

impl UtilityForm {
    pub fn select(&mut self, action: UtilityAction) {
        self.action = Some(action);
    }

    pub fn set_parameter(&mut self, key: impl Into<String>, value: Value) {
        self.parameters.insert(key.into(), value);
    }

    fn finish(&self) -> Result<FormOutput> {
        let action = self.action.ok_or(BuilderError::IncompleteForm {
            kind: StepKind::Utility,
            missing: "utility action",
        })?;

        Ok(FormOutput {
            step: new_step(
                action.label(),
                action.as_str(),
                "",
                StepData::Utility(UtilityData {
                    action,
                    parameters: self.parameters.clone(),
                }),
            ),
            wallet: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn wallet() -> CatalogItem {
        CatalogItem::new("w1", "Acme Wallet", "acme/acme-wallet", "Acme")
    }

    fn version() -> WalletVersion {
        WalletVersion {
            id: "v1".to_string(),
            tag: "1.0.0".to_string(),
            path: "acme/acme-wallet/1-0-0".to_string(),
        }
    }

    fn action() -> AutomationAction {
        AutomationAction {
            id: "a1".to_string(),
            name: "Accept offer".to_string(),
            path: "acme/acme-wallet/accept-offer".to_string(),
            code: "tapOn: Accept".to_string(),
        }
    }

    #[test]
    fn test_wallet_flow_stages() {
        let mut form = WalletActionForm::default();
        assert_eq!(form.stage(), WalletStage::SelectWallet);
        form.select_wallet(wallet());
        assert_eq!(form.stage(), WalletStage::SelectVersion);
        form.select_version(version()).unwrap();
        assert_eq!(form.stage(), WalletStage::SelectAction);
        form.select_action(action()).unwrap();

        let output = form.finish().unwrap();
        assert!(output.step.id.starts_with("accept-offer-"));
        assert_eq!(output.step.organization, "Acme");
        assert_eq!(output.wallet.unwrap().version, version());
    }

    #[test]
    fn test_wallet_flow_rejects_out_of_order_selection() {
        let mut form = WalletActionForm::default();
        assert!(form.select_version(version()).is_err());
        assert!(form.select_action(action()).is_err());
    }

    #[test]
    fn test_wallet_back_drops_current_stage() {
        let mut form = WalletActionForm::prefilled(WalletSelection {
            wallet: wallet(),
            version: version(),
        });
        assert_eq!(form.stage(), WalletStage::SelectAction);
        form.back();
        assert_eq!(form.stage(), WalletStage::SelectVersion);
        form.back();
        assert_eq!(form.stage(), WalletStage::SelectWallet);
        form.back();
        assert_eq!(form.stage(), WalletStage::SelectWallet);
    }

    #[test]
    fn test_reselecting_wallet_resets_version() {
        let mut form = WalletActionForm::default();
        form.select_wallet(wallet());
        form.select_version(version()).unwrap();
        form.select_wallet(wallet());
        assert_eq!(form.version(), None);
    }

    #[test]
    fn test_incomplete_wallet_form_names_missing_part() {
        let mut form = WalletActionForm::default();
        form.select_wallet(wallet());
        assert_eq!(
            form.finish().err(),
            Some(BuilderError::IncompleteForm {
                kind: StepKind::MobileAutomation,
                missing: "version",
            })
        );
    }

    #[test]
    fn test_marketplace_form_builds_matching_variant() {
        let mut form = MarketplaceItemForm::new(StepKind::UseCaseVerification);
        form.set_query("age");
        form.select(CatalogItem::new("u1", "Age over 18", "acme/verifier/age-18", "Acme"));
        let step = form.finish().unwrap().step;
        assert_eq!(step.kind(), StepKind::UseCaseVerification);
        assert_eq!(step.path, "acme/verifier/age-18");
        assert!(step.id.starts_with("age-18-"));
    }

    #[test]
    fn test_utility_form_collects_parameters() {
        let mut form = UtilityForm::default();
        assert!(form.finish().is_err());
        form.select(UtilityAction::Debug);
        form.set_parameter("message", json!("checkpoint"));
        let step = form.finish().unwrap().step;
        match step.data {
            StepData::Utility(data) => {
                assert_eq!(data.action, UtilityAction::Debug);
                assert_eq!(data.parameters["message"], "checkpoint");
            }
            other => panic!("unexpected data {other:?}"),
        }
    }

    #[test]
    fn test_form_kind_matches_requested_kind() {
        for kind in StepKind::ALL {
            assert_eq!(StepForm::new(kind, None).kind(), kind);
        }
    }
}
