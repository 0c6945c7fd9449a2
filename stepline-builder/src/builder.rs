//! Step builder state machine
//!
//! Holds the committed [`BuilderState`], its undo/redo history and the form
//! of the step currently being added. Edits address steps by id, never by
//! index, and each one commits a fresh snapshot.

use tracing::debug;

use stepline_core::domain::step::{Step, WalletSelection};
use stepline_core::registry::{self, StepKind};

use crate::error::{BuilderError, Result};
use crate::forms::{FormState, StepForm};
use crate::history::{BuilderState, History};

#[derive(Debug, Clone, Default)]
pub struct StepBuilder {
    state: BuilderState,
    form: FormState,
    history: History,
}

impl StepBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reopen a saved pipeline; history starts empty
    pub fn from_steps(steps: Vec<Step>) -> Self {
        Self {
            state: BuilderState {
                steps,
                last_wallet: None,
            },
            ..Self::default()
        }
    }

    pub fn steps(&self) -> &[Step] {
        &self.state.steps
    }

    pub fn state(&self) -> &BuilderState {
        &self.state
    }

    pub fn form_state(&self) -> &FormState {
        &self.form
    }

    pub fn form(&self) -> Option<&StepForm> {
        match &self.form {
            FormState::EditingStep(form) => Some(form),
            FormState::Idle => None,
        }
    }

    pub fn form_mut(&mut self) -> Option<&mut StepForm> {
        match &mut self.form {
            FormState::EditingStep(form) => Some(form),
            FormState::Idle => None,
        }
    }

    /// Minimal precondition for compiling or submitting
    pub fn is_ready(&self) -> bool {
        !self.state.steps.is_empty()
    }

    // =============================================================================
    // Adding steps
    // =============================================================================

    /// Open the form for `kind`, discarding any uncommitted form
    pub fn init_add_step(&mut self, kind: StepKind) {
        if let Some(previous) = self.form.editing_kind() {
            debug!("Discarding unfinished {} form", previous);
        }
        self.form = FormState::EditingStep(StepForm::new(kind, self.state.last_wallet.as_ref()));
    }

    /// Close the active form without adding a step; not recorded in history
    pub fn discard_add_step(&mut self) -> Result<()> {
        if matches!(self.form, FormState::Idle) {
            return Err(BuilderError::NotEditing);
        }
        self.form = FormState::Idle;
        Ok(())
    }

    /// Commit the active form as a new step and return to idle
    ///
    /// An incomplete form stays open so the author can finish it.
    pub fn submit_form(&mut self) -> Result<&Step> {
        let FormState::EditingStep(form) = &self.form else {
            return Err(BuilderError::NotEditing);
        };
        let output = form.finish()?;
        self.add_step(output.step, output.wallet);
        self.form = FormState::Idle;

        self.state.steps.last().ok_or(BuilderError::NotEditing)
    }

    fn add_step(&mut self, mut step: Step, wallet: Option<WalletSelection>) {
        while self.state.steps.iter().any(|s| s.id == step.id) {
            let base = registry::compiled_id(&step.path).unwrap_or(step.name.as_str());
            step.id = registry::derive_step_id(base);
        }
        step.continue_on_error = true;

        let mut steps = self.state.steps.clone();
        debug!("Adding {} step '{}'", step.kind(), step.id);
        steps.push(step);

        let last_wallet = wallet.or_else(|| self.state.last_wallet.clone());
        self.commit(BuilderState { steps, last_wallet });
    }

    // =============================================================================
    // Editing steps
    // =============================================================================

    /// Remove the step with `id`; returns false if there is none
    pub fn delete_step(&mut self, id: &str) -> bool {
        if self.position(id).is_none() {
            return false;
        }
        let steps = self
            .state
            .steps
            .iter()
            .filter(|s| s.id != id)
            .cloned()
            .collect();
        debug!("Deleting step '{}'", id);
        self.commit(BuilderState {
            steps,
            last_wallet: self.state.last_wallet.clone(),
        });
        true
    }

    /// False when the step is unknown or the target index is out of range or unchanged
    pub fn can_shift_step(&self, id: &str, delta: isize) -> bool {
        self.shift_target(id, delta).is_some()
    }

    /// Swap the step with the one `delta` positions away; no-op when it cannot shift
    pub fn shift_step(&mut self, id: &str, delta: isize) -> bool {
        let Some((from, to)) = self.shift_target(id, delta) else {
            return false;
        };
        let mut steps = self.state.steps.clone();
        steps.swap(from, to);
        debug!("Shifted step '{}' from {} to {}", id, from, to);
        self.commit(BuilderState {
            steps,
            last_wallet: self.state.last_wallet.clone(),
        });
        true
    }

    /// Returns false if the step is unknown or already has `value`
    pub fn set_continue_on_error(&mut self, id: &str, value: bool) -> bool {
        let Some(index) = self.position(id) else {
            return false;
        };
        if self.state.steps[index].continue_on_error == value {
            return false;
        }
        let mut steps = self.state.steps.clone();
        steps[index] = steps[index].with_continue_on_error(value);
        self.commit(BuilderState {
            steps,
            last_wallet: self.state.last_wallet.clone(),
        });
        true
    }

    // =============================================================================
    // History
    // =============================================================================

    pub fn undo(&mut self) -> bool {
        self.history.undo(&mut self.state)
    }

    pub fn redo(&mut self) -> bool {
        self.history.redo(&mut self.state)
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    fn commit(&mut self, next: BuilderState) {
        let previous = std::mem::replace(&mut self.state, next);
        self.history.record(previous);
    }

    fn position(&self, id: &str) -> Option<usize> {
        self.state.steps.iter().position(|s| s.id == id)
    }

    fn shift_target(&self, id: &str, delta: isize) -> Option<(usize, usize)> {
        let from = self.position(id)?;
        let to = from.checked_add_signed(delta)?;
        if to >= self.state.steps.len() || to == from {
            return None;
        }
        Some((from, to))
    }
}
