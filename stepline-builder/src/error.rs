//! Builder errors

use stepline_core::registry::StepKind;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, BuilderError>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BuilderError {
    /// The operation needs an active step form
    #[error("No step is being added")]
    NotEditing,

    /// The active form has not collected everything its step needs
    #[error("The {kind} form is incomplete: missing {missing}")]
    IncompleteForm { kind: StepKind, missing: &'static str },

    /// A selection was made out of order in a multi-stage form
    #[error("Cannot select {selection} before {requires}")]
    OutOfOrder {
        selection: &'static str,
        requires: &'static str,
    },
}
