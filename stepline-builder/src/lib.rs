//! Stepline Builder
//!
//! Authoring side of a pipeline: the ordered step list, undo/redo over whole
//! state snapshots, and the sub-forms used to add one step at a time.
//!
//! # Example
//!
//! ```
//! use stepline_builder::{StepBuilder, StepForm};
//! use stepline_core::domain::step::CatalogItem;
//! use stepline_core::registry::StepKind;
//!
//! let mut builder = StepBuilder::new();
//! builder.init_add_step(StepKind::CredentialOffer);
//! if let Some(StepForm::MarketplaceItem(form)) = builder.form_mut() {
//!     form.select(CatalogItem::new("c1", "PID", "acme/issuer/pid", "Acme"));
//! }
//! builder.submit_form().unwrap();
//! assert!(builder.is_ready());
//! ```

pub mod builder;
pub mod error;
pub mod forms;
pub mod history;

pub use builder::StepBuilder;
pub use error::{BuilderError, Result};
pub use forms::{
    ConformanceCheckForm, FormState, MarketplaceItemForm, StepForm, UtilityForm,
    WalletActionForm, WalletStage,
};
pub use history::{BuilderState, History};
