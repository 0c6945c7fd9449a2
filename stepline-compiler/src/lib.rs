//! Stepline Compiler
//!
//! Turns an ordered list of authored steps into the workflow engine's step
//! graph. It includes:
//! - Per-step conversion into the wire form, keyed by step type
//! - The linking pass that resolves deep-link placeholders between steps
//! - YAML emission with stable, diffable spacing

pub mod compile;
pub mod emit;
pub mod error;
pub mod linker;

pub use compile::{compile_pipeline, compile_step, compile_steps};
pub use emit::{from_yaml, normalize_spacing, to_yaml};
pub use error::{CompileError, Result};
pub use linker::{DEFAULT_ID, link_steps, placeholder_reference};

pub use stepline_core::domain::pipeline::{ActivityOptions, CompiledStep, PipelineDefinition};
