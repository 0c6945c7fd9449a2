//! Stepline Core
//!
//! Core types for authoring, compiling and dispatching test pipelines.
//!
//! This crate contains:
//! - Domain types: authored steps, compiled steps, pipeline definitions, queue tickets
//! - DTOs: request and query shapes of the pipeline queue API
//! - Step registry: per step type identifiers, display metadata and id derivation

pub mod domain;
pub mod dto;
pub mod error;
pub mod registry;

pub use error::{CoreError, Result};
