//! Core domain types
//!
//! The structures shared by the builder (authoring), the compiler (wire
//! format) and the queue client (execution lifecycle).

pub mod execution;
pub mod pipeline;
pub mod step;
pub mod ticket;
