//! Data Transfer Objects for the pipeline queue API
//!
//! Request bodies and query strings sent by the queue client. Responses are
//! the domain types themselves.

pub mod execution;
pub mod queue;
