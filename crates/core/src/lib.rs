#![forbid(unsafe_code)]
#![warn(missing_docs)]

//! # Axon Core
//!
//! Shared identifiers and the closed error taxonomy used by every Axon
//! component. This crate has no I/O and no async runtime dependency — it
//! exists so that `axon-trace`, `axon-schema`, `axon-resolver`,
//! `axon-resilience`, `axon-categorizer`, `axon-oauth`, `axon-http`,
//! `axon-dedup`, and `axon-orchestrator` can agree on `ErrorCategory` and
//! `ErrorDetail` without depending on each other.

pub mod duration_serde;
pub mod error;
pub mod ids;

pub use duration_serde::{duration_millis, duration_millis_opt};
pub use error::{ErrorCategory, ErrorDetail};
pub use ids::{ActionDefinitionId, ActionId, ExecutionId};
