#![forbid(unsafe_code)]
#![warn(missing_docs)]

//! # Axon Schema
//!
//! Validates a [`serde_json::Value`] against a constrained JSON-Schema
//! dialect (C2, spec §4.2). The supported keyword set is closed: any
//! unrecognized `format`, or a schema node carrying none of
//! `type`/`anyOf`/`oneOf`/`allOf`/`const`/`enum`, is a validation error —
//! silent degradation (treating the unknown construct as "always passes")
//! is forbidden.

mod format;
mod validate;

pub use format::SUPPORTED_FORMATS;
pub use validate::{validate, Schema, ValidationError, ValidationOutcome};
