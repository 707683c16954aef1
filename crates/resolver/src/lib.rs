#![forbid(unsafe_code)]
#![warn(missing_docs)]

//! Reference resolution for the action executor (component C3).
//!
//! Substitutes `${actionId.path}` tokens in an action's declared inputs
//! with values read from prior action results, and detects cycles in the
//! reference graph both per-resolution and across a whole batch of
//! planned actions.

mod cycles;
mod path;
mod reference;
mod resolve;

pub use cycles::{detect_circular_references, PlannedActionRef};
pub use path::{parse_path, traverse, PathSegment};
pub use reference::{parse_reference, reference_key, Reference};
pub use resolve::resolve_inputs;
