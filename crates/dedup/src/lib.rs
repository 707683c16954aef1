#![forbid(unsafe_code)]
#![warn(missing_docs)]

//! Deduplicates identical in-flight and recently-completed action
//! executions (component C9, spec §4.7).

mod cache;
mod config;
mod entry;
mod key;

pub use cache::{Admission, DedupCache, Outcome};
pub use config::DedupConfig;
pub use key::compute_key;
