#![forbid(unsafe_code)]
#![warn(missing_docs)]

//! # Axon Trace
//!
//! Sanitizes HTTP request/response traces (C1) so they are safe to log or
//! persist: URLs are reduced to scheme+host+path, headers are allow/deny
//! listed, and bodies are redacted and truncated. See spec §4.9.

mod entry;
mod redact;

pub use entry::{TraceEntry, TraceRequest, TraceResponse};
pub use redact::{sanitize_body, sanitize_error_context, sanitize_headers, sanitize_url};
