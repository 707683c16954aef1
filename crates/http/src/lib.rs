#![forbid(unsafe_code)]
#![warn(missing_docs)]

//! Single-attempt HTTP execution plus the retry controller that wraps it
//! with circuit breaking and backoff (components C7 and C8, spec §4.5).

mod engine;
mod request;
mod retry;

pub use engine::{HttpEngine, HttpEngineConfig};
pub use request::{HttpResponse, OutboundRequest};
pub use retry::{RetryController, RetryPolicy};
