#![forbid(unsafe_code)]
#![warn(missing_docs)]

//! Per-host circuit breaker registry (component C4).
//!
//! One breaker per downstream host, configured identically and created
//! lazily on first use. Unlike a compile-time-fixed breaker type, hosts are
//! only known at runtime (they come from the endpoint URL of whichever
//! action is executing), so the registry keys breakers by hostname behind a
//! concurrent map rather than giving each host its own static type.

mod breaker;
mod config;
mod window;

use dashmap::DashMap;
use parking_lot::Mutex;

use axon_core::{ErrorCategory, ErrorDetail};
use breaker::{Admission, HostBreaker};

pub use config::CircuitBreakerConfig;

/// Registry of per-host circuit breakers sharing one [`CircuitBreakerConfig`].
///
/// Cheap to clone: the map is behind `Arc` internally via `DashMap`'s own
/// sharding, so callers typically hold one `CircuitBreakerRegistry` per
/// process and share it across retry-controller invocations.
pub struct CircuitBreakerRegistry {
    config: CircuitBreakerConfig,
    hosts: DashMap<String, Mutex<HostBreaker>>,
}

impl CircuitBreakerRegistry {
    /// Build a registry; no breakers exist until a host is first admitted.
    #[must_use]
    pub fn new(config: CircuitBreakerConfig) -> Self {
        Self { config, hosts: DashMap::new() }
    }

    /// Ask whether a request to `host` may proceed.
    ///
    /// Returns `Ok(())` when the breaker is closed or half-open (a trial
    /// request). Returns `Err` with an `api_unavailable`, non-retryable
    /// [`ErrorDetail`] when the breaker is open and still cooling down.
    pub fn admit(&self, host: &str) -> Result<(), ErrorDetail> {
        let entry = self.hosts.entry(host.to_string()).or_insert_with(|| Mutex::new(HostBreaker::new(&self.config)));
        let mut breaker = entry.lock();
        match breaker.admit(&self.config) {
            Admission::Allowed => Ok(()),
            Admission::Rejected { failure_rate, retry_after } => {
                tracing::debug!(host, failure_rate, "circuit breaker open, rejecting request");
                Err(ErrorDetail::new(
                    ErrorCategory::ApiUnavailable,
                    format!("circuit breaker open for host `{host}`"),
                    false,
                )
                .with_context("host", host)
                .with_context("failureRate", failure_rate)
                .with_retry_after(retry_after)
                .with_suggestion("wait for the cooldown window before retrying this host"))
            }
        }
    }

    /// Record that a call to `host` succeeded.
    pub fn record_success(&self, host: &str) {
        if let Some(entry) = self.hosts.get(host) {
            entry.lock().record_success(&self.config);
        }
    }

    /// Record that a call to `host` failed. Only failures that the
    /// categorizer marked retryable-at-the-network-level should reach here;
    /// validation failures on the caller's own input should not trip a
    /// host's breaker.
    pub fn record_failure(&self, host: &str) {
        let entry = self.hosts.entry(host.to_string()).or_insert_with(|| Mutex::new(HostBreaker::new(&self.config)));
        entry.lock().record_failure(&self.config);
        tracing::trace!(host, "circuit breaker recorded failure");
    }
}
