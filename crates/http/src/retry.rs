//! Retry controller (component C8, spec §4.5): wraps the engine with
//! attempt accounting, circuit breaking, and backoff.

use std::time::Duration;

use rand::RngExt;
use serde::{Deserialize, Serialize};

use axon_categorizer::categorize_http_status;
use axon_core::{ErrorCategory, ErrorDetail};
use axon_resilience::CircuitBreakerRegistry;
use axon_trace::TraceEntry;

use crate::engine::HttpEngine;
use crate::request::{HttpResponse, OutboundRequest};

/// Exponential backoff with jitter between retry attempts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryPolicy {
    /// Total attempts allowed, including the first.
    pub max_attempts: u32,
    /// Backoff before the second attempt.
    #[serde(with = "axon_core::duration_millis")]
    pub initial_backoff: Duration,
    /// Multiplier applied per additional attempt.
    pub backoff_multiplier: f64,
    /// Ceiling on computed backoff, before `Retry-After` is considered.
    #[serde(with = "axon_core::duration_millis")]
    pub max_backoff: Duration,
    /// Categories this policy will retry, on top of [`ErrorDetail::retryable`]
    /// (spec §4.5). Empty means "no additional restriction" — any category
    /// the categorizer already marked retryable is retried, which is the
    /// historical, backward-compatible default.
    #[serde(default)]
    pub retryable_errors: Vec<ErrorCategory>,
    /// Whether [`Self::backoff_duration`] applies ±10% jitter. `false` is an
    /// escape hatch for callers that need deterministic backoff (e.g. tests
    /// asserting exact wait times).
    #[serde(default = "default_jitter")]
    pub jitter: bool,
}

fn default_jitter() -> bool {
    true
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_backoff: Duration::from_millis(500),
            backoff_multiplier: 2.0,
            max_backoff: Duration::from_secs(30),
            retryable_errors: Vec::new(),
            jitter: true,
        }
    }
}

impl RetryPolicy {
    /// A smaller-blast-radius policy for actions with side effects that are
    /// expensive to repeat (fewer attempts, same backoff shape).
    #[must_use]
    pub fn conservative() -> Self {
        Self { max_attempts: 2, ..Self::default() }
    }

    /// Whether `error` should be retried under this policy: the categorizer
    /// must have already marked it retryable, and if `retryable_errors` is
    /// non-empty, its category must additionally appear in that allowlist.
    #[must_use]
    pub fn allows_retry(&self, error: &ErrorDetail) -> bool {
        error.retryable && (self.retryable_errors.is_empty() || self.retryable_errors.contains(&error.category))
    }

    /// Backoff before attempt `next_attempt` (1-indexed: the attempt about
    /// to be made). Applies ±10% jitter unless `jitter` is `false`.
    #[must_use]
    pub fn backoff_duration(&self, next_attempt: u32) -> Duration {
        let exponent = next_attempt.saturating_sub(1);
        let base_ms = self.initial_backoff.as_millis() as f64;
        let scaled_ms = base_ms * self.backoff_multiplier.powi(exponent as i32);
        let jitter = if self.jitter { rand::rng().random_range(0.9..=1.1) } else { 1.0 };
        let jittered_ms = (scaled_ms * jitter).round() as u64;
        Duration::from_millis(jittered_ms).min(self.max_backoff)
    }
}

/// Coordinates the circuit breaker, the categorizer, and the engine across
/// a bounded number of attempts.
pub struct RetryController {
    engine: HttpEngine,
    breakers: CircuitBreakerRegistry,
    policy: RetryPolicy,
}

/// Whether a failure should count against a host's circuit breaker.
/// Rate limiting reflects the caller's own quota, not host health, so it is
/// excluded even though it is retryable.
fn trips_circuit_breaker(error: &ErrorDetail) -> bool {
    error.retryable && error.category != axon_core::ErrorCategory::RateLimitBurst
}

impl RetryController {
    /// Build a controller from its three collaborators.
    #[must_use]
    pub fn new(engine: HttpEngine, breakers: CircuitBreakerRegistry, policy: RetryPolicy) -> Self {
        Self { engine, breakers, policy }
    }

    /// Execute `request`, retrying per `self.policy` until it succeeds, a
    /// non-retryable error is produced, or attempts are exhausted.
    ///
    /// Returns every trace entry produced, even on eventual success (so
    /// callers can see prior failed attempts), plus either the final
    /// response or the final error.
    pub async fn execute(&self, request: &OutboundRequest) -> (Result<HttpResponse, ErrorDetail>, Vec<TraceEntry>) {
        self.execute_with_policy(request, &self.policy).await
    }

    /// Execute `request` under a caller-supplied policy instead of
    /// `self.policy` — used when an action declares its own `retryPolicy`
    /// (spec §3), while still sharing this controller's engine and circuit
    /// breaker state with every other action.
    pub async fn execute_with_policy(
        &self,
        request: &OutboundRequest,
        policy: &RetryPolicy,
    ) -> (Result<HttpResponse, ErrorDetail>, Vec<TraceEntry>) {
        let host = url::Url::parse(&request.url)
            .ok()
            .and_then(|u| u.host_str().map(str::to_string))
            .unwrap_or_else(|| request.url.clone());

        let mut traces = Vec::new();

        for attempt in 1..=policy.max_attempts {
            if let Err(open) = self.breakers.admit(&host) {
                return (Err(open), traces);
            }

            let (result, trace) = self.engine.execute_once(request, attempt).await;
            traces.push(trace);

            let error = match result {
                Ok(response) if response.is_success() => {
                    self.breakers.record_success(&host);
                    return (Ok(response), traces);
                }
                Ok(response) => categorize_http_status(response.status, response.retry_after()),
                Err(network_error) => network_error,
            };

            if trips_circuit_breaker(&error) {
                self.breakers.record_failure(&host);
            }

            let exhausted = attempt == policy.max_attempts;
            if exhausted || !policy.allows_retry(&error) {
                return (Err(error), traces);
            }

            let computed = policy.backoff_duration(attempt);
            let wait = error.retry_after.map_or(computed, |hint| hint.max(computed));
            tracing::debug!(attempt, host = %host, wait_ms = wait.as_millis(), "retrying after backoff");
            tokio::time::sleep(wait).await;
        }

        unreachable!("loop always returns by the final attempt")
    }
}
