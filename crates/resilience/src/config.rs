//! Circuit breaker configuration (spec §4.3 defaults).

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Tuning knobs for every host's circuit breaker. A single config is shared
/// by the whole [`crate::CircuitBreakerRegistry`]; hosts do not tune
/// independently.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CircuitBreakerConfig {
    /// Failure rate (0.0-1.0) that trips the breaker, once `volume_threshold`
    /// is met.
    pub failure_rate_threshold: f64,
    /// Minimum number of requests in the window before the failure rate is
    /// considered meaningful.
    pub volume_threshold: u32,
    /// Width of the sliding window used to compute the failure rate.
    pub window: Duration,
    /// Cooldown before the first half-open trial.
    pub base_cooldown: Duration,
    /// Upper bound on the exponentially-backed-off cooldown.
    pub max_cooldown: Duration,
    /// Consecutive half-open successes required to close the breaker.
    pub success_threshold: u32,
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self {
            failure_rate_threshold: 0.5,
            volume_threshold: 10,
            window: Duration::from_secs(60),
            base_cooldown: Duration::from_secs(30),
            max_cooldown: Duration::from_secs(5 * 60),
            success_threshold: 5,
        }
    }
}

impl CircuitBreakerConfig {
    /// Cooldown for the Nth consecutive opening (1-indexed), per spec §4.3:
    /// `min(base * 2^(consecutiveOpenings-1), maxCooldown)`, with the
    /// exponent capped at 4 so the backoff does not grow unbounded.
    #[must_use]
    pub fn cooldown_for(&self, consecutive_openings: u32) -> Duration {
        let exponent = consecutive_openings.saturating_sub(1).min(4);
        let multiplier = 1u32 << exponent;
        self.base_cooldown.saturating_mul(multiplier).min(self.max_cooldown)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cooldown_doubles_then_caps_at_max() {
        let cfg = CircuitBreakerConfig::default();
        assert_eq!(cfg.cooldown_for(1), Duration::from_secs(30));
        assert_eq!(cfg.cooldown_for(2), Duration::from_secs(60));
        assert_eq!(cfg.cooldown_for(3), Duration::from_secs(120));
        assert_eq!(cfg.cooldown_for(4), Duration::from_secs(240));
        assert_eq!(cfg.cooldown_for(5), Duration::from_secs(5 * 60));
        assert_eq!(cfg.cooldown_for(6), Duration::from_secs(5 * 60));
        assert_eq!(cfg.cooldown_for(100), Duration::from_secs(5 * 60));
    }
}
