//! Dedup cache tuning knobs (spec §4.7).

use std::time::Duration;

/// TTLs and timing for the dedup cache and its background sweep.
#[derive(Debug, Clone)]
pub struct DedupConfig {
    /// How long a completed entry stays cached and eligible to short-circuit
    /// duplicate calls.
    pub completed_ttl: Duration,
    /// How long a failed entry stays cached. Short, so a transient failure
    /// does not permanently poison the key.
    pub failed_ttl: Duration,
    /// A pending entry older than this is considered abandoned (its leader
    /// crashed or hung) and is evicted on the next sweep.
    pub pending_max_age: Duration,
    /// How often the background sweep runs.
    pub gc_interval: Duration,
    /// How long a follower will wait for the leader to finish before giving
    /// up and treating the call as failed.
    pub follower_wait_timeout: Duration,
}

impl Default for DedupConfig {
    fn default() -> Self {
        Self {
            completed_ttl: Duration::from_secs(5 * 60),
            failed_ttl: Duration::from_secs(30),
            pending_max_age: Duration::from_secs(10 * 60),
            gc_interval: Duration::from_secs(60),
            follower_wait_timeout: Duration::from_secs(5 * 60),
        }
    }
}
