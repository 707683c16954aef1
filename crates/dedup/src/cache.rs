//! The dedup cache itself: single-flight coordination plus TTL-based GC
//! (component C9, spec §4.7).

use std::sync::Arc;

use dashmap::mapref::entry::Entry as MapEntry;
use dashmap::DashMap;
use serde_json::Value;

use axon_core::ErrorDetail;

use crate::config::DedupConfig;
use crate::entry::{Entry, EntryState};

/// What the caller should do after calling [`DedupCache::acquire`].
pub enum Admission {
    /// No one else is executing this key; the caller must execute it and
    /// report the outcome via [`DedupCache::complete`] or [`DedupCache::fail`].
    Lead,
    /// Someone else already resolved (or is still resolving, until the
    /// follower wait times out) this key; here is the outcome to reuse.
    Follow(Outcome),
}

/// A resolved (or timed-out) outcome handed to a follower.
#[derive(Debug, Clone)]
pub enum Outcome {
    /// The leader completed successfully; this is its stored result.
    Completed(Value),
    /// The leader failed, or the follower gave up waiting.
    Failed(ErrorDetail),
}

/// Deduplicates concurrent and recently-completed calls sharing a key.
pub struct DedupCache {
    entries: DashMap<String, Arc<Entry>>,
    config: DedupConfig,
}

impl DedupCache {
    /// Build an empty cache.
    #[must_use]
    pub fn new(config: DedupConfig) -> Self {
        Self { entries: DashMap::new(), config }
    }

    /// Try to become the leader for `key`, or wait on whoever already is.
    pub async fn acquire(&self, key: &str) -> Admission {
        loop {
            let entry = match self.entries.entry(key.to_string()) {
                MapEntry::Vacant(v) => {
                    v.insert(Arc::new(Entry::pending()));
                    return Admission::Lead;
                }
                MapEntry::Occupied(o) => o.get().clone(),
            };

            match entry.snapshot() {
                EntryState::Completed(value) => return Admission::Follow(Outcome::Completed(value)),
                EntryState::Failed(error) => return Admission::Follow(Outcome::Failed(error)),
                EntryState::Pending => {
                    let subscription = entry.subscribe();
                    // Re-check after subscribing: the leader may have resolved
                    // between our first snapshot and this point.
                    match entry.snapshot() {
                        EntryState::Completed(value) => return Admission::Follow(Outcome::Completed(value)),
                        EntryState::Failed(error) => return Admission::Follow(Outcome::Failed(error)),
                        EntryState::Pending => {}
                    }
                    match tokio::time::timeout(self.config.follower_wait_timeout, subscription).await {
                        Ok(()) => continue,
                        Err(_elapsed) => {
                            return Admission::Follow(Outcome::Failed(ErrorDetail::state_inconsistent(
                                "timed out waiting for an in-flight duplicate execution to finish",
                            )));
                        }
                    }
                }
            }
        }
    }

    /// Record a successful result for `key`, waking any followers.
    pub fn complete(&self, key: &str, value: Value) {
        if let Some(entry) = self.entries.get(key) {
            entry.complete(value);
        }
    }

    /// Record a failure for `key`, waking any followers.
    pub fn fail(&self, key: &str, error: ErrorDetail) {
        if let Some(entry) = self.entries.get(key) {
            entry.fail(error);
        }
    }

    /// Evict expired entries: completed past `completed_ttl`, failed past
    /// `failed_ttl`, or pending past `pending_max_age` (an abandoned leader).
    /// Intended to be called from a periodic background task at
    /// `config.gc_interval`.
    pub fn sweep(&self) {
        let before = self.entries.len();
        self.entries.retain(|_, entry| {
            let age = entry.created_at.elapsed();
            match entry.snapshot() {
                EntryState::Completed(_) => age < self.config.completed_ttl,
                EntryState::Failed(_) => age < self.config.failed_ttl,
                EntryState::Pending => age < self.config.pending_max_age,
            }
        });
        let evicted = before - self.entries.len();
        if evicted > 0 {
            tracing::debug!(evicted, remaining = self.entries.len(), "dedup cache sweep evicted entries");
        }
    }

    /// Current number of tracked keys, for metrics/tests.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the cache is currently empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
