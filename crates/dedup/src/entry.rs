//! One cache slot: pending, completed, or failed, with waiters parked on it.

use std::time::Instant;

use parking_lot::Mutex;
use serde_json::Value;
use tokio::sync::Notify;

use axon_core::ErrorDetail;

#[derive(Debug, Clone)]
pub(crate) enum EntryState {
    Pending,
    Completed(Value),
    Failed(ErrorDetail),
}

pub(crate) struct Entry {
    state: Mutex<EntryState>,
    pub(crate) created_at: Instant,
    notify: Notify,
}

impl Entry {
    pub(crate) fn pending() -> Self {
        Self { state: Mutex::new(EntryState::Pending), created_at: Instant::now(), notify: Notify::new() }
    }

    pub(crate) fn snapshot(&self) -> EntryState {
        self.state.lock().clone()
    }

    pub(crate) fn complete(&self, value: Value) {
        *self.state.lock() = EntryState::Completed(value);
        self.notify.notify_waiters();
    }

    pub(crate) fn fail(&self, error: ErrorDetail) {
        *self.state.lock() = EntryState::Failed(error);
        self.notify.notify_waiters();
    }

    /// Subscribe to the resolution notification *before* re-checking
    /// `snapshot()`. Creating this future first and checking state second is
    /// what makes the wait race-free: `Notify` guarantees a `notify_waiters`
    /// call made after this future is created, even before it is polled,
    /// will still wake it.
    pub(crate) fn subscribe(&self) -> tokio::sync::futures::Notified<'_> {
        self.notify.notified()
    }
}
