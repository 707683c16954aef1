//! Sliding time window of recent outcomes, used to compute failure rate.

use std::collections::VecDeque;
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy)]
struct Outcome {
    at: Instant,
    failed: bool,
}

/// Bounded-by-time record of recent successes/failures for one host.
#[derive(Debug)]
pub(crate) struct SlidingWindow {
    entries: VecDeque<Outcome>,
    width: Duration,
}

impl SlidingWindow {
    pub(crate) fn new(width: Duration) -> Self {
        Self { entries: VecDeque::new(), width }
    }

    pub(crate) fn record(&mut self, failed: bool) {
        self.prune();
        self.entries.push_back(Outcome { at: Instant::now(), failed });
    }

    fn prune(&mut self) {
        let cutoff = Instant::now();
        while let Some(front) = self.entries.front() {
            if cutoff.duration_since(front.at) > self.width {
                self.entries.pop_front();
            } else {
                break;
            }
        }
    }

    pub(crate) fn clear(&mut self) {
        self.entries.clear();
    }

    /// `(count, failure_rate)` over everything still inside the window.
    pub(crate) fn stats(&mut self) -> (u32, f64) {
        self.prune();
        let total = self.entries.len();
        if total == 0 {
            return (0, 0.0);
        }
        let failures = self.entries.iter().filter(|e| e.failed).count();
        (total as u32, failures as f64 / total as f64)
    }
}
