//! Single-host breaker state machine: Closed / Open / HalfOpen.

use std::time::Instant;

use crate::config::CircuitBreakerConfig;
use crate::window::SlidingWindow;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum State {
    Closed,
    Open,
    HalfOpen,
}

pub(crate) struct HostBreaker {
    pub(crate) state: State,
    window: SlidingWindow,
    consecutive_openings: u32,
    opened_at: Option<Instant>,
    half_open_successes: u32,
}

/// Outcome of asking whether a request may proceed.
pub(crate) enum Admission {
    Allowed,
    Rejected { failure_rate: f64, retry_after: std::time::Duration },
}

impl HostBreaker {
    pub(crate) fn new(config: &CircuitBreakerConfig) -> Self {
        Self {
            state: State::Closed,
            window: SlidingWindow::new(config.window),
            consecutive_openings: 0,
            opened_at: None,
            half_open_successes: 0,
        }
    }

    pub(crate) fn admit(&mut self, config: &CircuitBreakerConfig) -> Admission {
        match self.state {
            State::Closed => Admission::Allowed,
            State::HalfOpen => Admission::Allowed,
            State::Open => {
                let opened_at = self.opened_at.unwrap_or_else(Instant::now);
                let cooldown = config.cooldown_for(self.consecutive_openings);
                let elapsed = opened_at.elapsed();
                if elapsed >= cooldown {
                    self.state = State::HalfOpen;
                    self.half_open_successes = 0;
                    Admission::Allowed
                } else {
                    let (_, failure_rate) = self.window.stats();
                    Admission::Rejected { failure_rate, retry_after: cooldown - elapsed }
                }
            }
        }
    }

    pub(crate) fn record_success(&mut self, config: &CircuitBreakerConfig) {
        self.window.record(false);
        if self.state == State::HalfOpen {
            self.half_open_successes += 1;
            if self.half_open_successes >= config.success_threshold {
                self.close();
            }
        }
    }

    pub(crate) fn record_failure(&mut self, config: &CircuitBreakerConfig) {
        self.window.record(true);
        match self.state {
            State::HalfOpen => self.open(),
            State::Closed => {
                let (count, rate) = self.window.stats();
                if count >= config.volume_threshold && rate >= config.failure_rate_threshold {
                    self.open();
                }
            }
            State::Open => {}
        }
    }

    fn open(&mut self) {
        self.state = State::Open;
        self.consecutive_openings += 1;
        self.opened_at = Some(Instant::now());
    }

    fn close(&mut self) {
        self.state = State::Closed;
        self.consecutive_openings = 0;
        self.opened_at = None;
        self.window.clear();
    }
}
