//! Circuit breaker guarding LLM calls (scope-filter probe and the tool-call
//! fallback): closed → open after `failure_threshold` consecutive
//! failures; open → half_open after `recovery_timeout` elapses; half_open
//! → closed on success, → open (resetting the count to the threshold, not
//! incrementing past it) on failure.

use std::sync::Mutex;
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Closed,
    Open,
    HalfOpen,
}

struct Inner {
    state: State,
    failure_count: u32,
    last_failure: Option<Instant>,
}

pub struct CircuitBreaker {
    failure_threshold: u32,
    recovery_timeout: Duration,
    inner: Mutex<Inner>,
}

impl CircuitBreaker {
    pub fn new(failure_threshold: u32, recovery_timeout: Duration) -> Self {
        Self {
            failure_threshold,
            recovery_timeout,
            inner: Mutex::new(Inner {
                state: State::Closed,
                failure_count: 0,
                last_failure: None,
            }),
        }
    }

    /// Default breaker per the original: 3 consecutive failures, 60s
    /// recovery window.
    pub fn default_tuned() -> Self {
        Self::new(3, Duration::from_secs(60))
    }

    /// `true` means calls should be skipped. Transitions open → half_open
    /// once the recovery timeout has elapsed.
    pub fn is_open(&self) -> bool {
        let mut inner = self.inner.lock().unwrap();
        match inner.state {
            State::Closed => false,
            State::Open => {
                let elapsed = inner.last_failure.map(|t| t.elapsed()).unwrap_or(Duration::ZERO);
                if elapsed >= self.recovery_timeout {
                    inner.state = State::HalfOpen;
                    false
                } else {
                    true
                }
            }
            State::HalfOpen => false,
        }
    }

    pub fn record_success(&self) {
        let mut inner = self.inner.lock().unwrap();
        inner.failure_count = 0;
        inner.state = State::Closed;
    }

    pub fn record_failure(&self) {
        let mut inner = self.inner.lock().unwrap();
        inner.last_failure = Some(Instant::now());
        match inner.state {
            State::HalfOpen => {
                inner.state = State::Open;
                inner.failure_count = self.failure_threshold;
            }
            _ => {
                inner.failure_count += 1;
                if inner.failure_count >= self.failure_threshold {
                    inner.state = State::Open;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn opens_after_threshold_failures() {
        let cb = CircuitBreaker::new(3, Duration::from_secs(60));
        assert!(!cb.is_open());
        cb.record_failure();
        cb.record_failure();
        assert!(!cb.is_open());
        cb.record_failure();
        assert!(cb.is_open());
    }

    #[test]
    fn success_resets_to_closed() {
        let cb = CircuitBreaker::new(1, Duration::from_secs(60));
        cb.record_failure();
        assert!(cb.is_open());
        cb.record_success();
        assert!(!cb.is_open());
    }

    #[test]
    fn half_open_failure_goes_straight_back_to_open() {
        let cb = CircuitBreaker::new(1, Duration::from_millis(0));
        cb.record_failure();
        assert!(!cb.is_open()); // recovery_timeout elapsed immediately -> half_open
        cb.record_failure();
        assert!(cb.is_open());
    }
}
