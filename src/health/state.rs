//! Server failure/backoff state machine.
//!
//! # States
//! - Healthy: failure count below the limit
//! - Failing: failure count at or above the limit and the last failure is
//!   younger than the retry timeout
//!
//! # State Transitions
//! ```text
//! Healthy → Failing: consecutive failures >= failure_limit
//! Failing → Healthy: retry timeout elapses, or any success
//! ```
//!
//! A failing server stays selectable as a fallback; only offline servers
//! are excluded outright.

use std::sync::atomic::{AtomicI64, AtomicU32, Ordering};
use std::time::Duration;
use crate::clock::duration_usec;

/// Limits copied from the pool configuration into every server.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FailurePolicy {
    /// Consecutive failures needed to enter the backoff window.
    pub failure_limit: u32,
    /// Backoff window length in microseconds.
    pub retry_timeout_usec: i64,
}

impl FailurePolicy {
    pub fn new(failure_limit: u32, retry_timeout: Duration) -> Self {
        Self {
            failure_limit,
            retry_timeout_usec: duration_usec(retry_timeout),
        }
    }
}

impl Default for FailurePolicy {
    fn default() -> Self {
        Self::new(10, Duration::from_secs(1))
    }
}

/// Lock-free failure counters for one server.
#[derive(Debug, Default)]
pub struct FailureState {
    count: AtomicU32,
    last_failure_usec: AtomicI64,
}

impl FailureState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a failure at `now_usec`. Returns the new consecutive count.
    pub fn record_failure(&self, now_usec: i64) -> u32 {
        self.last_failure_usec.store(now_usec, Ordering::Relaxed);
        self.count.fetch_add(1, Ordering::Relaxed).saturating_add(1)
    }

    /// Record a success. Returns the count that was cleared.
    pub fn record_success(&self) -> u32 {
        self.count.swap(0, Ordering::Relaxed)
    }

    pub fn count(&self) -> u32 {
        self.count.load(Ordering::Relaxed)
    }

    /// Whether the backoff window is open at `now_usec`.
    pub fn is_failing(&self, now_usec: i64, policy: &FailurePolicy) -> bool {
        if self.count.load(Ordering::Relaxed) < policy.failure_limit {
            return false;
        }
        let last = self.last_failure_usec.load(Ordering::Relaxed);
        now_usec.saturating_sub(last) < policy.retry_timeout_usec
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy() -> FailurePolicy {
        FailurePolicy::new(3, Duration::from_millis(500))
    }

    #[test]
    fn enters_backoff_at_limit() {
        let state = FailureState::new();
        assert_eq!(state.record_failure(1_000), 1);
        assert_eq!(state.record_failure(2_000), 2);
        assert!(!state.is_failing(2_000, &policy()));
        assert_eq!(state.record_failure(3_000), 3);
        assert!(state.is_failing(3_000, &policy()));
    }

    #[test]
    fn backoff_window_expires() {
        let state = FailureState::new();
        for t in 0..3 {
            state.record_failure(t);
        }
        assert!(state.is_failing(400_000, &policy()));
        assert!(!state.is_failing(502_000, &policy()));
    }

    #[test]
    fn huge_retry_timeout_keeps_backoff_open() {
        let policy = FailurePolicy::new(1, Duration::from_millis(10_000_000_000_000_000));
        assert_eq!(policy.retry_timeout_usec, i64::MAX);

        let state = FailureState::new();
        state.record_failure(1_000);
        assert!(state.is_failing(1_000, &policy));
        assert!(state.is_failing(1_000_000_000_000, &policy));
    }

    #[test]
    fn success_clears_failures() {
        let state = FailureState::new();
        for t in 0..5 {
            state.record_failure(t);
        }
        assert_eq!(state.record_success(), 5);
        assert_eq!(state.count(), 0);
        assert!(!state.is_failing(10, &policy()));
    }
}
