//! Time sources used by the server pool.
//!
//! Refresh throttling runs on a monotonic microsecond clock; retirement
//! aging and log throttling run on wall-clock seconds. Both are behind the
//! [`Clock`] trait so tests can drive time by hand.

use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::OnceLock;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

/// A source of current time.
pub trait Clock: Send + Sync + std::fmt::Debug {
    /// Monotonic microseconds. Only differences are meaningful.
    fn now_usec(&self) -> i64;

    /// Wall-clock seconds since the Unix epoch.
    fn now_secs(&self) -> i64;
}

/// Microseconds in `d`, saturating at `i64::MAX`.
pub fn duration_usec(d: Duration) -> i64 {
    i64::try_from(d.as_micros()).unwrap_or(i64::MAX)
}

/// Whole seconds as a signed timestamp delta, saturating at `i64::MAX`.
pub fn secs_i64(secs: u64) -> i64 {
    i64::try_from(secs).unwrap_or(i64::MAX)
}

/// Process clock backed by `Instant` and `SystemTime`.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

fn process_anchor() -> Instant {
    static ANCHOR: OnceLock<Instant> = OnceLock::new();
    *ANCHOR.get_or_init(Instant::now)
}

impl Clock for SystemClock {
    fn now_usec(&self) -> i64 {
        duration_usec(process_anchor().elapsed())
    }

    fn now_secs(&self) -> i64 {
        let secs = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs();
        secs_i64(secs)
    }
}

/// Hand-driven clock for tests and simulations.
///
/// Wall-clock seconds and monotonic microseconds advance together.
#[derive(Debug, Default)]
pub struct ManualClock {
    usec: AtomicI64,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start at the given wall-clock second.
    pub fn at_secs(secs: i64) -> Self {
        Self {
            usec: AtomicI64::new(secs * 1_000_000),
        }
    }

    pub fn advance_usec(&self, usec: i64) {
        self.usec.fetch_add(usec, Ordering::SeqCst);
    }

    pub fn advance_millis(&self, millis: i64) {
        self.advance_usec(millis * 1_000);
    }

    pub fn advance_secs(&self, secs: i64) {
        self.advance_usec(secs * 1_000_000);
    }
}

impl Clock for ManualClock {
    fn now_usec(&self) -> i64 {
        self.usec.load(Ordering::SeqCst)
    }

    fn now_secs(&self) -> i64 {
        self.usec.load(Ordering::SeqCst) / 1_000_000
    }
}
