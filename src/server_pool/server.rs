//! Backend server record.
//!
//! # Responsibilities
//! - Represent a single backend node (address, role)
//! - Track online/offline and failure/backoff state
//! - Mark destruction once the pool reclaims the record
//!
//! Flags are atomics read with relaxed ordering. Selection tolerates stale
//! views; only the update lock serializes role and membership changes.

use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use std::sync::Arc;
use serde::{Deserialize, Serialize};
use crate::clock::{Clock, SystemClock};
use crate::health::state::{FailurePolicy, FailureState};

/// Role of a server within the pool.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ServerRole {
    Master = 0,
    /// Slave listed in configuration.
    StaticSlave = 1,
    /// Slave discovered from the cluster.
    DynamicSlave = 2,
}

impl ServerRole {
    pub fn is_master(self) -> bool {
        self == ServerRole::Master
    }

    /// Label used in logs and metrics.
    pub fn label(self) -> &'static str {
        if self.is_master() {
            "master"
        } else {
            "slave"
        }
    }
}

impl From<u8> for ServerRole {
    fn from(val: u8) -> Self {
        match val {
            0 => ServerRole::Master,
            1 => ServerRole::StaticSlave,
            _ => ServerRole::DynamicSlave,
        }
    }
}

/// A single backend server.
pub struct Server {
    addr: String,
    role: AtomicU8,
    online: AtomicBool,
    /// Set once the pool has reclaimed this record.
    closed: AtomicBool,
    failures: FailureState,
    policy: FailurePolicy,
    clock: Arc<dyn Clock>,
}

impl Server {
    /// Create a new server, initially online.
    pub fn new(
        addr: impl Into<String>,
        role: ServerRole,
        policy: FailurePolicy,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            addr: addr.into(),
            role: AtomicU8::new(role as u8),
            online: AtomicBool::new(true),
            closed: AtomicBool::new(false),
            failures: FailureState::new(),
            policy,
            clock,
        }
    }

    /// Server with the default failure policy on the system clock.
    pub fn with_defaults(addr: impl Into<String>, role: ServerRole) -> Self {
        Self::new(addr, role, FailurePolicy::default(), Arc::new(SystemClock))
    }

    pub fn addr(&self) -> &str {
        &self.addr
    }

    pub fn role(&self) -> ServerRole {
        ServerRole::from(self.role.load(Ordering::Relaxed))
    }

    pub(crate) fn set_role(&self, role: ServerRole) {
        self.role.store(role as u8, Ordering::Relaxed);
    }

    pub fn is_master(&self) -> bool {
        self.role().is_master()
    }

    pub fn online(&self) -> bool {
        self.online.load(Ordering::Relaxed)
    }

    pub fn set_online(&self, online: bool) {
        let was = self.online.swap(online, Ordering::Relaxed);
        if was != online {
            tracing::info!(addr = %self.addr, role = self.role().label(), online, "Server online state changed");
        }
    }

    /// Whether the server is inside its failure/backoff window.
    pub fn fail(&self) -> bool {
        self.failures.is_failing(self.clock.now_usec(), &self.policy)
    }

    pub fn failure_count(&self) -> u32 {
        self.failures.count()
    }

    /// Report a failed request.
    pub fn record_failure(&self) {
        let count = self.failures.record_failure(self.clock.now_usec());
        if count == self.policy.failure_limit {
            tracing::warn!(
                addr = %self.addr,
                failures = count,
                retry_timeout_usec = self.policy.retry_timeout_usec,
                "Server reached failure limit, entering backoff"
            );
        }
    }

    /// Report a successful request.
    pub fn record_success(&self) {
        let cleared = self.failures.record_success();
        if cleared >= self.policy.failure_limit {
            tracing::info!(addr = %self.addr, "Server recovered from failure backoff");
        }
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Relaxed)
    }

    /// Final teardown once the grace period is over. Holders that still
    /// reference the record see it offline and closed.
    pub(crate) fn close(&self) {
        self.online.store(false, Ordering::Relaxed);
        self.closed.store(true, Ordering::Relaxed);
    }
}

impl fmt::Debug for Server {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Server")
            .field("addr", &self.addr)
            .field("role", &self.role())
            .field("online", &self.online())
            .field("failures", &self.failure_count())
            .field("closed", &self.is_closed())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use crate::clock::ManualClock;

    #[test]
    fn role_round_trips_through_atomic() {
        let server = Server::with_defaults("127.0.0.1:7000", ServerRole::DynamicSlave);
        assert_eq!(server.role(), ServerRole::DynamicSlave);
        assert!(!server.is_master());
        server.set_role(ServerRole::Master);
        assert!(server.is_master());
        assert_eq!(server.role().label(), "master");
    }

    #[test]
    fn fail_follows_clock() {
        let clock = Arc::new(ManualClock::at_secs(10));
        let policy = FailurePolicy::new(2, Duration::from_millis(100));
        let server = Server::new("127.0.0.1:7000", ServerRole::Master, policy, clock.clone());

        server.record_failure();
        assert!(!server.fail());
        server.record_failure();
        assert!(server.fail());

        clock.advance_millis(150);
        assert!(!server.fail());
        assert_eq!(server.failure_count(), 2);

        server.record_success();
        assert_eq!(server.failure_count(), 0);
    }

    #[test]
    fn close_takes_server_offline() {
        let server = Server::with_defaults("127.0.0.1:7000", ServerRole::Master);
        assert!(server.online());
        server.close();
        assert!(!server.online());
        assert!(server.is_closed());
    }
}
