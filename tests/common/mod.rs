//! Shared utilities for pool integration tests.

use std::sync::Arc;
use std::time::Duration;
use server_pool::clock::ManualClock;
use server_pool::config::{PoolMode, ReclaimConfig, SeedConfig, ServerPoolConfig};
use server_pool::dispatch::{Dispatcher, Request, Response};
use server_pool::health::state::FailurePolicy;
use server_pool::net::ServerConnection;
use server_pool::server_pool::{Server, ServerPool, ServerRole};

/// Dispatcher that replays a fixed sequence of random values and counts
/// deliveries.
#[derive(Debug, Default)]
pub struct ScriptedDispatcher {
    values: Vec<u32>,
    next: usize,
    pub delivered: usize,
}

impl ScriptedDispatcher {
    pub fn new(values: &[u32]) -> Self {
        Self {
            values: values.to_vec(),
            ..Self::default()
        }
    }
}

impl Dispatcher for ScriptedDispatcher {
    fn rand(&mut self) -> u32 {
        let value = self.values.get(self.next % self.values.len().max(1)).copied().unwrap_or(0);
        self.next += 1;
        value
    }

    fn deliver(&mut self, _conn: &ServerConnection, _req: Request, _res: Response) {
        self.delivered += 1;
    }
}

/// A server on a manual clock: failure limit 1, 60s backoff.
#[allow(dead_code)]
pub fn server(addr: &str, online: bool, failing: bool) -> Arc<Server> {
    let policy = FailurePolicy::new(1, Duration::from_secs(60));
    let s = Server::new(addr, ServerRole::Master, policy, Arc::new(ManualClock::at_secs(1)));
    s.set_online(online);
    if failing {
        s.record_failure();
    }
    Arc::new(s)
}

/// Pool on a manual clock with destructive reclamation enabled.
#[allow(dead_code)]
pub fn pool(mode: PoolMode, seeds: &[(&str, ServerRole)], clock: Arc<ManualClock>) -> ServerPool {
    let config = ServerPoolConfig {
        mode,
        servers: seeds
            .iter()
            .map(|(addr, role)| SeedConfig { addr: addr.to_string(), role: *role })
            .collect(),
        ..ServerPoolConfig::default()
    };
    let reclaim = ReclaimConfig {
        enabled: true,
        ..ReclaimConfig::default()
    };
    ServerPool::with_clock(config, reclaim, clock)
}
