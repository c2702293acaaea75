//! The server pool.
//!
//! # Responsibilities
//! - Own every live server (address arena) and the active topology snapshot
//! - Throttle topology refresh with a compare-and-swap timestamp
//! - Route responses through the deployment-mode strategy without ever
//!   blocking on the update lock
//! - Retire removed servers and reclaim them after a grace period
//!
//! # Locking
//! One update lock serializes structural changes: topology application and
//! the retirement queue. Selection reads the published snapshot and server
//! flags only. `handle_response` uses a try-lock and drops the response
//! when a structural change is running.

use std::collections::HashSet;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, TryLockError};
use arc_swap::ArcSwap;
use dashmap::DashMap;
use serde::Serialize;
use crate::clock::{duration_usec, Clock, SystemClock};
use crate::config::{ProxyConfig, ReclaimConfig, ServerPoolConfig};
use crate::dispatch::{Dispatcher, NodeSpec, Request, Response};
use crate::health::state::FailurePolicy;
use crate::net::ServerConnection;
use crate::observability::metrics;
use crate::server_pool::retire::{ReclaimReport, RetirementQueue};
use crate::server_pool::select;
use crate::server_pool::server::{Server, ServerRole};
use crate::server_pool::strategy::{self, ResponseStrategy};
use crate::server_pool::topology::{ServerStatus, Topology};

/// Last-refresh value before the first refresh.
const NEVER: i64 = i64::MIN;

/// Result of [`ServerPool::handle_response`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseOutcome {
    /// The strategy ran and the response was delivered.
    Handled,
    /// A structural update held the lock; the response was dropped here and
    /// must be recovered by the dispatcher's own timeout/retry.
    Skipped,
}

/// Counts from one topology application.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TopologyChange {
    pub added: usize,
    pub updated: usize,
    pub revived: usize,
    pub retired: usize,
}

/// Serializable view of the whole pool.
#[derive(Debug, Clone, Serialize)]
pub struct PoolStatus {
    pub servers: Vec<ServerStatus>,
    pub invalid_servers: usize,
}

/// State guarded by the update lock.
#[derive(Debug)]
struct PoolState {
    retired: RetirementQueue,
}

/// Tracks backend servers, picks routing targets and serializes topology changes.
#[derive(Debug)]
pub struct ServerPool {
    config: ServerPoolConfig,
    reclaim: ReclaimConfig,
    policy: FailurePolicy,
    clock: Arc<dyn Clock>,
    refresh_interval_usec: i64,
    last_refresh: AtomicI64,
    update_lock: Mutex<PoolState>,
    topology: ArcSwap<Topology>,
    servers: DashMap<String, Arc<Server>>,
    strategy: Box<dyn ResponseStrategy>,
}

impl ServerPool {
    /// Build a pool from the full proxy configuration.
    pub fn from_config(config: &ProxyConfig) -> Self {
        Self::new(config.pool.clone(), config.reclaim.clone())
    }

    pub fn new(config: ServerPoolConfig, reclaim: ReclaimConfig) -> Self {
        Self::with_clock(config, reclaim, Arc::new(SystemClock))
    }

    /// Install the configuration snapshot and seed the topology.
    ///
    /// No connections are opened here.
    pub fn with_clock(config: ServerPoolConfig, reclaim: ReclaimConfig, clock: Arc<dyn Clock>) -> Self {
        let policy = FailurePolicy::new(config.server_failure_limit, config.server_retry_timeout());
        let seeds: Vec<NodeSpec> = config
            .servers
            .iter()
            .map(|seed| NodeSpec::new(seed.addr.clone(), seed.role))
            .collect();

        let pool = Self {
            refresh_interval_usec: duration_usec(config.refresh_interval()),
            strategy: strategy::for_mode(config.mode),
            update_lock: Mutex::new(PoolState {
                retired: RetirementQueue::new(clock.now_secs()),
            }),
            last_refresh: AtomicI64::new(NEVER),
            topology: ArcSwap::from_pointee(Topology::default()),
            servers: DashMap::new(),
            config,
            reclaim,
            policy,
            clock,
        };

        tracing::info!(
            mode = pool.strategy.name(),
            seeds = seeds.len(),
            refresh_interval_ms = pool.config.refresh_interval_ms,
            failure_limit = pool.config.server_failure_limit,
            "Server pool initialized"
        );
        if !seeds.is_empty() {
            pool.update_topology(&seeds);
        }
        pool
    }

    /// Read-only configuration for routing decisions.
    pub fn config(&self) -> &ServerPoolConfig {
        &self.config
    }

    pub fn strategy_name(&self) -> &'static str {
        self.strategy.name()
    }

    /// Throttle gate for topology refresh.
    ///
    /// Returns true to exactly one caller per refresh interval; that caller
    /// performs the refresh. All others get false and do nothing.
    pub fn refresh(&self) -> bool {
        let last = self.last_refresh.load(Ordering::Acquire);
        let now = self.clock.now_usec();
        if now.saturating_sub(last) < self.refresh_interval_usec {
            return false;
        }
        let won = self
            .last_refresh
            .compare_exchange(last, now, Ordering::AcqRel, Ordering::Acquire)
            .is_ok();
        if won {
            metrics::record_refresh();
            tracing::debug!(now_usec = now, "Refresh gate won");
        }
        won
    }

    /// Route one backend response through the deployment-mode strategy.
    ///
    /// Never waits for the update lock.
    pub fn handle_response(
        &self,
        dispatcher: &mut dyn Dispatcher,
        conn: &ServerConnection,
        req: Request,
        res: Response,
    ) -> ResponseOutcome {
        let state = match self.update_lock.try_lock() {
            Ok(guard) => guard,
            Err(TryLockError::Poisoned(poisoned)) => poisoned.into_inner(),
            Err(TryLockError::WouldBlock) => {
                tracing::info!(
                    addr = %conn.server().addr(),
                    request = req.id,
                    "server pool is updating by other thread"
                );
                metrics::record_response_skipped();
                return ResponseOutcome::Skipped;
            }
        };

        let mut update = TopologyUpdate { pool: self, state };
        self.strategy.handle(&mut update, dispatcher, conn, req, res);
        metrics::record_response(self.strategy.name());
        ResponseOutcome::Handled
    }

    /// Random pick with failing-server fallback. See [`select::select_random`].
    pub fn select_random(&self, dispatcher: &mut dyn Dispatcher, candidates: &[Arc<Server>]) -> Option<Arc<Server>> {
        select::select_random(dispatcher, candidates)
    }

    /// Cursor iteration over online servers. See [`select::iterate`].
    pub fn iterate(&self, candidates: &[Arc<Server>], cursor: &mut isize) -> Option<Arc<Server>> {
        select::iterate(candidates, cursor)
    }

    /// Pick a master for a write.
    pub fn select_master(&self, dispatcher: &mut dyn Dispatcher) -> Option<Arc<Server>> {
        let topology = self.topology.load();
        let picked = select::select_random(dispatcher, topology.masters());
        if picked.is_none() {
            tracing::debug!(masters = topology.masters().len(), "No master available");
            metrics::record_selection_miss("master");
        }
        picked
    }

    /// Pick a server for a read, honouring role read priorities.
    ///
    /// Roles are tried from highest to lowest priority; priority 0 removes a
    /// role. Ties keep master, static slave, dynamic slave order.
    pub fn select_reader(&self, dispatcher: &mut dyn Dispatcher) -> Option<Arc<Server>> {
        let topology = self.topology.load();
        let mut roles = [ServerRole::Master, ServerRole::StaticSlave, ServerRole::DynamicSlave];
        roles.sort_by_key(|role| std::cmp::Reverse(self.config.read_priority(*role)));

        for role in roles {
            if self.config.read_priority(role) == 0 {
                continue;
            }
            if let Some(server) = select::select_random(dispatcher, topology.by_role(role)) {
                return Some(server);
            }
        }
        tracing::debug!(servers = topology.len(), "No reader available");
        metrics::record_selection_miss("reader");
        None
    }

    /// Current active topology snapshot.
    pub fn topology(&self) -> Arc<Topology> {
        self.topology.load_full()
    }

    /// Live server by address. Retired servers are not returned.
    pub fn server(&self, addr: &str) -> Option<Arc<Server>> {
        self.servers.get(addr).map(|entry| entry.value().clone())
    }

    /// Acquire the update lock, waiting if needed. Structural path only.
    pub fn lock_update(&self) -> TopologyUpdate<'_> {
        TopologyUpdate {
            pool: self,
            state: self.lock_state(),
        }
    }

    /// Replace the active topology with `nodes`.
    pub fn update_topology(&self, nodes: &[NodeSpec]) -> TopologyChange {
        self.lock_update().apply(nodes)
    }

    /// Periodic maintenance: backlog summary and grace-period reclamation.
    pub fn reclaim_invalid_servers(&self) -> ReclaimReport {
        let mut state = self.lock_state();
        let report = state.retired.reclaim(self.clock.now_secs(), &self.reclaim);
        metrics::record_invalid_servers(report.pending);
        report
    }

    pub fn invalid_server_count(&self) -> usize {
        self.lock_state().retired.len()
    }

    pub fn status(&self) -> PoolStatus {
        PoolStatus {
            servers: self.topology.load().summary(),
            invalid_servers: self.invalid_server_count(),
        }
    }

    fn lock_state(&self) -> MutexGuard<'_, PoolState> {
        self.update_lock.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn new_server(&self, addr: &str, role: ServerRole) -> Arc<Server> {
        Arc::new(Server::new(addr, role, self.policy, self.clock.clone()))
    }
}

/// Exclusive access to the pool's structure while the update lock is held.
pub struct TopologyUpdate<'a> {
    pool: &'a ServerPool,
    state: MutexGuard<'a, PoolState>,
}

impl<'a> TopologyUpdate<'a> {
    pub fn pool(&self) -> &'a ServerPool {
        self.pool
    }

    /// Make `nodes` the active topology.
    ///
    /// Known servers are reused and updated, retired ones still in their
    /// grace period are revived, new ones are created. Servers missing from
    /// `nodes` go offline and into the retirement queue.
    pub fn apply(&mut self, nodes: &[NodeSpec]) -> TopologyChange {
        let pool = self.pool;
        let now = pool.clock.now_secs();
        let mut change = TopologyChange::default();
        let mut seen: HashSet<&str> = HashSet::with_capacity(nodes.len());
        let mut active = Vec::with_capacity(nodes.len());

        for node in nodes {
            if !seen.insert(node.addr.as_str()) {
                continue;
            }
            let server = match self.claim(&node.addr, node.role) {
                Claimed::Existing(server) => {
                    if server.role() != node.role {
                        tracing::info!(
                            addr = %node.addr,
                            from = ?server.role(),
                            to = ?node.role,
                            "Server role changed"
                        );
                        server.set_role(node.role);
                        change.updated += 1;
                    }
                    server
                }
                Claimed::Revived(server) => {
                    change.revived += 1;
                    server
                }
                Claimed::Created(server) => {
                    change.added += 1;
                    server
                }
            };
            server.set_online(node.online);
            metrics::record_server_online(server.addr(), node.online);
            active.push(server);
        }

        let stale: Vec<String> = pool
            .servers
            .iter()
            .filter(|entry| !seen.contains(entry.key().as_str()))
            .map(|entry| entry.key().clone())
            .collect();
        for addr in stale {
            if let Some((_, server)) = pool.servers.remove(&addr) {
                tracing::info!(addr = %addr, role = server.role().label(), "Server removed from topology");
                server.set_online(false);
                metrics::record_server_online(&addr, false);
                self.state.retired.retire(server, now);
                change.retired += 1;
            }
        }

        pool.topology.store(Arc::new(Topology::from_servers(active)));
        metrics::record_invalid_servers(self.state.retired.len());
        change
    }

    /// Add a single server to the active topology, or return the live one.
    pub fn add_server(&mut self, addr: &str, role: ServerRole) -> Arc<Server> {
        let server = match self.claim(addr, role) {
            Claimed::Existing(server) => return server,
            Claimed::Revived(server) | Claimed::Created(server) => server,
        };
        server.set_online(true);
        metrics::record_server_online(addr, true);

        let current = self.pool.topology.load();
        let active = current.all().cloned().chain(std::iter::once(server.clone()));
        self.pool.topology.store(Arc::new(Topology::from_servers(active)));
        server
    }

    fn claim(&mut self, addr: &str, role: ServerRole) -> Claimed {
        if let Some(server) = self.pool.server(addr) {
            return Claimed::Existing(server);
        }
        let claimed = match self.state.retired.revive(addr) {
            Some(server) => {
                tracing::info!(addr = %addr, "Retired server rejoined topology");
                server.set_role(role);
                Claimed::Revived(server)
            }
            None => {
                tracing::info!(addr = %addr, role = role.label(), "Server added to topology");
                Claimed::Created(self.pool.new_server(addr, role))
            }
        };
        let server = match &claimed {
            Claimed::Existing(s) | Claimed::Revived(s) | Claimed::Created(s) => s.clone(),
        };
        self.pool.servers.insert(addr.to_string(), server);
        claimed
    }
}

enum Claimed {
    Existing(Arc<Server>),
    Revived(Arc<Server>),
    Created(Arc<Server>),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::config::{PoolMode, SeedConfig};
    use crate::dispatch::Worker;

    fn pool_config(mode: PoolMode, seeds: &[(&str, ServerRole)]) -> ServerPoolConfig {
        ServerPoolConfig {
            mode,
            servers: seeds
                .iter()
                .map(|(addr, role)| SeedConfig { addr: addr.to_string(), role: *role })
                .collect(),
            ..ServerPoolConfig::default()
        }
    }

    fn pool_with(config: ServerPoolConfig, clock: Arc<ManualClock>) -> ServerPool {
        let reclaim = ReclaimConfig { enabled: true, ..ReclaimConfig::default() };
        ServerPool::with_clock(config, reclaim, clock)
    }

    #[test]
    fn seeds_become_topology() {
        let clock = Arc::new(ManualClock::at_secs(1_000));
        let pool = pool_with(
            pool_config(PoolMode::Cluster, &[("m:1", ServerRole::Master), ("s:1", ServerRole::StaticSlave)]),
            clock,
        );
        let topology = pool.topology();
        assert_eq!(topology.masters().len(), 1);
        assert_eq!(topology.by_role(ServerRole::StaticSlave).len(), 1);
        assert!(pool.server("m:1").is_some());
        assert_eq!(pool.strategy_name(), "cluster");
    }

    #[test]
    fn refresh_is_throttled() {
        let clock = Arc::new(ManualClock::at_secs(1_000));
        let pool = pool_with(pool_config(PoolMode::Cluster, &[]), clock.clone());

        assert!(pool.refresh());
        assert!(!pool.refresh());
        clock.advance_millis(999);
        assert!(!pool.refresh());
        clock.advance_millis(1);
        assert!(pool.refresh());
        assert!(!pool.refresh());
    }

    #[test]
    fn huge_refresh_interval_keeps_one_winner() {
        let config = crate::config::loader::parse_config("[pool]\nrefresh_interval_ms = 10000000000000000\n").unwrap();
        let clock = Arc::new(ManualClock::at_secs(1_000));
        let pool = pool_with(config.pool, clock.clone());

        let wins = (0..5).filter(|_| pool.refresh()).count();
        assert_eq!(wins, 1);
        clock.advance_secs(86_400);
        assert!(!pool.refresh());
    }

    #[test]
    fn update_retires_missing_servers() {
        let clock = Arc::new(ManualClock::at_secs(1_000));
        let pool = pool_with(
            pool_config(PoolMode::Cluster, &[("a:1", ServerRole::Master), ("b:1", ServerRole::Master)]),
            clock.clone(),
        );
        let b = pool.server("b:1").unwrap();

        let change = pool.update_topology(&[
            NodeSpec::new("a:1", ServerRole::Master),
            NodeSpec::new("c:1", ServerRole::DynamicSlave),
        ]);
        assert_eq!(change, TopologyChange { added: 1, updated: 0, revived: 0, retired: 1 });
        assert!(pool.server("b:1").is_none());
        assert!(!b.online());
        assert!(!pool.topology().contains("b:1"));
        assert_eq!(pool.invalid_server_count(), 1);

        clock.advance_secs(301);
        let report = pool.reclaim_invalid_servers();
        assert_eq!(report.reclaimed, vec!["b:1".to_string()]);
        assert!(b.is_closed());
        assert_eq!(pool.invalid_server_count(), 0);
    }

    #[test]
    fn role_change_keeps_failure_state() {
        let clock = Arc::new(ManualClock::at_secs(1_000));
        let pool = pool_with(
            pool_config(PoolMode::Cluster, &[("a:1", ServerRole::Master), ("b:1", ServerRole::DynamicSlave)]),
            clock,
        );
        let b = pool.server("b:1").unwrap();
        b.record_failure();

        let change = pool.update_topology(&[
            NodeSpec::new("a:1", ServerRole::DynamicSlave),
            NodeSpec::new("b:1", ServerRole::Master),
        ]);
        assert_eq!(change.updated, 2);
        let promoted = pool.select_master(&mut Worker::with_seed(0, 1)).unwrap();
        assert!(Arc::ptr_eq(&promoted, &b));
        assert_eq!(promoted.failure_count(), 1);
    }

    #[test]
    fn returning_node_is_revived() {
        let clock = Arc::new(ManualClock::at_secs(1_000));
        let pool = pool_with(pool_config(PoolMode::Cluster, &[("a:1", ServerRole::Master)]), clock.clone());
        let a = pool.server("a:1").unwrap();

        pool.update_topology(&[]);
        assert_eq!(pool.invalid_server_count(), 1);

        clock.advance_secs(10);
        let change = pool.update_topology(&[NodeSpec::new("a:1", ServerRole::Master)]);
        assert_eq!(change.revived, 1);
        assert_eq!(pool.invalid_server_count(), 0);
        assert!(Arc::ptr_eq(&pool.server("a:1").unwrap(), &a));
        assert!(a.online());
    }

    #[test]
    fn offline_node_spec_is_not_selected() {
        let clock = Arc::new(ManualClock::at_secs(1_000));
        let pool = pool_with(pool_config(PoolMode::Cluster, &[]), clock);
        pool.update_topology(&[NodeSpec::new("a:1", ServerRole::Master).offline()]);
        assert!(pool.select_master(&mut Worker::new(0)).is_none());
    }

    #[test]
    fn reader_follows_priorities() {
        let clock = Arc::new(ManualClock::at_secs(1_000));
        let mut config = pool_config(
            PoolMode::Cluster,
            &[("m:1", ServerRole::Master), ("s:1", ServerRole::StaticSlave), ("d:1", ServerRole::DynamicSlave)],
        );
        config.master_read_priority = 10;
        config.static_slave_read_priority = 0;
        config.dynamic_slave_read_priority = 90;
        let pool = pool_with(config, clock);
        let mut worker = Worker::with_seed(0, 7);

        assert_eq!(pool.select_reader(&mut worker).unwrap().addr(), "d:1");
        pool.server("d:1").unwrap().set_online(false);
        assert_eq!(pool.select_reader(&mut worker).unwrap().addr(), "m:1");
        pool.server("m:1").unwrap().set_online(false);
        assert!(pool.select_reader(&mut worker).is_none());
    }

    #[test]
    fn status_reports_servers_and_backlog() {
        let clock = Arc::new(ManualClock::at_secs(1_000));
        let pool = pool_with(pool_config(PoolMode::Standalone, &[("a:1", ServerRole::Master)]), clock);
        pool.update_topology(&[NodeSpec::new("b:1", ServerRole::Master)]);

        let status = pool.status();
        assert_eq!(status.invalid_servers, 1);
        assert_eq!(status.servers.len(), 1);
        assert_eq!(status.servers[0].addr, "b:1");
    }
}
