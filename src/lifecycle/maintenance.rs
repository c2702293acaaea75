//! Periodic pool maintenance.
//!
//! Every tick with a topology source asks the refresh gate whether this
//! process is due for a refresh and applies whatever the source reports.
//! Without a source the gate is left to whoever issues the node query.
//! Every tick then runs the retirement queue.

use std::sync::Arc;
use std::time::Duration;
use tokio::time::{self, MissedTickBehavior};
use crate::config::{MaintenanceConfig, ServerPoolConfig};
use crate::dispatch::NodeSpec;
use crate::lifecycle::shutdown::ShutdownSignal;
use crate::server_pool::{ReclaimReport, ServerPool, TopologyChange};

/// Where refreshed topology comes from.
///
/// `None` means the source has nothing to apply right now, for example
/// when the node listing arrives later as a response.
pub trait TopologySource: Send + Sync {
    fn discover(&self) -> Option<Vec<NodeSpec>>;
}

/// Fixed node list, taken from the seed configuration.
#[derive(Debug, Clone, Default)]
pub struct StaticTopology {
    nodes: Vec<NodeSpec>,
}

impl StaticTopology {
    pub fn new(nodes: Vec<NodeSpec>) -> Self {
        Self { nodes }
    }

    pub fn from_config(config: &ServerPoolConfig) -> Self {
        Self::new(
            config
                .servers
                .iter()
                .map(|seed| NodeSpec::new(seed.addr.clone(), seed.role))
                .collect(),
        )
    }
}

impl TopologySource for StaticTopology {
    fn discover(&self) -> Option<Vec<NodeSpec>> {
        Some(self.nodes.clone())
    }
}

/// What one maintenance pass did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TickReport {
    /// Whether this pass consulted and won the refresh gate.
    pub refreshed: bool,
    /// Applied change, when the source had a node list.
    pub change: Option<TopologyChange>,
    pub reclaim: ReclaimReport,
}

pub struct MaintenanceTask {
    pool: Arc<ServerPool>,
    source: Option<Arc<dyn TopologySource>>,
    interval: Duration,
}

impl MaintenanceTask {
    pub fn new(pool: Arc<ServerPool>, source: Option<Arc<dyn TopologySource>>, config: &MaintenanceConfig) -> Self {
        Self {
            pool,
            source,
            interval: Duration::from_millis(config.interval_ms),
        }
    }

    /// Run a single maintenance pass.
    pub fn tick(&self) -> TickReport {
        let source = self.source.as_ref().filter(|_| self.pool.refresh());
        let refreshed = source.is_some();
        let mut change = None;
        if let Some(source) = source {
            match source.discover() {
                Some(nodes) => {
                    let applied = self.pool.update_topology(&nodes);
                    if applied != TopologyChange::default() {
                        tracing::info!(
                            added = applied.added,
                            updated = applied.updated,
                            revived = applied.revived,
                            retired = applied.retired,
                            "Topology refreshed"
                        );
                    }
                    change = Some(applied);
                }
                None => tracing::debug!("Refresh due, no node list available from source"),
            }
        }

        TickReport {
            refreshed,
            change,
            reclaim: self.pool.reclaim_invalid_servers(),
        }
    }

    pub async fn run(self, mut shutdown: ShutdownSignal) {
        tracing::info!(interval_ms = self.interval.as_millis() as u64, "Pool maintenance starting");

        let mut ticker = time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let report = self.tick();
                    if !report.reclaim.reclaimed.is_empty() {
                        tracing::info!(reclaimed = report.reclaim.reclaimed.len(), pending = report.reclaim.pending, "Retired servers reclaimed");
                    }
                }
                _ = shutdown.wait() => {
                    tracing::info!("Pool maintenance received shutdown signal, exiting loop");
                    break;
                }
            }
        }
    }
}
