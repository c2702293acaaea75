//! Response-handling strategies, one per deployment mode.
//!
//! The strategy is chosen once when the pool is built. It always runs with
//! the update lock held, so it may change the topology through the
//! [`TopologyUpdate`] it receives.

use std::fmt;
use crate::config::PoolMode;
use crate::dispatch::{Dispatcher, Request, Response};
use crate::health::passive;
use crate::net::ServerConnection;
use crate::server_pool::pool::TopologyUpdate;
use crate::server_pool::server::ServerRole;

pub trait ResponseStrategy: Send + Sync + fmt::Debug {
    fn name(&self) -> &'static str;

    fn handle(
        &self,
        update: &mut TopologyUpdate<'_>,
        dispatcher: &mut dyn Dispatcher,
        conn: &ServerConnection,
        req: Request,
        res: Response,
    );
}

/// Strategy for a deployment mode.
pub fn for_mode(mode: PoolMode) -> Box<dyn ResponseStrategy> {
    match mode {
        PoolMode::Standalone => Box::new(Standalone),
        PoolMode::Cluster => Box::new(Cluster),
    }
}

/// Single master, no slot routing. Topology never changes from responses.
#[derive(Debug, Default, Clone, Copy)]
pub struct Standalone;

impl ResponseStrategy for Standalone {
    fn name(&self) -> &'static str {
        "standalone"
    }

    fn handle(
        &self,
        _update: &mut TopologyUpdate<'_>,
        dispatcher: &mut dyn Dispatcher,
        conn: &ServerConnection,
        req: Request,
        res: Response,
    ) {
        passive::observe(conn.server(), &res);
        if let Response::Nodes(_) = res {
            tracing::debug!(addr = %conn.server().addr(), "Ignoring node listing in standalone mode");
        }
        dispatcher.deliver(conn, req, res);
    }
}

/// Cluster-aware routing: node listings and redirections feed the topology.
#[derive(Debug, Default, Clone, Copy)]
pub struct Cluster;

impl ResponseStrategy for Cluster {
    fn name(&self) -> &'static str {
        "cluster"
    }

    fn handle(
        &self,
        update: &mut TopologyUpdate<'_>,
        dispatcher: &mut dyn Dispatcher,
        conn: &ServerConnection,
        req: Request,
        res: Response,
    ) {
        passive::observe(conn.server(), &res);
        match &res {
            Response::Nodes(nodes) => {
                let change = update.apply(nodes);
                tracing::info!(
                    source = %conn.server().addr(),
                    added = change.added,
                    updated = change.updated,
                    revived = change.revived,
                    retired = change.retired,
                    "Cluster topology applied"
                );
            }
            Response::Moved { slot, addr } => {
                if update.pool().server(addr).is_none() {
                    tracing::info!(slot, addr = %addr, "Redirected to unknown node, adding master");
                    update.add_server(addr, ServerRole::Master);
                }
            }
            _ => {}
        }
        dispatcher.deliver(conn, req, res);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mode_picks_strategy() {
        assert_eq!(for_mode(PoolMode::Standalone).name(), "standalone");
        assert_eq!(for_mode(PoolMode::Cluster).name(), "cluster");
    }
}
