//! Immutable, role-partitioned view of the active servers.
//!
//! A new snapshot is built under the update lock and published with an
//! atomic pointer swap. Readers keep whatever snapshot they loaded until
//! they drop it.

use std::sync::Arc;
use serde::Serialize;
use crate::server_pool::server::{Server, ServerRole};

#[derive(Debug, Default, Clone)]
pub struct Topology {
    masters: Vec<Arc<Server>>,
    static_slaves: Vec<Arc<Server>>,
    dynamic_slaves: Vec<Arc<Server>>,
}

impl Topology {
    /// Partition servers by their current role, keeping input order.
    pub fn from_servers<I>(servers: I) -> Self
    where
        I: IntoIterator<Item = Arc<Server>>,
    {
        let mut topology = Self::default();
        for server in servers {
            match server.role() {
                ServerRole::Master => topology.masters.push(server),
                ServerRole::StaticSlave => topology.static_slaves.push(server),
                ServerRole::DynamicSlave => topology.dynamic_slaves.push(server),
            }
        }
        topology
    }

    pub fn masters(&self) -> &[Arc<Server>] {
        &self.masters
    }

    pub fn by_role(&self, role: ServerRole) -> &[Arc<Server>] {
        match role {
            ServerRole::Master => &self.masters,
            ServerRole::StaticSlave => &self.static_slaves,
            ServerRole::DynamicSlave => &self.dynamic_slaves,
        }
    }

    /// Every active server: masters, then static, then dynamic slaves.
    pub fn all(&self) -> impl Iterator<Item = &Arc<Server>> {
        self.masters
            .iter()
            .chain(self.static_slaves.iter())
            .chain(self.dynamic_slaves.iter())
    }

    pub fn len(&self) -> usize {
        self.masters.len() + self.static_slaves.len() + self.dynamic_slaves.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn contains(&self, addr: &str) -> bool {
        self.all().any(|s| s.addr() == addr)
    }

    pub fn summary(&self) -> Vec<ServerStatus> {
        self.all().map(|s| ServerStatus::of(s)).collect()
    }
}

/// Serializable point-in-time view of one server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ServerStatus {
    pub addr: String,
    pub role: ServerRole,
    pub online: bool,
    pub failing: bool,
    pub failures: u32,
}

impl ServerStatus {
    pub fn of(server: &Server) -> Self {
        Self {
            addr: server.addr().to_string(),
            role: server.role(),
            online: server.online(),
            failing: server.fail(),
            failures: server.failure_count(),
        }
    }
}
