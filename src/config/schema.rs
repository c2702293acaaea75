//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the pool.
//! All types derive Serde traits for deserialization from config files.

use std::time::Duration;
use serde::{Deserialize, Serialize};
use crate::server_pool::server::ServerRole;

/// Root configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ProxyConfig {
    /// Server pool settings, installed once at pool construction.
    pub pool: ServerPoolConfig,

    /// Deferred reclamation of retired servers.
    pub reclaim: ReclaimConfig,

    /// Background maintenance loop.
    pub maintenance: MaintenanceConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Deployment mode. Selects the response-handling strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum PoolMode {
    /// A single master with optional slaves, no slot routing.
    Standalone,
    /// Cluster-aware routing; topology is learned from responses.
    #[default]
    Cluster,
}

/// Immutable server pool settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ServerPoolConfig {
    pub mode: PoolMode,

    /// Credential sent by connections during their handshake.
    pub password: String,

    /// Read weights per role. Zero removes the role from reads.
    pub master_read_priority: u32,
    pub static_slave_read_priority: u32,
    pub dynamic_slave_read_priority: u32,

    /// Minimum spacing between two topology refreshes.
    pub refresh_interval_ms: u64,

    /// Per-request timeout enforced by connections. Zero disables it.
    pub server_timeout_ms: u64,

    /// Consecutive failures before a server enters its backoff window.
    pub server_failure_limit: u32,

    /// Length of the backoff window after the last failure.
    pub server_retry_timeout_ms: u64,

    pub keepalive: bool,

    /// Number of logical databases exposed by each backend.
    pub databases: u32,

    /// Seed nodes.
    pub servers: Vec<SeedConfig>,
}

impl Default for ServerPoolConfig {
    fn default() -> Self {
        Self {
            mode: PoolMode::default(),
            password: String::new(),
            master_read_priority: 60,
            static_slave_read_priority: 50,
            dynamic_slave_read_priority: 50,
            refresh_interval_ms: 1000,
            server_timeout_ms: 0,
            server_failure_limit: 10,
            server_retry_timeout_ms: 1000,
            keepalive: false,
            databases: 1,
            servers: Vec::new(),
        }
    }
}

impl ServerPoolConfig {
    pub fn refresh_interval(&self) -> Duration {
        Duration::from_millis(self.refresh_interval_ms)
    }

    pub fn server_timeout(&self) -> Option<Duration> {
        (self.server_timeout_ms > 0).then(|| Duration::from_millis(self.server_timeout_ms))
    }

    pub fn server_retry_timeout(&self) -> Duration {
        Duration::from_millis(self.server_retry_timeout_ms)
    }

    /// Read weight configured for a role.
    pub fn read_priority(&self, role: ServerRole) -> u32 {
        match role {
            ServerRole::Master => self.master_read_priority,
            ServerRole::StaticSlave => self.static_slave_read_priority,
            ServerRole::DynamicSlave => self.dynamic_slave_read_priority,
        }
    }
}

/// A seed node listed in the config file.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SeedConfig {
    /// Address, e.g. "127.0.0.1:7000".
    pub addr: String,

    #[serde(default = "default_seed_role")]
    pub role: ServerRole,
}

fn default_seed_role() -> ServerRole {
    ServerRole::Master
}

/// Retirement queue settings.
///
/// The two halves are independent: backlog statistics can be logged while
/// physical destruction stays off, which is the default.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ReclaimConfig {
    /// Log the pending backlog at most once per `report_interval_secs`.
    pub collect_stats: bool,

    /// Destroy retired servers once their grace period has elapsed.
    pub enabled: bool,

    /// Minimum age of a retirement record before destruction.
    pub grace_period_secs: u64,

    pub report_interval_secs: u64,
}

impl Default for ReclaimConfig {
    fn default() -> Self {
        Self {
            collect_stats: true,
            enabled: false,
            grace_period_secs: 300,
            report_interval_secs: 60,
        }
    }
}

/// Maintenance loop configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct MaintenanceConfig {
    /// Tick interval in milliseconds.
    pub interval_ms: u64,
}

impl Default for MaintenanceConfig {
    fn default() -> Self {
        Self { interval_ms: 1000 }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}
