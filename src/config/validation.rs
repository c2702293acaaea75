//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (intervals > 0, limits > 0)
//! - Detect malformed or duplicate seed addresses
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ProxyConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::collections::HashSet;
use std::net::SocketAddr;
use thiserror::Error;
use crate::config::schema::{PoolMode, ProxyConfig};
use crate::server_pool::server::ServerRole;

/// A single semantic problem found in a configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("seed address {0:?} is not a valid host:port")]
    InvalidSeedAddress(String),

    #[error("seed address {0} is listed more than once")]
    DuplicateSeed(String),

    #[error("{field} must be greater than zero")]
    ZeroValue { field: &'static str },

    #[error("standalone pool declares {0} master seeds, expected at most one")]
    MultipleStandaloneMasters(usize),
}

/// Check a parsed configuration for semantic problems.
pub fn validate_config(config: &ProxyConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();
    let pool = &config.pool;

    let mut seen = HashSet::new();
    for seed in &pool.servers {
        if seed.addr.parse::<SocketAddr>().is_err() && !is_host_port(&seed.addr) {
            errors.push(ValidationError::InvalidSeedAddress(seed.addr.clone()));
        } else if !seen.insert(seed.addr.as_str()) {
            errors.push(ValidationError::DuplicateSeed(seed.addr.clone()));
        }
    }

    let zero_checks: [(&'static str, bool); 6] = [
        ("pool.databases", pool.databases == 0),
        ("pool.refresh_interval_ms", pool.refresh_interval_ms == 0),
        ("pool.server_failure_limit", pool.server_failure_limit == 0),
        (
            "reclaim.grace_period_secs",
            config.reclaim.enabled && config.reclaim.grace_period_secs == 0,
        ),
        ("reclaim.report_interval_secs", config.reclaim.report_interval_secs == 0),
        ("maintenance.interval_ms", config.maintenance.interval_ms == 0),
    ];
    for (field, is_zero) in zero_checks {
        if is_zero {
            errors.push(ValidationError::ZeroValue { field });
        }
    }

    if pool.mode == PoolMode::Standalone {
        let masters = pool
            .servers
            .iter()
            .filter(|s| s.role == ServerRole::Master)
            .count();
        if masters > 1 {
            errors.push(ValidationError::MultipleStandaloneMasters(masters));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Accept `hostname:port` where the host is not an IP literal.
fn is_host_port(addr: &str) -> bool {
    match addr.rsplit_once(':') {
        Some((host, port)) => !host.is_empty() && port.parse::<u16>().is_ok(),
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::SeedConfig;

    fn seed(addr: &str, role: ServerRole) -> SeedConfig {
        SeedConfig { addr: addr.to_string(), role }
    }

    #[test]
    fn default_config_is_valid() {
        assert!(validate_config(&ProxyConfig::default()).is_ok());
    }

    #[test]
    fn hostname_seeds_are_accepted() {
        let mut config = ProxyConfig::default();
        config.pool.servers.push(seed("redis-0.cache:6379", ServerRole::Master));
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn reports_every_problem() {
        let mut config = ProxyConfig::default();
        config.pool.databases = 0;
        config.pool.refresh_interval_ms = 0;
        config.pool.servers.push(seed("nonsense", ServerRole::Master));
        config.pool.servers.push(seed("127.0.0.1:7000", ServerRole::Master));
        config.pool.servers.push(seed("127.0.0.1:7000", ServerRole::StaticSlave));

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 4);
        assert!(errors.contains(&ValidationError::InvalidSeedAddress("nonsense".into())));
        assert!(errors.contains(&ValidationError::DuplicateSeed("127.0.0.1:7000".into())));
        assert!(errors.contains(&ValidationError::ZeroValue { field: "pool.databases" }));
        assert!(errors.contains(&ValidationError::ZeroValue { field: "pool.refresh_interval_ms" }));
    }

    #[test]
    fn zero_grace_only_matters_when_reclaiming() {
        let mut config = ProxyConfig::default();
        config.reclaim.grace_period_secs = 0;
        assert!(validate_config(&config).is_ok());

        config.reclaim.enabled = true;
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors, vec![ValidationError::ZeroValue { field: "reclaim.grace_period_secs" }]);
    }

    #[test]
    fn standalone_allows_single_master() {
        let mut config = ProxyConfig::default();
        config.pool.mode = PoolMode::Standalone;
        config.pool.servers.push(seed("127.0.0.1:7000", ServerRole::Master));
        config.pool.servers.push(seed("127.0.0.1:7001", ServerRole::StaticSlave));
        assert!(validate_config(&config).is_ok());

        config.pool.servers.push(seed("127.0.0.1:7002", ServerRole::Master));
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors, vec![ValidationError::MultipleStandaloneMasters(2)]);
    }
}
