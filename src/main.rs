//! Server pool daemon.
//!
//! Loads the configuration, seeds the pool and keeps its topology and
//! retirement queue maintained until interrupted.
//!
//! ```text
//!     worker dispatchers ──select──▶ ┌──────────────────────┐
//!                                    │      ServerPool      │
//!     backend responses ──handle──▶  │  topology snapshot   │◀── maintenance
//!                                    │  retirement queue    │    (refresh gate,
//!                                    └──────────────────────┘     reclaim)
//! ```

use std::path::PathBuf;
use std::sync::Arc;
use clap::Parser;
use thiserror::Error;

use server_pool::config::loader::{load_config, ConfigError};
use server_pool::config::{PoolMode, ProxyConfig};
use server_pool::lifecycle::{MaintenanceTask, Shutdown, StaticTopology, TopologySource};
use server_pool::observability::{logging, metrics};
use server_pool::ServerPool;

#[derive(Parser)]
#[command(name = "server-pool")]
#[command(about = "Backend server pool for a clustered key-value proxy", long_about = None)]
struct Cli {
    /// TOML configuration file. Defaults apply when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the configured log level.
    #[arg(short, long)]
    log_level: Option<String>,

    /// Print the pool status as JSON after shutdown (Ctrl-C).
    #[arg(long)]
    status_on_exit: bool,
}

#[derive(Debug, Error)]
enum StartupError {
    #[error("failed to load config: {0}")]
    Config(#[from] ConfigError),

    #[error("failed to wait for shutdown signal: {0}")]
    Signal(#[from] std::io::Error),

    #[error("failed to render status: {0}")]
    Status(#[from] serde_json::Error),
}

#[tokio::main]
async fn main() -> Result<(), StartupError> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => load_config(path)?,
        None => ProxyConfig::default(),
    };

    let level = cli.log_level.as_deref().unwrap_or(&config.observability.log_level);
    logging::init_logging(level);

    tracing::info!("server-pool v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        mode = ?config.pool.mode,
        seeds = config.pool.servers.len(),
        databases = config.pool.databases,
        keepalive = config.pool.keepalive,
        reclaim_enabled = config.reclaim.enabled,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let pool = Arc::new(ServerPool::from_config(&config));
    if pool.topology().is_empty() {
        tracing::warn!(mode = pool.strategy_name(), "Server pool starts with no servers");
    }

    // Cluster topology arrives as node listings through handle_response.
    let source: Option<Arc<dyn TopologySource>> = match config.pool.mode {
        PoolMode::Standalone => Some(Arc::new(StaticTopology::from_config(&config.pool))),
        PoolMode::Cluster => None,
    };

    let shutdown = Shutdown::new();
    let maintenance = MaintenanceTask::new(pool.clone(), source, &config.maintenance);
    let handle = tokio::spawn(maintenance.run(shutdown.subscribe()));

    tokio::signal::ctrl_c().await?;
    tracing::info!("Interrupt received, shutting down");
    shutdown.trigger();
    let _ = handle.await;

    if cli.status_on_exit {
        println!("{}", serde_json::to_string_pretty(&pool.status())?);
    }

    tracing::info!("Shutdown complete");
    Ok(())
}
