//! Backend server pool for a clustered key-value proxy.
//!
//! Tracks role and health of every backend node, selects servers for
//! requests, throttles topology refresh, and reclaims removed servers only
//! after in-flight requests can no longer reference them.

pub mod clock;
pub mod config;
pub mod dispatch;
pub mod health;
pub mod lifecycle;
pub mod net;
pub mod observability;
pub mod server_pool;

pub use config::schema::ProxyConfig;
pub use lifecycle::Shutdown;
pub use server_pool::ServerPool;
