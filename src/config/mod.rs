//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → ProxyConfig (validated, immutable)
//!     → ServerPoolConfig installed into the pool at construction
//! ```
//!
//! # Design Decisions
//! - Config is immutable once installed; the pool never reloads it
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use schema::ProxyConfig;
pub use schema::ServerPoolConfig;
pub use schema::ReclaimConfig;
pub use schema::MaintenanceConfig;
pub use schema::ObservabilityConfig;
pub use schema::PoolMode;
pub use schema::SeedConfig;
