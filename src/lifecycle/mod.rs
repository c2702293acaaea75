//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (main.rs):
//!     Load config → Validate → Build pool from seeds → Spawn maintenance
//!
//! Maintenance (maintenance.rs):
//!     Tick → refresh gate → topology source → apply
//!          → reclaim retired servers
//!
//! Shutdown (shutdown.rs):
//!     Ctrl-C → trigger → maintenance loop exits
//! ```
//!
//! # Design Decisions
//! - Maintenance is the only caller that blocks on the update lock
//! - Shutdown is level-triggered; late subscribers still see it

pub mod maintenance;
pub mod shutdown;

pub use maintenance::{MaintenanceTask, StaticTopology, TickReport, TopologySource};
pub use shutdown::{Shutdown, ShutdownSignal};
