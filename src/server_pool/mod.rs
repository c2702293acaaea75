//! Server pool subsystem.
//!
//! # Data Flow
//! ```text
//! Dispatcher needs a route
//!     → pool.rs (load topology snapshot, no lock)
//!     → select.rs (random pick with fallback, or cursor iteration)
//!     → server.rs (online / fail flags, lock-free reads)
//!
//! Backend response arrives
//!     → pool.rs handle_response (try-lock; skip on contention)
//!     → strategy.rs (standalone or cluster bookkeeping)
//!     → dispatcher.deliver
//!
//! Topology refresh
//!     → pool.rs refresh gate (CAS on last-refresh timestamp)
//!     → TopologyUpdate::apply under the update lock
//!     → topology.rs snapshot swapped in
//!     → removed servers → retire.rs queue
//!     → reclaim after grace period
//! ```
//!
//! # Design Decisions
//! - Selection never waits on the update lock
//! - Removed servers outlive in-flight references for a grace period
//! - Deployment mode fixes the response strategy at construction

pub mod pool;
pub mod retire;
pub mod select;
pub mod server;
pub mod strategy;
pub mod topology;

pub use pool::{PoolStatus, ResponseOutcome, ServerPool, TopologyChange, TopologyUpdate};
pub use retire::ReclaimReport;
pub use server::{Server, ServerRole};
pub use topology::Topology;
