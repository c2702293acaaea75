//! Health tracking subsystem.
//!
//! # Data Flow
//! ```text
//! Passive checks (passive.rs):
//!     Response observed by the pool's strategy
//!     → classify (backend fault or not)
//!     → update state.rs counters on the Server
//!
//! State machine (state.rs):
//!     Healthy ←→ Failing (backoff window)
//!
//! Online/offline flags are set by the topology refresh and by the
//! connection layer; they are not derived here.
//! ```
//!
//! # Design Decisions
//! - Counters are lock-free atomics; readers tolerate stale values
//! - A failing server remains a selection fallback
//! - Health state is per-server, not per-pool

pub mod passive;
pub mod state;
