//! Backend connection layer (pool-facing surface).
//!
//! # Data Flow
//! ```text
//! pool selects Server
//!     → connection.rs (ServerConnection bound to that Server)
//!     → request written / response read by the connection layer
//!     → response routed back through the pool
//! ```

pub mod connection;

pub use connection::{ConnectionId, ServerConnection};
