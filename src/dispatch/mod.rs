//! Request dispatch interface.
//!
//! # Data Flow
//! ```text
//! Worker (handler.rs)
//!     → pool.select_*(worker)            random source: worker.rand()
//!     → request sent on ServerConnection
//!     → pool.handle_response(worker, conn, req, res)
//!     → strategy bookkeeping
//!     → worker.deliver(conn, req, res)
//! ```
//!
//! # Design Decisions
//! - One dispatcher per worker; no shared RNG
//! - Messages are already decoded (message.rs)

pub mod handler;
pub mod message;

pub use handler::{Delivery, Dispatcher, Worker};
pub use message::{NodeSpec, Request, Response};
