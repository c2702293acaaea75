//! Backend connection identity.
//!
//! # Responsibilities
//! - Generate unique connection IDs for tracing
//! - Tie a connection handle to the server it talks to
//!
//! Socket I/O, protocol framing and authentication are owned by the
//! connection layer; the pool only needs to know which server answered.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use crate::server_pool::server::Server;

/// Global atomic counter for connection IDs.
/// Using relaxed ordering is sufficient since we only need uniqueness, not synchronization.
static CONNECTION_ID_COUNTER: AtomicU64 = AtomicU64::new(1);

/// Unique identifier for a backend connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(u64);

impl ConnectionId {
    pub fn next() -> Self {
        Self(CONNECTION_ID_COUNTER.fetch_add(1, Ordering::Relaxed))
    }

    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "srv-conn-{}", self.0)
    }
}

/// Outbound connection handle to one server.
///
/// Holds its own reference to the server, so a connection that outlives
/// the server's removal from the topology still reads a valid record.
#[derive(Debug, Clone)]
pub struct ServerConnection {
    id: ConnectionId,
    server: Arc<Server>,
}

impl ServerConnection {
    pub fn new(server: Arc<Server>) -> Self {
        Self {
            id: ConnectionId::next(),
            server,
        }
    }

    pub fn id(&self) -> ConnectionId {
        self.id
    }

    pub fn server(&self) -> &Arc<Server> {
        &self.server
    }
}
