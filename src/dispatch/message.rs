//! Decoded requests and responses exchanged between dispatchers and the
//! pool. Wire encoding lives in the protocol layer; the pool only sees
//! these values.

use serde::{Deserialize, Serialize};
use crate::server_pool::server::ServerRole;

/// A request forwarded to a backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    pub id: u64,
    pub command: String,
}

impl Request {
    pub fn new(id: u64, command: impl Into<String>) -> Self {
        Self {
            id,
            command: command.into(),
        }
    }
}

/// A decoded backend response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Response {
    /// Any ordinary reply.
    Reply(String),
    /// Error reply from the backend.
    Error(String),
    /// Redirection to another node that owns the key.
    Moved { slot: u16, addr: String },
    /// Cluster node listing, as returned by a topology query.
    Nodes(Vec<NodeSpec>),
}

/// One node in a topology listing.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct NodeSpec {
    pub addr: String,
    pub role: ServerRole,
    #[serde(default = "default_online")]
    pub online: bool,
}

fn default_online() -> bool {
    true
}

impl NodeSpec {
    pub fn new(addr: impl Into<String>, role: ServerRole) -> Self {
        Self {
            addr: addr.into(),
            role,
            online: true,
        }
    }

    pub fn offline(mut self) -> Self {
        self.online = false;
        self
    }
}
