//! Per-worker request dispatcher.
//!
//! Every worker thread owns one dispatcher. The pool borrows it for two
//! things: a random source for server selection, and the final delivery of
//! a response once pool bookkeeping is done.

use crate::dispatch::message::{Request, Response};
use crate::net::connection::ServerConnection;

/// Capability the pool needs from a dispatcher.
pub trait Dispatcher {
    /// Next pseudo-random value from the dispatcher's own generator.
    fn rand(&mut self) -> u32;

    /// Hand a response on towards the client.
    fn deliver(&mut self, conn: &ServerConnection, req: Request, res: Response);
}

/// A delivered response, kept for inspection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Delivery {
    pub server: String,
    pub request: Request,
    pub response: Response,
}

/// Default dispatcher: one per worker, independent RNG.
#[derive(Debug)]
pub struct Worker {
    id: usize,
    rng: fastrand::Rng,
    delivered: Vec<Delivery>,
}

impl Worker {
    pub fn new(id: usize) -> Self {
        Self {
            id,
            rng: fastrand::Rng::new(),
            delivered: Vec::new(),
        }
    }

    /// Worker with a fixed seed, for reproducible selection.
    pub fn with_seed(id: usize, seed: u64) -> Self {
        Self {
            id,
            rng: fastrand::Rng::with_seed(seed),
            delivered: Vec::new(),
        }
    }

    pub fn id(&self) -> usize {
        self.id
    }

    pub fn delivered(&self) -> &[Delivery] {
        &self.delivered
    }

    /// Drain delivered responses.
    pub fn take_delivered(&mut self) -> Vec<Delivery> {
        std::mem::take(&mut self.delivered)
    }
}

impl Dispatcher for Worker {
    fn rand(&mut self) -> u32 {
        self.rng.u32(..)
    }

    fn deliver(&mut self, conn: &ServerConnection, req: Request, res: Response) {
        tracing::trace!(worker = self.id, conn = %conn.id(), request = req.id, "Response delivered");
        self.delivered.push(Delivery {
            server: conn.server().addr().to_string(),
            request: req,
            response: res,
        });
    }
}
