//! Retirement queue for servers removed from the active topology.
//!
//! A removed server may still be referenced by requests issued before the
//! removal. Its record waits here for a grace period before the pool
//! closes it and drops its owning reference.
//!
//! Mutated only under the pool's update lock.

use std::sync::Arc;
use serde::Serialize;
use crate::clock::secs_i64;
use crate::config::ReclaimConfig;
use crate::observability::metrics;
use crate::server_pool::server::Server;

/// A server removed from the topology at `invalidated_at` (wall-clock secs).
#[derive(Debug, Clone)]
pub struct RetiredServer {
    pub server: Arc<Server>,
    pub invalidated_at: i64,
}

/// Outcome of one reclamation pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReclaimReport {
    /// Records still waiting after the pass.
    pub pending: usize,
    /// Addresses destroyed by this pass.
    pub reclaimed: Vec<String>,
    /// Whether this pass emitted the backlog summary.
    pub reported: bool,
}

#[derive(Debug)]
pub struct RetirementQueue {
    records: Vec<RetiredServer>,
    last_report: i64,
}

impl RetirementQueue {
    /// Empty queue; the first backlog report is due one interval after `now`.
    pub fn new(now: i64) -> Self {
        Self {
            records: Vec::new(),
            last_report: now,
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn retire(&mut self, server: Arc<Server>, now: i64) {
        self.records.push(RetiredServer {
            server,
            invalidated_at: now,
        });
    }

    /// Take back a server that rejoined the topology before destruction.
    pub fn revive(&mut self, addr: &str) -> Option<Arc<Server>> {
        let idx = self.records.iter().position(|r| r.server.addr() == addr)?;
        Some(self.records.swap_remove(idx).server)
    }

    pub fn records(&self) -> &[RetiredServer] {
        &self.records
    }

    /// Log the backlog, then destroy records older than the grace period.
    ///
    /// Each half runs only when its toggle is on. Destruction compacts by
    /// moving the last live record into the freed slot and truncates the
    /// tail once at the end, so survivors may change order.
    pub fn reclaim(&mut self, now: i64, config: &ReclaimConfig) -> ReclaimReport {
        let reported =
            config.collect_stats && now.saturating_sub(self.last_report) > secs_i64(config.report_interval_secs);
        if reported {
            tracing::warn!(invalid_servers = self.records.len(), "invalid servers");
            self.last_report = now;
        }

        let mut reclaimed = Vec::new();
        if config.enabled && !self.is_empty() {
            let grace = secs_i64(config.grace_period_secs);
            let mut live = self.records.len();
            for i in (0..self.records.len()).rev() {
                if now.saturating_sub(self.records[i].invalidated_at) <= grace {
                    continue;
                }
                let record = &self.records[i];
                let role = record.server.role().label();
                tracing::warn!(role, addr = %record.server.addr(), "free {} server {}", role, record.server.addr());
                record.server.close();
                metrics::record_server_reclaimed(role);
                reclaimed.push(record.server.addr().to_string());

                live -= 1;
                if i < live {
                    self.records.swap(i, live);
                }
            }
            self.records.truncate(live);
        }

        ReclaimReport {
            pending: self.records.len(),
            reclaimed,
            reported,
        }
    }
}
