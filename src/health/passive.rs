//! Passive health checking from observed responses.
//!
//! # Design Decisions
//! - Only backend-side fault replies count as failures
//! - Command errors (`ERR`, `WRONGTYPE`, ...) prove the server is alive
//! - Redirections and topology listings count as successes

use crate::dispatch::Response;
use crate::server_pool::server::Server;

/// Error prefixes that mean the backend itself cannot serve right now.
const BACKEND_FAULTS: &[&str] = &["LOADING", "CLUSTERDOWN", "MASTERDOWN", "TRYAGAIN", "BUSY", "READONLY"];

/// Classification of a single response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Success,
    Failure,
}

pub fn classify(res: &Response) -> Outcome {
    match res {
        Response::Error(msg) if is_backend_fault(msg) => Outcome::Failure,
        _ => Outcome::Success,
    }
}

fn is_backend_fault(msg: &str) -> bool {
    let code = msg.split_whitespace().next().unwrap_or("");
    BACKEND_FAULTS.contains(&code)
}

/// Classify a response and update the server's failure state.
pub fn observe(server: &Server, res: &Response) -> Outcome {
    let outcome = classify(res);
    match outcome {
        Outcome::Success => server.record_success(),
        Outcome::Failure => {
            tracing::debug!(addr = %server.addr(), response = ?res, "Backend fault reply");
            server.record_failure();
        }
    }
    outcome
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::server_pool::server::ServerRole;

    #[test]
    fn command_errors_are_not_failures() {
        assert_eq!(classify(&Response::Error("ERR unknown command".into())), Outcome::Success);
        assert_eq!(classify(&Response::Error("WRONGTYPE Operation".into())), Outcome::Success);
        assert_eq!(classify(&Response::Reply("OK".into())), Outcome::Success);
    }

    #[test]
    fn backend_faults_are_failures() {
        assert_eq!(classify(&Response::Error("LOADING dataset in memory".into())), Outcome::Failure);
        assert_eq!(classify(&Response::Error("CLUSTERDOWN The cluster is down".into())), Outcome::Failure);
        assert_eq!(classify(&Response::Error("READONLY".into())), Outcome::Failure);
    }

    #[test]
    fn observe_updates_counters() {
        let server = Server::with_defaults("127.0.0.1:7000", ServerRole::Master);
        observe(&server, &Response::Error("TRYAGAIN".into()));
        observe(&server, &Response::Error("BUSY script".into()));
        assert_eq!(server.failure_count(), 2);
        observe(&server, &Response::Reply("PONG".into()));
        assert_eq!(server.failure_count(), 0);
    }
}
