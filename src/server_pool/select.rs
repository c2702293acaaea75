//! Server selection over a candidate list.
//!
//! Both functions only read server flags; they never touch the pool's
//! update lock.

use std::sync::Arc;
use crate::dispatch::Dispatcher;
use crate::server_pool::server::Server;

/// Pick a server starting from a random index and scanning round-robin.
///
/// Offline servers are skipped. The first online server outside its
/// failure window wins. Failing-but-online servers are remembered as a
/// fallback (last one seen) and returned only when the full scan finds
/// nothing healthy. `None` means no candidate is online.
pub fn select_random(dispatcher: &mut dyn Dispatcher, candidates: &[Arc<Server>]) -> Option<Arc<Server>> {
    let len = candidates.len();
    if len == 0 {
        return None;
    }

    let start = dispatcher.rand() as usize % len;
    let mut fallback = None;

    for i in 0..len {
        let server = &candidates[(start + i) % len];
        if !server.online() {
            continue;
        }
        if server.fail() {
            fallback = Some(server);
        } else {
            return Some(server.clone());
        }
    }
    fallback.cloned()
}

/// Forward-only scan from `cursor`, returning the next online server.
///
/// The cursor is left one past the returned server. An out-of-range cursor
/// returns `None` and is not modified.
pub fn iterate(candidates: &[Arc<Server>], cursor: &mut isize) -> Option<Arc<Server>> {
    let size = candidates.len() as isize;
    if *cursor < 0 || *cursor >= size {
        return None;
    }

    while *cursor < size {
        let server = &candidates[*cursor as usize];
        *cursor += 1;
        if server.online() {
            return Some(server.clone());
        }
    }
    None
}
