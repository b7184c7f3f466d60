//! Per-actor dispatch counters.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

/// Snapshot of one actor's counters. Child windows share their leader's.
///
/// After the actor has terminated,
/// `user_msg_sent == user_msg_handled + user_msg_dropped`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DispatchStats {
    pub dispatched: u64,
    pub stale_dropped: u64,
    pub invalid_target: u64,
    pub handler_errors: u64,
    pub frames_presented: u64,
    pub user_msg_sent: u64,
    pub user_msg_send_failed: u64,
    pub user_msg_handled: u64,
    pub user_msg_dropped: u64,
}

#[derive(Debug, Default)]
pub(crate) struct StatsCounters {
    pub dispatched: AtomicU64,
    pub stale_dropped: AtomicU64,
    pub invalid_target: AtomicU64,
    pub handler_errors: AtomicU64,
    pub frames_presented: AtomicU64,
    pub user_msg_sent: AtomicU64,
    pub user_msg_send_failed: AtomicU64,
    pub user_msg_handled: AtomicU64,
    pub user_msg_dropped: AtomicU64,
}

pub(crate) fn bump(counter: &AtomicU64) {
    counter.fetch_add(1, Ordering::Relaxed);
}

/// Take back a [`bump`] made ahead of an outcome that did not happen.
pub(crate) fn unbump(counter: &AtomicU64) {
    counter.fetch_sub(1, Ordering::Relaxed);
}

impl StatsCounters {
    pub fn snapshot(&self) -> DispatchStats {
        let get = |c: &AtomicU64| c.load(Ordering::Relaxed);
        DispatchStats {
            dispatched: get(&self.dispatched),
            stale_dropped: get(&self.stale_dropped),
            invalid_target: get(&self.invalid_target),
            handler_errors: get(&self.handler_errors),
            frames_presented: get(&self.frames_presented),
            user_msg_sent: get(&self.user_msg_sent),
            user_msg_send_failed: get(&self.user_msg_send_failed),
            user_msg_handled: get(&self.user_msg_handled),
            user_msg_dropped: get(&self.user_msg_dropped),
        }
    }
}
