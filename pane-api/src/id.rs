//! Process-wide instance identifiers.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// Unique identifier for a display, window, sheet or widget.
///
/// Ids are never reused within a process, so a stale id resolves to
/// "not found" rather than to a different object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct InstanceId(pub u64);

impl InstanceId {
    /// Id that never names a live object.
    pub const NONE: InstanceId = InstanceId(0);

    pub fn raw(self) -> u64 {
        self.0
    }
}

impl fmt::Display for InstanceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Counter for generating unique instance IDs.
static INSTANCE_ID_COUNTER: AtomicU64 = AtomicU64::new(1);

/// Generate a new unique instance ID.
pub fn next_instance_id() -> InstanceId {
    InstanceId(INSTANCE_ID_COUNTER.fetch_add(1, Ordering::SeqCst))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_are_monotonic() {
        let a = next_instance_id();
        let b = next_instance_id();
        assert!(b > a);
        assert_ne!(a, InstanceId::NONE);
    }
}
