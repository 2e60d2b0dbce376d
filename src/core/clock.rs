//! Clock abstraction.
//!
//! Window boundaries are computed against an injected clock so they are
//! testable without wall-clock sleeps.

use crate::core::types::{now, Timestamp};
use std::sync::RwLock;

/// Source of the current time.
pub trait Clock: Send + Sync {
    /// Current UTC timestamp.
    fn now(&self) -> Timestamp;
}

/// Wall-clock implementation.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Timestamp {
        now()
    }
}

/// Manually controlled clock for tests.
pub struct ManualClock {
    current: RwLock<Timestamp>,
}

impl ManualClock {
    /// Create a clock frozen at the given instant.
    pub fn new(start: Timestamp) -> Self {
        Self {
            current: RwLock::new(start),
        }
    }

    /// Set the current instant.
    pub fn set(&self, ts: Timestamp) {
        *self.current.write().unwrap() = ts;
    }

    /// Advance by whole seconds.
    pub fn advance_seconds(&self, seconds: i64) {
        let mut current = self.current.write().unwrap();
        *current += chrono::Duration::seconds(seconds);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Timestamp {
        *self.current.read().unwrap()
    }
}
