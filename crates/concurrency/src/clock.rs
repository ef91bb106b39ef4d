//! Timestamp allocation
//!
//! Start timestamps double as version stamps, so they must be unique and
//! strictly monotonic process-wide. The oracle tracks the wall clock on a
//! microsecond scale but never moves backwards: under clock skew or bursts of
//! allocations inside one microsecond it advances by a fixed stride instead.

use parking_lot::Mutex;
use std::time::{SystemTime, UNIX_EPOCH};
use tandem_core::Timestamp;

/// Current wall-clock time in microseconds since the Unix epoch
pub fn now_micros() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_micros() as u64)
        .unwrap_or(0)
}

/// Serialized allocator of unique monotonic timestamps
pub struct TimestampOracle {
    last: Mutex<u64>,
    stride: u64,
}

impl TimestampOracle {
    /// Create an oracle advancing by `stride` microseconds past the last
    /// issued value whenever the wall clock has not moved
    pub fn new(stride: u64) -> Self {
        TimestampOracle {
            last: Mutex::new(0),
            stride: stride.max(1),
        }
    }

    /// Issue the next timestamp: `max(last + stride, wall_now)`
    pub fn issue(&self) -> Timestamp {
        let mut last = self.last.lock();
        let next = (*last + self.stride).max(now_micros());
        *last = next;
        Timestamp(next)
    }

    /// The most recently issued timestamp, zero before the first issue
    pub fn last_issued(&self) -> Timestamp {
        Timestamp(*self.last.lock())
    }
}

impl Default for TimestampOracle {
    fn default() -> Self {
        TimestampOracle::new(1)
    }
}
