//! Manager configuration

use serde::{Deserialize, Serialize};

/// Tunables of the transaction manager
///
/// Defaults suit tests and the interactive shell; services override
/// `max_retries` per unit of work where needed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManagerConfig {
    /// Attempts the retry helper makes before giving up
    #[serde(default = "default_max_retries")]
    pub max_retries: usize,
    /// Version-log entry count that triggers opportunistic GC after commit
    #[serde(default = "default_gc_threshold")]
    pub version_gc_threshold: usize,
    /// Microseconds the timestamp oracle advances past the last issued value
    /// when the wall clock stands still
    #[serde(default = "default_timestamp_stride")]
    pub timestamp_stride_micros: u64,
}

fn default_max_retries() -> usize {
    3
}

fn default_gc_threshold() -> usize {
    1024
}

fn default_timestamp_stride() -> u64 {
    1
}

impl Default for ManagerConfig {
    fn default() -> Self {
        ManagerConfig {
            max_retries: default_max_retries(),
            version_gc_threshold: default_gc_threshold(),
            timestamp_stride_micros: default_timestamp_stride(),
        }
    }
}
