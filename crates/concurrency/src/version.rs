//! Multiversion storage
//!
//! Per resource, an append-only list of versions stamped with the writer's
//! start timestamp. Snapshot reads see the newest committed version at or
//! before their timestamp; uncommitted versions become visible when the
//! writer commits and vanish when it aborts. A transaction's own uncommitted
//! writes are NOT read through this path: own-writes go through the store,
//! which the manager mutates eagerly.

use parking_lot::Mutex;
use rustc_hash::FxHashMap;
use tandem_core::{ResourceId, Row, Timestamp, TxnId};

/// One version of a resource
#[derive(Debug, Clone)]
pub struct VersionEntry {
    /// Row state at `write_ts`; `None` is a delete tombstone
    pub value: Option<Row>,
    /// The writer's start timestamp
    pub write_ts: Timestamp,
    /// Which transaction wrote this version
    pub writer: TxnId,
    /// Flipped true when the writer commits
    pub committed: bool,
}

/// Version histories for every written resource
pub struct VersionLog {
    inner: Mutex<FxHashMap<ResourceId, Vec<VersionEntry>>>,
}

impl VersionLog {
    /// Create an empty log
    pub fn new() -> Self {
        VersionLog {
            inner: Mutex::new(FxHashMap::default()),
        }
    }

    /// Snapshot read: newest committed version with `write_ts <= ts`
    ///
    /// Returns `None` both for a tombstone and for a resource with no
    /// visible version; to a snapshot reader the two are the same.
    pub fn read(&self, resource: &ResourceId, ts: Timestamp) -> Option<Row> {
        let inner = self.inner.lock();
        inner
            .get(resource)?
            .iter()
            .filter(|v| v.committed && v.write_ts <= ts)
            .max_by_key(|v| v.write_ts)
            .and_then(|v| v.value.clone())
    }

    /// Append an uncommitted version
    pub fn write(&self, resource: &ResourceId, value: Option<Row>, ts: Timestamp, writer: TxnId) {
        let mut inner = self.inner.lock();
        inner
            .entry(resource.clone())
            .or_default()
            .push(VersionEntry {
                value,
                write_ts: ts,
                writer,
                committed: false,
            });
    }

    /// Mark every version of `resource` authored by `writer` committed
    pub fn commit(&self, resource: &ResourceId, writer: TxnId) {
        let mut inner = self.inner.lock();
        if let Some(versions) = inner.get_mut(resource) {
            for v in versions.iter_mut().filter(|v| v.writer == writer) {
                v.committed = true;
            }
        }
    }

    /// Erase every version of `resource` authored by `writer`
    pub fn abort(&self, resource: &ResourceId, writer: TxnId) {
        let mut inner = self.inner.lock();
        let emptied = match inner.get_mut(resource) {
            Some(versions) => {
                versions.retain(|v| v.writer != writer);
                versions.is_empty()
            }
            None => false,
        };
        if emptied {
            inner.remove(resource);
        }
    }

    /// Drop committed versions no live transaction can still read
    ///
    /// Conservative policy: per resource keep every uncommitted version,
    /// every version newer than `horizon`, and the youngest committed
    /// version at or before `horizon` (a reader positioned exactly at the
    /// horizon resolves to that one). Returns the number of pruned entries.
    pub fn gc(&self, horizon: Timestamp) -> usize {
        let mut inner = self.inner.lock();
        let mut pruned = 0;
        for versions in inner.values_mut() {
            let floor = versions
                .iter()
                .filter(|v| v.committed && v.write_ts <= horizon)
                .map(|v| v.write_ts)
                .max();
            let before = versions.len();
            versions
                .retain(|v| !v.committed || v.write_ts > horizon || Some(v.write_ts) == floor);
            pruned += before - versions.len();
        }
        pruned
    }

    /// Number of resources with at least one version
    pub fn resource_count(&self) -> usize {
        self.inner.lock().len()
    }

    /// Total number of version entries
    pub fn version_count(&self) -> usize {
        self.inner.lock().values().map(Vec::len).sum()
    }

    /// Number of uncommitted entries authored by `writer`, across resources
    pub fn uncommitted_by(&self, writer: TxnId) -> usize {
        self.inner
            .lock()
            .values()
            .flat_map(|vs| vs.iter())
            .filter(|v| v.writer == writer && !v.committed)
            .count()
    }
}

impl Default for VersionLog {
    fn default() -> Self {
        Self::new()
    }
}
