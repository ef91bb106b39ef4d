//! Concurrency controller
//!
//! Owns the timestamp oracle, the timestamp-ordering validation predicates,
//! and the wait-for graph. Validation only reports; the manager decides to
//! restart. Under the default restart-on-conflict policy nothing ever waits,
//! so the wait-for graph stays empty; it is maintained for lock-based
//! extensions and exercised through its public edge API.

use crate::clock::TimestampOracle;
use crate::registry::TransactionTable;
use crate::transaction::TransactionStatus;
use parking_lot::Mutex;
use rustc_hash::{FxHashMap, FxHashSet};
use tandem_core::{ResourceId, Timestamp, TxnId};

/// Validation, deadlock detection, and timestamp allocation
pub struct ConcurrencyController {
    oracle: TimestampOracle,
    waits_for: Mutex<FxHashMap<TxnId, FxHashSet<TxnId>>>,
}

impl ConcurrencyController {
    /// Create a controller with the given timestamp stride
    pub fn new(timestamp_stride: u64) -> Self {
        ConcurrencyController {
            oracle: TimestampOracle::new(timestamp_stride),
            waits_for: Mutex::new(FxHashMap::default()),
        }
    }

    /// Allocate the next unique monotonic timestamp
    pub fn issue_timestamp(&self) -> Timestamp {
        self.oracle.issue()
    }

    /// Validate a read of `resource` by the transaction at `subject_ts`
    ///
    /// Fails iff a younger transaction already claims an overlapping resource
    /// in its write set: the reader must observe a snapshot at its own start
    /// timestamp, and a younger writer would serialize the read after that
    /// write. Aborted transactions hold no claims. Returns the conflicting
    /// transaction on failure.
    pub fn validate_read(
        &self,
        table: &TransactionTable,
        subject: TxnId,
        subject_ts: Timestamp,
        resource: &ResourceId,
    ) -> Result<(), TxnId> {
        let mut conflict = None;
        table.for_each(|txn| {
            if conflict.is_none()
                && txn.tid != subject
                && txn.status != TransactionStatus::Aborted
                && txn.start_ts > subject_ts
                && txn.write_set.iter().any(|r| r.overlaps(resource))
            {
                conflict = Some(txn.tid);
            }
        });
        match conflict {
            Some(tid) => Err(tid),
            None => Ok(()),
        }
    }

    /// Validate a write of `resource` by the transaction at `subject_ts`
    ///
    /// Fails iff a younger transaction claims an overlapping resource in its
    /// read set or write set: the write would invalidate the younger read, or
    /// land under the younger write. Returns the conflicting transaction on
    /// failure.
    pub fn validate_write(
        &self,
        table: &TransactionTable,
        subject: TxnId,
        subject_ts: Timestamp,
        resource: &ResourceId,
    ) -> Result<(), TxnId> {
        let mut conflict = None;
        table.for_each(|txn| {
            if conflict.is_none()
                && txn.tid != subject
                && txn.status != TransactionStatus::Aborted
                && txn.start_ts > subject_ts
                && (txn.read_set.iter().any(|r| r.overlaps(resource))
                    || txn.write_set.iter().any(|r| r.overlaps(resource)))
            {
                conflict = Some(txn.tid);
            }
        });
        match conflict {
            Some(tid) => Err(tid),
            None => Ok(()),
        }
    }

    /// Record that `waiter` is blocked behind `holder`
    pub fn add_wait_edge(&self, waiter: TxnId, holder: TxnId) {
        self.waits_for
            .lock()
            .entry(waiter)
            .or_default()
            .insert(holder);
    }

    /// Drop every edge touching `tid`, in either direction
    pub fn remove_wait_edges(&self, tid: TxnId) {
        let mut graph = self.waits_for.lock();
        graph.remove(&tid);
        for targets in graph.values_mut() {
            targets.remove(&tid);
        }
    }

    /// Number of edges currently in the graph
    pub fn wait_edge_count(&self) -> usize {
        self.waits_for.lock().values().map(|targets| targets.len()).sum()
    }

    /// Look for a cycle in the wait-for graph
    ///
    /// Depth-first search over a snapshot of the graph. When a cycle is
    /// found, the victim is the youngest transaction (largest start
    /// timestamp) among the members of that cycle; aborting the youngest
    /// wastes the least completed work.
    pub fn detect_deadlock(&self, table: &TransactionTable) -> Option<TxnId> {
        let graph: FxHashMap<TxnId, FxHashSet<TxnId>> = self.waits_for.lock().clone();
        if graph.is_empty() {
            return None;
        }

        let mut visited: FxHashSet<TxnId> = FxHashSet::default();
        let mut nodes: Vec<TxnId> = graph.keys().copied().collect();
        nodes.sort_by_key(|tid| table.start_ts_of(*tid).unwrap_or(Timestamp(0)));

        for start in nodes {
            if visited.contains(&start) {
                continue;
            }
            let mut path: Vec<TxnId> = Vec::new();
            if let Some(cycle) = Self::find_cycle(&graph, start, &mut visited, &mut path) {
                let victim = cycle
                    .iter()
                    .copied()
                    .max_by_key(|tid| table.start_ts_of(*tid).unwrap_or(Timestamp(0)))?;
                tracing::warn!(
                    victim = %victim.short(),
                    cycle_len = cycle.len(),
                    "wait-for cycle detected"
                );
                return Some(victim);
            }
        }
        None
    }

    /// DFS returning the members of the first cycle reached from `node`
    fn find_cycle(
        graph: &FxHashMap<TxnId, FxHashSet<TxnId>>,
        node: TxnId,
        visited: &mut FxHashSet<TxnId>,
        path: &mut Vec<TxnId>,
    ) -> Option<Vec<TxnId>> {
        if let Some(pos) = path.iter().position(|t| *t == node) {
            return Some(path[pos..].to_vec());
        }
        if visited.contains(&node) {
            return None;
        }
        visited.insert(node);
        path.push(node);
        if let Some(targets) = graph.get(&node) {
            for next in targets {
                if let Some(cycle) = Self::find_cycle(graph, *next, visited, path) {
                    return Some(cycle);
                }
            }
        }
        path.pop();
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transaction::Transaction;

    fn register(table: &TransactionTable, client: &str, ts: u64) -> TxnId {
        let txn = Transaction::new(TxnId::new(), Timestamp(ts));
        let tid = txn.tid;
        table.register(client, txn).unwrap();
        tid
    }

    fn claim_write(table: &TransactionTable, tid: TxnId, resource: ResourceId) {
        table.with_txn_mut(tid, |t| t.write_set.insert(resource));
    }

    fn claim_read(table: &TransactionTable, tid: TxnId, resource: ResourceId) {
        table.with_txn_mut(tid, |t| t.read_set.insert(resource));
    }

    #[test]
    fn test_read_fails_against_younger_writer() {
        let table = TransactionTable::new();
        let controller = ConcurrencyController::new(1);
        let old = register(&table, "c1", 10);
        let young = register(&table, "c2", 20);
        let acct = ResourceId::row("financial", "accounts", 1);
        claim_write(&table, young, acct.clone());

        assert_eq!(
            controller.validate_read(&table, old, Timestamp(10), &acct),
            Err(young)
        );
        // the younger transaction itself reads fine
        assert!(controller
            .validate_read(&table, young, Timestamp(20), &acct)
            .is_ok());
    }

    #[test]
    fn test_read_ok_against_older_writer() {
        let table = TransactionTable::new();
        let controller = ConcurrencyController::new(1);
        let old = register(&table, "c1", 10);
        let young = register(&table, "c2", 20);
        let acct = ResourceId::row("financial", "accounts", 1);
        claim_write(&table, old, acct.clone());

        assert!(controller
            .validate_read(&table, young, Timestamp(20), &acct)
            .is_ok());
    }

    #[test]
    fn test_write_fails_against_younger_reader_or_writer() {
        let table = TransactionTable::new();
        let controller = ConcurrencyController::new(1);
        let old = register(&table, "c1", 10);
        let young = register(&table, "c2", 20);
        let acct = ResourceId::row("financial", "accounts", 1);

        claim_read(&table, young, acct.clone());
        assert_eq!(
            controller.validate_write(&table, old, Timestamp(10), &acct),
            Err(young)
        );
    }

    #[test]
    fn test_aborted_claims_are_void() {
        let table = TransactionTable::new();
        let controller = ConcurrencyController::new(1);
        let old = register(&table, "c1", 10);
        let young = register(&table, "c2", 20);
        let acct = ResourceId::row("financial", "accounts", 1);
        claim_write(&table, young, acct.clone());
        table.finish_abort("c2", young);

        assert!(controller
            .validate_write(&table, old, Timestamp(10), &acct)
            .is_ok());
    }

    #[test]
    fn test_scan_conflicts_with_row_write() {
        let table = TransactionTable::new();
        let controller = ConcurrencyController::new(1);
        let old = register(&table, "c1", 10);
        let young = register(&table, "c2", 20);
        claim_write(&table, young, ResourceId::row("financial", "accounts", 3));

        let scan = ResourceId::table("financial", "accounts");
        assert_eq!(
            controller.validate_read(&table, old, Timestamp(10), &scan),
            Err(young)
        );
    }

    #[test]
    fn test_no_deadlock_in_empty_graph() {
        let table = TransactionTable::new();
        let controller = ConcurrencyController::new(1);
        register(&table, "c1", 10);
        assert_eq!(controller.detect_deadlock(&table), None);
        assert_eq!(controller.wait_edge_count(), 0);
    }

    #[test]
    fn test_two_cycle_picks_youngest_victim() {
        let table = TransactionTable::new();
        let controller = ConcurrencyController::new(1);
        let a = register(&table, "c1", 10);
        let b = register(&table, "c2", 20);
        controller.add_wait_edge(a, b);
        controller.add_wait_edge(b, a);

        assert_eq!(controller.detect_deadlock(&table), Some(b));
    }

    #[test]
    fn test_victim_comes_from_detected_cycle() {
        let table = TransactionTable::new();
        let controller = ConcurrencyController::new(1);
        // cycle a <-> b, plus a youngest transaction d waiting on the cycle
        // but not part of it
        let a = register(&table, "c1", 10);
        let b = register(&table, "c2", 20);
        let d = register(&table, "c4", 40);
        controller.add_wait_edge(a, b);
        controller.add_wait_edge(b, a);
        controller.add_wait_edge(d, a);

        // d is younger than both members but never a victim
        assert_eq!(controller.detect_deadlock(&table), Some(b));
    }

    #[test]
    fn test_remove_edges_breaks_cycle() {
        let table = TransactionTable::new();
        let controller = ConcurrencyController::new(1);
        let a = register(&table, "c1", 10);
        let b = register(&table, "c2", 20);
        controller.add_wait_edge(a, b);
        controller.add_wait_edge(b, a);

        controller.remove_wait_edges(b);
        assert_eq!(controller.detect_deadlock(&table), None);
        assert_eq!(controller.wait_edge_count(), 0);
    }
}
