//! Transaction records
//!
//! State transitions:
//! - `Active` → `Preparing` (commit starts)
//! - `Preparing` → `Committed` (final validation passed)
//! - `Preparing` → `Aborted` (final validation failed)
//! - `Active` → `Aborted` (rollback, conflict restart, deadlock victim)
//!
//! `Committed` and `Aborted` are terminal.

use crate::undo::UndoRecord;
use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};
use tandem_core::{OpKind, ResourceId, Row, Timestamp, TxnId};

/// Status of a transaction in its lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransactionStatus {
    /// Executing; reads and writes are accepted
    Active,
    /// Commit in progress, running final validation
    Preparing,
    /// Committed; versions durable in the version log
    Committed,
    /// Aborted; all effects undone
    Aborted,
}

impl TransactionStatus {
    /// True for `Committed` and `Aborted`
    pub fn is_terminal(&self) -> bool {
        matches!(self, TransactionStatus::Committed | TransactionStatus::Aborted)
    }
}

/// One executed operation, kept for audit and undo ordering
#[derive(Debug, Clone)]
pub struct Operation {
    /// What was executed
    pub kind: OpKind,
    /// Which resource it touched
    pub resource: ResourceId,
    /// Payload for INSERT/UPDATE; absent for SELECT/DELETE
    pub payload: Option<Row>,
}

/// Everything the manager tracks about one transaction
#[derive(Debug)]
pub struct Transaction {
    /// Unique identity
    pub tid: TxnId,
    /// Position in the serialization order; also the version stamp of writes
    pub start_ts: Timestamp,
    /// Lifecycle state
    pub status: TransactionStatus,
    /// Resources read so far
    pub read_set: FxHashSet<ResourceId>,
    /// Resources written so far
    pub write_set: FxHashSet<ResourceId>,
    /// Executed operations in program order
    pub ops: Vec<Operation>,
    /// Inverse operations, pushed in program order, applied in reverse
    pub undo_log: Vec<UndoRecord>,
    /// Assigned at successful commit
    pub commit_ts: Option<Timestamp>,
}

impl Transaction {
    /// Create a fresh ACTIVE transaction
    pub fn new(tid: TxnId, start_ts: Timestamp) -> Self {
        Transaction {
            tid,
            start_ts,
            status: TransactionStatus::Active,
            read_set: FxHashSet::default(),
            write_set: FxHashSet::default(),
            ops: Vec::new(),
            undo_log: Vec::new(),
            commit_ts: None,
        }
    }

    /// True while the transaction accepts operations
    pub fn is_active(&self) -> bool {
        self.status == TransactionStatus::Active
    }

    /// Record a successful operation: grow the matching set and the op list
    pub fn record_op(&mut self, kind: OpKind, resource: ResourceId, payload: Option<Row>) {
        if kind.is_mutation() {
            self.write_set.insert(resource.clone());
        } else {
            self.read_set.insert(resource.clone());
        }
        self.ops.push(Operation {
            kind,
            resource,
            payload,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_transaction_is_active_and_empty() {
        let txn = Transaction::new(TxnId::new(), Timestamp(1));
        assert!(txn.is_active());
        assert!(txn.read_set.is_empty());
        assert!(txn.write_set.is_empty());
        assert!(txn.commit_ts.is_none());
    }

    #[test]
    fn test_record_op_routes_to_sets() {
        let mut txn = Transaction::new(TxnId::new(), Timestamp(1));
        let read = ResourceId::row("financial", "accounts", 1);
        let written = ResourceId::row("financial", "accounts", 2);

        txn.record_op(OpKind::Select, read.clone(), None);
        txn.record_op(OpKind::Update, written.clone(), Some(Row::new()));

        assert!(txn.read_set.contains(&read));
        assert!(!txn.write_set.contains(&read));
        assert!(txn.write_set.contains(&written));
        assert_eq!(txn.ops.len(), 2);
    }

    #[test]
    fn test_terminal_states() {
        assert!(TransactionStatus::Committed.is_terminal());
        assert!(TransactionStatus::Aborted.is_terminal());
        assert!(!TransactionStatus::Active.is_terminal());
        assert!(!TransactionStatus::Preparing.is_terminal());
    }
}
