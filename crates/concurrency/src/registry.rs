//! Transaction table
//!
//! The process-wide mapping `tid -> Transaction` plus the client index
//! `client -> active tid`. Both indices live under one coarse mutex; the
//! controller is not performance-tuned and correctness dominates. The client
//! index is injective: a client token has at most one live transaction.

use crate::transaction::{Transaction, TransactionStatus};
use crate::undo::UndoRecord;
use parking_lot::Mutex;
use rustc_hash::{FxHashMap, FxHashSet};
use tandem_core::{Error, ResourceId, Result, Timestamp, TxnId};

#[derive(Default)]
struct Inner {
    txns: FxHashMap<TxnId, Transaction>,
    clients: FxHashMap<String, TxnId>,
}

/// All transactions the process has seen, indexed by tid and by client
#[derive(Default)]
pub struct TransactionTable {
    inner: Mutex<Inner>,
}

impl TransactionTable {
    /// Create an empty table
    pub fn new() -> Self {
        TransactionTable::default()
    }

    /// Register a fresh transaction under `client`
    ///
    /// Fails with [`Error::AlreadyActive`] when the client already has a live
    /// transaction.
    pub fn register(&self, client: &str, txn: Transaction) -> Result<()> {
        let mut inner = self.inner.lock();
        if inner.clients.contains_key(client) {
            return Err(Error::AlreadyActive {
                client: client.to_string(),
            });
        }
        inner.clients.insert(client.to_string(), txn.tid);
        inner.txns.insert(txn.tid, txn);
        Ok(())
    }

    /// Resolve a client to its live transaction
    pub fn resolve(&self, client: &str) -> Result<(TxnId, Timestamp, TransactionStatus)> {
        let inner = self.inner.lock();
        let tid = inner
            .clients
            .get(client)
            .copied()
            .ok_or_else(|| Error::NoActiveTransaction {
                client: client.to_string(),
            })?;
        let txn = &inner.txns[&tid];
        Ok((tid, txn.start_ts, txn.status))
    }

    /// The live transaction id of `client`, if any
    pub fn active_tid(&self, client: &str) -> Option<TxnId> {
        self.inner.lock().clients.get(client).copied()
    }

    /// Mutate a transaction record in place
    pub fn with_txn_mut<R>(&self, tid: TxnId, f: impl FnOnce(&mut Transaction) -> R) -> Option<R> {
        self.inner.lock().txns.get_mut(&tid).map(f)
    }

    /// Visit every transaction record
    pub fn for_each(&self, mut f: impl FnMut(&Transaction)) {
        let inner = self.inner.lock();
        for txn in inner.txns.values() {
            f(txn);
        }
    }

    /// Status of a transaction, if known
    pub fn status_of(&self, tid: TxnId) -> Option<TransactionStatus> {
        self.inner.lock().txns.get(&tid).map(|t| t.status)
    }

    /// Start timestamp of a transaction, if known
    pub fn start_ts_of(&self, tid: TxnId) -> Option<Timestamp> {
        self.inner.lock().txns.get(&tid).map(|t| t.start_ts)
    }

    /// Transition a transaction's status
    pub fn set_status(&self, tid: TxnId, status: TransactionStatus) {
        if let Some(txn) = self.inner.lock().txns.get_mut(&tid) {
            txn.status = status;
        }
    }

    /// Clone the read and write sets for commit-time validation
    pub fn snapshot_sets(&self, tid: TxnId) -> (FxHashSet<ResourceId>, FxHashSet<ResourceId>) {
        let inner = self.inner.lock();
        match inner.txns.get(&tid) {
            Some(txn) => (txn.read_set.clone(), txn.write_set.clone()),
            None => (FxHashSet::default(), FxHashSet::default()),
        }
    }

    /// Drain the undo log and clone the write set, for rollback
    pub fn take_for_rollback(&self, tid: TxnId) -> (Vec<UndoRecord>, FxHashSet<ResourceId>) {
        let mut inner = self.inner.lock();
        match inner.txns.get_mut(&tid) {
            Some(txn) => (std::mem::take(&mut txn.undo_log), txn.write_set.clone()),
            None => (Vec::new(), FxHashSet::default()),
        }
    }

    /// Finish a commit: terminal status, commit timestamp, undo log
    /// discarded, client index entry removed
    pub fn finish_commit(&self, client: &str, tid: TxnId, commit_ts: Timestamp) {
        let mut inner = self.inner.lock();
        if let Some(txn) = inner.txns.get_mut(&tid) {
            txn.status = TransactionStatus::Committed;
            txn.commit_ts = Some(commit_ts);
            txn.undo_log.clear();
        }
        inner.clients.remove(client);
    }

    /// Finish an abort: terminal status, client index entry removed
    pub fn finish_abort(&self, client: &str, tid: TxnId) {
        let mut inner = self.inner.lock();
        if let Some(txn) = inner.txns.get_mut(&tid) {
            txn.status = TransactionStatus::Aborted;
        }
        inner.clients.remove(client);
    }

    /// Smallest start timestamp among ACTIVE/PREPARING transactions
    ///
    /// The garbage-collection horizon: versions older than this are invisible
    /// to every live snapshot.
    pub fn oldest_live_start_ts(&self) -> Option<Timestamp> {
        let inner = self.inner.lock();
        inner
            .txns
            .values()
            .filter(|t| !t.status.is_terminal())
            .map(|t| t.start_ts)
            .min()
    }

    /// Number of live transactions (clients with an active transaction)
    pub fn active_count(&self) -> usize {
        self.inner.lock().clients.len()
    }

    /// Number of transactions ever registered
    pub fn total_count(&self) -> usize {
        self.inner.lock().txns.len()
    }
}
