//! Transaction manager facade
//!
//! The public entry points of the concurrency layer. One `execute` call runs:
//!
//! 1. resolve the client token to its ACTIVE transaction
//! 2. timestamp-ordering validation against the transaction table
//! 3. deadlock detection over the wait-for graph
//! 4. undo record for mutating operations
//! 5. store mutation (own-writes become visible to this transaction)
//! 6. version-log append for mutating operations
//! 7. read/write set and operation list updates
//!
//! A validation or deadlock failure aborts the attempt, immediately begins a
//! fresh transaction under the same client (with a fresh, strictly later
//! timestamp), and surfaces `RestartRequired` / `Deadlock`. Store failures
//! leave the transaction ACTIVE.

use crate::config::ManagerConfig;
use crate::controller::ConcurrencyController;
use crate::events::{AuditKind, AuditLog};
use crate::registry::TransactionTable;
use crate::store::StoreAdapter;
use crate::transaction::{Transaction, TransactionStatus};
use crate::undo::{self, UndoRecord};
use crate::version::VersionLog;
use serde::Serialize;
use std::sync::Arc;
use tandem_core::{Error, OpKind, RecordId, ResourceId, Result, Row, Timestamp, TxnId};
use tandem_storage::Catalog;

/// One operation to execute inside a transaction
///
/// Key requiredness is encoded per variant: UPDATE and DELETE always name a
/// row, INSERT never does (the store assigns the key), SELECT scans the whole
/// table when no key is given.
#[derive(Debug, Clone)]
pub enum OpRequest {
    /// Read one row by key, or the whole table when `key` is `None`
    Select {
        /// Database name
        db: String,
        /// Table name
        table: String,
        /// Row key; `None` scans the table
        key: Option<RecordId>,
    },
    /// Insert a new row; the store assigns the primary key
    Insert {
        /// Database name
        db: String,
        /// Table name
        table: String,
        /// The new row
        row: Row,
    },
    /// Patch an existing row
    Update {
        /// Database name
        db: String,
        /// Table name
        table: String,
        /// Row key
        key: RecordId,
        /// Fields to replace
        patch: Row,
    },
    /// Remove a row
    Delete {
        /// Database name
        db: String,
        /// Table name
        table: String,
        /// Row key
        key: RecordId,
    },
}

impl OpRequest {
    /// Read one row by key
    pub fn select(db: impl Into<String>, table: impl Into<String>, key: RecordId) -> Self {
        OpRequest::Select {
            db: db.into(),
            table: table.into(),
            key: Some(key),
        }
    }

    /// Read the whole table
    pub fn scan(db: impl Into<String>, table: impl Into<String>) -> Self {
        OpRequest::Select {
            db: db.into(),
            table: table.into(),
            key: None,
        }
    }

    /// Insert a row
    pub fn insert(db: impl Into<String>, table: impl Into<String>, row: Row) -> Self {
        OpRequest::Insert {
            db: db.into(),
            table: table.into(),
            row,
        }
    }

    /// Patch a row
    pub fn update(
        db: impl Into<String>,
        table: impl Into<String>,
        key: RecordId,
        patch: Row,
    ) -> Self {
        OpRequest::Update {
            db: db.into(),
            table: table.into(),
            key,
            patch,
        }
    }

    /// Remove a row
    pub fn delete(db: impl Into<String>, table: impl Into<String>, key: RecordId) -> Self {
        OpRequest::Delete {
            db: db.into(),
            table: table.into(),
            key,
        }
    }

    /// Which of the four operations this is
    pub fn kind(&self) -> OpKind {
        match self {
            OpRequest::Select { .. } => OpKind::Select,
            OpRequest::Insert { .. } => OpKind::Insert,
            OpRequest::Update { .. } => OpKind::Update,
            OpRequest::Delete { .. } => OpKind::Delete,
        }
    }

    /// The resource the validators check
    ///
    /// INSERT validates against the whole-table resource: the key does not
    /// exist until the store assigns it.
    fn validation_resource(&self) -> ResourceId {
        match self {
            OpRequest::Select {
                db,
                table,
                key: Some(key),
            } => ResourceId::row(db.clone(), table.clone(), *key),
            OpRequest::Select {
                db,
                table,
                key: None,
            }
            | OpRequest::Insert { db, table, .. } => ResourceId::table(db.clone(), table.clone()),
            OpRequest::Update { db, table, key, .. } | OpRequest::Delete { db, table, key } => {
                ResourceId::row(db.clone(), table.clone(), *key)
            }
        }
    }
}

/// Outcome of one executed operation
#[derive(Debug, Clone, PartialEq)]
pub enum OpResult {
    /// INSERT: the assigned primary key
    Inserted(RecordId),
    /// SELECT by key: a deep copy of the row, or `None`
    Row(Option<Row>),
    /// SELECT scan: deep copies of all rows
    Rows(Vec<Row>),
    /// UPDATE/DELETE: whether a row matched
    Applied(bool),
}

impl OpResult {
    /// The assigned key of an INSERT result
    pub fn inserted(self) -> Option<RecordId> {
        match self {
            OpResult::Inserted(id) => Some(id),
            _ => None,
        }
    }

    /// The row of a keyed SELECT result
    pub fn row(self) -> Option<Row> {
        match self {
            OpResult::Row(row) => row,
            _ => None,
        }
    }

    /// The rows of a scan result
    pub fn rows(self) -> Vec<Row> {
        match self {
            OpResult::Rows(rows) => rows,
            _ => Vec::new(),
        }
    }
}

/// Snapshot of manager counters
#[derive(Debug, Clone, Serialize)]
pub struct Statistics {
    /// Clients with a live transaction
    pub active_transactions: usize,
    /// Transactions ever begun
    pub total_transactions: usize,
    /// Audit events recorded
    pub log_entries: usize,
    /// Resources with at least one version
    pub versioned_resources: usize,
}

/// The transaction manager
///
/// One long-lived instance owned by the caller; every public operation is
/// thread-safe. Each client token corresponds to one caller thread at a time.
/// The manager never blocks a transaction on another: conflicts restart.
pub struct TransactionManager {
    config: ManagerConfig,
    store: StoreAdapter,
    registry: TransactionTable,
    controller: ConcurrencyController,
    versions: VersionLog,
    audit: AuditLog,
}

impl TransactionManager {
    /// Create a manager over `catalog` with default configuration
    pub fn new(catalog: Arc<Catalog>) -> Self {
        Self::with_config(catalog, ManagerConfig::default())
    }

    /// Create a manager over `catalog` with explicit configuration
    pub fn with_config(catalog: Arc<Catalog>, config: ManagerConfig) -> Self {
        TransactionManager {
            controller: ConcurrencyController::new(config.timestamp_stride_micros),
            config,
            store: StoreAdapter::new(catalog),
            registry: TransactionTable::new(),
            versions: VersionLog::new(),
            audit: AuditLog::new(),
        }
    }

    /// The store adapter this manager mutates
    pub fn store(&self) -> &StoreAdapter {
        &self.store
    }

    /// The concurrency controller (wait-for edge API for lock-based callers)
    pub fn controller(&self) -> &ConcurrencyController {
        &self.controller
    }

    /// The multiversion log
    pub fn versions(&self) -> &VersionLog {
        &self.versions
    }

    /// The audit event log
    pub fn audit(&self) -> &AuditLog {
        &self.audit
    }

    /// Active configuration
    pub fn config(&self) -> &ManagerConfig {
        &self.config
    }

    /// Begin a transaction for `client`
    ///
    /// Fails with [`Error::AlreadyActive`] when the client already has one.
    pub fn begin(&self, client: &str) -> Result<TxnId> {
        let start_ts = self.controller.issue_timestamp();
        let txn = Transaction::new(TxnId::new(), start_ts);
        let tid = txn.tid;
        self.registry.register(client, txn)?;
        self.audit.record(
            AuditKind::Begin,
            tid,
            format!("client={} start_ts={}", client, start_ts),
        );
        Ok(tid)
    }

    /// True when `client` has a live transaction
    pub fn has_active(&self, client: &str) -> bool {
        self.registry.active_tid(client).is_some()
    }

    /// The live transaction id of `client`, if any
    pub fn active_tid(&self, client: &str) -> Option<TxnId> {
        self.registry.active_tid(client)
    }

    /// Status of a transaction, if known
    pub fn transaction_status(&self, tid: TxnId) -> Option<TransactionStatus> {
        self.registry.status_of(tid)
    }

    /// Start timestamp of a transaction, if known
    pub fn transaction_start_ts(&self, tid: TxnId) -> Option<Timestamp> {
        self.registry.start_ts_of(tid)
    }

    /// Execute one operation inside the client's transaction
    pub fn execute(&self, client: &str, request: OpRequest) -> Result<OpResult> {
        let (tid, start_ts, status) = self.registry.resolve(client)?;
        if status != TransactionStatus::Active {
            return Err(Error::NotActive { tid });
        }

        let guarded = request.validation_resource();
        let validation = match request.kind() {
            OpKind::Select => self
                .controller
                .validate_read(&self.registry, tid, start_ts, &guarded),
            _ => self
                .controller
                .validate_write(&self.registry, tid, start_ts, &guarded),
        };
        if let Err(conflicting) = validation {
            tracing::info!(
                txn = %tid.short(),
                resource = %guarded,
                conflicting = %conflicting.short(),
                "ordering conflict, restarting"
            );
            self.restart(client, tid);
            return Err(Error::RestartRequired {
                tid,
                resource: guarded.to_string(),
            });
        }

        if let Some(victim) = self.controller.detect_deadlock(&self.registry) {
            if victim == tid {
                self.restart(client, tid);
                return Err(Error::Deadlock { tid });
            }
        }

        match request {
            OpRequest::Select {
                db,
                table,
                key: Some(key),
            } => {
                let row = self
                    .store
                    .select_by_key(&db, &table, key)
                    .map_err(|e| self.operation_error(tid, e))?;
                let resource = ResourceId::row(db, table, key);
                self.registry
                    .with_txn_mut(tid, |t| t.record_op(OpKind::Select, resource, None));
                Ok(OpResult::Row(row))
            }
            OpRequest::Select {
                db,
                table,
                key: None,
            } => {
                let rows = self
                    .store
                    .select_all(&db, &table)
                    .map_err(|e| self.operation_error(tid, e))?;
                let resource = ResourceId::table(db, table);
                self.registry
                    .with_txn_mut(tid, |t| t.record_op(OpKind::Select, resource, None));
                Ok(OpResult::Rows(rows))
            }
            OpRequest::Insert { db, table, row } => {
                let key = self
                    .store
                    .insert(&db, &table, row.clone())
                    .map_err(|e| self.operation_error(tid, e))?;
                let mut stored = row;
                stored.set_id(key);
                let resource = ResourceId::row(db.clone(), table.clone(), key);
                self.registry.with_txn_mut(tid, |t| {
                    t.undo_log.push(UndoRecord::RemoveRow {
                        db,
                        table,
                        key,
                    });
                    t.record_op(OpKind::Insert, resource.clone(), Some(stored.clone()));
                });
                self.versions.write(&resource, Some(stored), start_ts, tid);
                Ok(OpResult::Inserted(key))
            }
            OpRequest::Update {
                db,
                table,
                key,
                patch,
            } => {
                let previous = self
                    .store
                    .select_by_key(&db, &table, key)
                    .map_err(|e| self.operation_error(tid, e))?
                    .ok_or_else(|| {
                        self.operation_error(
                            tid,
                            Error::RowNotFound {
                                table: table.clone(),
                                key,
                            },
                        )
                    })?;
                let mut post = previous.clone();
                post.merge(&patch);
                post.set_id(key);

                let resource = ResourceId::row(db.clone(), table.clone(), key);
                self.registry.with_txn_mut(tid, |t| {
                    t.undo_log.push(UndoRecord::RestoreRow {
                        db: db.clone(),
                        table: table.clone(),
                        key,
                        row: previous,
                    });
                });
                let matched = self
                    .store
                    .update(&db, &table, key, &patch)
                    .map_err(|e| self.operation_error(tid, e))?;
                self.versions.write(&resource, Some(post), start_ts, tid);
                self.registry
                    .with_txn_mut(tid, |t| t.record_op(OpKind::Update, resource, Some(patch)));
                Ok(OpResult::Applied(matched))
            }
            OpRequest::Delete { db, table, key } => {
                let previous = self
                    .store
                    .select_by_key(&db, &table, key)
                    .map_err(|e| self.operation_error(tid, e))?
                    .ok_or_else(|| {
                        self.operation_error(
                            tid,
                            Error::RowNotFound {
                                table: table.clone(),
                                key,
                            },
                        )
                    })?;

                let resource = ResourceId::row(db.clone(), table.clone(), key);
                self.registry.with_txn_mut(tid, |t| {
                    t.undo_log.push(UndoRecord::ReinsertRow {
                        db: db.clone(),
                        table: table.clone(),
                        row: previous,
                    });
                });
                let matched = self
                    .store
                    .delete(&db, &table, key)
                    .map_err(|e| self.operation_error(tid, e))?;
                self.versions.write(&resource, None, start_ts, tid);
                self.registry
                    .with_txn_mut(tid, |t| t.record_op(OpKind::Delete, resource, None));
                Ok(OpResult::Applied(matched))
            }
        }
    }

    /// Commit the client's transaction
    ///
    /// Re-validates the full read and write sets in PREPARING, then flips the
    /// versions committed. Validation failure here is terminal for the
    /// attempt: the transaction is rolled back and the caller decides whether
    /// to retry from scratch.
    pub fn commit(&self, client: &str) -> Result<()> {
        let (tid, start_ts, status) = self.registry.resolve(client)?;
        if status != TransactionStatus::Active {
            return Err(Error::NotActive { tid });
        }
        self.registry.set_status(tid, TransactionStatus::Preparing);

        let (read_set, write_set) = self.registry.snapshot_sets(tid);
        let mut failure: Option<String> = None;
        for resource in &read_set {
            if let Err(u) = self
                .controller
                .validate_read(&self.registry, tid, start_ts, resource)
            {
                failure = Some(format!("read of {} conflicts with {}", resource, u.short()));
                break;
            }
        }
        if failure.is_none() {
            for resource in &write_set {
                if let Err(u) =
                    self.controller
                        .validate_write(&self.registry, tid, start_ts, resource)
                {
                    failure = Some(format!("write of {} conflicts with {}", resource, u.short()));
                    break;
                }
            }
        }
        if let Some(detail) = failure {
            self.rollback_inner(client, tid);
            return Err(Error::ValidationFailed { detail });
        }

        for resource in &write_set {
            self.versions.commit(resource, tid);
        }
        let commit_ts = self.controller.issue_timestamp();
        self.registry.finish_commit(client, tid, commit_ts);
        self.controller.remove_wait_edges(tid);
        self.audit.record(
            AuditKind::Commit,
            tid,
            format!("commit_ts={} writes={}", commit_ts, write_set.len()),
        );
        self.maybe_gc();
        Ok(())
    }

    /// Roll back the client's transaction
    ///
    /// Idempotent: succeeds when the client has no live transaction.
    pub fn rollback(&self, client: &str) -> Result<()> {
        if let Some(tid) = self.registry.active_tid(client) {
            self.rollback_inner(client, tid);
        }
        Ok(())
    }

    /// Current counter snapshot
    pub fn statistics(&self) -> Statistics {
        Statistics {
            active_transactions: self.registry.active_count(),
            total_transactions: self.registry.total_count(),
            log_entries: self.audit.len(),
            versioned_resources: self.versions.resource_count(),
        }
    }

    /// Undo the attempt, abort its versions, free the client token
    fn rollback_inner(&self, client: &str, tid: TxnId) {
        let (undo_log, write_set) = self.registry.take_for_rollback(tid);
        let failed = undo::roll_back(&self.store, &undo_log);
        if failed > 0 {
            self.audit.record(
                AuditKind::RollbackError,
                tid,
                format!("{} of {} undo steps failed", failed, undo_log.len()),
            );
        }
        for resource in &write_set {
            self.versions.abort(resource, tid);
        }
        self.registry.finish_abort(client, tid);
        self.controller.remove_wait_edges(tid);
        self.audit
            .record(AuditKind::Rollback, tid, format!("{} undo steps", undo_log.len()));
    }

    /// Internal restart: roll back, then immediately begin a fresh
    /// transaction under the same client token
    ///
    /// The fresh start timestamp positions the retry later in the total
    /// order, so the conflict that triggered the restart cannot repeat for
    /// the same cause.
    fn restart(&self, client: &str, old: TxnId) {
        self.rollback_inner(client, old);
        match self.begin(client) {
            Ok(new_tid) => {
                self.audit
                    .record(AuditKind::Restart, old, format!("new={}", new_tid.short()));
            }
            Err(e) => {
                // the client slot was just freed; this cannot fail in practice
                tracing::error!(client, error = %e, "restart could not begin a fresh transaction");
            }
        }
    }

    /// Record a store-level failure; the transaction stays ACTIVE
    fn operation_error(&self, tid: TxnId, error: Error) -> Error {
        self.audit
            .record(AuditKind::OperationError, tid, error.to_string());
        error
    }

    /// Opportunistic version-log GC after commit
    fn maybe_gc(&self) {
        if self.versions.version_count() > self.config.version_gc_threshold {
            let horizon = self
                .registry
                .oldest_live_start_ts()
                .unwrap_or(Timestamp(u64::MAX));
            let pruned = self.versions.gc(horizon);
            if pruned > 0 {
                tracing::debug!(pruned, "version log garbage collected");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tandem_core::Restartable;

    fn manager() -> TransactionManager {
        TransactionManager::new(Catalog::bootstrap())
    }

    fn seed_account(mgr: &TransactionManager, balance: i64) -> RecordId {
        mgr.store()
            .insert(
                "financial",
                "accounts",
                Row::new().with("balance", balance),
            )
            .unwrap()
    }

    #[test]
    fn test_begin_is_exclusive_per_client() {
        let mgr = manager();
        mgr.begin("c1").unwrap();
        assert_eq!(
            mgr.begin("c1"),
            Err(Error::AlreadyActive { client: "c1".into() })
        );
        mgr.begin("c2").unwrap();
    }

    #[test]
    fn test_execute_without_begin() {
        let mgr = manager();
        let err = mgr
            .execute("ghost", OpRequest::scan("financial", "accounts"))
            .unwrap_err();
        assert_eq!(
            err,
            Error::NoActiveTransaction {
                client: "ghost".into()
            }
        );
    }

    #[test]
    fn test_insert_select_commit() {
        let mgr = manager();
        mgr.begin("c1").unwrap();
        let key = mgr
            .execute(
                "c1",
                OpRequest::insert("financial", "accounts", Row::new().with("balance", 1000i64)),
            )
            .unwrap()
            .inserted()
            .unwrap();
        let row = mgr
            .execute("c1", OpRequest::select("financial", "accounts", key))
            .unwrap()
            .row()
            .unwrap();
        assert_eq!(row.i64("balance"), Some(1000));
        mgr.commit("c1").unwrap();
        assert!(!mgr.has_active("c1"));
    }

    #[test]
    fn test_read_your_own_update() {
        let mgr = manager();
        let key = seed_account(&mgr, 1000);
        mgr.begin("c1").unwrap();
        mgr.execute(
            "c1",
            OpRequest::update(
                "financial",
                "accounts",
                key,
                Row::new().with("balance", 900i64),
            ),
        )
        .unwrap();
        let row = mgr
            .execute("c1", OpRequest::select("financial", "accounts", key))
            .unwrap()
            .row()
            .unwrap();
        assert_eq!(row.i64("balance"), Some(900));
    }

    #[test]
    fn test_rollback_restores_store() {
        let mgr = manager();
        let key = seed_account(&mgr, 1000);
        mgr.begin("c1").unwrap();
        mgr.execute(
            "c1",
            OpRequest::update(
                "financial",
                "accounts",
                key,
                Row::new().with("balance", 0i64),
            ),
        )
        .unwrap();
        let inserted = mgr
            .execute(
                "c1",
                OpRequest::insert("financial", "accounts", Row::new().with("balance", 5i64)),
            )
            .unwrap()
            .inserted()
            .unwrap();
        mgr.rollback("c1").unwrap();

        let store = mgr.store();
        assert_eq!(
            store
                .select_by_key("financial", "accounts", key)
                .unwrap()
                .unwrap()
                .i64("balance"),
            Some(1000)
        );
        assert!(store
            .select_by_key("financial", "accounts", inserted)
            .unwrap()
            .is_none());
    }

    #[test]
    fn test_rollback_is_idempotent() {
        let mgr = manager();
        assert!(mgr.rollback("nobody").is_ok());
    }

    #[test]
    fn test_update_missing_row_leaves_transaction_active() {
        let mgr = manager();
        let tid = mgr.begin("c1").unwrap();
        let err = mgr
            .execute(
                "c1",
                OpRequest::update("financial", "accounts", 404, Row::new()),
            )
            .unwrap_err();
        assert!(err.is_store());
        assert_eq!(mgr.transaction_status(tid), Some(TransactionStatus::Active));
        // the transaction can still commit
        mgr.commit("c1").unwrap();
    }

    #[test]
    fn test_conflict_restarts_under_same_client() {
        let mgr = manager();
        let key = seed_account(&mgr, 1000);

        let old_tid = mgr.begin("c1").unwrap();
        mgr.begin("c2").unwrap();
        // the younger transaction claims the row
        mgr.execute(
            "c2",
            OpRequest::update(
                "financial",
                "accounts",
                key,
                Row::new().with("balance", 1i64),
            ),
        )
        .unwrap();

        // the older transaction's write now violates timestamp order
        let err = mgr
            .execute(
                "c1",
                OpRequest::update(
                    "financial",
                    "accounts",
                    key,
                    Row::new().with("balance", 2i64),
                ),
            )
            .unwrap_err();
        assert!(err.is_restartable());
        assert_eq!(
            mgr.transaction_status(old_tid),
            Some(TransactionStatus::Aborted)
        );

        // a fresh transaction is already in place, younger than both
        let new_tid = mgr.active_tid("c1").unwrap();
        assert_ne!(new_tid, old_tid);
        assert!(
            mgr.transaction_start_ts(new_tid).unwrap()
                > mgr.transaction_start_ts(old_tid).unwrap()
        );
    }

    #[test]
    fn test_commit_assigns_commit_ts_and_marks_versions() {
        let mgr = manager();
        let key = seed_account(&mgr, 1000);
        let tid = mgr.begin("c1").unwrap();
        let start_ts = mgr.transaction_start_ts(tid).unwrap();
        mgr.execute(
            "c1",
            OpRequest::update(
                "financial",
                "accounts",
                key,
                Row::new().with("balance", 900i64),
            ),
        )
        .unwrap();
        mgr.commit("c1").unwrap();

        assert_eq!(mgr.transaction_status(tid), Some(TransactionStatus::Committed));
        assert_eq!(mgr.versions().uncommitted_by(tid), 0);
        let resource = ResourceId::row("financial", "accounts", key);
        let snapshot = mgr.versions().read(&resource, start_ts).unwrap();
        assert_eq!(snapshot.i64("balance"), Some(900));
    }

    #[test]
    fn test_statistics_track_activity() {
        let mgr = manager();
        let key = seed_account(&mgr, 10);
        mgr.begin("c1").unwrap();
        mgr.execute(
            "c1",
            OpRequest::update("financial", "accounts", key, Row::new().with("balance", 9i64)),
        )
        .unwrap();

        let stats = mgr.statistics();
        assert_eq!(stats.active_transactions, 1);
        assert_eq!(stats.total_transactions, 1);
        assert_eq!(stats.versioned_resources, 1);
        assert!(stats.log_entries >= 1);

        mgr.commit("c1").unwrap();
        assert_eq!(mgr.statistics().active_transactions, 0);
    }

    #[test]
    fn test_double_operation_after_commit_fails() {
        let mgr = manager();
        mgr.begin("c1").unwrap();
        mgr.commit("c1").unwrap();
        assert!(matches!(
            mgr.execute("c1", OpRequest::scan("financial", "accounts")),
            Err(Error::NoActiveTransaction { .. })
        ));
    }
}
