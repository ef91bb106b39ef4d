//! Undo records and the rollback engine
//!
//! Before each mutation the manager records the inverse against the raw
//! store: INSERT is undone by removing the assigned key, UPDATE by restoring
//! the previous full row, DELETE by reinserting it. Rollback applies the
//! stack in reverse. Undo bypasses the concurrency controller: these are
//! internal effects of a transaction that has already lost.

use crate::store::StoreAdapter;
use tandem_core::{Error, RecordId, Result, Row};

/// Inverse of one mutating operation
#[derive(Debug, Clone)]
pub enum UndoRecord {
    /// Inverse of INSERT: remove the row the store assigned a key to
    RemoveRow {
        /// Database name
        db: String,
        /// Table name
        table: String,
        /// Assigned primary key
        key: RecordId,
    },
    /// Inverse of UPDATE: put the previous full row back
    RestoreRow {
        /// Database name
        db: String,
        /// Table name
        table: String,
        /// Patched primary key
        key: RecordId,
        /// Full row image read before the update
        row: Row,
    },
    /// Inverse of DELETE: reinsert the previous full row
    ReinsertRow {
        /// Database name
        db: String,
        /// Table name
        table: String,
        /// Full row image read before the delete
        row: Row,
    },
}

impl UndoRecord {
    /// Apply this inverse to the store
    pub fn apply(&self, store: &StoreAdapter) -> Result<()> {
        match self {
            UndoRecord::RemoveRow { db, table, key } => {
                store.delete(db, table, *key)?;
                Ok(())
            }
            UndoRecord::RestoreRow { db, table, key, row } => {
                if store.update(db, table, *key, row)? {
                    Ok(())
                } else {
                    Err(Error::RowNotFound {
                        table: table.clone(),
                        key: *key,
                    })
                }
            }
            UndoRecord::ReinsertRow { db, table, row } => {
                store.insert(db, table, row.clone())?;
                Ok(())
            }
        }
    }
}

/// Apply a transaction's undo stack in reverse order
///
/// Individual failures are logged and swallowed: the transaction is already
/// lost and the remaining inverses must still run. Returns the number of
/// failed steps.
pub fn roll_back(store: &StoreAdapter, undo_log: &[UndoRecord]) -> usize {
    let mut failed = 0;
    for record in undo_log.iter().rev() {
        if let Err(e) = record.apply(store) {
            tracing::warn!(error = %e, "undo step failed, continuing rollback");
            failed += 1;
        }
    }
    failed
}
