//! Resource store adapter
//!
//! Thin wrapper over the raw catalog resolving `(database, table)` names per
//! call. The manager mutates the store through this adapter, and the rollback
//! engine applies undo records through it; the store state is the base image
//! undo is applied to.

use std::sync::Arc;
use tandem_core::{RecordId, Result, Row};
use tandem_storage::Catalog;

/// Keyed operations over named tables in named databases
#[derive(Clone)]
pub struct StoreAdapter {
    catalog: Arc<Catalog>,
}

impl StoreAdapter {
    /// Wrap a catalog
    pub fn new(catalog: Arc<Catalog>) -> Self {
        StoreAdapter { catalog }
    }

    /// The wrapped catalog
    pub fn catalog(&self) -> &Arc<Catalog> {
        &self.catalog
    }

    /// Read one row by primary key
    pub fn select_by_key(&self, db: &str, table: &str, key: RecordId) -> Result<Option<Row>> {
        Ok(self.catalog.table(db, table)?.get(key))
    }

    /// Read all rows of a table
    pub fn select_all(&self, db: &str, table: &str) -> Result<Vec<Row>> {
        Ok(self.catalog.table(db, table)?.scan())
    }

    /// Insert a row, returning the assigned primary key
    pub fn insert(&self, db: &str, table: &str, row: Row) -> Result<RecordId> {
        self.catalog.table(db, table)?.insert(row)
    }

    /// Patch a row; false when no row matched
    pub fn update(&self, db: &str, table: &str, key: RecordId, patch: &Row) -> Result<bool> {
        Ok(self.catalog.table(db, table)?.update(key, patch))
    }

    /// Delete a row; false when no row matched
    pub fn delete(&self, db: &str, table: &str, key: RecordId) -> Result<bool> {
        Ok(self.catalog.table(db, table)?.delete(key))
    }
}
