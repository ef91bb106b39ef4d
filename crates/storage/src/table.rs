//! One in-memory table
//!
//! Rows live in an `FxHashMap` keyed by primary key behind a single
//! `parking_lot::RwLock`. Reads hand out deep copies; callers never observe a
//! reference into the map.

use parking_lot::RwLock;
use rustc_hash::FxHashMap;
use tandem_core::{Error, RecordId, Result, Row};

/// A named table of rows keyed by integer primary key
pub struct Table {
    name: String,
    inner: RwLock<TableInner>,
}

struct TableInner {
    rows: FxHashMap<RecordId, Row>,
    next_id: RecordId,
}

impl Table {
    /// Create an empty table
    pub fn new(name: impl Into<String>) -> Self {
        Table {
            name: name.into(),
            inner: RwLock::new(TableInner {
                rows: FxHashMap::default(),
                next_id: 1,
            }),
        }
    }

    /// Table name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Insert a row, assigning the next primary key when the row carries none
    ///
    /// A supplied key that collides with an existing row fails with
    /// [`Error::DuplicateKey`]. Supplied keys advance the assignment counter
    /// so later auto-assigned keys never collide with them.
    pub fn insert(&self, mut row: Row) -> Result<RecordId> {
        let mut inner = self.inner.write();
        let id = match row.id() {
            Some(id) => id,
            None => {
                let id = inner.next_id;
                row.set_id(id);
                id
            }
        };
        if inner.rows.contains_key(&id) {
            return Err(Error::DuplicateKey {
                table: self.name.clone(),
                key: id,
            });
        }
        if id >= inner.next_id {
            inner.next_id = id + 1;
        }
        inner.rows.insert(id, row);
        Ok(id)
    }

    /// Read one row by primary key, as a deep copy
    pub fn get(&self, id: RecordId) -> Option<Row> {
        self.inner.read().rows.get(&id).cloned()
    }

    /// All rows, in ascending key order, as deep copies
    pub fn scan(&self) -> Vec<Row> {
        let inner = self.inner.read();
        let mut ids: Vec<RecordId> = inner.rows.keys().copied().collect();
        ids.sort_unstable();
        ids.iter().map(|id| inner.rows[id].clone()).collect()
    }

    /// Rows matching `predicate`, in ascending key order
    pub fn scan_where(&self, predicate: impl Fn(&Row) -> bool) -> Vec<Row> {
        self.scan().into_iter().filter(|r| predicate(r)).collect()
    }

    /// Patch a row in place; the primary key cannot be changed by a patch
    ///
    /// Returns false when no row matched.
    pub fn update(&self, id: RecordId, patch: &Row) -> bool {
        let mut inner = self.inner.write();
        match inner.rows.get_mut(&id) {
            Some(row) => {
                row.merge(patch);
                row.set_id(id);
                true
            }
            None => false,
        }
    }

    /// Remove a row by primary key; returns false when no row matched
    pub fn delete(&self, id: RecordId) -> bool {
        self.inner.write().rows.remove(&id).is_some()
    }

    /// Number of rows
    pub fn len(&self) -> usize {
        self.inner.read().rows.len()
    }

    /// True when the table holds no rows
    pub fn is_empty(&self) -> bool {
        self.inner.read().rows.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_assigns_sequential_keys() {
        let table = Table::new("accounts");
        let a = table.insert(Row::new().with("balance", 10i64)).unwrap();
        let b = table.insert(Row::new().with("balance", 20i64)).unwrap();
        assert_eq!(a, 1);
        assert_eq!(b, 2);
        assert_eq!(table.get(a).unwrap().i64("balance"), Some(10));
    }

    #[test]
    fn test_insert_with_explicit_key() {
        let table = Table::new("accounts");
        let id = table
            .insert(Row::new().with("id", 40i64).with("balance", 0i64))
            .unwrap();
        assert_eq!(id, 40);
        // assignment counter advances past supplied keys
        let next = table.insert(Row::new()).unwrap();
        assert_eq!(next, 41);
    }

    #[test]
    fn test_insert_duplicate_key_fails() {
        let table = Table::new("accounts");
        table.insert(Row::new().with("id", 1i64)).unwrap();
        let err = table.insert(Row::new().with("id", 1i64)).unwrap_err();
        assert_eq!(
            err,
            Error::DuplicateKey {
                table: "accounts".into(),
                key: 1
            }
        );
    }

    #[test]
    fn test_update_merges_and_preserves_key() {
        let table = Table::new("accounts");
        let id = table
            .insert(Row::new().with("balance", 1000i64).with("owner", "ada"))
            .unwrap();
        // a patch trying to move the primary key is ignored for the key field
        let patch = Row::new().with("balance", 900i64).with("id", 99i64);
        assert!(table.update(id, &patch));
        let row = table.get(id).unwrap();
        assert_eq!(row.id(), Some(id));
        assert_eq!(row.i64("balance"), Some(900));
        assert_eq!(row.str("owner"), Some("ada"));
    }

    #[test]
    fn test_update_missing_row_returns_false() {
        let table = Table::new("accounts");
        assert!(!table.update(7, &Row::new()));
    }

    #[test]
    fn test_delete() {
        let table = Table::new("accounts");
        let id = table.insert(Row::new()).unwrap();
        assert!(table.delete(id));
        assert!(!table.delete(id));
        assert!(table.get(id).is_none());
    }

    #[test]
    fn test_scan_orders_by_key() {
        let table = Table::new("t");
        table.insert(Row::new().with("id", 3i64)).unwrap();
        table.insert(Row::new().with("id", 1i64)).unwrap();
        table.insert(Row::new().with("id", 2i64)).unwrap();
        let ids: Vec<_> = table.scan().iter().map(|r| r.id().unwrap()).collect();
        assert_eq!(ids, vec![1, 2, 3]);
    }

    #[test]
    fn test_get_returns_deep_copy() {
        let table = Table::new("t");
        let id = table.insert(Row::new().with("n", 1i64)).unwrap();
        let mut copy = table.get(id).unwrap();
        copy.set("n", 2i64);
        assert_eq!(table.get(id).unwrap().i64("n"), Some(1));
    }
}
