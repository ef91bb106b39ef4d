//! Resource identity
//!
//! A resource is one row named by `(database, table, primary key)`, or a whole
//! table for scan reads and not-yet-keyed inserts. Read/write sets, the
//! version log, and the validation predicates all speak in `ResourceId`.

use crate::types::RecordId;
use serde::{Deserialize, Serialize};
use std::fmt;

/// The key part of a resource identity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ResourceKey {
    /// A single row by primary key
    Record(RecordId),
    /// The whole table (scan reads, inserts before key assignment)
    Table,
}

/// Identity of a row or table across both stores
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ResourceId {
    /// Database name (`financial` or `inventory`)
    pub database: String,
    /// Table name within the database
    pub table: String,
    /// Row key, or [`ResourceKey::Table`] for whole-table resources
    pub key: ResourceKey,
}

impl ResourceId {
    /// Identity of one row
    pub fn row(database: impl Into<String>, table: impl Into<String>, id: RecordId) -> Self {
        ResourceId {
            database: database.into(),
            table: table.into(),
            key: ResourceKey::Record(id),
        }
    }

    /// Identity of a whole table
    pub fn table(database: impl Into<String>, table: impl Into<String>) -> Self {
        ResourceId {
            database: database.into(),
            table: table.into(),
            key: ResourceKey::Table,
        }
    }

    /// Whether two resources can be the same data
    ///
    /// Equal keys overlap; the whole-table resource overlaps every row of its
    /// table. Different tables never overlap.
    pub fn overlaps(&self, other: &ResourceId) -> bool {
        if self.database != other.database || self.table != other.table {
            return false;
        }
        match (self.key, other.key) {
            (ResourceKey::Table, _) | (_, ResourceKey::Table) => true,
            (ResourceKey::Record(a), ResourceKey::Record(b)) => a == b,
        }
    }

    /// The row key, when this names a single row
    pub fn record_id(&self) -> Option<RecordId> {
        match self.key {
            ResourceKey::Record(id) => Some(id),
            ResourceKey::Table => None,
        }
    }
}

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.key {
            ResourceKey::Record(id) => write!(f, "{}.{}.{}", self.database, self.table, id),
            ResourceKey::Table => write!(f, "{}.{}.*", self.database, self.table),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        assert_eq!(
            ResourceId::row("financial", "accounts", 1).to_string(),
            "financial.accounts.1"
        );
        assert_eq!(
            ResourceId::table("inventory", "products").to_string(),
            "inventory.products.*"
        );
    }

    #[test]
    fn test_same_row_overlaps() {
        let a = ResourceId::row("financial", "accounts", 1);
        let b = ResourceId::row("financial", "accounts", 1);
        assert!(a.overlaps(&b));
    }

    #[test]
    fn test_different_rows_do_not_overlap() {
        let a = ResourceId::row("financial", "accounts", 1);
        let b = ResourceId::row("financial", "accounts", 2);
        assert!(!a.overlaps(&b));
    }

    #[test]
    fn test_table_overlaps_every_row_of_itself() {
        let scan = ResourceId::table("financial", "accounts");
        let row = ResourceId::row("financial", "accounts", 7);
        assert!(scan.overlaps(&row));
        assert!(row.overlaps(&scan));
        assert!(scan.overlaps(&scan));
    }

    #[test]
    fn test_tables_are_isolated() {
        let accounts = ResourceId::table("financial", "accounts");
        let users = ResourceId::table("financial", "users");
        let other_db = ResourceId::row("inventory", "accounts", 1);
        assert!(!accounts.overlaps(&users));
        assert!(!accounts.overlaps(&other_db));
    }
}
