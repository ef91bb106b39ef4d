//! A named collection of tables

use crate::table::Table;
use dashmap::DashMap;
use std::sync::Arc;
use tandem_core::{Error, Result};

/// One database: a name and its tables
pub struct Database {
    name: String,
    tables: DashMap<String, Arc<Table>>,
}

impl Database {
    /// Create an empty database
    pub fn new(name: impl Into<String>) -> Self {
        Database {
            name: name.into(),
            tables: DashMap::new(),
        }
    }

    /// Database name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Create a table; fails if the name is taken
    pub fn create_table(&self, name: &str) -> Result<Arc<Table>> {
        if self.tables.contains_key(name) {
            return Err(Error::TableExists {
                db: self.name.clone(),
                table: name.to_string(),
            });
        }
        let table = Arc::new(Table::new(name));
        self.tables.insert(name.to_string(), Arc::clone(&table));
        tracing::debug!(db = %self.name, table = name, "table created");
        Ok(table)
    }

    /// Look up a table by name
    pub fn table(&self, name: &str) -> Result<Arc<Table>> {
        self.tables
            .get(name)
            .map(|entry| Arc::clone(entry.value()))
            .ok_or_else(|| Error::TableNotFound {
                db: self.name.clone(),
                table: name.to_string(),
            })
    }

    /// Table names, sorted
    pub fn table_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.tables.iter().map(|e| e.key().clone()).collect();
        names.sort();
        names
    }
}
