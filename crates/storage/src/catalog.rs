//! Catalog of databases
//!
//! The process owns one catalog holding both system databases. `bootstrap`
//! creates the fixed schema the services and seed data expect.

use crate::database::Database;
use crate::table::Table;
use dashmap::DashMap;
use std::sync::Arc;
use tandem_core::{Error, Result};

/// Name of the financial database
pub const FINANCIAL: &str = "financial";
/// Name of the inventory database
pub const INVENTORY: &str = "inventory";

/// All databases of the process
pub struct Catalog {
    databases: DashMap<String, Arc<Database>>,
}

impl Catalog {
    /// Create an empty catalog
    pub fn new() -> Self {
        Catalog {
            databases: DashMap::new(),
        }
    }

    /// Create the two system databases and their tables
    pub fn bootstrap() -> Arc<Self> {
        let catalog = Catalog::new();

        let financial = catalog.create_database(FINANCIAL).expect("fresh catalog");
        for table in ["users", "accounts", "transactions"] {
            financial.create_table(table).expect("fresh database");
        }

        let inventory = catalog.create_database(INVENTORY).expect("fresh catalog");
        for table in ["categories", "products", "orders", "order_items"] {
            inventory.create_table(table).expect("fresh database");
        }

        tracing::info!("system databases initialized");
        Arc::new(catalog)
    }

    /// Create a database; fails if the name is taken
    pub fn create_database(&self, name: &str) -> Result<Arc<Database>> {
        if self.databases.contains_key(name) {
            return Err(Error::DatabaseExists {
                name: name.to_string(),
            });
        }
        let db = Arc::new(Database::new(name));
        self.databases.insert(name.to_string(), Arc::clone(&db));
        tracing::debug!(db = name, "database created");
        Ok(db)
    }

    /// Look up a database by name
    pub fn database(&self, name: &str) -> Result<Arc<Database>> {
        self.databases
            .get(name)
            .map(|entry| Arc::clone(entry.value()))
            .ok_or_else(|| Error::DatabaseNotFound {
                name: name.to_string(),
            })
    }

    /// Resolve `(database, table)` in one step
    pub fn table(&self, db: &str, table: &str) -> Result<Arc<Table>> {
        self.database(db)?.table(table)
    }

    /// Database names, sorted
    pub fn database_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.databases.iter().map(|e| e.key().clone()).collect();
        names.sort();
        names
    }
}

impl Default for Catalog {
    fn default() -> Self {
        Self::new()
    }
}
