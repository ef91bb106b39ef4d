//! # Tandem
//!
//! A transactional execution layer over twin in-memory relational stores
//! (`financial` and `inventory`) with ACID semantics across cross-store
//! operations.
//!
//! The core is the [`TransactionManager`]: a timestamp-ordering concurrency
//! controller with multiversion storage, wait-for-graph deadlock detection,
//! undo-log rollback, and automatic transaction restart. Conflicts never
//! block: the losing transaction is rolled back and restarted under the
//! same client token with a fresh, later timestamp.
//!
//! # Quick Start
//!
//! ```
//! use std::sync::Arc;
//! use tandem::{Catalog, OpRequest, Row, TransactionManager};
//!
//! fn main() -> tandem::Result<()> {
//!     let manager = Arc::new(TransactionManager::new(Catalog::bootstrap()));
//!
//!     manager.begin("c1")?;
//!     let key = manager
//!         .execute(
//!             "c1",
//!             OpRequest::insert("financial", "accounts", Row::new().with("balance", 1000i64)),
//!         )?
//!         .inserted()
//!         .expect("insert returns the assigned key");
//!     manager.execute(
//!         "c1",
//!         OpRequest::update("financial", "accounts", key, Row::new().with("balance", 900i64)),
//!     )?;
//!     manager.commit("c1")?;
//!     Ok(())
//! }
//! ```
//!
//! # Layers
//!
//! | Crate | Purpose |
//! |-------|---------|
//! | `tandem-core` | Values, rows, resource identity, errors |
//! | `tandem-storage` | The raw in-memory relational store |
//! | `tandem-concurrency` | The transaction manager and its machinery |
//! | `tandem-services` | Transfers, orders, and other business units of work |
//! | `tandem-cli` | Interactive shell (binary `tandem`) |

pub use tandem_core::{
    Error, OpKind, RecordId, ResourceId, ResourceKey, Restartable, Result, Row, Timestamp, TxnId,
    Value,
};

pub use tandem_storage::{Catalog, Database, Table};

pub use tandem_concurrency::{
    ManagerConfig, OpRequest, OpResult, Statistics, TransactionManager, TransactionStatus,
};

pub use tandem_services::{
    Account, Bank, Entity, Inventory, LedgerEntry, Order, OrderItem, Product, ServiceError,
    ServiceResult, User,
};

pub use tandem_services::seed_sample_data;
