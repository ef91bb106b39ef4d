//! Concurrency layer for Tandem
//!
//! This crate implements timestamp-ordering concurrency control (T/O) with:
//! - TimestampOracle: unique monotonic start/commit timestamps
//! - VersionLog: multiversion storage answering snapshot reads
//! - TransactionTable: transaction records and the client index
//! - ConcurrencyController: read/write validation, wait-for graph,
//!   deadlock detection
//! - Undo log and rollback engine over the raw store
//! - TransactionManager: the public facade (`begin` / `execute` / `commit` /
//!   `rollback`) with restart-on-conflict and a retry helper

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod clock;
pub mod config;
pub mod controller;
pub mod events;
pub mod manager;
pub mod registry;
pub mod store;
pub mod transaction;
pub mod undo;
pub mod version;

mod retry;

pub use clock::TimestampOracle;
pub use config::ManagerConfig;
pub use controller::ConcurrencyController;
pub use events::{AuditEvent, AuditKind, AuditLog};
pub use manager::{OpRequest, OpResult, Statistics, TransactionManager};
pub use registry::TransactionTable;
pub use store::StoreAdapter;
pub use transaction::{Operation, Transaction, TransactionStatus};
pub use undo::{roll_back, UndoRecord};
pub use version::{VersionEntry, VersionLog};
