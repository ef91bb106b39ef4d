//! Business services for Tandem
//!
//! Multi-step units of work composed from core operations: money transfers
//! within the financial store, and order placement spanning both stores.
//! Every unit of work runs through the manager's retry helper, so
//! timestamp-ordering restarts are invisible to callers.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod banking;
pub mod entities;
pub mod error;
pub mod inventory;
pub mod seed;

pub use banking::Bank;
pub use entities::{Account, Category, Entity, LedgerEntry, Order, OrderItem, Product, User};
pub use error::{ServiceError, ServiceResult};
pub use inventory::Inventory;
pub use seed::seed_sample_data;
