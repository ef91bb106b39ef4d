//! In-memory relational store for Tandem
//!
//! Databases hold named tables; tables hold rows keyed by a store-assigned
//! integer primary key. Every single-row operation is atomic and thread-safe
//! on its own, and nothing more: atomicity and isolation across operations
//! belong entirely to the concurrency layer above.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod catalog;
pub mod database;
pub mod table;

pub use catalog::Catalog;
pub use database::Database;
pub use table::Table;
