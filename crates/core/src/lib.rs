//! Core types for Tandem
//!
//! This crate defines the vocabulary shared by every layer of the system:
//! - Value / Row: dynamic field bags stored in tables
//! - ResourceId: identity of one row (or a whole table) across both stores
//! - TxnId / Timestamp: transaction identity and ordering
//! - Error: the unified error enum for all Tandem APIs

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod error;
pub mod resource;
pub mod row;
pub mod types;
pub mod value;

pub use error::{Error, Restartable, Result};
pub use resource::{ResourceId, ResourceKey};
pub use row::Row;
pub use types::{OpKind, RecordId, Timestamp, TxnId};
pub use value::Value;
