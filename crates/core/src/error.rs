//! Error types for Tandem
//!
//! One unified enum for every layer, derived with `thiserror`. Restart and
//! deadlock signals are variants, not strings, so retry logic is type-checked.
//!
//! Three classes of failure behave differently:
//! - validation class (`RestartRequired`, `Deadlock`): the manager has already
//!   rolled the transaction back and started a fresh one under the client
//! - store class (`DatabaseNotFound` .. `RowNotFound`): the transaction is
//!   left ACTIVE and the caller decides
//! - terminal class (`ValidationFailed`, `BudgetExhausted`): the attempt is
//!   over; retrying is a caller-level decision

use crate::types::{RecordId, TxnId};
use thiserror::Error;

/// Result type alias for Tandem operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for the Tandem transaction layer
#[derive(Debug, Clone, Error, PartialEq)]
pub enum Error {
    /// Caller used a client token without `begin`
    #[error("no active transaction for client {client}")]
    NoActiveTransaction {
        /// Offending client token
        client: String,
    },

    /// Double `begin` for the same client token
    #[error("client {client} already has an active transaction")]
    AlreadyActive {
        /// Offending client token
        client: String,
    },

    /// Operation on a transaction past ACTIVE
    #[error("transaction {tid} is not active")]
    NotActive {
        /// The finished transaction
        tid: TxnId,
    },

    /// Timestamp-ordering conflict; the attempt was rolled back and a fresh
    /// transaction is already in place under the same client
    #[error("transaction {tid} restarted after ordering conflict on {resource}")]
    RestartRequired {
        /// The aborted attempt
        tid: TxnId,
        /// Resource the conflict was detected on
        resource: String,
    },

    /// Wait-for cycle selected this transaction as victim; handled like
    /// `RestartRequired`
    #[error("transaction {tid} restarted as deadlock victim")]
    Deadlock {
        /// The aborted attempt
        tid: TxnId,
    },

    /// Commit-time validation failed; the transaction is ABORTED
    #[error("commit validation failed: {detail}")]
    ValidationFailed {
        /// First failing resource, for diagnostics
        detail: String,
    },

    /// Named database does not exist
    #[error("database not found: {name}")]
    DatabaseNotFound {
        /// Requested database name
        name: String,
    },

    /// Database creation collided with an existing name
    #[error("database already exists: {name}")]
    DatabaseExists {
        /// Colliding database name
        name: String,
    },

    /// Table creation collided with an existing name
    #[error("table already exists: {db}.{table}")]
    TableExists {
        /// Database name
        db: String,
        /// Colliding table name
        table: String,
    },

    /// Named table does not exist in its database
    #[error("table not found: {db}.{table}")]
    TableNotFound {
        /// Database name
        db: String,
        /// Requested table name
        table: String,
    },

    /// INSERT carried a primary key that is already taken
    #[error("duplicate primary key {key} in table {table}")]
    DuplicateKey {
        /// Table name
        table: String,
        /// Colliding key
        key: RecordId,
    },

    /// UPDATE/DELETE named a row that does not exist
    #[error("row {key} not found in table {table}")]
    RowNotFound {
        /// Table name
        table: String,
        /// Missing key
        key: RecordId,
    },

    /// Retry helper ran out of attempts
    #[error("transaction failed after {attempts} attempts")]
    BudgetExhausted {
        /// Attempts consumed, including the first
        attempts: usize,
    },
}

/// Errors that can signal "roll back happened, run the unit of work again"
///
/// Implemented by [`Error`] and by service-layer error enums that wrap it, so
/// one retry helper serves both.
pub trait Restartable {
    /// True when the transaction was restarted and the work should re-run
    fn is_restartable(&self) -> bool;
}

impl Error {
    /// True for failures of the underlying store; these leave the
    /// transaction ACTIVE
    pub fn is_store(&self) -> bool {
        matches!(
            self,
            Error::DatabaseNotFound { .. }
                | Error::DatabaseExists { .. }
                | Error::TableNotFound { .. }
                | Error::TableExists { .. }
                | Error::DuplicateKey { .. }
                | Error::RowNotFound { .. }
        )
    }
}

impl Restartable for Error {
    fn is_restartable(&self) -> bool {
        matches!(self, Error::RestartRequired { .. } | Error::Deadlock { .. })
    }
}
