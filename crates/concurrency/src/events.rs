//! Audit event log
//!
//! Append-only in-memory record of transaction lifecycle events, mirrored to
//! `tracing` so an out-of-process sink can collect them. Feeds the
//! `log_entries` statistic.

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::Serialize;
use tandem_core::TxnId;

/// What happened
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum AuditKind {
    /// Transaction began
    Begin,
    /// Transaction committed
    Commit,
    /// Transaction rolled back
    Rollback,
    /// Transaction restarted under the same client with a fresh timestamp
    Restart,
    /// An operation failed against the store
    OperationError,
    /// An undo step failed during rollback
    RollbackError,
}

/// One audit record
#[derive(Debug, Clone, Serialize)]
pub struct AuditEvent {
    /// Wall-clock time of the event
    pub at: DateTime<Utc>,
    /// Event kind
    pub kind: AuditKind,
    /// Transaction the event belongs to
    pub tid: TxnId,
    /// Free-form context
    pub detail: String,
}

/// Append-only audit log
#[derive(Default)]
pub struct AuditLog {
    entries: Mutex<Vec<AuditEvent>>,
}

impl AuditLog {
    /// Create an empty log
    pub fn new() -> Self {
        AuditLog::default()
    }

    /// Append an event and mirror it to `tracing`
    pub fn record(&self, kind: AuditKind, tid: TxnId, detail: impl Into<String>) {
        let detail = detail.into();
        match kind {
            AuditKind::OperationError | AuditKind::RollbackError => {
                tracing::warn!(txn = %tid.short(), ?kind, detail = %detail, "transaction event");
            }
            AuditKind::Restart | AuditKind::Rollback => {
                tracing::info!(txn = %tid.short(), ?kind, detail = %detail, "transaction event");
            }
            _ => {
                tracing::debug!(txn = %tid.short(), ?kind, detail = %detail, "transaction event");
            }
        }
        self.entries.lock().push(AuditEvent {
            at: Utc::now(),
            kind,
            tid,
            detail,
        });
    }

    /// Number of recorded events
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    /// True when nothing has been recorded
    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    /// Copy of the recorded events
    pub fn entries(&self) -> Vec<AuditEvent> {
        self.entries.lock().clone()
    }
}
