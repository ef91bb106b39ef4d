//! Identifiers and ordering primitives

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Store-assigned primary key
pub type RecordId = i64;

/// Unique transaction identifier
///
/// Random 128-bit ids keep transaction identity independent from timestamp
/// ordering; ordering lives in [`Timestamp`] alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TxnId(Uuid);

impl TxnId {
    /// Create a new random transaction id (UUID v4)
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Parse from the standard UUID string form
    pub fn from_string(s: &str) -> Option<Self> {
        Uuid::parse_str(s).ok().map(Self)
    }

    /// Leading eight hex digits, for compact log lines
    pub fn short(&self) -> String {
        self.0.simple().to_string()[..8].to_string()
    }
}

impl Default for TxnId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for TxnId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Monotonic transaction timestamp
///
/// A 64-bit integer on the microsecond scale. Both the serialization order of
/// transactions and the version stamp of writes. Unique per `begin` across the
/// process.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
pub struct Timestamp(pub u64);

impl Timestamp {
    /// Raw counter value
    pub fn as_micros(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The four operations a transaction can execute
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OpKind {
    /// Read one row by key, or scan a whole table
    Select,
    /// Insert a new row, store assigns the key
    Insert,
    /// Patch an existing row by key
    Update,
    /// Remove a row by key
    Delete,
}

impl OpKind {
    /// True for operations that mutate the store
    pub fn is_mutation(&self) -> bool {
        !matches!(self, OpKind::Select)
    }
}

impl fmt::Display for OpKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            OpKind::Select => "SELECT",
            OpKind::Insert => "INSERT",
            OpKind::Update => "UPDATE",
            OpKind::Delete => "DELETE",
        };
        write!(f, "{}", name)
    }
}

impl FromStr for OpKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "SELECT" => Ok(OpKind::Select),
            "INSERT" => Ok(OpKind::Insert),
            "UPDATE" => Ok(OpKind::Update),
            "DELETE" => Ok(OpKind::Delete),
            other => Err(format!("unknown operation: {}", other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_txn_ids_are_unique() {
        let a = TxnId::new();
        let b = TxnId::new();
        assert_ne!(a, b);
    }

    #[test]
    fn test_txn_id_string_round_trip() {
        let id = TxnId::new();
        assert_eq!(TxnId::from_string(&id.to_string()), Some(id));
    }

    #[test]
    fn test_txn_id_short_is_eight_chars() {
        assert_eq!(TxnId::new().short().len(), 8);
    }

    #[test]
    fn test_timestamp_ordering() {
        assert!(Timestamp(1) < Timestamp(2));
        assert_eq!(Timestamp(5).as_micros(), 5);
    }

    #[test]
    fn test_op_kind_parse() {
        assert_eq!("select".parse::<OpKind>(), Ok(OpKind::Select));
        assert_eq!("UPDATE".parse::<OpKind>(), Ok(OpKind::Update));
        assert!("upsert".parse::<OpKind>().is_err());
    }

    #[test]
    fn test_op_kind_mutation() {
        assert!(!OpKind::Select.is_mutation());
        assert!(OpKind::Insert.is_mutation());
        assert!(OpKind::Update.is_mutation());
        assert!(OpKind::Delete.is_mutation());
    }
}
