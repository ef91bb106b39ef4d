//! Row: an ordered field bag
//!
//! Tables store rows as opaque `field name -> Value` maps. A `BTreeMap` keeps
//! field order stable so formatted output and comparisons are deterministic.
//! `Row::clone()` is the deep copy the isolation contract relies on.

use crate::types::RecordId;
use crate::value::Value;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Primary key field name shared by every table
pub const PK_FIELD: &str = "id";

/// One record of a table: a named bag of [`Value`]s
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Row {
    fields: BTreeMap<String, Value>,
}

impl Row {
    /// Create an empty row
    pub fn new() -> Self {
        Row::default()
    }

    /// Read a field
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }

    /// Write a field, returning `self` for chained construction
    pub fn with(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.set(field, value);
        self
    }

    /// Write a field in place
    pub fn set(&mut self, field: impl Into<String>, value: impl Into<Value>) {
        self.fields.insert(field.into(), value.into());
    }

    /// Apply `patch` over this row: every field present in the patch replaces
    /// the field of the same name here. Fields absent from the patch survive.
    pub fn merge(&mut self, patch: &Row) {
        for (name, value) in patch.iter() {
            self.fields.insert(name.clone(), value.clone());
        }
    }

    /// The primary key, when the row carries one
    pub fn id(&self) -> Option<RecordId> {
        self.get(PK_FIELD).and_then(Value::as_i64)
    }

    /// Set the primary key
    pub fn set_id(&mut self, id: RecordId) {
        self.set(PK_FIELD, id);
    }

    /// Integer field accessor
    pub fn i64(&self, field: &str) -> Option<i64> {
        self.get(field).and_then(Value::as_i64)
    }

    /// String field accessor
    pub fn str(&self, field: &str) -> Option<&str> {
        self.get(field).and_then(Value::as_str)
    }

    /// Boolean field accessor
    pub fn bool(&self, field: &str) -> Option<bool> {
        self.get(field).and_then(Value::as_bool)
    }

    /// Number of fields
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// True when the row has no fields
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Iterate fields in name order
    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.fields.iter()
    }

    /// Build a row from a JSON object; non-scalar members are rejected
    pub fn from_json(json: &serde_json::Value) -> Option<Row> {
        let object = json.as_object()?;
        let mut row = Row::new();
        for (name, member) in object {
            row.set(name.clone(), Value::from_json(member)?);
        }
        Some(row)
    }

    /// Render as a JSON object for output formatting
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::Value::Object(
            self.fields
                .iter()
                .map(|(name, value)| (name.clone(), value.to_json()))
                .collect(),
        )
    }
}

impl fmt::Display for Row {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{")?;
        for (i, (name, value)) in self.fields.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}: {}", name, value)?;
        }
        write!(f, "}}")
    }
}

impl FromIterator<(String, Value)> for Row {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Row {
            fields: iter.into_iter().collect(),
        }
    }
}
