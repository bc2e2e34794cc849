//! Values and context-qualified value rows.
//!
//! A [`Value`] is the arbitrary structured payload a variable holds for an
//! instance. A [`VariableValue`] is one stored row: a value plus the exact
//! context under which it applies and its write bookkeeping.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::context::Context;
use crate::instance::InstanceKey;
use crate::variable::VariableId;

/// Possible values a variable can hold.
///
/// Covers primitives plus arbitrary nested JSON via `Structured`.
///
/// # Examples
///
/// ```
/// use varstore::Value;
///
/// let flag = Value::Bool(true);
/// let amount = Value::Float(12.5);
///
/// assert!(flag.is_bool());
/// assert_eq!(amount.as_float(), Some(12.5));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum Value {
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    Structured(serde_json::Value),
    Null,
}

impl Value {
    pub const fn is_bool(&self) -> bool {
        matches!(self, Self::Bool(_))
    }

    pub const fn is_int(&self) -> bool {
        matches!(self, Self::Int(_))
    }

    pub const fn is_float(&self) -> bool {
        matches!(self, Self::Float(_))
    }

    pub const fn is_string(&self) -> bool {
        matches!(self, Self::String(_))
    }

    pub const fn is_structured(&self) -> bool {
        matches!(self, Self::Structured(_))
    }

    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    pub const fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(v) => Some(*v),
            _ => None,
        }
    }

    pub const fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(v) => Some(*v),
            _ => None,
        }
    }

    pub const fn as_float(&self) -> Option<f64> {
        match self {
            Self::Float(v) => Some(*v),
            Self::Int(v) => Some(*v as f64),
            _ => None,
        }
    }

    pub fn as_string(&self) -> Option<&str> {
        match self {
            Self::String(v) => Some(v),
            _ => None,
        }
    }

    pub const fn as_structured(&self) -> Option<&serde_json::Value> {
        match self {
            Self::Structured(v) => Some(v),
            _ => None,
        }
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Self::String(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Self::String(v)
    }
}

impl From<serde_json::Value> for Value {
    fn from(v: serde_json::Value) -> Self {
        Self::Structured(v)
    }
}

/// One context-qualified value row for a (variable, instance) pair.
///
/// Identity is the triple (variable, instance, exact context): a pair may
/// hold many rows distinguished by context, but at most one per exact
/// context. Overwriting an existing row replaces the value and refreshes
/// `updated_at`; the stored context itself is never partially edited.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VariableValue {
    pub variable_id: VariableId,
    pub instance: InstanceKey,

    /// The exact context this row was written under.
    #[serde(default)]
    pub context: Context,

    pub value: Value,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,

    /// Store-assigned monotonic write sequence. The recency tie-break of
    /// resolution compares this, not wall-clock time, so two writes within
    /// one clock tick still have a deterministic winner.
    pub write_seq: u64,
}

impl VariableValue {
    /// Creates a new row with the given write sequence.
    #[must_use]
    pub fn new(
        variable_id: VariableId,
        instance: InstanceKey,
        context: Context,
        value: Value,
        write_seq: u64,
    ) -> Self {
        let now = Utc::now();
        Self {
            variable_id,
            instance,
            context,
            value,
            created_at: now,
            updated_at: now,
            write_seq,
        }
    }

    /// Replaces the value in place, keeping `created_at` and the context.
    pub fn overwrite(&mut self, value: Value, write_seq: u64) {
        self.value = value;
        self.write_seq = write_seq;
        self.updated_at = Utc::now();
    }
}
