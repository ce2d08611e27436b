//! Typed attribute values.

use super::field::FieldType;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::hash::{Hash, Hasher};

/// A typed attribute value.
///
/// `Value` is usable as a group-by key: equality and hashing are defined for
/// every variant, with doubles compared by bit pattern (group keys in
/// practice are integers or text; bitwise identity is exact for values that
/// were copied, never recomputed).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Value {
    Double(f64),
    Integer(i64),
    Text(String),
    Null,
}

impl Value {
    /// Numeric view of the value: doubles as-is, integers widened.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Double(v) => Some(*v),
            Value::Integer(v) => Some(*v as f64),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// The field type this value naturally belongs to, if not null.
    pub fn field_type(&self) -> Option<FieldType> {
        match self {
            Value::Double(_) => Some(FieldType::Double),
            Value::Integer(_) => Some(FieldType::Integer),
            Value::Text(_) => Some(FieldType::Text),
            Value::Null => None,
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Double(a), Value::Double(b)) => a.to_bits() == b.to_bits(),
            (Value::Integer(a), Value::Integer(b)) => a == b,
            (Value::Text(a), Value::Text(b)) => a == b,
            (Value::Null, Value::Null) => true,
            _ => false,
        }
    }
}

impl Eq for Value {}

impl Hash for Value {
    fn hash<H: Hasher>(&self, state: &mut H) {
        core::mem::discriminant(self).hash(state);
        match self {
            Value::Double(v) => v.to_bits().hash(state),
            Value::Integer(v) => v.hash(state),
            Value::Text(s) => s.hash(state),
            Value::Null => {}
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Double(v) => write!(f, "{v}"),
            Value::Integer(v) => write!(f, "{v}"),
            Value::Text(s) => f.write_str(s),
            Value::Null => f.write_str("<null>"),
        }
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Double(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Integer(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Text(v)
    }
}
