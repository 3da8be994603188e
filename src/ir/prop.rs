use serde::{Deserialize, Serialize};
use std::fmt;

/// Property value stored in a node's property bag.
///
/// The IGV parser stores decimal-looking attribute values as `I32` and
/// everything else as `Str`; hand-built graphs may use any variant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PropValue {
    I32(i32),
    I64(i64),
    Bool(bool),
    Str(String),
}

impl PropValue {
    pub fn as_i32(&self) -> Option<i32> {
        match self {
            PropValue::I32(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            PropValue::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            PropValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Widening numeric view: integers widen, booleans map to 0/1, and
    /// strings are accepted when they parse as decimal integers.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            PropValue::I32(v) => Some(i64::from(*v)),
            PropValue::I64(v) => Some(*v),
            PropValue::Bool(b) => Some(i64::from(*b)),
            PropValue::Str(s) => s.trim().parse::<i64>().ok(),
        }
    }

    /// Loose boolean view used for flag-style properties (`array`,
    /// `is_block_start`): any non-zero number or a "true"/"1" string.
    pub fn truthy(&self) -> bool {
        match self {
            PropValue::Bool(b) => *b,
            PropValue::I32(v) => *v != 0,
            PropValue::I64(v) => *v != 0,
            PropValue::Str(s) => s == "true" || s == "1",
        }
    }
}

impl From<i32> for PropValue {
    fn from(v: i32) -> Self {
        PropValue::I32(v)
    }
}

impl From<i64> for PropValue {
    fn from(v: i64) -> Self {
        PropValue::I64(v)
    }
}

impl From<bool> for PropValue {
    fn from(v: bool) -> Self {
        PropValue::Bool(v)
    }
}

impl From<&str> for PropValue {
    fn from(v: &str) -> Self {
        PropValue::Str(v.to_string())
    }
}

impl From<String> for PropValue {
    fn from(v: String) -> Self {
        PropValue::Str(v)
    }
}

impl fmt::Display for PropValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PropValue::I32(v) => write!(f, "{v}"),
            PropValue::I64(v) => write!(f, "{v}"),
            PropValue::Bool(b) => write!(f, "{b}"),
            PropValue::Str(s) => write!(f, "{s}"),
        }
    }
}
