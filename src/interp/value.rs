use anyhow::{Result, bail};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Heap reference. Positive values name live objects or arrays; `0` is
/// reserved for null and never allocated.
pub type RefId = i32;

/// Tagged runtime value. Values are immutable; every operation produces a
/// new one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Value {
    I32(i32),
    I64(i64),
    Bool(bool),
    Ref(RefId),
    Null,
}

impl Value {
    pub fn is_i32(self) -> bool {
        matches!(self, Value::I32(_))
    }

    pub fn is_i64(self) -> bool {
        matches!(self, Value::I64(_))
    }

    pub fn is_bool(self) -> bool {
        matches!(self, Value::Bool(_))
    }

    pub fn is_ref(self) -> bool {
        matches!(self, Value::Ref(_))
    }

    pub fn is_null(self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_i32(self) -> Result<i32> {
        match self {
            Value::I32(v) => Ok(v),
            other => bail!("value is not i32: {other}"),
        }
    }

    pub fn as_i64(self) -> Result<i64> {
        match self {
            Value::I64(v) => Ok(v),
            other => bail!("value is not i64: {other}"),
        }
    }

    pub fn as_bool(self) -> Result<bool> {
        match self {
            Value::Bool(b) => Ok(b),
            other => bail!("value is not bool: {other}"),
        }
    }

    /// Reference view; `Null` reads as reference `0`.
    pub fn as_ref_id(self) -> Result<RefId> {
        match self {
            Value::Ref(r) => Ok(r),
            Value::Null => Ok(0),
            other => bail!("value is not a reference: {other}"),
        }
    }

    /// Branch-condition view: boolean truth, or non-zero for the numeric
    /// and reference variants.
    pub fn truthy(self) -> bool {
        match self {
            Value::I32(v) => v != 0,
            Value::I64(v) => v != 0,
            Value::Bool(b) => b,
            Value::Ref(r) => r != 0,
            Value::Null => false,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::I32(v) => write!(f, "i32:{v}"),
            Value::I64(v) => write!(f, "i64:{v}"),
            Value::Bool(b) => write!(f, "bool:{b}"),
            Value::Ref(r) => write!(f, "ref:{r}"),
            Value::Null => write!(f, "null"),
        }
    }
}
