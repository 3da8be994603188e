use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt::Write as _;

use tracing::trace;

use super::error::Trap;
use super::value::{RefId, Value};

/// Concrete object/array heap.
///
/// Objects are sparse field maps; arrays are dense value sequences with an
/// explicit length. References are allocated from a monotonically
/// increasing counter starting at 1, so a reference is unique for the
/// heap's lifetime. Ordered maps keep [`Heap::dump`] deterministic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Heap {
    next_ref: RefId,
    fields: BTreeMap<(RefId, String), Value>,
    arrays: BTreeMap<RefId, Vec<Value>>,
    array_lengths: BTreeMap<RefId, i32>,
}

impl Default for Heap {
    fn default() -> Self {
        Self::new()
    }
}

impl Heap {
    pub fn new() -> Self {
        Self {
            next_ref: 1,
            fields: BTreeMap::new(),
            arrays: BTreeMap::new(),
            array_lengths: BTreeMap::new(),
        }
    }

    /// The next reference the heap would hand out. Strictly greater than
    /// every reference allocated so far.
    pub fn next_ref(&self) -> RefId {
        self.next_ref
    }

    /// Allocate a fresh object. Fields are not initialized; unread fields
    /// default to `I32(0)`.
    pub fn allocate_object(&mut self) -> RefId {
        let r = self.next_ref;
        self.next_ref += 1;
        trace!(r, "allocate object");
        r
    }

    /// Allocate an array of `length` elements initialized to `I32(0)`.
    pub fn allocate_array(&mut self, length: i32) -> Result<RefId, Trap> {
        if length < 0 {
            return Err(Trap::NegativeArrayLength);
        }
        let r = self.next_ref;
        self.next_ref += 1;
        self.arrays.insert(r, vec![Value::I32(0); length as usize]);
        self.array_lengths.insert(r, length);
        trace!(r, length, "allocate array");
        Ok(r)
    }

    /// Read a field; uninitialized fields read as `I32(0)`.
    pub fn read_field(&self, obj: RefId, field: &str) -> Value {
        self.fields
            .get(&(obj, field.to_string()))
            .copied()
            .unwrap_or(Value::I32(0))
    }

    pub fn write_field(&mut self, obj: RefId, field: &str, value: Value) {
        self.fields.insert((obj, field.to_string()), value);
    }

    pub fn read_array(&self, arr: RefId, index: i32) -> Result<Value, Trap> {
        let elems = self.arrays.get(&arr).ok_or(Trap::InvalidArrayRef)?;
        if index < 0 || index as usize >= elems.len() {
            return Err(Trap::IndexOutOfBounds);
        }
        Ok(elems[index as usize])
    }

    pub fn write_array(&mut self, arr: RefId, index: i32, value: Value) -> Result<(), Trap> {
        let elems = self.arrays.get_mut(&arr).ok_or(Trap::InvalidArrayRef)?;
        if index < 0 || index as usize >= elems.len() {
            return Err(Trap::IndexOutOfBounds);
        }
        elems[index as usize] = value;
        Ok(())
    }

    pub fn array_length(&self, arr: RefId) -> Result<i32, Trap> {
        self.array_lengths.get(&arr).copied().ok_or(Trap::InvalidArrayRef)
    }

    pub fn is_array(&self, r: RefId) -> bool {
        self.arrays.contains_key(&r)
    }

    /// Human-readable heap summary for debugging and failure reports.
    pub fn dump(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "=== Heap Dump ===");
        let _ = writeln!(out, "Next ref: {}", self.next_ref);
        if !self.fields.is_empty() {
            let _ = writeln!(out, "Fields:");
            for ((obj, field), value) in &self.fields {
                let _ = writeln!(out, "  ref:{obj}.{field} = {value}");
            }
        }
        if !self.arrays.is_empty() {
            let _ = writeln!(out, "Arrays:");
            for (r, elems) in &self.arrays {
                let _ = write!(out, "  ref:{r}[{}]", self.array_lengths[r]);
                if !elems.is_empty() {
                    let rendered: Vec<String> = elems.iter().map(Value::to_string).collect();
                    let _ = write!(out, " = {{{}}}", rendered.join(", "));
                }
                let _ = writeln!(out);
            }
        }
        let _ = writeln!(out, "=================");
        out
    }
}
