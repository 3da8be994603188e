//! Pure per-opcode semantics: two's-complement integer arithmetic, bitwise
//! ops, masked shifts, tri-state comparisons, conversions and conditional
//! moves.
//!
//! All operations are total on well-typed inputs. A type mismatch is an
//! interpreter bug and surfaces on the fatal channel; only zero divisors
//! trap.

use anyhow::anyhow;
use std::cmp::Ordering;

use crate::ir::Opcode;

use super::error::{EvalResult, Trap};
use super::value::Value;

/// `*L` operations accept an `I32` operand and widen it, matching C2's
/// implicit sign extension at mixed-width nodes.
fn widen(v: Value) -> EvalResult<i64> {
    match v {
        Value::I32(x) => Ok(i64::from(x)),
        Value::I64(x) => Ok(x),
        other => Err(anyhow!("value is not an integer: {other}").into()),
    }
}

fn tri(ord: Ordering) -> Value {
    Value::I32(match ord {
        Ordering::Less => -1,
        Ordering::Equal => 0,
        Ordering::Greater => 1,
    })
}

/// Apply a binary opcode. Shift counts are masked to the operand width
/// (`& 0x1F` for i32, `& 0x3F` for i64); everything else wraps.
pub fn binary(op: Opcode, a: Value, b: Value) -> EvalResult<Value> {
    match op {
        Opcode::AddI => Ok(Value::I32(a.as_i32()?.wrapping_add(b.as_i32()?))),
        Opcode::SubI => Ok(Value::I32(a.as_i32()?.wrapping_sub(b.as_i32()?))),
        Opcode::MulI => Ok(Value::I32(a.as_i32()?.wrapping_mul(b.as_i32()?))),
        Opcode::DivI => {
            let d = b.as_i32()?;
            if d == 0 {
                return Err(Trap::DivisionByZero.into());
            }
            Ok(Value::I32(a.as_i32()?.wrapping_div(d)))
        }
        Opcode::ModI => {
            let d = b.as_i32()?;
            if d == 0 {
                return Err(Trap::ModuloByZero.into());
            }
            Ok(Value::I32(a.as_i32()?.wrapping_rem(d)))
        }

        Opcode::AddL => Ok(Value::I64(widen(a)?.wrapping_add(widen(b)?))),
        Opcode::SubL => Ok(Value::I64(widen(a)?.wrapping_sub(widen(b)?))),
        Opcode::MulL => Ok(Value::I64(widen(a)?.wrapping_mul(widen(b)?))),
        Opcode::DivL => {
            let d = widen(b)?;
            if d == 0 {
                return Err(Trap::DivisionByZero.into());
            }
            Ok(Value::I64(widen(a)?.wrapping_div(d)))
        }
        Opcode::ModL => {
            let d = widen(b)?;
            if d == 0 {
                return Err(Trap::ModuloByZero.into());
            }
            Ok(Value::I64(widen(a)?.wrapping_rem(d)))
        }

        Opcode::AndI => Ok(Value::I32(a.as_i32()? & b.as_i32()?)),
        Opcode::OrI => Ok(Value::I32(a.as_i32()? | b.as_i32()?)),
        Opcode::XorI => Ok(Value::I32(a.as_i32()? ^ b.as_i32()?)),
        Opcode::LShiftI => Ok(Value::I32(a.as_i32()? << (b.as_i32()? & 0x1F))),
        Opcode::RShiftI => Ok(Value::I32(a.as_i32()? >> (b.as_i32()? & 0x1F))),
        Opcode::URShiftI => {
            let ua = a.as_i32()? as u32;
            Ok(Value::I32((ua >> (b.as_i32()? & 0x1F)) as i32))
        }

        Opcode::AndL => Ok(Value::I64(widen(a)? & widen(b)?)),
        Opcode::OrL => Ok(Value::I64(widen(a)? | widen(b)?)),
        Opcode::XorL => Ok(Value::I64(widen(a)? ^ widen(b)?)),
        Opcode::LShiftL => Ok(Value::I64(widen(a)? << (widen(b)? & 0x3F))),
        Opcode::RShiftL => Ok(Value::I64(widen(a)? >> (widen(b)? & 0x3F))),
        Opcode::URShiftL => {
            let ua = widen(a)? as u64;
            Ok(Value::I64((ua >> (widen(b)? & 0x3F)) as i64))
        }

        Opcode::CmpI => Ok(tri(a.as_i32()?.cmp(&b.as_i32()?))),
        Opcode::CmpL => Ok(tri(widen(a)?.cmp(&widen(b)?))),
        Opcode::CmpU => Ok(tri((a.as_i32()? as u32).cmp(&(b.as_i32()? as u32)))),
        Opcode::CmpUL => Ok(tri((widen(a)? as u64).cmp(&(widen(b)? as u64)))),
        Opcode::CmpP => Ok(tri(a.as_ref_id()?.cmp(&b.as_ref_id()?))),

        other => Err(anyhow!("not a binary opcode: {other}").into()),
    }
}

/// Apply a unary opcode. `AbsI/L` wrap on the most-negative input.
pub fn unary(op: Opcode, a: Value) -> EvalResult<Value> {
    match op {
        Opcode::AbsI => Ok(Value::I32(a.as_i32()?.wrapping_abs())),
        Opcode::AbsL => Ok(Value::I64(widen(a)?.wrapping_abs())),
        Opcode::ConvI2L => Ok(Value::I64(i64::from(a.as_i32()?))),
        Opcode::ConvL2I => Ok(Value::I32(widen(a)? as i32)),
        Opcode::Conv2B => Ok(conv2b(a)),
        other => Err(anyhow!("not a unary opcode: {other}").into()),
    }
}

/// `Conv2B`: any zero-ish value maps to `I32(0)`, everything else to
/// `I32(1)`.
pub fn conv2b(a: Value) -> Value {
    Value::I32(i32::from(a.truthy()))
}

/// `Bool`: test a tri-state comparison result against a `{LT=1, EQ=2,
/// GT=4}` condition-code mask.
pub fn bool_cond(result: Value, mask: i32) -> EvalResult<Value> {
    use crate::ir::dump_spec::{MASK_EQ, MASK_GT, MASK_LT};
    let r = result.as_i32()?;
    let bit = match r.cmp(&0) {
        Ordering::Less => MASK_LT,
        Ordering::Equal => MASK_EQ,
        Ordering::Greater => MASK_GT,
    };
    Ok(Value::Bool(mask & bit != 0))
}

/// `CMoveI/L/P`: select the first value on a true condition, the second
/// otherwise.
pub fn cmove(cond: Value, on_true: Value, on_false: Value) -> Value {
    if cond.truthy() { on_true } else { on_false }
}
