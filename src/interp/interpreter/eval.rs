//! Demand-driven, memoized evaluation of the value subgraph.

use anyhow::anyhow;

use crate::ir::{NodeIdx, Opcode, dump_spec};

use super::super::error::EvalResult;
use super::super::evaluator;
use super::super::value::Value;
use super::Execution;

impl Execution<'_> {
    /// Evaluate a value-producing node with memoization. Cycle detection
    /// and the recursion-depth budget wrap the per-opcode dispatch; loop
    /// Phis being advanced read their previous-iteration snapshot instead
    /// of recursing.
    pub(super) fn eval(&mut self, idx: NodeIdx) -> EvalResult<Value> {
        if let Some(update) = &self.phi_update
            && let Some(old) = update.snapshot(idx)
        {
            return Ok(old);
        }
        if let Some(v) = self.value_cache.get(&idx) {
            return Ok(*v);
        }
        if !self.eval_active.insert(idx) {
            return Err(anyhow!("cyclic value evaluation at node {}", self.node_id(idx)).into());
        }
        if self.eval_depth >= self.limits.max_eval_depth {
            self.eval_active.remove(&idx);
            return Err(anyhow!(
                "value recursion depth ({}) exceeded at node {}",
                self.limits.max_eval_depth,
                self.node_id(idx)
            )
            .into());
        }
        self.eval_depth += 1;
        let result = self.eval_dispatch(idx);
        self.eval_depth -= 1;
        self.eval_active.remove(&idx);
        let value = result?;
        self.value_cache.insert(idx, value);
        Ok(value)
    }

    fn eval_dispatch(&mut self, idx: NodeIdx) -> EvalResult<Value> {
        let graph = self.graph;
        let node = graph.node(idx);
        match node.opcode() {
            Opcode::ConI => self.const_i32(idx),
            Opcode::ConL => self.const_i64(idx),
            Opcode::ConP => Ok(Value::Null),

            // Bound data parms were cached before control flow started.
            Opcode::Parm => Ok(Value::I32(0)),

            Opcode::AddI
            | Opcode::SubI
            | Opcode::MulI
            | Opcode::DivI
            | Opcode::ModI
            | Opcode::AddL
            | Opcode::SubL
            | Opcode::MulL
            | Opcode::DivL
            | Opcode::ModL
            | Opcode::AndI
            | Opcode::OrI
            | Opcode::XorI
            | Opcode::LShiftI
            | Opcode::RShiftI
            | Opcode::URShiftI
            | Opcode::AndL
            | Opcode::OrL
            | Opcode::XorL
            | Opcode::LShiftL
            | Opcode::RShiftL
            | Opcode::URShiftL
            | Opcode::CmpI
            | Opcode::CmpL
            | Opcode::CmpU
            | Opcode::CmpUL
            | Opcode::CmpP => {
                let (a, b) = self.binary_operands(idx)?;
                evaluator::binary(node.opcode(), a, b)
            }

            Opcode::AbsI | Opcode::AbsL | Opcode::ConvI2L | Opcode::ConvL2I | Opcode::Conv2B => {
                let a = self.unary_operand(idx)?;
                evaluator::unary(node.opcode(), a)
            }

            Opcode::Bool => self.eval_bool(idx),
            Opcode::CMoveI | Opcode::CMoveL | Opcode::CMoveP => self.eval_cmove(idx),

            // Type-system assertions have no runtime effect.
            Opcode::CastII | Opcode::CastLL | Opcode::CastPP | Opcode::CastX2P
            | Opcode::CastP2X => match node.first_value_input() {
                Some(src) => self.eval(src),
                None => {
                    Err(anyhow!("cast node {} has no value input", node.id()).into())
                }
            },

            Opcode::Opaque1 | Opcode::SafePoint | Opcode::ParsePredicate | Opcode::Proj => {
                match node.first_value_input() {
                    Some(src) => self.eval(src),
                    None => Ok(Value::I32(0)),
                }
            }

            Opcode::ThreadLocal => Ok(Value::Null),

            Opcode::CallStaticJava => {
                if node.dump_spec().is_some_and(dump_spec::mentions_uncommon_trap) {
                    // Uncommon traps are assumed non-firing.
                    Ok(Value::I32(0))
                } else {
                    Err(anyhow!(
                        "real method calls are not supported (node {})",
                        node.id()
                    )
                    .into())
                }
            }

            Opcode::Allocate => {
                let r = self.heap.allocate_object();
                Ok(Value::Ref(r))
            }
            Opcode::AllocateArray => self.eval_allocate_array(idx),
            Opcode::LoadRange => self.eval_load_range(idx),
            Opcode::RangeCheck => self.eval_range_check(idx),
            Opcode::AddP => self.eval_addp(idx),
            op if op.is_load() => self.eval_load(idx),

            Opcode::Phi => self.eval_phi(idx),

            Opcode::Halt => {
                Err(anyhow!("Halt node {} evaluated as data", node.id()).into())
            }
            Opcode::Unknown => Err(anyhow!(
                "unknown opcode at node {} cannot be evaluated",
                node.id()
            )
            .into()),
            op if op.is_store() => {
                Err(anyhow!("store node {} evaluated as data", node.id()).into())
            }
            other => Err(anyhow!(
                "control node {} ({other}) evaluated as data",
                node.id()
            )
            .into()),
        }
    }

    fn const_i32(&self, idx: NodeIdx) -> EvalResult<Value> {
        let node = self.graph.node(idx);
        if let Some(v) = node.prop_i64("value") {
            return Ok(Value::I32(v as i32));
        }
        if let Some(v) = node.dump_spec().and_then(dump_spec::int_constant) {
            return Ok(Value::I32(v));
        }
        Err(anyhow!("ConI node {} has no value", node.id()).into())
    }

    fn const_i64(&self, idx: NodeIdx) -> EvalResult<Value> {
        let node = self.graph.node(idx);
        if let Some(v) = node.prop_i64("value") {
            return Ok(Value::I64(v));
        }
        if let Some(v) = node.dump_spec().and_then(dump_spec::long_constant) {
            return Ok(Value::I64(v));
        }
        Err(anyhow!("ConL node {} has no value", node.id()).into())
    }

    /// C2 places binary operands at inputs 1 and 2 with a hole at 0;
    /// hand-built graphs use 0 and 1. Value inputs skip holes, so the first
    /// two cover both conventions.
    fn binary_operands(&mut self, idx: NodeIdx) -> EvalResult<(Value, Value)> {
        let operands = self.graph.node(idx).value_inputs();
        if operands.len() < 2 {
            return Err(anyhow!(
                "node {} needs two operands, has {}",
                self.node_id(idx),
                operands.len()
            )
            .into());
        }
        let a = self.eval(operands[0])?;
        let b = self.eval(operands[1])?;
        Ok((a, b))
    }

    fn unary_operand(&mut self, idx: NodeIdx) -> EvalResult<Value> {
        match self.graph.node(idx).first_value_input() {
            Some(op) => self.eval(op),
            None => Err(anyhow!("node {} has no operand", self.node_id(idx)).into()),
        }
    }

    fn eval_bool(&mut self, idx: NodeIdx) -> EvalResult<Value> {
        let node = self.graph.node(idx);
        let cmp = match node.first_value_input() {
            Some(c) => c,
            None => {
                return Err(
                    anyhow!("Bool node {} has no comparison input", node.id()).into()
                );
            }
        };
        let mask = match node.prop_i64("mask") {
            Some(m) => m as i32,
            None => match node.dump_spec().and_then(dump_spec::cond_mask) {
                Some(m) => m,
                None => {
                    return Err(
                        anyhow!("Bool node {} has no condition mask", node.id()).into()
                    );
                }
            },
        };
        let tri = self.eval(cmp)?;
        evaluator::bool_cond(tri, mask)
    }

    fn eval_cmove(&mut self, idx: NodeIdx) -> EvalResult<Value> {
        let operands = self.graph.node(idx).value_inputs();
        if operands.len() < 3 {
            return Err(anyhow!(
                "conditional move node {} needs condition and two values",
                self.node_id(idx)
            )
            .into());
        }
        let cond = self.eval(operands[0])?;
        let on_true = self.eval(operands[1])?;
        let on_false = self.eval(operands[2])?;
        Ok(evaluator::cmove(cond, on_true, on_false))
    }

    fn eval_allocate_array(&mut self, idx: NodeIdx) -> EvalResult<Value> {
        let graph = self.graph;
        let node = graph.node(idx);
        // The length is the first data input; dumps interleave control and
        // memory edges before it.
        let mut length_src = None;
        for pos in 1..node.num_inputs() {
            let Some(input) = node.input(pos) else { continue };
            let op = graph.node(input).opcode();
            if op.is_control() || op == Opcode::MergeMem {
                continue;
            }
            length_src = Some(input);
            break;
        }
        let length_src = match length_src {
            Some(s) => s,
            None => {
                return Err(
                    anyhow!("AllocateArray node {} has no length input", node.id()).into()
                );
            }
        };
        let length = self.eval(length_src)?;
        let length = self.int_value(length, idx)?;
        let r = self.heap.allocate_array(length)?;
        Ok(Value::Ref(r))
    }

    /// Narrow an evaluated value to an i32 for lengths and indices. C2
    /// addressing arithmetic widens indices to i64.
    pub(super) fn int_value(&self, value: Value, at: NodeIdx) -> EvalResult<i32> {
        match value {
            Value::I32(v) => Ok(v),
            Value::I64(v) => Ok(v as i32),
            other => Err(anyhow!(
                "expected an integer at node {}, got {other}",
                self.node_id(at)
            )
            .into()),
        }
    }
}
