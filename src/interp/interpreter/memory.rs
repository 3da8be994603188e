//! Memory-chain replay and the load/store/allocation opcodes.
//!
//! Stores are never stepped by the control walker. The heap instead catches
//! up with the memory state a consumer denotes: a Load replays the store
//! chain hanging off its memory input, and Region entries and the final
//! Return materialize the chains feeding their memory Phis. Replay executes
//! each store with the values currently cached, so it must happen while the
//! producing iteration's caches are still live — which Region-entry
//! materialization guarantees.

use anyhow::anyhow;
use tracing::{debug, trace};

use crate::ir::{NodeIdx, Opcode, dump_spec};
use crate::util::FastHashSet;

use super::super::error::{EvalResult, Trap};
use super::super::value::Value;
use super::Execution;

impl Execution<'_> {
    pub(super) fn eval_load(&mut self, idx: NodeIdx) -> EvalResult<Value> {
        let graph = self.graph;
        let node = graph.node(idx);
        if let Some(mem) = node.memory_input() {
            self.replay_memory_chain(mem)?;
        }
        let addr = match node.address_input() {
            Some(a) => a,
            None => {
                return Err(anyhow!("load node {} has no address input", node.id()).into());
            }
        };
        let base = self.eval(addr)?;
        let Value::Ref(base_ref) = base else {
            return Err(Trap::LoadBaseNotRef.into());
        };
        if self.is_array_access(idx, 3) {
            let index = self.load_index(idx)?;
            trace!(node = %node, base_ref, index, "array load");
            Ok(self.heap.read_array(base_ref, index)?)
        } else {
            let field = match node.prop_str("field") {
                Some(f) => f,
                None => {
                    return Err(anyhow!(
                        "load node {} has neither field name nor array index",
                        node.id()
                    )
                    .into());
                }
            };
            trace!(node = %node, base_ref, field, "field load");
            Ok(self.heap.read_field(base_ref, field))
        }
    }

    pub(super) fn eval_load_range(&mut self, idx: NodeIdx) -> EvalResult<Value> {
        let node = self.graph.node(idx);
        let addr = match node.first_value_input() {
            Some(a) => a,
            None => {
                return Err(
                    anyhow!("LoadRange node {} has no address input", node.id()).into()
                );
            }
        };
        let base = self.eval(addr)?;
        let Value::Ref(base_ref) = base else {
            return Err(Trap::LoadBaseNotRef.into());
        };
        Ok(Value::I32(self.heap.array_length(base_ref)?))
    }

    /// A `RangeCheck` consumed as data bounds-checks and passes through its
    /// index: the condition is `Bool(CmpU(index, length))`, whose operands
    /// give both sides of the check.
    pub(super) fn eval_range_check(&mut self, idx: NodeIdx) -> EvalResult<Value> {
        let graph = self.graph;
        let node = graph.node(idx);
        let cond = match node.first_value_input() {
            Some(c) => c,
            None => {
                return Err(anyhow!("RangeCheck node {} has no condition", node.id()).into());
            }
        };
        let cond_node = graph.node(cond);
        let cmp = if cond_node.opcode() == Opcode::Bool {
            cond_node.first_value_input()
        } else {
            Some(cond)
        };
        if let Some(cmp) = cmp {
            let cmp_node = graph.node(cmp);
            if matches!(
                cmp_node.opcode(),
                Opcode::CmpI | Opcode::CmpU | Opcode::CmpL | Opcode::CmpUL
            ) {
                let operands = cmp_node.value_inputs();
                if operands.len() >= 2 {
                    let index = self.eval(operands[0])?;
                    let index = self.int_value(index, idx)?;
                    let length = self.eval(operands[1])?;
                    let length = self.int_value(length, idx)?;
                    if index < 0 || index >= length {
                        return Err(Trap::IndexOutOfBounds.into());
                    }
                    return Ok(Value::I32(index));
                }
            }
        }
        // Unrecognized shape: plain pass-through of the condition value.
        self.eval(cond)
    }

    /// Addresses are modeled abstractly: an `AddP` stands for the object it
    /// addresses, so evaluating one yields its base reference. The
    /// index-bearing subexpression is consulted separately by loads.
    pub(super) fn eval_addp(&mut self, idx: NodeIdx) -> EvalResult<Value> {
        let operands = self.graph.node(idx).value_inputs();
        for operand in operands {
            let v = self.eval(operand)?;
            if matches!(v, Value::Ref(_) | Value::Null) {
                return Ok(v);
            }
        }
        Err(anyhow!(
            "AddP node {} has no reference operand",
            self.node_id(idx)
        )
        .into())
    }

    /// Replay the store chain reachable from `mem`, deepest predecessor
    /// first, so the heap reflects the state this chain denotes. The
    /// visited set spans one top-level replay (nested loads triggered by
    /// store operands share it), guarding against memory-Phi cycles and
    /// double execution.
    pub(super) fn replay_memory_chain(&mut self, mem: NodeIdx) -> EvalResult<()> {
        if self.replay_depth == 0 {
            self.memory_visited.clear();
        }
        self.replay_depth += 1;
        let result = self.walk_memory(mem);
        self.replay_depth -= 1;
        result
    }

    fn walk_memory(&mut self, mem: NodeIdx) -> EvalResult<()> {
        let graph = self.graph;
        // Two-phase stack: a store is expanded (predecessor first), then
        // executed on the way back out.
        let mut stack: Vec<(NodeIdx, bool)> = vec![(mem, false)];
        while let Some((idx, expanded)) = stack.pop() {
            if expanded {
                self.store_effect(idx)?;
                continue;
            }
            if !self.memory_visited.insert(idx) {
                continue;
            }
            let node = graph.node(idx);
            match node.opcode() {
                op if op.is_store() => {
                    stack.push((idx, true));
                    if let Some(pred) = node.memory_input() {
                        stack.push((pred, false));
                    }
                }
                Opcode::Phi => {
                    if self.materialized_memory.contains(&idx) {
                        // History already in the heap.
                        continue;
                    }
                    let Some(region) = node.region_input() else { continue };
                    if !self.region_predecessor.contains_key(&region) {
                        // Unreached merge: no memory effects to replay.
                        continue;
                    }
                    let pred = self.active_pred(region)?;
                    match self.select_phi_input(idx, pred, true) {
                        Ok(src) if src != idx => stack.push((src, false)),
                        Ok(_) => {}
                        // Alignment failure: fall back to walking every
                        // input; the visited set bounds the traversal.
                        Err(_) => {
                            for input in node.phi_values().iter().flatten() {
                                stack.push((*input, false));
                            }
                        }
                    }
                }
                Opcode::MergeMem => {
                    for input in node.inputs().iter().flatten() {
                        stack.push((*input, false));
                    }
                }
                // Memory sources (Start, Parm, Proj, ...) end the chain.
                _ => {}
            }
        }
        Ok(())
    }

    /// Execute the pending store chains feeding this Region's memory Phis.
    /// Runs on every Region entry, before data Phis advance, while the
    /// finishing iteration's operand caches are still live. Afterwards the
    /// heap holds the state at Region entry and later replays stop at these
    /// Phis.
    pub(super) fn materialize_region_memory(&mut self, region: NodeIdx) -> EvalResult<()> {
        let graph = self.graph;
        let memory_phis: Vec<NodeIdx> = graph
            .indices()
            .filter(|&idx| {
                let n = graph.node(idx);
                n.opcode() == Opcode::Phi
                    && n.region_input() == Some(region)
                    && n.prop_str("type") == Some("memory")
            })
            .collect();
        if memory_phis.is_empty() {
            return Ok(());
        }
        let pred = self.active_pred(region)?;
        for phi in memory_phis {
            self.materialized_memory.remove(&phi);
            if let Ok(src) = self.select_phi_input(phi, pred, true)
                && src != phi
            {
                debug!(phi = self.node_id(phi), "materialize memory phi");
                self.replay_memory_chain(src)?;
            }
            self.materialized_memory.insert(phi);
        }
        Ok(())
    }

    fn store_effect(&mut self, idx: NodeIdx) -> EvalResult<()> {
        let graph = self.graph;
        let node = graph.node(idx);
        debug!(node = %node, "replay store");
        let addr = match node.address_input() {
            Some(a) => a,
            None => {
                return Err(anyhow!("store node {} has no base input", node.id()).into());
            }
        };
        let base = self.eval(addr)?;
        let Value::Ref(base_ref) = base else {
            return Err(Trap::StoreBaseNotRef.into());
        };
        if self.is_array_access(idx, 4) {
            let (index, value) = if let Some(value_input) = node.input(4) {
                let index_input = match node.input(3) {
                    Some(i) => i,
                    None => {
                        return Err(
                            anyhow!("store node {} has no index input", node.id()).into()
                        );
                    }
                };
                let index = self.eval(index_input)?;
                (self.int_value(index, idx)?, self.eval(value_input)?)
            } else {
                // C2 layout: the index hides in the AddP address and the
                // value sits at slot 3.
                let index = self.address_index(idx, addr)?;
                let value_input = match node.input(3) {
                    Some(v) => v,
                    None => {
                        return Err(
                            anyhow!("store node {} has no value input", node.id()).into()
                        );
                    }
                };
                (index, self.eval(value_input)?)
            };
            trace!(base_ref, index, "array store");
            self.heap.write_array(base_ref, index, value)?;
        } else {
            let field = match node.prop_str("field") {
                Some(f) => f.to_string(),
                None => {
                    return Err(anyhow!("store node {} has no field name", node.id()).into());
                }
            };
            let value_input = match node.store_value_input() {
                Some(v) => v,
                None => {
                    return Err(anyhow!("store node {} has no value input", node.id()).into());
                }
            };
            let value = self.eval(value_input)?;
            trace!(base_ref, field, %value, "field store");
            self.heap.write_field(base_ref, &field, value);
        }
        Ok(())
    }

    /// Classify a load/store as an array element access. `marker_slot` is
    /// the input slot that only array accesses populate (index for loads,
    /// value for stores).
    fn is_array_access(&self, idx: NodeIdx, marker_slot: usize) -> bool {
        let node = self.graph.node(idx);
        if node.prop_truthy("array") {
            return true;
        }
        if node.has_prop("field") {
            return false;
        }
        if node.dump_spec().is_some_and(dump_spec::is_array_access) {
            return true;
        }
        node.input(marker_slot).is_some()
    }

    /// The element index of an array load: input 3 when present, otherwise
    /// derived from the AddP address expression.
    fn load_index(&mut self, idx: NodeIdx) -> EvalResult<i32> {
        let node = self.graph.node(idx);
        if let Some(index_input) = node.input(3) {
            let index = self.eval(index_input)?;
            return self.int_value(index, idx);
        }
        let addr = node
            .address_input()
            .expect("load address resolved before index extraction");
        self.address_index(idx, addr)
    }

    fn address_index(&mut self, at: NodeIdx, addr: NodeIdx) -> EvalResult<i32> {
        let mut seen = FastHashSet::default();
        match self.extract_index(addr, &mut seen)? {
            Some(index) => Ok(index),
            None => Err(anyhow!(
                "could not derive an array index for node {}",
                self.node_id(at)
            )
            .into()),
        }
    }

    /// Recursively inspect an AddP subgraph for the index-bearing
    /// subexpression. C2 encodes element addresses as
    /// `AddP(base, base, offset)` where the offset contains the i32 index
    /// behind a `ConvI2L` and an element-size shift.
    fn extract_index(
        &mut self,
        idx: NodeIdx,
        seen: &mut FastHashSet<NodeIdx>,
    ) -> EvalResult<Option<i32>> {
        if !seen.insert(idx) {
            return Ok(None);
        }
        let graph = self.graph;
        let node = graph.node(idx);
        match node.opcode() {
            Opcode::ConvI2L => {
                let Some(operand) = node.first_value_input() else {
                    return Ok(None);
                };
                let v = self.eval(operand)?;
                Ok(Some(self.int_value(v, idx)?))
            }
            Opcode::LShiftI
            | Opcode::LShiftL
            | Opcode::RShiftI
            | Opcode::RShiftL
            | Opcode::URShiftI
            | Opcode::URShiftL => {
                let operands = node.value_inputs();
                let Some(&shifted) = operands.first() else {
                    return Ok(None);
                };
                if let Some(index) = self.extract_index(shifted, seen)? {
                    return Ok(Some(index));
                }
                match self.eval(shifted)? {
                    Value::I32(v) => Ok(Some(v)),
                    Value::I64(v) => Ok(Some(v as i32)),
                    _ => Ok(None),
                }
            }
            Opcode::AddP
            | Opcode::AddI
            | Opcode::AddL
            | Opcode::SubI
            | Opcode::SubL
            | Opcode::CastII
            | Opcode::CastLL
            | Opcode::ConvL2I
            | Opcode::Opaque1 => {
                for operand in node.value_inputs() {
                    if let Some(index) = self.extract_index(operand, seen)? {
                        return Ok(Some(index));
                    }
                }
                Ok(None)
            }
            _ => Ok(None),
        }
    }
}
