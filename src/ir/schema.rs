use serde::{Deserialize, Serialize};

use super::graph::NodeIdx;
use super::node::Node;
use super::opcode::Opcode;

/// Positional input schema, classifying the semantic role of every input
/// slot of an opcode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Schema {
    /// All inputs are values (some producers leave a hole at 0).
    Pure,
    /// Input 0 is control, input 1 an optional condition.
    Control,
    /// Phi: input 0 is the Region, the rest are merged values.
    /// Region/MergeMem: every input is a predecessor.
    Merge,
    /// 0 = control, 1 = memory, 2+ = address/index.
    Load,
    /// 0 = control, 1 = memory, 2 = base, 3+ = index/value.
    Store,
    /// 0 = control, 1 = memory, remaining inputs carry the size.
    Allocate,
    /// 0 = control, 1+ = memory/value.
    Return,
    /// No inputs.
    Start,
    /// Input 0 is the projected source.
    Projection,
    /// Input 0 is the Start node.
    Parameter,
}

/// Schema-aware input accessors. These encode the dump conventions once so
/// the interpreter never indexes input lists directly.
impl Node {
    /// The incoming control edge, if this opcode carries one at slot 0.
    pub fn control_input(&self) -> Option<NodeIdx> {
        match self.opcode().schema() {
            Schema::Pure | Schema::Start | Schema::Merge => None,
            _ => self.input(0),
        }
    }

    /// The memory state consumed by loads, stores and allocations.
    pub fn memory_input(&self) -> Option<NodeIdx> {
        match self.opcode().schema() {
            Schema::Load | Schema::Store | Schema::Allocate => self.input(1),
            _ => None,
        }
    }

    /// Non-hole inputs that carry data values, per schema.
    pub fn value_inputs(&self) -> Vec<NodeIdx> {
        let from = match self.opcode().schema() {
            Schema::Pure => 0,
            Schema::Control | Schema::Return | Schema::Allocate | Schema::Projection => 1,
            Schema::Load | Schema::Store => 2,
            Schema::Merge if self.opcode() == Opcode::Phi => 1,
            Schema::Merge | Schema::Start | Schema::Parameter => return Vec::new(),
        };
        self.inputs()
            .iter()
            .skip(from)
            .filter_map(|inp| *inp)
            .collect()
    }

    /// First non-hole value input, the common unary/pass-through case.
    pub fn first_value_input(&self) -> Option<NodeIdx> {
        self.value_inputs().first().copied()
    }

    /// The Region a Phi merges on (input 0).
    pub fn region_input(&self) -> Option<NodeIdx> {
        if self.opcode() == Opcode::Phi {
            self.input(0)
        } else {
            None
        }
    }

    /// A Phi's merged value slots (holes preserved for positional
    /// alignment with the Region's predecessors).
    pub fn phi_values(&self) -> &[Option<NodeIdx>] {
        debug_assert_eq!(self.opcode(), Opcode::Phi);
        let inputs = self.inputs();
        if inputs.is_empty() { inputs } else { &inputs[1..] }
    }

    /// A Region's predecessor slots, holes preserved.
    pub fn region_preds(&self) -> &[Option<NodeIdx>] {
        self.inputs()
    }

    /// The address operand of a load or store (slot 2).
    pub fn address_input(&self) -> Option<NodeIdx> {
        match self.opcode().schema() {
            Schema::Load | Schema::Store => self.input(2),
            _ => None,
        }
    }

    /// The value operand of a store: slot 4 for array element stores,
    /// slot 3 otherwise.
    pub fn store_value_input(&self) -> Option<NodeIdx> {
        if self.opcode().schema() != Schema::Store {
            return None;
        }
        if self.input(4).is_some() {
            self.input(4)
        } else {
            self.input(3)
        }
    }
}
