use serde::{Deserialize, Serialize};
use std::fmt;
use std::fmt::Write as _;

use crate::util::FastHashMap;

use super::node::{Node, NodeId, TypeStamp};
use super::opcode::Opcode;
use super::prop::PropValue;

/// Dense handle into the graph's node arena. Edges and all interpreter-side
/// bookkeeping use these instead of pointers, which keeps the cyclic graph
/// trivially ownable by the arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeIdx(u32);

impl NodeIdx {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Arena-owned sea-of-nodes graph.
///
/// Nodes are appended during construction (by the IGV parser or by tests)
/// and never removed; the distinguished `Start` and `Root` nodes are tracked
/// as they are added. During interpretation the graph is borrowed read-only.
#[derive(Debug, Clone, Default)]
pub struct Graph {
    nodes: Vec<Node>,
    by_id: FastHashMap<NodeId, NodeIdx>,
    start: Option<NodeIdx>,
    root: Option<NodeIdx>,
}

impl Graph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a node. The canonicalizer guarantees unique ids; a duplicate
    /// id here replaces the index entry but keeps both nodes in the arena.
    pub fn add_node(&mut self, id: NodeId, opcode: Opcode) -> NodeIdx {
        let idx = NodeIdx(self.nodes.len() as u32);
        self.nodes.push(Node::new(id, opcode));
        self.by_id.insert(id, idx);
        match opcode {
            Opcode::Start => self.start = Some(idx),
            Opcode::Root => self.root = Some(idx),
            _ => {}
        }
        idx
    }

    pub fn node(&self, idx: NodeIdx) -> &Node {
        &self.nodes[idx.index()]
    }

    pub fn node_by_id(&self, id: NodeId) -> Option<NodeIdx> {
        self.by_id.get(&id).copied()
    }

    pub fn start(&self) -> Option<NodeIdx> {
        self.start
    }

    pub fn root(&self) -> Option<NodeIdx> {
        self.root
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// All node handles in arena (insertion) order.
    pub fn indices(&self) -> impl Iterator<Item = NodeIdx> + '_ {
        (0..self.nodes.len() as u32).map(NodeIdx)
    }

    pub fn set_input(&mut self, node: NodeIdx, pos: usize, input: NodeIdx) {
        self.nodes[node.index()].put_input(pos, Some(input));
    }

    /// Leave a hole at `pos` (C2 dumps position inputs sparsely).
    pub fn clear_input(&mut self, node: NodeIdx, pos: usize) {
        self.nodes[node.index()].put_input(pos, None);
    }

    pub fn add_input(&mut self, node: NodeIdx, input: NodeIdx) {
        self.nodes[node.index()].push_input(Some(input));
    }

    pub fn set_prop(&mut self, node: NodeIdx, key: &str, value: impl Into<PropValue>) {
        self.nodes[node.index()].put_prop(key.to_string(), value.into());
    }

    pub fn set_stamp(&mut self, node: NodeIdx, stamp: TypeStamp) {
        self.nodes[node.index()].put_stamp(stamp);
    }

    /// All `Parm` nodes in arena order.
    pub fn parameter_nodes(&self) -> Vec<NodeIdx> {
        self.indices()
            .filter(|&idx| self.node(idx).opcode() == Opcode::Parm)
            .collect()
    }

    /// All control-category nodes in arena order.
    pub fn control_nodes(&self) -> Vec<NodeIdx> {
        self.indices()
            .filter(|&idx| self.node(idx).opcode().is_control())
            .collect()
    }

    /// Human-readable structure dump for debugging.
    pub fn dump(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "=== Graph ({} nodes) ===", self.nodes.len());
        for idx in self.indices() {
            let node = self.node(idx);
            let _ = write!(out, "  {node}");
            let inputs: Vec<String> = node
                .inputs()
                .iter()
                .map(|inp| match inp {
                    Some(i) => self.node(*i).id().to_string(),
                    None => "_".to_string(),
                })
                .collect();
            if !inputs.is_empty() {
                let _ = write!(out, " <- [{}]", inputs.join(", "));
            }
            let _ = writeln!(out);
        }
        out
    }
}

impl fmt::Display for Graph {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.dump())
    }
}
