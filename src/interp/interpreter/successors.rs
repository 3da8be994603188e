//! Control-successor adjacency and the stepping rules that pick the next
//! control node.

use anyhow::anyhow;
use tracing::trace;

use crate::ir::{NodeIdx, Opcode};
use crate::util::FastHashMap;

use super::Execution;
use super::EvalResult;

impl Execution<'_> {
    /// Precompute `producer -> sorted control consumers` by scanning every
    /// node once. Regions contribute an edge from each non-self input;
    /// every other control consumer from its input 0.
    pub(super) fn build_successors(&mut self) {
        let graph = self.graph;
        let mut map: FastHashMap<NodeIdx, Vec<NodeIdx>> = FastHashMap::default();
        for idx in graph.indices() {
            let node = graph.node(idx);
            if !node.opcode().takes_control_input() {
                continue;
            }
            if node.opcode() == Opcode::Region {
                for pred in node.region_preds().iter().flatten() {
                    if *pred != idx {
                        map.entry(*pred).or_default().push(idx);
                    }
                }
            } else if let Some(ctrl) = node.input(0) {
                map.entry(ctrl).or_default().push(idx);
            }
        }
        for list in map.values_mut() {
            list.sort_by_key(|&s| graph.node(s).id());
            list.dedup();
        }
        self.successors = map;
    }

    /// Pick the control successor of a pass-through node. A unique
    /// successor is taken as-is; several candidates are ranked.
    pub(super) fn next_control(&self, at: NodeIdx) -> EvalResult<NodeIdx> {
        let succs = self.successors.get(&at).map(Vec::as_slice).unwrap_or(&[]);
        match succs {
            [] => Err(anyhow!(
                "control flow has no successor at node {}",
                self.node_id(at)
            )
            .into()),
            [only] => Ok(*only),
            several => Ok(self.rank_successors(at, several)),
        }
    }

    /// Rank candidate successors: opcode priority, then block starts, then
    /// forward progress in the producer's `idx`/`bci` positions, then node
    /// id. Deterministic for any candidate set.
    fn rank_successors(&self, at: NodeIdx, succs: &[NodeIdx]) -> NodeIdx {
        let graph = self.graph;
        let cur = graph.node(at);
        let cur_idx = cur.prop_i64("idx");
        let cur_bci = cur.prop_i64("bci");
        let best = succs
            .iter()
            .copied()
            .min_by_key(|&s| {
                let n = graph.node(s);
                (
                    n.opcode().step_priority(),
                    u8::from(!n.prop_truthy("is_block_start")),
                    backward_rank(cur_idx, n.prop_i64("idx")),
                    backward_rank(cur_bci, n.prop_i64("bci")),
                    n.id(),
                )
            })
            .expect("rank_successors called with candidates");
        trace!(
            from = cur.id(),
            to = graph.node(best).id(),
            candidates = succs.len(),
            "ranked control successor"
        );
        best
    }

    /// Branch at `If`/`RangeCheck`/`ParsePredicate`: evaluate the condition
    /// and take the matching projection. A `ParsePredicate` without
    /// projections degrades to a pass-through.
    pub(super) fn branch_target(&mut self, at: NodeIdx) -> EvalResult<NodeIdx> {
        let graph = self.graph;
        let node = graph.node(at);
        let succs: Vec<NodeIdx> = self.successors.get(&at).cloned().unwrap_or_default();
        let has_projections = succs.iter().any(|&s| {
            matches!(graph.node(s).opcode(), Opcode::IfTrue | Opcode::IfFalse)
        });
        if !has_projections {
            if node.opcode() == Opcode::ParsePredicate {
                return self.next_control(at);
            }
            return Err(anyhow!(
                "{} node {} has no branch projections",
                node.opcode(),
                node.id()
            )
            .into());
        }

        let cond_input = match node.first_value_input() {
            Some(c) => c,
            None => {
                return Err(anyhow!(
                    "{} node {} has no condition input",
                    node.opcode(),
                    node.id()
                )
                .into());
            }
        };
        let cond = self.eval(cond_input)?;
        let want = if cond.truthy() {
            Opcode::IfTrue
        } else {
            Opcode::IfFalse
        };
        trace!(node = %node, %cond, taken = %want, "branch");
        succs
            .into_iter()
            .find(|&s| graph.node(s).opcode() == want)
            .ok_or_else(|| {
                anyhow!("{} node {} has no {} successor", node.opcode(), node.id(), want).into()
            })
    }
}

/// 0 when the successor does not move backward through the producer's
/// position properties, 1 when it does.
fn backward_rank(from: Option<i64>, to: Option<i64>) -> u8 {
    match (from, to) {
        (Some(f), Some(t)) if t < f => 1,
        _ => 0,
    }
}
