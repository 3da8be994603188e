//! Region entry and the Phi merge engine.
//!
//! Entering a Region for the first time seeds its data Phis from the taken
//! predecessor. Re-entering (a loop back-edge) advances all data Phis
//! simultaneously: each next-iteration value is computed against the
//! previous iteration's snapshot, so no Phi observes a partially-updated
//! neighbour.

use anyhow::anyhow;
use tracing::{debug, trace};

use crate::ir::{NodeIdx, Opcode};
use crate::util::FastHashMap;

use super::super::error::EvalResult;
use super::super::value::Value;
use super::Execution;

/// Scope of one loop back-edge advancement: the Region being re-entered and
/// the previous-iteration value of each of its data Phis. While the scope
/// is active, reads of those Phis resolve to the snapshot; this is the only
/// sanctioned source of apparent cycles in value evaluation.
pub(super) struct PhiUpdate {
    region: NodeIdx,
    old_values: FastHashMap<NodeIdx, Value>,
}

impl PhiUpdate {
    pub(super) fn snapshot(&self, phi: NodeIdx) -> Option<Value> {
        self.old_values.get(&phi).copied()
    }

    pub(super) fn region(&self) -> NodeIdx {
        self.region
    }
}

impl Execution<'_> {
    /// Handle control arriving at a Region: first visit seeds Phis along
    /// the acyclic path, revisits are loop back-edges bounded by the
    /// iteration budget.
    pub(super) fn enter_region(&mut self, region: NodeIdx) -> EvalResult<()> {
        match self.loop_iterations.get(&region).copied() {
            None => {
                self.loop_iterations.insert(region, 0);
                self.materialize_region_memory(region)?;
                self.seed_region_phis(region)
            }
            Some(count) => {
                let count = count + 1;
                if count > self.limits.max_loop_iterations {
                    return Err(anyhow!(
                        "loop iteration budget ({}) exceeded at Region {}",
                        self.limits.max_loop_iterations,
                        self.node_id(region)
                    )
                    .into());
                }
                self.loop_iterations.insert(region, count);
                debug!(region = self.node_id(region), iteration = count, "region revisit");
                // Pending stores of the finished iteration replay while its
                // operand caches are still live.
                self.materialize_region_memory(region)?;
                self.advance_region_phis(region)
            }
        }
    }

    fn data_phis_of(&self, region: NodeIdx) -> Vec<NodeIdx> {
        self.graph
            .indices()
            .filter(|&idx| {
                let n = self.graph.node(idx);
                n.is_data_phi() && n.region_input() == Some(region)
            })
            .collect()
    }

    fn seed_region_phis(&mut self, region: NodeIdx) -> EvalResult<()> {
        let pred = self.active_pred(region)?;
        for phi in self.data_phis_of(region) {
            let src = self.select_phi_input(phi, pred, false)?;
            let value = self.eval(src)?;
            trace!(phi = self.node_id(phi), %value, "seed phi");
            self.value_cache.insert(phi, value);
        }
        Ok(())
    }

    /// Advance all data Phis of a revisited Region: snapshot, prune stale
    /// derived values, recompute every next-iteration value against the
    /// snapshot, then install the new values and prune again.
    fn advance_region_phis(&mut self, region: NodeIdx) -> EvalResult<()> {
        let pred = self.active_pred(region)?;
        let phis = self.data_phis_of(region);

        let mut old_values = FastHashMap::default();
        for &phi in &phis {
            match self.value_cache.get(&phi) {
                Some(v) => {
                    old_values.insert(phi, *v);
                }
                None => {
                    return Err(anyhow!(
                        "Phi node {} has no seeded value at loop back-edge",
                        self.node_id(phi)
                    )
                    .into());
                }
            }
        }

        self.prune_value_cache();
        self.phi_update = Some(PhiUpdate {
            region,
            old_values,
        });

        let mut new_values = Vec::with_capacity(phis.len());
        let mut failure = None;
        for &phi in &phis {
            match self
                .select_phi_input(phi, pred, true)
                .and_then(|src| self.eval(src))
            {
                Ok(value) => new_values.push((phi, value)),
                Err(err) => {
                    failure = Some(err);
                    break;
                }
            }
        }
        self.phi_update = None;
        if let Some(err) = failure {
            return Err(err);
        }

        for (phi, value) in new_values {
            trace!(phi = self.node_id(phi), %value, "advance phi");
            self.value_cache.insert(phi, value);
        }
        self.prune_value_cache();
        Ok(())
    }

    /// Evaluate a Phi as data. Memory and control Phis never participate in
    /// value merges; a data Phi resolves to the input aligned with the
    /// Region's active predecessor.
    pub(super) fn eval_phi(&mut self, idx: NodeIdx) -> EvalResult<Value> {
        let node = self.graph.node(idx);
        if !node.is_data_phi() {
            return Ok(Value::I32(0));
        }
        let region = match node.region_input() {
            Some(r) => r,
            None => {
                return Err(anyhow!("Phi node {} has no Region input", node.id()).into());
            }
        };
        let in_update = self
            .phi_update
            .as_ref()
            .is_some_and(|u| u.region() == region);
        let pred = self.active_pred(region)?;
        let src = self.select_phi_input(idx, pred, in_update)?;
        self.eval(src)
    }

    pub(super) fn active_pred(&self, region: NodeIdx) -> EvalResult<NodeIdx> {
        match self.region_predecessor.get(&region) {
            Some(&p) => Ok(p),
            None => Err(anyhow!(
                "Region {} has no active predecessor",
                self.node_id(region)
            )
            .into()),
        }
    }

    /// Pick the Phi value input positionally aligned with the Region
    /// predecessor `pred`, coping with both dump conventions: Phi input
    /// lists one longer than the Region's (slot 0 is the Region) or the
    /// same length, plus a compacted fallback skipping Region self-edges.
    /// Holes are rejected; a self-reference is viable only during a
    /// back-edge advancement.
    pub(super) fn select_phi_input(
        &self,
        phi: NodeIdx,
        pred: NodeIdx,
        back_edge: bool,
    ) -> EvalResult<NodeIdx> {
        let graph = self.graph;
        let phi_node = graph.node(phi);
        let region = match phi_node.region_input() {
            Some(r) => r,
            None => {
                return Err(anyhow!("Phi node {} has no Region input", phi_node.id()).into());
            }
        };
        let preds = graph.node(region).region_preds();
        let pred_pos = match preds.iter().position(|&p| p == Some(pred)) {
            Some(p) => p,
            None => {
                return Err(anyhow!(
                    "node {} is not a predecessor of Region {}",
                    self.node_id(pred),
                    self.node_id(region)
                )
                .into());
            }
        };

        let num_preds = preds.len();
        let num_phi = phi_node.num_inputs();
        let mut candidates: Vec<usize> = Vec::new();
        if num_phi == num_preds + 1 {
            candidates.push(pred_pos + 1);
        }
        if num_phi == num_preds {
            candidates.push(pred_pos.max(1));
        }
        let compact_pos = preds
            .iter()
            .take(pred_pos)
            .filter(|&&p| p.is_some() && p != Some(region))
            .count();
        candidates.push(compact_pos + 1);

        for pos in candidates {
            let Some(input) = phi_node.input(pos) else { continue };
            if input == phi && !back_edge {
                continue;
            }
            return Ok(input);
        }
        Err(anyhow!(
            "no viable value input for Phi {} from predecessor {}",
            phi_node.id(),
            self.node_id(pred)
        )
        .into())
    }

    /// Drop cached values that may change across a loop iteration. What
    /// survives is identity-bearing or externally fixed: constants,
    /// parameters, Phi values (including outer loops') and allocation
    /// results.
    fn prune_value_cache(&mut self) {
        let graph = self.graph;
        self.value_cache.retain(|&idx, _| {
            matches!(
                graph.node(idx).opcode(),
                Opcode::ConI
                    | Opcode::ConL
                    | Opcode::ConP
                    | Opcode::Parm
                    | Opcode::Phi
                    | Opcode::Allocate
                    | Opcode::AllocateArray
            )
        });
    }
}
