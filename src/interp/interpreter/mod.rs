use anyhow::{Result, anyhow};
use tracing::{debug, trace};

use crate::ir::{Graph, NodeIdx, Opcode, dump_spec};
use crate::util::{FastHashMap, FastHashSet, sized_hash_map};

use super::error::{EvalError, EvalResult};
use super::heap::Heap;
use super::outcome::Outcome;
use super::value::Value;

mod eval;
mod memory;
mod phi;
mod successors;

use phi::PhiUpdate;

/// Hard execution budgets. Exceeding any of them is a fatal interpreter
/// error reported with the offending node id, never a silent truncation.
#[derive(Debug, Clone, Copy)]
pub struct Limits {
    /// Total control-flow steps per execution.
    pub max_control_steps: usize,
    /// Revisits of any single Region (loop iterations).
    pub max_loop_iterations: u32,
    /// Value-evaluation recursion depth.
    pub max_eval_depth: usize,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            max_control_steps: 10_000,
            max_loop_iterations: 100,
            max_eval_depth: 2_000,
        }
    }
}

/// Concrete interpreter for a sea-of-nodes graph.
///
/// The graph is borrowed read-only; every call to [`execute`] runs with
/// fresh per-execution state, so one interpreter can run the same graph
/// repeatedly and concurrent executions of a shared graph are safe.
///
/// [`execute`]: Interpreter::execute
pub struct Interpreter<'g> {
    graph: &'g Graph,
    limits: Limits,
}

impl<'g> Interpreter<'g> {
    pub fn new(graph: &'g Graph) -> Self {
        Self {
            graph,
            limits: Limits::default(),
        }
    }

    pub fn with_limits(graph: &'g Graph, limits: Limits) -> Self {
        Self { graph, limits }
    }

    /// Execute the graph against an empty heap.
    ///
    /// Arguments bind positionally to the graph's data parameters. Runtime
    /// traps (division by zero, bounds violations, ...) come back as
    /// `Outcome` `Throw`; malformed graphs and exhausted budgets are `Err`.
    pub fn execute(&self, inputs: &[Value]) -> Result<Outcome> {
        self.execute_with_heap(inputs, Heap::new())
    }

    /// Execute with a pre-populated heap, so arrays and objects can be
    /// passed in as `Ref` arguments.
    pub fn execute_with_heap(&self, inputs: &[Value], initial_heap: Heap) -> Result<Outcome> {
        Execution::new(self.graph, self.limits, initial_heap).run(inputs)
    }
}

/// All per-execution state. Freshly initialized for every `execute` call.
struct Execution<'g> {
    graph: &'g Graph,
    limits: Limits,
    /// Control producer -> sorted control consumers, built once per run.
    successors: FastHashMap<NodeIdx, Vec<NodeIdx>>,
    /// Memoized node values.
    value_cache: FastHashMap<NodeIdx, Value>,
    /// Nodes currently being evaluated; re-entry is a cyclic-evaluation bug.
    eval_active: FastHashSet<NodeIdx>,
    eval_depth: usize,
    /// Which control predecessor delivered control to each Region.
    region_predecessor: FastHashMap<NodeIdx, NodeIdx>,
    /// Region -> times re-entered, for the loop budget.
    loop_iterations: FastHashMap<NodeIdx, u32>,
    /// Active loop back-edge Phi advancement, if any.
    phi_update: Option<PhiUpdate>,
    /// Memory nodes seen by the current top-level chain replay.
    memory_visited: FastHashSet<NodeIdx>,
    replay_depth: usize,
    /// Memory Phis whose incoming state is already reflected in the heap.
    materialized_memory: FastHashSet<NodeIdx>,
    heap: Heap,
}

impl<'g> Execution<'g> {
    fn new(graph: &'g Graph, limits: Limits, heap: Heap) -> Self {
        Self {
            graph,
            limits,
            successors: FastHashMap::default(),
            value_cache: sized_hash_map(graph.len()),
            eval_active: FastHashSet::default(),
            eval_depth: 0,
            region_predecessor: FastHashMap::default(),
            loop_iterations: FastHashMap::default(),
            phi_update: None,
            memory_visited: FastHashSet::default(),
            replay_depth: 0,
            materialized_memory: FastHashSet::default(),
            heap,
        }
    }

    fn run(mut self, inputs: &[Value]) -> Result<Outcome> {
        match self.drive(inputs) {
            Ok(outcome) => Ok(outcome),
            Err(EvalError::Trap(trap)) => {
                debug!(%trap, "execution trapped");
                Ok(Outcome::thrown(trap, std::mem::take(&mut self.heap)))
            }
            Err(EvalError::Fatal(err)) => Err(err),
        }
    }

    fn drive(&mut self, inputs: &[Value]) -> EvalResult<Outcome> {
        self.bind_parameters(inputs)?;
        self.build_successors();

        let start = match self.graph.start() {
            Some(s) => s,
            None => return Err(anyhow!("graph has no Start node").into()),
        };
        let mut current = start;
        let mut steps: usize = 0;
        let ret = loop {
            steps += 1;
            if steps > self.limits.max_control_steps {
                return Err(anyhow!(
                    "control step budget ({}) exceeded at node {}",
                    self.limits.max_control_steps,
                    self.node_id(current)
                )
                .into());
            }
            let opcode = self.graph.node(current).opcode();
            trace!(node = %self.graph.node(current), steps, "control step");
            let next = match opcode {
                Opcode::Return => break current,
                Opcode::Halt => {
                    return Err(
                        anyhow!("execution reached Halt node {}", self.node_id(current)).into()
                    );
                }
                Opcode::If | Opcode::ParsePredicate | Opcode::RangeCheck => {
                    self.branch_target(current)?
                }
                Opcode::Region => {
                    self.enter_region(current)?;
                    self.next_control(current)?
                }
                _ => self.next_control(current)?,
            };
            if self.graph.node(next).opcode() == Opcode::Region {
                self.region_predecessor.insert(next, current);
            }
            current = next;
        };
        self.finish(ret)
    }

    /// Bind arguments to data parameters, ordered by parameter slot, before
    /// control flow starts. Machine-state parms stay unbound and read as
    /// `I32(0)` if ever evaluated.
    fn bind_parameters(&mut self, inputs: &[Value]) -> EvalResult<()> {
        let graph = self.graph;
        let mut parms: Vec<(i32, NodeIdx)> = Vec::new();
        for idx in graph.indices() {
            let node = graph.node(idx);
            if !node.is_data_parm() {
                continue;
            }
            let slot = match node.prop_i64("index") {
                Some(i) => i as i32,
                None => match node.dump_spec().and_then(dump_spec::parm_index) {
                    Some(i) => i,
                    None => {
                        return Err(
                            anyhow!("Parm node {} has no parameter index", node.id()).into()
                        );
                    }
                },
            };
            parms.push((slot, idx));
        }
        parms.sort_by_key(|&(slot, idx)| (slot, graph.node(idx).id()));
        for (value, &(slot, idx)) in inputs.iter().zip(parms.iter()) {
            trace!(slot, node = graph.node(idx).id(), %value, "bind argument");
            self.value_cache.insert(idx, *value);
        }
        Ok(())
    }

    /// Build the outcome once the stepper reaches a Return: materialize the
    /// final memory state, then evaluate the last value-producing input.
    /// This is the boundary where evaluation traps become `Throw`.
    fn finish(&mut self, ret: NodeIdx) -> EvalResult<Outcome> {
        let graph = self.graph;
        let node = graph.node(ret);

        for pos in 1..node.num_inputs() {
            let Some(input) = node.input(pos) else { continue };
            let n = graph.node(input);
            let is_memory_state = n.opcode().is_store()
                || n.opcode() == Opcode::MergeMem
                || (n.opcode() == Opcode::Phi && !n.is_data_phi());
            if is_memory_state {
                self.replay_memory_chain(input)?;
            }
        }

        let mut value_node = None;
        for pos in (1..node.num_inputs()).rev() {
            let Some(input) = node.input(pos) else { continue };
            if !graph.node(input).is_value_producer() {
                continue;
            }
            value_node = Some(input);
            break;
        }
        let value = match value_node {
            Some(v) => Some(self.eval(v)?),
            None => None,
        };
        debug!(value = ?value, "return");
        Ok(Outcome::returned(value, std::mem::take(&mut self.heap)))
    }

    fn node_id(&self, idx: NodeIdx) -> i32 {
        self.graph.node(idx).id()
    }
}
