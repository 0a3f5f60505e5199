//! Evaluation state of an entire graph.
//!
//! One [`NodeEvalState`] slot per node index. The life cycle:
//!
//! 1. Assign indices with [`index_graph`] (once, after transformation).
//! 2. Construct a `GraphEvalState` per evaluation context.
//! 3. Call [`eval`](GraphEvalState::eval) to force a node at each phase;
//!    values only change between phases, so repeated calls within one
//!    phase just return the current values.
//!
//! All smart accessors resolve forwarding chains to the final node;
//! [`node_state_mut`](GraphEvalState::node_state_mut) and friends give a
//! call implementation direct access to its own slot.

use std::time::Instant;

use sieve_core::{CoreError, Result, ValueList};

use crate::dag::{Dag, NodeId, NodeKind, bfs_down};
use crate::eval::{EvalContext, NodeEvalState};

/// Assign evaluation indices to every node reachable from `roots`.
/// Returns the index limit. Indices are assigned once; evaluation assumes
/// every reachable node has one.
pub fn index_graph(dag: &mut Dag, roots: &[NodeId]) -> usize {
    let mut nodes = Vec::new();
    bfs_down(dag, roots.iter().copied(), |n| nodes.push(n));
    for (index, node) in nodes.iter().enumerate() {
        dag.set_index(*node, index as u32);
    }
    nodes.len()
}

/// Eagerly run `eval_initialize` for every node reachable from `roots`.
/// Optional: evaluation also initializes lazily on first touch.
pub fn initialize_graph(
    dag: &Dag,
    roots: &[NodeId],
    state: &mut GraphEvalState,
    ctx: &dyn EvalContext,
) -> Result<()> {
    let mut nodes = Vec::new();
    bfs_down(dag, roots.iter().copied(), |n| nodes.push(n));
    for node in nodes {
        state.initialize(dag, node, ctx)?;
    }
    Ok(())
}

/// Per-node call counts and inclusive time, recorded through an explicit
/// frame stack owned by the evaluation state.
#[derive(Debug, Default)]
pub struct EvalProfile {
    calls: Vec<u64>,
    nanos: Vec<u64>,
    stack: Vec<(usize, Instant)>,
}

impl EvalProfile {
    fn new(index_limit: usize) -> Self {
        Self {
            calls: vec![0; index_limit],
            nanos: vec![0; index_limit],
            stack: Vec::new(),
        }
    }

    fn enter(&mut self, index: usize) {
        self.stack.push((index, Instant::now()));
    }

    fn exit(&mut self) {
        if let Some((index, started)) = self.stack.pop() {
            self.calls[index] += 1;
            self.nanos[index] += started.elapsed().as_nanos() as u64;
        }
    }

    /// Times `eval_calculate` ran for this index.
    pub fn call_count(&self, index: usize) -> u64 {
        self.calls.get(index).copied().unwrap_or(0)
    }

    /// Inclusive nanoseconds spent calculating this index.
    pub fn total_nanos(&self, index: usize) -> u64 {
        self.nanos.get(index).copied().unwrap_or(0)
    }
}

/// Evaluation state for a whole graph, one slot per node index.
pub struct GraphEvalState {
    slots: Vec<NodeEvalState>,
    profile: Option<EvalProfile>,
}

impl GraphEvalState {
    /// State for a graph whose node indices are all below `index_limit`.
    pub fn new(index_limit: usize) -> Self {
        let mut slots = Vec::with_capacity(index_limit);
        slots.resize_with(index_limit, NodeEvalState::default);
        Self {
            slots,
            profile: None,
        }
    }

    pub fn index_limit(&self) -> usize {
        self.slots.len()
    }

    /// Record per-node call counts and timings during evaluation.
    pub fn enable_profiling(&mut self) {
        self.profile = Some(EvalProfile::new(self.slots.len()));
    }

    pub fn profile(&self) -> Option<&EvalProfile> {
        self.profile.as_ref()
    }

    /// Direct slot access by index. Does not resolve forwarding.
    pub fn state(&self, index: usize) -> &NodeEvalState {
        &self.slots[index]
    }

    /// Direct mutable slot access by index. Does not resolve forwarding.
    pub fn state_mut(&mut self, index: usize) -> &mut NodeEvalState {
        &mut self.slots[index]
    }

    /// A node's own slot, by its assigned index. Does not resolve
    /// forwarding; this is how a call implementation reaches its state.
    pub fn node_state_mut(&mut self, dag: &Dag, node: NodeId) -> Result<&mut NodeEvalState> {
        let index = index_of(dag, node)?;
        Ok(&mut self.slots[index])
    }

    pub fn node_state(&self, dag: &Dag, node: NodeId) -> Result<&NodeEvalState> {
        let index = index_of(dag, node)?;
        Ok(&self.slots[index])
    }

    /// Resolve the forwarding chain from `node` to its final node and
    /// index.
    fn resolve(&self, dag: &Dag, node: NodeId) -> Result<(NodeId, usize)> {
        let mut current = node;
        for _ in 0..=self.slots.len() {
            let index = index_of(dag, current)?;
            match self.slots[index].forwarded_to() {
                Some(next) => current = next,
                None => return Ok((current, index)),
            }
        }
        Err(CoreError::eval_state("forwarding chain contains a cycle"))
    }

    /// Current values of `node`, following forwarding. Empty while the
    /// final node is unbound. Does not recalculate; call
    /// [`eval`](Self::eval) each phase first.
    pub fn values(&self, dag: &Dag, node: NodeId) -> Result<ValueList> {
        let (_, index) = self.resolve(dag, node)?;
        Ok(self.slots[index].values().unwrap_or_default())
    }

    /// Number of values of `node`.
    pub fn size(&self, dag: &Dag, node: NodeId) -> Result<usize> {
        Ok(self.values(dag, node)?.len())
    }

    /// A node is truthy once it has produced at least one value.
    pub fn is_truthy(&self, dag: &Dag, node: NodeId) -> Result<bool> {
        Ok(!self.values(dag, node)?.is_empty())
    }

    /// Whether `node` (through forwarding) is finished: its values are
    /// final for this context.
    pub fn is_finished(&self, dag: &Dag, node: NodeId) -> Result<bool> {
        let (_, index) = self.resolve(dag, node)?;
        Ok(self.slots[index].is_finished())
    }

    /// Last phase `node` (through forwarding) was calculated at.
    pub fn phase(&self, dag: &Dag, node: NodeId) -> Result<Option<sieve_core::Phase>> {
        let (_, index) = self.resolve(dag, node)?;
        Ok(self.slots[index].phase())
    }

    /// Run `eval_initialize` for `node` if it has not run yet in this
    /// context.
    pub fn initialize(&mut self, dag: &Dag, node: NodeId, ctx: &dyn EvalContext) -> Result<()> {
        let index = index_of(dag, node)?;
        if self.slots[index].is_initialized() {
            return Ok(());
        }
        self.slots[index].mark_initialized();
        if let Some(behavior) = dag.behavior(node) {
            behavior.eval_initialize(dag, node, self, ctx)?;
        }
        Ok(())
    }

    /// Force/fetch the current values of `node` for this phase.
    ///
    /// Resolves forwarding, lazily initializes, and — only if the final
    /// node is unfinished and the context's phase differs from its last
    /// one (or no phase is defined) — runs `eval_calculate`, which
    /// recursively evaluates children as it reads them.
    pub fn eval(&mut self, dag: &Dag, node: NodeId, ctx: &dyn EvalContext) -> Result<ValueList> {
        let (final_node, index) = self.resolve(dag, node)?;

        if !self.slots[index].is_initialized() {
            self.slots[index].mark_initialized();
            if let Some(behavior) = dag.behavior(final_node) {
                behavior.eval_initialize(dag, final_node, self, ctx)?;
            }
        }

        let phase = ctx.phase();
        let slot = &self.slots[index];
        if !slot.is_finished() && (slot.phase() != phase || phase.is_none()) {
            self.slots[index].set_phase(phase);
            if let Some(profile) = &mut self.profile {
                profile.enter(index);
            }
            let outcome = self.calculate(dag, final_node, ctx);
            if let Some(profile) = &mut self.profile {
                profile.exit();
            }
            outcome?;
        }

        // The calculation may itself have forwarded this node.
        let (_, index) = self.resolve(dag, final_node)?;
        Ok(self.slots[index].values().unwrap_or_default())
    }

    fn calculate(&mut self, dag: &Dag, node: NodeId, ctx: &dyn EvalContext) -> Result<()> {
        match dag.node(node).kind() {
            NodeKind::Literal(value) => {
                let index = index_of(dag, node)?;
                let slot = &mut self.slots[index];
                slot.setup_local_list()?;
                if let Some(v) = value {
                    slot.append_to_list(v.clone())?;
                }
                slot.finish()
            }
            NodeKind::Call(behavior) => {
                let behavior = behavior.clone();
                behavior.eval_calculate(dag, node, self, ctx)
            }
        }
    }
}

fn index_of(dag: &Dag, node: NodeId) -> Result<usize> {
    dag.index_of(node)
        .map(|i| i as usize)
        .ok_or_else(|| CoreError::einval(format!("{node} has no evaluation index")))
}
