//! Incremental, phase-aware evaluation.
//!
//! The merged DAG is immutable at evaluation time and shared across
//! contexts; all mutable state lives in a [`GraphEvalState`], one per
//! evaluation context (for example per transaction), indexed by the node
//! indices assigned with [`index_graph`].

mod context;
mod graph_state;
mod state;

#[cfg(test)]
mod eval_tests;

pub use context::{EvalContext, HostOperator, NullContext, SimpleContext};
pub use graph_state::{EvalProfile, GraphEvalState, index_graph, initialize_graph};
pub use state::{Binding, NodeEvalState};
