//! Shared helpers for call implementations.

use sieve_core::Value;

use crate::dag::{Dag, NodeId};
use crate::graph::MergeGraph;

/// Truthiness of a literal node: `Some(truthy)` for literals, `None` for
/// calls. The null literal and empty list literals are falsy.
pub fn literal_truthy(dag: &Dag, node: NodeId) -> Option<bool> {
    match dag.literal_value(node)? {
        None => Some(false),
        Some(value) => Some(value.is_truthy()),
    }
}

/// Detached literal carrying the canonical truthy value: the empty
/// string.
pub fn true_literal(graph: &mut MergeGraph) -> NodeId {
    graph.literal(Some(Value::string("")))
}

/// Detached null literal, the canonical falsy value.
pub fn false_literal(graph: &mut MergeGraph) -> NodeId {
    graph.literal(None)
}
