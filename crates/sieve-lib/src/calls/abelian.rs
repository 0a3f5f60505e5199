//! Canonical child ordering for commutative operators.
//!
//! `and` and `or` sort their children by sexpr so that differently
//! ordered spellings of the same predicate merge. This runs only in the
//! transforms of those operators: the merge key itself stays syntactic,
//! and rule authors relying on the merge granularity of other operators
//! keep it.

use sieve_core::Result;

use crate::dag::{CallFactory, NodeId};
use crate::graph::MergeGraph;

/// Replace `node` with a copy whose children are sorted by sexpr.
/// Returns whether a rewrite happened; already sorted nodes are left
/// alone.
pub fn transform_ordering(
    node: NodeId,
    graph: &mut MergeGraph,
    factory: &CallFactory,
) -> Result<bool> {
    let dag = graph.dag();
    let mut keyed: Vec<(String, NodeId)> = dag
        .children(node)
        .iter()
        .map(|child| (dag.sexpr(*child), *child))
        .collect();
    if keyed.windows(2).all(|pair| pair[0].0 <= pair[1].0) {
        return Ok(false);
    }
    let name = match dag.call_name(node) {
        Some(name) => name.to_owned(),
        None => return Ok(false),
    };

    keyed.sort_by(|a, b| a.0.cmp(&b.0));
    let replacement = graph.create_call(&name, factory)?;
    for (_, child) in keyed {
        graph.add_child(replacement, child)?;
    }
    graph.replace(node, replacement)?;
    Ok(true)
}
