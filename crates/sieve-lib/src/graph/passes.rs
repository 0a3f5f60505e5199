//! Validation and transformation drivers.
//!
//! Both passes visit every live node once per round. Validation only
//! reports; transformation rewrites through [`MergeGraph`] primitives and
//! is driven to a fixed point. Not converging within the round limit is a
//! caller-visible error, distinct from converging with validation errors.

use sieve_core::{CoreError, Result};

use crate::dag::{CallFactory, Dag, NodeId, bfs_down};
use crate::graph::{MergeGraph, NodeReporter, Reporter};

/// Rounds allowed before a transform is declared divergent.
pub const DEFAULT_TRANSFORM_ROUND_LIMIT: usize = 10;

/// Run every live call node's `validate` hook, collecting findings.
pub fn validate_graph(graph: &MergeGraph, reporter: &mut Reporter) {
    for node in live_nodes(graph) {
        if let Some(behavior) = graph.dag().behavior(node) {
            let mut node_reporter = NodeReporter::new(reporter, graph.dag(), node);
            behavior.validate(graph.dag(), node, &mut node_reporter);
        }
    }
}

/// Drive `transform` hooks to a fixed point with the default round limit.
/// Returns the number of rounds taken (at least 1).
pub fn transform_graph(
    graph: &mut MergeGraph,
    factory: &CallFactory,
    reporter: &mut Reporter,
) -> Result<usize> {
    transform_graph_with_limit(graph, factory, reporter, DEFAULT_TRANSFORM_ROUND_LIMIT)
}

/// Drive `transform` hooks to a fixed point, erroring with
/// [`CoreError::TransformDivergence`] if `round_limit` rounds still
/// report rewrites.
pub fn transform_graph_with_limit(
    graph: &mut MergeGraph,
    factory: &CallFactory,
    reporter: &mut Reporter,
    round_limit: usize,
) -> Result<usize> {
    let mut rounds = 0;
    loop {
        let mut changed = false;
        // Children before parents, so literal folding propagates upward
        // within a single round.
        let mut nodes = live_nodes(graph);
        nodes.reverse();
        for node in nodes {
            // A rewrite earlier in the round may have detached this node.
            if graph.known(node) != Some(node) {
                continue;
            }
            if let Some(behavior) = graph.dag().behavior(node) {
                let mut node_reporter = NodeReporter::new(reporter, graph.dag(), node);
                changed |= behavior.transform(node, graph, factory, &mut node_reporter)?;
            }
        }
        rounds += 1;
        if !changed {
            return Ok(rounds);
        }
        if rounds >= round_limit {
            return Err(CoreError::TransformDivergence { rounds });
        }
    }
}

fn live_nodes(graph: &MergeGraph) -> Vec<NodeId> {
    let mut nodes = Vec::new();
    bfs_down(graph.dag(), graph.roots().iter().copied(), |n| {
        nodes.push(n);
    });
    nodes
}

/// Report an error unless the node has exactly `n` children.
pub fn validate_n_children(dag: &Dag, node: NodeId, reporter: &mut NodeReporter<'_>, n: usize) {
    let actual = dag.children(node).len();
    if actual != n {
        reporter.error(format!("expected {n} child(ren), have {actual}"));
    }
}

/// Report an error unless the node has at least `n` children.
pub fn validate_n_or_more_children(
    dag: &Dag,
    node: NodeId,
    reporter: &mut NodeReporter<'_>,
    n: usize,
) {
    let actual = dag.children(node).len();
    if actual < n {
        reporter.error(format!("expected at least {n} child(ren), have {actual}"));
    }
}

/// Report an error unless child `position` is a string literal. Returns
/// the string when it is.
pub fn validate_literal_string_child(
    dag: &Dag,
    node: NodeId,
    reporter: &mut NodeReporter<'_>,
    position: usize,
) -> Option<String> {
    let child = dag.children(node).get(position).copied();
    let value = child.and_then(|c| dag.literal_value(c));
    match value {
        Some(Some(v)) => match v.as_bytes() {
            Ok(bytes) => Some(String::from_utf8_lossy(bytes).into_owned()),
            Err(_) => {
                reporter.error(format!("child {position} must be a string literal"));
                None
            }
        },
        _ => {
            reporter.error(format!("child {position} must be a string literal"));
            None
        }
    }
}
