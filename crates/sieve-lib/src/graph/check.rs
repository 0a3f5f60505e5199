//! Merge-graph self-validation.
//!
//! Cross-checks the sexpr index, the parent/child edge symmetry of every
//! live node, and the root bookkeeping. Used by tests and by the CLI's
//! verbose mode; a healthy graph yields no findings.

use crate::dag::{NodeId, bfs_down};
use crate::graph::MergeGraph;

/// Run every consistency check, returning one message per failure.
pub fn check_graph(graph: &MergeGraph) -> Vec<String> {
    let mut errors = Vec::new();
    let dag = graph.dag();

    // Sexpr index: every entry must map a key to a node whose current
    // sexpr is exactly that key.
    for (sexpr, node) in graph.known_sexprs() {
        let actual = dag.sexpr(node);
        if actual != sexpr {
            errors.push(format!(
                "sexpr index mismatch: key `{sexpr}` maps to {node} with sexpr `{actual}`"
            ));
        }
    }

    // Live nodes: edges must be symmetric and every node must be the
    // registered owner of its sexpr.
    let mut live = Vec::new();
    bfs_down(dag, graph.roots().iter().copied(), |n| live.push(n));
    for node in &live {
        for parent in dag.parents(*node) {
            let edges_down = dag
                .children(*parent)
                .iter()
                .filter(|c| *c == node)
                .count();
            let edges_up = dag
                .parents(*node)
                .iter()
                .filter(|p| *p == parent)
                .count();
            if edges_down != edges_up {
                errors.push(format!(
                    "edge asymmetry between {parent} and {node}: \
                     {edges_down} child edge(s), {edges_up} parent edge(s)"
                ));
            }
        }
        match graph.known(*node) {
            Some(owner) if owner == *node => {}
            Some(owner) => errors.push(format!(
                "live node {node} is shadowed by {owner} for sexpr `{}`",
                dag.sexpr(*node)
            )),
            None => errors.push(format!(
                "live node {node} has unregistered sexpr `{}`",
                dag.sexpr(*node)
            )),
        }
    }

    // Roots: slots and the reverse index must agree.
    for (index, root) in graph.roots().iter().enumerate() {
        match graph.root_indices(*root) {
            Ok(indices) if indices.contains(&index) => {}
            _ => errors.push(format!("root {root} missing from index {index}")),
        }
    }
    root_index_agreement(graph, &mut errors);

    errors
}

fn root_index_agreement(graph: &MergeGraph, errors: &mut Vec<String>) {
    let mut claimed: Vec<(usize, NodeId)> = Vec::new();
    for root in graph.roots() {
        if let Ok(indices) = graph.root_indices(*root) {
            for index in indices {
                claimed.push((*index, *root));
            }
        }
    }
    claimed.sort_unstable();
    claimed.dedup();
    for (index, node) in claimed {
        match graph.root(index) {
            Ok(actual) if actual == node => {}
            _ => errors.push(format!("root index {index} does not hold {node}")),
        }
    }
}
