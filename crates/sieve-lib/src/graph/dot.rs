//! Graphviz rendering of the live graph.
//!
//! The decorator closure supplies per-node attributes, letting callers
//! layer root labels, validation reports, or current values over the
//! default shape.

use crate::dag::{Dag, NodeId, bfs_down};
use crate::graph::MergeGraph;

/// Render the graph as Graphviz dot source. Nodes are named by their
/// arena ids; `decorate` provides the attribute list for each node.
pub fn to_dot(graph: &MergeGraph, decorate: impl Fn(&Dag, NodeId) -> String) -> String {
    let mut nodes = Vec::new();
    bfs_down(graph.dag(), graph.roots().iter().copied(), |n| {
        nodes.push(n);
    });

    let mut out = String::from("digraph G {\n");
    out.push_str("  ordering = out;\n");
    for node in &nodes {
        out.push_str(&format!("  \"{}\" [{}];\n", node, decorate(graph.dag(), *node)));
    }
    for node in &nodes {
        for child in graph.dag().children(*node) {
            out.push_str(&format!("  \"{node}\" -> \"{child}\";\n"));
        }
    }
    out.push_str("}\n");
    out
}

/// Default decoration: operator name for calls, sexpr for literals.
pub fn default_decorator(dag: &Dag, node: NodeId) -> String {
    format!("label=\"{}\"", escape_label(&dag.label(node)))
}

/// Escape a string for use inside a double-quoted dot label.
pub fn escape_label(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        if ch == '"' || ch == '\\' {
            out.push('\\');
        }
        out.push(ch);
    }
    out
}
