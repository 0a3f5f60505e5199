//! Breadth-first traversals over the DAG.
//!
//! Both directions visit each node exactly once even when it is reachable
//! along several paths.

use std::collections::{HashSet, VecDeque};

use crate::dag::{Dag, NodeId};

/// Visit `roots` and all their descendants, parents before children where
/// the edge order allows.
pub fn bfs_down(dag: &Dag, roots: impl IntoIterator<Item = NodeId>, mut visit: impl FnMut(NodeId)) {
    let mut seen = HashSet::new();
    let mut queue: VecDeque<NodeId> = VecDeque::new();
    for root in roots {
        if seen.insert(root) {
            queue.push_back(root);
        }
    }
    while let Some(node) = queue.pop_front() {
        visit(node);
        for child in dag.children(node) {
            if seen.insert(*child) {
                queue.push_back(*child);
            }
        }
    }
}

/// Visit `start` and all its ancestors.
pub fn bfs_up(dag: &Dag, start: NodeId, mut visit: impl FnMut(NodeId)) {
    let mut seen = HashSet::new();
    let mut queue = VecDeque::new();
    seen.insert(start);
    queue.push_back(start);
    while let Some(node) = queue.pop_front() {
        visit(node);
        for parent in dag.parents(node) {
            if seen.insert(*parent) {
                queue.push_back(*parent);
            }
        }
    }
}
