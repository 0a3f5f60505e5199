//! Expression forest with common-subexpression merging.
//!
//! The graph is defined as everything reachable from its roots. Whenever a
//! tree is added, every subexpression equivalent to a known one is
//! replaced by the known node, so the forest becomes a DAG with at most
//! one live node per distinct canonical s-expression. Equivalence is
//! purely syntactic (exact sexpr text, child order included): an O(1)
//! string-keyed lookup instead of graph isomorphism. Canonicalization of
//! commutative operators happens only in their own transforms, never here.
//!
//! Ownership: once a tree has been added (or handed to [`replace`]), the
//! graph owns it; mutating it through the arena afterwards corrupts the
//! sexpr index. Build replacement trees with the construction helpers,
//! hand them over, and drop the ids.
//!
//! [`replace`]: MergeGraph::replace

use std::collections::{BTreeSet, HashMap, HashSet, VecDeque};

use indexmap::IndexMap;
use sieve_core::{CoreError, LiteralValue, Result};

use crate::dag::{CallFactory, Dag, NodeId, bfs_down, bfs_up};

/// A forest of root expressions with merged common subexpressions.
#[derive(Default)]
pub struct MergeGraph {
    dag: Dag,
    /// Canonical sexpr → the one live node carrying it.
    node_by_sexpr: IndexMap<String, NodeId>,
    /// Root slot → node. Slots are stable: replacement rewrites the slot
    /// in place, it never reassigns indices.
    roots: Vec<NodeId>,
    /// Node → every root slot it currently fills.
    root_indices: HashMap<NodeId, BTreeSet<usize>>,
    /// Node → what it became: `Some(n)` replaced by `n`, `None` removed.
    transform_record: HashMap<NodeId, Option<NodeId>>,
}

impl MergeGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn dag(&self) -> &Dag {
        &self.dag
    }

    /// Mutable arena access, for building trees that will be handed to
    /// [`add_root`](Self::add_root) or [`replace`](Self::replace). Do not
    /// edit nodes the graph already owns.
    pub fn dag_mut(&mut self) -> &mut Dag {
        &mut self.dag
    }

    /// Build a detached literal node.
    pub fn literal(&mut self, value: LiteralValue) -> NodeId {
        self.dag.literal(value)
    }

    /// Build a detached call node.
    pub fn create_call(&mut self, name: &str, factory: &CallFactory) -> Result<NodeId> {
        self.dag.create(name, factory)
    }

    /// Append a child while building a detached tree.
    pub fn add_child(&mut self, parent: NodeId, child: NodeId) -> Result<()> {
        self.dag.add_child(parent, child)
    }

    /// Number of roots.
    pub fn size(&self) -> usize {
        self.roots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.roots.is_empty()
    }

    pub fn roots(&self) -> &[NodeId] {
        &self.roots
    }

    /// Root node at `index`.
    pub fn root(&self, index: usize) -> Result<NodeId> {
        self.roots
            .get(index)
            .copied()
            .ok_or_else(|| CoreError::enoent(format!("root index {index} too large")))
    }

    /// Every root slot filled by the tree equivalent to `node`.
    pub fn root_indices(&self, node: NodeId) -> Result<&BTreeSet<usize>> {
        let node = self.known(node).unwrap_or(node);
        self.root_indices
            .get(&node)
            .ok_or_else(|| CoreError::enoent("no such root"))
    }

    /// True iff `node` fills a root slot. `node` must be the in-graph
    /// node; use [`known`](Self::known) first for an equivalent.
    pub fn is_root(&self, node: NodeId) -> bool {
        self.root_indices.contains_key(&node)
    }

    /// The in-graph node equivalent to `node`, if any.
    pub fn known(&self, node: NodeId) -> Option<NodeId> {
        self.node_by_sexpr.get(&self.dag.sexpr(node)).copied()
    }

    /// Number of distinct canonical subexpressions currently known.
    pub fn known_size(&self) -> usize {
        self.node_by_sexpr.len()
    }

    /// Known subexpressions, for debug reports.
    pub fn known_sexprs(&self) -> impl Iterator<Item = (&str, NodeId)> {
        self.node_by_sexpr.iter().map(|(k, v)| (k.as_str(), *v))
    }

    /// Add a new tree rooted at `root`: merge common subexpressions, learn
    /// new ones, and assign the next root slot.
    ///
    /// The tree must be exclusively owned: `root` parentless, every
    /// descendant with exactly one parent. After this call the graph owns
    /// the tree; `root` may no longer be the node filling the slot.
    pub fn add_root(&mut self, root: NodeId) -> Result<usize> {
        if !self.dag.parents(root).is_empty() {
            return Err(CoreError::einval("root has parents"));
        }
        let mut violation = false;
        bfs_down(&self.dag, [root], |n| {
            if n != root && self.dag.parents(n).len() != 1 {
                violation = true;
            }
        });
        if violation {
            return Err(CoreError::einval(
                "tree is not exclusively owned: a descendant has multiple parents",
            ));
        }

        let merged = self.merge_tree(root)?;
        let index = self.roots.len();
        self.roots.push(merged);
        self.root_indices.entry(merged).or_default().insert(index);
        Ok(index)
    }

    /// Replace the in-graph node equivalent to `which` with `with`,
    /// merging `with` first and rewriting every parent edge. Root slots
    /// keep their indices: if `which` was a root, the slot now holds
    /// `with`.
    pub fn replace(&mut self, which: NodeId, with: NodeId) -> Result<()> {
        let known_which = self
            .known(which)
            .ok_or_else(|| CoreError::enoent("no such subexpression"))?;

        let with = self.merge_tree(with)?;
        if with == known_which {
            return Err(CoreError::einval("cannot replace a node with itself"));
        }

        // Unlearn which and its ancestors under their old sexprs; the
        // relink below changes every ancestor's canonical form.
        let mut stale = Vec::new();
        bfs_up(&self.dag, known_which, |n| stale.push(n));
        for n in &stale {
            self.unlearn(*n);
        }

        // Rewrite one parent edge per back-reference entry.
        let parents = self.dag.parents(known_which).to_vec();
        for parent in parents {
            self.dag.replace_child(parent, known_which, with)?;
        }

        // Root slots survive content replacement. Updated before pruning
        // so a replacement that is a descendant of which (single-child
        // degeneration) is anchored as a root and spared.
        if let Some(indices) = self.root_indices.remove(&known_which) {
            for &index in &indices {
                self.roots[index] = with;
            }
            self.root_indices.entry(with).or_default().extend(indices);
        }

        // Unregister everything that leaves the graph with which.
        self.prune_orphans(known_which)?;

        // Learn with and its (new) ancestors under their new sexprs. After
        // the prune, the upward walk sees only surviving parents; the dead
        // tree cannot sneak back into the index.
        let mut fresh = Vec::new();
        bfs_up(&self.dag, with, |n| fresh.push(n));
        for n in fresh {
            self.learn(n);
        }

        self.transform_record.insert(known_which, Some(with));
        Ok(())
    }

    /// Unregister every descendant of `which` that is reachable only
    /// through `which`. Shared subtrees are unlinked from `which`'s tree
    /// and survive. `which` itself is left in place; it and its ancestors
    /// are re-registered under their new canonical forms.
    pub fn remove_tree(&mut self, which: NodeId) -> Result<()> {
        let known = self
            .known(which)
            .ok_or_else(|| CoreError::enoent("no such subexpression"))?;

        let mut affected = Vec::new();
        bfs_up(&self.dag, known, |n| affected.push(n));
        for n in &affected {
            self.unlearn(*n);
        }
        self.prune_orphans(known)?;
        for n in affected {
            self.learn(n);
        }
        Ok(())
    }

    /// What `source` turned into across transformations: `Some(n)` if it
    /// (eventually) became `n`, `None` if it was removed.
    pub fn find_transform(&self, source: NodeId) -> Result<Option<NodeId>> {
        let mut current = match self.transform_record.get(&source) {
            None => return Err(CoreError::enoent("node not in transform record")),
            Some(target) => *target,
        };
        let mut seen = HashSet::new();
        loop {
            match current {
                None => return Ok(None),
                Some(node) => {
                    if !seen.insert(node) {
                        return Err(CoreError::einval("transform record contains a cycle"));
                    }
                    match self.transform_record.get(&node) {
                        None => return Ok(Some(node)),
                        Some(next) => current = *next,
                    }
                }
            }
        }
    }

    /// Drop the transform record, forgetting replaced/removed nodes.
    pub fn clear_transform_record(&mut self) {
        self.transform_record.clear();
    }

    /// Merge the tree at `which` into the graph. Returns the node now
    /// carrying `which`'s expression, which is `which` itself only if it
    /// was not already known.
    fn merge_tree(&mut self, which: NodeId) -> Result<NodeId> {
        let (is_new, known) = self.learn(which);
        if !is_new {
            if known != which {
                // The whole tree already exists; discard the duplicate.
                self.release_tree(which);
            }
            return Ok(known);
        }

        let mut todo = VecDeque::new();
        todo.push_back(which);
        while let Some(parent) = todo.pop_front() {
            let children = self.dag.children(parent).to_vec();
            for (position, child) in children.into_iter().enumerate() {
                let (child_is_new, known_child) = self.learn(child);
                if !child_is_new && known_child != child {
                    self.dag.replace_child_at(parent, position, known_child);
                    self.release_tree(child);
                } else if child_is_new {
                    todo.push_back(child);
                }
            }
        }
        Ok(which)
    }

    /// Register `which`'s sexpr. Returns whether the entry is new and the
    /// node that owns the sexpr (the existing one on collision).
    fn learn(&mut self, which: NodeId) -> (bool, NodeId) {
        let key = self.dag.sexpr(which);
        match self.node_by_sexpr.entry(key) {
            indexmap::map::Entry::Occupied(entry) => (false, *entry.get()),
            indexmap::map::Entry::Vacant(entry) => {
                entry.insert(which);
                (true, which)
            }
        }
    }

    /// Remove the entry for `which`'s sexpr, whichever node it maps to.
    fn unlearn(&mut self, which: NodeId) -> bool {
        let key = self.dag.sexpr(which);
        self.node_by_sexpr.swap_remove(&key).is_some()
    }

    /// Walk down from the already-detached `from`, unlearning every child
    /// reachable only through it. A child still referenced from elsewhere
    /// — another parent, or a root slot — is unlinked and kept; recursion
    /// stops there. Multi-edges resolve one visit at a time: the first
    /// visit removes one edge, the last one unlearns.
    fn prune_orphans(&mut self, from: NodeId) -> Result<()> {
        let mut todo = vec![from];
        while let Some(parent) = todo.pop() {
            let children = self.dag.children(parent).to_vec();
            for child in children {
                let only_here =
                    self.dag.parents(child).len() == 1 && !self.root_indices.contains_key(&child);
                if only_here {
                    self.unlearn(child);
                    self.transform_record.insert(child, None);
                    todo.push(child);
                } else {
                    self.dag.remove_child(parent, child)?;
                }
            }
        }
        Ok(())
    }

    /// Unlink a detached construction tree whose expression is already in
    /// the graph, leaving registered nodes untouched. Keeps parent
    /// back-reference counts exact.
    fn release_tree(&mut self, husk: NodeId) {
        let mut todo = vec![husk];
        while let Some(node) = todo.pop() {
            if !self.dag.parents(node).is_empty() {
                continue;
            }
            if self.known(node) == Some(node) {
                // A registered, currently parentless node (e.g. a root).
                continue;
            }
            let children = self.dag.children(node).to_vec();
            for child in children {
                if self.dag.remove_child(node, child).is_ok() {
                    todo.push(child);
                }
            }
        }
    }

    /// Assign evaluation indices to every live node, children and parents
    /// alike, and return the index limit (one past the highest index).
    pub fn index_for_evaluation(&mut self) -> usize {
        let roots = self.roots.clone();
        crate::eval::index_graph(&mut self.dag, &roots)
    }
}
