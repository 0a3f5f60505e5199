//! Node arena and the operator trait.
//!
//! A node is either a [`Literal`](NodeKind::Literal) wrapping a constant
//! value or a [`Call`](NodeKind::Call) with ordered children and a behavior
//! object. Children are shared (a child may have several parents once
//! merged into a graph); the arena maintains one parent back-reference per
//! edge so that rewriting can walk upward.
//!
//! The arena never frees slots. Detached nodes simply become unreachable
//! and die with the arena, which makes stale [`NodeId`]s harmless: they
//! fail graph lookups instead of dangling.

use std::fmt;
use std::sync::Arc;

use sieve_core::{CoreError, LiteralValue, Result};

use crate::dag::CallFactory;
use crate::eval::{EvalContext, GraphEvalState};
use crate::graph::{MergeGraph, NodeReporter};

/// Index into a [`Dag`]'s node arena.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u32);

impl NodeId {
    pub(crate) fn new(raw: usize) -> Self {
        Self(raw as u32)
    }

    pub fn as_usize(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Debug for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "n{}", self.0)
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "n{}", self.0)
    }
}

/// Behavior of a call operator.
///
/// One implementation per operator name, registered in a [`CallFactory`].
/// Implementations are stateless: per-evaluation state goes into the
/// node's evaluation slot, never into the behavior object, so a single
/// object can serve every node of its operator across every context.
pub trait Call: Send + Sync {
    /// Operator mnemonic, e.g. `"and"`.
    fn name(&self) -> &str;

    /// Check arity/type constraints, reporting problems without mutating
    /// anything. Called once per node per validation pass.
    fn validate(&self, _dag: &Dag, _node: NodeId, _reporter: &mut NodeReporter<'_>) {}

    /// Perform a local rewrite through [`MergeGraph`] primitives, returning
    /// whether anything changed. A transform may only replace itself or
    /// alter its own children; it must not touch unrelated nodes.
    fn transform(
        &self,
        _node: NodeId,
        _graph: &mut MergeGraph,
        _factory: &CallFactory,
        _reporter: &mut NodeReporter<'_>,
    ) -> Result<bool> {
        Ok(false)
    }

    /// One-time, context-dependent setup. Runs exactly once per node per
    /// evaluation context, before the first calculation.
    fn eval_initialize(
        &self,
        _dag: &Dag,
        _node: NodeId,
        _state: &mut GraphEvalState,
        _ctx: &dyn EvalContext,
    ) -> Result<()> {
        Ok(())
    }

    /// Update this node's values from its children, evaluating them as
    /// needed. Called at most once per phase per node.
    fn eval_calculate(
        &self,
        dag: &Dag,
        node: NodeId,
        state: &mut GraphEvalState,
        ctx: &dyn EvalContext,
    ) -> Result<()>;
}

/// What a node is.
#[derive(Clone)]
pub enum NodeKind {
    /// Constant value; `None` is the null literal.
    Literal(LiteralValue),
    /// Operator application.
    Call(Arc<dyn Call>),
}

/// A vertex of the expression DAG.
pub struct Node {
    kind: NodeKind,
    children: Vec<NodeId>,
    parents: Vec<NodeId>,
    index: Option<u32>,
}

impl Node {
    pub fn kind(&self) -> &NodeKind {
        &self.kind
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    /// One entry per incoming edge; a parent holding this node twice
    /// appears twice.
    pub fn parents(&self) -> &[NodeId] {
        &self.parents
    }

    pub fn is_literal(&self) -> bool {
        matches!(self.kind, NodeKind::Literal(_))
    }

    /// Evaluation index, assigned once before evaluation begins.
    pub fn index(&self) -> Option<u32> {
        self.index
    }
}

/// Flat node arena.
#[derive(Default)]
pub struct Dag {
    nodes: Vec<Node>,
}

impl Dag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Add a literal node.
    pub fn literal(&mut self, value: LiteralValue) -> NodeId {
        self.push(NodeKind::Literal(value))
    }

    /// Add a call node with the given behavior.
    pub fn call(&mut self, behavior: Arc<dyn Call>) -> NodeId {
        self.push(NodeKind::Call(behavior))
    }

    /// Add a call node by operator name.
    pub fn create(&mut self, name: &str, factory: &CallFactory) -> Result<NodeId> {
        Ok(self.call(factory.create(name)?))
    }

    fn push(&mut self, kind: NodeKind) -> NodeId {
        let id = NodeId::new(self.nodes.len());
        self.nodes.push(Node {
            kind,
            children: Vec::new(),
            parents: Vec::new(),
            index: None,
        });
        id
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.as_usize()]
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.nodes[id.as_usize()].children
    }

    pub fn parents(&self, id: NodeId) -> &[NodeId] {
        &self.nodes[id.as_usize()].parents
    }

    pub fn is_literal(&self, id: NodeId) -> bool {
        self.node(id).is_literal()
    }

    /// Literal payload, if `id` is a literal node.
    pub fn literal_value(&self, id: NodeId) -> Option<&LiteralValue> {
        match &self.node(id).kind {
            NodeKind::Literal(v) => Some(v),
            NodeKind::Call(_) => None,
        }
    }

    /// Behavior object, if `id` is a call node.
    pub fn behavior(&self, id: NodeId) -> Option<Arc<dyn Call>> {
        match &self.node(id).kind {
            NodeKind::Call(b) => Some(b.clone()),
            NodeKind::Literal(_) => None,
        }
    }

    /// Operator name, if `id` is a call node.
    pub fn call_name(&self, id: NodeId) -> Option<&str> {
        match &self.node(id).kind {
            NodeKind::Call(b) => Some(b.name()),
            NodeKind::Literal(_) => None,
        }
    }

    /// Append `child` under `parent`, recording the back-reference.
    pub fn add_child(&mut self, parent: NodeId, child: NodeId) -> Result<()> {
        if self.is_literal(parent) {
            return Err(CoreError::einval("literal nodes cannot have children"));
        }
        self.nodes[parent.as_usize()].children.push(child);
        self.nodes[child.as_usize()].parents.push(parent);
        Ok(())
    }

    /// Remove one `parent`→`child` edge.
    pub fn remove_child(&mut self, parent: NodeId, child: NodeId) -> Result<()> {
        let children = &mut self.nodes[parent.as_usize()].children;
        let pos = children.iter().position(|c| *c == child).ok_or_else(|| {
            CoreError::enoent(format!("{child} is not a child of {parent}"))
        })?;
        children.remove(pos);
        remove_one(&mut self.nodes[child.as_usize()].parents, parent);
        Ok(())
    }

    /// Rewrite one `parent`→`old` edge to point at `new`.
    pub fn replace_child(&mut self, parent: NodeId, old: NodeId, new: NodeId) -> Result<()> {
        let children = &self.nodes[parent.as_usize()].children;
        let pos = children.iter().position(|c| *c == old).ok_or_else(|| {
            CoreError::enoent(format!("{old} is not a child of {parent}"))
        })?;
        self.replace_child_at(parent, pos, new);
        Ok(())
    }

    /// Rewrite the edge at child position `pos` to point at `new`.
    pub(crate) fn replace_child_at(&mut self, parent: NodeId, pos: usize, new: NodeId) {
        let old = self.nodes[parent.as_usize()].children[pos];
        self.nodes[parent.as_usize()].children[pos] = new;
        remove_one(&mut self.nodes[old.as_usize()].parents, parent);
        self.nodes[new.as_usize()].parents.push(parent);
    }

    /// Canonical s-expression form of the subtree at `id`. This is the
    /// merge key: child order matters, equivalence is purely syntactic.
    pub fn sexpr(&self, id: NodeId) -> String {
        let mut out = String::new();
        self.write_sexpr(id, &mut out);
        out
    }

    fn write_sexpr(&self, id: NodeId, out: &mut String) {
        match &self.node(id).kind {
            NodeKind::Literal(v) => out.push_str(&crate::sexpr::emit_literal(v)),
            NodeKind::Call(b) => {
                out.push('(');
                out.push_str(b.name());
                for child in self.children(id) {
                    out.push(' ');
                    self.write_sexpr(*child, out);
                }
                out.push(')');
            }
        }
    }

    /// Human-oriented label: operator name for calls, sexpr for literals.
    pub fn label(&self, id: NodeId) -> String {
        match &self.node(id).kind {
            NodeKind::Literal(v) => crate::sexpr::emit_literal(v),
            NodeKind::Call(b) => b.name().to_owned(),
        }
    }

    pub fn index_of(&self, id: NodeId) -> Option<u32> {
        self.node(id).index
    }

    pub(crate) fn set_index(&mut self, id: NodeId, index: u32) {
        self.nodes[id.as_usize()].index = Some(index);
    }
}

fn remove_one(list: &mut Vec<NodeId>, value: NodeId) {
    if let Some(pos) = list.iter().position(|v| *v == value) {
        list.remove(pos);
    }
}
