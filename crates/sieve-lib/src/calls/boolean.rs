//! Boolean operators.
//!
//! `and`/`or` evaluate every child on every call and are canonically
//! ordered (commutative); `andSC`/`orSC` evaluate left to right and stop
//! at the first child that blocks the outcome, so they must not be
//! reordered. All four fold literal children away at transform time,
//! degenerating to a single child or a constant literal where possible.

use sieve_core::Result;

use crate::calls::abelian::transform_ordering;
use crate::calls::helpers::{false_literal, literal_truthy, true_literal};
use crate::dag::{Call, CallFactory, Dag, NodeId};
use crate::eval::{EvalContext, GraphEvalState};
use crate::graph::{
    MergeGraph, NodeReporter, validate_n_children, validate_n_or_more_children,
};

pub(crate) fn load(factory: &mut CallFactory) {
    factory
        .add::<True>()
        .add::<False>()
        .add::<Or>()
        .add::<And>()
        .add::<Not>()
        .add::<If>()
        .add::<OrSC>()
        .add::<AndSC>();
}

/// Nullary constant; transforms into the truthy literal.
#[derive(Default)]
pub struct True;

impl Call for True {
    fn name(&self) -> &str {
        "true"
    }

    fn validate(&self, dag: &Dag, node: NodeId, reporter: &mut NodeReporter<'_>) {
        validate_n_children(dag, node, reporter, 0);
    }

    fn transform(
        &self,
        node: NodeId,
        graph: &mut MergeGraph,
        _factory: &CallFactory,
        _reporter: &mut NodeReporter<'_>,
    ) -> Result<bool> {
        let replacement = true_literal(graph);
        graph.replace(node, replacement)?;
        Ok(true)
    }

    fn eval_calculate(
        &self,
        dag: &Dag,
        node: NodeId,
        state: &mut GraphEvalState,
        _ctx: &dyn EvalContext,
    ) -> Result<()> {
        state.node_state_mut(dag, node)?.finish_true()
    }
}

/// Nullary constant; transforms into the null literal.
#[derive(Default)]
pub struct False;

impl Call for False {
    fn name(&self) -> &str {
        "false"
    }

    fn validate(&self, dag: &Dag, node: NodeId, reporter: &mut NodeReporter<'_>) {
        validate_n_children(dag, node, reporter, 0);
    }

    fn transform(
        &self,
        node: NodeId,
        graph: &mut MergeGraph,
        _factory: &CallFactory,
        _reporter: &mut NodeReporter<'_>,
    ) -> Result<bool> {
        let replacement = false_literal(graph);
        graph.replace(node, replacement)?;
        Ok(true)
    }

    fn eval_calculate(
        &self,
        dag: &Dag,
        node: NodeId,
        state: &mut GraphEvalState,
        _ctx: &dyn EvalContext,
    ) -> Result<()> {
        state.node_state_mut(dag, node)?.finish_false()
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Flavor {
    Or,
    And,
}

/// Literal folding shared by all four n-ary booleans.
///
/// A dominant literal (`true` for or, falsy for and) replaces the whole
/// node with the corresponding constant; identity literals are dropped;
/// arity 1 degenerates to the remaining child; arity 0 to the flavor's
/// identity constant. Non-short-circuit flavors fall through to canonical
/// child ordering.
fn transform_nary(
    flavor: Flavor,
    short_circuit: bool,
    node: NodeId,
    graph: &mut MergeGraph,
    factory: &CallFactory,
) -> Result<bool> {
    let children = graph.dag().children(node).to_vec();
    let mut dynamic = Vec::new();
    for child in &children {
        match literal_truthy(graph.dag(), *child) {
            Some(truthy) => {
                if flavor == Flavor::Or && truthy {
                    let replacement = true_literal(graph);
                    graph.replace(node, replacement)?;
                    return Ok(true);
                }
                if flavor == Flavor::And && !truthy {
                    let replacement = false_literal(graph);
                    graph.replace(node, replacement)?;
                    return Ok(true);
                }
            }
            None => dynamic.push(*child),
        }
    }

    if dynamic.len() == 1 {
        graph.replace(node, dynamic[0])?;
        return Ok(true);
    }
    if dynamic.is_empty() {
        let replacement = match flavor {
            Flavor::Or => false_literal(graph),
            Flavor::And => true_literal(graph),
        };
        graph.replace(node, replacement)?;
        return Ok(true);
    }
    if dynamic.len() != children.len() {
        let name = graph
            .dag()
            .call_name(node)
            .unwrap_or_default()
            .to_owned();
        let reduced = graph.create_call(&name, factory)?;
        for child in dynamic {
            graph.add_child(reduced, child)?;
        }
        graph.replace(node, reduced)?;
        return Ok(true);
    }

    if short_circuit {
        Ok(false)
    } else {
        transform_ordering(node, graph, factory)
    }
}

/// True iff any child is truthy. Evaluates every child on every call.
#[derive(Default)]
pub struct Or;

impl Call for Or {
    fn name(&self) -> &str {
        "or"
    }

    fn validate(&self, dag: &Dag, node: NodeId, reporter: &mut NodeReporter<'_>) {
        validate_n_or_more_children(dag, node, reporter, 2);
    }

    fn transform(
        &self,
        node: NodeId,
        graph: &mut MergeGraph,
        factory: &CallFactory,
        _reporter: &mut NodeReporter<'_>,
    ) -> Result<bool> {
        transform_nary(Flavor::Or, false, node, graph, factory)
    }

    fn eval_calculate(
        &self,
        dag: &Dag,
        node: NodeId,
        state: &mut GraphEvalState,
        ctx: &dyn EvalContext,
    ) -> Result<()> {
        let mut unfinished = false;
        for child in dag.children(node).to_vec() {
            state.eval(dag, child, ctx)?;
            if state.is_truthy(dag, child)? {
                return state.node_state_mut(dag, node)?.finish_true();
            }
            if !state.is_finished(dag, child)? {
                unfinished = true;
            }
        }
        if !unfinished {
            state.node_state_mut(dag, node)?.finish()?;
        }
        Ok(())
    }
}

/// True iff every child is truthy. Evaluates every child on every call.
#[derive(Default)]
pub struct And;

impl Call for And {
    fn name(&self) -> &str {
        "and"
    }

    fn validate(&self, dag: &Dag, node: NodeId, reporter: &mut NodeReporter<'_>) {
        validate_n_or_more_children(dag, node, reporter, 2);
    }

    fn transform(
        &self,
        node: NodeId,
        graph: &mut MergeGraph,
        factory: &CallFactory,
        _reporter: &mut NodeReporter<'_>,
    ) -> Result<bool> {
        transform_nary(Flavor::And, false, node, graph, factory)
    }

    fn eval_calculate(
        &self,
        dag: &Dag,
        node: NodeId,
        state: &mut GraphEvalState,
        ctx: &dyn EvalContext,
    ) -> Result<()> {
        let mut unfinished = false;
        for child in dag.children(node).to_vec() {
            state.eval(dag, child, ctx)?;
            if state.is_finished(dag, child)? && !state.is_truthy(dag, child)? {
                // A settled falsy child decides the whole conjunction.
                return state.node_state_mut(dag, node)?.finish();
            }
            if !state.is_finished(dag, child)? {
                unfinished = true;
            }
        }
        if !unfinished {
            state.node_state_mut(dag, node)?.finish_true()?;
        }
        Ok(())
    }
}

/// True iff the single child is settled falsy.
#[derive(Default)]
pub struct Not;

impl Call for Not {
    fn name(&self) -> &str {
        "not"
    }

    fn validate(&self, dag: &Dag, node: NodeId, reporter: &mut NodeReporter<'_>) {
        validate_n_children(dag, node, reporter, 1);
    }

    fn transform(
        &self,
        node: NodeId,
        graph: &mut MergeGraph,
        _factory: &CallFactory,
        _reporter: &mut NodeReporter<'_>,
    ) -> Result<bool> {
        let child = match graph.dag().children(node).first() {
            Some(child) => *child,
            None => return Ok(false),
        };
        match literal_truthy(graph.dag(), child) {
            Some(truthy) => {
                let replacement = if truthy {
                    false_literal(graph)
                } else {
                    true_literal(graph)
                };
                graph.replace(node, replacement)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn eval_calculate(
        &self,
        dag: &Dag,
        node: NodeId,
        state: &mut GraphEvalState,
        ctx: &dyn EvalContext,
    ) -> Result<()> {
        let child = dag.children(node)[0];
        state.eval(dag, child, ctx)?;
        if state.is_truthy(dag, child)? {
            state.node_state_mut(dag, node)?.finish()?;
        } else if state.is_finished(dag, child)? {
            state.node_state_mut(dag, node)?.finish_true()?;
        }
        Ok(())
    }
}

/// Second child if the predicate is truthy, third once it settles falsy.
/// Takes on the chosen branch by forwarding.
#[derive(Default)]
pub struct If;

impl Call for If {
    fn name(&self) -> &str {
        "if"
    }

    fn validate(&self, dag: &Dag, node: NodeId, reporter: &mut NodeReporter<'_>) {
        validate_n_children(dag, node, reporter, 3);
    }

    fn transform(
        &self,
        node: NodeId,
        graph: &mut MergeGraph,
        _factory: &CallFactory,
        _reporter: &mut NodeReporter<'_>,
    ) -> Result<bool> {
        let children = graph.dag().children(node).to_vec();
        let &[pred, when_true, when_false] = children.as_slice() else {
            return Ok(false);
        };
        match literal_truthy(graph.dag(), pred) {
            Some(truthy) => {
                let replacement = if truthy { when_true } else { when_false };
                graph.replace(node, replacement)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn eval_calculate(
        &self,
        dag: &Dag,
        node: NodeId,
        state: &mut GraphEvalState,
        ctx: &dyn EvalContext,
    ) -> Result<()> {
        let children = dag.children(node).to_vec();
        let &[pred, when_true, when_false] = children.as_slice() else {
            return Ok(());
        };
        state.eval(dag, pred, ctx)?;
        if state.is_truthy(dag, pred)? {
            state.eval(dag, when_true, ctx)?;
            state.node_state_mut(dag, node)?.forward(when_true)?;
        } else if state.is_finished(dag, pred)? {
            state.eval(dag, when_false, ctx)?;
            state.node_state_mut(dag, node)?.forward(when_false)?;
        }
        Ok(())
    }
}

/// Short-circuit or: children evaluate left to right, and no child is
/// evaluated until every earlier child has settled falsy.
#[derive(Default)]
pub struct OrSC;

impl Call for OrSC {
    fn name(&self) -> &str {
        "orSC"
    }

    fn validate(&self, dag: &Dag, node: NodeId, reporter: &mut NodeReporter<'_>) {
        validate_n_or_more_children(dag, node, reporter, 2);
    }

    fn transform(
        &self,
        node: NodeId,
        graph: &mut MergeGraph,
        factory: &CallFactory,
        _reporter: &mut NodeReporter<'_>,
    ) -> Result<bool> {
        transform_nary(Flavor::Or, true, node, graph, factory)
    }

    fn eval_calculate(
        &self,
        dag: &Dag,
        node: NodeId,
        state: &mut GraphEvalState,
        ctx: &dyn EvalContext,
    ) -> Result<()> {
        for child in dag.children(node).to_vec() {
            state.eval(dag, child, ctx)?;
            if state.is_truthy(dag, child)? {
                return state.node_state_mut(dag, node)?.finish_true();
            }
            if !state.is_finished(dag, child)? {
                // Blocked: later children stay unevaluated until this one
                // settles.
                return Ok(());
            }
        }
        // Every child settled falsy.
        state.node_state_mut(dag, node)?.finish()?;
        Ok(())
    }
}

/// Short-circuit and: stops at the first child that is not (yet) truthy,
/// finishing falsy only once that child settles.
#[derive(Default)]
pub struct AndSC;

impl Call for AndSC {
    fn name(&self) -> &str {
        "andSC"
    }

    fn validate(&self, dag: &Dag, node: NodeId, reporter: &mut NodeReporter<'_>) {
        validate_n_or_more_children(dag, node, reporter, 2);
    }

    fn transform(
        &self,
        node: NodeId,
        graph: &mut MergeGraph,
        factory: &CallFactory,
        _reporter: &mut NodeReporter<'_>,
    ) -> Result<bool> {
        transform_nary(Flavor::And, true, node, graph, factory)
    }

    fn eval_calculate(
        &self,
        dag: &Dag,
        node: NodeId,
        state: &mut GraphEvalState,
        ctx: &dyn EvalContext,
    ) -> Result<()> {
        for child in dag.children(node).to_vec() {
            state.eval(dag, child, ctx)?;
            if !state.is_truthy(dag, child)? {
                if state.is_finished(dag, child)? {
                    // Settled falsy child: the conjunction is false.
                    state.node_state_mut(dag, node)?.finish()?;
                }
                return Ok(());
            }
        }
        // Every child is truthy.
        state.node_state_mut(dag, node)?.finish_true()?;
        Ok(())
    }
}
