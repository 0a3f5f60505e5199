use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use sieve_core::{Value, ValueList};

use crate::calls::standard_factory;
use crate::dag::{Call, CallFactory, Dag, NodeId};
use crate::eval::{EvalContext, GraphEvalState, SimpleContext};
use crate::graph::MergeGraph;
use crate::sexpr::parse_call;

/// Counts calculations; never produces values, never finishes.
struct Probe {
    name: &'static str,
    calls: AtomicUsize,
}

impl Call for Probe {
    fn name(&self) -> &str {
        self.name
    }

    fn eval_calculate(
        &self,
        _dag: &Dag,
        _node: NodeId,
        _state: &mut GraphEvalState,
        _ctx: &dyn EvalContext,
    ) -> sieve_core::Result<()> {
        self.calls.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }
}

fn factory_with_probes() -> (CallFactory, Arc<Probe>, Arc<Probe>) {
    let mut factory = standard_factory();
    let probe = Arc::new(Probe {
        name: "probe",
        calls: AtomicUsize::new(0),
    });
    let probe2 = Arc::new(Probe {
        name: "probe2",
        calls: AtomicUsize::new(0),
    });
    let shared: Arc<dyn Call> = probe.clone();
    factory.add_generator("probe", move || shared.clone());
    let shared: Arc<dyn Call> = probe2.clone();
    factory.add_generator("probe2", move || shared.clone());
    (factory, probe, probe2)
}

fn compile(
    factory: &CallFactory,
    text: &str,
) -> (MergeGraph, NodeId, GraphEvalState) {
    let mut graph = MergeGraph::new();
    let mut pos = 0;
    let tree = parse_call(text, &mut pos, factory, graph.dag_mut()).unwrap();
    let index = graph.add_root(tree).unwrap();
    let root = graph.root(index).unwrap();
    let limit = graph.index_for_evaluation();
    let state = GraphEvalState::new(limit);
    (graph, root, state)
}

fn ctx_with_fields(fields: &[(&str, &[i64])]) -> SimpleContext {
    let mut ctx = SimpleContext::new();
    for (name, numbers) in fields {
        let list = ValueList::new();
        for n in *numbers {
            list.push(Value::number(*n).named(name));
        }
        ctx.insert_field(*name, list);
    }
    ctx
}

#[test]
fn and_settles_true_when_every_child_is_truthy_and_finished() {
    let factory = standard_factory();
    let (graph, root, mut state) = compile(&factory, "(and (field 'a') (field 'b'))");
    let ctx = ctx_with_fields(&[("a", &[1]), ("b", &[2])]);

    let values = state.eval(graph.dag(), root, &ctx).unwrap();
    assert_eq!(values.len(), 1);
    assert!(state.is_finished(graph.dag(), root).unwrap());
}

#[test]
fn and_settles_false_on_a_settled_empty_child() {
    let factory = standard_factory();
    let (graph, root, mut state) = compile(&factory, "(and (field 'a') (field 'b'))");
    let ctx = ctx_with_fields(&[("a", &[]), ("b", &[2])]);

    let values = state.eval(graph.dag(), root, &ctx).unwrap();
    assert!(values.is_empty());
    assert!(state.is_finished(graph.dag(), root).unwrap());
}

#[test]
fn and_evaluates_every_child_even_while_blocked() {
    let (factory, probe, probe2) = factory_with_probes();
    let (graph, root, mut state) = compile(&factory, "(and (probe) (probe2))");
    let ctx = SimpleContext::new();

    state.eval(graph.dag(), root, &ctx).unwrap();
    assert_eq!(probe.calls.load(Ordering::Relaxed), 1);
    assert_eq!(probe2.calls.load(Ordering::Relaxed), 1);
    assert!(!state.is_finished(graph.dag(), root).unwrap());
}

#[test]
fn or_settles_true_on_any_truthy_child() {
    let factory = standard_factory();
    let (graph, root, mut state) = compile(&factory, "(or (field 'a') (field 'b'))");
    let ctx = ctx_with_fields(&[("a", &[]), ("b", &[2])]);

    let values = state.eval(graph.dag(), root, &ctx).unwrap();
    assert_eq!(values.len(), 1);
    assert!(state.is_finished(graph.dag(), root).unwrap());
}

#[test]
fn or_settles_false_only_when_every_child_is_finished() {
    let (factory, probe, _) = factory_with_probes();
    let (graph, root, mut state) = compile(&factory, "(or (probe) (field 'a'))");
    let ctx = ctx_with_fields(&[("a", &[])]);

    state.eval(graph.dag(), root, &ctx).unwrap();
    assert!(!state.is_finished(graph.dag(), root).unwrap());
    assert_eq!(probe.calls.load(Ordering::Relaxed), 1);
}

#[test]
fn not_inverts_a_settled_child() {
    let factory = standard_factory();
    let (graph, root, mut state) = compile(&factory, "(not (field 'a'))");
    let ctx = ctx_with_fields(&[("a", &[])]);

    let values = state.eval(graph.dag(), root, &ctx).unwrap();
    assert_eq!(values.len(), 1);
    assert!(state.is_finished(graph.dag(), root).unwrap());
}

#[test]
fn not_settles_false_on_a_truthy_child() {
    let factory = standard_factory();
    let (graph, root, mut state) = compile(&factory, "(not (field 'a'))");
    let ctx = ctx_with_fields(&[("a", &[1])]);

    let values = state.eval(graph.dag(), root, &ctx).unwrap();
    assert!(values.is_empty());
    assert!(state.is_finished(graph.dag(), root).unwrap());
}
