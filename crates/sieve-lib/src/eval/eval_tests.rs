use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use sieve_core::{CoreError, Phase, Value, ValueList};

use crate::calls::standard_factory;
use crate::dag::{Call, CallFactory, Dag, NodeId};
use crate::eval::{
    EvalContext, GraphEvalState, NullContext, SimpleContext, initialize_graph,
};
use crate::graph::{MergeGraph, Reporter, transform_graph, validate_graph};
use crate::sexpr::parse_call;

/// Test double: counts initializations and calculations, never produces a
/// value, never finishes.
#[derive(Default)]
struct Probe {
    name: &'static str,
    inits: AtomicUsize,
    calls: AtomicUsize,
}

impl Probe {
    fn named(name: &'static str) -> Self {
        Self {
            name,
            inits: AtomicUsize::new(0),
            calls: AtomicUsize::new(0),
        }
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::Relaxed)
    }

    fn inits(&self) -> usize {
        self.inits.load(Ordering::Relaxed)
    }
}

impl Call for Probe {
    fn name(&self) -> &str {
        self.name
    }

    fn eval_initialize(
        &self,
        _dag: &Dag,
        _node: NodeId,
        _state: &mut GraphEvalState,
        _ctx: &dyn EvalContext,
    ) -> sieve_core::Result<()> {
        self.inits.fetch_add(1, Ordering::Relaxed);
        Ok(())
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
    let probe = Arc::new(Probe::named("probe"));
    let probe2 = Arc::new(Probe::named("probe2"));
    let shared: Arc<dyn Call> = probe.clone();
    factory.add_generator("probe", move || shared.clone());
    let shared: Arc<dyn Call> = probe2.clone();
    factory.add_generator("probe2", move || shared.clone());
    (factory, probe, probe2)
}

/// Parse, merge, index; no transformation.
fn compile(factory: &CallFactory, text: &str) -> (MergeGraph, NodeId, GraphEvalState) {
    let mut graph = MergeGraph::new();
    let mut pos = 0;
    let tree = parse_call(text, &mut pos, factory, graph.dag_mut()).unwrap();
    let index = graph.add_root(tree).unwrap();
    let root = graph.root(index).unwrap();
    let limit = graph.index_for_evaluation();
    let state = GraphEvalState::new(limit);
    (graph, root, state)
}

#[test]
fn literal_evaluation_needs_no_phase() {
    let factory = standard_factory();
    let (graph, root, mut state) = compile(&factory, "(not :)");
    let values = state.eval(graph.dag(), root, &NullContext).unwrap();
    assert_eq!(values.len(), 1);
    assert!(state.is_finished(graph.dag(), root).unwrap());
}

#[test]
fn calculation_is_memoized_per_phase() {
    let (factory, probe, _) = factory_with_probes();
    let (graph, root, mut state) = compile(&factory, "(probe)");

    let mut ctx = SimpleContext::new().with_phase(Phase(1));
    state.eval(graph.dag(), root, &ctx).unwrap();
    state.eval(graph.dag(), root, &ctx).unwrap();
    assert_eq!(probe.calls(), 1, "same phase must not recalculate");

    ctx.set_phase(Phase(2));
    state.eval(graph.dag(), root, &ctx).unwrap();
    assert_eq!(probe.calls(), 2);
}

#[test]
fn no_phase_always_recalculates() {
    let (factory, probe, _) = factory_with_probes();
    let (graph, root, mut state) = compile(&factory, "(probe)");

    state.eval(graph.dag(), root, &NullContext).unwrap();
    state.eval(graph.dag(), root, &NullContext).unwrap();
    assert_eq!(probe.calls(), 2);
}

#[test]
fn initialization_happens_exactly_once() {
    let (factory, probe, _) = factory_with_probes();
    let (graph, root, mut state) = compile(&factory, "(probe)");

    state.eval(graph.dag(), root, &NullContext).unwrap();
    state.eval(graph.dag(), root, &NullContext).unwrap();
    assert_eq!(probe.inits(), 1);
}

#[test]
fn eager_initialization_covers_the_graph() {
    let (factory, probe, probe2) = factory_with_probes();
    let (graph, _, mut state) = compile(&factory, "(andSC (probe) (probe2))");

    initialize_graph(graph.dag(), graph.roots(), &mut state, &NullContext).unwrap();
    assert_eq!(probe.inits(), 1);
    assert_eq!(probe2.inits(), 1);
    assert_eq!(probe.calls(), 0);
}

#[test]
fn and_sc_never_touches_children_after_a_settled_false() {
    let (factory, probe, _) = factory_with_probes();
    let (graph, root, mut state) = compile(&factory, "(andSC : (probe))");

    let values = state.eval(graph.dag(), root, &NullContext).unwrap();
    assert!(values.is_empty());
    assert!(state.is_finished(graph.dag(), root).unwrap());
    assert_eq!(probe.calls(), 0, "short circuit must not evaluate the probe");
}

#[test]
fn or_sc_blocks_on_an_unsettled_child() {
    let (factory, probe, probe2) = factory_with_probes();
    let (graph, root, mut state) = compile(&factory, "(orSC (probe) (probe2))");

    state.eval(graph.dag(), root, &NullContext).unwrap();
    assert!(!state.is_finished(graph.dag(), root).unwrap());
    assert_eq!(probe.calls(), 1);
    assert_eq!(probe2.calls(), 0, "later children wait for the blocker");
}

#[test]
fn if_forwards_to_the_chosen_branch() {
    let factory = standard_factory();
    let (graph, root, mut state) =
        compile(&factory, "(if (field 'p') (field 'a') (field 'b'))");

    let mut ctx = SimpleContext::new();
    ctx.insert_field("p", ValueList::from_values(vec![Value::number(1).named("p")]));
    let a_list = ctx.insert_field(
        "a",
        ValueList::from_values(vec![Value::number(2).named("a")]),
    );
    ctx.insert_field("b", ValueList::from_values(vec![Value::number(3).named("b")]));

    let values = state.eval(graph.dag(), root, &ctx).unwrap();
    assert!(state.node_state(graph.dag(), root).unwrap().is_forwarding());
    // Through the forward, the root exposes the aliased host list itself.
    assert!(values.ptr_eq(&a_list));
    assert!(state.is_finished(graph.dag(), root).unwrap());
    assert!(state.is_truthy(graph.dag(), root).unwrap());
}

#[test]
fn aliased_fields_finish_separately_from_binding() {
    let factory = standard_factory();
    let (graph, root, mut state) = compile(&factory, "(field 'x')");

    let mut ctx = SimpleContext::new().with_phase(Phase(1));
    ctx.set_fields_complete(false);
    let handle = ctx.insert_field("x", ValueList::new());

    let values = state.eval(graph.dag(), root, &ctx).unwrap();
    assert!(values.ptr_eq(&handle));
    assert!(!state.is_finished(graph.dag(), root).unwrap());

    // The host appends; the aliased node sees it without recalculation.
    handle.push(Value::number(10).named("x"));
    assert_eq!(state.values(graph.dag(), root).unwrap().len(), 1);

    // Once the host declares the field settled, the node finishes.
    ctx.set_fields_complete(true);
    ctx.set_phase(Phase(2));
    state.eval(graph.dag(), root, &ctx).unwrap();
    assert!(state.is_finished(graph.dag(), root).unwrap());
}

#[test]
fn absent_but_settled_fields_finish_empty() {
    let factory = standard_factory();
    let (graph, root, mut state) = compile(&factory, "(field 'missing')");

    let ctx = SimpleContext::new().with_phase(Phase(1));
    let values = state.eval(graph.dag(), root, &ctx).unwrap();
    assert!(values.is_empty());
    assert!(state.is_finished(graph.dag(), root).unwrap());
}

#[test]
fn conjunction_over_field_filter_settles_true() {
    // The full pipeline: parse, merge, validate, transform, evaluate.
    let factory = standard_factory();
    let mut graph = MergeGraph::new();
    let mut pos = 0;
    let tree = parse_call(
        "(and 'true' (eq 5 (field 'x')))",
        &mut pos,
        &factory,
        graph.dag_mut(),
    )
    .unwrap();
    let index = graph.add_root(tree).unwrap();

    let mut reporter = Reporter::new();
    validate_graph(&graph, &mut reporter);
    assert!(!reporter.has_errors(), "{}", reporter.render());
    transform_graph(&mut graph, &factory, &mut reporter).unwrap();
    assert!(!reporter.has_errors(), "{}", reporter.render());

    let limit = graph.index_for_evaluation();
    let mut state = GraphEvalState::new(limit);
    let root = graph.root(index).unwrap();

    let mut ctx = SimpleContext::new().with_phase(Phase(1));
    ctx.insert_field("x", ValueList::from_values(vec![Value::number(5).named("x")]));

    let values = state.eval(graph.dag(), root, &ctx).unwrap();
    assert_eq!(values.len(), 1);
    assert!(state.is_truthy(graph.dag(), root).unwrap());
    assert!(state.is_finished(graph.dag(), root).unwrap());
}

#[test]
fn host_operators_map_the_stream() {
    let factory = standard_factory();
    let (graph, root, mut state) = compile(&factory, "(operator 'double' (field 'xs'))");
    let mut ctx = SimpleContext::new();
    ctx.insert_field(
        "xs",
        ValueList::from_values(vec![
            Value::number(2).named("xs"),
            Value::string("skip").named("xs"),
            Value::number(5).named("xs"),
        ]),
    );
    ctx.add_operator("double", |v: &Value| {
        v.as_number().ok().map(|n| Value::number(n * 2))
    });

    let values = state.eval(graph.dag(), root, &ctx).unwrap();
    let numbers: Vec<i64> = values
        .snapshot()
        .iter()
        .map(|v| v.as_number().unwrap())
        .collect();
    assert_eq!(numbers, vec![4, 10]);
    assert!(state.is_finished(graph.dag(), root).unwrap());
}

#[test]
fn unknown_host_operators_are_enoent() {
    let factory = standard_factory();
    let (graph, root, mut state) = compile(&factory, "(operator 'nope' (field 'xs'))");
    let mut ctx = SimpleContext::new();
    ctx.insert_field("xs", ValueList::from_values(vec![Value::number(1)]));

    let err = state.eval(graph.dag(), root, &ctx).unwrap_err();
    assert!(matches!(err, CoreError::NoEnt(_)));
}

#[test]
fn unindexed_nodes_are_rejected() {
    let factory = standard_factory();
    let mut graph = MergeGraph::new();
    let mut pos = 0;
    let tree = parse_call("(not :)", &mut pos, &factory, graph.dag_mut()).unwrap();
    let index = graph.add_root(tree).unwrap();
    let root = graph.root(index).unwrap();

    let mut state = GraphEvalState::new(0);
    let err = state.eval(graph.dag(), root, &NullContext).unwrap_err();
    assert!(matches!(err, CoreError::Inval(_)));
}

#[test]
fn profiling_records_calculations() {
    let (factory, _, _) = factory_with_probes();
    let (graph, root, mut state) = compile(&factory, "(probe)");
    state.enable_profiling();

    let ctx = SimpleContext::new().with_phase(Phase(1));
    state.eval(graph.dag(), root, &ctx).unwrap();
    state.eval(graph.dag(), root, &ctx).unwrap();

    let root_index = graph.dag().index_of(root).unwrap() as usize;
    let profile = state.profile().unwrap();
    assert_eq!(profile.call_count(root_index), 1);
}
