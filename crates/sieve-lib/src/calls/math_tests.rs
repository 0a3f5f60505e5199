use sieve_core::{Value, ValueList};

use crate::calls::standard_factory;
use crate::dag::{CallFactory, NodeId};
use crate::eval::{GraphEvalState, SimpleContext};
use crate::graph::{MergeGraph, Reporter, validate_graph};
use crate::sexpr::parse_call;

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

fn eval_with_numbers(text: &str, numbers: &[i64]) -> Vec<Value> {
    let factory = standard_factory();
    let (graph, root, mut state) = compile(&factory, text);
    let mut ctx = SimpleContext::new();
    let list = ValueList::new();
    for n in numbers {
        list.push(Value::number(*n).named("xs"));
    }
    ctx.insert_field("xs", list);
    let values = state.eval(graph.dag(), root, &ctx).unwrap();
    assert!(state.is_finished(graph.dag(), root).unwrap());
    values.snapshot()
}

#[test]
fn add_maps_over_the_stream() {
    let values = eval_with_numbers("(add 10 (field 'xs'))", &[1, 2, 3]);
    let numbers: Vec<i64> = values.iter().map(|v| v.as_number().unwrap()).collect();
    assert_eq!(numbers, vec![11, 12, 13]);
    // Names ride along.
    assert_eq!(values[0].name(), Some("xs"));
}

#[test]
fn add_with_a_float_promotes() {
    let values = eval_with_numbers("(add 0.5 (field 'xs'))", &[1]);
    assert_eq!(values[0].as_float().unwrap(), 1.5);
    assert!(values[0].as_number().is_err());
}

#[test]
fn mult_maps_over_the_stream() {
    let values = eval_with_numbers("(mult 3 (field 'xs'))", &[2, 5]);
    let numbers: Vec<i64> = values.iter().map(|v| v.as_number().unwrap()).collect();
    assert_eq!(numbers, vec![6, 15]);
}

#[test]
fn neg_and_recip_are_unary() {
    let values = eval_with_numbers("(neg (field 'xs'))", &[4, -7]);
    let numbers: Vec<i64> = values.iter().map(|v| v.as_number().unwrap()).collect();
    assert_eq!(numbers, vec![-4, 7]);

    let values = eval_with_numbers("(recip (field 'xs'))", &[4]);
    assert_eq!(values[0].as_float().unwrap(), 0.25);
}

#[test]
fn scalar_literal_inputs_work_too() {
    let factory = standard_factory();
    let (graph, root, mut state) = compile(&factory, "(add 1 5)");
    let ctx = SimpleContext::new();
    let values = state.eval(graph.dag(), root, &ctx).unwrap();
    assert_eq!(values.snapshot()[0].as_number().unwrap(), 6);
}

#[test]
fn non_numeric_subvalues_pass_through_unchanged() {
    let factory = standard_factory();
    let (graph, root, mut state) = compile(&factory, "(add 1 (field 'xs'))");
    let mut ctx = SimpleContext::new();
    ctx.insert_field(
        "xs",
        ValueList::from_values(vec![Value::string("keep").named("xs")]),
    );
    let values = state.eval(graph.dag(), root, &ctx).unwrap();
    assert_eq!(values.snapshot()[0], Value::string("keep").named("xs"));
}

#[test]
fn max_and_min_fold_to_a_single_value() {
    let values = eval_with_numbers("(max (field 'xs'))", &[3, 9, 5]);
    assert_eq!(values.len(), 1);
    assert_eq!(values[0].as_number().unwrap(), 9);

    let values = eval_with_numbers("(min (field 'xs'))", &[3, 9, 5]);
    assert_eq!(values[0].as_number().unwrap(), 3);
}

#[test]
fn folding_an_empty_stream_finishes_empty() {
    let values = eval_with_numbers("(max (field 'xs'))", &[]);
    assert!(values.is_empty());
}

#[test]
fn literal_constant_must_be_numeric() {
    let factory = standard_factory();
    let (graph, _, _) = compile(&factory, "(add 'x' (field 'xs'))");
    let mut reporter = Reporter::new();
    validate_graph(&graph, &mut reporter);
    assert!(reporter.has_errors());
}
