use sieve_core::CoreError;

use crate::calls::{add_template, standard_factory};
use crate::dag::CallFactory;
use crate::graph::{MergeGraph, Reporter, check_graph, transform_graph, validate_graph};
use crate::sexpr::{parse_call, parse_expr};

fn factory_with(name: &str, params: &[&str], body: &str) -> CallFactory {
    let mut factory = standard_factory();
    let mut pos = 0;
    let body = parse_expr(body, &mut pos).unwrap();
    add_template(
        &mut factory,
        name,
        params.iter().map(|p| (*p).to_owned()).collect(),
        body,
    );
    factory
}

fn expand(factory: &CallFactory, text: &str) -> (MergeGraph, String) {
    let mut graph = MergeGraph::new();
    let mut pos = 0;
    let tree = parse_call(text, &mut pos, factory, graph.dag_mut()).unwrap();
    let index = graph.add_root(tree).unwrap();
    let mut reporter = Reporter::new();
    transform_graph(&mut graph, factory, &mut reporter).unwrap();
    assert!(check_graph(&graph).is_empty());
    let sexpr = graph.dag().sexpr(graph.root(index).unwrap());
    (graph, sexpr)
}

#[test]
fn templates_expand_with_substitution() {
    let factory = factory_with(
        "both",
        &["a", "b"],
        "(and (ref 'a') (ref 'b'))",
    );
    let (_, sexpr) = expand(&factory, "(both (field 'x') (field 'y'))");
    assert_eq!(sexpr, "(and (field 'x') (field 'y'))");
}

#[test]
fn expansion_results_participate_in_folding() {
    let factory = factory_with("always", &[], "(and 'true' 'true')");
    let (_, sexpr) = expand(&factory, "(always)");
    assert_eq!(sexpr, "''");
}

#[test]
fn a_parameter_used_twice_becomes_a_shared_node() {
    let factory = factory_with(
        "twice",
        &["a"],
        "(andSC (ref 'a') (ref 'a'))",
    );
    let (graph, sexpr) = expand(&factory, "(twice (field 'x'))");
    assert_eq!(sexpr, "(andSC (field 'x') (field 'x'))");

    let root = graph.root(0).unwrap();
    let children = graph.dag().children(root);
    assert_eq!(children[0], children[1]);
}

#[test]
fn nested_templates_expand_to_a_fixed_point() {
    let mut factory = factory_with("inner", &["a"], "(not (ref 'a'))");
    let mut pos = 0;
    let body = parse_expr("(inner (inner (ref 'a')))", &mut pos).unwrap();
    add_template(&mut factory, "outer", vec!["a".to_owned()], body);

    let (_, sexpr) = expand(&factory, "(outer (field 'x'))");
    assert_eq!(sexpr, "(not (not (field 'x')))");
}

#[test]
fn arity_mismatch_is_a_validation_error() {
    let factory = factory_with("both", &["a", "b"], "(and (ref 'a') (ref 'b'))");
    let mut graph = MergeGraph::new();
    let mut pos = 0;
    let tree = parse_call("(both (field 'x'))", &mut pos, &factory, graph.dag_mut()).unwrap();
    graph.add_root(tree).unwrap();

    let mut reporter = Reporter::new();
    validate_graph(&graph, &mut reporter);
    assert!(reporter.has_errors());

    // The transform refuses to expand a malformed call.
    let mut reporter = Reporter::new();
    transform_graph(&mut graph, &factory, &mut reporter).unwrap();
    assert_eq!(graph.dag().sexpr(graph.root(0).unwrap()), "(both (field 'x'))");
}

#[test]
fn unknown_parameter_reference_is_an_error() {
    let factory = factory_with("bad", &["a"], "(not (ref 'oops'))");
    let mut graph = MergeGraph::new();
    let mut pos = 0;
    let tree = parse_call("(bad (field 'x'))", &mut pos, &factory, graph.dag_mut()).unwrap();
    graph.add_root(tree).unwrap();

    let mut reporter = Reporter::new();
    let err = transform_graph(&mut graph, &factory, &mut reporter).unwrap_err();
    assert!(matches!(err, CoreError::Inval(_)));
}

#[test]
fn ref_outside_a_template_body_is_rejected() {
    let factory = standard_factory();
    let mut graph = MergeGraph::new();
    let mut pos = 0;
    let tree = parse_call("(ref 'a')", &mut pos, &factory, graph.dag_mut()).unwrap();
    graph.add_root(tree).unwrap();

    let mut reporter = Reporter::new();
    validate_graph(&graph, &mut reporter);
    assert!(reporter.has_errors());
}
