//! Predicate s-expression engine.
//!
//! A small domain-specific language of side-effect-free, lazily evaluated
//! expressions, compiled into a merged DAG and evaluated incrementally
//! against streaming inspection contexts.
//!
//! # Architecture
//!
//! ```text
//! text ──sexpr──▶ Sexpr tree ──lower──▶ Dag nodes ──MergeGraph──▶ merged DAG
//!                                                       │
//!                                       validate / transform (fixed point)
//!                                                       │
//!                                                       ▼
//!                                    GraphEvalState, one per context,
//!                                    driven once per inspection phase
//! ```
//!
//! - [`sexpr`]: logos-based lexer, position-advancing parser, and the
//!   emitter that round-trips literals.
//! - [`dag`]: the node arena, the [`Call`] operator trait, and the
//!   [`CallFactory`] registry that keeps the language extensible.
//! - [`graph`]: [`MergeGraph`] (common-subexpression merging, safe
//!   rewriting), the validation/transformation drivers, reporting, and
//!   Graphviz output.
//! - [`eval`]: per-context evaluation state with local/forwarded/aliased
//!   bindings and per-phase memoization.
//! - [`calls`]: the standard library of operators.

pub mod calls;
pub mod dag;
pub mod eval;
pub mod graph;
pub mod sexpr;

pub use sieve_core::{
    CoreError, DynamicList, LiteralValue, ParseError, Phase, Result, Value, ValueKind, ValueList,
};

pub use calls::{add_template, standard_factory};
pub use dag::{Call, CallFactory, Dag, Node, NodeId, NodeKind, bfs_down, bfs_up};
pub use eval::{
    EvalContext, GraphEvalState, HostOperator, NodeEvalState, NullContext, SimpleContext,
    index_graph, initialize_graph,
};
pub use graph::{
    MergeGraph, NodeReporter, Report, Reporter, Severity, to_dot, transform_graph,
    transform_graph_with_limit, validate_graph,
};
pub use sexpr::{Sexpr, emit_literal, emit_literal_name, parse_call, parse_expr, parse_literal};
