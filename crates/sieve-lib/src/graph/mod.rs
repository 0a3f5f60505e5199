//! Merged expression forest and the passes that run over it.
//!
//! [`MergeGraph`] owns the node arena and keeps every distinct canonical
//! s-expression alive exactly once. The drivers in [`passes`] run the
//! per-operator `validate`/`transform` hooks over the live graph; the
//! reporter collects their findings without aborting traversal.

mod check;
mod dot;
mod merge;
mod passes;
mod report;


pub use check::check_graph;
pub use dot::{default_decorator, escape_label, to_dot};
pub use merge::MergeGraph;
pub use passes::{
    DEFAULT_TRANSFORM_ROUND_LIMIT, transform_graph, transform_graph_with_limit, validate_graph,
    validate_literal_string_child, validate_n_children, validate_n_or_more_children,
};
pub use report::{NodeReporter, Report, Reporter, Severity};
