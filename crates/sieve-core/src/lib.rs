//! Core data structures for the sieve predicate engine.
//!
//! This crate is the leaf of the workspace: the immutable [`Value`] model,
//! the shared [`ValueList`] handle used by evaluation state, inspection
//! [`Phase`] identifiers, and the [`CoreError`] taxonomy. Everything here is
//! free of engine logic so that both the compiler side (parser, graph) and
//! the evaluation side can depend on it.

mod error;
mod list;
mod phase;
mod value;

#[cfg(test)]
mod value_tests;

pub use error::{CoreError, ParseError, Result};
pub use list::ValueList;
pub use phase::Phase;
pub use value::{
    DynamicList, LiteralValue, Value, ValueKind, escape_string, format_float, is_bare_name,
};
