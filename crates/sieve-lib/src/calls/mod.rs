//! Standard library of call operators.
//!
//! These are ordinary [`Call`](crate::dag::Call) implementations,
//! registered through the same factory mechanism open to any module; the
//! engine core knows nothing about them.

mod abelian;
mod boolean;
mod filter;
mod helpers;
mod host;
mod math;
mod template;

#[cfg(test)]
mod boolean_tests;
#[cfg(test)]
mod math_tests;
#[cfg(test)]
mod template_tests;

pub use abelian::transform_ordering;
pub use helpers::{false_literal, literal_truthy, true_literal};
pub use template::{Ref, TemplateDef, add_template};

use crate::dag::CallFactory;

/// Factory with every standard call registered.
pub fn standard_factory() -> CallFactory {
    let mut factory = CallFactory::new();
    boolean::load(&mut factory);
    filter::load(&mut factory);
    math::load(&mut factory);
    host::load(&mut factory);
    template::load(&mut factory);
    factory
}
