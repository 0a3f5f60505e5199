//! Inspection phase identifiers.
//!
//! Phases are opaque to the engine: the host pipeline defines what they
//! mean (request header, response body, ...). The evaluation engine only
//! compares them for equality to decide whether a node needs
//! recalculation. An absent phase (`Option::<Phase>::None`) forces
//! recalculation on every `eval`, which is the pure-literal evaluation
//! path.

use std::fmt;

/// A named stage of the host inspection pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Phase(pub u32);

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "phase {}", self.0)
    }
}
