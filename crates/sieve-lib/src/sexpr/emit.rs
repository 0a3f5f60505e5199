//! Emission of the text form.
//!
//! The inverse of the parser, used by pretty-printers and by the merge
//! graph's canonical keys. Names that are not bare identifiers are quoted
//! with `'` and `\` escaped, so emitted text always re-parses.

use std::fmt;

use sieve_core::{LiteralValue, escape_string, is_bare_name};

use crate::sexpr::Sexpr;

/// Text form of a literal. The null literal is `:`.
pub fn emit_literal(value: &LiteralValue) -> String {
    match value {
        None => ":".to_owned(),
        Some(v) => v.sexpr(),
    }
}

/// Text form of a value name: bare if the grammar allows, quoted
/// otherwise.
pub fn emit_literal_name(name: &str) -> String {
    if is_bare_name(name) {
        name.to_owned()
    } else {
        escape_string(name.as_bytes())
    }
}

impl fmt::Display for Sexpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Sexpr::Literal(value) => f.write_str(&emit_literal(value)),
            Sexpr::Call { name, children } => {
                write!(f, "({name}")?;
                for child in children {
                    write!(f, " {child}")?;
                }
                f.write_str(")")
            }
        }
    }
}
