//! S-expression text form: lexer, parser, emitter.
//!
//! The text format is the single exchange format of the engine: rules are
//! written in it, the merge graph keys on it, and tooling prints it back.
//!
//! ```text
//! expr    := literal | call
//! call    := '(' name (' ' expr)* ')'
//! literal := [name ':'] value
//! value   := number | float | string | list | ':'      (':' alone = null)
//! ```
//!
//! The parser and emitter round-trip: `parse(emit(x)) == x` for every
//! value the grammar can produce.

mod emit;
mod lexer;
mod parser;

#[cfg(test)]
mod lexer_tests;

pub use emit::{emit_literal, emit_literal_name};
pub use lexer::{Lexeme, Token, lex, lexeme_text};
pub use parser::{Sexpr, parse_call, parse_expr, parse_literal};
