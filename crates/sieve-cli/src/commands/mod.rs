//! Shared input handling for all subcommands.
//!
//! Every subcommand reads the same line format from stdin: `Define` lines
//! register templates, everything else is an expression with an optional
//! leading label, merged into one graph.

pub mod check;
pub mod dot;
pub mod eval;

use std::collections::BTreeMap;
use std::io::BufRead;

use annotate_snippets::{AnnotationKind, Level, Renderer};
use sieve_core::{CoreError, ParseError};
use sieve_lib::{
    CallFactory, MergeGraph, Reporter, add_template, parse_call, parse_expr, standard_factory,
    transform_graph, validate_graph,
};

/// Parsed input: one graph, labeled roots, and a factory extended with
/// every `Define`d template.
pub struct Session {
    pub factory: CallFactory,
    pub graph: MergeGraph,
    pub root_names: BTreeMap<usize, String>,
}

impl Session {
    pub fn new() -> Self {
        Self {
            factory: standard_factory(),
            graph: MergeGraph::new(),
            root_names: BTreeMap::new(),
        }
    }

    /// Read every line of `input`. Returns `false` (after printing the
    /// problem to stderr) on the first bad line.
    pub fn read(&mut self, input: impl BufRead) -> bool {
        for line in input.lines() {
            let line = match line {
                Ok(line) => line,
                Err(err) => {
                    eprintln!("error: reading input: {err}");
                    return false;
                }
            };
            if !self.handle_line(&line) {
                return false;
            }
        }
        true
    }

    fn handle_line(&mut self, line: &str) -> bool {
        if line.trim().is_empty() {
            return true;
        }
        let result = if let Some(rest) = line.strip_prefix("Define ") {
            self.handle_define(rest)
        } else {
            self.handle_expression(line)
        };
        match result {
            Ok(()) => true,
            Err(CoreError::Parse(parse_error)) => {
                eprint!("{}", render_parse_error(line, &parse_error));
                false
            }
            Err(err) => {
                eprintln!("error: {err}");
                false
            }
        }
    }

    // define := 'Define' SP name SP arglist SP body
    fn handle_define(&mut self, rest: &str) -> Result<(), CoreError> {
        let mut words = rest.splitn(2, ' ');
        let name = words
            .next()
            .filter(|n| !n.is_empty())
            .ok_or_else(|| CoreError::einval("Define: missing template name"))?;
        let rest = words
            .next()
            .ok_or_else(|| CoreError::einval("Define: missing argument list"))?;
        let mut words = rest.splitn(2, ' ');
        let arglist = words.next().unwrap_or_default();
        let body_text = words
            .next()
            .ok_or_else(|| CoreError::einval("Define: missing body"))?;

        let params: Vec<String> = arglist
            .split(',')
            .filter(|p| !p.is_empty())
            .map(str::to_owned)
            .collect();
        let mut pos = 0;
        let body = parse_expr(body_text, &mut pos)?;
        if !body_text[pos..].trim().is_empty() {
            return Err(ParseError::new(pos, "trailing input after body").into());
        }
        add_template(&mut self.factory, name, params, body);
        Ok(())
    }

    // line := expression | label SP expression
    fn handle_expression(&mut self, line: &str) -> Result<(), CoreError> {
        let mut pos = 0;
        let label = match (line.find(' '), line.find('(')) {
            (Some(space), Some(paren)) if space < paren => {
                pos = space + 1;
                Some(line[..space].to_owned())
            }
            _ => None,
        };

        let node = parse_call(line, &mut pos, &self.factory, self.graph.dag_mut())?;
        if !line[pos..].trim().is_empty() {
            return Err(ParseError::new(pos, "trailing input after expression").into());
        }
        let index = self.graph.add_root(node)?;
        let name = label.unwrap_or_else(|| line[..pos].trim().to_owned());
        self.root_names.insert(index, name);
        Ok(())
    }

    /// Pre-transform validation, transformation to a fixed point, and
    /// (optionally) post-transform validation. Findings accumulate in
    /// `reporter`; a divergence aborts immediately.
    pub fn analyze(&mut self, reporter: &mut Reporter, post_validate: bool) -> Result<(), CoreError> {
        validate_graph(&self.graph, reporter);
        reporter.check()?;
        transform_graph(&mut self.graph, &self.factory, reporter)?;
        if post_validate {
            validate_graph(&self.graph, reporter);
        }
        reporter.check()
    }
}

/// Caret-annotated rendering of a parse error against its input line.
pub fn render_parse_error(line: &str, error: &ParseError) -> String {
    let start = error.position.min(line.len());
    let end = (start + 1).min(line.len()).max(start);
    let snippet = annotate_snippets::Snippet::source(line).line_start(1).annotation(
        AnnotationKind::Primary
            .span(start..end)
            .label(&error.message),
    );
    let report = [Level::ERROR.primary_title("parse error").element(snippet)];
    format!("{}\n", Renderer::plain().render(&report))
}

#[cfg(test)]
mod tests {
    use super::Session;

    #[test]
    fn labeled_and_unlabeled_expressions() {
        let mut session = Session::new();
        let input = b"r1 (and (field 'a') (field 'b'))\n(not (field 'a'))\n" as &[u8];
        assert!(session.read(input));
        assert_eq!(session.graph.size(), 2);
        assert_eq!(session.root_names.get(&0).map(String::as_str), Some("r1"));
        assert_eq!(
            session.root_names.get(&1).map(String::as_str),
            Some("(not (field 'a'))")
        );
    }

    #[test]
    fn define_lines_register_templates() {
        let mut session = Session::new();
        let input =
            b"Define both a,b (and (ref 'a') (ref 'b'))\n(both (field 'x') (field 'y'))\n"
                as &[u8];
        assert!(session.read(input));
        assert_eq!(session.graph.size(), 1);

        let mut reporter = sieve_lib::Reporter::new();
        session.analyze(&mut reporter, true).unwrap();
        let root = session.graph.root(0).unwrap();
        assert_eq!(
            session.graph.dag().sexpr(root),
            "(and (field 'x') (field 'y'))"
        );
    }

    #[test]
    fn bad_lines_stop_the_session() {
        let mut session = Session::new();
        assert!(!session.read(b"(and 'a'\n" as &[u8]));

        let mut session = Session::new();
        assert!(!session.read(b"5\n" as &[u8]));

        let mut session = Session::new();
        assert!(!session.read(b"Define broken\n" as &[u8]));
    }

    #[test]
    fn parse_errors_render_against_the_line() {
        let line = "(and 'a' @)";
        let error = sieve_core::ParseError::new(9, "unexpected character `@`");
        let rendered = super::render_parse_error(line, &error);
        assert!(rendered.contains("parse error"));
        assert!(rendered.contains("(and 'a' @)"));
        assert!(rendered.contains("unexpected character `@`"));
    }
}
