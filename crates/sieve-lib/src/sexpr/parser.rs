//! Position-advancing parser.
//!
//! [`parse_literal`] and [`parse_call`] consume a prefix of the text
//! starting at `pos`, advance `pos` to just past what they consumed, and
//! fail with a [`ParseError`] carrying the byte position of the problem.
//! Calls are parsed to an intermediate [`Sexpr`] tree and then lowered
//! into the node arena through the [`CallFactory`]; template bodies stay
//! as `Sexpr` since they outlive any single graph.

use sieve_core::{CoreError, LiteralValue, ParseError, Result, Value};

use crate::dag::{CallFactory, Dag, NodeId};
use crate::sexpr::lexer::{Lexeme, Token, lex, lexeme_text};

/// Parsed expression tree, not yet tied to a graph.
#[derive(Debug, Clone, PartialEq)]
pub enum Sexpr {
    Literal(LiteralValue),
    Call { name: String, children: Vec<Sexpr> },
}

/// Parse a single literal at `pos`.
///
/// Returns `None` for the null literal (`:`). `pos` is advanced to just
/// past the consumed text.
pub fn parse_literal(text: &str, pos: &mut usize) -> Result<LiteralValue, ParseError> {
    let mut cursor = Cursor::new(text, *pos);
    let value = cursor.literal()?;
    *pos = cursor.consumed_to();
    Ok(value)
}

/// Parse a single expression (call or literal) at `pos`.
pub fn parse_expr(text: &str, pos: &mut usize) -> Result<Sexpr, ParseError> {
    let mut cursor = Cursor::new(text, *pos);
    cursor.skip_space();
    let expr = cursor.expr()?;
    *pos = cursor.consumed_to();
    Ok(expr)
}

/// Parse a call at `pos` and lower it into `dag`.
///
/// A literal without an enclosing call is rejected ("naked literal"), as
/// is an unknown operator name.
pub fn parse_call(
    text: &str,
    pos: &mut usize,
    factory: &CallFactory,
    dag: &mut Dag,
) -> Result<NodeId> {
    let mut cursor = Cursor::new(text, *pos);
    cursor.skip_space();
    let sexpr = match cursor.peek_token() {
        Some(Token::ParenOpen) => cursor.call()?,
        Some(_) => return Err(cursor.error("naked literal").into()),
        None => return Err(cursor.error("expected call").into()),
    };
    *pos = cursor.consumed_to();
    lower(&sexpr, dag, factory)
}

/// Lower a parsed tree into arena nodes, instantiating call behaviors
/// through the factory.
pub(crate) fn lower(sexpr: &Sexpr, dag: &mut Dag, factory: &CallFactory) -> Result<NodeId> {
    match sexpr {
        Sexpr::Literal(value) => Ok(dag.literal(value.clone())),
        Sexpr::Call { name, children } => {
            let node = dag.create(name, factory)?;
            for child in children {
                let lowered = lower(child, dag, factory)?;
                dag.add_child(node, lowered)?;
            }
            Ok(node)
        }
    }
}

struct Cursor<'src> {
    source: &'src str,
    lexemes: Vec<Lexeme>,
    at: usize,
    consumed_to: usize,
}

impl<'src> Cursor<'src> {
    fn new(source: &'src str, pos: usize) -> Self {
        Self {
            source,
            lexemes: lex(source, pos),
            at: 0,
            consumed_to: pos,
        }
    }

    fn consumed_to(&self) -> usize {
        self.consumed_to
    }

    fn peek(&self) -> Option<&Lexeme> {
        self.lexemes.get(self.at)
    }

    fn peek_token(&self) -> Option<Token> {
        self.peek().map(|l| l.token)
    }

    fn peek_second_token(&self) -> Option<Token> {
        self.lexemes.get(self.at + 1).map(|l| l.token)
    }

    fn bump(&mut self) -> Option<Lexeme> {
        let lexeme = self.lexemes.get(self.at).copied();
        if let Some(l) = lexeme {
            self.at += 1;
            self.consumed_to = l.end;
        }
        lexeme
    }

    fn skip_space(&mut self) {
        while self.peek_token() == Some(Token::Space) {
            self.bump();
        }
    }

    fn position(&self) -> usize {
        self.peek().map_or(self.source.len(), |l| l.start)
    }

    fn error(&self, message: impl Into<String>) -> ParseError {
        ParseError::new(self.position(), message)
    }

    fn text(&self, lexeme: &Lexeme) -> &'src str {
        lexeme_text(self.source, lexeme)
    }

    // expr := literal | call
    fn expr(&mut self) -> Result<Sexpr, ParseError> {
        match self.peek_token() {
            Some(Token::ParenOpen) => self.call(),
            Some(_) => Ok(Sexpr::Literal(self.literal()?)),
            None => Err(self.error("expected expression")),
        }
    }

    // call := '(' name (' ' expr)* ')'
    fn call(&mut self) -> Result<Sexpr, ParseError> {
        self.bump(); // '('
        let name = match self.peek().copied() {
            Some(lexeme) if lexeme.token == Token::Name => {
                self.bump();
                self.text(&lexeme).to_owned()
            }
            _ => return Err(self.error("missing operation")),
        };
        let mut children = Vec::new();
        loop {
            self.skip_space();
            match self.peek_token() {
                Some(Token::ParenClose) => {
                    self.bump();
                    return Ok(Sexpr::Call { name, children });
                }
                Some(_) => children.push(self.expr()?),
                None => return Err(self.error("unterminated call")),
            }
        }
    }

    // literal := [name ':'] value
    fn literal(&mut self) -> Result<LiteralValue, ParseError> {
        self.skip_space();
        let lexeme = match self.peek().copied() {
            Some(lexeme) => lexeme,
            None => return Err(self.error("expected literal")),
        };
        match lexeme.token {
            Token::Name => {
                if self.peek_second_token() != Some(Token::Colon) {
                    return Err(self.error("bare name is not a value"));
                }
                self.bump(); // name
                self.bump(); // ':'
                let name = self.text(&lexeme).to_owned();
                Ok(self.value()?.map(|v| v.named(&name)))
            }
            Token::Str if self.peek_second_token() == Some(Token::Colon) => {
                self.bump(); // quoted name
                self.bump(); // ':'
                let name = unescape(inner_text(self.text(&lexeme)));
                Ok(self.value()?.map(|v| v.named(&name)))
            }
            _ => self.value(),
        }
    }

    /// A numeric must not run straight into more dots or digits:
    /// `1.2.3` is malformed, never a partial parse.
    fn check_numeric_boundary(&self, end: usize) -> Result<(), ParseError> {
        if let Some(next) = self.peek() {
            if next.start == end {
                let text = self.text(next);
                let run_on = text.starts_with('.')
                    || text.chars().next().is_some_and(|c| c.is_ascii_digit());
                if run_on {
                    return Err(ParseError::new(next.start, "malformed numeric"));
                }
            }
        }
        Ok(())
    }

    // value := number | float | string | list | ':'
    fn value(&mut self) -> Result<LiteralValue, ParseError> {
        let lexeme = match self.peek() {
            Some(l) => *l,
            None => return Err(self.error("expected value")),
        };
        match lexeme.token {
            Token::Colon => {
                self.bump();
                Ok(None)
            }
            Token::Number => {
                self.bump();
                self.check_numeric_boundary(lexeme.end)?;
                let text = self.text(&lexeme);
                let n: i64 = text
                    .parse()
                    .map_err(|_| ParseError::new(lexeme.start, "could not convert to integer"))?;
                Ok(Some(Value::number(n)))
            }
            Token::Float => {
                self.bump();
                self.check_numeric_boundary(lexeme.end)?;
                let text = self.text(&lexeme);
                let f: f64 = text
                    .parse()
                    .map_err(|_| ParseError::new(lexeme.start, "could not convert to float"))?;
                Ok(Some(Value::float(f)))
            }
            Token::Str => {
                self.bump();
                Ok(Some(Value::bytes(
                    unescape(inner_text(self.text(&lexeme))).into_bytes(),
                )))
            }
            Token::BracketOpen => {
                self.bump();
                let mut items = Vec::new();
                loop {
                    self.skip_space();
                    match self.peek_token() {
                        Some(Token::BracketClose) => {
                            self.bump();
                            return Ok(Some(Value::list(items)));
                        }
                        Some(Token::Colon) => {
                            return Err(self.error("null is not a list element"));
                        }
                        Some(_) => match self.value()? {
                            Some(v) => items.push(v),
                            None => return Err(self.error("null is not a list element")),
                        },
                        None => return Err(self.error("unterminated list")),
                    }
                }
            }
            Token::Quote => Err(self.error("unterminated string")),
            _ => Err(self.error(format!(
                "unexpected character `{}`",
                first_char(self.text(&lexeme))
            ))),
        }
    }
}

/// Strip the surrounding quotes of a string lexeme.
fn inner_text(text: &str) -> &str {
    &text[1..text.len() - 1]
}

/// Resolve `\x` escapes; backslash is the only escape character.
fn unescape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut escape = false;
    for ch in text.chars() {
        if escape {
            out.push(ch);
            escape = false;
        } else if ch == '\\' {
            escape = true;
        } else {
            out.push(ch);
        }
    }
    out
}

fn first_char(text: &str) -> char {
    text.chars().next().unwrap_or(' ')
}
