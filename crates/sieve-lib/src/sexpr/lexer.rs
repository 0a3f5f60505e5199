//! Lexer for the s-expression format.
//!
//! Produces span-based lexemes; text is sliced from the source only when
//! needed. Consecutive unrecognized characters are coalesced into single
//! `Garbage` lexemes so malformed input yields one error, not one per
//! character.

use logos::Logos;

/// Token kinds. A lone `Quote` only surfaces when the string regex failed
/// to match, i.e. on an unterminated string.
#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Token {
    #[token("(")]
    ParenOpen,

    #[token(")")]
    ParenClose,

    #[token("[")]
    BracketOpen,

    #[token("]")]
    BracketClose,

    #[token(":")]
    Colon,

    #[token("'")]
    Quote,

    /// Must be listed with the plain number so the longer match wins.
    #[regex(r"-?[0-9]+\.[0-9]+")]
    Float,

    #[regex(r"-?[0-9]+")]
    Number,

    /// Single-quoted string with `\` as the only escape character.
    #[regex(r"'(?:[^'\\]|\\.)*'")]
    Str,

    #[regex(r"[A-Za-z_][A-Za-z0-9_.\-]*")]
    Name,

    #[regex(r"[ \t\r\n]+")]
    Space,

    /// Coalesced run of characters no other rule matched.
    Garbage,
}

/// Kind plus absolute byte span in the original input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Lexeme {
    pub token: Token,
    pub start: usize,
    pub end: usize,
}

/// Tokenize `source[offset..]`, reporting spans relative to the whole
/// `source`.
pub fn lex(source: &str, offset: usize) -> Vec<Lexeme> {
    let rest = &source[offset..];
    let mut lexemes = Vec::new();
    let mut lexer = Token::lexer(rest);
    let mut garbage_start: Option<usize> = None;

    loop {
        match lexer.next() {
            Some(Ok(token)) => {
                if let Some(start) = garbage_start.take() {
                    lexemes.push(Lexeme {
                        token: Token::Garbage,
                        start: offset + start,
                        end: offset + lexer.span().start,
                    });
                }
                let span = lexer.span();
                lexemes.push(Lexeme {
                    token,
                    start: offset + span.start,
                    end: offset + span.end,
                });
            }
            Some(Err(())) => {
                if garbage_start.is_none() {
                    garbage_start = Some(lexer.span().start);
                }
            }
            None => {
                if let Some(start) = garbage_start.take() {
                    lexemes.push(Lexeme {
                        token: Token::Garbage,
                        start: offset + start,
                        end: offset + rest.len(),
                    });
                }
                break;
            }
        }
    }

    lexemes
}

/// Text of a lexeme. O(1) slice into the source.
pub fn lexeme_text<'src>(source: &'src str, lexeme: &Lexeme) -> &'src str {
    &source[lexeme.start..lexeme.end]
}
