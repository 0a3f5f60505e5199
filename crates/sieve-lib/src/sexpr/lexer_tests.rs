use crate::sexpr::lexer::{Token, lex, lexeme_text};

/// Format lexemes without spaces (default for most tests)
fn snapshot(input: &str) -> String {
    format_lexemes(input, false)
}

fn format_lexemes(input: &str, include_space: bool) -> String {
    let mut out = String::new();
    for lexeme in lex(input, 0) {
        if include_space || lexeme.token != Token::Space {
            out.push_str(&format!(
                "{:?} {:?}\n",
                lexeme.token,
                lexeme_text(input, &lexeme)
            ));
        }
    }
    out
}

#[test]
fn punctuation() {
    insta::assert_snapshot!(snapshot("( ) [ ] :"), @r#"
    ParenOpen "("
    ParenClose ")"
    BracketOpen "["
    BracketClose "]"
    Colon ":"
    "#);
}

#[test]
fn numbers() {
    insta::assert_snapshot!(snapshot("5 -12 0"), @r#"
    Number "5"
    Number "-12"
    Number "0"
    "#);
}

#[test]
fn floats() {
    insta::assert_snapshot!(snapshot("1.5 -0.25"), @r#"
    Float "1.5"
    Float "-0.25"
    "#);
}

#[test]
fn strings() {
    insta::assert_snapshot!(snapshot(r"'abc' '' 'it\'s'"), @r#"
    Str "'abc'"
    Str "''"
    Str "'it\\'s'"
    "#);
}

#[test]
fn unterminated_string_surfaces_quote() {
    insta::assert_snapshot!(snapshot("'abc"), @r#"
    Quote "'"
    Name "abc"
    "#);
}

#[test]
fn names() {
    insta::assert_snapshot!(snapshot("and orSC named_rx x.y-z _tmp"), @r#"
    Name "and"
    Name "orSC"
    Name "named_rx"
    Name "x.y-z"
    Name "_tmp"
    "#);
}

#[test]
fn named_literal() {
    insta::assert_snapshot!(snapshot("x:5"), @r#"
    Name "x"
    Colon ":"
    Number "5"
    "#);
}

#[test]
fn garbage_is_coalesced() {
    insta::assert_snapshot!(snapshot("@#$ 5"), @r#"
    Garbage "@#$"
    Number "5"
    "#);
}

#[test]
fn offset_shifts_spans() {
    let lexemes = lex("xx(and)", 2);
    assert_eq!(lexemes[0].token, Token::ParenOpen);
    assert_eq!(lexemes[0].start, 2);
    assert_eq!(lexemes[1].token, Token::Name);
    assert_eq!(lexemes[1].start, 3);
    assert_eq!(lexemes[1].end, 6);
}

#[test]
fn spaces_kept_when_asked() {
    insta::assert_snapshot!(format_lexemes("( a", true), @r#"
    ParenOpen "("
    Space " "
    Name "a"
    "#);
}
