//! Unit tests for the lexer module.
//!
//! This module contains tests for tokenization including:
//! - Keywords and identifiers
//! - Integer literals
//! - Operators and punctuation
//! - Indentation layout
//! - Comments
//! - Error cases

use super::{lexer::tokenize, tokens::TokenKind};

fn kinds(source: &str) -> Vec<TokenKind> {
    tokenize(source.to_string(), Some("test.py".to_string()))
        .unwrap()
        .iter()
        .map(|token| token.kind)
        .collect()
}

#[test]
fn test_tokenize_keywords() {
    let source = "def if elif else while return pass not is and or True False None".to_string();
    let tokens = tokenize(source, Some("test.py".to_string())).unwrap();

    assert_eq!(tokens[0].kind, TokenKind::Def);
    assert_eq!(tokens[1].kind, TokenKind::If);
    assert_eq!(tokens[2].kind, TokenKind::Elif);
    assert_eq!(tokens[3].kind, TokenKind::Else);
    assert_eq!(tokens[4].kind, TokenKind::While);
    assert_eq!(tokens[5].kind, TokenKind::Return);
    assert_eq!(tokens[6].kind, TokenKind::Pass);
    assert_eq!(tokens[7].kind, TokenKind::Not);
    assert_eq!(tokens[8].kind, TokenKind::Is);
    assert_eq!(tokens[9].kind, TokenKind::And);
    assert_eq!(tokens[10].kind, TokenKind::Or);
    assert_eq!(tokens[11].kind, TokenKind::True);
    assert_eq!(tokens[12].kind, TokenKind::False);
    assert_eq!(tokens[13].kind, TokenKind::None);
    assert_eq!(tokens[14].kind, TokenKind::Newline);
    assert_eq!(tokens[15].kind, TokenKind::EOF);
}

#[test]
fn test_tokenize_identifiers() {
    let source = "foo bar baz_123 _underscore CamelCase".to_string();
    let tokens = tokenize(source, Some("test.py".to_string())).unwrap();

    assert_eq!(tokens[0].kind, TokenKind::Identifier);
    assert_eq!(tokens[0].value, "foo");
    assert_eq!(tokens[2].value, "baz_123");
    assert_eq!(tokens[3].value, "_underscore");
    assert_eq!(tokens[4].kind, TokenKind::Identifier);
    assert_eq!(tokens[4].value, "CamelCase");
}

#[test]
fn test_tokenize_numbers_and_spans() {
    let tokens = tokenize("42 0 100".to_string(), None).unwrap();

    assert_eq!(tokens[0].kind, TokenKind::Number);
    assert_eq!(tokens[0].value, "42");
    assert_eq!(tokens[0].span.start.0, 0);
    assert_eq!(tokens[0].span.end.0, 2);
    assert_eq!(tokens[2].value, "100");
    assert_eq!(tokens[2].span.start.0, 5);
    assert_eq!(*tokens[2].span.start.1, "shell");
}

#[test]
fn test_tokenize_operators() {
    assert_eq!(
        kinds("+ - * // % < <= > >= == != = -> : , ( )"),
        vec![
            TokenKind::Plus,
            TokenKind::Dash,
            TokenKind::Star,
            TokenKind::SlashSlash,
            TokenKind::Percent,
            TokenKind::Less,
            TokenKind::LessEquals,
            TokenKind::Greater,
            TokenKind::GreaterEquals,
            TokenKind::Equals,
            TokenKind::NotEquals,
            TokenKind::Assignment,
            TokenKind::Arrow,
            TokenKind::Colon,
            TokenKind::Comma,
            TokenKind::OpenParen,
            TokenKind::CloseParen,
            TokenKind::Newline,
            TokenKind::EOF,
        ]
    );
}

#[test]
fn test_tokenize_indentation() {
    assert_eq!(
        kinds("while x:\n  x = 1\ny"),
        vec![
            TokenKind::While,
            TokenKind::Identifier,
            TokenKind::Colon,
            TokenKind::Newline,
            TokenKind::Indent,
            TokenKind::Identifier,
            TokenKind::Assignment,
            TokenKind::Number,
            TokenKind::Newline,
            TokenKind::Dedent,
            TokenKind::Identifier,
            TokenKind::Newline,
            TokenKind::EOF,
        ]
    );
}

#[test]
fn test_open_blocks_are_closed_at_eof() {
    let tokens = kinds("if a:\n if b:\n  pass\n");
    let dedents = tokens.iter().filter(|kind| **kind == TokenKind::Dedent).count();

    assert_eq!(dedents, 2);
    assert_eq!(tokens.last(), Some(&TokenKind::EOF));
}

#[test]
fn test_blank_and_comment_lines_are_skipped() {
    assert_eq!(
        kinds("x\n\n   # note\n\ny # trailing\n"),
        vec![
            TokenKind::Identifier,
            TokenKind::Newline,
            TokenKind::Identifier,
            TokenKind::Newline,
            TokenKind::EOF,
        ]
    );
}

#[test]
fn test_newlines_inside_parentheses_are_ignored() {
    assert_eq!(
        kinds("f(1,\n    2)"),
        vec![
            TokenKind::Identifier,
            TokenKind::OpenParen,
            TokenKind::Number,
            TokenKind::Comma,
            TokenKind::Number,
            TokenKind::CloseParen,
            TokenKind::Newline,
            TokenKind::EOF,
        ]
    );
}

#[test]
fn test_indented_snippet_uses_first_line_as_zero_column() {
    assert_eq!(
        kinds("    x:int=5\n    x"),
        kinds("x:int=5\nx")
    );
}

#[test]
fn test_tokenize_string_literal() {
    let tokens = tokenize("'hi' \"there\"".to_string(), None).unwrap();

    assert_eq!(tokens[0].kind, TokenKind::String);
    assert_eq!(tokens[0].value, "hi");
    assert_eq!(tokens[1].value, "there");
}

#[test]
fn test_tokenize_error_unrecognised() {
    let result = tokenize("x = @".to_string(), None);

    let error = result.unwrap_err();
    assert_eq!(error.get_error_name(), "UnrecognisedToken");
    assert_eq!(error.get_position().0, 4);
}

#[test]
fn test_tokenize_error_inconsistent_dedent() {
    let result = tokenize("if x:\n    pass\n  pass\n".to_string(), None);

    assert_eq!(result.unwrap_err().get_error_name(), "InconsistentIndentation");
}

#[test]
fn test_tokenize_empty_source() {
    assert_eq!(kinds(""), vec![TokenKind::EOF]);
}
