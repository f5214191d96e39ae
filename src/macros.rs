//! Token construction macros shared by the lexer tables.

/// Builds a `Token` from its kind, text and span.
///
/// ```ignore
/// let token = MK_TOKEN!(TokenKind::Number, "42".to_string(), span);
/// ```
#[macro_export]
macro_rules! MK_TOKEN {
    ($kind:expr, $value:expr, $span:expr) => {
        Token {
            kind: $kind,
            value: $value,
            span: $span,
        }
    };
}

/// Handler for a fixed-text token: pushes `$kind` spanning `$value` and
/// moves past it. Used for operators and punctuation, where the matched text
/// never varies.
#[macro_export]
macro_rules! MK_DEFAULT_HANDLER {
    ($kind:expr, $value:literal) => {
        |lexer: &mut Lexer, _regex: &Regex| {
            let width = $value.len();
            let span = lexer.span_of(width);
            lexer.push(MK_TOKEN!($kind, String::from($value), span));
            lexer.advance_n(width);
        }
    };
}
