use std::rc::Rc;

use lazy_static::lazy_static;
use regex::Regex;
use tracing::debug;

use crate::{
    errors::errors::{Error, ErrorImpl},
    Position, Span, MK_DEFAULT_HANDLER, MK_TOKEN,
};

use super::tokens::{Token, TokenKind, RESERVED_LOOKUP};

pub type RegexHandler = fn(&mut Lexer, &Regex);

pub struct RegexPattern {
    regex: Regex,
    handler: RegexHandler,
}

lazy_static! {
    // Tried in order; the first pattern matching at the cursor wins.
    static ref PATTERNS: Vec<RegexPattern> = vec![
        RegexPattern { regex: Regex::new("^[a-zA-Z_][a-zA-Z0-9_]*").unwrap(), handler: symbol_handler },
        RegexPattern { regex: Regex::new("^[0-9]+").unwrap(), handler: number_handler },
        RegexPattern { regex: Regex::new("^\r?\n").unwrap(), handler: newline_handler },
        RegexPattern { regex: Regex::new("^[ \t\r]+").unwrap(), handler: skip_handler },
        RegexPattern { regex: Regex::new("^#[^\n]*").unwrap(), handler: skip_handler },
        RegexPattern { regex: Regex::new("^(\"[^\"\n]*\"|'[^'\n]*')").unwrap(), handler: string_handler },
        RegexPattern { regex: Regex::new("^\\(").unwrap(), handler: open_paren_handler },
        RegexPattern { regex: Regex::new("^\\)").unwrap(), handler: close_paren_handler },
        RegexPattern { regex: Regex::new("^->").unwrap(), handler: MK_DEFAULT_HANDLER!(TokenKind::Arrow, "->") },
        RegexPattern { regex: Regex::new("^==").unwrap(), handler: MK_DEFAULT_HANDLER!(TokenKind::Equals, "==") },
        RegexPattern { regex: Regex::new("^!=").unwrap(), handler: MK_DEFAULT_HANDLER!(TokenKind::NotEquals, "!=") },
        RegexPattern { regex: Regex::new("^=").unwrap(), handler: MK_DEFAULT_HANDLER!(TokenKind::Assignment, "=") },
        RegexPattern { regex: Regex::new("^<=").unwrap(), handler: MK_DEFAULT_HANDLER!(TokenKind::LessEquals, "<=") },
        RegexPattern { regex: Regex::new("^<").unwrap(), handler: MK_DEFAULT_HANDLER!(TokenKind::Less, "<") },
        RegexPattern { regex: Regex::new("^>=").unwrap(), handler: MK_DEFAULT_HANDLER!(TokenKind::GreaterEquals, ">=") },
        RegexPattern { regex: Regex::new("^>").unwrap(), handler: MK_DEFAULT_HANDLER!(TokenKind::Greater, ">") },
        RegexPattern { regex: Regex::new("^:").unwrap(), handler: MK_DEFAULT_HANDLER!(TokenKind::Colon, ":") },
        RegexPattern { regex: Regex::new("^,").unwrap(), handler: MK_DEFAULT_HANDLER!(TokenKind::Comma, ",") },
        RegexPattern { regex: Regex::new("^\\+").unwrap(), handler: MK_DEFAULT_HANDLER!(TokenKind::Plus, "+") },
        RegexPattern { regex: Regex::new("^-").unwrap(), handler: MK_DEFAULT_HANDLER!(TokenKind::Dash, "-") },
        RegexPattern { regex: Regex::new("^//").unwrap(), handler: MK_DEFAULT_HANDLER!(TokenKind::SlashSlash, "//") },
        RegexPattern { regex: Regex::new("^\\*").unwrap(), handler: MK_DEFAULT_HANDLER!(TokenKind::Star, "*") },
        RegexPattern { regex: Regex::new("^%").unwrap(), handler: MK_DEFAULT_HANDLER!(TokenKind::Percent, "%") },
    ];
}

const TAB_WIDTH: usize = 8;

pub struct Lexer {
    tokens: Vec<Token>,
    source: String,
    pos: usize,
    file: Rc<String>,
    /// Columns of the currently open indentation levels, outermost first.
    indent_stack: Vec<usize>,
    /// Newlines inside parentheses do not end a logical line.
    paren_depth: u32,
    at_line_start: bool,
}

impl Lexer {
    pub fn new(source: String, file: Option<String>) -> Lexer {
        let file_name = if let Some(file) = file {
            Rc::new(file)
        } else {
            Rc::new(String::from("shell"))
        };

        Lexer {
            tokens: vec![],
            source,
            pos: 0,
            file: file_name,
            indent_stack: vec![],
            paren_depth: 0,
            at_line_start: true,
        }
    }

    pub fn advance_n(&mut self, n: usize) {
        self.pos += n;
    }

    pub fn push(&mut self, token: Token) {
        self.tokens.push(token);
    }

    pub fn position(&self) -> Position {
        Position(self.pos as u32, Rc::clone(&self.file))
    }

    /// Span of the next `len` bytes starting at the cursor.
    pub fn span_of(&self, len: usize) -> Span {
        Span {
            start: self.position(),
            end: Position((self.pos + len) as u32, Rc::clone(&self.file)),
        }
    }

    pub fn at(&self) -> char {
        self.remainder().chars().next().unwrap_or('\0')
    }

    pub fn remainder(&self) -> &str {
        &self.source[self.pos..]
    }

    pub fn at_eof(&self) -> bool {
        self.pos >= self.source.len()
    }

    fn last_kind(&self) -> Option<TokenKind> {
        self.tokens.last().map(|token| token.kind)
    }

    fn push_layout(&mut self, kind: TokenKind, value: &str) {
        let span = self.span_of(0);
        self.push(MK_TOKEN!(kind, String::from(value), span));
    }

    /// Measures the indentation of the line starting at the cursor and emits
    /// `Indent`/`Dedent` tokens. Blank and comment-only lines are consumed whole.
    fn handle_line_start(&mut self) -> Result<(), Error> {
        let mut column = 0;
        let mut width = 0;
        for c in self.remainder().chars() {
            match c {
                ' ' => column += 1,
                '\t' => column = (column / TAB_WIDTH + 1) * TAB_WIDTH,
                _ => break,
            }
            width += 1;
        }

        let rest = &self.remainder()[width..];
        if rest.is_empty() || rest.starts_with('\n') || rest.starts_with("\r\n") || rest.starts_with('#') {
            let line_end = rest.find('\n').map(|i| i + 1).unwrap_or(rest.len());
            self.advance_n(width + line_end);
            return Ok(());
        }

        self.advance_n(width);
        self.at_line_start = false;

        let Some(&current) = self.indent_stack.last() else {
            // The first logical line fixes the zero column.
            self.indent_stack.push(column);
            return Ok(());
        };

        if column > current {
            self.indent_stack.push(column);
            self.push_layout(TokenKind::Indent, "<indent>");
        } else if column < current {
            while self.indent_stack.len() > 1 && self.indent_stack.last() > Some(&column) {
                self.indent_stack.pop();
                self.push_layout(TokenKind::Dedent, "<dedent>");
            }
            if self.indent_stack.last() != Some(&column) {
                return Err(Error::new(ErrorImpl::InconsistentIndentation, self.position()));
            }
        }

        Ok(())
    }

    fn finish(&mut self) {
        if !matches!(self.last_kind(), None | Some(TokenKind::Newline)) {
            self.push_layout(TokenKind::Newline, "\n");
        }
        while self.indent_stack.len() > 1 {
            self.indent_stack.pop();
            self.push_layout(TokenKind::Dedent, "<dedent>");
        }
        self.push_layout(TokenKind::EOF, "EOF");
    }
}

fn number_handler(lexer: &mut Lexer, regex: &Regex) {
    let matched = regex.find(lexer.remainder()).unwrap().as_str().to_string();

    let span = lexer.span_of(matched.len());
    lexer.advance_n(matched.len());
    lexer.push(MK_TOKEN!(TokenKind::Number, matched, span));
}

fn skip_handler(lexer: &mut Lexer, regex: &Regex) {
    let matched = regex.find(lexer.remainder()).unwrap().end();
    lexer.advance_n(matched);
}

fn newline_handler(lexer: &mut Lexer, regex: &Regex) {
    let matched = regex.find(lexer.remainder()).unwrap().end();

    if lexer.paren_depth == 0 {
        if !matches!(lexer.last_kind(), None | Some(TokenKind::Newline)) {
            let span = lexer.span_of(matched);
            lexer.push(MK_TOKEN!(TokenKind::Newline, String::from("\n"), span));
        }
        lexer.at_line_start = true;
    }

    lexer.advance_n(matched);
}

fn string_handler(lexer: &mut Lexer, regex: &Regex) {
    let matched = regex.find(lexer.remainder()).unwrap().as_str().to_string();
    let literal = matched[1..matched.len() - 1].to_string();

    let span = lexer.span_of(matched.len());
    lexer.advance_n(matched.len());
    lexer.push(MK_TOKEN!(TokenKind::String, literal, span));
}

fn open_paren_handler(lexer: &mut Lexer, _regex: &Regex) {
    lexer.paren_depth += 1;
    let span = lexer.span_of(1);
    lexer.push(MK_TOKEN!(TokenKind::OpenParen, String::from("("), span));
    lexer.advance_n(1);
}

fn close_paren_handler(lexer: &mut Lexer, _regex: &Regex) {
    lexer.paren_depth = lexer.paren_depth.saturating_sub(1);
    let span = lexer.span_of(1);
    lexer.push(MK_TOKEN!(TokenKind::CloseParen, String::from(")"), span));
    lexer.advance_n(1);
}

fn symbol_handler(lexer: &mut Lexer, regex: &Regex) {
    let value = regex.find(lexer.remainder()).unwrap().as_str().to_string();
    let kind = RESERVED_LOOKUP
        .get(value.as_str())
        .copied()
        .unwrap_or(TokenKind::Identifier);

    let span = lexer.span_of(value.len());
    lexer.advance_n(value.len());
    lexer.push(MK_TOKEN!(kind, value, span));
}

/// Splits `source` into tokens, including `Newline`/`Indent`/`Dedent` layout tokens.
///
/// The token stream always ends with `EOF`, preceded by a `Newline` when the
/// source holds at least one logical line and by one `Dedent` per still open block.
pub fn tokenize(source: String, file: Option<String>) -> Result<Vec<Token>, Error> {
    let mut lex = Lexer::new(source, file);

    while !lex.at_eof() {
        if lex.at_line_start && lex.paren_depth == 0 {
            lex.handle_line_start()?;
            continue;
        }

        let pattern = PATTERNS
            .iter()
            .find(|pattern| pattern.regex.is_match(lex.remainder()));

        match pattern {
            Some(pattern) => (pattern.handler)(&mut lex, &pattern.regex),
            None => {
                return Err(Error::new(
                    ErrorImpl::UnrecognisedToken {
                        token: lex.at().to_string(),
                    },
                    lex.position(),
                ))
            }
        }
    }

    lex.finish();
    debug!(tokens = lex.tokens.len(), "tokenized");
    Ok(lex.tokens)
}
