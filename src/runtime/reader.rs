use std::rc::Rc;

use lazy_static::lazy_static;
use regex::Regex;

use crate::{
    errors::errors::{Error, ErrorImpl},
    Position,
};

/// One parsed s-expression of module text.
#[derive(Debug, Clone, PartialEq)]
pub enum SExpr {
    Atom { text: String, offset: u32 },
    List { items: Vec<SExpr>, offset: u32 },
}

impl SExpr {
    pub fn offset(&self) -> u32 {
        match self {
            SExpr::Atom { offset, .. } | SExpr::List { offset, .. } => *offset,
        }
    }

    pub fn atom(&self) -> Option<&str> {
        match self {
            SExpr::Atom { text, .. } => Some(text),
            SExpr::List { .. } => None,
        }
    }

    /// Contents of a `"quoted"` atom.
    pub fn string(&self) -> Option<&str> {
        self.atom()
            .filter(|text| text.len() >= 2 && text.starts_with('"') && text.ends_with('"'))
            .map(|text| &text[1..text.len() - 1])
    }

    /// Name of a `$name` atom, without the sigil.
    pub fn ident(&self) -> Option<&str> {
        self.atom().and_then(|text| text.strip_prefix('$'))
    }

    pub fn items(&self) -> Option<&[SExpr]> {
        match self {
            SExpr::List { items, .. } => Some(items),
            SExpr::Atom { .. } => None,
        }
    }

    /// The leading atom of a list, e.g. `func` in `(func $f ...)`.
    pub fn head(&self) -> Option<&str> {
        self.items().and_then(|items| items.first()).and_then(SExpr::atom)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Lexeme {
    Open,
    Close,
    Atom,
    Skip,
}

lazy_static! {
    // Tried in order; the first pattern matching at the cursor wins.
    static ref PATTERNS: Vec<(Regex, Lexeme)> = vec![
        (Regex::new("^[ \t\r\n]+").unwrap(), Lexeme::Skip),
        (Regex::new("^;;[^\n]*").unwrap(), Lexeme::Skip),
        (Regex::new("^\\(").unwrap(), Lexeme::Open),
        (Regex::new("^\\)").unwrap(), Lexeme::Close),
        (Regex::new("^\"[^\"\n]*\"").unwrap(), Lexeme::Atom),
        (Regex::new("^[^ \t\r\n()\";]+").unwrap(), Lexeme::Atom),
    ];
}

pub fn assembly_error(message: String, offset: u32) -> Error {
    Error::new(
        ErrorImpl::AssemblyError { message },
        Position(offset, Rc::new(String::from("<module>"))),
    )
}

/// Reads every top-level s-expression of `text`.
pub fn read(text: &str) -> Result<Vec<SExpr>, Error> {
    // Open lists as (offset, items so far)
    let mut open: Vec<(u32, Vec<SExpr>)> = vec![];
    let mut top = vec![];
    let mut pos = 0;

    'outer: while pos < text.len() {
        let rest = &text[pos..];

        for (regex, lexeme) in PATTERNS.iter() {
            let Some(found) = regex.find(rest) else {
                continue;
            };
            let offset = pos as u32;
            pos += found.end();

            match lexeme {
                Lexeme::Skip => {}
                Lexeme::Open => open.push((offset, vec![])),
                Lexeme::Close => {
                    let Some((start, items)) = open.pop() else {
                        return Err(assembly_error(String::from("unbalanced `)`"), offset));
                    };
                    let list = SExpr::List { items, offset: start };
                    match open.last_mut() {
                        Some((_, parent)) => parent.push(list),
                        None => top.push(list),
                    }
                }
                Lexeme::Atom => {
                    let atom = SExpr::Atom {
                        text: found.as_str().to_string(),
                        offset,
                    };
                    match open.last_mut() {
                        Some((_, parent)) => parent.push(atom),
                        None => top.push(atom),
                    }
                }
            }
            continue 'outer;
        }

        return Err(assembly_error(
            format!("unexpected character {:?}", rest.chars().next().unwrap_or(' ')),
            pos as u32,
        ));
    }

    if let Some((start, _)) = open.last() {
        return Err(assembly_error(String::from("unclosed `(`"), *start));
    }

    Ok(top)
}
