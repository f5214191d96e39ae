#![allow(clippy::module_inception)]

use std::rc::Rc;

use crate::errors::errors::{Error, ErrorTip};

pub mod ast;
pub mod compiler;
pub mod errors;
pub mod lexer;
pub mod lowering;
pub mod macros;
pub mod parser;
pub mod runner;
pub mod runtime;
pub mod type_checker;

extern crate regex;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Debug, Clone, PartialEq)]
pub struct Position(pub u32, pub Rc<String>);

impl Position {
    pub fn null() -> Self {
        Position(0, Rc::new(String::from("<null>")))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Span {
    pub start: Position,
    pub end: Position,
}

impl Span {
    pub fn null() -> Self {
        Span {
            start: Position::null(),
            end: Position::null(),
        }
    }

    /// Byte range of the span inside its source text.
    pub fn range(&self) -> std::ops::Range<usize> {
        self.start.0 as usize..self.end.0 as usize
    }

    /// Joins two spans of the same file into one covering both.
    pub fn to(&self, other: &Span) -> Span {
        Span {
            start: self.start.clone(),
            end: other.end.clone(),
        }
    }
}

/// Returns the 1-based line number, the line text and the column of `position` in `content`.
///
/// Positions at or past the end of the content resolve to the last line.
pub fn get_line_at_position(content: &str, position: u32) -> (usize, String, usize) {
    let pos = (position as usize).min(content.len().saturating_sub(1));

    let mut start = 0;
    let mut line_number = 1;

    for line in content.split_inclusive('\n') {
        let end = start + line.len();

        if (start..end).contains(&pos) {
            let line_pos = pos - start;
            return (line_number, line.to_string(), line_pos);
        }

        start = end;
        line_number += 1;
    }

    (line_number, String::new(), 0)
}

#[cfg(test)]
mod tests {
    const CONTENT: &str = "Hello, world!\nx:int=5\n\n  Testing { }\n";

    #[test]
    fn test_get_line_at_position() {
        let (line_number, line, line_pos) = super::get_line_at_position(CONTENT, 10);
        assert_eq!(line_number, 1);
        assert_eq!(line, "Hello, world!\n");
        assert_eq!(line_pos, 10);

        let (line_number, line, line_pos) = super::get_line_at_position(CONTENT, 33);
        assert_eq!(line_number, 4);
        assert_eq!(line, "  Testing { }\n");
        assert_eq!(line_pos, 10);
    }

    #[test]
    fn test_position_past_end_clamps_to_last_line() {
        let (line_number, _, _) = super::get_line_at_position(CONTENT, 500);
        assert_eq!(line_number, 4);
    }

    #[test]
    fn test_format_error_points_at_column() {
        use crate::errors::errors::{Error, ErrorImpl};
        use crate::Position;
        use std::rc::Rc;

        let error = Error::new(
            ErrorImpl::NotAVariable {
                name: String::from("y"),
            },
            Position(18, Rc::new(String::from("test.py"))),
        );
        let rendered = super::format_error(&error, "x:int=5\nx = 1\nx = y\n", "test.py");

        assert!(rendered.starts_with("Error: NotAVariable"));
        assert!(rendered.contains("-> test.py"));
        assert!(rendered.contains("3 | x = y"));
        assert!(rendered.trim_end().ends_with("| ----^"));
    }
}

/// Renders an error the way the CLI prints it:
///
/// ```text
/// Error: NotAVariable (Not a variable: `y`)
/// -> test.py
///   |
/// 3 | x = y
///   | ----^
/// ```
pub fn format_error(error: &Error, content: &str, file: &str) -> String {
    let position = error.get_position();
    let (line, line_text, line_pos) = get_line_at_position(content, position.0);

    let line_string = line.to_string();
    let padding = line_string.len() + 2;

    let mut out = String::new();
    if let ErrorTip::None = error.get_tip() {
        out.push_str(&format!("Error: {}\n", error.get_error_name()));
    } else {
        out.push_str(&format!(
            "Error: {} ({})\n",
            error.get_error_name(),
            error.get_tip()
        ));
    }
    out.push_str(&format!("-> {}\n", file));
    out.push_str(&format!("{:>padding$}\n", "|"));

    let (line_text_removed, removed_whitespace) = remove_starting_whitespace(&line_text);
    out.push_str(&format!("{} | {}\n", line_string, line_text_removed.trim()));

    let arrows = line_pos.saturating_sub(removed_whitespace) + 1;

    out.push_str(&format!("{:>padding$} {:->arrows$}\n", "|", "^"));
    out
}

fn remove_starting_whitespace(string: &str) -> (String, usize) {
    let mut start = 0;
    for c in string.chars() {
        if c == ' ' {
            start += 1;
        } else {
            break;
        }
    }

    (String::from(&string[start..]), start)
}
