use std::rc::Rc;

use tracing::debug;

use crate::{
    ast::ast::Program,
    errors::errors::Error,
    lexer::lexer::tokenize,
    parser::{parser::parse, tree::{NodeKind, SyntaxNode}},
};

use super::{
    cursor::{unsupported, Cursor},
    stmt::lower_stmt,
};

/// Lowers a `Script` tree into a program.
pub fn lower(tree: &SyntaxNode, source: &str) -> Result<Program, Error> {
    let root = Cursor::new(tree);
    if tree.kind != NodeKind::Script {
        return Err(unsupported("program", tree, source));
    }

    let mut body = vec![];
    let mut stmt = root.first_child();
    while !stmt.at_end() {
        body.push(lower_stmt(stmt, source)?);
        stmt = stmt.next_sibling();
    }

    debug!(statements = body.len(), "lowered program");
    Ok(Program { body })
}

/// Tokenizes, parses and lowers `source` in one go.
pub fn parse_program(source: &str, file: Option<String>) -> Result<Program, Error> {
    let file_name = Rc::new(file.clone().unwrap_or_else(|| String::from("shell")));

    let tokens = tokenize(source.to_string(), file)?;
    let (_, tree) = parse(tokens, file_name);

    lower(&tree?, source)
}
