//! Tree lowering: concrete syntax tree to AST.
//!
//! Walks the parser's `SyntaxNode` tree with an immutable `Cursor` and maps
//! each supported node kind to exactly one statement or expression variant.
//! Calls to built-ins (currently `print`) are rewritten into dedicated nodes.
//! Anything the compiler does not support (strings, `and`/`or`, a second
//! `elif`) is rejected here with a syntax error naming the offending source.

pub mod builtins;
pub mod cursor;
pub mod expr;
pub mod lowering;
pub mod stmt;
