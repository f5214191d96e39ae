//! Parser module for building a concrete syntax tree.
//!
//! This module contains the parser that transforms a stream of tokens
//! into a tree of `SyntaxNode`s. It uses a Pratt parser for expressions
//! with proper operator precedence and handles:
//!
//! - Statement parsing (declarations, assignments, functions, control flow)
//! - Expression parsing (unary and binary ops, calls, literals, grouping)
//! - Indented and single-line statement bodies
//!
//! The parser uses NUD (null denotation) and LED (left denotation) functions
//! for expression parsing with binding power for precedence handling. The
//! resulting tree keeps every token that matters for later traversal; turning
//! it into typed statements is the job of the `lowering` module.

pub mod expr;
pub mod lookups;
pub mod parser;
pub mod stmt;
pub mod tree;
