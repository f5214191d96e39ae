//! Type checking and semantic analysis module.
//!
//! This module checks a lowered program before code generation:
//!
//! - Collecting the declaration prefix of each block (`Init`s and top-level
//!   `FunctionDef`s) into a layered environment
//! - Rejecting duplicate names, late declarations and nested definitions
//! - Typing every expression and statement against the declared types
//! - Checking call arity and argument types, conditions and returns
//!
//! Function signatures are collected for the whole program before any
//! function body is checked, so functions may call each other freely.
//! Checking is fail-fast: the first violation is returned as an error.

pub mod environment;
pub mod type_checker;
