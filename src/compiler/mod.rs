//! Code generation module for the compiler.
//!
//! This module turns a checked program into stack-machine text. It handles:
//!
//! - Assigning memory slots to top-level variables
//! - Emitting structured instructions for expressions and statements
//! - Modeling the operand stack so every function and the entry point
//!   leave exactly the values their signatures declare
//! - Wrapping the generated code into a module with the host imports

pub mod compiler;
pub mod expr;
pub mod instr;
pub mod layout;
pub mod module;
pub mod stmt;
