//! Reference host runtime.
//!
//! Generated modules are normally handed to an external assembler and
//! virtual machine. This module provides an in-process stand-in so programs
//! can be run and tested without one:
//!
//! - `reader` and `assembler` read module text back into `Instr` trees
//! - `vm` interprets them against a persistent linear memory
//! - `host` defines the imported print functions and two implementations

pub mod assembler;
pub mod host;
pub mod memory;
pub mod reader;
pub mod vm;
