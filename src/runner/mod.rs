//! Session surface: source text in, converted result out.
//!
//! `run` drives one unit through every stage and hands back the environment
//! the next unit should start from. `Session` keeps that environment, a
//! virtual machine and the host imports together for REPL-style use.

pub mod runner;

#[cfg(test)]
mod tests;
