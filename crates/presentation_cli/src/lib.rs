//! LLM worker command-line interface
//!
//! Argument parsing and output formatting live here so they can be tested;
//! `main.rs` only dispatches.

pub mod cli;
pub mod output;

pub use cli::{Cli, Commands};
