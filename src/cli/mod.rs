//! CLI module - operator-facing session driver
//!
//! Contains the interactive session loop and its local commands.

pub mod commands;
pub mod repl;

pub use repl::{Repl, SessionReport};
