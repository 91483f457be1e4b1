//! Agent module - the automation agent collaborator
//!
//! The agent itself lives outside this crate. This module runs it per task
//! and turns its log output into progress messages on the hub.

pub mod parse;
pub mod runner;

pub use parse::parse_log_line;
pub use runner::{AgentOutcome, AutomationAgent, ExternalAgent};
