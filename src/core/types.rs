//! Shared types used across Stepshot modules
//!
//! Contains the progress message flowing from the agent, its severity level,
//! and the correlation record written to the journal.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::core::error::StepshotError;

/// Severity of a progress message
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Trace,
    Debug,
    Info,
    Warning,
    Error,
    Critical,
}

impl FromStr for Level {
    type Err = StepshotError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "trace" => Ok(Level::Trace),
            "debug" => Ok(Level::Debug),
            "info" => Ok(Level::Info),
            "warn" | "warning" => Ok(Level::Warning),
            "error" => Ok(Level::Error),
            "critical" | "fatal" => Ok(Level::Critical),
            other => Err(StepshotError::Other(format!("Unknown level: {}", other))),
        }
    }
}

impl std::fmt::Display for Level {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Level::Trace => write!(f, "trace"),
            Level::Debug => write!(f, "debug"),
            Level::Info => write!(f, "info"),
            Level::Warning => write!(f, "warning"),
            Level::Error => write!(f, "error"),
            Level::Critical => write!(f, "critical"),
        }
    }
}

/// A free-text progress message emitted by the automation agent
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgressMessage {
    /// Dotted channel name the message was published on ("" is the root)
    pub channel: String,
    /// Severity
    pub level: Level,
    /// Message text
    pub text: String,
}

impl ProgressMessage {
    /// Create a message on the given channel
    pub fn new(channel: impl Into<String>, level: Level, text: impl Into<String>) -> Self {
        Self {
            channel: channel.into(),
            level,
            text: text.into(),
        }
    }

    /// Create an info message on the root channel
    pub fn info(text: impl Into<String>) -> Self {
        Self::new("", Level::Info, text)
    }
}

/// One journal entry tying a step to its action, goal and screenshot
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CorrelationRecord {
    /// Step index, starting at 1
    pub step: u64,
    /// Triggering message text, empty for pure goal announcements
    pub action: String,
    /// Goal in effect after this message
    pub next_goal: String,
    /// Path of the screenshot taken for this step
    pub screenshot: String,
}
