//! Log-line parsing for agent output
//!
//! Agents usually print through a logging framework. Accepted shapes:
//!
//! - `INFO     [agent] Next goal: open S3` (bracketed channel)
//! - `WARNING:controller:Clicked button` (colon separated)
//! - `INFO Navigating to https://...` (level only)
//! - anything else, taken verbatim at info level

use crate::core::{Level, ProgressMessage};

/// Turn one output line into a progress message
pub fn parse_log_line(line: &str, default_channel: &str) -> ProgressMessage {
    let line = line.trim();

    if let Some((head, after)) = line.split_once(':') {
        if let Some(level) = level_token(head) {
            return match after.split_once(':') {
                Some((channel, text)) if is_channel_token(channel) => {
                    ProgressMessage::new(normalize_channel(channel), level, text.trim())
                }
                _ => ProgressMessage::new(default_channel, level, after.trim()),
            };
        }
    }

    let mut level = Level::Info;
    let mut rest = line;

    if let Some((head, tail)) = rest.split_once(char::is_whitespace) {
        if let Some(parsed) = level_token(head) {
            level = parsed;
            rest = tail.trim_start();
        }
    }

    let mut channel = default_channel.to_string();
    if let Some(inner) = rest.strip_prefix('[') {
        if let Some(end) = inner.find(']') {
            let name = &inner[..end];
            if is_channel_token(name) {
                channel = normalize_channel(name);
                rest = inner[end + 1..].trim_start();
            }
        }
    }

    ProgressMessage::new(channel, level, rest)
}

/// Upper-case level names only, so prose like "Error opening" stays text
fn level_token(token: &str) -> Option<Level> {
    if token.is_empty() || !token.chars().all(|c| c.is_ascii_uppercase()) {
        return None;
    }
    token.parse().ok()
}

fn is_channel_token(token: &str) -> bool {
    !token.is_empty()
        && token
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-'))
}

/// Logging frameworks name the root logger "root"; here it is the empty channel
fn normalize_channel(name: &str) -> String {
    if name == "root" {
        String::new()
    } else {
        name.to_string()
    }
}
