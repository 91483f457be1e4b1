//! Session commands
//!
//! A few words typed at the action prompt are handled locally instead of
//! being sent to the agent.

use crate::correlator::SessionRecorder;

/// Result of parsing an operator line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandResult {
    /// Send this action to the agent
    Continue(String),
    /// Command was handled, show output
    Handled(String),
    /// End the session
    Exit,
    /// Nothing to do
    None,
}

/// Parse and handle local commands
pub fn handle_command(input: &str, recorder: &SessionRecorder) -> CommandResult {
    let input = input.trim();
    if input.is_empty() {
        return CommandResult::None;
    }

    // "!status" sends "status" to the agent
    if let Some(literal) = input.strip_prefix('!') {
        let literal = literal.trim();
        return if literal.is_empty() {
            CommandResult::None
        } else {
            CommandResult::Continue(literal.to_string())
        };
    }

    let parts: Vec<&str> = input.splitn(2, ' ').collect();
    let cmd = parts[0].to_lowercase();
    let args = parts.get(1).map(|s| s.trim()).unwrap_or("");

    match cmd.as_str() {
        "exit" | "quit" if args.is_empty() => CommandResult::Exit,

        "help" | "?" if args.is_empty() => CommandResult::Handled(help_text()),

        "status" if args.is_empty() => CommandResult::Handled(status_text(recorder)),

        "steps" => {
            let count = match args {
                "" => 5,
                n => match n.parse::<usize>() {
                    Ok(n) => n,
                    Err(_) => return CommandResult::Continue(input.to_string()),
                },
            };
            CommandResult::Handled(recent_steps(recorder, count))
        }

        _ => CommandResult::Continue(input.to_string()),
    }
}

fn status_text(recorder: &SessionRecorder) -> String {
    let state = recorder.snapshot();
    format!(
        "Session Status:\n\
         ─────────────────────────────\n\
         Steps logged:     {}\n\
         Current goal:     {}\n\
         Pending captures: {}\n\
         Journal:          {}",
        state.step - 1,
        if state.last_goal.is_empty() {
            "(none yet)"
        } else {
            state.last_goal.as_str()
        },
        recorder.scheduler().pending(),
        recorder.journal().path().display()
    )
}

fn recent_steps(recorder: &SessionRecorder, count: usize) -> String {
    let records = match recorder.journal().records() {
        Ok(records) => records,
        Err(e) => return format!("No steps recorded yet ({})", e),
    };

    if records.is_empty() {
        return "No steps recorded yet".to_string();
    }

    let start = records.len().saturating_sub(count);
    records[start..]
        .iter()
        .map(|r| {
            let action = if r.action.is_empty() { &r.next_goal } else { &r.action };
            format!("  {:>3}  {}\n       {}", r.step, action, r.screenshot)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Generate help text
fn help_text() -> String {
    r#"Session Commands:
─────────────────────────────────────────────
  help, ?          Show this help message
  exit, quit       End the session
  status           Show step counter and current goal
  steps [n]        Show the last n journal records (default 5)

Anything else is sent to the agent as the next action,
e.g. "List S3 buckets". Prefix a line with "!" to send it
as-is, e.g. "!status" asks the agent about status.
─────────────────────────────────────────────"#
        .to_string()
}
