//! Operator-visible output
//!
//! Step confirmations and capture/append failures must reach the operator
//! regardless of the tracing filter, so they go through a `Console`.

use std::io::Write;
use std::sync::Mutex;

/// Sink for lines the operator should see
pub trait Console: Send + Sync {
    /// A normal progress line
    fn notice(&self, line: &str);

    /// A one-line diagnostic about something that went wrong
    fn problem(&self, line: &str);

    /// Text shown right before reading operator input
    fn prompt(&self, text: &str) {
        self.notice(text);
    }
}

/// Console printing to stdout/stderr
#[derive(Debug, Default, Clone, Copy)]
pub struct StdConsole;

impl Console for StdConsole {
    fn notice(&self, line: &str) {
        println!("{}", line);
    }

    fn problem(&self, line: &str) {
        eprintln!("{}", line);
    }

    fn prompt(&self, text: &str) {
        print!("{}", text);
        let _ = std::io::stdout().flush();
    }
}

/// Console that keeps every line in memory
#[derive(Debug, Default)]
pub struct BufferedConsole {
    notices: Mutex<Vec<String>>,
    problems: Mutex<Vec<String>>,
}

impl BufferedConsole {
    pub fn new() -> Self {
        Self::default()
    }

    /// Lines passed to `notice` so far
    pub fn notices(&self) -> Vec<String> {
        self.notices.lock().map(|n| n.clone()).unwrap_or_default()
    }

    /// Lines passed to `problem` so far
    pub fn problems(&self) -> Vec<String> {
        self.problems.lock().map(|p| p.clone()).unwrap_or_default()
    }
}

impl Console for BufferedConsole {
    fn notice(&self, line: &str) {
        if let Ok(mut notices) = self.notices.lock() {
            notices.push(line.to_string());
        }
    }

    fn problem(&self, line: &str) {
        if let Ok(mut problems) = self.problems.lock() {
            problems.push(line.to_string());
        }
    }
}
