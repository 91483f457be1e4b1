//! External agent runner
//!
//! Runs the configured automation agent as a child process per task and
//! republishes every line it prints on the progress hub.

use async_trait::async_trait;
use std::process::{ExitStatus, Stdio};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tokio::process::{Child, Command};

use crate::agent::parse::parse_log_line;
use crate::core::config::AgentConfig;
use crate::core::{Result, StepshotError};
use crate::events::ProgressHub;

/// Summary of one finished task
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AgentOutcome {
    /// Output lines published to the hub
    pub messages: usize,
    pub elapsed: Duration,
}

/// Anything that can carry out a natural-language task in the console
#[async_trait]
pub trait AutomationAgent: Send {
    /// Run one task to completion, publishing progress as it goes
    async fn run(&mut self, task: &str) -> Result<AgentOutcome>;

    /// Agent name for diagnostics
    fn name(&self) -> &str;
}

/// Agent living in another process
pub struct ExternalAgent {
    config: AgentConfig,
    hub: Arc<ProgressHub>,
}

impl ExternalAgent {
    pub fn new(config: AgentConfig, hub: Arc<ProgressHub>) -> Self {
        Self { config, hub }
    }

    /// Arguments for one task with `{task}` substituted
    pub fn task_args(&self, task: &str) -> Vec<String> {
        self.config
            .args
            .iter()
            .map(|arg| arg.replace("{task}", task))
            .collect()
    }

    fn spawn(&self, task: &str) -> Result<Child> {
        Command::new(&self.config.command)
            .args(self.task_args(task))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    StepshotError::CommandNotFound(self.config.command.clone())
                } else {
                    StepshotError::agent(format!("Failed to start {}: {}", self.config.command, e))
                }
            })
    }

    /// Forward stdout and stderr lines as they arrive, then reap the child
    async fn pump(&self, child: &mut Child) -> Result<(usize, ExitStatus)> {
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| StepshotError::agent("agent stdout not captured"))?;
        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| StepshotError::agent("agent stderr not captured"))?;

        let mut stdout = BufReader::new(stdout);
        let mut stderr = BufReader::new(stderr);
        let (mut out_buf, mut err_buf) = (Vec::new(), Vec::new());
        let (mut stdout_open, mut stderr_open) = (true, true);
        let mut published = 0;

        while stdout_open || stderr_open {
            tokio::select! {
                line = read_raw_line(&mut stdout, &mut out_buf), if stdout_open => match line? {
                    Some(line) => published += self.publish_line(&line),
                    None => stdout_open = false,
                },
                line = read_raw_line(&mut stderr, &mut err_buf), if stderr_open => match line? {
                    Some(line) => published += self.publish_line(&line),
                    None => stderr_open = false,
                },
            }
        }

        let status = child.wait().await?;
        Ok((published, status))
    }

    fn publish_line(&self, line: &str) -> usize {
        if line.trim().is_empty() {
            return 0;
        }
        self.hub
            .publish(parse_log_line(line, &self.config.default_channel));
        1
    }
}

/// Next output line, decoded lossily so stray bytes never end the task
///
/// `buf` keeps bytes from a read cancelled by `select!`; it is only cleared
/// once a whole line has been taken out.
async fn read_raw_line<R>(reader: &mut R, buf: &mut Vec<u8>) -> std::io::Result<Option<String>>
where
    R: AsyncBufRead + Unpin,
{
    reader.read_until(b'\n', buf).await?;
    if buf.is_empty() {
        return Ok(None);
    }
    let line = String::from_utf8_lossy(buf)
        .trim_end_matches(['\n', '\r'])
        .to_string();
    buf.clear();
    Ok(Some(line))
}

#[async_trait]
impl AutomationAgent for ExternalAgent {
    async fn run(&mut self, task: &str) -> Result<AgentOutcome> {
        let started = Instant::now();
        let limit = Duration::from_secs(self.config.timeout_secs);
        let mut child = self.spawn(task)?;

        tracing::info!(command = %self.config.command, "agent task started");

        let pumped = tokio::time::timeout(limit, self.pump(&mut child)).await;
        let (messages, status) = match pumped {
            Ok(result) => result?,
            Err(_) => {
                if let Err(e) = child.kill().await {
                    tracing::warn!("failed to kill timed-out agent: {}", e);
                }
                return Err(StepshotError::Timeout(format!(
                    "agent task exceeded {}s",
                    self.config.timeout_secs
                )));
            }
        };

        if !status.success() {
            return Err(StepshotError::agent(format!(
                "{} exited with {}",
                self.config.command, status
            )));
        }

        let outcome = AgentOutcome {
            messages,
            elapsed: started.elapsed(),
        };
        tracing::info!(messages, elapsed = ?outcome.elapsed, "agent task finished");
        Ok(outcome)
    }

    fn name(&self) -> &str {
        &self.config.command
    }
}
