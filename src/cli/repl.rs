//! Interactive session driver
//!
//! Opens the console, waits for the operator to log in, then turns each
//! typed action into an agent task while the session recorder journals and
//! screenshots the agent's progress.

use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, Lines};

use crate::agent::AutomationAgent;
use crate::browser::BrowserExecutor;
use crate::cli::commands::{handle_command, CommandResult};
use crate::core::config::BrowserLaunch;
use crate::core::{Config, Console, ProgressMessage, Result};
use crate::correlator::{Attachment, CaptureSummary, ScreenCapturer, SessionRecorder};
use crate::events::ProgressHub;

/// What a finished session produced
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionReport {
    /// Records appended to the journal
    pub steps: u64,
    /// Capture outcomes at teardown
    pub captures: CaptureSummary,
}

/// Operator session: one recorder, one hub, many agent tasks
pub struct Repl {
    config: Config,
    hub: Arc<ProgressHub>,
    console: Arc<dyn Console>,
    browser: Option<BrowserExecutor>,
}

impl Repl {
    /// Create a session publishing on `hub`
    pub fn new(config: Config, hub: Arc<ProgressHub>, console: Arc<dyn Console>) -> Self {
        let browser = match config.browser.launch {
            BrowserLaunch::AgentBrowser => Some(BrowserExecutor::from_config(&config.browser)),
            _ => None,
        };

        Self {
            config,
            hub,
            console,
            browser,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Run the interactive loop reading operator lines from `input`
    ///
    /// The recorder is attached before anything is published and detached
    /// on every exit path; outstanding captures get the configured grace
    /// period.
    pub async fn run<R>(
        &mut self,
        input: R,
        agent: &mut dyn AutomationAgent,
        capturer: Arc<dyn ScreenCapturer>,
    ) -> Result<SessionReport>
    where
        R: AsyncBufRead + Unpin + Send,
    {
        let recorder = Arc::new(SessionRecorder::from_config(
            &self.config,
            capturer,
            Arc::clone(&self.console),
        )?);
        let attachment = Attachment::attach(
            Arc::clone(&self.hub),
            Arc::clone(&recorder),
            &self.config.session.channels,
        );

        let mut lines = input.lines();
        let outcome = self.drive(&mut lines, agent, &recorder).await;

        let captures = self.teardown(attachment).await;
        outcome?;

        Ok(SessionReport {
            steps: recorder.snapshot().step - 1,
            captures,
        })
    }

    /// Run a single task without the login prompt or action loop
    pub async fn run_once(
        &mut self,
        task: &str,
        agent: &mut dyn AutomationAgent,
        capturer: Arc<dyn ScreenCapturer>,
    ) -> Result<SessionReport> {
        let recorder = Arc::new(SessionRecorder::from_config(
            &self.config,
            capturer,
            Arc::clone(&self.console),
        )?);
        let attachment = Attachment::attach(
            Arc::clone(&self.hub),
            Arc::clone(&recorder),
            &self.config.session.channels,
        );

        self.publish(format!("Set task: {}", task));
        let outcome = agent.run(task).await;

        let captures = self.teardown(attachment).await;
        let outcome = outcome?;
        tracing::info!(messages = outcome.messages, "single task finished");

        Ok(SessionReport {
            steps: recorder.snapshot().step - 1,
            captures,
        })
    }

    async fn drive<R>(
        &mut self,
        lines: &mut Lines<R>,
        agent: &mut dyn AutomationAgent,
        recorder: &SessionRecorder,
    ) -> Result<()>
    where
        R: AsyncBufRead + Unpin + Send,
    {
        let console_name = self.config.browser.console_name.clone();

        self.open_console().await?;

        self.console.notice(&format!(
            "\nPlease log into your {} manually in the browser.",
            console_name
        ));
        self.console.prompt(&format!(
            "Press Enter after you have successfully logged in and are on the {} dashboard: ",
            console_name
        ));
        if lines.next_line().await?.is_none() {
            self.console.notice("\nExiting...");
            return Ok(());
        }
        self.publish(format!("User logged in to {}", console_name));

        if let Some(ref browser) = self.browser {
            match browser.get_url().await {
                Ok(url) => tracing::info!(%url, "operator logged in"),
                Err(e) => tracing::debug!("could not read current url: {}", e),
            }
        }

        loop {
            self.console.prompt(&format!(
                "\nEnter the next action to perform in the {} (e.g., 'List S3 buckets') or type 'exit' to quit: ",
                console_name
            ));

            let line = match lines.next_line().await {
                Ok(Some(line)) => line,
                Ok(None) => {
                    self.console.notice("\nExiting...");
                    break;
                }
                Err(e) => {
                    self.console.problem(&format!("Error reading input: {}", e));
                    continue;
                }
            };

            match handle_command(&line, recorder) {
                CommandResult::Exit => {
                    self.console.notice("Exiting...");
                    break;
                }
                CommandResult::Handled(output) => self.console.notice(&output),
                CommandResult::None => continue,
                CommandResult::Continue(action) => {
                    self.console
                        .notice(&format!("Performing action: {}", action));
                    let task = format!("In the {}, {}", console_name, action);
                    self.publish(format!("Set task: {}", task));

                    match agent.run(&task).await {
                        Ok(outcome) => tracing::info!(
                            messages = outcome.messages,
                            elapsed = ?outcome.elapsed,
                            "action finished"
                        ),
                        Err(e) => self
                            .console
                            .problem(&format!("Agent {} failed: {}", agent.name(), e)),
                    }
                }
            }
        }

        Ok(())
    }

    /// Put the console in front of the operator and announce the navigation
    async fn open_console(&mut self) -> Result<()> {
        let url = self.config.browser.start_url.clone();
        self.console
            .notice(&format!("Opening {} login page...", self.config.browser.console_name));

        match self.config.browser.launch {
            BrowserLaunch::AgentBrowser => {
                if BrowserExecutor::is_available().await {
                    if let Some(ref browser) = self.browser {
                        browser.open(&url).await?;
                    }
                } else {
                    self.console.problem(
                        "agent-browser not found; opening the system browser instead. \
                         Install with: npm install -g agent-browser && agent-browser install",
                    );
                    self.browser = None;
                    self.open_system_browser(&url);
                }
            }
            BrowserLaunch::System => self.open_system_browser(&url),
            BrowserLaunch::Manual => self
                .console
                .notice(&format!("Open {} in your browser.", url)),
        }

        self.publish(format!("Navigating to {}", url));
        Ok(())
    }

    fn open_system_browser(&self, url: &str) {
        if let Err(e) = webbrowser::open(url) {
            self.console
                .problem(&format!("Could not open a browser ({}); open {} yourself.", e, url));
        }
    }

    /// Detach the recorder, wait for captures, close the browser
    async fn teardown(&mut self, attachment: Attachment) -> CaptureSummary {
        let grace = Duration::from_millis(self.config.capture.shutdown_grace_ms);
        let captures = attachment.finish(grace).await;

        if captures.failed > 0 || captures.abandoned > 0 {
            self.console.problem(&format!(
                "Screenshots: {} saved, {} failed, {} abandoned",
                captures.completed, captures.failed, captures.abandoned
            ));
        } else {
            tracing::info!(saved = captures.completed, "all screenshots saved");
        }

        if let Some(browser) = self.browser.take() {
            if let Err(e) = browser.close().await {
                tracing::warn!("failed to close browser: {}", e);
            }
        }

        captures
    }

    /// Announce something on the root channel, as the driver
    fn publish(&self, text: String) {
        self.hub.publish(ProgressMessage::info(text));
    }
}
