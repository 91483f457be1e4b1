//! Browser executor - wraps agent-browser CLI
//!
//! Owns the browser the operator logs into and, when the browser capture
//! backend is selected, takes page screenshots of it.

use std::path::Path;
use std::process::Stdio;
use tokio::process::Command;

use crate::core::config::BrowserConfig;
use crate::core::{Result, StepshotError};

/// Browser session driven through the agent-browser CLI
#[derive(Debug, Clone)]
pub struct BrowserExecutor {
    /// Session name for isolation
    session_name: String,
    /// Whether to run in headed mode
    headed: bool,
}

impl BrowserExecutor {
    /// Create a new browser executor
    pub fn new(session_name: impl Into<String>) -> Self {
        Self {
            session_name: session_name.into(),
            headed: false,
        }
    }

    pub fn from_config(config: &BrowserConfig) -> Self {
        let mut executor = Self::new(config.session_name.clone());
        executor.set_headed(config.headed);
        executor
    }

    /// Set headed mode
    pub fn set_headed(&mut self, headed: bool) {
        self.headed = headed;
    }

    /// Check if agent-browser is installed
    pub async fn is_available() -> bool {
        Command::new("agent-browser")
            .arg("--version")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .await
            .map(|s| s.success())
            .unwrap_or(false)
    }

    /// Arguments passed before the subcommand
    fn base_args(&self) -> Vec<String> {
        let mut args = vec!["--session".to_string(), self.session_name.clone()];
        if self.headed {
            args.push("--headed".to_string());
        }
        args
    }

    /// Run an agent-browser command
    async fn run_command(&self, args: &[&str]) -> Result<String> {
        let mut cmd = Command::new("agent-browser");
        cmd.args(self.base_args());
        cmd.args(args);
        cmd.stdout(Stdio::piped());
        cmd.stderr(Stdio::piped());

        tracing::debug!(session = %self.session_name, ?args, "agent-browser");

        let output = cmd.output().await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                StepshotError::AgentBrowserNotFound
            } else {
                StepshotError::browser(format!("Failed to run agent-browser: {}", e))
            }
        })?;

        if output.status.success() {
            Ok(String::from_utf8_lossy(&output.stdout).into_owned())
        } else {
            let stderr = String::from_utf8_lossy(&output.stderr);
            Err(StepshotError::browser(format!(
                "agent-browser {} failed: {}",
                args.first().copied().unwrap_or_default(),
                stderr.trim()
            )))
        }
    }

    /// Navigate to a URL and wait for the network to go idle
    pub async fn open(&self, url: &str) -> Result<()> {
        self.run_command(&["open", url]).await?;

        if let Err(e) = self.run_command(&["wait", "--load", "networkidle"]).await {
            tracing::debug!("wait for networkidle failed: {}", e);
        }
        Ok(())
    }

    /// Save a screenshot of the current page
    pub async fn screenshot(&self, path: &Path) -> Result<()> {
        let path = path.to_string_lossy().into_owned();
        self.run_command(&["screenshot", path.as_str()]).await?;
        Ok(())
    }

    /// Get current URL
    pub async fn get_url(&self) -> Result<String> {
        self.run_command(&["get", "url"])
            .await
            .map(|s| s.trim().to_string())
    }

    /// Close the browser
    pub async fn close(&self) -> Result<()> {
        self.run_command(&["close"]).await?;
        Ok(())
    }

    pub fn session_name(&self) -> &str {
        &self.session_name
    }
}

impl Default for BrowserExecutor {
    fn default() -> Self {
        Self::new("stepshot")
    }
}
