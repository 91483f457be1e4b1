//! Configuration management for Stepshot
//!
//! Supports environment variables, config files, and runtime overrides.
//! Capture region, settle delay, output paths and trigger substrings are all
//! configurable.
//!
//! Config file location: ~/.config/stepshot/config.toml

use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use crate::core::error::{Result, StepshotError};
use crate::core::types::Level;

/// Main configuration for Stepshot
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Screen capture configuration
    pub capture: CaptureConfig,
    /// Output locations
    pub output: OutputConfig,
    /// Trigger substrings
    pub triggers: TriggerConfig,
    /// Automation agent command
    pub agent: AgentConfig,
    /// Browser configuration
    pub browser: BrowserConfig,
    /// Session recorder configuration
    pub session: SessionConfig,
}

/// Which capture backend takes the screenshots
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum CaptureBackend {
    /// Fixed screen region through an external screenshot tool
    Screen,
    /// Page screenshot through agent-browser
    Browser,
}

/// Screen region in pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaptureRegion {
    pub top: u32,
    pub left: u32,
    pub width: u32,
    pub height: u32,
}

impl Default for CaptureRegion {
    fn default() -> Self {
        Self {
            top: 100,
            left: 100,
            width: 1200,
            height: 800,
        }
    }
}

/// Screen capture configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptureConfig {
    /// Capture backend
    pub backend: CaptureBackend,
    /// Region captured by the screen backend
    pub region: CaptureRegion,
    /// Pause before capturing so the page can settle
    /// Default: 3000
    pub settle_delay_ms: u64,
    /// Upper bound on a single capture, settle delay excluded
    /// Default: 15000
    pub timeout_ms: u64,
    /// How long teardown waits for outstanding captures
    /// Default: 10000
    pub shutdown_grace_ms: u64,
    /// Custom screenshot command; placeholders {left} {top} {width} {height} {path}
    pub command: Option<Vec<String>>,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            backend: match env::var("STEPSHOT_CAPTURE_BACKEND").as_deref() {
                Ok("browser") => CaptureBackend::Browser,
                _ => CaptureBackend::Screen,
            },
            region: CaptureRegion::default(),
            settle_delay_ms: env::var("STEPSHOT_SETTLE_MS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(3000),
            timeout_ms: 15000,
            shutdown_grace_ms: 10000,
            command: None,
        }
    }
}

/// Output locations
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Directory receiving step screenshots
    pub screenshot_dir: PathBuf,
    /// Line-delimited JSON correlation log
    pub log_file: PathBuf,
    /// Directory receiving the free-form debug log
    pub debug_dir: PathBuf,
}

impl Default for OutputConfig {
    fn default() -> Self {
        let screenshot_dir = env::var("STEPSHOT_SCREENSHOT_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("screenshots"));
        let log_file = env::var("STEPSHOT_LOG_FILE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| screenshot_dir.join("log.json"));

        Self {
            screenshot_dir,
            log_file,
            debug_dir: env::var("STEPSHOT_DEBUG_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("debug_logs")),
        }
    }
}

impl OutputConfig {
    /// Path of the free-form debug log
    pub fn debug_file(&self) -> PathBuf {
        self.debug_dir.join("debug_log.txt")
    }
}

/// Trigger substrings, matched case-sensitively anywhere in a message
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TriggerConfig {
    /// Any of these makes a message significant
    pub significant: Vec<String>,
    /// Goal announcements (also significant)
    pub goal: Vec<String>,
    /// Messages containing any of these carry their text as the action
    pub action: Vec<String>,
}

impl Default for TriggerConfig {
    fn default() -> Self {
        let strings = |items: &[&str]| -> Vec<String> { items.iter().map(|s| s.to_string()).collect() };
        Self {
            significant: strings(&[
                "Action 1/1:",
                "Next goal:",
                "Searched for",
                "Navigating to",
                "Entering",
                "Clicking",
                "User logged in",
                "Clicked",
            ]),
            goal: strings(&["Next goal:"]),
            action: strings(&[
                "Action",
                "Navigating",
                "Entering",
                "Clicking",
                "Searched for",
                "User logged in",
                "Clicked",
            ]),
        }
    }
}

/// External automation agent
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentConfig {
    /// Program to run for each task
    pub command: String,
    /// Arguments; `{task}` is replaced with the task text
    pub args: Vec<String>,
    /// Upper bound on a single task
    /// Default: 600
    pub timeout_secs: u64,
    /// Channel for output lines that name none
    pub default_channel: String,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            command: env::var("STEPSHOT_AGENT_COMMAND")
                .unwrap_or_else(|_| "browser-use-task".to_string()),
            args: vec!["{task}".to_string()],
            timeout_secs: 600,
            default_channel: "agent".to_string(),
        }
    }
}

/// How the console is opened for the operator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum BrowserLaunch {
    /// Browser driven through agent-browser
    AgentBrowser,
    /// Operator's default browser
    System,
    /// Nothing is opened; the operator navigates themselves
    Manual,
}

/// Browser automation configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BrowserConfig {
    /// How the console is opened
    pub launch: BrowserLaunch,
    /// Session name for agent-browser
    pub session_name: String,
    /// Visible browser window (needed for manual login)
    pub headed: bool,
    /// Console landing page
    pub start_url: String,
    /// Human name of the console, used in task strings
    pub console_name: String,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            launch: match env::var("STEPSHOT_BROWSER_LAUNCH").as_deref() {
                Ok("system") => BrowserLaunch::System,
                Ok("manual") => BrowserLaunch::Manual,
                _ => BrowserLaunch::AgentBrowser,
            },
            session_name: env::var("STEPSHOT_BROWSER_SESSION")
                .unwrap_or_else(|_| "stepshot".to_string()),
            headed: true,
            start_url: env::var("STEPSHOT_START_URL")
                .unwrap_or_else(|_| "https://console.aws.amazon.com/".to_string()),
            console_name: "AWS console".to_string(),
        }
    }
}

/// Session recorder configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Channels the recorder subscribes to ("" is the root)
    pub channels: Vec<String>,
    /// Messages below this level are ignored
    pub min_level: Level,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            channels: vec![
                String::new(),
                "browser_use".to_string(),
                "agent".to_string(),
                "controller".to_string(),
            ],
            min_level: Level::Info,
        }
    }
}

impl Config {
    /// Get the config directory path
    pub fn config_dir() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("stepshot")
    }

    /// Get the config file path
    pub fn config_file() -> PathBuf {
        Self::config_dir().join("config.toml")
    }

    /// Load configuration from file, environment, and defaults
    /// Priority: CLI args > config file > env vars > defaults
    pub fn load() -> Self {
        let _ = dotenvy::dotenv();

        match Self::load_from(&Self::config_file()) {
            Ok(config) => config,
            Err(e) => {
                tracing::debug!("using default config: {}", e);
                Self::default()
            }
        }
    }

    /// Load configuration from a specific file
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(StepshotError::config(format!(
                "Config file not found: {}",
                path.display()
            )));
        }

        let content = fs::read_to_string(path)
            .map_err(|e| StepshotError::config(format!("Failed to read config: {}", e)))?;

        Self::from_toml(&content)
    }

    /// Parse configuration from TOML text; missing fields take defaults
    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str(content)
            .map_err(|e| StepshotError::config(format!("Failed to parse config: {}", e)))
    }

    /// Save configuration to the default file
    pub fn save(&self) -> Result<PathBuf> {
        let config_path = Self::config_file();
        self.save_to(&config_path)?;
        Ok(config_path)
    }

    /// Save configuration to `path`, creating parent directories
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(dir) = path.parent() {
            if !dir.as_os_str().is_empty() && !dir.exists() {
                fs::create_dir_all(dir).map_err(|e| {
                    StepshotError::config(format!("Failed to create config dir: {}", e))
                })?;
            }
        }

        fs::write(path, self.to_toml()?)
            .map_err(|e| StepshotError::config(format!("Failed to write config: {}", e)))
    }

    /// Render the configuration as a TOML document
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self)
            .map_err(|e| StepshotError::config(format!("Failed to serialize config: {}", e)))
    }

    /// Check the configuration for values that cannot work
    pub fn validate(&self) -> Result<()> {
        if self.triggers.significant.is_empty() && self.triggers.goal.is_empty() {
            return Err(StepshotError::config("No trigger substrings configured"));
        }

        if self
            .triggers
            .significant
            .iter()
            .chain(&self.triggers.goal)
            .any(|t| t.is_empty())
        {
            return Err(StepshotError::config(
                "Empty trigger substring would match every message",
            ));
        }

        let region = &self.capture.region;
        if region.width == 0 || region.height == 0 {
            return Err(StepshotError::config(format!(
                "Capture region must be non-empty, got {}x{}",
                region.width, region.height
            )));
        }

        if let Some(ref command) = self.capture.command {
            if command.is_empty() {
                return Err(StepshotError::config("Capture command is empty"));
            }
            if !command.iter().any(|arg| arg.contains("{path}")) {
                return Err(StepshotError::config(
                    "Capture command must contain a {path} placeholder",
                ));
            }
        }

        url::Url::parse(&self.browser.start_url).map_err(|e| {
            StepshotError::config(format!(
                "Invalid start_url '{}': {}",
                self.browser.start_url, e
            ))
        })?;

        if self.agent.command.trim().is_empty() {
            return Err(StepshotError::config("Agent command is empty"));
        }

        Ok(())
    }
}
