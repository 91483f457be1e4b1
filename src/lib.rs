//! Stepshot - screenshot-and-log correlation for operator-directed browser agents
//!
//! An operator logs into a web console, then types actions that an external
//! automation agent carries out. While the agent works, every significant
//! progress message it publishes is journaled as a step record and paired
//! with a screenshot of the console.
//!
//! # Architecture
//!
//! - **Core**: Shared types, configuration, error handling, operator console
//! - **Events**: Channel-based progress hub the agent publishes to
//! - **Correlator**: Classifier, journal, capture scheduler, session recorder
//! - **Capture**: Screen-region and browser screenshot backends
//! - **Browser**: agent-browser CLI wrapper
//! - **Agent**: External agent runner and log-line parsing
//! - **CLI**: Interactive session driver
//!
//! # Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use stepshot::core::StdConsole;
//! use stepshot::{capture, Config, ExternalAgent, ProgressHub, Repl};
//!
//! #[tokio::main]
//! async fn main() -> stepshot::Result<()> {
//!     let config = Config::load();
//!     let hub = Arc::new(ProgressHub::new());
//!     let capturer = capture::from_config(&config)?;
//!     let mut agent = ExternalAgent::new(config.agent.clone(), Arc::clone(&hub));
//!
//!     let mut repl = Repl::new(config, hub, Arc::new(StdConsole));
//!     let input = tokio::io::BufReader::new(tokio::io::stdin());
//!     let report = repl.run(input, &mut agent, capturer).await?;
//!     println!("{} steps recorded", report.steps);
//!     Ok(())
//! }
//! ```

pub mod agent;
pub mod browser;
pub mod capture;
pub mod cli;
pub mod core;
pub mod correlator;
pub mod events;

// Re-export commonly used items
pub use agent::{AutomationAgent, ExternalAgent};
pub use cli::{Repl, SessionReport};
pub use core::{Config, Result, StepshotError};
pub use correlator::{Attachment, SessionRecorder};
pub use events::ProgressHub;
