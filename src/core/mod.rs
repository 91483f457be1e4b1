//! Core module - shared infrastructure for Stepshot
//!
//! This module contains foundational types, configuration, error handling
//! and the operator console used throughout the application.

pub mod config;
pub mod console;
pub mod error;
pub mod types;

pub use config::Config;
pub use console::{BufferedConsole, Console, StdConsole};
pub use error::{Result, StepshotError};
pub use types::*;
