//! Browser module
//!
//! Wraps agent-browser CLI for the console the operator works in.

mod executor;

pub use executor::BrowserExecutor;
