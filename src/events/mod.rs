//! Events module - progress message bus
//!
//! The automation agent publishes here; the session recorder subscribes.

pub mod hub;

pub use hub::{ProgressHub, ProgressSink, SubscriptionId};
