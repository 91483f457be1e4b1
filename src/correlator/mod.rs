//! Correlator module - screenshot/log correlation for agent progress
//!
//! Classifies progress messages, schedules screenshots for the significant
//! ones, and journals a record tying each step to its evidence.

pub mod capture;
pub mod classifier;
pub mod intake;
pub mod journal;

pub use capture::{
    screenshot_path, CaptureScheduler, CaptureSettings, CaptureSummary, ScreenCapturer,
};
pub use classifier::{Classification, TriggerSet};
pub use intake::{Attachment, AttachmentState, SessionRecorder, SessionState};
pub use journal::{read_records, DebugTrail, Journal};
