//! Capture backends
//!
//! Implementations of `ScreenCapturer` selected by `capture.backend`.

mod browser;
mod region;

use std::sync::Arc;

pub use browser::BrowserCapturer;
pub use region::RegionCommandCapturer;

use crate::browser::BrowserExecutor;
use crate::core::config::{CaptureBackend, Config};
use crate::core::Result;
use crate::correlator::ScreenCapturer;

/// Build the capturer the configuration asks for
pub fn from_config(config: &Config) -> Result<Arc<dyn ScreenCapturer>> {
    let capturer: Arc<dyn ScreenCapturer> = match config.capture.backend {
        CaptureBackend::Screen => match config.capture.command {
            Some(ref template) => Arc::new(RegionCommandCapturer::new(template.clone())?),
            None => Arc::new(RegionCommandCapturer::platform_default()),
        },
        CaptureBackend::Browser => Arc::new(BrowserCapturer::new(BrowserExecutor::from_config(
            &config.browser,
        ))),
    };

    tracing::debug!(backend = capturer.name(), "capture backend selected");
    Ok(capturer)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backend_selection() {
        let mut config = Config::default();
        config.capture.backend = CaptureBackend::Screen;
        assert_eq!(from_config(&config).unwrap().name(), "screen");

        config.capture.backend = CaptureBackend::Browser;
        assert_eq!(from_config(&config).unwrap().name(), "browser");
    }

    #[test]
    fn test_empty_custom_command_fails() {
        let mut config = Config::default();
        config.capture.backend = CaptureBackend::Screen;
        config.capture.command = Some(Vec::new());
        assert!(from_config(&config).is_err());
    }
}
