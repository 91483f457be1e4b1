//! Page capture through the agent-browser session

use async_trait::async_trait;
use std::path::Path;

use crate::browser::BrowserExecutor;
use crate::core::config::CaptureRegion;
use crate::core::Result;
use crate::correlator::ScreenCapturer;

/// Screenshots the automated browser's current page; the region is ignored
#[derive(Debug, Clone)]
pub struct BrowserCapturer {
    executor: BrowserExecutor,
}

impl BrowserCapturer {
    pub fn new(executor: BrowserExecutor) -> Self {
        Self { executor }
    }
}

#[async_trait]
impl ScreenCapturer for BrowserCapturer {
    async fn capture(&self, _region: CaptureRegion, path: &Path) -> Result<()> {
        self.executor.screenshot(path).await
    }

    fn name(&self) -> &str {
        "browser"
    }
}
