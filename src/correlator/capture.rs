//! Capture scheduling
//!
//! Screenshots are taken on detached tasks so the message path never waits
//! for them. Every task belongs to the scheduler's `JoinSet`; dropping the
//! scheduler aborts whatever is still running, and `drain` waits for them
//! with a bound.

use async_trait::async_trait;
use chrono::{DateTime, Local};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::task::JoinSet;
use tokio::time::Instant;

use crate::core::config::{CaptureConfig, CaptureRegion};
use crate::core::{Console, Result, StepshotError};

/// Something that can write a screen image to a file
#[async_trait]
pub trait ScreenCapturer: Send + Sync {
    /// Capture `region` into a PNG at `path`
    async fn capture(&self, region: CaptureRegion, path: &Path) -> Result<()>;

    /// Backend name for diagnostics
    fn name(&self) -> &str;
}

/// Timing and geometry for captures
#[derive(Debug, Clone, Copy)]
pub struct CaptureSettings {
    pub region: CaptureRegion,
    pub settle_delay: Duration,
    pub timeout: Duration,
}

impl CaptureSettings {
    pub fn from_config(config: &CaptureConfig) -> Self {
        Self {
            region: config.region,
            settle_delay: Duration::from_millis(config.settle_delay_ms),
            timeout: Duration::from_millis(config.timeout_ms),
        }
    }
}

/// Outcome counts for a scheduler's captures
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CaptureSummary {
    pub completed: usize,
    pub failed: usize,
    /// Still running when the shutdown grace period ran out
    pub abandoned: usize,
}

impl CaptureSummary {
    fn count(&mut self, joined: std::result::Result<bool, tokio::task::JoinError>) {
        match joined {
            Ok(true) => self.completed += 1,
            Ok(false) => self.failed += 1,
            Err(e) if e.is_cancelled() => self.abandoned += 1,
            Err(e) => {
                tracing::error!("capture task panicked: {}", e);
                self.failed += 1;
            }
        }
    }
}

/// Build `{dir}/step_{step}_{YYYYMMDD_HHMMSS}.png`
pub fn screenshot_path(dir: &Path, step: u64, at: DateTime<Local>) -> PathBuf {
    dir.join(format!("step_{}_{}.png", step, at.format("%Y%m%d_%H%M%S")))
}

/// Fire-and-forget capture launcher owned by one session
pub struct CaptureScheduler {
    capturer: Arc<dyn ScreenCapturer>,
    settings: CaptureSettings,
    console: Arc<dyn Console>,
    runtime: Handle,
    tasks: Mutex<JoinSet<bool>>,
    finished: Mutex<CaptureSummary>,
}

impl CaptureScheduler {
    /// Create a scheduler bound to the current tokio runtime
    pub fn new(
        capturer: Arc<dyn ScreenCapturer>,
        settings: CaptureSettings,
        console: Arc<dyn Console>,
    ) -> Result<Self> {
        let runtime = Handle::try_current().map_err(|_| {
            StepshotError::capture("capture scheduler must be created inside a tokio runtime")
        })?;

        Ok(Self {
            capturer,
            settings,
            console,
            runtime,
            tasks: Mutex::new(JoinSet::new()),
            finished: Mutex::new(CaptureSummary::default()),
        })
    }

    pub fn settings(&self) -> &CaptureSettings {
        &self.settings
    }

    /// Launch a capture into `path` and return immediately
    pub fn schedule(&self, path: PathBuf) {
        let capturer = Arc::clone(&self.capturer);
        let console = Arc::clone(&self.console);
        let settings = self.settings;

        let mut tasks = lock(&self.tasks);
        self.reap(&mut tasks);

        tracing::debug!(path = %path.display(), backend = capturer.name(), "capture scheduled");
        tasks.spawn_on(
            async move { run_capture(capturer.as_ref(), settings, &path, console.as_ref()).await },
            &self.runtime,
        );
    }

    /// Captures not yet joined
    pub fn pending(&self) -> usize {
        lock(&self.tasks).len()
    }

    /// Wait up to `grace` for outstanding captures, then abort the rest
    pub async fn drain(&self, grace: Duration) -> CaptureSummary {
        let mut tasks = std::mem::take(&mut *lock(&self.tasks));
        let mut summary = *lock(&self.finished);
        let deadline = Instant::now() + grace;

        loop {
            match tokio::time::timeout_at(deadline, tasks.join_next()).await {
                Ok(Some(joined)) => summary.count(joined),
                Ok(None) => break,
                Err(_) => {
                    summary.abandoned += tasks.len();
                    tracing::warn!(
                        abandoned = tasks.len(),
                        "captures still running after {:?}, aborting",
                        grace
                    );
                    tasks.abort_all();
                    break;
                }
            }
        }

        *lock(&self.finished) = summary;
        summary
    }

    /// Fold already-finished tasks into the summary
    fn reap(&self, tasks: &mut JoinSet<bool>) {
        let mut finished = lock(&self.finished);
        while let Some(joined) = tasks.try_join_next() {
            finished.count(joined);
        }
    }
}

async fn run_capture(
    capturer: &dyn ScreenCapturer,
    settings: CaptureSettings,
    path: &Path,
    console: &dyn Console,
) -> bool {
    tokio::time::sleep(settings.settle_delay).await;

    let result = match tokio::time::timeout(settings.timeout, capture_into(capturer, settings, path)).await
    {
        Ok(result) => result,
        Err(_) => Err(StepshotError::Timeout(format!(
            "{} capture exceeded {:?}",
            capturer.name(),
            settings.timeout
        ))),
    };

    match result {
        Ok(()) => {
            tracing::debug!(path = %path.display(), "capture written");
            true
        }
        Err(e) => {
            tracing::warn!(path = %path.display(), "capture failed: {}", e);
            console.problem(&format!("Failed to save screenshot: {}", e));
            false
        }
    }
}

async fn capture_into(
    capturer: &dyn ScreenCapturer,
    settings: CaptureSettings,
    path: &Path,
) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            tokio::fs::create_dir_all(parent).await?;
        }
    }
    capturer.capture(settings.region, path).await
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
