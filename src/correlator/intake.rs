//! Session recorder and its attachment to the progress hub
//!
//! The recorder turns significant progress messages into journal records and
//! screenshots. It owns its step counter and last goal; nothing here is
//! process-global, so independent sessions can run side by side as long as
//! they write to different output paths.

use chrono::Local;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use crate::core::{Config, Console, CorrelationRecord, Level, ProgressMessage, Result};
use crate::correlator::capture::{
    screenshot_path, CaptureScheduler, CaptureSettings, CaptureSummary, ScreenCapturer,
};
use crate::correlator::classifier::TriggerSet;
use crate::correlator::journal::{DebugTrail, Journal};
use crate::events::{ProgressHub, ProgressSink, SubscriptionId};

/// Mutable per-session counters
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionState {
    /// Step number the next record will get
    pub step: u64,
    /// Most recent goal announcement, empty until one arrives
    pub last_goal: String,
}

impl Default for SessionState {
    fn default() -> Self {
        Self {
            step: 1,
            last_goal: String::new(),
        }
    }
}

/// Correlates progress messages with screenshots
pub struct SessionRecorder {
    triggers: TriggerSet,
    journal: Journal,
    debug_trail: DebugTrail,
    scheduler: CaptureScheduler,
    screenshot_dir: PathBuf,
    min_level: Level,
    console: Arc<dyn Console>,
    state: Mutex<SessionState>,
}

impl SessionRecorder {
    /// Create a recorder with a fresh `SessionState`
    pub fn new(
        triggers: TriggerSet,
        journal: Journal,
        debug_trail: DebugTrail,
        scheduler: CaptureScheduler,
        screenshot_dir: impl Into<PathBuf>,
        console: Arc<dyn Console>,
    ) -> Self {
        Self {
            triggers,
            journal,
            debug_trail,
            scheduler,
            screenshot_dir: screenshot_dir.into(),
            min_level: Level::Info,
            console,
            state: Mutex::new(SessionState::default()),
        }
    }

    /// Build everything from configuration. Must run inside a tokio runtime.
    pub fn from_config(
        config: &Config,
        capturer: Arc<dyn ScreenCapturer>,
        console: Arc<dyn Console>,
    ) -> Result<Self> {
        let scheduler = CaptureScheduler::new(
            capturer,
            CaptureSettings::from_config(&config.capture),
            Arc::clone(&console),
        )?;

        Ok(Self::new(
            TriggerSet::from_config(&config.triggers),
            Journal::new(&config.output.log_file),
            DebugTrail::new(config.output.debug_file()),
            scheduler,
            &config.output.screenshot_dir,
            console,
        )
        .with_min_level(config.session.min_level))
    }

    /// Ignore messages below `level`
    pub fn with_min_level(mut self, level: Level) -> Self {
        self.min_level = level;
        self
    }

    /// Process one message; returns the record if one was appended
    ///
    /// Never panics or returns an error. The step advances only after the
    /// record reached the journal; a failed append leaves the state untouched
    /// and schedules no capture.
    pub fn handle(&self, message: &ProgressMessage) -> Option<CorrelationRecord> {
        if message.level < self.min_level {
            return None;
        }

        // Held for the whole message so records stay in arrival order
        let mut state = lock(&self.state);

        self.debug_trail.note(&message.text);

        let class = self.triggers.classify(&message.text);
        if !class.significant {
            return None;
        }

        let path = screenshot_path(&self.screenshot_dir, state.step, Local::now());
        let record = CorrelationRecord {
            step: state.step,
            action: if class.action {
                message.text.clone()
            } else {
                String::new()
            },
            next_goal: if class.goal {
                message.text.clone()
            } else {
                state.last_goal.clone()
            },
            screenshot: path.to_string_lossy().into_owned(),
        };

        if let Err(e) = self.journal.append(&record) {
            tracing::warn!(step = record.step, "journal append failed: {}", e);
            self.console
                .problem(&format!("Failed to log step {}: {}", record.step, e));
            return None;
        }

        self.scheduler.schedule(path);
        self.console
            .notice(&format!("Step {}: Saved {}", record.step, record.screenshot));

        if class.goal {
            state.last_goal = message.text.clone();
        }
        state.step += 1;

        Some(record)
    }

    /// Copy of the current counters
    pub fn snapshot(&self) -> SessionState {
        lock(&self.state).clone()
    }

    pub fn journal(&self) -> &Journal {
        &self.journal
    }

    pub fn scheduler(&self) -> &CaptureScheduler {
        &self.scheduler
    }
}

impl ProgressSink for SessionRecorder {
    fn on_message(&self, message: &ProgressMessage) {
        let _ = self.handle(message);
    }
}

/// Where an `Attachment` is in its lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttachmentState {
    Attached,
    Detached,
}

/// A recorder subscribed to a hub for the length of one session
///
/// Detaches on `detach`, `finish`, or drop, whichever comes first, so the
/// recorder never outlives its session even when the agent fails or panics.
pub struct Attachment {
    hub: Arc<ProgressHub>,
    recorder: Arc<SessionRecorder>,
    subscription: Option<SubscriptionId>,
}

impl Attachment {
    /// Subscribe `recorder` to every channel in `channels`
    pub fn attach<S>(hub: Arc<ProgressHub>, recorder: Arc<SessionRecorder>, channels: &[S]) -> Self
    where
        S: AsRef<str>,
    {
        let sink: Arc<dyn ProgressSink> = recorder.clone();
        let subscription = hub.subscribe(channels, sink);
        tracing::info!(channels = channels.len(), "session recorder attached");

        Self {
            hub,
            recorder,
            subscription: Some(subscription),
        }
    }

    pub fn state(&self) -> AttachmentState {
        if self.subscription.is_some() {
            AttachmentState::Attached
        } else {
            AttachmentState::Detached
        }
    }

    pub fn recorder(&self) -> &Arc<SessionRecorder> {
        &self.recorder
    }

    /// Unsubscribe. Returns false if already detached.
    pub fn detach(&mut self) -> bool {
        match self.subscription.take() {
            Some(id) => {
                self.hub.unsubscribe(id);
                tracing::info!("session recorder detached");
                true
            }
            None => false,
        }
    }

    /// Detach, then wait up to `grace` for outstanding captures
    pub async fn finish(mut self, grace: Duration) -> CaptureSummary {
        self.detach();
        self.recorder.scheduler().drain(grace).await
    }
}

impl Drop for Attachment {
    fn drop(&mut self) {
        if self.detach() {
            tracing::warn!("session ended without finish(); outstanding captures may be lost");
        }
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::CaptureRegion;
    use crate::core::BufferedConsole;
    use async_trait::async_trait;
    use std::path::Path;
    use tempfile::{tempdir, TempDir};

    struct NoopCapturer;

    #[async_trait]
    impl ScreenCapturer for NoopCapturer {
        async fn capture(&self, _region: CaptureRegion, _path: &Path) -> Result<()> {
            Ok(())
        }

        fn name(&self) -> &str {
            "noop"
        }
    }

    fn recorder(dir: &TempDir, console: Arc<BufferedConsole>) -> SessionRecorder {
        let scheduler = CaptureScheduler::new(
            Arc::new(NoopCapturer),
            CaptureSettings {
                region: CaptureRegion::default(),
                settle_delay: Duration::ZERO,
                timeout: Duration::from_secs(1),
            },
            console.clone(),
        )
        .unwrap();

        SessionRecorder::new(
            TriggerSet::default(),
            Journal::new(dir.path().join("log.json")),
            DebugTrail::new(dir.path().join("debug_log.txt")),
            scheduler,
            dir.path().join("shots"),
            console,
        )
    }

    #[tokio::test]
    async fn test_state_starts_fresh() {
        let dir = tempdir().unwrap();
        let recorder = recorder(&dir, Arc::new(BufferedConsole::new()));
        assert_eq!(recorder.snapshot(), SessionState::default());
        assert_eq!(recorder.snapshot().step, 1);
    }

    #[tokio::test]
    async fn test_below_threshold_is_ignored_entirely() {
        let dir = tempdir().unwrap();
        let recorder = recorder(&dir, Arc::new(BufferedConsole::new()));

        let quiet = ProgressMessage::new("agent", Level::Debug, "Clicked");
        assert!(recorder.handle(&quiet).is_none());
        assert_eq!(recorder.snapshot().step, 1);
        assert!(!dir.path().join("debug_log.txt").exists());
    }

    #[tokio::test]
    async fn test_goal_carries_forward() {
        let dir = tempdir().unwrap();
        let recorder = recorder(&dir, Arc::new(BufferedConsole::new()));

        let first = recorder.handle(&ProgressMessage::info("Clicking row")).unwrap();
        assert_eq!(first.next_goal, "");

        let goal = recorder
            .handle(&ProgressMessage::info("Next goal: open billing"))
            .unwrap();
        assert_eq!(goal.action, "");
        assert_eq!(goal.next_goal, "Next goal: open billing");

        let after = recorder.handle(&ProgressMessage::info("Clicked")).unwrap();
        assert_eq!(after.step, 3);
        assert_eq!(after.next_goal, "Next goal: open billing");
        assert_eq!(recorder.snapshot().last_goal, "Next goal: open billing");
    }

    #[tokio::test]
    async fn test_screenshot_path_uses_step() {
        let dir = tempdir().unwrap();
        let recorder = recorder(&dir, Arc::new(BufferedConsole::new()));

        let record = recorder.handle(&ProgressMessage::info("Clicked")).unwrap();
        let name = Path::new(&record.screenshot)
            .file_name()
            .unwrap()
            .to_string_lossy()
            .into_owned();
        assert!(name.starts_with("step_1_"), "{}", name);
        assert!(name.ends_with(".png"));
        // step_1_YYYYMMDD_HHMMSS.png
        assert_eq!(name.len(), "step_1_".len() + 15 + ".png".len());
    }

    #[tokio::test]
    async fn test_failed_append_keeps_state() {
        let dir = tempdir().unwrap();
        let console = Arc::new(BufferedConsole::new());
        let recorder = recorder(&dir, console.clone());
        std::fs::create_dir(dir.path().join("log.json")).unwrap();

        assert!(recorder
            .handle(&ProgressMessage::info("Next goal: open S3"))
            .is_none());
        assert_eq!(recorder.snapshot(), SessionState::default());
        assert_eq!(recorder.scheduler().pending(), 0);
        assert_eq!(console.problems().len(), 1);
        assert!(console.problems()[0].starts_with("Failed to log step 1:"));
    }

    #[tokio::test]
    async fn test_attachment_lifecycle() {
        let dir = tempdir().unwrap();
        let hub = Arc::new(ProgressHub::new());
        let recorder = Arc::new(recorder(&dir, Arc::new(BufferedConsole::new())));

        let mut attachment = Attachment::attach(hub.clone(), recorder.clone(), &["", "agent"]);
        assert_eq!(attachment.state(), AttachmentState::Attached);

        hub.publish(ProgressMessage::new("agent", Level::Info, "Clicked"));
        assert_eq!(recorder.snapshot().step, 2);

        assert!(attachment.detach());
        assert!(!attachment.detach());
        assert_eq!(attachment.state(), AttachmentState::Detached);

        hub.publish(ProgressMessage::new("agent", Level::Info, "Clicked"));
        assert_eq!(recorder.snapshot().step, 2);
        assert_eq!(hub.subscriber_count(), 0);
    }

    #[tokio::test]
    async fn test_drop_detaches() {
        let dir = tempdir().unwrap();
        let hub = Arc::new(ProgressHub::new());
        let recorder = Arc::new(recorder(&dir, Arc::new(BufferedConsole::new())));

        {
            let _attachment = Attachment::attach(hub.clone(), recorder.clone(), &[""]);
            assert_eq!(hub.subscriber_count(), 1);
        }

        assert_eq!(hub.subscriber_count(), 0);
    }
}
