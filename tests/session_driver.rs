//! Session driver integration tests
//!
//! Runs the interactive loop against scripted operator input and a fake
//! agent that publishes canned progress on the hub.

use async_trait::async_trait;
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use stepshot::agent::AgentOutcome;
use stepshot::core::config::{BrowserLaunch, CaptureRegion};
use stepshot::core::{BufferedConsole, Config, Level, ProgressMessage, Result, StepshotError};
use stepshot::correlator::{read_records, ScreenCapturer};
use stepshot::{AutomationAgent, ProgressHub, Repl};

struct FileCapturer;

#[async_trait]
impl ScreenCapturer for FileCapturer {
    async fn capture(&self, _region: CaptureRegion, path: &Path) -> Result<()> {
        tokio::fs::write(path, b"png").await?;
        Ok(())
    }

    fn name(&self) -> &str {
        "file"
    }
}

/// Publishes a fixed script per task; tasks mentioning "crash" fail midway
struct ScriptedAgent {
    hub: Arc<ProgressHub>,
    tasks: Arc<Mutex<Vec<String>>>,
}

#[async_trait]
impl AutomationAgent for ScriptedAgent {
    async fn run(&mut self, task: &str) -> Result<AgentOutcome> {
        self.tasks.lock().unwrap().push(task.to_string());

        self.hub
            .publish(ProgressMessage::new("agent", Level::Info, "Next goal: do it"));
        if task.contains("crash") {
            return Err(StepshotError::agent("browser crashed"));
        }
        self.hub
            .publish(ProgressMessage::new("controller", Level::Info, "Clicked"));

        Ok(AgentOutcome {
            messages: 2,
            elapsed: Duration::from_millis(1),
        })
    }

    fn name(&self) -> &str {
        "scripted"
    }
}

fn test_config(root: &Path) -> Config {
    let mut config = Config::default();
    config.output.screenshot_dir = root.join("screenshots");
    config.output.log_file = root.join("screenshots").join("log.json");
    config.output.debug_dir = root.join("debug_logs");
    config.capture.settle_delay_ms = 0;
    config.browser.launch = BrowserLaunch::Manual;
    config
}

fn session(
    config: Config,
) -> (Repl, ScriptedAgent, Arc<ProgressHub>, Arc<BufferedConsole>, Arc<Mutex<Vec<String>>>) {
    let hub = Arc::new(ProgressHub::new());
    let console = Arc::new(BufferedConsole::new());
    let tasks = Arc::new(Mutex::new(Vec::new()));
    let agent = ScriptedAgent {
        hub: Arc::clone(&hub),
        tasks: Arc::clone(&tasks),
    };
    let repl = Repl::new(config, Arc::clone(&hub), console.clone());
    (repl, agent, hub, console, tasks)
}

#[tokio::test]
async fn test_interactive_session_records_every_action() {
    let dir = tempfile::tempdir().unwrap();
    let config = test_config(dir.path());
    let log_file = config.output.log_file.clone();
    let (mut repl, mut agent, hub, console, tasks) = session(config);

    let input: &[u8] = b"\nList S3 buckets\nstatus\nexit\n";
    let report = repl.run(input, &mut agent, Arc::new(FileCapturer)).await.unwrap();

    assert_eq!(
        *tasks.lock().unwrap(),
        vec!["In the AWS console, List S3 buckets".to_string()]
    );
    assert_eq!(hub.subscriber_count(), 0);

    // Navigating, User logged in, Next goal, Clicked
    assert_eq!(report.steps, 4);
    assert_eq!(report.captures.completed, 4);

    let records = read_records(&log_file).unwrap();
    assert_eq!(records.len(), 4);
    assert!(records[0].action.starts_with("Navigating to https://console.aws.amazon.com"));
    assert_eq!(records[1].action, "User logged in to AWS console");
    assert_eq!(records[3].action, "Clicked");
    assert_eq!(records[3].next_goal, "Next goal: do it");

    let notices = console.notices();
    assert!(notices.iter().any(|n| n == "Performing action: List S3 buckets"));
    assert!(notices.iter().any(|n| n.starts_with("Session Status:")));
    assert!(notices.iter().any(|n| n == "Exiting..."));
}

#[tokio::test]
async fn test_agent_failure_keeps_session_going() {
    let dir = tempfile::tempdir().unwrap();
    let config = test_config(dir.path());
    let (mut repl, mut agent, hub, console, tasks) = session(config);

    let input: &[u8] = b"\ncrash please\nOpen EC2\n";
    let report = repl.run(input, &mut agent, Arc::new(FileCapturer)).await.unwrap();

    assert_eq!(tasks.lock().unwrap().len(), 2);
    assert_eq!(hub.subscriber_count(), 0);
    // Navigating, logged in, goal (crash), goal + Clicked (EC2)
    assert_eq!(report.steps, 5);
    assert!(console
        .problems()
        .iter()
        .any(|p| p.contains("scripted failed") && p.contains("browser crashed")));
}

#[tokio::test]
async fn test_eof_before_login_ends_quietly() {
    let dir = tempfile::tempdir().unwrap();
    let config = test_config(dir.path());
    let (mut repl, mut agent, hub, _console, tasks) = session(config);

    let input: &[u8] = b"";
    let report = repl.run(input, &mut agent, Arc::new(FileCapturer)).await.unwrap();

    assert!(tasks.lock().unwrap().is_empty());
    assert_eq!(hub.subscriber_count(), 0);
    assert_eq!(report.steps, 1);
}

#[tokio::test]
async fn test_single_task_mode() {
    let dir = tempfile::tempdir().unwrap();
    let config = test_config(dir.path());
    let (mut repl, mut agent, hub, _console, tasks) = session(config);

    let report = repl
        .run_once("List S3 buckets", &mut agent, Arc::new(FileCapturer))
        .await
        .unwrap();

    assert_eq!(*tasks.lock().unwrap(), vec!["List S3 buckets".to_string()]);
    assert_eq!(hub.subscriber_count(), 0);
    assert_eq!(report.steps, 2);

    let err = repl
        .run_once("crash now", &mut agent, Arc::new(FileCapturer))
        .await
        .unwrap_err();
    assert!(matches!(err, StepshotError::Agent(_)));
    assert_eq!(hub.subscriber_count(), 0);
}
