//! Stepshot - screenshot-and-log correlation for browser agents
//!
//! Main entry point for the CLI application.

use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

use stepshot::core::config::{BrowserLaunch, CaptureBackend};
use stepshot::core::StdConsole;
use stepshot::{capture, Config, ExternalAgent, ProgressHub, Repl};

/// Stepshot - record an agent's console session as screenshots and a step log
#[derive(Parser, Debug)]
#[command(name = "stepshot")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Config file (defaults to the user config dir)
    #[arg(long, short = 'c')]
    config: Option<PathBuf>,

    /// Directory for step screenshots
    #[arg(long, short = 's')]
    screenshot_dir: Option<PathBuf>,

    /// Step journal path (defaults to <screenshot-dir>/log.json)
    #[arg(long, short = 'l')]
    log_file: Option<PathBuf>,

    /// Delay before each capture, in milliseconds
    #[arg(long)]
    settle_ms: Option<u64>,

    /// Capture backend
    #[arg(long, value_enum)]
    backend: Option<CaptureBackend>,

    /// How to open the console
    #[arg(long, value_enum)]
    launch: Option<BrowserLaunch>,

    /// Do not open any browser; the operator opens the console
    #[arg(long, conflicts_with = "launch")]
    no_browser: bool,

    /// Enable debug output
    #[arg(long, short = 'd')]
    debug: bool,

    /// Print the effective configuration as TOML and exit
    #[arg(long)]
    print_config: bool,

    /// Save the effective configuration to the user config file and exit
    #[arg(long)]
    write_config: bool,

    /// Single task mode (non-interactive)
    #[arg(long, short = 't')]
    task: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let filter = if args.debug {
        EnvFilter::new("stepshot=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("stepshot=warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    // Build configuration
    let mut config = match args.config {
        Some(ref path) => {
            let _ = dotenvy::dotenv();
            Config::load_from(path)?
        }
        None => Config::load(),
    };

    // Apply CLI overrides
    if let Some(dir) = args.screenshot_dir {
        if args.log_file.is_none() {
            config.output.log_file = dir.join("log.json");
        }
        config.output.screenshot_dir = dir;
    }

    if let Some(log_file) = args.log_file {
        config.output.log_file = log_file;
    }

    if let Some(settle_ms) = args.settle_ms {
        config.capture.settle_delay_ms = settle_ms;
    }

    if let Some(backend) = args.backend {
        config.capture.backend = backend;
    }

    if let Some(launch) = args.launch {
        config.browser.launch = launch;
    }

    if args.no_browser {
        config.browser.launch = BrowserLaunch::Manual;
    }

    config.validate()?;

    if args.print_config {
        print!("{}", config.to_toml()?);
        return Ok(());
    }

    if args.write_config {
        let path = config.save()?;
        println!("Configuration saved to {}", path.display());
        return Ok(());
    }

    tracing::debug!(?config, "effective configuration");

    let hub = Arc::new(ProgressHub::new());
    let capturer = capture::from_config(&config)?;
    let mut agent = ExternalAgent::new(config.agent.clone(), Arc::clone(&hub));
    let mut repl = Repl::new(config, hub, Arc::new(StdConsole));

    // Single task mode
    let report = if let Some(task) = args.task {
        repl.run_once(&task, &mut agent, capturer).await?
    } else {
        let input = tokio::io::BufReader::new(tokio::io::stdin());
        repl.run(input, &mut agent, capturer).await?
    };

    println!(
        "Recorded {} steps ({} screenshots saved)",
        report.steps, report.captures.completed
    );

    Ok(())
}
