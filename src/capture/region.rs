//! Screen-region capture through an external screenshot tool

use async_trait::async_trait;
use std::path::Path;
use std::process::Stdio;
use tokio::process::Command;

use crate::core::config::CaptureRegion;
use crate::core::{Result, StepshotError};
use crate::correlator::ScreenCapturer;

/// Runs a screenshot program for a fixed region of the screen
///
/// The command is a template; `{left}`, `{top}`, `{width}`, `{height}` and
/// `{path}` are substituted per capture.
#[derive(Debug, Clone)]
pub struct RegionCommandCapturer {
    template: Vec<String>,
}

impl RegionCommandCapturer {
    /// Use an explicit command template
    pub fn new(template: Vec<String>) -> Result<Self> {
        if template.is_empty() {
            return Err(StepshotError::config("Capture command is empty"));
        }
        Ok(Self { template })
    }

    /// Platform default: `screencapture` on macOS, ImageMagick `import` elsewhere
    pub fn platform_default() -> Self {
        let template: &[&str] = if cfg!(target_os = "macos") {
            &["screencapture", "-x", "-R{left},{top},{width},{height}", "{path}"]
        } else {
            &[
                "import",
                "-window",
                "root",
                "-crop",
                "{width}x{height}+{left}+{top}",
                "{path}",
            ]
        };
        Self {
            template: template.iter().map(|s| s.to_string()).collect(),
        }
    }

    /// Program and arguments for one capture
    pub fn render(&self, region: CaptureRegion, path: &Path) -> Vec<String> {
        let path = path.to_string_lossy();
        self.template
            .iter()
            .map(|arg| {
                arg.replace("{left}", &region.left.to_string())
                    .replace("{top}", &region.top.to_string())
                    .replace("{width}", &region.width.to_string())
                    .replace("{height}", &region.height.to_string())
                    .replace("{path}", &path)
            })
            .collect()
    }
}

#[async_trait]
impl ScreenCapturer for RegionCommandCapturer {
    async fn capture(&self, region: CaptureRegion, path: &Path) -> Result<()> {
        let argv = self.render(region, path);
        let (program, args) = argv
            .split_first()
            .ok_or_else(|| StepshotError::capture("Capture command is empty"))?;

        let output = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    StepshotError::CommandNotFound(program.clone())
                } else {
                    StepshotError::capture(format!("Failed to run {}: {}", program, e))
                }
            })?;

        if !output.status.success() {
            return Err(StepshotError::capture(format!(
                "{} exited with {}: {}",
                program,
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }

        // Some tools exit 0 without writing when the region is off-screen
        if !tokio::fs::try_exists(path).await.unwrap_or(false) {
            return Err(StepshotError::capture(format!(
                "{} produced no file at {}",
                program,
                path.display()
            )));
        }

        Ok(())
    }

    fn name(&self) -> &str {
        "screen"
    }
}
