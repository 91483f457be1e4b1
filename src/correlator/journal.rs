//! Correlation journal and debug trail
//!
//! The journal is line-delimited JSON, one `CorrelationRecord` per line. Each
//! append opens, writes, flushes and closes the file, so a crash loses at
//! most the record being written.

use std::fs::{self, OpenOptions};
use std::io::{BufRead, BufReader, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use crate::core::{CorrelationRecord, Result, StepshotError};

/// Append-only structured log of correlation records
#[derive(Debug, Clone)]
pub struct Journal {
    path: PathBuf,
}

impl Journal {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one record as a single JSON line
    pub fn append(&self, record: &CorrelationRecord) -> Result<()> {
        let mut line = serde_json::to_string(record)?;
        line.push('\n');

        ensure_parent(&self.path)?;

        let mut file = OpenOptions::new()
            .create(true)
            .read(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| {
                StepshotError::with_context(format!("Failed to open {}", self.path.display()), e)
            })?;

        // A crash mid-write leaves a tail without newline; start a fresh line
        if !ends_with_newline(&mut file)
            .map_err(|e| StepshotError::journal(format!("{}: {}", self.path.display(), e)))?
        {
            tracing::warn!(path = %self.path.display(), "journal has a truncated tail, starting a new line");
            line.insert(0, '\n');
        }

        // Single write so a record never interleaves with another line
        file.write_all(line.as_bytes())
            .and_then(|()| file.flush())
            .map_err(|e| StepshotError::journal(format!("{}: {}", self.path.display(), e)))?;

        tracing::debug!(step = record.step, path = %self.path.display(), "journal record appended");
        Ok(())
    }

    /// Read every complete record back
    pub fn records(&self) -> Result<Vec<CorrelationRecord>> {
        read_records(&self.path)
    }
}

/// True for an empty file or one whose last byte is a newline
fn ends_with_newline(file: &mut fs::File) -> std::io::Result<bool> {
    if file.metadata()?.len() == 0 {
        return Ok(true);
    }
    let mut last = [0u8; 1];
    file.seek(SeekFrom::End(-1))?;
    file.read_exact(&mut last)?;
    Ok(last[0] == b'\n')
}

/// Read a journal, skipping records cut short by a crash
///
/// A truncated record (JSON ending early) is skipped wherever it sits, since
/// a later session appends after it. Any other malformed line before the
/// last one is an error.
pub fn read_records(path: &Path) -> Result<Vec<CorrelationRecord>> {
    let file = fs::File::open(path)?;
    let lines: Vec<String> = BufReader::new(file).lines().collect::<std::io::Result<_>>()?;
    let last = lines.len().saturating_sub(1);

    let mut records = Vec::with_capacity(lines.len());
    for (index, line) in lines.iter().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        match serde_json::from_str::<CorrelationRecord>(line) {
            Ok(record) => records.push(record),
            Err(e) if index == last || e.is_eof() => {
                tracing::warn!(path = %path.display(), line = index + 1, "ignoring truncated journal line: {}", e);
            }
            Err(e) => {
                return Err(StepshotError::journal(format!(
                    "{} line {}: {}",
                    path.display(),
                    index + 1,
                    e
                )))
            }
        }
    }

    Ok(records)
}

/// Best-effort free-form log of every message the recorder sees
#[derive(Debug, Clone)]
pub struct DebugTrail {
    path: PathBuf,
}

impl DebugTrail {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Record that a message was checked. Failures are only traced.
    pub fn note(&self, message: &str) {
        if let Err(e) = self.write_line(message) {
            tracing::debug!(path = %self.path.display(), "debug trail write failed: {}", e);
        }
    }

    fn write_line(&self, message: &str) -> std::io::Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        file.write_all(format!("DEBUG: Checking message: '{}'\n", message).as_bytes())
    }
}

fn ensure_parent(path: &Path) -> Result<()> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() && !parent.exists() => {
            fs::create_dir_all(parent).map_err(|e| {
                StepshotError::with_context(format!("Failed to create {}", parent.display()), e)
            })
        }
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn record(step: u64, action: &str, goal: &str) -> CorrelationRecord {
        CorrelationRecord {
            step,
            action: action.to_string(),
            next_goal: goal.to_string(),
            screenshot: format!("screenshots/step_{}_20260101_000000.png", step),
        }
    }

    #[test]
    fn test_append_writes_one_line_per_record() {
        let dir = tempdir().unwrap();
        let journal = Journal::new(dir.path().join("nested/log.json"));

        journal.append(&record(1, "Navigating to https://x", "")).unwrap();
        journal.append(&record(2, "", "Next goal: open S3")).unwrap();

        let text = fs::read_to_string(journal.path()).unwrap();
        assert_eq!(text.lines().count(), 2);
        assert!(text.ends_with('\n'));

        let records = journal.records().unwrap();
        assert_eq!(records[0], record(1, "Navigating to https://x", ""));
        assert_eq!(records[1], record(2, "", "Next goal: open S3"));
    }

    #[test]
    fn test_append_after_truncated_tail_keeps_later_records() {
        let dir = tempdir().unwrap();
        let journal = Journal::new(dir.path().join("log.json"));

        journal.append(&record(1, "Clicked", "")).unwrap();
        // Previous session died halfway through a record
        let mut raw = OpenOptions::new().append(true).open(journal.path()).unwrap();
        raw.write_all(br#"{"step": 2, "act"#).unwrap();
        drop(raw);

        journal.append(&record(1, "Navigating to https://x", "")).unwrap();
        journal.append(&record(2, "Clicked", "Next goal: open S3")).unwrap();

        let records = journal.records().unwrap();
        assert_eq!(
            records,
            vec![
                record(1, "Clicked", ""),
                record(1, "Navigating to https://x", ""),
                record(2, "Clicked", "Next goal: open S3"),
            ]
        );
    }

    #[test]
    fn test_message_text_with_quotes_and_newlines_stays_on_one_line() {
        let dir = tempdir().unwrap();
        let journal = Journal::new(dir.path().join("log.json"));
        let awkward = record(1, "Clicked \"Create\"\nthen waited", "");

        journal.append(&awkward).unwrap();

        let text = fs::read_to_string(journal.path()).unwrap();
        assert_eq!(text.lines().count(), 1);
        assert_eq!(journal.records().unwrap(), vec![awkward]);
    }

    #[test]
    fn test_truncated_last_line_is_tolerated() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("log.json");
        let journal = Journal::new(&path);
        journal.append(&record(1, "Clicked", "")).unwrap();

        let mut file = OpenOptions::new().append(true).open(&path).unwrap();
        file.write_all(br#"{"step": 2, "action": "Cli"#).unwrap();

        let records = read_records(&path).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].step, 1);
    }

    #[test]
    fn test_corrupt_middle_line_is_an_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("log.json");
        fs::write(&path, "garbage\n{\"step\":1,\"action\":\"\",\"next_goal\":\"\",\"screenshot\":\"a\"}\n").unwrap();

        assert!(read_records(&path).is_err());
    }

    #[test]
    fn test_append_to_unwritable_location_fails() {
        let dir = tempdir().unwrap();
        // A directory where the file should be makes open() fail
        let path = dir.path().join("log.json");
        fs::create_dir(&path).unwrap();

        assert!(Journal::new(&path).append(&record(1, "Clicked", "")).is_err());
    }

    #[test]
    fn test_debug_trail_format() {
        let dir = tempdir().unwrap();
        let trail = DebugTrail::new(dir.path().join("debug_logs/debug_log.txt"));

        trail.note("unrelated chatter");
        trail.note("Clicked");

        let text = fs::read_to_string(trail.path()).unwrap();
        assert_eq!(
            text,
            "DEBUG: Checking message: 'unrelated chatter'\nDEBUG: Checking message: 'Clicked'\n"
        );
    }

    #[test]
    fn test_debug_trail_failure_is_silent() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("debug_log.txt");
        fs::create_dir(&path).unwrap();

        // Must not panic or report
        DebugTrail::new(&path).note("Clicked");
    }
}
