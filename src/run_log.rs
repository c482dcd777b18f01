//! Run logs: the per-run record of what the organizer did.
//!
//! A [`RunLog`] is passed explicitly to the organizer. [`FileRunLog`] appends
//! timestamped lines to a file; [`MemoryRunLog`] keeps them for inspection and
//! [`NullRunLog`] drops them.

use crate::file_organizer::Outcome;
use chrono::{DateTime, Local};
use std::fs::{self, File, OpenOptions};
use std::io::{self, LineWriter, Write};
use std::path::{Path, PathBuf};
use tracing::Level;

/// Default name of the log directory inside the target directory.
pub const LOG_DIR_NAME: &str = "logs";

/// Receives one message per organizer action.
pub trait RunLog {
    fn record(&mut self, level: Level, message: &str);

    fn info(&mut self, message: &str) {
        self.record(Level::INFO, message);
    }

    fn warn(&mut self, message: &str) {
        self.record(Level::WARN, message);
    }

    fn error(&mut self, message: &str) {
        self.record(Level::ERROR, message);
    }

    /// Records the result of organizing one file.
    fn outcome(&mut self, outcome: &Outcome) {
        self.record(outcome.level(), &outcome.to_string());
    }
}

/// Formats a log line as `YYYY-MM-DD HH:MM:SS - LEVEL - message`.
pub fn format_line(timestamp: &DateTime<Local>, level: Level, message: &str) -> String {
    format!(
        "{} - {} - {}",
        timestamp.format("%Y-%m-%d %H:%M:%S"),
        level_name(level),
        message
    )
}

/// Level names as written to the run log file.
fn level_name(level: Level) -> &'static str {
    match level {
        Level::ERROR => "ERROR",
        Level::WARN => "WARNING",
        Level::INFO => "INFO",
        Level::DEBUG => "DEBUG",
        Level::TRACE => "TRACE",
    }
}

/// Appends log lines to `<dir>/extsort_<YYYYMMDD_HHMMSS>.log`.
///
/// Write failures never reach the caller: the first one is reported through
/// `tracing` and the log is switched off for the rest of the run.
#[derive(Debug)]
pub struct FileRunLog {
    path: PathBuf,
    writer: Option<LineWriter<File>>,
}

impl FileRunLog {
    /// Creates `dir` if needed and opens a fresh log file inside it.
    ///
    /// # Arguments
    ///
    /// * `dir` - Directory that receives the log file; missing parents are created
    ///
    /// # Returns
    ///
    /// The open log, or the I/O error from creating the directory or the file.
    pub fn create(dir: &Path) -> io::Result<Self> {
        fs::create_dir_all(dir)?;
        let file_name = format!("extsort_{}.log", Local::now().format("%Y%m%d_%H%M%S"));
        let path = dir.join(file_name);
        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        Ok(Self {
            path,
            writer: Some(LineWriter::new(file)),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl RunLog for FileRunLog {
    fn record(&mut self, level: Level, message: &str) {
        let Some(writer) = self.writer.as_mut() else {
            return;
        };
        let line = format_line(&Local::now(), level, message);
        if let Err(e) = writeln!(writer, "{}", line) {
            tracing::warn!(path = %self.path.display(), error = %e, "run log disabled after write failure");
            self.writer = None;
        }
    }
}

/// Keeps every record in memory.
#[derive(Debug, Default)]
pub struct MemoryRunLog {
    pub records: Vec<(Level, String)>,
}

impl MemoryRunLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Messages recorded at `level`, in order.
    pub fn messages_at(&self, level: Level) -> Vec<&str> {
        self.records
            .iter()
            .filter(|(l, _)| *l == level)
            .map(|(_, m)| m.as_str())
            .collect()
    }
}

impl RunLog for MemoryRunLog {
    fn record(&mut self, level: Level, message: &str) {
        self.records.push((level, message.to_string()));
    }
}

/// Discards every record.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullRunLog;

impl RunLog for NullRunLog {
    fn record(&mut self, _level: Level, _message: &str) {}
}
