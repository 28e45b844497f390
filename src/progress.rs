// 📝 Progress log - append-only `<timestamp> : <message>` trail
//
// The file is opened per call (append + create) and closed on return,
// so a crashed run still leaves every line written before the failure.

use crate::error::{EtlError, Result};
use chrono::{DateTime, Local};
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Year-MonthAbbrev-Day-Hour:Minute:Second, e.g. `2024-Mar-09-14:02:11`
pub const TIMESTAMP_FORMAT: &str = "%Y-%h-%d-%H:%M:%S";

#[derive(Debug, Clone)]
pub struct ProgressLog {
    path: PathBuf,
}

impl ProgressLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        ProgressLog { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one stamped line. Write failures are returned to the caller.
    pub fn log(&self, message: &str) -> Result<()> {
        self.log_at(Local::now(), message)
    }

    pub fn log_at(&self, now: DateTime<Local>, message: &str) -> Result<()> {
        tracing::info!(target: "banks_etl::progress", "{}", message);

        let line = format_line(now, message);
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| EtlError::io(&self.path, e))?;

        file.write_all(line.as_bytes())
            .map_err(|e| EtlError::io(&self.path, e))
    }
}

pub fn format_line(now: DateTime<Local>, message: &str) -> String {
    format!("{} : {}\n", now.format(TIMESTAMP_FORMAT), message)
}
