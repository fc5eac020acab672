//! Per-run installation log.
//!
//! Every progress event of a run is appended to a text file as
//! `[HH:MM:SS.mmm] <event>` so the run can be reviewed after the dashboard
//! closes. The orchestrator only sees the [`LineSink`] capability.

use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use chrono::Local;
use parking_lot::Mutex;

/// File name prefix of run logs.
pub const LOG_PREFIX: &str = "itamae-install-";

/// Something that accepts one log line at a time.
pub trait LineSink: Send + Sync {
    fn emit_line(&self, line: &str);
}

/// Open run log file.
#[derive(Debug)]
pub struct RunLog {
    path: PathBuf,
    file: Mutex<File>,
}

impl RunLog {
    /// Create a new log in `dir` and write the header.
    pub fn create(dir: &Path) -> std::io::Result<Self> {
        fs::create_dir_all(dir)?;

        let now = Local::now();
        let path = dir.join(format!("{LOG_PREFIX}{}.log", now.format("%Y-%m-%d_%H-%M-%S")));
        let mut file = OpenOptions::new().create(true).append(true).open(&path)?;

        writeln!(file, "=== Itamae Installation Log ===")?;
        writeln!(file, "Started: {}", now.format("%Y-%m-%d %H:%M:%S"))?;
        writeln!(file, "Log file: {}", path.display())?;
        writeln!(file)?;
        file.flush()?;

        tracing::debug!(path = %path.display(), "Opened run log");
        Ok(Self { path, file: Mutex::new(file) })
    }

    /// Path of the log file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Write the footer and return the log path.
    pub fn close(self) -> std::io::Result<PathBuf> {
        let mut file = self.file.into_inner();
        writeln!(file)?;
        writeln!(file, "=== Finished: {} ===", Local::now().format("%Y-%m-%d %H:%M:%S"))?;
        file.sync_all()?;
        Ok(self.path)
    }
}

impl LineSink for RunLog {
    fn emit_line(&self, line: &str) {
        let stamp = Local::now().format("%H:%M:%S%.3f");
        let mut file = self.file.lock();
        let written = writeln!(file, "[{stamp}] {line}").and_then(|()| file.flush());
        if let Err(e) = written {
            tracing::debug!(error = %e, "Failed to write run log line");
        }
    }
}

/// A run log found on disk.
#[derive(Debug, Clone)]
pub struct LogFile {
    pub path: PathBuf,
    pub modified: SystemTime,
    pub size: u64,
}

/// Run logs in `dir`, newest first. A missing directory has no logs.
pub fn list_logs(dir: &Path) -> std::io::Result<Vec<LogFile>> {
    let read_dir = match fs::read_dir(dir) {
        Ok(rd) => rd,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(e),
    };

    let mut logs = Vec::new();
    for entry in read_dir {
        let entry = entry?;
        let name = entry.file_name();
        let name = name.to_string_lossy();
        if !name.starts_with(LOG_PREFIX) || !name.ends_with(".log") {
            continue;
        }
        let meta = entry.metadata()?;
        if !meta.is_file() {
            continue;
        }
        logs.push(LogFile {
            path: entry.path(),
            modified: meta.modified().unwrap_or(SystemTime::UNIX_EPOCH),
            size: meta.len(),
        });
    }

    logs.sort_by(|a, b| b.modified.cmp(&a.modified).then_with(|| b.path.cmp(&a.path)));
    Ok(logs)
}

/// Newest run log in `dir`.
pub fn most_recent_log(dir: &Path) -> std::io::Result<Option<PathBuf>> {
    Ok(list_logs(dir)?.into_iter().next().map(|log| log.path))
}

/// Delete all but the newest `keep` logs. Returns the removed paths.
pub fn prune_logs(dir: &Path, keep: usize) -> std::io::Result<Vec<PathBuf>> {
    let mut removed = Vec::new();
    for log in list_logs(dir)?.into_iter().skip(keep) {
        fs::remove_file(&log.path)?;
        removed.push(log.path);
    }
    Ok(removed)
}
