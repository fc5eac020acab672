//! Progress events emitted by the orchestrator.
//!
//! Events flow over an `mpsc` channel to exactly one consumer (the dashboard or
//! the plain reporter). For every package, one `PackageStart` precedes exactly
//! one `PackageComplete`, and `Summary` is always the last event of a run.

use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Arc;

use serde::Serialize;

use super::run_log::LineSink;
use crate::plugin::PluginDescriptor;

/// Ordered stage of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    RepoSetup,
    PackageManagerUpdate,
    BatchInstall,
    IndividualInstall,
    Summary,
}

impl Phase {
    /// Get the display name for this phase.
    pub fn display_name(self) -> &'static str {
        match self {
            Self::RepoSetup => "Repository setup",
            Self::PackageManagerUpdate => "Package index update",
            Self::BatchInstall => "Batch install",
            Self::IndividualInstall => "Individual install",
            Self::Summary => "Summary",
        }
    }
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.display_name())
    }
}

/// Severity of a log event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LogLevel {
    Info,
    Success,
    Warning,
    Error,
    Debug,
}

impl LogLevel {
    /// Fixed-width tag used in log lines.
    pub fn tag(self) -> &'static str {
        match self {
            Self::Info => "INFO",
            Self::Success => "OK",
            Self::Warning => "WARN",
            Self::Error => "ERROR",
            Self::Debug => "DEBUG",
        }
    }
}

/// One plugin in the final summary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SummaryEntry {
    pub id: String,
    pub name: String,
    /// Captured error text for failed entries.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl SummaryEntry {
    fn new(plugin: &PluginDescriptor, error: Option<String>) -> Self {
        Self { id: plugin.id.clone(), name: plugin.display_name().to_string(), error }
    }
}

/// Aggregate outcome of a run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct InstallSummary {
    pub successful: Vec<SummaryEntry>,
    pub failed: Vec<SummaryEntry>,
}

impl InstallSummary {
    /// Record a successful plugin.
    pub fn record_success(&mut self, plugin: &PluginDescriptor) {
        self.successful.push(SummaryEntry::new(plugin, None));
    }

    /// Record a failed plugin with its error text.
    pub fn record_failure(&mut self, plugin: &PluginDescriptor, error: impl Into<String>) {
        self.failed.push(SummaryEntry::new(plugin, Some(error.into())));
    }

    /// Whether nothing failed.
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }

    /// Number of plugins accounted for.
    pub fn total(&self) -> usize {
        self.successful.len() + self.failed.len()
    }

    /// Whether `id` appears in either list.
    pub fn contains(&self, id: &str) -> bool {
        self.successful.iter().chain(&self.failed).any(|e| e.id == id)
    }
}

/// Lifecycle event of an installation run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ProgressEvent {
    PhaseStart { phase: Phase, count: usize },
    PhaseComplete { phase: Phase },
    PackageStart { id: String, phase: Phase },
    PackageComplete { id: String, success: bool, error: Option<String> },
    Log { level: LogLevel, package_id: Option<String>, message: String },
    Error { package_id: Option<String>, phase: Phase, message: String },
    Summary(InstallSummary),
}

impl ProgressEvent {
    /// Render this event as one line of the run log.
    pub fn log_line(&self) -> String {
        match self {
            Self::PhaseStart { phase, count } => format!("=== {phase} ({count}) ==="),
            Self::PhaseComplete { phase } => format!("=== {phase} complete ==="),
            Self::PackageStart { id, phase } => format!("[{id}] started ({phase})"),
            Self::PackageComplete { id, success: true, .. } => format!("[{id}] installed"),
            Self::PackageComplete { id, success: false, error } => {
                format!("[{id}] failed: {}", error.as_deref().unwrap_or("unknown error"))
            }
            Self::Log { level, package_id: Some(id), message } => {
                format!("{} [{id}] {message}", level.tag())
            }
            Self::Log { level, package_id: None, message } => format!("{} {message}", level.tag()),
            Self::Error { package_id, phase, message } => match package_id {
                Some(id) => format!("ERROR ({phase}) [{id}] {message}"),
                None => format!("ERROR ({phase}) {message}"),
            },
            Self::Summary(summary) => {
                let mut line = format!(
                    "Summary: {} succeeded, {} failed",
                    summary.successful.len(),
                    summary.failed.len()
                );
                for entry in &summary.failed {
                    line.push_str(&format!(
                        "; {}: {}",
                        entry.name,
                        entry.error.as_deref().unwrap_or("unknown error")
                    ));
                }
                line
            }
        }
    }
}

/// Sending half of the event channel, optionally mirrored into a run log.
#[derive(Clone)]
pub struct EventEmitter {
    tx: Sender<ProgressEvent>,
    sink: Option<Arc<dyn LineSink>>,
}

impl std::fmt::Debug for EventEmitter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventEmitter").field("sink", &self.sink.is_some()).finish()
    }
}

impl EventEmitter {
    /// Wrap an existing sender.
    pub fn new(tx: Sender<ProgressEvent>) -> Self {
        Self { tx, sink: None }
    }

    /// Create an emitter and the receiver its events arrive on.
    pub fn channel() -> (Self, Receiver<ProgressEvent>) {
        let (tx, rx) = mpsc::channel();
        (Self::new(tx), rx)
    }

    /// Mirror every event into `sink`.
    #[must_use]
    pub fn with_sink(mut self, sink: Arc<dyn LineSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    /// Emit an event. A disconnected consumer is not an error.
    pub fn emit(&self, event: ProgressEvent) {
        if let Some(sink) = &self.sink {
            sink.emit_line(&event.log_line());
        }
        if self.tx.send(event).is_err() {
            tracing::debug!("Progress consumer disconnected, dropping event");
        }
    }

    /// Emit a log event.
    pub fn log(&self, level: LogLevel, package_id: Option<&str>, message: impl Into<String>) {
        self.emit(ProgressEvent::Log {
            level,
            package_id: package_id.map(str::to_string),
            message: message.into(),
        });
    }
}
