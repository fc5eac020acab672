//! Dashboard state.
//!
//! The model is owned by the presentation thread and changes only through
//! [`DashboardModel::apply`]. Terminal package states are never revisited.

use std::collections::HashMap;

use chrono::Local;

use crate::install::{InstallSummary, LogLevel, Phase, ProgressEvent};
use crate::plugin::PluginDescriptor;

/// Status of one package row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PackageStatus {
    Pending,
    Running,
    Success,
    Error,
    Skipped,
}

impl PackageStatus {
    /// Check if the row has reached a final state.
    pub fn is_finished(self) -> bool {
        matches!(self, Self::Success | Self::Error | Self::Skipped)
    }

    /// Checklist icon.
    pub fn icon(self) -> &'static str {
        match self {
            Self::Pending => "○",
            Self::Running => "◐",
            Self::Success => "✓",
            Self::Error => "✗",
            Self::Skipped => "⊘",
        }
    }
}

/// One plugin in the checklist.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageRow {
    pub id: String,
    pub name: String,
    pub status: PackageStatus,
    pub error: Option<String>,
    /// Latest output line while running.
    pub progress: Option<String>,
}

/// One line of the log pane.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEntry {
    pub timestamp: String,
    pub level: LogLevel,
    pub package_id: Option<String>,
    pub message: String,
}

/// One entry of the error pane.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorEntry {
    pub package_id: Option<String>,
    pub phase: Phase,
    pub message: String,
}

/// Everything the dashboard renders.
#[derive(Debug, Default)]
pub struct DashboardModel {
    pub packages: Vec<PackageRow>,
    index: HashMap<String, usize>,
    pub logs: Vec<LogEntry>,
    pub errors: Vec<ErrorEntry>,
    pub active_phase: Option<Phase>,
    pub summary: Option<InstallSummary>,
    pub complete: bool,
    /// Lines scrolled up from the bottom of the log; 0 follows new output.
    pub log_scroll: usize,
    pub should_quit: bool,
    pub tick: usize,
}

impl DashboardModel {
    /// Create a model with one pending row per plugin.
    pub fn new<'a>(plugins: impl IntoIterator<Item = &'a PluginDescriptor>) -> Self {
        let mut model = Self::default();
        for plugin in plugins {
            model.add_row(&plugin.id, plugin.display_name());
        }
        model
    }

    fn add_row(&mut self, id: &str, name: &str) -> usize {
        let idx = self.packages.len();
        self.packages.push(PackageRow {
            id: id.to_string(),
            name: name.to_string(),
            status: PackageStatus::Pending,
            error: None,
            progress: None,
        });
        self.index.insert(id.to_string(), idx);
        idx
    }

    fn row_mut(&mut self, id: &str) -> &mut PackageRow {
        let idx = match self.index.get(id) {
            Some(&idx) => idx,
            None => self.add_row(id, id),
        };
        &mut self.packages[idx]
    }

    /// Look up a row by plugin id.
    pub fn row(&self, id: &str) -> Option<&PackageRow> {
        self.index.get(id).map(|&idx| &self.packages[idx])
    }

    /// Display name for a plugin id.
    pub fn display_name<'a>(&'a self, id: &'a str) -> &'a str {
        self.row(id).map_or(id, |row| row.name.as_str())
    }

    /// Fold one event into the model.
    pub fn apply(&mut self, event: ProgressEvent) {
        match event {
            ProgressEvent::PhaseStart { phase, count } => {
                self.active_phase = Some(phase);
                self.push_log(LogLevel::Info, None, format!("{phase} ({count})"));
            }
            ProgressEvent::PhaseComplete { phase } => {
                self.push_log(LogLevel::Debug, None, format!("{phase} complete"));
            }
            ProgressEvent::PackageStart { id, .. } => {
                let row = self.row_mut(&id);
                if row.status == PackageStatus::Pending {
                    row.status = PackageStatus::Running;
                }
            }
            ProgressEvent::PackageComplete { id, success, error } => {
                let row = self.row_mut(&id);
                if !row.status.is_finished() {
                    row.progress = None;
                    if success {
                        row.status = PackageStatus::Success;
                    } else {
                        row.status = PackageStatus::Error;
                        row.error = error;
                    }
                }
                let (level, text) = if success {
                    (LogLevel::Success, "installed".to_string())
                } else {
                    (LogLevel::Error, "failed".to_string())
                };
                self.push_log(level, Some(id), text);
            }
            ProgressEvent::Log { level, package_id, message } => {
                if let Some(id) = &package_id {
                    let row = self.row_mut(id);
                    if row.status == PackageStatus::Running {
                        row.progress = Some(message.clone());
                    }
                }
                self.push_log(level, package_id, message);
            }
            ProgressEvent::Error { package_id, phase, message } => {
                self.push_log(LogLevel::Error, package_id.clone(), message.clone());
                self.errors.push(ErrorEntry { package_id, phase, message });
            }
            ProgressEvent::Summary(summary) => self.finish(Some(summary)),
        }
    }

    /// The event stream ended without a summary.
    pub fn disconnected(&mut self) {
        if !self.complete {
            self.push_log(LogLevel::Warning, None, "Installer stopped without a summary".into());
            self.finish(None);
        }
    }

    fn finish(&mut self, summary: Option<InstallSummary>) {
        if let Some(summary) = &summary {
            for entry in &summary.failed {
                let row = self.row_mut(&entry.id);
                if !row.status.is_finished() {
                    row.status = PackageStatus::Error;
                    row.error = entry.error.clone();
                }
            }
        }
        for row in &mut self.packages {
            if !row.status.is_finished() {
                row.status = PackageStatus::Skipped;
                row.progress = None;
            }
        }
        self.active_phase = Some(Phase::Summary);
        self.summary = summary;
        self.complete = true;
    }

    fn push_log(&mut self, level: LogLevel, package_id: Option<String>, message: String) {
        let timestamp = Local::now().format("%H:%M:%S").to_string();
        self.logs.push(LogEntry { timestamp, level, package_id, message });
        if self.log_scroll > 0 {
            // Keep the viewport anchored while the user is reading history.
            self.log_scroll += 1;
        }
    }

    /// Count rows with `status`.
    pub fn count(&self, status: PackageStatus) -> usize {
        self.packages.iter().filter(|p| p.status == status).count()
    }

    /// Scroll the log towards older lines.
    pub fn scroll_up(&mut self, lines: usize) {
        self.log_scroll = (self.log_scroll + lines).min(self.logs.len().saturating_sub(1));
    }

    /// Scroll the log towards newer lines.
    pub fn scroll_down(&mut self, lines: usize) {
        self.log_scroll = self.log_scroll.saturating_sub(lines);
    }

    /// Quit, allowed only once the run is complete.
    pub fn request_quit(&mut self) {
        if self.complete {
            self.should_quit = true;
        }
    }

    /// Advance the spinner.
    pub fn on_tick(&mut self) {
        self.tick = self.tick.wrapping_add(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::install::SummaryEntry;
    use crate::plugin::descriptor_from_header;

    fn model(ids: &[&str]) -> DashboardModel {
        let plugins: Vec<_> = ids
            .iter()
            .map(|id| descriptor_from_header(id, &format!("# NAME: {id}-name\n")).unwrap())
            .collect();
        DashboardModel::new(&plugins)
    }

    fn start(id: &str) -> ProgressEvent {
        ProgressEvent::PackageStart { id: id.to_string(), phase: Phase::BatchInstall }
    }

    fn complete(id: &str, success: bool) -> ProgressEvent {
        ProgressEvent::PackageComplete {
            id: id.to_string(),
            success,
            error: (!success).then(|| "boom".to_string()),
        }
    }

    #[test]
    fn test_lifecycle() {
        let mut m = model(&["git"]);
        assert_eq!(m.row("git").unwrap().status, PackageStatus::Pending);

        m.apply(start("git"));
        assert_eq!(m.row("git").unwrap().status, PackageStatus::Running);

        m.apply(complete("git", false));
        let row = m.row("git").unwrap();
        assert_eq!(row.status, PackageStatus::Error);
        assert_eq!(row.error.as_deref(), Some("boom"));
    }

    #[test]
    fn test_terminal_state_not_revisited() {
        let mut m = model(&["git"]);
        m.apply(start("git"));
        m.apply(complete("git", true));
        m.apply(start("git"));
        m.apply(complete("git", false));
        assert_eq!(m.row("git").unwrap().status, PackageStatus::Success);
    }

    #[test]
    fn test_log_updates_running_progress() {
        let mut m = model(&["x"]);
        m.apply(start("x"));
        m.apply(ProgressEvent::Log {
            level: LogLevel::Info,
            package_id: Some("x".into()),
            message: "Downloading".into(),
        });
        assert_eq!(m.row("x").unwrap().progress.as_deref(), Some("Downloading"));
        assert_eq!(m.logs.last().unwrap().message, "Downloading");
    }

    #[test]
    fn test_error_event_populates_error_pane() {
        let mut m = model(&["x"]);
        m.apply(ProgressEvent::Error {
            package_id: Some("x".into()),
            phase: Phase::IndividualInstall,
            message: "exit 1".into(),
        });
        assert_eq!(m.errors.len(), 1);
        assert_eq!(m.display_name("x"), "x-name");
    }

    #[test]
    fn test_summary_marks_unreported_rows() {
        let mut m = model(&["a", "b", "x"]);
        m.apply(start("a"));
        m.apply(complete("a", false));
        m.apply(ProgressEvent::Summary(InstallSummary {
            successful: Vec::new(),
            failed: vec![
                SummaryEntry { id: "a".into(), name: "a".into(), error: Some("boom".into()) },
                SummaryEntry { id: "b".into(), name: "b".into(), error: Some("aborted".into()) },
            ],
        }));

        assert!(m.complete);
        assert_eq!(m.row("b").unwrap().status, PackageStatus::Error);
        assert_eq!(m.row("b").unwrap().error.as_deref(), Some("aborted"));
        assert_eq!(m.row("x").unwrap().status, PackageStatus::Skipped);
    }

    #[test]
    fn test_quit_only_when_complete() {
        let mut m = model(&["a"]);
        m.request_quit();
        assert!(!m.should_quit);

        m.disconnected();
        assert!(m.complete);
        m.request_quit();
        assert!(m.should_quit);
    }

    #[test]
    fn test_unknown_package_gets_row() {
        let mut m = model(&[]);
        m.apply(start("ghost"));
        assert_eq!(m.packages.len(), 1);
        assert_eq!(m.display_name("ghost"), "ghost");
    }

    #[test]
    fn test_scroll_bounds() {
        let mut m = model(&[]);
        for i in 0..5 {
            m.apply(ProgressEvent::Log {
                level: LogLevel::Info,
                package_id: None,
                message: format!("line {i}"),
            });
        }
        m.scroll_up(100);
        assert_eq!(m.log_scroll, 4);
        m.scroll_down(2);
        assert_eq!(m.log_scroll, 2);
        m.scroll_down(10);
        assert_eq!(m.log_scroll, 0);
    }
}
