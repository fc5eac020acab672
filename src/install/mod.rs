//! Installation engine.
//!
//! The orchestrator turns an [`InstallPlan`] into subprocess steps through a
//! [`StepRunner`] and reports progress as [`ProgressEvent`]s over a channel.

mod events;
mod inputs;
mod orchestrator;
mod planner;
mod run_log;
mod runner;
mod uninstall;

pub use events::{EventEmitter, InstallSummary, LogLevel, Phase, ProgressEvent, SummaryEntry};
pub use inputs::{
    collect_inputs, parse_presets, pending_inputs, AcceptDefaults, DefaultProbe, InputError,
    InputValues, Prompter, ShellProbe,
};
pub use orchestrator::Orchestrator;
pub use planner::InstallPlan;
pub use run_log::{list_logs, most_recent_log, prune_logs, LineSink, LogFile, RunLog, LOG_PREFIX};
pub use runner::{LineCallback, StepFailure, StepResult, StepRunner, SystemRunner};
pub use uninstall::{uninstall, UninstallOutcome, UninstallReport};
