//! Line-oriented progress output for non-interactive terminals.

use std::io::Write;
use std::sync::mpsc::Receiver;

use chrono::Local;

use crate::install::{InstallSummary, LogLevel, ProgressEvent};

/// Print every event as one line until the channel closes.
///
/// Returns the run summary if one arrived. Debug-level log events are
/// printed only when `verbose` is set.
pub fn report<W: Write>(
    events: &Receiver<ProgressEvent>,
    out: &mut W,
    verbose: bool,
) -> std::io::Result<Option<InstallSummary>> {
    let mut summary = None;

    for event in events {
        if !verbose && matches!(event, ProgressEvent::Log { level: LogLevel::Debug, .. }) {
            continue;
        }
        writeln!(out, "[{}] {}", Local::now().format("%H:%M:%S"), event.log_line())?;
        out.flush()?;
        if let ProgressEvent::Summary(s) = event {
            summary = Some(s);
        }
    }

    Ok(summary)
}
