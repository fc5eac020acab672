//! Dashboard runner.
//!
//! Handles the main event loop and terminal setup/teardown. Progress events
//! are drained from the orchestrator's channel on every tick.

use std::io::{self, stdout};
use std::sync::mpsc::{Receiver, TryRecvError};
use std::time::Duration;

use anyhow::Result;
use crossterm::{
    event::{self, Event},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};

use super::model::DashboardModel;
use super::theme::Theme;
use super::{draw, handle_events};
use crate::install::ProgressEvent;

/// Run the dashboard until the run completes and the user quits.
///
/// Returns the final model so the caller can print a summary after the
/// terminal is restored.
pub fn run_dashboard(
    mut model: DashboardModel,
    events: &Receiver<ProgressEvent>,
    theme: &Theme,
    tick_rate: Duration,
) -> Result<DashboardModel> {
    setup_terminal()?;

    let backend = CrosstermBackend::new(stdout());
    let mut terminal = match Terminal::new(backend) {
        Ok(terminal) => terminal,
        Err(e) => {
            restore_terminal()?;
            return Err(e.into());
        }
    };

    let result = run_main_loop(&mut terminal, &mut model, events, theme, tick_rate);

    restore_terminal()?;
    result.map(|()| model)
}

/// Setup the terminal for TUI mode.
fn setup_terminal() -> Result<()> {
    enable_raw_mode()?;
    execute!(stdout(), EnterAlternateScreen)?;

    // Setup panic hook to restore terminal on panic
    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        let _ = restore_terminal();
        original_hook(panic_info);
    }));

    Ok(())
}

/// Restore the terminal to normal mode.
fn restore_terminal() -> Result<()> {
    disable_raw_mode()?;
    execute!(stdout(), LeaveAlternateScreen)?;
    Ok(())
}

/// Fold every queued event into the model.
fn drain_events(model: &mut DashboardModel, events: &Receiver<ProgressEvent>) {
    loop {
        match events.try_recv() {
            Ok(event) => model.apply(event),
            Err(TryRecvError::Empty) => break,
            Err(TryRecvError::Disconnected) => {
                model.disconnected();
                break;
            }
        }
    }
}

/// Main event loop.
fn run_main_loop(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    model: &mut DashboardModel,
    events: &Receiver<ProgressEvent>,
    theme: &Theme,
    tick_rate: Duration,
) -> Result<()> {
    loop {
        drain_events(model, events);

        terminal.draw(|frame| draw(frame, model, theme))?;

        if event::poll(tick_rate)? {
            if let Event::Key(key) = event::read()? {
                handle_events(key, model);
            }
        }

        if model.should_quit {
            break;
        }

        model.on_tick();
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::install::{InstallSummary, Phase};
    use std::sync::mpsc;

    #[test]
    fn test_drain_applies_queued_events() {
        let (tx, rx) = mpsc::channel();
        tx.send(ProgressEvent::PhaseStart { phase: Phase::BatchInstall, count: 0 }).unwrap();
        tx.send(ProgressEvent::Summary(InstallSummary::default())).unwrap();

        let mut model = DashboardModel::default();
        drain_events(&mut model, &rx);
        assert!(model.complete);
        assert!(model.summary.is_some());
    }

    #[test]
    fn test_drain_marks_disconnect_complete() {
        let (tx, rx) = mpsc::channel::<ProgressEvent>();
        drop(tx);

        let mut model = DashboardModel::default();
        drain_events(&mut model, &rx);
        assert!(model.complete);
        assert!(model.summary.is_none());
    }

    #[test]
    fn test_drain_waits_while_sender_alive() {
        let (_tx, rx) = mpsc::channel::<ProgressEvent>();
        let mut model = DashboardModel::default();
        drain_events(&mut model, &rx);
        assert!(!model.complete);
    }
}
