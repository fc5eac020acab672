//! Input handling for the dashboard.

use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

use super::model::DashboardModel;

/// Lines moved by PgUp/PgDn.
const PAGE: usize = 10;

/// Handle keyboard events.
pub fn handle_events(key: KeyEvent, model: &mut DashboardModel) {
    if key.kind == KeyEventKind::Release {
        return;
    }

    match key.code {
        KeyCode::Char('q') => model.request_quit(),
        KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            model.request_quit();
        }
        KeyCode::Up | KeyCode::Char('k') => model.scroll_up(1),
        KeyCode::Down | KeyCode::Char('j') => model.scroll_down(1),
        KeyCode::PageUp => model.scroll_up(PAGE),
        KeyCode::PageDown => model.scroll_down(PAGE),
        KeyCode::End | KeyCode::Char('G') => model.log_scroll = 0,
        _ => {}
    }
}
