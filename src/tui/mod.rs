//! Terminal User Interface module.
//!
//! The installation dashboard, rendered with ratatui, and a plain line
//! reporter for runs without an interactive terminal.

mod app;
mod input;
mod model;
pub mod plain;
mod theme;
mod ui;

pub use app::run_dashboard;
pub use input::handle_events;
pub use model::{DashboardModel, ErrorEntry, LogEntry, PackageRow, PackageStatus};
pub use theme::{parse_hex_color, Theme};
pub use ui::draw;
