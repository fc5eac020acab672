//! Dashboard rendering.
//!
//! Checklist pane on the left (30%), log pane on the right, and an error
//! pane along the bottom once anything has failed.

use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Padding, Paragraph, Wrap},
    Frame,
};

use super::model::{DashboardModel, PackageStatus};
use super::theme::Theme;
use crate::install::LogLevel;

const SPINNER: [&str; 8] = ["⣾", "⣽", "⣻", "⢿", "⡿", "⣟", "⣯", "⣷"];

/// Rows given to the error pane.
const ERROR_PANE_HEIGHT: u16 = 5;

/// Draw the dashboard.
pub fn draw(frame: &mut Frame, model: &DashboardModel, theme: &Theme) {
    let area = frame.area();

    let background = Block::default().style(Style::default().bg(theme.background));
    frame.render_widget(background, area);

    let error_height = if model.errors.is_empty() { 0 } else { ERROR_PANE_HEIGHT + 2 };
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(6),               // Checklist + log
            Constraint::Length(error_height), // Errors
            Constraint::Length(1),            // Status bar
        ])
        .split(area);

    let panes = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(30), Constraint::Percentage(70)])
        .split(rows[0]);

    draw_checklist(frame, model, theme, panes[0]);
    draw_log(frame, model, theme, panes[1]);
    if error_height > 0 {
        draw_errors(frame, model, theme, rows[1]);
    }
    draw_status_bar(frame, model, theme, rows[2]);
}

fn pane<'a>(title: &'a str, theme: &Theme) -> Block<'a> {
    Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(theme.border))
        .title(title)
        .title_style(Style::default().fg(theme.accent).add_modifier(Modifier::BOLD))
        .padding(Padding::horizontal(1))
}

fn status_color(status: PackageStatus, theme: &Theme) -> Color {
    match status {
        PackageStatus::Pending => theme.text_muted,
        PackageStatus::Running => theme.primary,
        PackageStatus::Success => theme.success,
        PackageStatus::Error => theme.error,
        PackageStatus::Skipped => theme.warning,
    }
}

fn level_style(level: LogLevel, theme: &Theme) -> (&'static str, Style) {
    match level {
        LogLevel::Success => ("✓", Style::default().fg(theme.success)),
        LogLevel::Error => ("✗", Style::default().fg(theme.error)),
        LogLevel::Warning => ("⚠", Style::default().fg(theme.warning)),
        LogLevel::Info => ("ℹ", Style::default().fg(theme.text)),
        LogLevel::Debug => ("·", Style::default().fg(theme.text_muted)),
    }
}

fn draw_checklist(frame: &mut Frame, model: &DashboardModel, theme: &Theme, area: Rect) {
    let mut lines = Vec::new();

    let phase = model.active_phase.map_or("Waiting", |p| p.display_name());
    lines.push(Line::from(Span::styled(
        format!("Phase: {phase}"),
        Style::default().fg(theme.primary),
    )));
    lines.push(Line::default());

    for row in &model.packages {
        let color = status_color(row.status, theme);
        let icon = if row.status == PackageStatus::Running {
            SPINNER[model.tick % SPINNER.len()]
        } else {
            row.status.icon()
        };

        lines.push(Line::from(vec![
            Span::styled(format!("{icon} "), Style::default().fg(color)),
            Span::styled(row.name.clone(), Style::default().fg(theme.text)),
        ]));

        if let (PackageStatus::Error, Some(error)) = (row.status, &row.error) {
            lines.push(Line::from(Span::styled(
                format!("  ↳ {error}"),
                Style::default().fg(theme.error),
            )));
        } else if let (PackageStatus::Running, Some(progress)) = (row.status, &row.progress) {
            lines.push(Line::from(Span::styled(
                format!("  ↳ {progress}"),
                Style::default().fg(theme.text_muted),
            )));
        }
    }

    if model.complete {
        let rule_width = area.width.saturating_sub(4) as usize;
        lines.push(Line::default());
        lines.push(Line::from(Span::styled(
            "─".repeat(rule_width),
            Style::default().fg(theme.border),
        )));
        lines.push(Line::from(Span::styled(
            format!("✓ Success: {}", model.count(PackageStatus::Success)),
            Style::default().fg(theme.success),
        )));
        lines.push(Line::from(Span::styled(
            format!("✗ Failed:  {}", model.count(PackageStatus::Error)),
            Style::default().fg(theme.error),
        )));
        let skipped = model.count(PackageStatus::Skipped);
        if skipped > 0 {
            lines.push(Line::from(Span::styled(
                format!("⊘ Skipped: {skipped}"),
                Style::default().fg(theme.warning),
            )));
        }
    }

    let checklist =
        Paragraph::new(lines).block(pane(" Packages ", theme)).wrap(Wrap { trim: false });
    frame.render_widget(checklist, area);
}

fn draw_log(frame: &mut Frame, model: &DashboardModel, theme: &Theme, area: Rect) {
    let visible = area.height.saturating_sub(2) as usize;

    let lines: Vec<Line> = if model.logs.is_empty() {
        vec![Line::from(Span::styled(
            "Waiting for installation to begin...",
            Style::default().fg(theme.text_muted),
        ))]
    } else {
        let end = model.logs.len().saturating_sub(model.log_scroll);
        let start = end.saturating_sub(visible);
        model.logs[start..end]
            .iter()
            .map(|entry| {
                let (prefix, style) = level_style(entry.level, theme);
                let mut spans = vec![
                    Span::styled(format!("{} ", entry.timestamp), Style::default().fg(theme.text_muted)),
                    Span::styled(format!("{prefix} "), style),
                ];
                if let Some(id) = &entry.package_id {
                    spans.push(Span::styled(
                        format!("{} → ", model.display_name(id)),
                        Style::default().fg(theme.text).add_modifier(Modifier::BOLD),
                    ));
                }
                spans.push(Span::styled(entry.message.clone(), style));
                Line::from(spans)
            })
            .collect()
    };

    let scroll_info = if model.log_scroll > 0 {
        format!(" ↑{} ", model.log_scroll)
    } else {
        String::new()
    };

    let log = Paragraph::new(lines).block(
        pane(" Installation Log ", theme).title_bottom(Line::from(scroll_info).right_aligned()),
    );
    frame.render_widget(log, area);
}

fn draw_errors(frame: &mut Frame, model: &DashboardModel, theme: &Theme, area: Rect) {
    let title = format!(" ⚠ {} Error(s) ", model.errors.len());

    let lines: Vec<Line> = model
        .errors
        .iter()
        .rev()
        .take(ERROR_PANE_HEIGHT as usize)
        .map(|e| {
            let who = e.package_id.as_deref().map_or("run", |id| model.display_name(id));
            Line::from(vec![
                Span::styled(format!("• {who} "), Style::default().fg(theme.text)),
                Span::styled(format!("[{}] ", e.phase), Style::default().fg(theme.warning)),
                Span::styled(e.message.clone(), Style::default().fg(theme.error)),
            ])
        })
        .collect();

    let errors = Paragraph::new(lines)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_type(BorderType::Rounded)
                .border_style(Style::default().fg(theme.error))
                .title(title)
                .title_style(Style::default().fg(theme.error).add_modifier(Modifier::BOLD)),
        )
        .wrap(Wrap { trim: true });
    frame.render_widget(errors, area);
}

fn draw_status_bar(frame: &mut Frame, model: &DashboardModel, theme: &Theme, area: Rect) {
    let text = if model.complete {
        "Installation complete • q quit • ↑/↓ j/k PgUp/PgDn scroll"
    } else {
        "Installing… • ↑/↓ j/k PgUp/PgDn scroll"
    };
    let status = Paragraph::new(Line::from(Span::styled(text, Style::default().fg(theme.text_muted))))
        .style(Style::default().bg(theme.background));
    frame.render_widget(status, area);
}
