//! Common UI components shared across views.
//!
//! This module contains the header bar, status bar, and help overlay.

use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
    Frame,
};

use crate::app::App;
use crate::data::NodeState;

/// Render the header bar with the cluster overview.
///
/// Displays: overall indicator, online count, running local workers.
pub fn render_header(frame: &mut Frame, app: &App, area: Rect) {
    let total = app.state.nodes.len();
    let online = app
        .state
        .nodes
        .iter()
        .filter(|n| n.health.state == NodeState::Online)
        .count();
    let offline = total - online;
    let workers = app.state.running_workers();

    let overall = if offline == 0 && total > 0 {
        NodeState::Online
    } else {
        NodeState::Offline
    };

    let mode = if app.process_control() {
        Span::raw(format!("{} workers", workers))
    } else {
        Span::styled("display only", Style::default().add_modifier(Modifier::DIM))
    };

    let line = Line::from(vec![
        Span::styled(" ● ", app.theme.state_style(overall)),
        Span::styled("NODEWATCH ", Style::default().add_modifier(Modifier::BOLD)),
        Span::raw("│ "),
        Span::styled(format!("{}", online), Style::default().fg(app.theme.online)),
        Span::raw(" online "),
        if offline > 0 {
            Span::styled(
                format!("{}", offline),
                Style::default().fg(app.theme.offline).add_modifier(Modifier::BOLD),
            )
        } else {
            Span::styled("0", Style::default().add_modifier(Modifier::DIM))
        },
        Span::raw(" offline │ "),
        mode,
    ]);

    frame.render_widget(Paragraph::new(line), area);
}

/// Render the status bar at the bottom.
///
/// Shows: source, time since last update, available controls.
/// Temporary status messages take precedence.
pub fn render_status_bar(frame: &mut Frame, app: &App, area: Rect) {
    if let Some(msg) = app.get_status_message() {
        let paragraph =
            Paragraph::new(format!(" {} ", msg)).style(Style::default().fg(app.theme.highlight));
        frame.render_widget(paragraph, area);
        return;
    }

    let controls = if app.process_control() {
        "←→↑↓:select Space:toggle e:export ?:help q:quit"
    } else {
        "←→↑↓:select e:export ?:help q:quit"
    };

    let status = match app.last_updated {
        Some(updated) => format!(
            " {} | Updated {:.1}s ago | {}",
            app.source_description(),
            updated.elapsed().as_secs_f64(),
            controls,
        ),
        None => format!(" {} | Waiting for status... | {}", app.source_description(), controls),
    };

    let paragraph = Paragraph::new(status).style(Style::default().add_modifier(Modifier::DIM));
    frame.render_widget(paragraph, area);
}

/// Render the help overlay with keyboard shortcuts.
///
/// Displayed as a centered modal on top of the grid.
pub fn render_help(frame: &mut Frame, app: &App, area: Rect) {
    let help_text = vec![
        Line::from(vec![Span::styled("Keyboard Shortcuts", app.theme.header)]),
        Line::from(""),
        Line::from(vec![Span::styled(
            " Navigation",
            Style::default().add_modifier(Modifier::BOLD),
        )]),
        Line::from("  ←/→ h/l     Previous/next node"),
        Line::from("  ↑/↓ k/j     Row above/below"),
        Line::from("  Home/End    First/last node"),
        Line::from(""),
        Line::from(vec![Span::styled(
            " Workers",
            Style::default().add_modifier(Modifier::BOLD),
        )]),
        Line::from("  Space/Enter Start or stop worker"),
        Line::from(""),
        Line::from(vec![Span::styled(
            " General",
            Style::default().add_modifier(Modifier::BOLD),
        )]),
        Line::from("  e         Export to JSON"),
        Line::from("  q         Quit"),
        Line::from(""),
        Line::from(vec![Span::styled(
            "Press any key to close",
            Style::default().add_modifier(Modifier::DIM),
        )]),
    ];

    let block = Block::default()
        .title(" Help ")
        .borders(Borders::ALL)
        .border_type(app.theme.border_type)
        .border_style(Style::default().fg(app.theme.highlight));

    let paragraph = Paragraph::new(help_text).block(block);

    let help_width = 42u16.min(area.width.saturating_sub(4));
    let help_height = 19u16.min(area.height.saturating_sub(2));
    let x = area.x + (area.width.saturating_sub(help_width)) / 2;
    let y = area.y + (area.height.saturating_sub(help_height)) / 2;
    let help_area = Rect::new(x, y, help_width, help_height);

    frame.render_widget(Clear, help_area);
    frame.render_widget(paragraph, help_area);
}
