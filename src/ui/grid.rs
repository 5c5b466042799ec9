//! Node grid: one card per node, [`GRID_COLUMNS`] cards per row.

use ratatui::{
    layout::{Constraint, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

use crate::app::{App, GRID_COLUMNS};
use crate::data::NodeView;
use crate::supervisor::WorkerStatus;

/// Render the node grid.
pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let nodes = &app.state.nodes;
    if nodes.is_empty() {
        return;
    }

    let rows = nodes.len().div_ceil(GRID_COLUMNS);
    let row_areas = Layout::vertical(vec![Constraint::Ratio(1, rows as u32); rows]).split(area);

    for (row, chunk) in nodes.chunks(GRID_COLUMNS).enumerate() {
        let cells = Layout::horizontal(vec![
            Constraint::Ratio(1, GRID_COLUMNS as u32);
            GRID_COLUMNS
        ])
        .split(row_areas[row]);

        for (col, view) in chunk.iter().enumerate() {
            let position = row * GRID_COLUMNS + col;
            render_card(frame, app, view, position == app.selected, cells[col]);
        }
    }
}

fn render_card(frame: &mut Frame, app: &App, view: &NodeView, selected: bool, area: Rect) {
    let theme = &app.theme;

    let border_style = if selected {
        Style::default().fg(theme.highlight).add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(theme.border)
    };

    let block = Block::default()
        .title(format!(" {} ", view.health.node))
        .borders(Borders::ALL)
        .border_type(theme.border_type)
        .border_style(border_style);

    let toggle = if view.enabled { "[x]" } else { "[ ]" };
    let worker = match view.worker {
        WorkerStatus::Running { pid } => format!("running ({})", pid),
        WorkerStatus::Busy => "busy".to_string(),
        WorkerStatus::Idle if view.enabled => "not running".to_string(),
        WorkerStatus::Idle => "idle".to_string(),
    };

    let lines = vec![
        Line::from(vec![
            Span::styled("● ", theme.state_style(view.health.state)),
            Span::raw(view.health.state.label()),
        ]),
        Line::from(format!(
            "Downtime: {}",
            format_downtime(view.health.downtime_secs)
        )),
        Line::from(vec![
            Span::raw(format!("{} ", toggle)),
            Span::styled(worker, theme.worker_style(view.worker)),
        ]),
    ];

    frame.render_widget(Paragraph::new(lines).block(block), area);
}

/// Format cumulative downtime (e.g., 42 -> "42s", 3725 -> "1h 2m").
fn format_downtime(secs: u64) -> String {
    if secs >= 3600 {
        format!("{}h {}m", secs / 3600, (secs % 3600) / 60)
    } else if secs >= 60 {
        format!("{}m {}s", secs / 60, secs % 60)
    } else {
        format!("{}s", secs)
    }
}
