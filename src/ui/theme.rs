//! Theme configuration for the TUI.
//!
//! Supports light and dark themes with automatic terminal detection.

use ratatui::style::{Color, Modifier, Style};
use ratatui::widgets::block::BorderType;

use crate::data::NodeState;
use crate::supervisor::WorkerStatus;

/// Color and style theme for the TUI.
///
/// Use [`Theme::auto_detect()`] for automatic theme selection based on
/// terminal background, or [`Theme::dark()`]/[`Theme::light()`] explicitly.
#[derive(Debug, Clone)]
pub struct Theme {
    /// Accent color for highlights and the selected card.
    pub highlight: Color,
    /// LED color for online nodes.
    pub online: Color,
    /// LED color for offline nodes.
    pub offline: Color,
    /// Color for a worker transition in progress.
    pub busy: Color,
    /// Color for borders of unselected cards.
    pub border: Color,
    /// Style for the header bar title.
    pub header: Style,
    /// Border style (rounded, plain, etc.).
    pub border_type: BorderType,
}

impl Theme {
    /// Create a dark theme suitable for dark terminal backgrounds.
    pub fn dark() -> Self {
        Self {
            highlight: Color::Cyan,
            online: Color::Green,
            offline: Color::Red,
            busy: Color::Yellow,
            border: Color::Gray,
            header: Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
            border_type: BorderType::Rounded,
        }
    }

    /// Create a light theme suitable for light terminal backgrounds.
    pub fn light() -> Self {
        Self {
            highlight: Color::Blue,
            online: Color::Green,
            offline: Color::Red,
            busy: Color::Magenta,
            border: Color::DarkGray,
            header: Style::default().fg(Color::Blue).add_modifier(Modifier::BOLD),
            border_type: BorderType::Rounded,
        }
    }

    /// Auto-detect based on terminal background
    pub fn auto_detect() -> Self {
        match terminal_light::luma() {
            Ok(luma) if luma > 0.5 => Self::light(),
            _ => Self::dark(),
        }
    }

    /// LED style for a node state.
    pub fn state_style(&self, state: NodeState) -> Style {
        match state {
            NodeState::Online => Style::default().fg(self.online),
            NodeState::Offline => Style::default().fg(self.offline).add_modifier(Modifier::BOLD),
        }
    }

    /// Style for the worker line of a card.
    pub fn worker_style(&self, worker: WorkerStatus) -> Style {
        match worker {
            WorkerStatus::Running { .. } => Style::default().fg(self.online),
            WorkerStatus::Busy => Style::default().fg(self.busy),
            WorkerStatus::Idle => Style::default().add_modifier(Modifier::DIM),
        }
    }
}
