//! Application state and navigation logic.

use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::Result;
use tokio::sync::{mpsc, watch};

use crate::control::{ControlReport, IntentSender};
use crate::data::{DashboardState, HealthBoard};
use crate::node::{NodeId, NodeRoster};
use crate::supervisor::ProcessSupervisor;
use crate::ui::Theme;

/// Number of node cards per grid row.
pub const GRID_COLUMNS: usize = 5;

/// How long a status message stays visible.
const STATUS_MESSAGE_TTL: Duration = Duration::from_secs(3);

/// Process control wiring handed to the app.
pub struct Control {
    pub supervisor: Arc<ProcessSupervisor>,
    pub intents: IntentSender,
    pub reports: mpsc::UnboundedReceiver<ControlReport>,
    /// False for a display-only dashboard.
    pub enabled: bool,
}

/// Main application state.
pub struct App {
    pub running: bool,
    pub show_help: bool,
    pub selected: usize,

    pub roster: NodeRoster,
    board: watch::Receiver<HealthBoard>,
    source_description: String,
    control: Option<Control>,

    /// Operator toggle per node, in roster order.
    pub enabled: Vec<bool>,
    /// Projection rebuilt by [`App::refresh`].
    pub state: DashboardState,
    pub last_updated: Option<Instant>,

    pub theme: Theme,
    pub status_message: Option<(String, Instant)>,
}

impl App {
    /// Create an app reading health from `board`.
    pub fn new(
        roster: NodeRoster,
        board: watch::Receiver<HealthBoard>,
        source_description: impl Into<String>,
    ) -> Self {
        Self {
            running: true,
            show_help: false,
            selected: 0,
            roster,
            board,
            source_description: source_description.into(),
            control: None,
            enabled: vec![false; roster.len()],
            state: DashboardState::default(),
            last_updated: None,
            theme: Theme::dark(),
            status_message: None,
        }
    }

    /// Attach process control.
    pub fn with_control(mut self, control: Control) -> Self {
        self.control = Some(control);
        self
    }

    pub fn with_theme(mut self, theme: Theme) -> Self {
        self.theme = theme;
        self
    }

    /// Returns a description of the status source.
    pub fn source_description(&self) -> &str {
        &self.source_description
    }

    /// Whether toggles start and stop workers.
    pub fn process_control(&self) -> bool {
        self.control.as_ref().is_some_and(|c| c.enabled)
    }

    /// Set a temporary status message that will be shown for a few seconds.
    pub fn set_status_message(&mut self, message: String) {
        self.status_message = Some((message, Instant::now()));
    }

    /// Get the current status message if it hasn't expired.
    pub fn get_status_message(&self) -> Option<&str> {
        if let Some((msg, time)) = &self.status_message {
            if time.elapsed() < STATUS_MESSAGE_TTL {
                return Some(msg);
            }
        }
        None
    }

    /// Pull the latest health, control reports and worker state.
    pub fn refresh(&mut self) {
        let board = self.board.borrow().clone();
        self.last_updated = board.last_updated;

        let mut messages = Vec::new();
        if let Some(control) = self.control.as_mut() {
            while let Ok(report) = control.reports.try_recv() {
                messages.push(report.to_string());
            }
        }
        if let Some(message) = messages.pop() {
            self.set_status_message(message);
        }

        let supervisor = self.control.as_ref().map(|c| c.supervisor.as_ref());
        self.state = DashboardState::build(&board, &self.enabled, supervisor);
    }

    /// The node under the cursor.
    pub fn selected_node(&self) -> Option<NodeId> {
        self.roster.get(self.selected)
    }

    /// Flip the selected node's toggle and publish the intent.
    pub fn toggle_selected(&mut self) {
        let Some(node) = self.selected_node() else {
            return;
        };
        if !self.process_control() {
            self.set_status_message("Process control is disabled".to_string());
            return;
        }

        let desired = !self.enabled[self.selected];
        let sent = self
            .control
            .as_ref()
            .is_some_and(|c| c.intents.request(node, desired));
        if sent {
            self.enabled[self.selected] = desired;
            let verb = if desired { "Starting" } else { "Stopping" };
            self.set_status_message(format!("{} worker for {}", verb, node));
        } else {
            self.set_status_message("Controller stopped".to_string());
        }
    }

    fn max_index(&self) -> usize {
        self.roster.len().saturating_sub(1)
    }

    pub fn select_right(&mut self) {
        self.selected = (self.selected + 1).min(self.max_index());
    }

    pub fn select_left(&mut self) {
        self.selected = self.selected.saturating_sub(1);
    }

    pub fn select_down(&mut self) {
        if self.selected + GRID_COLUMNS <= self.max_index() {
            self.selected += GRID_COLUMNS;
        }
    }

    pub fn select_up(&mut self) {
        if self.selected >= GRID_COLUMNS {
            self.selected -= GRID_COLUMNS;
        }
    }

    pub fn select_first(&mut self) {
        self.selected = 0;
    }

    pub fn select_last(&mut self) {
        self.selected = self.max_index();
    }

    /// Toggle the help overlay.
    pub fn toggle_help(&mut self) {
        self.show_help = !self.show_help;
    }

    /// Signal the application to quit.
    pub fn quit(&mut self) {
        self.running = false;
    }

    /// Export the current dashboard to a JSON file.
    pub fn export_state(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(&self.state)?;
        std::fs::write(path, json)?;
        Ok(())
    }
}
