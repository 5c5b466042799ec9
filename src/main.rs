use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use crossterm::{
    event::Event,
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Layout},
    Terminal,
};
use tokio::sync::{mpsc, watch};
use tracing::{info, warn};

use nodewatch::app::{App, Control};
use nodewatch::ui::Theme;
use nodewatch::{
    events, logging, ui, CommandLauncher, DashboardState, FileStore, HealthBoard,
    NodeController, ProcessSupervisor, ReconciliationLoop, Reconciler, Settings,
    SettingsOverrides,
};

#[derive(Parser, Debug)]
#[command(name = "nodewatch")]
#[command(about = "Node health dashboard with per-node worker supervision")]
struct Args {
    /// Optional TOML config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Path to the node status JSON file
    #[arg(short, long)]
    status_file: Option<PathBuf>,

    /// Worker executable, started as `<worker> <node index>`
    #[arg(short, long)]
    worker: Option<PathBuf>,

    /// Number of nodes in the roster
    #[arg(short, long)]
    nodes: Option<u16>,

    /// Show health only; toggles never start or stop workers
    #[arg(long)]
    display_only: bool,

    /// Log file for the interactive dashboard
    #[arg(long)]
    log_file: Option<PathBuf>,

    /// Poll once, write the dashboard as JSON and exit
    #[arg(short, long)]
    export: Option<PathBuf>,
}

impl Args {
    fn overrides(&self) -> SettingsOverrides {
        SettingsOverrides {
            status_file: self.status_file.clone(),
            worker_binary: self.worker.clone(),
            nodes: self.nodes,
            process_control: self.display_only.then_some(false),
            log_file: self.log_file.clone(),
        }
    }
}

fn main() -> Result<()> {
    let args = Args::parse();
    let settings = Settings::load(args.config.as_deref(), &args.overrides())
        .context("Failed to load settings")?;

    // Handle export mode (non-interactive)
    if let Some(ref export_path) = args.export {
        logging::init_stderr_logging();
        return export_to_file(&settings, export_path);
    }

    let _log_guard = logging::init_file_logging(&settings.log_file)
        .with_context(|| format!("Failed to open log file {}", settings.log_file.display()))?;

    run_dashboard(&settings)
}

/// Run the interactive dashboard until the operator quits.
fn run_dashboard(settings: &Settings) -> Result<()> {
    let roster = settings.roster();
    info!(
        status_file = %settings.status_file.display(),
        worker = %settings.worker_binary.display(),
        nodes = roster.len(),
        process_control = settings.process_control,
        "starting dashboard"
    );

    let rt = tokio::runtime::Runtime::new()?;

    let store = Arc::new(FileStore::new(&settings.status_file));
    let reconciler = Reconciler::new(store, roster);
    let source_description = reconciler.source_description().to_string();

    let (board_tx, board_rx) = watch::channel(HealthBoard::new(&roster));
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let poller = rt.spawn(async move {
        ReconciliationLoop::new(reconciler)
            .run(board_tx, shutdown_rx)
            .await;
    });

    let supervisor = Arc::new(ProcessSupervisor::new(
        roster,
        CommandLauncher::new(&settings.worker_binary),
    ));
    let (report_tx, reports) = mpsc::unbounded_channel();
    let controller = NodeController::new(supervisor.clone(), settings.process_control);
    let process_control = controller.process_control();
    let (intents, reactor) = controller.channel(Some(report_tx));
    let reactor = rt.spawn(reactor.run());

    let app = App::new(roster, board_rx, source_description)
        .with_theme(Theme::auto_detect())
        .with_control(Control {
            supervisor: supervisor.clone(),
            intents,
            reports,
            enabled: process_control,
        });

    // Run the TUI in the main thread while the runtime drives polls and intents
    let result = run_tui(app);

    // Dropping the app closed the intent channel; let queued intents finish
    let _ = shutdown_tx.send(true);
    rt.block_on(async {
        let _ = poller.await;
        let _ = reactor.await;
    });

    let stopped = supervisor.shutdown();
    if stopped > 0 {
        info!(stopped, "stopped workers on exit");
    }
    rt.shutdown_timeout(Duration::from_secs(1));

    result
}

/// Run the TUI with the given app
fn run_tui(mut app: App) -> Result<()> {
    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Setup panic hook to restore terminal
    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic| {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen);
        original_hook(panic);
    }));

    app.refresh();
    let result = run_app(&mut terminal, &mut app);

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}

fn run_app(terminal: &mut Terminal<CrosstermBackend<io::Stdout>>, app: &mut App) -> Result<()> {
    // Minimum terminal size for usable display
    const MIN_WIDTH: u16 = 60;
    const MIN_HEIGHT: u16 = 12;

    while app.running {
        terminal.draw(|frame| {
            let area = frame.area();

            // Check for minimum terminal size
            if area.width < MIN_WIDTH || area.height < MIN_HEIGHT {
                let msg = format!(
                    "Terminal too small: {}x{}\nMinimum: {}x{}\n\nResize to continue",
                    area.width, area.height, MIN_WIDTH, MIN_HEIGHT
                );
                let paragraph = ratatui::widgets::Paragraph::new(msg)
                    .alignment(ratatui::layout::Alignment::Center)
                    .style(ratatui::style::Style::default().fg(ratatui::style::Color::Yellow));
                let centered = ratatui::layout::Rect::new(
                    0,
                    (area.height / 2).saturating_sub(2),
                    area.width,
                    5u16.min(area.height),
                );
                frame.render_widget(paragraph, centered);
                return;
            }

            let chunks = Layout::vertical([
                Constraint::Length(1), // Header bar
                Constraint::Min(8),    // Node grid
                Constraint::Length(1), // Status bar
            ])
            .split(area);

            ui::common::render_header(frame, app, chunks[0]);
            ui::grid::render(frame, app, chunks[1]);
            ui::common::render_status_bar(frame, app, chunks[2]);

            if app.show_help {
                ui::common::render_help(frame, app, area);
            }
        })?;

        // Poll for events with a short timeout
        if let Some(Event::Key(key)) = events::poll_event(Duration::from_millis(100))? {
            events::handle_key_event(app, key);
        }

        app.refresh();
    }

    Ok(())
}

/// Poll the status file once and write the dashboard to a JSON file
fn export_to_file(settings: &Settings, export_path: &Path) -> Result<()> {
    let roster = settings.roster();
    let reconciler = Reconciler::new(Arc::new(FileStore::new(&settings.status_file)), roster);

    let mut board = HealthBoard::new(&roster);
    let nodes = reconciler
        .poll_once(&mut board)
        .with_context(|| format!("Failed to read {}", settings.status_file.display()))?;
    if board.online_count() == 0 {
        warn!(nodes, "no nodes online");
    }

    let state = DashboardState::build(&board, &[], None);
    let json = serde_json::to_string_pretty(&state)?;
    std::fs::write(export_path, json)?;

    println!("Exported node state to: {}", export_path.display());
    Ok(())
}
