//! # nodewatch
//!
//! A terminal dashboard for a fixed roster of cluster nodes, with optional
//! supervision of one local worker process per node.
//!
//! An external agent writes a JSON status record (`node_status.json`). The
//! dashboard polls it every two seconds and shows each node's online state
//! and cumulative downtime. Toggling a node starts or stops a local worker
//! (`./client <index>`) for it.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                          Application                         │
//! │  ┌─────────┐    ┌───────────┐    ┌─────────┐   ┌──────────┐  │
//! │  │   app   │───▶│   data    │───▶│   ui    │──▶│ Terminal │  │
//! │  │ (state) │    │(dashboard)│    │(render) │   │          │  │
//! │  └──┬───▲──┘    └───────────┘    └─────────┘   └──────────┘  │
//! │     │   │ HealthBoard (watch)                                │
//! │     │ ┌─┴─────────┐     ┌─────────┐                          │
//! │     │ │ reconcile │◀────│ source  │◀── FileStore | Channel   │
//! │     │ └───────────┘     └─────────┘                          │
//! │     ▼ NodeIntent                                             │
//! │  ┌─────────┐    ┌────────────┐                               │
//! │  │ control │───▶│ supervisor │──▶ worker processes           │
//! │  └─────────┘    └────────────┘                               │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! - **[`source`]**: Status store abstraction ([`StatusStore`] trait), read
//!   fresh on every call
//! - **[`reconcile`]**: The two-second [`ReconciliationLoop`] pushing node
//!   health into a [`StatusSink`]
//! - **[`supervisor`]**: [`ProcessSupervisor`], spawn and kill with a
//!   SIGTERM, five second grace, SIGKILL sequence
//! - **[`control`]**: [`NodeController`], turning enable/disable intents into
//!   supervisor calls
//! - **[`data`]**: Display projections ([`HealthBoard`], [`DashboardState`])
//! - **[`app`]**, **[`events`]**, **[`ui`]**: The interactive terminal UI
//!
//! ## Usage
//!
//! ### As a CLI tool
//!
//! ```bash
//! # Watch node_status.json and supervise ./client workers
//! nodewatch
//!
//! # Display only, no process control
//! nodewatch --status-file /var/run/node_status.json --display-only
//!
//! # Export one poll as JSON and exit
//! nodewatch --export state.json
//! ```
//!
//! ### As a library with a channel store
//!
//! ```
//! use std::sync::Arc;
//! use nodewatch::{ChannelStore, HealthBoard, NodeRoster, Reconciler};
//!
//! let (tx, store) = ChannelStore::create("in-process");
//! let roster = NodeRoster::default();
//! let reconciler = Reconciler::new(Arc::new(store), roster);
//!
//! tx.send(serde_json::from_str(r#"{"node-03": {"status": "online", "total_downtime": 42}}"#).unwrap())
//!     .unwrap();
//!
//! let mut board = HealthBoard::new(&roster);
//! reconciler.poll_once(&mut board).unwrap();
//! assert_eq!(board.online_count(), 1);
//! ```

pub mod app;
pub mod config;
pub mod control;
pub mod data;
pub mod error;
pub mod events;
pub mod logging;
pub mod node;
pub mod reconcile;
pub mod source;
pub mod supervisor;
pub mod ui;

// Re-export main types for convenience
pub use app::App;
pub use config::{Settings, SettingsOverrides};
pub use control::{ControlReport, IntentOutcome, IntentReactor, IntentSender, NodeController, NodeIntent};
pub use data::{DashboardState, HealthBoard, NodeHealth, NodeState, NodeView};
pub use error::{ControlError, StatusError, SupervisorError};
pub use node::{NodeId, NodeRoster};
pub use reconcile::{LoopState, Reconciler, ReconciliationLoop, StatusSink};
pub use source::{ChannelStore, FileStore, HealthSnapshot, NodeStatus, StatusStore};
pub use supervisor::{CommandLauncher, ProcessSupervisor, Termination, WorkerStatus};
