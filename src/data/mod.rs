//! Projections of node health for display.
//!
//! This module turns raw health snapshots into the per-node state the
//! presentation layer renders.
//!
//! ## Submodules
//!
//! - [`health`]: [`NodeState`], [`NodeHealth`] and the [`HealthBoard`] fed by polls
//! - [`dashboard`]: [`DashboardState`], health combined with local worker state
//!
//! ## Data Flow
//!
//! ```text
//! HealthSnapshot (raw JSON)
//!        │
//!        ▼
//! Reconciler::poll_once() ──▶ StatusSink ──▶ HealthBoard
//!                                                │
//!        ProcessSupervisor::status() ────────────┤
//!                                                ▼
//!                                         DashboardState
//! ```

pub mod dashboard;
pub mod health;

pub use dashboard::{DashboardState, NodeView};
pub use health::{HealthBoard, NodeHealth, NodeState};
