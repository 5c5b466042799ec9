//! Terminal UI rendering using ratatui.
//!
//! ## Submodules
//!
//! - [`grid`]: Node cards with status LED, downtime and worker toggle
//! - [`common`]: Shared components (header, status bar, help overlay)
//! - [`theme`]: Light/dark theme support with terminal auto-detection
//!
//! ## Rendering Architecture
//!
//! ```text
//! ┌──────────────────────────────────────┐
//! │ Header (common::render_header)       │
//! ├──────────────────────────────────────┤
//! │ ┌────────┐┌────────┐     ┌────────┐  │
//! │ │node-01 ││node-02 │ ... │node-05 │  │
//! │ └────────┘└────────┘     └────────┘  │
//! │ ┌────────┐┌────────┐     ┌────────┐  │
//! │ │node-06 ││node-07 │ ... │node-10 │  │
//! │ └────────┘└────────┘     └────────┘  │
//! ├──────────────────────────────────────┤
//! │ Status Bar (common::render_status)   │
//! └──────────────────────────────────────┘
//!         ↑
//!    Overlay rendered on top:
//!    - common::render_help
//! ```

pub mod common;
pub mod grid;
pub mod theme;

pub use theme::Theme;
