//! Status store abstraction for reading health snapshots.
//!
//! The health data is produced by an external agent. This module provides a
//! trait-based abstraction over where that data comes from (the status file,
//! or an in-process channel) and the snapshot types themselves.

mod channel;
mod file;
mod snapshot;

pub use channel::ChannelStore;
pub use file::FileStore;
pub use snapshot::{node_status, parse_snapshot, HealthSnapshot, NodeStatus};

use std::fmt::Debug;

use crate::error::StatusError;

/// Trait for reading the latest health snapshot.
///
/// Implementations must not cache across calls: each `load` reflects the
/// current state of the backing record.
///
/// # Example
///
/// ```
/// use nodewatch::{FileStore, StatusStore};
///
/// let store = FileStore::new("node_status.json");
/// match store.load() {
///     Ok(snapshot) => println!("{} nodes reported", snapshot.len()),
///     Err(e) => eprintln!("{}: {}", store.description(), e),
/// }
/// ```
pub trait StatusStore: Send + Sync + Debug {
    /// Load the current snapshot.
    ///
    /// An absent record yields an empty snapshot. A malformed record yields
    /// [`StatusError::Parse`].
    fn load(&self) -> Result<HealthSnapshot, StatusError>;

    /// Returns a human-readable description of the store.
    ///
    /// Used for display in the TUI status bar.
    fn description(&self) -> &str;
}
