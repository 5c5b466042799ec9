//! Channel-based status store.
//!
//! Serves snapshots pushed through a tokio watch channel. Useful when the
//! health data arrives in-process (a bus subscription, an embedding
//! application, tests) instead of through the status file.

use tokio::sync::watch;

use super::{HealthSnapshot, StatusStore};
use crate::error::StatusError;

/// A status store that always returns the latest snapshot sent on its channel.
///
/// # Example
///
/// ```
/// use nodewatch::{ChannelStore, HealthSnapshot, StatusStore};
///
/// let (tx, store) = ChannelStore::create("agent");
/// assert!(store.load().unwrap().is_empty());
///
/// let mut snapshot = HealthSnapshot::new();
/// snapshot.insert("node-01".to_string(), Default::default());
/// tx.send(snapshot).unwrap();
/// assert_eq!(store.load().unwrap().len(), 1);
/// ```
#[derive(Debug)]
pub struct ChannelStore {
    receiver: watch::Receiver<HealthSnapshot>,
    description: String,
}

impl ChannelStore {
    /// Create a new channel store.
    ///
    /// # Arguments
    ///
    /// * `receiver` - The receiving end of a watch channel
    /// * `source_description` - Where snapshots come from, for display
    pub fn new(receiver: watch::Receiver<HealthSnapshot>, source_description: &str) -> Self {
        let description = format!("channel: {}", source_description);
        Self {
            receiver,
            description,
        }
    }

    /// Create a sender/store pair starting from an empty snapshot.
    pub fn create(source_description: &str) -> (watch::Sender<HealthSnapshot>, Self) {
        let (tx, rx) = watch::channel(HealthSnapshot::default());
        (tx, Self::new(rx, source_description))
    }
}

impl StatusStore for ChannelStore {
    fn load(&self) -> Result<HealthSnapshot, StatusError> {
        // A dropped sender leaves the last value in place; keep serving it.
        Ok(self.receiver.borrow().clone())
    }

    fn description(&self) -> &str {
        &self.description
    }
}
