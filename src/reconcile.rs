//! Periodic reconciliation of health snapshots into the presentation sink.
//!
//! The [`ReconciliationLoop`] alternates between two states:
//!
//! ```text
//!        ┌────────────── sleep(POLL_INTERVAL) ◀──────────────┐
//!        ▼                                                     │
//!     Polling ── load (blocking pool) ── publish or keep ──▶ Idle
//! ```
//!
//! The next poll is scheduled one full interval after the previous one
//! finished, whatever its outcome. Polls never overlap and a failing poll
//! never stops the loop.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tracing::{debug, error, info, trace, warn};

use crate::data::{HealthBoard, NodeHealth, NodeState};
use crate::error::StatusError;
use crate::node::{NodeId, NodeRoster};
use crate::source::{node_status, HealthSnapshot, StatusStore};

/// Time between the end of one poll and the start of the next.
pub const POLL_INTERVAL: Duration = Duration::from_millis(2000);

/// Receives per-node health after every successful poll.
pub trait StatusSink: Send {
    fn publish(&mut self, node: NodeId, state: NodeState, downtime_secs: u64);

    /// Publish a whole poll. Sinks with observers override this so the
    /// update lands as one change.
    fn publish_all(&mut self, updates: &[NodeHealth]) {
        for health in updates {
            self.publish(health.node, health.state, health.downtime_secs);
        }
    }
}

impl StatusSink for watch::Sender<HealthBoard> {
    fn publish(&mut self, node: NodeId, state: NodeState, downtime_secs: u64) {
        self.send_modify(|board| board.set(node, state, downtime_secs));
    }

    fn publish_all(&mut self, updates: &[NodeHealth]) {
        self.send_modify(|board| {
            for health in updates {
                board.set(health.node, health.state, health.downtime_secs);
            }
        });
    }
}

impl StatusSink for HealthBoard {
    fn publish(&mut self, node: NodeId, state: NodeState, downtime_secs: u64) {
        self.set(node, state, downtime_secs);
    }
}

/// Loads snapshots and pushes them into a sink, one poll at a time.
#[derive(Debug, Clone)]
pub struct Reconciler {
    store: Arc<dyn StatusStore>,
    roster: NodeRoster,
}

impl Reconciler {
    pub fn new(store: Arc<dyn StatusStore>, roster: NodeRoster) -> Self {
        Self { store, roster }
    }

    /// Description of the underlying store.
    pub fn source_description(&self) -> &str {
        self.store.description()
    }

    /// Load the current snapshot. A missing record is an empty snapshot.
    pub fn load(&self) -> Result<HealthSnapshot, StatusError> {
        match self.store.load() {
            Err(StatusError::NotFound) => Ok(HealthSnapshot::new()),
            other => other,
        }
    }

    /// Publish every roster node from `snapshot`. Returns the node count.
    pub fn apply(&self, snapshot: &HealthSnapshot, sink: &mut dyn StatusSink) -> usize {
        let updates: Vec<NodeHealth> = self
            .roster
            .iter()
            .map(|node| {
                let (state, downtime_secs) = node_status(snapshot, node);
                NodeHealth {
                    node,
                    state,
                    downtime_secs,
                }
            })
            .collect();
        sink.publish_all(&updates);
        updates.len()
    }

    /// One synchronous poll.
    ///
    /// On failure nothing is published, so the sink keeps the values of the
    /// last successful poll.
    pub fn poll_once(&self, sink: &mut dyn StatusSink) -> Result<usize, StatusError> {
        match self.load() {
            Ok(snapshot) => Ok(self.apply(&snapshot, sink)),
            Err(e) => {
                warn!(source = self.source_description(), error = %e, "poll failed, keeping previous state");
                Err(e)
            }
        }
    }
}

/// Scheduler state of the reconciliation loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoopState {
    /// Waiting for the next tick.
    #[default]
    Idle,
    /// A load is in progress.
    Polling,
}

/// Cooperative timer loop driving a [`Reconciler`].
#[derive(Debug)]
pub struct ReconciliationLoop {
    reconciler: Reconciler,
    interval: Duration,
    state: LoopState,
    polls: u64,
}

impl ReconciliationLoop {
    pub fn new(reconciler: Reconciler) -> Self {
        Self {
            reconciler,
            interval: POLL_INTERVAL,
            state: LoopState::Idle,
            polls: 0,
        }
    }

    /// Override the poll interval.
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    pub fn state(&self) -> LoopState {
        self.state
    }

    /// Number of polls completed, successful or not.
    pub fn polls(&self) -> u64 {
        self.polls
    }

    fn transition(&mut self, next: LoopState) {
        trace!(from = ?self.state, to = ?next, "reconcile state");
        self.state = next;
    }

    /// Run until `shutdown` becomes `true` or its sender is dropped.
    ///
    /// The first poll happens immediately. The blocking read runs on tokio's
    /// blocking pool so it never stalls other tasks.
    ///
    /// ```no_run
    /// use std::sync::Arc;
    /// use tokio::sync::watch;
    /// use nodewatch::{FileStore, HealthBoard, NodeRoster, Reconciler, ReconciliationLoop};
    ///
    /// # tokio_test::block_on(async {
    /// let roster = NodeRoster::default();
    /// let reconciler = Reconciler::new(Arc::new(FileStore::new("node_status.json")), roster);
    /// let (board_tx, mut board_rx) = watch::channel(HealthBoard::new(&roster));
    /// let (_shutdown_tx, shutdown_rx) = watch::channel(false);
    ///
    /// tokio::spawn(async move {
    ///     ReconciliationLoop::new(reconciler).run(board_tx, shutdown_rx).await;
    /// });
    ///
    /// board_rx.changed().await.unwrap();
    /// println!("{} nodes online", board_rx.borrow().online_count());
    /// # });
    /// ```
    pub async fn run<S: StatusSink>(&mut self, mut sink: S, mut shutdown: watch::Receiver<bool>) {
        info!(
            source = self.reconciler.source_description(),
            interval_ms = self.interval.as_millis() as u64,
            "reconciliation loop started"
        );

        while !*shutdown.borrow() {
            self.transition(LoopState::Polling);

            let reconciler = self.reconciler.clone();
            match tokio::task::spawn_blocking(move || reconciler.load()).await {
                Ok(Ok(snapshot)) => {
                    let nodes = self.reconciler.apply(&snapshot, &mut sink);
                    debug!(nodes, reported = snapshot.len(), "poll applied");
                }
                Ok(Err(e)) => {
                    warn!(error = %e, "poll failed, keeping previous state");
                }
                Err(e) => {
                    error!(error = %e, "poll task failed");
                }
            }

            self.polls += 1;
            self.transition(LoopState::Idle);

            let sleep = tokio::time::sleep(self.interval);
            tokio::pin!(sleep);
            loop {
                tokio::select! {
                    _ = &mut sleep => break,
                    changed = shutdown.changed() => {
                        if changed.is_err() || *shutdown.borrow() {
                            info!(polls = self.polls, "reconciliation loop stopped");
                            return;
                        }
                    }
                }
            }
        }

        info!(polls = self.polls, "reconciliation loop stopped");
    }
}
