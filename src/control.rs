//! Operator control of per-node workers.
//!
//! The presentation layer never touches the supervisor directly. It publishes
//! [`NodeIntent`]s through an [`IntentSender`]; the [`IntentReactor`] applies
//! them through a [`NodeController`]:
//!
//! ```text
//! UI toggle ──▶ IntentSender ──▶ IntentReactor ──┬─▶ node-01 queue ──▶ NodeController::apply
//!                                                ├─▶ node-02 queue ──▶ NodeController::apply
//!                                                └─▶ ...
//!                                  ControlReport ◀────────┘
//! ```
//!
//! Intents for one node are applied in the order they were sent. Intents for
//! different nodes run concurrently, so a kill waiting out its grace period
//! never delays another node.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};

use crate::error::{ControlError, SupervisorError};
use crate::node::NodeId;
use crate::supervisor::{ProcessSupervisor, Termination};

/// The operator's desired state for one node's worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NodeIntent {
    pub node: NodeId,
    pub desired_enabled: bool,
}

impl NodeIntent {
    pub fn enable(node: NodeId) -> Self {
        Self {
            node,
            desired_enabled: true,
        }
    }

    pub fn disable(node: NodeId) -> Self {
        Self {
            node,
            desired_enabled: false,
        }
    }
}

/// What applying an intent did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntentOutcome {
    /// A new worker was started.
    Spawned { pid: u32 },
    /// A live worker already existed; nothing was done.
    AlreadyRunning,
    /// The worker was stopped.
    Stopped(Termination),
    /// No live worker existed; nothing was done.
    NotRunning,
    /// Process control is disabled; the intent was dropped.
    Ignored,
}

impl fmt::Display for IntentOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IntentOutcome::Spawned { pid } => write!(f, "worker started (pid {})", pid),
            IntentOutcome::AlreadyRunning => write!(f, "worker already running"),
            IntentOutcome::Stopped(Termination::Graceful) => write!(f, "worker stopped"),
            IntentOutcome::Stopped(Termination::Forced) => write!(f, "worker force killed"),
            IntentOutcome::NotRunning => write!(f, "worker not running"),
            IntentOutcome::Ignored => write!(f, "process control disabled"),
        }
    }
}

/// Maps operator intents onto supervisor calls.
///
/// Enabling spawns, disabling kills. Repeating an intent is a no-op thanks
/// to the supervisor's idempotence. Observed health plays no part in the
/// decision: a node may be online while no local worker exists for it.
#[derive(Debug, Clone)]
pub struct NodeController {
    supervisor: Arc<ProcessSupervisor>,
    process_control: bool,
}

impl NodeController {
    /// Create a controller. With `process_control` off every intent is
    /// [`IntentOutcome::Ignored`] and the supervisor is never called.
    pub fn new(supervisor: Arc<ProcessSupervisor>, process_control: bool) -> Self {
        Self {
            supervisor,
            process_control,
        }
    }

    pub fn process_control(&self) -> bool {
        self.process_control
    }

    /// Apply one intent synchronously. Disabling may block for the
    /// supervisor's grace period.
    pub fn apply(&self, intent: NodeIntent) -> Result<IntentOutcome, ControlError> {
        if !self.process_control {
            debug!(node = %intent.node, "process control disabled, ignoring intent");
            return Ok(IntentOutcome::Ignored);
        }

        if intent.desired_enabled {
            match self.supervisor.spawn(intent.node) {
                Ok(pid) => Ok(IntentOutcome::Spawned { pid }),
                Err(SupervisorError::AlreadyRunning(_)) => Ok(IntentOutcome::AlreadyRunning),
                Err(e) => Err(e.into()),
            }
        } else {
            match self.supervisor.kill(intent.node) {
                Ok(termination) => Ok(IntentOutcome::Stopped(termination)),
                Err(SupervisorError::NotRunning(_)) => Ok(IntentOutcome::NotRunning),
                Err(e) => Err(e.into()),
            }
        }
    }

    /// Split into the publishing and applying halves of the intent interface.
    ///
    /// When `reports` is given, the reactor sends one [`ControlReport`] per
    /// applied intent.
    pub fn channel(
        self,
        reports: Option<mpsc::UnboundedSender<ControlReport>>,
    ) -> (IntentSender, IntentReactor) {
        let (tx, rx) = mpsc::unbounded_channel();
        (
            IntentSender { tx },
            IntentReactor {
                controller: self,
                rx,
                reports,
            },
        )
    }
}

/// The result of applying one intent.
#[derive(Debug)]
pub struct ControlReport {
    pub intent: NodeIntent,
    pub result: Result<IntentOutcome, ControlError>,
}

impl fmt::Display for ControlReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.result {
            Ok(outcome) => write!(f, "{}: {}", self.intent.node, outcome),
            Err(e) => write!(f, "{}", e),
        }
    }
}

/// Publishing half of the intent interface. Cheap to clone, never blocks.
#[derive(Debug, Clone)]
pub struct IntentSender {
    tx: mpsc::UnboundedSender<NodeIntent>,
}

impl IntentSender {
    /// Request a desired state for `node`.
    ///
    /// Returns `false` if the reactor has stopped.
    pub fn request(&self, node: NodeId, enabled: bool) -> bool {
        self.send(NodeIntent {
            node,
            desired_enabled: enabled,
        })
    }

    pub fn send(&self, intent: NodeIntent) -> bool {
        self.tx.send(intent).is_ok()
    }
}

/// Applying half of the intent interface.
#[derive(Debug)]
pub struct IntentReactor {
    controller: NodeController,
    rx: mpsc::UnboundedReceiver<NodeIntent>,
    reports: Option<mpsc::UnboundedSender<ControlReport>>,
}

impl IntentReactor {
    /// Apply intents until every [`IntentSender`] is dropped, then finish
    /// the intents already queued.
    pub async fn run(mut self) {
        let mut queues: HashMap<NodeId, mpsc::UnboundedSender<NodeIntent>> = HashMap::new();
        let mut workers = JoinSet::new();

        while let Some(intent) = self.rx.recv().await {
            let queue = queues.entry(intent.node).or_insert_with(|| {
                let (tx, rx) = mpsc::unbounded_channel();
                workers.spawn(apply_in_order(
                    self.controller.clone(),
                    rx,
                    self.reports.clone(),
                ));
                tx
            });
            if queue.send(intent).is_err() {
                warn!(node = %intent.node, "node queue closed, dropping intent");
            }
        }

        drop(queues);
        while let Some(joined) = workers.join_next().await {
            if let Err(e) = joined {
                error!(error = %e, "intent worker failed");
            }
        }
        debug!("intent reactor stopped");
    }
}

async fn apply_in_order(
    controller: NodeController,
    mut rx: mpsc::UnboundedReceiver<NodeIntent>,
    reports: Option<mpsc::UnboundedSender<ControlReport>>,
) {
    while let Some(intent) = rx.recv().await {
        let ctl = controller.clone();
        let result = match tokio::task::spawn_blocking(move || ctl.apply(intent)).await {
            Ok(result) => result,
            Err(e) => {
                error!(node = %intent.node, error = %e, "intent task failed");
                continue;
            }
        };

        match &result {
            Ok(outcome) => info!(node = %intent.node, enabled = intent.desired_enabled, %outcome, "intent applied"),
            Err(e) => warn!(node = %intent.node, error = %e, "intent failed"),
        }

        if let Some(reports) = &reports {
            let _ = reports.send(ControlReport { intent, result });
        }
    }
}
