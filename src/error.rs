//! Error types for status loading, process supervision and node control.

use std::io;

use thiserror::Error;

use crate::node::NodeId;

/// Errors that can occur when loading a health snapshot.
#[derive(Debug, Error)]
pub enum StatusError {
    /// The status record does not exist (yet).
    ///
    /// Callers treat this as an empty snapshot rather than a failure.
    #[error("status record not found")]
    NotFound,

    /// The status record exists but could not be read.
    #[error("failed to read status record: {0}")]
    Read(#[source] io::Error),

    /// The status record is not a valid snapshot.
    #[error("failed to parse status record: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Errors returned by the process supervisor.
///
/// [`AlreadyRunning`](SupervisorError::AlreadyRunning) and
/// [`NotRunning`](SupervisorError::NotRunning) are idempotence signals, not
/// failures.
#[derive(Debug, Error)]
pub enum SupervisorError {
    /// A live worker already exists for this node.
    #[error("worker for {0} is already running")]
    AlreadyRunning(NodeId),

    /// No live worker exists for this node.
    #[error("worker for {0} is not running")]
    NotRunning(NodeId),

    /// The node is not part of the supervised roster.
    #[error("{0} is not a supervised node")]
    UnknownNode(NodeId),

    /// The operating system refused to create the worker process.
    #[error("failed to spawn worker for {node}: {source}")]
    SpawnFailed {
        node: NodeId,
        #[source]
        source: io::Error,
    },
}

/// Errors surfaced to the operator when applying a node intent.
#[derive(Debug, Error)]
pub enum ControlError {
    /// The worker could not be started. The node stays requested but not
    /// running; retrying is left to the operator.
    #[error("failed to start worker for {node}: {source}")]
    Spawn {
        node: NodeId,
        #[source]
        source: io::Error,
    },

    /// Any other supervisor failure.
    #[error(transparent)]
    Supervisor(SupervisorError),
}

impl From<SupervisorError> for ControlError {
    fn from(err: SupervisorError) -> Self {
        match err {
            SupervisorError::SpawnFailed { node, source } => ControlError::Spawn { node, source },
            other => ControlError::Supervisor(other),
        }
    }
}
