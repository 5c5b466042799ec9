//! Node health projection.
//!
//! The board holds one entry per roster node. Polls overwrite entries in
//! place, so a node the status record omits keeps its offline default.

use std::time::Instant;

use serde::Serialize;

use crate::node::{NodeId, NodeRoster};

/// Liveness of a node as reported by the status record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeState {
    Online,
    #[default]
    Offline,
}

impl NodeState {
    /// Returns a short label for display.
    pub fn label(&self) -> &'static str {
        match self {
            NodeState::Online => "online",
            NodeState::Offline => "offline",
        }
    }
}

/// Health of one node: state and cumulative downtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct NodeHealth {
    pub node: NodeId,
    pub state: NodeState,
    pub downtime_secs: u64,
}

impl NodeHealth {
    fn offline(node: NodeId) -> Self {
        Self {
            node,
            state: NodeState::Offline,
            downtime_secs: 0,
        }
    }
}

/// Health of every node in the roster, as of the last successful poll.
#[derive(Debug, Clone)]
pub struct HealthBoard {
    pub nodes: Vec<NodeHealth>,
    /// When a poll last updated the board; `None` until the first one.
    pub last_updated: Option<Instant>,
}

impl HealthBoard {
    /// A board with every node offline and no downtime.
    pub fn new(roster: &NodeRoster) -> Self {
        Self {
            nodes: roster.iter().map(NodeHealth::offline).collect(),
            last_updated: None,
        }
    }

    /// Record a single node's health. Nodes outside the board are ignored.
    pub fn set(&mut self, node: NodeId, state: NodeState, downtime_secs: u64) {
        if let Some(entry) = self.nodes.iter_mut().find(|h| h.node == node) {
            entry.state = state;
            entry.downtime_secs = downtime_secs;
            self.last_updated = Some(Instant::now());
        }
    }

    /// Health of a given node.
    pub fn get(&self, node: NodeId) -> Option<&NodeHealth> {
        self.nodes.iter().find(|h| h.node == node)
    }

    /// Number of nodes currently online.
    pub fn online_count(&self) -> usize {
        self.nodes.iter().filter(|h| h.state == NodeState::Online).count()
    }
}
