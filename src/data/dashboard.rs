//! Combined projection of node health and local worker state.

use serde::Serialize;

use super::health::{HealthBoard, NodeHealth};
use crate::supervisor::{ProcessSupervisor, WorkerStatus};

/// One node as shown on the dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct NodeView {
    #[serde(flatten)]
    pub health: NodeHealth,
    /// Whether the operator has asked for a local worker on this node.
    pub enabled: bool,
    pub worker: WorkerStatus,
}

/// Read-only projection for rendering and export. Never authoritative:
/// health comes from the last snapshot, worker state from the supervisor.
#[derive(Debug, Clone, Default, Serialize)]
pub struct DashboardState {
    pub nodes: Vec<NodeView>,
}

impl DashboardState {
    /// Build the projection.
    ///
    /// `enabled` holds the operator toggle for each node in roster order;
    /// missing entries count as disabled. Without a supervisor every worker
    /// is reported idle.
    pub fn build(
        board: &HealthBoard,
        enabled: &[bool],
        supervisor: Option<&ProcessSupervisor>,
    ) -> Self {
        let nodes = board
            .nodes
            .iter()
            .enumerate()
            .map(|(i, health)| NodeView {
                health: *health,
                enabled: enabled.get(i).copied().unwrap_or(false),
                worker: supervisor
                    .map(|s| s.status(health.node))
                    .unwrap_or_default(),
            })
            .collect();

        Self { nodes }
    }

    /// Number of nodes with a live local worker.
    pub fn running_workers(&self) -> usize {
        self.nodes
            .iter()
            .filter(|n| matches!(n.worker, WorkerStatus::Running { .. }))
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::NodeState;
    use crate::node::{NodeId, NodeRoster};
    use crate::supervisor::testing::FakeLauncher;
    use std::sync::Arc;

    #[test]
    fn test_build_combines_health_and_workers() {
        let roster = NodeRoster::new(3);
        let mut board = HealthBoard::new(&roster);
        board.set(NodeId::new(1).unwrap(), NodeState::Online, 3);

        let supervisor = ProcessSupervisor::new(roster, Arc::new(FakeLauncher::default()));
        supervisor.spawn(NodeId::new(2).unwrap()).unwrap();

        let state = DashboardState::build(&board, &[false, true], Some(&supervisor));
        assert_eq!(state.nodes.len(), 3);
        assert_eq!(state.nodes[0].health.state, NodeState::Online);
        assert_eq!(state.nodes[0].worker, WorkerStatus::Idle);
        assert!(state.nodes[1].enabled);
        assert!(matches!(state.nodes[1].worker, WorkerStatus::Running { .. }));
        assert!(!state.nodes[2].enabled);
        assert_eq!(state.running_workers(), 1);
    }

    #[test]
    fn test_export_shape() {
        let roster = NodeRoster::new(1);
        let mut board = HealthBoard::new(&roster);
        board.set(NodeId::new(1).unwrap(), NodeState::Online, 42);

        let state = DashboardState::build(&board, &[], None);
        let json = serde_json::to_value(&state).unwrap();
        let node = &json["nodes"][0];
        assert_eq!(node["node"], "node-01");
        assert_eq!(node["state"], "online");
        assert_eq!(node["downtime_secs"], 42);
        assert_eq!(node["enabled"], false);
        assert_eq!(node["worker"]["state"], "idle");
    }
}
