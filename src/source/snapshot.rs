//! Types for externally-written health snapshots.
//!
//! These types match the status record produced by the cluster agent:
//! a JSON object keyed by node id (`node-01`, ...), where each entry carries
//! a status string and a cumulative downtime counter.
//!
//! The agent may add keys of its own (timestamps, metadata). Only keys of
//! the `node-NN` form are read; everything else is skipped.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::data::NodeState;
use crate::node::NodeId;

/// A complete point-in-time health record for all nodes.
///
/// Maps node id keys to their reported status.
pub type HealthSnapshot = BTreeMap<String, NodeStatus>;

/// Reported status for a single node.
///
/// Deserialization is lenient about the status: a missing, null or
/// non-string `status` reads as an empty string (offline). A non-object
/// entry reads as the default. `total_downtime` must be absent, null or a
/// non-negative integer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Value")]
pub struct NodeStatus {
    /// `"online"` marks the node online; any other value means offline.
    pub status: String,

    /// Cumulative downtime in seconds, as counted by the external writer.
    pub total_downtime: u64,
}

impl NodeStatus {
    /// Interpret the reported status string.
    pub fn state(&self) -> NodeState {
        if self.status == "online" {
            NodeState::Online
        } else {
            NodeState::Offline
        }
    }
}

impl TryFrom<Value> for NodeStatus {
    type Error = serde_json::Error;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        let Value::Object(mut fields) = value else {
            return Ok(Self::default());
        };

        let status = match fields.remove("status") {
            Some(Value::String(status)) => status,
            _ => String::new(),
        };
        let total_downtime = match fields.remove("total_downtime") {
            None | Some(Value::Null) => 0,
            Some(downtime) => u64::deserialize(downtime)?,
        };

        Ok(Self {
            status,
            total_downtime,
        })
    }
}

/// Parse a status record.
///
/// The top level must be a JSON object. Keys that are not node ids are
/// skipped without looking at their values.
pub fn parse_snapshot(json: &str) -> Result<HealthSnapshot, serde_json::Error> {
    let raw: BTreeMap<String, Value> = serde_json::from_str(json)?;
    raw.into_iter()
        .filter(|(key, _)| NodeId::parse(key).is_some())
        .map(|(key, value)| Ok((key, NodeStatus::try_from(value)?)))
        .collect()
}

/// Look up the state and downtime of `node`, defaulting to `(Offline, 0)`.
pub fn node_status(snapshot: &HealthSnapshot, node: NodeId) -> (NodeState, u64) {
    snapshot
        .get(&node.to_string())
        .map(|s| (s.state(), s.total_downtime))
        .unwrap_or((NodeState::Offline, 0))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_snapshot() {
        let json = r#"{
            "node-01": { "status": "online", "total_downtime": 0 },
            "node-02": { "status": "degraded", "total_downtime": 17 },
            "node-03": { "total_downtime": 5 },
            "node-04": {}
        }"#;

        let snapshot: HealthSnapshot = serde_json::from_str(json).unwrap();
        assert_eq!(snapshot.len(), 4);
        assert_eq!(snapshot["node-01"].state(), NodeState::Online);
        assert_eq!(snapshot["node-02"].state(), NodeState::Offline);
        assert_eq!(snapshot["node-02"].total_downtime, 17);
        assert_eq!(snapshot["node-03"].state(), NodeState::Offline);
        assert_eq!(snapshot["node-04"], NodeStatus::default());
    }

    #[test]
    fn test_status_match_is_exact() {
        let status = NodeStatus {
            status: "Online".to_string(),
            total_downtime: 0,
        };
        assert_eq!(status.state(), NodeState::Offline);
    }

    #[test]
    fn test_negative_downtime_is_rejected() {
        let json = r#"{ "node-01": { "status": "online", "total_downtime": -3 } }"#;
        assert!(serde_json::from_str::<HealthSnapshot>(json).is_err());
    }

    #[test]
    fn test_parse_skips_keys_that_are_not_nodes() {
        let json = r#"{
            "updated_at": 1700000000,
            "agent": { "total_downtime": "n/a" },
            "node-03": { "status": "online", "total_downtime": 42 }
        }"#;

        let snapshot = parse_snapshot(json).unwrap();
        assert_eq!(snapshot.len(), 1);
        let node = NodeId::new(3).unwrap();
        assert_eq!(node_status(&snapshot, node), (NodeState::Online, 42));
    }

    #[test]
    fn test_parse_non_string_status_is_offline() {
        let json = r#"{
            "node-03": { "status": "online", "total_downtime": 42 },
            "node-04": { "status": null, "total_downtime": 7 },
            "node-05": { "status": 1 },
            "node-06": null
        }"#;

        let snapshot = parse_snapshot(json).unwrap();
        let status = |i| node_status(&snapshot, NodeId::new(i).unwrap());
        assert_eq!(status(3), (NodeState::Online, 42));
        assert_eq!(status(4), (NodeState::Offline, 7));
        assert_eq!(status(5), (NodeState::Offline, 0));
        assert_eq!(status(6), (NodeState::Offline, 0));
    }

    #[test]
    fn test_parse_rejects_non_object_record() {
        assert!(parse_snapshot("[1, 2, 3]").is_err());
        assert!(parse_snapshot("42").is_err());
        assert!(parse_snapshot("{ not json").is_err());
    }

    #[test]
    fn test_parse_rejects_bad_node_downtime() {
        let json = r#"{ "node-01": { "status": "online", "total_downtime": 1.5 } }"#;
        assert!(parse_snapshot(json).is_err());
    }

    #[test]
    fn test_missing_node_defaults_offline() {
        let snapshot = HealthSnapshot::new();
        let node = NodeId::new(6).unwrap();
        assert_eq!(node_status(&snapshot, node), (NodeState::Offline, 0));
    }
}
