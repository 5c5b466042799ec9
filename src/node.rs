//! Node identity and the fixed roster of monitored nodes.

use std::fmt;

use serde::{Serialize, Serializer};

/// Number of nodes in the default roster.
pub const DEFAULT_NODE_COUNT: u16 = 10;

/// Stable identifier of one monitored node.
///
/// Wraps the 1-based node index. The string form (`node-01`, `node-02`, ...)
/// is the key used in the status file; the numeric form is the argument
/// passed to the worker executable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(u16);

impl NodeId {
    /// Create a node id from its 1-based index.
    ///
    /// Returns `None` for index 0.
    pub fn new(index: u16) -> Option<Self> {
        (index > 0).then_some(Self(index))
    }

    /// The 1-based numeric index of this node.
    pub fn index(self) -> u16 {
        self.0
    }

    /// Parse the `node-NN` key form.
    ///
    /// ```
    /// use nodewatch::NodeId;
    ///
    /// let id = NodeId::parse("node-07").unwrap();
    /// assert_eq!(id.index(), 7);
    /// assert!(NodeId::parse("node-00").is_none());
    /// ```
    pub fn parse(key: &str) -> Option<Self> {
        let digits = key.strip_prefix("node-")?;
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        digits.parse().ok().and_then(Self::new)
    }

    /// Position of this node inside a roster (0-based).
    pub(crate) fn slot(self) -> usize {
        usize::from(self.0) - 1
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "node-{:02}", self.0)
    }
}

impl Serialize for NodeId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// The fixed, ordered set of nodes watched for the lifetime of the process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NodeRoster {
    count: u16,
}

impl NodeRoster {
    /// Create a roster of `count` nodes, `node-01` through `node-<count>`.
    pub fn new(count: u16) -> Self {
        Self { count }
    }

    /// Number of nodes in the roster.
    pub fn len(&self) -> usize {
        usize::from(self.count)
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Whether `node` belongs to this roster.
    pub fn contains(&self, node: NodeId) -> bool {
        node.index() <= self.count
    }

    /// Node at the given 0-based position.
    pub fn get(&self, position: usize) -> Option<NodeId> {
        if position < self.len() {
            u16::try_from(position + 1).ok().and_then(NodeId::new)
        } else {
            None
        }
    }

    /// Iterate the nodes in order.
    pub fn iter(&self) -> impl Iterator<Item = NodeId> {
        (1..=self.count).map(NodeId)
    }
}

impl Default for NodeRoster {
    fn default() -> Self {
        Self::new(DEFAULT_NODE_COUNT)
    }
}
