//! Edge types for workflow graphs.
//!
//! Edges are directed links between nodes. Edges leaving a condition carry a
//! source handle naming the branch they belong to.

use crate::definition::EdgeSpec;
use crate::node::NodeId;

/// Outgoing handle of a node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceHandle {
    /// Condition's true branch.
    True,
    /// Condition's false branch.
    False,
    /// Any other handle name.
    Named(String),
}

impl SourceHandle {
    /// Parses a stored handle name.
    #[must_use]
    pub fn parse(name: &str) -> Self {
        match name {
            "true" => Self::True,
            "false" => Self::False,
            other => Self::Named(other.to_string()),
        }
    }

    /// Returns the handle for a condition outcome.
    #[must_use]
    pub const fn for_outcome(outcome: bool) -> Self {
        if outcome { Self::True } else { Self::False }
    }
}

/// A directed edge between two nodes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Edge {
    /// Editor-assigned edge ID, if any.
    pub id: Option<String>,
    pub source: NodeId,
    pub target: NodeId,
    /// Handle on the source node the edge leaves from.
    pub handle: Option<SourceHandle>,
}

impl Edge {
    /// Creates an edge without a handle.
    #[must_use]
    pub fn new(source: impl Into<NodeId>, target: impl Into<NodeId>) -> Self {
        Self {
            id: None,
            source: source.into(),
            target: target.into(),
            handle: None,
        }
    }

    /// Sets the source handle.
    #[must_use]
    pub fn with_handle(mut self, handle: SourceHandle) -> Self {
        self.handle = Some(handle);
        self
    }

    /// Resolves a stored edge.
    #[must_use]
    pub fn from_spec(spec: &EdgeSpec) -> Self {
        Self {
            id: spec.id().map(str::to_string),
            source: NodeId::from(spec.source.as_str()),
            target: NodeId::from(spec.target.as_str()),
            handle: spec.source_handle().map(SourceHandle::parse),
        }
    }

    /// Returns true if this edge is the branch taken for `outcome`.
    #[must_use]
    pub fn is_branch(&self, outcome: bool) -> bool {
        self.handle.as_ref() == Some(&SourceHandle::for_outcome(outcome))
    }
}
