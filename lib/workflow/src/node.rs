//! Workflow node types.
//!
//! Nodes are resolved from their stored form once, when the graph is built.
//! Each node has:
//! - An ID unique within the workflow (duplicates resolve to the first)
//! - A display label
//! - A kind carrying the typed configuration the engine acts on

use crate::action::{ActionKind, AgentConfig};
use crate::condition::ConditionKind;
use crate::definition::{JsonObject, NodeSpec};
use crate::trigger::TriggerKind;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of a node within a workflow, as assigned by the editor.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(String);

impl NodeId {
    /// Returns the raw identifier.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for NodeId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for NodeId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The stored `type` of a node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeType {
    /// Entry point matched against the inbound event.
    Trigger,
    /// Two-way branch.
    Condition,
    /// Side effect such as sending a message.
    Action,
    /// LLM reply.
    Agent,
    /// Any other editor type; walked through with no effect.
    Other(String),
}

impl NodeType {
    /// Parses a stored type name.
    #[must_use]
    pub fn parse(name: &str) -> Self {
        match name {
            "trigger" => Self::Trigger,
            "condition" => Self::Condition,
            "action" => Self::Action,
            "agent" => Self::Agent,
            other => Self::Other(other.to_string()),
        }
    }

    /// Returns the stored type name.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Trigger => "trigger",
            Self::Condition => "condition",
            Self::Action => "action",
            Self::Agent => "agent",
            Self::Other(name) => name,
        }
    }
}

impl fmt::Display for NodeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Typed behavior of a node.
#[derive(Debug, Clone)]
pub enum NodeKind {
    Trigger(TriggerKind),
    Condition(ConditionKind),
    Action(ActionKind),
    Agent(AgentConfig),
    /// Pass-through node of an unknown type.
    Other(String),
}

/// A resolved workflow node.
#[derive(Debug, Clone)]
pub struct Node {
    /// Node identifier.
    pub id: NodeId,
    /// Display label; empty when the editor stored none.
    pub label: String,
    /// Resolved behavior.
    pub kind: NodeKind,
}

impl Node {
    /// Resolves a stored node into its typed form.
    #[must_use]
    pub fn from_spec(spec: &NodeSpec) -> Self {
        let label = spec.data.label().unwrap_or_default().to_string();
        let empty = JsonObject::new();
        let config = spec.data.config().unwrap_or(&empty);

        let kind = match NodeType::parse(&spec.node_type) {
            NodeType::Trigger => NodeKind::Trigger(TriggerKind::from_config(&label, config)),
            NodeType::Condition => NodeKind::Condition(ConditionKind::from_config(&label, config)),
            NodeType::Action => NodeKind::Action(ActionKind::from_config(&label, config)),
            NodeType::Agent => NodeKind::Agent(AgentConfig::from_config(config)),
            NodeType::Other(name) => NodeKind::Other(name),
        };

        Self {
            id: NodeId::from(spec.id.as_str()),
            label,
            kind,
        }
    }

    /// Returns the node's stored type.
    #[must_use]
    pub fn node_type(&self) -> NodeType {
        match &self.kind {
            NodeKind::Trigger(_) => NodeType::Trigger,
            NodeKind::Condition(_) => NodeType::Condition,
            NodeKind::Action(_) => NodeType::Action,
            NodeKind::Agent(_) => NodeType::Agent,
            NodeKind::Other(name) => NodeType::Other(name.clone()),
        }
    }

    /// Returns true for trigger nodes.
    #[must_use]
    pub fn is_trigger(&self) -> bool {
        matches!(self.kind, NodeKind::Trigger(_))
    }

    /// Returns true if reaching this node performs a side effect.
    #[must_use]
    pub fn is_executable(&self) -> bool {
        matches!(self.kind, NodeKind::Action(_) | NodeKind::Agent(_))
    }
}

/// Reads a non-empty string value from node config.
pub(crate) fn config_str<'a>(config: &'a JsonObject, key: &str) -> Option<&'a str> {
    config
        .get(key)
        .and_then(|value| value.as_str())
        .filter(|value| !value.is_empty())
}
