//! Error types for the workflow crate.
//!
//! Errors are layered:
//! - `DefinitionError`: the stored definition cannot be used at all
//! - `ActionError`: a side effect failed and aborted the walk
//! - `StoreError`: the persistence collaborator failed
//! - `DispatchError`: update handling failed (wrapped in a rootcause `Report`)
//!
//! Malformed graph shapes are deliberately absent: they end traversal
//! without an error.

use crate::node::NodeId;
use flowbot_ai::GenerateError;
use flowbot_core::{BotId, WorkflowId};
use flowbot_messaging::TransportError;
use std::fmt;

/// Errors from loading a stored workflow definition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DefinitionError {
    /// The workflow has no definition.
    Empty,
    /// The definition is not valid JSON of the expected shape.
    InvalidJson { reason: String },
}

impl DefinitionError {
    /// Short message recorded as the run's `error`.
    #[must_use]
    pub fn summary(&self) -> &'static str {
        match self {
            Self::Empty => "Empty workflow definition",
            Self::InvalidJson { .. } => "Invalid JSON",
        }
    }

    /// Single trace entry recorded for the failed run.
    #[must_use]
    pub fn trace_entry(&self) -> &'static str {
        match self {
            Self::Empty => "No definition found",
            Self::InvalidJson { .. } => "Error parsing definition",
        }
    }
}

impl fmt::Display for DefinitionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => write!(f, "workflow definition is empty"),
            Self::InvalidJson { reason } => {
                write!(f, "workflow definition is not valid JSON: {reason}")
            }
        }
    }
}

impl std::error::Error for DefinitionError {}

/// Errors from executing an action or agent node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionError {
    /// The outbound message could not be delivered.
    Delivery {
        node_id: NodeId,
        source: TransportError,
    },
    /// The agent's text generation failed.
    Generation {
        node_id: NodeId,
        source: GenerateError,
    },
}

impl ActionError {
    /// Returns the node whose side effect failed.
    #[must_use]
    pub fn node_id(&self) -> &NodeId {
        match self {
            Self::Delivery { node_id, .. } | Self::Generation { node_id, .. } => node_id,
        }
    }
}

impl fmt::Display for ActionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Delivery { source, .. } => write!(f, "{source}"),
            Self::Generation { source, .. } => write!(f, "{source}"),
        }
    }
}

impl std::error::Error for ActionError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Delivery { source, .. } => Some(source),
            Self::Generation { source, .. } => Some(source),
        }
    }
}

/// Errors from the persistence collaborator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// The backing store could not be reached.
    Unavailable { reason: String },
    /// A referenced record does not exist.
    NotFound { entity: &'static str, id: String },
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unavailable { reason } => write!(f, "store unavailable: {reason}"),
            Self::NotFound { entity, id } => write!(f, "{entity} not found: {id}"),
        }
    }
}

impl std::error::Error for StoreError {}

/// Errors from handling an inbound update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchError {
    /// The bot the update was addressed to is unknown.
    BotNotFound { bot_id: BotId },
    /// Looking up the bot failed.
    LoadBot { bot_id: BotId, reason: String },
    /// Loading the bot's workflows failed.
    LoadWorkflows { bot_id: BotId, reason: String },
    /// A transport for the bot could not be built.
    Transport { bot_id: BotId, reason: String },
    /// Persisting an execution log failed.
    AppendLog {
        workflow_id: WorkflowId,
        reason: String,
    },
    /// Recording the bot's last run failed.
    RecordLastRun { bot_id: BotId, reason: String },
}

impl fmt::Display for DispatchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BotNotFound { bot_id } => write!(f, "bot not found: {bot_id}"),
            Self::LoadBot { bot_id, reason } => {
                write!(f, "failed to load bot {bot_id}: {reason}")
            }
            Self::LoadWorkflows { bot_id, reason } => {
                write!(f, "failed to load workflows for bot {bot_id}: {reason}")
            }
            Self::Transport { bot_id, reason } => {
                write!(f, "failed to build transport for bot {bot_id}: {reason}")
            }
            Self::AppendLog {
                workflow_id,
                reason,
            } => {
                write!(f, "failed to record execution of {workflow_id}: {reason}")
            }
            Self::RecordLastRun { bot_id, reason } => {
                write!(f, "failed to record last run of bot {bot_id}: {reason}")
            }
        }
    }
}

impl std::error::Error for DispatchError {}
