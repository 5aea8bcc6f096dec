//! Execution context and results.
//!
//! A run receives an [`ExecutionContext`] describing the inbound event and
//! returns an [`ExecutionResult`]: a status plus the ordered, human-readable
//! step trace.

use crate::error::DefinitionError;
use chrono::{DateTime, Utc};
use flowbot_core::{BotId, WorkflowId};
use flowbot_messaging::{ChatId, InboundEvent};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Final status of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ExecutionStatus {
    /// A trigger matched and the walk completed.
    Success,
    /// The definition was unusable or an action failed.
    Failed,
    /// No trigger matched the event.
    NoMatch,
}

impl fmt::Display for ExecutionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Success => write!(f, "SUCCESS"),
            Self::Failed => write!(f, "FAILED"),
            Self::NoMatch => write!(f, "NO_MATCH"),
        }
    }
}

/// Outcome of one run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionResult {
    pub status: ExecutionStatus,
    /// Ordered trace of what happened.
    pub steps: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workflow_id: Option<WorkflowId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finished_at: Option<DateTime<Utc>>,
}

impl ExecutionResult {
    /// No trigger matched: empty trace, no workflow ID.
    #[must_use]
    pub fn no_match() -> Self {
        Self::new(ExecutionStatus::NoMatch, Vec::new(), None)
    }

    /// The walk completed.
    #[must_use]
    pub fn success(steps: Vec<String>) -> Self {
        Self::new(ExecutionStatus::Success, steps, None)
    }

    /// The run failed with `error`.
    #[must_use]
    pub fn failed(steps: Vec<String>, error: impl Into<String>) -> Self {
        Self::new(ExecutionStatus::Failed, steps, Some(error.into()))
    }

    /// The definition could not be loaded.
    #[must_use]
    pub fn definition_failure(error: &DefinitionError) -> Self {
        Self::failed(vec![error.trace_entry().to_string()], error.summary())
    }

    fn new(status: ExecutionStatus, steps: Vec<String>, error: Option<String>) -> Self {
        Self {
            status,
            steps,
            error,
            workflow_id: None,
            started_at: None,
            finished_at: None,
        }
    }

    /// Stamps the workflow the run belongs to.
    #[must_use]
    pub fn with_workflow_id(mut self, workflow_id: Option<WorkflowId>) -> Self {
        self.workflow_id = workflow_id;
        self
    }

    /// Stamps start and finish times.
    #[must_use]
    pub fn with_timing(mut self, started_at: DateTime<Utc>, finished_at: DateTime<Utc>) -> Self {
        self.started_at = Some(started_at);
        self.finished_at = Some(finished_at);
        self
    }

    #[must_use]
    pub fn is_success(&self) -> bool {
        self.status == ExecutionStatus::Success
    }

    #[must_use]
    pub fn is_failed(&self) -> bool {
        self.status == ExecutionStatus::Failed
    }

    /// Returns true if a trigger matched (the run should be logged).
    #[must_use]
    pub fn is_match(&self) -> bool {
        self.status != ExecutionStatus::NoMatch
    }
}

/// Ordered, append-only step trace of a run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Trace {
    steps: Vec<String>,
}

impl Trace {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, step: impl Into<String>) {
        self.steps.push(step.into());
    }

    #[must_use]
    pub fn steps(&self) -> &[String] {
        &self.steps
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    #[must_use]
    pub fn into_steps(self) -> Vec<String> {
        self.steps
    }
}

/// The bot a run executes for.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct BotIdentity {
    pub id: Option<BotId>,
    /// Bot API token.
    pub token: String,
}

impl fmt::Debug for BotIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BotIdentity")
            .field("id", &self.id)
            .field("token", &"<redacted>")
            .finish()
    }
}

/// Per-run input describing the inbound event. Not persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionContext {
    pub bot: BotIdentity,
    pub chat_id: ChatId,
    /// Raw message text, or callback data for callback events.
    pub user_text: String,
    pub user_name: Option<String>,
    /// The event came from an inline button tap.
    pub is_callback: bool,
}

impl ExecutionContext {
    /// Creates a context for a typed message with no bot identity.
    #[must_use]
    pub fn new(chat_id: ChatId, user_text: impl Into<String>) -> Self {
        Self {
            bot: BotIdentity::default(),
            chat_id,
            user_text: user_text.into(),
            user_name: None,
            is_callback: false,
        }
    }

    /// Creates a context from a normalized inbound event.
    #[must_use]
    pub fn from_event(bot: BotIdentity, event: &InboundEvent) -> Self {
        Self {
            bot,
            chat_id: event.chat_id,
            user_text: event.text.clone(),
            user_name: event.user_name.clone(),
            is_callback: event.is_callback(),
        }
    }

    #[must_use]
    pub fn with_bot(mut self, bot: BotIdentity) -> Self {
        self.bot = bot;
        self
    }

    #[must_use]
    pub fn with_user_name(mut self, user_name: impl Into<String>) -> Self {
        self.user_name = Some(user_name.into());
        self
    }

    #[must_use]
    pub fn with_callback(mut self, is_callback: bool) -> Self {
        self.is_callback = is_callback;
        self
    }
}
