//! Persistence seam for bots, workflows and execution logs.
//!
//! The engine never touches storage; the dispatcher reads bots and workflows
//! and appends execution logs through [`WorkflowStore`].

use crate::error::StoreError;
use crate::execution::{ExecutionResult, ExecutionStatus};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use flowbot_core::{BotId, ExecutionLogId, WorkflowId};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::{PoisonError, RwLock};

/// A registered bot.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BotRecord {
    pub id: BotId,
    pub name: String,
    /// Bot API token.
    pub token: String,
    pub last_run_at: Option<DateTime<Utc>>,
}

impl BotRecord {
    #[must_use]
    pub fn new(name: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            id: BotId::new(),
            name: name.into(),
            token: token.into(),
            last_run_at: None,
        }
    }
}

impl fmt::Debug for BotRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BotRecord")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("token", &"<redacted>")
            .field("last_run_at", &self.last_run_at)
            .finish()
    }
}

/// A workflow as stored for a bot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredWorkflow {
    pub id: WorkflowId,
    pub bot_id: BotId,
    pub name: String,
    pub enabled: bool,
    /// Serialized definition; absent for a workflow never saved in the editor.
    pub definition_json: Option<String>,
}

impl StoredWorkflow {
    /// Creates an enabled workflow.
    #[must_use]
    pub fn new(bot_id: BotId, name: impl Into<String>, definition_json: Option<String>) -> Self {
        Self {
            id: WorkflowId::new(),
            bot_id,
            name: name.into(),
            enabled: true,
            definition_json,
        }
    }

    #[must_use]
    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }

    /// Returns true if there is a definition to run.
    #[must_use]
    pub fn has_definition(&self) -> bool {
        self.definition_json.as_deref().is_some_and(|d| !d.is_empty())
    }
}

/// Persisted record of one matched run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionLog {
    pub id: ExecutionLogId,
    pub bot_id: BotId,
    pub workflow_id: WorkflowId,
    pub status: ExecutionStatus,
    pub steps: Vec<String>,
    pub error: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl ExecutionLog {
    /// Builds the log entry for a run of `workflow_id`.
    #[must_use]
    pub fn from_result(bot_id: BotId, workflow_id: WorkflowId, result: &ExecutionResult) -> Self {
        Self {
            id: ExecutionLogId::new(),
            bot_id,
            workflow_id,
            status: result.status,
            steps: result.steps.clone(),
            error: result.error.clone(),
            created_at: result.finished_at.unwrap_or_else(Utc::now),
        }
    }
}

/// Storage for bots, workflows and execution logs.
#[async_trait]
pub trait WorkflowStore: Send + Sync {
    /// Looks up a bot.
    async fn find_bot(&self, bot_id: BotId) -> Result<Option<BotRecord>, StoreError>;

    /// Returns a bot's workflows in stored order.
    async fn load_workflows_for_bot(
        &self,
        bot_id: BotId,
        enabled_only: bool,
    ) -> Result<Vec<StoredWorkflow>, StoreError>;

    /// Appends an execution log.
    async fn append_execution_log(&self, log: ExecutionLog) -> Result<(), StoreError>;

    /// Records when the bot last handled an update.
    async fn record_last_run(&self, bot_id: BotId, at: DateTime<Utc>) -> Result<(), StoreError>;
}

#[derive(Debug, Default)]
struct StoreState {
    bots: Vec<BotRecord>,
    workflows: Vec<StoredWorkflow>,
    logs: Vec<ExecutionLog>,
}

/// In-memory store for tests and local runs.
#[derive(Debug, Default)]
pub struct InMemoryWorkflowStore {
    state: RwLock<StoreState>,
}

impl InMemoryWorkflowStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or replaces a bot.
    pub fn insert_bot(&self, bot: BotRecord) {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        state.bots.retain(|b| b.id != bot.id);
        state.bots.push(bot);
    }

    /// Inserts or replaces a workflow, keeping insertion order.
    pub fn insert_workflow(&self, workflow: StoredWorkflow) {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        match state.workflows.iter_mut().find(|w| w.id == workflow.id) {
            Some(existing) => *existing = workflow,
            None => state.workflows.push(workflow),
        }
    }

    /// Returns the bot, if present.
    #[must_use]
    pub fn bot(&self, bot_id: BotId) -> Option<BotRecord> {
        let state = self.state.read().unwrap_or_else(PoisonError::into_inner);
        state.bots.iter().find(|b| b.id == bot_id).cloned()
    }

    /// Returns all execution logs in append order.
    #[must_use]
    pub fn execution_logs(&self) -> Vec<ExecutionLog> {
        let state = self.state.read().unwrap_or_else(PoisonError::into_inner);
        state.logs.clone()
    }
}

#[async_trait]
impl WorkflowStore for InMemoryWorkflowStore {
    async fn find_bot(&self, bot_id: BotId) -> Result<Option<BotRecord>, StoreError> {
        Ok(self.bot(bot_id))
    }

    async fn load_workflows_for_bot(
        &self,
        bot_id: BotId,
        enabled_only: bool,
    ) -> Result<Vec<StoredWorkflow>, StoreError> {
        let state = self.state.read().unwrap_or_else(PoisonError::into_inner);
        Ok(state
            .workflows
            .iter()
            .filter(|w| w.bot_id == bot_id && (w.enabled || !enabled_only))
            .cloned()
            .collect())
    }

    async fn append_execution_log(&self, log: ExecutionLog) -> Result<(), StoreError> {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        state.logs.push(log);
        Ok(())
    }

    async fn record_last_run(&self, bot_id: BotId, at: DateTime<Utc>) -> Result<(), StoreError> {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        let bot = state
            .bots
            .iter_mut()
            .find(|b| b.id == bot_id)
            .ok_or_else(|| StoreError::NotFound {
                entity: "bot",
                id: bot_id.to_string(),
            })?;
        bot.last_run_at = Some(at);
        Ok(())
    }
}
