//! Inbound update dispatch.
//!
//! Coordinates handling of one Bot API update for one bot: normalize the
//! update, acknowledge button taps, run every enabled workflow against the
//! event and persist a log for each matched run.

use crate::engine::WorkflowEngine;
use crate::error::DispatchError;
use crate::execution::{BotIdentity, ExecutionContext, ExecutionResult};
use crate::store::{ExecutionLog, WorkflowStore};
use chrono::Utc;
use flowbot_ai::TextGenerator;
use flowbot_core::{BotId, WorkflowId};
use flowbot_messaging::{InboundEvent, TransportFactory, Update};
use rootcause::Report;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

/// Result of one matched workflow run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkflowRun {
    pub workflow_id: WorkflowId,
    pub result: ExecutionResult,
}

/// What handling an update did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DispatchSummary {
    /// The normalized event, or `None` if the update carried nothing to act on.
    pub event: Option<InboundEvent>,
    /// Matched runs in workflow order. Unmatched runs are not listed.
    pub runs: Vec<WorkflowRun>,
}

impl DispatchSummary {
    /// Returns true if the update was ignored.
    #[must_use]
    pub fn is_ignored(&self) -> bool {
        self.event.is_none()
    }
}

/// Routes inbound updates to a bot's workflows.
pub struct UpdateDispatcher<S: WorkflowStore, F: TransportFactory> {
    store: S,
    transports: F,
    generator: Option<Arc<dyn TextGenerator>>,
}

impl<S: WorkflowStore, F: TransportFactory> UpdateDispatcher<S, F> {
    /// Creates a dispatcher reading from `store` and sending through
    /// transports built by `transports`.
    pub fn new(store: S, transports: F) -> Self {
        Self {
            store,
            transports,
            generator: None,
        }
    }

    /// Enables agent nodes for every run.
    #[must_use]
    pub fn with_text_generator(mut self, generator: Arc<dyn TextGenerator>) -> Self {
        self.generator = Some(generator);
        self
    }

    /// Returns the underlying store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Handles one update addressed to `bot_id`.
    ///
    /// # Errors
    ///
    /// Returns an error if the bot is unknown, a transport cannot be built,
    /// or the store fails. Workflow failures are not errors; they are
    /// recorded as FAILED runs.
    #[instrument(skip(self, update), fields(bot_id = %bot_id, update_id = update.update_id))]
    pub async fn handle_update(
        &self,
        bot_id: BotId,
        update: &Update,
    ) -> Result<DispatchSummary, Report<DispatchError>> {
        let bot = self
            .store
            .find_bot(bot_id)
            .await
            .map_err(|e| DispatchError::LoadBot {
                bot_id,
                reason: e.to_string(),
            })?
            .ok_or(DispatchError::BotNotFound { bot_id })?;

        let transport_error = |e: flowbot_messaging::TransportError| DispatchError::Transport {
            bot_id,
            reason: e.to_string(),
        };

        if let Some(query) = &update.callback_query {
            let transport = self.transports.for_token(&bot.token).map_err(transport_error)?;
            if let Err(e) = transport.answer_callback(&query.id, None).await {
                warn!(callback_query_id = %query.id, error = %e, "failed to acknowledge callback");
            }
        }

        let Some(event) = InboundEvent::from_update(update) else {
            debug!("update has no chat or text; ignoring");
            return Ok(DispatchSummary::default());
        };

        let workflows = self
            .store
            .load_workflows_for_bot(bot_id, true)
            .await
            .map_err(|e| DispatchError::LoadWorkflows {
                bot_id,
                reason: e.to_string(),
            })?;

        let context = ExecutionContext::from_event(
            BotIdentity {
                id: Some(bot.id),
                token: bot.token.clone(),
            },
            &event,
        );

        let mut runs = Vec::new();
        for workflow in &workflows {
            if !workflow.has_definition() {
                debug!(workflow_id = %workflow.id, "workflow has no definition; skipping");
                continue;
            }

            let transport = self.transports.for_token(&bot.token).map_err(transport_error)?;
            let mut engine = WorkflowEngine::new(transport);
            if let Some(generator) = &self.generator {
                engine = engine.with_text_generator(Arc::clone(generator));
            }

            let result = engine.run(workflow, &context).await;
            if !result.is_match() {
                continue;
            }

            info!(workflow_id = %workflow.id, status = %result.status, "workflow matched update");
            self.store
                .append_execution_log(ExecutionLog::from_result(bot_id, workflow.id, &result))
                .await
                .map_err(|e| DispatchError::AppendLog {
                    workflow_id: workflow.id,
                    reason: e.to_string(),
                })?;
            runs.push(WorkflowRun {
                workflow_id: workflow.id,
                result,
            });
        }

        self.store
            .record_last_run(bot_id, Utc::now())
            .await
            .map_err(|e| DispatchError::RecordLastRun {
                bot_id,
                reason: e.to_string(),
            })?;

        Ok(DispatchSummary {
            event: Some(event),
            runs,
        })
    }
}
