//! Workflow engine.
//!
//! Runs one stored definition against one inbound event. Every failure is
//! folded into the returned [`ExecutionResult`]; nothing escapes `run`.

use crate::action::ActionExecutor;
use crate::definition::WorkflowDefinition;
use crate::execution::{ExecutionContext, ExecutionResult, Trace};
use crate::graph::WorkflowGraph;
use crate::store::StoredWorkflow;
use crate::trigger::TriggerMatcher;
use crate::walker::GraphWalker;
use chrono::Utc;
use flowbot_ai::TextGenerator;
use flowbot_core::WorkflowId;
use flowbot_messaging::MessageTransport;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Label used in the trace when the matched trigger has none.
const UNKNOWN_TRIGGER: &str = "Unknown Trigger";

/// Executes workflow definitions.
#[derive(Clone)]
pub struct WorkflowEngine {
    transport: Arc<dyn MessageTransport>,
    generator: Option<Arc<dyn TextGenerator>>,
}

impl WorkflowEngine {
    /// Creates an engine sending through `transport`.
    #[must_use]
    pub fn new(transport: Arc<dyn MessageTransport>) -> Self {
        Self {
            transport,
            generator: None,
        }
    }

    /// Enables agent nodes.
    #[must_use]
    pub fn with_text_generator(mut self, generator: Arc<dyn TextGenerator>) -> Self {
        self.generator = Some(generator);
        self
    }

    /// Runs a stored workflow, stamping its ID on matched runs.
    pub async fn run(&self, workflow: &StoredWorkflow, context: &ExecutionContext) -> ExecutionResult {
        self.execute(
            workflow.definition_json.as_deref(),
            Some(workflow.id),
            context,
        )
        .await
    }

    /// Runs a raw definition.
    pub async fn run_definition(
        &self,
        definition: Option<&str>,
        context: &ExecutionContext,
    ) -> ExecutionResult {
        self.execute(definition, None, context).await
    }

    async fn execute(
        &self,
        definition: Option<&str>,
        workflow_id: Option<WorkflowId>,
        context: &ExecutionContext,
    ) -> ExecutionResult {
        let started_at = Utc::now();

        let definition = match WorkflowDefinition::parse(definition) {
            Ok(definition) => definition,
            Err(e) => {
                warn!(workflow_id = ?workflow_id, error = %e, "unusable workflow definition");
                return ExecutionResult::definition_failure(&e);
            }
        };

        let graph = WorkflowGraph::from_definition(&definition);
        let diagnostics = graph.diagnostics();
        if !diagnostics.is_clean() {
            debug!(
                workflow_id = ?workflow_id,
                dangling_edges = diagnostics.dangling_edges.len(),
                duplicate_node_ids = diagnostics.duplicate_node_ids.len(),
                unreachable_nodes = diagnostics.unreachable_nodes.len(),
                has_cycle = diagnostics.has_cycle,
                "workflow graph has structural issues"
            );
        }

        let Some(trigger) = TriggerMatcher::new(&graph).select(context) else {
            debug!(workflow_id = ?workflow_id, "no trigger matched");
            return ExecutionResult::no_match();
        };

        let mut trace = Trace::new();
        let label = if trigger.label.is_empty() {
            UNKNOWN_TRIGGER
        } else {
            trigger.label.as_str()
        };
        trace.push(format!("Triggered by: {label}"));

        let actions = ActionExecutor::new(self.transport.as_ref(), self.generator.as_deref(), context);
        let walker = GraphWalker::new(&graph, &actions, &context.user_text);

        let result = match walker.walk(trigger, &mut trace).await {
            Ok(end) => {
                info!(workflow_id = ?workflow_id, trigger = %trigger.id, ?end, steps = trace.len(), "workflow run succeeded");
                ExecutionResult::success(trace.into_steps())
            }
            Err(e) => {
                error!(workflow_id = ?workflow_id, node_id = %e.node_id(), error = %e, "workflow run failed");
                trace.push(format!("Error: {e}"));
                ExecutionResult::failed(trace.into_steps(), e.to_string())
            }
        };

        result
            .with_workflow_id(workflow_id)
            .with_timing(started_at, Utc::now())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::execution::ExecutionStatus;
    use async_trait::async_trait;
    use flowbot_ai::{GenerateError, GenerateRequest};
    use flowbot_core::BotId;
    use flowbot_messaging::{ChatId, ParseMode, RecordingTransport, TransportError};
    use serde_json::json;

    fn engine(transport: &RecordingTransport) -> WorkflowEngine {
        WorkflowEngine::new(Arc::new(transport.clone()))
    }

    fn start_definition() -> String {
        json!({
            "nodes": [
                { "id": "1", "type": "trigger", "data": { "label": "Command", "config": { "command": "/start" } } },
                { "id": "2", "type": "action", "data": { "label": "Send Message", "config": { "message": "ok" } } }
            ],
            "edges": [{ "id": "e1-2", "source": "1", "target": "2" }]
        })
        .to_string()
    }

    #[tokio::test]
    async fn start_command_sends_reply() {
        let transport = RecordingTransport::new();
        let context = ExecutionContext::new(ChatId(100), "/start");

        let result = engine(&transport)
            .run_definition(Some(&start_definition()), &context)
            .await;

        assert_eq!(result.status, ExecutionStatus::Success);
        assert_eq!(
            result.steps,
            vec![
                "Triggered by: Command",
                "Step 1: Command (trigger)",
                "Step 2: Send Message (action)",
            ]
        );
        assert!(result.error.is_none());
        assert!(result.started_at.is_some());

        let sent = transport.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].text, "ok");
        assert_eq!(sent[0].chat_id, ChatId(100));
        assert_eq!(sent[0].options.parse_mode, Some(ParseMode::Markdown));
    }

    #[tokio::test]
    async fn keyword_branch_end_to_end() {
        let definition = json!({
            "nodes": [
                { "id": "t", "type": "trigger", "data": { "label": "New Message" } },
                { "id": "c", "type": "condition", "data": { "label": "Keyword Match", "config": { "keywords": "sale,discount" } } },
                { "id": "a", "type": "action", "data": { "label": "Send Message", "config": { "message": "Thanks!" } } }
            ],
            "edges": [
                { "source": "t", "target": "c" },
                { "source": "c", "target": "a", "sourceHandle": "true" }
            ]
        })
        .to_string();
        let transport = RecordingTransport::new();

        let context = ExecutionContext::new(ChatId(1), "Is there a SALE?");
        let result = engine(&transport).run_definition(Some(&definition), &context).await;
        assert!(result.is_success());
        assert!(result.steps.contains(&"Condition result: true".to_string()));
        assert_eq!(transport.sent()[0].text, "Thanks!");

        let transport = RecordingTransport::new();
        let context = ExecutionContext::new(ChatId(1), "just browsing");
        let result = engine(&transport).run_definition(Some(&definition), &context).await;
        assert!(result.is_success());
        assert_eq!(result.steps.last().map(String::as_str), Some("Condition result: false"));
        assert!(transport.sent().is_empty());
    }

    #[tokio::test]
    async fn no_match_is_empty_and_sends_nothing() {
        let transport = RecordingTransport::new();
        let context = ExecutionContext::new(ChatId(1), "hello");

        let result = engine(&transport)
            .run_definition(Some(&start_definition()), &context)
            .await;

        assert_eq!(result.status, ExecutionStatus::NoMatch);
        assert!(result.steps.is_empty());
        assert!(result.workflow_id.is_none());
        assert!(transport.sent().is_empty());
    }

    #[tokio::test]
    async fn definition_failures_are_results() {
        let transport = RecordingTransport::new();
        let context = ExecutionContext::new(ChatId(1), "/start");
        let engine = engine(&transport);

        let result = engine.run_definition(None, &context).await;
        assert_eq!(result.status, ExecutionStatus::Failed);
        assert_eq!(result.steps, vec!["No definition found"]);
        assert_eq!(result.error.as_deref(), Some("Empty workflow definition"));

        let result = engine.run_definition(Some("{not json"), &context).await;
        assert_eq!(result.status, ExecutionStatus::Failed);
        assert_eq!(result.steps, vec!["Error parsing definition"]);
        assert_eq!(result.error.as_deref(), Some("Invalid JSON"));
    }

    #[tokio::test]
    async fn non_object_definition_is_no_match() {
        let transport = RecordingTransport::new();
        let context = ExecutionContext::new(ChatId(1), "/start");
        let engine = engine(&transport);

        for raw in ["[]", "42", "\"x\""] {
            let result = engine.run_definition(Some(raw), &context).await;
            assert_eq!(result.status, ExecutionStatus::NoMatch, "input {raw}");
            assert!(result.steps.is_empty());
            assert!(result.error.is_none());
        }
        assert!(transport.sent().is_empty());
    }

    #[tokio::test]
    async fn first_matching_trigger_wins_when_several_match() {
        let definition = json!({
            "nodes": [
                { "id": "a", "type": "trigger", "data": { "label": "New Message" } },
                { "id": "b", "type": "trigger", "data": { "label": "Command", "config": { "command": "/start" } } },
                { "id": "sa", "type": "action", "data": { "label": "Send Message", "config": { "message": "from a" } } },
                { "id": "sb", "type": "action", "data": { "label": "Send Message", "config": { "message": "from b" } } }
            ],
            "edges": [
                { "source": "a", "target": "sa" },
                { "source": "b", "target": "sb" }
            ]
        })
        .to_string();
        let transport = RecordingTransport::new();
        let context = ExecutionContext::new(ChatId(1), "/start");

        let result = engine(&transport).run_definition(Some(&definition), &context).await;

        assert!(result.is_success());
        assert_eq!(
            result.steps,
            vec![
                "Triggered by: New Message",
                "Step 1: New Message (trigger)",
                "Step 2: Send Message (action)",
            ]
        );
        let texts: Vec<_> = transport.sent().into_iter().map(|m| m.text).collect();
        assert_eq!(texts, vec!["from a"]);
    }

    #[tokio::test]
    async fn delivery_failure_fails_the_run() {
        let transport = RecordingTransport::failing(TransportError::Request {
            method: "sendMessage".to_string(),
            reason: "connection reset".to_string(),
        });
        let context = ExecutionContext::new(ChatId(1), "/start");

        let result = engine(&transport)
            .run_definition(Some(&start_definition()), &context)
            .await;

        assert_eq!(result.status, ExecutionStatus::Failed);
        assert_eq!(
            result.error.as_deref(),
            Some("sendMessage request failed: connection reset")
        );
        assert_eq!(
            result.steps.last().map(String::as_str),
            Some("Error: sendMessage request failed: connection reset")
        );
    }

    #[tokio::test]
    async fn unlabeled_trigger_is_reported_as_unknown() {
        let definition = json!({
            "nodes": [{ "id": "1", "type": "trigger", "data": { "config": { "command": "/go" } } }]
        })
        .to_string();
        let transport = RecordingTransport::new();
        let context = ExecutionContext::new(ChatId(1), "/go");

        let result = engine(&transport).run_definition(Some(&definition), &context).await;
        assert_eq!(result.steps[0], "Triggered by: Unknown Trigger");
    }

    #[tokio::test]
    async fn stored_workflow_runs_carry_its_id() {
        let workflow = StoredWorkflow::new(BotId::new(), "welcome", Some(start_definition()));
        let transport = RecordingTransport::new();

        let matched = engine(&transport)
            .run(&workflow, &ExecutionContext::new(ChatId(1), "/start"))
            .await;
        assert_eq!(matched.workflow_id, Some(workflow.id));

        let unmatched = engine(&transport)
            .run(&workflow, &ExecutionContext::new(ChatId(1), "hi"))
            .await;
        assert!(unmatched.workflow_id.is_none());
    }

    struct Canned(&'static str);

    #[async_trait]
    impl TextGenerator for Canned {
        async fn generate(&self, _request: &GenerateRequest) -> Result<String, GenerateError> {
            Ok(self.0.to_string())
        }
    }

    #[tokio::test]
    async fn agent_node_uses_text_generator() {
        let definition = json!({
            "nodes": [
                { "id": "t", "type": "trigger", "data": { "label": "Any Message" } },
                { "id": "ai", "type": "agent", "data": { "label": "AI Agent", "config": { "apiKey": "sk" } } }
            ],
            "edges": [{ "source": "t", "target": "ai" }]
        })
        .to_string();
        let transport = RecordingTransport::new();
        let engine = engine(&transport).with_text_generator(Arc::new(Canned("Hello from AI")));

        let result = engine
            .run_definition(Some(&definition), &ExecutionContext::new(ChatId(3), "hey"))
            .await;

        assert!(result.is_success());
        assert_eq!(result.steps.last().map(String::as_str), Some("Step 2: AI Agent (agent)"));
        assert_eq!(transport.sent()[0].text, "Hello from AI");
    }
}
