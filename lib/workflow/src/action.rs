//! Action and agent node execution.
//!
//! Executing a node is the only place a run has side effects. A failed send
//! or generation is returned as an [`ActionError`] and aborts the walk;
//! nothing is retried here.

use crate::definition::JsonObject;
use crate::error::ActionError;
use crate::execution::{ExecutionContext, Trace};
use crate::node::{Node, NodeKind, config_str};
use flowbot_ai::{AiProvider, GenerateError, GenerateRequest, PromptTemplate, PromptVariables, TextGenerator};
use flowbot_messaging::{InlineKeyboardButton, InlineKeyboardMarkup, MessageTransport, SendOptions};
use serde_json::Value as JsonValue;
use tracing::{debug, info};

/// Text sent when a send action has no message configured.
pub const FALLBACK_MESSAGE: &str = "No message configured";

/// User prompt used when an agent node configures none.
pub const DEFAULT_USER_MESSAGE: &str = "{{last_message}}";

/// An authored inline button.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ButtonSpec {
    pub text: String,
    pub data: String,
}

impl ButtonSpec {
    fn from_json(value: &JsonValue) -> Self {
        let field = |key: &str| {
            value
                .get(key)
                .and_then(JsonValue::as_str)
                .unwrap_or_default()
                .to_string()
        };
        Self {
            text: field("text"),
            data: field("data"),
        }
    }

    /// Renders the button for the Bot API.
    #[must_use]
    pub fn to_button(&self) -> InlineKeyboardButton {
        InlineKeyboardButton::from_payload(self.text.clone(), self.data.clone())
    }
}

/// Resolved action behavior.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionKind {
    /// Send a text message, optionally with one button per row.
    SendMessage {
        message: String,
        buttons: Vec<ButtonSpec>,
    },
    /// Label names no known action; skipped.
    Unsupported,
}

impl ActionKind {
    /// Resolves an action from its label and config.
    #[must_use]
    pub fn from_config(label: &str, config: &JsonObject) -> Self {
        if !(label.contains("Send") || label.contains("Reply")) {
            return Self::Unsupported;
        }

        let message = config_str(config, "message").unwrap_or(FALLBACK_MESSAGE);
        let buttons = config
            .get("buttons")
            .and_then(JsonValue::as_array)
            .map(|buttons| buttons.iter().map(ButtonSpec::from_json).collect())
            .unwrap_or_default();

        Self::SendMessage {
            message: message.to_string(),
            buttons,
        }
    }

    /// Builds the send options for a send action.
    #[must_use]
    pub fn send_options(buttons: &[ButtonSpec]) -> SendOptions {
        let keyboard = InlineKeyboardMarkup::single_column(buttons.iter().map(ButtonSpec::to_button));
        SendOptions::markdown().with_keyboard(keyboard)
    }
}

/// Configuration of an agent node.
#[derive(Clone, PartialEq, Eq)]
pub struct AgentConfig {
    pub provider: AiProvider,
    pub api_key: Option<String>,
    pub model: Option<String>,
    pub system_message: PromptTemplate,
    pub user_message: PromptTemplate,
}

impl AgentConfig {
    /// Resolves an agent from its config.
    #[must_use]
    pub fn from_config(config: &JsonObject) -> Self {
        Self {
            provider: AiProvider::from_config(config_str(config, "provider")),
            api_key: config_str(config, "apiKey").map(str::to_string),
            model: config_str(config, "model").map(str::to_string),
            system_message: PromptTemplate::new(
                config_str(config, "systemMessage").unwrap_or_default(),
            ),
            user_message: PromptTemplate::new(
                config_str(config, "userMessage").unwrap_or(DEFAULT_USER_MESSAGE),
            ),
        }
    }

    /// Builds the generation request for an inbound event.
    ///
    /// # Errors
    ///
    /// Returns [`GenerateError::InvalidConfig`] if no API key is configured.
    pub fn request(&self, context: &ExecutionContext) -> Result<GenerateRequest, GenerateError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| GenerateError::InvalidConfig {
                reason: format!("{} agent has no apiKey", self.provider),
            })?;

        let mut variables = PromptVariables::new();
        variables.insert("last_message".to_string(), context.user_text.clone());
        variables.insert(
            "user_name".to_string(),
            context.user_name.clone().unwrap_or_default(),
        );

        let request = GenerateRequest::new(
            self.provider,
            api_key,
            self.system_message.render(&variables),
            self.user_message.render(&variables),
        );
        Ok(match &self.model {
            Some(model) => request.with_model(model.clone()),
            None => request,
        })
    }
}

impl std::fmt::Debug for AgentConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AgentConfig")
            .field("provider", &self.provider)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("model", &self.model)
            .field("system_message", &self.system_message)
            .field("user_message", &self.user_message)
            .finish()
    }
}

/// Performs the side effects of action and agent nodes.
pub struct ActionExecutor<'a> {
    transport: &'a dyn MessageTransport,
    generator: Option<&'a dyn TextGenerator>,
    context: &'a ExecutionContext,
}

impl<'a> ActionExecutor<'a> {
    #[must_use]
    pub fn new(
        transport: &'a dyn MessageTransport,
        generator: Option<&'a dyn TextGenerator>,
        context: &'a ExecutionContext,
    ) -> Self {
        Self {
            transport,
            generator,
            context,
        }
    }

    /// Executes a node. Nodes without side effects are ignored.
    ///
    /// # Errors
    ///
    /// Returns an error if sending or generating fails.
    pub async fn execute(&self, node: &Node, trace: &mut Trace) -> Result<(), ActionError> {
        match &node.kind {
            NodeKind::Action(ActionKind::SendMessage { message, buttons }) => {
                self.send(node, message, &ActionKind::send_options(buttons)).await
            }
            NodeKind::Action(ActionKind::Unsupported) => {
                debug!(node_id = %node.id, label = %node.label, "skipping unsupported action");
                trace.push(format!("Skipped: unsupported action \"{}\"", node.label));
                Ok(())
            }
            NodeKind::Agent(agent) => self.run_agent(node, agent, trace).await,
            _ => Ok(()),
        }
    }

    async fn send(&self, node: &Node, text: &str, options: &SendOptions) -> Result<(), ActionError> {
        let receipt = self
            .transport
            .send_message(self.context.chat_id, text, options)
            .await
            .map_err(|source| ActionError::Delivery {
                node_id: node.id.clone(),
                source,
            })?;
        info!(
            node_id = %node.id,
            chat_id = %self.context.chat_id,
            message_id = receipt.message_id,
            "sent message"
        );
        Ok(())
    }

    async fn run_agent(
        &self,
        node: &Node,
        agent: &AgentConfig,
        trace: &mut Trace,
    ) -> Result<(), ActionError> {
        let Some(generator) = self.generator else {
            debug!(node_id = %node.id, "no text generator configured; skipping agent");
            trace.push(format!(
                "Skipped: no text generator configured for \"{}\"",
                node.label
            ));
            return Ok(());
        };

        let generation_error = |source: GenerateError| ActionError::Generation {
            node_id: node.id.clone(),
            source,
        };
        let request = agent.request(self.context).map_err(generation_error)?;
        debug!(
            node_id = %node.id,
            provider = %request.provider,
            model = request.effective_model(),
            "generating agent reply"
        );
        let reply = generator.generate(&request).await.map_err(generation_error)?;
        self.send(node, &reply, &SendOptions::markdown()).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::NodeId;
    use async_trait::async_trait;
    use flowbot_messaging::{ChatId, ParseMode, RecordingTransport, TransportError};
    use serde_json::json;
    use std::sync::Mutex;

    fn action(label: &str, config: JsonValue) -> Node {
        node("action", label, config)
    }

    fn node(node_type: &str, label: &str, config: JsonValue) -> Node {
        let spec = serde_json::from_value(json!({
            "id": "n1",
            "type": node_type,
            "data": { "label": label, "config": config }
        }))
        .expect("node");
        Node::from_spec(&spec)
    }

    /// Echoes the prompts back and records every request.
    #[derive(Default)]
    struct EchoGenerator {
        requests: Mutex<Vec<GenerateRequest>>,
    }

    #[async_trait]
    impl TextGenerator for EchoGenerator {
        async fn generate(&self, request: &GenerateRequest) -> Result<String, GenerateError> {
            self.requests.lock().expect("lock").push(request.clone());
            Ok(format!("echo: {}", request.user))
        }
    }

    struct FailingGenerator;

    #[async_trait]
    impl TextGenerator for FailingGenerator {
        async fn generate(&self, request: &GenerateRequest) -> Result<String, GenerateError> {
            Err(GenerateError::RequestFailed {
                provider: request.provider,
                reason: "quota exceeded".to_string(),
            })
        }
    }

    #[test]
    fn send_resolution() {
        let kind = ActionKind::from_config("Send Message", json!({ "message": "hi" }).as_object().expect("object"));
        assert_eq!(
            kind,
            ActionKind::SendMessage {
                message: "hi".to_string(),
                buttons: vec![]
            }
        );

        let kind = ActionKind::from_config("Reply", &JsonObject::new());
        assert!(matches!(kind, ActionKind::SendMessage { message, .. } if message == FALLBACK_MESSAGE));

        let kind = ActionKind::from_config("Delete Message", &JsonObject::new());
        assert_eq!(kind, ActionKind::Unsupported);
    }

    #[test]
    fn buttons_render_one_per_row() {
        let kind = ActionKind::from_config(
            "Send Message",
            json!({
                "message": "pick",
                "buttons": [
                    { "text": "Site", "data": "https://example.com" },
                    { "text": "Channel", "data": "t.me/flowbot" },
                    { "text": "Yes", "data": "cb1" }
                ]
            })
            .as_object()
            .expect("object"),
        );
        let ActionKind::SendMessage { buttons, .. } = kind else {
            panic!("expected send action");
        };

        let options = ActionKind::send_options(&buttons);
        assert_eq!(options.parse_mode, Some(ParseMode::Markdown));
        let keyboard = options.reply_markup.expect("keyboard");
        assert_eq!(keyboard.inline_keyboard.len(), 3);
        assert!(keyboard.inline_keyboard.iter().all(|row| row.len() == 1));
        assert_eq!(
            keyboard.inline_keyboard[0][0],
            InlineKeyboardButton::Url {
                text: "Site".to_string(),
                url: "https://example.com".to_string()
            }
        );
        assert!(keyboard.inline_keyboard[1][0].is_link());
        assert_eq!(
            keyboard.inline_keyboard[2][0],
            InlineKeyboardButton::Callback {
                text: "Yes".to_string(),
                callback_data: "cb1".to_string()
            }
        );
    }

    #[test]
    fn no_buttons_means_no_keyboard() {
        let options = ActionKind::send_options(&[]);
        assert!(options.reply_markup.is_none());
    }

    #[tokio::test]
    async fn send_action_delivers_to_chat() {
        let transport = RecordingTransport::new();
        let context = ExecutionContext::new(ChatId(42), "/start");
        let executor = ActionExecutor::new(&transport, None, &context);
        let mut trace = Trace::new();

        executor
            .execute(&action("Send Message", json!({ "message": "ok" })), &mut trace)
            .await
            .expect("sent");

        let sent = transport.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].chat_id, ChatId(42));
        assert_eq!(sent[0].text, "ok");
        assert!(trace.is_empty());
    }

    #[tokio::test]
    async fn delivery_failure_is_an_action_error() {
        let transport = RecordingTransport::failing(TransportError::Rejected {
            method: "sendMessage".to_string(),
            error_code: Some(403),
            description: "Forbidden: bot was blocked by the user".to_string(),
        });
        let context = ExecutionContext::new(ChatId(1), "/start");
        let executor = ActionExecutor::new(&transport, None, &context);

        let err = executor
            .execute(&action("Send Message", json!({})), &mut Trace::new())
            .await
            .expect_err("should fail");
        assert!(matches!(err, ActionError::Delivery { .. }));
        assert_eq!(err.node_id(), &NodeId::from("n1"));
    }

    #[tokio::test]
    async fn unsupported_action_is_skipped_in_trace() {
        let transport = RecordingTransport::new();
        let context = ExecutionContext::new(ChatId(1), "x");
        let executor = ActionExecutor::new(&transport, None, &context);
        let mut trace = Trace::new();

        executor
            .execute(&action("Delete Message", json!({})), &mut trace)
            .await
            .expect("skipped");
        assert!(transport.sent().is_empty());
        assert_eq!(trace.steps(), ["Skipped: unsupported action \"Delete Message\""]);
    }

    #[tokio::test]
    async fn agent_renders_prompts_and_sends_reply() {
        let transport = RecordingTransport::new();
        let generator = EchoGenerator::default();
        let context = ExecutionContext::new(ChatId(5), "what's up?").with_user_name("Ada");
        let executor = ActionExecutor::new(&transport, Some(&generator), &context);
        let agent = node(
            "agent",
            "AI Agent",
            json!({
                "provider": "gemini",
                "apiKey": "key",
                "model": "gemini-1.5-flash",
                "systemMessage": "You are talking to {{user_name}}."
            }),
        );

        executor.execute(&agent, &mut Trace::new()).await.expect("ran");

        let requests = generator.requests.lock().expect("lock").clone();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].provider, AiProvider::Gemini);
        assert_eq!(requests[0].system, "You are talking to Ada.");
        assert_eq!(requests[0].user, "what's up?");
        assert_eq!(requests[0].effective_model(), "gemini-1.5-flash");
        assert_eq!(transport.sent()[0].text, "echo: what's up?");
    }

    #[tokio::test]
    async fn agent_without_generator_is_skipped() {
        let transport = RecordingTransport::new();
        let context = ExecutionContext::new(ChatId(5), "hi");
        let executor = ActionExecutor::new(&transport, None, &context);
        let mut trace = Trace::new();

        executor
            .execute(&node("agent", "AI Agent", json!({ "apiKey": "k" })), &mut trace)
            .await
            .expect("skipped");
        assert!(transport.sent().is_empty());
        assert_eq!(
            trace.steps(),
            ["Skipped: no text generator configured for \"AI Agent\""]
        );
    }

    #[tokio::test]
    async fn agent_failures_are_generation_errors() {
        let transport = RecordingTransport::new();
        let context = ExecutionContext::new(ChatId(5), "hi");
        let executor = ActionExecutor::new(&transport, Some(&FailingGenerator), &context);

        let err = executor
            .execute(&node("agent", "AI Agent", json!({ "apiKey": "k" })), &mut Trace::new())
            .await
            .expect_err("should fail");
        assert!(err.to_string().contains("quota exceeded"));

        let generator = EchoGenerator::default();
        let executor = ActionExecutor::new(&transport, Some(&generator), &context);
        let err = executor
            .execute(&node("agent", "AI Agent", json!({})), &mut Trace::new())
            .await
            .expect_err("missing key");
        assert!(matches!(
            err,
            ActionError::Generation {
                source: GenerateError::InvalidConfig { .. },
                ..
            }
        ));
        assert!(transport.sent().is_empty());
    }
}
