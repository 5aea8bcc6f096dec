//! Trigger matching.
//!
//! Triggers are the workflow's entry points. The kind of a trigger is decided
//! once from its label and config:
//! - Command: config names a `command`, or the label contains "Command"
//! - Message: the label contains "Message"
//! - anything else is unsupported and never matches
//!
//! The first trigger (in authoring order) that matches the inbound event
//! starts the walk.

use crate::definition::JsonObject;
use crate::execution::ExecutionContext;
use crate::graph::WorkflowGraph;
use crate::node::{Node, NodeKind, config_str};
use regex::Regex;
use tracing::{debug, warn};

/// Command used when a command trigger names none.
pub const DEFAULT_COMMAND: &str = "/start";

/// Resolved trigger behavior.
#[derive(Debug, Clone)]
pub enum TriggerKind {
    /// Matches a slash command; evaluated for callback data too.
    Command { command: String },
    /// Matches message text; never matches callback events.
    Message { rule: MessageRule },
    /// Label names no known trigger.
    Unsupported,
}

/// How a message trigger compares text.
#[derive(Debug, Clone)]
pub enum MessageRule {
    /// No pattern configured.
    Any,
    /// Case-insensitive equality against the lowercased pattern (default).
    Exact(String),
    /// Case-insensitive substring against the lowercased pattern.
    Contains(String),
    /// Case-insensitive regular expression.
    Regex(Regex),
    /// Pattern cannot match (invalid regex or unknown match type).
    Never,
}

impl TriggerKind {
    /// Resolves a trigger from its label and config.
    #[must_use]
    pub fn from_config(label: &str, config: &JsonObject) -> Self {
        if let Some(command) = config_str(config, "command") {
            return Self::Command {
                command: command.to_string(),
            };
        }
        if label.contains("Command") {
            return Self::Command {
                command: DEFAULT_COMMAND.to_string(),
            };
        }
        if label.contains("Message") {
            return Self::Message {
                rule: MessageRule::from_config(config),
            };
        }
        Self::Unsupported
    }

    /// Returns true if this trigger fires for the event.
    #[must_use]
    pub fn matches(&self, text: &str, is_callback: bool) -> bool {
        match self {
            Self::Command { command } => {
                text.trim().to_lowercase() == command.trim().to_lowercase()
            }
            Self::Message { rule } => !is_callback && rule.matches(text),
            Self::Unsupported => false,
        }
    }
}

impl MessageRule {
    fn from_config(config: &JsonObject) -> Self {
        let Some(pattern) = config_str(config, "pattern") else {
            return Self::Any;
        };
        match config_str(config, "matchType") {
            Some("exact") | None => Self::Exact(pattern.to_lowercase()),
            Some("contains") => Self::Contains(pattern.to_lowercase()),
            // No look-around or back-references; such patterns are rejected here.
            Some("regex") => match Regex::new(&format!("(?i){pattern}")) {
                Ok(regex) => Self::Regex(regex),
                Err(e) => {
                    warn!(
                        pattern,
                        error = %e,
                        "unsupported or invalid trigger regex; trigger will never match"
                    );
                    Self::Never
                }
            },
            other => {
                debug!(match_type = ?other, "unknown trigger match type");
                Self::Never
            }
        }
    }

    /// Returns true if the rule accepts the text.
    #[must_use]
    pub fn matches(&self, text: &str) -> bool {
        match self {
            Self::Any => true,
            Self::Exact(pattern) => text.to_lowercase() == *pattern,
            Self::Contains(pattern) => text.to_lowercase().contains(pattern.as_str()),
            Self::Regex(regex) => regex.is_match(text),
            Self::Never => false,
        }
    }
}

/// Selects the trigger that starts a run.
#[derive(Debug, Clone, Copy)]
pub struct TriggerMatcher<'a> {
    graph: &'a WorkflowGraph,
}

impl<'a> TriggerMatcher<'a> {
    #[must_use]
    pub const fn new(graph: &'a WorkflowGraph) -> Self {
        Self { graph }
    }

    /// Returns the first trigger matching the event, if any.
    #[must_use]
    pub fn select(&self, context: &ExecutionContext) -> Option<&'a Node> {
        self.graph.triggers().find(|node| match &node.kind {
            NodeKind::Trigger(kind) => kind.matches(&context.user_text, context.is_callback),
            _ => false,
        })
    }
}
