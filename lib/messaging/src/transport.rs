//! The outbound messaging seam.
//!
//! The engine depends on [`MessageTransport`] only, so workflows can be run
//! against the real Bot API, a dry-run recorder, or a test double.

use crate::error::TransportError;
use crate::keyboard::InlineKeyboardMarkup;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Identifier of a chat on the messaging platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChatId(pub i64);

impl fmt::Display for ChatId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for ChatId {
    fn from(id: i64) -> Self {
        Self(id)
    }
}

/// Text formatting applied by the platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ParseMode {
    Markdown,
    MarkdownV2,
    #[serde(rename = "HTML")]
    Html,
}

/// Optional parameters of an outbound message.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SendOptions {
    /// Formatting mode for the text.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parse_mode: Option<ParseMode>,
    /// Inline keyboard shown under the message.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reply_markup: Option<InlineKeyboardMarkup>,
}

impl SendOptions {
    /// Options for a Markdown-formatted message without keyboard.
    #[must_use]
    pub fn markdown() -> Self {
        Self {
            parse_mode: Some(ParseMode::Markdown),
            reply_markup: None,
        }
    }

    /// Attaches an inline keyboard. Empty keyboards are dropped.
    #[must_use]
    pub fn with_keyboard(mut self, keyboard: InlineKeyboardMarkup) -> Self {
        self.reply_markup = (!keyboard.is_empty()).then_some(keyboard);
        self
    }
}

/// Acknowledgement of a delivered message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageReceipt {
    /// Platform id of the sent message.
    pub message_id: i64,
}

/// Capability to send chat messages and acknowledge button taps.
#[async_trait]
pub trait MessageTransport: Send + Sync {
    /// Sends `text` to `chat_id`.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the platform rejects it.
    async fn send_message(
        &self,
        chat_id: ChatId,
        text: &str,
        options: &SendOptions,
    ) -> Result<MessageReceipt, TransportError>;

    /// Acknowledges a callback query so the client stops its spinner.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the platform rejects it.
    async fn answer_callback(
        &self,
        callback_id: &str,
        text: Option<&str>,
    ) -> Result<(), TransportError>;
}

/// Builds a transport bound to one bot's credentials.
///
/// A fresh handle is requested for every workflow run.
pub trait TransportFactory: Send + Sync {
    /// Creates a transport authenticated with `token`.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying client cannot be constructed.
    fn for_token(&self, token: &str) -> Result<Arc<dyn MessageTransport>, TransportError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keyboard::InlineKeyboardButton;

    #[test]
    fn markdown_options_serialize_without_keyboard() {
        let json = serde_json::to_value(SendOptions::markdown()).expect("serialize");
        assert_eq!(json, serde_json::json!({ "parse_mode": "Markdown" }));
    }

    #[test]
    fn empty_keyboard_is_dropped() {
        let options = SendOptions::markdown().with_keyboard(InlineKeyboardMarkup::default());
        assert!(options.reply_markup.is_none());
    }

    #[test]
    fn keyboard_is_attached() {
        let keyboard =
            InlineKeyboardMarkup::single_column([InlineKeyboardButton::from_payload("A", "a")]);
        let options = SendOptions::markdown().with_keyboard(keyboard.clone());
        assert_eq!(options.reply_markup, Some(keyboard));
    }

    #[test]
    fn html_parse_mode_uses_platform_name() {
        let json = serde_json::to_string(&ParseMode::Html).expect("serialize");
        assert_eq!(json, "\"HTML\"");
    }
}
