//! Telegram Bot API client.
//!
//! Every method is a JSON `POST {base}/bot{token}/{method}`. Responses come
//! wrapped in an `{ok, result, description, error_code}` envelope; an
//! `ok: false` envelope is surfaced as [`TransportError::Rejected`].

use crate::error::TransportError;
use crate::transport::{
    ChatId, MessageReceipt, MessageTransport, ParseMode, SendOptions, TransportFactory,
};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, instrument, warn};

/// Default Bot API endpoint.
pub const DEFAULT_API_BASE_URL: &str = "https://api.telegram.org";

/// Connection settings shared by every client built from the same config.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TelegramSettings {
    /// Base URL of the Bot API, without trailing slash.
    pub api_base_url: String,
    /// Per-request timeout.
    pub request_timeout: Duration,
}

impl Default for TelegramSettings {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            request_timeout: Duration::from_secs(30),
        }
    }
}

/// Response envelope returned by every Bot API method.
#[derive(Debug, Deserialize)]
struct ApiResponse<T> {
    ok: bool,
    result: Option<T>,
    description: Option<String>,
    error_code: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct SentMessageBody {
    message_id: i64,
}

#[derive(Serialize)]
struct SendMessageRequest<'a> {
    chat_id: ChatId,
    text: &'a str,
    #[serde(flatten)]
    options: &'a SendOptions,
}

/// A Bot API client bound to one bot token.
#[derive(Clone)]
pub struct TelegramClient {
    http: reqwest::Client,
    base_url: String,
    token: String,
}

impl fmt::Debug for TelegramClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TelegramClient")
            .field("base_url", &self.base_url)
            .field("token", &"<redacted>")
            .finish()
    }
}

impl TelegramClient {
    /// Creates a client with default settings.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be initialized.
    pub fn new(token: impl Into<String>) -> Result<Self, TransportError> {
        Self::with_settings(token, &TelegramSettings::default())
    }

    /// Creates a client with explicit settings.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be initialized.
    pub fn with_settings(
        token: impl Into<String>,
        settings: &TelegramSettings,
    ) -> Result<Self, TransportError> {
        let http = reqwest::Client::builder()
            .timeout(settings.request_timeout)
            .build()
            .map_err(|e| TransportError::Setup {
                reason: e.to_string(),
            })?;

        Ok(Self {
            http,
            base_url: settings.api_base_url.trim_end_matches('/').to_string(),
            token: token.into(),
        })
    }

    fn endpoint(&self, method: &str) -> String {
        format!("{}/bot{}/{}", self.base_url, self.token, method)
    }

    async fn call<T: DeserializeOwned>(
        &self,
        method: &str,
        payload: &impl Serialize,
    ) -> Result<T, TransportError> {
        let response = self
            .http
            .post(self.endpoint(method))
            .json(payload)
            .send()
            .await
            .map_err(|e| TransportError::Request {
                method: method.to_string(),
                reason: e.without_url().to_string(),
            })?;

        let status = response.status();
        let envelope: ApiResponse<T> =
            response
                .json()
                .await
                .map_err(|e| TransportError::InvalidResponse {
                    method: method.to_string(),
                    reason: format!("HTTP {status}: {}", e.without_url()),
                })?;

        unwrap_envelope(method, envelope)
    }

    /// Sends a text message.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or is rejected.
    #[instrument(skip_all, fields(chat_id = %chat_id))]
    pub async fn send_message(
        &self,
        chat_id: ChatId,
        text: &str,
        options: &SendOptions,
    ) -> Result<MessageReceipt, TransportError> {
        let request = SendMessageRequest {
            chat_id,
            text,
            options,
        };
        let body: SentMessageBody = self.call("sendMessage", &request).await?;
        debug!(message_id = body.message_id, "message delivered");
        Ok(MessageReceipt {
            message_id: body.message_id,
        })
    }

    /// Sends a photo by URL or file id.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or is rejected.
    #[instrument(skip_all, fields(chat_id = %chat_id))]
    pub async fn send_photo(
        &self,
        chat_id: ChatId,
        photo: &str,
        caption: Option<&str>,
    ) -> Result<MessageReceipt, TransportError> {
        let payload = json!({
            "chat_id": chat_id,
            "photo": photo,
            "caption": caption,
            "parse_mode": ParseMode::Markdown,
        });
        let body: SentMessageBody = self.call("sendPhoto", &payload).await?;
        Ok(MessageReceipt {
            message_id: body.message_id,
        })
    }

    /// Acknowledges a callback query.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or is rejected.
    #[instrument(skip_all, fields(callback_query_id = %callback_query_id))]
    pub async fn answer_callback_query(
        &self,
        callback_query_id: &str,
        text: Option<&str>,
    ) -> Result<(), TransportError> {
        let payload = json!({
            "callback_query_id": callback_query_id,
            "text": text,
        });
        let _: bool = self.call("answerCallbackQuery", &payload).await?;
        Ok(())
    }

    /// Deletes a message from a chat.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or is rejected.
    #[instrument(skip_all, fields(chat_id = %chat_id, message_id = message_id))]
    pub async fn delete_message(
        &self,
        chat_id: ChatId,
        message_id: i64,
    ) -> Result<(), TransportError> {
        let payload = json!({
            "chat_id": chat_id,
            "message_id": message_id,
        });
        let _: bool = self.call("deleteMessage", &payload).await?;
        Ok(())
    }
}

fn unwrap_envelope<T>(method: &str, envelope: ApiResponse<T>) -> Result<T, TransportError> {
    if !envelope.ok {
        let description = envelope
            .description
            .unwrap_or_else(|| "no description".to_string());
        warn!(method, error_code = ?envelope.error_code, %description, "Bot API rejected call");
        return Err(TransportError::Rejected {
            method: method.to_string(),
            error_code: envelope.error_code,
            description,
        });
    }

    envelope.result.ok_or_else(|| TransportError::InvalidResponse {
        method: method.to_string(),
        reason: "missing result".to_string(),
    })
}

#[async_trait]
impl MessageTransport for TelegramClient {
    async fn send_message(
        &self,
        chat_id: ChatId,
        text: &str,
        options: &SendOptions,
    ) -> Result<MessageReceipt, TransportError> {
        TelegramClient::send_message(self, chat_id, text, options).await
    }

    async fn answer_callback(
        &self,
        callback_id: &str,
        text: Option<&str>,
    ) -> Result<(), TransportError> {
        self.answer_callback_query(callback_id, text).await
    }
}

/// Builds a new [`TelegramClient`] per bot token.
#[derive(Debug, Clone, Default)]
pub struct TelegramTransportFactory {
    settings: TelegramSettings,
}

impl TelegramTransportFactory {
    /// Creates a factory using the given settings.
    #[must_use]
    pub fn new(settings: TelegramSettings) -> Self {
        Self { settings }
    }
}

impl TransportFactory for TelegramTransportFactory {
    fn for_token(&self, token: &str) -> Result<Arc<dyn MessageTransport>, TransportError> {
        let client = TelegramClient::with_settings(token, &self.settings)?;
        Ok(Arc::new(client))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keyboard::{InlineKeyboardButton, InlineKeyboardMarkup};

    #[test]
    fn endpoint_includes_token_and_method() {
        let settings = TelegramSettings {
            api_base_url: "http://localhost:8081/".to_string(),
            ..TelegramSettings::default()
        };
        let client = TelegramClient::with_settings("123:abc", &settings).expect("client");
        assert_eq!(
            client.endpoint("sendMessage"),
            "http://localhost:8081/bot123:abc/sendMessage"
        );
    }

    #[test]
    fn debug_output_redacts_token() {
        let client = TelegramClient::new("123:secret").expect("client");
        let debug = format!("{client:?}");
        assert!(!debug.contains("secret"));
        assert!(debug.contains("<redacted>"));
    }

    #[test]
    fn send_message_request_flattens_options() {
        let keyboard = InlineKeyboardMarkup::single_column([InlineKeyboardButton::from_payload(
            "Go", "go",
        )]);
        let options = SendOptions::markdown().with_keyboard(keyboard);
        let request = SendMessageRequest {
            chat_id: ChatId(42),
            text: "hi",
            options: &options,
        };
        let json = serde_json::to_value(&request).expect("serialize");
        assert_eq!(
            json,
            json!({
                "chat_id": 42,
                "text": "hi",
                "parse_mode": "Markdown",
                "reply_markup": { "inline_keyboard": [[{ "text": "Go", "callback_data": "go" }]] }
            })
        );
    }

    #[test]
    fn rejected_envelope_becomes_error() {
        let envelope: ApiResponse<SentMessageBody> = serde_json::from_value(json!({
            "ok": false,
            "error_code": 403,
            "description": "Forbidden: bot was blocked by the user"
        }))
        .expect("deserialize");

        let err = unwrap_envelope("sendMessage", envelope).expect_err("should reject");
        assert_eq!(
            err,
            TransportError::Rejected {
                method: "sendMessage".to_string(),
                error_code: Some(403),
                description: "Forbidden: bot was blocked by the user".to_string(),
            }
        );
    }

    #[test]
    fn ok_envelope_yields_result() {
        let envelope: ApiResponse<SentMessageBody> = serde_json::from_value(json!({
            "ok": true,
            "result": { "message_id": 7, "chat": { "id": 1 }, "date": 0 }
        }))
        .expect("deserialize");

        let body = unwrap_envelope("sendMessage", envelope).expect("ok");
        assert_eq!(body.message_id, 7);
    }

    #[test]
    fn ok_envelope_without_result_is_invalid() {
        let envelope: ApiResponse<bool> =
            serde_json::from_value(json!({ "ok": true })).expect("deserialize");
        let err = unwrap_envelope("deleteMessage", envelope).expect_err("should fail");
        assert!(matches!(err, TransportError::InvalidResponse { .. }));
    }

    #[test]
    fn factory_builds_transport() {
        let factory = TelegramTransportFactory::default();
        assert!(factory.for_token("123:abc").is_ok());
    }
}
