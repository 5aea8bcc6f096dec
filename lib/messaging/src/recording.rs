//! A transport that records outbound traffic instead of sending it.
//!
//! Used for dry runs of a workflow and as the test double for the engine.

use crate::error::TransportError;
use crate::transport::{ChatId, MessageReceipt, MessageTransport, SendOptions, TransportFactory};
use async_trait::async_trait;
use std::sync::{Arc, Mutex, PoisonError};
use tracing::info;

/// A message captured by [`RecordingTransport`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentMessage {
    pub chat_id: ChatId,
    pub text: String,
    pub options: SendOptions,
}

#[derive(Debug, Default)]
struct Recorded {
    sent: Vec<SentMessage>,
    answered: Vec<String>,
}

/// Records every call. Clones share the same recording.
#[derive(Debug, Clone, Default)]
pub struct RecordingTransport {
    recorded: Arc<Mutex<Recorded>>,
    fail_with: Option<TransportError>,
}

impl RecordingTransport {
    /// Creates a transport that accepts every message.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a transport whose sends all fail with `error`.
    ///
    /// Callback acknowledgements still succeed.
    #[must_use]
    pub fn failing(error: TransportError) -> Self {
        Self {
            recorded: Arc::default(),
            fail_with: Some(error),
        }
    }

    /// Returns the messages sent so far, in order.
    #[must_use]
    pub fn sent(&self) -> Vec<SentMessage> {
        self.lock().sent.clone()
    }

    /// Returns the callback ids acknowledged so far, in order.
    #[must_use]
    pub fn answered(&self) -> Vec<String> {
        self.lock().answered.clone()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Recorded> {
        self.recorded.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl MessageTransport for RecordingTransport {
    async fn send_message(
        &self,
        chat_id: ChatId,
        text: &str,
        options: &SendOptions,
    ) -> Result<MessageReceipt, TransportError> {
        if let Some(err) = &self.fail_with {
            return Err(err.clone());
        }

        info!(%chat_id, text, buttons = options.reply_markup.is_some(), "recorded outbound message");
        let mut recorded = self.lock();
        recorded.sent.push(SentMessage {
            chat_id,
            text: text.to_string(),
            options: options.clone(),
        });
        Ok(MessageReceipt {
            message_id: recorded.sent.len() as i64,
        })
    }

    async fn answer_callback(
        &self,
        callback_id: &str,
        _text: Option<&str>,
    ) -> Result<(), TransportError> {
        self.lock().answered.push(callback_id.to_string());
        Ok(())
    }
}

/// Hands out clones of one [`RecordingTransport`] for every token.
impl TransportFactory for RecordingTransport {
    fn for_token(&self, _token: &str) -> Result<Arc<dyn MessageTransport>, TransportError> {
        Ok(Arc::new(self.clone()))
    }
}
