//! Inbound Telegram updates.
//!
//! Only the fields the engine reads are modelled; everything else in the
//! update payload is ignored on deserialization.

use crate::transport::ChatId;
use serde::{Deserialize, Serialize};

/// A Telegram update as delivered by webhook or `getUpdates`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Update {
    pub update_id: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<Message>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub callback_query: Option<CallbackQuery>,
}

/// A chat message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub message_id: i64,
    pub chat: Chat,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from: Option<User>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chat {
    pub id: ChatId,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    #[serde(default)]
    pub is_bot: bool,
    pub first_name: String,
}

/// A tap on an inline keyboard callback button.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallbackQuery {
    pub id: String,
    pub from: User,
    /// The bot message carrying the keyboard.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<Message>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<String>,
}

/// An update reduced to what a workflow run needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundEvent {
    /// Chat to reply into.
    pub chat_id: ChatId,
    /// Typed text, or the callback payload for button taps.
    pub text: String,
    /// First name of the user who sent the message or tapped the button.
    pub user_name: Option<String>,
    /// Callback query id when the event came from a button tap.
    pub callback_id: Option<String>,
}

impl InboundEvent {
    /// Normalizes an update.
    ///
    /// Returns `None` for updates without a chat or without text, which no
    /// workflow can react to.
    #[must_use]
    pub fn from_update(update: &Update) -> Option<Self> {
        if let Some(query) = &update.callback_query {
            let chat_id = query.message.as_ref()?.chat.id;
            let text = query.data.clone().filter(|d| !d.is_empty())?;
            return Some(Self {
                chat_id,
                text,
                user_name: Some(query.from.first_name.clone()),
                callback_id: Some(query.id.clone()),
            });
        }

        let message = update.message.as_ref()?;
        let text = message.text.clone().filter(|t| !t.is_empty())?;
        Some(Self {
            chat_id: message.chat.id,
            text,
            user_name: message.from.as_ref().map(|u| u.first_name.clone()),
            callback_id: None,
        })
    }

    /// Returns true if the event came from an inline button tap.
    #[must_use]
    pub fn is_callback(&self) -> bool {
        self.callback_id.is_some()
    }
}
