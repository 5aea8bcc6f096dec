//! Inline keyboard markup.
//!
//! Buttons are authored as `{text, data}` pairs. A `data` value that looks
//! like a link becomes a URL button; anything else is sent back verbatim as
//! callback data when the button is tapped.

use serde::{Deserialize, Serialize};

/// A single inline keyboard button.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum InlineKeyboardButton {
    /// Opens `url` when tapped.
    Url { text: String, url: String },
    /// Delivers `callback_data` to the bot when tapped.
    Callback { text: String, callback_data: String },
}

impl InlineKeyboardButton {
    /// Builds a button from an authored `{text, data}` pair.
    #[must_use]
    pub fn from_payload(text: impl Into<String>, data: impl Into<String>) -> Self {
        let text = text.into();
        let data = data.into();
        if is_link(&data) {
            Self::Url { text, url: data }
        } else {
            Self::Callback {
                text,
                callback_data: data,
            }
        }
    }

    /// Returns the visible label.
    #[must_use]
    pub fn text(&self) -> &str {
        match self {
            Self::Url { text, .. } | Self::Callback { text, .. } => text,
        }
    }

    /// Returns true if the button navigates instead of calling back.
    #[must_use]
    pub fn is_link(&self) -> bool {
        matches!(self, Self::Url { .. })
    }
}

fn is_link(data: &str) -> bool {
    data.starts_with("http") || data.starts_with("t.me")
}

/// An inline keyboard attached to a message.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InlineKeyboardMarkup {
    /// Rows of buttons, top to bottom.
    pub inline_keyboard: Vec<Vec<InlineKeyboardButton>>,
}

impl InlineKeyboardMarkup {
    /// Lays out every button on its own row.
    #[must_use]
    pub fn single_column(buttons: impl IntoIterator<Item = InlineKeyboardButton>) -> Self {
        Self {
            inline_keyboard: buttons.into_iter().map(|b| vec![b]).collect(),
        }
    }

    /// Returns true if the keyboard has no buttons.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inline_keyboard.iter().all(Vec::is_empty)
    }
}
