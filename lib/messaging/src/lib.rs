//! Chat messaging for flowbot.
//!
//! The workflow engine only ever talks to a [`MessageTransport`]. This crate
//! defines that seam together with:
//!
//! - **Keyboards**: inline keyboard markup built from `{text, data}` button pairs
//! - **Telegram**: a Bot API client implementing the transport
//! - **Updates**: inbound Telegram updates and their normalized [`InboundEvent`]
//! - **Recording**: an in-process transport that records instead of sending

pub mod error;
pub mod keyboard;
pub mod recording;
pub mod telegram;
pub mod transport;
pub mod update;

pub use error::TransportError;
pub use keyboard::{InlineKeyboardButton, InlineKeyboardMarkup};
pub use recording::{RecordingTransport, SentMessage};
pub use telegram::{TelegramClient, TelegramSettings, TelegramTransportFactory};
pub use transport::{
    ChatId, MessageReceipt, MessageTransport, ParseMode, SendOptions, TransportFactory,
};
pub use update::{CallbackQuery, Chat, InboundEvent, Message, Update, User};
