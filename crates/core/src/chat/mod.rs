//! Chat transport seam and the dispatcher that drives the workflows from
//! chat events.

mod dispatcher;
mod telegram;

pub use dispatcher::*;
pub use telegram::{next_offset, parse_command, TelegramConfig, TelegramTransport, Update};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Errors from the chat transport.
#[derive(Debug, Error)]
pub enum ChatError {
    #[error("HTTP request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Chat API error {code}: {description}")]
    Api { code: i64, description: String },

    #[error("Failed to parse chat API response: {0}")]
    Format(String),
}

/// Chat identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChatId(pub i64);

impl fmt::Display for ChatId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A message previously sent by the bot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MessageRef {
    pub chat_id: ChatId,
    pub message_id: i64,
}

/// One selectable entry of a rendered list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Choice {
    pub label: String,
    /// Opaque data returned with the selection event.
    pub payload: String,
}

/// An inbound chat event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatEvent {
    /// `/keyword arg arg...`
    Command {
        chat_id: ChatId,
        keyword: String,
        args: Vec<String>,
    },
    /// A button of a rendered list was pressed.
    Selection {
        chat_id: ChatId,
        /// The message holding the list.
        message: MessageRef,
        callback_id: String,
        payload: String,
    },
}

impl ChatEvent {
    pub fn chat_id(&self) -> ChatId {
        match self {
            ChatEvent::Command { chat_id, .. } | ChatEvent::Selection { chat_id, .. } => *chat_id,
        }
    }
}

/// Outbound operations the bot needs from a chat service.
#[async_trait]
pub trait ChatTransport: Send + Sync {
    /// Send a plain text message.
    async fn send_text(&self, chat_id: ChatId, text: &str) -> Result<(), ChatError>;

    /// Render a selectable list, one choice per row.
    async fn send_choices(
        &self,
        chat_id: ChatId,
        prompt: &str,
        choices: &[Choice],
    ) -> Result<(), ChatError>;

    /// Replace the text of a previously sent message.
    async fn edit_text(&self, message: &MessageRef, text: &str) -> Result<(), ChatError>;

    /// Acknowledge a selection event, optionally with a short notice.
    async fn answer_selection(&self, callback_id: &str, text: Option<&str>)
        -> Result<(), ChatError>;
}
