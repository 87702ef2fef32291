//! Mock chat transport for testing.

use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::chat::{ChatError, ChatId, ChatTransport, Choice, MessageRef};

/// Something the bot sent, for test assertions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SentMessage {
    Text {
        chat_id: ChatId,
        text: String,
    },
    Choices {
        chat_id: ChatId,
        prompt: String,
        choices: Vec<Choice>,
    },
    Edit {
        message: MessageRef,
        text: String,
    },
    Answer {
        callback_id: String,
        text: Option<String>,
    },
}

/// Mock implementation of the ChatTransport trait that records every
/// outgoing message.
#[derive(Debug, Default)]
pub struct MockTransport {
    sent: Arc<RwLock<Vec<SentMessage>>>,
    /// When set, every `answer_selection` fails with this API error.
    answer_error: Arc<RwLock<Option<(i64, String)>>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn sent(&self) -> Vec<SentMessage> {
        self.sent.read().await.clone()
    }

    /// The most recent message, if any.
    pub async fn last(&self) -> Option<SentMessage> {
        self.sent.read().await.last().cloned()
    }

    /// Choices of the most recently rendered list.
    pub async fn last_choices(&self) -> Option<Vec<Choice>> {
        self.sent.read().await.iter().rev().find_map(|m| match m {
            SentMessage::Choices { choices, .. } => Some(choices.clone()),
            _ => None,
        })
    }

    /// Make every later `answer_selection` fail like a stale callback does.
    pub async fn fail_answers(&self, code: i64, description: &str) {
        *self.answer_error.write().await = Some((code, description.to_string()));
    }

    async fn push(&self, message: SentMessage) {
        self.sent.write().await.push(message);
    }
}

#[async_trait]
impl ChatTransport for MockTransport {
    async fn send_text(&self, chat_id: ChatId, text: &str) -> Result<(), ChatError> {
        self.push(SentMessage::Text {
            chat_id,
            text: text.to_string(),
        })
        .await;
        Ok(())
    }

    async fn send_choices(
        &self,
        chat_id: ChatId,
        prompt: &str,
        choices: &[Choice],
    ) -> Result<(), ChatError> {
        self.push(SentMessage::Choices {
            chat_id,
            prompt: prompt.to_string(),
            choices: choices.to_vec(),
        })
        .await;
        Ok(())
    }

    async fn edit_text(&self, message: &MessageRef, text: &str) -> Result<(), ChatError> {
        self.push(SentMessage::Edit {
            message: *message,
            text: text.to_string(),
        })
        .await;
        Ok(())
    }

    async fn answer_selection(
        &self,
        callback_id: &str,
        text: Option<&str>,
    ) -> Result<(), ChatError> {
        self.push(SentMessage::Answer {
            callback_id: callback_id.to_string(),
            text: text.map(str::to_string),
        })
        .await;
        match self.answer_error.read().await.clone() {
            Some((code, description)) => Err(ChatError::Api { code, description }),
            None => Ok(()),
        }
    }
}
