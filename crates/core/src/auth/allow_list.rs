use std::collections::HashSet;

use super::AuthError;
use crate::chat::ChatId;

/// Set of chat ids allowed to issue commands and selections.
#[derive(Debug, Clone, Default)]
pub struct ChatAllowList {
    chats: HashSet<ChatId>,
}

impl ChatAllowList {
    pub fn new(chats: impl IntoIterator<Item = i64>) -> Self {
        Self {
            chats: chats.into_iter().map(ChatId).collect(),
        }
    }

    pub fn authorize(&self, chat_id: ChatId) -> Result<(), AuthError> {
        if self.chats.contains(&chat_id) {
            Ok(())
        } else {
            Err(AuthError::Unauthorized(chat_id))
        }
    }

    pub fn len(&self) -> usize {
        self.chats.len()
    }

    /// An empty list denies everyone.
    pub fn is_empty(&self) -> bool {
        self.chats.is_empty()
    }
}
