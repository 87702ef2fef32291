//! Chat authorization.
//!
//! Only chats listed in `common.allowed_chats` may use the bot.

mod allow_list;

pub use allow_list::*;

use thiserror::Error;

use crate::chat::ChatId;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthError {
    #[error("Chat {0} is not allowed to use this bot")]
    Unauthorized(ChatId),
}
