//! Telegram Bot API client.

use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use std::time::Duration;
use tracing::debug;

use super::{ChatError, ChatEvent, ChatId, ChatTransport, Choice, MessageRef};
use crate::config::CommonConfig;

pub const DEFAULT_API_URL: &str = "https://api.telegram.org";
pub const DEFAULT_POLL_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Clone)]
pub struct TelegramConfig {
    pub bot_token: String,
    pub api_url: String,
    /// Long-poll timeout passed to `getUpdates`.
    pub poll_timeout_secs: u64,
}

impl TelegramConfig {
    pub fn from_common(common: &CommonConfig) -> Self {
        Self {
            bot_token: common.bot_token.clone(),
            api_url: common
                .api_url
                .clone()
                .unwrap_or_else(|| DEFAULT_API_URL.to_string())
                .trim_end_matches('/')
                .to_string(),
            poll_timeout_secs: DEFAULT_POLL_TIMEOUT_SECS,
        }
    }
}

pub struct TelegramTransport {
    client: Client,
    config: TelegramConfig,
}

/// Envelope around every Bot API answer.
#[derive(Debug, Deserialize)]
struct ApiResponse<T> {
    ok: bool,
    result: Option<T>,
    description: Option<String>,
    error_code: Option<i64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Update {
    pub update_id: i64,
    #[serde(default)]
    message: Option<Message>,
    #[serde(default)]
    callback_query: Option<CallbackQuery>,
}

#[derive(Debug, Clone, Deserialize)]
struct Message {
    message_id: i64,
    chat: Chat,
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
struct Chat {
    id: i64,
}

#[derive(Debug, Clone, Deserialize)]
struct CallbackQuery {
    id: String,
    #[serde(default)]
    message: Option<Message>,
    #[serde(default)]
    data: Option<String>,
}

impl Update {
    /// The chat event carried by this update, if it is one the bot handles.
    pub fn into_event(self) -> Option<ChatEvent> {
        if let Some(query) = self.callback_query {
            let message = query.message?;
            let chat_id = ChatId(message.chat.id);
            return Some(ChatEvent::Selection {
                chat_id,
                message: MessageRef {
                    chat_id,
                    message_id: message.message_id,
                },
                callback_id: query.id,
                payload: query.data.unwrap_or_default(),
            });
        }

        let message = self.message?;
        let (keyword, args) = parse_command(message.text.as_deref()?)?;
        Some(ChatEvent::Command {
            chat_id: ChatId(message.chat.id),
            keyword,
            args,
        })
    }
}

/// Split `/keyword@botname arg arg` into a lowercase keyword and arguments.
/// Returns None for text that is not a command.
pub fn parse_command(text: &str) -> Option<(String, Vec<String>)> {
    let mut parts = text.split_whitespace();
    let head = parts.next()?.strip_prefix('/')?;
    let keyword = head.split('@').next().unwrap_or_default();
    if keyword.is_empty() {
        return None;
    }
    Some((
        keyword.to_lowercase(),
        parts.map(str::to_string).collect(),
    ))
}

/// Offset for the next `getUpdates`: one past the highest update seen.
pub fn next_offset(current: i64, updates: &[Update]) -> i64 {
    updates
        .iter()
        .map(|u| u.update_id + 1)
        .fold(current, i64::max)
}

fn inline_keyboard(choices: &[Choice]) -> Value {
    let rows: Vec<Value> = choices
        .iter()
        .map(|c| json!([{ "text": c.label, "callback_data": c.payload }]))
        .collect();
    json!({ "inline_keyboard": rows })
}

impl TelegramTransport {
    pub fn new(config: TelegramConfig) -> Result<Self, ChatError> {
        // Must outlive the long poll.
        let client = Client::builder()
            .timeout(Duration::from_secs(config.poll_timeout_secs + 15))
            .build()?;
        Ok(Self { client, config })
    }

    async fn call<T: DeserializeOwned>(&self, method: &str, body: Value) -> Result<T, ChatError> {
        // The URL embeds the token, so it is stripped from every error.
        let url = format!(
            "{}/bot{}/{}",
            self.config.api_url, self.config.bot_token, method
        );
        debug!(method, "Telegram API call");

        let response = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(reqwest::Error::without_url)?;
        let text = response
            .text()
            .await
            .map_err(reqwest::Error::without_url)?;
        let envelope: ApiResponse<T> =
            serde_json::from_str(&text).map_err(|e| ChatError::Format(e.to_string()))?;

        if !envelope.ok {
            return Err(ChatError::Api {
                code: envelope.error_code.unwrap_or_default(),
                description: envelope.description.unwrap_or_default(),
            });
        }
        envelope
            .result
            .ok_or_else(|| ChatError::Format(format!("{} returned no result", method)))
    }

    /// Long-poll for updates after `offset`.
    pub async fn get_updates(&self, offset: i64) -> Result<Vec<Update>, ChatError> {
        self.call(
            "getUpdates",
            json!({
                "offset": offset,
                "timeout": self.config.poll_timeout_secs,
                "allowed_updates": ["message", "callback_query"],
            }),
        )
        .await
    }
}

#[async_trait]
impl ChatTransport for TelegramTransport {
    async fn send_text(&self, chat_id: ChatId, text: &str) -> Result<(), ChatError> {
        self.call::<Value>("sendMessage", json!({ "chat_id": chat_id.0, "text": text }))
            .await?;
        Ok(())
    }

    async fn send_choices(
        &self,
        chat_id: ChatId,
        prompt: &str,
        choices: &[Choice],
    ) -> Result<(), ChatError> {
        self.call::<Value>(
            "sendMessage",
            json!({
                "chat_id": chat_id.0,
                "text": prompt,
                "reply_markup": inline_keyboard(choices),
            }),
        )
        .await?;
        Ok(())
    }

    async fn edit_text(&self, message: &MessageRef, text: &str) -> Result<(), ChatError> {
        self.call::<Value>(
            "editMessageText",
            json!({
                "chat_id": message.chat_id.0,
                "message_id": message.message_id,
                "text": text,
            }),
        )
        .await?;
        Ok(())
    }

    async fn answer_selection(
        &self,
        callback_id: &str,
        text: Option<&str>,
    ) -> Result<(), ChatError> {
        let mut body = json!({ "callback_query_id": callback_id });
        if let Some(text) = text {
            body["text"] = json!(text);
        }
        self.call::<Value>("answerCallbackQuery", body).await?;
        Ok(())
    }
}
