//! Session-less correlation between a rendered candidate and the later
//! button press that selects it.
//!
//! The token carries everything the acquisition needs, so nothing is kept
//! server-side between the two events. Replaying a token is harmless: the
//! library membership check turns a second acquisition into a no-op.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::backend::ItemId;

/// Telegram's limit on callback data.
pub const MAX_TOKEN_LEN: usize = 64;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CorrelationError {
    #[error("Malformed correlation token: {0}")]
    Decode(String),

    #[error("Failed to encode correlation token: {0}")]
    Encode(String),

    #[error("Correlation token is {0} bytes, limit is {MAX_TOKEN_LEN}")]
    TooLong(usize),
}

/// `{item_id, connector_name}` round-tripped through the chat transport.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CorrelationToken {
    pub item_id: ItemId,
    pub connector_name: String,
}

impl CorrelationToken {
    pub fn new(item_id: ItemId, connector_name: impl Into<String>) -> Self {
        Self {
            item_id,
            connector_name: connector_name.into(),
        }
    }

    /// Serialize to the compact payload handed to the transport.
    pub fn encode(&self) -> Result<String, CorrelationError> {
        let payload =
            serde_json::to_string(self).map_err(|e| CorrelationError::Encode(e.to_string()))?;
        if payload.len() > MAX_TOKEN_LEN {
            return Err(CorrelationError::TooLong(payload.len()));
        }
        Ok(payload)
    }

    /// Decode a payload received with a selection event.
    pub fn decode(payload: &[u8]) -> Result<Self, CorrelationError> {
        let token: Self =
            serde_json::from_slice(payload).map_err(|e| CorrelationError::Decode(e.to_string()))?;
        if token.connector_name.is_empty() {
            return Err(CorrelationError::Decode(
                "connector_name is empty".to_string(),
            ));
        }
        Ok(token)
    }
}
