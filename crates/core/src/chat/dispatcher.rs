use std::sync::Arc;

use tracing::{error, info, warn};

use super::{ChatError, ChatEvent, ChatId, ChatTransport, Choice, MessageRef};
use crate::auth::ChatAllowList;
use crate::backend::BackendKind;
use crate::connector::ConnectorRegistry;
use crate::correlation::CorrelationToken;
use crate::workflow::{acquire, run_search, AcquisitionOutcome, SearchOutcome};

pub const NO_RESULTS: &str = "No results found";
pub const DOWNLOADING: &str = "Downloading...";
pub const NOT_ALLOWED: &str = "You are not allowed to use this bot";
pub const GENERIC_FAILURE: &str = "Something went wrong, please try again";

/// Routes chat events to the search and acquisition workflows and maps
/// their outcomes to user-visible text.
pub struct Dispatcher {
    registry: Arc<ConnectorRegistry>,
    allow_list: ChatAllowList,
    transport: Arc<dyn ChatTransport>,
}

impl Dispatcher {
    pub fn new(
        registry: Arc<ConnectorRegistry>,
        allow_list: ChatAllowList,
        transport: Arc<dyn ChatTransport>,
    ) -> Self {
        Self {
            registry,
            allow_list,
            transport,
        }
    }

    /// Handle one inbound event.
    ///
    /// Workflow failures are answered with a generic message; only a failure
    /// to talk to the chat service itself is returned.
    pub async fn handle(&self, event: ChatEvent) -> Result<(), ChatError> {
        match event {
            ChatEvent::Command {
                chat_id,
                keyword,
                args,
            } => self.handle_command(chat_id, &keyword, &args).await,
            ChatEvent::Selection {
                chat_id,
                message,
                callback_id,
                payload,
            } => {
                self.handle_selection(chat_id, &message, &callback_id, &payload)
                    .await
            }
        }
    }

    async fn handle_command(
        &self,
        chat_id: ChatId,
        keyword: &str,
        args: &[String],
    ) -> Result<(), ChatError> {
        if let Err(e) = self.allow_list.authorize(chat_id) {
            warn!(%chat_id, keyword, "Rejected command: {}", e);
            return self.transport.send_text(chat_id, NOT_ALLOWED).await;
        }

        let connector = match self.registry.resolve_by_command(keyword) {
            Ok(connector) => connector,
            Err(e) => {
                if !matches!(keyword, "start" | "help") {
                    warn!(%chat_id, keyword, "{}", e);
                }
                return self.transport.send_text(chat_id, &self.usage()).await;
            }
        };

        if args.iter().all(|a| a.trim().is_empty()) {
            return self.transport.send_text(chat_id, &self.usage()).await;
        }

        info!(%chat_id, connector = connector.name(), "Search requested");
        match run_search(connector, args).await {
            Ok(SearchOutcome::NoResults) => self.transport.send_text(chat_id, NO_RESULTS).await,
            Ok(SearchOutcome::Candidates(candidates)) => {
                let choices: Vec<Choice> = candidates
                    .into_iter()
                    .map(|c| Choice {
                        label: c.label,
                        payload: c.payload,
                    })
                    .collect();
                self.transport
                    .send_choices(chat_id, select_prompt(connector.kind()), &choices)
                    .await
            }
            Err(e) => {
                error!(%chat_id, connector = connector.name(), error = %e, "Search failed");
                self.transport.send_text(chat_id, GENERIC_FAILURE).await
            }
        }
    }

    async fn handle_selection(
        &self,
        chat_id: ChatId,
        message: &MessageRef,
        callback_id: &str,
        payload: &str,
    ) -> Result<(), ChatError> {
        if let Err(e) = self.allow_list.authorize(chat_id) {
            warn!(%chat_id, "Rejected selection: {}", e);
            return self
                .transport
                .answer_selection(callback_id, Some(NOT_ALLOWED))
                .await;
        }
        // A stale callback cannot be answered; the selection still counts.
        if let Err(e) = self.transport.answer_selection(callback_id, None).await {
            warn!(%chat_id, error = %e, "Failed to acknowledge selection");
        }

        let token = match CorrelationToken::decode(payload.as_bytes()) {
            Ok(token) => token,
            Err(e) => {
                error!(%chat_id, error = %e, "Discarding selection");
                return self.transport.edit_text(message, GENERIC_FAILURE).await;
            }
        };

        info!(
            %chat_id,
            connector = %token.connector_name,
            item_id = %token.item_id,
            "Acquisition selected"
        );
        let text = match acquire(&self.registry, &token).await {
            AcquisitionOutcome::AlreadyInLibrary(kind) => {
                format!("{} already in library", kind.noun())
            }
            AcquisitionOutcome::Downloading => DOWNLOADING.to_string(),
            AcquisitionOutcome::Failed(e) => {
                error!(
                    %chat_id,
                    connector = %token.connector_name,
                    item_id = %token.item_id,
                    error = %e,
                    "Acquisition failed"
                );
                GENERIC_FAILURE.to_string()
            }
        };
        self.transport.edit_text(message, &text).await
    }

    /// One line per configured command.
    pub fn usage(&self) -> String {
        let mut lines = vec!["Available commands:".to_string()];
        for connector in self.registry.iter() {
            lines.push(format!(
                "/{} <title> - search for a {}",
                connector.command(),
                prompt_noun(connector.kind())
            ));
        }
        lines.join("\n")
    }
}

fn prompt_noun(kind: BackendKind) -> &'static str {
    match kind {
        BackendKind::Movie => "movie",
        BackendKind::Series => "TV show",
    }
}

fn select_prompt(kind: BackendKind) -> &'static str {
    match kind {
        BackendKind::Movie => "Please select a movie",
        BackendKind::Series => "Please select a TV show",
    }
}
