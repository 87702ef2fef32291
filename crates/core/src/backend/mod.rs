//! Backend media-management services (Sonarr, Radarr).
//!
//! Both backends expose the same five verbs behind different URL shapes,
//! id fields and create payloads. `BackendClient` is that shared contract;
//! the workflows only ever talk to it.

mod http;
mod radarr;
mod sonarr;
mod types;

pub use radarr::RadarrClient;
pub use sonarr::SonarrClient;
pub use types::*;

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use crate::connector::ConnectorConfig;

/// Errors that can occur when talking to a backend.
#[derive(Debug, Error)]
pub enum BackendError {
    /// HTTP request could not be completed.
    #[error("HTTP request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// Backend answered with an unexpected status.
    #[error("Unexpected status {status}: {message}")]
    Status { status: u16, message: String },

    /// Response body did not have the expected shape.
    #[error("Failed to parse response: {0}")]
    Format(String),

    /// Lookup by id found nothing to create.
    #[error("Item not found in backend catalog: {0}")]
    ItemNotFound(ItemId),
}

impl BackendError {
    /// True for failures of the HTTP exchange itself (as opposed to a
    /// well-formed but unexpected answer).
    pub fn is_transport(&self) -> bool {
        matches!(self, BackendError::Transport(_) | BackendError::Status { .. })
    }
}

/// Uniform contract over one backend's HTTP API.
#[async_trait]
pub trait BackendClient: Send + Sync {
    /// Which backend this client speaks to.
    fn kind(&self) -> BackendKind;

    /// Search the backend's catalog. Results keep the backend's relevance order.
    async fn search(&self, terms: &str) -> Result<Vec<SearchCandidate>, BackendError>;

    /// Everything the backend currently tracks.
    async fn list_library(&self) -> Result<Vec<LibraryItem>, BackendError>;

    /// Start tracking a catalog item. Only HTTP 201 counts as success.
    async fn create(
        &self,
        item_id: ItemId,
        options: &CreateOptions,
    ) -> Result<CatalogRecord, BackendError>;

    /// All tags defined on the backend.
    async fn list_tags(&self) -> Result<Vec<Tag>, BackendError>;

    /// Write a modified record back.
    async fn update(&self, record: &CatalogRecord) -> Result<(), BackendError>;
}

/// Factory function to create a backend client from connector settings
pub fn create_backend_client(
    config: &ConnectorConfig,
) -> Result<Arc<dyn BackendClient>, BackendError> {
    match config.kind {
        BackendKind::Series => Ok(Arc::new(SonarrClient::new(config)?)),
        BackendKind::Movie => Ok(Arc::new(RadarrClient::new(config)?)),
    }
}
