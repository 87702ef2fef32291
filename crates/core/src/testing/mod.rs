//! Testing utilities and mock implementations.
//!
//! Mocks for the two outer seams, `BackendClient` and `ChatTransport`,
//! so workflows and the dispatcher can be exercised without a real Sonarr,
//! Radarr or Telegram.
//!
//! # Example
//!
//! ```rust,ignore
//! use arrbot_core::testing::{fixtures, MockBackend};
//!
//! let backend = MockBackend::new(BackendKind::Series);
//! backend.set_search_results(vec![fixtures::candidate("Rick and Morty", Some(2013), Some(275274))]).await;
//! ```

mod mock_backend;
mod mock_transport;

pub use mock_backend::{BackendOp, MockBackend, RecordedBackendCall};
pub use mock_transport::{MockTransport, SentMessage};

/// Test fixtures and helper functions.
pub mod fixtures {
    use std::sync::Arc;

    use crate::backend::{BackendKind, ItemId, LibraryItem, SearchCandidate, Tag};
    use crate::connector::{Connector, ConnectorConfig, ConnectorRegistry};

    use super::MockBackend;

    /// Connector settings with reasonable defaults; root dir is `/media/{name}`.
    pub fn connector_config(name: &str, kind: BackendKind) -> ConnectorConfig {
        ConnectorConfig {
            name: name.to_string(),
            kind,
            url: format!("http://{}.local", name),
            api_key: format!("{}-api-key", name),
            basic_auth: None,
            root_dir: format!("/media/{}", name),
            tags: Vec::new(),
            command: kind.default_command().to_string(),
            search_on_create: true,
            timeout_secs: 5,
        }
    }

    pub fn candidate(title: &str, year: Option<u32>, item_id: Option<u64>) -> SearchCandidate {
        SearchCandidate {
            title: title.to_string(),
            year,
            item_id: item_id.map(ItemId::new),
        }
    }

    pub fn library_item(id: u64, title: &str) -> LibraryItem {
        LibraryItem {
            native_id: ItemId::new(id),
            title: title.to_string(),
        }
    }

    pub fn tag(id: u32, label: &str) -> Tag {
        Tag {
            id,
            label: label.to_string(),
        }
    }

    /// A `sonarr` (series) and `radarr` (movie) registry over fresh mocks.
    pub fn mock_registry() -> (ConnectorRegistry, Arc<MockBackend>, Arc<MockBackend>) {
        let sonarr = Arc::new(MockBackend::new(BackendKind::Series));
        let radarr = Arc::new(MockBackend::new(BackendKind::Movie));
        let registry = ConnectorRegistry::new(vec![
            Connector::new(connector_config("sonarr", BackendKind::Series), sonarr.clone()),
            Connector::new(connector_config("radarr", BackendKind::Movie), radarr.clone()),
        ])
        .expect("fixture registry is valid");
        (registry, sonarr, radarr)
    }
}
