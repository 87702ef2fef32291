use thiserror::Error;
use tracing::{info, warn};

use crate::backend::{
    BackendError, BackendKind, CatalogRecord, CreateOptions, ItemId, LibraryItem, Tag,
};
use crate::connector::{Connector, ConnectorRegistry, RegistryError};
use crate::correlation::CorrelationToken;

/// Quality profile requested for every acquisition.
pub const DEFAULT_QUALITY_PROFILE_ID: u32 = 1;

#[derive(Debug, Error)]
pub enum AcquisitionError {
    #[error(transparent)]
    UnknownConnector(#[from] RegistryError),

    #[error("Backend request failed: {0}")]
    Backend(#[from] BackendError),
}

#[derive(Debug)]
pub enum AcquisitionOutcome {
    /// Carries the kind of the backend that already tracks the item.
    AlreadyInLibrary(BackendKind),
    Downloading,
    Failed(AcquisitionError),
}

impl AcquisitionOutcome {
    pub fn is_failed(&self) -> bool {
        matches!(self, AcquisitionOutcome::Failed(_))
    }
}

/// Acquire the item a selection token points at.
///
/// The membership check and the create are separate requests, so two
/// concurrent selections of the same item can both create it.
pub async fn acquire(registry: &ConnectorRegistry, token: &CorrelationToken) -> AcquisitionOutcome {
    let connector = match registry.resolve(&token.connector_name) {
        Ok(connector) => connector,
        Err(e) => return AcquisitionOutcome::Failed(e.into()),
    };

    match acquire_with(connector, token.item_id).await {
        Ok(outcome) => outcome,
        Err(e) => AcquisitionOutcome::Failed(e.into()),
    }
}

async fn acquire_with(
    connector: &Connector,
    item_id: ItemId,
) -> Result<AcquisitionOutcome, BackendError> {
    let client = connector.client();

    let library = client.list_library().await?;
    if library_contains(&library, item_id) {
        info!(connector = connector.name(), %item_id, "Item already in library");
        return Ok(AcquisitionOutcome::AlreadyInLibrary(connector.kind()));
    }

    let config = connector.config();
    let options = CreateOptions {
        root_dir: config.root_dir.clone(),
        quality_profile_id: DEFAULT_QUALITY_PROFILE_ID,
        search_on_create: config.search_on_create,
    };
    let mut record = client.create(item_id, &options).await?;
    info!(connector = connector.name(), %item_id, "Acquisition requested");

    if !config.tags.is_empty() {
        apply_tags(connector, &mut record).await?;
    }

    Ok(AcquisitionOutcome::Downloading)
}

/// Tags are not accepted by the create endpoint, so they are attached with
/// a follow-up update.
async fn apply_tags(connector: &Connector, record: &mut CatalogRecord) -> Result<(), BackendError> {
    let client = connector.client();
    let available = client.list_tags().await?;
    let (resolved, missing) = resolve_tag_ids(&connector.config().tags, &available);

    for label in &missing {
        warn!(connector = connector.name(), label, "Configured tag not defined on backend");
    }
    if resolved.is_empty() {
        return Ok(());
    }

    let mut tag_ids = record.tag_ids();
    tag_ids.extend(resolved);
    record.set_tag_ids(&tag_ids);
    client.update(record).await?;
    info!(connector = connector.name(), tags = ?record.tag_ids(), "Tags applied");
    Ok(())
}

/// Numeric id match against the current library.
pub fn library_contains(library: &[LibraryItem], item_id: ItemId) -> bool {
    library.iter().any(|item| item.native_id == item_id)
}

/// Map configured labels to tag ids by exact match.
/// Returns the resolved ids and the labels that matched nothing.
pub fn resolve_tag_ids<'a>(labels: &'a [String], tags: &[Tag]) -> (Vec<u32>, Vec<&'a str>) {
    let mut resolved = Vec::new();
    let mut missing = Vec::new();
    for label in labels {
        match tags.iter().find(|t| t.label == *label) {
            Some(tag) => resolved.push(tag.id),
            None => missing.push(label.as_str()),
        }
    }
    (resolved, missing)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use crate::testing::{fixtures, BackendOp, MockBackend, RecordedBackendCall};

    fn registry_with(backend: Arc<MockBackend>, tags: &[&str]) -> ConnectorRegistry {
        let mut config = fixtures::connector_config("sonarr", BackendKind::Series);
        config.tags = tags.iter().map(|t| t.to_string()).collect();
        ConnectorRegistry::new(vec![Connector::new(config, backend)]).unwrap()
    }

    #[test]
    fn test_library_contains_numeric() {
        let library = vec![fixtures::library_item(42, "Answer"), fixtures::library_item(7, "Bond")];
        assert!(library_contains(&library, "42".parse().unwrap()));
        assert!(library_contains(&library, "007".parse().unwrap()));
        assert!(!library_contains(&library, ItemId::new(8)));
        assert!(!library_contains(&[], ItemId::new(42)));
    }

    #[test]
    fn test_resolve_tag_ids_exact_match() {
        let tags = vec![fixtures::tag(7, "kids"), fixtures::tag(9, "Family")];
        let labels = vec!["kids".to_string(), "family".to_string(), "4k".to_string()];
        let (resolved, missing) = resolve_tag_ids(&labels, &tags);
        assert_eq!(resolved, vec![7]);
        assert_eq!(missing, vec!["family", "4k"]);
    }

    #[tokio::test]
    async fn test_acquire_creates_when_absent() {
        let backend = Arc::new(MockBackend::new(BackendKind::Series));
        let registry = registry_with(backend.clone(), &[]);

        let token = CorrelationToken::new(ItemId::new(275274), "sonarr");
        let outcome = acquire(&registry, &token).await;
        assert!(matches!(outcome, AcquisitionOutcome::Downloading));

        let created = backend.created().await;
        assert_eq!(created.len(), 1);
        assert_eq!(created[0].0, ItemId::new(275274));
        assert_eq!(created[0].1.root_dir, "/media/sonarr");
        assert_eq!(created[0].1.quality_profile_id, DEFAULT_QUALITY_PROFILE_ID);
        assert!(created[0].1.search_on_create);
        assert_eq!(backend.call_count(BackendOp::Update).await, 0);
    }

    #[tokio::test]
    async fn test_acquire_is_idempotent() {
        let backend = Arc::new(MockBackend::new(BackendKind::Series));
        let registry = registry_with(backend.clone(), &[]);
        let token = CorrelationToken::new(ItemId::new(5), "sonarr");

        assert!(matches!(acquire(&registry, &token).await, AcquisitionOutcome::Downloading));
        assert!(matches!(
            acquire(&registry, &token).await,
            AcquisitionOutcome::AlreadyInLibrary(BackendKind::Series)
        ));
        assert_eq!(backend.call_count(BackendOp::Create).await, 1);
    }

    #[tokio::test]
    async fn test_unknown_connector_fails() {
        let backend = Arc::new(MockBackend::new(BackendKind::Series));
        let registry = registry_with(backend.clone(), &[]);
        let token = CorrelationToken::new(ItemId::new(5), "lidarr");

        let outcome = acquire(&registry, &token).await;
        assert!(matches!(
            outcome,
            AcquisitionOutcome::Failed(AcquisitionError::UnknownConnector(
                RegistryError::UnknownConnector(_)
            ))
        ));
        assert!(backend.recorded_calls().await.is_empty());
    }

    #[tokio::test]
    async fn test_tags_resolved_and_missing_dropped() {
        let backend = Arc::new(MockBackend::new(BackendKind::Series));
        backend.set_tags(vec![fixtures::tag(7, "kids")]).await;
        let registry = registry_with(backend.clone(), &["kids", "absent"]);

        let token = CorrelationToken::new(ItemId::new(11), "sonarr");
        assert!(matches!(acquire(&registry, &token).await, AcquisitionOutcome::Downloading));

        let updated = backend.updated().await;
        assert_eq!(updated.len(), 1);
        assert_eq!(updated[0].tag_ids(), vec![7]);
    }

    #[tokio::test]
    async fn test_no_update_when_no_tag_resolves() {
        let backend = Arc::new(MockBackend::new(BackendKind::Series));
        backend.set_tags(vec![fixtures::tag(7, "kids")]).await;
        let registry = registry_with(backend.clone(), &["absent"]);

        let token = CorrelationToken::new(ItemId::new(11), "sonarr");
        assert!(matches!(acquire(&registry, &token).await, AcquisitionOutcome::Downloading));
        assert_eq!(backend.call_count(BackendOp::ListTags).await, 1);
        assert_eq!(backend.call_count(BackendOp::Update).await, 0);
    }

    #[tokio::test]
    async fn test_create_failure_is_terminal() {
        let backend = Arc::new(MockBackend::new(BackendKind::Series));
        backend
            .fail_next(
                BackendOp::Create,
                BackendError::Status {
                    status: 400,
                    message: "already exists".to_string(),
                },
            )
            .await;
        let registry = registry_with(backend.clone(), &["kids"]);

        let token = CorrelationToken::new(ItemId::new(11), "sonarr");
        let outcome = acquire(&registry, &token).await;
        assert!(matches!(
            outcome,
            AcquisitionOutcome::Failed(AcquisitionError::Backend(BackendError::Status { .. }))
        ));
        assert_eq!(backend.call_count(BackendOp::Create).await, 1);
        assert_eq!(backend.call_count(BackendOp::ListTags).await, 0);
    }

    #[tokio::test]
    async fn test_update_failure_reports_failed() {
        let backend = Arc::new(MockBackend::new(BackendKind::Series));
        backend.set_tags(vec![fixtures::tag(7, "kids")]).await;
        backend
            .fail_next(BackendOp::Update, BackendError::Format("bad".to_string()))
            .await;
        let registry = registry_with(backend.clone(), &["kids"]);

        let token = CorrelationToken::new(ItemId::new(11), "sonarr");
        assert!(acquire(&registry, &token).await.is_failed());
    }

    #[tokio::test]
    async fn test_library_failure_skips_create() {
        let backend = Arc::new(MockBackend::new(BackendKind::Series));
        backend
            .fail_next(BackendOp::ListLibrary, BackendError::Format("bad".to_string()))
            .await;
        let registry = registry_with(backend.clone(), &[]);

        let token = CorrelationToken::new(ItemId::new(11), "sonarr");
        assert!(acquire(&registry, &token).await.is_failed());
        assert_eq!(
            backend.recorded_calls().await,
            vec![RecordedBackendCall::ListLibrary]
        );
    }
}
