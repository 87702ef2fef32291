//! Mock backend client for testing.

use async_trait::async_trait;
use serde_json::{json, Map, Value};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::backend::{
    BackendClient, BackendError, BackendKind, CatalogRecord, CreateOptions, ItemId, LibraryItem,
    SearchCandidate, Tag,
};

/// Backend operations, for error injection and call counting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BackendOp {
    Search,
    ListLibrary,
    Create,
    ListTags,
    Update,
}

/// A recorded backend call for test assertions.
#[derive(Debug, Clone, PartialEq)]
pub enum RecordedBackendCall {
    Search { terms: String },
    ListLibrary,
    Create { item_id: ItemId, options: CreateOptions },
    ListTags,
    Update { record: CatalogRecord },
}

impl RecordedBackendCall {
    pub fn op(&self) -> BackendOp {
        match self {
            RecordedBackendCall::Search { .. } => BackendOp::Search,
            RecordedBackendCall::ListLibrary => BackendOp::ListLibrary,
            RecordedBackendCall::Create { .. } => BackendOp::Create,
            RecordedBackendCall::ListTags => BackendOp::ListTags,
            RecordedBackendCall::Update { .. } => BackendOp::Update,
        }
    }
}

/// Mock implementation of the BackendClient trait.
///
/// Provides controllable behavior for testing:
/// - Return configurable search results, library and tags
/// - Created items join the library, so a repeated acquisition sees them
/// - Track calls for assertions
/// - Simulate failures per operation
#[derive(Debug)]
pub struct MockBackend {
    kind: BackendKind,
    search_results: Arc<RwLock<Vec<SearchCandidate>>>,
    library: Arc<RwLock<Vec<LibraryItem>>>,
    tags: Arc<RwLock<Vec<Tag>>>,
    calls: Arc<RwLock<Vec<RecordedBackendCall>>>,
    /// One-shot errors, taken by the next call of that operation.
    errors: Arc<RwLock<HashMap<BackendOp, BackendError>>>,
    next_record_id: Arc<RwLock<u64>>,
}

impl MockBackend {
    pub fn new(kind: BackendKind) -> Self {
        Self {
            kind,
            search_results: Arc::new(RwLock::new(Vec::new())),
            library: Arc::new(RwLock::new(Vec::new())),
            tags: Arc::new(RwLock::new(Vec::new())),
            calls: Arc::new(RwLock::new(Vec::new())),
            errors: Arc::new(RwLock::new(HashMap::new())),
            next_record_id: Arc::new(RwLock::new(1)),
        }
    }

    // =========================================================================
    // Configuration
    // =========================================================================

    pub async fn set_search_results(&self, results: Vec<SearchCandidate>) {
        *self.search_results.write().await = results;
    }

    pub async fn set_library(&self, items: Vec<LibraryItem>) {
        *self.library.write().await = items;
    }

    pub async fn add_library_item(&self, item: LibraryItem) {
        self.library.write().await.push(item);
    }

    pub async fn set_tags(&self, tags: Vec<Tag>) {
        *self.tags.write().await = tags;
    }

    /// Make the next call of `op` fail with `error`.
    pub async fn fail_next(&self, op: BackendOp, error: BackendError) {
        self.errors.write().await.insert(op, error);
    }

    // =========================================================================
    // Call Recording
    // =========================================================================

    pub async fn recorded_calls(&self) -> Vec<RecordedBackendCall> {
        self.calls.read().await.clone()
    }

    pub async fn call_count(&self, op: BackendOp) -> usize {
        self.calls
            .read()
            .await
            .iter()
            .filter(|c| c.op() == op)
            .count()
    }

    pub async fn searched_terms(&self) -> Vec<String> {
        self.calls
            .read()
            .await
            .iter()
            .filter_map(|c| match c {
                RecordedBackendCall::Search { terms } => Some(terms.clone()),
                _ => None,
            })
            .collect()
    }

    pub async fn created(&self) -> Vec<(ItemId, CreateOptions)> {
        self.calls
            .read()
            .await
            .iter()
            .filter_map(|c| match c {
                RecordedBackendCall::Create { item_id, options } => {
                    Some((*item_id, options.clone()))
                }
                _ => None,
            })
            .collect()
    }

    pub async fn updated(&self) -> Vec<CatalogRecord> {
        self.calls
            .read()
            .await
            .iter()
            .filter_map(|c| match c {
                RecordedBackendCall::Update { record } => Some(record.clone()),
                _ => None,
            })
            .collect()
    }

    pub async fn library(&self) -> Vec<LibraryItem> {
        self.library.read().await.clone()
    }

    async fn record(&self, call: RecordedBackendCall) -> Result<(), BackendError> {
        let op = call.op();
        self.calls.write().await.push(call);
        match self.errors.write().await.remove(&op) {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    async fn title_for(&self, item_id: ItemId) -> String {
        self.search_results
            .read()
            .await
            .iter()
            .find(|c| c.item_id == Some(item_id))
            .map(|c| c.title.clone())
            .unwrap_or_else(|| format!("Item {}", item_id))
    }
}

#[async_trait]
impl BackendClient for MockBackend {
    fn kind(&self) -> BackendKind {
        self.kind
    }

    async fn search(&self, terms: &str) -> Result<Vec<SearchCandidate>, BackendError> {
        self.record(RecordedBackendCall::Search {
            terms: terms.to_string(),
        })
        .await?;
        Ok(self.search_results.read().await.clone())
    }

    async fn list_library(&self) -> Result<Vec<LibraryItem>, BackendError> {
        self.record(RecordedBackendCall::ListLibrary).await?;
        Ok(self.library.read().await.clone())
    }

    async fn create(
        &self,
        item_id: ItemId,
        options: &CreateOptions,
    ) -> Result<CatalogRecord, BackendError> {
        self.record(RecordedBackendCall::Create {
            item_id,
            options: options.clone(),
        })
        .await?;

        let title = self.title_for(item_id).await;
        let id = {
            let mut next = self.next_record_id.write().await;
            let id = *next;
            *next += 1;
            id
        };

        self.library.write().await.push(LibraryItem {
            native_id: item_id,
            title: title.clone(),
        });

        let mut fields = Map::new();
        fields.insert("id".to_string(), Value::from(id));
        fields.insert("title".to_string(), Value::from(title));
        fields.insert(self.kind.id_field().to_string(), Value::from(item_id.get()));
        fields.insert("rootFolderPath".to_string(), Value::from(options.root_dir.clone()));
        fields.insert("tags".to_string(), json!([]));
        Ok(CatalogRecord::new(fields))
    }

    async fn list_tags(&self) -> Result<Vec<Tag>, BackendError> {
        self.record(RecordedBackendCall::ListTags).await?;
        Ok(self.tags.read().await.clone())
    }

    async fn update(&self, record: &CatalogRecord) -> Result<(), BackendError> {
        self.record(RecordedBackendCall::Update {
            record: record.clone(),
        })
        .await
    }
}
