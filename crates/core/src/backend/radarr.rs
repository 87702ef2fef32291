//! Radarr (movies) backend client.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Map, Value};
use tracing::{debug, info};

use crate::connector::ConnectorConfig;

use super::http::{create_payload, ArrApi};
use super::{
    BackendClient, BackendError, BackendKind, CatalogRecord, CreateOptions, ItemId, LibraryItem,
    SearchCandidate, Tag,
};

/// Lookup fields copied into a create request.
const MOVIE_FIELDS: &[&str] = &["tmdbId", "title", "titleSlug", "images", "year"];

/// Radarr client implementation.
pub struct RadarrClient {
    api: ArrApi,
}

impl RadarrClient {
    pub fn new(config: &ConnectorConfig) -> Result<Self, BackendError> {
        Ok(Self {
            api: ArrApi::new(config)?,
        })
    }

    /// Full lookup record for one TMDB id. Radarr answers with a single
    /// object here, unlike the free-text lookup.
    async fn lookup_by_id(&self, item_id: ItemId) -> Result<Map<String, Value>, BackendError> {
        let tmdb_id = item_id.to_string();
        let record: Map<String, Value> = self
            .api
            .get_json("movie/lookup/tmdb", &[("tmdbId", tmdb_id.as_str())])
            .await?;

        match record.get(BackendKind::Movie.id_field()).and_then(ItemId::from_json) {
            Some(found) if found == item_id => Ok(record),
            _ => Err(BackendError::ItemNotFound(item_id)),
        }
    }
}

#[async_trait]
impl BackendClient for RadarrClient {
    fn kind(&self) -> BackendKind {
        BackendKind::Movie
    }

    async fn search(&self, terms: &str) -> Result<Vec<SearchCandidate>, BackendError> {
        let results: Vec<MovieResource> = self
            .api
            .get_json("movie/lookup", &[("term", terms)])
            .await?;
        debug!(terms, count = results.len(), "Radarr lookup");
        Ok(results.into_iter().map(SearchCandidate::from).collect())
    }

    async fn list_library(&self) -> Result<Vec<LibraryItem>, BackendError> {
        let movies: Vec<MovieResource> = self.api.get_json("movie", &[]).await?;
        Ok(movies.into_iter().filter_map(MovieResource::into_library_item).collect())
    }

    async fn create(
        &self,
        item_id: ItemId,
        options: &CreateOptions,
    ) -> Result<CatalogRecord, BackendError> {
        let lookup = self.lookup_by_id(item_id).await?;

        let mut payload = create_payload(&lookup, MOVIE_FIELDS, options);
        payload.insert(
            "addOptions".to_string(),
            json!({ "searchForMovie": options.search_on_create }),
        );

        let record: CatalogRecord = self.api.post_json("movie", &payload).await?;
        info!(tmdb_id = %item_id, id = ?record.id(), "Radarr movie added");
        Ok(record)
    }

    async fn list_tags(&self) -> Result<Vec<Tag>, BackendError> {
        self.api.get_json("tag", &[]).await
    }

    async fn update(&self, record: &CatalogRecord) -> Result<(), BackendError> {
        let id = record
            .id()
            .ok_or_else(|| BackendError::Format("movie record has no id".to_string()))?;
        self.api.put_json(&format!("movie/{}", id), record).await
    }
}

/// Subset of a Radarr movie resource used for search and library views.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MovieResource {
    title: String,
    #[serde(default)]
    year: Option<u32>,
    #[serde(default)]
    tmdb_id: Value,
}

impl MovieResource {
    fn into_library_item(self) -> Option<LibraryItem> {
        Some(LibraryItem {
            native_id: ItemId::from_json(&self.tmdb_id)?,
            title: self.title,
        })
    }
}

impl From<MovieResource> for SearchCandidate {
    fn from(r: MovieResource) -> Self {
        Self {
            item_id: ItemId::from_json(&r.tmdb_id),
            year: r.year.filter(|y| *y > 0),
            title: r.title,
        }
    }
}
