//! Sonarr (TV series) backend client.

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
const SERIES_FIELDS: &[&str] = &[
    "tvdbId",
    "tvRageId",
    "title",
    "titleSlug",
    "images",
    "seasons",
    "year",
];

/// Language profile sent with every new series.
const DEFAULT_LANGUAGE_PROFILE_ID: u32 = 1;

/// Sonarr client implementation.
pub struct SonarrClient {
    api: ArrApi,
}

impl SonarrClient {
    pub fn new(config: &ConnectorConfig) -> Result<Self, BackendError> {
        Ok(Self {
            api: ArrApi::new(config)?,
        })
    }

    /// Full lookup record for one TVDB id.
    async fn lookup_by_id(&self, item_id: ItemId) -> Result<Map<String, Value>, BackendError> {
        let term = format!("tvdb:{}", item_id);
        let matches: Vec<Map<String, Value>> = self
            .api
            .get_json("series/lookup", &[("term", term.as_str())])
            .await?;

        let id_field = BackendKind::Series.id_field();
        matches
            .into_iter()
            .find(|record| record.get(id_field).and_then(ItemId::from_json) == Some(item_id))
            .ok_or(BackendError::ItemNotFound(item_id))
    }
}

#[async_trait]
impl BackendClient for SonarrClient {
    fn kind(&self) -> BackendKind {
        BackendKind::Series
    }

    async fn search(&self, terms: &str) -> Result<Vec<SearchCandidate>, BackendError> {
        let results: Vec<SeriesResource> = self
            .api
            .get_json("series/lookup", &[("term", terms)])
            .await?;
        debug!(terms, count = results.len(), "Sonarr lookup");
        Ok(results.into_iter().map(SearchCandidate::from).collect())
    }

    async fn list_library(&self) -> Result<Vec<LibraryItem>, BackendError> {
        let series: Vec<SeriesResource> = self.api.get_json("series", &[]).await?;
        Ok(series.into_iter().filter_map(SeriesResource::into_library_item).collect())
    }

    async fn create(
        &self,
        item_id: ItemId,
        options: &CreateOptions,
    ) -> Result<CatalogRecord, BackendError> {
        let lookup = self.lookup_by_id(item_id).await?;

        let mut payload = create_payload(&lookup, SERIES_FIELDS, options);
        payload.insert(
            "languageProfileId".to_string(),
            Value::from(DEFAULT_LANGUAGE_PROFILE_ID),
        );
        payload.insert("seasonFolder".to_string(), Value::Bool(true));
        payload.insert(
            "addOptions".to_string(),
            json!({
                "ignoreEpisodesWithFiles": true,
                "ignoreEpisodesWithoutFiles": false,
                "searchForMissingEpisodes": options.search_on_create,
            }),
        );

        let record: CatalogRecord = self.api.post_json("series", &payload).await?;
        info!(tvdb_id = %item_id, id = ?record.id(), "Sonarr series added");
        Ok(record)
    }

    async fn list_tags(&self) -> Result<Vec<Tag>, BackendError> {
        self.api.get_json("tag", &[]).await
    }

    async fn update(&self, record: &CatalogRecord) -> Result<(), BackendError> {
        let id = record
            .id()
            .ok_or_else(|| BackendError::Format("series record has no id".to_string()))?;
        self.api.put_json(&format!("series/{}", id), record).await
    }
}

/// Subset of a Sonarr series resource used for search and library views.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SeriesResource {
    title: String,
    #[serde(default)]
    year: Option<u32>,
    #[serde(default)]
    tvdb_id: Value,
}

impl SeriesResource {
    fn into_library_item(self) -> Option<LibraryItem> {
        Some(LibraryItem {
            native_id: ItemId::from_json(&self.tvdb_id)?,
            title: self.title,
        })
    }
}

impl From<SeriesResource> for SearchCandidate {
    fn from(r: SeriesResource) -> Self {
        Self {
            item_id: ItemId::from_json(&r.tvdb_id),
            year: r.year.filter(|y| *y > 0),
            title: r.title,
        }
    }
}
