//! Types shared by all backend clients.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;

/// Which backend API shape and id semantics apply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackendKind {
    /// Radarr, keyed by TMDB id.
    Movie,
    /// Sonarr, keyed by TVDB id.
    Series,
}

impl BackendKind {
    /// Returns the string representation for logs.
    pub fn as_str(&self) -> &'static str {
        match self {
            BackendKind::Movie => "movie",
            BackendKind::Series => "series",
        }
    }

    /// Native id field of catalog records.
    pub fn id_field(&self) -> &'static str {
        match self {
            BackendKind::Movie => "tmdbId",
            BackendKind::Series => "tvdbId",
        }
    }

    /// Command keyword used when the section does not override it.
    pub fn default_command(&self) -> &'static str {
        match self {
            BackendKind::Movie => "movie",
            BackendKind::Series => "tv",
        }
    }

    /// API resource path segment.
    pub fn resource(&self) -> &'static str {
        match self {
            BackendKind::Movie => "movie",
            BackendKind::Series => "series",
        }
    }

    /// Noun shown to chat users.
    pub fn noun(&self) -> &'static str {
        match self {
            BackendKind::Movie => "Movie",
            BackendKind::Series => "TV show",
        }
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Backend-native catalog identifier (TMDB or TVDB id).
///
/// Compared numerically: `"007"` and `7` are the same id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct ItemId(u64);

impl ItemId {
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    pub fn get(&self) -> u64 {
        self.0
    }

    /// Read a usable id from a JSON value. Zero means "unknown" to the
    /// backends and is treated as absent.
    pub fn from_json(value: &Value) -> Option<Self> {
        let id = match value {
            Value::Number(n) => n.as_u64()?,
            Value::String(s) => s.trim().parse().ok()?,
            _ => return None,
        };
        (id != 0).then_some(Self(id))
    }
}

impl From<u64> for ItemId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

impl FromStr for ItemId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse().map(Self)
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl<'de> Deserialize<'de> for ItemId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum RawId {
            Number(u64),
            Text(String),
        }

        match RawId::deserialize(deserializer)? {
            RawId::Number(id) => Ok(Self(id)),
            RawId::Text(text) => text
                .trim()
                .parse()
                .map_err(|_| serde::de::Error::custom(format!("invalid item id '{}'", text))),
        }
    }
}

/// One lookup hit, as returned by `BackendClient::search`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchCandidate {
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year: Option<u32>,
    /// None when the backend did not report a usable id.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub item_id: Option<ItemId>,
}

/// An entry already tracked by a backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LibraryItem {
    pub native_id: ItemId,
    pub title: String,
}

/// A backend tag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    pub id: u32,
    pub label: String,
}

/// Per-create policy merged into the create payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateOptions {
    pub root_dir: String,
    pub quality_profile_id: u32,
    /// Ask the backend to start searching right away.
    pub search_on_create: bool,
}

/// The backend's own JSON representation of a catalog record.
///
/// Kept as a raw object so an update can send back every field the backend
/// returned, not only the ones this crate knows about.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CatalogRecord(Map<String, Value>);

impl CatalogRecord {
    pub fn new(fields: Map<String, Value>) -> Self {
        Self(fields)
    }

    /// Backend-internal record id (not the catalog id).
    pub fn id(&self) -> Option<u64> {
        self.0.get("id").and_then(Value::as_u64)
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.0.get(field)
    }

    pub fn title(&self) -> Option<&str> {
        self.0.get("title").and_then(Value::as_str)
    }

    /// Tag ids currently on the record.
    pub fn tag_ids(&self) -> Vec<u32> {
        self.0
            .get("tags")
            .and_then(Value::as_array)
            .map(|tags| {
                tags.iter()
                    .filter_map(Value::as_u64)
                    .filter_map(|t| u32::try_from(t).ok())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Replace the record's tags with `ids` (sorted, deduplicated).
    pub fn set_tag_ids(&mut self, ids: &[u32]) {
        let mut ids = ids.to_vec();
        ids.sort_unstable();
        ids.dedup();
        self.0.insert(
            "tags".to_string(),
            Value::Array(ids.into_iter().map(Value::from).collect()),
        );
    }
}
