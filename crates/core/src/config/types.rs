use serde::{Deserialize, Deserializer, Serialize};
use std::fmt::Display;
use std::str::FromStr;

use crate::backend::BackendKind;

/// Root configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    pub common: CommonConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub sonarr: Option<BackendSection>,
    #[serde(default)]
    pub radarr: Option<BackendSection>,
}

impl Config {
    /// Configured backend sections as `(section name, kind, settings)`.
    pub fn backend_sections(&self) -> Vec<(&'static str, BackendKind, &BackendSection)> {
        let mut sections = Vec::new();
        if let Some(sonarr) = &self.sonarr {
            sections.push(("sonarr", BackendKind::Series, sonarr));
        }
        if let Some(radarr) = &self.radarr {
            sections.push(("radarr", BackendKind::Movie, radarr));
        }
        sections
    }
}

/// Settings shared by the whole bot
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CommonConfig {
    /// Telegram bot token
    #[serde(default)]
    pub bot_token: String,
    /// Chats allowed to talk to the bot.
    /// Accepts `"1,2,3"` or `[1, 2, 3]`.
    #[serde(default, deserialize_with = "comma_separated")]
    pub allowed_chats: Vec<i64>,
    /// Telegram Bot API base URL (default: https://api.telegram.org)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_url: Option<String>,
}

/// Logging configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct LoggingConfig {
    #[serde(default)]
    pub format: LogFormat,
}

#[derive(Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// One backend section (`[sonarr]` or `[radarr]`).
///
/// Required keys default to empty so that validation can report exactly
/// which one is missing.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct BackendSection {
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub api_key: String,
    #[serde(default)]
    pub root_dir: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub basic_username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub basic_password: Option<String>,
    /// Tag labels attached to every acquired item.
    #[serde(default, deserialize_with = "comma_separated")]
    pub tags: Vec<String>,
    /// Command keyword override (default: `tv` for sonarr, `movie` for radarr)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub command: Option<String>,
    /// Ask the backend to search right after adding (default: true)
    #[serde(default = "default_search_on_create")]
    pub search_on_create: bool,
    /// Request timeout in seconds (default: 30)
    #[serde(default = "default_timeout")]
    pub timeout_secs: u32,
}

fn default_search_on_create() -> bool {
    true
}

fn default_timeout() -> u32 {
    30
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ListValue<T> {
    Text(String),
    List(Vec<T>),
    Single(T),
}

/// Deserialize either a comma-separated string or a native list.
fn comma_separated<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + FromStr,
    T::Err: Display,
{
    match ListValue::<T>::deserialize(deserializer)? {
        ListValue::Text(text) => text
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|s| {
                s.parse::<T>()
                    .map_err(|e| serde::de::Error::custom(format!("invalid entry '{}': {}", s, e)))
            })
            .collect(),
        ListValue::List(items) => Ok(items),
        ListValue::Single(item) => Ok(vec![item]),
    }
}

/// Sanitized config for logging (secrets redacted)
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedConfig {
    pub bot_token_configured: bool,
    pub allowed_chats: usize,
    pub log_format: LogFormat,
    pub backends: Vec<SanitizedBackendConfig>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SanitizedBackendConfig {
    pub name: String,
    pub url: String,
    pub root_dir: String,
    pub api_key_configured: bool,
    pub basic_auth_configured: bool,
    pub tags: Vec<String>,
    pub timeout_secs: u32,
}

impl From<&Config> for SanitizedConfig {
    fn from(config: &Config) -> Self {
        Self {
            bot_token_configured: !config.common.bot_token.is_empty(),
            allowed_chats: config.common.allowed_chats.len(),
            log_format: config.logging.format,
            backends: config
                .backend_sections()
                .into_iter()
                .map(|(name, _, section)| SanitizedBackendConfig {
                    name: name.to_string(),
                    url: section.url.clone(),
                    root_dir: section.root_dir.clone(),
                    api_key_configured: !section.api_key.is_empty(),
                    basic_auth_configured: section.basic_username.is_some(),
                    tags: section.tags.clone(),
                    timeout_secs: section.timeout_secs,
                })
                .collect(),
        }
    }
}
