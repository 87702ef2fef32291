//! Validated per-connector settings.

use crate::backend::BackendKind;
use crate::config::{BackendSection, ConfigError};

/// HTTP basic credentials placed in front of a backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BasicAuth {
    pub username: String,
    pub password: String,
}

/// Settings for one connector, derived from a backend section.
#[derive(Debug, Clone)]
pub struct ConnectorConfig {
    /// Connector name carried in correlation tokens (the section name).
    pub name: String,
    pub kind: BackendKind,
    /// Backend base URL without trailing slash.
    pub url: String,
    pub api_key: String,
    pub basic_auth: Option<BasicAuth>,
    /// Root folder handed to the backend on create.
    pub root_dir: String,
    /// Tag labels attached after create.
    pub tags: Vec<String>,
    /// Lowercase command keyword that triggers a search.
    pub command: String,
    pub search_on_create: bool,
    pub timeout_secs: u32,
}

impl ConnectorConfig {
    /// Build from a raw section, rejecting missing required keys.
    pub fn from_section(
        name: &str,
        kind: BackendKind,
        section: &BackendSection,
    ) -> Result<Self, ConfigError> {
        let url = required(name, "url", &section.url)?;
        let api_key = required(name, "api_key", &section.api_key)?;
        let root_dir = required(name, "root_dir", &section.root_dir)?;

        let basic_auth = match (&section.basic_username, &section.basic_password) {
            (Some(username), Some(password)) => Some(BasicAuth {
                username: username.clone(),
                password: password.clone(),
            }),
            (None, None) => None,
            (Some(_), None) => {
                return Err(ConfigError::ValidationError(format!(
                    "{}.basic_password is required when basic_username is set",
                    name
                )))
            }
            (None, Some(_)) => {
                return Err(ConfigError::ValidationError(format!(
                    "{}.basic_username is required when basic_password is set",
                    name
                )))
            }
        };

        let command = section
            .command
            .as_deref()
            .map(|c| c.trim().trim_start_matches('/').to_lowercase())
            .unwrap_or_else(|| kind.default_command().to_string());
        if command.is_empty() || command.contains(char::is_whitespace) {
            return Err(ConfigError::ValidationError(format!(
                "{}.command must be a single word",
                name
            )));
        }

        let tags = section
            .tags
            .iter()
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .collect();

        Ok(Self {
            name: name.to_string(),
            kind,
            url: url.trim_end_matches('/').to_string(),
            api_key,
            basic_auth,
            root_dir,
            tags,
            command,
            search_on_create: section.search_on_create,
            timeout_secs: section.timeout_secs,
        })
    }
}

fn required(section: &str, key: &str, value: &str) -> Result<String, ConfigError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(ConfigError::ValidationError(format!(
            "{}.{} is required",
            section, key
        )));
    }
    Ok(value.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn section() -> BackendSection {
        BackendSection {
            url: "http://localhost:8989/".to_string(),
            api_key: "key".to_string(),
            root_dir: "/media/TV".to_string(),
            search_on_create: true,
            timeout_secs: 30,
            ..Default::default()
        }
    }

    #[test]
    fn test_derived_fields_for_series() {
        let config = ConnectorConfig::from_section("sonarr", BackendKind::Series, &section()).unwrap();
        assert_eq!(config.url, "http://localhost:8989");
        assert_eq!(config.command, "tv");
        assert_eq!(config.kind, BackendKind::Series);
        assert!(config.basic_auth.is_none());
    }

    #[test]
    fn test_derived_fields_for_movies() {
        let config = ConnectorConfig::from_section("radarr", BackendKind::Movie, &section()).unwrap();
        assert_eq!(config.command, "movie");
        assert_eq!(config.kind, BackendKind::Movie);
    }

    #[test]
    fn test_command_override_is_normalized() {
        let mut raw = section();
        raw.command = Some("/Shows".to_string());
        let config = ConnectorConfig::from_section("sonarr", BackendKind::Series, &raw).unwrap();
        assert_eq!(config.command, "shows");
    }

    #[test]
    fn test_blank_tags_are_ignored() {
        let mut raw = section();
        raw.tags = vec![" kids ".to_string(), "".to_string()];
        let config = ConnectorConfig::from_section("sonarr", BackendKind::Series, &raw).unwrap();
        assert_eq!(config.tags, vec!["kids"]);
    }

    #[test]
    fn test_basic_auth_pair() {
        let mut raw = section();
        raw.basic_username = Some("user".to_string());
        raw.basic_password = Some("pass".to_string());
        let config = ConnectorConfig::from_section("sonarr", BackendKind::Series, &raw).unwrap();
        assert_eq!(
            config.basic_auth,
            Some(BasicAuth {
                username: "user".to_string(),
                password: "pass".to_string()
            })
        );
    }

    #[test]
    fn test_whitespace_api_key_is_missing() {
        let mut raw = section();
        raw.api_key = "   ".to_string();
        let result = ConnectorConfig::from_section("sonarr", BackendKind::Series, &raw);
        assert!(matches!(result, Err(ConfigError::ValidationError(_))));
    }
}
