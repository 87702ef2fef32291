use std::collections::HashSet;

use super::{types::Config, ConfigError};
use crate::connector::ConnectorConfig;

/// Validate configuration
/// Currently validates:
/// - `common.bot_token` is set
/// - at least one backend section exists
/// - every backend has `url`, `api_key` and `root_dir`
/// - basic auth has both username and password, or neither
/// - command keywords are unique
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    if config.common.bot_token.trim().is_empty() {
        return Err(ConfigError::ValidationError(
            "common.bot_token is required".to_string(),
        ));
    }

    let sections = config.backend_sections();
    if sections.is_empty() {
        return Err(ConfigError::ValidationError(
            "at least one of [sonarr] or [radarr] must be configured".to_string(),
        ));
    }

    let mut commands = HashSet::new();
    for (name, kind, section) in sections {
        let connector = ConnectorConfig::from_section(name, kind, section)?;
        if !commands.insert(connector.command.clone()) {
            return Err(ConfigError::ValidationError(format!(
                "{}.command '{}' is already used by another backend",
                name, connector.command
            )));
        }
    }

    Ok(())
}
