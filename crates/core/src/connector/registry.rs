use std::collections::HashSet;
use std::sync::Arc;

use thiserror::Error;
use tracing::info;

use crate::backend::{create_backend_client, BackendClient, BackendKind};
use crate::config::{Config, ConfigError};

use super::ConnectorConfig;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RegistryError {
    #[error("Unknown connector: {0}")]
    UnknownConnector(String),

    #[error("Unknown command: {0}")]
    UnknownCommand(String),
}

/// A backend client together with the policy it is used under.
pub struct Connector {
    config: ConnectorConfig,
    client: Arc<dyn BackendClient>,
}

impl Connector {
    pub fn new(config: ConnectorConfig, client: Arc<dyn BackendClient>) -> Self {
        Self { config, client }
    }

    pub fn name(&self) -> &str {
        &self.config.name
    }

    pub fn command(&self) -> &str {
        &self.config.command
    }

    pub fn kind(&self) -> BackendKind {
        self.config.kind
    }

    pub fn config(&self) -> &ConnectorConfig {
        &self.config
    }

    pub fn client(&self) -> &dyn BackendClient {
        self.client.as_ref()
    }
}

impl std::fmt::Debug for Connector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Connector")
            .field("name", &self.config.name)
            .field("kind", &self.config.kind)
            .field("command", &self.config.command)
            .finish()
    }
}

/// Immutable lookup table of configured connectors.
#[derive(Debug)]
pub struct ConnectorRegistry {
    connectors: Vec<Connector>,
}

impl ConnectorRegistry {
    /// Create a registry, rejecting duplicate names or command keywords.
    pub fn new(connectors: Vec<Connector>) -> Result<Self, ConfigError> {
        let mut names = HashSet::new();
        let mut commands = HashSet::new();
        for connector in &connectors {
            if !names.insert(connector.name().to_string()) {
                return Err(ConfigError::ValidationError(format!(
                    "duplicate connector name '{}'",
                    connector.name()
                )));
            }
            if !commands.insert(connector.command().to_string()) {
                return Err(ConfigError::ValidationError(format!(
                    "duplicate command '{}'",
                    connector.command()
                )));
            }
        }
        Ok(Self { connectors })
    }

    /// Build a connector with an HTTP client for every configured backend.
    pub fn from_config(config: &Config) -> Result<Self, ConfigError> {
        let mut connectors = Vec::new();
        for (name, kind, section) in config.backend_sections() {
            let connector_config = ConnectorConfig::from_section(name, kind, section)?;
            let client = create_backend_client(&connector_config).map_err(|e| {
                ConfigError::ValidationError(format!("failed to create {} client: {}", name, e))
            })?;
            info!(
                connector = name,
                command = %connector_config.command,
                url = %connector_config.url,
                "Registered connector"
            );
            connectors.push(Connector::new(connector_config, client));
        }
        Self::new(connectors)
    }

    /// Look a connector up by name.
    pub fn resolve(&self, name: &str) -> Result<&Connector, RegistryError> {
        self.connectors
            .iter()
            .find(|c| c.name() == name)
            .ok_or_else(|| RegistryError::UnknownConnector(name.to_string()))
    }

    /// Look a connector up by command keyword (case-insensitive).
    pub fn resolve_by_command(&self, keyword: &str) -> Result<&Connector, RegistryError> {
        let keyword = keyword.to_lowercase();
        self.connectors
            .iter()
            .find(|c| c.command() == keyword)
            .ok_or(RegistryError::UnknownCommand(keyword))
    }

    pub fn iter(&self) -> impl Iterator<Item = &Connector> {
        self.connectors.iter()
    }

    pub fn len(&self) -> usize {
        self.connectors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.connectors.is_empty()
    }
}
