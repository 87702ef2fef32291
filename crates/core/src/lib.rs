pub mod auth;
pub mod backend;
pub mod chat;
pub mod config;
pub mod connector;
pub mod correlation;
pub mod testing;
pub mod workflow;

pub use auth::{AuthError, ChatAllowList};
pub use backend::{
    create_backend_client, BackendClient, BackendError, BackendKind, CatalogRecord,
    CreateOptions, ItemId, LibraryItem, RadarrClient, SearchCandidate, SonarrClient, Tag,
};
pub use chat::{
    ChatError, ChatEvent, ChatId, ChatTransport, Choice, Dispatcher, MessageRef,
    TelegramConfig, TelegramTransport,
};
pub use config::{
    load_config, load_config_from_str, validate_config, BackendSection, CommonConfig, Config,
    ConfigError, LogFormat, LoggingConfig, SanitizedConfig,
};
pub use connector::{BasicAuth, Connector, ConnectorConfig, ConnectorRegistry, RegistryError};
pub use correlation::{CorrelationError, CorrelationToken, MAX_TOKEN_LEN};
pub use workflow::{
    acquire, run_search, AcquisitionError, AcquisitionOutcome, RenderedCandidate,
    SearchOutcome, DEFAULT_QUALITY_PROFILE_ID, MAX_DISPLAYED_RESULTS,
};
