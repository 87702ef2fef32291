mod poller;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use sha2::{Digest, Sha256};
use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use arrbot_core::{
    load_config, validate_config, ChatAllowList, ConnectorRegistry, Dispatcher, LogFormat,
    SanitizedConfig, TelegramConfig, TelegramTransport,
};

use poller::Poller;

/// Application version
const VERSION: &str = env!("CARGO_PKG_VERSION");

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        // Logging may not be initialized yet when the config fails to load.
        eprintln!("Fatal error: {:#}", e);
        std::process::exit(1);
    }
}

fn init_logging(format: LogFormat) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info".into());
    let registry = tracing_subscriber::registry().with(filter);
    match format {
        LogFormat::Pretty => registry.with(tracing_subscriber::fmt::layer()).init(),
        LogFormat::Json => registry
            .with(tracing_subscriber::fmt::layer().json())
            .init(),
    }
}

async fn run() -> Result<()> {
    // Determine config path
    let config_path = std::env::var("ARRBOT_CONFIG")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("arrbot.toml"));

    let config = load_config(&config_path)
        .with_context(|| format!("Failed to load config from {:?}", config_path))?;

    init_logging(config.logging.format);
    info!(version = VERSION, "Loaded configuration from {:?}", config_path);

    validate_config(&config).context("Configuration validation failed")?;

    let config_json = serde_json::to_string(&config).unwrap_or_default();
    let config_hash = format!("{:x}", Sha256::digest(config_json.as_bytes()));
    info!(
        config_hash = &config_hash[..16],
        config = ?SanitizedConfig::from(&config),
        "Configuration validated"
    );

    let registry = Arc::new(
        ConnectorRegistry::from_config(&config).context("Failed to create connectors")?,
    );
    info!("{} connector(s) ready", registry.len());

    let allow_list = ChatAllowList::new(config.common.allowed_chats.iter().copied());
    if allow_list.is_empty() {
        warn!("common.allowed_chats is empty; every chat will be rejected");
    }

    let transport = Arc::new(
        TelegramTransport::new(TelegramConfig::from_common(&config.common))
            .context("Failed to create Telegram client")?,
    );
    let dispatcher = Arc::new(Dispatcher::new(registry, allow_list, transport.clone()));

    let poller = Poller::new(transport, dispatcher);
    info!("Polling for updates");
    tokio::select! {
        _ = poller.run() => {},
        _ = shutdown_signal() => {},
    }

    info!("Bot shutting down...");
    Ok(())
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
