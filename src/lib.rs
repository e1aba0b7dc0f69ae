pub mod api;
pub mod cli; // Operator commands: users and tokens
pub mod clinical; // AMR risk, diagnosis rules, skin images
pub mod config;
pub mod core_state;
pub mod db;
pub mod gateway; // Chat completion gateway
pub mod models;

use std::sync::Arc;
use tracing_subscriber::EnvFilter;

use crate::cli::{Command, CommandError};
use crate::config::{AppConfig, ConfigError};
use crate::core_state::{CoreError, CoreState};

#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("Startup error: {0}")]
    Core(#[from] CoreError),
    #[error("Failed to start API server: {0}")]
    Server(#[from] std::io::Error),
    #[error("{0}")]
    Command(#[from] CommandError),
}

/// Install the global tracing subscriber. `RUST_LOG` overrides the default filter.
/// Logs go to stderr; stdout carries command output only.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config::default_log_filter())),
        )
        .try_init();
}

/// Load configuration, open the store, serve the API until Ctrl-C.
pub async fn run() -> Result<(), StartupError> {
    init_tracing();

    tracing::info!("{} starting v{}", config::APP_NAME, config::APP_VERSION);

    let config = AppConfig::from_env()?;
    if !config.gateway.has_credential() {
        tracing::warn!("OPENROUTER_API_KEY not set; chat will use the offline clinical library");
    }

    let core = Arc::new(CoreState::new(&config)?);
    let server = api::start_server(core.clone(), config.bind_addr, &config.cors_origins).await?;
    tracing::info!(addr = %server.info.server_addr, "Listening");

    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {e}");
    }

    server.stop().await;
    if let Err(e) = core.flush_audit() {
        tracing::warn!(error = %e, "Failed to flush audit entries on shutdown");
    }

    tracing::info!("{} stopped", config::APP_NAME);
    Ok(())
}

/// Run one operator command and print its result.
pub fn run_command(command: Command) -> Result<(), StartupError> {
    init_tracing();
    let config = AppConfig::from_env()?;
    let output = cli::run(&config, command)?;
    println!("{output}");
    Ok(())
}
