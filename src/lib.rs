// src/lib.rs

pub mod cli;
pub mod config;
pub mod connectivity;
pub mod engine;
pub mod error;
pub mod state;

use std::path::{Path, PathBuf};
use tracing::{error, info};

// Re-exports of the key types
pub use config::AppConfig;
pub use connectivity::{ConnectivityState, ConnectivityStore, EngineStatus, HealthPoller};
pub use engine::EngineClient;
pub use error::{AppError, Result};
pub use state::AppState;

/// Resolves the config path, loads and validates the configuration, and
/// builds the shared state.
pub fn bootstrap(config_path_override: Option<PathBuf>) -> Result<AppState> {
    let (app_config, _) = setup_configuration(config_path_override)?;
    let state = AppState::new(&app_config)?;
    info!("Application state initialized successfully.");
    Ok(state)
}

/// Loads, validates and logs the application configuration.
pub fn setup_configuration(config_path_override: Option<PathBuf>) -> Result<(AppConfig, PathBuf)> {
    let config_path = resolve_config_path(config_path_override);

    let config_path_display = config_path.display().to_string();
    if config_path.exists() {
        info!(config.path = %config_path_display, "Using configuration file");
    } else {
        info!(config.path = %config_path_display, "Optional configuration file not found. Using defaults and environment variables.");
    }

    let app_config = config::load_config(&config_path).map_err(|e| {
        error!(
            config.path = %config_path_display,
            error = ?e,
            "Failed to load or validate configuration."
        );
        e
    })?;

    info!(
        engine.url = %app_config.engine.base_url,
        engine.health_url = %app_config.health_url(),
        poller.interval_secs = app_config.poller.interval_secs,
        poller.health_timeout_secs = app_config.poller.health_timeout_secs,
        "Configuration loaded and validated successfully."
    );

    Ok((app_config, config_path))
}

fn resolve_config_path(config_path_override: Option<PathBuf>) -> PathBuf {
    config_path_override.unwrap_or_else(|| {
        std::env::var("FACTORY_PANEL_CONFIG")
            .map_or_else(|_| Path::new("config.yaml").to_path_buf(), PathBuf::from)
    })
}
