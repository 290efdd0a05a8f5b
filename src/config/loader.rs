// src/config/loader.rs

use crate::config::{AppConfig, ConfigValidator};
use crate::error::{AppError, Result};
use std::path::Path;
use tracing::{debug, info, warn};

/// Load configuration from file or environment variables
pub fn load_config(config_path: &Path) -> Result<AppConfig> {
    let mut config = if config_path.exists() {
        info!("Loading configuration from file: {}", config_path.display());
        load_from_file(config_path)?
    } else {
        info!("Configuration file not found, using defaults");
        AppConfig::default()
    };

    // Override with environment variables
    override_with_env(&mut config);

    // Validate the final configuration
    ConfigValidator::validate(&config)?;

    debug!("Configuration loaded and validated successfully");
    Ok(config)
}

fn load_from_file(config_path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(config_path).map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => AppError::ConfigNotFound {
            path: config_path.display().to_string(),
        },
        _ => AppError::Io {
            operation: "read_config".to_string(),
            message: format!("{}: {}", config_path.display(), e),
        },
    })?;

    // An empty file is a valid "all defaults" config
    if content.trim().is_empty() {
        return Ok(AppConfig::default());
    }

    serde_yaml::from_str(&content).map_err(|e| AppError::ConfigParse {
        message: format!("Failed to parse config file: {}", e),
        line: e.location().map(|loc| loc.line()),
    })
}

fn override_with_env(config: &mut AppConfig) {
    if let Ok(url) = std::env::var("FACTORY_ENGINE_URL") {
        info!("Overriding Engine base URL from environment variable");
        config.engine.base_url = url;
    }

    if let Ok(token) = std::env::var("FACTORY_ENGINE_TOKEN") {
        info!("Overriding Engine API token from environment variable");
        config.engine.api_token = Some(token);
    }

    if let Ok(interval_str) = std::env::var("FACTORY_POLL_INTERVAL_SECS") {
        if let Ok(interval) = interval_str.parse::<u64>() {
            info!("Overriding poll interval from environment: {}s", interval);
            config.poller.interval_secs = interval;
        } else {
            warn!("Invalid FACTORY_POLL_INTERVAL_SECS environment variable: {}", interval_str);
        }
    }

    if let Ok(timeout_str) = std::env::var("FACTORY_HEALTH_TIMEOUT_SECS") {
        if let Ok(timeout) = timeout_str.parse::<u64>() {
            info!("Overriding health check timeout from environment: {}s", timeout);
            config.poller.health_timeout_secs = timeout;
        } else {
            warn!("Invalid FACTORY_HEALTH_TIMEOUT_SECS environment variable: {}", timeout_str);
        }
    }
}

/// Save configuration to file
pub async fn save_config(config: &AppConfig, config_path: &Path) -> Result<()> {
    let yaml_content = serde_yaml::to_string(config).map_err(|e| AppError::Serialization {
        message: format!("Failed to serialize config: {}", e),
    })?;

    tokio::fs::write(config_path, yaml_content)
        .await
        .map_err(|e| AppError::Io {
            operation: "write_config".to_string(),
            message: format!("Failed to write config file: {}", e),
        })?;

    info!("Configuration saved to: {}", config_path.display());
    Ok(())
}
