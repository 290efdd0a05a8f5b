// src/config/validation.rs

use crate::config::AppConfig;
use crate::error::{AppError, Result};
use tracing::{debug, warn};
use url::Url;

pub struct ConfigValidator;

impl ConfigValidator {
    pub fn validate(config: &AppConfig) -> Result<()> {
        debug!("Starting configuration validation");

        if let Err(e) = Self::validate_engine_config(config) {
            warn!("Engine config validation failed: {}", e);
            return Err(e);
        }
        debug!("Engine config validation passed");

        if let Err(e) = Self::validate_poller_config(config) {
            warn!("Poller config validation failed: {}", e);
            return Err(e);
        }
        debug!("Poller config validation passed");

        debug!("Configuration validation completed successfully");
        Ok(())
    }

    fn validate_engine_config(config: &AppConfig) -> Result<()> {
        Self::validate_url(&config.engine.base_url, "engine.base_url")?;

        if !config.engine.health_path.starts_with('/') {
            return Err(AppError::config_validation(
                format!("Health path must start with '/': {}", config.engine.health_path),
                Some("engine.health_path"),
            ));
        }

        if config.engine.connect_timeout_secs == 0 {
            return Err(AppError::config_validation(
                "Connect timeout cannot be 0",
                Some("engine.connect_timeout_secs"),
            ));
        }

        if config.engine.request_timeout_secs == 0 {
            return Err(AppError::config_validation(
                "Request timeout cannot be 0",
                Some("engine.request_timeout_secs"),
            ));
        }

        if let Some(token) = &config.engine.api_token {
            if token.trim().is_empty() {
                return Err(AppError::config_validation(
                    "API token cannot be blank when set",
                    Some("engine.api_token"),
                ));
            }
        }

        Ok(())
    }

    fn validate_poller_config(config: &AppConfig) -> Result<()> {
        if config.poller.interval_secs == 0 {
            return Err(AppError::config_validation(
                "Poll interval cannot be 0",
                Some("poller.interval_secs"),
            ));
        }

        if config.poller.health_timeout_secs == 0 {
            return Err(AppError::config_validation(
                "Health check timeout cannot be 0",
                Some("poller.health_timeout_secs"),
            ));
        }

        // Overlapping checks are tolerated, just noisy
        if config.poller.health_timeout_secs > config.poller.interval_secs {
            warn!(
                health_timeout_secs = config.poller.health_timeout_secs,
                interval_secs = config.poller.interval_secs,
                "Health check timeout exceeds poll interval; checks may overlap"
            );
        }

        Ok(())
    }

    fn validate_url(url_str: &str, field_name: &str) -> Result<()> {
        let url = Url::parse(url_str).map_err(|e| {
            AppError::config_validation(
                format!("Invalid URL '{}': {}", url_str, e),
                Some(field_name),
            )
        })?;

        match url.scheme() {
            "http" | "https" => Ok(()),
            scheme => Err(AppError::config_validation(
                format!("Unsupported URL scheme '{}' in {}", scheme, url_str),
                Some(field_name),
            )),
        }
    }
}
