//! Error handling for the panel core
//!
//! This module provides:
//! - A single categorized error type for configuration, HTTP and Engine API failures
//! - Structured logging with the right level per category
//! - Conversions from the library errors used across the crate

pub mod types;

use thiserror::Error;
use tracing::{error, warn};

/// Main application error type
#[derive(Error, Debug)]
pub enum AppError {
    // Configuration errors
    #[error("Configuration validation failed: {message}")]
    ConfigValidation { message: String, field: Option<String> },

    #[error("Configuration file not found: {path}")]
    ConfigNotFound { path: String },

    #[error("Configuration parse error: {message}")]
    ConfigParse { message: String, line: Option<usize> },

    // HTTP and network errors
    #[error("HTTP client error: {message}")]
    HttpClient { message: String, status_code: Option<u16> },

    #[error("Request timeout after {timeout_ms}ms")]
    RequestTimeout { timeout_ms: u64 },

    #[error("Invalid request: {message}")]
    InvalidRequest { message: String },

    // Engine API errors
    #[error("Engine API error [{code}]: {message}")]
    EngineApi { code: String, message: String },

    #[error("Engine returned an empty response for {resource}")]
    EmptyResponse { resource: String },

    // System errors
    #[error("Internal error: {message}")]
    Internal { message: String },

    #[error("Serialization error: {message}")]
    Serialization { message: String },

    #[error("IO operation failed: {operation} - {message}")]
    Io { operation: String, message: String },
}

/// Coarse grouping used for log levels and exit codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Configuration,
    Network,
    Engine,
    Internal,
}

impl AppError {
    /// Create a new configuration validation error
    pub fn config_validation(message: impl Into<String>, field: Option<impl Into<String>>) -> Self {
        Self::ConfigValidation {
            message: message.into(),
            field: field.map(Into::into),
        }
    }

    /// Create a new internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::ConfigValidation { .. } | Self::ConfigNotFound { .. } | Self::ConfigParse { .. } => {
                ErrorCategory::Configuration
            }
            Self::HttpClient { .. } | Self::RequestTimeout { .. } | Self::InvalidRequest { .. } => {
                ErrorCategory::Network
            }
            Self::EngineApi { .. } | Self::EmptyResponse { .. } => ErrorCategory::Engine,
            Self::Internal { .. } | Self::Serialization { .. } | Self::Io { .. } => {
                ErrorCategory::Internal
            }
        }
    }

    /// Whether the failure is the kind a later poll may not see again
    pub fn is_transient(&self) -> bool {
        match self {
            Self::RequestTimeout { .. } => true,
            Self::HttpClient { status_code, .. } => {
                status_code.map_or(true, |code| code >= 500 || code == 429)
            }
            _ => false,
        }
    }

    /// Log the error with appropriate level
    pub fn log(&self, context: &str) {
        match self.category() {
            ErrorCategory::Internal => {
                error!(error = %self, context, "Internal error occurred");
            }
            ErrorCategory::Configuration => {
                error!(error = %self, context, "Configuration error occurred");
            }
            ErrorCategory::Network | ErrorCategory::Engine => {
                warn!(
                    error = %self,
                    context,
                    transient = self.is_transient(),
                    "Engine request failed"
                );
            }
        }
    }
}

/// Result type alias for the application
pub type Result<T, E = AppError> = std::result::Result<T, E>;
