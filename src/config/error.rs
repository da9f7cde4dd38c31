//! Configuration error types

use thiserror::Error;

/// Errors that can occur during configuration loading
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration loading failed: {0}")]
    LoadError(#[from] config::ConfigError),

    #[error("Validation failed: {0}")]
    ValidationFailed(#[from] ValidationError),
}

/// Errors that can occur during configuration validation
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Required configuration missing: {0}")]
    MissingRequired(&'static str),

    #[error("Invalid port number")]
    InvalidPort,

    #[error("Invalid bind address: {0}")]
    InvalidBindAddress(String),

    #[error("Invalid request timeout")]
    InvalidTimeout,

    #[error("Assistant base URL must start with http:// or https://")]
    InvalidBaseUrl,

    #[error("Assistant base URL must use HTTPS in production")]
    BaseUrlMustBeHttps,

    #[error("Poll interval must be between 100ms and 60s")]
    InvalidPollInterval,

    #[error("Max poll attempts must be between 1 and 600")]
    InvalidPollAttempts,

    #[error("Static asset prefix must start with '/' and not be '/'")]
    InvalidStaticPrefix,
}
