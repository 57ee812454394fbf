//! Configuration error types

use thiserror::Error;

/// Errors that can occur during configuration loading
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read configuration: {0}")]
    LoadError(#[from] config::ConfigError),

    #[error("Invalid configuration: {0}")]
    ValidationFailed(#[from] ValidationError),
}

/// Errors that can occur during configuration validation
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("Missing required setting: {0}")]
    MissingRequired(&'static str),

    #[error("Server port must be non-zero")]
    InvalidPort,

    #[error("Bind host must be an IP address")]
    InvalidBindHost,

    #[error("Timeout out of range (1-300 seconds)")]
    InvalidTimeout,

    #[error("Lead store URL must start with postgres:// or postgresql://")]
    InvalidDatabaseUrl,

    #[error("Catalog base URL must start with http:// or https://")]
    InvalidCatalogUrl,

    #[error("Connection pool size exceeds maximum allowed (100)")]
    PoolSizeTooLarge,

    #[error("Transcript window must be at least 1")]
    InvalidTranscriptWindow,

    #[error("Deal confidence threshold must be within [0, 1]")]
    InvalidConfidenceThreshold,

    #[error("Idle timeout must be longer than the sweep interval")]
    InvalidIdleTimeout,
}
