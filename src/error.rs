//! Error types for the coaching core.

use std::time::Duration;

/// Top-level error type.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Session error: {0}")]
    Session(#[from] SessionError),

    #[error("Ingestion error: {0}")]
    Ingestion(#[from] IngestionError),

    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),
}

/// Configuration-related errors. Fatal at startup; nothing is served if
/// configuration fails.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },
}

/// Session lifecycle errors, surfaced to the UI boundary.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("No name has been submitted for this session yet")]
    NameRequired,

    #[error("Message text is empty")]
    EmptyMessage,

    #[error("This session does not accept document uploads")]
    UploadsDisabled,
}

/// Per-document knowledge ingestion failures. Never fatal: the failing
/// document is skipped and the remaining sources are still processed.
#[derive(Debug, thiserror::Error)]
pub enum IngestionError {
    #[error("Failed to read {name}: {source}")]
    Unreadable {
        name: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to extract text from {name}: {reason}")]
    Extraction { name: String, reason: String },
}

/// Generation provider errors. Non-fatal to the session: the triggering
/// user turn is retained and no retry happens until the user sends again.
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    #[error("Generation request failed: {reason}")]
    RequestFailed { reason: String },

    #[error("Provider returned HTTP {status}: {body}")]
    Http { status: u16, body: String },

    #[error("Provider rate limited, retry after {retry_after:?}")]
    RateLimited { retry_after: Option<Duration> },

    #[error("Provider returned no usable content")]
    EmptyResponse,
}
