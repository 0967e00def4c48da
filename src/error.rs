//! Error types for the batch engine.

use thiserror::Error;

/// Errors raised while loading and validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Top-level engine errors. Only the configuration/setup kind (1) and
/// cancellation propagate out of the orchestrator; every other error kind
/// described in the spec's error-handling design is logged and swallowed at
/// the point it occurs.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("input file not found: {0}")]
    InputNotFound(std::path::PathBuf),

    #[error("failed to create parent directory for {path}: {source}")]
    OutputDir {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("startup hook failed: {0}")]
    Startup(String),
}

/// Error returned by a `Transform` invocation.
///
/// Any `TransformError` is treated as retryable by the dispatcher; after
/// retries are exhausted it is stringified into a failure record's
/// `error_message` field.
#[derive(Debug, Error)]
pub enum TransformError {
    #[error("request error: {0}")]
    Request(#[from] reqwest::Error),

    #[error("unexpected response status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("{0}")]
    Other(String),
}
