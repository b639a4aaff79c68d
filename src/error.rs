//! Error types for the catalog.

use thiserror::Error;

/// Errors surfaced by key-value store implementations.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Database error: {0}")]
    Database(#[from] sled::Error),

    #[error("Serialization error for key {key}: {source}")]
    Serialization {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Invalid key: {0}")]
    InvalidKey(String),
}

/// Errors raised while building the node tree.
#[derive(Debug, Error)]
pub enum ModelError {
    /// Neither the node nor any ancestor carries a route pattern.
    #[error("No route pattern available for node (title: {title})")]
    RouteResolution { title: String },

    #[error("Route pattern {pattern} requires parameter '{param}'")]
    MissingRouteParam { pattern: String, param: String },

    #[error("Malformed route pattern {pattern}: {reason}")]
    InvalidPattern { pattern: String, reason: String },

    #[error("Invalid value for field '{field}': {reason}")]
    InvalidField { field: String, reason: String },

    #[error("Cannot load model from {path}: {reason}")]
    Load { path: String, reason: String },
}

/// Failures reported by the remote content API.
#[derive(Debug, Error)]
pub enum RemoteError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Unexpected status {status} from {url}")]
    Status { status: u16, url: String },

    #[error("Malformed response from {url}: {reason}")]
    Decode { url: String, reason: String },

    #[error("No API root configured for {0} repositories")]
    MissingApiRoot(String),
}

/// Failures turning remote content into HTML.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("Content is not valid base64: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("Content is not valid UTF-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),

    #[error("Markup rejected: {0}")]
    Markup(String),
}

/// Per-document failures. Always recovered: the record's outcome resolves to
/// one of these and the batch carries on.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DocError {
    #[error("Markdown does not exist: {url}")]
    MarkdownNotExists { url: String },

    #[error("Markdown is invalid: {url}")]
    MarkdownInvalid { url: String },

    #[error("Cannot get commits for {user}/{repo}@{reference}:{path}")]
    CommitLookupFailure {
        user: String,
        repo: String,
        reference: String,
        path: String,
    },
}

/// Failure escaping per-document isolation during a sync run.
#[derive(Debug, Error)]
pub enum SyncError {
    #[error("Common synchronization error: {0}")]
    Common(#[source] Box<ApiError>),
}

impl SyncError {
    pub fn common(err: impl Into<ApiError>) -> Self {
        SyncError::Common(Box::new(err.into()))
    }
}

/// Failures while producing derived artifacts (URL index, sitemap).
#[derive(Debug, Error)]
pub enum ArtifactError {
    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error("Failed to write sitemap XML: {0}")]
    Xml(String),

    #[error("Failed to serialize sitemap JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Top-level error type.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Storage error: {0}")]
    StorageError(#[from] StorageError),

    #[error("Model error: {0}")]
    ModelError(#[from] ModelError),

    #[error("Remote error: {0}")]
    RemoteError(#[from] RemoteError),

    #[error(transparent)]
    SyncError(#[from] SyncError),

    #[error("Artifact error: {0}")]
    ArtifactError(#[from] ArtifactError),
}

impl From<config::ConfigError> for ApiError {
    fn from(err: config::ConfigError) -> Self {
        ApiError::ConfigError(err.to_string())
    }
}
