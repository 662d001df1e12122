use thiserror::Error;

/// Error type for catalog operations.
///
/// - `RequestFailed` — network/transport errors (wraps `reqwest::Error`)
/// - `NotFound` — HTTP 404
/// - `RateLimited` — HTTP 403/429, usually the GitHub API quota
/// - `Api` — any other non-2xx status code
/// - `Decode` — a document that does not match the expected shape
/// - `Encode` — an item that could not be serialised for the cache
/// - `Storage` — local cache failures (wraps `rusqlite::Error`)
/// - `WorkerStopped` — a background task ended without reporting a result
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),

    #[error("Not found: {message}")]
    NotFound { message: String },

    #[error("Rate limited: {message}")]
    RateLimited { message: String },

    #[error("API error {status}: {message}")]
    Api { status: u16, message: String },

    #[error("Failed to decode {context}: {source}")]
    Decode {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to encode {context}: {source}")]
    Encode {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Storage error: {0}")]
    Storage(#[from] rusqlite::Error),

    #[error("Invalid configuration: {message}")]
    Config { message: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Background {task} stopped unexpectedly")]
    WorkerStopped { task: &'static str },
}

impl CatalogError {
    pub(crate) fn decode(context: impl Into<String>, source: serde_json::Error) -> Self {
        CatalogError::Decode {
            context: context.into(),
            source,
        }
    }

    pub(crate) fn encode(context: impl Into<String>, source: serde_json::Error) -> Self {
        CatalogError::Encode {
            context: context.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, CatalogError>;
