//! Ghost client errors

use thiserror::Error;

#[derive(Error, Debug)]
pub enum GhostError {
    #[error("Ghost client is not configured: {0}")]
    Config(String),

    #[error("Request to {url} failed: {source}")]
    Http {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Ghost API returned {status} for {url}: {message}")]
    Status {
        url: String,
        status: u16,
        message: String,
    },

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Failed to decode response from {url}: {source}")]
    Decode {
        url: String,
        #[source]
        source: serde_json::Error,
    },
}

pub type GhostResult<T> = std::result::Result<T, GhostError>;
