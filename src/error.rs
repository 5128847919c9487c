//! Typed errors for each pipeline stage.

use std::time::Duration;
use thiserror::Error;

/// Page-level failure while fetching from a source.
///
/// Aborts one `fetch_listings` call; items parsed before it are kept.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("network error fetching {url}: {message}")]
    Network { url: String, message: String },

    #[error("timeout fetching {url}")]
    Timeout { url: String },

    #[error("{url} returned status {status}")]
    Status { url: String, status: u16 },

    #[error("unusable document from {url}: {reason}")]
    InvalidDocument { url: String, reason: String },
}

impl FetchError {
    pub fn from_reqwest(url: &str, err: reqwest::Error) -> Self {
        if err.is_timeout() {
            FetchError::Timeout {
                url: url.to_string(),
            }
        } else if let Some(status) = err.status() {
            FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            }
        } else {
            FetchError::Network {
                url: url.to_string(),
                message: err.to_string(),
            }
        }
    }
}

/// Malformed or missing structure within one item; drops only that item.
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("missing required field: {0}")]
    MissingField(&'static str),
}

/// Classification call failed or returned something outside the schema.
#[derive(Debug, Error)]
pub enum EnrichmentError {
    #[error("classification request failed: {0}")]
    Request(String),

    #[error("classification call timed out after {0:?}")]
    Timeout(Duration),

    #[error("classification API error: {0}")]
    Api(String),

    #[error("malformed classification response: {0}")]
    MalformedResponse(String),

    #[error("invalid {field} in classification response: {reason}")]
    InvalidField { field: &'static str, reason: String },
}

/// Store read or write failure.
#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("corrupt document {collection}/{key}: {reason}")]
    Corrupt {
        collection: String,
        key: String,
        reason: String,
    },

    #[error("invalid key: {0}")]
    InvalidKey(String),
}

pub type PersistenceResult<T> = std::result::Result<T, PersistenceError>;
