use std::time::Duration;

use shared::{domain::FilterKind, error::ApiError};
use thiserror::Error;

/// Failure talking to the admin backend.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("backend rejected request with status {status}: {error}")]
    Status { status: u16, error: ApiError },
    #[error("request timed out after {0:?}")]
    Timeout(Duration),
    #[error("failed to decode response from {url}: {message}")]
    Decode { url: String, message: String },
    #[error("invalid backend url: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

impl ClientError {
    pub fn status(status: u16, error: ApiError) -> Self {
        ClientError::Status { status, error }
    }
}

/// Contract violations on the query state controller.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QueryError {
    #[error("unknown filter key '{0}' for this screen")]
    UnknownFilter(String),
    #[error("filter '{key}' does not accept {kind:?} values")]
    KindMismatch { key: String, kind: FilterKind },
    #[error("page size must be greater than zero")]
    InvalidPageSize,
}

/// Contract violations on an ordered collection.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReorderError {
    #[error("index {index} out of range for collection of {len} items")]
    IndexOutOfRange { index: usize, len: usize },
    #[error("position {position} out of range for collection of {len} items")]
    PositionOutOfRange { position: u32, len: usize },
    #[error("item {0} is not part of this collection")]
    UnknownItem(String),
}

/// Result of an explicit position write.
#[derive(Debug, Error)]
pub enum PersistError {
    #[error(transparent)]
    Reorder(#[from] ReorderError),
    #[error(transparent)]
    Client(#[from] ClientError),
}
