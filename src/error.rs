//! Error types for the caching subsystem
//!
//! Cache-level conditions (miss, expiry, eviction) are never errors. The
//! variants here only describe failures of collaborators (storage, network)
//! and of requests made through the diagnostics API.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

// == Cache Error Enum ==
/// Unified error type for the caching subsystem.
///
/// `Clone` so that one fetch outcome can be handed to every coalesced waiter.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CacheError {
    /// Local storage read/write failed
    #[error("Storage error: {0}")]
    Storage(String),

    /// Stored data could not be encoded or decoded
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Image download failed
    #[error("Failed to fetch {url}: {reason}")]
    Fetch { url: String, reason: String },

    /// Key not found (diagnostics API only)
    #[error("Key not found: {0}")]
    NotFound(String),

    /// Invalid request data
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl CacheError {
    /// Builds a fetch error for `url`.
    pub fn fetch(url: impl Into<String>, reason: impl ToString) -> Self {
        CacheError::Fetch {
            url: url.into(),
            reason: reason.to_string(),
        }
    }
}

impl From<std::io::Error> for CacheError {
    fn from(err: std::io::Error) -> Self {
        CacheError::Storage(err.to_string())
    }
}

impl From<serde_json::Error> for CacheError {
    fn from(err: serde_json::Error) -> Self {
        CacheError::Serialization(err.to_string())
    }
}

// == IntoResponse Implementation ==
impl IntoResponse for CacheError {
    fn into_response(self) -> Response {
        let status = match &self {
            CacheError::NotFound(_) => StatusCode::NOT_FOUND,
            CacheError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            CacheError::Fetch { .. } => StatusCode::BAD_GATEWAY,
            CacheError::Storage(_) => StatusCode::SERVICE_UNAVAILABLE,
            CacheError::Serialization(_) | CacheError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        let body = Json(json!({
            "error": self.to_string()
        }));

        (status, body).into_response()
    }
}

// == Result Type Alias ==
/// Convenience Result type for the caching subsystem.
pub type Result<T> = std::result::Result<T, CacheError>;
