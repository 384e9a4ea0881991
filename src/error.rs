//! Error types for the LTI tool runtime

use std::io;

use axum::http::StatusCode;
use thiserror::Error;

/// Result type alias for the LTI tool runtime
pub type Result<T> = std::result::Result<T, Error>;

/// LTI tool errors
#[derive(Error, Debug)]
pub enum Error {
    /// Malformed or missing claim, state mismatch, unsupported message type
    #[error("Validation error: {0}")]
    Validation(String),

    /// Signature verification failed or no key for the token's `kid`
    #[error("Trust error: {0}")]
    Trust(String),

    /// Deployment mistake (no signing key registered, URL not configured)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Non-2xx or unparseable response from a platform endpoint
    #[error("{operation}: {message}")]
    RemoteService {
        /// Operation that failed
        operation: String,
        /// What went wrong
        message: String,
    },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// HTTP error
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JWT encode/decode error
    #[error("JWT error: {0}")]
    Jwt(#[from] jsonwebtoken::errors::Error),
}

impl Error {
    /// Create a remote service error tagged with the failing operation
    pub fn remote(operation: impl Into<String>, message: impl Into<String>) -> Self {
        Self::RemoteService {
            operation: operation.into(),
            message: message.into(),
        }
    }

    /// HTTP status a handler should answer with for this error
    #[must_use]
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Validation(_) | Self::Trust(_) | Self::Jwt(_) => StatusCode::UNAUTHORIZED,
            Self::RemoteService { .. } | Self::Http(_) => StatusCode::BAD_GATEWAY,
            Self::Config(_) | Self::Io(_) | Self::Json(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// `true` for rejections caused by the inbound request rather than the deployment
    #[must_use]
    pub fn is_rejection(&self) -> bool {
        matches!(self, Self::Validation(_) | Self::Trust(_) | Self::Jwt(_))
    }
}
