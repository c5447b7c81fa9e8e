//! Error types for leafguard-server
//!
//! Defines the service error type using thiserror, plus its mapping to
//! HTTP responses: client-input errors become 400, missing credentials
//! 401, missing resources 404, everything else 500 with the message
//! surfaced and the error logged server-side.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use thiserror::Error;

/// Main error type for the leafguard-server service
#[derive(Error, Debug)]
pub enum Error {
    /// Invalid request (missing field, missing file, bad payload)
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Missing or invalid credentials
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Database connection or query errors
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// File I/O errors
    #[error("File I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Classifier inference errors
    #[error("Inference error: {0}")]
    Inference(String),

    /// Other errors
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Convenience Result type using leafguard-server Error
pub type Result<T> = std::result::Result<T, Error>;

impl From<leafguard_common::Error> for Error {
    fn from(err: leafguard_common::Error) -> Self {
        match err {
            leafguard_common::Error::Database(e) => Error::Database(e),
            leafguard_common::Error::Io(e) => Error::Io(e),
            leafguard_common::Error::NotFound(msg) => Error::NotFound(msg),
            leafguard_common::Error::InvalidInput(msg) => Error::BadRequest(msg),
            other => Error::Internal(other.to_string()),
        }
    }
}

impl Error {
    fn status(&self) -> StatusCode {
        match self {
            Error::BadRequest(_) => StatusCode::BAD_REQUEST,
            Error::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Error::NotFound(_) => StatusCode::NOT_FOUND,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!("{}", self);
        }
        let body = Json(serde_json::json!({ "error": self.to_string() }));
        (status, body).into_response()
    }
}
