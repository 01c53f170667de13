//! Error types for the HTTP server.

use thiserror::Error;

use crate::parser::{Error as ParserError, Method};
use crate::server::response::StatusCode;

/// Errors that can occur during HTTP server operation.
#[derive(Debug, Error)]
pub enum Error {
    /// Error parsing an HTTP request.
    #[error("Parse error: {0}")]
    ParseError(#[from] ParserError),

    /// I/O error.
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// Requested resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Method not allowed for the requested resource.
    #[error("Method {0} not allowed for path: {1}")]
    MethodNotAllowed(Method, String),

    /// Internal server error, usually raised by a handler.
    #[error("Internal server error: {0}")]
    InternalError(String),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// The header block grew past the configured limit without a terminator.
    #[error("Request header exceeds {0} bytes")]
    HeaderTooLarge(usize),

    /// The announced Content-Length is above the configured limit.
    #[error("Request body of {0} bytes exceeds limit of {1} bytes")]
    PayloadTooLarge(usize, usize),

    /// No base directory is configured for this MIME type.
    #[error("Unsupported MIME type: {0}")]
    UnsupportedMime(String),
}

impl Error {
    /// The status code a client sees for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            Error::ParseError(_) => StatusCode::BadRequest,
            Error::NotFound(_) | Error::UnsupportedMime(_) => StatusCode::NotFound,
            Error::MethodNotAllowed(..) => StatusCode::MethodNotAllowed,
            Error::PayloadTooLarge(..) => StatusCode::PayloadTooLarge,
            Error::HeaderTooLarge(_) => StatusCode::RequestHeaderFieldsTooLarge,
            Error::IoError(_) | Error::InternalError(_) | Error::JsonError(_) => {
                StatusCode::InternalServerError
            }
        }
    }

    /// Whether the failure is the server's fault rather than the client's.
    pub fn is_server_error(&self) -> bool {
        self.status_code().code() >= 500 || matches!(self, Error::UnsupportedMime(_))
    }
}
