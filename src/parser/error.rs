//! Error types for the HTTP parser.

use thiserror::Error;

/// Errors that can occur during HTTP request parsing.
///
/// Any error out of [`parse_request`](crate::parser::parse_request) is answered
/// with `400 Bad Request`.
#[derive(Debug, Error)]
pub enum Error {
    /// The request line does not split into exactly method, target and version.
    #[error("Malformed request line: {0}")]
    MalformedRequestLine(String),

    /// A required header is missing from the request.
    #[error("Required header is missing: {0}")]
    MissingHeader(String),

    /// Nothing but whitespace arrived before the header separator.
    #[error("Empty request")]
    EmptyRequest,

    /// Error parsing JSON.
    #[error("JSON parsing error: {0}")]
    JsonError(#[from] serde_json::Error),
}
