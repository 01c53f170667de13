//! Handler return values and their conversion into responses.

use std::io::ErrorKind;
use std::path::Path;

use log::{debug, error};
use serde::Serialize;
use serde_json::Value;

use crate::server::error::Error;
use crate::server::mime;
use crate::server::response::{HttpResponse, StatusCode};

/// What a handler hands back to the server.
#[derive(Debug, Clone)]
pub enum HandlerResult {
    /// Explicit status, content, MIME type and extra headers.
    Structured(Structured),
    /// Serialized whole as JSON with status 200.
    Json(Value),
    /// Served as `application/octet-stream` with status 200.
    Bytes(Vec<u8>),
    /// A file path to serve, or literal text when it does not look like one.
    Text(String),
}

impl HandlerResult {
    /// Serialize any value into a [`HandlerResult::Json`].
    pub fn json<T: Serialize + ?Sized>(value: &T) -> Result<Self, Error> {
        Ok(HandlerResult::Json(serde_json::to_value(value)?))
    }
}

/// A fully specified handler response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Structured {
    /// Numeric status; codes without a known reason phrase are sent with `OK`
    pub status: u16,
    pub content: Vec<u8>,
    pub mime: String,
    /// Emitted verbatim after the status line, in order
    pub headers: Vec<(String, String)>,
}

impl Structured {
    pub fn new(status: u16, content: impl Into<Vec<u8>>, mime: impl Into<String>) -> Self {
        Self {
            status,
            content: content.into(),
            mime: mime.into(),
            headers: Vec::new(),
        }
    }

    /// Add a literal response header, e.g. `Set-Cookie`.
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }
}

impl From<Structured> for HandlerResult {
    fn from(s: Structured) -> Self {
        HandlerResult::Structured(s)
    }
}

impl From<Value> for HandlerResult {
    fn from(v: Value) -> Self {
        HandlerResult::Json(v)
    }
}

impl From<Vec<u8>> for HandlerResult {
    fn from(b: Vec<u8>) -> Self {
        HandlerResult::Bytes(b)
    }
}

impl From<String> for HandlerResult {
    fn from(s: String) -> Self {
        HandlerResult::Text(s)
    }
}

impl From<&str> for HandlerResult {
    fn from(s: &str) -> Self {
        HandlerResult::Text(s.to_string())
    }
}

/// Whether a text result names a file rather than carrying literal text.
///
/// Anything with a `.` that does not open a markup fragment is taken as a path.
pub fn looks_like_path(text: &str) -> bool {
    text.contains('.') && !text.trim_start().starts_with('<')
}

/// Turn a handler result into a response.
///
/// File paths in [`HandlerResult::Text`] are resolved against `root`. Failures
/// are folded into the response: a missing file is a 404, anything else a 500.
pub async fn build_response(result: HandlerResult, root: &Path) -> HttpResponse {
    match result {
        HandlerResult::Structured(s) => {
            let mut response = HttpResponse::new(StatusCode::from_u16(s.status))
                .with_content_type(s.mime)
                .with_body_bytes(s.content);
            for (name, value) in s.headers {
                response = response.append_header(name, value);
            }
            response
        }
        HandlerResult::Json(value) => match HttpResponse::new(StatusCode::Ok).with_json(&value) {
            Ok(response) => response,
            Err(e) => {
                error!("Error encoding JSON result: {e}");
                HttpResponse::from(&e)
            }
        },
        HandlerResult::Bytes(bytes) => HttpResponse::new(StatusCode::Ok)
            .with_content_type(mime::DEFAULT_MIME_TYPE)
            .with_body_bytes(bytes),
        HandlerResult::Text(text) if looks_like_path(&text) => serve_file(&text, root).await,
        HandlerResult::Text(text) => HttpResponse::new(StatusCode::Ok)
            .with_content_type("text/plain")
            .with_body_string(text),
    }
}

async fn serve_file(path: &str, root: &Path) -> HttpResponse {
    let full = root.join(path);
    match tokio::fs::read(&full).await {
        Ok(content) => HttpResponse::new(StatusCode::Ok)
            .with_content_type(mime::guess_or_default(path))
            .with_body_bytes(content),
        Err(e) if e.kind() == ErrorKind::NotFound => {
            debug!("File not found: {}", full.display());
            HttpResponse::from(&Error::NotFound(path.to_string()))
        }
        Err(e) => {
            error!("Error serving file {}: {e}", full.display());
            HttpResponse::from(&Error::IoError(e))
        }
    }
}
