//! HTTP server implementation for hookhttp.
//!
//! One task per accepted connection drives the pipeline in
//! [`handle_connection`]: read the request bytes, parse, resolve a route,
//! invoke the handler (or fall back to static files), write the response and
//! close.

mod response;
mod result;
mod config;
mod error;
mod handler;
mod reader;
mod router;
mod static_files;
mod connection;
mod http_server;
mod tests;

pub mod mime;

// Re-export public items
pub use response::{HttpResponse, StatusCode};
pub use result::{build_response, looks_like_path, HandlerResult, Structured};
pub use config::ServerConfig;
pub use error::Error;
pub use handler::HandlerFn;
pub use reader::{content_length, find_separator, read_request, RawRequest};
pub use router::{normalize_path, Resolution, Router};
pub use static_files::StaticFiles;
pub use connection::handle_connection;
pub use http_server::HttpServer;
