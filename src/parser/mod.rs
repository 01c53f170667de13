//! HTTP parser module.
//!
//! Turns a raw header block plus body bytes into an [`HttpRequest`]. Parsing
//! is free of side effects: no routing decisions are made here.

mod request;
mod headers;
mod method;
mod version;
mod error;

// Re-export public items
pub use request::{HttpRequest, PATH_HEADER};
pub use headers::Headers;
pub use method::Method;
pub use version::HttpVersion;
pub use error::Error;

// Re-export the parsing functions
pub use request::{cookies, parse_form, parse_query, parse_request};
