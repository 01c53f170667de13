//! A minimal HTTP/1.1 server engine.
//!
//! hookhttp accepts TCP connections, parses one request per connection,
//! resolves a `(method, path)` route, calls the application handler and
//! writes a complete `Connection: close` response. Requests no route claims
//! fall back to static files chosen by MIME type.
//!
//! # Features
//!
//! - Request framing on the `\r\n\r\n` boundary with `Content-Length` bodies
//! - Header/query/cookie/form parsing with case-insensitive header lookup
//! - Exact method+path routing with index-page aliases and a 404/405 split
//! - Handlers returning structured responses, JSON, raw bytes, or file paths
//! - Static file fallback with MIME inference
//!
//! # Examples
//!
//! ## Parsing
//!
//! ```
//! use hookhttp::{parse_request, Method};
//!
//! let request = parse_request(b"GET /messages?channel=tech HTTP/1.1\r\nHost: example.com", b"").unwrap();
//!
//! assert_eq!(request.method, Method::GET);
//! assert_eq!(request.path, "/messages");
//! assert_eq!(request.get_query_param("channel"), Some("tech"));
//! assert_eq!(request.get_header("HOST"), Some("example.com"));
//! ```
//!
//! ## Serving
//!
//! ```no_run
//! use hookhttp::{HandlerResult, HttpServer, Method, ServerConfig, Structured};
//! use serde_json::json;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), hookhttp::ServerError> {
//!     let mut server = HttpServer::new(ServerConfig::default());
//!
//!     server
//!         .add_route(Method::GET, "/status", |_headers, _body| {
//!             Ok(json!({ "ok": true }).into())
//!         })
//!         .add_route(Method::POST, "/login", |_headers, body| {
//!             if body == Some("user=admin") {
//!                 Ok(Structured::new(200, "welcome", "text/plain")
//!                     .with_header("Set-Cookie", "auth=true; Path=/")
//!                     .into())
//!             } else {
//!                 Ok(Structured::new(401, "no", "text/plain").into())
//!             }
//!         })
//!         .add_route(Method::GET, "/login.html", |_headers, _body| {
//!             Ok(HandlerResult::Text("www/login.html".to_string()))
//!         });
//!
//!     server.start().await
//! }
//! ```

// Export the parser module
pub mod parser;

// Export the server module
pub mod server;

// Re-export commonly used items for convenience
pub use parser::{Error as ParserError, Headers, HttpRequest, HttpVersion, Method, parse_request};
pub use server::{
    Error as ServerError, HandlerResult, HttpResponse, HttpServer, Router, ServerConfig, StatusCode,
    Structured,
};
