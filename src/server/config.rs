//! Server configuration.

use std::net::{Ipv4Addr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

/// HTTP server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// The address to bind to.
    pub addr: SocketAddr,
    /// The maximum number of concurrent connections.
    pub max_connections: usize,
    /// Size of each socket read.
    pub read_buffer_size: usize,
    /// How long to wait for the header block before proceeding with what arrived.
    pub header_timeout: Duration,
    /// Per-read wait while completing the body; `None` waits indefinitely.
    pub body_timeout: Option<Duration>,
    /// Largest accepted header block, in bytes. Larger requests get a 431.
    pub max_header_size: usize,
    /// Largest accepted `Content-Length`, in bytes. Larger requests get a 413.
    pub max_body_size: usize,
    /// Root for static files and for file paths returned by handlers.
    pub document_root: PathBuf,
    /// Directory under the root holding HTML pages.
    pub pages_dir: PathBuf,
    /// Directory under the root holding stylesheets, scripts, text and images.
    pub assets_dir: PathBuf,
    /// Directory under the root holding JSON data files.
    pub data_dir: PathBuf,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            addr: SocketAddr::from((Ipv4Addr::LOCALHOST, 8080)),
            max_connections: 1024,
            read_buffer_size: 4096,
            header_timeout: Duration::from_secs(1),
            body_timeout: Some(Duration::from_secs(1)),
            max_header_size: 10_000,
            max_body_size: 1024 * 1024,
            document_root: PathBuf::from("."),
            pages_dir: PathBuf::from("www"),
            assets_dir: PathBuf::from("static"),
            data_dir: PathBuf::from("apps"),
        }
    }
}
