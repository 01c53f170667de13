//! HTTP protocol versions.

use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

/// The version token of a request line.
///
/// Responses are always written as `HTTP/1.1` regardless of the request version.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HttpVersion {
    Http10,
    Http11,
    /// Any other token, kept verbatim.
    Other(String),
}

impl From<&str> for HttpVersion {
    fn from(token: &str) -> Self {
        match token {
            "HTTP/1.0" => HttpVersion::Http10,
            "HTTP/1.1" => HttpVersion::Http11,
            other => HttpVersion::Other(other.to_string()),
        }
    }
}

impl FromStr for HttpVersion {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(HttpVersion::from(s))
    }
}

impl fmt::Display for HttpVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HttpVersion::Http10 => f.write_str("HTTP/1.0"),
            HttpVersion::Http11 => f.write_str("HTTP/1.1"),
            HttpVersion::Other(token) => f.write_str(token),
        }
    }
}
