//! HTTP request parsing and representation.

use std::collections::HashMap;
use serde::de::DeserializeOwned;
use url::form_urlencoded;

use crate::parser::error::Error;
use crate::parser::headers::Headers;
use crate::parser::method::Method;
use crate::parser::version::HttpVersion;

/// Name of the synthetic header carrying the original request target.
///
/// Handlers only receive headers and body, so the query string reaches them
/// through this entry.
pub const PATH_HEADER: &str = "path";

/// Represents an HTTP request.
#[derive(Debug, Clone)]
pub struct HttpRequest {
    /// The HTTP method (GET, POST, etc.)
    pub method: Method,
    /// The request path, always starting with `/`, query stripped
    pub path: String,
    /// The request target as it appeared on the request line, query included
    pub target: String,
    /// The HTTP version
    pub version: HttpVersion,
    /// The HTTP headers, keyed by lower-cased name
    pub headers: Headers,
    /// The request body decoded as text, `None` when no body bytes arrived
    pub body: Option<String>,
    /// Query parameters parsed from the target
    pub query_params: HashMap<String, String>,
}

impl HttpRequest {
    /// Create a new HTTP request.
    ///
    /// # Arguments
    ///
    /// * `method` - The HTTP method
    /// * `target` - The request target, possibly carrying a query string
    /// * `version` - The HTTP version
    /// * `headers` - The HTTP headers
    ///
    /// # Returns
    ///
    /// A new HTTP request with no body
    pub fn new(method: Method, target: impl Into<String>, version: HttpVersion, headers: Headers) -> Self {
        let mut target = target.into();
        if !target.starts_with('/') {
            target.insert(0, '/');
        }

        let (path, query_params) = match target.split_once('?') {
            Some((path, query)) => (path.to_string(), parse_query(query)),
            None => (target.clone(), HashMap::new()),
        };

        Self {
            method,
            path,
            target,
            version,
            headers,
            body: None,
            query_params,
        }
    }

    /// Attach a body to the request.
    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Get a header value (case-insensitive).
    pub fn get_header(&self, name: &str) -> Option<&str> {
        self.headers.get(name)
    }

    /// Check if a header exists.
    pub fn has_header(&self, name: &str) -> bool {
        self.headers.contains(name)
    }

    /// Parse the request body as JSON.
    ///
    /// # Returns
    ///
    /// The parsed JSON value, or an error if the body is not valid JSON
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, Error> {
        if !self.is_json() {
            return Err(Error::MissingHeader("Content-Type: application/json".to_string()));
        }

        let json = serde_json::from_str(self.body.as_deref().unwrap_or_default())?;
        Ok(json)
    }

    /// Check if the Content-Type header announces JSON.
    pub fn is_json(&self) -> bool {
        self.get_header("content-type")
            .is_some_and(|ct| ct.starts_with("application/json"))
    }

    /// Get a query parameter value.
    pub fn get_query_param(&self, name: &str) -> Option<&str> {
        self.query_params.get(name).map(String::as_str)
    }

    /// Check if a query parameter exists.
    pub fn has_query_param(&self, name: &str) -> bool {
        self.query_params.contains_key(name)
    }

    /// Cookies sent in the `Cookie` header.
    pub fn cookies(&self) -> HashMap<String, String> {
        cookies(&self.headers)
    }

    /// Fields of an `application/x-www-form-urlencoded` body.
    pub fn form_params(&self) -> HashMap<String, String> {
        self.body.as_deref().map(parse_form).unwrap_or_default()
    }
}

/// Parse a query string into a map.
///
/// Pairs are split on `&`, then on the first `=`; a pair without `=` maps to
/// the empty string. Later duplicates win. Values are left percent-encoded.
pub fn parse_query(query: &str) -> HashMap<String, String> {
    query
        .split('&')
        .filter(|s| !s.is_empty())
        .map(|pair| match pair.split_once('=') {
            Some((k, v)) => (k.to_string(), v.to_string()),
            None => (pair.to_string(), String::new()),
        })
        .collect()
}

/// Parse an urlencoded form body, decoding `+` and `%XX` escapes.
pub fn parse_form(body: &str) -> HashMap<String, String> {
    form_urlencoded::parse(body.as_bytes()).into_owned().collect()
}

/// Cookie pairs from a header map's `cookie` entry.
pub fn cookies(headers: &Headers) -> HashMap<String, String> {
    headers
        .get("cookie")
        .map(|raw| {
            raw.split(';')
                .filter_map(|pair| pair.trim().split_once('='))
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect()
        })
        .unwrap_or_default()
}

/// Parse an HTTP request from its header block and body bytes.
///
/// # Arguments
///
/// * `head` - Everything before the blank line separating header and body
/// * `body` - The body bytes, already trimmed to `Content-Length`
///
/// # Returns
///
/// The parsed HTTP request, or an error if the request line is unusable
pub fn parse_request(head: &[u8], body: &[u8]) -> Result<HttpRequest, Error> {
    // Undecodable bytes are replaced rather than rejected
    let head = String::from_utf8_lossy(head);

    // Leading blank lines before the request line are tolerated
    let mut lines = head.lines().skip_while(|line| line.trim().is_empty());

    let request_line = lines.next().ok_or(Error::EmptyRequest)?;

    let parts: Vec<&str> = request_line.split_whitespace().collect();
    let &[method, target, version] = &parts[..] else {
        return Err(Error::MalformedRequestLine(request_line.to_string()));
    };

    // Any three tokens make a request line; unknown methods still reach the router
    let method = Method::from(method);
    let version = HttpVersion::from(version);

    // Header lines split on the first ": "; anything else is ignored
    let mut headers = Headers::new();
    for line in lines {
        if line.is_empty() {
            break;
        }
        if let Some((name, value)) = line.split_once(": ") {
            headers.insert(name, value);
        }
    }

    let mut request = HttpRequest::new(method, target, version, headers);
    let target = request.target.clone();
    request.headers.insert(PATH_HEADER, target);

    if !body.is_empty() {
        request.body = Some(String::from_utf8_lossy(body).into_owned());
    }

    Ok(request)
}
