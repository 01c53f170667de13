//! MIME type inference from file extensions.

/// Served when a file's extension is unknown.
pub const DEFAULT_MIME_TYPE: &str = "application/octet-stream";

/// Guess the MIME type of a path from its extension, ignoring case.
///
/// A query string, if present, is not part of the extension.
pub fn guess(path: &str) -> Option<&'static str> {
    let path = path.split_once('?').map_or(path, |(p, _)| p);
    mime_guess::from_path(path).first_raw()
}

/// Like [`guess`], falling back to [`DEFAULT_MIME_TYPE`].
pub fn guess_or_default(path: &str) -> &'static str {
    guess(path).unwrap_or(DEFAULT_MIME_TYPE)
}
