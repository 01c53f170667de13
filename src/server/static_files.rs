//! Static file fallback for requests no route claims.

use std::path::{Component, Path, PathBuf};

use log::debug;

use crate::server::config::ServerConfig;
use crate::server::error::Error;
use crate::server::mime;
use crate::server::response::{HttpResponse, StatusCode};

/// Serves files from disk, picking the base directory by MIME category.
#[derive(Debug, Clone)]
pub struct StaticFiles {
    root: PathBuf,
    pages_dir: PathBuf,
    assets_dir: PathBuf,
    data_dir: PathBuf,
}

impl StaticFiles {
    pub fn new(config: &ServerConfig) -> Self {
        Self {
            root: config.document_root.clone(),
            pages_dir: config.pages_dir.clone(),
            assets_dir: config.assets_dir.clone(),
            data_dir: config.data_dir.clone(),
        }
    }

    /// The directory files of this MIME type are served from.
    ///
    /// HTML lives in the pages directory; stylesheets, scripts, plain text and
    /// images in the assets directory; JSON in the data directory. Any other
    /// type is refused.
    pub fn base_dir(&self, mime: &str) -> Result<PathBuf, Error> {
        let (main, sub) = mime.split_once('/').unwrap_or((mime, ""));
        let dir = match (main, sub) {
            ("text", "html") => &self.pages_dir,
            ("text", "css" | "plain" | "javascript") => &self.assets_dir,
            ("application", "javascript") => &self.assets_dir,
            ("image", _) => &self.assets_dir,
            ("application", "json") => &self.data_dir,
            _ => return Err(Error::UnsupportedMime(mime.to_string())),
        };
        Ok(self.root.join(dir))
    }

    /// Map a request path to a file on disk and its MIME type.
    pub fn resolve(&self, path: &str) -> Result<(PathBuf, &'static str), Error> {
        let path = if path == "/" { "/index.html" } else { path };
        let relative = Path::new(path.trim_start_matches('/'));

        // Only plain components; `..` or absolute segments never leave the base
        if !relative.components().all(|c| matches!(c, Component::Normal(_))) {
            return Err(Error::NotFound(path.to_string()));
        }

        let mime = mime::guess(path)
            .ok_or_else(|| Error::UnsupportedMime(format!("unknown extension in {path}")))?;
        let base = self.base_dir(mime)?;
        Ok((base.join(relative), mime))
    }

    /// Read the file behind a request path into a response.
    ///
    /// Every read failure is reported as not found.
    pub async fn serve(&self, path: &str) -> Result<HttpResponse, Error> {
        let (file, mime) = self.resolve(path)?;
        debug!("Serving static file {}", file.display());

        let content = tokio::fs::read(&file).await.map_err(|e| {
            debug!("Static file {} unavailable: {e}", file.display());
            Error::NotFound(path.to_string())
        })?;

        Ok(HttpResponse::new(StatusCode::Ok)
            .with_content_type(mime)
            .with_body_bytes(content))
    }
}
