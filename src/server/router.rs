//! Route table and route resolution.

use std::collections::HashMap;
use std::sync::Arc;

use log::debug;

use crate::parser::{Headers, Method};
use crate::server::error::Error;
use crate::server::handler::HandlerFn;
use crate::server::result::HandlerResult;

/// Outcome of looking up a request in the route table.
#[derive(Clone)]
pub enum Resolution {
    /// A handler claims the request.
    Found(HandlerFn),
    /// The path is routed, but only for these methods.
    WrongMethod(Vec<Method>),
    /// Nothing is routed at this path.
    NotFound,
}

impl std::fmt::Debug for Resolution {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Resolution::Found(_) => f.write_str("Found"),
            Resolution::WrongMethod(allowed) => f.debug_tuple("WrongMethod").field(allowed).finish(),
            Resolution::NotFound => f.write_str("NotFound"),
        }
    }
}

/// Maps `(method, path)` pairs to handlers.
///
/// Filled during startup and read-only once the server runs, so lookups
/// need no locking.
#[derive(Default, Clone)]
pub struct Router {
    routes: HashMap<(Method, String), HandlerFn>,
    any_method: HashMap<String, HandlerFn>,
}

impl Router {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler for one method at a path.
    ///
    /// Registering the same pair twice keeps the later handler.
    pub fn add<F>(&mut self, method: Method, path: &str, handler: F) -> &mut Self
    where
        F: Fn(&Headers, Option<&str>) -> Result<HandlerResult, Error> + Send + Sync + 'static,
    {
        self.routes.insert((method, normalize_path(path)), Arc::new(handler));
        self
    }

    /// Register a handler answering every method at a path.
    ///
    /// Method-specific routes at the same path take precedence.
    pub fn any<F>(&mut self, path: &str, handler: F) -> &mut Self
    where
        F: Fn(&Headers, Option<&str>) -> Result<HandlerResult, Error> + Send + Sync + 'static,
    {
        self.any_method.insert(normalize_path(path), Arc::new(handler));
        self
    }

    pub fn len(&self) -> usize {
        self.routes.len() + self.any_method.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Registered routes sorted by path, `None` standing for any method.
    pub fn endpoints(&self) -> Vec<(Option<&Method>, &str)> {
        let mut endpoints: Vec<_> = self
            .routes
            .keys()
            .map(|(m, p)| (Some(m), p.as_str()))
            .chain(self.any_method.keys().map(|p| (None, p.as_str())))
            .collect();
        endpoints.sort_by(|a, b| a.1.cmp(b.1).then_with(|| a.0.cmp(&b.0)));
        endpoints
    }

    /// Resolve a request to a handler.
    ///
    /// Tried in order, first hit wins:
    /// 1. the exact `(method, path)` route,
    /// 2. an any-method route at the path,
    /// 3. steps 1 and 2 again for the index variants of the path
    ///    (`/` tries `/index.html` and `/index.htm`, and those try `/`).
    ///
    /// With no hit, the request is [`Resolution::WrongMethod`] if the exact
    /// path is routed for other methods and [`Resolution::NotFound`] otherwise.
    pub fn resolve(&self, method: &Method, path: &str) -> Resolution {
        let path = normalize_path(path);

        if let Some(handler) = self.lookup(method, &path) {
            return Resolution::Found(handler);
        }

        for variant in index_variants(&path) {
            if let Some(handler) = self.lookup(method, variant) {
                debug!("{method} {path} matched index variant {variant}");
                return Resolution::Found(handler);
            }
        }

        let allowed = self.allowed_methods(&path);
        if allowed.is_empty() {
            Resolution::NotFound
        } else {
            Resolution::WrongMethod(allowed)
        }
    }

    fn lookup(&self, method: &Method, path: &str) -> Option<HandlerFn> {
        self.routes
            .get(&(method.clone(), path.to_string()))
            .or_else(|| self.any_method.get(path))
            .cloned()
    }

    fn allowed_methods(&self, path: &str) -> Vec<Method> {
        let mut allowed: Vec<Method> = self
            .routes
            .keys()
            .filter(|(_, p)| p == path)
            .map(|(m, _)| m.clone())
            .collect();
        allowed.sort();
        allowed
    }
}

/// Alternate spellings of the site index.
fn index_variants(path: &str) -> &'static [&'static str] {
    match path {
        "/" => &["/index.html", "/index.htm"],
        "/index.html" | "/index.htm" => &["/"],
        _ => &[],
    }
}

/// Normalize a path for use as a route key: query stripped, leading `/` ensured.
pub fn normalize_path(path: &str) -> String {
    let path = path.split_once('?').map_or(path, |(p, _)| p).trim();
    if path.starts_with('/') {
        path.to_string()
    } else {
        format!("/{path}")
    }
}
