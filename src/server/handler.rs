//! Request handler contract.

use std::sync::Arc;

use crate::parser::Headers;
use crate::server::error::Error;
use crate::server::result::HandlerResult;

/// Type alias for a handler function.
///
/// A handler sees the request headers (including the synthetic `path` entry)
/// and the body text, and runs synchronously on the blocking pool. Any state
/// it needs is captured by the closure; the server keeps none of its own.
pub type HandlerFn = Arc<dyn Fn(&Headers, Option<&str>) -> Result<HandlerResult, Error> + Send + Sync>;
