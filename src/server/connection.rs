//! Per-connection pipeline: read, parse, route, invoke, respond, close.

use std::any::Any;

use log::{debug, error, warn};
use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt};

use crate::parser::{parse_request, HttpRequest, Method};
use crate::server::config::ServerConfig;
use crate::server::error::Error;
use crate::server::handler::HandlerFn;
use crate::server::reader::read_request;
use crate::server::response::{HttpResponse, StatusCode};
use crate::server::result::{build_response, HandlerResult};
use crate::server::router::{Resolution, Router};
use crate::server::static_files::StaticFiles;

/// Handle a single connection.
///
/// Exactly one request is served. Whatever happens, the client gets a
/// complete response (unless it vanished first) and the write side is shut
/// down before returning. Routing and handler failures are returned after
/// their error response has been written, for the caller to log.
pub async fn handle_connection<S>(socket: &mut S, router: &Router, config: &ServerConfig) -> Result<(), Error>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let outcome = serve_request(socket, router, config).await;
    if let Err(e) = socket.shutdown().await {
        debug!("Error closing connection: {e}");
    }
    outcome
}

async fn serve_request<S>(socket: &mut S, router: &Router, config: &ServerConfig) -> Result<(), Error>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let raw = match read_request(socket, config).await {
        Ok(Some(raw)) => raw,
        // Peer closed without a request; nobody to answer
        Ok(None) => return Ok(()),
        Err(e @ Error::IoError(_)) => return Err(e),
        Err(e) => return reject(socket, e).await,
    };

    let request = match parse_request(&raw.head, &raw.body) {
        Ok(request) => request,
        Err(e) => return reject(socket, Error::ParseError(e)).await,
    };
    debug!("{} {}", request.method, request.target);

    let handler = match router.resolve(&request.method, &request.path) {
        Resolution::Found(handler) => handler,
        Resolution::WrongMethod(allowed) => {
            let allow = allowed.iter().map(Method::as_str).collect::<Vec<_>>().join(", ");
            let err = Error::MethodNotAllowed(request.method, request.path);
            warn!("{err}");
            let response = HttpResponse::from(&err).with_header("Allow", allow);
            socket.write_all(&response.to_bytes()).await?;
            return Err(err);
        }
        Resolution::NotFound => return serve_fallback(socket, &request, config).await,
    };

    let response = match invoke(handler, request).await {
        Ok(result) => build_response(result, &config.document_root).await,
        Err(e) => {
            error!("Handler failed: {e}");
            let response = HttpResponse::text(StatusCode::InternalServerError, e.to_string());
            socket.write_all(&response.to_bytes()).await?;
            return Err(e);
        }
    };

    socket.write_all(&response.to_bytes()).await?;
    Ok(())
}

/// Unrouted GET and HEAD requests fall through to the static files.
async fn serve_fallback<S>(socket: &mut S, request: &HttpRequest, config: &ServerConfig) -> Result<(), Error>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    if !matches!(request.method, Method::GET | Method::HEAD) {
        return reject(socket, Error::NotFound(request.path.clone())).await;
    }

    match StaticFiles::new(config).serve(&request.path).await {
        Ok(response) => {
            let bytes = if request.method == Method::HEAD {
                response.head_bytes()
            } else {
                response.to_bytes()
            };
            socket.write_all(&bytes).await?;
            Ok(())
        }
        Err(e) => reject(socket, e).await,
    }
}

/// Write the error response for `err` and hand the error back.
async fn reject<S>(socket: &mut S, err: Error) -> Result<(), Error>
where
    S: AsyncWrite + Unpin,
{
    if err.is_server_error() {
        error!("{err}");
    } else {
        warn!("{err}");
    }
    socket.write_all(&HttpResponse::from(&err).to_bytes()).await?;
    Err(err)
}

/// Run a handler on the blocking pool, turning a panic into an error.
async fn invoke(handler: HandlerFn, request: HttpRequest) -> Result<HandlerResult, Error> {
    let HttpRequest { headers, body, .. } = request;
    match tokio::task::spawn_blocking(move || handler(&headers, body.as_deref())).await {
        Ok(result) => result,
        Err(e) if e.is_panic() => Err(Error::InternalError(panic_message(e.into_panic()))),
        Err(e) => Err(Error::InternalError(e.to_string())),
    }
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    match payload.downcast::<String>() {
        Ok(msg) => *msg,
        Err(payload) => payload
            .downcast_ref::<&str>()
            .map(|s| s.to_string())
            .unwrap_or_else(|| "handler panicked".to_string()),
    }
}
