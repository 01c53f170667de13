//! Reads one request's header block and body off a connection.

use std::time::Duration;

use log::debug;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::time::{timeout, timeout_at, Instant};

use crate::server::config::ServerConfig;
use crate::server::error::Error;

const SEPARATOR: &[u8] = b"\r\n\r\n";

/// The bytes of a single request, split at the header/body boundary.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawRequest {
    /// Everything before the blank line, or all bytes read if none arrived
    pub head: Vec<u8>,
    /// At most `Content-Length` bytes; shorter if the peer stopped early
    pub body: Vec<u8>,
}

/// Read a request from the stream.
///
/// Header bytes are gathered until the blank line shows up, the peer closes,
/// or `header_timeout` passes; in the latter two cases whatever arrived is
/// handed on as the header. The body is then completed up to `Content-Length`,
/// tolerating an early close or an elapsed `body_timeout` with a short body.
///
/// Returns `Ok(None)` when the peer closed without sending anything.
pub async fn read_request<S>(stream: &mut S, config: &ServerConfig) -> Result<Option<RawRequest>, Error>
where
    S: AsyncRead + Unpin,
{
    let mut buf = Vec::with_capacity(config.read_buffer_size);
    let mut chunk = vec![0u8; config.read_buffer_size.max(1)];
    let deadline = Instant::now() + config.header_timeout;

    let head_end = loop {
        if let Some(pos) = find_separator(&buf) {
            break Some(pos);
        }
        if buf.len() > config.max_header_size {
            return Err(Error::HeaderTooLarge(config.max_header_size));
        }

        match timeout_at(deadline, stream.read(&mut chunk)).await {
            Ok(Ok(0)) => break None,
            Ok(Ok(n)) => buf.extend_from_slice(&chunk[..n]),
            Ok(Err(e)) => return Err(e.into()),
            Err(_) => {
                debug!("Header wait elapsed with {} bytes buffered", buf.len());
                break None;
            }
        }
    };

    let Some(head_end) = head_end else {
        if buf.is_empty() {
            return Ok(None);
        }
        return Ok(Some(RawRequest { head: buf, body: Vec::new() }));
    };

    if head_end > config.max_header_size {
        return Err(Error::HeaderTooLarge(config.max_header_size));
    }

    let mut body = buf.split_off(head_end + SEPARATOR.len());
    buf.truncate(head_end);
    let head = buf;

    let content_length = content_length(&head);
    if content_length > config.max_body_size {
        return Err(Error::PayloadTooLarge(content_length, config.max_body_size));
    }

    // Bytes past Content-Length would belong to a pipelined request, which is not served
    body.truncate(content_length);

    while body.len() < content_length {
        let want = (content_length - body.len()).min(chunk.len());
        match read_with_timeout(stream, &mut chunk[..want], config.body_timeout).await {
            Some(Ok(0)) => {
                debug!("Peer closed with {} of {content_length} body bytes", body.len());
                break;
            }
            Some(Ok(n)) => body.extend_from_slice(&chunk[..n]),
            Some(Err(e)) => return Err(e.into()),
            None => {
                debug!("Body wait elapsed with {} of {content_length} bytes", body.len());
                break;
            }
        }
    }

    Ok(Some(RawRequest { head, body }))
}

/// `None` when the wait elapsed.
async fn read_with_timeout<S>(
    stream: &mut S,
    buf: &mut [u8],
    wait: Option<Duration>,
) -> Option<std::io::Result<usize>>
where
    S: AsyncRead + Unpin,
{
    match wait {
        Some(wait) => timeout(wait, stream.read(buf)).await.ok(),
        None => Some(stream.read(buf).await),
    }
}

/// Position of the first `\r\n\r\n`.
pub fn find_separator(buf: &[u8]) -> Option<usize> {
    buf.windows(SEPARATOR.len()).position(|w| w == SEPARATOR)
}

/// The `Content-Length` announced in a header block; 0 if absent or unparsable.
pub fn content_length(head: &[u8]) -> usize {
    String::from_utf8_lossy(head)
        .lines()
        .skip(1)
        .filter_map(|line| line.split_once(':'))
        .filter(|(name, _)| name.trim().eq_ignore_ascii_case("content-length"))
        .filter_map(|(_, value)| value.trim().parse().ok())
        .last()
        .unwrap_or(0)
}
