//! Loopback backend forwarding (plaintext HTTP/1.1).
//!
//! # Responsibilities
//! - Open a fresh TCP connection to the backend per request
//! - Replay the client's headers verbatim minus the hop-by-hop set, forcing
//!   Host, Connection: close, and a recomputed Content-Length
//! - Merge the interleaved-thinking beta flag into `anthropic-beta`
//! - Retry exactly once with an `/api` prefix when an un-prefixed path 404s
//! - Stream the response back chunk by chunk
//!
//! The 404 retry is applied even to POST requests; the backend exposes no
//! idempotency keys, so a retried POST that was partially processed before
//! the 404 could in principle run twice. Known risk, kept as observed.

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::net::TcpStream;

use crate::config::BackendConfig;
use crate::error::ProxyError;
use crate::forward::RESPONSE_CHUNK_SIZE;
use crate::http::FramedRequest;
use crate::rewrite::INTERLEAVED_THINKING_BETA;

/// Headers never replayed to the backend; Host and Content-Length are forced,
/// anthropic-beta is re-added after the merge decision.
const EXCLUDED_HEADERS: &[&str] = &["content-length", "host", "transfer-encoding"];

/// Forward a request to the loopback backend and stream the response back.
///
/// `path` and `body` may differ from the parsed request (router rewrite,
/// thinking rewrite); `enable_beta` asks for the interleaved-thinking flag on
/// the outgoing `anthropic-beta` header. With `allow_retry`, a 404 on an
/// un-prefixed path is reissued once with `/api` prepended.
pub async fn forward_to_backend<C>(
    client: &mut C,
    req: &FramedRequest,
    path: &str,
    body: &[u8],
    enable_beta: bool,
    allow_retry: bool,
    backend: &BackendConfig,
) -> Result<(), ProxyError>
where
    C: AsyncWrite + Unpin,
{
    let mut path = path.to_string();
    let mut allow_retry = allow_retry;

    loop {
        let mut upstream = TcpStream::connect((backend.host.as_str(), backend.port))
            .await
            .map_err(ProxyError::UpstreamConnect)?;

        let head = build_request_head(req, &path, body.len(), enable_beta, backend);
        upstream.write_all(head.as_bytes()).await?;
        upstream.write_all(body).await?;

        // Inspect the first chunk before committing: it decides the retry.
        let mut chunk = vec![0u8; RESPONSE_CHUNK_SIZE];
        let n = upstream.read(&mut chunk).await?;
        if n == 0 {
            let _ = client.shutdown().await;
            return Ok(());
        }

        if allow_retry && is_not_found(&chunk[..n]) {
            if !path.starts_with("/api/") && !path.starts_with("/v1/") {
                tracing::debug!(%path, "Backend returned 404, retrying with /api prefix");
                // Discard this upstream connection; one retry only.
                path = format!("/api{}", path);
                allow_retry = false;
                continue;
            }
        }

        let preview_len = n.min(200);
        tracing::debug!(
            %path,
            preview = %String::from_utf8_lossy(&chunk[..preview_len]),
            "Backend response first chunk"
        );

        client.write_all(&chunk[..n]).await?;
        stream_response(&mut upstream, client, &mut chunk).await?;
        return Ok(());
    }
}

/// Stream remaining response bytes from upstream to the client.
///
/// Reads and writes alternate strictly: the next upstream read is issued only
/// after the previous client write completed, so a slow client throttles a
/// fast upstream. Ends when the upstream signals EOF.
async fn stream_response<U, C>(
    upstream: &mut U,
    client: &mut C,
    chunk: &mut [u8],
) -> Result<(), ProxyError>
where
    U: AsyncRead + Unpin,
    C: AsyncWrite + Unpin,
{
    loop {
        let n = upstream.read(chunk).await?;
        if n == 0 {
            let _ = client.shutdown().await;
            return Ok(());
        }
        client.write_all(&chunk[..n]).await?;
    }
}

/// Assemble the outgoing request head for the backend.
fn build_request_head(
    req: &FramedRequest,
    path: &str,
    body_len: usize,
    enable_beta: bool,
    backend: &BackendConfig,
) -> String {
    let mut head = format!("{} {} {}\r\n", req.method, path, req.version);
    let mut existing_beta: Option<&str> = None;

    for (name, value) in &req.headers {
        let lowered = name.to_ascii_lowercase();
        if EXCLUDED_HEADERS.contains(&lowered.as_str()) {
            continue;
        }
        // Captured for merging, re-added below.
        if lowered == "anthropic-beta" {
            existing_beta = Some(value);
            continue;
        }
        head.push_str(name);
        head.push_str(": ");
        head.push_str(value);
        head.push_str("\r\n");
    }

    if enable_beta {
        let beta_value = match existing_beta {
            Some(existing) if existing.contains(INTERLEAVED_THINKING_BETA) => existing.to_string(),
            Some(existing) => format!("{},{}", existing, INTERLEAVED_THINKING_BETA),
            None => INTERLEAVED_THINKING_BETA.to_string(),
        };
        head.push_str(&format!("anthropic-beta: {}\r\n", beta_value));
        tracing::debug!("Added interleaved thinking beta header");
    } else if let Some(existing) = existing_beta {
        head.push_str(&format!("anthropic-beta: {}\r\n", existing));
    }

    head.push_str(&format!("Host: {}\r\n", backend.authority()));
    // No keep-alive/pipelining support, every exchange closes the connection.
    head.push_str("Connection: close\r\n");
    head.push_str(&format!("Content-Length: {}\r\n\r\n", body_len));
    head
}

/// Whether a first response chunk looks like a 404, either from the status
/// line or the Go-style "404 page not found" body marker.
fn is_not_found(chunk: &[u8]) -> bool {
    let text = String::from_utf8_lossy(chunk);
    text.contains("HTTP/1.1 404") || text.contains("HTTP/1.0 404") || text.contains("404 page not found")
}
