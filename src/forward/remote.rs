//! Remote management host forwarding (TLS HTTP/1.1).
//!
//! # Responsibilities
//! - Open a TLS connection to the remote host per request
//! - Replay headers minus the hop-by-hop set, forcing Host,
//!   Connection: close, and a recomputed Content-Length
//! - Rewrite `Location:` response headers that point at `/` so subsequent
//!   client redirects come back through the proxy's `/api` management rule
//!
//! Location rewriting is a best-effort string substitution on chunks that
//! decode as UTF-8; redirect headers sit near the start of small chunks, so
//! chunks that fail to decode are forwarded unmodified.

use std::borrow::Cow;

use tokio::io::{AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio_rustls::rustls::pki_types::ServerName;
use tokio_rustls::TlsConnector;

use crate::config::RemoteConfig;
use crate::error::ProxyError;
use crate::forward::RESPONSE_CHUNK_SIZE;
use crate::http::FramedRequest;

/// Headers never replayed to the remote host.
const EXCLUDED_HEADERS: &[&str] = &["host", "content-length", "connection", "transfer-encoding"];

/// Needle for the Location rewrite, matched case-insensitively.
const LOCATION_NEEDLE: &str = "\r\nlocation: /";
/// Replacement keeping the value's leading slash, now under /api.
const LOCATION_REWRITE: &str = "\r\nlocation: /api/";

/// Forward a management request to the remote host over TLS and stream the
/// response back with Location headers rewritten.
pub async fn forward_to_remote<C>(
    client: &mut C,
    req: &FramedRequest,
    path: &str,
    remote: &RemoteConfig,
    connector: &TlsConnector,
) -> Result<(), ProxyError>
where
    C: AsyncWrite + Unpin,
{
    let tcp = TcpStream::connect((remote.host.as_str(), remote.port))
        .await
        .map_err(ProxyError::UpstreamConnect)?;

    let server_name = ServerName::try_from(remote.host.clone())
        .map_err(|e| ProxyError::Tls(format!("invalid server name {:?}: {e}", remote.host)))?;

    let mut upstream = connector
        .connect(server_name, tcp)
        .await
        .map_err(ProxyError::UpstreamConnect)?;

    let head = build_request_head(req, path, req.body.len(), remote);
    upstream.write_all(head.as_bytes()).await?;
    upstream.write_all(&req.body).await?;

    let mut chunk = vec![0u8; RESPONSE_CHUNK_SIZE];
    loop {
        let n = upstream.read(&mut chunk).await?;
        if n == 0 {
            let _ = client.shutdown().await;
            return Ok(());
        }
        let rewritten = rewrite_location_headers(&chunk[..n]);
        client.write_all(&rewritten).await?;
    }
}

/// Assemble the outgoing request head for the remote host.
fn build_request_head(
    req: &FramedRequest,
    path: &str,
    body_len: usize,
    remote: &RemoteConfig,
) -> String {
    let mut head = format!("{} {} {}\r\n", req.method, path, req.version);

    for (name, value) in &req.headers {
        if EXCLUDED_HEADERS.contains(&name.to_ascii_lowercase().as_str()) {
            continue;
        }
        head.push_str(name);
        head.push_str(": ");
        head.push_str(value);
        head.push_str("\r\n");
    }

    head.push_str(&format!("Host: {}\r\n", remote.host));
    head.push_str("Connection: close\r\n");
    head.push_str(&format!("Content-Length: {}\r\n\r\n", body_len));
    head
}

/// Rewrite `Location:` headers whose value begins with `/` to sit under
/// `/api`, keeping redirects routed through the proxy's management rule.
///
/// Chunks that are not valid UTF-8 pass through untouched.
pub fn rewrite_location_headers(chunk: &[u8]) -> Cow<'_, [u8]> {
    let Ok(text) = std::str::from_utf8(chunk) else {
        return Cow::Borrowed(chunk);
    };

    // ASCII lowercasing keeps byte offsets aligned with the original text.
    let lowered = text.to_ascii_lowercase();
    if !lowered.contains(LOCATION_NEEDLE) {
        return Cow::Borrowed(chunk);
    }

    let mut out = String::with_capacity(text.len() + 32);
    let mut idx = 0;
    while let Some(pos) = lowered[idx..].find(LOCATION_NEEDLE) {
        let start = idx + pos;
        out.push_str(&text[idx..start]);
        out.push_str(LOCATION_REWRITE);
        idx = start + LOCATION_NEEDLE.len();
    }
    out.push_str(&text[idx..]);
    Cow::Owned(out.into_bytes())
}
