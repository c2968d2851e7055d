//! Synthetic error responses.
//!
//! Minimal self-contained `text/plain` responses for the failure paths that
//! still owe the client an answer: 400 (parse failure), 500 (internal
//! misconfiguration), 502 (upstream connect failure).

use tokio::io::{AsyncWrite, AsyncWriteExt};

/// Build the raw bytes of a minimal error response.
pub fn error_response(status_code: u16, message: &str) -> Vec<u8> {
    let body = message.as_bytes();
    let head = format!(
        "HTTP/1.1 {} {}\r\nContent-Type: text/plain\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
        status_code,
        message,
        body.len()
    );

    let mut response = head.into_bytes();
    response.extend_from_slice(body);
    response
}

/// Write a minimal error response and shut the write side down.
///
/// Errors while writing are swallowed: the connection is being torn down
/// either way and the listener must not be affected.
pub async fn send_error<W>(stream: &mut W, status_code: u16, message: &str)
where
    W: AsyncWrite + Unpin,
{
    let response = error_response(status_code, message);
    if let Err(e) = stream.write_all(&response).await {
        tracing::debug!(error = %e, status_code, "Failed to write error response");
        return;
    }
    let _ = stream.shutdown().await;
}
