//! Request framing: accumulate raw bytes until one complete request is read.
//!
//! # Responsibilities
//! - Read from the client socket in chunks (≤ 1 MiB per read)
//! - Detect the header terminator (`\r\n\r\n`)
//! - Honor Content-Length to wait for the full body
//! - On EOF without a terminator, hand back whatever accumulated so the
//!   parser can produce a proper 400 instead of hanging the client
//!
//! The loop is a plain `loop`, never recursion, so arbitrarily large bodies
//! cannot grow the call stack.

use tokio::io::AsyncRead;
use tokio::io::AsyncReadExt;

/// Maximum bytes pulled from the socket per read.
const READ_CHUNK_SIZE: usize = 1_048_576;

/// Header section terminator.
const HEADER_TERMINATOR: &[u8] = b"\r\n\r\n";

/// Read one complete HTTP/1.1 request from the stream.
///
/// Returns the raw accumulated bytes. "Complete" means the header terminator
/// was seen and, when a Content-Length header is present, at least that many
/// body bytes followed it. EOF terminates accumulation early; the caller is
/// expected to attempt parsing whatever was received.
pub async fn read_request<S>(stream: &mut S) -> std::io::Result<Vec<u8>>
where
    S: AsyncRead + Unpin,
{
    let mut accumulated: Vec<u8> = Vec::new();
    let mut chunk = vec![0u8; READ_CHUNK_SIZE];

    loop {
        let n = stream.read(&mut chunk).await?;
        if n == 0 {
            // EOF: process what we have, even if the terminator never arrived.
            return Ok(accumulated);
        }
        accumulated.extend_from_slice(&chunk[..n]);

        if let Some(header_end) = find_terminator(&accumulated) {
            let body_received = accumulated.len() - header_end;
            match declared_content_length(&accumulated[..header_end]) {
                Some(content_length) if body_received < content_length => {
                    // Body still incomplete, keep reading.
                    continue;
                }
                _ => return Ok(accumulated),
            }
        }
    }
}

/// Find the end of the header section; returns the index of the first body byte.
pub fn find_terminator(data: &[u8]) -> Option<usize> {
    data.windows(HEADER_TERMINATOR.len())
        .position(|w| w == HEADER_TERMINATOR)
        .map(|pos| pos + HEADER_TERMINATOR.len())
}

/// Extract the Content-Length value from the raw header section, if any.
///
/// Lookup is case-insensitive; an unparseable value is treated as absent.
fn declared_content_length(head: &[u8]) -> Option<usize> {
    let head = String::from_utf8_lossy(head);
    head.split("\r\n")
        .find(|line| line.to_ascii_lowercase().starts_with("content-length:"))
        .and_then(|line| line.split_once(':'))
        .and_then(|(_, value)| value.trim().parse::<usize>().ok())
}
