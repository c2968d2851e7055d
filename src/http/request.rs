//! HTTP request parsing.
//!
//! # Responsibilities
//! - Split framed bytes into request line, headers, and body
//! - Preserve header casing, order, and duplicates for faithful forwarding
//! - Provide case-insensitive header lookup
//!
//! # Design Decisions
//! - Headers live in an ordered Vec, not a map: the forwarders must replay
//!   them exactly as the client sent them
//! - The body stays raw bytes; only the head must be valid UTF-8

use crate::error::ProxyError;
use crate::http::framing::find_terminator;

/// A parsed HTTP/1.1 request.
#[derive(Debug, Clone)]
pub struct FramedRequest {
    pub method: String,
    pub path: String,
    pub version: String,
    /// Ordered (name, value) pairs, original casing and duplicates preserved.
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl FramedRequest {
    /// Parse a framed request from raw accumulated bytes.
    ///
    /// Fails when no header terminator exists, the head is not UTF-8, or the
    /// request line has fewer than three tokens. All of these surface to the
    /// client as HTTP 400.
    pub fn parse(raw: &[u8]) -> Result<Self, ProxyError> {
        let body_start = find_terminator(raw)
            .ok_or(ProxyError::MalformedRequest("no header terminator"))?;

        let head = std::str::from_utf8(&raw[..body_start - 4])
            .map_err(|_| ProxyError::MalformedRequest("request head is not valid UTF-8"))?;

        let mut lines = head.split("\r\n");
        let request_line = lines
            .next()
            .ok_or(ProxyError::MalformedRequest("empty request"))?;

        let mut parts = request_line.split_whitespace();
        let (method, path, version) = match (parts.next(), parts.next(), parts.next()) {
            (Some(m), Some(p), Some(v)) => (m.to_string(), p.to_string(), v.to_string()),
            _ => return Err(ProxyError::MalformedRequest("invalid request line")),
        };

        let mut headers = Vec::new();
        for line in lines {
            if line.is_empty() {
                break;
            }
            // Header lines without a colon are skipped, not fatal.
            if let Some((name, value)) = line.split_once(':') {
                headers.push((name.trim().to_string(), value.trim().to_string()));
            }
        }

        Ok(Self {
            method,
            path,
            version,
            headers,
            body: raw[body_start..].to_vec(),
        })
    }

    /// Case-insensitive lookup of the first header with the given name.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}
