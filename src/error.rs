//! Error taxonomy for the proxy.
//!
//! Failures are scoped to the single connection that triggered them; none of
//! these variants bring down the listener. The supervisor decides which
//! variants produce a synthetic response (400/502) and which just tear the
//! connection down.

use thiserror::Error;

/// Error type covering a single request/response exchange.
#[derive(Debug, Error)]
pub enum ProxyError {
    /// The client sent something we could not frame or parse. Answered 400.
    #[error("malformed request: {0}")]
    MalformedRequest(&'static str),

    /// The upstream (backend or remote host) refused the connection. Answered 502.
    #[error("upstream connect failed: {0}")]
    UpstreamConnect(#[source] std::io::Error),

    /// Send/receive failure after the upstream connection was established.
    /// No response is synthesized; already-sent partial data stands.
    #[error("upstream i/o failure: {0}")]
    UpstreamIo(#[from] std::io::Error),

    /// TLS client setup or handshake failure for the remote host.
    #[error("tls failure: {0}")]
    Tls(String),
}
