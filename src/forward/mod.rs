//! Upstream forwarding subsystem.
//!
//! # Data Flow
//! ```text
//! Parsed request + route decision
//!     → backend.rs (loopback plaintext, 404 retry, beta header merge)
//!     → remote.rs  (TLS to the management host, Location rewriting)
//!     → tls.rs     (shared rustls connector, native roots)
//! ```
//!
//! # Design Decisions
//! - One fresh upstream connection per request/attempt, Connection: close
//! - Responses are streamed chunk by chunk; the next upstream read is only
//!   scheduled after the previous client write completed (backpressure)
//! - Any I/O error on either leg drops both sockets

pub mod backend;
pub mod remote;
pub mod tls;

/// Upstream response chunk size.
pub(crate) const RESPONSE_CHUNK_SIZE: usize = 65_536;
