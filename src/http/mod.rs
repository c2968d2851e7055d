//! HTTP/1.1 protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → framing.rs (accumulate bytes until one complete request is framed)
//!     → request.rs (request line, ordered headers, body)
//!     → [routing layer decides upstream]
//!     → respond.rs (synthetic error responses when the pipeline fails)
//! ```
//!
//! # Design Decisions
//! - Deliberate string-level parsing instead of a full HTTP library: the
//!   forwarders must reproduce header case, order, and duplicates exactly,
//!   which generic header maps do not guarantee
//! - Framing is driven solely by the header terminator and Content-Length;
//!   chunked transfer encoding is not supported on the inbound leg

pub mod framing;
pub mod request;
pub mod respond;

pub use request::FramedRequest;
