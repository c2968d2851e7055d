//! Network layer subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming TCP connection
//!     → listener.rs (accept loop, connection limits)
//!     → connection.rs (per-connection ID for tracing)
//!     → supervisor.rs (frame → parse → route → forward)
//! ```
//!
//! # Design Decisions
//! - Bounded accept queue prevents resource exhaustion
//! - One task per connection, no shared mutable state between them
//! - Every connection handles exactly one request/response exchange

pub mod connection;
pub mod listener;
pub mod supervisor;

pub use supervisor::ThinkingProxy;
