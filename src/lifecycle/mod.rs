//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Shutdown (shutdown.rs):
//!     stop() called → broadcast signal → accept loop exits → port released
//!     In-flight connections finish on their own (best-effort drain)
//! ```
//!
//! # Design Decisions
//! - stop() never hangs the caller: it only signals and joins the accept loop
//! - Connection tasks are detached; they are not forcibly aborted

pub mod shutdown;

pub use shutdown::Shutdown;
