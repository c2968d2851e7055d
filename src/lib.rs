//! Thinking Proxy
//!
//! An HTTP/1.1 intercepting reverse proxy that sits between local coding-agent
//! CLIs and a backend inference-routing server.
//!
//! # Architecture Overview
//!
//! ```text
//!                    ┌────────────────────────────────────────────────────┐
//!                    │                 THINKING PROXY (:8317)             │
//!                    │                                                    │
//!  Client Request    │  ┌─────────┐   ┌─────────┐   ┌─────────┐          │
//!  ──────────────────┼─▶│   net   │──▶│  http   │──▶│ routing │          │
//!                    │  │listener │   │ framing │   │classify │          │
//!                    │  └─────────┘   └─────────┘   └────┬────┘          │
//!                    │                                    │               │
//!                    │              /api/* (management)   │  everything   │
//!                    │              ┌─────────────────────┴──┐ else       │
//!                    │              ▼                        ▼            │
//!                    │      ┌──────────────┐        ┌──────────────┐      │
//!                    │      │   forward    │        │   rewrite    │      │
//!                    │      │   remote     │        │   thinking   │      │
//!                    │      │ (TLS + Loc.  │        └──────┬───────┘      │
//!                    │      │  rewriting)  │               ▼              │
//!                    │      └──────┬───────┘        ┌──────────────┐      │
//!                    │             │                │   forward    │      │
//!                    │             │                │   backend    │      │
//!                    │             │                │ (404 retry)  │      │
//!                    │             │                └──────┬───────┘      │
//!                    └─────────────┼───────────────────────┼──────────────┘
//!                                  ▼                       ▼
//!                          ampcode.com:443          127.0.0.1:8318
//! ```
//!
//! Model names carrying a `-thinking-NUMBER` suffix are rewritten into a
//! structured `thinking` parameter with a token budget before the request
//! reaches the backend; management routes are redirected to the remote host
//! with response `Location` headers rewritten back under `/api`.

// Core subsystems
pub mod config;
pub mod error;
pub mod forward;
pub mod http;
pub mod net;
pub mod rewrite;
pub mod routing;

// Cross-cutting concerns
pub mod lifecycle;

pub use config::ProxyConfig;
pub use error::ProxyError;
pub use lifecycle::Shutdown;
pub use net::ThinkingProxy;
