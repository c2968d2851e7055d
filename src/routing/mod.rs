//! Request path classification and rewriting.
//!
//! # Responsibilities
//! - Rewrite Amp CLI paths (`/auth/cli-login`, `/provider/*`) under `/api`
//! - Split traffic between the remote management host and the local backend
//! - Decide 404-retry eligibility for backend paths
//!
//! # Design Decisions
//! - Management routes (`/api/auth`, `/api/user`, `/api/meta`, `/api/threads`,
//!   `/api/telemetry`, `/api/internal`, ...) belong to the remote host; the
//!   `/api` prefix is stripped back off before dispatch there
//! - `/api/provider/*` still reaches the local backend (pass-through)
//! - Un-prefixed backend paths get one automatic `/api` retry because the
//!   backend mounts some endpoints only under that prefix

/// Where a request goes and under which path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteDecision {
    /// Management route serviced by the remote HTTPS host.
    AmpManagement {
        /// Path to send to the remote host, `/api` prefix stripped back off.
        target_path: String,
    },
    /// `/api/provider/*` route serviced by the local backend, never retried.
    ProviderPassthrough { path: String },
    /// Any other route serviced by the local backend.
    BackendGeneric {
        path: String,
        /// Whether a backend 404 triggers the single `/api`-prefixed retry.
        allow_retry: bool,
    },
}

/// Classify a request path, rewriting it as needed.
pub fn classify(path: &str) -> RouteDecision {
    let rewritten = if path.starts_with("/auth/cli-login") || path.starts_with("/provider/") {
        let rewritten = format!("/api{}", path);
        tracing::debug!(original = %path, rewritten = %rewritten, "Rewriting Amp CLI path");
        rewritten
    } else {
        path.to_string()
    };

    if rewritten.starts_with("/api/") && !rewritten.starts_with("/api/provider/") {
        // Management call: strip the /api segment back off for the remote host.
        let target_path = rewritten["/api".len()..].to_string();
        return RouteDecision::AmpManagement { target_path };
    }

    if rewritten.starts_with("/api/provider/") {
        return RouteDecision::ProviderPassthrough { path: rewritten };
    }

    let allow_retry = !rewritten.starts_with("/api/") && !rewritten.starts_with("/v1/");
    RouteDecision::BackendGeneric {
        path: rewritten,
        allow_retry,
    }
}
