//! Connection supervision: accept loop and per-connection pipeline.
//!
//! # Data Flow
//! ```text
//! accept → frame request → parse → classify path
//!     AmpManagement   → remote forwarder (TLS, Location rewrite)
//!     ProviderPassthrough / BackendGeneric
//!                     → thinking rewrite (POST bodies) → backend forwarder
//! ```
//!
//! # Design Decisions
//! - One detached task per connection; a failure is scoped to that task
//! - stop() signals the accept loop and joins it, releasing the port; it
//!   never aborts in-flight connection tasks

use std::borrow::Cow;
use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::TcpStream;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio_rustls::TlsConnector;

use crate::config::ProxyConfig;
use crate::error::ProxyError;
use crate::forward::{backend, remote, tls};
use crate::http::{framing, respond, FramedRequest};
use crate::lifecycle::Shutdown;
use crate::net::connection::ConnectionId;
use crate::net::listener::{Listener, ListenerError};
use crate::rewrite::thinking::rewrite_thinking_body;
use crate::routing::{classify, RouteDecision};

/// Handle to the running accept loop.
struct RunningState {
    task: JoinHandle<()>,
    addr: SocketAddr,
}

/// The intercepting proxy: listener, accept loop, and request pipeline.
pub struct ThinkingProxy {
    config: Arc<ProxyConfig>,
    connector: TlsConnector,
    shutdown: Shutdown,
    state: Mutex<Option<RunningState>>,
}

impl ThinkingProxy {
    /// Create a proxy from validated configuration.
    pub fn new(config: ProxyConfig) -> Self {
        Self {
            config: Arc::new(config),
            connector: tls::build_connector(),
            shutdown: Shutdown::new(),
            state: Mutex::new(None),
        }
    }

    /// Bind the listener and start accepting connections.
    ///
    /// Returns the bound local address (useful with a port-0 bind). Calling
    /// `start` while already running is a no-op returning the current address.
    pub async fn start(&self) -> Result<SocketAddr, ListenerError> {
        let mut state = self.state.lock().await;
        if let Some(running) = state.as_ref() {
            tracing::warn!(address = %running.addr, "Proxy already running");
            return Ok(running.addr);
        }

        let listener = Listener::bind(&self.config.listener).await?;
        let addr = listener.local_addr().map_err(ListenerError::Bind)?;

        let config = Arc::clone(&self.config);
        let connector = self.connector.clone();
        let mut shutdown_rx = self.shutdown.subscribe();

        let task = tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = shutdown_rx.recv() => {
                        tracing::info!("Proxy stopped, listener released");
                        break;
                    }
                    accepted = listener.accept() => {
                        match accepted {
                            Ok((stream, peer_addr, permit)) => {
                                let config = Arc::clone(&config);
                                let connector = connector.clone();
                                tokio::spawn(async move {
                                    let id = ConnectionId::new();
                                    tracing::debug!(connection_id = %id, peer_addr = %peer_addr, "Handling connection");
                                    handle_connection(stream, config, connector, id).await;
                                    drop(permit);
                                });
                            }
                            Err(e) => {
                                tracing::warn!(error = %e, "Accept failed");
                            }
                        }
                    }
                }
            }
        });

        tracing::info!(address = %addr, "Thinking proxy listening");
        *state = Some(RunningState { task, addr });
        Ok(addr)
    }

    /// Stop accepting connections and release the port.
    ///
    /// In-flight connections finish on their own. Never hangs the caller: the
    /// accept loop exits at the next scheduling point.
    pub async fn stop(&self) {
        let running = self.state.lock().await.take();
        let Some(running) = running else {
            return;
        };
        self.shutdown.trigger();
        let _ = running.task.await;
    }

    /// Whether the accept loop is currently running.
    pub async fn is_running(&self) -> bool {
        self.state.lock().await.is_some()
    }

    /// The configuration this proxy was built with.
    pub fn config(&self) -> &ProxyConfig {
        &self.config
    }
}

/// Run one request/response exchange on an accepted connection.
///
/// Every failure is scoped here; the listener never sees it.
async fn handle_connection(
    mut stream: TcpStream,
    config: Arc<ProxyConfig>,
    connector: TlsConnector,
    id: ConnectionId,
) {
    let raw = match framing::read_request(&mut stream).await {
        Ok(raw) => raw,
        Err(e) => {
            tracing::debug!(connection_id = %id, error = %e, "Receive error");
            return;
        }
    };

    let request = match FramedRequest::parse(&raw) {
        Ok(request) => request,
        Err(e) => {
            tracing::warn!(connection_id = %id, error = %e, "Malformed request");
            respond::send_error(&mut stream, 400, "Invalid request format").await;
            return;
        }
    };

    tracing::debug!(
        connection_id = %id,
        method = %request.method,
        path = %request.path,
        body_len = request.body.len(),
        "Request framed"
    );

    let result = match classify(&request.path) {
        RouteDecision::AmpManagement { target_path } => {
            tracing::info!(
                connection_id = %id,
                path = %target_path,
                "Amp management request, forwarding to remote host"
            );
            remote::forward_to_remote(
                &mut stream,
                &request,
                &target_path,
                &config.remote,
                &connector,
            )
            .await
        }
        RouteDecision::ProviderPassthrough { path } => {
            dispatch_backend(&mut stream, &request, &path, false, &config).await
        }
        RouteDecision::BackendGeneric { path, allow_retry } => {
            dispatch_backend(&mut stream, &request, &path, allow_retry, &config).await
        }
    };

    match result {
        Ok(()) => {
            tracing::trace!(connection_id = %id, "Exchange complete");
        }
        Err(ProxyError::UpstreamConnect(e)) => {
            tracing::warn!(connection_id = %id, error = %e, "Upstream connect failed");
            respond::send_error(&mut stream, 502, "Bad Gateway").await;
        }
        Err(ProxyError::Tls(msg)) => {
            tracing::error!(connection_id = %id, error = %msg, "TLS failure");
            respond::send_error(&mut stream, 502, "Bad Gateway").await;
        }
        Err(ProxyError::UpstreamIo(e)) => {
            // Mid-stream failure: both legs are already torn down, and any
            // partial data the client received stands.
            tracing::debug!(connection_id = %id, error = %e, "Upstream i/o failure");
        }
        Err(e @ ProxyError::MalformedRequest(_)) => {
            tracing::warn!(connection_id = %id, error = %e, "Request rejected");
            respond::send_error(&mut stream, 400, "Invalid request format").await;
        }
    }
}

/// Apply the thinking rewrite when eligible and forward to the backend.
async fn dispatch_backend(
    stream: &mut TcpStream,
    request: &FramedRequest,
    path: &str,
    allow_retry: bool,
    config: &ProxyConfig,
) -> Result<(), ProxyError> {
    let (body, enable_beta) = if request.method == "POST" && !request.body.is_empty() {
        match rewrite_thinking_body(&request.body) {
            Some(rewrite) => (Cow::Owned(rewrite.body), rewrite.enable_beta),
            None => (Cow::Borrowed(request.body.as_slice()), false),
        }
    } else {
        (Cow::Borrowed(request.body.as_slice()), false)
    };

    backend::forward_to_backend(
        stream,
        request,
        path,
        &body,
        enable_beta,
        allow_retry,
        &config.backend,
    )
    .await
}
