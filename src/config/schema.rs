//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the proxy.
//! All types derive Serde traits for deserialization from config files, and
//! every field defaults to the fixed local deployment the coding-agent CLIs
//! expect: the proxy on loopback port 8317, the inference-routing backend on
//! loopback port 8318, and management routes served by ampcode.com over TLS.

use serde::{Deserialize, Serialize};

/// Root configuration for the thinking proxy.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ProxyConfig {
    /// Listener configuration (bind address, connection limit).
    pub listener: ListenerConfig,

    /// Loopback backend that serves inference traffic.
    pub backend: BackendConfig,

    /// Remote HTTPS host that serves management routes.
    pub remote: RemoteConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "127.0.0.1:8317").
    pub bind_address: String,

    /// Maximum concurrent connections (backpressure).
    pub max_connections: usize,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "127.0.0.1:8317".to_string(),
            max_connections: 1_024,
        }
    }
}

/// Loopback backend configuration (plaintext HTTP/1.1).
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct BackendConfig {
    /// Backend host. Always loopback in the intended deployment.
    pub host: String,

    /// Backend port.
    pub port: u16,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8318,
        }
    }
}

impl BackendConfig {
    /// "host:port" form used for connecting and the forced Host header.
    pub fn authority(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Remote management host configuration (TLS HTTP/1.1).
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RemoteConfig {
    /// Remote host name, also used for SNI and the forced Host header.
    pub host: String,

    /// Remote TLS port.
    pub port: u16,
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            host: "ampcode.com".to_string(),
            port: 443,
        }
    }
}
