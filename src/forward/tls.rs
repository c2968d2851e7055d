//! TLS client setup for the remote management host.

use std::sync::Arc;

use tokio_rustls::rustls::{ClientConfig, RootCertStore};
use tokio_rustls::TlsConnector;

/// Build a TLS connector backed by the platform's native root certificates.
///
/// Built once at proxy startup and shared across connections. A machine
/// without usable roots still gets a connector; handshakes to the remote host
/// will then fail per-connection instead of preventing startup, and the
/// backend leg keeps working.
pub fn build_connector() -> TlsConnector {
    let mut roots = RootCertStore::empty();

    match rustls_native_certs::load_native_certs() {
        Ok(certs) => {
            let (added, ignored) = roots.add_parsable_certificates(certs);
            if ignored > 0 {
                tracing::debug!(added, ignored, "Some native root certificates were not parsable");
            }
            if added == 0 {
                tracing::warn!("No usable native root certificates; remote host TLS will fail");
            }
        }
        Err(e) => {
            tracing::warn!(error = %e, "Failed to load native root certificates; remote host TLS will fail");
        }
    }

    let config = ClientConfig::builder()
        .with_root_certificates(roots)
        .with_no_client_auth();

    TlsConnector::from(Arc::new(config))
}
