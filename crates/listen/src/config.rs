//! Listener endpoint configuration

use std::path::PathBuf;

/// Default bind address for the listener endpoint.
const DEFAULT_ADDR: &str = "0.0.0.0:10001";

/// Configuration for the WebSocket listener server.
#[derive(Debug, Clone)]
pub struct ListenConfig {
    /// Bind address, e.g. `0.0.0.0:10001`.
    pub addr: String,

    /// TLS certificate chain (PEM). Certificate provisioning happens
    /// outside the service.
    pub tls_cert_path: Option<PathBuf>,

    /// TLS private key (PEM).
    pub tls_key_path: Option<PathBuf>,
}

impl Default for ListenConfig {
    fn default() -> Self {
        Self {
            addr: DEFAULT_ADDR.into(),
            tls_cert_path: None,
            tls_key_path: None,
        }
    }
}

impl ListenConfig {
    pub fn with_addr(addr: impl Into<String>) -> Self {
        Self {
            addr: addr.into(),
            ..Default::default()
        }
    }

    pub fn is_tls_enabled(&self) -> bool {
        self.tls_cert_path.is_some() && self.tls_key_path.is_some()
    }
}
