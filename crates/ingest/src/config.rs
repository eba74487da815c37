//! Ingest endpoint configuration

/// Default bind address for the ingest endpoint.
const DEFAULT_ADDR: &str = "0.0.0.0:10000";

/// Configuration for the HTTP ingest server.
#[derive(Debug, Clone)]
pub struct IngestConfig {
    /// Bind address, e.g. `0.0.0.0:10000`.
    pub addr: String,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            addr: DEFAULT_ADDR.into(),
        }
    }
}

impl IngestConfig {
    pub fn with_addr(addr: impl Into<String>) -> Self {
        Self { addr: addr.into() }
    }
}
