//! Error types for the listener server

use std::io;

use thiserror::Error;

/// Fatal errors from running the listener server.
#[derive(Debug, Error)]
pub enum ListenError {
    /// The configured address does not parse as a socket address.
    #[error("invalid listen address: {0}")]
    Addr(String),

    /// Could not bind the listen address.
    #[error("failed to bind {address}: {source}")]
    Bind {
        address: String,
        source: io::Error,
    },

    /// Could not load the TLS certificate or key.
    #[error("failed to load TLS material: {0}")]
    Tls(io::Error),

    /// The server loop failed.
    #[error("listener server error: {0}")]
    Serve(io::Error),
}
