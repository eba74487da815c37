//! Error types for the ingest server

use std::io;

use thiserror::Error;

/// Fatal errors from running the ingest server.
#[derive(Debug, Error)]
pub enum IngestError {
    /// Could not bind the listen address.
    #[error("failed to bind {address}: {source}")]
    Bind {
        address: String,
        source: io::Error,
    },

    /// The server loop failed.
    #[error("ingest server error: {0}")]
    Serve(io::Error),
}
