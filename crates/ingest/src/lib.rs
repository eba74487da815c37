//! Logtap ingest - HTTP receiver for log records
//!
//! The upstream aggregator POSTs newline-delimited JSON records to
//! `/{kind}/{namespace}/{name}`; each decoded record is pushed into the
//! hub's record channel. The same server exposes `/healthz` and the
//! Prometheus `/metrics` exposition.
//!
//! # Shutdown
//!
//! The stop latch starts a graceful drain of in-flight requests; the
//! terminate latch aborts that drain for forced termination. When the
//! server exits it drops its record sender, which closes the hub's
//! record stream.

mod config;
mod error;
mod handlers;


use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};
use tokio::net::TcpListener;
use tracing::{info, warn};

use logtap_core::{Record, WaitableLatch};
use logtap_metrics::FanoutMetrics;

pub use config::IngestConfig;
pub use error::IngestError;

use handlers::{HandlerState, bad_path, healthz, ingest, metrics_exposition};

/// The HTTP ingest server.
pub struct IngestServer {
    config: IngestConfig,
    records: tokio::sync::mpsc::Sender<Arc<Record>>,
    metrics: Arc<FanoutMetrics>,
}

impl IngestServer {
    pub fn new(
        config: IngestConfig,
        records: tokio::sync::mpsc::Sender<Arc<Record>>,
        metrics: Arc<FanoutMetrics>,
    ) -> Self {
        Self {
            config,
            records,
            metrics,
        }
    }

    /// Bind and serve until the stop latch closes (graceful) or the
    /// terminate latch closes (forced).
    pub async fn run(
        self,
        stop: WaitableLatch,
        terminate: WaitableLatch,
    ) -> Result<(), IngestError> {
        let listener =
            TcpListener::bind(&self.config.addr)
                .await
                .map_err(|e| IngestError::Bind {
                    address: self.config.addr.clone(),
                    source: e,
                })?;

        info!(address = %self.config.addr, "ingest endpoint listening");

        let state = Arc::new(HandlerState {
            records: self.records,
            metrics: self.metrics,
        });
        let app = build_router(state);

        let stop_token = stop.token();
        let server = async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async move { stop_token.cancelled().await })
                .await
        };

        tokio::select! {
            result = server => result.map_err(IngestError::Serve)?,
            _ = terminate.wait() => {
                warn!("ingest endpoint terminated before drain completed");
            }
        }

        info!("ingest endpoint stopped");
        Ok(())
    }
}

/// Build the axum router.
fn build_router(state: Arc<HandlerState>) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/metrics", get(metrics_exposition))
        .route("/{kind}/{namespace}/{name}", post(ingest))
        .fallback(bad_path)
        .with_state(state)
}
