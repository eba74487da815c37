//! Logtap listen - authenticated WebSocket subscriptions
//!
//! Operators upgrade `GET /{kind}/{namespace}/{name}` to a WebSocket and
//! receive every record routed to that flow as one binary frame each,
//! with the per-record access policy applied before the write. Token
//! verification stays behind the [`TokenVerifier`] capability.
//!
//! Served over TLS when a certificate and key are configured; the
//! plaintext fallback exists for development setups where termination
//! happens in front of the service.

mod config;
mod error;
mod handler;
mod session;
mod verifier;


use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::routing::any;
use axum_server::Handle;
use axum_server::tls_rustls::RustlsConfig;
use tokio::net::TcpListener;
use tracing::{info, warn};

use logtap_core::{HandleableLatch, ListenerRegistry, WaitableLatch};
use logtap_metrics::FanoutMetrics;

pub use config::ListenConfig;
pub use error::ListenError;
pub use verifier::{StaticTokenVerifier, TokenVerifier, VerifyError};

use handler::{ListenState, bad_path, listen};

/// Drain budget for open sessions once the stop latch closes.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(10);

/// The WebSocket listener server.
pub struct ListenServer {
    config: ListenConfig,
    registry: ListenerRegistry,
    verifier: Arc<dyn TokenVerifier>,
    metrics: Arc<FanoutMetrics>,
}

impl ListenServer {
    pub fn new(
        config: ListenConfig,
        registry: ListenerRegistry,
        verifier: Arc<dyn TokenVerifier>,
        metrics: Arc<FanoutMetrics>,
    ) -> Self {
        Self {
            config,
            registry,
            verifier,
            metrics,
        }
    }

    /// Serve until the stop latch closes; the terminate latch cuts the
    /// drain short.
    pub async fn run(
        self,
        stop: WaitableLatch,
        terminate: WaitableLatch,
    ) -> Result<(), ListenError> {
        let state = Arc::new(ListenState {
            registry: self.registry,
            verifier: self.verifier,
            metrics: self.metrics,
        });
        let app = build_router(state);
        let config = self.config;

        match (&config.tls_cert_path, &config.tls_key_path) {
            (Some(cert), Some(key)) => {
                Self::run_tls(&config.addr, cert, key, app, stop, terminate).await
            }
            _ => Self::run_plain(&config.addr, app, stop, terminate).await,
        }
    }

    async fn run_tls(
        addr: &str,
        cert: &std::path::Path,
        key: &std::path::Path,
        app: Router,
        stop: WaitableLatch,
        terminate: WaitableLatch,
    ) -> Result<(), ListenError> {
        let addr: SocketAddr = addr
            .parse()
            .map_err(|_| ListenError::Addr(addr.to_string()))?;

        let tls = RustlsConfig::from_pem_file(cert, key)
            .await
            .map_err(ListenError::Tls)?;

        let server = Handle::new();
        let stop_signal = HandleableLatch::new(&stop);
        let handle = server.clone();
        stop_signal.handle_with(move || handle.graceful_shutdown(Some(SHUTDOWN_GRACE)));
        let terminate_signal = HandleableLatch::new(&terminate);
        let handle = server.clone();
        terminate_signal.handle_with(move || handle.shutdown());

        info!(address = %addr, "listener endpoint serving TLS");
        axum_server::bind_rustls(addr, tls)
            .handle(server)
            .serve(app.into_make_service())
            .await
            .map_err(ListenError::Serve)?;

        info!("listener endpoint stopped");
        Ok(())
    }

    async fn run_plain(
        addr: &str,
        app: Router,
        stop: WaitableLatch,
        terminate: WaitableLatch,
    ) -> Result<(), ListenError> {
        warn!("no TLS certificate configured, listener endpoint serving plaintext");
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|e| ListenError::Bind {
                address: addr.to_string(),
                source: e,
            })?;

        info!(address = %addr, "listener endpoint listening");
        let stop_token = stop.token();
        let server = async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async move { stop_token.cancelled().await })
                .await
        };

        tokio::select! {
            result = server => result.map_err(ListenError::Serve)?,
            _ = terminate.wait() => {
                warn!("listener endpoint terminated before drain completed");
            }
        }

        info!("listener endpoint stopped");
        Ok(())
    }
}

/// Build the axum router.
fn build_router(state: Arc<ListenState>) -> Router {
    Router::new()
        .route("/{kind}/{namespace}/{name}", any(listen))
        .fallback(bad_path)
        .with_state(state)
}
