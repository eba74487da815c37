//! Logtap - real-time per-tenant log fan-out service
//!
//! An upstream log aggregator POSTs records to the ingest endpoint;
//! authenticated operators follow a flow over WebSocket and receive
//! every record routed to it, subject to the per-record access policy.
//! A reconciler keeps the orchestrator's routing objects in step with
//! the current listener population.
//!
//! # Usage
//!
//! ```bash
//! logtap
//! logtap --ingest-addr 0.0.0.0:10000 --listen-addr 0.0.0.0:10001 \
//!        --service-addr logtap.default.svc:10000 -v 1
//! ```

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::signal;
use tokio::sync::mpsc;
use tracing::{error, info, warn};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use logtap_core::events::EVENT_CHANNEL_CAPACITY;
use logtap_core::{Hub, ListenerRegistry, ReconcileEvent, UserInfo, WaitableLatch};
use logtap_ingest::{IngestConfig, IngestServer};
use logtap_listen::{ListenConfig, ListenServer, StaticTokenVerifier, TokenVerifier};
use logtap_metrics::FanoutMetrics;
use logtap_reconcile::{MemoryRoutingStore, Reconciler, RoutingStore, worker};

/// Real-time per-tenant log fan-out service
#[derive(Parser, Debug)]
#[command(name = "logtap")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Local address where the service ingests logs
    #[arg(long = "ingest-addr", default_value = "0.0.0.0:10000")]
    ingest_addr: String,

    /// Address where the service accepts WebSocket listeners
    #[arg(long = "listen-addr", default_value = "0.0.0.0:10001")]
    listen_addr: String,

    /// Remote address where the aggregator reaches the ingest endpoint;
    /// advertised in created routing outputs
    #[arg(long = "service-addr", default_value = "logtap.default.svc:10000")]
    service_addr: String,

    /// Log verbosity level (0 = info, 1 = debug, 2 = trace)
    #[arg(short = 'v', long, default_value_t = 0)]
    verbosity: u8,

    /// TLS certificate for the listener endpoint (PEM)
    #[arg(long = "tls-cert")]
    tls_cert: Option<PathBuf>,

    /// TLS private key for the listener endpoint (PEM)
    #[arg(long = "tls-key")]
    tls_key: Option<PathBuf>,

    /// Listener token file, one `<token> <username>` pair per line
    #[arg(long = "tokens-file")]
    tokens_file: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbosity)?;

    info!(
        version = env!("CARGO_PKG_VERSION"),
        ingest_addr = %cli.ingest_addr,
        listen_addr = %cli.listen_addr,
        "logtap starting"
    );

    run_server(cli).await?;

    info!("logtap shutdown complete");
    Ok(())
}

async fn run_server(cli: Cli) -> Result<()> {
    let metrics = Arc::new(FanoutMetrics::new());
    let stop = WaitableLatch::new();
    let terminate = WaitableLatch::new();

    let (records_tx, records_rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);
    let (events_tx, events_rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);
    let (reconcile_tx, reconcile_rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);

    let registry = ListenerRegistry::new(events_tx);
    let verifier = build_verifier(cli.tokens_file.as_deref())?;

    // The orchestrator client is a deployment concern; without one the
    // reconciler converges against the in-process store.
    let store: Arc<dyn RoutingStore> = Arc::new(MemoryRoutingStore::new());
    let reconciler = Reconciler::new(normalize_service_addr(&cli.service_addr), store);

    let hub = Hub::new(
        records_rx,
        events_rx,
        reconcile_tx.clone(),
        Arc::clone(&metrics),
        stop.clone(),
    );

    let mut tasks = Vec::new();

    // Every worker closes the stop latch on exit, so one fatal failure
    // brings the rest down with it.
    {
        let stop_guard = stop.clone();
        tasks.push(tokio::spawn(async move {
            hub.run().await;
            stop_guard.close();
        }));
    }
    {
        let server = IngestServer::new(
            IngestConfig::with_addr(cli.ingest_addr.clone()),
            records_tx,
            Arc::clone(&metrics),
        );
        let (stop_w, terminate_w, stop_guard) = (stop.clone(), terminate.clone(), stop.clone());
        tasks.push(tokio::spawn(async move {
            if let Err(e) = server.run(stop_w, terminate_w).await {
                error!(error = %e, "ingest server failed");
            }
            stop_guard.close();
        }));
    }
    {
        let config = ListenConfig {
            addr: cli.listen_addr.clone(),
            tls_cert_path: cli.tls_cert.clone(),
            tls_key_path: cli.tls_key.clone(),
        };
        let server = ListenServer::new(config, registry, verifier, Arc::clone(&metrics));
        let (stop_w, terminate_w, stop_guard) = (stop.clone(), terminate.clone(), stop.clone());
        tasks.push(tokio::spawn(async move {
            if let Err(e) = server.run(stop_w, terminate_w).await {
                error!(error = %e, "listener server failed");
            }
            stop_guard.close();
        }));
    }
    {
        let (stop_w, stop_guard) = (stop.clone(), stop.clone());
        tasks.push(tokio::spawn(async move {
            worker::run(reconciler, reconcile_rx, stop_w).await;
            stop_guard.close();
        }));
    }

    // Initial pass with no requests cleans up outputs left over from a
    // previous run.
    let _ = reconcile_tx.send(ReconcileEvent::default()).await;

    let (stop_sig, terminate_sig) = (stop.clone(), terminate.clone());
    tokio::spawn(async move {
        wait_for_signal().await;
        info!("shutdown signal received, stopping");
        stop_sig.close();
        wait_for_signal().await;
        warn!("second shutdown signal received, terminating");
        terminate_sig.close();
    });

    for task in tasks {
        let _ = task.await;
    }
    Ok(())
}

/// Initialize the tracing subscriber, mapping the verbosity contract
/// onto level filters. `RUST_LOG` wins when set.
fn init_logging(verbosity: u8) -> Result<()> {
    let level = match verbosity {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .map_err(|e| anyhow::anyhow!("invalid log filter: {}", e))?;

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true).with_thread_ids(false))
        .with(filter)
        .init();

    Ok(())
}

/// The reconciler advertises a full URL; bare host:port gets a scheme.
fn normalize_service_addr(addr: &str) -> String {
    if addr.contains("://") {
        addr.to_string()
    } else {
        format!("http://{addr}")
    }
}

/// Load the development token map.
fn build_verifier(path: Option<&Path>) -> Result<Arc<dyn TokenVerifier>> {
    let verifier = StaticTokenVerifier::new();
    match path {
        Some(path) => {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("failed to read tokens file {}", path.display()))?;
            let mut count = 0;
            for line in content.lines() {
                let line = line.trim();
                if line.is_empty() || line.starts_with('#') {
                    continue;
                }
                let mut parts = line.split_whitespace();
                if let (Some(token), Some(username)) = (parts.next(), parts.next()) {
                    verifier.insert(token, UserInfo::new(username));
                    count += 1;
                }
            }
            info!(tokens = count, path = %path.display(), "loaded listener tokens");
        }
        None => {
            warn!("no tokens file configured, all listener connections will be rejected");
        }
    }
    Ok(Arc::new(verifier))
}

/// Resolve on Ctrl+C or SIGTERM.
async fn wait_for_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
