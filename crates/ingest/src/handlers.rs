//! Ingest route handlers

use std::sync::Arc;

use axum::body::to_bytes;
use axum::extract::{Path, Request, State};
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use tracing::{debug, trace};

use logtap_core::{FlowKind, FlowReference, Record};
use logtap_metrics::FanoutMetrics;

/// Shared state for handlers.
pub(crate) struct HandlerState {
    pub records: tokio::sync::mpsc::Sender<Arc<Record>>,
    pub metrics: Arc<FanoutMetrics>,
}

/// GET /healthz
pub(crate) async fn healthz(State(state): State<Arc<HandlerState>>) -> impl IntoResponse {
    trace!("health check");
    state.metrics.health_check();
    (StatusCode::OK, "OK")
}

/// GET /metrics - Prometheus text exposition
pub(crate) async fn metrics_exposition(
    State(state): State<Arc<HandlerState>>,
) -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}

/// POST /{kind}/{namespace}/{name} - ingest newline-delimited records
///
/// Records are pushed as they decode; a malformed line aborts the
/// request with 400 but does not roll back lines already pushed from the
/// same body.
pub(crate) async fn ingest(
    State(state): State<Arc<HandlerState>>,
    Path((kind, namespace, name)): Path<(String, String, String)>,
    request: Request,
) -> Response {
    let kind = match kind.parse::<FlowKind>() {
        Ok(kind) => kind,
        Err(e) => {
            state.metrics.error();
            debug!(error = %e, "rejecting ingest request");
            return (StatusCode::BAD_REQUEST, "invalid flow kind").into_response();
        }
    };
    let flow = FlowReference::new(kind, namespace, name);

    let body = match to_bytes(request.into_body(), usize::MAX).await {
        Ok(body) => body,
        Err(e) => {
            state.metrics.error();
            debug!(error = %e, "failed to read request body");
            return (StatusCode::INTERNAL_SERVER_ERROR, "failed to read request body")
                .into_response();
        }
    };

    for line in body.split(|&b| b == b'\n') {
        if line.is_empty() {
            continue;
        }

        state
            .metrics
            .record_received(flow.kind.as_str(), &flow.namespace, &flow.name, line.len());

        let record = match Record::parse(body.slice_ref(line), flow.clone()) {
            Ok(record) => record,
            Err(e) => {
                state.metrics.error();
                debug!(
                    error = %e,
                    data = %String::from_utf8_lossy(line),
                    "failed to parse log data"
                );
                return (StatusCode::BAD_REQUEST, "failed to parse log data").into_response();
            }
        };

        trace!(flow = %record.flow, "got log record via HTTP");
        if state.records.send(Arc::new(record)).await.is_err() {
            state.metrics.error();
            return (StatusCode::INTERNAL_SERVER_ERROR, "record pipeline closed").into_response();
        }
    }

    StatusCode::OK.into_response()
}

/// Any other path or method.
pub(crate) async fn bad_path() -> impl IntoResponse {
    (StatusCode::BAD_REQUEST, "invalid URL path")
}
