//! Upgrade handler
//!
//! Checks run in a fixed order before the upgrade: flow path, token
//! presence, token verification. Only a fully authenticated request
//! becomes a session.

use std::sync::Arc;

use axum::extract::ws::WebSocketUpgrade;
use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use tracing::debug;

use logtap_core::{FlowKind, FlowReference, ListenerRegistry};
use logtap_metrics::FanoutMetrics;

use crate::session;
use crate::verifier::TokenVerifier;

/// Header carrying the listener's bearer token.
pub(crate) const AUTH_HEADER: &str = "X-Authorization";

/// Shared state for the upgrade handler.
pub(crate) struct ListenState {
    pub registry: ListenerRegistry,
    pub verifier: Arc<dyn TokenVerifier>,
    pub metrics: Arc<FanoutMetrics>,
}

/// GET /{kind}/{namespace}/{name} with a WebSocket upgrade.
pub(crate) async fn listen(
    State(state): State<Arc<ListenState>>,
    Path((kind, namespace, name)): Path<(String, String, String)>,
    headers: HeaderMap,
    ws: WebSocketUpgrade,
) -> Response {
    let kind = match kind.parse::<FlowKind>() {
        Ok(kind) => kind,
        Err(e) => {
            debug!(error = %e, "rejecting listener connection request");
            return (StatusCode::BAD_REQUEST, e.to_string()).into_response();
        }
    };
    let flow = FlowReference::new(kind, namespace, name);

    let token = headers
        .get(AUTH_HEADER)
        .and_then(|v| v.to_str().ok())
        .filter(|t| !t.is_empty());
    let Some(token) = token else {
        state
            .metrics
            .listener_rejected(flow.kind.as_str(), &flow.namespace, &flow.name);
        debug!(flow = %flow, "no authentication token in request");
        return (StatusCode::FORBIDDEN, "missing authentication token").into_response();
    };

    let user = match state.verifier.verify(token).await {
        Ok(user) => user,
        Err(e) => {
            state
                .metrics
                .listener_rejected(flow.kind.as_str(), &flow.namespace, &flow.name);
            debug!(error = %e, flow = %flow, "authentication failed");
            return (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response();
        }
    };

    ws.on_upgrade(move |socket| session::run(socket, flow, user, state))
}

/// Any path that is not a flow reference.
pub(crate) async fn bad_path() -> impl IntoResponse {
    (
        StatusCode::BAD_REQUEST,
        "URL path is not a valid flow reference",
    )
}
