//! The per-connection sender
//!
//! Each accepted upgrade runs one session: the hub side registers a
//! listener handle, and this task drains the handle's frame channel into
//! binary WebSocket frames while watching the socket for a close. The
//! session task is the only writer on its socket, so writes are never
//! concurrent per connection.
//!
//! Any exit path (write failure, read error, peer close, hub drop) tears
//! the session down and emits exactly one unregister event.

use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket};
use bytes::Bytes;
use futures_util::{SinkExt, StreamExt};
use tracing::{debug, info};

use logtap_core::{FlowReference, ListenerHandle, Record, UserInfo, policy};
use logtap_metrics::FanoutMetrics;

use crate::handler::ListenState;

/// Run one listener session to completion.
pub(crate) async fn run(
    socket: WebSocket,
    flow: FlowReference,
    user: UserInfo,
    state: Arc<ListenState>,
) {
    state
        .metrics
        .listener_accepted(flow.kind.as_str(), &flow.namespace, &flow.name, &user.username);

    // Registration is delivered to the hub before the first read, so no
    // record routed after this point can miss the listener.
    let (handle, mut frames) = ListenerHandle::new(flow.clone(), user.clone());
    let id = handle.id();
    state.registry.register(handle).await;
    info!(listener = %id, flow = %flow, user = %user.username, "listener connected");

    let (mut sink, mut stream) = socket.split();

    loop {
        tokio::select! {
            frame = frames.recv() => match frame {
                Some(record) => {
                    let payload = frame_payload(&record, &flow, &user, &state.metrics);
                    if let Err(e) = sink.send(Message::Binary(payload)).await {
                        debug!(listener = %id, error = %e, "failed to write frame");
                        break;
                    }
                }
                // The hub dropped our handle.
                None => break,
            },
            message = stream.next() => match message {
                Some(Ok(Message::Close(_))) | None => {
                    debug!(listener = %id, "connection closed by peer");
                    break;
                }
                // The reader's only job is to surface closes and errors.
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    debug!(listener = %id, error = %e, "websocket read error");
                    break;
                }
            },
        }
    }

    state.registry.unregister(id).await;
    debug!(listener = %id, "listener disconnected");
}

/// Decide what one record becomes on the wire for one listener: the raw
/// line when the policy permits, a denial blob otherwise.
pub(crate) fn frame_payload(
    record: &Record,
    flow: &FlowReference,
    user: &UserInfo,
    metrics: &FanoutMetrics,
) -> Bytes {
    let (rules, invalid) = policy::load_rules(&record.data.kubernetes.labels);
    for error in invalid {
        debug!(error = %error, "ignoring malformed access rule in record labels");
    }

    if rules.can_view(&user.username) {
        metrics.record_transmitted(
            flow.kind.as_str(),
            &flow.namespace,
            &flow.name,
            &user.username,
            record.raw.len(),
        );
        record.raw.clone()
    } else {
        metrics.record_redacted(
            flow.kind.as_str(),
            &flow.namespace,
            &flow.name,
            &user.username,
            record.raw.len(),
        );
        debug!(
            user = %user.username,
            pod = %record.data.kubernetes.pod_name,
            "listener lacks permission for record"
        );
        let blob = serde_json::json!({
            "error": format!(
                "Permission denied to access {} logs for {}",
                record.data.kubernetes.pod_name, user.username
            ),
        });
        Bytes::from(blob.to_string())
    }
}

#[cfg(test)]
#[path = "session_test.rs"]
mod tests;
