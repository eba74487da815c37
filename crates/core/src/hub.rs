//! The fan-out hub
//!
//! A single-writer event loop that owns the listener set. Three inputs
//! are serialized through one `select!`: the record stream from ingest,
//! the listener-event stream from the listen endpoint, and the stop
//! latch. Because only this task touches the set, per-listener delivery
//! order follows hub arrival order and no record can be forwarded to a
//! listener before its registration was processed.

use std::collections::HashSet;
use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tracing::{debug, trace, warn};

use logtap_metrics::FanoutMetrics;

use crate::events::{ListenerEvent, ListenerHandle, ReconcileEvent};
use crate::latch::WaitableLatch;
use crate::record::Record;

/// The single-writer fan-out loop.
pub struct Hub {
    records: mpsc::Receiver<Arc<Record>>,
    events: mpsc::Receiver<ListenerEvent>,
    reconcile: mpsc::Sender<ReconcileEvent>,
    metrics: Arc<FanoutMetrics>,
    stop: WaitableLatch,
    listeners: Vec<ListenerHandle>,
}

impl Hub {
    pub fn new(
        records: mpsc::Receiver<Arc<Record>>,
        events: mpsc::Receiver<ListenerEvent>,
        reconcile: mpsc::Sender<ReconcileEvent>,
        metrics: Arc<FanoutMetrics>,
        stop: WaitableLatch,
    ) -> Self {
        Self {
            records,
            events,
            reconcile,
            metrics,
            stop,
            listeners: Vec::new(),
        }
    }

    /// Run until the stop latch closes or the record stream ends.
    pub async fn run(mut self) {
        loop {
            tokio::select! {
                _ = self.stop.wait() => break,
                event = self.events.recv() => match event {
                    Some(event) => self.on_listener_event(event).await,
                    None => break,
                },
                record = self.records.recv() => match record {
                    Some(record) => self.forward(record),
                    None => {
                        debug!("record stream closed, hub exiting");
                        break;
                    }
                },
            }
        }
        debug!(listeners = self.listeners.len(), "hub stopped");
    }

    /// Apply a membership change, draining any further queued events into
    /// the same batch before emitting a single reconcile snapshot.
    async fn on_listener_event(&mut self, first: ListenerEvent) {
        let mut to_add = Vec::new();
        let mut to_remove = Vec::new();

        let mut event = first;
        loop {
            match event {
                ListenerEvent::Register(listener) => to_add.push(listener),
                ListenerEvent::Unregister(id) => to_remove.push(id),
            }
            match self.events.try_recv() {
                Ok(next) => event = next,
                Err(_) => break,
            }
        }

        let changed = !to_add.is_empty() || !to_remove.is_empty();

        // Removals apply to the pre-batch set; additions land afterwards.
        if !to_remove.is_empty() {
            let metrics = &self.metrics;
            self.listeners.retain(|listener| {
                let removed = to_remove.contains(&listener.id());
                if removed {
                    let flow = listener.flow();
                    metrics.listener_removed(
                        flow.kind.as_str(),
                        &flow.namespace,
                        &flow.name,
                        &listener.user().username,
                    );
                    debug!(listener = %listener.id(), flow = %flow, "listener removed");
                }
                !removed
            });
        }
        for listener in to_add {
            debug!(listener = %listener.id(), flow = %listener.flow(), "listener registered");
            self.listeners.push(listener);
        }

        self.metrics.current_listeners(self.listeners.len());

        if changed {
            let snapshot = self.snapshot();
            trace!(requests = snapshot.requests.len(), "emitting reconcile event");
            if self.reconcile.send(snapshot).await.is_err() {
                debug!("reconciler gone, dropping reconcile event");
            }
        }
    }

    /// Fan one record out to every listener of its flow, in registration
    /// order. Best effort: a full or closed frame channel never blocks
    /// the loop; the session's own teardown handles deregistration.
    fn forward(&self, record: Arc<Record>) {
        if self.listeners.is_empty() {
            trace!(flow = %record.flow, "no listeners, discarding record");
            return;
        }
        for listener in &self.listeners {
            if listener.flow() != &record.flow {
                continue;
            }
            match listener.forward(Arc::clone(&record)) {
                Ok(()) => {}
                Err(TrySendError::Full(_)) => {
                    self.metrics.error();
                    warn!(listener = %listener.id(), flow = %record.flow, "frame channel full, dropping record for listener");
                }
                Err(TrySendError::Closed(_)) => {
                    debug!(listener = %listener.id(), "frame channel closed, unregister pending");
                }
            }
        }
    }

    /// Distinct flows with at least one listener, in registration order.
    fn snapshot(&self) -> ReconcileEvent {
        let mut seen = HashSet::new();
        let mut requests = Vec::new();
        for listener in &self.listeners {
            if seen.insert(listener.flow().clone()) {
                requests.push(listener.flow().clone());
            }
        }
        ReconcileEvent { requests }
    }
}

#[cfg(test)]
#[path = "hub_test.rs"]
mod tests;
