//! The reconciler driver
//!
//! Consumes reconcile events from the hub until the stop latch closes.
//! Errors are logged rather than retried inline: the next membership
//! change produces a fresh event, which re-runs the full convergence
//! pass anyway.

use tokio::sync::mpsc;
use tracing::{debug, warn};

use logtap_core::{ReconcileEvent, WaitableLatch};

use crate::reconciler::Reconciler;

/// Run the driver loop until `stop` closes or the event stream ends.
pub async fn run(
    reconciler: Reconciler,
    mut events: mpsc::Receiver<ReconcileEvent>,
    stop: WaitableLatch,
) {
    loop {
        tokio::select! {
            _ = stop.wait() => break,
            event = events.recv() => match event {
                Some(event) => {
                    debug!(requests = event.requests.len(), "reconciling");
                    if let Err(e) = reconciler.reconcile(&event).await {
                        warn!(error = %e, "reconcile failed; next event retries");
                    }
                }
                None => break,
            },
        }
    }
    debug!("reconcile worker stopped");
}

#[cfg(test)]
#[path = "worker_test.rs"]
mod tests;
