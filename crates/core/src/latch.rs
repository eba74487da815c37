//! One-shot shutdown latches
//!
//! Two faces of the same event:
//!
//! - [`WaitableLatch`] closes at most once and lets any number of tasks
//!   await the close.
//! - [`HandleableLatch`] additionally runs registered handlers exactly
//!   once after the close. Handlers registered after the close run
//!   immediately.
//!
//! These are the only cancellation signals in the service; every
//! long-lived worker selects on one.

use std::sync::Arc;

use parking_lot::Mutex;
use tokio_util::sync::CancellationToken;

/// A one-shot broadcast signal. Clones share the same underlying event.
#[derive(Debug, Clone, Default)]
pub struct WaitableLatch {
    token: CancellationToken,
}

impl WaitableLatch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Close the latch. Idempotent.
    pub fn close(&self) {
        self.token.cancel();
    }

    pub fn is_closed(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Wait until the latch is closed. Returns immediately if it already is.
    pub async fn wait(&self) {
        self.token.cancelled().await;
    }

    /// The underlying token, for composing with `select!` loops and
    /// graceful-shutdown futures.
    pub fn token(&self) -> CancellationToken {
        self.token.clone()
    }
}

type Handler = Box<dyn FnOnce() + Send + 'static>;

/// A latch observer that runs handlers once the latch closes.
///
/// Construction spawns a watcher task, so a `HandleableLatch` must be
/// created inside a tokio runtime. Handlers run on the watcher task (or
/// inline on the registering task when the latch is already closed) and
/// should not block.
#[derive(Clone)]
pub struct HandleableLatch {
    token: CancellationToken,
    handlers: Arc<Mutex<Vec<Handler>>>,
}

impl HandleableLatch {
    pub fn new(latch: &WaitableLatch) -> Self {
        let this = Self {
            token: latch.token(),
            handlers: Arc::new(Mutex::new(Vec::new())),
        };
        let token = this.token.clone();
        let handlers = Arc::clone(&this.handlers);
        tokio::spawn(async move {
            token.cancelled().await;
            let mut list = handlers.lock();
            for handler in list.drain(..) {
                handler();
            }
        });
        this
    }

    /// Run `handler` once the latch closes.
    ///
    /// Registration and close are serialized by the handler-list mutex: a
    /// handler registered before the close runs exactly once after it, a
    /// handler registered after the close runs immediately on the calling
    /// task.
    pub fn handle_with(&self, handler: impl FnOnce() + Send + 'static) {
        let mut list = self.handlers.lock();
        if self.token.is_cancelled() {
            drop(list);
            handler();
        } else {
            list.push(Box::new(handler));
        }
    }
}

#[cfg(test)]
#[path = "latch_test.rs"]
mod tests;
