//! Listener handles and hub event types
//!
//! The listen endpoint registers one [`ListenerHandle`] per accepted
//! WebSocket session. The hub owns the registered set; the session task
//! owns the socket and drains the handle's frame channel. Membership
//! changes and reconcile snapshots travel over dedicated channels so the
//! hub stays the single writer.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::fmt;

use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tracing::debug;

use crate::flow::FlowReference;
use crate::record::Record;
use crate::user::UserInfo;

/// Frames buffered per listener before the hub starts dropping records
/// for that listener.
pub const FRAME_CHANNEL_CAPACITY: usize = 256;

/// Capacity of the hub-facing channels. One slot keeps producers
/// rendezvous-close to the hub so backpressure reaches the HTTP path.
pub const EVENT_CHANNEL_CAPACITY: usize = 1;

static NEXT_LISTENER_ID: AtomicU64 = AtomicU64::new(1);

/// Identity of a registered listener. Unique per connection for the
/// lifetime of the process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

impl ListenerId {
    /// Allocate the next unused id.
    pub fn next() -> Self {
        Self(NEXT_LISTENER_ID.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for ListenerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// The hub-side handle of one WebSocket session.
#[derive(Debug)]
pub struct ListenerHandle {
    id: ListenerId,
    flow: FlowReference,
    user: UserInfo,
    frames: mpsc::Sender<Arc<Record>>,
}

impl ListenerHandle {
    /// Create a handle and the frame receiver its session will drain.
    pub fn new(flow: FlowReference, user: UserInfo) -> (Self, mpsc::Receiver<Arc<Record>>) {
        let (frames, rx) = mpsc::channel(FRAME_CHANNEL_CAPACITY);
        (
            Self {
                id: ListenerId::next(),
                flow,
                user,
                frames,
            },
            rx,
        )
    }

    #[inline]
    pub fn id(&self) -> ListenerId {
        self.id
    }

    #[inline]
    pub fn flow(&self) -> &FlowReference {
        &self.flow
    }

    #[inline]
    pub fn user(&self) -> &UserInfo {
        &self.user
    }

    /// Hand a record to the session without blocking the hub.
    #[inline]
    pub fn forward(&self, record: Arc<Record>) -> Result<(), TrySendError<Arc<Record>>> {
        self.frames.try_send(record)
    }

    /// Whether the session is still draining frames.
    #[inline]
    pub fn is_connected(&self) -> bool {
        !self.frames.is_closed()
    }
}

/// Membership changes flowing into the hub.
#[derive(Debug)]
pub enum ListenerEvent {
    Register(ListenerHandle),
    Unregister(ListenerId),
}

/// Producer side of the listener-event channel.
///
/// Shared by the listen endpoint and every session's teardown path.
#[derive(Debug, Clone)]
pub struct ListenerRegistry {
    events: mpsc::Sender<ListenerEvent>,
}

impl ListenerRegistry {
    pub fn new(events: mpsc::Sender<ListenerEvent>) -> Self {
        Self { events }
    }

    /// Announce a new listener to the hub.
    pub async fn register(&self, listener: ListenerHandle) {
        let id = listener.id();
        if self.events.send(ListenerEvent::Register(listener)).await.is_err() {
            debug!(listener = %id, "hub gone, dropping register event");
        }
    }

    /// Remove a listener from the hub. A no-op for unknown ids.
    pub async fn unregister(&self, id: ListenerId) {
        if self.events.send(ListenerEvent::Unregister(id)).await.is_err() {
            debug!(listener = %id, "hub gone, dropping unregister event");
        }
    }
}

/// Snapshot of the distinct flows that currently have listeners.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconcileEvent {
    pub requests: Vec<FlowReference>,
}
