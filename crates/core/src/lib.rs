//! Logtap core - flow identity, records, and the fan-out hub
//!
//! This crate holds the value types shared by every component and the
//! single-writer hub that mediates between the ingest path, the WebSocket
//! listeners, and the reconciler.
//!
//! # Architecture
//!
//! ```text
//! Ingest handlers ──records──▶ Hub ◀──listener events── Listen endpoint
//!                               │                        and sessions
//!                     ┌─────────┴─────────┐
//!                     ▼                   ▼
//!             per-listener frame    reconcile events
//!             channels (sessions)      (reconciler)
//! ```
//!
//! The hub is the only task that mutates the listener set. Records fan
//! out as `Arc<Record>` over bounded per-listener channels; the session
//! task owning each socket applies the access policy and writes frames.

pub mod events;
pub mod flow;
pub mod hub;
pub mod latch;
pub mod policy;
pub mod record;
pub mod user;

pub use events::{ListenerEvent, ListenerHandle, ListenerId, ListenerRegistry, ReconcileEvent};
pub use flow::{FlowKind, FlowPathError, FlowReference};
pub use hub::Hub;
pub use latch::{HandleableLatch, WaitableLatch};
pub use record::{KubernetesMetadata, Record, RecordData};
pub use user::UserInfo;
