//! Logtap metrics - dimensional counters and text exposition
//!
//! Lock-free atomic counters on the hot path, with a labelled family
//! type for the dimensional breakdowns the service reports (per-flow
//! received traffic, per-listener delivered traffic, listener
//! lifecycle). The `/metrics` endpoint renders the registry in the
//! Prometheus text exposition format.
//!
//! The crate has no dependency on the rest of the workspace; callers
//! pass label values as plain strings.

mod family;
mod registry;

pub use family::{Counter, CounterVec, Gauge};
pub use registry::{FanoutMetrics, UNKNOWN_USER};
