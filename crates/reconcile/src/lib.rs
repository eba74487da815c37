//! Logtap reconciler - routing objects follow the listener population
//!
//! For every flow that has at least one WebSocket listener there must be
//! a managed Output routing object pointing at the ingest endpoint, and
//! that Output must be referenced by the corresponding Flow/ClusterFlow.
//! When the last listener of a flow goes away, the Output is detached
//! and deleted.
//!
//! The orchestrator client stays behind the [`RoutingStore`] capability;
//! [`MemoryRoutingStore`] is the in-process realization used by tests
//! and by deployments without an orchestrator.

mod error;
mod memory;
mod reconciler;
mod store;
pub mod worker;

pub use error::ReconcileError;
pub use memory::MemoryRoutingStore;
pub use reconciler::{Reconciler, output_name};
pub use store::{
    FLOW_REF_ANNOTATION, FlowObject, HttpOutputSpec, MANAGED_BY_LABEL_KEY, MANAGED_BY_LABEL_VALUE,
    OutputObject, OutputScope, RoutingStore, StoreError, managed_labels,
};
