//! The routing-store capability
//!
//! Models the slice of the orchestrator's API the reconciler needs:
//! listing and mutating managed Output/ClusterOutput objects and editing
//! the output references of Flow/ClusterFlow objects. Managed objects
//! are recognized by a fixed label and carry the name of the flow they
//! serve in an annotation.

use std::collections::BTreeMap;

use async_trait::async_trait;
use thiserror::Error;

use logtap_core::FlowReference;

/// Label identifying objects this service owns.
pub const MANAGED_BY_LABEL_KEY: &str = "app.kubernetes.io/created-by";
pub const MANAGED_BY_LABEL_VALUE: &str = "log-socket";

/// Annotation on a managed output naming the flow it serves.
pub const FLOW_REF_ANNOTATION: &str = "flowRef";

/// The label selector for everything this service owns.
pub fn managed_labels() -> BTreeMap<String, String> {
    BTreeMap::from([(
        MANAGED_BY_LABEL_KEY.to_string(),
        MANAGED_BY_LABEL_VALUE.to_string(),
    )])
}

/// Whether an output is namespaced or cluster-scoped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OutputScope {
    Namespaced,
    Cluster,
}

/// HTTP forwarding spec of a managed output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpOutputSpec {
    pub endpoint: String,
    pub format: String,
    pub buffer: String,
    pub flush_mode: String,
}

impl HttpOutputSpec {
    /// The shape every managed output uses: JSON over HTTP with an
    /// in-memory buffer flushed immediately.
    pub fn immediate(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            format: "json".into(),
            buffer: "memory".into(),
            flush_mode: "immediate".into(),
        }
    }
}

/// A managed Output or ClusterOutput routing object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputObject {
    pub scope: OutputScope,
    pub namespace: String,
    pub name: String,
    pub labels: BTreeMap<String, String>,
    pub annotations: BTreeMap<String, String>,
    pub spec: HttpOutputSpec,
}

impl OutputObject {
    /// The flow name recorded when the object was created.
    pub fn flow_ref(&self) -> Option<&str> {
        self.annotations.get(FLOW_REF_ANNOTATION).map(String::as_str)
    }

    /// Whether this object's labels satisfy a selector.
    pub fn matches_labels(&self, selector: &BTreeMap<String, String>) -> bool {
        selector
            .iter()
            .all(|(k, v)| self.labels.get(k) == Some(v))
    }
}

/// The mutable part of a Flow/ClusterFlow the reconciler edits.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FlowObject {
    pub global_output_refs: Vec<String>,
}

/// Errors surfaced by a routing store.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("{kind} {name:?} already exists")]
    AlreadyExists { kind: &'static str, name: String },

    #[error("{kind} {name:?} not found")]
    NotFound { kind: &'static str, name: String },

    #[error("routing store error: {0}")]
    Backend(String),
}

impl StoreError {
    pub fn is_already_exists(&self) -> bool {
        matches!(self, StoreError::AlreadyExists { .. })
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound { .. })
    }
}

/// Capability interface to the orchestrator's routing objects.
///
/// Implementations address objects by `(namespace, name)`; cluster-scoped
/// objects use the namespace recorded on the object. Every call may block
/// on the network.
#[async_trait]
pub trait RoutingStore: Send + Sync {
    /// List namespaced outputs whose labels satisfy `selector`.
    async fn list_outputs(
        &self,
        selector: &BTreeMap<String, String>,
    ) -> Result<Vec<OutputObject>, StoreError>;

    /// List cluster-scoped outputs whose labels satisfy `selector`.
    async fn list_cluster_outputs(
        &self,
        selector: &BTreeMap<String, String>,
    ) -> Result<Vec<OutputObject>, StoreError>;

    /// Create a routing object. Fails with [`StoreError::AlreadyExists`]
    /// when an object with the same key exists.
    async fn create_output(&self, output: OutputObject) -> Result<(), StoreError>;

    /// Delete a routing object by key.
    async fn delete_output(
        &self,
        scope: OutputScope,
        namespace: &str,
        name: &str,
    ) -> Result<(), StoreError>;

    /// Read the output references of a Flow/ClusterFlow.
    async fn get_flow(&self, flow: &FlowReference) -> Result<FlowObject, StoreError>;

    /// Replace the output references of a Flow/ClusterFlow.
    async fn update_flow(&self, flow: &FlowReference, refs: Vec<String>)
    -> Result<(), StoreError>;
}
