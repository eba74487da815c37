//! Convergence logic
//!
//! One [`Reconciler::reconcile`] call makes the external routing world
//! match a [`ReconcileEvent`] snapshot: requested flows gain a managed
//! output wired into their flow object, no-longer-requested outputs are
//! detached and deleted. Every sub-operation is idempotent, so replaying
//! the same event leaves the world unchanged and the next event after a
//! failure re-converges.

use std::collections::BTreeMap;
use std::collections::HashMap;
use std::sync::Arc;

use tracing::{debug, info};

use logtap_core::{FlowKind, FlowReference, ReconcileEvent};

use crate::error::ReconcileError;
use crate::store::{
    FLOW_REF_ANNOTATION, HttpOutputSpec, OutputObject, OutputScope, RoutingStore, StoreError,
    managed_labels,
};

/// Name of the managed output serving a flow.
pub fn output_name(flow_name: &str) -> String {
    format!("{flow_name}-tailer")
}

/// Drives managed routing objects to match the requested flow set.
pub struct Reconciler {
    store: Arc<dyn RoutingStore>,
    ingest_addr: String,
}

impl Reconciler {
    /// `ingest_addr` is the externally reachable ingest URL advertised in
    /// created outputs; a trailing slash is tolerated.
    pub fn new(ingest_addr: impl Into<String>, store: Arc<dyn RoutingStore>) -> Self {
        Self {
            store,
            ingest_addr: ingest_addr.into(),
        }
    }

    /// Converge the external world on `event`.
    ///
    /// Failures of individual sub-operations do not stop the pass; they
    /// accumulate and surface as one [`ReconcileError`] so the driver
    /// retries on the next event.
    pub async fn reconcile(&self, event: &ReconcileEvent) -> Result<(), ReconcileError> {
        let selector = managed_labels();
        let mut owned: HashMap<(String, String), OutputObject> = HashMap::new();
        for output in self
            .store
            .list_outputs(&selector)
            .await
            .map_err(ReconcileError::single)?
        {
            owned.insert((output.namespace.clone(), output.name.clone()), output);
        }
        for output in self
            .store
            .list_cluster_outputs(&selector)
            .await
            .map_err(ReconcileError::single)?
        {
            owned.insert((output.namespace.clone(), output.name.clone()), output);
        }

        let mut errors = Vec::new();

        for flow in &event.requests {
            let key = (flow.namespace.clone(), output_name(&flow.name));
            if !owned.contains_key(&key) {
                if let Err(e) = self.ensure_output(flow).await {
                    errors.push(e);
                }
            }
            owned.remove(&key);
        }

        // Whatever is left over serves flows nobody listens to anymore.
        for output in owned.into_values() {
            if let Err(e) = self.remove_output(&output).await {
                errors.push(e);
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(ReconcileError { errors })
        }
    }

    /// Create the output for `flow` and attach it to the flow object.
    async fn ensure_output(&self, flow: &FlowReference) -> Result<(), StoreError> {
        let output = self.build_output(flow);
        let name = output.name.clone();
        match self.store.create_output(output).await {
            Ok(()) => info!(flow = %flow, output = %name, "created routing output"),
            Err(e) if e.is_already_exists() => {
                debug!(flow = %flow, output = %name, "routing output already present")
            }
            Err(e) => return Err(e),
        }
        self.update_refs(flow, |refs| add_ref(refs, &name)).await
    }

    /// Detach a stale output from its flow and delete it.
    async fn remove_output(&self, output: &OutputObject) -> Result<(), StoreError> {
        let flow = flow_for_output(output);
        match self
            .update_refs(&flow, |refs| remove_ref(refs, &output.name))
            .await
        {
            Ok(()) => {}
            // The flow may be gone entirely; the output still needs
            // deleting.
            Err(e) if e.is_not_found() => {
                debug!(flow = %flow, "flow absent while detaching output")
            }
            Err(e) => return Err(e),
        }
        match self
            .store
            .delete_output(output.scope, &output.namespace, &output.name)
            .await
        {
            Ok(()) => {
                info!(output = %output.name, namespace = %output.namespace, "deleted routing output");
                Ok(())
            }
            Err(e) if e.is_not_found() => Ok(()),
            Err(e) => Err(e),
        }
    }

    async fn update_refs(
        &self,
        flow: &FlowReference,
        edit: impl FnOnce(Vec<String>) -> Vec<String>,
    ) -> Result<(), StoreError> {
        let object = self.store.get_flow(flow).await?;
        let refs = edit(object.global_output_refs);
        self.store.update_flow(flow, refs).await
    }

    fn build_output(&self, flow: &FlowReference) -> OutputObject {
        let scope = match flow.kind {
            FlowKind::ClusterFlow => OutputScope::Cluster,
            FlowKind::Flow => OutputScope::Namespaced,
        };
        let endpoint = format!(
            "{}/{}",
            self.ingest_addr.trim_end_matches('/'),
            flow.url_path()
        );
        OutputObject {
            scope,
            namespace: flow.namespace.clone(),
            name: output_name(&flow.name),
            labels: managed_labels(),
            annotations: BTreeMap::from([(
                FLOW_REF_ANNOTATION.to_string(),
                flow.name.clone(),
            )]),
            spec: HttpOutputSpec::immediate(endpoint),
        }
    }
}

/// Reconstruct the flow reference a managed output serves.
fn flow_for_output(output: &OutputObject) -> FlowReference {
    let kind = match output.scope {
        OutputScope::Cluster => FlowKind::ClusterFlow,
        OutputScope::Namespaced => FlowKind::Flow,
    };
    let name = output.flow_ref().unwrap_or_default().to_string();
    FlowReference {
        kind,
        namespace: output.namespace.clone(),
        name,
    }
}

/// Append `name` unless present.
fn add_ref(mut refs: Vec<String>, name: &str) -> Vec<String> {
    if !refs.iter().any(|r| r == name) {
        refs.push(name.to_string());
    }
    refs
}

/// Remove `name` if present.
fn remove_ref(mut refs: Vec<String>, name: &str) -> Vec<String> {
    refs.retain(|r| r != name);
    refs
}

#[cfg(test)]
#[path = "reconciler_test.rs"]
mod tests;
