//! In-memory routing store
//!
//! A complete [`RoutingStore`] over process-local maps. Unit tests drive
//! the reconciler against it, and the service falls back to it when no
//! orchestrator client is configured.

use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use parking_lot::Mutex;

use logtap_core::FlowReference;

use crate::store::{
    FlowObject, OutputObject, OutputScope, RoutingStore, StoreError,
};

#[derive(Debug, Default)]
pub struct MemoryRoutingStore {
    outputs: Mutex<HashMap<(String, String), OutputObject>>,
    flows: Mutex<HashMap<FlowReference, FlowObject>>,
}

impl MemoryRoutingStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a Flow/ClusterFlow with no output references, as the
    /// orchestrator would have it before this service touches it.
    pub fn insert_flow(&self, flow: FlowReference) {
        self.flows.lock().insert(flow, FlowObject::default());
    }

    /// Directly place an output, bypassing create semantics. For
    /// arranging pre-existing world state.
    pub fn insert_output(&self, output: OutputObject) {
        self.outputs
            .lock()
            .insert((output.namespace.clone(), output.name.clone()), output);
    }

    /// Keys of all stored outputs, sorted. Snapshot for assertions.
    pub fn output_keys(&self) -> Vec<(String, String)> {
        let mut keys: Vec<_> = self.outputs.lock().keys().cloned().collect();
        keys.sort();
        keys
    }

    pub fn get_output(&self, namespace: &str, name: &str) -> Option<OutputObject> {
        self.outputs
            .lock()
            .get(&(namespace.to_string(), name.to_string()))
            .cloned()
    }

    /// Current output references of a flow, if it exists.
    pub fn flow_refs(&self, flow: &FlowReference) -> Option<Vec<String>> {
        self.flows
            .lock()
            .get(flow)
            .map(|f| f.global_output_refs.clone())
    }

    fn list_scope(
        &self,
        scope: OutputScope,
        selector: &BTreeMap<String, String>,
    ) -> Vec<OutputObject> {
        self.outputs
            .lock()
            .values()
            .filter(|o| o.scope == scope && o.matches_labels(selector))
            .cloned()
            .collect()
    }
}

#[async_trait]
impl RoutingStore for MemoryRoutingStore {
    async fn list_outputs(
        &self,
        selector: &BTreeMap<String, String>,
    ) -> Result<Vec<OutputObject>, StoreError> {
        Ok(self.list_scope(OutputScope::Namespaced, selector))
    }

    async fn list_cluster_outputs(
        &self,
        selector: &BTreeMap<String, String>,
    ) -> Result<Vec<OutputObject>, StoreError> {
        Ok(self.list_scope(OutputScope::Cluster, selector))
    }

    async fn create_output(&self, output: OutputObject) -> Result<(), StoreError> {
        let key = (output.namespace.clone(), output.name.clone());
        let mut outputs = self.outputs.lock();
        if outputs.contains_key(&key) {
            return Err(StoreError::AlreadyExists {
                kind: "output",
                name: output.name,
            });
        }
        outputs.insert(key, output);
        Ok(())
    }

    async fn delete_output(
        &self,
        _scope: OutputScope,
        namespace: &str,
        name: &str,
    ) -> Result<(), StoreError> {
        let key = (namespace.to_string(), name.to_string());
        match self.outputs.lock().remove(&key) {
            Some(_) => Ok(()),
            None => Err(StoreError::NotFound {
                kind: "output",
                name: name.to_string(),
            }),
        }
    }

    async fn get_flow(&self, flow: &FlowReference) -> Result<FlowObject, StoreError> {
        self.flows
            .lock()
            .get(flow)
            .cloned()
            .ok_or_else(|| StoreError::NotFound {
                kind: "flow",
                name: flow.name.clone(),
            })
    }

    async fn update_flow(
        &self,
        flow: &FlowReference,
        refs: Vec<String>,
    ) -> Result<(), StoreError> {
        let mut flows = self.flows.lock();
        match flows.get_mut(flow) {
            Some(obj) => {
                obj.global_output_refs = refs;
                Ok(())
            }
            None => Err(StoreError::NotFound {
                kind: "flow",
                name: flow.name.clone(),
            }),
        }
    }
}
