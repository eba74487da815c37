//! Tests for the convergence logic

use std::sync::Arc;

use logtap_core::{FlowKind, FlowReference, ReconcileEvent};

use super::*;
use crate::memory::MemoryRoutingStore;
use crate::store::{MANAGED_BY_LABEL_KEY, MANAGED_BY_LABEL_VALUE};

fn flow(name: &str) -> FlowReference {
    FlowReference::new(FlowKind::Flow, "ns1", name)
}

fn cluster_flow(name: &str) -> FlowReference {
    FlowReference::new(FlowKind::ClusterFlow, "_", name)
}

fn event(requests: Vec<FlowReference>) -> ReconcileEvent {
    ReconcileEvent { requests }
}

fn setup(flows: &[FlowReference]) -> (Arc<MemoryRoutingStore>, Reconciler) {
    let store = Arc::new(MemoryRoutingStore::new());
    for f in flows {
        store.insert_flow(f.clone());
    }
    let reconciler = Reconciler::new("http://logtap.default.svc:10000", Arc::clone(&store) as Arc<dyn RoutingStore>);
    (store, reconciler)
}

#[tokio::test]
async fn test_requested_flow_gains_output_and_reference() {
    let f1 = flow("f1");
    let (store, reconciler) = setup(&[f1.clone()]);

    reconciler.reconcile(&event(vec![f1.clone()])).await.unwrap();

    let output = store.get_output("ns1", "f1-tailer").expect("output created");
    assert_eq!(output.scope, OutputScope::Namespaced);
    assert_eq!(output.flow_ref(), Some("f1"));
    assert_eq!(
        output.labels.get(MANAGED_BY_LABEL_KEY).map(String::as_str),
        Some(MANAGED_BY_LABEL_VALUE)
    );
    assert_eq!(
        output.spec.endpoint,
        "http://logtap.default.svc:10000/flow/ns1/f1"
    );
    assert_eq!(output.spec.format, "json");
    assert_eq!(output.spec.buffer, "memory");
    assert_eq!(output.spec.flush_mode, "immediate");
    assert_eq!(store.flow_refs(&f1).unwrap(), vec!["f1-tailer"]);
}

#[tokio::test]
async fn test_cluster_flow_gets_cluster_scoped_output() {
    let g1 = cluster_flow("g1");
    let (store, reconciler) = setup(&[g1.clone()]);

    reconciler.reconcile(&event(vec![g1.clone()])).await.unwrap();

    let output = store.get_output("_", "g1-tailer").expect("output created");
    assert_eq!(output.scope, OutputScope::Cluster);
    assert_eq!(
        output.spec.endpoint,
        "http://logtap.default.svc:10000/clusterflow/_/g1"
    );
    assert_eq!(store.flow_refs(&g1).unwrap(), vec!["g1-tailer"]);
}

#[tokio::test]
async fn test_trailing_slash_in_ingest_addr_is_trimmed() {
    let f1 = flow("f1");
    let store = Arc::new(MemoryRoutingStore::new());
    store.insert_flow(f1.clone());
    let reconciler = Reconciler::new(
        "http://logtap.default.svc:10000/",
        Arc::clone(&store) as Arc<dyn RoutingStore>,
    );

    reconciler.reconcile(&event(vec![f1])).await.unwrap();
    assert_eq!(
        store.get_output("ns1", "f1-tailer").unwrap().spec.endpoint,
        "http://logtap.default.svc:10000/flow/ns1/f1"
    );
}

#[tokio::test]
async fn test_reconcile_twice_is_idempotent() {
    let f1 = flow("f1");
    let (store, reconciler) = setup(&[f1.clone()]);
    let ev = event(vec![f1.clone()]);

    reconciler.reconcile(&ev).await.unwrap();
    let keys_before = store.output_keys();
    let refs_before = store.flow_refs(&f1).unwrap();
    let output_before = store.get_output("ns1", "f1-tailer").unwrap();

    reconciler.reconcile(&ev).await.unwrap();
    assert_eq!(store.output_keys(), keys_before);
    assert_eq!(store.flow_refs(&f1).unwrap(), refs_before);
    assert_eq!(store.get_output("ns1", "f1-tailer").unwrap(), output_before);
}

#[tokio::test]
async fn test_stray_output_is_detached_and_deleted() {
    // World: a leftover managed output in ns2 attached to flow "old",
    // plus the newly requested flow in ns1.
    let f1 = flow("f1");
    let old = FlowReference::new(FlowKind::Flow, "ns2", "old");
    let (store, reconciler) = setup(&[f1.clone(), old.clone()]);

    reconciler.reconcile(&event(vec![old.clone()])).await.unwrap();
    assert_eq!(store.flow_refs(&old).unwrap(), vec!["old-tailer"]);

    reconciler.reconcile(&event(vec![f1.clone()])).await.unwrap();

    assert_eq!(
        store.output_keys(),
        vec![("ns1".to_string(), "f1-tailer".to_string())]
    );
    assert_eq!(store.flow_refs(&f1).unwrap(), vec!["f1-tailer"]);
    assert!(store.flow_refs(&old).unwrap().is_empty(), "stale ref detached");
}

#[tokio::test]
async fn test_empty_request_set_cleans_up_everything() {
    let f1 = flow("f1");
    let (store, reconciler) = setup(&[f1.clone()]);

    reconciler.reconcile(&event(vec![f1.clone()])).await.unwrap();
    reconciler.reconcile(&event(vec![])).await.unwrap();

    assert!(store.output_keys().is_empty());
    assert!(store.flow_refs(&f1).unwrap().is_empty());
}

#[tokio::test]
async fn test_preexisting_output_still_gets_attached() {
    // The output exists (e.g. an earlier pass died between create and
    // attach) but the flow does not reference it yet. The create is
    // skipped as already-existing and the reference is still added.
    let f1 = flow("f1");
    let (store, reconciler) = setup(&[f1.clone()]);

    reconciler.reconcile(&event(vec![f1.clone()])).await.unwrap();
    store.update_flow(&f1, Vec::new()).await.unwrap();

    // The owned map shields existing outputs from re-creation, so drop
    // the label to simulate an unmanaged duplicate name.
    let mut orphan = store.get_output("ns1", "f1-tailer").unwrap();
    orphan.labels.clear();
    store.insert_output(orphan);

    reconciler.reconcile(&event(vec![f1.clone()])).await.unwrap();
    assert_eq!(store.flow_refs(&f1).unwrap(), vec!["f1-tailer"]);
}

#[tokio::test]
async fn test_missing_flow_on_cleanup_still_deletes_output() {
    // A stray managed output whose flow no longer exists anywhere: the
    // detach is skipped as not-found and the delete still happens.
    let gone = flow("gone");
    let staging = setup(&[gone.clone()]);
    staging.1.reconcile(&event(vec![gone.clone()])).await.unwrap();
    let stray = staging.0.get_output("ns1", "gone-tailer").unwrap();

    let (store, reconciler) = setup(&[]);
    store.insert_output(stray);

    reconciler.reconcile(&event(vec![])).await.unwrap();
    assert!(store.output_keys().is_empty(), "output deleted despite missing flow");
}

#[tokio::test]
async fn test_missing_flow_on_ensure_is_an_error() {
    // Creating the output succeeds, attaching it cannot: the error
    // surfaces so the driver retries, and the output stays for the next
    // pass to finish wiring.
    let f1 = flow("f1");
    let (store, reconciler) = setup(&[]);

    let err = reconciler
        .reconcile(&event(vec![f1.clone()]))
        .await
        .expect_err("attach against a missing flow must fail");
    assert_eq!(err.errors.len(), 1);
    assert!(err.errors[0].is_not_found());
    assert!(store.get_output("ns1", "f1-tailer").is_some());
}
