//! Tests for flow references

use super::*;

#[test]
fn test_parse_path_namespaced_flow() {
    let flow = FlowReference::parse_path("/flow/ns1/f1").unwrap();
    assert_eq!(flow.kind, FlowKind::Flow);
    assert_eq!(flow.namespace, "ns1");
    assert_eq!(flow.name, "f1");
}

#[test]
fn test_parse_path_cluster_flow() {
    let flow = FlowReference::parse_path("clusterflow/_/g1").unwrap();
    assert_eq!(flow.kind, FlowKind::ClusterFlow);
    assert_eq!(flow.namespace, "_");
    assert_eq!(flow.name, "g1");
}

#[test]
fn test_parse_path_trims_slashes() {
    let flow = FlowReference::parse_path("//flow/ns1/f1//").unwrap();
    assert_eq!(flow, FlowReference::new(FlowKind::Flow, "ns1", "f1"));
}

#[test]
fn test_parse_path_rejects_wrong_segment_count() {
    assert_eq!(
        FlowReference::parse_path("/flow/ns1"),
        Err(FlowPathError::InvalidPath)
    );
    assert_eq!(
        FlowReference::parse_path("/flow/ns1/f1/extra"),
        Err(FlowPathError::InvalidPath)
    );
    assert_eq!(FlowReference::parse_path("/"), Err(FlowPathError::InvalidPath));
}

#[test]
fn test_parse_path_rejects_unknown_kind() {
    assert_eq!(
        FlowReference::parse_path("/pipeline/ns1/f1"),
        Err(FlowPathError::InvalidKind("pipeline".into()))
    );
}

#[test]
fn test_parse_path_rejects_empty_segments() {
    assert_eq!(
        FlowReference::parse_path("/flow//f1"),
        Err(FlowPathError::InvalidPath)
    );
}

#[test]
fn test_url_path_round_trip() {
    let flow = FlowReference::new(FlowKind::ClusterFlow, "ns2", "g1");
    assert_eq!(flow.url_path(), "clusterflow/ns2/g1");
    assert_eq!(FlowReference::parse_path(&flow.url_path()).unwrap(), flow);
}

#[test]
fn test_kind_tokens() {
    assert_eq!("flow".parse::<FlowKind>().unwrap(), FlowKind::Flow);
    assert_eq!(
        "clusterflow".parse::<FlowKind>().unwrap(),
        FlowKind::ClusterFlow
    );
    assert!("Flow".parse::<FlowKind>().is_err());
}
