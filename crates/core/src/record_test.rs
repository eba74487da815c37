//! Tests for record decoding

use bytes::Bytes;

use super::*;
use crate::flow::{FlowKind, FlowReference};

fn flow() -> FlowReference {
    FlowReference::new(FlowKind::Flow, "ns1", "f1")
}

#[test]
fn test_parse_keeps_raw_bytes_verbatim() {
    let line = br#"{"kubernetes":{"labels":{"rbac/alice":"allow"},"pod_name":"p"},"log":"hello"}"#;
    let record = Record::parse(Bytes::from_static(line), flow()).unwrap();
    assert_eq!(&record.raw[..], line);
    assert_eq!(record.data.kubernetes.pod_name, "p");
    assert_eq!(
        record.data.kubernetes.labels.get("rbac/alice"),
        Some(&"allow".to_string())
    );
}

#[test]
fn test_parse_tolerates_missing_metadata() {
    let record = Record::parse(Bytes::from_static(br#"{"log":"no metadata"}"#), flow()).unwrap();
    assert!(record.data.kubernetes.labels.is_empty());
    assert_eq!(record.data.kubernetes.pod_name, "");
}

#[test]
fn test_parse_rejects_invalid_json() {
    assert!(Record::parse(Bytes::from_static(b"not json"), flow()).is_err());
    assert!(Record::parse(Bytes::from_static(b"5"), flow()).is_err());
}
