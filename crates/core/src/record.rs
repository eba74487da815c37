//! Log records
//!
//! A `Record` is one log line as received on the ingest path: the raw
//! bytes exactly as posted (what listeners ultimately receive) plus the
//! decoded metadata used for policy evaluation. Records that fail to
//! decode are rejected at ingest and never reach the hub.

use std::collections::HashMap;

use bytes::Bytes;
use serde::Deserialize;

use crate::flow::FlowReference;

/// One parsed log record bound for a specific flow.
#[derive(Debug, Clone)]
pub struct Record {
    /// The original line exactly as received. This is what gets written
    /// to listeners and what byte accounting is based on.
    pub raw: Bytes,
    /// Decoded metadata, used only for policy evaluation.
    pub data: RecordData,
    /// The pipeline this record was posted to.
    pub flow: FlowReference,
}

impl Record {
    /// Decode a raw line into a record.
    ///
    /// The line must be a JSON object; fields beyond the known metadata
    /// are ignored.
    pub fn parse(raw: Bytes, flow: FlowReference) -> Result<Self, serde_json::Error> {
        let data: RecordData = serde_json::from_slice(&raw)?;
        Ok(Self { raw, data, flow })
    }
}

/// The subset of the record payload the service interprets.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RecordData {
    #[serde(default)]
    pub kubernetes: KubernetesMetadata,
}

/// Pod metadata attached to a record by the upstream aggregator.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct KubernetesMetadata {
    /// Pod labels. Access rules ride along here under `rbac/` keys.
    #[serde(default)]
    pub labels: HashMap<String, String>,
    #[serde(default)]
    pub pod_name: String,
}

#[cfg(test)]
#[path = "record_test.rs"]
mod tests;
