//! Flow identity
//!
//! A `FlowReference` names one logical log pipeline in the upstream
//! orchestrator. Pipelines come in two scopes: namespaced (`flow`) and
//! cluster-wide (`clusterflow`). References are used as map keys, as
//! routing labels, and as URL path segments on both service endpoints.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Scope of a log pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FlowKind {
    Flow,
    ClusterFlow,
}

impl FlowKind {
    /// The token used in URL paths and metric labels.
    pub fn as_str(&self) -> &'static str {
        match self {
            FlowKind::Flow => "flow",
            FlowKind::ClusterFlow => "clusterflow",
        }
    }
}

impl fmt::Display for FlowKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FlowKind {
    type Err = FlowPathError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "flow" => Ok(FlowKind::Flow),
            "clusterflow" => Ok(FlowKind::ClusterFlow),
            other => Err(FlowPathError::InvalidKind(other.to_string())),
        }
    }
}

/// Reference to one log pipeline.
///
/// Equality is structural; the reference doubles as a map key in the hub
/// and the reconciler. `namespace` and `name` are non-empty for any
/// reference produced by [`FlowReference::parse_path`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FlowReference {
    pub kind: FlowKind,
    pub namespace: String,
    pub name: String,
}

impl FlowReference {
    pub fn new(kind: FlowKind, namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            kind,
            namespace: namespace.into(),
            name: name.into(),
        }
    }

    /// Parse a URL path of the form `/{kind}/{namespace}/{name}`.
    ///
    /// Leading and trailing slashes are trimmed; exactly three non-empty
    /// segments must remain.
    pub fn parse_path(path: &str) -> Result<Self, FlowPathError> {
        let trimmed = path.trim_matches('/');
        let mut segments = trimmed.split('/');
        match (segments.next(), segments.next(), segments.next(), segments.next()) {
            (Some(kind), Some(namespace), Some(name), None)
                if !namespace.is_empty() && !name.is_empty() =>
            {
                Ok(Self::new(kind.parse::<FlowKind>()?, namespace, name))
            }
            _ => Err(FlowPathError::InvalidPath),
        }
    }

    /// Path form of the reference: `kind/namespace/name`.
    pub fn url_path(&self) -> String {
        format!("{}/{}/{}", self.kind, self.namespace, self.name)
    }
}

impl fmt::Display for FlowReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.kind, self.namespace, self.name)
    }
}

/// Errors from parsing a flow reference out of a URL path.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum FlowPathError {
    #[error("URL path is not a valid flow reference")]
    InvalidPath,

    #[error("invalid flow kind: {0:?}")]
    InvalidKind(String),
}

#[cfg(test)]
#[path = "flow_test.rs"]
mod tests;
