use crate::error::{ErrorKind, ExecutionError};
use crate::graph::Value;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// The result of one execution run. Produced fresh per request, never stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionResult {
    pub success: bool,
    /// Sum of all `input`-kind node outputs. `None` when the run failed.
    pub aggregate: Option<f64>,
    /// Output of every node evaluated so far. On failure this holds the nodes
    /// that completed before the failing one.
    pub per_node: BTreeMap<String, Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorInfo>,
}

impl ExecutionResult {
    pub(crate) fn succeeded(aggregate: f64, per_node: BTreeMap<String, Value>) -> Self {
        Self {
            success: true,
            aggregate: Some(aggregate),
            per_node,
            error: None,
        }
    }

    pub(crate) fn failed(per_node: BTreeMap<String, Value>, error: &ExecutionError) -> Self {
        Self {
            success: false,
            aggregate: None,
            per_node,
            error: Some(ErrorInfo::from(error)),
        }
    }
}

/// Serializable description of why a run failed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorInfo {
    pub kind: ErrorKind,
    pub code: String,
    pub message: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub node_ids: Vec<String>,
}

impl From<&ExecutionError> for ErrorInfo {
    fn from(error: &ExecutionError) -> Self {
        Self {
            kind: error.kind(),
            code: error.code().to_string(),
            message: error.to_string(),
            node_ids: error.node_ids(),
        }
    }
}
