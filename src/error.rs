use crate::graph::Value;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Structural problems detected while validating a graph, before any node runs.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GraphError {
    #[error("Node id '{0}' is declared more than once")]
    DuplicateId(String),

    #[error("Connection #{connection_index} references node '{node_id}', which does not exist")]
    DanglingReference {
        node_id: String,
        connection_index: usize,
    },

    #[error("Connections form a cycle through nodes [{}]", .node_ids.join(", "))]
    CycleDetected { node_ids: Vec<String> },
}

impl GraphError {
    pub fn code(&self) -> &'static str {
        match self {
            GraphError::DuplicateId(_) => "duplicate_id",
            GraphError::DanglingReference { .. } => "dangling_reference",
            GraphError::CycleDetected { .. } => "cycle_detected",
        }
    }

    /// The node ids this error is about.
    pub fn node_ids(&self) -> Vec<String> {
        match self {
            GraphError::DuplicateId(id) => vec![id.clone()],
            GraphError::DanglingReference { node_id, .. } => vec![node_id.clone()],
            GraphError::CycleDetected { node_ids } => node_ids.clone(),
        }
    }
}

/// Errors raised by an individual node evaluator.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EvaluationError {
    #[error(
        "Type mismatch during operation '{operation}': expected {expected}, but found value '{found}'"
    )]
    TypeMismatch {
        operation: String,
        expected: String,
        found: Value,
    },

    #[error("Input '{0}' not found among the node's predecessors")]
    InputNotFound(String),

    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    #[error("{0}")]
    Failed(String),
}

/// Errors that end an execution run. Carried inside a failed `ExecutionResult`.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ExecutionError {
    #[error(transparent)]
    Graph(#[from] GraphError),

    #[error("Node '{node_id}' has an unregistered node type: '{kind}'")]
    UnknownNodeKind { node_id: String, kind: String },

    #[error("Node '{node_id}' failed to evaluate: {cause}")]
    NodeEvaluationFailed {
        node_id: String,
        cause: EvaluationError,
    },
}

impl ExecutionError {
    /// Stable, machine-readable error code.
    pub fn code(&self) -> &'static str {
        match self {
            ExecutionError::Graph(e) => e.code(),
            ExecutionError::UnknownNodeKind { .. } => "unknown_node_kind",
            ExecutionError::NodeEvaluationFailed { .. } => "node_evaluation_failed",
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            ExecutionError::Graph(GraphError::DuplicateId(_)) => ErrorKind::DuplicateId,
            ExecutionError::Graph(GraphError::DanglingReference { .. }) => {
                ErrorKind::DanglingReference
            }
            ExecutionError::Graph(GraphError::CycleDetected { .. }) => ErrorKind::CycleDetected,
            ExecutionError::UnknownNodeKind { .. } => ErrorKind::UnknownNodeKind,
            ExecutionError::NodeEvaluationFailed { .. } => ErrorKind::NodeEvaluationFailed,
        }
    }

    /// The node ids this error is about.
    pub fn node_ids(&self) -> Vec<String> {
        match self {
            ExecutionError::Graph(e) => e.node_ids(),
            ExecutionError::UnknownNodeKind { node_id, .. }
            | ExecutionError::NodeEvaluationFailed { node_id, .. } => vec![node_id.clone()],
        }
    }
}

/// Wire name of an `ExecutionError` variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorKind {
    DuplicateId,
    DanglingReference,
    CycleDetected,
    UnknownNodeKind,
    NodeEvaluationFailed,
}

impl ErrorKind {
    /// Graph errors are the caller's fault; the rest happened while running nodes.
    pub fn is_graph_error(self) -> bool {
        matches!(
            self,
            ErrorKind::DuplicateId | ErrorKind::DanglingReference | ErrorKind::CycleDetected
        )
    }
}

/// Errors that can occur when converting a custom format into a `GraphDefinition`.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GraphConversionError {
    #[error("Invalid graph data: {0}")]
    ValidationError(String),
}

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("Record not found")]
    NotFound,

    #[error("{0}")]
    Conflict(String),

    #[error("Corrupt stored data: {0}")]
    Corrupt(String),
}

impl From<rusqlite::Error> for StoreError {
    fn from(e: rusqlite::Error) -> Self {
        StoreError::Database(e.to_string())
    }
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Could not read config file '{path}': {message}")]
    Read { path: String, message: String },

    #[error("Invalid config: {0}")]
    Parse(String),
}
