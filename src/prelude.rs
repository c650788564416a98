//! Prelude module for convenient imports
//!
//! Re-exports the types needed to build, validate and execute graphs.
//!
//! ```rust
//! use webreal::prelude::*;
//!
//! let graph = GraphDefinition::new(vec![Node::new("a", "input").with_value(1.5)], vec![]);
//! let order = topological_order(&graph)?;
//! assert_eq!(order, vec!["a".to_string()]);
//! # Ok::<(), GraphError>(())
//! ```

// Graph model and validation
pub use crate::graph::{
    Connection, GraphDefinition, IntoGraph, Node, ValidatedGraph, Value, topological_order,
    validate,
};

// Execution
pub use crate::engine::{
    ErrorInfo, ExecutionEngine, ExecutionEngineBuilder, ExecutionResult, FnEvaluator, INPUT_KIND,
    NodeEvaluator, NodeInputs,
};

// Error types
pub use crate::error::{
    ErrorKind, EvaluationError, ExecutionError, GraphConversionError, GraphError,
};

// Persistence
pub use crate::store::{AccountStore, SqliteStore, Workflow, WorkflowDraft, WorkflowStore};
