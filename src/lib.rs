//! # Webreal - Workflow Graph Engine and Builder Backend
//!
//! **Webreal** validates and executes node-and-connection workflow graphs, and
//! serves them to a visual workflow editor over HTTP with accounts and SQLite
//! persistence.
//!
//! ## Core Workflow
//!
//! The engine is format-agnostic. It operates on a canonical `GraphDefinition`:
//!
//! 1.  **Load Your Data**: Parse your own graph format into your own Rust structs.
//! 2.  **Convert to Webreal's Model**: Implement `IntoGraph` for your structs.
//! 3.  **Validate**: `validate` rejects duplicate ids, dangling connections and
//!     cycles, and computes a stable topological order.
//! 4.  **Execute**: An `ExecutionEngine` evaluates every node in that order
//!     through the evaluator registered for its kind, and returns an
//!     `ExecutionResult` with per-node outputs and the aggregate.
//!
//! ## Quick Start
//!
//! ```rust
//! use webreal::prelude::*;
//!
//! let graph = GraphDefinition::new(
//!     vec![
//!         Node::new("a", "input").with_value(2.0),
//!         Node::new("b", "input").with_value(3.0),
//!         Node::new("sum", "add"),
//!     ],
//!     vec![Connection::new("a", "sum"), Connection::new("b", "sum")],
//! );
//!
//! // Register an evaluator for the custom "add" kind.
//! let engine = ExecutionEngine::builder()
//!     .with_evaluator_fn("add", |_node, inputs| {
//!         let mut total = 0.0;
//!         for value in inputs.values() {
//!             total += value.as_number().ok_or_else(|| EvaluationError::TypeMismatch {
//!                 operation: "add".to_string(),
//!                 expected: "Number".to_string(),
//!                 found: value.clone(),
//!             })?;
//!         }
//!         Ok(Value::Number(total))
//!     })
//!     .build();
//!
//! let result = engine.execute(graph);
//! assert!(result.success);
//! assert_eq!(result.aggregate, Some(5.0));
//! assert_eq!(result.per_node["sum"], Value::Number(5.0));
//! ```
//!
//! Failures never panic; they come back as `success: false` with a stable
//! error code:
//!
//! ```rust
//! use webreal::prelude::*;
//!
//! let graph = GraphDefinition::new(
//!     vec![Node::new("a", "input")],
//!     vec![Connection::new("a", "ghost")],
//! );
//! let result = ExecutionEngine::default().execute(graph);
//! assert!(!result.success);
//! assert_eq!(result.error.unwrap().code, "dangling_reference");
//! ```

pub mod config;
pub mod engine;
pub mod error;
pub mod graph;
pub mod http;
pub mod prelude;
pub mod store;
