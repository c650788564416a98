use crate::error::{EvaluationError, ExecutionError};
use crate::graph::{GraphDefinition, Node, ValidatedGraph, Value, validate};
use ahash::AHashMap;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, trace};

mod registry;
mod result;

pub use registry::{FnEvaluator, INPUT_KIND, NodeEvaluator, NodeInputs};
pub use result::{ErrorInfo, ExecutionResult};

use registry::{Registry, create_evaluator_by_name, register_default_evaluators};

/// Evaluates workflow graphs against a registry of node-kind evaluators.
///
/// Each engine owns its registry, so engines with different node kinds can
/// coexist. An engine holds no per-run state: it can be shared across threads
/// and executing the same graph twice yields the same result.
pub struct ExecutionEngine {
    registry: Registry,
    /// user kind -> registered kind it was mapped onto
    aliases: AHashMap<String, String>,
}

pub struct ExecutionEngineBuilder {
    registry: Registry,
    aliases: AHashMap<String, String>,
}

impl ExecutionEngineBuilder {
    pub fn new() -> Self {
        let mut registry: Registry = AHashMap::new();
        register_default_evaluators(&mut registry);
        Self {
            registry,
            aliases: AHashMap::new(),
        }
    }

    /// Starts from an empty registry, without the `input` kind.
    pub fn empty() -> Self {
        Self {
            registry: AHashMap::new(),
            aliases: AHashMap::new(),
        }
    }

    /// Lets nodes of `user_kind` be evaluated as `registered_kind`.
    ///
    /// `registered_kind` may be any kind already registered on this builder or
    /// a built-in one. Unknown targets are ignored.
    pub fn with_kind_alias(mut self, user_kind: &str, registered_kind: &str) -> Self {
        let evaluator = self
            .registry
            .get(registered_kind)
            .cloned()
            .or_else(|| create_evaluator_by_name(registered_kind));
        if let Some(evaluator) = evaluator {
            let canonical = self
                .aliases
                .get(registered_kind)
                .cloned()
                .unwrap_or_else(|| registered_kind.to_string());
            self.registry.insert(user_kind.to_string(), evaluator);
            self.aliases.insert(user_kind.to_string(), canonical);
        }
        self
    }

    pub fn with_evaluator(mut self, evaluator: Box<dyn NodeEvaluator>) -> Self {
        let kind = evaluator.kind().to_string();
        self.aliases.remove(&kind);
        self.registry.insert(kind, Arc::from(evaluator));
        self
    }

    pub fn with_evaluator_fn<F>(self, kind: &str, func: F) -> Self
    where
        F: Fn(&Node, &NodeInputs) -> Result<Value, EvaluationError> + Send + Sync + 'static,
    {
        self.with_evaluator(Box::new(FnEvaluator::new(kind, func)))
    }

    pub fn build(self) -> ExecutionEngine {
        ExecutionEngine {
            registry: self.registry,
            aliases: self.aliases,
        }
    }
}

impl Default for ExecutionEngineBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl Default for ExecutionEngine {
    fn default() -> Self {
        ExecutionEngineBuilder::new().build()
    }
}

impl ExecutionEngine {
    pub fn builder() -> ExecutionEngineBuilder {
        ExecutionEngineBuilder::new()
    }

    pub fn has_kind(&self, kind: &str) -> bool {
        self.registry.contains_key(kind)
    }

    /// Registered kinds, sorted.
    pub fn kinds(&self) -> Vec<&str> {
        let mut kinds: Vec<&str> = self.registry.keys().map(String::as_str).collect();
        kinds.sort_unstable();
        kinds
    }

    /// Validates and evaluates a graph.
    ///
    /// Never panics on bad input: structural problems and evaluator failures
    /// are reported through `success: false` and `error`.
    pub fn execute(&self, graph: GraphDefinition) -> ExecutionResult {
        match validate(graph) {
            Ok(validated) => self.execute_validated(&validated),
            Err(e) => {
                debug!(error = %e, "graph rejected");
                ExecutionResult::failed(BTreeMap::new(), &ExecutionError::Graph(e))
            }
        }
    }

    /// Evaluates every node in dependency order.
    pub fn execute_validated(&self, graph: &ValidatedGraph) -> ExecutionResult {
        let mut per_node: BTreeMap<String, Value> = BTreeMap::new();
        let mut aggregate = 0.0;

        for (node, predecessors) in graph.evaluation_plan() {
            let inputs: NodeInputs = predecessors
                .iter()
                .filter_map(|p| per_node.get(&p.id).map(|v| (p.id.clone(), v.clone())))
                .collect();

            let output = match self.evaluate_node(node, &inputs) {
                Ok(output) => output,
                Err(e) => {
                    debug!(node_id = %node.id, error = %e, "execution aborted");
                    return ExecutionResult::failed(per_node, &e);
                }
            };
            trace!(node_id = %node.id, kind = %node.kind, %output, "node evaluated");

            // JSON has no encoding for inf/NaN.
            if output.as_number().is_some_and(|n| !n.is_finite()) {
                let e = non_finite(node, format!("output {} is not a finite number", output));
                return ExecutionResult::failed(per_node, &e);
            }

            if self.canonical_kind(&node.kind) == INPUT_KIND {
                match output.as_number() {
                    Some(n) if (aggregate + n).is_finite() => aggregate += n,
                    Some(n) => {
                        let e = non_finite(
                            node,
                            format!("adding {} overflows the aggregate {}", n, aggregate),
                        );
                        return ExecutionResult::failed(per_node, &e);
                    }
                    None => {
                        let e = ExecutionError::NodeEvaluationFailed {
                            node_id: node.id.clone(),
                            cause: EvaluationError::TypeMismatch {
                                operation: "aggregate".to_string(),
                                expected: "Number".to_string(),
                                found: output,
                            },
                        };
                        return ExecutionResult::failed(per_node, &e);
                    }
                }
            }
            per_node.insert(node.id.clone(), output);
        }

        debug!(nodes = per_node.len(), aggregate, "execution finished");
        ExecutionResult::succeeded(aggregate, per_node)
    }

    fn evaluate_node(&self, node: &Node, inputs: &NodeInputs) -> Result<Value, ExecutionError> {
        let evaluator =
            self.registry
                .get(&node.kind)
                .ok_or_else(|| ExecutionError::UnknownNodeKind {
                    node_id: node.id.clone(),
                    kind: node.kind.clone(),
                })?;

        evaluator
            .evaluate(node, inputs)
            .map_err(|cause| ExecutionError::NodeEvaluationFailed {
                node_id: node.id.clone(),
                cause,
            })
    }

    fn canonical_kind<'a>(&'a self, kind: &'a str) -> &'a str {
        self.aliases.get(kind).map(String::as_str).unwrap_or(kind)
    }
}

fn non_finite(node: &Node, message: String) -> ExecutionError {
    ExecutionError::NodeEvaluationFailed {
        node_id: node.id.clone(),
        cause: EvaluationError::Failed(message),
    }
}
