use crate::error::EvaluationError;
use crate::graph::{Node, Value};
use ahash::AHashMap;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Evaluated outputs of a node's direct predecessors, keyed by predecessor id.
pub type NodeInputs = BTreeMap<String, Value>;

/// The node kind every default engine knows about.
pub const INPUT_KIND: &str = "input";

/// Defines the contract for evaluating one kind of node.
pub trait NodeEvaluator: Send + Sync {
    /// The `type` string this evaluator is registered under.
    fn kind(&self) -> &str;

    fn evaluate(&self, node: &Node, inputs: &NodeInputs) -> Result<Value, EvaluationError>;
}

/// Ignores upstream inputs and returns the node's declared `value`, 0 when absent.
struct InputEvaluator;

impl NodeEvaluator for InputEvaluator {
    fn kind(&self) -> &str {
        INPUT_KIND
    }

    fn evaluate(&self, node: &Node, _inputs: &NodeInputs) -> Result<Value, EvaluationError> {
        Ok(Value::Number(node.declared_value().unwrap_or(0.0)))
    }
}

/// Adapts a closure into a `NodeEvaluator`.
pub struct FnEvaluator<F> {
    kind: String,
    func: F,
}

impl<F> FnEvaluator<F>
where
    F: Fn(&Node, &NodeInputs) -> Result<Value, EvaluationError> + Send + Sync,
{
    pub fn new(kind: impl Into<String>, func: F) -> Self {
        Self {
            kind: kind.into(),
            func,
        }
    }
}

impl<F> NodeEvaluator for FnEvaluator<F>
where
    F: Fn(&Node, &NodeInputs) -> Result<Value, EvaluationError> + Send + Sync,
{
    fn kind(&self) -> &str {
        &self.kind
    }

    fn evaluate(&self, node: &Node, inputs: &NodeInputs) -> Result<Value, EvaluationError> {
        (self.func)(node, inputs)
    }
}

pub(super) type Registry = AHashMap<String, Arc<dyn NodeEvaluator>>;

pub(super) fn register_default_evaluators(registry: &mut Registry) {
    registry.insert(INPUT_KIND.to_string(), Arc::new(InputEvaluator));
}

pub(super) fn create_evaluator_by_name(name: &str) -> Option<Arc<dyn NodeEvaluator>> {
    match name {
        INPUT_KIND => Some(Arc::new(InputEvaluator)),
        _ => None,
    }
}
