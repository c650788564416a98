//! Common test utilities for building graphs and engines.
use webreal::prelude::*;

#[allow(dead_code)]
pub fn input(id: &str, value: f64) -> Node {
    Node::new(id, "input").with_value(value)
}

#[allow(dead_code)]
pub fn edge(from: &str, to: &str) -> Connection {
    Connection::new(from, to)
}

#[allow(dead_code)]
pub fn graph(nodes: Vec<Node>, connections: Vec<Connection>) -> GraphDefinition {
    GraphDefinition::new(nodes, connections)
}

/// `a(5) -> double -> report`, with `b(3)` on the side.
///
/// Aggregate over the `input` nodes is 8.
#[allow(dead_code)]
pub fn create_pipeline_graph() -> GraphDefinition {
    graph(
        vec![
            Node::new("report", "sum"),
            input("a", 5.0),
            Node::new("double", "scale").with_config("factor", serde_json::json!(2)),
            input("b", 3.0),
        ],
        vec![edge("a", "double"), edge("double", "report"), edge("b", "report")],
    )
}

/// Engine with `sum` (adds all inputs) and `scale` (multiplies its single
/// input by `config.factor`) registered on top of the defaults.
#[allow(dead_code)]
pub fn create_arithmetic_engine() -> ExecutionEngine {
    ExecutionEngine::builder()
        .with_evaluator_fn("sum", |_node, inputs| {
            inputs.values().try_fold(0.0, |acc, v| {
                v.as_number()
                    .map(|n| acc + n)
                    .ok_or_else(|| EvaluationError::TypeMismatch {
                        operation: "sum".to_string(),
                        expected: "Number".to_string(),
                        found: v.clone(),
                    })
            })
            .map(Value::Number)
        })
        .with_evaluator_fn("scale", |node, inputs| {
            let factor = node
                .config
                .get("factor")
                .and_then(|f| f.as_f64())
                .ok_or_else(|| EvaluationError::InvalidConfig("factor must be a number".to_string()))?;
            let input = inputs
                .values()
                .next()
                .and_then(Value::as_number)
                .ok_or_else(|| EvaluationError::InputNotFound("value".to_string()))?;
            Ok(Value::Number(input * factor))
        })
        .build()
}

/// A chain of `count` input nodes, `n0 -> n1 -> ...`, declared in reverse.
#[allow(dead_code)]
pub fn create_reversed_chain(count: usize) -> GraphDefinition {
    let nodes = (0..count)
        .rev()
        .map(|i| input(&format!("n{}", i), i as f64))
        .collect();
    let connections = (1..count)
        .map(|i| edge(&format!("n{}", i - 1), &format!("n{}", i)))
        .collect();
    graph(nodes, connections)
}
