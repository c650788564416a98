//! End-to-end execution tests.
mod common;
use common::*;
use webreal::prelude::*;

#[cfg(test)]
mod scenario_tests {
    use super::*;

    #[test]
    fn test_independent_inputs_are_summed() {
        let result = ExecutionEngine::default().execute(graph(
            vec![input("a", 5.0), input("b", 3.0)],
            vec![],
        ));

        assert!(result.success);
        assert_eq!(result.aggregate, Some(8.0));
        assert_eq!(result.per_node.len(), 2);
        assert_eq!(result.per_node["a"], Value::Number(5.0));
        assert_eq!(result.per_node["b"], Value::Number(3.0));
        assert!(result.error.is_none());
    }

    #[test]
    fn test_input_without_value_is_zero() {
        let result =
            ExecutionEngine::default().execute(graph(vec![Node::new("a", "input")], vec![]));

        assert!(result.success);
        assert_eq!(result.aggregate, Some(0.0));
        assert_eq!(result.per_node["a"], Value::Number(0.0));
    }

    #[test]
    fn test_cycle_fails_before_evaluation() {
        let result = ExecutionEngine::default().execute(graph(
            vec![input("a", 1.0), input("b", 2.0)],
            vec![edge("a", "b"), edge("b", "a")],
        ));

        assert!(!result.success);
        assert_eq!(result.aggregate, None);
        assert!(result.per_node.is_empty());
        let error = result.error.unwrap();
        assert_eq!(error.kind, ErrorKind::CycleDetected);
        assert_eq!(error.code, "cycle_detected");
        assert_eq!(error.node_ids, vec!["a", "b"]);
    }

    #[test]
    fn test_dangling_reference_names_missing_node() {
        let result = ExecutionEngine::default().execute(graph(
            vec![input("a", 1.0)],
            vec![edge("a", "x")],
        ));

        assert!(!result.success);
        let error = result.error.unwrap();
        assert_eq!(error.kind, ErrorKind::DanglingReference);
        assert_eq!(error.node_ids, vec!["x"]);
        assert!(error.message.contains("'x'"));
    }

    #[test]
    fn test_unknown_kind_keeps_partial_results() {
        let result = ExecutionEngine::default().execute(graph(
            vec![input("a", 1.0), Node::new("m", "mystery"), input("b", 2.0)],
            vec![edge("a", "m"), edge("m", "b")],
        ));

        assert!(!result.success);
        assert_eq!(result.aggregate, None);
        let error = result.error.as_ref().unwrap();
        assert_eq!(error.kind, ErrorKind::UnknownNodeKind);
        assert_eq!(error.code, "unknown_node_kind");
        assert_eq!(error.node_ids, vec!["m"]);

        // Only `a` ran before `m`.
        assert_eq!(result.per_node.len(), 1);
        assert_eq!(result.per_node["a"], Value::Number(1.0));
    }

    #[test]
    fn test_aggregate_overflow_fails_the_run() {
        let result = ExecutionEngine::default().execute(graph(
            vec![input("a", 1e308), input("b", 1e308)],
            vec![],
        ));

        assert!(!result.success);
        assert_eq!(result.aggregate, None);
        let error = result.error.as_ref().unwrap();
        assert_eq!(error.kind, ErrorKind::NodeEvaluationFailed);
        assert_eq!(error.node_ids, vec!["b"]);
        assert_eq!(result.per_node.len(), 1);
        assert_eq!(result.per_node["a"], Value::Number(1e308));

        let wire = serde_json::to_value(&result).unwrap();
        assert_eq!(wire["success"], false);
        assert_eq!(wire["perNode"]["a"], 1e308);
    }

    #[test]
    fn test_empty_graph_succeeds_with_zero() {
        let result = ExecutionEngine::default().execute(GraphDefinition::default());
        assert!(result.success);
        assert_eq!(result.aggregate, Some(0.0));
        assert!(result.per_node.is_empty());
    }

    #[test]
    fn test_execution_is_idempotent() {
        let engine = create_arithmetic_engine();
        let first = engine.execute(create_pipeline_graph());
        let second = engine.execute(create_pipeline_graph());
        assert_eq!(first, second);

        let failing = graph(vec![input("a", 1.0)], vec![edge("a", "a")]);
        assert_eq!(engine.execute(failing.clone()), engine.execute(failing));
    }
}

#[cfg(test)]
mod registry_tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_custom_evaluators_see_predecessor_outputs() {
        let result = create_arithmetic_engine().execute(create_pipeline_graph());

        assert!(result.success, "{:?}", result.error);
        assert_eq!(result.per_node["double"], Value::Number(10.0));
        assert_eq!(result.per_node["report"], Value::Number(13.0));
        // Only `input` nodes count toward the aggregate.
        assert_eq!(result.aggregate, Some(8.0));
    }

    #[test]
    fn test_evaluator_failure_is_reported() {
        let g = graph(
            vec![input("a", 4.0), Node::new("double", "scale")],
            vec![edge("a", "double")],
        );
        let result = create_arithmetic_engine().execute(g);

        assert!(!result.success);
        let error = result.error.unwrap();
        assert_eq!(error.kind, ErrorKind::NodeEvaluationFailed);
        assert_eq!(error.code, "node_evaluation_failed");
        assert!(error.message.contains("factor must be a number"));
        assert_eq!(result.per_node.len(), 1);
    }

    #[test]
    fn test_engines_have_independent_registries() {
        let plain = ExecutionEngine::default();
        let arithmetic = create_arithmetic_engine();

        assert!(!plain.has_kind("sum"));
        assert!(arithmetic.has_kind("sum"));
        assert_eq!(plain.kinds(), vec!["input"]);
        assert_eq!(arithmetic.kinds(), vec!["input", "scale", "sum"]);

        let result = plain.execute(create_pipeline_graph());
        assert_eq!(result.error.unwrap().kind, ErrorKind::UnknownNodeKind);
    }

    #[test]
    fn test_empty_builder_has_no_input_kind() {
        let engine = ExecutionEngineBuilder::empty().build();
        assert!(engine.kinds().is_empty());

        let result = engine.execute(graph(vec![input("a", 1.0)], vec![]));
        assert_eq!(result.error.unwrap().kind, ErrorKind::UnknownNodeKind);
    }

    #[test]
    fn test_alias_counts_toward_aggregate() {
        let engine = ExecutionEngine::builder()
            .with_kind_alias("number", "input")
            .with_kind_alias("constant", "number")
            .build();
        let g = graph(
            vec![
                Node::new("a", "number").with_value(1.5),
                Node::new("b", "constant").with_value(2.5),
            ],
            vec![],
        );

        let result = engine.execute(g);
        assert!(result.success);
        assert_eq!(result.aggregate, Some(4.0));
    }

    #[test]
    fn test_alias_to_unknown_kind_is_ignored() {
        let engine = ExecutionEngine::builder()
            .with_kind_alias("number", "nonexistent")
            .build();
        assert!(!engine.has_kind("number"));
    }

    #[test]
    fn test_overriding_input_with_non_number_fails_aggregate() {
        let engine = ExecutionEngine::builder()
            .with_evaluator_fn(INPUT_KIND, |_, _| Ok(Value::Bool(true)))
            .build();
        let result = engine.execute(graph(vec![input("a", 1.0)], vec![]));

        assert!(!result.success);
        let error = result.error.unwrap();
        assert_eq!(error.kind, ErrorKind::NodeEvaluationFailed);
        assert_eq!(error.node_ids, vec!["a"]);
        assert!(result.per_node.is_empty());
    }

    #[test]
    fn test_non_finite_outputs_are_rejected() {
        for bad in [f64::INFINITY, f64::NEG_INFINITY, f64::NAN] {
            let engine = ExecutionEngine::builder()
                .with_evaluator_fn("broken", move |_, _| Ok(Value::Number(bad)))
                .build();
            let result = engine.execute(graph(
                vec![input("a", 1.0), Node::new("x", "broken")],
                vec![edge("a", "x")],
            ));

            assert!(!result.success, "{} was accepted", bad);
            let error = result.error.unwrap();
            assert_eq!(error.kind, ErrorKind::NodeEvaluationFailed);
            assert_eq!(error.node_ids, vec!["x"]);
            assert!(error.message.contains("not a finite number"));
            assert!(!result.per_node.contains_key("x"));
        }
    }

    struct CountingEvaluator {
        calls: Arc<AtomicUsize>,
    }

    impl NodeEvaluator for CountingEvaluator {
        fn kind(&self) -> &str {
            "count"
        }

        fn evaluate(&self, _node: &Node, inputs: &NodeInputs) -> Result<Value, EvaluationError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(Value::Number(inputs.len() as f64))
        }
    }

    #[test]
    fn test_trait_evaluator_runs_once_per_node() {
        let calls = Arc::new(AtomicUsize::new(0));
        let engine = ExecutionEngine::builder()
            .with_evaluator(Box::new(CountingEvaluator {
                calls: calls.clone(),
            }))
            .build();
        let g = graph(
            vec![
                input("a", 1.0),
                input("b", 1.0),
                Node::new("c1", "count"),
                Node::new("c2", "count"),
            ],
            vec![edge("a", "c1"), edge("b", "c1"), edge("c1", "c2")],
        );

        let result = engine.execute(g);
        assert!(result.success);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(result.per_node["c1"], Value::Number(2.0));
        assert_eq!(result.per_node["c2"], Value::Number(1.0));
    }

    #[test]
    fn test_validated_graph_can_be_reused() {
        let engine = create_arithmetic_engine();
        let validated = validate(create_pipeline_graph()).unwrap();
        assert_eq!(
            engine.execute_validated(&validated),
            engine.execute_validated(&validated)
        );
        assert_eq!(validated.into_inner(), create_pipeline_graph());
    }
}

#[cfg(test)]
mod result_format_tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_success_serializes_in_camel_case() {
        let result = ExecutionEngine::default().execute(graph(
            vec![input("a", 5.0), input("b", 3.0)],
            vec![],
        ));
        assert_eq!(
            serde_json::to_value(&result).unwrap(),
            json!({
                "success": true,
                "aggregate": 8.0,
                "perNode": {"a": 5.0, "b": 3.0}
            })
        );
    }

    #[test]
    fn test_result_reads_back_from_json() {
        let result = create_arithmetic_engine().execute(create_pipeline_graph());
        let text = serde_json::to_string(&result).unwrap();
        let back: ExecutionResult = serde_json::from_str(&text).unwrap();
        assert_eq!(back, result);
    }

    #[test]
    fn test_failure_serializes_error_info() {
        let result = ExecutionEngine::default().execute(graph(
            vec![input("a", 1.0), input("a", 2.0)],
            vec![],
        ));
        let value = serde_json::to_value(&result).unwrap();
        assert_eq!(value["success"], json!(false));
        assert_eq!(value["aggregate"], json!(null));
        assert_eq!(value["error"]["kind"], json!("DuplicateId"));
        assert_eq!(value["error"]["code"], json!("duplicate_id"));
        assert_eq!(value["error"]["nodeIds"], json!(["a"]));
    }
}
