//! Validation and ordering of graph definitions.
mod common;
use common::*;
use webreal::prelude::*;

#[cfg(test)]
mod ordering_tests {
    use super::*;

    #[test]
    fn test_unconnected_nodes_keep_declaration_order() {
        let g = graph(
            vec![input("c", 1.0), input("a", 2.0), input("b", 3.0)],
            vec![],
        );
        assert_eq!(topological_order(&g).unwrap(), vec!["c", "a", "b"]);
    }

    #[test]
    fn test_every_connection_points_forward() {
        let g = create_pipeline_graph();
        let order = topological_order(&g).unwrap();
        let position = |id: &str| order.iter().position(|n| n == id).unwrap();

        assert_eq!(order.len(), g.nodes.len());
        for c in &g.connections {
            assert!(
                position(&c.from) < position(&c.to),
                "{} should precede {} in {:?}",
                c.from,
                c.to,
                order
            );
        }
    }

    #[test]
    fn test_reversed_chain_is_reordered() {
        let g = create_reversed_chain(5);
        assert_eq!(
            topological_order(&g).unwrap(),
            vec!["n0", "n1", "n2", "n3", "n4"]
        );
    }

    #[test]
    fn test_ties_broken_by_declaration_order() {
        // Both `x` and `y` depend on `root`; `z` has no constraint at all.
        let g = graph(
            vec![input("y", 0.0), input("z", 0.0), input("root", 0.0), input("x", 0.0)],
            vec![edge("root", "x"), edge("root", "y")],
        );
        assert_eq!(topological_order(&g).unwrap(), vec!["z", "root", "y", "x"]);
    }

    #[test]
    fn test_order_is_stable_across_calls() {
        let g = create_pipeline_graph();
        assert_eq!(topological_order(&g).unwrap(), topological_order(&g).unwrap());
    }

    #[test]
    fn test_validated_graph_exposes_predecessors() {
        let validated = validate(create_pipeline_graph()).unwrap();
        let preds: Vec<&str> = validated
            .predecessors("report")
            .iter()
            .map(|n| n.id.as_str())
            .collect();
        assert_eq!(preds, vec!["double", "b"]);
        assert!(validated.predecessors("a").is_empty());
        assert_eq!(validated.order_ids(), vec!["a", "double", "b", "report"]);
    }

    #[test]
    fn test_empty_graph_is_valid() {
        let validated = validate(GraphDefinition::default()).unwrap();
        assert_eq!(validated.ordered_nodes().count(), 0);
    }
}

#[cfg(test)]
mod validation_tests {
    use super::*;

    #[test]
    fn test_dangling_target_is_rejected() {
        let g = graph(vec![input("a", 1.0)], vec![edge("a", "x")]);
        assert_eq!(
            validate(g).unwrap_err(),
            GraphError::DanglingReference {
                node_id: "x".to_string(),
                connection_index: 0,
            }
        );
    }

    #[test]
    fn test_dangling_source_is_rejected() {
        let g = graph(
            vec![input("a", 1.0), input("b", 1.0)],
            vec![edge("a", "b"), edge("ghost", "b")],
        );
        let err = topological_order(&g).unwrap_err();
        assert_eq!(err.code(), "dangling_reference");
        assert_eq!(err.node_ids(), vec!["ghost"]);
        assert!(err.to_string().contains("#1"));
    }

    #[test]
    fn test_two_node_cycle_is_rejected() {
        let g = graph(
            vec![input("a", 1.0), input("b", 1.0)],
            vec![edge("a", "b"), edge("b", "a")],
        );
        match validate(g) {
            Err(GraphError::CycleDetected { node_ids }) => assert_eq!(node_ids, vec!["a", "b"]),
            other => panic!("expected a cycle, got {:?}", other.map(|v| v.order_ids().len())),
        }
    }

    #[test]
    fn test_self_loop_is_a_cycle() {
        let g = graph(vec![input("a", 1.0)], vec![edge("a", "a")]);
        assert_eq!(
            validate(g).unwrap_err(),
            GraphError::CycleDetected {
                node_ids: vec!["a".to_string()]
            }
        );
    }

    #[test]
    fn test_cycle_report_excludes_downstream_nodes() {
        // `a` feeds a `b <-> c` cycle which in turn feeds `d`.
        let g = graph(
            vec![input("a", 0.0), input("b", 0.0), input("c", 0.0), input("d", 0.0)],
            vec![edge("a", "b"), edge("b", "c"), edge("c", "b"), edge("c", "d")],
        );
        assert_eq!(
            validate(g).unwrap_err().node_ids(),
            vec!["b".to_string(), "c".to_string()]
        );
    }

    #[test]
    fn test_duplicate_ids_are_rejected_first() {
        // Also dangling and cyclic; the duplicate wins.
        let g = graph(
            vec![input("a", 1.0), input("a", 2.0)],
            vec![edge("a", "a"), edge("a", "missing")],
        );
        assert_eq!(
            validate(g).unwrap_err(),
            GraphError::DuplicateId("a".to_string())
        );
    }

    #[test]
    fn test_dangling_reported_before_cycle() {
        let g = graph(
            vec![input("a", 1.0), input("b", 1.0)],
            vec![edge("a", "b"), edge("b", "a"), edge("b", "x")],
        );
        assert!(matches!(
            validate(g),
            Err(GraphError::DanglingReference { connection_index: 2, .. })
        ));
    }

    #[test]
    fn test_parallel_connections_are_allowed() {
        let g = graph(
            vec![input("a", 1.0), input("b", 1.0)],
            vec![edge("a", "b"), edge("a", "b").with_ports("out-0", "in-1")],
        );
        let validated = validate(g).unwrap();
        assert_eq!(validated.predecessors("b").len(), 1);
    }
}

#[cfg(test)]
mod serialization_tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_node_round_trips_losslessly() {
        let raw = json!({
            "id": "n1",
            "type": "input",
            "value": 2.50,
            "config": {"zeta": 1, "alpha": {"nested": [1, 2]}},
            "x": 10,
            "label": "Price"
        });
        let node: Node = serde_json::from_value(raw.clone()).unwrap();
        assert_eq!(node.kind, "input");
        assert_eq!(node.declared_value(), Some(2.5));

        let keys: Vec<&String> = node.config.keys().collect();
        assert_eq!(keys, vec!["zeta", "alpha"]);
        assert_eq!(serde_json::to_value(&node).unwrap(), raw);
    }

    #[test]
    fn test_connection_accepts_source_target_aliases() {
        let c: Connection =
            serde_json::from_value(json!({"source": "a", "target": "b", "toPort": "in"})).unwrap();
        assert_eq!(c.from, "a");
        assert_eq!(c.to, "b");
        assert_eq!(c.to_port.as_deref(), Some("in"));
        assert_eq!(
            serde_json::to_value(&c).unwrap(),
            json!({"from": "a", "to": "b", "toPort": "in"})
        );
    }

    #[test]
    fn test_declared_numbers_keep_their_spelling() {
        let raw = r#"{"id":"a","type":"input","value":1.50,"config":{"k":2.50,"n":[1e2,-0.0]}}"#;
        let node: Node = serde_json::from_str(raw).unwrap();
        assert_eq!(node.declared_value(), Some(1.5));
        assert_eq!(serde_json::to_string(&node).unwrap(), raw);

        let exponent: Node =
            serde_json::from_str(r#"{"id":"b","type":"input","value":1e2,"config":{}}"#).unwrap();
        assert_eq!(exponent.declared_value(), Some(100.0));
        assert!(serde_json::to_string(&exponent).unwrap().contains(r#""value":1e2"#));
    }

    #[test]
    fn test_editor_fields_keep_their_spelling() {
        let raw = r#"{"id":"a","type":"input","config":{},"x":12.50,"meta":{"w":1e3}}"#;
        let node: Node = serde_json::from_str(raw).unwrap();
        assert_eq!(serde_json::to_string(&node).unwrap(), raw);
    }

    #[test]
    fn test_value_display_prints_large_integers_exactly() {
        assert_eq!(Value::Number(5.0).to_string(), "5");
        assert_eq!(Value::Number(2.5).to_string(), "2.5");
        assert_eq!(Value::Number(1e20).to_string(), "100000000000000000000");
        assert_eq!(Value::Number(-1e20).to_string(), "-100000000000000000000");

        let e = EvaluationError::TypeMismatch {
            operation: "add".to_string(),
            expected: "Bool".to_string(),
            found: Value::Number(1e20),
        };
        assert!(e.to_string().contains("'100000000000000000000'"));
    }

    #[test]
    fn test_integer_value_stays_integer() {
        let node: Node =
            serde_json::from_value(json!({"id": "a", "type": "input", "value": 5})).unwrap();
        assert_eq!(serde_json::to_string(&node.value).unwrap(), "5");
    }
}
