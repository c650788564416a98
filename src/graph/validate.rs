use super::definition::{GraphDefinition, Node};
use crate::error::GraphError;
use ahash::AHashMap;
use itertools::Itertools;
use std::cmp::Reverse;
use std::collections::BinaryHeap;

/// A graph that passed `validate`: unique ids, resolved connections, no cycles.
///
/// Carries the evaluation order and each node's direct predecessors so the
/// engine never has to re-derive them.
#[derive(Debug, Clone)]
pub struct ValidatedGraph {
    graph: GraphDefinition,
    order: Vec<usize>,
    predecessors: Vec<Vec<usize>>,
}

impl ValidatedGraph {
    pub fn graph(&self) -> &GraphDefinition {
        &self.graph
    }

    pub fn into_inner(self) -> GraphDefinition {
        self.graph
    }

    /// Nodes in evaluation order.
    pub fn ordered_nodes(&self) -> impl Iterator<Item = &Node> + '_ {
        self.order.iter().map(|&i| &self.graph.nodes[i])
    }

    pub fn order_ids(&self) -> Vec<&str> {
        self.ordered_nodes().map(|n| n.id.as_str()).collect()
    }

    /// Direct predecessors of `node_id`, deduplicated, in connection order.
    pub fn predecessors(&self, node_id: &str) -> Vec<&Node> {
        self.graph
            .nodes
            .iter()
            .position(|n| n.id == node_id)
            .map(|i| self.predecessors_at(i).collect())
            .unwrap_or_default()
    }

    pub(crate) fn evaluation_plan(&self) -> impl Iterator<Item = (&Node, Vec<&Node>)> + '_ {
        self.order
            .iter()
            .map(|&i| (&self.graph.nodes[i], self.predecessors_at(i).collect()))
    }

    fn predecessors_at(&self, index: usize) -> impl Iterator<Item = &Node> + '_ {
        self.predecessors[index]
            .iter()
            .map(|&p| &self.graph.nodes[p])
    }
}

/// Checks the graph's structure and returns it wrapped as a `ValidatedGraph`.
///
/// Checks run in a fixed order: duplicate ids, dangling connection endpoints,
/// then cycles. The first failure is returned.
pub fn validate(graph: GraphDefinition) -> Result<ValidatedGraph, GraphError> {
    let (order, predecessors) = {
        let index = index_nodes(&graph)?;
        let edges = resolve_edges(&graph, &index)?;
        let order = sort_indices(graph.nodes.len(), &edges).map_err(|stuck| {
            GraphError::CycleDetected {
                node_ids: stuck.iter().map(|&i| graph.nodes[i].id.clone()).collect(),
            }
        })?;

        let mut predecessors: Vec<Vec<usize>> = vec![Vec::new(); graph.nodes.len()];
        for &(from, to) in &edges {
            if !predecessors[to].contains(&from) {
                predecessors[to].push(from);
            }
        }
        (order, predecessors)
    };

    Ok(ValidatedGraph {
        graph,
        order,
        predecessors,
    })
}

/// Returns node ids ordered so that every connection's `from` precedes its `to`.
///
/// Nodes without an ordering constraint between them keep their declaration
/// order, so an unchanged graph always yields the same sequence.
pub fn topological_order(graph: &GraphDefinition) -> Result<Vec<String>, GraphError> {
    let index = index_nodes(graph)?;
    let edges = resolve_edges(graph, &index)?;
    sort_indices(graph.nodes.len(), &edges)
        .map(|order| order.into_iter().map(|i| graph.nodes[i].id.clone()).collect())
        .map_err(|stuck| GraphError::CycleDetected {
            node_ids: stuck.iter().map(|&i| graph.nodes[i].id.clone()).collect(),
        })
}

fn index_nodes(graph: &GraphDefinition) -> Result<AHashMap<&str, usize>, GraphError> {
    if let Some(dup) = graph.nodes.iter().map(|n| n.id.as_str()).duplicates().next() {
        return Err(GraphError::DuplicateId(dup.to_string()));
    }
    Ok(graph
        .nodes
        .iter()
        .enumerate()
        .map(|(i, n)| (n.id.as_str(), i))
        .collect())
}

fn resolve_edges(
    graph: &GraphDefinition,
    index: &AHashMap<&str, usize>,
) -> Result<Vec<(usize, usize)>, GraphError> {
    graph
        .connections
        .iter()
        .enumerate()
        .map(|(connection_index, c)| {
            let lookup = |id: &str| {
                index
                    .get(id)
                    .copied()
                    .ok_or_else(|| GraphError::DanglingReference {
                        node_id: id.to_string(),
                        connection_index,
                    })
            };
            Ok((lookup(&c.from)?, lookup(&c.to)?))
        })
        .collect()
}

/// Kahn's algorithm with a min-heap on declaration index.
///
/// On failure returns the indices of the nodes caught in cyclic dependencies,
/// in declaration order.
fn sort_indices(node_count: usize, edges: &[(usize, usize)]) -> Result<Vec<usize>, Vec<usize>> {
    let mut successors: Vec<Vec<usize>> = vec![Vec::new(); node_count];
    let mut in_degree = vec![0usize; node_count];
    for &(from, to) in edges {
        successors[from].push(to);
        in_degree[to] += 1;
    }

    let mut ready: BinaryHeap<Reverse<usize>> = in_degree
        .iter()
        .enumerate()
        .filter(|(_, deg)| **deg == 0)
        .map(|(i, _)| Reverse(i))
        .collect();

    let mut order = Vec::with_capacity(node_count);
    while let Some(Reverse(node)) = ready.pop() {
        order.push(node);
        for &next in &successors[node] {
            in_degree[next] -= 1;
            if in_degree[next] == 0 {
                ready.push(Reverse(next));
            }
        }
    }

    if order.len() == node_count {
        return Ok(order);
    }

    Err(prune_to_cycles(&successors, &in_degree))
}

/// Drops the nodes that are merely downstream of a cycle, leaving the ones on it.
fn prune_to_cycles(successors: &[Vec<usize>], in_degree: &[usize]) -> Vec<usize> {
    let mut remaining: Vec<bool> = in_degree.iter().map(|&d| d > 0).collect();
    loop {
        let sinks: Vec<usize> = (0..remaining.len())
            .filter(|&i| remaining[i] && !successors[i].iter().any(|&s| remaining[s]))
            .collect();
        if sinks.is_empty() {
            break;
        }
        for i in sinks {
            remaining[i] = false;
        }
    }
    (0..remaining.len()).filter(|&i| remaining[i]).collect()
}
