//! DAG validation for schedule graphs.
//!
//! Every CPM run is gated by a topological sort (Kahn's algorithm). Graphs
//! are rebuilt per call, so a cycle introduced between calls is always
//! caught here.

use std::cmp::Reverse;
use std::collections::{BinaryHeap, VecDeque};

use crate::interner::NodeId;

use super::graph::ScheduleGraph;
use super::types::CpmError;

/// Topologically order the graph (sources before targets).
///
/// Among nodes that are ready at the same time the smallest node id comes
/// first, so the order is fully determined by the graph.
///
/// Fails with [`CpmError::CycleDetected`] listing the milestones on (or
/// between) cycles.
pub fn topological_order(graph: &ScheduleGraph) -> Result<Vec<NodeId>, CpmError> {
    let n = graph.node_count();
    let mut in_degree: Vec<usize> = graph.nodes().map(|node| graph.in_degree(node)).collect();

    let mut ready: BinaryHeap<Reverse<NodeId>> = graph
        .nodes()
        .filter(|&node| in_degree[node as usize] == 0)
        .map(Reverse)
        .collect();

    let mut order: Vec<NodeId> = Vec::with_capacity(n);

    while let Some(Reverse(node)) = ready.pop() {
        order.push(node);
        for edge in graph.successors(node) {
            let degree = &mut in_degree[edge.node as usize];
            *degree -= 1;
            if *degree == 0 {
                ready.push(Reverse(edge.node));
            }
        }
    }

    if order.len() != n {
        let mut placed = vec![false; n];
        for &node in &order {
            placed[node as usize] = true;
        }
        return Err(CpmError::CycleDetected(cycle_members(graph, &placed)));
    }

    Ok(order)
}

/// Confirm the graph is a DAG.
pub fn ensure_acyclic(graph: &ScheduleGraph) -> Result<(), CpmError> {
    topological_order(graph).map(|_| ())
}

/// Milestone ids left over after Kahn's pass, minus nodes that merely hang
/// off a cycle downstream.
fn cycle_members(graph: &ScheduleGraph, placed: &[bool]) -> Vec<String> {
    let n = graph.node_count();
    let mut remaining: Vec<bool> = placed.iter().map(|p| !p).collect();

    // Out-degree restricted to the leftover subgraph
    let mut out_degree = vec![0usize; n];
    for node in graph.nodes().filter(|&n| remaining[n as usize]) {
        out_degree[node as usize] = graph
            .successors(node)
            .iter()
            .filter(|edge| remaining[edge.node as usize])
            .count();
    }

    let mut queue: VecDeque<NodeId> = graph
        .nodes()
        .filter(|&node| remaining[node as usize] && out_degree[node as usize] == 0)
        .collect();

    while let Some(node) = queue.pop_front() {
        remaining[node as usize] = false;
        for edge in graph.predecessors(node) {
            let pred = edge.node as usize;
            if remaining[pred] {
                out_degree[pred] -= 1;
                if out_degree[pred] == 0 {
                    queue.push_back(edge.node);
                }
            }
        }
    }

    // Node order is milestone id order, so this is already sorted
    graph
        .nodes()
        .filter(|&node| remaining[node as usize])
        .map(|node| graph.milestone_id(node).to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::critical_path::graph::tests::make_timeline;

    fn order_names(graph: &ScheduleGraph, order: &[NodeId]) -> Vec<String> {
        order
            .iter()
            .map(|&n| graph.milestone_id(n).to_string())
            .collect()
    }

    #[test]
    fn test_chain_order() {
        let timeline = make_timeline(
            &[("c", 0), ("b", 0), ("a", 0)],
            &[("c", "b", 0.0), ("b", "a", 0.0)],
        );
        let graph = ScheduleGraph::build(&timeline).unwrap();
        let order = topological_order(&graph).unwrap();
        assert_eq!(order_names(&graph, &order), vec!["c", "b", "a"]);
    }

    #[test]
    fn test_ready_ties_follow_id_order() {
        let timeline = make_timeline(
            &[("root", 0), ("x", 1), ("m", 1), ("b", 1)],
            &[("root", "x", 0.0), ("root", "m", 0.0), ("root", "b", 0.0)],
        );
        let graph = ScheduleGraph::build(&timeline).unwrap();
        let order = topological_order(&graph).unwrap();
        assert_eq!(order_names(&graph, &order), vec!["root", "b", "m", "x"]);
    }

    #[test]
    fn test_empty_graph_is_acyclic() {
        let timeline = make_timeline(&[], &[]);
        let graph = ScheduleGraph::build(&timeline).unwrap();
        assert!(ensure_acyclic(&graph).is_ok());
    }

    #[test]
    fn test_two_node_cycle() {
        let timeline = make_timeline(&[("a", 0), ("b", 1)], &[("a", "b", 0.0), ("b", "a", 0.0)]);
        let graph = ScheduleGraph::build(&timeline).unwrap();
        assert_eq!(
            ensure_acyclic(&graph),
            Err(CpmError::CycleDetected(vec!["a".to_string(), "b".to_string()]))
        );
    }

    #[test]
    fn test_cycle_report_excludes_upstream_and_downstream() {
        // start -> a -> b -> c -> a, c -> tail
        let timeline = make_timeline(
            &[("start", 0), ("a", 1), ("b", 2), ("c", 3), ("tail", 4)],
            &[
                ("start", "a", 0.0),
                ("a", "b", 0.0),
                ("b", "c", 0.0),
                ("c", "a", 0.0),
                ("c", "tail", 0.0),
            ],
        );
        let graph = ScheduleGraph::build(&timeline).unwrap();
        let err = topological_order(&graph).unwrap_err();
        assert_eq!(
            err,
            CpmError::CycleDetected(vec!["a".to_string(), "b".to_string(), "c".to_string()])
        );
    }

    #[test]
    fn test_self_loop_detected() {
        let timeline = make_timeline(&[("a", 0)], &[("a", "a", 0.0)]);
        let graph = ScheduleGraph::build(&timeline).unwrap();
        assert_eq!(
            ensure_acyclic(&graph),
            Err(CpmError::CycleDetected(vec!["a".to_string()]))
        );
    }
}
