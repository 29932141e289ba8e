//! Critical path calculation using forward and backward passes.

use crate::config::EngineConfig;
use crate::interner::NodeId;
use crate::models::DependencyKind;
use crate::{log_debug, log_error, log_passes};

use super::graph::{Edge, ScheduleGraph};
use super::types::{CpmError, CriticalPathResult, NodeTiming};
use super::validation::topological_order;

/// Lower bound an incoming edge puts on the target's earliest start.
fn forward_bound(edge: &Edge, source: &NodeTiming, target_duration: f64) -> f64 {
    match edge.kind {
        DependencyKind::FinishToStart => source.earliest_finish + edge.weight,
        DependencyKind::StartToStart => source.earliest_start + edge.weight,
        DependencyKind::FinishToFinish => source.earliest_finish + edge.weight - target_duration,
        DependencyKind::StartToFinish => source.earliest_start + edge.weight - target_duration,
    }
}

/// Upper bound an outgoing edge puts on the source's latest finish.
fn backward_bound(edge: &Edge, target: &NodeTiming, source_duration: f64) -> f64 {
    match edge.kind {
        DependencyKind::FinishToStart => target.latest_start - edge.weight,
        DependencyKind::StartToStart => target.latest_start - edge.weight + source_duration,
        DependencyKind::FinishToFinish => target.latest_finish - edge.weight,
        DependencyKind::StartToFinish => target.latest_finish - edge.weight + source_duration,
    }
}

fn out_of_order(graph: &ScheduleGraph, node: NodeId, other: NodeId, pass: &str) -> CpmError {
    let message = format!(
        "{} pass reached {} before {}",
        pass,
        graph.milestone_id(node),
        graph.milestone_id(other)
    );
    log_error!("{}", message);
    CpmError::InvariantViolation(message)
}

/// Calculate earliest/latest times, slack and the critical path of a graph.
///
/// The graph must be acyclic; callers normally run
/// [`super::validation::ensure_acyclic`] first. A cycle that slips through
/// fails with [`CpmError::NoClearBoundary`] when every node lies on it, and
/// with [`CpmError::CycleDetected`] otherwise.
///
/// Critical milestones are those with `|slack| < config.slack_epsilon`,
/// returned in ascending earliest-start order with ties broken by milestone
/// id.
pub fn compute_critical_path(
    graph: &ScheduleGraph,
    config: &EngineConfig,
) -> Result<CriticalPathResult, CpmError> {
    let verbosity = config.verbosity;

    let start_nodes = graph.start_nodes();
    let end_nodes = graph.end_nodes();
    if start_nodes.is_empty() || end_nodes.is_empty() {
        return Err(CpmError::NoClearBoundary);
    }

    let order = topological_order(graph)?;
    log_passes!(
        verbosity,
        "CPM over {} milestones, {} dependencies ({} start, {} end)",
        graph.node_count(),
        graph.edge_count(),
        start_nodes.len(),
        end_nodes.len()
    );

    let n = graph.node_count();
    let mut timings = vec![NodeTiming::default(); n];
    let mut done = vec![false; n];

    // Forward pass: earliest start = max of all incoming constraints, floor 0
    for &node in &order {
        let duration = graph.duration(node);
        let mut earliest_start: f64 = 0.0;
        for edge in graph.predecessors(node) {
            if !done[edge.node as usize] {
                return Err(out_of_order(graph, node, edge.node, "Forward"));
            }
            let bound = forward_bound(edge, &timings[edge.node as usize], duration);
            earliest_start = earliest_start.max(bound);
        }

        let timing = &mut timings[node as usize];
        timing.earliest_start = earliest_start;
        timing.earliest_finish = earliest_start + duration;
        done[node as usize] = true;
    }

    let project_duration = end_nodes
        .iter()
        .map(|&node| timings[node as usize].earliest_finish)
        .fold(f64::MIN, f64::max);
    log_passes!(verbosity, "  Project duration: {}s", project_duration);

    // Backward pass: latest finish = min of all outgoing constraints
    done.iter_mut().for_each(|d| *d = false);
    for &node in order.iter().rev() {
        let duration = graph.duration(node);
        let successors = graph.successors(node);

        let latest_finish = if successors.is_empty() {
            project_duration
        } else {
            let mut latest_finish = f64::INFINITY;
            for edge in successors {
                if !done[edge.node as usize] {
                    return Err(out_of_order(graph, node, edge.node, "Backward"));
                }
                let bound = backward_bound(edge, &timings[edge.node as usize], duration);
                latest_finish = latest_finish.min(bound);
            }
            latest_finish
        };

        let timing = &mut timings[node as usize];
        timing.latest_finish = latest_finish;
        timing.latest_start = latest_finish - duration;
        timing.slack = timing.latest_start - timing.earliest_start;
        done[node as usize] = true;

        log_debug!(
            verbosity,
            "  {}: es={} ef={} ls={} lf={} slack={}",
            graph.milestone_id(node),
            timing.earliest_start,
            timing.earliest_finish,
            timing.latest_start,
            timing.latest_finish,
            timing.slack
        );
    }

    // Node ids ascend with milestone ids; the stable sort keeps that for ties
    let mut critical: Vec<NodeId> = graph
        .nodes()
        .filter(|&node| timings[node as usize].is_critical(config.slack_epsilon))
        .collect();
    critical.sort_by(|&a, &b| {
        timings[a as usize]
            .earliest_start
            .total_cmp(&timings[b as usize].earliest_start)
    });

    let critical_path: Vec<String> = critical
        .iter()
        .map(|&node| graph.milestone_id(node).to_string())
        .collect();
    log_passes!(verbosity, "  Critical path: {:?}", critical_path);

    let node_times = graph
        .nodes()
        .map(|node| (graph.milestone_id(node).to_string(), timings[node as usize]))
        .collect();

    Ok(CriticalPathResult {
        critical_path,
        node_times,
        project_duration,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::critical_path::graph::tests::{make_timeline, make_typed_timeline};

    const DAY: f64 = 86_400.0;

    fn solve(timeline: &crate::models::Timeline) -> Result<CriticalPathResult, CpmError> {
        let graph = ScheduleGraph::build(timeline)?;
        compute_critical_path(&graph, &EngineConfig::default())
    }

    fn assert_close(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() < 1e-6,
            "expected {expected}, got {actual}"
        );
    }

    #[test]
    fn test_diamond_both_paths_critical() {
        let timeline = make_timeline(
            &[("A", 0), ("B", 5), ("C", 3), ("D", 10)],
            &[
                ("A", "B", 0.0),
                ("A", "C", 0.0),
                ("B", "D", 0.0),
                ("C", "D", 0.0),
            ],
        );
        let result = solve(&timeline).unwrap();

        let a = result.timing("A").unwrap();
        assert_close(a.earliest_start, 0.0);
        assert_close(a.earliest_finish, 0.0);
        assert_close(result.timing("B").unwrap().earliest_start, 5.0 * DAY);
        assert_close(result.timing("C").unwrap().earliest_start, 3.0 * DAY);
        assert_close(result.timing("D").unwrap().earliest_start, 10.0 * DAY);
        assert_close(result.project_duration, 10.0 * DAY);

        for id in ["A", "B", "C", "D"] {
            assert_close(result.timing(id).unwrap().slack, 0.0);
        }
        // Ordered by earliest start: C (day 3) precedes B (day 5)
        assert_eq!(result.critical_path, vec!["A", "C", "B", "D"]);
    }

    #[test]
    fn test_equal_earliest_start_ordered_by_id() {
        let timeline = make_timeline(
            &[("start", 0), ("zeta", 4), ("alpha", 4), ("mid", 4), ("end", 9)],
            &[
                ("start", "zeta", 0.0),
                ("start", "alpha", 0.0),
                ("start", "mid", 0.0),
                ("zeta", "end", 0.0),
                ("alpha", "end", 0.0),
                ("mid", "end", 0.0),
            ],
        );
        let result = solve(&timeline).unwrap();
        assert_eq!(
            result.critical_path,
            vec!["start", "alpha", "mid", "zeta", "end"]
        );
    }

    #[test]
    fn test_single_milestone_is_trivially_critical() {
        let timeline = make_timeline(&[("only", 0)], &[]);
        let result = solve(&timeline).unwrap();

        assert_eq!(result.critical_path, vec!["only"]);
        assert_eq!(result.project_duration, 0.0);
        assert_eq!(result.node_times.len(), 1);
    }

    #[test]
    fn test_empty_timeline_has_no_boundary() {
        let timeline = make_timeline(&[], &[]);
        assert_eq!(solve(&timeline), Err(CpmError::NoClearBoundary));
    }

    #[test]
    fn test_cycle_is_reported_not_scheduled() {
        let timeline = make_timeline(
            &[("s", 0), ("a", 1), ("b", 2), ("e", 3)],
            &[
                ("s", "a", 0.0),
                ("a", "b", 0.0),
                ("b", "a", 0.0),
                ("b", "e", 0.0),
            ],
        );
        assert_eq!(
            solve(&timeline),
            Err(CpmError::CycleDetected(vec!["a".into(), "b".into()]))
        );
    }

    #[test]
    fn test_pure_cycle_has_no_boundary() {
        let timeline = make_timeline(&[("a", 0), ("b", 1)], &[("a", "b", 0.0), ("b", "a", 0.0)]);
        assert_eq!(solve(&timeline), Err(CpmError::NoClearBoundary));
    }

    #[test]
    fn test_parallel_branch_has_slack() {
        // s -> long (day 8) -> e (day 10)
        // s -> side (day 1), side has no successor: slack up to project end
        let timeline = make_timeline(
            &[("s", 0), ("long", 8), ("e", 10), ("side", 1)],
            &[("s", "long", 0.0), ("long", "e", 0.0), ("s", "side", 0.0)],
        );
        let result = solve(&timeline).unwrap();

        assert_close(result.project_duration, 10.0 * DAY);
        assert_eq!(result.critical_path, vec!["s", "long", "e"]);
        let side = result.timing("side").unwrap();
        assert_close(side.earliest_start, DAY);
        assert_close(side.latest_finish, 10.0 * DAY);
        assert_close(side.slack, 9.0 * DAY);
        assert!(!result.is_critical("side"));
    }

    #[test]
    fn test_lag_lengthens_path() {
        let timeline = make_timeline(
            &[("a", 0), ("b", 2), ("c", 2), ("d", 4)],
            &[
                ("a", "b", 0.0),
                ("a", "c", DAY),
                ("b", "d", 0.0),
                ("c", "d", 0.0),
            ],
        );
        let result = solve(&timeline).unwrap();

        // a->c->d = 2d + 1d lag + 2d = 5d beats a->b->d = 4d
        assert_close(result.project_duration, 5.0 * DAY);
        assert_eq!(result.critical_path, vec!["a", "c", "d"]);
        assert_close(result.timing("b").unwrap().slack, DAY);
    }

    #[test]
    fn test_negative_weight_clamps_to_project_start() {
        // Target planned before source: the edge cannot pull it below zero
        let timeline = make_timeline(&[("a", 5), ("b", 0)], &[("a", "b", 0.0)]);
        let result = solve(&timeline).unwrap();

        let b = result.timing("b").unwrap();
        assert_close(b.earliest_start, 0.0);
        assert!(result.timing("a").unwrap().slack >= 0.0);
    }

    #[test]
    fn test_slack_is_never_negative() {
        let timeline = make_timeline(
            &[("a", 0), ("b", 3), ("c", 1), ("d", 6), ("e", 4), ("f", 9), ("g", 2)],
            &[
                ("a", "b", 0.0),
                ("a", "c", 3600.0),
                ("c", "e", -7200.0),
                ("b", "d", 0.0),
                ("e", "d", 0.0),
                ("d", "f", 0.0),
                ("c", "f", 0.0),
                ("g", "f", DAY),
            ],
        );
        let config = EngineConfig::default();
        let result = solve(&timeline).unwrap();

        for (id, timing) in &result.node_times {
            if result.is_critical(id) {
                assert!(timing.slack.abs() < config.slack_epsilon, "{id} not zero");
            } else {
                assert!(timing.slack >= -config.slack_epsilon, "{id} negative");
            }
        }
    }

    #[test]
    fn test_epsilon_absorbs_rounding() {
        let timeline = make_timeline(
            &[("a", 0), ("b", 0), ("c", 0)],
            &[("a", "b", 0.1), ("b", "c", 0.2), ("a", "c", 0.3)],
        );
        let result = solve(&timeline).unwrap();
        assert_eq!(result.critical_path, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_deterministic_results() {
        let timeline = make_timeline(
            &[("k", 0), ("j", 2), ("i", 2), ("h", 5)],
            &[("k", "j", 0.0), ("k", "i", 0.0), ("j", "h", 0.0), ("i", "h", 0.0)],
        );
        let first = solve(&timeline).unwrap();
        let second = solve(&timeline).unwrap();
        assert_eq!(first.critical_path, second.critical_path);
        assert_eq!(first, second);
    }

    fn typed_pair(kind: DependencyKind, lag: f64) -> CriticalPathResult {
        let timeline = make_typed_timeline(&[("a", 0), ("b", 0)], &[("a", "b", kind, lag)]);
        let mut graph = ScheduleGraph::build(&timeline).unwrap();
        graph.set_node_duration("a", 2.0 * DAY);
        graph.set_node_duration("b", DAY);
        compute_critical_path(&graph, &EngineConfig::default()).unwrap()
    }

    #[test]
    fn test_finish_to_start_with_durations() {
        let result = typed_pair(DependencyKind::FinishToStart, 0.0);
        assert_close(result.timing("b").unwrap().earliest_start, 2.0 * DAY);
        assert_close(result.project_duration, 3.0 * DAY);
        assert_eq!(result.critical_path, vec!["a", "b"]);
    }

    #[test]
    fn test_start_to_start_with_durations() {
        let result = typed_pair(DependencyKind::StartToStart, DAY);
        let a = result.timing("a").unwrap();
        let b = result.timing("b").unwrap();
        assert_close(b.earliest_start, DAY);
        assert_close(result.project_duration, 2.0 * DAY);
        assert_close(a.latest_finish, 2.0 * DAY);
        assert_close(a.slack, 0.0);
        assert_close(b.slack, 0.0);
    }

    #[test]
    fn test_finish_to_finish_with_durations() {
        let result = typed_pair(DependencyKind::FinishToFinish, 0.0);
        let b = result.timing("b").unwrap();
        assert_close(b.earliest_start, DAY);
        assert_close(b.earliest_finish, 2.0 * DAY);
        assert_eq!(result.critical_path, vec!["a", "b"]);
    }

    #[test]
    fn test_start_to_finish_with_durations() {
        let result = typed_pair(DependencyKind::StartToFinish, 0.0);
        let a = result.timing("a").unwrap();
        let b = result.timing("b").unwrap();
        // b must finish after a starts: no constraint beyond the project start
        assert_close(b.earliest_start, 0.0);
        assert_close(result.project_duration, DAY);
        assert_close(a.latest_start, DAY);
        assert_close(a.slack, DAY);
        assert_eq!(result.critical_path, vec!["b"]);
    }

    #[test]
    fn test_kinds_coincide_for_instant_milestones() {
        let kinds = [
            DependencyKind::FinishToStart,
            DependencyKind::StartToStart,
            DependencyKind::FinishToFinish,
            DependencyKind::StartToFinish,
        ];
        for kind in kinds {
            let timeline = make_typed_timeline(
                &[("a", 0), ("b", 4), ("c", 6)],
                &[("a", "b", kind, 0.0), ("b", "c", kind, 0.0)],
            );
            let result = solve(&timeline).unwrap();
            assert_close(result.project_duration, 6.0 * DAY);
            assert_eq!(result.critical_path, vec!["a", "b", "c"], "{kind:?}");
        }
    }
}
