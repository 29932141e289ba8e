//! Schedule graph construction from a timeline snapshot.

use crate::interner::{MilestoneIndex, NodeId};
use crate::models::{seconds_between, Dependency, DependencyKind, Milestone, Timeline};

use super::types::CpmError;

/// A directed edge as seen from one endpoint.
///
/// In `successors` lists `node` is the target; in `predecessors` lists it is
/// the source.
#[derive(Clone, Debug, PartialEq)]
pub struct Edge {
    pub node: NodeId,
    /// Edge duration in seconds (planned-date gap plus lag).
    pub weight: f64,
    pub kind: DependencyKind,
}

/// Immutable-by-default graph of milestones (nodes) and dependencies (edges).
///
/// Node ids follow ascending milestone id order, so every traversal that
/// breaks ties by node id breaks them by milestone id.
#[derive(Clone, Debug, Default)]
pub struct ScheduleGraph {
    index: MilestoneIndex,
    durations: Vec<f64>,
    successors: Vec<Vec<Edge>>,
    predecessors: Vec<Vec<Edge>>,
    edge_count: usize,
}

/// Duration of a dependency edge in seconds.
///
/// The gap between the two planned dates plus the dependency's lag.
pub fn edge_weight(source: &Milestone, target: &Milestone, dependency: &Dependency) -> f64 {
    seconds_between(source.planned_date, target.planned_date) + dependency.lag_seconds
}

impl ScheduleGraph {
    /// Build the graph for a timeline.
    ///
    /// Fails with [`CpmError::MissingEndpoint`] if a dependency names a
    /// milestone the timeline does not own.
    pub fn build(timeline: &Timeline) -> Result<Self, CpmError> {
        let n = timeline.milestones.len();
        // BTreeMap iteration yields ascending ids
        let index: MilestoneIndex = timeline.milestones.keys().map(String::as_str).collect();

        let mut successors: Vec<Vec<Edge>> = vec![Vec::new(); n];
        let mut predecessors: Vec<Vec<Edge>> = vec![Vec::new(); n];

        for dependency in timeline.dependencies.values() {
            let (source, source_node) = lookup(timeline, &index, dependency, &dependency.source_id)?;
            let (target, target_node) = lookup(timeline, &index, dependency, &dependency.target_id)?;

            let weight = edge_weight(source, target, dependency);
            successors[source_node as usize].push(Edge {
                node: target_node,
                weight,
                kind: dependency.kind,
            });
            predecessors[target_node as usize].push(Edge {
                node: source_node,
                weight,
                kind: dependency.kind,
            });
        }

        Ok(Self {
            index,
            durations: vec![0.0; n],
            successors,
            predecessors,
            edge_count: timeline.dependencies.len(),
        })
    }

    /// Give a milestone a non-zero duration (seconds).
    ///
    /// Milestones are instantaneous by default. Returns false if the
    /// milestone is not in the graph or the duration is negative or not finite.
    pub fn set_node_duration(&mut self, milestone_id: &str, seconds: f64) -> bool {
        if !seconds.is_finite() || seconds < 0.0 {
            return false;
        }
        match self.index.node(milestone_id) {
            Some(node) => {
                self.durations[node as usize] = seconds;
                true
            }
            None => false,
        }
    }

    pub fn node_count(&self) -> usize {
        self.index.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edge_count
    }

    pub fn node(&self, milestone_id: &str) -> Option<NodeId> {
        self.index.node(milestone_id)
    }

    /// Milestone id of a node produced by this graph.
    pub fn milestone_id(&self, node: NodeId) -> &str {
        self.index.milestone_id(node)
    }

    pub fn duration(&self, node: NodeId) -> f64 {
        self.durations[node as usize]
    }

    pub fn successors(&self, node: NodeId) -> &[Edge] {
        &self.successors[node as usize]
    }

    pub fn predecessors(&self, node: NodeId) -> &[Edge] {
        &self.predecessors[node as usize]
    }

    pub fn in_degree(&self, node: NodeId) -> usize {
        self.predecessors[node as usize].len()
    }

    pub fn out_degree(&self, node: NodeId) -> usize {
        self.successors[node as usize].len()
    }

    /// All node ids in ascending order.
    pub fn nodes(&self) -> impl Iterator<Item = NodeId> {
        0..self.index.len() as NodeId
    }

    /// Nodes without incoming edges.
    pub fn start_nodes(&self) -> Vec<NodeId> {
        self.nodes().filter(|&n| self.in_degree(n) == 0).collect()
    }

    /// Nodes without outgoing edges.
    pub fn end_nodes(&self) -> Vec<NodeId> {
        self.nodes().filter(|&n| self.out_degree(n) == 0).collect()
    }
}

fn lookup<'t>(
    timeline: &'t Timeline,
    index: &MilestoneIndex,
    dependency: &Dependency,
    milestone_id: &str,
) -> Result<(&'t Milestone, NodeId), CpmError> {
    match (timeline.milestones.get(milestone_id), index.node(milestone_id)) {
        (Some(milestone), Some(node)) => Ok((milestone, node)),
        _ => Err(CpmError::MissingEndpoint {
            dependency_id: dependency.id.clone(),
            milestone_id: milestone_id.to_string(),
        }),
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::models::{Dependency, MilestoneKind};
    use chrono::{Duration, TimeZone, Utc};

    const DAY: f64 = 86_400.0;

    /// Build a timeline from (id, day offset) milestones and
    /// (source, target, lag seconds) dependencies.
    pub(crate) fn make_timeline(
        milestones: &[(&str, i64)],
        dependencies: &[(&str, &str, f64)],
    ) -> Timeline {
        make_typed_timeline(
            milestones,
            &dependencies
                .iter()
                .map(|&(s, t, lag)| (s, t, DependencyKind::FinishToStart, lag))
                .collect::<Vec<_>>(),
        )
    }

    pub(crate) fn make_typed_timeline(
        milestones: &[(&str, i64)],
        dependencies: &[(&str, &str, DependencyKind, f64)],
    ) -> Timeline {
        let origin = Utc.with_ymd_and_hms(2025, 1, 6, 9, 0, 0).unwrap();
        let mut timeline = Timeline::new("project", "Test timeline", "", origin, origin);
        timeline.id = "timeline".to_string();

        for &(id, day) in milestones {
            let mut milestone = Milestone::new(
                "timeline",
                id,
                "",
                MilestoneKind::Checkpoint,
                origin + Duration::days(day),
            );
            milestone.id = id.to_string();
            timeline.milestones.insert(id.to_string(), milestone);
        }

        for (i, &(source, target, kind, lag)) in dependencies.iter().enumerate() {
            let mut dependency = Dependency::new("timeline", source, target, kind, lag);
            dependency.id = format!("dep-{i:03}");
            timeline.dependencies.insert(dependency.id.clone(), dependency);
        }

        timeline
    }

    #[test]
    fn test_build_nodes_in_id_order() {
        let timeline = make_timeline(&[("c", 0), ("a", 1), ("b", 2)], &[]);
        let graph = ScheduleGraph::build(&timeline).unwrap();

        assert_eq!(graph.node_count(), 3);
        assert_eq!(graph.edge_count(), 0);
        assert_eq!(graph.milestone_id(0), "a");
        assert_eq!(graph.milestone_id(1), "b");
        assert_eq!(graph.milestone_id(2), "c");
    }

    #[test]
    fn test_edge_weight_from_planned_dates_and_lag() {
        let timeline = make_timeline(&[("a", 0), ("b", 5)], &[("a", "b", 3600.0)]);
        let graph = ScheduleGraph::build(&timeline).unwrap();

        let a = graph.node("a").unwrap();
        let b = graph.node("b").unwrap();
        let edges = graph.successors(a);
        assert_eq!(edges.len(), 1);
        assert_eq!(edges[0].node, b);
        assert_eq!(edges[0].weight, 5.0 * DAY + 3600.0);
        assert_eq!(graph.predecessors(b)[0].node, a);
    }

    #[test]
    fn test_negative_lag_is_a_lead() {
        let timeline = make_timeline(&[("a", 0), ("b", 2)], &[("a", "b", -DAY)]);
        let graph = ScheduleGraph::build(&timeline).unwrap();
        let a = graph.node("a").unwrap();
        assert_eq!(graph.successors(a)[0].weight, DAY);
    }

    #[test]
    fn test_boundary_nodes() {
        let timeline = make_timeline(
            &[("a", 0), ("b", 1), ("c", 2), ("lone", 3)],
            &[("a", "b", 0.0), ("b", "c", 0.0)],
        );
        let graph = ScheduleGraph::build(&timeline).unwrap();
        let names = |nodes: Vec<NodeId>| -> Vec<&str> {
            nodes.into_iter().map(|n| graph.milestone_id(n)).collect()
        };

        assert_eq!(names(graph.start_nodes()), vec!["a", "lone"]);
        assert_eq!(names(graph.end_nodes()), vec!["c", "lone"]);
    }

    #[test]
    fn test_missing_endpoint() {
        let mut timeline = make_timeline(&[("a", 0)], &[]);
        let dependency = Dependency::new("timeline", "a", "ghost", DependencyKind::FinishToStart, 0.0);
        let dependency_id = dependency.id.clone();
        timeline.dependencies.insert(dependency.id.clone(), dependency);

        let err = ScheduleGraph::build(&timeline).unwrap_err();
        assert_eq!(
            err,
            CpmError::MissingEndpoint {
                dependency_id,
                milestone_id: "ghost".to_string(),
            }
        );
    }

    #[test]
    fn test_set_node_duration() {
        let timeline = make_timeline(&[("a", 0)], &[]);
        let mut graph = ScheduleGraph::build(&timeline).unwrap();

        assert!(graph.set_node_duration("a", 120.0));
        assert!(!graph.set_node_duration("zzz", 1.0));
        assert!(!graph.set_node_duration("a", -1.0));
        assert_eq!(graph.duration(graph.node("a").unwrap()), 120.0);
    }
}
