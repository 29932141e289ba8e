//! Types for critical path calculation.

use rustc_hash::FxHashMap;
use serde::Serialize;
use thiserror::Error;

/// Errors raised while building or solving a schedule graph.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CpmError {
    #[error("Dependency {dependency_id} references unknown milestone {milestone_id}")]
    MissingEndpoint {
        dependency_id: String,
        milestone_id: String,
    },
    #[error("Circular dependency detected between milestones: {0:?}")]
    CycleDetected(Vec<String>),
    #[error("Schedule graph has no clear start or end milestones")]
    NoClearBoundary,
    #[error("Internal invariant violated: {0}")]
    InvariantViolation(String),
}

/// Per-milestone timing information, in seconds from the project start.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize)]
pub struct NodeTiming {
    /// Earliest possible start time (from forward pass).
    pub earliest_start: f64,
    /// Earliest possible finish time (from forward pass).
    pub earliest_finish: f64,
    /// Latest allowable start time (from backward pass).
    pub latest_start: f64,
    /// Latest allowable finish time (from backward pass).
    pub latest_finish: f64,
    /// Slack = latest_start - earliest_start.
    pub slack: f64,
}

impl NodeTiming {
    pub fn is_critical(&self, epsilon: f64) -> bool {
        self.slack.abs() < epsilon
    }
}

/// Result of a critical path calculation over one timeline.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct CriticalPathResult {
    /// Critical milestone ids ordered by earliest start, ties by id.
    pub critical_path: Vec<String>,
    /// Timing for every milestone in the graph.
    pub node_times: FxHashMap<String, NodeTiming>,
    /// Largest earliest finish over the end milestones.
    pub project_duration: f64,
}

impl CriticalPathResult {
    pub fn timing(&self, milestone_id: &str) -> Option<&NodeTiming> {
        self.node_times.get(milestone_id)
    }

    pub fn is_critical(&self, milestone_id: &str) -> bool {
        self.critical_path.iter().any(|id| id == milestone_id)
    }
}
