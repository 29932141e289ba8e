//! Critical path analysis for timelines.
//!
//! A timeline snapshot is turned into a [`ScheduleGraph`], checked for cycles,
//! then solved with a forward and a backward pass. Results are never stored;
//! every query rebuilds the graph.

mod calculation;
mod graph;
mod types;
mod validation;

pub use calculation::compute_critical_path;
pub use graph::{edge_weight, Edge, ScheduleGraph};
pub use types::{CpmError, CriticalPathResult, NodeTiming};
pub use validation::{ensure_acyclic, topological_order};

pub use crate::interner::NodeId;

use crate::config::EngineConfig;
use crate::models::Timeline;

/// Build, validate and solve the schedule graph of a timeline.
pub fn analyze_timeline(
    timeline: &Timeline,
    config: &EngineConfig,
) -> Result<CriticalPathResult, CpmError> {
    let graph = ScheduleGraph::build(timeline)?;
    ensure_acyclic(&graph)?;
    compute_critical_path(&graph, config)
}
