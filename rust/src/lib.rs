//! Timeline scheduling engine.
//!
//! Projects own timelines, timelines own milestones, and dependencies link
//! milestones of the same timeline. The engine keeps all of it in memory and
//! answers critical path (CPM) and progress queries over it.
//!
//! Python bindings are built with the `python` feature.

// Allow clippy warning triggered by PyO3 macro expansion
#![allow(clippy::useless_conversion)]

pub mod config;
pub mod critical_path;
mod interner;
pub mod logging;
pub mod models;
pub mod progress;
pub mod store;

#[cfg(feature = "python")]
mod python;

pub use config::EngineConfig;
pub use critical_path::{
    analyze_timeline, compute_critical_path, CpmError, CriticalPathResult, NodeTiming,
    ScheduleGraph,
};
pub use models::{Dependency, DependencyKind, Milestone, MilestoneKind, Status, Timeline};
pub use progress::{recompute_progress, summarize, TimelineSummary};
pub use store::{
    NewDependency, NewMilestone, NewTimeline, StoreError, TimelineRepository, TimelineStore,
};
