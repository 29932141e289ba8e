//! Timeline progress aggregation and derived milestone data.

use chrono::{DateTime, Utc};
use rustc_hash::FxHashMap;
use serde::Serialize;
use std::collections::BTreeMap;

use crate::models::{Status, Timeline};

/// Recompute a timeline's progress from its milestones.
///
/// Progress is the arithmetic mean of milestone progress, every milestone
/// weighted equally. A timeline without milestones keeps its prior value.
/// Updates `progress` and `updated_at` and returns the new value.
pub fn recompute_progress(timeline: &mut Timeline) -> f64 {
    if timeline.milestones.is_empty() {
        return timeline.progress;
    }

    let total: f64 = timeline.milestones.values().map(|m| m.progress).sum();
    let mean = total / timeline.milestones.len() as f64;

    timeline.progress = mean.clamp(0.0, 100.0);
    timeline.touch();
    timeline.progress
}

/// Rebuild every milestone's `predecessors` cache from the dependency set.
pub fn refresh_predecessors(timeline: &mut Timeline) {
    let mut incoming: FxHashMap<&str, Vec<String>> = FxHashMap::default();
    for dep in timeline.dependencies.values() {
        incoming
            .entry(dep.target_id.as_str())
            .or_default()
            .push(dep.source_id.clone());
    }

    let mut rebuilt: FxHashMap<String, Vec<String>> = incoming
        .into_iter()
        .map(|(target, mut sources)| {
            sources.sort();
            sources.dedup();
            (target.to_string(), sources)
        })
        .collect();

    for (id, milestone) in timeline.milestones.iter_mut() {
        milestone.predecessors = rebuilt.remove(id.as_str()).unwrap_or_default();
    }
}

/// Point-in-time roll-up of a timeline's milestones.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct TimelineSummary {
    pub timeline_id: String,
    pub status: Status,
    pub progress: f64,
    pub milestone_count: usize,
    pub dependency_count: usize,
    /// Milestone counts keyed by status; statuses with no milestones are absent.
    pub milestones_by_status: BTreeMap<Status, usize>,
    /// Milestones whose planned date has passed without an actual date.
    pub overdue_milestones: Vec<String>,
}

/// Summarize a timeline as of `now`.
pub fn summarize(timeline: &Timeline, now: DateTime<Utc>) -> TimelineSummary {
    let mut milestones_by_status: BTreeMap<Status, usize> = BTreeMap::new();
    let mut overdue_milestones = Vec::new();

    for milestone in timeline.milestones.values() {
        *milestones_by_status.entry(milestone.status).or_insert(0) += 1;

        let open = !milestone.status.is_terminal() && milestone.actual_date.is_none();
        if open && milestone.planned_date < now {
            overdue_milestones.push(milestone.id.clone());
        }
    }

    TimelineSummary {
        timeline_id: timeline.id.clone(),
        status: timeline.status,
        progress: timeline.progress,
        milestone_count: timeline.milestones.len(),
        dependency_count: timeline.dependencies.len(),
        milestones_by_status,
        overdue_milestones,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Dependency, DependencyKind, Milestone, MilestoneKind};
    use chrono::{Duration, TimeZone};

    fn origin() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 2, 3, 0, 0, 0).unwrap()
    }

    fn timeline_with_progress(values: &[f64]) -> Timeline {
        let mut timeline = Timeline::new("p", "Rollout", "", origin(), origin());
        for (i, &progress) in values.iter().enumerate() {
            let mut milestone = Milestone::new(
                &timeline.id,
                format!("m{i}"),
                "",
                MilestoneKind::Checkpoint,
                origin() + Duration::days(i as i64),
            );
            milestone.id = format!("m{i}");
            milestone.progress = progress;
            timeline.milestones.insert(milestone.id.clone(), milestone);
        }
        timeline
    }

    #[test]
    fn test_mean_progress() {
        let mut timeline = timeline_with_progress(&[0.0, 50.0, 100.0, 30.0]);
        assert_eq!(recompute_progress(&mut timeline), 45.0);
        assert_eq!(timeline.progress, 45.0);
    }

    #[test]
    fn test_all_zero_and_all_complete() {
        let mut idle = timeline_with_progress(&[0.0, 0.0, 0.0]);
        assert_eq!(recompute_progress(&mut idle), 0.0);

        let mut done = timeline_with_progress(&[100.0, 100.0]);
        assert_eq!(recompute_progress(&mut done), 100.0);
    }

    #[test]
    fn test_empty_timeline_keeps_prior_progress() {
        let mut timeline = timeline_with_progress(&[]);
        timeline.progress = 37.5;
        let before = timeline.updated_at;

        assert_eq!(recompute_progress(&mut timeline), 37.5);
        assert_eq!(timeline.updated_at, before);
    }

    #[test]
    fn test_recompute_touches_timestamp() {
        let mut timeline = timeline_with_progress(&[10.0]);
        timeline.updated_at = origin();
        recompute_progress(&mut timeline);
        assert!(timeline.updated_at > origin());
    }

    #[test]
    fn test_refresh_predecessors() {
        let mut timeline = timeline_with_progress(&[0.0, 0.0, 0.0]);
        for (source, target) in [("m1", "m2"), ("m0", "m2"), ("m0", "m1")] {
            let dep = Dependency::new(&timeline.id, source, target, DependencyKind::FinishToStart, 0.0);
            timeline.dependencies.insert(dep.id.clone(), dep);
        }
        // Stale data must be discarded
        timeline.milestones.get_mut("m0").unwrap().predecessors = vec!["ghost".into()];

        refresh_predecessors(&mut timeline);

        assert!(timeline.milestones["m0"].predecessors.is_empty());
        assert_eq!(timeline.milestones["m1"].predecessors, vec!["m0"]);
        assert_eq!(timeline.milestones["m2"].predecessors, vec!["m0", "m1"]);
    }

    #[test]
    fn test_summary_counts_and_overdue() {
        let mut timeline = timeline_with_progress(&[100.0, 20.0, 0.0]);
        timeline.milestones.get_mut("m0").unwrap().status = Status::Completed;
        timeline.milestones.get_mut("m1").unwrap().status = Status::InProgress;

        // m0 completed, m1 (day 1) open and past, m2 (day 2) still ahead
        let summary = summarize(&timeline, origin() + Duration::hours(36));

        assert_eq!(summary.milestone_count, 3);
        assert_eq!(summary.milestones_by_status[&Status::Completed], 1);
        assert_eq!(summary.milestones_by_status[&Status::InProgress], 1);
        assert_eq!(summary.milestones_by_status[&Status::Planned], 1);
        assert_eq!(summary.overdue_milestones, vec!["m1"]);
    }
}
