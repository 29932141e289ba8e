//! In-memory timeline store.

use chrono::Utc;
use rustc_hash::FxHashMap;
use std::collections::BTreeSet;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use thiserror::Error;

use crate::config::EngineConfig;
use crate::critical_path::{
    compute_critical_path, ensure_acyclic, CpmError, CriticalPathResult, ScheduleGraph,
};
use crate::models::{is_valid_progress, Dependency, Milestone, Status, Timeline};
use crate::progress::{recompute_progress, refresh_predecessors, summarize, TimelineSummary};
use crate::{log_changes, log_error, log_passes};

use super::persistence::{PersistenceError, TimelineRepository};
use super::requests::{
    DependencyUpdate, MilestoneUpdate, NewDependency, NewMilestone, NewTimeline, TimelineUpdate,
};

/// Entity kinds named in [`StoreError::NotFound`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EntityKind {
    Timeline,
    Milestone,
    Dependency,
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntityKind::Timeline => f.write_str("Timeline"),
            EntityKind::Milestone => f.write_str("Milestone"),
            EntityKind::Dependency => f.write_str("Dependency"),
        }
    }
}

/// Errors returned by store operations.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("{kind} not found: {id}")]
    NotFound { kind: EntityKind, id: String },
    #[error("Invalid dependency endpoint: {0}")]
    InvalidEndpoint(String),
    #[error("Progress must be within [0, 100], got {0}")]
    InvalidProgress(f64),
    #[error("Lag must be a finite number of seconds, got {0}")]
    InvalidLag(f64),
    #[error("Invalid status transition from {from} to {to}")]
    InvalidTransition { from: Status, to: Status },
    #[error("Timeline end date {end} precedes start date {start}")]
    InvalidDateRange {
        start: chrono::DateTime<Utc>,
        end: chrono::DateTime<Utc>,
    },
    #[error("Critical path analysis is disabled")]
    CriticalPathDisabled,
    #[error(transparent)]
    Cpm(#[from] CpmError),
    #[error(transparent)]
    Persistence(#[from] PersistenceError),
}

impl StoreError {
    fn not_found(kind: EntityKind, id: &str) -> Self {
        StoreError::NotFound {
            kind,
            id: id.to_string(),
        }
    }
}

/// Entity counts reported by [`TimelineStore::health`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct StoreHealth {
    pub timeline_count: usize,
    pub milestone_count: usize,
    pub dependency_count: usize,
}

/// Record counts from a load or persist run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SyncReport {
    pub timelines: usize,
    pub milestones: usize,
    pub dependencies: usize,
    /// Records dropped on load because they violate store rules.
    pub skipped: usize,
    /// Deleted records dropped from the repository on persist.
    pub removed: usize,
}

type TimelineEntry = Arc<Mutex<Timeline>>;

/// Authoritative in-memory state for all timelines.
///
/// Each timeline sits behind its own mutex: writes to one timeline are
/// serialized, while different timelines proceed independently. Critical
/// path queries copy a graph out under the mutex and solve it after release.
pub struct TimelineStore {
    config: EngineConfig,
    timelines: RwLock<FxHashMap<String, TimelineEntry>>,
    removed: Mutex<PendingRemovals>,
}

/// Ids deleted in memory that the repository has not dropped yet.
#[derive(Clone, Debug, Default)]
struct PendingRemovals {
    timelines: BTreeSet<String>,
    milestones: BTreeSet<String>,
    dependencies: BTreeSet<String>,
}

impl PendingRemovals {
    fn is_empty(&self) -> bool {
        self.timelines.is_empty() && self.milestones.is_empty() && self.dependencies.is_empty()
    }

    /// Forget ids that a persist run has applied.
    fn discard(&mut self, applied: &PendingRemovals) {
        self.timelines.retain(|id| !applied.timelines.contains(id));
        self.milestones.retain(|id| !applied.milestones.contains(id));
        self.dependencies.retain(|id| !applied.dependencies.contains(id));
    }
}

fn check_status(from: Status, to: Status) -> Result<(), StoreError> {
    if from.can_transition_to(to) {
        Ok(())
    } else {
        Err(StoreError::InvalidTransition { from, to })
    }
}

fn check_progress(progress: f64) -> Result<(), StoreError> {
    if is_valid_progress(progress) {
        Ok(())
    } else {
        Err(StoreError::InvalidProgress(progress))
    }
}

fn check_lag(lag_seconds: f64) -> Result<(), StoreError> {
    if lag_seconds.is_finite() {
        Ok(())
    } else {
        Err(StoreError::InvalidLag(lag_seconds))
    }
}

fn check_dates(timeline: &Timeline) -> Result<(), StoreError> {
    if timeline.end_date < timeline.start_date {
        return Err(StoreError::InvalidDateRange {
            start: timeline.start_date,
            end: timeline.end_date,
        });
    }
    Ok(())
}

fn lock_timeline(entry: &Mutex<Timeline>) -> MutexGuard<'_, Timeline> {
    entry.lock().unwrap_or_else(PoisonError::into_inner)
}

impl TimelineStore {
    pub fn new(config: EngineConfig) -> Self {
        Self {
            config,
            timelines: RwLock::new(FxHashMap::default()),
            removed: Mutex::new(PendingRemovals::default()),
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    fn read_map(&self) -> RwLockReadGuard<'_, FxHashMap<String, TimelineEntry>> {
        self.timelines.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_map(&self) -> RwLockWriteGuard<'_, FxHashMap<String, TimelineEntry>> {
        self.timelines.write().unwrap_or_else(PoisonError::into_inner)
    }

    fn entry(&self, timeline_id: &str) -> Result<TimelineEntry, StoreError> {
        self.read_map()
            .get(timeline_id)
            .cloned()
            .ok_or_else(|| StoreError::not_found(EntityKind::Timeline, timeline_id))
    }

    /// Run a mutation on a draft copy of one timeline.
    ///
    /// The draft replaces the stored timeline only if `f` succeeds, so a
    /// rejected mutation leaves no partial writes behind.
    fn mutate<T, F>(&self, timeline_id: &str, f: F) -> Result<T, StoreError>
    where
        F: FnOnce(&mut Timeline) -> Result<T, StoreError>,
    {
        let entry = self.entry(timeline_id)?;
        self.mutate_entry(timeline_id, &entry, f)
    }

    fn mutate_entry<T, F>(
        &self,
        timeline_id: &str,
        entry: &TimelineEntry,
        f: F,
    ) -> Result<T, StoreError>
    where
        F: FnOnce(&mut Timeline) -> Result<T, StoreError>,
    {
        let mut guard = lock_timeline(entry);

        // The entry may have been deleted or replaced before the lock was taken
        let current = self.read_map().get(timeline_id).cloned();
        match current {
            Some(current) if Arc::ptr_eq(&current, entry) => {}
            Some(current) => {
                drop(guard);
                return self.mutate_entry(timeline_id, &current, f);
            }
            None => return Err(StoreError::not_found(EntityKind::Timeline, timeline_id)),
        }

        let mut draft = guard.clone();
        let out = f(&mut draft)?;
        *guard = draft;
        Ok(out)
    }

    fn removals(&self) -> MutexGuard<'_, PendingRemovals> {
        self.removed.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Read one timeline under its lock.
    fn inspect<T, F>(&self, timeline_id: &str, f: F) -> Result<T, StoreError>
    where
        F: FnOnce(&Timeline) -> Result<T, StoreError>,
    {
        let entry = self.entry(timeline_id)?;
        let guard = lock_timeline(&entry);
        f(&guard)
    }

    // ----- Timelines -----

    pub fn create_timeline(&self, request: NewTimeline) -> Result<Timeline, StoreError> {
        let mut timeline = Timeline::new(
            request.project_id,
            request.name,
            request.description,
            request.start_date,
            request.end_date,
        );
        timeline.metadata = request.metadata;
        check_dates(&timeline)?;

        self.write_map()
            .insert(timeline.id.clone(), Arc::new(Mutex::new(timeline.clone())));
        log_changes!(
            self.config.verbosity,
            "Created timeline {} ({:?}) for project {}",
            timeline.id,
            timeline.name,
            timeline.project_id
        );
        Ok(timeline)
    }

    /// Snapshot of a timeline with its milestones and dependencies.
    pub fn get_timeline(&self, timeline_id: &str) -> Result<Timeline, StoreError> {
        self.inspect(timeline_id, |timeline| Ok(timeline.clone()))
    }

    /// Snapshots of all timelines, optionally restricted to one project,
    /// ordered by creation time then id.
    pub fn list_timelines(&self, project_id: Option<&str>) -> Vec<Timeline> {
        let entries: Vec<TimelineEntry> = self.read_map().values().cloned().collect();
        let mut timelines: Vec<Timeline> = entries
            .iter()
            .map(|entry| lock_timeline(entry).clone())
            .filter(|t| project_id.map_or(true, |p| t.project_id == p))
            .collect();
        timelines.sort_by(|a, b| {
            a.created_at
                .cmp(&b.created_at)
                .then_with(|| a.id.cmp(&b.id))
        });
        timelines
    }

    pub fn update_timeline(
        &self,
        timeline_id: &str,
        update: TimelineUpdate,
    ) -> Result<Timeline, StoreError> {
        let updated = self.mutate(timeline_id, |timeline| {
            if let Some(status) = update.status {
                check_status(timeline.status, status)?;
                timeline.status = status;
            }
            if let Some(name) = update.name {
                timeline.name = name;
            }
            if let Some(description) = update.description {
                timeline.description = description;
            }
            if let Some(start_date) = update.start_date {
                timeline.start_date = start_date;
            }
            if let Some(end_date) = update.end_date {
                timeline.end_date = end_date;
            }
            check_dates(timeline)?;
            if let Some(metadata) = update.metadata {
                timeline.metadata = metadata;
            }
            timeline.touch();
            Ok(timeline.clone())
        })?;
        log_changes!(self.config.verbosity, "Updated timeline {}", timeline_id);
        Ok(updated)
    }

    /// Remove a timeline together with all its milestones and dependencies.
    pub fn delete_timeline(&self, timeline_id: &str) -> Result<Timeline, StoreError> {
        let entry = self
            .write_map()
            .remove(timeline_id)
            .ok_or_else(|| StoreError::not_found(EntityKind::Timeline, timeline_id))?;
        let removed = lock_timeline(&entry).clone();
        self.removals().timelines.insert(removed.id.clone());
        log_changes!(
            self.config.verbosity,
            "Deleted timeline {} with {} milestones and {} dependencies",
            timeline_id,
            removed.milestones.len(),
            removed.dependencies.len()
        );
        Ok(removed)
    }

    // ----- Milestones -----

    pub fn create_milestone(
        &self,
        timeline_id: &str,
        request: NewMilestone,
    ) -> Result<Milestone, StoreError> {
        let milestone = self.mutate(timeline_id, |timeline| {
            let mut milestone = Milestone::new(
                timeline_id,
                request.name,
                request.description,
                request.kind,
                request.planned_date,
            );
            milestone.metadata = request.metadata;
            timeline
                .milestones
                .insert(milestone.id.clone(), milestone.clone());
            timeline.touch();
            Ok(milestone)
        })?;
        log_changes!(
            self.config.verbosity,
            "Created milestone {} in timeline {}",
            milestone.id,
            timeline_id
        );
        Ok(milestone)
    }

    pub fn get_milestone(
        &self,
        timeline_id: &str,
        milestone_id: &str,
    ) -> Result<Milestone, StoreError> {
        self.inspect(timeline_id, |timeline| {
            timeline
                .milestones
                .get(milestone_id)
                .cloned()
                .ok_or_else(|| StoreError::not_found(EntityKind::Milestone, milestone_id))
        })
    }

    pub fn update_milestone(
        &self,
        timeline_id: &str,
        milestone_id: &str,
        update: MilestoneUpdate,
    ) -> Result<Milestone, StoreError> {
        let updated = self.mutate(timeline_id, |timeline| {
            let milestone = timeline
                .milestones
                .get_mut(milestone_id)
                .ok_or_else(|| StoreError::not_found(EntityKind::Milestone, milestone_id))?;

            if let Some(progress) = update.progress {
                check_progress(progress)?;
                milestone.progress = progress;
            }
            if let Some(status) = update.status {
                check_status(milestone.status, status)?;
                milestone.status = status;
            }
            if let Some(name) = update.name {
                milestone.name = name;
            }
            if let Some(description) = update.description {
                milestone.description = description;
            }
            if let Some(kind) = update.kind {
                milestone.kind = kind;
            }
            if let Some(planned_date) = update.planned_date {
                milestone.planned_date = planned_date;
            }
            if let Some(actual_date) = update.actual_date {
                milestone.actual_date = Some(actual_date);
            }
            if let Some(metadata) = update.metadata {
                milestone.metadata = metadata;
            }
            milestone.touch();
            let updated = milestone.clone();
            timeline.touch();
            Ok(updated)
        })?;
        log_changes!(
            self.config.verbosity,
            "Updated milestone {} in timeline {}",
            milestone_id,
            timeline_id
        );
        Ok(updated)
    }

    /// Remove a milestone and every dependency that starts or ends at it.
    pub fn delete_milestone(
        &self,
        timeline_id: &str,
        milestone_id: &str,
    ) -> Result<Milestone, StoreError> {
        let (removed, cascaded) = self.mutate(timeline_id, |timeline| {
            let removed = timeline
                .milestones
                .remove(milestone_id)
                .ok_or_else(|| StoreError::not_found(EntityKind::Milestone, milestone_id))?;
            let doomed = timeline.dependencies_touching(milestone_id);
            for dependency_id in &doomed {
                timeline.dependencies.remove(dependency_id);
            }
            refresh_predecessors(timeline);
            timeline.touch();
            Ok((removed, doomed))
        })?;
        let mut removals = self.removals();
        removals.milestones.insert(removed.id.clone());
        removals.dependencies.extend(cascaded.iter().cloned());
        drop(removals);
        log_changes!(
            self.config.verbosity,
            "Deleted milestone {} from timeline {} ({} dependencies removed)",
            milestone_id,
            timeline_id,
            cascaded.len()
        );
        Ok(removed)
    }

    // ----- Dependencies -----

    /// Add a dependency between two milestones of the same timeline.
    ///
    /// Cycles are accepted here and rejected when the critical path is next
    /// calculated.
    pub fn create_dependency(
        &self,
        timeline_id: &str,
        request: NewDependency,
    ) -> Result<Dependency, StoreError> {
        check_lag(request.lag_seconds)?;
        if request.source_id == request.target_id {
            return Err(StoreError::InvalidEndpoint(format!(
                "milestone {} cannot depend on itself",
                request.source_id
            )));
        }

        let dependency = self.mutate(timeline_id, |timeline| {
            for endpoint in [&request.source_id, &request.target_id] {
                if !timeline.milestones.contains_key(endpoint.as_str()) {
                    return Err(StoreError::InvalidEndpoint(format!(
                        "milestone {} is not part of timeline {}",
                        endpoint, timeline_id
                    )));
                }
            }

            let mut dependency = Dependency::new(
                timeline_id,
                request.source_id,
                request.target_id,
                request.kind,
                request.lag_seconds,
            );
            dependency.metadata = request.metadata;
            timeline
                .dependencies
                .insert(dependency.id.clone(), dependency.clone());
            refresh_predecessors(timeline);
            timeline.touch();
            Ok(dependency)
        })?;
        log_changes!(
            self.config.verbosity,
            "Created dependency {} ({} -> {}, {}) in timeline {}",
            dependency.id,
            dependency.source_id,
            dependency.target_id,
            dependency.kind.as_str(),
            timeline_id
        );
        Ok(dependency)
    }

    pub fn get_dependency(
        &self,
        timeline_id: &str,
        dependency_id: &str,
    ) -> Result<Dependency, StoreError> {
        self.inspect(timeline_id, |timeline| {
            timeline
                .dependencies
                .get(dependency_id)
                .cloned()
                .ok_or_else(|| StoreError::not_found(EntityKind::Dependency, dependency_id))
        })
    }

    pub fn update_dependency(
        &self,
        timeline_id: &str,
        dependency_id: &str,
        update: DependencyUpdate,
    ) -> Result<Dependency, StoreError> {
        if let Some(lag_seconds) = update.lag_seconds {
            check_lag(lag_seconds)?;
        }
        let updated = self.mutate(timeline_id, |timeline| {
            let dependency = timeline
                .dependencies
                .get_mut(dependency_id)
                .ok_or_else(|| StoreError::not_found(EntityKind::Dependency, dependency_id))?;
            if let Some(kind) = update.kind {
                dependency.kind = kind;
            }
            if let Some(lag_seconds) = update.lag_seconds {
                dependency.lag_seconds = lag_seconds;
            }
            if let Some(metadata) = update.metadata {
                dependency.metadata = metadata;
            }
            dependency.touch();
            let updated = dependency.clone();
            timeline.touch();
            Ok(updated)
        })?;
        log_changes!(
            self.config.verbosity,
            "Updated dependency {} in timeline {}",
            dependency_id,
            timeline_id
        );
        Ok(updated)
    }

    pub fn delete_dependency(
        &self,
        timeline_id: &str,
        dependency_id: &str,
    ) -> Result<Dependency, StoreError> {
        let removed = self.mutate(timeline_id, |timeline| {
            let removed = timeline
                .dependencies
                .remove(dependency_id)
                .ok_or_else(|| StoreError::not_found(EntityKind::Dependency, dependency_id))?;
            refresh_predecessors(timeline);
            timeline.touch();
            Ok(removed)
        })?;
        self.removals().dependencies.insert(removed.id.clone());
        log_changes!(
            self.config.verbosity,
            "Deleted dependency {} from timeline {}",
            dependency_id,
            timeline_id
        );
        Ok(removed)
    }

    // ----- Scheduling and aggregation -----

    /// Full CPM result (critical path, per-milestone times, project duration).
    pub fn analyze_schedule(&self, timeline_id: &str) -> Result<CriticalPathResult, StoreError> {
        if !self.config.critical_path_enabled {
            return Err(StoreError::CriticalPathDisabled);
        }

        // The graph is an owned snapshot; solve it without holding the lock
        let graph = self.inspect(timeline_id, |timeline| Ok(ScheduleGraph::build(timeline)?))?;

        let result = ensure_acyclic(&graph)
            .and_then(|_| compute_critical_path(&graph, &self.config))
            .map_err(|err| {
                log_passes!(
                    self.config.verbosity,
                    "Critical path for timeline {} failed: {}",
                    timeline_id,
                    err
                );
                err
            })?;
        Ok(result)
    }

    /// Critical milestone ids ordered by earliest start, ties by id.
    pub fn calculate_critical_path(&self, timeline_id: &str) -> Result<Vec<String>, StoreError> {
        self.analyze_schedule(timeline_id)
            .map(|result| result.critical_path)
    }

    /// Recompute and store a timeline's progress from its milestones.
    pub fn update_progress(&self, timeline_id: &str) -> Result<f64, StoreError> {
        let progress = self.mutate(timeline_id, |timeline| Ok(recompute_progress(timeline)))?;
        log_changes!(
            self.config.verbosity,
            "Timeline {} progress is now {:.1}",
            timeline_id,
            progress
        );
        Ok(progress)
    }

    pub fn summary(&self, timeline_id: &str) -> Result<TimelineSummary, StoreError> {
        self.inspect(timeline_id, |timeline| Ok(summarize(timeline, Utc::now())))
    }

    pub fn health(&self) -> StoreHealth {
        let entries: Vec<TimelineEntry> = self.read_map().values().cloned().collect();
        entries
            .iter()
            .fold(StoreHealth::default(), |mut health, entry| {
                let timeline = lock_timeline(entry);
                health.timeline_count += 1;
                health.milestone_count += timeline.milestones.len();
                health.dependency_count += timeline.dependencies.len();
                health
            })
    }

    // ----- Synchronization with durable storage -----

    /// Hydrate the store from a repository.
    ///
    /// Records that break the rules the mutators enforce are skipped and
    /// logged: timelines with inverted dates or out-of-range progress,
    /// milestones of unknown timelines or with out-of-range progress, and
    /// dependencies that cross timelines, point at unknown milestones, loop
    /// onto themselves or carry a non-finite lag. Loaded timelines replace
    /// in-memory timelines with the same id.
    pub fn load_all(&self, repository: &dyn TimelineRepository) -> Result<SyncReport, StoreError> {
        let timelines = repository.load_timelines()?;
        let milestones = repository.load_milestones()?;
        let dependencies = repository.load_dependencies()?;

        let mut report = SyncReport::default();
        let mut loaded: FxHashMap<String, Timeline> = FxHashMap::default();
        for mut timeline in timelines {
            if let Err(err) = check_dates(&timeline).and(check_progress(timeline.progress)) {
                log_error!("Skipping timeline {}: {}", timeline.id, err);
                report.skipped += 1;
                continue;
            }
            timeline.milestones.clear();
            timeline.dependencies.clear();
            loaded.insert(timeline.id.clone(), timeline);
        }
        report.timelines = loaded.len();

        for milestone in milestones {
            if let Err(err) = check_progress(milestone.progress) {
                log_error!("Skipping milestone {}: {}", milestone.id, err);
                report.skipped += 1;
                continue;
            }
            match loaded.get_mut(&milestone.timeline_id) {
                Some(timeline) => {
                    timeline.milestones.insert(milestone.id.clone(), milestone);
                    report.milestones += 1;
                }
                None => {
                    log_error!(
                        "Skipping milestone {}: unknown timeline {}",
                        milestone.id,
                        milestone.timeline_id
                    );
                    report.skipped += 1;
                }
            }
        }

        for dependency in dependencies {
            if let Err(err) = check_lag(dependency.lag_seconds) {
                log_error!("Skipping dependency {}: {}", dependency.id, err);
                report.skipped += 1;
                continue;
            }
            let owner = loaded.get_mut(&dependency.timeline_id).filter(|timeline| {
                dependency.source_id != dependency.target_id
                    && timeline.milestones.contains_key(&dependency.source_id)
                    && timeline.milestones.contains_key(&dependency.target_id)
            });
            match owner {
                Some(timeline) => {
                    timeline
                        .dependencies
                        .insert(dependency.id.clone(), dependency);
                    report.dependencies += 1;
                }
                None => {
                    log_error!(
                        "Skipping dependency {}: endpoints {} -> {} not valid in timeline {}",
                        dependency.id,
                        dependency.source_id,
                        dependency.target_id,
                        dependency.timeline_id
                    );
                    report.skipped += 1;
                }
            }
        }

        for timeline in loaded.values_mut() {
            refresh_predecessors(timeline);
        }

        let mut map = self.write_map();
        for (id, timeline) in loaded {
            map.insert(id, Arc::new(Mutex::new(timeline)));
        }
        drop(map);

        log_changes!(
            self.config.verbosity,
            "Loaded {} timelines, {} milestones, {} dependencies ({} skipped)",
            report.timelines,
            report.milestones,
            report.dependencies,
            report.skipped
        );
        Ok(report)
    }

    /// Write every timeline, milestone and dependency back to a repository,
    /// and drop the records deleted since the last successful run.
    ///
    /// Snapshots are taken first; no store lock is held during repository
    /// calls. Deletions stay queued if the run fails.
    pub fn persist_all(
        &self,
        repository: &dyn TimelineRepository,
    ) -> Result<SyncReport, StoreError> {
        // Taken before the timeline snapshots, so no queued id is re-persisted
        let removals = self.removals().clone();
        let mut snapshots = self.list_timelines(None);
        snapshots.sort_by(|a, b| a.id.cmp(&b.id));

        let mut report = SyncReport::default();
        for timeline in &snapshots {
            repository.persist_timeline(&timeline.record())?;
            report.timelines += 1;
            for milestone in timeline.milestones.values() {
                repository.persist_milestone(milestone)?;
                report.milestones += 1;
            }
            for dependency in timeline.dependencies.values() {
                repository.persist_dependency(dependency)?;
                report.dependencies += 1;
            }
        }

        for dependency_id in &removals.dependencies {
            repository.remove_dependency(dependency_id)?;
        }
        for milestone_id in &removals.milestones {
            repository.remove_milestone(milestone_id)?;
        }
        for timeline_id in &removals.timelines {
            repository.remove_timeline(timeline_id)?;
        }
        report.removed = removals.timelines.len()
            + removals.milestones.len()
            + removals.dependencies.len();
        repository.flush()?;

        if !removals.is_empty() {
            self.removals().discard(&removals);
        }

        log_changes!(
            self.config.verbosity,
            "Persisted {} timelines, {} milestones, {} dependencies ({} removed)",
            report.timelines,
            report.milestones,
            report.dependencies,
            report.removed
        );
        Ok(report)
    }
}

impl Default for TimelineStore {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}
