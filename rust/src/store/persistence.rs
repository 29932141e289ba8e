//! Durable storage boundary for the timeline store.
//!
//! The store reads every record once at startup and writes snapshots back at
//! shutdown. Critical path results are never persisted.

use serde::{Deserialize, Serialize};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};
use thiserror::Error;

use crate::models::{Dependency, Milestone, Timeline};

/// Errors raised by repository implementations.
#[derive(Error, Debug)]
pub enum PersistenceError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("Repository error: {0}")]
    Backend(String),
}

/// External record store the [`super::TimelineStore`] synchronizes with.
///
/// `persist_*` flushes the mutable fields of records the repository already
/// holds and inserts records it has not seen yet. `remove_*` drops records
/// deleted in memory, cascading like the store does.
pub trait TimelineRepository: Send + Sync {
    fn load_timelines(&self) -> Result<Vec<Timeline>, PersistenceError>;
    fn load_milestones(&self) -> Result<Vec<Milestone>, PersistenceError>;
    fn load_dependencies(&self) -> Result<Vec<Dependency>, PersistenceError>;

    fn persist_timeline(&self, timeline: &Timeline) -> Result<(), PersistenceError>;
    fn persist_milestone(&self, milestone: &Milestone) -> Result<(), PersistenceError>;
    fn persist_dependency(&self, dependency: &Dependency) -> Result<(), PersistenceError>;

    /// Drop a timeline together with its milestones and dependencies.
    /// Unknown ids are ignored.
    fn remove_timeline(&self, timeline_id: &str) -> Result<(), PersistenceError>;
    /// Drop a milestone and every dependency that references it.
    fn remove_milestone(&self, milestone_id: &str) -> Result<(), PersistenceError>;
    fn remove_dependency(&self, dependency_id: &str) -> Result<(), PersistenceError>;

    /// Make buffered writes durable. Called once at the end of a persist run.
    fn flush(&self) -> Result<(), PersistenceError> {
        Ok(())
    }
}

/// Flat record sets as held by a repository.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct RepositorySnapshot {
    #[serde(default)]
    pub timelines: Vec<Timeline>,
    #[serde(default)]
    pub milestones: Vec<Milestone>,
    #[serde(default)]
    pub dependencies: Vec<Dependency>,
}

impl RepositorySnapshot {
    /// Flush status, progress and metadata, or insert the timeline record.
    pub fn upsert_timeline(&mut self, timeline: &Timeline) {
        match self.timelines.iter_mut().find(|t| t.id == timeline.id) {
            Some(existing) => {
                existing.status = timeline.status;
                existing.progress = timeline.progress;
                existing.metadata = timeline.metadata.clone();
                existing.updated_at = timeline.updated_at;
            }
            None => self.timelines.push(timeline.record()),
        }
    }

    /// Flush status, progress, actual date and metadata, or insert the record.
    pub fn upsert_milestone(&mut self, milestone: &Milestone) {
        match self.milestones.iter_mut().find(|m| m.id == milestone.id) {
            Some(existing) => {
                existing.status = milestone.status;
                existing.progress = milestone.progress;
                existing.actual_date = milestone.actual_date;
                existing.metadata = milestone.metadata.clone();
                existing.updated_at = milestone.updated_at;
            }
            None => self.milestones.push(Milestone {
                predecessors: Vec::new(),
                ..milestone.clone()
            }),
        }
    }

    /// Flush type, lag and metadata, or insert the record.
    pub fn upsert_dependency(&mut self, dependency: &Dependency) {
        match self.dependencies.iter_mut().find(|d| d.id == dependency.id) {
            Some(existing) => {
                existing.kind = dependency.kind;
                existing.lag_seconds = dependency.lag_seconds;
                existing.metadata = dependency.metadata.clone();
                existing.updated_at = dependency.updated_at;
            }
            None => self.dependencies.push(dependency.clone()),
        }
    }

    pub fn remove_timeline(&mut self, timeline_id: &str) {
        self.timelines.retain(|t| t.id != timeline_id);
        self.milestones.retain(|m| m.timeline_id != timeline_id);
        self.dependencies.retain(|d| d.timeline_id != timeline_id);
    }

    pub fn remove_milestone(&mut self, milestone_id: &str) {
        self.milestones.retain(|m| m.id != milestone_id);
        self.dependencies.retain(|d| !d.references(milestone_id));
    }

    pub fn remove_dependency(&mut self, dependency_id: &str) {
        self.dependencies.retain(|d| d.id != dependency_id);
    }
}

fn lock(snapshot: &Mutex<RepositorySnapshot>) -> MutexGuard<'_, RepositorySnapshot> {
    snapshot.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Repository kept entirely in memory.
#[derive(Debug, Default)]
pub struct MemoryRepository {
    snapshot: Mutex<RepositorySnapshot>,
}

impl MemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_snapshot(snapshot: RepositorySnapshot) -> Self {
        Self {
            snapshot: Mutex::new(snapshot),
        }
    }

    /// Copy of everything the repository currently holds.
    pub fn snapshot(&self) -> RepositorySnapshot {
        lock(&self.snapshot).clone()
    }
}

impl TimelineRepository for MemoryRepository {
    fn load_timelines(&self) -> Result<Vec<Timeline>, PersistenceError> {
        Ok(lock(&self.snapshot).timelines.clone())
    }

    fn load_milestones(&self) -> Result<Vec<Milestone>, PersistenceError> {
        Ok(lock(&self.snapshot).milestones.clone())
    }

    fn load_dependencies(&self) -> Result<Vec<Dependency>, PersistenceError> {
        Ok(lock(&self.snapshot).dependencies.clone())
    }

    fn persist_timeline(&self, timeline: &Timeline) -> Result<(), PersistenceError> {
        lock(&self.snapshot).upsert_timeline(timeline);
        Ok(())
    }

    fn persist_milestone(&self, milestone: &Milestone) -> Result<(), PersistenceError> {
        lock(&self.snapshot).upsert_milestone(milestone);
        Ok(())
    }

    fn persist_dependency(&self, dependency: &Dependency) -> Result<(), PersistenceError> {
        lock(&self.snapshot).upsert_dependency(dependency);
        Ok(())
    }

    fn remove_timeline(&self, timeline_id: &str) -> Result<(), PersistenceError> {
        lock(&self.snapshot).remove_timeline(timeline_id);
        Ok(())
    }

    fn remove_milestone(&self, milestone_id: &str) -> Result<(), PersistenceError> {
        lock(&self.snapshot).remove_milestone(milestone_id);
        Ok(())
    }

    fn remove_dependency(&self, dependency_id: &str) -> Result<(), PersistenceError> {
        lock(&self.snapshot).remove_dependency(dependency_id);
        Ok(())
    }
}

/// Repository backed by a single pretty-printed JSON document.
///
/// The document is read on [`JsonFileRepository::open`]; writes are buffered
/// and land on disk on [`TimelineRepository::flush`] through a temporary file
/// and a rename.
#[derive(Debug)]
pub struct JsonFileRepository {
    path: PathBuf,
    snapshot: Mutex<RepositorySnapshot>,
}

impl JsonFileRepository {
    /// Open a repository file. A missing file is an empty repository.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, PersistenceError> {
        let path = path.as_ref().to_path_buf();
        let snapshot = match fs::read_to_string(&path) {
            Ok(json) if json.trim().is_empty() => RepositorySnapshot::default(),
            Ok(json) => serde_json::from_str(&json)?,
            Err(err) if err.kind() == ErrorKind::NotFound => RepositorySnapshot::default(),
            Err(err) => return Err(err.into()),
        };
        Ok(Self {
            path,
            snapshot: Mutex::new(snapshot),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl TimelineRepository for JsonFileRepository {
    fn load_timelines(&self) -> Result<Vec<Timeline>, PersistenceError> {
        Ok(lock(&self.snapshot).timelines.clone())
    }

    fn load_milestones(&self) -> Result<Vec<Milestone>, PersistenceError> {
        Ok(lock(&self.snapshot).milestones.clone())
    }

    fn load_dependencies(&self) -> Result<Vec<Dependency>, PersistenceError> {
        Ok(lock(&self.snapshot).dependencies.clone())
    }

    fn persist_timeline(&self, timeline: &Timeline) -> Result<(), PersistenceError> {
        lock(&self.snapshot).upsert_timeline(timeline);
        Ok(())
    }

    fn persist_milestone(&self, milestone: &Milestone) -> Result<(), PersistenceError> {
        lock(&self.snapshot).upsert_milestone(milestone);
        Ok(())
    }

    fn persist_dependency(&self, dependency: &Dependency) -> Result<(), PersistenceError> {
        lock(&self.snapshot).upsert_dependency(dependency);
        Ok(())
    }

    fn remove_timeline(&self, timeline_id: &str) -> Result<(), PersistenceError> {
        lock(&self.snapshot).remove_timeline(timeline_id);
        Ok(())
    }

    fn remove_milestone(&self, milestone_id: &str) -> Result<(), PersistenceError> {
        lock(&self.snapshot).remove_milestone(milestone_id);
        Ok(())
    }

    fn remove_dependency(&self, dependency_id: &str) -> Result<(), PersistenceError> {
        lock(&self.snapshot).remove_dependency(dependency_id);
        Ok(())
    }

    fn flush(&self) -> Result<(), PersistenceError> {
        let json = serde_json::to_string_pretty(&*lock(&self.snapshot))?;
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, json)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}
