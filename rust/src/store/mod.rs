//! Timeline store: CRUD over timelines, milestones and dependencies, plus the
//! scheduling and progress queries that run on top of them.
//!
//! All state lives in memory. A [`TimelineRepository`] is only consulted by
//! [`TimelineStore::load_all`] and [`TimelineStore::persist_all`].

mod core;
mod persistence;
mod requests;

pub use self::core::{EntityKind, StoreError, StoreHealth, SyncReport, TimelineStore};
pub use persistence::{
    JsonFileRepository, MemoryRepository, PersistenceError, RepositorySnapshot,
    TimelineRepository,
};
pub use requests::{
    DependencyUpdate, MilestoneUpdate, NewDependency, NewMilestone, NewTimeline, TimelineUpdate,
};
