//! Core data types for timelines, milestones and dependencies.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use uuid::Uuid;

/// Free-form JSON metadata attached to every entity.
pub type Metadata = serde_json::Map<String, serde_json::Value>;

/// Generate a fresh opaque entity id.
pub fn new_id() -> String {
    Uuid::new_v4().to_string()
}

/// Signed number of seconds from `from` to `to`.
pub fn seconds_between(from: DateTime<Utc>, to: DateTime<Utc>) -> f64 {
    (to - from).num_milliseconds() as f64 / 1000.0
}

/// Whether `progress` is a finite percentage in [0, 100].
pub fn is_valid_progress(progress: f64) -> bool {
    progress.is_finite() && (0.0..=100.0).contains(&progress)
}

/// Error returned when parsing an enum from its wire name fails.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Unknown {kind}: {value:?}")]
pub struct UnknownVariant {
    pub kind: &'static str,
    pub value: String,
}

/// Lifecycle status shared by timelines and milestones.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    Planned,
    InProgress,
    Completed,
    Delayed,
    OnHold,
    Cancelled,
}

impl Status {
    pub const ALL: [Status; 6] = [
        Status::Planned,
        Status::InProgress,
        Status::Completed,
        Status::Delayed,
        Status::OnHold,
        Status::Cancelled,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Status::Planned => "planned",
            Status::InProgress => "in_progress",
            Status::Completed => "completed",
            Status::Delayed => "delayed",
            Status::OnHold => "on_hold",
            Status::Cancelled => "cancelled",
        }
    }

    /// Completed and cancelled entities never change status again.
    pub fn is_terminal(self) -> bool {
        matches!(self, Status::Completed | Status::Cancelled)
    }

    /// Whether the lifecycle allows moving from `self` to `next`.
    ///
    /// `planned -> in_progress -> {completed | delayed | on_hold | cancelled}`,
    /// with `delayed` and `on_hold` allowed back to `in_progress`.
    /// Re-asserting the current status is always allowed.
    pub fn can_transition_to(self, next: Status) -> bool {
        if self == next {
            return true;
        }
        match self {
            Status::Planned => next == Status::InProgress,
            Status::InProgress => matches!(
                next,
                Status::Completed | Status::Delayed | Status::OnHold | Status::Cancelled
            ),
            Status::Delayed | Status::OnHold => next == Status::InProgress,
            Status::Completed | Status::Cancelled => false,
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Status {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Status::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| UnknownVariant {
                kind: "status",
                value: s.to_string(),
            })
    }
}

/// What a milestone marks in the timeline.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MilestoneKind {
    Start,
    End,
    Checkpoint,
    Deliverable,
    Review,
    Decision,
}

impl MilestoneKind {
    pub fn as_str(self) -> &'static str {
        match self {
            MilestoneKind::Start => "start",
            MilestoneKind::End => "end",
            MilestoneKind::Checkpoint => "checkpoint",
            MilestoneKind::Deliverable => "deliverable",
            MilestoneKind::Review => "review",
            MilestoneKind::Decision => "decision",
        }
    }
}

impl FromStr for MilestoneKind {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "start" => Ok(MilestoneKind::Start),
            "end" => Ok(MilestoneKind::End),
            "checkpoint" => Ok(MilestoneKind::Checkpoint),
            "deliverable" => Ok(MilestoneKind::Deliverable),
            "review" => Ok(MilestoneKind::Review),
            "decision" => Ok(MilestoneKind::Decision),
            _ => Err(UnknownVariant {
                kind: "milestone type",
                value: s.to_string(),
            }),
        }
    }
}

/// Precedence relation between the source and target milestone.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DependencyKind {
    /// Target can't start until source finishes.
    #[default]
    FinishToStart,
    /// Target can't start until source starts.
    StartToStart,
    /// Target can't finish until source finishes.
    FinishToFinish,
    /// Target can't finish until source starts.
    StartToFinish,
}

impl DependencyKind {
    pub fn as_str(self) -> &'static str {
        match self {
            DependencyKind::FinishToStart => "finish_to_start",
            DependencyKind::StartToStart => "start_to_start",
            DependencyKind::FinishToFinish => "finish_to_finish",
            DependencyKind::StartToFinish => "start_to_finish",
        }
    }
}

impl FromStr for DependencyKind {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "finish_to_start" => Ok(DependencyKind::FinishToStart),
            "start_to_start" => Ok(DependencyKind::StartToStart),
            "finish_to_finish" => Ok(DependencyKind::FinishToFinish),
            "start_to_finish" => Ok(DependencyKind::StartToFinish),
            _ => Err(UnknownVariant {
                kind: "dependency type",
                value: s.to_string(),
            }),
        }
    }
}

/// A project timeline owning its milestones and dependencies.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Timeline {
    pub id: String,
    pub project_id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub status: Status,
    #[serde(default)]
    pub progress: f64,
    /// Milestones keyed by id.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub milestones: BTreeMap<String, Milestone>,
    /// Dependencies keyed by id.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub dependencies: BTreeMap<String, Dependency>,
    #[serde(default)]
    pub metadata: Metadata,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Timeline {
    /// Create a planned, empty timeline with a fresh id.
    pub fn new(
        project_id: impl Into<String>,
        name: impl Into<String>,
        description: impl Into<String>,
        start_date: DateTime<Utc>,
        end_date: DateTime<Utc>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: new_id(),
            project_id: project_id.into(),
            name: name.into(),
            description: description.into(),
            start_date,
            end_date,
            status: Status::Planned,
            progress: 0.0,
            milestones: BTreeMap::new(),
            dependencies: BTreeMap::new(),
            metadata: Metadata::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Touch the updated timestamp.
    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }

    /// Copy of the timeline's own fields, without milestones or dependencies.
    pub fn record(&self) -> Timeline {
        Timeline {
            milestones: BTreeMap::new(),
            dependencies: BTreeMap::new(),
            ..self.clone()
        }
    }

    /// Ids of dependencies that reference `milestone_id` at either end.
    pub fn dependencies_touching(&self, milestone_id: &str) -> Vec<String> {
        self.dependencies
            .values()
            .filter(|dep| dep.references(milestone_id))
            .map(|dep| dep.id.clone())
            .collect()
    }
}

/// A dated point in a timeline.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Milestone {
    pub id: String,
    pub timeline_id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(rename = "type")]
    pub kind: MilestoneKind,
    pub planned_date: DateTime<Utc>,
    #[serde(default)]
    pub actual_date: Option<DateTime<Utc>>,
    pub status: Status,
    #[serde(default)]
    pub progress: f64,
    /// Source milestone ids of incoming dependencies.
    ///
    /// Derived from the timeline's dependency set; rebuilt by
    /// [`crate::progress::refresh_predecessors`], never edited directly.
    #[serde(default)]
    pub predecessors: Vec<String>,
    #[serde(default)]
    pub metadata: Metadata,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Milestone {
    pub fn new(
        timeline_id: impl Into<String>,
        name: impl Into<String>,
        description: impl Into<String>,
        kind: MilestoneKind,
        planned_date: DateTime<Utc>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: new_id(),
            timeline_id: timeline_id.into(),
            name: name.into(),
            description: description.into(),
            kind,
            planned_date,
            actual_date: None,
            status: Status::Planned,
            progress: 0.0,
            predecessors: Vec::new(),
            metadata: Metadata::new(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

/// A precedence edge between two milestones of the same timeline.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Dependency {
    pub id: String,
    pub timeline_id: String,
    pub source_id: String,
    pub target_id: String,
    #[serde(rename = "type", default)]
    pub kind: DependencyKind,
    /// Signed lag in seconds; negative values are leads.
    #[serde(default)]
    pub lag_seconds: f64,
    #[serde(default)]
    pub metadata: Metadata,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Dependency {
    pub fn new(
        timeline_id: impl Into<String>,
        source_id: impl Into<String>,
        target_id: impl Into<String>,
        kind: DependencyKind,
        lag_seconds: f64,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: new_id(),
            timeline_id: timeline_id.into(),
            source_id: source_id.into(),
            target_id: target_id.into(),
            kind,
            lag_seconds,
            metadata: Metadata::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Whether the dependency starts or ends at `milestone_id`.
    pub fn references(&self, milestone_id: &str) -> bool {
        self.source_id == milestone_id || self.target_id == milestone_id
    }

    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}
