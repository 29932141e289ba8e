//! Inputs for store mutations.
//!
//! Update types use `None` for "leave unchanged".

use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::models::{DependencyKind, Metadata, MilestoneKind, Status};

/// Fields for a new timeline. Status starts at `planned`, progress at 0.
#[derive(Clone, Debug, Deserialize)]
pub struct NewTimeline {
    pub project_id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    #[serde(default)]
    pub metadata: Metadata,
}

impl NewTimeline {
    pub fn new(
        project_id: impl Into<String>,
        name: impl Into<String>,
        start_date: DateTime<Utc>,
        end_date: DateTime<Utc>,
    ) -> Self {
        Self {
            project_id: project_id.into(),
            name: name.into(),
            description: String::new(),
            start_date,
            end_date,
            metadata: Metadata::new(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_metadata(mut self, metadata: Metadata) -> Self {
        self.metadata = metadata;
        self
    }
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct TimelineUpdate {
    pub name: Option<String>,
    pub description: Option<String>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub status: Option<Status>,
    pub metadata: Option<Metadata>,
}

/// Fields for a new milestone. Status starts at `planned`, progress at 0.
#[derive(Clone, Debug, Deserialize)]
pub struct NewMilestone {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(rename = "type")]
    pub kind: MilestoneKind,
    pub planned_date: DateTime<Utc>,
    #[serde(default)]
    pub metadata: Metadata,
}

impl NewMilestone {
    pub fn new(name: impl Into<String>, kind: MilestoneKind, planned_date: DateTime<Utc>) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            kind,
            planned_date,
            metadata: Metadata::new(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_metadata(mut self, metadata: Metadata) -> Self {
        self.metadata = metadata;
        self
    }
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct MilestoneUpdate {
    pub name: Option<String>,
    pub description: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<MilestoneKind>,
    pub planned_date: Option<DateTime<Utc>>,
    pub actual_date: Option<DateTime<Utc>>,
    pub status: Option<Status>,
    pub progress: Option<f64>,
    pub metadata: Option<Metadata>,
}

/// Fields for a new dependency between two milestones of one timeline.
#[derive(Clone, Debug, Deserialize)]
pub struct NewDependency {
    pub source_id: String,
    pub target_id: String,
    #[serde(rename = "type", default)]
    pub kind: DependencyKind,
    #[serde(default)]
    pub lag_seconds: f64,
    #[serde(default)]
    pub metadata: Metadata,
}

impl NewDependency {
    /// Finish-to-start dependency without lag.
    pub fn new(source_id: impl Into<String>, target_id: impl Into<String>) -> Self {
        Self {
            source_id: source_id.into(),
            target_id: target_id.into(),
            kind: DependencyKind::FinishToStart,
            lag_seconds: 0.0,
            metadata: Metadata::new(),
        }
    }

    pub fn with_kind(mut self, kind: DependencyKind) -> Self {
        self.kind = kind;
        self
    }

    pub fn with_lag_seconds(mut self, lag_seconds: f64) -> Self {
        self.lag_seconds = lag_seconds;
        self
    }
}

/// Endpoints are fixed once a dependency exists; delete and recreate to move it.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct DependencyUpdate {
    #[serde(rename = "type")]
    pub kind: Option<DependencyKind>,
    pub lag_seconds: Option<f64>,
    pub metadata: Option<Metadata>,
}
