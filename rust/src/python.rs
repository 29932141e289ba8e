//! Python bindings for the timeline engine.
//!
//! Entities cross the boundary as JSON documents; dates are timezone-aware
//! `datetime` objects.

use chrono::{DateTime, Utc};
use pyo3::exceptions::{PyKeyError, PyRuntimeError, PyValueError};
use pyo3::prelude::*;
use serde::Serialize;

use crate::config::EngineConfig;
use crate::critical_path::analyze_timeline;
use crate::models::{DependencyKind, MilestoneKind, Timeline};
use crate::store::{
    DependencyUpdate, JsonFileRepository, MilestoneUpdate, NewDependency, NewMilestone,
    NewTimeline, StoreError, TimelineStore, TimelineUpdate,
};

fn to_py_err(err: StoreError) -> PyErr {
    match err {
        StoreError::NotFound { .. } => PyKeyError::new_err(err.to_string()),
        StoreError::Persistence(_) => PyRuntimeError::new_err(err.to_string()),
        _ => PyValueError::new_err(err.to_string()),
    }
}

fn to_json<T: Serialize>(value: &T) -> PyResult<String> {
    serde_json::to_string(value).map_err(|e| PyValueError::new_err(e.to_string()))
}

fn from_json<'de, T: serde::Deserialize<'de>>(json: &'de str) -> PyResult<T> {
    serde_json::from_str(json).map_err(|e| PyValueError::new_err(e.to_string()))
}

fn parse<T: std::str::FromStr>(value: &str) -> PyResult<T>
where
    T::Err: std::fmt::Display,
{
    value
        .parse()
        .map_err(|e: T::Err| PyValueError::new_err(e.to_string()))
}

/// In-memory timeline store exposed to Python.
#[pyclass(name = "TimelineEngine")]
pub struct PyTimelineEngine {
    store: TimelineStore,
}

#[pymethods]
impl PyTimelineEngine {
    /// Without arguments the configuration is read from the environment.
    #[new]
    #[pyo3(signature = (slack_epsilon=None, verbosity=None, critical_path_enabled=None))]
    fn new(
        slack_epsilon: Option<f64>,
        verbosity: Option<u8>,
        critical_path_enabled: Option<bool>,
    ) -> Self {
        let mut config = EngineConfig::from_env();
        if let Some(epsilon) = slack_epsilon {
            config = config.with_slack_epsilon(epsilon);
        }
        if let Some(level) = verbosity {
            config = config.with_verbosity(level);
        }
        if let Some(enabled) = critical_path_enabled {
            config = config.with_critical_path_enabled(enabled);
        }
        Self {
            store: TimelineStore::new(config),
        }
    }

    #[pyo3(signature = (project_id, name, start_date, end_date, description=String::new()))]
    fn create_timeline(
        &self,
        project_id: String,
        name: String,
        start_date: DateTime<Utc>,
        end_date: DateTime<Utc>,
        description: String,
    ) -> PyResult<String> {
        let request =
            NewTimeline::new(project_id, name, start_date, end_date).with_description(description);
        let timeline = self.store.create_timeline(request).map_err(to_py_err)?;
        Ok(timeline.id)
    }

    fn get_timeline(&self, timeline_id: &str) -> PyResult<String> {
        to_json(&self.store.get_timeline(timeline_id).map_err(to_py_err)?)
    }

    #[pyo3(signature = (project_id=None))]
    fn list_timelines(&self, project_id: Option<&str>) -> PyResult<String> {
        to_json(&self.store.list_timelines(project_id))
    }

    /// `update_json` holds only the fields to change.
    fn update_timeline(&self, timeline_id: &str, update_json: &str) -> PyResult<String> {
        let update: TimelineUpdate = from_json(update_json)?;
        to_json(&self.store.update_timeline(timeline_id, update).map_err(to_py_err)?)
    }

    fn delete_timeline(&self, timeline_id: &str) -> PyResult<()> {
        self.store.delete_timeline(timeline_id).map_err(to_py_err)?;
        Ok(())
    }

    #[pyo3(signature = (timeline_id, name, kind, planned_date, description=String::new()))]
    fn create_milestone(
        &self,
        timeline_id: &str,
        name: String,
        kind: &str,
        planned_date: DateTime<Utc>,
        description: String,
    ) -> PyResult<String> {
        let kind: MilestoneKind = parse(kind)?;
        let request = NewMilestone::new(name, kind, planned_date).with_description(description);
        let milestone = self
            .store
            .create_milestone(timeline_id, request)
            .map_err(to_py_err)?;
        Ok(milestone.id)
    }

    fn get_milestone(&self, timeline_id: &str, milestone_id: &str) -> PyResult<String> {
        to_json(
            &self
                .store
                .get_milestone(timeline_id, milestone_id)
                .map_err(to_py_err)?,
        )
    }

    fn update_milestone(
        &self,
        timeline_id: &str,
        milestone_id: &str,
        update_json: &str,
    ) -> PyResult<String> {
        let update: MilestoneUpdate = from_json(update_json)?;
        to_json(
            &self
                .store
                .update_milestone(timeline_id, milestone_id, update)
                .map_err(to_py_err)?,
        )
    }

    fn delete_milestone(&self, timeline_id: &str, milestone_id: &str) -> PyResult<()> {
        self.store
            .delete_milestone(timeline_id, milestone_id)
            .map_err(to_py_err)?;
        Ok(())
    }

    #[pyo3(signature = (timeline_id, source_id, target_id, kind="finish_to_start", lag_seconds=0.0))]
    fn create_dependency(
        &self,
        timeline_id: &str,
        source_id: String,
        target_id: String,
        kind: &str,
        lag_seconds: f64,
    ) -> PyResult<String> {
        let kind: DependencyKind = parse(kind)?;
        let request = NewDependency::new(source_id, target_id)
            .with_kind(kind)
            .with_lag_seconds(lag_seconds);
        let dependency = self
            .store
            .create_dependency(timeline_id, request)
            .map_err(to_py_err)?;
        Ok(dependency.id)
    }

    fn get_dependency(&self, timeline_id: &str, dependency_id: &str) -> PyResult<String> {
        to_json(
            &self
                .store
                .get_dependency(timeline_id, dependency_id)
                .map_err(to_py_err)?,
        )
    }

    fn update_dependency(
        &self,
        timeline_id: &str,
        dependency_id: &str,
        update_json: &str,
    ) -> PyResult<String> {
        let update: DependencyUpdate = from_json(update_json)?;
        to_json(
            &self
                .store
                .update_dependency(timeline_id, dependency_id, update)
                .map_err(to_py_err)?,
        )
    }

    fn delete_dependency(&self, timeline_id: &str, dependency_id: &str) -> PyResult<()> {
        self.store
            .delete_dependency(timeline_id, dependency_id)
            .map_err(to_py_err)?;
        Ok(())
    }

    /// Critical milestone ids ordered by earliest start.
    fn calculate_critical_path(&self, py: Python<'_>, timeline_id: &str) -> PyResult<Vec<String>> {
        py.allow_threads(|| self.store.calculate_critical_path(timeline_id))
            .map_err(to_py_err)
    }

    /// Full CPM result as JSON: critical path, node times, project duration.
    fn analyze_schedule(&self, py: Python<'_>, timeline_id: &str) -> PyResult<String> {
        let result = py
            .allow_threads(|| self.store.analyze_schedule(timeline_id))
            .map_err(to_py_err)?;
        to_json(&result)
    }

    fn update_progress(&self, timeline_id: &str) -> PyResult<f64> {
        self.store.update_progress(timeline_id).map_err(to_py_err)
    }

    fn summary(&self, timeline_id: &str) -> PyResult<String> {
        to_json(&self.store.summary(timeline_id).map_err(to_py_err)?)
    }

    /// Returns (timelines, milestones, dependencies) currently held.
    fn health(&self) -> (usize, usize, usize) {
        let health = self.store.health();
        (
            health.timeline_count,
            health.milestone_count,
            health.dependency_count,
        )
    }

    /// Load every record from a JSON repository file. Returns the number of
    /// records skipped as invalid.
    fn load_file(&self, path: &str) -> PyResult<usize> {
        let repository =
            JsonFileRepository::open(path).map_err(|e| to_py_err(StoreError::Persistence(e)))?;
        let report = self.store.load_all(&repository).map_err(to_py_err)?;
        Ok(report.skipped)
    }

    /// Write every record to a JSON repository file, keeping records it
    /// already holds that are no longer in memory.
    fn persist_file(&self, path: &str) -> PyResult<()> {
        let repository =
            JsonFileRepository::open(path).map_err(|e| to_py_err(StoreError::Persistence(e)))?;
        self.store.persist_all(&repository).map_err(to_py_err)?;
        Ok(())
    }

    fn __repr__(&self) -> String {
        let health = self.store.health();
        format!(
            "TimelineEngine(timelines={}, milestones={}, dependencies={})",
            health.timeline_count, health.milestone_count, health.dependency_count
        )
    }
}

/// Critical path of a standalone timeline document (JSON with nested
/// milestones and dependencies).
#[pyfunction]
fn critical_path_from_json(timeline_json: &str) -> PyResult<String> {
    let timeline: Timeline = from_json(timeline_json)?;
    let result = analyze_timeline(&timeline, &EngineConfig::from_env())
        .map_err(|e| to_py_err(StoreError::Cpm(e)))?;
    to_json(&result)
}

/// The timeline_cpm Python module.
#[pymodule]
fn timeline_cpm(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_class::<PyTimelineEngine>()?;
    m.add_function(wrap_pyfunction!(critical_path_from_json, m)?)?;
    Ok(())
}
