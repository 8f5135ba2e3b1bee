//! # loadwise-core
//!
//! Core domain model for the loadwise workload engine.
//!
//! This crate provides:
//! - Domain types: `Project`, `Task`, `Resource`, `Assignment`
//! - Typed durations normalized to work-hours (`duration`)
//! - Date spans, week bucketing and the capacity model (`calendar`)
//! - Data-quality diagnostics (`diagnostics`)
//! - Ingestion of plain plan records into a validated `Project` (`ingest`)
//!
//! ## Example
//!
//! ```rust
//! use chrono::NaiveDate;
//! use loadwise_core::{Assignment, DateRange, Duration, Project, Resource, Task};
//!
//! let start = NaiveDate::from_ymd_opt(2025, 3, 3).unwrap();
//! let end = NaiveDate::from_ymd_opt(2025, 3, 9).unwrap();
//! let week = DateRange::new(start, end).unwrap();
//!
//! let mut project = Project::new("Website", week);
//! project.tasks.push(Task::new("design", week).name("Design mockups"));
//! project.resources.push(Resource::new("ana").max_units(1.0));
//! project.assignments.push(Assignment::new("design", "ana", Duration::hours(40.0)));
//!
//! assert_eq!(project.total_hours("ana"), 40.0);
//! ```

pub mod calendar;
pub mod diagnostics;
pub mod duration;
pub mod ingest;

use serde::{Deserialize, Serialize};

pub use calendar::{capacity, week_start, CapacityError, DateRange};
pub use diagnostics::{CollectingEmitter, Diagnostic, DiagnosticCode, DiagnosticEmitter, Severity};
pub use duration::{Duration, DurationParseError, DurationUnit};
pub use ingest::{ingest, IngestError, Ingested, PlanRecords};

// ============================================================================
// Type Aliases
// ============================================================================

/// Task key as written in the plan file
pub type TaskId = String;

/// Resource key as written in the plan file
pub type ResourceId = String;

// ============================================================================
// Project
// ============================================================================

/// A normalized project plan.
///
/// Built once per plan and treated as immutable for the rest of the analysis.
/// Projects produced by [`ingest`] only contain assignments whose task and
/// resource both exist.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Project {
    /// Human-readable name
    pub name: String,
    /// Overall project date span
    pub span: DateRange,
    pub tasks: Vec<Task>,
    pub resources: Vec<Resource>,
    pub assignments: Vec<Assignment>,
}

impl Project {
    /// Create an empty project covering `span`
    pub fn new(name: impl Into<String>, span: DateRange) -> Self {
        Self {
            name: name.into(),
            span,
            tasks: Vec::new(),
            resources: Vec::new(),
            assignments: Vec::new(),
        }
    }

    /// Look up a task by key
    pub fn get_task(&self, id: &str) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == id)
    }

    /// Look up a resource by key
    pub fn get_resource(&self, id: &str) -> Option<&Resource> {
        self.resources.iter().find(|r| r.id == id)
    }

    /// All assignments of one resource
    pub fn assignments_for<'a>(&'a self, resource_id: &'a str) -> impl Iterator<Item = &'a Assignment> + 'a {
        self.assignments
            .iter()
            .filter(move |a| a.resource_id == resource_id)
    }

    /// Total assigned hours of a resource over the whole plan
    pub fn total_hours(&self, resource_id: &str) -> f64 {
        self.assignments_for(resource_id).map(Assignment::hours).sum()
    }

    /// Tasks that list `task_id` as a predecessor
    pub fn successors_of<'a>(&'a self, task_id: &'a str) -> impl Iterator<Item = &'a Task> + 'a {
        self.tasks
            .iter()
            .filter(move |t| t.predecessors.iter().any(|p| p == task_id))
    }

    /// Resources belonging to a group
    pub fn group_members<'a>(&'a self, group: &'a str) -> impl Iterator<Item = &'a Resource> + 'a {
        self.resources
            .iter()
            .filter(move |r| r.group.as_deref() == Some(group))
    }
}

// ============================================================================
// Task
// ============================================================================

/// A unit of work with fixed dates
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Task {
    /// Unique identifier
    pub id: TaskId,
    /// Human-readable name
    pub name: String,
    /// Start and finish dates, both inclusive
    pub span: DateRange,
    /// Planned duration, if the plan states one
    pub duration: Option<Duration>,
    /// Finish-to-start predecessors
    pub predecessors: Vec<TaskId>,
}

impl Task {
    /// Create a new task with the given ID and span
    pub fn new(id: impl Into<String>, span: DateRange) -> Self {
        let id = id.into();
        Self {
            name: id.clone(),
            id,
            span,
            duration: None,
            predecessors: Vec::new(),
        }
    }

    /// Display name used in reports
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Set the planned duration
    pub fn duration(mut self, duration: Duration) -> Self {
        self.duration = Some(duration);
        self
    }

    /// Add a finish-to-start predecessor
    pub fn depends_on(mut self, predecessor: impl Into<String>) -> Self {
        self.predecessors.push(predecessor.into());
        self
    }

    pub fn start(&self) -> chrono::NaiveDate {
        self.span.start
    }

    pub fn finish(&self) -> chrono::NaiveDate {
        self.span.end
    }

    /// Calendar days covered, both endpoints included
    pub fn calendar_days(&self) -> i64 {
        self.span.days()
    }

    /// Planned duration, falling back to the calendar span
    pub fn effective_duration(&self) -> Duration {
        self.duration
            .unwrap_or_else(|| Duration::calendar_days(self.calendar_days() as f64))
    }
}

// ============================================================================
// Resource
// ============================================================================

/// A person that can be assigned to tasks
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Resource {
    /// Unique identifier
    pub id: ResourceId,
    /// Display name
    pub name: String,
    /// Maximum allocation (1.0 = one full-time equivalent)
    pub max_units: f64,
    /// Team or specialty
    pub group: Option<String>,
}

impl Resource {
    /// Create a new full-time resource with the given ID
    pub fn new(id: impl Into<String>) -> Self {
        let id = id.into();
        Self {
            name: id.clone(),
            id,
            max_units: 1.0,
            group: None,
        }
    }

    /// Set the display name
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Set the maximum allocation
    pub fn max_units(mut self, max_units: f64) -> Self {
        self.max_units = max_units;
        self
    }

    /// Set the group
    pub fn group(mut self, group: impl Into<String>) -> Self {
        self.group = Some(group.into());
        self
    }
}

// ============================================================================
// Assignment
// ============================================================================

/// Work of one resource on one task
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Assignment {
    pub task_id: TaskId,
    pub resource_id: ResourceId,
    /// Assigned work, always stored in hours
    pub work: Duration,
    /// Allocation on this task (1.0 = 100%)
    pub units: f64,
}

impl Assignment {
    /// Create an assignment; the work is normalized to hours
    pub fn new(task_id: impl Into<String>, resource_id: impl Into<String>, work: Duration) -> Self {
        Self {
            task_id: task_id.into(),
            resource_id: resource_id.into(),
            work: Duration::hours(work.as_hours()),
            units: 1.0,
        }
    }

    /// Set the allocation units
    pub fn units(mut self, units: f64) -> Self {
        self.units = units;
        self
    }

    /// Assigned work-hours
    pub fn hours(&self) -> f64 {
        self.work.as_hours()
    }

    /// `task->resource` label used in messages
    pub fn label(&self) -> String {
        format!("{}->{}", self.task_id, self.resource_id)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn range(start: (i32, u32, u32), end: (i32, u32, u32)) -> DateRange {
        DateRange::new(
            NaiveDate::from_ymd_opt(start.0, start.1, start.2).unwrap(),
            NaiveDate::from_ymd_opt(end.0, end.1, end.2).unwrap(),
        )
        .unwrap()
    }

    #[test]
    fn task_builder() {
        let task = Task::new("api", range((2025, 3, 3), (2025, 3, 14)))
            .name("Checkout API")
            .duration(Duration::work_days(10.0))
            .depends_on("schema");

        assert_eq!(task.id, "api");
        assert_eq!(task.name, "Checkout API");
        assert_eq!(task.calendar_days(), 12);
        assert_eq!(task.effective_duration().as_hours(), 80.0);
        assert_eq!(task.predecessors, vec!["schema".to_string()]);
    }

    #[test]
    fn task_duration_falls_back_to_calendar_span() {
        let task = Task::new("t", range((2025, 3, 3), (2025, 3, 16)));
        let d = task.effective_duration();
        assert_eq!(d.unit, DurationUnit::CalendarDays);
        assert_eq!(d.as_hours(), 80.0);
    }

    #[test]
    fn resource_builder_defaults() {
        let r = Resource::new("dev");
        assert_eq!(r.name, "dev");
        assert_eq!(r.max_units, 1.0);
        assert!(r.group.is_none());

        let r = Resource::new("dev").name("Developer").max_units(0.5).group("backend");
        assert_eq!(r.name, "Developer");
        assert_eq!(r.max_units, 0.5);
        assert_eq!(r.group.as_deref(), Some("backend"));
    }

    #[test]
    fn assignment_normalizes_to_hours() {
        let a = Assignment::new("t", "dev", Duration::work_days(2.0)).units(0.5);
        assert_eq!(a.work.unit, DurationUnit::Hours);
        assert_eq!(a.hours(), 16.0);
        assert_eq!(a.units, 0.5);
        assert_eq!(a.label(), "t->dev");
    }

    #[test]
    fn project_lookups() {
        let span = range((2025, 3, 3), (2025, 3, 30));
        let mut project = Project::new("Test", span);
        project.tasks.push(Task::new("a", range((2025, 3, 3), (2025, 3, 7))));
        project
            .tasks
            .push(Task::new("b", range((2025, 3, 10), (2025, 3, 14))).depends_on("a"));
        project.resources.push(Resource::new("dev").group("eng"));
        project.resources.push(Resource::new("qa"));
        project
            .assignments
            .push(Assignment::new("a", "dev", Duration::hours(30.0)));
        project
            .assignments
            .push(Assignment::new("b", "dev", Duration::hours(10.0)));

        assert!(project.get_task("a").is_some());
        assert!(project.get_task("zzz").is_none());
        assert!(project.get_resource("qa").is_some());
        assert_eq!(project.total_hours("dev"), 40.0);
        assert_eq!(project.total_hours("qa"), 0.0);

        let successors: Vec<_> = project.successors_of("a").map(|t| t.id.as_str()).collect();
        assert_eq!(successors, vec!["b"]);

        let eng: Vec<_> = project.group_members("eng").map(|r| r.id.as_str()).collect();
        assert_eq!(eng, vec!["dev"]);
    }
}
