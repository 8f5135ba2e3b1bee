//! Workload Aggregation
//!
//! Turns assignments into assigned hours per resource, both over a whole date
//! range and per Monday-aligned week inside it.
//!
//! A task's hours are apportioned by calendar-day overlap: a task spanning
//! 10 days with 3 of them in week 1 puts 30% of its hours into week 1. Hours
//! of the part of a task outside the range are not counted.

use chrono::NaiveDate;
use loadwise_core::calendar::range_capacity;
use loadwise_core::{DateRange, Diagnostic, DiagnosticCode, Project, Resource, ResourceId, TaskId};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use tracing::debug;

use crate::classify::{LoadStatus, Thresholds};
use crate::AnalysisError;

// ============================================================================
// Resource selection
// ============================================================================

/// Which resources an analysis covers
#[derive(Clone, Debug, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceFilter {
    #[default]
    All,
    Ids(BTreeSet<ResourceId>),
    Group(String),
}

impl ResourceFilter {
    pub fn ids<I, S>(ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::Ids(ids.into_iter().map(Into::into).collect())
    }

    pub fn matches(&self, resource: &Resource) -> bool {
        match self {
            ResourceFilter::All => true,
            ResourceFilter::Ids(ids) => ids.contains(&resource.id),
            ResourceFilter::Group(group) => resource.group.as_deref() == Some(group.as_str()),
        }
    }

    /// Resolve the filter against a project.
    ///
    /// Explicit ids must all exist; an empty selection is an error.
    pub fn select<'a>(&self, project: &'a Project) -> Result<Vec<&'a Resource>, AnalysisError> {
        if let ResourceFilter::Ids(ids) = self {
            if let Some(missing) = ids.iter().find(|id| project.get_resource(id).is_none()) {
                return Err(AnalysisError::UnknownResource(missing.clone()));
            }
        }

        let selected: Vec<_> = project.resources.iter().filter(|r| self.matches(r)).collect();
        if selected.is_empty() {
            return Err(AnalysisError::EmptyResourceFilter {
                filter: self.to_string(),
            });
        }
        Ok(selected)
    }
}

impl fmt::Display for ResourceFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResourceFilter::All => f.write_str("all"),
            ResourceFilter::Ids(ids) => {
                let list: Vec<_> = ids.iter().map(String::as_str).collect();
                write!(f, "ids: {}", list.join(", "))
            }
            ResourceFilter::Group(group) => write!(f, "group: {}", group),
        }
    }
}

// ============================================================================
// Result types
// ============================================================================

/// Hours one task puts into a week
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TaskContribution {
    pub task_id: TaskId,
    pub hours: f64,
}

/// Load of one resource in one week of the analyzed range
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct WeeklyLoad {
    pub resource_id: ResourceId,
    /// Monday of the week
    pub week_start: NaiveDate,
    /// Days of this week inside the range
    pub days: i64,
    pub hours: f64,
    pub capacity_hours: f64,
    pub utilization: f64,
    pub status: LoadStatus,
    /// Contributing tasks, sorted by task id
    pub tasks: Vec<TaskContribution>,
}

impl WeeklyLoad {
    /// Hours a task contributes to this week
    pub fn task_hours(&self, task_id: &str) -> f64 {
        self.tasks
            .iter()
            .find(|c| c.task_id == task_id)
            .map_or(0.0, |c| c.hours)
    }

    fn add(&mut self, task_id: &str, hours: f64) {
        self.hours += hours;
        match self.tasks.iter_mut().find(|c| c.task_id == task_id) {
            Some(c) => c.hours += hours,
            None => self.tasks.push(TaskContribution {
                task_id: task_id.to_string(),
                hours,
            }),
        }
    }
}

/// Load of one resource over the whole analyzed range
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct WorkloadSummary {
    pub resource_id: ResourceId,
    pub name: String,
    pub group: Option<String>,
    pub total_hours: f64,
    pub capacity_hours: f64,
    pub utilization: f64,
    pub status: LoadStatus,
    /// Assignments with at least one day inside the range
    pub assignment_count: usize,
}

impl WorkloadSummary {
    /// Hours above capacity
    pub fn excess_hours(&self) -> f64 {
        (self.total_hours - self.capacity_hours).max(0.0)
    }

    /// Hours left below capacity
    pub fn available_hours(&self) -> f64 {
        (self.capacity_hours - self.total_hours).max(0.0)
    }
}

/// How summary values are presented
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DisplayMode {
    #[default]
    Percentage,
    Hours,
}

/// Summaries plus the selected presentation
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SummaryView {
    pub mode: DisplayMode,
    pub rows: Vec<WorkloadSummary>,
}

impl SummaryView {
    /// The value shown for a row in the current mode
    pub fn display_value(&self, row: &WorkloadSummary) -> f64 {
        match self.mode {
            DisplayMode::Percentage => row.utilization * 100.0,
            DisplayMode::Hours => row.total_hours,
        }
    }

    pub fn unit(&self) -> &'static str {
        match self.mode {
            DisplayMode::Percentage => "%",
            DisplayMode::Hours => "h",
        }
    }
}

/// Derived workload tables for one (range, filter) key
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Aggregation {
    pub range: DateRange,
    pub filter: ResourceFilter,
    pub summaries: BTreeMap<ResourceId, WorkloadSummary>,
    pub weekly: BTreeMap<ResourceId, BTreeMap<NaiveDate, WeeklyLoad>>,
    /// Zero-capacity exclusions and dangling references met while aggregating
    pub diagnostics: Vec<Diagnostic>,
}

impl Aggregation {
    pub fn summary(&self, resource_id: &str) -> Option<&WorkloadSummary> {
        self.summaries.get(resource_id)
    }

    /// Summaries ordered by resource id
    pub fn summary_rows(&self) -> Vec<WorkloadSummary> {
        self.summaries.values().cloned().collect()
    }

    pub fn weeks(&self, resource_id: &str) -> Option<&BTreeMap<NaiveDate, WeeklyLoad>> {
        self.weekly.get(resource_id)
    }

    /// All weekly loads ordered by resource id then week
    pub fn weekly_loads(&self) -> Vec<WeeklyLoad> {
        self.weekly
            .values()
            .flat_map(|weeks| weeks.values().cloned())
            .collect()
    }
}

// ============================================================================
// Aggregation
// ============================================================================

/// Apportion `hours` of a task over the weeks of `range`.
///
/// Each week receives `hours × overlap_days(task, week ∩ range) / task_days`.
/// Weeks without overlap are absent from the result.
pub fn apportion(hours: f64, task: &DateRange, range: &DateRange) -> BTreeMap<NaiveDate, f64> {
    let mut shares = BTreeMap::new();
    let Some(inside) = task.intersect(range) else {
        return shares;
    };
    let task_days = task.days() as f64;
    for (monday, part) in inside.weeks() {
        shares.insert(monday, hours * part.days() as f64 / task_days);
    }
    shares
}

/// Aggregate the selected resources' workload over `range`
pub fn aggregate(
    project: &Project,
    range: DateRange,
    filter: &ResourceFilter,
    thresholds: &Thresholds,
) -> Result<Aggregation, AnalysisError> {
    let selected = filter.select(project)?;
    let weeks = range.weeks();

    let mut summaries = BTreeMap::new();
    let mut weekly = BTreeMap::new();
    let mut diagnostics = Vec::new();

    for resource in selected {
        let capacity_hours = range_capacity(&range, resource.max_units)?;
        if capacity_hours <= 0.0 {
            diagnostics.push(
                Diagnostic::new(
                    DiagnosticCode::I002ZeroCapacity,
                    format!("resource '{}' has no capacity and is excluded from utilization", resource.id),
                )
                .with_subject(&resource.id)
                .with_note(format!("max_units = {}", resource.max_units)),
            );
            continue;
        }

        let mut table = BTreeMap::new();
        for (monday, part) in &weeks {
            table.insert(
                *monday,
                WeeklyLoad {
                    resource_id: resource.id.clone(),
                    week_start: *monday,
                    days: part.days(),
                    hours: 0.0,
                    capacity_hours: range_capacity(part, resource.max_units)?,
                    utilization: 0.0,
                    status: LoadStatus::Underutilized,
                    tasks: Vec::new(),
                },
            );
        }

        let mut total_hours = 0.0;
        let mut assignment_count = 0;
        for assignment in project.assignments_for(&resource.id) {
            let Some(task) = project.get_task(&assignment.task_id) else {
                diagnostics.push(
                    Diagnostic::new(
                        DiagnosticCode::W001UnknownTask,
                        format!("assignment references unknown task '{}'", assignment.task_id),
                    )
                    .with_subject(assignment.label()),
                );
                continue;
            };

            let shares = apportion(assignment.hours(), &task.span, &range);
            if shares.is_empty() {
                continue;
            }
            assignment_count += 1;
            for (monday, hours) in shares {
                total_hours += hours;
                if let Some(week) = table.get_mut(&monday) {
                    week.add(&task.id, hours);
                }
            }
        }

        for week in table.values_mut() {
            week.utilization = week.hours / week.capacity_hours;
            week.status = thresholds.classify(week.utilization);
            week.tasks.sort_by(|a, b| a.task_id.cmp(&b.task_id));
        }

        let utilization = total_hours / capacity_hours;
        debug!(
            resource = %resource.id,
            hours = total_hours,
            capacity = capacity_hours,
            utilization,
            "resource aggregated"
        );

        summaries.insert(
            resource.id.clone(),
            WorkloadSummary {
                resource_id: resource.id.clone(),
                name: resource.name.clone(),
                group: resource.group.clone(),
                total_hours,
                capacity_hours,
                utilization,
                status: thresholds.classify(utilization),
                assignment_count,
            },
        );
        weekly.insert(resource.id.clone(), table);
    }

    Ok(Aggregation {
        range,
        filter: filter.clone(),
        summaries,
        weekly,
        diagnostics,
    })
}

// ============================================================================
// Tests
// ============================================================================
