//! Ingestion of plain plan records into a [`Project`].
//!
//! The plan reader hands over loosely typed records: dates as strings, work as
//! ISO-8601 text or bare numbers, optional fields everywhere. Ingestion
//! validates them, normalizes every duration into work-hours and drops
//! whatever cannot be used. Each dropped record leaves a [`Diagnostic`] behind.
//!
//! Resources are processed first, then tasks, then assignments, so an
//! assignment pointing at a dropped task or resource is itself dropped.

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use thiserror::Error;
use tracing::{debug, warn};

use crate::calendar::DateRange;
use crate::diagnostics::{CollectingEmitter, Diagnostic, DiagnosticCode, DiagnosticEmitter, Severity};
use crate::duration::Duration;
use crate::{Assignment, Project, Resource, Task};

// ============================================================================
// Records
// ============================================================================

/// A complete plan as extracted by the plan reader
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlanRecords {
    pub project: Option<ProjectRecord>,
    pub tasks: Vec<TaskRecord>,
    pub resources: Vec<ResourceRecord>,
    pub assignments: Vec<AssignmentRecord>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectRecord {
    pub name: Option<String>,
    pub start: Option<String>,
    pub finish: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TaskRecord {
    pub id: String,
    pub name: Option<String>,
    pub start: Option<String>,
    pub finish: Option<String>,
    /// ISO-8601 (`P10D`) or bare hours
    pub duration: Option<String>,
    pub predecessors: Vec<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResourceRecord {
    pub id: String,
    pub name: Option<String>,
    pub max_units: Option<f64>,
    pub group: Option<String>,
    pub inactive: bool,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AssignmentRecord {
    pub task_id: String,
    pub resource_id: String,
    /// Work-hours, takes precedence over `work`
    pub hours: Option<f64>,
    /// ISO-8601 work duration (`PT40H0M0S`)
    pub work: Option<String>,
    /// Allocation on the task, used when no work is given
    pub units: Option<f64>,
}

// ============================================================================
// Result
// ============================================================================

/// A validated project plus everything that was dropped on the way
#[derive(Clone, Debug)]
pub struct Ingested {
    pub project: Project,
    pub diagnostics: Vec<Diagnostic>,
}

/// Ingestion failure
#[derive(Debug, Clone, Error)]
pub enum IngestError {
    /// Nothing to analyze: no valid task dates and no explicit project span
    #[error("plan has no valid task dates and no explicit project span")]
    EmptyPlan { diagnostics: Vec<Diagnostic> },
}

impl IngestError {
    /// Diagnostics collected before the failure
    pub fn diagnostics(&self) -> &[Diagnostic] {
        match self {
            IngestError::EmptyPlan { diagnostics } => diagnostics,
        }
    }
}

// ============================================================================
// Ingestion
// ============================================================================

/// Build a [`Project`] from plan records.
///
/// Malformed records never fail the call; they are dropped and reported.
/// The only hard failure is a plan with no usable dates at all.
pub fn ingest(records: &PlanRecords) -> Result<Ingested, IngestError> {
    let mut emitter = LoggingEmitter::default();

    let resources = ingest_resources(&records.resources, &mut emitter);
    let tasks = ingest_tasks(&records.tasks, &mut emitter);
    let assignments = ingest_assignments(&records.assignments, &tasks, &resources, &records.resources, &mut emitter);

    let Some(span) = project_span(records.project.as_ref(), &tasks, &mut emitter) else {
        let mut diagnostics = emitter.inner.into_inner();
        diagnostics.push(
            Diagnostic::new(DiagnosticCode::E001EmptyPlan, "plan has no valid task dates and no explicit project span")
                .with_hint("add a project start/finish or at least one task with valid dates"),
        );
        return Err(IngestError::EmptyPlan { diagnostics });
    };

    let name = records
        .project
        .as_ref()
        .and_then(|p| p.name.clone())
        .unwrap_or_else(|| "Untitled".to_string());

    let mut project = Project::new(name, span);
    project.tasks = tasks;
    project.resources = resources;
    project.assignments = assignments;

    debug!(
        tasks = project.tasks.len(),
        resources = project.resources.len(),
        assignments = project.assignments.len(),
        span = %project.span,
        "plan ingested"
    );

    Ok(Ingested {
        project,
        diagnostics: emitter.inner.into_inner(),
    })
}

/// Collects diagnostics and mirrors them to the log
#[derive(Default)]
struct LoggingEmitter {
    inner: CollectingEmitter,
}

impl DiagnosticEmitter for LoggingEmitter {
    fn emit(&mut self, diagnostic: Diagnostic) {
        if diagnostic.severity >= Severity::Warning {
            warn!(code = %diagnostic.code, subject = ?diagnostic.subject, "{}", diagnostic.message);
        } else {
            debug!(code = %diagnostic.code, subject = ?diagnostic.subject, "{}", diagnostic.message);
        }
        self.inner.emit(diagnostic);
    }
}

fn ingest_resources(records: &[ResourceRecord], emitter: &mut impl DiagnosticEmitter) -> Vec<Resource> {
    let mut seen = HashSet::new();
    let mut resources = Vec::with_capacity(records.len());

    for rec in records {
        if rec.inactive {
            emitter.emit(
                Diagnostic::new(
                    DiagnosticCode::I001InactiveResource,
                    format!("resource '{}' is inactive and was skipped", rec.id),
                )
                .with_subject(&rec.id),
            );
            continue;
        }
        if !seen.insert(rec.id.as_str()) {
            emitter.emit(
                Diagnostic::new(DiagnosticCode::W006DuplicateId, format!("duplicate resource id '{}'", rec.id))
                    .with_subject(&rec.id)
                    .with_note("the first definition is kept"),
            );
            continue;
        }

        let max_units = rec.max_units.unwrap_or(1.0);
        if !max_units.is_finite() || max_units < 0.0 {
            emitter.emit(
                Diagnostic::new(
                    DiagnosticCode::W007InvalidMaxUnits,
                    format!("resource '{}' has invalid max_units {}", rec.id, max_units),
                )
                .with_subject(&rec.id)
                .with_hint("max_units must be a finite number >= 0"),
            );
            continue;
        }

        let mut resource = Resource::new(&rec.id).max_units(max_units);
        if let Some(name) = &rec.name {
            resource = resource.name(name);
        }
        if let Some(group) = &rec.group {
            resource = resource.group(group);
        }
        resources.push(resource);
    }

    resources
}

fn ingest_tasks(records: &[TaskRecord], emitter: &mut impl DiagnosticEmitter) -> Vec<Task> {
    let mut seen = HashSet::new();
    let mut tasks = Vec::with_capacity(records.len());

    for rec in records {
        if !seen.insert(rec.id.as_str()) {
            emitter.emit(
                Diagnostic::new(DiagnosticCode::W006DuplicateId, format!("duplicate task id '{}'", rec.id))
                    .with_subject(&rec.id)
                    .with_note("the first definition is kept"),
            );
            continue;
        }

        let (Some(start), Some(finish)) = (
            rec.start.as_deref().and_then(parse_date),
            rec.finish.as_deref().and_then(parse_date),
        ) else {
            emitter.emit(
                Diagnostic::new(
                    DiagnosticCode::W003InvalidDate,
                    format!("task '{}' has a missing or invalid start/finish date", rec.id),
                )
                .with_subject(&rec.id)
                .with_note(format!(
                    "start = {:?}, finish = {:?}",
                    rec.start.as_deref().unwrap_or(""),
                    rec.finish.as_deref().unwrap_or("")
                )),
            );
            continue;
        };

        let Ok(span) = DateRange::new(start, finish) else {
            emitter.emit(
                Diagnostic::new(
                    DiagnosticCode::W004ReversedSpan,
                    format!("task '{}' finishes ({}) before it starts ({})", rec.id, finish, start),
                )
                .with_subject(&rec.id),
            );
            continue;
        };

        let mut task = Task::new(&rec.id, span);
        if let Some(name) = &rec.name {
            task = task.name(name);
        }
        if let Some(text) = rec.duration.as_deref() {
            match text.parse::<Duration>() {
                Ok(d) if d.is_positive() => task = task.duration(d),
                Ok(d) => emitter.emit(
                    Diagnostic::new(
                        DiagnosticCode::W005NonPositiveWork,
                        format!("task '{}' has a non-positive duration ({} h)", rec.id, d.as_hours()),
                    )
                    .with_subject(&rec.id)
                    .with_note("the calendar span is used instead"),
                ),
                Err(e) => emitter.emit(
                    Diagnostic::new(
                        DiagnosticCode::W008InvalidWork,
                        format!("task '{}' has an invalid duration: {}", rec.id, e),
                    )
                    .with_subject(&rec.id)
                    .with_note("the calendar span is used instead"),
                ),
            }
        }
        task.predecessors = rec.predecessors.clone();
        tasks.push(task);
    }

    // predecessors may point forward, so they are checked once every task is known
    let known: HashSet<String> = tasks.iter().map(|t| t.id.clone()).collect();
    for task in &mut tasks {
        let id = task.id.clone();
        task.predecessors.retain(|pred| {
            let found = known.contains(pred);
            if !found {
                emitter.emit(
                    Diagnostic::new(
                        DiagnosticCode::W001UnknownTask,
                        format!("task '{}' lists unknown predecessor '{}'", id, pred),
                    )
                    .with_subject(&id)
                    .with_note("the dependency is ignored"),
                );
            }
            found
        });
    }

    tasks
}

fn ingest_assignments(
    records: &[AssignmentRecord],
    tasks: &[Task],
    resources: &[Resource],
    resource_records: &[ResourceRecord],
    emitter: &mut impl DiagnosticEmitter,
) -> Vec<Assignment> {
    let mut assignments = Vec::with_capacity(records.len());

    for rec in records {
        let label = format!("{}->{}", rec.task_id, rec.resource_id);

        let Some(task) = tasks.iter().find(|t| t.id == rec.task_id) else {
            emitter.emit(
                Diagnostic::new(
                    DiagnosticCode::W001UnknownTask,
                    format!("assignment references unknown task '{}'", rec.task_id),
                )
                .with_subject(&label),
            );
            continue;
        };

        if !resources.iter().any(|r| r.id == rec.resource_id) {
            let mut d = Diagnostic::new(
                DiagnosticCode::W002UnknownResource,
                format!("assignment references unknown resource '{}'", rec.resource_id),
            )
            .with_subject(&label);
            if resource_records.iter().any(|r| r.id == rec.resource_id && r.inactive) {
                d = d.with_note("the resource is inactive");
            }
            emitter.emit(d);
            continue;
        }

        let units = rec.units.unwrap_or(1.0);
        let hours = if let Some(h) = rec.hours {
            h
        } else if let Some(text) = rec.work.as_deref() {
            match text.parse::<Duration>() {
                Ok(d) => d.as_hours(),
                Err(e) => {
                    emitter.emit(
                        Diagnostic::new(
                            DiagnosticCode::W008InvalidWork,
                            format!("assignment {} has invalid work: {}", label, e),
                        )
                        .with_subject(&label),
                    );
                    continue;
                }
            }
        } else {
            task.effective_duration().as_hours() * units
        };

        if !hours.is_finite() || hours <= 0.0 {
            emitter.emit(
                Diagnostic::new(
                    DiagnosticCode::W005NonPositiveWork,
                    format!("assignment {} has non-positive work ({} h)", label, hours),
                )
                .with_subject(&label),
            );
            continue;
        }

        assignments.push(Assignment::new(&rec.task_id, &rec.resource_id, Duration::hours(hours)).units(units));
    }

    assignments
}

/// Explicit project dates win; missing ends come from the task dates
fn project_span(record: Option<&ProjectRecord>, tasks: &[Task], emitter: &mut impl DiagnosticEmitter) -> Option<DateRange> {
    let task_start = tasks.iter().map(Task::start).min();
    let task_finish = tasks.iter().map(Task::finish).max();

    let start = explicit_date(record.and_then(|p| p.start.as_deref()), "start", emitter).or(task_start)?;
    let finish = explicit_date(record.and_then(|p| p.finish.as_deref()), "finish", emitter).or(task_finish)?;

    match DateRange::new(start, finish) {
        Ok(span) => Some(span),
        Err(_) => {
            emitter.emit(
                Diagnostic::new(
                    DiagnosticCode::W004ReversedSpan,
                    format!("project finishes ({}) before it starts ({})", finish, start),
                )
                .with_subject("project")
                .with_note("falling back to the task dates"),
            );
            DateRange::new(task_start?, task_finish?).ok()
        }
    }
}

fn explicit_date(value: Option<&str>, which: &str, emitter: &mut impl DiagnosticEmitter) -> Option<NaiveDate> {
    let text = value?;
    let parsed = parse_date(text);
    if parsed.is_none() {
        emitter.emit(
            Diagnostic::new(DiagnosticCode::W003InvalidDate, format!("project {} date '{}' is invalid", which, text))
                .with_subject("project"),
        );
    }
    parsed
}

/// Accepts `YYYY-MM-DD`, `YYYY-MM-DDTHH:MM:SS[.f]` and RFC 3339
pub fn parse_date(text: &str) -> Option<NaiveDate> {
    let text = text.trim();
    if let Ok(d) = NaiveDate::parse_from_str(text, "%Y-%m-%d") {
        return Some(d);
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(dt.date());
    }
    DateTime::parse_from_rfc3339(text).ok().map(|dt| dt.date_naive())
}

// ============================================================================
// Tests
// ============================================================================
