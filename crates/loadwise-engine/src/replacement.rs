//! Specialist Replacement Advisor
//!
//! For an overloaded resource, proposes handing one of its assignments to an
//! underutilized resource. Advisory only; the project is never modified.

use loadwise_core::{Diagnostic, DiagnosticCode, Project, ResourceId, TaskId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;

use crate::aggregate::{Aggregation, WorkloadSummary};
use crate::classify::{LoadStatus, Thresholds};
use crate::AnalysisError;

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReplacementOptions {
    /// Only consider resources from the overloaded resource's group
    pub match_group: bool,
}

/// Move one assignment to another resource
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ReplacementSuggestion {
    pub replacement_id: ResourceId,
    pub replacement_name: String,
    pub task_id: TaskId,
    pub task_name: String,
    /// Hours of the assignment inside the analyzed range
    pub hours: f64,
    pub source_utilization_after: f64,
    pub replacement_utilization_before: f64,
    pub replacement_utilization_after: f64,
    /// Higher of the two utilizations after the move
    pub peak_after: f64,
    pub reason: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ReplacementReport {
    pub resource_id: ResourceId,
    pub utilization: f64,
    /// Best move per candidate, lowest peak first
    pub suggestions: Vec<ReplacementSuggestion>,
    /// Why the list is empty, when it is
    pub explanation: Option<String>,
}

impl ReplacementReport {
    fn empty(resource_id: &str, utilization: f64, explanation: String) -> Self {
        Self {
            resource_id: resource_id.to_string(),
            utilization,
            suggestions: Vec::new(),
            explanation: Some(explanation),
        }
    }

    pub fn diagnostics(&self) -> Vec<Diagnostic> {
        match &self.explanation {
            Some(text) if self.suggestions.is_empty() => vec![
                Diagnostic::new(DiagnosticCode::H002NoReplacement, text.clone()).with_subject(&self.resource_id),
            ],
            _ => Vec::new(),
        }
    }
}

/// Suggest underutilized resources that could take over work of `resource_id`.
///
/// `aggregation` should cover every resource that may act as a replacement.
pub fn suggest_replacement(
    project: &Project,
    aggregation: &Aggregation,
    resource_id: &str,
    options: &ReplacementOptions,
    thresholds: &Thresholds,
) -> Result<ReplacementReport, AnalysisError> {
    let resource = project
        .get_resource(resource_id)
        .ok_or_else(|| AnalysisError::UnknownResource(resource_id.to_string()))?;

    let Some(source) = aggregation.summary(resource_id) else {
        return Ok(ReplacementReport::empty(
            resource_id,
            0.0,
            format!("{} has no capacity in the analyzed range", resource.name),
        ));
    };
    if thresholds.classify(source.utilization) != LoadStatus::Overloaded {
        return Ok(ReplacementReport::empty(
            resource_id,
            source.utilization,
            format!(
                "{} is not overloaded ({:.1}%); no replacement needed",
                source.name,
                source.utilization * 100.0
            ),
        ));
    }

    let group = resource.group.as_deref().filter(|_| options.match_group);
    let pool: Vec<&WorkloadSummary> = aggregation
        .summaries
        .values()
        .filter(|s| s.resource_id != resource_id)
        .filter(|s| thresholds.classify(s.utilization) == LoadStatus::Underutilized)
        .filter(|s| group.map_or(true, |g| s.group.as_deref() == Some(g)))
        .collect();

    let movable = hours_in_range(project, aggregation, resource_id);

    let mut suggestions = Vec::new();
    for candidate in &pool {
        let mut best: Option<ReplacementSuggestion> = None;

        for (task_id, &hours) in &movable {
            let already_assigned = project
                .assignments_for(&candidate.resource_id)
                .any(|a| &a.task_id == task_id);
            if already_assigned {
                continue;
            }

            let candidate_after = (candidate.total_hours + hours) / candidate.capacity_hours;
            if candidate_after > thresholds.overload {
                continue;
            }
            let source_after = (source.total_hours - hours) / source.capacity_hours;
            let peak_after = source_after.max(candidate_after);

            // movable is ordered by task id, so strict < keeps the smallest id on ties
            if best.as_ref().map_or(true, |b| peak_after < b.peak_after) {
                let task_name = project
                    .get_task(task_id)
                    .map_or_else(|| task_id.clone(), |t| t.name.clone());
                best = Some(ReplacementSuggestion {
                    replacement_id: candidate.resource_id.clone(),
                    replacement_name: candidate.name.clone(),
                    task_id: task_id.clone(),
                    reason: format!(
                        "Move '{}' ({:.1}h) from {} to {}: {:.1}% -> {:.1}% and {:.1}% -> {:.1}%",
                        task_name,
                        hours,
                        source.name,
                        candidate.name,
                        source.utilization * 100.0,
                        source_after * 100.0,
                        candidate.utilization * 100.0,
                        candidate_after * 100.0
                    ),
                    task_name,
                    hours,
                    source_utilization_after: source_after,
                    replacement_utilization_before: candidate.utilization,
                    replacement_utilization_after: candidate_after,
                    peak_after,
                });
            }
        }

        if let Some(suggestion) = best {
            debug!(
                resource = resource_id,
                replacement = %suggestion.replacement_id,
                task = %suggestion.task_id,
                peak = suggestion.peak_after,
                "replacement candidate"
            );
            suggestions.push(suggestion);
        }
    }

    suggestions.sort_by(|a, b| {
        a.peak_after
            .total_cmp(&b.peak_after)
            .then_with(|| a.replacement_id.cmp(&b.replacement_id))
            .then_with(|| a.task_id.cmp(&b.task_id))
    });

    let explanation = if suggestions.is_empty() {
        Some(if pool.is_empty() {
            format!("no underutilized resource available to relieve {}", source.name)
        } else {
            format!(
                "none of the {} underutilized resource(s) can absorb an assignment of {} without overloading",
                pool.len(),
                source.name
            )
        })
    } else {
        None
    };

    Ok(ReplacementReport {
        resource_id: resource_id.to_string(),
        utilization: source.utilization,
        suggestions,
        explanation,
    })
}

/// Hours of each of the resource's tasks that fall inside the range
fn hours_in_range(project: &Project, aggregation: &Aggregation, resource_id: &str) -> BTreeMap<TaskId, f64> {
    let mut hours = BTreeMap::new();
    for assignment in project.assignments_for(resource_id) {
        let Some(task) = project.get_task(&assignment.task_id) else {
            continue;
        };
        let overlap = task.span.overlap_days(&aggregation.range);
        if overlap == 0 {
            continue;
        }
        let inside = assignment.hours() * overlap as f64 / task.span.days() as f64;
        *hours.entry(task.id.clone()).or_insert(0.0) += inside;
    }
    hours
}
