//! Status classification and ranked recommendations.

use loadwise_core::ResourceId;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

use crate::aggregate::WorkloadSummary;

/// Utilization boundaries, as ratios (1.0 = 100%)
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Thresholds {
    /// Lowest utilization still considered optimal
    pub optimal_min: f64,
    /// Utilization above which a resource is overloaded
    pub overload: f64,
    /// Utilization above which an overload is high priority
    pub high_priority: f64,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            optimal_min: 0.70,
            overload: 1.00,
            high_priority: 1.20,
        }
    }
}

impl Thresholds {
    pub fn classify(&self, utilization: f64) -> LoadStatus {
        if utilization > self.overload {
            LoadStatus::Overloaded
        } else if utilization >= self.optimal_min {
            LoadStatus::Optimal
        } else {
            LoadStatus::Underutilized
        }
    }

    /// Priority of acting on a resource at this utilization
    pub fn priority(&self, utilization: f64) -> Priority {
        if utilization > self.high_priority {
            Priority::High
        } else if utilization > self.overload {
            Priority::Medium
        } else {
            Priority::Low
        }
    }
}

/// Classify with the default thresholds
pub fn classify(utilization: f64) -> LoadStatus {
    Thresholds::default().classify(utilization)
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoadStatus {
    Overloaded,
    Optimal,
    Underutilized,
}

impl LoadStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            LoadStatus::Overloaded => "Overloaded",
            LoadStatus::Optimal => "Optimal",
            LoadStatus::Underutilized => "Underutilized",
        }
    }
}

impl fmt::Display for LoadStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Recommendation priority; sorts High first
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    High,
    Medium,
    Low,
}

impl Priority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::High => "High",
            Priority::Medium => "Medium",
            Priority::Low => "Low",
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What a recommendation proposes
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SuggestionKind {
    /// Move work from the overloaded resource to an underutilized one
    Reassign { to: ResourceId, hours: f64 },
    /// Nobody has spare hours; capacity has to be added
    AddCapacity { excess_hours: f64 },
    /// Resource has room for more work
    IncreaseUtilization { available_hours: f64 },
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RankedSuggestion {
    pub resource_id: ResourceId,
    pub resource_name: String,
    pub utilization: f64,
    pub priority: Priority,
    #[serde(flatten)]
    pub kind: SuggestionKind,
    pub message: String,
}

/// Build ranked recommendations from workload summaries.
///
/// Every overloaded resource is paired with every underutilized resource that
/// has spare hours (most spare hours first). An overloaded resource nobody
/// can relieve gets an `AddCapacity` suggestion instead. Underutilized
/// resources get a low-priority `IncreaseUtilization` suggestion.
///
/// Results are ordered High, Medium, Low; within a tier by descending
/// utilization, then resource id.
pub fn recommend(summaries: &[WorkloadSummary], thresholds: &Thresholds) -> Vec<RankedSuggestion> {
    let mut underutilized: Vec<&WorkloadSummary> = summaries
        .iter()
        .filter(|s| thresholds.classify(s.utilization) == LoadStatus::Underutilized)
        .filter(|s| s.available_hours() > 0.0)
        .collect();
    underutilized.sort_by(|a, b| {
        b.available_hours()
            .total_cmp(&a.available_hours())
            .then_with(|| a.resource_id.cmp(&b.resource_id))
    });

    let mut suggestions = Vec::new();

    for s in summaries {
        match thresholds.classify(s.utilization) {
            LoadStatus::Overloaded => {
                let priority = thresholds.priority(s.utilization);
                let excess = s.excess_hours();

                if underutilized.is_empty() {
                    suggestions.push(RankedSuggestion {
                        resource_id: s.resource_id.clone(),
                        resource_name: s.name.clone(),
                        utilization: s.utilization,
                        priority,
                        kind: SuggestionKind::AddCapacity { excess_hours: excess },
                        message: format!(
                            "{} is at {:.1}% ({:.1}h over capacity) and no resource has spare hours; add capacity",
                            s.name,
                            s.utilization * 100.0,
                            excess
                        ),
                    });
                    continue;
                }

                for target in &underutilized {
                    let hours = excess.min(target.available_hours());
                    suggestions.push(RankedSuggestion {
                        resource_id: s.resource_id.clone(),
                        resource_name: s.name.clone(),
                        utilization: s.utilization,
                        priority,
                        kind: SuggestionKind::Reassign {
                            to: target.resource_id.clone(),
                            hours,
                        },
                        message: format!(
                            "Reassign {:.1}h from {} ({:.1}%) to {} ({:.1}%)",
                            hours,
                            s.name,
                            s.utilization * 100.0,
                            target.name,
                            target.utilization * 100.0
                        ),
                    });
                }
            }
            LoadStatus::Underutilized => {
                let available = s.available_hours();
                suggestions.push(RankedSuggestion {
                    resource_id: s.resource_id.clone(),
                    resource_name: s.name.clone(),
                    utilization: s.utilization,
                    priority: Priority::Low,
                    kind: SuggestionKind::IncreaseUtilization {
                        available_hours: available,
                    },
                    message: format!(
                        "{} is at {:.1}% with {:.1}h available",
                        s.name,
                        s.utilization * 100.0,
                        available
                    ),
                });
            }
            LoadStatus::Optimal => {}
        }
    }

    // stable: Reassign targets keep their spare-hours order
    suggestions.sort_by(rank_order);
    suggestions
}

fn rank_order(a: &RankedSuggestion, b: &RankedSuggestion) -> Ordering {
    a.priority
        .cmp(&b.priority)
        .then_with(|| b.utilization.total_cmp(&a.utilization))
        .then_with(|| a.resource_id.cmp(&b.resource_id))
}
