//! Plain-text rendering of analysis results.
//!
//! JSON output serializes the engine structures directly; these renderers
//! only cover `--format text`.

use clap::ValueEnum;
use loadwise_engine::{
    RankedSuggestion, ReplacementReport, ShiftReport, SuggestionKind, SummaryView, WeeklyLoad,
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// Truncate a string to a maximum length with ellipsis
fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

fn percent(ratio: f64) -> String {
    format!("{:.1}%", ratio * 100.0)
}

pub fn render_summary(view: &SummaryView) -> String {
    let mut output = String::new();
    output.push_str(&format!(
        "{:<12} {:<24} {:<10} {:>10} {:>10} {:>10}  {}\n",
        "RESOURCE", "NAME", "GROUP", "HOURS", "CAPACITY", "LOAD", "STATUS"
    ));

    for row in &view.rows {
        let load = format!("{:.1}{}", view.display_value(row), view.unit());
        output.push_str(&format!(
            "{:<12} {:<24} {:<10} {:>10.1} {:>10.1} {:>10}  {}\n",
            truncate(&row.resource_id, 12),
            truncate(&row.name, 24),
            truncate(row.group.as_deref().unwrap_or("-"), 10),
            row.total_hours,
            row.capacity_hours,
            load,
            row.status
        ));
    }

    output
}

pub fn render_weekly(loads: &[WeeklyLoad]) -> String {
    let mut output = String::new();
    let mut current: Option<&str> = None;

    for load in loads {
        if current != Some(load.resource_id.as_str()) {
            if current.is_some() {
                output.push('\n');
            }
            output.push_str(&format!("{}\n", load.resource_id));
            output.push_str(&format!(
                "  {:<10} {:>4} {:>9} {:>9} {:>8}  {}\n",
                "WEEK", "DAYS", "HOURS", "CAPACITY", "LOAD", "STATUS"
            ));
            current = Some(load.resource_id.as_str());
        }

        output.push_str(&format!(
            "  {:<10} {:>4} {:>9.1} {:>9.1} {:>8}  {}\n",
            load.week_start.to_string(),
            load.days,
            load.hours,
            load.capacity_hours,
            percent(load.utilization),
            load.status
        ));
    }

    if loads.is_empty() {
        output.push_str("No weekly loads in range\n");
    }

    output
}

pub fn render_recommendations(suggestions: &[RankedSuggestion]) -> String {
    if suggestions.is_empty() {
        return "No recommendations\n".to_string();
    }

    let mut output = String::new();
    for (i, s) in suggestions.iter().enumerate() {
        let action = match &s.kind {
            SuggestionKind::Reassign { to, hours } => format!("reassign {:.1}h to {}", hours, to),
            SuggestionKind::AddCapacity { excess_hours } => format!("add capacity for {:.1}h", excess_hours),
            SuggestionKind::IncreaseUtilization { available_hours } => {
                format!("{:.1}h available", available_hours)
            }
        };
        output.push_str(&format!(
            "{:>2}. [{}] {} ({}): {}\n",
            i + 1,
            s.priority,
            s.resource_name,
            percent(s.utilization),
            action
        ));
        output.push_str(&format!("    {}\n", s.message));
    }
    output
}

pub fn render_shifts(report: &ShiftReport) -> String {
    let mut output = String::new();

    if report.suggestions.is_empty() {
        output.push_str("No shift suggestions\n");
    }

    for s in &report.suggestions {
        output.push_str(&format!(
            "[{}] {} / {}: shift {:+} day(s), {} -> {}\n",
            s.priority,
            s.resource_id,
            truncate(&s.task_name, 32),
            s.shift_days,
            s.original_start,
            s.proposed_start
        ));
        output.push_str(&format!(
            "    week of {}: {} -> {} ({:.1}h moved, {:.1}h relieved)\n",
            s.source_week,
            percent(s.utilization_before),
            percent(s.utilization_after),
            s.hours_moved,
            s.improvement
        ));
    }

    if !report.unresolved.is_empty() {
        output.push_str(&format!("\nUnresolved weeks: {}\n", report.unresolved.len()));
        for u in &report.unresolved {
            output.push_str(&format!(
                "  {} week of {} ({})\n",
                u.resource_id,
                u.week_start,
                percent(u.utilization)
            ));
        }
    }

    output
}

pub fn render_replacement(report: &ReplacementReport) -> String {
    let mut output = String::new();
    output.push_str(&format!(
        "Replacement options for {} ({})\n",
        report.resource_id,
        percent(report.utilization)
    ));

    if let Some(explanation) = &report.explanation {
        output.push_str(&format!("  {}\n", explanation));
    }

    for (i, s) in report.suggestions.iter().enumerate() {
        output.push_str(&format!(
            "{:>2}. {} takes '{}' ({:.1}h): peak {}\n",
            i + 1,
            s.replacement_name,
            truncate(&s.task_name, 32),
            s.hours,
            percent(s.peak_after)
        ));
        output.push_str(&format!("    {}\n", s.reason));
    }

    output
}
