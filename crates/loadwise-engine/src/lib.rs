//! # loadwise-engine
//!
//! Workload analysis and optimization over a [`loadwise_core::Project`].
//!
//! This crate provides:
//! - Per-resource and per-week workload aggregation (`aggregate`)
//! - Status classification and ranked recommendations (`classify`)
//! - Task-shift suggestions for overloaded weeks (`shift`)
//! - Specialist replacement suggestions (`replacement`)
//! - An analysis session with a keyed aggregation cache (`session`)
//!
//! ## Example
//!
//! ```rust,ignore
//! use loadwise_engine::{AnalysisSession, DisplayMode, ResourceFilter};
//!
//! let session = AnalysisSession::new(project);
//! let view = session.get_summary(range, &ResourceFilter::All, DisplayMode::Percentage)?;
//! let shifts = session.get_shift_suggestions(range, &ResourceFilter::All)?;
//! ```

pub mod aggregate;
pub mod classify;
pub mod replacement;
pub mod session;
pub mod shift;

use chrono::NaiveDate;
use loadwise_core::CapacityError;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use aggregate::{
    aggregate, apportion, Aggregation, DisplayMode, ResourceFilter, SummaryView, TaskContribution, WeeklyLoad,
    WorkloadSummary,
};
pub use classify::{classify, recommend, LoadStatus, Priority, RankedSuggestion, SuggestionKind, Thresholds};
pub use replacement::{suggest_replacement, ReplacementOptions, ReplacementReport, ReplacementSuggestion};
pub use session::AnalysisSession;
pub use shift::{
    optimize, OptimizationMode, ShiftOptions, ShiftReport, ShiftSuggestion, SkippedCandidate, UnresolvedWeek,
};

/// All tunables of the engine
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineOptions {
    pub thresholds: Thresholds,
    pub optimizer: ShiftOptions,
    pub replacement: ReplacementOptions,
}

/// Errors surfaced to the caller before any computation happens
#[derive(Debug, Clone, PartialEq, Error)]
pub enum AnalysisError {
    #[error("invalid date range: {end} is before {start}")]
    InvalidRange { start: NaiveDate, end: NaiveDate },

    #[error("resource filter '{filter}' selects no resources")]
    EmptyResourceFilter { filter: String },

    #[error("unknown resource: {0}")]
    UnknownResource(String),

    #[error(transparent)]
    Capacity(#[from] CapacityError),
}
