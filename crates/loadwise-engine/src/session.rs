//! Analysis session
//!
//! Owns one immutable [`Project`] plus the engine options, and caches
//! aggregations keyed by `(date range, resource filter)`. All methods take
//! `&self`; the session can be shared across threads.

use chrono::NaiveDate;
use loadwise_core::{DateRange, Project};
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};
use tracing::debug;

use crate::aggregate::{aggregate, Aggregation, DisplayMode, ResourceFilter, SummaryView, WeeklyLoad, WorkloadSummary};
use crate::classify::{recommend, RankedSuggestion};
use crate::replacement::{suggest_replacement, ReplacementReport};
use crate::shift::{optimize, ShiftReport};
use crate::{AnalysisError, EngineOptions};

type CacheKey = (DateRange, ResourceFilter);

pub struct AnalysisSession {
    project: Project,
    options: EngineOptions,
    cache: RwLock<HashMap<CacheKey, Arc<Aggregation>>>,
}

impl AnalysisSession {
    pub fn new(project: Project) -> Self {
        Self {
            project,
            options: EngineOptions::default(),
            cache: RwLock::new(HashMap::new()),
        }
    }

    /// Replace the options; cached aggregations depend on the thresholds, so
    /// the cache is cleared
    pub fn with_options(mut self, options: EngineOptions) -> Self {
        self.options = options;
        self.cache = RwLock::new(HashMap::new());
        self
    }

    pub fn project(&self) -> &Project {
        &self.project
    }

    pub fn options(&self) -> &EngineOptions {
        &self.options
    }

    /// Validate a `(start, end)` pair into a range
    pub fn range(start: NaiveDate, end: NaiveDate) -> Result<DateRange, AnalysisError> {
        DateRange::new(start, end).map_err(|_| AnalysisError::InvalidRange { start, end })
    }

    /// Aggregation for a key, computed at most once per key
    pub fn aggregation(&self, range: DateRange, filter: &ResourceFilter) -> Result<Arc<Aggregation>, AnalysisError> {
        let key = (range, filter.clone());
        if let Some(hit) = self.cache.read().unwrap_or_else(PoisonError::into_inner).get(&key) {
            return Ok(Arc::clone(hit));
        }

        debug!(range = %range, filter = %filter, "aggregation cache miss");
        let fresh = Arc::new(aggregate(&self.project, range, filter, &self.options.thresholds)?);

        let mut cache = self.cache.write().unwrap_or_else(PoisonError::into_inner);
        Ok(Arc::clone(cache.entry(key).or_insert(fresh)))
    }

    /// Number of cached aggregations
    pub fn cached_entries(&self) -> usize {
        self.cache.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn clear_cache(&self) {
        self.cache.write().unwrap_or_else(PoisonError::into_inner).clear();
    }

    pub fn get_summary(
        &self,
        range: DateRange,
        filter: &ResourceFilter,
        mode: DisplayMode,
    ) -> Result<SummaryView, AnalysisError> {
        let agg = self.aggregation(range, filter)?;
        Ok(SummaryView {
            mode,
            rows: agg.summary_rows(),
        })
    }

    pub fn get_weekly_loads(&self, range: DateRange, filter: &ResourceFilter) -> Result<Vec<WeeklyLoad>, AnalysisError> {
        Ok(self.aggregation(range, filter)?.weekly_loads())
    }

    pub fn get_recommendations(&self, summaries: &[WorkloadSummary]) -> Vec<RankedSuggestion> {
        recommend(summaries, &self.options.thresholds)
    }

    /// Shifts for the filtered resources, checked against every resource's
    /// weekly load over the same range
    pub fn get_shift_suggestions(&self, range: DateRange, filter: &ResourceFilter) -> Result<ShiftReport, AnalysisError> {
        let agg = self.aggregation(range, filter)?;
        let load = self.aggregation(range, &ResourceFilter::All)?;
        Ok(optimize(
            &self.project,
            &agg,
            &load,
            &self.options.optimizer,
            &self.options.thresholds,
        ))
    }

    /// Replacement candidates are drawn from every resource of the project
    pub fn get_replacement_suggestions(
        &self,
        resource_id: &str,
        range: DateRange,
    ) -> Result<ReplacementReport, AnalysisError> {
        if self.project.get_resource(resource_id).is_none() {
            return Err(AnalysisError::UnknownResource(resource_id.to_string()));
        }
        let agg = self.aggregation(range, &ResourceFilter::All)?;
        suggest_replacement(
            &self.project,
            &agg,
            resource_id,
            &self.options.replacement,
            &self.options.thresholds,
        )
    }
}
