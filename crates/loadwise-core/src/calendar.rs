//! Date spans, week bucketing and the capacity model.
//!
//! Capacity uses a fixed calendar: every calendar day is worth 5/7 of a
//! workday and every workday is worth 8 hours. No holidays, no per-resource
//! calendars. The conversion is exact, so capacity is linear in both the span
//! length and the allocation fraction.

use chrono::{Datelike, Duration as ChronoDuration, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use crate::duration::{CALENDAR_DAYS_PER_WEEK, HOURS_PER_WORKDAY, WORKDAYS_PER_WEEK};

/// Inclusive calendar date range (`end >= start`)
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    /// Create a range, rejecting `end < start`
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self, CapacityError> {
        if end < start {
            return Err(CapacityError::InvalidSpan { start, end });
        }
        Ok(Self { start, end })
    }

    /// A single-day range
    pub fn day(date: NaiveDate) -> Self {
        Self {
            start: date,
            end: date,
        }
    }

    /// Number of calendar days, both endpoints included
    pub fn days(&self) -> i64 {
        (self.end - self.start).num_days() + 1
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.start && date <= self.end
    }

    /// Overlapping part of two ranges, if any
    pub fn intersect(&self, other: &DateRange) -> Option<DateRange> {
        let start = self.start.max(other.start);
        let end = self.end.min(other.end);
        (start <= end).then_some(DateRange { start, end })
    }

    /// Number of calendar days shared by two ranges
    pub fn overlap_days(&self, other: &DateRange) -> i64 {
        self.intersect(other).map(|r| r.days()).unwrap_or(0)
    }

    /// The same range moved by `days` calendar days (negative moves earlier)
    pub fn shifted(&self, days: i64) -> Option<DateRange> {
        let delta = ChronoDuration::try_days(days)?;
        Some(DateRange {
            start: self.start.checked_add_signed(delta)?,
            end: self.end.checked_add_signed(delta)?,
        })
    }

    /// Monday-aligned week buckets covering this range, clipped to it.
    ///
    /// Each item is `(week_start, part_of_week_inside_range)`. The first and last
    /// buckets may be partial weeks.
    pub fn weeks(&self) -> Vec<(NaiveDate, DateRange)> {
        let mut weeks = Vec::new();
        let mut monday = week_start(self.start);
        while monday <= self.end {
            let sunday = monday + ChronoDuration::days(6);
            let clipped = DateRange {
                start: monday.max(self.start),
                end: sunday.min(self.end),
            };
            weeks.push((monday, clipped));
            monday += ChronoDuration::days(7);
        }
        weeks
    }
}

impl fmt::Display for DateRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} .. {}", self.start, self.end)
    }
}

/// Monday of the week containing `date`
pub fn week_start(date: NaiveDate) -> NaiveDate {
    date - ChronoDuration::days(i64::from(date.weekday().num_days_from_monday()))
}

/// Workdays contained in a number of calendar days (5 per 7, exact)
pub fn calendar_to_workdays(calendar_days: i64) -> f64 {
    calendar_days as f64 * WORKDAYS_PER_WEEK / CALENDAR_DAYS_PER_WEEK
}

/// Available work-hours of a resource over an inclusive span.
///
/// `capacity = calendar_days × 5/7 × 8 × max_units`
///
/// ```rust
/// use chrono::NaiveDate;
/// use loadwise_core::calendar::capacity;
///
/// let start = NaiveDate::from_ymd_opt(2025, 3, 3).unwrap();
/// let end = NaiveDate::from_ymd_opt(2025, 3, 9).unwrap();
/// assert_eq!(capacity(start, end, 1.0).unwrap(), 40.0);
/// ```
pub fn capacity(span_start: NaiveDate, span_end: NaiveDate, max_units: f64) -> Result<f64, CapacityError> {
    let span = DateRange::new(span_start, span_end)?;
    range_capacity(&span, max_units)
}

/// [`capacity`] over an already validated range
pub fn range_capacity(span: &DateRange, max_units: f64) -> Result<f64, CapacityError> {
    if !max_units.is_finite() || max_units < 0.0 {
        return Err(CapacityError::InvalidUnits(max_units));
    }
    Ok(calendar_to_workdays(span.days()) * HOURS_PER_WORKDAY * max_units)
}

/// Capacity calculation error
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CapacityError {
    #[error("invalid span: end {end} is before start {start}")]
    InvalidSpan { start: NaiveDate, end: NaiveDate },

    #[error("invalid allocation units: {0}")]
    InvalidUnits(f64),
}
