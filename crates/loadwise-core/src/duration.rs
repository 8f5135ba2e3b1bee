//! Typed work durations.
//!
//! A [`Duration`] always carries its unit. Plans mix calendar spans, standard
//! workdays and raw hours; all of them are normalized into work-hours exactly
//! once, when records are ingested, so nothing downstream has to guess.
//!
//! The workday model is fixed: one workday is 8 work-hours and a calendar week
//! of 7 days holds 5 workdays.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Work-hours in one standard workday
pub const HOURS_PER_WORKDAY: f64 = 8.0;

/// Workdays in one calendar week
pub const WORKDAYS_PER_WEEK: f64 = 5.0;

/// Calendar days in one week
pub const CALENDAR_DAYS_PER_WEEK: f64 = 7.0;

/// Unit a duration value is expressed in
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DurationUnit {
    /// Work-hours
    Hours,
    /// Standard 8-hour workdays
    WorkDays,
    /// Calendar days (converted at 5 workdays per 7 calendar days)
    CalendarDays,
}

impl DurationUnit {
    pub fn as_str(&self) -> &'static str {
        match self {
            DurationUnit::Hours => "h",
            DurationUnit::WorkDays => "d",
            DurationUnit::CalendarDays => "cd",
        }
    }
}

/// A duration value tagged with its unit
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Duration {
    pub value: f64,
    pub unit: DurationUnit,
}

impl Duration {
    pub const fn zero() -> Self {
        Self {
            value: 0.0,
            unit: DurationUnit::Hours,
        }
    }

    pub const fn hours(h: f64) -> Self {
        Self {
            value: h,
            unit: DurationUnit::Hours,
        }
    }

    pub const fn work_days(d: f64) -> Self {
        Self {
            value: d,
            unit: DurationUnit::WorkDays,
        }
    }

    pub const fn calendar_days(d: f64) -> Self {
        Self {
            value: d,
            unit: DurationUnit::CalendarDays,
        }
    }

    /// Normalize to work-hours
    pub fn as_hours(&self) -> f64 {
        match self.unit {
            DurationUnit::Hours => self.value,
            DurationUnit::WorkDays => self.value * HOURS_PER_WORKDAY,
            DurationUnit::CalendarDays => {
                self.value * WORKDAYS_PER_WEEK / CALENDAR_DAYS_PER_WEEK * HOURS_PER_WORKDAY
            }
        }
    }

    /// Normalize to standard workdays
    pub fn as_work_days(&self) -> f64 {
        self.as_hours() / HOURS_PER_WORKDAY
    }

    /// Scale by an allocation factor, keeping the unit
    pub fn scale(self, factor: f64) -> Self {
        Self {
            value: self.value * factor,
            unit: self.unit,
        }
    }

    /// True when the duration holds a finite amount of work greater than zero
    pub fn is_positive(&self) -> bool {
        self.value.is_finite() && self.value > 0.0
    }

    /// Parse an ISO-8601 duration as written by MS Project.
    ///
    /// `PT8H0M0S` is 8 hours, `P2DT4H30M0S` is 20.5 hours, `P1W` is 40 hours.
    /// Days and weeks are work time (8-hour days, 5-day weeks), so the result is
    /// always expressed in hours.
    pub fn parse_iso8601(input: &str) -> Result<Self, DurationParseError> {
        let text = input.trim();
        let body = text
            .strip_prefix('P')
            .ok_or_else(|| DurationParseError::Invalid(text.to_string()))?;
        if body.is_empty() || body == "T" {
            return Err(DurationParseError::Invalid(text.to_string()));
        }

        let mut hours = 0.0;
        let mut number = String::new();
        let mut in_time = false;
        let mut saw_component = false;

        for ch in body.chars() {
            match ch {
                '0'..='9' | '.' | ',' => number.push(if ch == ',' { '.' } else { ch }),
                'T' if !in_time && number.is_empty() => in_time = true,
                designator => {
                    let value: f64 = number
                        .parse()
                        .map_err(|_| DurationParseError::Invalid(text.to_string()))?;
                    number.clear();
                    hours += match (in_time, designator) {
                        (false, 'W') => value * WORKDAYS_PER_WEEK * HOURS_PER_WORKDAY,
                        (false, 'D') => value * HOURS_PER_WORKDAY,
                        (true, 'H') => value,
                        (true, 'M') => value / 60.0,
                        (true, 'S') => value / 3600.0,
                        _ => return Err(DurationParseError::Invalid(text.to_string())),
                    };
                    saw_component = true;
                }
            }
        }

        if !number.is_empty() || !saw_component {
            return Err(DurationParseError::Invalid(text.to_string()));
        }

        Ok(Self::hours(hours))
    }
}

impl FromStr for Duration {
    type Err = DurationParseError;

    /// Accepts ISO-8601 (`PT8H0M0S`) or a bare number of hours (`12.5`)
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let text = s.trim();
        if text.is_empty() {
            return Err(DurationParseError::Empty);
        }
        if text.starts_with('P') {
            return Self::parse_iso8601(text);
        }
        text.parse::<f64>()
            .ok()
            .filter(|v| v.is_finite())
            .map(Self::hours)
            .ok_or_else(|| DurationParseError::Invalid(text.to_string()))
    }
}

impl fmt::Display for Duration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.value, self.unit.as_str())
    }
}

/// Error parsing a duration string
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DurationParseError {
    #[error("empty duration")]
    Empty,

    #[error("invalid duration: '{0}'")]
    Invalid(String),
}
