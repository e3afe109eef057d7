//! ISO-8601 time intervals (`begin/end`) with open ends.

use std::fmt;
use std::str::FromStr;

use chrono::{Months, NaiveDate, NaiveDateTime, NaiveTime, TimeDelta};

use super::convert::to_datetime;
use crate::error::{EntityError, EntityResult};

/// An inclusive interval between two datetimes, either side of which may be
/// open.
///
/// Parsed from `"begin/end"`, e.g. `"2020-01-01T10:00/2020-01-01T18:00"`,
/// `"2020-01-01/"` or `"/2020-12-31"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimeRange {
    begin: Option<NaiveDateTime>,
    end: Option<NaiveDateTime>,
}

impl TimeRange {
    pub fn new(begin: Option<NaiveDateTime>, end: Option<NaiveDateTime>) -> Self {
        Self { begin, end }
    }

    /// Lower bound, [`NaiveDateTime::MIN`] when open.
    pub fn begin(&self) -> NaiveDateTime {
        self.begin.unwrap_or(NaiveDateTime::MIN)
    }

    /// Upper bound, [`NaiveDateTime::MAX`] when open.
    pub fn end(&self) -> NaiveDateTime {
        self.end.unwrap_or(NaiveDateTime::MAX)
    }

    pub fn begin_bound(&self) -> Option<NaiveDateTime> {
        self.begin
    }

    pub fn end_bound(&self) -> Option<NaiveDateTime> {
        self.end
    }

    /// Tests membership of a datetime, date or time.
    ///
    /// Both bounds are projected onto the item's type first, so a date is
    /// compared against the dates of the bounds and a time against their
    /// times of day. Open bounds project to the minimum and maximum.
    pub fn contains<T: RangeItem>(&self, item: &T) -> bool {
        T::project(self.begin()) <= *item && *item <= T::project(self.end())
    }

    /// Walks the range from `begin` to `end` inclusive in steps of `unit`.
    ///
    /// Each call returns a fresh iterator. When the next step cannot be
    /// represented before `end` is passed (always the case for an open end
    /// walked to completion) the iterator yields a single
    /// [`EntityError::Overflow`] and then stops.
    pub fn steps(&self, unit: StepUnit) -> Steps {
        Steps {
            start: self.begin(),
            end: self.end(),
            unit,
            index: 0,
            done: false,
        }
    }
}

impl FromStr for TimeRange {
    type Err = EntityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (begin, end) = s
            .split_once('/')
            .ok_or_else(|| EntityError::time_range(s, "expected 'begin/end'"))?;

        let bound = |part: &str| -> EntityResult<Option<NaiveDateTime>> {
            let part = part.trim();
            if part.is_empty() {
                return Ok(None);
            }
            to_datetime(part)
                .map(Some)
                .map_err(|_| EntityError::time_range(s, format!("invalid bound '{part}'")))
        };

        let range = Self::new(bound(begin)?, bound(end)?);
        match (range.begin, range.end) {
            (Some(b), Some(e)) if b > e => Err(EntityError::time_range(s, "begin is after end")),
            _ => Ok(range),
        }
    }
}

impl fmt::Display for TimeRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(begin) = self.begin {
            write!(f, "{}", begin.format("%Y-%m-%dT%H:%M:%S"))?;
        }
        f.write_str("/")?;
        if let Some(end) = self.end {
            write!(f, "{}", end.format("%Y-%m-%dT%H:%M:%S"))?;
        }
        Ok(())
    }
}

// ============================================================================
// Membership
// ============================================================================

/// A type whose values can be tested against a [`TimeRange`].
pub trait RangeItem: PartialOrd + Sized {
    /// Projects a range bound onto this type.
    fn project(bound: NaiveDateTime) -> Self;
}

impl RangeItem for NaiveDateTime {
    fn project(bound: NaiveDateTime) -> Self {
        bound
    }
}

impl RangeItem for NaiveDate {
    fn project(bound: NaiveDateTime) -> Self {
        bound.date()
    }
}

impl RangeItem for NaiveTime {
    fn project(bound: NaiveDateTime) -> Self {
        bound.time()
    }
}

// ============================================================================
// Stepping
// ============================================================================

/// Granularity of [`TimeRange::steps`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StepUnit {
    Seconds,
    Minutes,
    Hours,
    Days,
    Weeks,
    Months,
    Years,
}

impl StepUnit {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Seconds => "seconds",
            Self::Minutes => "minutes",
            Self::Hours => "hours",
            Self::Days => "days",
            Self::Weeks => "weeks",
            Self::Months => "months",
            Self::Years => "years",
        }
    }

    fn fixed_seconds(&self) -> Option<i64> {
        match self {
            Self::Seconds => Some(1),
            Self::Minutes => Some(60),
            Self::Hours => Some(3_600),
            Self::Days => Some(86_400),
            Self::Weeks => Some(7 * 86_400),
            Self::Months | Self::Years => None,
        }
    }

    /// The `index`-th step after `start`, or `None` if it is unrepresentable.
    fn offset(&self, start: NaiveDateTime, index: u64) -> Option<NaiveDateTime> {
        match self.fixed_seconds() {
            Some(secs) => {
                let total = i64::try_from(index).ok()?.checked_mul(secs)?;
                start.checked_add_signed(TimeDelta::try_seconds(total)?)
            }
            None => {
                let per_step = if *self == Self::Years { 12 } else { 1 };
                let months = u32::try_from(index.checked_mul(per_step)?).ok()?;
                start.checked_add_months(Months::new(months))
            }
        }
    }
}

impl FromStr for StepUnit {
    type Err = EntityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "second" | "seconds" => Ok(Self::Seconds),
            "minute" | "minutes" => Ok(Self::Minutes),
            "hour" | "hours" => Ok(Self::Hours),
            "day" | "days" => Ok(Self::Days),
            "week" | "weeks" => Ok(Self::Weeks),
            "month" | "months" => Ok(Self::Months),
            "year" | "years" => Ok(Self::Years),
            _ => Err(EntityError::UnknownStepUnit(s.to_string())),
        }
    }
}

impl fmt::Display for StepUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Iterator returned by [`TimeRange::steps`].
///
/// Steps are computed from the start by index, so calendar units do not
/// drift (Jan 31 + 1 month is Feb 29 in a leap year, + 2 months is Mar 31).
#[derive(Debug, Clone)]
pub struct Steps {
    start: NaiveDateTime,
    end: NaiveDateTime,
    unit: StepUnit,
    index: u64,
    done: bool,
}

impl Iterator for Steps {
    type Item = EntityResult<NaiveDateTime>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.unit.offset(self.start, self.index) {
            Some(next) if next <= self.end => {
                self.index += 1;
                Some(Ok(next))
            }
            Some(_) => {
                self.done = true;
                None
            }
            None => {
                self.done = true;
                Some(Err(EntityError::Overflow))
            }
        }
    }
}

impl std::iter::FusedIterator for Steps {}
