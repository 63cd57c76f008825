//! Calendar month handling for monthly archive requests.

use std::fmt;

use chrono::{Datelike, NaiveDate};

use crate::error::{CommonError, CommonResult};

/// A validated (year, month) pair.
///
/// Ordering is chronological, so ranges can be compared directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct YearMonth {
    year: i32,
    month: u32,
}

impl YearMonth {
    /// Create a year-month, rejecting months outside 1-12.
    pub fn new(year: i32, month: u32) -> CommonResult<Self> {
        if !(1..=12).contains(&month) {
            return Err(CommonError::InvalidMonth { year, month });
        }
        Ok(Self { year, month })
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn month(&self) -> u32 {
        self.month
    }

    /// The following calendar month, or `None` past the last representable year.
    pub fn succ(&self) -> Option<Self> {
        if self.month == 12 {
            Some(Self {
                year: self.year.checked_add(1)?,
                month: 1,
            })
        } else {
            Some(Self {
                year: self.year,
                month: self.month + 1,
            })
        }
    }

    /// Prefix shared by every daily raster of this month, e.g. `tmax_202306`.
    pub fn file_prefix(&self) -> String {
        format!("tmax_{}{:02}", self.year, self.month)
    }

    /// Whether a calendar date falls inside this month.
    pub fn contains(&self, date: NaiveDate) -> bool {
        date.year() == self.year && date.month() == self.month
    }
}

impl fmt::Display for YearMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{:02}", self.year, self.month)
    }
}

/// Inclusive range of months, iterated in chronological order.
///
/// Within the first year iteration starts at the start month, within the last
/// year it stops at the end month, and every year in between is covered 1-12.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MonthRange {
    pub start: YearMonth,
    pub end: YearMonth,
}

impl MonthRange {
    pub fn new(start: YearMonth, end: YearMonth) -> Self {
        Self { start, end }
    }

    /// A single month.
    pub fn single(month: YearMonth) -> Self {
        Self {
            start: month,
            end: month,
        }
    }

    /// All twelve months of a year.
    pub fn year(year: i32) -> Self {
        Self {
            start: YearMonth { year, month: 1 },
            end: YearMonth { year, month: 12 },
        }
    }

    /// Number of months in the range (0 when start is after end).
    pub fn len(&self) -> usize {
        if self.start > self.end {
            return 0;
        }
        let start = self.start.year as i64 * 12 + self.start.month as i64;
        let end = self.end.year as i64 * 12 + self.end.month as i64;
        (end - start + 1) as usize
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn iter(&self) -> MonthIter {
        MonthIter {
            next: Some(self.start).filter(|s| *s <= self.end),
            end: self.end,
        }
    }
}

impl IntoIterator for MonthRange {
    type Item = YearMonth;
    type IntoIter = MonthIter;

    fn into_iter(self) -> MonthIter {
        self.iter()
    }
}

impl fmt::Display for MonthRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..{}", self.start, self.end)
    }
}

/// Iterator over the months of a [`MonthRange`].
#[derive(Debug, Clone)]
pub struct MonthIter {
    next: Option<YearMonth>,
    end: YearMonth,
}

impl Iterator for MonthIter {
    type Item = YearMonth;

    fn next(&mut self) -> Option<YearMonth> {
        let current = self.next?;
        self.next = current.succ().filter(|following| *following <= self.end);
        Some(current)
    }
}
