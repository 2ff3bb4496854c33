use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Datelike, FixedOffset};
use serde::{Deserialize, Serialize};

use crate::error::{Result, StatsError};

/// Publication timestamp layout used by the vacancy exports,
/// e.g. `2012-04-09T13:49:00+0400`.
pub const PUBLISHED_AT_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%z";

// ── Timestamp parsing ─────────────────────────────────────────────────────────

/// Parse a `published_at` value, keeping its original UTC offset.
///
/// Accepts the export layout (`+0400`) first and falls back to RFC 3339
/// (`+04:00` or `Z`).
pub fn parse_published_at(s: &str) -> Result<DateTime<FixedOffset>> {
    let trimmed = s.trim();
    if let Ok(dt) = DateTime::parse_from_str(trimmed, PUBLISHED_AT_FORMAT) {
        return Ok(dt);
    }
    DateTime::parse_from_rfc3339(trimmed).map_err(|_| StatsError::TimestampParse(s.to_string()))
}

/// Calendar year of a publication timestamp, in the timestamp's own offset.
pub fn publication_year(dt: &DateTime<FixedOffset>) -> i32 {
    dt.year()
}

/// Year prefix of a raw `published_at` string without full parsing.
///
/// Used for partitioning files by year, where only the first four
/// characters matter.
pub fn year_prefix(s: &str) -> Option<&str> {
    let prefix = s.get(..4)?;
    prefix.chars().all(|c| c.is_ascii_digit()).then_some(prefix)
}

// ── YearMonth ─────────────────────────────────────────────────────────────────

/// A calendar month, the granularity of the monthly exchange-rate table.
///
/// Displays and parses as `YYYY-MM`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct YearMonth {
    pub year: i32,
    pub month: u32,
}

impl YearMonth {
    /// Build a month, returning `None` when `month` is outside `1..=12`.
    pub fn new(year: i32, month: u32) -> Option<Self> {
        (1..=12).contains(&month).then_some(Self { year, month })
    }

    /// Truncate a timestamp to its month, in the timestamp's own offset.
    pub fn from_datetime(dt: &DateTime<FixedOffset>) -> Self {
        Self {
            year: dt.year(),
            month: dt.month(),
        }
    }

    /// The month immediately after this one.
    pub fn next(self) -> Self {
        if self.month == 12 {
            Self {
                year: self.year + 1,
                month: 1,
            }
        } else {
            Self {
                year: self.year,
                month: self.month + 1,
            }
        }
    }
}

impl fmt::Display for YearMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

impl FromStr for YearMonth {
    type Err = StatsError;

    fn from_str(s: &str) -> Result<Self> {
        let invalid = || StatsError::InvalidRateTable(format!("invalid month key \"{}\"", s));
        let (year, month) = s.trim().split_once('-').ok_or_else(invalid)?;
        let year: i32 = year.parse().map_err(|_| invalid())?;
        let month: u32 = month.parse().map_err(|_| invalid())?;
        YearMonth::new(year, month).ok_or_else(invalid)
    }
}

/// Every month from `start` to `end`, both inclusive.
///
/// Returns an empty list when `end` precedes `start`.
pub fn months_between(start: YearMonth, end: YearMonth) -> Vec<YearMonth> {
    let mut months = Vec::new();
    let mut current = start;
    while current <= end {
        months.push(current);
        current = current.next();
    }
    months
}

// ── Tests ─────────────────────────────────────────────────────────────────────
