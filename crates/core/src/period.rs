use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Statement date window from `DTSTART`/`DTEND`. Either bound may be unknown;
/// each known bound is checked on its own.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateWindow {
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
}

impl DateWindow {
    pub fn new(start: Option<NaiveDate>, end: Option<NaiveDate>) -> Self {
        DateWindow { start, end }
    }

    pub fn is_unbounded(self) -> bool {
        self.start.is_none() && self.end.is_none()
    }

    /// Inclusive on both ends; an unknown bound never excludes a date.
    pub fn contains(self, date: NaiveDate) -> bool {
        self.start.map_or(true, |start| date >= start) && self.end.map_or(true, |end| date <= end)
    }
}

impl fmt::Display for DateWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let bound = |d: Option<NaiveDate>| d.map_or_else(|| "?".to_string(), |d| d.to_string());
        write!(f, "{} to {}", bound(self.start), bound(self.end))
    }
}
