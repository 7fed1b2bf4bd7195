//! Service calendar records.
//!
//! GTFS describes *when* a trip runs via `calendar.txt` (a weekday bitmap
//! over a date range) plus per-date overrides in `calendar_dates.txt`.

use chrono::{Datelike, NaiveDate};

use super::ids::ServiceId;

/// A weekday bitmap over a date range for one service.
#[derive(Debug, Clone, PartialEq)]
pub struct Calendar {
    pub service_id: ServiceId,
    /// Monday through Sunday.
    pub weekdays: [bool; 7],
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

impl Calendar {
    /// True if `date` lies within `[start_date, end_date]`.
    pub fn covers(&self, date: NaiveDate) -> bool {
        date >= self.start_date && date <= self.end_date
    }

    /// True if the weekday bit for `date` is set.
    pub fn runs_on_weekday(&self, date: NaiveDate) -> bool {
        self.weekdays[date.weekday().num_days_from_monday() as usize]
    }
}

/// Whether an exception adds or removes service on its date.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExceptionKind {
    Added,
    Removed,
}

/// A per-date override of the calendar bitmap.
#[derive(Debug, Clone, PartialEq)]
pub struct CalendarException {
    pub service_id: ServiceId,
    pub date: NaiveDate,
    pub kind: ExceptionKind,
}
