//! Service calendar oracle.
//!
//! Answers "does service S run on date D?" for the planner's per-connection
//! filter. Lookup is O(1) on the calendar map plus a short scan of that
//! service's exception list.

use std::collections::HashMap;
use std::sync::Once;

use chrono::NaiveDate;
use tracing::{debug, warn};

use crate::domain::{Calendar, CalendarException, ExceptionKind, ServiceId};
use crate::feed::Catalogue;

static FAIL_OPEN_WARNING: Once = Once::new();

/// Read-only oracle over the merged calendar data.
#[derive(Debug, Default)]
pub struct ServiceCalendar {
    calendars: HashMap<ServiceId, Calendar>,
    exceptions: HashMap<ServiceId, Vec<CalendarException>>,
    has_calendar_data: bool,
}

impl ServiceCalendar {
    /// Build the oracle from the merged catalogue.
    pub fn build(catalogue: &Catalogue) -> Self {
        let mut exceptions: HashMap<ServiceId, Vec<CalendarException>> = HashMap::new();
        for exc in catalogue.exceptions() {
            exceptions
                .entry(exc.service_id.clone())
                .or_default()
                .push(exc.clone());
        }

        Self {
            calendars: catalogue.calendars().clone(),
            exceptions,
            has_calendar_data: catalogue.has_calendar_data(),
        }
    }

    /// Decide whether `service` runs on `date`.
    ///
    /// Decision order:
    /// 1. No calendar data loaded at all: fail open (every service runs),
    ///    warned once per process.
    /// 2. Unknown service: does not run.
    /// 3. Date outside the calendar's range: does not run.
    /// 4. A `calendar_dates` exception for this exact date overrides the
    ///    weekday bitmap in either direction.
    /// 5. Otherwise the weekday bit decides.
    pub fn is_active(&self, service: &ServiceId, date: NaiveDate) -> bool {
        if !self.has_calendar_data {
            FAIL_OPEN_WARNING.call_once(|| {
                warn!("No calendar data loaded; treating every service as active");
            });
            return true;
        }

        let Some(calendar) = self.calendars.get(service) else {
            debug!(service = %service, "Service not found in calendar");
            return false;
        };

        if !calendar.covers(date) {
            return false;
        }

        if let Some(excs) = self.exceptions.get(service) {
            for exc in excs {
                if exc.date == date {
                    return match exc.kind {
                        ExceptionKind::Added => true,
                        ExceptionKind::Removed => false,
                    };
                }
            }
        }

        calendar.runs_on_weekday(date)
    }
}
