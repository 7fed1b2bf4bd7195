//! Timetable time handling.
//!
//! GTFS expresses stop times as `HH:MM:SS` offsets from midnight of the
//! trip's **service day**, and hours may exceed 23 to denote services that
//! run past midnight (a 24:10:00 departure is ten past midnight on the
//! following calendar day, still belonging to the previous service day).
//! This module preserves those raw offsets; normalisation happens only at
//! display time or when the planner shifts a wrapped connection onto the
//! next calendar day.

use std::fmt;

/// Error returned when parsing an invalid time string.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid time: {reason}")]
pub struct TimeError {
    reason: &'static str,
}

impl TimeError {
    fn new(reason: &'static str) -> Self {
        Self { reason }
    }
}

/// Seconds from midnight of a service day.
///
/// Values of 86 400 and above denote the next calendar day. Hours up to 47
/// are accepted on parse, matching the double-day range GTFS feeds use in
/// practice.
///
/// # Examples
///
/// ```
/// use transit_server::domain::GtfsTime;
///
/// let t = GtfsTime::parse("14:17:00").unwrap();
/// assert_eq!(t.seconds(), 14 * 3600 + 17 * 60);
/// assert_eq!(t.to_string(), "14:17:00");
///
/// // Past-midnight times are preserved, not normalised
/// let late = GtfsTime::parse("24:10:00").unwrap();
/// assert_eq!(late.seconds(), 86_400 + 600);
/// assert!(late.wraps_midnight());
/// assert_eq!(late.to_string(), "00:10:00");
/// ```
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GtfsTime(u32);

impl GtfsTime {
    /// Seconds in one service day.
    pub const DAY: u32 = 86_400;

    /// Largest parseable hour.
    const MAX_HOUR: u32 = 47;

    /// Construct from a raw seconds-from-midnight offset.
    pub fn from_seconds(seconds: u32) -> Self {
        Self(seconds)
    }

    /// Parse `HH:MM:SS` (or `HH:MM`, seconds defaulting to zero).
    ///
    /// Hours may be one or two digits and range from 0 to 47; minutes and
    /// seconds must be below 60.
    pub fn parse(s: &str) -> Result<Self, TimeError> {
        let mut parts = s.split(':');

        let hour = parse_component(parts.next(), "missing hour")?;
        let minute = parse_component(parts.next(), "missing minute")?;
        let second = match parts.next() {
            Some(sec) => parse_component(Some(sec), "invalid second")?,
            None => 0,
        };

        if parts.next().is_some() {
            return Err(TimeError::new("too many components"));
        }
        if hour > Self::MAX_HOUR {
            return Err(TimeError::new("hour must be 0-47"));
        }
        if minute > 59 {
            return Err(TimeError::new("minute must be 0-59"));
        }
        if second > 59 {
            return Err(TimeError::new("second must be 0-59"));
        }

        Ok(Self(hour * 3600 + minute * 60 + second))
    }

    /// Returns the raw seconds-from-midnight offset.
    pub fn seconds(&self) -> u32 {
        self.0
    }

    /// True if this time lies past midnight of the service day.
    pub fn wraps_midnight(&self) -> bool {
        self.0 >= Self::DAY
    }

    /// The same instant expressed within the following service day's frame.
    ///
    /// Only meaningful for wrapped times; a 24:10:00 departure becomes
    /// 00:10:00 of the next day.
    pub fn minus_day(&self) -> Self {
        Self(self.0.saturating_sub(Self::DAY))
    }

    /// Offset of this time within its calendar day (`0..86_400`).
    pub fn normalized_seconds(&self) -> u32 {
        self.0 % Self::DAY
    }
}

impl fmt::Debug for GtfsTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "GtfsTime({}s)", self.0)
    }
}

impl fmt::Display for GtfsTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let secs = self.normalized_seconds();
        write!(
            f,
            "{:02}:{:02}:{:02}",
            secs / 3600,
            (secs % 3600) / 60,
            secs % 60
        )
    }
}

fn parse_component(part: Option<&str>, missing: &'static str) -> Result<u32, TimeError> {
    let part = part.ok_or_else(|| TimeError::new(missing))?;
    if part.is_empty() || part.len() > 2 || !part.bytes().all(|b| b.is_ascii_digit()) {
        return Err(TimeError::new("expected one or two digits"));
    }
    // Digits only, so this cannot fail
    Ok(part.parse().unwrap())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_valid_times() {
        assert_eq!(GtfsTime::parse("00:00:00").unwrap().seconds(), 0);
        assert_eq!(GtfsTime::parse("23:59:59").unwrap().seconds(), 86_399);
        assert_eq!(
            GtfsTime::parse("14:17:00").unwrap().seconds(),
            14 * 3600 + 17 * 60
        );
        // Single-digit hours appear in real feeds
        assert_eq!(GtfsTime::parse("8:05:00").unwrap().seconds(), 29_100);
    }

    #[test]
    fn parse_without_seconds() {
        assert_eq!(
            GtfsTime::parse("14:17").unwrap().seconds(),
            14 * 3600 + 17 * 60
        );
    }

    #[test]
    fn parse_past_midnight() {
        let t = GtfsTime::parse("24:10:00").unwrap();
        assert_eq!(t.seconds(), 87_000);
        assert!(t.wraps_midnight());
        assert_eq!(t.minus_day().seconds(), 600);

        assert!(GtfsTime::parse("47:59:59").is_ok());
        assert!(GtfsTime::parse("48:00:00").is_err());
    }

    #[test]
    fn parse_invalid() {
        assert!(GtfsTime::parse("").is_err());
        assert!(GtfsTime::parse("14").is_err());
        assert!(GtfsTime::parse("14:60:00").is_err());
        assert!(GtfsTime::parse("14:00:60").is_err());
        assert!(GtfsTime::parse("14:00:00:00").is_err());
        assert!(GtfsTime::parse("ab:cd:ef").is_err());
        assert!(GtfsTime::parse("14-00-00").is_err());
    }

    #[test]
    fn display_normalises_wrapped_times() {
        assert_eq!(GtfsTime::parse("14:17:00").unwrap().to_string(), "14:17:00");
        assert_eq!(GtfsTime::parse("24:10:00").unwrap().to_string(), "00:10:00");
        assert_eq!(GtfsTime::parse("25:30:09").unwrap().to_string(), "01:30:09");
    }

    #[test]
    fn ordering_is_by_raw_offset() {
        let a = GtfsTime::parse("23:50:00").unwrap();
        let b = GtfsTime::parse("24:10:00").unwrap();
        // 24:10 is later in the service day even though it displays as 00:10
        assert!(a < b);
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    prop_compose! {
        fn valid_time()(hour in 0u32..48, minute in 0u32..60, second in 0u32..60) -> String {
            format!("{:02}:{:02}:{:02}", hour, minute, second)
        }
    }

    proptest! {
        /// Any valid HH:MM:SS string parses successfully.
        #[test]
        fn valid_hms_parses(s in valid_time()) {
            prop_assert!(GtfsTime::parse(&s).is_ok());
        }

        /// Parsing preserves the exact offset.
        #[test]
        fn parse_preserves_offset(hour in 0u32..48, minute in 0u32..60, second in 0u32..60) {
            let s = format!("{:02}:{:02}:{:02}", hour, minute, second);
            let t = GtfsTime::parse(&s).unwrap();
            prop_assert_eq!(t.seconds(), hour * 3600 + minute * 60 + second);
        }

        /// Display agrees with the offset modulo one day.
        #[test]
        fn display_is_normalised(s in valid_time()) {
            let t = GtfsTime::parse(&s).unwrap();
            let shown = GtfsTime::parse(&t.to_string()).unwrap();
            prop_assert_eq!(shown.seconds(), t.seconds() % GtfsTime::DAY);
        }

        /// Ordering matches numeric ordering of the offsets.
        #[test]
        fn ordering_matches_seconds(a in 0u32..173_000, b in 0u32..173_000) {
            let ta = GtfsTime::from_seconds(a);
            let tb = GtfsTime::from_seconds(b);
            prop_assert_eq!(ta.cmp(&tb), a.cmp(&b));
        }

        /// Out-of-range hours are rejected.
        #[test]
        fn invalid_hour_rejected(hour in 48u32..100, minute in 0u32..60) {
            let s = format!("{:02}:{:02}:00", hour, minute);
            prop_assert!(GtfsTime::parse(&s).is_err());
        }
    }
}
