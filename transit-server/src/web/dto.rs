//! Boundary data shapes.
//!
//! The request and response structures the HTTP façade and the CLI wrapper
//! consume. Only the shapes live here; transport belongs to the callers.
//! Times are rendered as `HH:MM:SS` normalised to the clock face.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::domain::{GtfsTime, Journey, Leg, ModeTag, Stop};
use crate::planner::{DispatchError, JourneyQuery, ModeNote, ModeResult};

/// Errors from parsing a plan request.
#[derive(Debug, Clone, thiserror::Error)]
pub enum RequestError {
    #[error("invalid departure_time {value:?}: {message}")]
    InvalidTime { value: String, message: String },

    #[error("invalid date {value:?}: expected YYYY-MM-DD or \"today\"")]
    InvalidDate { value: String },

    #[error("invalid mode {value:?}")]
    InvalidMode { value: String },
}

impl RequestError {
    /// Unparseable input maps to 400.
    pub fn http_status(&self) -> u16 {
        400
    }
}

/// Inbound journey-plan request.
#[derive(Debug, Clone, Deserialize)]
pub struct JourneyPlanRequest {
    /// Origin stop name, global id, or fuzzy text.
    pub origin: String,
    /// Destination stop name, global id, or fuzzy text.
    pub destination: String,
    /// `HH:MM[:SS]` or `"now"`.
    #[serde(default = "default_now")]
    pub departure_time: String,
    /// `YYYY-MM-DD` or `"today"`.
    #[serde(default = "default_today")]
    pub date: String,
    /// Overlay live delays on the result.
    #[serde(default)]
    pub realtime: bool,
    /// Restrict to these mode tags; absent means all.
    #[serde(default)]
    pub modes: Option<Vec<String>>,
}

fn default_now() -> String {
    "now".to_string()
}

fn default_today() -> String {
    "today".to_string()
}

impl JourneyPlanRequest {
    /// Resolve the departure time against an explicit "now".
    pub fn departure(&self, now: GtfsTime) -> Result<GtfsTime, RequestError> {
        if self.departure_time.eq_ignore_ascii_case("now") {
            return Ok(now);
        }
        GtfsTime::parse(&self.departure_time).map_err(|e| RequestError::InvalidTime {
            value: self.departure_time.clone(),
            message: e.to_string(),
        })
    }

    /// Resolve the service date against an explicit "today".
    pub fn service_date(&self, today: NaiveDate) -> Result<NaiveDate, RequestError> {
        if self.date.eq_ignore_ascii_case("today") {
            return Ok(today);
        }
        NaiveDate::parse_from_str(&self.date, "%Y-%m-%d").map_err(|_| RequestError::InvalidDate {
            value: self.date.clone(),
        })
    }

    /// Parse the requested mode restriction.
    pub fn mode_tags(&self) -> Result<Option<Vec<ModeTag>>, RequestError> {
        match &self.modes {
            None => Ok(None),
            Some(raw) => raw
                .iter()
                .map(|m| {
                    ModeTag::parse(m).map_err(|_| RequestError::InvalidMode { value: m.clone() })
                })
                .collect::<Result<Vec<_>, _>>()
                .map(Some),
        }
    }

    /// The dispatcher's view of this request.
    pub fn to_query(&self, now: GtfsTime, today: NaiveDate) -> Result<JourneyQuery, RequestError> {
        Ok(JourneyQuery {
            origin_query: self.origin.clone(),
            destination_query: self.destination.clone(),
            departure: self.departure(now)?,
            date: self.service_date(today)?,
            modes: self.mode_tags()?,
        })
    }
}

/// A stop at the boundary.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StopSummary {
    pub id: String,
    pub name: String,
    pub lat: f64,
    pub lon: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub platform: Option<String>,
}

impl From<&Stop> for StopSummary {
    fn from(stop: &Stop) -> Self {
        Self {
            id: stop.id.global(),
            name: stop.name.clone(),
            lat: stop.latitude,
            lon: stop.longitude,
            platform: stop.platform.clone(),
        }
    }
}

/// One leg at the boundary.
#[derive(Debug, Clone, Serialize)]
pub struct LegDto {
    pub from_stop: StopSummary,
    pub to_stop: StopSummary,
    /// Effective departure: actual when known, scheduled otherwise.
    pub departure_time: String,
    /// Effective arrival: actual when known, scheduled otherwise.
    pub arrival_time: String,
    pub duration_seconds: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub route_short_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub route_type: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mode_display: Option<String>,
    pub num_stops: u32,
    pub intermediate_stops: Vec<String>,
    pub is_transfer: bool,
    pub scheduled_departure: String,
    pub scheduled_arrival: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub actual_departure: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub actual_arrival: Option<String>,
    pub delay_seconds: i32,
    pub cancelled: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub platform: Option<String>,
}

impl From<&Leg> for LegDto {
    fn from(leg: &Leg) -> Self {
        Self {
            from_stop: StopSummary::from(&leg.from_stop),
            to_stop: StopSummary::from(&leg.to_stop),
            departure_time: leg.effective_departure().to_string(),
            arrival_time: leg.effective_arrival().to_string(),
            duration_seconds: leg.duration_seconds(),
            route_short_name: leg.route_short_name.clone(),
            route_type: leg.route_type.map(|r| r.code()),
            mode_display: leg.route_type.map(|r| r.mode_display().to_string()),
            num_stops: leg.num_stops,
            intermediate_stops: leg.intermediate_stops.clone(),
            is_transfer: leg.is_transfer,
            scheduled_departure: leg.departure.to_string(),
            scheduled_arrival: leg.arrival.to_string(),
            actual_departure: leg.actual_departure.map(|t| t.to_string()),
            actual_arrival: leg.actual_arrival.map(|t| t.to_string()),
            delay_seconds: leg.delay_seconds,
            cancelled: leg.cancelled,
            platform: leg.platform.clone(),
        }
    }
}

/// One journey at the boundary.
#[derive(Debug, Clone, Serialize)]
pub struct JourneyDto {
    pub origin: StopSummary,
    pub destination: StopSummary,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub departure_time: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub arrival_time: Option<String>,
    pub duration_seconds: u32,
    pub num_transfers: usize,
    pub legs: Vec<LegDto>,
    pub has_realtime: bool,
    pub valid_after_realtime: bool,
    /// Days past the requested date the journey runs (7-day look-ahead).
    pub date_shifted_by_days: u32,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub broken_transfers: Vec<String>,
}

impl JourneyDto {
    /// Render a planned journey.
    pub fn from_journey(journey: &Journey, date_shifted_by_days: u32) -> Self {
        Self {
            origin: StopSummary::from(&journey.origin),
            destination: StopSummary::from(&journey.destination),
            departure_time: journey.departure().map(|t| t.to_string()),
            arrival_time: journey.arrival().map(|t| t.to_string()),
            duration_seconds: journey.duration_seconds(),
            num_transfers: journey.num_transfers(),
            legs: journey.legs.iter().map(LegDto::from).collect(),
            has_realtime: journey.has_realtime(),
            valid_after_realtime: journey.valid_after_realtime,
            date_shifted_by_days,
            broken_transfers: journey.broken_transfers.clone(),
        }
    }
}

/// Full dispatch response: one slot per mode.
#[derive(Debug, Clone, Serialize)]
pub struct PlanResponse {
    /// `mode tag -> journey or null`.
    pub results: BTreeMap<String, Option<JourneyDto>>,
    /// `mode tag -> reason` for modes without a journey.
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub notes: BTreeMap<String, String>,
}

impl PlanResponse {
    /// Render the dispatcher's per-mode results.
    pub fn from_results(results: &BTreeMap<ModeTag, ModeResult>) -> Self {
        let mut slots = BTreeMap::new();
        let mut notes = BTreeMap::new();

        for (mode, result) in results {
            let dto = result
                .journey
                .as_ref()
                .map(|j| JourneyDto::from_journey(j, result.date_shifted_by_days));
            slots.insert(mode.as_str().to_string(), dto);
            if let Some(note) = result.note {
                notes.insert(mode.as_str().to_string(), note_label(note).to_string());
            }
        }

        Self {
            results: slots,
            notes,
        }
    }

    /// Status mapping: 200 for any success (nulls included), 404 when no
    /// mode found a route.
    pub fn http_status(&self) -> u16 {
        if self.results.values().any(Option::is_some) {
            200
        } else {
            404
        }
    }
}

fn note_label(note: ModeNote) -> &'static str {
    match note {
        ModeNote::StopNotServed => "Stops not served by this mode",
        ModeNote::NoRoute => "No route available",
        ModeNote::NoServiceWithinLookahead => "No service within 7 days",
        ModeNote::Timeout => "Request timed out",
        ModeNote::Cancelled => "Request cancelled",
        ModeNote::Failed => "Planner failed",
    }
}

/// Error shape at the boundary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub suggestions: Vec<String>,
}

impl ErrorResponse {
    /// An unresolved endpoint with its fuzzy suggestions.
    pub fn from_dispatch(err: &DispatchError) -> Self {
        let label = match err {
            DispatchError::UnknownOrigin(_) => "Origin not found",
            DispatchError::UnknownDestination(_) => "Destination not found",
        };
        Self {
            error: label.to_string(),
            suggestions: err.suggestions().to_vec(),
        }
    }

    /// Unresolved endpoints map to 404.
    pub fn http_status(&self) -> u16 {
        404
    }
}
