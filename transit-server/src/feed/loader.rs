//! Loader for a single GTFS bundle directory.
//!
//! Reads the character-separated files of one feed into typed domain
//! records, scoping every id by the bundle's mode tag. `stops.txt`,
//! `routes.txt`, `trips.txt` and `stop_times.txt` are mandatory; the
//! calendar, transfer and agency files are optional and absence is logged.

use std::collections::HashMap;
use std::path::Path;

use chrono::NaiveDate;
use serde::de::DeserializeOwned;
use tracing::{debug, info, warn};

use crate::domain::{
    Calendar, CalendarException, ExceptionKind, GtfsTime, ModeTag, Route, RouteId, RouteType,
    ServiceId, Stop, StopId, StopTime, Transfer, Trip, TripId,
};

use super::error::FeedError;
use super::records::{
    AgencyRow, CalendarDateRow, CalendarRow, RouteRow, StopRow, StopTimeRow, TransferRow, TripRow,
};

/// Cap on the offender list carried by an unresolved-reference error.
const MAX_REPORTED_OFFENDERS: usize = 20;

/// One loaded GTFS bundle, ids scoped by mode, prior to merging.
#[derive(Debug)]
pub struct Bundle {
    pub mode: ModeTag,
    pub source: String,
    pub stops: HashMap<StopId, Stop>,
    pub routes: HashMap<RouteId, Route>,
    pub trips: HashMap<TripId, Trip>,
    /// Stop times per trip, sorted by `stop_sequence`.
    pub stop_times: HashMap<TripId, Vec<StopTime>>,
    pub calendars: HashMap<ServiceId, Calendar>,
    pub exceptions: Vec<CalendarException>,
    pub transfers: Vec<Transfer>,
    /// `agency_id` → agency name.
    pub agencies: HashMap<String, String>,
}

/// Load one bundle from a directory of GTFS files.
pub fn load_bundle(mode: &ModeTag, dir: &Path) -> Result<Bundle, FeedError> {
    info!(mode = %mode, dir = %dir.display(), "Loading GTFS bundle");

    let stop_rows: Vec<StopRow> = read_required(mode, dir, "stops.txt")?;
    let route_rows: Vec<RouteRow> = read_required(mode, dir, "routes.txt")?;
    let trip_rows: Vec<TripRow> = read_required(mode, dir, "trips.txt")?;
    let stop_time_rows: Vec<StopTimeRow> = read_required(mode, dir, "stop_times.txt")?;

    let calendar_rows: Vec<CalendarRow> = read_optional(mode, dir, "calendar.txt")?;
    let calendar_date_rows: Vec<CalendarDateRow> = read_optional(mode, dir, "calendar_dates.txt")?;
    let transfer_rows: Vec<TransferRow> = read_optional(mode, dir, "transfers.txt")?;
    let agency_rows: Vec<AgencyRow> = read_optional(mode, dir, "agency.txt")?;

    let mut stops = HashMap::with_capacity(stop_rows.len());
    for row in stop_rows {
        let id = StopId::new(mode.clone(), row.stop_id);
        stops.insert(
            id.clone(),
            Stop {
                id,
                name: row.stop_name,
                latitude: row.stop_lat,
                longitude: row.stop_lon,
                platform: row.platform_code.filter(|p| !p.is_empty()),
            },
        );
    }

    let mut routes = HashMap::with_capacity(route_rows.len());
    for row in route_rows {
        let id = RouteId::new(mode.clone(), row.route_id);
        routes.insert(
            id.clone(),
            Route {
                id,
                route_type: RouteType(row.route_type),
                short_name: row.route_short_name,
                long_name: row.route_long_name,
                agency_id: row.agency_id.filter(|a| !a.is_empty()),
            },
        );
    }

    let mut trips = HashMap::with_capacity(trip_rows.len());
    for row in trip_rows {
        let id = TripId::new(mode.clone(), row.trip_id);
        trips.insert(
            id.clone(),
            Trip {
                id,
                route_id: RouteId::new(mode.clone(), row.route_id),
                service_id: ServiceId::new(mode.clone(), row.service_id),
                direction_id: row.direction_id,
                headsign: row.trip_headsign.filter(|h| !h.is_empty()),
            },
        );
    }

    let mut stop_times: HashMap<TripId, Vec<StopTime>> = HashMap::new();
    for row in stop_time_rows {
        let trip_id = TripId::new(mode.clone(), row.trip_id);
        let arrival = parse_time(mode, "stop_times.txt", &row.arrival_time)?;
        let departure = parse_time(mode, "stop_times.txt", &row.departure_time)?;
        stop_times.entry(trip_id.clone()).or_default().push(StopTime {
            trip_id,
            stop_sequence: row.stop_sequence,
            stop_id: StopId::new(mode.clone(), row.stop_id),
            arrival,
            departure,
        });
    }
    for times in stop_times.values_mut() {
        times.sort_by_key(|st| st.stop_sequence);
    }
    validate_stop_time_order(mode, &stop_times)?;
    validate_references(mode, &stops, &routes, &trips, &stop_times)?;

    let mut calendars = HashMap::with_capacity(calendar_rows.len());
    for row in calendar_rows {
        let service_id = ServiceId::new(mode.clone(), row.service_id.clone());
        let weekdays = row.weekdays();
        calendars.insert(
            service_id.clone(),
            Calendar {
                service_id,
                weekdays,
                start_date: parse_date(mode, "calendar.txt", &row.start_date)?,
                end_date: parse_date(mode, "calendar.txt", &row.end_date)?,
            },
        );
    }

    let mut exceptions = Vec::with_capacity(calendar_date_rows.len());
    for row in calendar_date_rows {
        let kind = match row.exception_type {
            1 => ExceptionKind::Added,
            2 => ExceptionKind::Removed,
            other => {
                return Err(FeedError::MalformedFeed {
                    mode: mode.clone(),
                    file: "calendar_dates.txt",
                    message: format!("unknown exception_type {other}"),
                })
            }
        };
        exceptions.push(CalendarException {
            service_id: ServiceId::new(mode.clone(), row.service_id),
            date: parse_date(mode, "calendar_dates.txt", &row.date)?,
            kind,
        });
    }

    let transfers = transfer_rows
        .into_iter()
        .map(|row| Transfer {
            from_stop: StopId::new(mode.clone(), row.from_stop_id),
            to_stop: StopId::new(mode.clone(), row.to_stop_id),
            transfer_type: row.transfer_type,
            min_transfer_secs: row.min_transfer_time.unwrap_or(0),
        })
        .collect();

    let agencies = agency_rows
        .into_iter()
        .map(|row| (row.agency_id.unwrap_or_default(), row.agency_name))
        .collect();

    let bundle = Bundle {
        mode: mode.clone(),
        source: dir.display().to_string(),
        stops,
        routes,
        trips,
        stop_times,
        calendars,
        exceptions,
        transfers,
        agencies,
    };

    info!(
        mode = %mode,
        stops = bundle.stops.len(),
        routes = bundle.routes.len(),
        trips = bundle.trips.len(),
        calendars = bundle.calendars.len(),
        transfers = bundle.transfers.len(),
        "Bundle loaded"
    );

    Ok(bundle)
}

/// Read a mandatory file; absence is a [`FeedError::MissingFile`].
fn read_required<T: DeserializeOwned>(
    mode: &ModeTag,
    dir: &Path,
    file: &'static str,
) -> Result<Vec<T>, FeedError> {
    let path = dir.join(file);
    if !path.exists() {
        return Err(FeedError::MissingFile {
            mode: mode.clone(),
            file,
        });
    }
    read_rows(mode, &path, file)
}

/// Read an optional file; absence yields an empty list.
fn read_optional<T: DeserializeOwned>(
    mode: &ModeTag,
    dir: &Path,
    file: &'static str,
) -> Result<Vec<T>, FeedError> {
    let path = dir.join(file);
    if !path.exists() {
        warn!(mode = %mode, file, "Optional file absent, treating as empty");
        return Ok(Vec::new());
    }
    read_rows(mode, &path, file)
}

fn read_rows<T: DeserializeOwned>(
    mode: &ModeTag,
    path: &Path,
    file: &'static str,
) -> Result<Vec<T>, FeedError> {
    let bytes = std::fs::read(path).map_err(|source| FeedError::Io {
        mode: mode.clone(),
        file,
        source,
    })?;
    let content = strip_bom(&bytes);

    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(content);

    let mut rows = Vec::new();
    for result in reader.deserialize() {
        let row: T = result.map_err(|e| FeedError::MalformedFeed {
            mode: mode.clone(),
            file,
            message: e.to_string(),
        })?;
        rows.push(row);
    }

    debug!(mode = %mode, file, rows = rows.len(), "Read file");
    Ok(rows)
}

/// Strip a UTF-8 byte-order mark, which several agencies prepend.
fn strip_bom(bytes: &[u8]) -> &[u8] {
    bytes.strip_prefix(b"\xef\xbb\xbf").unwrap_or(bytes)
}

fn parse_time(mode: &ModeTag, file: &'static str, value: &str) -> Result<GtfsTime, FeedError> {
    GtfsTime::parse(value).map_err(|e| FeedError::MalformedFeed {
        mode: mode.clone(),
        file,
        message: format!("{value:?}: {e}"),
    })
}

fn parse_date(mode: &ModeTag, file: &'static str, value: &str) -> Result<NaiveDate, FeedError> {
    NaiveDate::parse_from_str(value, "%Y%m%d").map_err(|_| FeedError::MalformedFeed {
        mode: mode.clone(),
        file,
        message: format!("invalid date {value:?}, expected YYYYMMDD"),
    })
}

/// Times must be non-decreasing along each trip's stop sequence.
fn validate_stop_time_order(
    mode: &ModeTag,
    stop_times: &HashMap<TripId, Vec<StopTime>>,
) -> Result<(), FeedError> {
    for (trip_id, times) in stop_times {
        for window in times.windows(2) {
            if window[1].arrival < window[0].departure {
                return Err(FeedError::MalformedFeed {
                    mode: mode.clone(),
                    file: "stop_times.txt",
                    message: format!(
                        "trip {} time runs backwards at stop_sequence {}",
                        trip_id,
                        window[1].stop_sequence
                    ),
                });
            }
        }
    }
    Ok(())
}

/// All stop_times stop ids and trip route ids must resolve.
fn validate_references(
    mode: &ModeTag,
    stops: &HashMap<StopId, Stop>,
    routes: &HashMap<RouteId, Route>,
    trips: &HashMap<TripId, Trip>,
    stop_times: &HashMap<TripId, Vec<StopTime>>,
) -> Result<(), FeedError> {
    let mut offenders = Vec::new();
    let mut count = 0usize;

    for times in stop_times.values() {
        for st in times {
            if !stops.contains_key(&st.stop_id) {
                count += 1;
                if offenders.len() < MAX_REPORTED_OFFENDERS {
                    offenders.push(format!("stop_times: unknown stop {}", st.stop_id));
                }
            }
        }
    }
    for trip in trips.values() {
        if !routes.contains_key(&trip.route_id) {
            count += 1;
            if offenders.len() < MAX_REPORTED_OFFENDERS {
                offenders.push(format!("trips: unknown route {}", trip.route_id));
            }
        }
    }

    if count > 0 {
        return Err(FeedError::UnresolvedReferences {
            mode: mode.clone(),
            count,
            offenders,
        });
    }
    Ok(())
}
