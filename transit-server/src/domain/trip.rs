//! Trip and stop-time records.

use super::ids::{RouteId, ServiceId, StopId, TripId};
use super::time::GtfsTime;

/// One scheduled run of a vehicle on a route on a service day.
#[derive(Debug, Clone, PartialEq)]
pub struct Trip {
    pub id: TripId,
    pub route_id: RouteId,
    pub service_id: ServiceId,
    pub direction_id: Option<u8>,
    pub headsign: Option<String>,
}

/// A timed call of a trip at a stop.
///
/// Times are seconds from midnight of the trip's service day and may exceed
/// 86 400 for past-midnight calls. Within a trip, stop times are strictly
/// ordered by `stop_sequence` with non-decreasing times along that order.
#[derive(Debug, Clone, PartialEq)]
pub struct StopTime {
    pub trip_id: TripId,
    pub stop_sequence: u32,
    pub stop_id: StopId,
    pub arrival: GtfsTime,
    pub departure: GtfsTime,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ModeTag;

    #[test]
    fn stop_time_carries_raw_offsets() {
        let mode = ModeTag::parse("vline").unwrap();
        let st = StopTime {
            trip_id: TripId::new(mode.clone(), "T1"),
            stop_sequence: 3,
            stop_id: StopId::new(mode, "47648"),
            arrival: GtfsTime::parse("24:05:00").unwrap(),
            departure: GtfsTime::parse("24:06:00").unwrap(),
        };
        assert!(st.arrival.wraps_midnight());
        assert!(st.departure > st.arrival);
    }
}
