//! Elementary connections and in-feed transfers.

use super::ids::{RouteId, ServiceId, StopId, TripId};
use super::route::RouteType;
use super::time::GtfsTime;

/// A single timetabled hop from one stop to the next on one trip; the
/// scanner's atomic unit.
///
/// A connection with `trip_id = None` is a transfer (walk) connection. Those
/// also carry `service_id = None` (available on every service day), and
/// their times are assigned by the planner when it considers the walk.
#[derive(Debug, Clone, PartialEq)]
pub struct Connection {
    pub from_stop: StopId,
    pub to_stop: StopId,
    pub departure: GtfsTime,
    pub arrival: GtfsTime,
    pub trip_id: Option<TripId>,
    pub route_id: Option<RouteId>,
    pub route_type: Option<RouteType>,
    pub service_id: Option<ServiceId>,
}

impl Connection {
    /// True for synthetic walk connections.
    pub fn is_transfer(&self) -> bool {
        self.trip_id.is_none()
    }

    /// Travel time in seconds. Arrival never precedes departure.
    pub fn duration_seconds(&self) -> u32 {
        self.arrival.seconds() - self.departure.seconds()
    }
}

/// An in-feed walk between two stops, from `transfers.txt`.
#[derive(Debug, Clone, PartialEq)]
pub struct Transfer {
    pub from_stop: StopId,
    pub to_stop: StopId,
    pub transfer_type: u8,
    pub min_transfer_secs: u32,
}
