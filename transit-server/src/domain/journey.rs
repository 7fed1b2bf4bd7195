//! Journey and leg types.
//!
//! A `Journey` is a complete trip from origin to destination: transit legs
//! (one contiguous run on one trip) separated by transfer legs (an in-feed
//! walk, or the dwell at an interchange). Realtime adjustments live on the
//! legs; scheduled times are never overwritten.

use super::error::DomainError;
use super::ids::{RouteId, TripId};
use super::route::RouteType;
use super::stop::Stop;
use super::time::GtfsTime;

/// One contiguous segment of a journey: a ride on a single trip, or a
/// transfer between trips.
///
/// A leg is either a transit leg (`trip_id` present) or a transfer leg
/// (`is_transfer` set), never both. Transfer legs have no intermediate
/// stops; a same-stop interchange has `from_stop == to_stop`.
#[derive(Debug, Clone, PartialEq)]
pub struct Leg {
    pub from_stop: Stop,
    pub to_stop: Stop,
    /// Scheduled departure, in the service-day frame of the journey.
    pub departure: GtfsTime,
    /// Scheduled arrival, in the service-day frame of the journey.
    pub arrival: GtfsTime,
    pub trip_id: Option<TripId>,
    pub route_id: Option<RouteId>,
    pub route_short_name: Option<String>,
    pub route_type: Option<RouteType>,
    pub is_transfer: bool,
    /// Names of the stops passed between `from_stop` and `to_stop`,
    /// excluding both endpoints.
    pub intermediate_stops: Vec<String>,
    /// Stops on this leg including both endpoints.
    pub num_stops: u32,

    // Realtime overlay fields. Only these four plus `platform` may change
    // after construction.
    pub actual_departure: Option<GtfsTime>,
    pub actual_arrival: Option<GtfsTime>,
    pub delay_seconds: i32,
    pub cancelled: bool,

    pub platform: Option<String>,
    /// Whether a trip update matched this leg.
    pub has_realtime: bool,
}

impl Leg {
    /// Build a transit leg.
    #[allow(clippy::too_many_arguments)]
    pub fn transit(
        from_stop: Stop,
        to_stop: Stop,
        departure: GtfsTime,
        arrival: GtfsTime,
        trip_id: TripId,
        route_id: Option<RouteId>,
        route_short_name: Option<String>,
        route_type: Option<RouteType>,
        intermediate_stops: Vec<String>,
    ) -> Self {
        let num_stops = intermediate_stops.len() as u32 + 2;
        let platform = from_stop.platform.clone();
        Self {
            from_stop,
            to_stop,
            departure,
            arrival,
            trip_id: Some(trip_id),
            route_id,
            route_short_name,
            route_type,
            is_transfer: false,
            intermediate_stops,
            num_stops,
            actual_departure: None,
            actual_arrival: None,
            delay_seconds: 0,
            cancelled: false,
            platform,
            has_realtime: false,
        }
    }

    /// Build a transfer leg (walk between stops, or dwell at an interchange
    /// when `from_stop == to_stop`).
    pub fn transfer(from_stop: Stop, to_stop: Stop, departure: GtfsTime, arrival: GtfsTime) -> Self {
        Self {
            from_stop,
            to_stop,
            departure,
            arrival,
            trip_id: None,
            route_id: None,
            route_short_name: None,
            route_type: None,
            is_transfer: true,
            intermediate_stops: Vec::new(),
            num_stops: 2,
            actual_departure: None,
            actual_arrival: None,
            delay_seconds: 0,
            cancelled: false,
            platform: None,
            has_realtime: false,
        }
    }

    /// True for legs riding a vehicle.
    pub fn is_transit(&self) -> bool {
        self.trip_id.is_some()
    }

    /// Scheduled duration in seconds.
    pub fn duration_seconds(&self) -> u32 {
        self.arrival.seconds().saturating_sub(self.departure.seconds())
    }

    /// Departure after realtime adjustment, falling back to scheduled.
    pub fn effective_departure(&self) -> GtfsTime {
        self.actual_departure.unwrap_or(self.departure)
    }

    /// Arrival after realtime adjustment, falling back to scheduled.
    pub fn effective_arrival(&self) -> GtfsTime {
        self.actual_arrival.unwrap_or(self.arrival)
    }
}

/// A complete journey from origin to destination.
///
/// # Invariants
///
/// - Adjacent legs connect: `legs[i].to_stop == legs[i + 1].from_stop` and
///   times never run backwards along the chain.
/// - Every leg is transit or transfer, never both (enforced by the `Leg`
///   constructors).
/// - An empty leg list is the degenerate journey where origin equals
///   destination (duration zero).
#[derive(Debug, Clone, PartialEq)]
pub struct Journey {
    pub origin: Stop,
    pub destination: Stop,
    pub legs: Vec<Leg>,
    /// Cleared by the realtime overlay when a delay breaks a transfer.
    pub valid_after_realtime: bool,
    /// Interchange names where realtime invalidated the transfer.
    pub broken_transfers: Vec<String>,
}

impl Journey {
    /// Construct a journey, validating leg adjacency.
    pub fn new(origin: Stop, destination: Stop, legs: Vec<Leg>) -> Result<Self, DomainError> {
        for window in legs.windows(2) {
            let prev = &window[0];
            let next = &window[1];
            if prev.to_stop.id != next.from_stop.id {
                return Err(DomainError::LegsNotConnected {
                    arrived_at: prev.to_stop.id.global(),
                    departs_from: next.from_stop.id.global(),
                });
            }
            if next.departure < prev.arrival {
                return Err(DomainError::TimeRunsBackwards {
                    at: prev.to_stop.name.clone(),
                });
            }
        }

        if let Some(first) = legs.first() {
            if first.from_stop.id != origin.id {
                return Err(DomainError::LegsNotConnected {
                    arrived_at: origin.id.global(),
                    departs_from: first.from_stop.id.global(),
                });
            }
        }
        if let Some(last) = legs.last() {
            if last.to_stop.id != destination.id {
                return Err(DomainError::LegsNotConnected {
                    arrived_at: last.to_stop.id.global(),
                    departs_from: destination.id.global(),
                });
            }
        }

        Ok(Self {
            origin,
            destination,
            legs,
            valid_after_realtime: true,
            broken_transfers: Vec::new(),
        })
    }

    /// The zero-leg journey for identical origin and destination.
    pub fn degenerate(stop: Stop) -> Self {
        Self {
            origin: stop.clone(),
            destination: stop,
            legs: Vec::new(),
            valid_after_realtime: true,
            broken_transfers: Vec::new(),
        }
    }

    /// Transit legs in order.
    pub fn transit_legs(&self) -> impl Iterator<Item = &Leg> {
        self.legs.iter().filter(|l| l.is_transit())
    }

    /// Scheduled departure: the first **non-transfer** leg's departure.
    ///
    /// Transfer legs carry synthetic times, so using them for the envelope
    /// would corrupt durations; `None` only for the zero-leg journey.
    pub fn departure(&self) -> Option<GtfsTime> {
        self.transit_legs().next().map(|l| l.departure)
    }

    /// Scheduled arrival: the last **non-transfer** leg's arrival.
    pub fn arrival(&self) -> Option<GtfsTime> {
        self.transit_legs().last().map(|l| l.arrival)
    }

    /// Total scheduled duration in seconds, wrapping across midnight when
    /// the arrival offset is numerically below the departure offset.
    pub fn duration_seconds(&self) -> u32 {
        match (self.departure(), self.arrival()) {
            (Some(dep), Some(arr)) => {
                let (dep, arr) = (dep.seconds(), arr.seconds());
                if arr >= dep {
                    arr - dep
                } else {
                    arr + GtfsTime::DAY - dep
                }
            }
            _ => 0,
        }
    }

    /// Number of vehicle changes.
    pub fn num_transfers(&self) -> usize {
        self.transit_legs().count().saturating_sub(1)
    }

    /// Whether any leg carries realtime data.
    pub fn has_realtime(&self) -> bool {
        self.legs.iter().any(|l| l.has_realtime)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ModeTag, StopId};

    fn stop(raw: &str, name: &str) -> Stop {
        Stop {
            id: StopId::new(ModeTag::parse("vline").unwrap(), raw),
            name: name.into(),
            latitude: 0.0,
            longitude: 0.0,
            platform: None,
        }
    }

    fn trip(raw: &str) -> TripId {
        TripId::new(ModeTag::parse("vline").unwrap(), raw)
    }

    fn t(s: &str) -> GtfsTime {
        GtfsTime::parse(s).unwrap()
    }

    fn ride(from: &Stop, to: &Stop, dep: &str, arr: &str, trip_raw: &str) -> Leg {
        Leg::transit(
            from.clone(),
            to.clone(),
            t(dep),
            t(arr),
            trip(trip_raw),
            None,
            None,
            None,
            Vec::new(),
        )
    }

    #[test]
    fn direct_journey() {
        let a = stop("A", "Alpha");
        let b = stop("B", "Beta");
        let journey =
            Journey::new(a.clone(), b.clone(), vec![ride(&a, &b, "10:00:00", "10:30:00", "T1")])
                .unwrap();

        assert_eq!(journey.num_transfers(), 0);
        assert_eq!(journey.departure(), Some(t("10:00:00")));
        assert_eq!(journey.arrival(), Some(t("10:30:00")));
        assert_eq!(journey.duration_seconds(), 1800);
    }

    #[test]
    fn legs_must_connect() {
        let a = stop("A", "Alpha");
        let b = stop("B", "Beta");
        let c = stop("C", "Gamma");

        let result = Journey::new(
            a.clone(),
            c.clone(),
            vec![
                ride(&a, &b, "10:00:00", "10:30:00", "T1"),
                // Next leg departs from C, not B
                ride(&c, &c, "10:40:00", "11:00:00", "T2"),
            ],
        );
        assert!(matches!(result, Err(DomainError::LegsNotConnected { .. })));
    }

    #[test]
    fn times_must_not_run_backwards() {
        let a = stop("A", "Alpha");
        let b = stop("B", "Beta");
        let c = stop("C", "Gamma");

        let result = Journey::new(
            a.clone(),
            c.clone(),
            vec![
                ride(&a, &b, "10:00:00", "10:30:00", "T1"),
                ride(&b, &c, "10:20:00", "11:00:00", "T2"),
            ],
        );
        assert!(matches!(result, Err(DomainError::TimeRunsBackwards { .. })));
    }

    #[test]
    fn envelope_skips_transfer_legs() {
        // A leading walk transfer must not define the journey departure.
        let a = stop("A", "Alpha");
        let a2 = stop("A2", "Alpha East");
        let b = stop("B", "Beta");

        let walk = Leg::transfer(a.clone(), a2.clone(), t("00:00:00"), t("00:03:00"));
        let train = ride(&a2, &b, "10:00:00", "10:30:00", "T1");

        let journey = Journey::new(a.clone(), b.clone(), vec![walk, train]).unwrap();

        assert_eq!(journey.departure(), Some(t("10:00:00")));
        assert_eq!(journey.arrival(), Some(t("10:30:00")));
        // Not 10.5 hours: the walk's 00:00:00 placeholder is ignored
        assert_eq!(journey.duration_seconds(), 1800);
    }

    #[test]
    fn duration_wraps_midnight() {
        let a = stop("A", "Alpha");
        let b = stop("B", "Beta");

        // Departure 23:50, arrival 00:20 the next day expressed normalised
        let leg = Leg::transit(
            a.clone(),
            b.clone(),
            t("23:50:00"),
            t("00:20:00"),
            trip("T1"),
            None,
            None,
            None,
            Vec::new(),
        );
        let journey = Journey {
            origin: a,
            destination: b,
            legs: vec![leg],
            valid_after_realtime: true,
            broken_transfers: Vec::new(),
        };
        assert_eq!(journey.duration_seconds(), 1800);
    }

    #[test]
    fn degenerate_journey_has_zero_duration() {
        let a = stop("A", "Alpha");
        let journey = Journey::degenerate(a);
        assert!(journey.legs.is_empty());
        assert_eq!(journey.duration_seconds(), 0);
        assert_eq!(journey.num_transfers(), 0);
        assert_eq!(journey.departure(), None);
    }

    #[test]
    fn interchange_dwell_counts_as_one_transfer() {
        let a = stop("A", "Alpha");
        let b = stop("B", "Beta");
        let c = stop("C", "Gamma");

        let journey = Journey::new(
            a.clone(),
            c.clone(),
            vec![
                ride(&a, &b, "10:00:00", "10:30:00", "T1"),
                Leg::transfer(b.clone(), b.clone(), t("10:30:00"), t("10:34:00")),
                ride(&b, &c, "10:34:00", "11:00:00", "T2"),
            ],
        )
        .unwrap();

        assert_eq!(journey.num_transfers(), 1);
        assert_eq!(journey.duration_seconds(), 3600);
    }

    #[test]
    fn effective_times_fall_back_to_scheduled() {
        let a = stop("A", "Alpha");
        let b = stop("B", "Beta");
        let mut leg = ride(&a, &b, "10:00:00", "10:30:00", "T1");

        assert_eq!(leg.effective_arrival(), t("10:30:00"));
        leg.actual_arrival = Some(t("10:32:00"));
        assert_eq!(leg.effective_arrival(), t("10:32:00"));
        assert_eq!(leg.effective_departure(), t("10:00:00"));
    }
}
