//! Connection-scan journey search.
//!
//! A single pass over the time-sorted connection array computes the
//! earliest arrival at every reachable stop, with back-pointers for
//! reconstruction. In-feed transfers are relaxed the moment a stop's label
//! improves, taking their absolute times from that moment. When a day yields
//! nothing the search advances up to a week, restarting from midnight.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use chrono::{Days, NaiveDate};
use tracing::{debug, info, instrument, warn};

use crate::calendar::ServiceCalendar;
use crate::domain::{DomainError, GtfsTime, Journey, Leg, ModeTag, Stop, StopId, TripId};
use crate::feed::Catalogue;

use super::config::PlannerConfig;
use super::connections::TransitNetwork;

/// Label for an unreached stop.
const UNREACHED: u32 = u32::MAX;

/// Cooperative cancellation signal, checked between scan iterations.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    /// A fresh, un-cancelled token.
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation. The scan notices at its next check interval.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    /// Whether cancellation was requested.
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// One journey request against a single mode's network.
#[derive(Debug, Clone)]
pub struct PlanRequest {
    pub origin: StopId,
    pub destination: StopId,
    /// Earliest departure on `date`.
    pub departure: GtfsTime,
    /// The service date to start searching on.
    pub date: NaiveDate,
}

/// Terminal result of one plan.
#[derive(Debug, Clone)]
pub enum PlanOutcome {
    /// A journey was found, possibly on a later day.
    Found {
        journey: Journey,
        /// How many days past the requested date the journey runs.
        date_shifted_by_days: u32,
    },
    /// The stops are not connected by this network at all.
    NoRoute,
    /// Connectivity exists but no service runs within the look-ahead window.
    NoServiceWithinLookahead,
    /// The scan was cancelled externally.
    Cancelled,
}

/// Errors raised before or during a plan.
#[derive(Debug, Clone, thiserror::Error)]
pub enum PlanError {
    /// The stop does not belong to this mode's network
    #[error("stop {stop} is not served by mode {mode}")]
    StopNotInNetwork { stop: StopId, mode: ModeTag },

    /// Reconstruction produced an inconsistent journey
    #[error("journey reconstruction failed: {0}")]
    Reconstruction(#[from] DomainError),
}

/// Back-pointer for one stop: the edge that achieved its current label.
#[derive(Debug, Clone)]
enum Incoming {
    /// Boarded connection `conn` with effective times for this scan's frame.
    Ride {
        conn: usize,
        departure: u32,
        arrival: u32,
    },
    /// Walked an in-feed transfer from `from`.
    Walk {
        from: usize,
        departure: u32,
        arrival: u32,
    },
}

/// A step of the reconstructed path, earliest first after reversal.
#[derive(Debug, Clone)]
enum PathStep {
    Ride {
        conn: usize,
        departure: u32,
        arrival: u32,
    },
    Walk {
        from: usize,
        to: usize,
        departure: u32,
        arrival: u32,
    },
}

/// Outcome of one day's scan.
enum ScanDay {
    Found(Vec<PathStep>),
    NotFound,
    Cancelled,
}

/// Earliest-arrival planner over one mode's network.
pub struct Planner {
    network: Arc<TransitNetwork>,
    catalogue: Arc<Catalogue>,
    oracle: Arc<ServiceCalendar>,
    config: PlannerConfig,
}

impl Planner {
    /// Create a planner over pre-built, shared state.
    pub fn new(
        network: Arc<TransitNetwork>,
        catalogue: Arc<Catalogue>,
        oracle: Arc<ServiceCalendar>,
        config: PlannerConfig,
    ) -> Self {
        Self {
            network,
            catalogue,
            oracle,
            config,
        }
    }

    /// Find the earliest-arrival journey for `request`.
    ///
    /// Tries the requested date first, then advances day by day (restarting
    /// from midnight) up to the configured look-ahead. Distinguishes "these
    /// stops are never connected" from "nothing runs in the window".
    #[instrument(skip(self, request, cancel), fields(
        mode = %self.network.mode(),
        origin = %request.origin,
        destination = %request.destination,
        date = %request.date,
    ))]
    pub fn plan(
        &self,
        request: &PlanRequest,
        cancel: &CancelToken,
    ) -> Result<PlanOutcome, PlanError> {
        let Some(origin) = self.network.stop_idx(&request.origin) else {
            return Err(PlanError::StopNotInNetwork {
                stop: request.origin.clone(),
                mode: self.network.mode().clone(),
            });
        };
        let Some(destination) = self.network.stop_idx(&request.destination) else {
            return Err(PlanError::StopNotInNetwork {
                stop: request.destination.clone(),
                mode: self.network.mode().clone(),
            });
        };

        if origin == destination {
            debug!("Origin equals destination; zero-leg journey");
            return Ok(PlanOutcome::Found {
                journey: Journey::degenerate(self.stop(&request.origin)),
                date_shifted_by_days: 0,
            });
        }

        for shift in 0..=self.config.max_next_day_search {
            let Some(date) = request.date.checked_add_days(Days::new(shift as u64)) else {
                break;
            };
            let departure_secs = if shift == 0 {
                request.departure.seconds()
            } else {
                0
            };

            match self.scan_day(origin, destination, departure_secs, date, true, cancel) {
                ScanDay::Cancelled => return Ok(PlanOutcome::Cancelled),
                ScanDay::Found(steps) => {
                    let journey =
                        self.build_journey(&request.origin, &request.destination, &steps)?;
                    info!(
                        shift,
                        departure = %journey.departure().map(|t| t.to_string()).unwrap_or_default(),
                        arrival = %journey.arrival().map(|t| t.to_string()).unwrap_or_default(),
                        transfers = journey.num_transfers(),
                        "Journey found"
                    );
                    return Ok(PlanOutcome::Found {
                        journey,
                        date_shifted_by_days: shift,
                    });
                }
                ScanDay::NotFound => {
                    debug!(shift, "No reachable service on this day");
                }
            }
        }

        // Exhausted the look-ahead: one calendar-free scan decides whether
        // the stops are connected at all.
        match self.scan_day(origin, destination, 0, request.date, false, cancel) {
            ScanDay::Cancelled => Ok(PlanOutcome::Cancelled),
            ScanDay::Found(_) => {
                warn!("Service exists but nothing runs within the look-ahead window");
                Ok(PlanOutcome::NoServiceWithinLookahead)
            }
            ScanDay::NotFound => Ok(PlanOutcome::NoRoute),
        }
    }

    /// Scan one service date.
    ///
    /// Two sorted cursors are merged by effective departure: every
    /// connection on its own service date, plus the past-midnight tail of
    /// the previous date shifted back by one day.
    fn scan_day(
        &self,
        origin: usize,
        destination: usize,
        departure_secs: u32,
        date: NaiveDate,
        respect_calendar: bool,
        cancel: &CancelToken,
    ) -> ScanDay {
        let conns = self.network.connections();
        let day = GtfsTime::DAY;

        let mut tau = vec![UNREACHED; self.network.stop_count()];
        let mut incoming: Vec<Option<Incoming>> = vec![None; self.network.stop_count()];

        tau[origin] = departure_secs;
        for edge in self.network.transfers_from(origin) {
            let walk_arrival = departure_secs + edge.duration_secs;
            if walk_arrival < tau[edge.to] {
                tau[edge.to] = walk_arrival;
                incoming[edge.to] = Some(Incoming::Walk {
                    from: origin,
                    departure: departure_secs,
                    arrival: walk_arrival,
                });
            }
        }

        // No connection departing before the request can be boarded
        let mut today = conns.partition_point(|c| c.departure.seconds() < departure_secs);
        let prev_date = date.pred_opt();
        let mut wrapped = match prev_date {
            Some(_) => {
                let tail = &conns[self.network.first_wrapped()..];
                self.network.first_wrapped()
                    + tail.partition_point(|c| c.departure.seconds() - day < departure_secs)
            }
            None => conns.len(),
        };

        let mut processed = 0usize;

        loop {
            let today_dep = (today < conns.len()).then(|| conns[today].departure.seconds());
            let wrapped_dep =
                (wrapped < conns.len()).then(|| conns[wrapped].departure.seconds() - day);

            // Earlier effective departure first; the previous service day's
            // tail wins ties for determinism.
            let (idx, offset, service_date) = match (today_dep, wrapped_dep) {
                (None, None) => break,
                (Some(_), None) => {
                    let idx = today;
                    today += 1;
                    (idx, 0, date)
                }
                (None, Some(_)) => {
                    let idx = wrapped;
                    wrapped += 1;
                    // prev_date is Some whenever the wrapped cursor is live
                    (idx, day, prev_date.unwrap_or(date))
                }
                (Some(t), Some(w)) => {
                    if w <= t {
                        let idx = wrapped;
                        wrapped += 1;
                        (idx, day, prev_date.unwrap_or(date))
                    } else {
                        let idx = today;
                        today += 1;
                        (idx, 0, date)
                    }
                }
            };

            processed += 1;
            if processed % self.config.cancel_check_interval == 0 && cancel.is_cancelled() {
                debug!(processed, "Scan cancelled");
                return ScanDay::Cancelled;
            }

            let conn = &conns[idx];
            let effective_departure = conn.departure.seconds() - offset;
            let effective_arrival = conn.arrival.seconds() - offset;

            // Everything later departs after the best known arrival: done
            if tau[destination] != UNREACHED && effective_departure > tau[destination] {
                break;
            }

            let (from, to) = self.network.conn_endpoints(idx);

            // Unreachable departure stop
            if tau[from] == UNREACHED || effective_departure < tau[from] {
                continue;
            }

            // Service-calendar filter
            if respect_calendar {
                if let Some(service) = &conn.service_id {
                    if !self.oracle.is_active(service, service_date) {
                        continue;
                    }
                }
            }

            // Transfer-time floor when changing vehicles
            if let Some(Incoming::Ride { conn: prev_conn, .. }) = &incoming[from] {
                if conns[*prev_conn].trip_id != conn.trip_id
                    && effective_departure < tau[from] + self.config.min_transfer_secs
                {
                    continue;
                }
            }

            if effective_arrival < tau[to] {
                tau[to] = effective_arrival;
                incoming[to] = Some(Incoming::Ride {
                    conn: idx,
                    departure: effective_departure,
                    arrival: effective_arrival,
                });

                for edge in self.network.transfers_from(to) {
                    let walk_arrival = effective_arrival + edge.duration_secs;
                    if walk_arrival < tau[edge.to] {
                        tau[edge.to] = walk_arrival;
                        incoming[edge.to] = Some(Incoming::Walk {
                            from: to,
                            departure: effective_arrival,
                            arrival: walk_arrival,
                        });
                    }
                }
            }
        }

        if tau[destination] == UNREACHED {
            return ScanDay::NotFound;
        }

        // Walk the back-pointers to the origin
        let mut steps = Vec::new();
        let mut current = destination;
        let mut guard = 0usize;
        while current != origin {
            guard += 1;
            if guard > conns.len() + self.network.stop_count() + 1 {
                warn!("Back-pointer chain did not terminate; treating as unreachable");
                return ScanDay::NotFound;
            }
            match &incoming[current] {
                None => return ScanDay::NotFound,
                Some(Incoming::Ride {
                    conn,
                    departure,
                    arrival,
                }) => {
                    steps.push(PathStep::Ride {
                        conn: *conn,
                        departure: *departure,
                        arrival: *arrival,
                    });
                    current = self.network.conn_endpoints(*conn).0;
                }
                Some(Incoming::Walk {
                    from,
                    departure,
                    arrival,
                }) => {
                    steps.push(PathStep::Walk {
                        from: *from,
                        to: current,
                        departure: *departure,
                        arrival: *arrival,
                    });
                    current = *from;
                }
            }
        }
        steps.reverse();
        ScanDay::Found(steps)
    }

    /// Turn a reconstructed path into legs: consecutive same-trip rides
    /// become one transit leg; walks become transfer legs; a dwell transfer
    /// leg is inserted at same-stop interchanges.
    fn build_journey(
        &self,
        origin: &StopId,
        destination: &StopId,
        steps: &[PathStep],
    ) -> Result<Journey, PlanError> {
        let conns = self.network.connections();
        let mut legs: Vec<Leg> = Vec::new();

        // Pending run of same-trip connections, with effective times
        let mut run: Vec<(usize, u32, u32)> = Vec::new();
        let mut run_trip: Option<TripId> = None;

        let mut flush_run =
            |run: &mut Vec<(usize, u32, u32)>, run_trip: &mut Option<TripId>, legs: &mut Vec<Leg>| {
                let Some(trip_id) = run_trip.take() else {
                    return;
                };
                if run.is_empty() {
                    return;
                }

                let (first_idx, first_dep, _) = run[0];
                let (last_idx, _, last_arr) = run[run.len() - 1];
                let first = &conns[first_idx];
                let last = &conns[last_idx];

                let intermediate: Vec<String> = run[..run.len() - 1]
                    .iter()
                    .map(|(idx, _, _)| self.stop_name(&conns[*idx].to_stop))
                    .collect();

                let route = first
                    .route_id
                    .as_ref()
                    .and_then(|id| self.catalogue.get_route(id));

                let leg = Leg::transit(
                    self.stop(&first.from_stop),
                    self.stop(&last.to_stop),
                    GtfsTime::from_seconds(first_dep),
                    GtfsTime::from_seconds(last_arr),
                    trip_id,
                    first.route_id.clone(),
                    route.map(|r| r.display_name().to_string()),
                    first.route_type,
                    intermediate,
                );

                // Dwell transfer between two rides at the same stop
                if let Some(prev) = legs.last() {
                    if prev.is_transit() {
                        legs.push(Leg::transfer(
                            prev.to_stop.clone(),
                            leg.from_stop.clone(),
                            prev.arrival,
                            leg.departure,
                        ));
                    }
                }
                legs.push(leg);
                run.clear();
            };

        for step in steps {
            match step {
                PathStep::Ride {
                    conn,
                    departure,
                    arrival,
                } => {
                    let trip = conns[*conn].trip_id.clone();
                    if trip != run_trip && run_trip.is_some() {
                        flush_run(&mut run, &mut run_trip, &mut legs);
                    }
                    run_trip = trip;
                    run.push((*conn, *departure, *arrival));
                }
                PathStep::Walk {
                    from,
                    to,
                    departure,
                    arrival,
                } => {
                    flush_run(&mut run, &mut run_trip, &mut legs);
                    legs.push(Leg::transfer(
                        self.stop(self.network.stop_id(*from)),
                        self.stop(self.network.stop_id(*to)),
                        GtfsTime::from_seconds(*departure),
                        GtfsTime::from_seconds(*arrival),
                    ));
                }
            }
        }
        flush_run(&mut run, &mut run_trip, &mut legs);

        let journey = Journey::new(self.stop(origin), self.stop(destination), legs)?;
        Ok(journey)
    }

    fn stop(&self, id: &StopId) -> Stop {
        self.catalogue
            .get_stop(id)
            .cloned()
            .unwrap_or_else(|| Stop::unknown(id.clone()))
    }

    fn stop_name(&self, id: &StopId) -> String {
        self.catalogue
            .get_stop(id)
            .map(|s| s.name.clone())
            .unwrap_or_else(|| id.raw().to_string())
    }
}
