//! Applying trip updates to a planned journey.
//!
//! The overlay never mutates scheduled times: it fills the actual-time
//! fields from per-stop delays, flags cancelled trips, and then re-checks
//! that every interchange still works on the adjusted times. Applying the
//! same feed twice yields the same leg state, because actuals are always
//! recomputed from the scheduled baseline.

use std::collections::HashMap;

use gtfs_realtime::trip_update::StopTimeUpdate;
use gtfs_realtime::{FeedMessage, TripUpdate};
use prost::Message;
use tracing::{debug, warn};

use crate::domain::{GtfsTime, Journey};

use super::error::RealtimeError;

/// `TripDescriptor.schedule_relationship` value marking a cancelled trip.
const SCHEDULE_RELATIONSHIP_CANCELED: i32 = 3;

/// What one overlay application did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OverlaySummary {
    /// Legs that matched a trip update.
    pub matched_legs: usize,
    /// Legs whose trip was flagged cancelled.
    pub cancelled_legs: usize,
    /// Interchanges the adjusted times no longer support.
    pub broken_transfers: Vec<String>,
}

/// Decode a trip-update feed from protobuf wire bytes.
pub fn decode_feed(bytes: &[u8]) -> Result<FeedMessage, RealtimeError> {
    FeedMessage::decode(bytes).map_err(|e| RealtimeError::MalformedFeed(e.to_string()))
}

/// Apply a trip-update feed to a journey in place.
///
/// Legs without a matching update stay on schedule. Cancelled trips keep
/// their scheduled times with `cancelled` set. A broken interchange clears
/// `valid_after_realtime` but the journey is still usable.
pub fn apply_trip_updates(journey: &mut Journey, feed: &FeedMessage) -> OverlaySummary {
    let updates: HashMap<&str, &TripUpdate> = feed
        .entity
        .iter()
        .filter_map(|entity| entity.trip_update.as_ref())
        .filter_map(|update| update.trip.trip_id.as_deref().map(|id| (id, update)))
        .collect();

    let mut summary = OverlaySummary::default();

    for leg in &mut journey.legs {
        let Some(trip_id) = &leg.trip_id else {
            continue;
        };
        let Some(update) = updates.get(trip_id.raw()) else {
            continue;
        };

        summary.matched_legs += 1;
        leg.has_realtime = true;

        if update.trip.schedule_relationship == Some(SCHEDULE_RELATIONSHIP_CANCELED) {
            debug!(trip = %trip_id, "Trip cancelled in realtime");
            leg.cancelled = true;
            leg.actual_departure = None;
            leg.actual_arrival = None;
            leg.delay_seconds = 0;
            summary.cancelled_legs += 1;
            continue;
        }

        leg.cancelled = false;
        let from_update = update_for_stop(update, leg.from_stop.id.raw());
        let to_update = update_for_stop(update, leg.to_stop.id.raw());

        let delay_from = from_update.map(departure_delay).unwrap_or(0);
        let delay_to = to_update.map(arrival_delay).unwrap_or(0);

        leg.actual_departure = Some(shift(leg.departure, delay_from));
        leg.actual_arrival = Some(shift(leg.arrival, delay_to));
        leg.delay_seconds = delay_to;

        if let Some(platform) = from_update.and_then(assigned_platform) {
            leg.platform = Some(platform);
        }
    }

    revalidate_transfers(journey, &mut summary);

    if !summary.broken_transfers.is_empty() {
        warn!(
            broken = summary.broken_transfers.len(),
            "Realtime delays broke transfers"
        );
    }
    summary
}

/// Check every vehicle change on the adjusted times.
///
/// A same-stop interchange just needs the later vehicle to still be there
/// (non-negative dwell); a walk transfer additionally needs its declared
/// walking time to fit in the gap.
fn revalidate_transfers(journey: &mut Journey, summary: &mut OverlaySummary) {
    journey.broken_transfers.clear();
    journey.valid_after_realtime = true;

    let legs = &journey.legs;
    let mut previous_transit: Option<usize> = None;

    for (idx, leg) in legs.iter().enumerate() {
        if !leg.is_transit() {
            continue;
        }
        if let Some(prev_idx) = previous_transit {
            let prev = &legs[prev_idx];
            if prev.trip_id != leg.trip_id {
                let walk_secs: i64 = legs[prev_idx + 1..idx]
                    .iter()
                    .filter(|l| l.is_transfer && l.from_stop.id != l.to_stop.id)
                    .map(|l| l.duration_seconds() as i64)
                    .sum();

                let gap = leg.effective_departure().seconds() as i64
                    - prev.effective_arrival().seconds() as i64;
                if gap < walk_secs {
                    let interchange = prev.to_stop.name.clone();
                    journey.valid_after_realtime = false;
                    journey.broken_transfers.push(interchange.clone());
                    summary.broken_transfers.push(interchange);
                }
            }
        }
        previous_transit = Some(idx);
    }
}

/// The stop-time update for one stop of the trip, if present.
fn update_for_stop<'a>(update: &'a TripUpdate, stop_raw: &str) -> Option<&'a StopTimeUpdate> {
    update
        .stop_time_update
        .iter()
        .find(|stu| stu.stop_id.as_deref() == Some(stop_raw))
}

/// Departure delay, falling back to the arrival event.
fn departure_delay(stu: &StopTimeUpdate) -> i32 {
    stu.departure
        .as_ref()
        .and_then(|e| e.delay)
        .or_else(|| stu.arrival.as_ref().and_then(|e| e.delay))
        .unwrap_or(0)
}

/// Arrival delay, falling back to the departure event.
fn arrival_delay(stu: &StopTimeUpdate) -> i32 {
    stu.arrival
        .as_ref()
        .and_then(|e| e.delay)
        .or_else(|| stu.departure.as_ref().and_then(|e| e.delay))
        .unwrap_or(0)
}

/// Platform assignment carried by the update, when present.
fn assigned_platform(stu: &StopTimeUpdate) -> Option<String> {
    stu.stop_time_properties
        .as_ref()
        .and_then(|p| p.assigned_stop_id.clone())
}

fn shift(time: GtfsTime, delay_secs: i32) -> GtfsTime {
    let shifted = time.seconds() as i64 + delay_secs as i64;
    GtfsTime::from_seconds(shifted.max(0) as u32)
}

/// True if any leg of the journey was touched by this feed.
pub fn journey_has_updates(journey: &Journey, feed: &FeedMessage) -> bool {
    let trip_ids: Vec<&str> = journey
        .transit_legs()
        .filter_map(|l| l.trip_id.as_ref().map(|t| t.raw()))
        .collect();
    feed.entity
        .iter()
        .filter_map(|e| e.trip_update.as_ref())
        .filter_map(|u| u.trip.trip_id.as_deref())
        .any(|id| trip_ids.contains(&id))
}
