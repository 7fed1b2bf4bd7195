//! GTFS-realtime trip-update overlay.
//!
//! The core accepts raw protobuf bytes (the fetch is separable), adjusts a
//! planned journey by per-stop delays and cancellations, and re-checks
//! transfer feasibility on the adjusted times. Realtime failures never
//! invalidate a scheduled answer: the stance is "scheduled plus best-effort
//! adjustment".

mod client;
mod error;
mod overlay;

pub use client::{RealtimeClient, RealtimeConfig, API_KEY_VAR};
pub use error::RealtimeError;
pub use overlay::{apply_trip_updates, decode_feed, journey_has_updates, OverlaySummary};
