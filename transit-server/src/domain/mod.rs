//! Domain types for the journey planner.
//!
//! This module contains the core model types representing validated transit
//! data. Types enforce their invariants at construction time, so code that
//! receives them can trust their validity. Everything here is immutable once
//! the catalogue has loaded, with the single exception of the realtime
//! fields on [`Leg`].

mod calendar;
mod connection;
mod error;
mod ids;
mod journey;
mod mode;
mod route;
mod stop;
mod time;
mod trip;

pub use calendar::{Calendar, CalendarException, ExceptionKind};
pub use connection::{Connection, Transfer};
pub use error::DomainError;
pub use ids::{InvalidGlobalId, RouteId, ServiceId, StopId, TripId};
pub use journey::{Journey, Leg};
pub use mode::{InvalidModeTag, ModeTag};
pub use route::{Route, RouteType};
pub use stop::Stop;
pub use time::{GtfsTime, TimeError};
pub use trip::{StopTime, Trip};
