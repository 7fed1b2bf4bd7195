//! Boundary shapes for external collaborators.
//!
//! The HTTP façade and CLI wrapper live outside this crate; they consume
//! these request/response structures and the status-mapping helpers.

mod dto;

pub use dto::{
    ErrorResponse, JourneyDto, JourneyPlanRequest, LegDto, PlanResponse, RequestError, StopSummary,
};
