//! Domain error types.
//!
//! These represent validation failures in the domain layer, distinct from
//! feed/IO errors.

/// Domain-level errors for validation and data consistency.
#[derive(Debug, Clone, thiserror::Error)]
pub enum DomainError {
    /// Adjacent legs do not share a stop
    #[error("legs do not connect: arrived at {arrived_at}, next departs from {departs_from}")]
    LegsNotConnected {
        arrived_at: String,
        departs_from: String,
    },

    /// A later leg departs before an earlier leg arrives
    #[error("journey time runs backwards at {at}")]
    TimeRunsBackwards { at: String },

    /// A connection arrives before it departs
    #[error("connection arrives before departure on trip {trip}")]
    NegativeConnection { trip: String },
}
