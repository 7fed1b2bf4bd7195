//! GTFS static feed ingest.
//!
//! One bundle per transport mode, parsed into typed records (`loader`),
//! then merged into a single addressable catalogue (`catalogue`). All
//! loading happens once at process start; the catalogue is read-only
//! afterwards.

mod catalogue;
mod error;
mod loader;
mod records;

pub use catalogue::Catalogue;
pub use error::{DuplicateId, FeedError};
pub use loader::{load_bundle, Bundle};
