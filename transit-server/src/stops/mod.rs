//! Free-text stop lookup.
//!
//! Builds a name index over the merged catalogue at load time and serves
//! exact and fuzzy queries against it.

mod error;
mod index;

pub use error::LookupError;
pub use index::{FuzzyMatch, StopIndex, DEFAULT_LIMIT, DEFAULT_MIN_SCORE};
