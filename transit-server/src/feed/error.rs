//! Feed loading errors and warnings.

use crate::domain::ModeTag;

/// Fatal errors raised while loading GTFS bundles. Any of these aborts
/// startup; nothing in this module is recoverable per-request.
#[derive(Debug, thiserror::Error)]
pub enum FeedError {
    /// A mandatory file is absent from the bundle directory
    #[error("bundle {mode}: missing mandatory file {file}")]
    MissingFile { mode: ModeTag, file: &'static str },

    /// A file failed to parse (missing column, bad value, bad encoding)
    #[error("bundle {mode}: malformed {file}: {message}")]
    MalformedFeed {
        mode: ModeTag,
        file: &'static str,
        message: String,
    },

    /// Rows reference ids that do not resolve within the bundle.
    /// Carries at most the first 20 offenders.
    #[error("bundle {mode}: {count} unresolved references (showing up to 20): {offenders:?}")]
    UnresolvedReferences {
        mode: ModeTag,
        count: usize,
        offenders: Vec<String>,
    },

    /// Underlying IO failure reading the bundle directory
    #[error("bundle {mode}: io error reading {file}: {source}")]
    Io {
        mode: ModeTag,
        file: &'static str,
        source: std::io::Error,
    },
}

/// A non-fatal merge collision: the same id appeared in two bundles with
/// differing content. The earlier-listed bundle's record was kept.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DuplicateId {
    /// Entity kind, e.g. "stop" or "trip".
    pub kind: &'static str,
    /// Global id of the colliding records.
    pub id: String,
    /// Source (mode and path) whose record was kept.
    pub kept: String,
    /// Source whose record was dropped.
    pub dropped: String,
}

impl std::fmt::Display for DuplicateId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "duplicate {} id {}: kept record from {}, dropped record from {}",
            self.kind, self.id, self.kept, self.dropped
        )
    }
}
