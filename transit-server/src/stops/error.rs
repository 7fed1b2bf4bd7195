//! Stop lookup errors.

/// Failure to resolve a free-text stop query.
#[derive(Debug, Clone, thiserror::Error)]
pub enum LookupError {
    /// No stop matched the query well enough
    #[error("stop not found: {query}")]
    UnknownStop {
        query: String,
        /// Closest names, best first, for the error response.
        suggestions: Vec<String>,
    },
}
