//! Transport mode tags.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Error returned when parsing an invalid mode tag.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid mode tag: {reason}")]
pub struct InvalidModeTag {
    reason: &'static str,
}

/// A tag naming one loaded GTFS bundle (e.g. "vline", "metro", "tram", "bus").
///
/// Mode tags are lowercase ASCII alphanumerics (plus `-` and `_`). The colon
/// is reserved as the separator in global ids (`mode:raw`), so a tag can
/// never contain one. Any `ModeTag` value is valid by construction.
///
/// # Examples
///
/// ```
/// use transit_server::domain::ModeTag;
///
/// let vline = ModeTag::parse("vline").unwrap();
/// assert_eq!(vline.as_str(), "vline");
///
/// // Uppercase and separators are rejected
/// assert!(ModeTag::parse("VLine").is_err());
/// assert!(ModeTag::parse("v:line").is_err());
/// assert!(ModeTag::parse("").is_err());
/// ```
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ModeTag(String);

impl ModeTag {
    /// Parse a mode tag from a string.
    pub fn parse(s: &str) -> Result<Self, InvalidModeTag> {
        if s.is_empty() {
            return Err(InvalidModeTag {
                reason: "must not be empty",
            });
        }

        for b in s.bytes() {
            let ok = b.is_ascii_lowercase() || b.is_ascii_digit() || b == b'-' || b == b'_';
            if !ok {
                return Err(InvalidModeTag {
                    reason: "must be lowercase ASCII alphanumerics, '-' or '_'",
                });
            }
        }

        Ok(ModeTag(s.to_string()))
    }

    /// Returns the tag as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for ModeTag {
    type Error = InvalidModeTag;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        ModeTag::parse(&s)
    }
}

impl From<ModeTag> for String {
    fn from(tag: ModeTag) -> String {
        tag.0
    }
}

impl fmt::Debug for ModeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ModeTag({})", self.0)
    }
}

impl fmt::Display for ModeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
