//! Mode-scoped entity identifiers.
//!
//! Separate GTFS bundles freely reuse raw ids (stop "19854" can name two
//! different stops in two feeds), so every id is keyed by `(mode, raw)`
//! internally and rendered as the global form `mode:raw` at the boundary.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::mode::ModeTag;

/// Error returned when parsing an invalid global id.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid global id: {reason}")]
pub struct InvalidGlobalId {
    reason: &'static str,
}

macro_rules! scoped_id {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        pub struct $name {
            mode: ModeTag,
            raw: String,
        }

        impl $name {
            /// Create an id from a mode tag and the bundle-local raw id.
            pub fn new(mode: ModeTag, raw: impl Into<String>) -> Self {
                Self {
                    mode,
                    raw: raw.into(),
                }
            }

            /// Parse the global `mode:raw` form.
            pub fn parse_global(s: &str) -> Result<Self, InvalidGlobalId> {
                let (mode, raw) = s.split_once(':').ok_or(InvalidGlobalId {
                    reason: "expected mode:raw",
                })?;
                let mode = ModeTag::parse(mode).map_err(|_| InvalidGlobalId {
                    reason: "invalid mode component",
                })?;
                if raw.is_empty() {
                    return Err(InvalidGlobalId {
                        reason: "raw component must not be empty",
                    });
                }
                Ok(Self::new(mode, raw))
            }

            /// Returns the owning mode tag.
            pub fn mode(&self) -> &ModeTag {
                &self.mode
            }

            /// Returns the bundle-local raw id.
            pub fn raw(&self) -> &str {
                &self.raw
            }

            /// Returns the global `mode:raw` form.
            pub fn global(&self) -> String {
                format!("{}:{}", self.mode, self.raw)
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({}:{})", stringify!($name), self.mode, self.raw)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}:{}", self.mode, self.raw)
            }
        }
    };
}

scoped_id! {
    /// Identifier of a stop within the merged catalogue.
    StopId
}

scoped_id! {
    /// Identifier of a route within the merged catalogue.
    RouteId
}

scoped_id! {
    /// Identifier of a trip (one scheduled vehicle run).
    TripId
}

scoped_id! {
    /// Identifier of a service calendar entry.
    ServiceId
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mode(s: &str) -> ModeTag {
        ModeTag::parse(s).unwrap()
    }

    #[test]
    fn global_form_roundtrips() {
        let id = StopId::new(mode("vline"), "19854");
        assert_eq!(id.global(), "vline:19854");
        assert_eq!(StopId::parse_global("vline:19854").unwrap(), id);
    }

    #[test]
    fn parse_global_rejects_bad_input() {
        assert!(StopId::parse_global("19854").is_err());
        assert!(StopId::parse_global(":19854").is_err());
        assert!(StopId::parse_global("vline:").is_err());
        assert!(StopId::parse_global("VLINE:1").is_err());
    }

    #[test]
    fn same_raw_different_mode_differ() {
        let a = StopId::new(mode("vline"), "19854");
        let b = StopId::new(mode("metro"), "19854");
        assert_ne!(a, b);
    }

    #[test]
    fn raw_may_contain_colon_free_punctuation() {
        let id = TripId::new(mode("vline"), "1-GEL-vpt-1.T1.1-MFSu-1");
        assert_eq!(id.raw(), "1-GEL-vpt-1.T1.1-MFSu-1");
        assert_eq!(
            TripId::parse_global(&id.global()).unwrap().raw(),
            "1-GEL-vpt-1.T1.1-MFSu-1"
        );
    }
}
