//! Route records and GTFS route types.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::ids::RouteId;

/// The numeric GTFS `route_type` code, preserved end-to-end because mode
/// display derives from it.
///
/// Victorian feeds use both the basic codes (0 tram, 2 rail, 3 bus) and the
/// extended European set (102 long-distance rail, 204 express bus, 400 metro,
/// 700/701 bus, 900 tram).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RouteType(pub u16);

impl RouteType {
    /// Human-readable vehicle class for display.
    pub fn mode_display(&self) -> &'static str {
        match self.0 {
            0 | 900 => "Tram",
            2 | 102 => "Rail",
            400 => "Metro",
            3 | 200 | 204 | 700 | 701 => "Bus",
            _ => "Transit",
        }
    }

    /// Returns the raw numeric code.
    pub fn code(&self) -> u16 {
        self.0
    }
}

impl fmt::Display for RouteType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A route: a named line that trips run on.
#[derive(Debug, Clone, PartialEq)]
pub struct Route {
    pub id: RouteId,
    pub route_type: RouteType,
    pub short_name: String,
    pub long_name: String,
    pub agency_id: Option<String>,
}

impl Route {
    /// The name to show for this route: the short name when present,
    /// otherwise the long name.
    pub fn display_name(&self) -> &str {
        if self.short_name.is_empty() {
            &self.long_name
        } else {
            &self.short_name
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ModeTag;

    #[test]
    fn mode_display_mapping() {
        assert_eq!(RouteType(0).mode_display(), "Tram");
        assert_eq!(RouteType(900).mode_display(), "Tram");
        assert_eq!(RouteType(2).mode_display(), "Rail");
        assert_eq!(RouteType(102).mode_display(), "Rail");
        assert_eq!(RouteType(400).mode_display(), "Metro");
        assert_eq!(RouteType(3).mode_display(), "Bus");
        assert_eq!(RouteType(204).mode_display(), "Bus");
        assert_eq!(RouteType(700).mode_display(), "Bus");
        assert_eq!(RouteType(701).mode_display(), "Bus");
        assert_eq!(RouteType(1234).mode_display(), "Transit");
    }

    #[test]
    fn numeric_code_is_preserved() {
        assert_eq!(RouteType(102).code(), 102);
        assert_eq!(RouteType(102).to_string(), "102");
    }

    #[test]
    fn display_name_prefers_short_name() {
        let id = RouteId::new(ModeTag::parse("vline").unwrap(), "1-GEL");
        let mut route = Route {
            id,
            route_type: RouteType(2),
            short_name: "Geelong".into(),
            long_name: "Geelong Line".into(),
            agency_id: None,
        };
        assert_eq!(route.display_name(), "Geelong");

        route.short_name.clear();
        assert_eq!(route.display_name(), "Geelong Line");
    }
}
