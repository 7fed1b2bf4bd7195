//! Stop records.

use serde::Serialize;

use super::ids::StopId;
use super::mode::ModeTag;

/// A physical stop or platform from a GTFS bundle.
///
/// Stops are immutable once loaded. The owning mode is part of the id.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Stop {
    pub id: StopId,
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
    /// Platform designation from `platform_code`, when the feed carries one.
    pub platform: Option<String>,
}

impl Stop {
    /// Returns the mode this stop was loaded under.
    pub fn mode(&self) -> &ModeTag {
        self.id.mode()
    }

    /// Placeholder stop for ids that no longer resolve (e.g. after a lossy
    /// merge). The raw id stands in for the name.
    pub fn unknown(id: StopId) -> Self {
        let name = id.raw().to_string();
        Self {
            id,
            name,
            latitude: 0.0,
            longitude: 0.0,
            platform: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mode_comes_from_id() {
        let mode = ModeTag::parse("vline").unwrap();
        let stop = Stop {
            id: StopId::new(mode.clone(), "47648"),
            name: "Tarneit Station".into(),
            latitude: -37.83,
            longitude: 144.69,
            platform: None,
        };
        assert_eq!(stop.mode(), &mode);
    }

    #[test]
    fn unknown_stop_uses_raw_id_as_name() {
        let id = StopId::new(ModeTag::parse("bus").unwrap(), "9999");
        let stop = Stop::unknown(id);
        assert_eq!(stop.name, "9999");
    }
}
