//! The merged multi-mode catalogue.
//!
//! Loads an ordered list of `(mode, path)` bundles and merges them into one
//! addressable store. Ids are mode-scoped, so cross-mode merges never
//! collide; listing the same mode twice (e.g. a feed plus a patch feed) is
//! where the duplicate policy applies: byte-identical records dedupe
//! silently, otherwise the earlier-listed bundle wins and a warning is kept.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::domain::{
    Calendar, CalendarException, ModeTag, Route, RouteId, ServiceId, Stop, StopId, StopTime,
    Transfer, Trip, TripId,
};

use super::error::{DuplicateId, FeedError};
use super::loader::{load_bundle, Bundle};

/// The merged, read-only schedule store for all loaded modes.
#[derive(Debug, Default)]
pub struct Catalogue {
    modes: Vec<ModeTag>,
    stops: HashMap<StopId, Stop>,
    routes: HashMap<RouteId, Route>,
    trips: HashMap<TripId, Trip>,
    stop_times: HashMap<TripId, Vec<StopTime>>,
    calendars: HashMap<ServiceId, Calendar>,
    exceptions: Vec<CalendarException>,
    transfers: Vec<Transfer>,
    agencies: HashMap<String, String>,
    /// True when at least one bundle shipped calendar data.
    has_calendar_data: bool,
    /// First-listed source per mode, for naming the winner in warnings.
    first_sources: HashMap<ModeTag, String>,
    warnings: Vec<DuplicateId>,
}

impl Catalogue {
    /// Load and merge bundles in the order given.
    pub fn load(feeds: &[(ModeTag, PathBuf)]) -> Result<Self, FeedError> {
        let mut catalogue = Self::default();
        for (mode, path) in feeds {
            let bundle = load_bundle(mode, path.as_path())?;
            catalogue.merge(bundle);
        }
        info!(
            modes = catalogue.modes.len(),
            stops = catalogue.stops.len(),
            trips = catalogue.trips.len(),
            duplicate_warnings = catalogue.warnings.len(),
            "Catalogue ready"
        );
        Ok(catalogue)
    }

    /// Convenience wrapper taking `&Path` pairs.
    pub fn load_dirs(feeds: &[(ModeTag, &Path)]) -> Result<Self, FeedError> {
        let owned: Vec<(ModeTag, PathBuf)> = feeds
            .iter()
            .map(|(m, p)| (m.clone(), p.to_path_buf()))
            .collect();
        Self::load(&owned)
    }

    fn merge(&mut self, bundle: Bundle) {
        if !self.modes.contains(&bundle.mode) {
            self.modes.push(bundle.mode.clone());
        }
        if !bundle.calendars.is_empty() || !bundle.exceptions.is_empty() {
            self.has_calendar_data = true;
        }

        let source = format!("{} ({})", bundle.mode, bundle.source);
        let kept = self
            .first_sources
            .entry(bundle.mode.clone())
            .or_insert_with(|| source.clone())
            .clone();

        merge_map(
            &mut self.stops,
            bundle.stops,
            "stop",
            &kept,
            &source,
            &mut self.warnings,
        );
        merge_map(
            &mut self.routes,
            bundle.routes,
            "route",
            &kept,
            &source,
            &mut self.warnings,
        );
        merge_map(
            &mut self.trips,
            bundle.trips,
            "trip",
            &kept,
            &source,
            &mut self.warnings,
        );
        merge_map(
            &mut self.stop_times,
            bundle.stop_times,
            "trip stop_times",
            &kept,
            &source,
            &mut self.warnings,
        );
        merge_map(
            &mut self.calendars,
            bundle.calendars,
            "service",
            &kept,
            &source,
            &mut self.warnings,
        );

        self.exceptions.extend(bundle.exceptions);
        self.transfers.extend(bundle.transfers);
        self.agencies.extend(bundle.agencies);
    }

    /// Look up a stop by id.
    pub fn get_stop(&self, id: &StopId) -> Option<&Stop> {
        self.stops.get(id)
    }

    /// Look up a route by id.
    pub fn get_route(&self, id: &RouteId) -> Option<&Route> {
        self.routes.get(id)
    }

    /// Look up a trip by id.
    pub fn get_trip(&self, id: &TripId) -> Option<&Trip> {
        self.trips.get(id)
    }

    /// Look up a stop by its global `mode:raw` form.
    pub fn get_stop_global(&self, global: &str) -> Option<&Stop> {
        let id = StopId::parse_global(global).ok()?;
        self.stops.get(&id)
    }

    /// Stop times of a trip, sorted by stop sequence. Empty for unknown trips.
    pub fn stop_times(&self, trip: &TripId) -> &[StopTime] {
        self.stop_times.get(trip).map(Vec::as_slice).unwrap_or(&[])
    }

    /// All stops across modes.
    pub fn iter_stops(&self) -> impl Iterator<Item = &Stop> {
        self.stops.values()
    }

    /// All trips across modes.
    pub fn iter_trips(&self) -> impl Iterator<Item = &Trip> {
        self.trips.values()
    }

    /// In-feed transfers across modes.
    pub fn transfers(&self) -> &[Transfer] {
        &self.transfers
    }

    /// Service calendars keyed by service id.
    pub fn calendars(&self) -> &HashMap<ServiceId, Calendar> {
        &self.calendars
    }

    /// Calendar exceptions in feed order.
    pub fn exceptions(&self) -> &[CalendarException] {
        &self.exceptions
    }

    /// Whether any bundle carried calendar data at all.
    pub fn has_calendar_data(&self) -> bool {
        self.has_calendar_data
    }

    /// Agency names keyed by agency id.
    pub fn agency_name(&self, agency_id: &str) -> Option<&str> {
        self.agencies.get(agency_id).map(String::as_str)
    }

    /// Mode tags in load order.
    pub fn modes(&self) -> &[ModeTag] {
        &self.modes
    }

    /// Duplicate-id warnings collected during the merge.
    pub fn warnings(&self) -> &[DuplicateId] {
        &self.warnings
    }

    /// The stop resolved either from a global id or a `(mode, raw)` pair.
    pub fn resolve_stop_id(&self, input: &str, mode: Option<&ModeTag>) -> Option<&Stop> {
        if let Some(stop) = self.get_stop_global(input) {
            return Some(stop);
        }
        let mode = mode?;
        self.stops.get(&StopId::new(mode.clone(), input))
    }
}

/// Merge `incoming` into `existing` under the §duplicate policy.
fn merge_map<K, V>(
    existing: &mut HashMap<K, V>,
    incoming: HashMap<K, V>,
    kind: &'static str,
    kept_source: &str,
    source: &str,
    warnings: &mut Vec<DuplicateId>,
) where
    K: std::hash::Hash + Eq + std::fmt::Display,
    V: PartialEq,
{
    for (key, value) in incoming {
        match existing.get(&key) {
            None => {
                existing.insert(key, value);
            }
            Some(kept) if *kept == value => {
                // Identical record in both bundles: silent dedupe.
            }
            Some(_) => {
                let dup = DuplicateId {
                    kind,
                    id: key.to_string(),
                    kept: kept_source.to_string(),
                    dropped: source.to_string(),
                };
                warn!(%dup, "Conflicting duplicate id; earlier bundle wins");
                warnings.push(dup);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn mode(s: &str) -> ModeTag {
        ModeTag::parse(s).unwrap()
    }

    fn write_bundle(dir: &Path, stop_name_a: &str) {
        fs::write(
            dir.join("stops.txt"),
            format!(
                "stop_id,stop_name,stop_lat,stop_lon\n\
                 A,{stop_name_a},-37.80,144.90\n\
                 B,Beta Station,-37.85,144.95\n"
            ),
        )
        .unwrap();
        fs::write(
            dir.join("routes.txt"),
            "route_id,route_short_name,route_long_name,route_type\nR1,Alpha,Alpha Line,2\n",
        )
        .unwrap();
        fs::write(
            dir.join("trips.txt"),
            "route_id,service_id,trip_id\nR1,WD,T1\n",
        )
        .unwrap();
        fs::write(
            dir.join("stop_times.txt"),
            "trip_id,arrival_time,departure_time,stop_id,stop_sequence\n\
             T1,10:00:00,10:00:00,A,1\n\
             T1,10:30:00,10:30:00,B,2\n",
        )
        .unwrap();
    }

    #[test]
    fn two_modes_merge_without_collision() {
        let d1 = TempDir::new().unwrap();
        let d2 = TempDir::new().unwrap();
        write_bundle(d1.path(), "Alpha Station");
        write_bundle(d2.path(), "Alpha Station");

        let catalogue = Catalogue::load_dirs(&[
            (mode("vline"), d1.path()),
            (mode("metro"), d2.path()),
        ])
        .unwrap();

        // Same raw id "A" in both bundles, but ids are mode-scoped
        assert_eq!(catalogue.iter_stops().count(), 4);
        assert!(catalogue.warnings().is_empty());
        assert!(catalogue.get_stop(&StopId::new(mode("vline"), "A")).is_some());
        assert!(catalogue.get_stop(&StopId::new(mode("metro"), "A")).is_some());
    }

    #[test]
    fn identical_duplicates_dedupe_silently() {
        let d1 = TempDir::new().unwrap();
        let d2 = TempDir::new().unwrap();
        write_bundle(d1.path(), "Alpha Station");
        write_bundle(d2.path(), "Alpha Station");

        let catalogue = Catalogue::load_dirs(&[
            (mode("vline"), d1.path()),
            (mode("vline"), d2.path()),
        ])
        .unwrap();

        assert_eq!(catalogue.iter_stops().count(), 2);
        assert!(catalogue.warnings().is_empty());
    }

    #[test]
    fn conflicting_duplicates_keep_earlier_and_warn() {
        let d1 = TempDir::new().unwrap();
        let d2 = TempDir::new().unwrap();
        write_bundle(d1.path(), "Alpha Station");
        write_bundle(d2.path(), "Alpha Station Renamed");

        let catalogue = Catalogue::load_dirs(&[
            (mode("vline"), d1.path()),
            (mode("vline"), d2.path()),
        ])
        .unwrap();

        let stop = catalogue.get_stop(&StopId::new(mode("vline"), "A")).unwrap();
        assert_eq!(stop.name, "Alpha Station");
        assert!(catalogue
            .warnings()
            .iter()
            .any(|w| w.kind == "stop" && w.id == "vline:A"));
    }

    #[test]
    fn global_id_lookup() {
        let d1 = TempDir::new().unwrap();
        write_bundle(d1.path(), "Alpha Station");

        let catalogue = Catalogue::load_dirs(&[(mode("vline"), d1.path())]).unwrap();

        assert!(catalogue.get_stop_global("vline:A").is_some());
        assert!(catalogue.get_stop_global("metro:A").is_none());
        assert!(catalogue.get_stop_global("A").is_none());

        // resolve accepts a (mode, raw) pair as well
        assert!(catalogue.resolve_stop_id("A", Some(&mode("vline"))).is_some());
        assert!(catalogue.resolve_stop_id("vline:A", None).is_some());
        assert!(catalogue.resolve_stop_id("A", None).is_none());
    }

    #[test]
    fn stop_times_for_unknown_trip_is_empty() {
        let d1 = TempDir::new().unwrap();
        write_bundle(d1.path(), "Alpha Station");
        let catalogue = Catalogue::load_dirs(&[(mode("vline"), d1.path())]).unwrap();

        let ghost = TripId::new(mode("vline"), "GHOST");
        assert!(catalogue.stop_times(&ghost).is_empty());
    }
}
