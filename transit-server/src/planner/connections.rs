//! Connection building.
//!
//! Flattens every trip of one mode into elementary point-to-point
//! connections, sorted once by departure time. That array plus the transfer
//! table is the planner's whole world: built once, read-only afterwards.

use std::collections::HashMap;

use tracing::{debug, info, warn};

use crate::domain::{Connection, GtfsTime, ModeTag, StopId};
use crate::feed::Catalogue;

use super::transfers::TransferTable;

/// A dense transfer edge used during the scan.
#[derive(Debug, Clone, Copy)]
pub(crate) struct TransferEdge {
    pub to: usize,
    pub duration_secs: u32,
}

/// The scan-ready network for one mode.
///
/// Connections are sorted by `(departure, arrival, from_stop, trip)`, the
/// total order that makes scans deterministic. Stops are given dense indices
/// so the scan state lives in flat arrays.
#[derive(Debug)]
pub struct TransitNetwork {
    mode: ModeTag,
    stops: Vec<StopId>,
    stop_lookup: HashMap<StopId, usize>,
    connections: Vec<Connection>,
    /// Per-connection `(from, to)` dense stop indices.
    endpoints: Vec<(u32, u32)>,
    /// Index of the first connection departing at or past 24:00:00.
    first_wrapped: usize,
    /// Dense transfer adjacency, parallel to `stops`.
    transfer_edges: Vec<Vec<TransferEdge>>,
    transfers: TransferTable,
}

impl TransitNetwork {
    /// Build the network for `mode` from the merged catalogue.
    pub fn build(catalogue: &Catalogue, mode: &ModeTag) -> Self {
        // Deterministic dense indices: stops sorted by id
        let mut stops: Vec<StopId> = catalogue
            .iter_stops()
            .filter(|s| s.mode() == mode)
            .map(|s| s.id.clone())
            .collect();
        stops.sort();

        let stop_lookup: HashMap<StopId, usize> = stops
            .iter()
            .enumerate()
            .map(|(i, id)| (id.clone(), i))
            .collect();

        let mut connections = Vec::new();
        for trip in catalogue.iter_trips().filter(|t| t.id.mode() == mode) {
            let times = catalogue.stop_times(&trip.id);
            if times.len() < 2 {
                continue;
            }

            let route = catalogue.get_route(&trip.route_id);
            for pair in times.windows(2) {
                connections.push(Connection {
                    from_stop: pair[0].stop_id.clone(),
                    to_stop: pair[1].stop_id.clone(),
                    departure: pair[0].departure,
                    arrival: pair[1].arrival,
                    trip_id: Some(trip.id.clone()),
                    route_id: Some(trip.route_id.clone()),
                    route_type: route.map(|r| r.route_type),
                    service_id: Some(trip.service_id.clone()),
                });
            }
        }

        connections.sort_by(|a, b| {
            a.departure
                .cmp(&b.departure)
                .then_with(|| a.arrival.cmp(&b.arrival))
                .then_with(|| a.from_stop.cmp(&b.from_stop))
                .then_with(|| a.trip_id.cmp(&b.trip_id))
        });

        // Loader validation guarantees every referenced stop resolves, but a
        // lossy merge could in principle break that; keep the arrays aligned
        // by dropping such connections outright.
        let mut endpoints = Vec::with_capacity(connections.len());
        connections.retain(|c| {
            match (stop_lookup.get(&c.from_stop), stop_lookup.get(&c.to_stop)) {
                (Some(&f), Some(&t)) => {
                    endpoints.push((f as u32, t as u32));
                    true
                }
                _ => {
                    warn!(from = %c.from_stop, to = %c.to_stop, "Dropping connection with unindexed stop");
                    false
                }
            }
        });

        let first_wrapped = connections
            .partition_point(|c| c.departure.seconds() < GtfsTime::DAY);

        let transfers = TransferTable::from_records(catalogue.transfers().iter(), |id| {
            stop_lookup.contains_key(id)
        });
        let mut transfer_edges: Vec<Vec<TransferEdge>> = vec![Vec::new(); stops.len()];
        for (idx, stop) in stops.iter().enumerate() {
            for t in transfers.from_stop(stop) {
                if let Some(&to) = stop_lookup.get(&t.to_stop) {
                    transfer_edges[idx].push(TransferEdge {
                        to,
                        duration_secs: t.min_transfer_secs,
                    });
                }
            }
        }

        info!(
            mode = %mode,
            stops = stops.len(),
            connections = connections.len(),
            wrapped = connections.len() - first_wrapped,
            transfers = transfers.len(),
            "Transit network built"
        );

        Self {
            mode: mode.clone(),
            stops,
            stop_lookup,
            connections,
            endpoints,
            first_wrapped,
            transfer_edges,
            transfers,
        }
    }

    /// The mode this network serves.
    pub fn mode(&self) -> &ModeTag {
        &self.mode
    }

    /// Number of indexed stops.
    pub fn stop_count(&self) -> usize {
        self.stops.len()
    }

    /// The sorted connection array.
    pub fn connections(&self) -> &[Connection] {
        &self.connections
    }

    /// Whether a stop belongs to this network.
    pub fn contains(&self, stop: &StopId) -> bool {
        self.stop_lookup.contains_key(stop)
    }

    /// The in-feed transfer table scoped to this mode.
    pub fn transfers(&self) -> &TransferTable {
        &self.transfers
    }

    pub(crate) fn stop_idx(&self, stop: &StopId) -> Option<usize> {
        self.stop_lookup.get(stop).copied()
    }

    pub(crate) fn stop_id(&self, idx: usize) -> &StopId {
        &self.stops[idx]
    }

    pub(crate) fn conn_endpoints(&self, conn_idx: usize) -> (usize, usize) {
        let (f, t) = self.endpoints[conn_idx];
        (f as usize, t as usize)
    }

    pub(crate) fn first_wrapped(&self) -> usize {
        self.first_wrapped
    }

    pub(crate) fn transfers_from(&self, idx: usize) -> &[TransferEdge] {
        &self.transfer_edges[idx]
    }

    fn debug_is_sorted(&self) -> bool {
        self.connections
            .windows(2)
            .all(|w| w[0].departure <= w[1].departure)
    }
}

/// Build a network per mode present in the catalogue.
pub fn build_all(catalogue: &Catalogue) -> HashMap<ModeTag, TransitNetwork> {
    catalogue
        .modes()
        .iter()
        .map(|mode| {
            let network = TransitNetwork::build(catalogue, mode);
            debug!(mode = %mode, sorted = network.debug_is_sorted(), "Network order checked");
            (mode.clone(), network)
        })
        .collect()
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;
    use std::fs;
    use tempfile::TempDir;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(16))]

        /// Builder output is sorted whatever the stop_times row order was.
        #[test]
        fn sorted_regardless_of_row_order(seed in 0u64..1000) {
            let dir = TempDir::new().unwrap();
            fs::write(
                dir.path().join("stops.txt"),
                "stop_id,stop_name,stop_lat,stop_lon\nA,Alpha,-37.0,144.0\nB,Beta,-37.1,144.1\nC,Gamma,-37.2,144.2\n",
            ).unwrap();
            fs::write(
                dir.path().join("routes.txt"),
                "route_id,route_short_name,route_long_name,route_type\nR1,L,Line,2\n",
            ).unwrap();

            // A handful of trips at pseudo-random offsets
            let mut trips = String::from("route_id,service_id,trip_id\n");
            let mut stop_times = String::from("trip_id,arrival_time,departure_time,stop_id,stop_sequence\n");
            for i in 0..4u64 {
                let h = 6 + ((seed + i * 7) % 12);
                trips.push_str(&format!("R1,WD,T{i}\n"));
                stop_times.push_str(&format!("T{i},{h:02}:00:00,{h:02}:00:00,A,1\n"));
                stop_times.push_str(&format!("T{i},{h:02}:30:00,{h:02}:30:00,B,2\n"));
                stop_times.push_str(&format!("T{i},{h:02}:50:00,{h:02}:50:00,C,3\n"));
            }
            fs::write(dir.path().join("trips.txt"), trips).unwrap();
            fs::write(dir.path().join("stop_times.txt"), stop_times).unwrap();

            let mode = ModeTag::parse("vline").unwrap();
            let catalogue = Catalogue::load_dirs(&[(mode.clone(), dir.path())]).unwrap();
            let network = TransitNetwork::build(&catalogue, &mode);

            for window in network.connections().windows(2) {
                prop_assert!(window[0].departure <= window[1].departure);
            }
            for conn in network.connections() {
                prop_assert!(conn.arrival >= conn.departure);
            }
        }
    }
}
