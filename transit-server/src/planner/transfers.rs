//! In-feed transfer lookup.
//!
//! `transfers.txt` declares walks the feed authorises between physical
//! stops, with a minimum duration. The planner relaxes these when a stop's
//! arrival label improves; they are directional as declared by the feed.

use std::collections::HashMap;

use crate::domain::{StopId, Transfer};

/// Lookup table over the feed's declared transfers.
#[derive(Debug, Clone, Default)]
pub struct TransferTable {
    by_from: HashMap<StopId, Vec<Transfer>>,
    len: usize,
}

impl TransferTable {
    /// Create an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a table from feed transfer records, keeping only those whose
    /// endpoints satisfy `keep`.
    pub fn from_records<'a, F>(records: impl Iterator<Item = &'a Transfer>, keep: F) -> Self
    where
        F: Fn(&StopId) -> bool,
    {
        let mut table = Self::new();
        for transfer in records {
            if keep(&transfer.from_stop) && keep(&transfer.to_stop) {
                table.add(transfer.clone());
            }
        }
        table
    }

    /// Add a transfer record.
    pub fn add(&mut self, transfer: Transfer) {
        self.by_from
            .entry(transfer.from_stop.clone())
            .or_default()
            .push(transfer);
        self.len += 1;
    }

    /// All transfers departing from `stop`.
    pub fn from_stop(&self, stop: &StopId) -> &[Transfer] {
        self.by_from.get(stop).map(Vec::as_slice).unwrap_or(&[])
    }

    /// The declared minimum walk between two stops, if any.
    pub fn walk_secs(&self, from: &StopId, to: &StopId) -> Option<u32> {
        self.from_stop(from)
            .iter()
            .find(|t| &t.to_stop == to)
            .map(|t| t.min_transfer_secs)
    }

    /// Number of transfer records.
    pub fn len(&self) -> usize {
        self.len
    }

    /// True if no transfers are declared.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ModeTag;

    fn stop(raw: &str) -> StopId {
        StopId::new(ModeTag::parse("vline").unwrap(), raw)
    }

    fn transfer(from: &str, to: &str, secs: u32) -> Transfer {
        Transfer {
            from_stop: stop(from),
            to_stop: stop(to),
            transfer_type: 2,
            min_transfer_secs: secs,
        }
    }

    #[test]
    fn empty_table() {
        let table = TransferTable::new();
        assert!(table.is_empty());
        assert!(table.from_stop(&stop("A")).is_empty());
        assert!(table.walk_secs(&stop("A"), &stop("B")).is_none());
    }

    #[test]
    fn add_and_lookup() {
        let mut table = TransferTable::new();
        table.add(transfer("A", "B", 180));

        assert_eq!(table.len(), 1);
        assert_eq!(table.walk_secs(&stop("A"), &stop("B")), Some(180));
        // Directional: the reverse is not implied
        assert!(table.walk_secs(&stop("B"), &stop("A")).is_none());
    }

    #[test]
    fn from_records_filters_endpoints() {
        let records = vec![transfer("A", "B", 180), transfer("A", "GHOST", 60)];
        let table =
            TransferTable::from_records(records.iter(), |id| id.raw() != "GHOST");

        assert_eq!(table.len(), 1);
        assert!(table.walk_secs(&stop("A"), &stop("GHOST")).is_none());
    }

    #[test]
    fn multiple_targets_from_one_stop() {
        let mut table = TransferTable::new();
        table.add(transfer("A", "B", 180));
        table.add(transfer("A", "C", 240));

        assert_eq!(table.from_stop(&stop("A")).len(), 2);
    }
}
