//! Stop name lookup.
//!
//! Maps free-text queries to stop ids. The candidate catalogue is built once
//! at load time and reused; lookups never mutate it. Fuzzy scoring is a
//! token-sort similarity so "Station Tarneit" still finds "Tarneit Station".

use std::collections::HashMap;

use tracing::debug;

use crate::domain::{ModeTag, StopId};
use crate::feed::Catalogue;

use super::error::LookupError;

/// Default minimum fuzzy score for a match to count.
pub const DEFAULT_MIN_SCORE: u8 = 60;

/// Default cap on fuzzy results.
pub const DEFAULT_LIMIT: usize = 10;

/// One fuzzy match, scored 0..=100.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FuzzyMatch {
    pub stop_id: StopId,
    pub name: String,
    pub score: u8,
}

/// A pre-built candidate name.
#[derive(Debug)]
struct Candidate {
    name: String,
    /// Token-sorted lowercase form used for scoring.
    key: String,
    /// Several stops may share one name (platforms, modes).
    stop_ids: Vec<StopId>,
}

/// Read-mostly index from stop names to ids.
#[derive(Debug)]
pub struct StopIndex {
    /// Lowercased exact name → ids.
    exact: HashMap<String, Vec<StopId>>,
    candidates: Vec<Candidate>,
    min_score: u8,
}

impl StopIndex {
    /// Build the index over every stop in the catalogue.
    pub fn build(catalogue: &Catalogue) -> Self {
        Self::with_min_score(catalogue, DEFAULT_MIN_SCORE)
    }

    /// Build with a custom score floor.
    pub fn with_min_score(catalogue: &Catalogue, min_score: u8) -> Self {
        let mut exact: HashMap<String, Vec<StopId>> = HashMap::new();
        let mut by_name: HashMap<String, Vec<StopId>> = HashMap::new();

        for stop in catalogue.iter_stops() {
            exact
                .entry(stop.name.to_lowercase())
                .or_default()
                .push(stop.id.clone());
            by_name
                .entry(stop.name.clone())
                .or_default()
                .push(stop.id.clone());
        }

        // Deterministic candidate order and id order within a name
        let mut candidates: Vec<Candidate> = by_name
            .into_iter()
            .map(|(name, mut stop_ids)| {
                stop_ids.sort();
                let key = token_sort_key(&name);
                Candidate {
                    name,
                    key,
                    stop_ids,
                }
            })
            .collect();
        candidates.sort_by(|a, b| a.name.cmp(&b.name));

        for ids in exact.values_mut() {
            ids.sort();
        }

        debug!(candidates = candidates.len(), "Stop index built");
        Self {
            exact,
            candidates,
            min_score,
        }
    }

    /// Exact (case-insensitive) name lookup.
    pub fn lookup_exact(&self, name: &str) -> &[StopId] {
        self.exact
            .get(&name.trim().to_lowercase())
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Ranked fuzzy lookup.
    ///
    /// Results are sorted by descending score, ties broken by name
    /// ascending, then capped at `limit`. Every non-empty query yields a
    /// (possibly empty) list; scores are monotone non-increasing.
    pub fn lookup_fuzzy(&self, query: &str, limit: usize, min_score: u8) -> Vec<FuzzyMatch> {
        let query_key = token_sort_key(query);
        if query_key.is_empty() {
            return Vec::new();
        }

        let mut scored: Vec<(&Candidate, u8)> = self
            .candidates
            .iter()
            .map(|c| (c, token_sort_score(&query_key, &c.key)))
            .filter(|(_, score)| *score >= min_score)
            .collect();

        scored.sort_by(|(a, sa), (b, sb)| sb.cmp(sa).then_with(|| a.name.cmp(&b.name)));

        scored
            .into_iter()
            .flat_map(|(c, score)| {
                c.stop_ids.iter().map(move |id| FuzzyMatch {
                    stop_id: id.clone(),
                    name: c.name.clone(),
                    score,
                })
            })
            .take(limit)
            .collect()
    }

    /// Resolve a query to one stop id: exact match first, then the best
    /// fuzzy match at or above the index's score floor.
    pub fn resolve(&self, query: &str) -> Result<StopId, LookupError> {
        let trimmed = query.trim();
        if trimmed.is_empty() {
            return Err(LookupError::UnknownStop {
                query: query.to_string(),
                suggestions: Vec::new(),
            });
        }

        if let Some(id) = self.lookup_exact(trimmed).first() {
            return Ok(id.clone());
        }

        let matches = self.lookup_fuzzy(trimmed, DEFAULT_LIMIT, self.min_score);
        match matches.first() {
            Some(best) => Ok(best.stop_id.clone()),
            None => {
                // Suggest the closest names even below the floor
                let suggestions = self
                    .lookup_fuzzy(trimmed, 5, 1)
                    .into_iter()
                    .map(|m| m.name)
                    .collect();
                Err(LookupError::UnknownStop {
                    query: query.to_string(),
                    suggestions,
                })
            }
        }
    }

    /// Resolve within one mode only; `None` when nothing in that mode
    /// matches well enough.
    pub fn resolve_in_mode(&self, query: &str, mode: &ModeTag) -> Option<StopId> {
        let trimmed = query.trim();
        if trimmed.is_empty() {
            return None;
        }

        if let Some(id) = self
            .lookup_exact(trimmed)
            .iter()
            .find(|id| id.mode() == mode)
        {
            return Some(id.clone());
        }

        self.lookup_fuzzy(trimmed, usize::MAX, self.min_score)
            .into_iter()
            .find(|m| m.stop_id.mode() == mode)
            .map(|m| m.stop_id)
    }
}

/// Lowercase, tokenize on non-alphanumerics, sort, re-join.
fn token_sort_key(s: &str) -> String {
    let mut tokens: Vec<String> = s
        .split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(|t| t.to_lowercase())
        .collect();
    tokens.sort();
    tokens.join(" ")
}

/// Token-sort similarity in 0..=100 over pre-computed keys.
fn token_sort_score(a: &str, b: &str) -> u8 {
    if a.is_empty() && b.is_empty() {
        return 100;
    }
    (strsim::normalized_levenshtein(a, b) * 100.0).round() as u8
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::path::Path;
    use tempfile::TempDir;

    fn mode() -> ModeTag {
        ModeTag::parse("vline").unwrap()
    }

    fn write_bundle(dir: &Path) {
        fs::write(
            dir.join("stops.txt"),
            "stop_id,stop_name,stop_lat,stop_lon\n\
             1,Tarneit Station,-37.83,144.69\n\
             2,Geelong Station,-38.14,144.36\n\
             3,Waurn Ponds Station,-38.21,144.30\n\
             4,North Geelong Station,-38.12,144.35\n\
             5,Tarneit Station,-37.83,144.70\n",
        )
        .unwrap();
        fs::write(
            dir.join("routes.txt"),
            "route_id,route_short_name,route_long_name,route_type\nR1,Geelong,Geelong Line,2\n",
        )
        .unwrap();
        fs::write(dir.join("trips.txt"), "route_id,service_id,trip_id\nR1,WD,T1\n").unwrap();
        fs::write(
            dir.join("stop_times.txt"),
            "trip_id,arrival_time,departure_time,stop_id,stop_sequence\n\
             T1,10:00:00,10:00:00,1,1\n\
             T1,10:30:00,10:30:00,2,2\n",
        )
        .unwrap();
    }

    fn index() -> StopIndex {
        let dir = TempDir::new().unwrap();
        write_bundle(dir.path());
        let catalogue = Catalogue::load_dirs(&[(mode(), dir.path())]).unwrap();
        StopIndex::build(&catalogue)
    }

    #[test]
    fn exact_lookup_is_case_insensitive() {
        let index = index();
        assert_eq!(index.lookup_exact("Geelong Station").len(), 1);
        assert_eq!(index.lookup_exact("geelong station").len(), 1);
        assert_eq!(index.lookup_exact("  GEELONG STATION ").len(), 1);
        assert!(index.lookup_exact("Flinders Street").is_empty());
    }

    #[test]
    fn duplicate_names_keep_all_ids() {
        let index = index();
        // Two stops named "Tarneit Station"
        assert_eq!(index.lookup_exact("Tarneit Station").len(), 2);
    }

    #[test]
    fn fuzzy_ignores_word_order() {
        let index = index();
        let matches = index.lookup_fuzzy("Station Geelong", 10, 60);
        assert!(!matches.is_empty());
        assert_eq!(matches[0].name, "Geelong Station");
        assert_eq!(matches[0].score, 100);
    }

    #[test]
    fn fuzzy_tolerates_typos() {
        let index = index();
        let matches = index.lookup_fuzzy("Gelong", 10, 40);
        assert!(matches.iter().any(|m| m.name == "Geelong Station"));
    }

    #[test]
    fn fuzzy_scores_are_monotone_non_increasing() {
        let index = index();
        let matches = index.lookup_fuzzy("geelong", 10, 1);
        for window in matches.windows(2) {
            assert!(window[0].score >= window[1].score);
        }
    }

    #[test]
    fn fuzzy_respects_limit_and_floor() {
        let index = index();
        assert!(index.lookup_fuzzy("station", 2, 1).len() <= 2);
        assert!(index.lookup_fuzzy("zzzzqqqq", 10, 60).is_empty());
    }

    #[test]
    fn resolve_prefers_exact_match() {
        let index = index();
        let id = index.resolve("Geelong Station").unwrap();
        assert_eq!(id.raw(), "2");
    }

    #[test]
    fn resolve_falls_back_to_fuzzy() {
        let index = index();
        let id = index.resolve("geelong staton").unwrap();
        assert_eq!(id.raw(), "2");
    }

    #[test]
    fn resolve_empty_query_is_unknown() {
        let index = index();
        let err = index.resolve("   ").unwrap_err();
        assert!(matches!(err, LookupError::UnknownStop { .. }));
    }

    #[test]
    fn resolve_unknown_carries_suggestions() {
        let index = index();
        // "Waurn" alone scores under the default floor against
        // "Waurn Ponds Station", so it fails but suggests it.
        match index.resolve("Waurn") {
            Err(LookupError::UnknownStop { suggestions, .. }) => {
                assert!(suggestions.contains(&"Waurn Ponds Station".to_string()));
            }
            Ok(other) => panic!("expected UnknownStop, resolved to {other}"),
        }
    }

    #[test]
    fn resolve_in_mode_filters_by_mode() {
        let index = index();
        assert!(index.resolve_in_mode("Geelong Station", &mode()).is_some());
        let other = ModeTag::parse("metro").unwrap();
        assert!(index.resolve_in_mode("Geelong Station", &other).is_none());
    }

    #[test]
    fn token_sort_key_normalises() {
        assert_eq!(token_sort_key("Geelong Station"), "geelong station");
        assert_eq!(token_sort_key("Station, Geelong"), "geelong station");
        assert_eq!(token_sort_key("  "), "");
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        /// Scoring is total over arbitrary strings and stays within range.
        #[test]
        fn score_is_total_and_bounded(a in ".{0,40}", b in ".{0,40}") {
            let score = token_sort_score(&token_sort_key(&a), &token_sort_key(&b));
            prop_assert!(score <= 100);
        }

        /// A string always matches itself perfectly.
        #[test]
        fn self_similarity_is_perfect(s in "[a-zA-Z ]{1,40}") {
            prop_assume!(!token_sort_key(&s).is_empty());
            let key = token_sort_key(&s);
            prop_assert_eq!(token_sort_score(&key, &key), 100);
        }

        /// Token order never affects the score.
        #[test]
        fn word_order_is_irrelevant(
            a in "[a-z]{2,8}",
            b in "[a-z]{2,8}",
        ) {
            let forward = token_sort_key(&format!("{a} {b}"));
            let backward = token_sort_key(&format!("{b} {a}"));
            prop_assert_eq!(forward, backward);
        }
    }
}
