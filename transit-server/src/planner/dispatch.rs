//! Multi-mode dispatch.
//!
//! One journey request fans out to an independent planner per configured
//! mode. Planners share no mutable state, so they run concurrently on
//! blocking workers; the dispatcher joins them under a per-request
//! wall-clock budget and returns a result slot per mode. Cross-mode
//! chaining is deliberately absent.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::time::Duration;

use chrono::NaiveDate;
use futures::future::join_all;
use tracing::{debug, error, info, instrument, warn};

use crate::calendar::ServiceCalendar;
use crate::domain::{GtfsTime, Journey, ModeTag};
use crate::feed::Catalogue;
use crate::stops::{LookupError, StopIndex, DEFAULT_MIN_SCORE};

use super::config::PlannerConfig;
use super::connections::{build_all, TransitNetwork};
use super::search::{CancelToken, PlanError, PlanOutcome, PlanRequest, Planner};

/// One journey request as the dispatcher sees it: free-text endpoints,
/// resolved per mode.
#[derive(Debug, Clone)]
pub struct JourneyQuery {
    pub origin_query: String,
    pub destination_query: String,
    pub departure: GtfsTime,
    pub date: NaiveDate,
    /// Restrict to these modes; `None` means all loaded modes.
    pub modes: Option<Vec<ModeTag>>,
}

/// Why a mode's slot carries no journey.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModeNote {
    /// One or both endpoints are not served by this mode
    StopNotServed,
    /// The endpoints are never connected in this mode
    NoRoute,
    /// Connected, but nothing runs within the look-ahead window
    NoServiceWithinLookahead,
    /// The per-request budget expired before the scan finished
    Timeout,
    /// The request was cancelled
    Cancelled,
    /// The planner failed internally
    Failed,
}

/// Per-mode slot of a dispatch result.
#[derive(Debug, Clone)]
pub struct ModeResult {
    pub journey: Option<Journey>,
    pub date_shifted_by_days: u32,
    pub note: Option<ModeNote>,
}

impl ModeResult {
    fn empty(note: ModeNote) -> Self {
        Self {
            journey: None,
            date_shifted_by_days: 0,
            note: Some(note),
        }
    }
}

/// Request-boundary failures: neither endpoint text resolved anywhere.
#[derive(Debug, Clone, thiserror::Error)]
pub enum DispatchError {
    #[error("origin not found: {0}")]
    UnknownOrigin(#[source] LookupError),

    #[error("destination not found: {0}")]
    UnknownDestination(#[source] LookupError),
}

impl DispatchError {
    /// Fuzzy suggestions carried by the underlying lookup failure.
    pub fn suggestions(&self) -> &[String] {
        match self {
            Self::UnknownOrigin(LookupError::UnknownStop { suggestions, .. })
            | Self::UnknownDestination(LookupError::UnknownStop { suggestions, .. }) => suggestions,
        }
    }
}

/// The per-request fan-out over mode-scoped planners.
pub struct Dispatcher {
    catalogue: Arc<Catalogue>,
    oracle: Arc<ServiceCalendar>,
    index: Arc<StopIndex>,
    networks: HashMap<ModeTag, Arc<TransitNetwork>>,
    config: PlannerConfig,
}

impl Dispatcher {
    /// Build all per-mode networks, the calendar oracle and the stop index
    /// from a loaded catalogue. Everything here is immutable afterwards.
    pub fn new(catalogue: Arc<Catalogue>, config: PlannerConfig) -> Self {
        Self::with_fuzzy_min_score(catalogue, config, DEFAULT_MIN_SCORE)
    }

    /// As [`Dispatcher::new`] with a custom fuzzy-lookup score floor.
    pub fn with_fuzzy_min_score(
        catalogue: Arc<Catalogue>,
        config: PlannerConfig,
        fuzzy_min_score: u8,
    ) -> Self {
        let oracle = Arc::new(ServiceCalendar::build(&catalogue));
        let index = Arc::new(StopIndex::with_min_score(&catalogue, fuzzy_min_score));
        let networks = build_all(&catalogue)
            .into_iter()
            .map(|(mode, network)| (mode, Arc::new(network)))
            .collect();

        Self {
            catalogue,
            oracle,
            index,
            networks,
            config,
        }
    }

    /// The shared stop index.
    pub fn index(&self) -> &StopIndex {
        &self.index
    }

    /// The shared catalogue.
    pub fn catalogue(&self) -> &Catalogue {
        &self.catalogue
    }

    /// Loaded modes in deterministic order.
    pub fn modes(&self) -> Vec<ModeTag> {
        let mut modes: Vec<ModeTag> = self.networks.keys().cloned().collect();
        modes.sort();
        modes
    }

    /// Plan the query against every requested mode.
    ///
    /// Fails only when an endpoint resolves in no mode at all; otherwise
    /// each mode reports its own slot.
    #[instrument(skip(self, query), fields(
        origin = %query.origin_query,
        destination = %query.destination_query,
        date = %query.date,
    ))]
    pub async fn plan(
        &self,
        query: &JourneyQuery,
    ) -> Result<BTreeMap<ModeTag, ModeResult>, DispatchError> {
        // The endpoints must mean something somewhere, or the request is
        // malformed and deserves suggestions rather than empty slots.
        self.index
            .resolve(&query.origin_query)
            .map_err(DispatchError::UnknownOrigin)?;
        self.index
            .resolve(&query.destination_query)
            .map_err(DispatchError::UnknownDestination)?;

        let modes = match &query.modes {
            Some(requested) => {
                let mut known = Vec::new();
                for mode in requested {
                    if self.networks.contains_key(mode) {
                        known.push(mode.clone());
                    } else {
                        warn!(mode = %mode, "Requested mode is not loaded; skipping");
                    }
                }
                known
            }
            None => self.modes(),
        };

        let budget = Duration::from_secs(self.config.request_timeout_secs);
        let tasks = modes.into_iter().map(|mode| {
            let slot = self.plan_mode(mode.clone(), query, budget);
            async move { (mode, slot.await) }
        });

        let results: BTreeMap<ModeTag, ModeResult> = join_all(tasks).await.into_iter().collect();

        info!(
            slots = results.len(),
            found = results.values().filter(|r| r.journey.is_some()).count(),
            "Dispatch complete"
        );
        Ok(results)
    }

    /// Run one mode's planner on a blocking worker under the budget.
    async fn plan_mode(&self, mode: ModeTag, query: &JourneyQuery, budget: Duration) -> ModeResult {
        // A slot only makes sense when both endpoints resolve in this mode
        let Some(origin) = self.index.resolve_in_mode(&query.origin_query, &mode) else {
            debug!(mode = %mode, "Origin not served");
            return ModeResult::empty(ModeNote::StopNotServed);
        };
        let Some(destination) = self.index.resolve_in_mode(&query.destination_query, &mode) else {
            debug!(mode = %mode, "Destination not served");
            return ModeResult::empty(ModeNote::StopNotServed);
        };

        // `modes` only lists networks we hold
        let Some(network) = self.networks.get(&mode) else {
            return ModeResult::empty(ModeNote::StopNotServed);
        };

        let planner = Planner::new(
            Arc::clone(network),
            Arc::clone(&self.catalogue),
            Arc::clone(&self.oracle),
            self.config.clone(),
        );
        let request = PlanRequest {
            origin,
            destination,
            departure: query.departure,
            date: query.date,
        };

        let cancel = CancelToken::new();
        let scan_cancel = cancel.clone();
        let handle = tokio::task::spawn_blocking(move || planner.plan(&request, &scan_cancel));

        match tokio::time::timeout(budget, handle).await {
            Err(_) => {
                // Budget expired: tell the scan to stop and report the slot
                cancel.cancel();
                warn!(mode = %mode, "Planner timed out");
                ModeResult::empty(ModeNote::Timeout)
            }
            Ok(Err(join_err)) => {
                error!(mode = %mode, error = %join_err, "Planner task failed");
                ModeResult::empty(ModeNote::Failed)
            }
            Ok(Ok(outcome)) => match outcome {
                Ok(PlanOutcome::Found {
                    journey,
                    date_shifted_by_days,
                }) => ModeResult {
                    journey: Some(journey),
                    date_shifted_by_days,
                    note: None,
                },
                Ok(PlanOutcome::NoRoute) => ModeResult::empty(ModeNote::NoRoute),
                Ok(PlanOutcome::NoServiceWithinLookahead) => {
                    ModeResult::empty(ModeNote::NoServiceWithinLookahead)
                }
                Ok(PlanOutcome::Cancelled) => ModeResult::empty(ModeNote::Cancelled),
                Err(PlanError::StopNotInNetwork { .. }) => {
                    ModeResult::empty(ModeNote::StopNotServed)
                }
                Err(err @ PlanError::Reconstruction(_)) => {
                    error!(mode = %mode, error = %err, "Planner failed");
                    ModeResult::empty(ModeNote::Failed)
                }
            },
        }
    }
}
