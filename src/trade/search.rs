//! Search execution with bounded retry and one-shot query relaxation.
//!
//! The upstream enforces validity constraints that only show up at request
//! time, so a rejected query is progressively loosened rather than failed
//! outright: rarity on unknown-item errors, then stat filters, then the
//! item-level/link bounds on invalid-query errors. Each relaxation is applied
//! at most once per call, which keeps the attempt count bounded.

use crate::config::Config;
use crate::trade::client::{SearchPage, TradeApi};
use crate::trade::error::TradeError;
use crate::trade::query::SearchQuery;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, info, warn};

/// One-shot constraint removals, in the order they may be applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelaxationStep {
    /// Remove the rarity filter (unknown-item recovery).
    DropRarity,
    /// Remove the stat filter group.
    DropStats,
    /// Remove the item-level and socket-link filters.
    DropBounds,
}

/// Immutable working state: the query to send next plus the relaxations
/// already spent. Transitions produce a new state.
#[derive(Debug, Clone)]
struct QueryState {
    query: SearchQuery,
    applied: Vec<RelaxationStep>,
}

impl QueryState {
    fn new(query: SearchQuery) -> Self {
        Self { query, applied: Vec::new() }
    }

    /// Applies a relaxation once. `None` when the step was already spent or
    /// the query has nothing left to remove for it.
    fn relax(&self, step: RelaxationStep) -> Option<Self> {
        if self.applied.contains(&step) {
            return None;
        }
        let query = match step {
            RelaxationStep::DropRarity if self.query.has_rarity() => self.query.without_rarity(),
            RelaxationStep::DropStats if self.query.has_stats() => self.query.without_stats(),
            RelaxationStep::DropBounds if self.query.has_bounds() => self.query.without_bounds(),
            _ => return None,
        };
        let mut applied = self.applied.clone();
        applied.push(step);
        Some(Self { query, applied })
    }
}

/// Executes a search with retry, backoff, and bounded relaxation.
pub struct SearchClient {
    max_attempts: u32,
    backoff_ms: u64,
    result_cap: usize,
}

impl SearchClient {
    /// Creates a search client from the configuration.
    pub fn new(config: &Config) -> Self {
        Self {
            max_attempts: config.max_search_attempts,
            backoff_ms: config.backoff_ms,
            result_cap: config.max_results,
        }
    }

    /// Runs the query against a league until it succeeds, every recovery is
    /// exhausted, or the attempt budget runs out.
    pub async fn search(
        &self,
        api: &impl TradeApi,
        league: &str,
        query: &SearchQuery,
    ) -> Result<SearchPage, TradeError> {
        let mut state = QueryState::new(query.clone());
        let mut transient_hits: u32 = 0;
        let mut last_transient: Option<TradeError> = None;

        for attempt in 1..=self.max_attempts {
            debug!("Search attempt {} of {}", attempt, self.max_attempts);

            let err = match api.search(league, &state.query).await {
                Ok(mut page) => {
                    page.result_ids.truncate(self.result_cap);
                    info!(
                        "Search matched {} listings ({} retrievable)",
                        page.total,
                        page.result_ids.len()
                    );
                    return Ok(page);
                }
                Err(err) => err,
            };

            match err {
                TradeError::RateLimited | TradeError::Unavailable(_) => {
                    transient_hits += 1;
                    // The wait never shrinks across consecutive hits.
                    let wait = self.backoff_ms.saturating_mul(u64::from(transient_hits));
                    warn!("Search hit {}; waiting {}ms before retrying", err, wait);
                    last_transient = Some(err);
                    sleep(Duration::from_millis(wait)).await;
                }
                TradeError::UnknownItem(_) => match state.relax(RelaxationStep::DropRarity) {
                    Some(next) => {
                        warn!("Unknown item; retrying without the rarity filter");
                        state = next;
                    }
                    None => return Err(err),
                },
                TradeError::QueryRejected(_) => {
                    if let Some(next) = state.relax(RelaxationStep::DropStats) {
                        warn!("Query rejected; retrying without stat filters");
                        state = next;
                    } else if let Some(next) = state.relax(RelaxationStep::DropBounds) {
                        warn!("Query rejected; retrying without item-level and link filters");
                        state = next;
                    } else {
                        return Err(err);
                    }
                }
                other => return Err(other),
            }
        }

        Err(last_transient.unwrap_or_else(|| {
            TradeError::Unavailable(format!("search gave up after {} attempts", self.max_attempts))
        }))
    }
}
