//! End-to-end pricing orchestration: build, search, fetch, aggregate.

use crate::config::Config;
use crate::pricing::aggregate::{AggregationMode, Aggregator, PriceSummary};
use crate::trade::client::TradeApi;
use crate::trade::error::TradeError;
use crate::trade::fetch::ListingFetcher;
use crate::trade::models::ItemDescription;
use crate::trade::query::build_query;
use crate::trade::search::SearchClient;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Final response envelope for one pricing request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceReport {
    pub price_info: PriceSummary,
    /// Human-navigable link to the executed search; valid whenever the search
    /// itself succeeded, even with zero listings.
    pub search_url: String,
}

/// Runs the full pricing chain for one item.
///
/// A failed pipeline and an empty-but-successful summary are distinct
/// outcomes: the former is an `Err`, the latter an `Ok` report whose
/// statistics are all absent.
pub struct PricingPipeline {
    config: Config,
}

impl PricingPipeline {
    /// Creates a pipeline from the configuration.
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    /// Prices one item in a league.
    pub async fn price_item(
        &self,
        api: &impl TradeApi,
        league: &str,
        item: &ItemDescription,
        mode: AggregationMode,
    ) -> Result<PriceReport, TradeError> {
        if league.trim().is_empty() {
            return Err(TradeError::Validation("league must not be blank".to_string()));
        }

        let query = build_query(item);
        debug!("Built search query for league {}", league);

        let search = SearchClient::new(&self.config);
        let page = search.search(api, league, &query).await?;
        let search_url = self.search_url(league, &page.query_id);

        if page.result_ids.is_empty() {
            info!("Search matched nothing retrievable; skipping listing fetch");
            return Ok(PriceReport { price_info: PriceSummary::empty(page.total), search_url });
        }

        let fetcher = ListingFetcher::new(&self.config);
        let listings = fetcher.fetch(api, &page.query_id, &page.result_ids).await?;

        let aggregator = Aggregator::new(self.config.currencies.clone());
        let observations = aggregator.observations(&listings);
        let price_info = aggregator.aggregate(observations, page.total, mode);

        info!(
            "Priced {} of {} listings ({} mode)",
            price_info.sample.len(),
            price_info.total_results,
            mode
        );
        Ok(PriceReport { price_info, search_url })
    }

    fn search_url(&self, league: &str, query_id: &str) -> String {
        format!(
            "{}/{}/{}",
            self.config.site_url.trim_end_matches('/'),
            urlencoding::encode(league),
            query_id
        )
    }
}
