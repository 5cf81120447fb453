//! Listing retrieval with a degrade-to-empty recovery policy.
//!
//! Failures here are recoverable by degrading rather than by reshaping a
//! query: a rejected fetch means "no price sample", which is a perfectly
//! displayable outcome. Only sustained unavailability is an error.

use crate::config::Config;
use crate::trade::client::TradeApi;
use crate::trade::error::TradeError;
use crate::trade::models::ListingRecord;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, warn};

/// Upstream per-request cap on fetched result IDs.
const FETCH_CHUNK_SIZE: usize = 10;

/// Retrieves full listing records for search result IDs.
pub struct ListingFetcher {
    max_attempts: u32,
    backoff_ms: u64,
}

impl ListingFetcher {
    /// Creates a listing fetcher from the configuration.
    pub fn new(config: &Config) -> Self {
        Self { max_attempts: config.max_fetch_attempts, backoff_ms: config.backoff_ms }
    }

    /// Retrieves listing records for the given result IDs, in order.
    ///
    /// An empty ID list resolves immediately without touching the network.
    pub async fn fetch(
        &self,
        api: &impl TradeApi,
        query_id: &str,
        ids: &[String],
    ) -> Result<Vec<ListingRecord>, TradeError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let mut records = Vec::with_capacity(ids.len());
        for chunk in ids.chunks(FETCH_CHUNK_SIZE) {
            debug!("Fetching {} listings", chunk.len());
            match self.fetch_chunk(api, query_id, chunk).await? {
                Some(batch) => records.extend(batch),
                // The upstream rejected the request outright; later chunks
                // would be rejected the same way.
                None => return Ok(Vec::new()),
            }
        }
        Ok(records)
    }

    /// Fetches one chunk. `Ok(None)` means "degrade to no listings".
    async fn fetch_chunk(
        &self,
        api: &impl TradeApi,
        query_id: &str,
        chunk: &[String],
    ) -> Result<Option<Vec<ListingRecord>>, TradeError> {
        let mut with_query_id = true;
        let mut transient_hits: u32 = 0;

        loop {
            let attached = with_query_id.then_some(query_id);
            let err = match api.fetch(chunk, attached).await {
                Ok(batch) => return Ok(Some(batch)),
                Err(err) => err,
            };

            match err {
                err @ (TradeError::RateLimited | TradeError::Unavailable(_)) => {
                    transient_hits += 1;
                    if transient_hits >= self.max_attempts {
                        return Err(err);
                    }
                    let wait = self.backoff_ms.saturating_mul(u64::from(transient_hits));
                    warn!("Listing fetch hit {}; waiting {}ms before retrying", err, wait);
                    sleep(Duration::from_millis(wait)).await;
                }
                TradeError::QueryRejected(_) if with_query_id => {
                    // Some result sets reject the attribution parameter; the
                    // fetch endpoint works without it.
                    warn!("Fetch rejected the query parameter; retrying without it");
                    with_query_id = false;
                }
                err if err.is_rejection() => {
                    warn!("Listing fetch rejected ({}); treating as no listings", err);
                    return Ok(None);
                }
                err => return Err(err),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::trade::client::SearchPage;
    use crate::trade::query::SearchQuery;
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Mutex;

    type FetchResult = Result<Vec<ListingRecord>, TradeError>;

    /// Mock trade API replaying scripted fetch responses and recording the
    /// `(ids, query_id)` pairs it saw.
    struct MockTradeApi {
        responses: Mutex<VecDeque<FetchResult>>,
        calls: Mutex<Vec<(Vec<String>, Option<String>)>>,
        call_count: AtomicU32,
    }

    impl MockTradeApi {
        fn new(responses: Vec<FetchResult>) -> Self {
            Self {
                responses: Mutex::new(responses.into()),
                calls: Mutex::new(Vec::new()),
                call_count: AtomicU32::new(0),
            }
        }

        fn calls(&self) -> Vec<(Vec<String>, Option<String>)> {
            self.calls.lock().unwrap().clone()
        }

        fn call_count(&self) -> u32 {
            self.call_count.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl TradeApi for MockTradeApi {
        async fn search(
            &self,
            _league: &str,
            _query: &SearchQuery,
        ) -> Result<SearchPage, TradeError> {
            unimplemented!("search is not exercised by these tests")
        }

        async fn fetch(&self, ids: &[String], query_id: Option<&str>) -> FetchResult {
            self.call_count.fetch_add(1, Ordering::SeqCst);
            self.calls.lock().unwrap().push((ids.to_vec(), query_id.map(String::from)));
            self.responses
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or(Err(TradeError::Unavailable("exhausted script".to_string())))
        }
    }

    fn make_test_config() -> Config {
        Config { backoff_ms: 0, max_fetch_attempts: 4, ..Config::default() }
    }

    fn ids(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("id{}", i)).collect()
    }

    fn listings(n: usize) -> Vec<ListingRecord> {
        (0..n).map(|i| ListingRecord::priced(i as f64, "chaos")).collect()
    }

    #[tokio::test]
    async fn test_empty_ids_makes_no_calls() {
        let api = MockTradeApi::new(vec![]);
        let fetcher = ListingFetcher::new(&make_test_config());

        let records = fetcher.fetch(&api, "q1", &[]).await.unwrap();
        assert!(records.is_empty());
        assert_eq!(api.call_count(), 0);
    }

    #[tokio::test]
    async fn test_single_chunk_success() {
        let api = MockTradeApi::new(vec![Ok(listings(3))]);
        let fetcher = ListingFetcher::new(&make_test_config());

        let records = fetcher.fetch(&api, "q1", &ids(3)).await.unwrap();
        assert_eq!(records.len(), 3);

        let calls = api.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].0.len(), 3);
        assert_eq!(calls[0].1.as_deref(), Some("q1"));
    }

    #[tokio::test]
    async fn test_ids_are_chunked_sequentially() {
        let api = MockTradeApi::new(vec![Ok(listings(10)), Ok(listings(10)), Ok(listings(5))]);
        let fetcher = ListingFetcher::new(&make_test_config());

        let records = fetcher.fetch(&api, "q1", &ids(25)).await.unwrap();
        assert_eq!(records.len(), 25);

        let calls = api.calls();
        assert_eq!(calls.len(), 3);
        assert_eq!(calls[0].0.len(), 10);
        assert_eq!(calls[1].0.len(), 10);
        assert_eq!(calls[2].0.len(), 5);
        // Accumulation preserves request order.
        assert_eq!(calls[0].0[0], "id0");
        assert_eq!(calls[2].0[0], "id20");
    }

    #[tokio::test]
    async fn test_query_param_rejection_falls_back_once() {
        let api = MockTradeApi::new(vec![
            Err(TradeError::QueryRejected("Unrecognized query parameter".to_string())),
            Ok(listings(2)),
        ]);
        let fetcher = ListingFetcher::new(&make_test_config());

        let records = fetcher.fetch(&api, "q1", &ids(2)).await.unwrap();
        assert_eq!(records.len(), 2);

        let calls = api.calls();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0].1.as_deref(), Some("q1"));
        assert_eq!(calls[1].1, None);
    }

    #[tokio::test]
    async fn test_double_rejection_degrades_to_empty() {
        let api = MockTradeApi::new(vec![
            Err(TradeError::QueryRejected("Unrecognized query parameter".to_string())),
            Err(TradeError::QueryRejected("Invalid query".to_string())),
        ]);
        let fetcher = ListingFetcher::new(&make_test_config());

        let records = fetcher.fetch(&api, "q1", &ids(2)).await.unwrap();
        assert!(records.is_empty());
        assert_eq!(api.call_count(), 2);
    }

    #[tokio::test]
    async fn test_other_client_error_degrades_to_empty() {
        let api = MockTradeApi::new(vec![Err(TradeError::Upstream {
            status: 404,
            message: "gone".to_string(),
        })]);
        let fetcher = ListingFetcher::new(&make_test_config());

        let records = fetcher.fetch(&api, "q1", &ids(2)).await.unwrap();
        assert!(records.is_empty());
        assert_eq!(api.call_count(), 1);
    }

    #[tokio::test]
    async fn test_degradation_abandons_remaining_chunks() {
        let api = MockTradeApi::new(vec![
            Ok(listings(10)),
            Err(TradeError::Upstream { status: 404, message: "gone".to_string() }),
        ]);
        let fetcher = ListingFetcher::new(&make_test_config());

        let records = fetcher.fetch(&api, "q1", &ids(25)).await.unwrap();
        assert!(records.is_empty());
        assert_eq!(api.call_count(), 2);
    }

    #[tokio::test]
    async fn test_rate_limit_retries_then_succeeds() {
        let api = MockTradeApi::new(vec![
            Err(TradeError::RateLimited),
            Err(TradeError::Unavailable("status 502".to_string())),
            Ok(listings(1)),
        ]);
        let fetcher = ListingFetcher::new(&make_test_config());

        let records = fetcher.fetch(&api, "q1", &ids(1)).await.unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(api.call_count(), 3);
    }

    #[tokio::test]
    async fn test_sustained_unavailability_is_terminal() {
        let responses = (0..4).map(|_| Err(TradeError::Unavailable("down".to_string()))).collect();
        let api = MockTradeApi::new(responses);
        let fetcher = ListingFetcher::new(&make_test_config());

        let err = fetcher.fetch(&api, "q1", &ids(1)).await.unwrap_err();
        assert!(matches!(err, TradeError::Unavailable(_)));
        assert_eq!(api.call_count(), 4);
    }

    #[tokio::test]
    async fn test_unexpected_shape_propagates() {
        let api = MockTradeApi::new(vec![Err(TradeError::UnexpectedShape(
            "fetch response missing result".to_string(),
        ))]);
        let fetcher = ListingFetcher::new(&make_test_config());

        let err = fetcher.fetch(&api, "q1", &ids(1)).await.unwrap_err();
        assert!(matches!(err, TradeError::UnexpectedShape(_)));
    }
}
