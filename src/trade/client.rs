//! HTTP client for the trade API using wreq for TLS fingerprint emulation.

use crate::config::Config;
use crate::trade::error::{classify, TradeError};
use crate::trade::models::ListingRecord;
use crate::trade::query::SearchQuery;
use anyhow::{Context, Result};
use async_trait::async_trait;
use rand::RngExt;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, warn};
use wreq::Client;
use wreq_util::Emulation;

/// One page of raw search results: the retrievable ID list, the opaque query
/// id used for listing retrieval, and the total match count (which may exceed
/// the list).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchPage {
    pub result_ids: Vec<String>,
    pub query_id: String,
    pub total: u32,
}

/// Trait over the two trade endpoints - enables mocking for tests.
#[async_trait]
pub trait TradeApi: Send + Sync {
    /// POSTs a search query scoped to a league.
    async fn search(&self, league: &str, query: &SearchQuery) -> Result<SearchPage, TradeError>;

    /// GETs full listing records for a batch of result IDs, optionally
    /// attributed to the originating query.
    async fn fetch(
        &self,
        ids: &[String],
        query_id: Option<&str>,
    ) -> Result<Vec<ListingRecord>, TradeError>;
}

/// Trade API HTTP client with browser impersonation.
pub struct TradeClient {
    client: Client,
    api_url: String,
    delay_ms: u64,
    delay_jitter_ms: u64,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SearchEnvelope {
    #[serde(default)]
    result: Option<Vec<String>>,
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    total: Option<u32>,
    #[serde(default)]
    error: Option<ErrorBody>,
}

#[derive(Debug, Deserialize)]
struct FetchEnvelope {
    #[serde(default)]
    result: Option<Vec<serde_json::Value>>,
    #[serde(default)]
    error: Option<ErrorBody>,
}

impl TradeClient {
    /// Creates a new trade client from the configuration.
    pub fn new(config: &Config) -> Result<Self> {
        let mut builder = Client::builder()
            .cookie_store(true)
            .gzip(true)
            .brotli(true)
            .timeout(Duration::from_secs(15))
            .connect_timeout(Duration::from_secs(10));

        if let Some(proxy_url) = &config.proxy {
            debug!("Configuring proxy: {}", proxy_url);
            let proxy = wreq::Proxy::all(proxy_url).context("Failed to configure proxy")?;
            builder = builder.proxy(proxy);
        }

        let client = builder.build()?;

        Ok(Self {
            client,
            api_url: config.api_url.trim_end_matches('/').to_string(),
            delay_ms: config.delay_ms,
            delay_jitter_ms: config.delay_jitter_ms,
        })
    }

    /// Adds a small randomized delay between outbound calls.
    async fn delay(&self) {
        if self.delay_ms == 0 {
            return;
        }

        let jitter = if self.delay_jitter_ms > 0 {
            rand::rng().random_range(0..=self.delay_jitter_ms)
        } else {
            0
        };

        let total_delay = self.delay_ms + jitter;
        debug!("Delaying {}ms", total_delay);
        tokio::time::sleep(Duration::from_millis(total_delay)).await;
    }

    /// Reads the status and body, surfacing transport problems as
    /// availability failures.
    async fn read_response(response: wreq::Response) -> Result<(u16, String), TradeError> {
        let status = response.status().as_u16();
        debug!("Response status: {}", status);
        let text = response.text().await.map_err(transport_error)?;
        Ok((status, text))
    }
}

fn transport_error(err: wreq::Error) -> TradeError {
    TradeError::Unavailable(err.to_string())
}

#[async_trait]
impl TradeApi for TradeClient {
    async fn search(&self, league: &str, query: &SearchQuery) -> Result<SearchPage, TradeError> {
        self.delay().await;

        let url = format!("{}/search/{}", self.api_url, urlencoding::encode(league));
        let body = serde_json::to_string(query)
            .map_err(|e| TradeError::Validation(format!("unserializable query: {}", e)))?;

        debug!("POST {}", url);
        let response = self
            .client
            .post(&url)
            .emulation(Emulation::Chrome131)
            .header("Accept", "application/json")
            .header("Content-Type", "application/json")
            .body(body)
            .send()
            .await
            .map_err(transport_error)?;

        let (status, text) = Self::read_response(response).await?;

        let envelope: SearchEnvelope = match serde_json::from_str(&text) {
            Ok(envelope) => envelope,
            // A non-JSON error page still classifies by status and raw text.
            Err(_) if !(200..300).contains(&status) => {
                return Err(classify(status, Some(text.trim())));
            }
            Err(e) => {
                return Err(TradeError::UnexpectedShape(format!("search response: {}", e)));
            }
        };

        if let Some(error) = envelope.error {
            return Err(classify(status, error.message.as_deref()));
        }
        if !(200..300).contains(&status) {
            return Err(classify(status, None));
        }

        match (envelope.result, envelope.id) {
            (Some(result_ids), Some(query_id)) => {
                let total = envelope.total.unwrap_or(result_ids.len() as u32);
                Ok(SearchPage { result_ids, query_id, total })
            }
            _ => Err(TradeError::UnexpectedShape(
                "search response missing result ids or query id".to_string(),
            )),
        }
    }

    async fn fetch(
        &self,
        ids: &[String],
        query_id: Option<&str>,
    ) -> Result<Vec<ListingRecord>, TradeError> {
        self.delay().await;

        let mut url = format!("{}/fetch/{}", self.api_url, ids.join(","));
        if let Some(query_id) = query_id {
            url.push_str("?query=");
            url.push_str(&urlencoding::encode(query_id));
        }

        debug!("GET {}", url);
        let response = self
            .client
            .get(&url)
            .emulation(Emulation::Chrome131)
            .header("Accept", "application/json")
            .send()
            .await
            .map_err(transport_error)?;

        let (status, text) = Self::read_response(response).await?;

        let envelope: FetchEnvelope = match serde_json::from_str(&text) {
            Ok(envelope) => envelope,
            Err(_) if !(200..300).contains(&status) => {
                return Err(classify(status, Some(text.trim())));
            }
            Err(e) => {
                return Err(TradeError::UnexpectedShape(format!("fetch response: {}", e)));
            }
        };

        if let Some(error) = envelope.error {
            return Err(classify(status, error.message.as_deref()));
        }
        if !(200..300).contains(&status) {
            return Err(classify(status, None));
        }

        let Some(raw) = envelope.result else {
            return Err(TradeError::UnexpectedShape("fetch response missing result".to_string()));
        };

        let mut records = Vec::with_capacity(raw.len());
        for value in raw {
            match serde_json::from_value::<ListingRecord>(value) {
                Ok(record) => records.push(record),
                // Incomplete upstream records are expected; they are not data.
                Err(e) => warn!("Skipping malformed listing record: {}", e),
            }
        }
        Ok(records)
    }
}
