//! Price aggregation: reducing noisy, multi-currency, outlier-laden listing
//! samples to a stable min/median/max summary.

use crate::trade::models::ListingRecord;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Aggregation policy for a price sample.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AggregationMode {
    /// Dominant-currency, outlier-trimmed summary.
    #[default]
    Median,
    /// Untrimmed strict ordering across the whole retained sample.
    Lowest,
}

impl FromStr for AggregationMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "median" => Ok(AggregationMode::Median),
            "lowest" => Ok(AggregationMode::Lowest),
            _ => Err(format!("Unknown mode: {}. Use: median, lowest", s)),
        }
    }
}

impl fmt::Display for AggregationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AggregationMode::Median => write!(f, "median"),
            AggregationMode::Lowest => write!(f, "lowest"),
        }
    }
}

/// A single priced listing observation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceObservation {
    pub amount: f64,
    pub currency: String,
}

impl PriceObservation {
    /// Creates an observation.
    pub fn new(amount: f64, currency: impl Into<String>) -> Self {
        Self { amount, currency: currency.into() }
    }
}

/// Robust summary of a price sample.
///
/// `min`, `median` and `max` are either all present (non-empty retained
/// sample) or all absent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceSummary {
    pub min: Option<PriceObservation>,
    pub median: Option<PriceObservation>,
    pub max: Option<PriceObservation>,
    /// Every retained observation, all currencies, untrimmed.
    pub sample: Vec<PriceObservation>,
    /// Upstream match count, which may exceed the sample.
    pub total_results: u32,
}

impl PriceSummary {
    /// The empty, valid "no priced listings" form.
    pub fn empty(total_results: u32) -> Self {
        Self { min: None, median: None, max: None, sample: Vec::new(), total_results }
    }

    /// True when no statistics could be computed.
    pub fn is_empty(&self) -> bool {
        self.min.is_none()
    }
}

/// Reduces listings to a price summary under a configured currency
/// allow-list.
pub struct Aggregator {
    currencies: Vec<String>,
}

impl Aggregator {
    /// Creates an aggregator. The first allow-list entry is the primary
    /// currency used to break dominance ties.
    pub fn new(currencies: Vec<String>) -> Self {
        Self { currencies }
    }

    fn supported(&self, currency: &str) -> bool {
        self.currencies.iter().any(|c| c == currency)
    }

    fn primary(&self) -> Option<&str> {
        self.currencies.first().map(String::as_str)
    }

    /// Extracts the retainable price observations from raw listings.
    ///
    /// Listings without a usable price, or priced outside the allow-list,
    /// are silently discarded; incomplete upstream data is expected.
    pub fn observations(&self, listings: &[ListingRecord]) -> Vec<PriceObservation> {
        listings
            .iter()
            .filter_map(|listing| listing.price())
            .filter(|(_, currency)| self.supported(currency))
            .map(|(amount, currency)| PriceObservation::new(amount, currency))
            .collect()
    }

    /// Reduces a sample to its summary under the given mode. `total_results`
    /// is the upstream match count, carried through untouched.
    pub fn aggregate(
        &self,
        observations: Vec<PriceObservation>,
        total_results: u32,
        mode: AggregationMode,
    ) -> PriceSummary {
        if observations.is_empty() {
            return PriceSummary::empty(total_results);
        }
        match mode {
            AggregationMode::Median => self.aggregate_median(observations, total_results),
            AggregationMode::Lowest => aggregate_lowest(observations, total_results),
        }
    }

    fn aggregate_median(
        &self,
        observations: Vec<PriceObservation>,
        total_results: u32,
    ) -> PriceSummary {
        let Some(currency) = self.dominant_currency(&observations) else {
            return PriceSummary::empty(total_results);
        };

        let mut amounts: Vec<f64> = observations
            .iter()
            .filter(|obs| obs.currency == currency)
            .map(|obs| obs.amount)
            .collect();
        amounts.sort_by(f64::total_cmp);
        let trimmed = trim_outliers(&amounts);

        PriceSummary {
            min: Some(PriceObservation::new(trimmed[0], currency.clone())),
            median: Some(PriceObservation::new(median(trimmed), currency.clone())),
            max: Some(PriceObservation::new(trimmed[trimmed.len() - 1], currency.clone())),
            sample: observations,
            total_results,
        }
    }

    /// The currency with the strictly largest observation count; ties prefer
    /// the primary currency, then first-encountered order.
    fn dominant_currency(&self, observations: &[PriceObservation]) -> Option<String> {
        let mut buckets: Vec<(&str, usize)> = Vec::new();
        for obs in observations {
            match buckets.iter_mut().find(|(currency, _)| *currency == obs.currency) {
                Some((_, count)) => *count += 1,
                None => buckets.push((&obs.currency, 1)),
            }
        }

        let best = buckets.iter().map(|&(_, count)| count).max()?;
        if let Some(primary) = self.primary() {
            if buckets.iter().any(|&(currency, count)| count == best && currency == primary) {
                return Some(primary.to_string());
            }
        }
        buckets
            .iter()
            .find(|&&(_, count)| count == best)
            .map(|&(currency, _)| currency.to_string())
    }
}

/// Untrimmed strict ordering across every retained observation; each summary
/// point keeps its own currency.
fn aggregate_lowest(observations: Vec<PriceObservation>, total_results: u32) -> PriceSummary {
    let mut ordered = observations.clone();
    ordered.sort_by(|a, b| a.amount.total_cmp(&b.amount));

    PriceSummary {
        min: ordered.first().cloned(),
        median: ordered.get((ordered.len() - 1) / 2).cloned(),
        max: ordered.last().cloned(),
        sample: observations,
        total_results,
    }
}

/// Drops the cheapest and dearest 10% of a sorted slice once the sample is
/// large enough (n > 10) for the trim to leave data behind.
fn trim_outliers(sorted: &[f64]) -> &[f64] {
    let n = sorted.len();
    if n <= 10 {
        return sorted;
    }
    let start = n / 10; // floor(n * 0.1)
    let end = (n * 9).div_ceil(10); // ceil(n * 0.9)
    &sorted[start..end]
}

/// Middle element for odd lengths; for even lengths, the mean of the two
/// middle elements rounded to the nearest whole amount.
fn median(sorted: &[f64]) -> f64 {
    let n = sorted.len();
    if n % 2 == 1 {
        sorted[n / 2]
    } else {
        ((sorted[n / 2 - 1] + sorted[n / 2]) / 2.0).round()
    }
}
