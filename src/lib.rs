//! poe-pricer - Path of Exile item price checker.
//!
//! Translates semi-structured item descriptions into trade-search queries,
//! keeps searches alive through rate limiting and query-validity rejections
//! by selectively relaxing filters, and reduces the sampled listing prices
//! to a robust min/median/max summary.

pub mod commands;
pub mod config;
pub mod format;
pub mod pricing;
pub mod trade;

pub use config::Config;
pub use pricing::{AggregationMode, PriceObservation, PriceReport, PriceSummary, PricingPipeline};
pub use trade::{ItemDescription, ItemMod, Rarity, TradeClient, TradeError};
