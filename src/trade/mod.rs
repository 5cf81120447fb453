//! Trade-API boundary: models, query construction, HTTP client, and the
//! retry/relaxation machinery.

pub mod client;
pub mod error;
pub mod fetch;
pub mod models;
pub mod query;
pub mod search;

pub use client::{SearchPage, TradeApi, TradeClient};
pub use error::TradeError;
pub use fetch::ListingFetcher;
pub use models::{Influence, ItemDescription, ItemMod, ListingRecord, Rarity};
pub use query::{build_query, SearchQuery};
pub use search::SearchClient;
