//! CLI command implementations.

pub mod price;
pub mod query;

pub use price::PriceCommand;
pub use query::QueryCommand;
