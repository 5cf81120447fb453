//! Price aggregation and the end-to-end pricing pipeline.

pub mod aggregate;
pub mod pipeline;

pub use aggregate::{AggregationMode, Aggregator, PriceObservation, PriceSummary};
pub use pipeline::{PriceReport, PricingPipeline};
