//! Price-check command implementation.

use crate::config::Config;
use crate::format::Formatter;
use crate::pricing::PricingPipeline;
use crate::trade::{ItemDescription, TradeApi, TradeClient};
use anyhow::{Context, Result};
use std::path::Path;
use tracing::info;

/// Executes a price check for one item description.
pub struct PriceCommand {
    config: Config,
}

impl PriceCommand {
    /// Creates a new price command.
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    /// Prices an item read from a JSON file, or stdin when the path is `-`.
    pub async fn execute(&self, item_path: &str) -> Result<String> {
        let item = read_item(item_path)?;
        let client = TradeClient::new(&self.config).context("Failed to create HTTP client")?;
        self.execute_with_client(&client, &item).await
    }

    /// Prices an item with a provided client (for testing).
    pub async fn execute_with_client(
        &self,
        client: &impl TradeApi,
        item: &ItemDescription,
    ) -> Result<String> {
        info!("Pricing item in league {} ({} mode)", self.config.league, self.config.mode);

        let pipeline = PricingPipeline::new(self.config.clone());
        let report = pipeline
            .price_item(client, &self.config.league, item, self.config.mode)
            .await
            .context("Pricing failed")?;

        let formatter = Formatter::new(self.config.format);
        Ok(formatter.format_report(&report))
    }
}

/// Reads an item description from a file path or stdin (`-`).
pub fn read_item(path: &str) -> Result<ItemDescription> {
    let raw = if path == "-" {
        use std::io::Read;
        let mut buffer = String::new();
        std::io::stdin()
            .read_to_string(&mut buffer)
            .context("Failed to read item from stdin")?;
        buffer
    } else {
        std::fs::read_to_string(Path::new(path))
            .with_context(|| format!("Failed to read item file: {}", path))?
    };

    serde_json::from_str(&raw).context("Failed to parse item description")
}
