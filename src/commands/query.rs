//! Query-preview command: prints the search document an item produces
//! without touching the network.

use crate::commands::price::read_item;
use crate::trade::models::ItemDescription;
use crate::trade::query::build_query;
use anyhow::{Context, Result};

/// Renders the search query an item description translates into.
pub struct QueryCommand;

impl QueryCommand {
    /// Builds and renders the query for an item read from a JSON file, or
    /// stdin when the path is `-`.
    pub fn execute(&self, item_path: &str) -> Result<String> {
        let item = read_item(item_path)?;
        self.execute_for_item(&item)
    }

    /// Renders the query for an already-parsed item (for testing).
    pub fn execute_for_item(&self, item: &ItemDescription) -> Result<String> {
        let query = build_query(item);
        serde_json::to_string_pretty(&query).context("Failed to render query document")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::trade::models::ItemMod;

    #[test]
    fn test_query_command_renders_document() {
        let item = ItemDescription {
            base_type: Some("Vaal Regalia".to_string()),
            rarity: Some("Rare".to_string()),
            explicit_mods: vec![ItemMod::with_id("explicit.stat_1")],
            ..Default::default()
        };

        let output = QueryCommand.execute_for_item(&item).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&output).unwrap();
        assert_eq!(parsed["query"]["type"], "Vaal Regalia");
        let rarity = &parsed["query"]["filters"]["type_filters"]["filters"]["rarity"];
        assert_eq!(rarity["option"], "rare");
        assert_eq!(parsed["query"]["stats"][0]["filters"][0]["id"], "explicit.stat_1");
    }

    #[test]
    fn test_query_command_empty_item() {
        let output = QueryCommand.execute_for_item(&ItemDescription::default()).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&output).unwrap();
        assert_eq!(parsed["query"]["status"]["option"], "online");
        assert!(parsed["query"].get("stats").is_none());
    }
}
