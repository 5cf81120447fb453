//! Configuration management with TOML, environment variables, and CLI
//! overrides.

use crate::pricing::aggregate::AggregationMode;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;

/// Application configuration with layered loading.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// League the search is scoped to.
    pub league: String,

    /// Trade API base URL.
    pub api_url: String,

    /// Human-facing trade site base URL, used to build result links.
    pub site_url: String,

    /// Proxy URL (e.g., socks5://host:port)
    pub proxy: Option<String>,

    /// Base politeness delay between outbound requests in milliseconds.
    pub delay_ms: u64,

    /// Random jitter added to the delay (0 to this value).
    pub delay_jitter_ms: u64,

    /// Base wait after a transient failure; scales with consecutive hits.
    pub backoff_ms: u64,

    /// Attempt budget for one search call, relaxations included.
    pub max_search_attempts: u32,

    /// Transient-failure budget per listing-fetch batch.
    pub max_fetch_attempts: u32,

    /// Cap on retrievable result IDs per search.
    pub max_results: usize,

    /// Currencies the aggregator retains; the first entry is the primary
    /// currency used for dominance tie-breaking.
    pub currencies: Vec<String>,

    /// Aggregation policy.
    pub mode: AggregationMode,

    /// Output format.
    pub format: OutputFormat,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            league: "Standard".to_string(),
            api_url: "https://www.pathofexile.com/api/trade".to_string(),
            site_url: "https://www.pathofexile.com/trade/search".to_string(),
            proxy: None,
            delay_ms: 500,
            delay_jitter_ms: 500,
            backoff_ms: 2000,
            max_search_attempts: 8,
            max_fetch_attempts: 4,
            max_results: 20,
            currencies: vec!["chaos".to_string(), "divine".to_string()],
            mode: AggregationMode::Median,
            format: OutputFormat::Table,
        }
    }
}

impl Config {
    /// Creates a new default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads configuration from a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        debug!("Loading config from: {}", path.display());

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    /// Loads configuration with fallback to default locations.
    pub fn load(explicit_path: Option<&Path>) -> Result<Self> {
        // 1. Explicit path takes precedence
        if let Some(path) = explicit_path {
            return Self::from_file(path);
        }

        // 2. Try current directory
        let local_config = Path::new("config.toml");
        if local_config.exists() {
            debug!("Found config.toml in current directory");
            return Self::from_file(local_config);
        }

        // 3. Try XDG config directory
        if let Some(config_dir) = dirs::config_dir() {
            let xdg_config = config_dir.join("poe-pricer").join("config.toml");
            if xdg_config.exists() {
                debug!("Found config in XDG config directory");
                return Self::from_file(xdg_config);
            }
        }

        // 4. Return default config
        debug!("No config file found, using defaults");
        Ok(Self::default())
    }

    /// Applies environment variable overrides.
    pub fn with_env(mut self) -> Self {
        if let Ok(league) = std::env::var("POE_LEAGUE") {
            if !league.is_empty() {
                self.league = league;
            }
        }

        if let Ok(api_url) = std::env::var("POE_API_URL") {
            if !api_url.is_empty() {
                self.api_url = api_url;
            }
        }

        if let Ok(proxy) = std::env::var("POE_PROXY") {
            self.proxy = Some(proxy);
        }

        if let Ok(delay) = std::env::var("POE_DELAY") {
            if let Ok(d) = delay.parse() {
                self.delay_ms = d;
            }
        }

        self
    }
}

/// Output format for results.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Table,
    Json,
    Markdown,
    Csv,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "table" => Ok(OutputFormat::Table),
            "json" => Ok(OutputFormat::Json),
            "markdown" | "md" => Ok(OutputFormat::Markdown),
            "csv" => Ok(OutputFormat::Csv),
            _ => Err(format!("Unknown format: {}. Use: table, json, markdown, csv", s)),
        }
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Table => write!(f, "table"),
            OutputFormat::Json => write!(f, "json"),
            OutputFormat::Markdown => write!(f, "markdown"),
            OutputFormat::Csv => write!(f, "csv"),
        }
    }
}
