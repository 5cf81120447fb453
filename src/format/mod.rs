//! Output formatting for price reports (table, JSON, markdown, CSV).

use crate::config::OutputFormat;
use crate::pricing::{PriceObservation, PriceReport};

/// Formats price reports for output.
pub struct Formatter {
    format: OutputFormat,
}

impl Formatter {
    /// Creates a new formatter.
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    /// Formats a full price report.
    pub fn format_report(&self, report: &PriceReport) -> String {
        match self.format {
            OutputFormat::Json => self.json(report),
            OutputFormat::Table => self.table(report),
            OutputFormat::Markdown => self.markdown(report),
            OutputFormat::Csv => self.csv(report),
        }
    }

    fn json(&self, report: &PriceReport) -> String {
        serde_json::to_string_pretty(report).unwrap_or_else(|_| "{}".to_string())
    }

    fn table(&self, report: &PriceReport) -> String {
        let info = &report.price_info;
        let mut lines = Vec::new();

        match (&info.min, &info.median, &info.max) {
            (Some(min), Some(median), Some(max)) => {
                lines.push(format!("Min:     {}", fmt_price(min)));
                lines.push(format!("Median:  {}", fmt_price(median)));
                lines.push(format!("Max:     {}", fmt_price(max)));
            }
            _ => lines.push("No priced listings found.".to_string()),
        }

        lines.push(format!(
            "Sample:  {} listings ({} total matches)",
            info.sample.len(),
            info.total_results
        ));
        lines.push(format!("Search:  {}", report.search_url));

        lines.join("\n")
    }

    fn markdown(&self, report: &PriceReport) -> String {
        let info = &report.price_info;
        let mut lines = Vec::new();

        match (&info.min, &info.median, &info.max) {
            (Some(min), Some(median), Some(max)) => {
                lines.push("| Min | Median | Max |".to_string());
                lines.push("|-----|--------|-----|".to_string());
                lines.push(format!(
                    "| {} | {} | {} |",
                    fmt_price(min),
                    fmt_price(median),
                    fmt_price(max)
                ));
            }
            _ => lines.push("No priced listings found.".to_string()),
        }

        lines.push(String::new());
        lines.push(format!(
            "{} listings sampled of {} total matches — [view search]({})",
            info.sample.len(),
            info.total_results,
            report.search_url
        ));

        lines.join("\n")
    }

    fn csv(&self, report: &PriceReport) -> String {
        let info = &report.price_info;
        let mut lines = vec![
            "min,min_currency,median,median_currency,max,max_currency,sample,total,search_url"
                .to_string(),
        ];

        let field = |obs: &Option<PriceObservation>| match obs {
            Some(obs) => format!("{},{}", fmt_amount(obs.amount), obs.currency),
            None => ",".to_string(),
        };

        lines.push(format!(
            "{},{},{},{},{},{}",
            field(&info.min),
            field(&info.median),
            field(&info.max),
            info.sample.len(),
            info.total_results,
            report.search_url
        ));

        lines.join("\n")
    }
}

fn fmt_price(obs: &PriceObservation) -> String {
    format!("{} {}", fmt_amount(obs.amount), obs.currency)
}

/// Whole amounts print without a trailing ".0".
fn fmt_amount(amount: f64) -> String {
    if amount.fract() == 0.0 && amount.abs() < 1e15 {
        format!("{}", amount as i64)
    } else {
        format!("{:.1}", amount)
    }
}
