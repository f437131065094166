//! JSON output — the report document itself, pretty-printed

use anyhow::{Context, Result};
use styleguard_core::Report;

pub fn render(report: &Report) -> Result<String> {
    serde_json::to_string_pretty(report).context("serializing report to JSON")
}
