//! Report aggregation and JSON/HTML artifact output

use crate::finding::{Artifact, Finding, Severity};
use crate::targets::TargetSet;
use anyhow::{Context, Result};
use chrono::{SecondsFormat, Utc};
use maud::{html, Markup, DOCTYPE};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    pub generated_at: String,
    pub metadata: ReportMetadata,
    pub summary: ReportSummary,
    /// New (non-baselined) findings
    pub findings: Vec<Finding>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub suppressed: Vec<Finding>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub artifacts: BTreeMap<String, Vec<Artifact>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportMetadata {
    pub mode: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub since_ref: Option<String>,
    pub changed_files_count: usize,
    pub tools_run: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportSummary {
    pub total_findings: usize,
    pub suppressed: usize,
    pub new: usize,
    pub by_severity: SeverityCounts,
    pub by_tool: BTreeMap<String, usize>,
    pub top_rule_ids: Vec<CountedKey>,
    pub top_files: Vec<CountedKey>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SeverityCounts {
    pub error: usize,
    pub warn: usize,
    pub info: usize,
}

impl SeverityCounts {
    pub fn count(&mut self, severity: Severity) {
        match severity {
            Severity::Error => self.error += 1,
            Severity::Warn => self.warn += 1,
            Severity::Info => self.info += 1,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CountedKey {
    pub key: String,
    pub count: usize,
}

const TOP_N: usize = 5;

fn top_counts(keys: impl Iterator<Item = String>) -> Vec<CountedKey> {
    let mut counts: BTreeMap<String, usize> = BTreeMap::new();
    for key in keys {
        *counts.entry(key).or_insert(0) += 1;
    }
    let mut counted: Vec<CountedKey> = counts
        .into_iter()
        .map(|(key, count)| CountedKey { key, count })
        .collect();
    // Highest count first; BTreeMap iteration already sorted keys for ties.
    counted.sort_by(|a, b| b.count.cmp(&a.count).then(a.key.cmp(&b.key)));
    counted.truncate(TOP_N);
    counted
}

/// Aggregate a run's outcome into the report document.
pub fn build_report(
    targets: &TargetSet,
    tools_run: Vec<String>,
    new: Vec<Finding>,
    suppressed: Vec<Finding>,
    artifacts: BTreeMap<String, Vec<Artifact>>,
) -> Report {
    let mut by_severity = SeverityCounts::default();
    let mut by_tool: BTreeMap<String, usize> = BTreeMap::new();
    for finding in &new {
        by_severity.count(finding.severity);
        *by_tool.entry(finding.tool.clone()).or_insert(0) += 1;
    }

    let summary = ReportSummary {
        total_findings: new.len() + suppressed.len(),
        suppressed: suppressed.len(),
        new: new.len(),
        by_severity,
        by_tool,
        top_rule_ids: top_counts(new.iter().map(|f| f.rule_id.clone())),
        top_files: top_counts(new.iter().filter_map(|f| f.file.clone())),
    };

    Report {
        generated_at: Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
        metadata: ReportMetadata {
            mode: targets.mode.to_string(),
            since_ref: targets.since_ref.clone(),
            changed_files_count: targets.changed_files.len(),
            tools_run,
        },
        summary,
        findings: new,
        suppressed,
        artifacts,
    }
}

pub fn write_json(report: &Report, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("creating report dir {}", parent.display()))?;
    }
    let mut json = serde_json::to_string_pretty(report).context("serializing report")?;
    json.push('\n');
    std::fs::write(path, json).with_context(|| format!("writing report {}", path.display()))?;
    Ok(())
}

pub fn write_html(report: &Report, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("creating report dir {}", parent.display()))?;
    }
    let markup = render_html(report);
    std::fs::write(path, markup.into_string())
        .with_context(|| format!("writing report {}", path.display()))?;
    Ok(())
}

const CSS_STYLES: &str = r#"
body {
    font-family: -apple-system, BlinkMacSystemFont, "Segoe UI", Roboto, Helvetica, Arial, sans-serif;
    margin: 0;
    background-color: #f6f6f6;
    color: #333;
    padding: 24px;
}
h1 { margin-top: 0; }
.cards { display: flex; gap: 16px; margin-bottom: 24px; }
.card {
    background: white;
    border-radius: 6px;
    padding: 14px 20px;
    box-shadow: 0 1px 4px rgba(0,0,0,0.08);
}
.card .num { font-size: 1.6em; font-weight: bold; }
table {
    width: 100%;
    border-collapse: collapse;
    background: white;
    box-shadow: 0 1px 4px rgba(0,0,0,0.08);
}
th, td { border: 1px solid #e2e2e2; padding: 8px 10px; text-align: left; }
th { background: #37474f; color: white; }
tr:nth-child(even) { background: #fafafa; }
.severity-error { color: #c62828; font-weight: bold; }
.severity-warn { color: #ef6c00; font-weight: bold; }
.severity-info { color: #1565c0; }
.meta { color: #777; margin-bottom: 16px; }
"#;

/// Render the standalone HTML report.
pub fn render_html(report: &Report) -> Markup {
    html! {
        (DOCTYPE)
        html {
            head {
                meta charset="utf-8";
                title { "styleguard report" }
                style { (maud::PreEscaped(CSS_STYLES)) }
            }
            body {
                h1 { "styleguard report" }
                p class="meta" {
                    "Generated " (report.generated_at)
                    " · mode: " (report.metadata.mode)
                    @if let Some(since) = &report.metadata.since_ref {
                        " (since " (since) ")"
                    }
                    " · tools: " (report.metadata.tools_run.join(", "))
                }
                div class="cards" {
                    div class="card" {
                        div class="num" { (report.summary.new) }
                        div { "new findings" }
                    }
                    div class="card" {
                        div class="num" { (report.summary.suppressed) }
                        div { "baselined" }
                    }
                    div class="card" {
                        div class="num" { (report.summary.by_severity.error) }
                        div { "errors" }
                    }
                    div class="card" {
                        div class="num" { (report.summary.by_severity.warn) }
                        div { "warnings" }
                    }
                }
                @if report.findings.is_empty() {
                    p { "No new findings." }
                } @else {
                    table {
                        tr {
                            th { "Severity" }
                            th { "Tool" }
                            th { "Rule" }
                            th { "Location" }
                            th { "Message" }
                        }
                        @for finding in &report.findings {
                            tr {
                                td class=(format!("severity-{}", finding.severity)) {
                                    (finding.severity)
                                }
                                td { (finding.tool) }
                                td { (finding.rule_id) }
                                td {
                                    @if let Some(file) = &finding.file {
                                        (file)
                                        @if let Some(line) = finding.line {
                                            ":" (line)
                                        }
                                    } @else {
                                        "—"
                                    }
                                }
                                td { (finding.message) }
                            }
                        }
                    }
                }
            }
        }
    }
}
