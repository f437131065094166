//! Baseline persistence and refresh — suppress accepted findings, report new ones

use crate::finding::{Finding, Severity};
use crate::log::Logger;
use anyhow::{Context, Result};
use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashSet};
use std::fs;
use std::path::Path;

pub const BASELINE_VERSION: u32 = 2;

/// One accepted finding, keyed by fingerprint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BaselineEntry {
    pub fingerprint: String,
    pub tool: String,
    pub rule_id: String,
    pub severity: Severity,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,

    /// Set the first time the fingerprint is accepted, preserved across
    /// refreshes while it keeps appearing.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub added_at: Option<String>,
}

/// Full baseline document stored on disk.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Baseline {
    pub version: u32,
    pub generated_at: String,
    pub entries: Vec<BaselineEntry>,
}

impl Baseline {
    pub fn empty() -> Self {
        Baseline {
            version: BASELINE_VERSION,
            generated_at: now_rfc3339(),
            entries: Vec::new(),
        }
    }

    pub fn fingerprints(&self) -> HashSet<&str> {
        self.entries.iter().map(|e| e.fingerprint.as_str()).collect()
    }
}

fn now_rfc3339() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true)
}

fn sort_entries(entries: &mut [BaselineEntry]) {
    entries.sort_by(|a, b| {
        (a.tool.as_str(), a.rule_id.as_str(), a.fingerprint.as_str()).cmp(&(
            b.tool.as_str(),
            b.rule_id.as_str(),
            b.fingerprint.as_str(),
        ))
    });
}

// Legacy (v1) baseline: acceptance records keyed by an ad hoc map.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LegacyBaseline {
    #[serde(default)]
    generated_at: Option<String>,
    accepted: std::collections::BTreeMap<String, LegacyEntry>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LegacyEntry {
    tool: String,
    rule_id: String,
    severity: Severity,
    #[serde(default)]
    note: Option<String>,
    #[serde(default)]
    added_at: Option<String>,
}

/// Load a baseline. Missing or unreadable files yield an empty baseline
/// with a warning, never a fatal error. Legacy v1 documents are migrated
/// to the entries form in memory.
pub fn read_baseline(path: &Path, log: &Logger) -> Baseline {
    let data = match fs::read_to_string(path) {
        Ok(d) => d,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Baseline::empty(),
        Err(e) => {
            log.warn(&format!(
                "could not read baseline {}: {} — starting from an empty baseline",
                path.display(),
                e
            ));
            return Baseline::empty();
        }
    };

    if let Ok(baseline) = serde_json::from_str::<Baseline>(&data) {
        return baseline;
    }

    if let Ok(legacy) = serde_json::from_str::<LegacyBaseline>(&data) {
        log.note(&format!(
            "migrating legacy baseline format at {}",
            path.display()
        ));
        let mut entries: Vec<BaselineEntry> = legacy
            .accepted
            .into_iter()
            .map(|(fingerprint, e)| BaselineEntry {
                fingerprint,
                tool: e.tool,
                rule_id: e.rule_id,
                severity: e.severity,
                note: e.note,
                added_at: e.added_at,
            })
            .collect();
        sort_entries(&mut entries);
        return Baseline {
            version: BASELINE_VERSION,
            generated_at: legacy.generated_at.unwrap_or_else(now_rfc3339),
            entries,
        };
    }

    log.warn(&format!(
        "baseline {} is not valid JSON — starting from an empty baseline",
        path.display()
    ));
    Baseline::empty()
}

/// Findings partitioned by baseline membership. `new` is what gates CI.
#[derive(Debug, Default)]
pub struct BaselinePartition {
    pub new: Vec<Finding>,
    pub suppressed: Vec<Finding>,
}

pub fn filter_against_baseline(findings: Vec<Finding>, baseline: &Baseline) -> BaselinePartition {
    let known = baseline.fingerprints();
    let mut partition = BaselinePartition::default();
    for finding in findings {
        if known.contains(finding.fingerprint.as_str()) {
            partition.suppressed.push(finding);
        } else {
            partition.new.push(finding);
        }
    }
    partition
}

/// Refresh a baseline against a run's complete finding set.
///
/// `all_findings` must be the full (deduplicated) set from the run, not
/// the already-filtered new subset: otherwise "still present" cannot be
/// told apart from "fixed" and valid entries get pruned.
///
/// `include` decides whether a new finding is accepted (the tool's
/// `baseline_include` policy).
pub fn update_baseline(
    baseline: &Baseline,
    all_findings: &[Finding],
    tools_that_ran: &BTreeSet<String>,
    include: impl Fn(&Finding) -> bool,
) -> Baseline {
    let current: HashSet<&str> = all_findings.iter().map(|f| f.fingerprint.as_str()).collect();

    let mut entries: Vec<BaselineEntry> = Vec::new();
    for entry in &baseline.entries {
        if current.contains(entry.fingerprint.as_str()) {
            // Still present: keep unchanged, addedAt preserved.
            entries.push(entry.clone());
        } else if tools_that_ran.contains(&entry.tool) {
            // The tool ran and no longer reports it: fixed, drop.
        } else {
            // No information to judge it by: keep untouched.
            entries.push(entry.clone());
        }
    }

    let kept: HashSet<String> = entries.iter().map(|e| e.fingerprint.clone()).collect();
    for finding in all_findings {
        if kept.contains(&finding.fingerprint) || !include(finding) {
            continue;
        }
        entries.push(BaselineEntry {
            fingerprint: finding.fingerprint.clone(),
            tool: finding.tool.clone(),
            rule_id: finding.rule_id.clone(),
            severity: finding.severity,
            note: None,
            added_at: Some(now_rfc3339()),
        });
    }

    sort_entries(&mut entries);

    // A no-op refresh keeps the old timestamp so repeated runs produce
    // byte-identical files.
    let mut old_sorted = baseline.entries.clone();
    sort_entries(&mut old_sorted);
    let generated_at = if entries == old_sorted {
        baseline.generated_at.clone()
    } else {
        now_rfc3339()
    };

    Baseline {
        version: BASELINE_VERSION,
        generated_at,
        entries,
    }
}

/// Persist a baseline. Entries are re-sorted before serializing so the
/// on-disk form is deterministic; the file always ends with a newline.
pub fn write_baseline(baseline: &Baseline, path: &Path) -> Result<()> {
    let mut sorted = baseline.clone();
    sort_entries(&mut sorted.entries);

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("creating baseline dir {}", parent.display()))?;
    }
    let mut json = serde_json::to_string_pretty(&sorted).context("serializing baseline")?;
    json.push('\n');
    fs::write(path, json).with_context(|| format!("writing {}", path.display()))?;
    Ok(())
}

/// Pruning entries for deleted files is intentionally deferred: an entry
/// only disappears when its tool runs and stops reporting the
/// fingerprint.
pub fn prune_baseline(_baseline: &mut Baseline) {}
