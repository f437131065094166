//! Finding types that bridge tool results to baselining and report output

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::HashSet;

/// Severity level of a finding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warn,
    Info,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Severity::Error => write!(f, "error"),
            Severity::Warn => write!(f, "warn"),
            Severity::Info => write!(f, "info"),
        }
    }
}

impl Severity {
    /// Numeric rank for threshold comparisons (higher = more severe).
    pub fn rank(self) -> u8 {
        match self {
            Severity::Error => 2,
            Severity::Warn => 1,
            Severity::Info => 0,
        }
    }
}

/// Severity threshold for a non-zero exit code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum FailOn {
    #[default]
    Error,
    Warn,
    Info,
    Never,
}

impl FailOn {
    /// Whether a finding of the given severity crosses this threshold.
    pub fn matches(self, severity: Severity) -> bool {
        match self {
            FailOn::Error => severity.rank() >= Severity::Error.rank(),
            FailOn::Warn => severity.rank() >= Severity::Warn.rank(),
            FailOn::Info => true,
            FailOn::Never => false,
        }
    }
}

/// A single finding reported by a tool.
///
/// Location fields are advisory only; identity is carried entirely by
/// `fingerprint`, which never incorporates line/column.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Finding {
    /// Stable tool id (e.g. "duplicate-rules")
    pub tool: String,

    /// Stable rule id within the tool (e.g. "conflicting-selector")
    pub rule_id: String,

    pub severity: Severity,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line: Option<u32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub col: Option<u32>,

    /// Human-readable message
    pub message: String,

    /// Remediation hint
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,

    /// Stable identity key, see [`fingerprint`]
    pub fingerprint: String,

    /// Tool-specific structured payload
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}

impl Finding {
    pub fn new(
        tool: impl Into<String>,
        rule_id: impl Into<String>,
        severity: Severity,
        message: impl Into<String>,
    ) -> Self {
        Finding {
            tool: tool.into(),
            rule_id: rule_id.into(),
            severity,
            file: None,
            line: None,
            col: None,
            message: message.into(),
            hint: None,
            fingerprint: String::new(),
            data: None,
        }
    }

    pub fn with_file(mut self, file: impl Into<String>) -> Self {
        self.file = Some(file.into());
        self
    }

    pub fn with_line(mut self, line: u32) -> Self {
        self.line = Some(line);
        self
    }

    pub fn with_col(mut self, col: u32) -> Self {
        self.col = Some(col);
        self
    }

    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }

    pub fn with_data(mut self, data: serde_json::Value) -> Self {
        self.data = Some(data);
        self
    }

    /// Compute and attach the fingerprint from a stable content key.
    ///
    /// The content key should describe *what* the issue is (selector,
    /// class name, signature...), never *where* it currently sits.
    pub fn with_fingerprint(mut self, content_key: &str) -> Self {
        self.fingerprint = fingerprint(
            &self.tool,
            &self.rule_id,
            self.file.as_deref().unwrap_or(""),
            content_key,
        );
        self
    }
}

/// Stable identity for a finding: sha256 over tool, rule, file, and a
/// content key, truncated to 16 hex chars. Line/column never participate,
/// so pure line drift keeps the fingerprint intact.
pub fn fingerprint(tool: &str, rule_id: &str, file: &str, content_key: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(tool.as_bytes());
    hasher.update([0u8]);
    hasher.update(rule_id.as_bytes());
    hasher.update([0u8]);
    hasher.update(file.as_bytes());
    hasher.update([0u8]);
    hasher.update(content_key.as_bytes());
    let digest = hasher.finalize();
    let hex: String = digest.iter().map(|b| format!("{:02x}", b)).collect();
    hex[..16].to_string()
}

/// Deduplicate findings by fingerprint, keeping the first-seen instance.
pub fn dedup_findings(findings: Vec<Finding>) -> Vec<Finding> {
    let mut seen: HashSet<String> = HashSet::new();
    let mut out = Vec::with_capacity(findings.len());
    for f in findings {
        if seen.insert(f.fingerprint.clone()) {
            out.push(f);
        }
    }
    out
}

/// A side artifact produced by a tool alongside its findings
/// (e.g. a measured bundle-size record).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Artifact {
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,

    pub summary: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}

/// Everything a single tool invocation returns.
#[derive(Debug, Clone, Default)]
pub struct ToolRunResult {
    pub findings: Vec<Finding>,
    pub stats: Option<serde_json::Value>,
    pub artifacts: Vec<Artifact>,
}

impl ToolRunResult {
    pub fn from_findings(findings: Vec<Finding>) -> Self {
        ToolRunResult {
            findings,
            stats: None,
            artifacts: Vec::new(),
        }
    }
}
