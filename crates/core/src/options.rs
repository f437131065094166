//! Fully-resolved run options after CLI/config defaulting

use crate::config::Config;
use crate::finding::FailOn;
use std::path::PathBuf;

/// Everything a run needs to know, with all defaults applied.
/// The CLI layer builds this by merging flags over `.styleguard.toml`.
#[derive(Debug, Clone)]
pub struct ResolvedOptions {
    /// Changed-files mode (vs full repository scan)
    pub changed: bool,
    /// Comparison ref for changed mode
    pub since: String,
    pub include: Vec<String>,
    pub exclude: Vec<String>,
    /// Explicit tool allow-list; None = all enabled tools
    pub tools: Option<Vec<String>>,
    /// Explicit tool deny-list
    pub skip_tools: Vec<String>,
    /// None = baselining disabled
    pub baseline_path: Option<PathBuf>,
    pub update_baseline: bool,
    /// Overrides safety interlocks (changed-mode baseline refresh)
    pub force: bool,
    /// Allow fix-category tools to run
    pub force_fix: bool,
    pub fail_on: FailOn,
    /// JSON report destination
    pub output: Option<PathBuf>,
    /// HTML report destination
    pub html: Option<PathBuf>,
    pub quiet: bool,
}

impl Default for ResolvedOptions {
    fn default() -> Self {
        ResolvedOptions {
            changed: false,
            since: "main".to_string(),
            include: Vec::new(),
            exclude: Vec::new(),
            tools: None,
            skip_tools: Vec::new(),
            baseline_path: None,
            update_baseline: false,
            force: false,
            force_fix: false,
            fail_on: FailOn::Error,
            output: None,
            html: None,
            quiet: false,
        }
    }
}

impl ResolvedOptions {
    /// Defaults drawn from configuration: comparison ref, fail-on
    /// threshold, and the baseline path resolved against the repo root.
    pub fn from_config(config: &Config, root: &std::path::Path) -> Self {
        ResolvedOptions {
            since: config.general.since.clone(),
            fail_on: config.general.fail_on,
            baseline_path: Some(root.join(&config.general.baseline)),
            ..Default::default()
        }
    }
}
