//! Configuration file parsing for .styleguard.toml

use crate::finding::FailOn;
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::path::Path;

pub const CONFIG_FILE: &str = ".styleguard.toml";

/// Main configuration structure for .styleguard.toml
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub general: GeneralConfig,

    #[serde(default)]
    pub targets: TargetsConfig,

    #[serde(default)]
    pub index: IndexConfig,

    #[serde(default)]
    pub tools: ToolsConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Severity threshold for non-zero exit code
    #[serde(default)]
    pub fail_on: FailOn,

    /// Default ref for changed-mode comparisons
    #[serde(default = "default_since")]
    pub since: String,

    /// Baseline file path, relative to the repo root
    #[serde(default = "default_baseline")]
    pub baseline: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct TargetsConfig {
    /// Allow-list glob patterns; empty means everything
    #[serde(default)]
    pub include: Vec<String>,

    /// Deny-list glob patterns
    #[serde(default)]
    pub exclude: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexConfig {
    /// Import-specifier alias prefixes, e.g. "@/" -> "src/"
    #[serde(default = "default_aliases")]
    pub aliases: BTreeMap<String, String>,
}

/// Per-tool configuration sections. Sections for unknown tool ids are
/// collected in `unknown` and surfaced as warnings at startup.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ToolsConfig {
    #[serde(default, rename = "duplicate-rules")]
    pub duplicate_rules: DuplicateRulesConfig,

    #[serde(default, rename = "unused-classes")]
    pub unused_classes: UnusedClassesConfig,

    #[serde(default, rename = "bundle-size")]
    pub bundle_size: BundleSizeConfig,

    #[serde(default, rename = "module-location")]
    pub module_location: ModuleLocationConfig,

    #[serde(flatten)]
    pub unknown: HashMap<String, toml::Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DuplicateRulesConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Rule blocks with fewer declarations than this are never flagged
    #[serde(default = "default_min_declarations")]
    pub min_declarations: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UnusedClassesConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BundleSizeConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Combined size limit for built CSS bundles, in bytes
    #[serde(default = "default_max_bytes")]
    pub max_bytes: u64,

    /// Glob (relative to repo root) locating built bundle files
    #[serde(default = "default_bundle_glob")]
    pub bundle_glob: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModuleLocationConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Directory prefixes CSS modules are allowed to live under
    #[serde(default = "default_allowed_dirs")]
    pub allowed_dirs: Vec<String>,
}

// Default functions

fn default_since() -> String {
    "main".to_string()
}

fn default_baseline() -> String {
    ".styleguard-baseline.json".to_string()
}

fn default_true() -> bool {
    true
}

fn default_min_declarations() -> usize {
    2
}

fn default_max_bytes() -> u64 {
    250 * 1024
}

fn default_bundle_glob() -> String {
    ".next/static/css/*.css".to_string()
}

fn default_allowed_dirs() -> Vec<String> {
    vec!["src/components".to_string(), "src/app".to_string()]
}

fn default_aliases() -> BTreeMap<String, String> {
    let mut map = BTreeMap::new();
    map.insert("@/".to_string(), "src/".to_string());
    map
}

impl Default for Config {
    fn default() -> Self {
        toml::from_str("").expect("empty TOML should parse to defaults")
    }
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            fail_on: FailOn::default(),
            since: default_since(),
            baseline: default_baseline(),
        }
    }
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            aliases: default_aliases(),
        }
    }
}

impl Default for DuplicateRulesConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            min_declarations: default_min_declarations(),
        }
    }
}

impl Default for UnusedClassesConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

impl Default for BundleSizeConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_bytes: default_max_bytes(),
            bundle_glob: default_bundle_glob(),
        }
    }
}

impl Default for ModuleLocationConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            allowed_dirs: default_allowed_dirs(),
        }
    }
}

impl Config {
    /// Load configuration from a file
    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        Ok(config)
    }

    /// Find and load .styleguard.toml from the given directory or ancestors
    pub fn find_and_load(start_dir: &Path) -> Result<Self> {
        let mut current = start_dir;

        loop {
            let config_path = current.join(CONFIG_FILE);
            if config_path.exists() {
                return Self::from_file(&config_path);
            }

            match current.parent() {
                Some(parent) => current = parent,
                None => break,
            }
        }

        // No config found, use defaults
        Ok(Self::default())
    }

    /// Whether the given built-in tool is enabled by configuration.
    /// Unknown ids return `None` so the caller can warn.
    pub fn tool_enabled(&self, id: &str) -> Option<bool> {
        match id {
            "duplicate-rules" => Some(self.tools.duplicate_rules.enabled),
            "unused-classes" => Some(self.tools.unused_classes.enabled),
            "bundle-size" => Some(self.tools.bundle_size.enabled),
            "module-location" => Some(self.tools.module_location.enabled),
            _ => None,
        }
    }

    /// Tool ids present in `[tools.*]` that no built-in tool claims.
    pub fn unknown_tool_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.tools.unknown.keys().cloned().collect();
        ids.sort();
        ids
    }
}
