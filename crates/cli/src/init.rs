//! Init command — write a commented starter .styleguard.toml

use anyhow::{bail, Result};
use colored::Colorize;
use std::path::Path;
use styleguard_core::config::CONFIG_FILE;

const STARTER_CONFIG: &str = r#"# styleguard configuration

[general]
# Severity threshold for a non-zero exit code: "error", "warn", "info", "never"
fail_on = "error"
# Comparison ref for --changed runs
since = "main"
# Baseline file, kept in version control
baseline = ".styleguard-baseline.json"

[targets]
# Allow-list globs (empty = everything)
include = []
# Deny-list globs
exclude = []

[index]
# Import alias prefixes used when resolving CSS-module imports
aliases = { "@/" = "src/" }

[tools.duplicate-rules]
enabled = true
# Rule blocks with fewer declarations are never flagged
min_declarations = 2

[tools.unused-classes]
enabled = true

[tools.bundle-size]
enabled = true
max_bytes = 256000
bundle_glob = ".next/static/css/*.css"

[tools.module-location]
enabled = true
allowed_dirs = ["src/components", "src/app"]
"#;

pub fn run(path: Option<&Path>) -> Result<()> {
    let dir = path.unwrap_or_else(|| Path::new("."));
    let config_path = dir.join(CONFIG_FILE);

    if config_path.exists() {
        bail!("{} already exists — refusing to overwrite", config_path.display());
    }

    std::fs::write(&config_path, STARTER_CONFIG)?;
    eprintln!(
        "  {} {}",
        "Created".green().bold(),
        config_path.display()
    );
    Ok(())
}
