//! styleguard CLI library — exposed for integration tests

pub mod init;
pub mod output;

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use std::path::{Path, PathBuf};
use std::time::Instant;
use styleguard_core::{find_repo_root, run_audit, Config, FailOn, ResolvedOptions};

#[derive(Parser)]
#[command(name = "styleguard")]
#[command(about = "Incremental CSS audit with baseline suppression", long_about = None)]
#[command(version = styleguard_core::VERSION)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Repository to audit (default: current directory)
    pub path: Option<PathBuf>,

    /// Audit only files changed since the comparison ref
    #[arg(long)]
    pub changed: bool,

    /// Comparison ref for --changed (default: from config, else "main")
    #[arg(long)]
    pub since: Option<String>,

    /// Allow-list glob pattern (repeatable)
    #[arg(long)]
    pub include: Vec<String>,

    /// Deny-list glob pattern (repeatable)
    #[arg(long)]
    pub exclude: Vec<String>,

    /// Run only these tools (comma-separated ids)
    #[arg(long, value_delimiter = ',')]
    pub tools: Option<Vec<String>>,

    /// Skip these tools (comma-separated ids)
    #[arg(long, value_delimiter = ',')]
    pub skip_tools: Vec<String>,

    /// Baseline file path (default: from config)
    #[arg(long)]
    pub baseline: Option<PathBuf>,

    /// Disable baseline filtering entirely
    #[arg(long)]
    pub no_baseline: bool,

    /// Refresh the baseline from this run's findings
    #[arg(long)]
    pub update_baseline: bool,

    /// Override safety interlocks (e.g. baseline refresh in changed mode)
    #[arg(long)]
    pub force: bool,

    /// Allow fix-category tools to run
    #[arg(long)]
    pub force_fix: bool,

    /// Severity threshold for a non-zero exit code
    #[arg(long, value_enum)]
    pub fail_on: Option<FailOnArg>,

    /// Shorthand for --fail-on warn
    #[arg(long)]
    pub strict: bool,

    /// Write the JSON report to this path
    #[arg(long)]
    pub output: Option<PathBuf>,

    /// Stdout rendering format
    #[arg(long, value_enum, default_value = "pretty")]
    pub format: OutputFormat,

    /// Write an HTML report to this path
    #[arg(long)]
    pub html: Option<PathBuf>,

    /// Suppress progress output (CI mode)
    #[arg(long)]
    pub quiet: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Write a starter .styleguard.toml
    Init {
        /// Directory to initialize (default: current directory)
        path: Option<PathBuf>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Pretty,
    Json,
    Junit,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum FailOnArg {
    Error,
    Warn,
    Info,
    Never,
}

impl From<FailOnArg> for FailOn {
    fn from(value: FailOnArg) -> Self {
        match value {
            FailOnArg::Error => FailOn::Error,
            FailOnArg::Warn => FailOn::Warn,
            FailOnArg::Info => FailOn::Info,
            FailOnArg::Never => FailOn::Never,
        }
    }
}

/// Merge CLI flags over configuration defaults.
pub fn resolve_options(cli: &Cli, config: &Config, root: &Path) -> ResolvedOptions {
    let mut options = ResolvedOptions::from_config(config, root);

    options.changed = cli.changed;
    if let Some(since) = &cli.since {
        options.since = since.clone();
    }
    options.include = cli.include.clone();
    options.exclude = cli.exclude.clone();
    options.tools = cli.tools.clone();
    options.skip_tools = cli.skip_tools.clone();

    if cli.no_baseline {
        options.baseline_path = None;
    } else if let Some(path) = &cli.baseline {
        options.baseline_path = Some(if path.is_absolute() {
            path.clone()
        } else {
            root.join(path)
        });
    }
    options.update_baseline = cli.update_baseline;
    options.force = cli.force;
    options.force_fix = cli.force_fix;

    // Explicit --fail-on wins over --strict.
    if let Some(fail_on) = cli.fail_on {
        options.fail_on = fail_on.into();
    } else if cli.strict {
        options.fail_on = FailOn::Warn;
    }

    options.output = cli.output.clone();
    options.html = cli.html.clone();
    options.quiet = cli.quiet;

    options
}

/// Run the audit and render the result. Returns the process exit code.
pub fn run(cli: &Cli) -> Result<i32> {
    let start = Instant::now();

    let start_dir = cli.path.clone().unwrap_or_else(|| PathBuf::from("."));
    let root = find_repo_root(&start_dir);
    let config = match Config::find_and_load(&root) {
        Ok(config) => config,
        Err(e) => {
            // Bad configuration degrades to defaults, never aborts the run.
            if !cli.quiet {
                eprintln!(
                    "  {}: could not load .styleguard.toml ({}) — using defaults",
                    "warn".yellow(),
                    e
                );
            }
            Config::default()
        }
    };
    let options = resolve_options(cli, &config, &root);

    if !options.quiet && cli.format == OutputFormat::Pretty {
        eprintln!(
            "{}",
            format!(
                "  styleguard v{} — auditing {}",
                styleguard_core::VERSION,
                root.display()
            )
            .bold()
        );
        eprintln!();
    }

    let outcome = run_audit(&root, &options, &config)?;

    match cli.format {
        OutputFormat::Pretty => {
            if !options.quiet {
                output::terminal::print_report(&outcome.report, start.elapsed());
            }
        }
        OutputFormat::Json => println!("{}", output::json::render(&outcome.report)?),
        OutputFormat::Junit => println!("{}", output::junit::render(&outcome.report)),
    }

    Ok(outcome.exit_code)
}
