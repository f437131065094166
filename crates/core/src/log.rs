//! Console logging for pipeline progress and recoverable warnings

use colored::Colorize;

/// Run-scoped logger. All diagnostics go to stderr so stdout stays clean
/// for machine-readable output; `quiet` silences everything.
#[derive(Debug, Clone, Default)]
pub struct Logger {
    pub quiet: bool,
}

impl Logger {
    pub fn new(quiet: bool) -> Self {
        Logger { quiet }
    }

    /// A progress step line, e.g. "Building targets... done (42 files)".
    pub fn step(&self, msg: &str) {
        if !self.quiet {
            eprintln!("  {}", msg);
        }
    }

    /// Informational note shown dimmed.
    pub fn note(&self, msg: &str) {
        if !self.quiet {
            eprintln!("  {}", msg.dimmed());
        }
    }

    /// Recoverable problem. The run continues.
    pub fn warn(&self, msg: &str) {
        if !self.quiet {
            eprintln!("  {}: {}", "warn".yellow(), msg);
        }
    }
}
