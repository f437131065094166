//! Terminal output formatting

use colored::Colorize;
use std::time::Duration;
use styleguard_core::{Report, Severity};

pub fn format_finding(severity: Severity, message: &str, location: &str) -> String {
    let tag = match severity {
        Severity::Error => "error".red().bold().to_string(),
        Severity::Warn => "warn ".yellow().bold().to_string(),
        Severity::Info => "info ".blue().to_string(),
    };
    if location.is_empty() {
        format!("  {} {}", tag, message)
    } else {
        format!("  {} {}  {}", tag, message, location.dimmed())
    }
}

pub fn print_report(report: &Report, elapsed: Duration) {
    println!();

    for finding in &report.findings {
        let location = match (&finding.file, finding.line) {
            (Some(file), Some(line)) => format!("{}:{}", file, line),
            (Some(file), None) => file.clone(),
            _ => String::new(),
        };
        println!(
            "{}",
            format_finding(finding.severity, &finding.message, &location)
        );
    }

    if !report.findings.is_empty() {
        println!();
    }

    println!("  {}", "\u{2500}".repeat(60).dimmed());
    println!(
        "  {} \u{00b7} {} \u{00b7} {}",
        format!("{} error(s)", report.summary.by_severity.error).red(),
        format!("{} warning(s)", report.summary.by_severity.warn).yellow(),
        format!("{} info", report.summary.by_severity.info).blue()
    );
    if report.summary.suppressed > 0 {
        println!(
            "  {} finding(s) suppressed by baseline",
            report.summary.suppressed
        );
    }
    println!(
        "  mode: {} \u{00b7} tools: {}",
        report.metadata.mode,
        report.metadata.tools_run.join(", ")
    );
    println!("  Time: {:.1}s", elapsed.as_secs_f64());
}
