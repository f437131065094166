use clap::Parser;
use std::path::Path;
use styleguard_cli::{resolve_options, Cli, OutputFormat};
use styleguard_core::{Config, FailOn};

fn parse(args: &[&str]) -> Cli {
    Cli::parse_from(std::iter::once("styleguard").chain(args.iter().copied()))
}

#[test]
fn test_defaults_come_from_config() {
    let cli = parse(&[]);
    let config = Config::default();
    let options = resolve_options(&cli, &config, Path::new("/repo"));

    assert!(!options.changed);
    assert_eq!(options.since, "main");
    assert_eq!(options.fail_on, FailOn::Error);
    assert_eq!(
        options.baseline_path.as_deref(),
        Some(Path::new("/repo/.styleguard-baseline.json"))
    );
    assert_eq!(cli.format, OutputFormat::Pretty);
}

#[test]
fn test_flags_override_config() {
    let cli = parse(&[
        "--changed",
        "--since",
        "develop",
        "--fail-on",
        "info",
        "--baseline",
        "custom-baseline.json",
        "--quiet",
    ]);
    let config = Config::default();
    let options = resolve_options(&cli, &config, Path::new("/repo"));

    assert!(options.changed);
    assert_eq!(options.since, "develop");
    assert_eq!(options.fail_on, FailOn::Info);
    assert_eq!(
        options.baseline_path.as_deref(),
        Some(Path::new("/repo/custom-baseline.json"))
    );
    assert!(options.quiet);
}

#[test]
fn test_strict_is_shorthand_for_fail_on_warn() {
    let cli = parse(&["--strict"]);
    let options = resolve_options(&cli, &Config::default(), Path::new("/repo"));
    assert_eq!(options.fail_on, FailOn::Warn);
}

#[test]
fn test_explicit_fail_on_beats_strict() {
    let cli = parse(&["--strict", "--fail-on", "never"]);
    let options = resolve_options(&cli, &Config::default(), Path::new("/repo"));
    assert_eq!(options.fail_on, FailOn::Never);
}

#[test]
fn test_no_baseline_disables_baselining() {
    let cli = parse(&["--no-baseline"]);
    let options = resolve_options(&cli, &Config::default(), Path::new("/repo"));
    assert!(options.baseline_path.is_none());
}

#[test]
fn test_tool_lists_parse_comma_separated() {
    let cli = parse(&["--tools", "duplicate-rules,bundle-size", "--skip-tools", "unused-classes"]);
    let options = resolve_options(&cli, &Config::default(), Path::new("/repo"));
    assert_eq!(
        options.tools,
        Some(vec!["duplicate-rules".to_string(), "bundle-size".to_string()])
    );
    assert_eq!(options.skip_tools, vec!["unused-classes".to_string()]);
}
