use styleguard_core::{Config, FailOn};
use tempfile::TempDir;

#[test]
fn test_defaults_without_config_file() {
    let tmp = TempDir::new().unwrap();
    let config = Config::find_and_load(tmp.path()).unwrap();

    assert_eq!(config.general.fail_on, FailOn::Error);
    assert_eq!(config.general.since, "main");
    assert_eq!(config.general.baseline, ".styleguard-baseline.json");
    assert!(config.tools.duplicate_rules.enabled);
    assert_eq!(config.tools.duplicate_rules.min_declarations, 2);
    assert!(config.tools.bundle_size.enabled);
    assert_eq!(config.index.aliases.get("@/").map(String::as_str), Some("src/"));
    assert!(config.unknown_tool_ids().is_empty());
}

#[test]
fn test_parses_overrides() {
    let toml = r#"
[general]
fail_on = "warn"
since = "develop"

[targets]
exclude = ["src/legacy/**"]

[tools.duplicate-rules]
enabled = false
min_declarations = 3

[tools.bundle-size]
max_bytes = 100000
bundle_glob = "build/css/*.css"
"#;
    let config: Config = toml::from_str(toml).unwrap();

    assert_eq!(config.general.fail_on, FailOn::Warn);
    assert_eq!(config.general.since, "develop");
    assert_eq!(config.targets.exclude, vec!["src/legacy/**"]);
    assert!(!config.tools.duplicate_rules.enabled);
    assert_eq!(config.tools.duplicate_rules.min_declarations, 3);
    assert_eq!(config.tools.bundle_size.max_bytes, 100_000);
    assert_eq!(config.tools.bundle_size.bundle_glob, "build/css/*.css");
    // Untouched sections keep their defaults.
    assert!(config.tools.unused_classes.enabled);
}

#[test]
fn test_unknown_tool_sections_are_reported() {
    let toml = r#"
[tools.color-police]
enabled = true

[tools.unused-classes]
enabled = false
"#;
    let config: Config = toml::from_str(toml).unwrap();
    assert_eq!(config.unknown_tool_ids(), vec!["color-police"]);
    assert!(!config.tools.unused_classes.enabled);
}

#[test]
fn test_find_and_load_walks_ancestors() {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path();
    std::fs::write(
        root.join(".styleguard.toml"),
        "[general]\nfail_on = \"info\"\n",
    )
    .unwrap();
    let nested = root.join("src/components");
    std::fs::create_dir_all(&nested).unwrap();

    let config = Config::find_and_load(&nested).unwrap();
    assert_eq!(config.general.fail_on, FailOn::Info);
}

#[test]
fn test_tool_enabled_lookup() {
    let config = Config::default();
    assert_eq!(config.tool_enabled("duplicate-rules"), Some(true));
    assert_eq!(config.tool_enabled("no-such-tool"), None);
}
