use styleguard_core::tool::{scoped_targets, Tool, ToolContext};
use styleguard_core::tools::duplicate_rules::DuplicateRulesTool;
use styleguard_core::{Config, Logger, ResolvedOptions, Severity, TargetMode, TargetSet};
use tempfile::TempDir;

fn write_file(root: &std::path::Path, rel: &str, content: &str) {
    let path = root.join(rel);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
    std::fs::write(path, content).unwrap();
}

fn run_tool(root: &std::path::Path, targets: &TargetSet) -> Vec<styleguard_core::Finding> {
    let tool = DuplicateRulesTool;
    let config = Config::default();
    let options = ResolvedOptions::default();
    let log = Logger::new(true);
    let scoped = scoped_targets(tool.scope(), targets, None);
    let ctx = ToolContext {
        root,
        config: &config,
        options: &options,
        targets,
        scoped,
        index: None,
        log: &log,
    };
    tool.run(&ctx).unwrap().findings
}

#[test]
fn test_cross_file_duplicates_flag_each_file() {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path();

    write_file(root, "a.css", ".alpha {\n  color: red;\n  padding: 4px;\n}\n");
    write_file(root, "b.css", ".beta {\n  padding: 4px;\n  color: red;\n}\n");

    let targets = TargetSet::new(
        TargetMode::Full,
        None,
        vec![],
        vec!["a.css".to_string(), "b.css".to_string()],
    );
    let findings = run_tool(root, &targets);

    let dups: Vec<_> = findings
        .iter()
        .filter(|f| f.rule_id == "duplicate-rule-block")
        .collect();
    assert_eq!(dups.len(), 2);
    assert!(dups.iter().all(|f| f.severity == Severity::Warn));

    let a = dups.iter().find(|f| f.file.as_deref() == Some("a.css")).unwrap();
    assert!(a.message.contains("b.css"));
    let b = dups.iter().find(|f| f.file.as_deref() == Some("b.css")).unwrap();
    assert!(b.message.contains("a.css"));

    // Same signature, different files: fingerprints must differ so each
    // file's finding can be baselined independently.
    assert_ne!(a.fingerprint, b.fingerprint);
}

#[test]
fn test_same_file_conflicting_selector() {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path();

    write_file(
        root,
        "a.css",
        ".btn {\n  color: red;\n  margin: 0;\n}\n.btn {\n  color: blue;\n  margin: 0;\n}\n",
    );

    let targets = TargetSet::new(TargetMode::Full, None, vec![], vec!["a.css".to_string()]);
    let findings = run_tool(root, &targets);

    let conflicts: Vec<_> = findings
        .iter()
        .filter(|f| f.rule_id == "conflicting-selector")
        .collect();
    assert_eq!(conflicts.len(), 1);
    let conflict = conflicts[0];
    assert!(conflict.message.contains("red"));
    assert!(conflict.message.contains("blue"));
    assert!(conflict.message.contains("color"));
}

#[test]
fn test_trivial_blocks_are_not_duplicates() {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path();

    // Single-declaration blocks fall under min_declarations.
    write_file(root, "a.css", ".alpha { color: red; }\n");
    write_file(root, "b.css", ".beta { color: red; }\n");

    let targets = TargetSet::new(
        TargetMode::Full,
        None,
        vec![],
        vec!["a.css".to_string(), "b.css".to_string()],
    );
    let findings = run_tool(root, &targets);
    assert!(findings.is_empty());
}

#[test]
fn test_changed_mode_still_sees_untouched_duplicates() {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path();

    // a/b duplicate each other; c/d duplicate each other. Only a changed.
    write_file(root, "a.css", ".a1 {\n  color: red;\n  padding: 1px;\n}\n");
    write_file(root, "b.css", ".b1 {\n  color: red;\n  padding: 1px;\n}\n");
    write_file(root, "c.css", ".c1 {\n  color: green;\n  padding: 2px;\n}\n");
    write_file(root, "d.css", ".d1 {\n  color: green;\n  padding: 2px;\n}\n");

    let targets = TargetSet::new(
        TargetMode::Changed,
        Some("main".to_string()),
        vec!["a.css".to_string()],
        vec![
            "a.css".to_string(),
            "b.css".to_string(),
            "c.css".to_string(),
            "d.css".to_string(),
        ],
    );
    let findings = run_tool(root, &targets);

    // The changed file's group is reported (including the untouched
    // partner); the fully untouched c/d group is not.
    let files: Vec<&str> = findings.iter().filter_map(|f| f.file.as_deref()).collect();
    assert!(files.contains(&"a.css"));
    assert!(files.contains(&"b.css"));
    assert!(!files.contains(&"c.css"));
    assert!(!files.contains(&"d.css"));
}

#[test]
fn test_fingerprint_survives_line_shift() {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path();

    write_file(root, "a.css", ".alpha {\n  color: red;\n  padding: 4px;\n}\n");
    write_file(root, "b.css", ".beta {\n  color: red;\n  padding: 4px;\n}\n");
    let targets = TargetSet::new(
        TargetMode::Full,
        None,
        vec![],
        vec!["a.css".to_string(), "b.css".to_string()],
    );
    let before = run_tool(root, &targets);

    // Shift the rule down without changing it.
    write_file(
        root,
        "a.css",
        "/* comment */\n\n\n.alpha {\n  color: red;\n  padding: 4px;\n}\n",
    );
    let after = run_tool(root, &targets);

    let fp_before = &before
        .iter()
        .find(|f| f.file.as_deref() == Some("a.css"))
        .unwrap()
        .fingerprint;
    let fp_after = &after
        .iter()
        .find(|f| f.file.as_deref() == Some("a.css"))
        .unwrap()
        .fingerprint;
    assert_eq!(fp_before, fp_after);
}
