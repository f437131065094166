use styleguard_core::tool::{scoped_targets, Tool, ToolContext};
use styleguard_core::tools::unused_classes::UnusedClassesTool;
use styleguard_core::{
    build_index, Config, Finding, Logger, ResolvedOptions, Severity, TargetMode, TargetSet,
};
use tempfile::TempDir;

fn write_file(root: &std::path::Path, rel: &str, content: &str) {
    let path = root.join(rel);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
    std::fs::write(path, content).unwrap();
}

fn run_tool(root: &std::path::Path, all_files: Vec<String>) -> Vec<Finding> {
    let tool = UnusedClassesTool;
    let config = Config::default();
    let options = ResolvedOptions::default();
    let log = Logger::new(true);
    let targets = TargetSet::new(TargetMode::Full, None, vec![], all_files);
    let index = build_index(root, &targets, &config.index.aliases, &log);
    let scoped = scoped_targets(tool.scope(), &targets, Some(&index));
    let ctx = ToolContext {
        root,
        config: &config,
        options: &options,
        targets: &targets,
        scoped,
        index: Some(&index),
        log: &log,
    };
    tool.run(&ctx).unwrap().findings
}

fn unused_names(findings: &[Finding]) -> Vec<String> {
    findings
        .iter()
        .filter(|f| f.rule_id == "unused-class")
        .filter_map(|f| f.data.as_ref())
        .filter_map(|d| d.get("class"))
        .filter_map(|c| c.as_str().map(String::from))
        .collect()
}

#[test]
fn test_flags_declared_but_never_accessed_classes() {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path();

    write_file(
        root,
        "src/components/button.module.css",
        ".used { color: red; }\n.unused { color: blue; }\n",
    );
    write_file(
        root,
        "src/components/Button.tsx",
        "import styles from './button.module.css';\nexport const B = () => <div className={styles.used} />;\n",
    );

    let findings = run_tool(
        root,
        vec![
            "src/components/button.module.css".to_string(),
            "src/components/Button.tsx".to_string(),
        ],
    );

    assert_eq!(unused_names(&findings), vec!["unused"]);
    assert!(findings.iter().all(|f| f.severity == Severity::Warn));
}

#[test]
fn test_destructuring_counts_as_usage() {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path();

    write_file(
        root,
        "src/components/card.module.css",
        ".header { color: red; }\n.footer { color: blue; }\n",
    );
    write_file(
        root,
        "src/components/Card.tsx",
        "import styles from './card.module.css';\nconst { header, footer } = styles;\nexport const C = header + footer;\n",
    );

    let findings = run_tool(
        root,
        vec![
            "src/components/card.module.css".to_string(),
            "src/components/Card.tsx".to_string(),
        ],
    );
    assert!(findings.is_empty());
}

#[test]
fn test_compose_propagates_usage_transitively() {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path();

    // fancy composes base composes root: using fancy reaches all three.
    write_file(
        root,
        "src/components/chain.module.css",
        ".root { padding: 1px; }\n.base { composes: root; margin: 0; }\n.fancy { composes: base; color: teal; }\n.orphan { color: gray; }\n",
    );
    write_file(
        root,
        "src/components/Chain.tsx",
        "import styles from './chain.module.css';\nexport const C = styles.fancy;\n",
    );

    let findings = run_tool(
        root,
        vec![
            "src/components/chain.module.css".to_string(),
            "src/components/Chain.tsx".to_string(),
        ],
    );
    assert_eq!(unused_names(&findings), vec!["orphan"]);
}

#[test]
fn test_cross_file_compose_reaches_other_module() {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path();

    write_file(
        root,
        "src/components/chips.module.css",
        ".chip { border-radius: 8px; }\n",
    );
    write_file(
        root,
        "src/components/tag.module.css",
        ".tag { composes: chip from './chips.module.css'; color: red; }\n",
    );
    write_file(
        root,
        "src/components/Tag.tsx",
        "import styles from './tag.module.css';\nexport const T = styles.tag;\n",
    );

    let findings = run_tool(
        root,
        vec![
            "src/components/chips.module.css".to_string(),
            "src/components/tag.module.css".to_string(),
            "src/components/Tag.tsx".to_string(),
        ],
    );
    // chip is reached through tag's composes reference.
    assert!(findings.is_empty());
}

#[test]
fn test_dynamic_access_degrades_to_info() {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path();

    write_file(
        root,
        "src/components/variants.module.css",
        ".primary { color: red; }\n.maybe { color: blue; }\n",
    );
    write_file(
        root,
        "src/components/Variants.tsx",
        "import styles from './variants.module.css';\nexport const V = (kind: string) => styles[kind];\n",
    );

    let findings = run_tool(
        root,
        vec![
            "src/components/variants.module.css".to_string(),
            "src/components/Variants.tsx".to_string(),
        ],
    );

    // Nothing is provably used, but nothing is provably unused either.
    assert_eq!(findings.len(), 2);
    assert!(findings.iter().all(|f| f.severity == Severity::Info));
}

#[test]
fn test_keep_markers_suppress() {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path();

    write_file(
        root,
        "src/components/kept.module.css",
        "/* styleguard-keep */\n.legacy { color: red; }\n.plain { color: blue; }\n",
    );
    write_file(
        root,
        "src/components/Kept.tsx",
        "import styles from './kept.module.css';\nexport const K = styles;\n",
    );

    let findings = run_tool(
        root,
        vec![
            "src/components/kept.module.css".to_string(),
            "src/components/Kept.tsx".to_string(),
        ],
    );
    assert_eq!(unused_names(&findings), vec!["plain"]);
}

#[test]
fn test_keep_all_marker_suppresses_whole_file() {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path();

    write_file(
        root,
        "src/components/vendor.module.css",
        "/* styleguard-keep-all */\n.a { color: red; }\n.b { color: blue; }\n",
    );

    let findings = run_tool(
        root,
        vec!["src/components/vendor.module.css".to_string()],
    );
    assert!(findings.is_empty());
}

#[test]
fn test_unimported_module_is_fully_unused() {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path();

    write_file(
        root,
        "src/components/dead.module.css",
        ".a { color: red; }\n",
    );

    let findings = run_tool(root, vec!["src/components/dead.module.css".to_string()]);
    assert_eq!(unused_names(&findings), vec!["a"]);
}

#[test]
fn test_fingerprint_stable_across_line_moves() {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path();

    let files = vec!["src/components/m.module.css".to_string()];
    write_file(root, "src/components/m.module.css", ".gone { color: red; }\n");
    let before = run_tool(root, files.clone());

    write_file(
        root,
        "src/components/m.module.css",
        "\n\n\n.gone { color: red; }\n",
    );
    let after = run_tool(root, files);

    assert_eq!(before.len(), 1);
    assert_eq!(after.len(), 1);
    assert_eq!(before[0].fingerprint, after[0].fingerprint);
    assert_ne!(before[0].line, after[0].line);
}
