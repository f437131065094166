//! Target resolution: which files a run analyzes, full or changed mode

use crate::paths::normalize_rel;
use anyhow::Result;
use ignore::overrides::OverrideBuilder;
use ignore::WalkBuilder;
use regex::Regex;
use serde::Serialize;
use std::path::Path;

/// Build/dependency directories never worth auditing, applied on top of
/// gitignore handling.
const STANDARD_EXCLUDES: &[&str] = &[
    "node_modules/",
    "dist/",
    "build/",
    ".next/",
    "out/",
    "coverage/",
    "target/",
    ".git/",
];

/// Classification of a target file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FileKind {
    /// `*.module.css`, a derived artifact imported by source files
    CssModule,
    /// Plain stylesheets (`.css`, `.scss`) that are not CSS modules
    Css,
    /// TypeScript/JavaScript sources that may import CSS modules
    Source,
    Other,
}

pub fn file_kind(path: &str) -> FileKind {
    if path.ends_with(".module.css") || path.ends_with(".module.scss") {
        FileKind::CssModule
    } else if path.ends_with(".css") || path.ends_with(".scss") {
        FileKind::Css
    } else if path.ends_with(".ts")
        || path.ends_with(".tsx")
        || path.ends_with(".js")
        || path.ends_with(".jsx")
    {
        FileKind::Source
    } else {
        FileKind::Other
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TargetMode {
    Full,
    Changed,
}

impl std::fmt::Display for TargetMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TargetMode::Full => write!(f, "full"),
            TargetMode::Changed => write!(f, "changed"),
        }
    }
}

/// The file universe for a run.
///
/// Per-kind lists always cover the FULL corpus: cross-file tools need the
/// whole picture even in changed mode. Changed-mode narrowing happens when
/// the orchestrator computes each tool's scoped view, via `changed_files`.
#[derive(Debug, Clone)]
pub struct TargetSet {
    pub mode: TargetMode,
    pub since_ref: Option<String>,
    /// Sorted; empty in full mode.
    pub changed_files: Vec<String>,
    pub css_files: Vec<String>,
    pub css_module_files: Vec<String>,
    pub source_files: Vec<String>,
    pub all_files: Vec<String>,
}

impl TargetSet {
    pub fn new(
        mode: TargetMode,
        since_ref: Option<String>,
        mut changed_files: Vec<String>,
        all_files: Vec<String>,
    ) -> Self {
        changed_files.sort();
        changed_files.dedup();

        let mut css_files = Vec::new();
        let mut css_module_files = Vec::new();
        let mut source_files = Vec::new();
        for file in &all_files {
            match file_kind(file) {
                FileKind::CssModule => css_module_files.push(file.clone()),
                FileKind::Css => css_files.push(file.clone()),
                FileKind::Source => source_files.push(file.clone()),
                FileKind::Other => {}
            }
        }

        TargetSet {
            mode,
            since_ref,
            changed_files,
            css_files,
            css_module_files,
            source_files,
            all_files,
        }
    }

    pub fn files_of_kind(&self, kind: FileKind) -> &[String] {
        match kind {
            FileKind::CssModule => &self.css_module_files,
            FileKind::Css => &self.css_files,
            FileKind::Source => &self.source_files,
            FileKind::Other => &self.all_files,
        }
    }

    /// In full mode every file is in scope; in changed mode only files
    /// from the detected changed set.
    pub fn in_changed_scope(&self, path: &str) -> bool {
        match self.mode {
            TargetMode::Full => true,
            TargetMode::Changed => self.changed_files.binary_search(&path.to_string()).is_ok(),
        }
    }
}

/// Compiled include/exclude patterns. Include patterns form an allow-list
/// (empty = allow everything); exclude patterns form a deny-list.
#[derive(Debug, Default)]
pub struct PatternSet {
    include: Vec<Regex>,
    exclude: Vec<Regex>,
}

impl PatternSet {
    pub fn compile(include: &[String], exclude: &[String]) -> Result<Self> {
        Ok(PatternSet {
            include: include
                .iter()
                .map(|p| compile_glob(p))
                .collect::<Result<_>>()?,
            exclude: exclude
                .iter()
                .map(|p| compile_glob(p))
                .collect::<Result<_>>()?,
        })
    }

    pub fn matches(&self, path: &str) -> bool {
        if !self.include.is_empty() && !self.include.iter().any(|re| re.is_match(path)) {
            return false;
        }
        !self.exclude.iter().any(|re| re.is_match(path))
    }
}

/// Compile a simple glob (`**`, `*`) into an anchored regex.
/// `**/` also matches zero directories so `**/*.css` covers root files.
pub fn compile_glob(pattern: &str) -> Result<Regex> {
    let mut re = String::from("^");
    let mut chars = pattern.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '*' => {
                if chars.peek() == Some(&'*') {
                    chars.next();
                    if chars.peek() == Some(&'/') {
                        chars.next();
                        re.push_str("(?:.*/)?");
                    } else {
                        re.push_str(".*");
                    }
                } else {
                    re.push_str("[^/]*");
                }
            }
            '?' => re.push_str("[^/]"),
            '.' | '+' | '(' | ')' | '[' | ']' | '{' | '}' | '^' | '$' | '|' | '\\' => {
                re.push('\\');
                re.push(c);
            }
            other => re.push(other),
        }
    }
    re.push('$');
    Regex::new(&re).map_err(Into::into)
}

/// Walk the repository collecting candidate files, honoring gitignore and
/// the standard build/dependency exclusions. Returns forward-slash paths
/// relative to `root`, sorted, filtered through `patterns`.
pub fn collect_files(root: &Path, patterns: &PatternSet) -> Result<Vec<String>> {
    let root = std::fs::canonicalize(root)?;

    let mut builder = WalkBuilder::new(&root);
    builder
        .hidden(true)
        .git_ignore(true)
        .git_global(true)
        .git_exclude(true);

    let mut overrides = OverrideBuilder::new(&root);
    for pattern in STANDARD_EXCLUDES {
        // Gitignore override syntax: negate to exclude.
        overrides.add(&format!("!{}**", pattern))?;
    }
    builder.overrides(overrides.build()?);

    let mut files = Vec::new();
    for entry in builder.build() {
        let entry = match entry {
            Ok(e) => e,
            Err(_) => continue, // skip unreadable entries
        };
        if !entry.file_type().is_some_and(|ft| ft.is_file()) {
            continue;
        }
        let rel = normalize_rel(&root, entry.path());
        if rel.is_empty() {
            continue;
        }
        if patterns.matches(&rel) {
            files.push(rel);
        }
    }

    files.sort();
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds_classify() {
        assert_eq!(file_kind("src/a.module.css"), FileKind::CssModule);
        assert_eq!(file_kind("src/a.css"), FileKind::Css);
        assert_eq!(file_kind("src/App.tsx"), FileKind::Source);
        assert_eq!(file_kind("README.md"), FileKind::Other);
    }

    #[test]
    fn glob_double_star_matches_any_depth() {
        let re = compile_glob("**/*.css").unwrap();
        assert!(re.is_match("a.css"));
        assert!(re.is_match("src/deep/nested/a.css"));
        assert!(!re.is_match("src/a.ts"));
    }

    #[test]
    fn glob_single_star_stays_in_segment() {
        let re = compile_glob("src/*.css").unwrap();
        assert!(re.is_match("src/a.css"));
        assert!(!re.is_match("src/deep/a.css"));
    }

    #[test]
    fn include_is_allow_list_exclude_is_deny_list() {
        let patterns = PatternSet::compile(
            &["src/**".to_string()],
            &["src/vendor/**".to_string()],
        )
        .unwrap();
        assert!(patterns.matches("src/a.css"));
        assert!(!patterns.matches("lib/a.css"));
        assert!(!patterns.matches("src/vendor/a.css"));
    }

    #[test]
    fn changed_scope_lookup() {
        let targets = TargetSet::new(
            TargetMode::Changed,
            Some("main".to_string()),
            vec!["src/b.css".to_string(), "src/a.css".to_string()],
            vec!["src/a.css".to_string(), "src/b.css".to_string(), "src/c.css".to_string()],
        );
        assert!(targets.in_changed_scope("src/a.css"));
        assert!(!targets.in_changed_scope("src/c.css"));
    }
}
