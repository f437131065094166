//! Duplicate and conflicting CSS rule detection
//!
//! Rule bodies are normalized into canonical signatures (sorted
//! property:value pairs) and grouped across the whole corpus. Groups
//! spanning several files or selectors are duplicates; one selector
//! repeated within a file with different values for the same property is
//! a conflict. Signatures are always computed over the FULL corpus (a
//! changed file can duplicate an untouched one), but in changed mode a
//! group is only reported when it involves a changed file.

use crate::cssparse::{parse_rules, CssRule};
use crate::finding::{Finding, Severity, ToolRunResult};
use crate::targets::FileKind;
use crate::tool::{Tool, ToolContext, ToolScope};
use anyhow::Result;
use serde_json::json;
use std::collections::BTreeMap;

pub struct DuplicateRulesTool;

const ID: &str = "duplicate-rules";

#[derive(Debug, Clone)]
struct RuleSite {
    file: String,
    selector: String,
    line: usize,
}

impl Tool for DuplicateRulesTool {
    fn id(&self) -> &'static str {
        ID
    }

    fn title(&self) -> &'static str {
        "Duplicate CSS rules"
    }

    fn scope(&self) -> ToolScope {
        ToolScope::Files {
            kinds: &[FileKind::Css, FileKind::CssModule],
        }
    }

    fn run(&self, ctx: &ToolContext) -> Result<ToolRunResult> {
        let cfg = &ctx.config.tools.duplicate_rules;
        let mut findings = Vec::new();

        // Full corpus, not the changed-narrowed scope.
        let corpus: Vec<&String> = ctx
            .targets
            .css_files
            .iter()
            .chain(ctx.targets.css_module_files.iter())
            .collect();

        let mut by_signature: BTreeMap<String, Vec<RuleSite>> = BTreeMap::new();
        let mut parsed: Vec<(String, Vec<CssRule>)> = Vec::new();

        for file in &corpus {
            let content = match std::fs::read_to_string(ctx.root.join(file)) {
                Ok(c) => c,
                Err(_) => continue, // unreadable files contribute nothing
            };
            let rules = parse_rules(&content);
            for rule in &rules {
                if rule.declarations.len() < cfg.min_declarations {
                    continue;
                }
                by_signature
                    .entry(signature(rule))
                    .or_default()
                    .push(RuleSite {
                        file: (*file).clone(),
                        selector: rule.selector.clone(),
                        line: rule.line,
                    });
            }
            parsed.push(((*file).clone(), rules));
        }

        findings.extend(duplicate_findings(ctx, &by_signature));
        for (file, rules) in &parsed {
            if ctx.targets.in_changed_scope(file) {
                findings.extend(conflict_findings(file, rules));
            }
        }

        let stats = json!({
            "filesScanned": corpus.len(),
            "signatureGroups": by_signature.len(),
        });

        Ok(ToolRunResult {
            findings,
            stats: Some(stats),
            artifacts: Vec::new(),
        })
    }
}

/// Canonical signature: sorted `property:value` pairs joined with `;`.
fn signature(rule: &CssRule) -> String {
    let mut pairs: Vec<String> = rule
        .declarations
        .iter()
        .map(|d| format!("{}:{}", d.property, d.value))
        .collect();
    pairs.sort();
    pairs.join(";")
}

fn duplicate_findings(
    ctx: &ToolContext,
    by_signature: &BTreeMap<String, Vec<RuleSite>>,
) -> Vec<Finding> {
    let mut findings = Vec::new();

    for (sig, sites) in by_signature {
        let mut files: Vec<&str> = sites.iter().map(|s| s.file.as_str()).collect();
        files.sort();
        files.dedup();
        let mut selectors: Vec<&str> = sites.iter().map(|s| s.selector.as_str()).collect();
        selectors.sort();
        selectors.dedup();

        if files.len() < 2 && selectors.len() < 2 {
            continue;
        }
        if !sites.iter().any(|s| ctx.targets.in_changed_scope(&s.file)) {
            continue;
        }

        // One finding per involved file, referencing the others.
        for file in &files {
            let first = sites.iter().find(|s| s.file == *file).unwrap();
            let others: Vec<&str> = files.iter().filter(|f| *f != file).copied().collect();
            let where_else = if others.is_empty() {
                format!("{} selectors in this file", selectors.len())
            } else {
                format!("also in {}", others.join(", "))
            };
            findings.push(
                Finding::new(
                    ID,
                    "duplicate-rule-block",
                    Severity::Warn,
                    format!(
                        "Rule block `{}` duplicates an identical declaration set ({})",
                        first.selector, where_else
                    ),
                )
                .with_file(*file)
                .with_line(first.line as u32)
                .with_hint("Extract the shared declarations into one rule or a composable class")
                .with_data(json!({
                    "signature": sig,
                    "files": files,
                    "selectors": selectors,
                }))
                .with_fingerprint(sig),
            );
        }
    }

    findings
}

fn conflict_findings(file: &str, rules: &[CssRule]) -> Vec<Finding> {
    // (selector, property) -> distinct values in block order
    let mut values: BTreeMap<(String, String), Vec<String>> = BTreeMap::new();
    let mut first_line: BTreeMap<String, usize> = BTreeMap::new();

    for rule in rules {
        first_line.entry(rule.selector.clone()).or_insert(rule.line);
        for decl in &rule.declarations {
            let entry = values
                .entry((rule.selector.clone(), decl.property.clone()))
                .or_default();
            if !entry.contains(&decl.value) {
                entry.push(decl.value.clone());
            }
        }
    }

    let mut findings = Vec::new();
    for ((selector, property), vals) in values {
        if vals.len() < 2 {
            continue;
        }
        let line = first_line.get(&selector).copied().unwrap_or(1);
        let mut sorted_vals = vals.clone();
        sorted_vals.sort();
        findings.push(
            Finding::new(
                ID,
                "conflicting-selector",
                Severity::Warn,
                format!(
                    "Selector `{}` sets `{}` to conflicting values: {}",
                    selector,
                    property,
                    vals.join(", ")
                ),
            )
            .with_file(file)
            .with_line(line as u32)
            .with_hint("Later blocks silently win; merge the blocks or split the selector")
            .with_data(json!({
                "selector": selector,
                "property": property,
                "values": vals,
            }))
            .with_fingerprint(&format!("{}|{}|{}", selector, property, sorted_vals.join(","))),
        );
    }

    findings
}
