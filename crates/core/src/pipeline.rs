//! Orchestrator: wires options, targets, index, tools, baseline, and report

use crate::baseline::{
    filter_against_baseline, read_baseline, update_baseline, write_baseline, BaselinePartition,
};
use crate::config::Config;
use crate::finding::{dedup_findings, fingerprint, Artifact, Finding, Severity};
use crate::gitdiff::{detect_changed_files, DiffMethod};
use crate::index::{build_index, WorkspaceIndex};
use crate::log::Logger;
use crate::options::ResolvedOptions;
use crate::report::{build_report, write_html, write_json, Report};
use crate::targets::{collect_files, PatternSet, TargetMode, TargetSet};
use crate::tool::{scoped_targets, ScopedTargets, Tool, ToolCategory, ToolContext, ToolScope};
use anyhow::{bail, Result};
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

/// The result of one audit run.
pub struct AuditOutcome {
    pub report: Report,
    /// 0 unless new findings crossed the fail-on threshold
    pub exit_code: i32,
}

/// Run the full audit pipeline against `root` using the built-in tool
/// registry.
pub fn run_audit(root: &Path, options: &ResolvedOptions, config: &Config) -> Result<AuditOutcome> {
    run_audit_with_tools(root, options, config, crate::tool::builtin_tools())
}

/// Like [`run_audit`] but with an explicit registry, the seam used by
/// integration tests to inject tool doubles.
pub fn run_audit_with_tools(
    root: &Path,
    options: &ResolvedOptions,
    config: &Config,
    registry: Vec<Box<dyn Tool>>,
) -> Result<AuditOutcome> {
    let log = Logger::new(options.quiet);

    // Refreshing a baseline from a partial view would prune entries for
    // untouched but still-broken files.
    if options.update_baseline && options.changed && !options.force {
        bail!("--update-baseline with --changed requires --force: a changed-only scan cannot refresh the whole baseline");
    }

    for unknown in config.unknown_tool_ids() {
        log.warn(&format!(
            "config section [tools.{}] does not match any known tool",
            unknown
        ));
    }

    // ── Targets ──────────────────────────────────────────────────
    let include: Vec<String> = config
        .targets
        .include
        .iter()
        .chain(options.include.iter())
        .cloned()
        .collect();
    let exclude: Vec<String> = config
        .targets
        .exclude
        .iter()
        .chain(options.exclude.iter())
        .cloned()
        .collect();
    let patterns = PatternSet::compile(&include, &exclude)?;

    let all_files = collect_files(root, &patterns)?;
    log.step(&format!("Collected {} candidate file(s)", all_files.len()));

    let (mode, since_ref, changed_files) = if options.changed {
        match detect_changed_files(root, &options.since) {
            Ok(detection) => {
                let changed: Vec<String> = detection
                    .files
                    .into_iter()
                    .filter(|f| all_files.binary_search(f).is_ok())
                    .collect();
                let method = match detection.method {
                    DiffMethod::MergeBase => "merge-base",
                    DiffMethod::Direct => "direct",
                };
                log.step(&format!(
                    "{} changed file(s) since {} ({} diff)",
                    changed.len(),
                    options.since,
                    method
                ));
                (
                    TargetMode::Changed,
                    Some(options.since.clone()),
                    changed,
                )
            }
            Err(e) => {
                log.warn(&format!(
                    "changed-file detection against '{}' failed ({}) — falling back to a full scan",
                    options.since, e
                ));
                (TargetMode::Full, None, Vec::new())
            }
        }
    } else {
        (TargetMode::Full, None, Vec::new())
    };

    let targets = TargetSet::new(mode, since_ref, changed_files, all_files);

    // ── Tool selection ───────────────────────────────────────────
    let selected = select_tools(&registry, options, config, &log);
    if selected.is_empty() {
        log.warn("no tools selected — nothing to do");
    }

    // ── Index (lazy) ─────────────────────────────────────────────
    let needs_index = selected
        .iter()
        .any(|&i| matches!(registry[i].scope(), ToolScope::Entities { .. }));
    let index: Option<WorkspaceIndex> = if needs_index {
        log.step(&format!(
            "Indexing imports across {} source file(s)",
            targets.source_files.len()
        ));
        Some(build_index(root, &targets, &config.index.aliases, &log))
    } else {
        None
    };

    // ── Tool loop ────────────────────────────────────────────────
    let mut all_findings: Vec<Finding> = Vec::new();
    let mut artifacts: BTreeMap<String, Vec<Artifact>> = BTreeMap::new();
    let mut tools_ran: BTreeSet<String> = BTreeSet::new();

    for &i in &selected {
        let tool = &registry[i];
        let scoped = scoped_targets(tool.scope(), &targets, index.as_ref());
        let ctx = ToolContext {
            root,
            config,
            options,
            targets: &targets,
            scoped,
            index: index.as_ref(),
            log: &log,
        };
        match tool.run(&ctx) {
            Ok(result) => {
                log.step(&format!(
                    "{}: {} finding(s)",
                    tool.id(),
                    result.findings.len()
                ));
                all_findings.extend(result.findings);
                if !result.artifacts.is_empty() {
                    artifacts.insert(tool.id().to_string(), result.artifacts);
                }
                tools_ran.insert(tool.id().to_string());
            }
            Err(e) => {
                // One tool's failure never aborts the run; a failed tool
                // also does not count as "ran" for baseline refresh.
                log.warn(&format!("tool {} failed: {}", tool.id(), e));
            }
        }
    }

    // ── Normalize + dedup ────────────────────────────────────────
    for finding in &mut all_findings {
        if finding.fingerprint.is_empty() {
            finding.fingerprint = fingerprint(
                &finding.tool,
                &finding.rule_id,
                finding.file.as_deref().unwrap_or(""),
                &finding.message,
            );
        }
    }
    let mut all_findings = dedup_findings(all_findings);
    all_findings.sort_by(|a, b| {
        (&a.file, a.line, &a.tool, &a.rule_id).cmp(&(&b.file, b.line, &b.tool, &b.rule_id))
    });

    // ── Baseline ─────────────────────────────────────────────────
    let partition = match &options.baseline_path {
        Some(path) => {
            let baseline = read_baseline(path, &log);
            if !baseline.entries.is_empty() {
                log.step(&format!(
                    "Baseline: {} accepted fingerprint(s)",
                    baseline.entries.len()
                ));
            }
            let partition = filter_against_baseline(all_findings.clone(), &baseline);

            if options.update_baseline {
                let neutral_ctx = ToolContext {
                    root,
                    config,
                    options,
                    targets: &targets,
                    scoped: ScopedTargets::default(),
                    index: index.as_ref(),
                    log: &log,
                };
                let include = |finding: &Finding| {
                    registry
                        .iter()
                        .find(|t| t.id() == finding.tool)
                        .map(|t| t.baseline_include(finding, &neutral_ctx))
                        .unwrap_or(finding.severity != Severity::Info)
                };
                // The refresh sees the run's FULL finding set, not the
                // filtered new subset.
                let updated = update_baseline(&baseline, &all_findings, &tools_ran, include);
                write_baseline(&updated, path)?;
                log.step(&format!(
                    "Baseline refreshed: {} entries",
                    updated.entries.len()
                ));
            }

            partition
        }
        None => BaselinePartition {
            new: all_findings.clone(),
            suppressed: Vec::new(),
        },
    };

    // ── Report + exit decision ───────────────────────────────────
    let tools_run: Vec<String> = selected
        .iter()
        .filter(|&&i| tools_ran.contains(registry[i].id()))
        .map(|&i| registry[i].id().to_string())
        .collect();

    let report = build_report(
        &targets,
        tools_run,
        partition.new,
        partition.suppressed,
        artifacts,
    );

    if let Some(path) = &options.output {
        write_json(&report, path)?;
        log.step(&format!("Report written to {}", path.display()));
    }
    if let Some(path) = &options.html {
        write_html(&report, path)?;
        log.step(&format!("HTML report written to {}", path.display()));
    }

    let failing = report
        .findings
        .iter()
        .any(|f| options.fail_on.matches(f.severity));
    let exit_code = if failing { 1 } else { 0 };

    Ok(AuditOutcome { report, exit_code })
}

/// Apply enable flags, allow/deny lists, and the fix-category gate.
/// Returns indices into the registry, preserving registration order.
fn select_tools(
    registry: &[Box<dyn Tool>],
    options: &ResolvedOptions,
    config: &Config,
    log: &Logger,
) -> Vec<usize> {
    let known: BTreeSet<&str> = registry.iter().map(|t| t.id()).collect();
    if let Some(allow) = &options.tools {
        for id in allow {
            if !known.contains(id.as_str()) {
                log.warn(&format!("--tools names unknown tool '{}'", id));
            }
        }
    }
    for id in &options.skip_tools {
        if !known.contains(id.as_str()) {
            log.warn(&format!("--skip-tools names unknown tool '{}'", id));
        }
    }

    let mut selected = Vec::new();
    for (i, tool) in registry.iter().enumerate() {
        let id = tool.id();

        if options.skip_tools.iter().any(|s| s == id) {
            continue;
        }

        let explicitly_allowed = options
            .tools
            .as_ref()
            .map(|allow| allow.iter().any(|t| t == id));
        match explicitly_allowed {
            Some(false) => continue,
            Some(true) => {}
            None => {
                let enabled = config.tool_enabled(id).unwrap_or(tool.default_enabled());
                if !enabled {
                    continue;
                }
            }
        }

        if tool.category() == ToolCategory::Fix && !options.force_fix {
            if explicitly_allowed == Some(true) {
                log.warn(&format!(
                    "fix tool '{}' skipped — rerun with --force-fix to allow it",
                    id
                ));
            }
            continue;
        }

        selected.push(i);
    }
    selected
}
