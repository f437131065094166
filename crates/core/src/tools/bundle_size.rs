//! Built CSS bundle size threshold check
//!
//! Global scope: the whole-bundle budget is meaningless against a partial
//! file set, so changed-mode narrowing never applies here.

use crate::finding::{Artifact, Finding, Severity, ToolRunResult};
use crate::tool::{Tool, ToolContext, ToolScope};
use anyhow::Result;
use serde_json::json;

pub struct BundleSizeTool;

const ID: &str = "bundle-size";

impl Tool for BundleSizeTool {
    fn id(&self) -> &'static str {
        ID
    }

    fn title(&self) -> &'static str {
        "CSS bundle size"
    }

    fn scope(&self) -> ToolScope {
        ToolScope::Global
    }

    fn run(&self, ctx: &ToolContext) -> Result<ToolRunResult> {
        let cfg = &ctx.config.tools.bundle_size;

        let pattern = ctx.root.join(&cfg.bundle_glob);
        let pattern = pattern.to_string_lossy();

        let mut bundle_files: Vec<(String, u64)> = Vec::new();
        if let Ok(entries) = glob::glob(&pattern) {
            for entry in entries.flatten() {
                if let Ok(meta) = std::fs::metadata(&entry) {
                    if meta.is_file() {
                        let rel = crate::paths::normalize_rel(ctx.root, &entry);
                        bundle_files.push((rel, meta.len()));
                    }
                }
            }
        }
        bundle_files.sort();

        let total: u64 = bundle_files.iter().map(|(_, size)| size).sum();

        let mut findings = Vec::new();
        if bundle_files.is_empty() {
            // Nothing built yet: a warning, never a finding.
            ctx.log.warn(&format!(
                "bundle-size: no bundle files match '{}' — nothing to check yet",
                cfg.bundle_glob
            ));
        } else if total > cfg.max_bytes {
            let delta = total - cfg.max_bytes;
            findings.push(
                Finding::new(
                    ID,
                    "bundle-over-limit",
                    Severity::Error,
                    format!(
                        "CSS bundle is {} bytes, {} over the {} byte limit",
                        total, delta, cfg.max_bytes
                    ),
                )
                .with_hint(format!(
                    "Reduce the built CSS by at least {} bytes (split routes, drop unused rules)",
                    delta
                ))
                .with_data(json!({
                    "totalBytes": total,
                    "limitBytes": cfg.max_bytes,
                    "deltaBytes": delta,
                }))
                .with_fingerprint("total"),
            );
        }

        let artifact = Artifact {
            name: "css-bundle-size".to_string(),
            path: None,
            summary: format!("{} bundle file(s), {} bytes total", bundle_files.len(), total),
            data: Some(json!({
                "totalBytes": total,
                "limitBytes": cfg.max_bytes,
                "files": bundle_files
                    .iter()
                    .map(|(path, size)| json!({ "path": path, "bytes": size }))
                    .collect::<Vec<_>>(),
            })),
        };

        Ok(ToolRunResult {
            findings,
            stats: Some(json!({ "bundleFiles": bundle_files.len(), "totalBytes": total })),
            artifacts: vec![artifact],
        })
    }
}
