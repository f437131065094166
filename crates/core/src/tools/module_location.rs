//! CSS-module location policy
//!
//! CSS modules must live next to the components that own them; a module
//! outside the allowed directory prefixes is a structural violation.

use crate::finding::{Finding, Severity, ToolRunResult};
use crate::targets::FileKind;
use crate::tool::{Tool, ToolContext, ToolScope};
use anyhow::Result;
use serde_json::json;

pub struct ModuleLocationTool;

const ID: &str = "module-location";

impl Tool for ModuleLocationTool {
    fn id(&self) -> &'static str {
        ID
    }

    fn title(&self) -> &'static str {
        "CSS-module location policy"
    }

    fn scope(&self) -> ToolScope {
        ToolScope::Files {
            kinds: &[FileKind::CssModule],
        }
    }

    fn run(&self, ctx: &ToolContext) -> Result<ToolRunResult> {
        let cfg = &ctx.config.tools.module_location;
        let allowed: Vec<String> = cfg
            .allowed_dirs
            .iter()
            .map(|d| format!("{}/", d.trim_end_matches('/')))
            .collect();

        let mut findings = Vec::new();
        for file in &ctx.scoped.files {
            if allowed.iter().any(|prefix| file.starts_with(prefix)) {
                continue;
            }
            findings.push(
                Finding::new(
                    ID,
                    "misplaced-css-module",
                    Severity::Warn,
                    format!(
                        "CSS module outside allowed directories ({})",
                        cfg.allowed_dirs.join(", ")
                    ),
                )
                .with_file(file.clone())
                .with_hint("Move the module next to the component that owns it")
                .with_data(json!({ "allowedDirs": cfg.allowed_dirs }))
                .with_fingerprint("location"),
            );
        }

        Ok(ToolRunResult::from_findings(findings))
    }
}
