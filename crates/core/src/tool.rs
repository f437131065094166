//! Tool plugin contract and built-in registry
//!
//! Every analyzer is a `Tool` implementation dispatched explicitly by the
//! orchestrator. The scope sum type replaces duck-typed scope objects so
//! dispatch is exhaustive at compile time.

use crate::config::Config;
use crate::finding::{Finding, Severity, ToolRunResult};
use crate::index::WorkspaceIndex;
use crate::log::Logger;
use crate::options::ResolvedOptions;
use crate::targets::{FileKind, TargetSet};
use anyhow::Result;
use std::path::Path;

/// Audit tools report; fix tools mutate. Fix tools are excluded from
/// selection unless explicitly forced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolCategory {
    Audit,
    Fix,
}

/// What part of the target universe a tool wants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolScope {
    /// A pre-filtered file list of the declared kinds. Changed mode
    /// narrows the list to changed files.
    Files { kinds: &'static [FileKind] },
    /// CSS-module entities: the impacted set in changed mode, the full
    /// set otherwise. `impacted_by` names the file kinds whose changes
    /// pull an artifact into the impacted set.
    Entities { impacted_by: &'static [FileKind] },
    /// The unfiltered full target set, ignoring changed-mode narrowing.
    Global,
}

/// Per-tool view computed by the orchestrator from scope + targets.
#[derive(Debug, Clone, Default)]
pub struct ScopedTargets {
    /// Files scope: matching files (changed-narrowed in changed mode)
    pub files: Vec<String>,
    /// Entities scope: artifact paths to analyze
    pub entities: Vec<String>,
}

/// Read-only execution context handed to every tool. One per run.
pub struct ToolContext<'a> {
    pub root: &'a Path,
    pub config: &'a Config,
    pub options: &'a ResolvedOptions,
    /// The full target universe (cross-file tools need it even in
    /// changed mode)
    pub targets: &'a TargetSet,
    /// This tool's scoped view
    pub scoped: ScopedTargets,
    pub index: Option<&'a WorkspaceIndex>,
    pub log: &'a Logger,
}

/// The declarative analyzer contract.
///
/// `run` must not fail just because there is nothing to do; it returns
/// empty findings instead. A returned `Err` is caught by the orchestrator,
/// logged, and contributes zero findings.
pub trait Tool: Send + Sync {
    /// Stable analyzer id, kebab-case (e.g. "duplicate-rules")
    fn id(&self) -> &'static str;

    /// Human-readable title for report output
    fn title(&self) -> &'static str;

    fn category(&self) -> ToolCategory {
        ToolCategory::Audit
    }

    fn scope(&self) -> ToolScope;

    fn default_enabled(&self) -> bool {
        true
    }

    fn run(&self, ctx: &ToolContext) -> Result<ToolRunResult>;

    /// Whether a finding should enter the baseline on refresh.
    /// Default policy: accept everything except info-level noise.
    fn baseline_include(&self, finding: &Finding, _ctx: &ToolContext) -> bool {
        finding.severity != Severity::Info
    }
}

/// All built-in tools in registration (execution) order.
pub fn builtin_tools() -> Vec<Box<dyn Tool>> {
    vec![
        Box::new(crate::tools::duplicate_rules::DuplicateRulesTool),
        Box::new(crate::tools::unused_classes::UnusedClassesTool),
        Box::new(crate::tools::module_location::ModuleLocationTool),
        Box::new(crate::tools::bundle_size::BundleSizeTool),
    ]
}

/// Compute a tool's scoped target view.
pub fn scoped_targets(
    scope: ToolScope,
    targets: &TargetSet,
    index: Option<&WorkspaceIndex>,
) -> ScopedTargets {
    match scope {
        ToolScope::Files { kinds } => {
            let mut files = Vec::new();
            for kind in kinds {
                for file in targets.files_of_kind(*kind) {
                    if targets.in_changed_scope(file) {
                        files.push(file.clone());
                    }
                }
            }
            files.sort();
            files.dedup();
            ScopedTargets {
                files,
                entities: Vec::new(),
            }
        }
        ToolScope::Entities { .. } => {
            let entities = match index {
                Some(idx) => idx.artifacts_in_scope(targets),
                None => targets.css_module_files.clone(),
            };
            ScopedTargets {
                files: Vec::new(),
                entities,
            }
        }
        ToolScope::Global => ScopedTargets {
            files: targets.all_files.clone(),
            entities: Vec::new(),
        },
    }
}
