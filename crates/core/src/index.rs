//! Workspace cross-reference index: which sources import which CSS modules
//!
//! Built lazily, once per run, never cached across runs: staleness is a
//! worse failure mode than the bounded rebuild cost of a CI step.

use crate::log::Logger;
use crate::paths::lexical_normalize;
use crate::targets::{TargetMode, TargetSet};
use crate::tsparse::TsParser;
use rayon::prelude::*;
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

/// Importer/artifact edges plus, in changed mode, the impacted-artifact set.
#[derive(Debug, Clone, Default)]
pub struct WorkspaceIndex {
    /// CSS-module artifact → source files that import it
    pub importers_of: BTreeMap<String, BTreeSet<String>>,
    /// Source file → CSS-module artifacts it imports
    pub imports_of: BTreeMap<String, BTreeSet<String>>,
    /// Changed mode only: changed artifacts plus artifacts imported by
    /// changed sources
    pub impacted_artifacts: Option<BTreeSet<String>>,
}

impl WorkspaceIndex {
    pub fn importers(&self, artifact: &str) -> impl Iterator<Item = &String> {
        self.importers_of.get(artifact).into_iter().flatten()
    }

    /// The artifact set a tool with entity scope should analyze.
    pub fn artifacts_in_scope<'a>(&'a self, targets: &'a TargetSet) -> Vec<String> {
        match &self.impacted_artifacts {
            Some(impacted) => impacted.iter().cloned().collect(),
            None => targets.css_module_files.clone(),
        }
    }
}

fn is_css_module_specifier(spec: &str) -> bool {
    spec.ends_with(".module.css") || spec.ends_with(".module.scss")
}

/// Resolve an import specifier to a root-relative artifact path.
/// Supports relative specifiers and configured alias prefixes; package
/// imports resolve to None.
fn resolve_specifier(
    source_file: &str,
    spec: &str,
    aliases: &BTreeMap<String, String>,
) -> Option<String> {
    if spec.starts_with("./") || spec.starts_with("../") {
        let dir = match source_file.rfind('/') {
            Some(pos) => &source_file[..pos],
            None => "",
        };
        let joined = if dir.is_empty() {
            spec.to_string()
        } else {
            format!("{}/{}", dir, spec)
        };
        return Some(lexical_normalize(&joined));
    }
    for (prefix, replacement) in aliases {
        if let Some(rest) = spec.strip_prefix(prefix) {
            return Some(lexical_normalize(&format!("{}{}", replacement, rest)));
        }
    }
    None
}

/// Build the index by parsing every source file's import declarations.
/// Edges are only recorded for artifacts present in the target corpus.
pub fn build_index(
    root: &Path,
    targets: &TargetSet,
    aliases: &BTreeMap<String, String>,
    log: &Logger,
) -> WorkspaceIndex {
    let known_artifacts: BTreeSet<&String> = targets.css_module_files.iter().collect();

    // Parse in parallel; each worker owns its parser.
    let parsed: Vec<(String, Vec<String>)> = targets
        .source_files
        .par_iter()
        .filter_map(|source| {
            let parser = TsParser::new();
            let facts = parser.parse_file(&root.join(source)).ok()?;
            let artifacts: Vec<String> = facts
                .imports
                .iter()
                .filter(|imp| is_css_module_specifier(&imp.specifier))
                .filter_map(|imp| resolve_specifier(source, &imp.specifier, aliases))
                .collect();
            Some((source.clone(), artifacts))
        })
        .collect();

    let parse_failures = targets.source_files.len().saturating_sub(parsed.len());
    if parse_failures > 0 {
        log.note(&format!(
            "{} source file(s) skipped by the indexer (unreadable or unparsable)",
            parse_failures
        ));
    }

    let mut index = WorkspaceIndex::default();
    for (source, artifacts) in parsed {
        for artifact in artifacts {
            if !known_artifacts.contains(&artifact) {
                continue;
            }
            index
                .importers_of
                .entry(artifact.clone())
                .or_default()
                .insert(source.clone());
            index
                .imports_of
                .entry(source.clone())
                .or_default()
                .insert(artifact);
        }
    }

    if targets.mode == TargetMode::Changed {
        let mut impacted: BTreeSet<String> = BTreeSet::new();
        for changed in &targets.changed_files {
            if known_artifacts.contains(changed) {
                impacted.insert(changed.clone());
            }
            if let Some(artifacts) = index.imports_of.get(changed) {
                impacted.extend(artifacts.iter().cloned());
            }
        }
        index.impacted_artifacts = Some(impacted);
    }

    index
}
