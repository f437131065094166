//! Unused CSS-module class detection via usage propagation
//!
//! Declared classes are matched against member/subscript/destructuring
//! accesses in every importer, then usage is propagated through
//! `composes:` references (same-file and cross-file) with an explicit
//! worklist until the frontier is empty. Classes reached by a dynamic
//! `styles[expr]` access cannot be proven unused, so findings for that
//! module degrade to info.

use crate::cssparse::{parse_module, ModuleFacts};
use crate::finding::{Finding, Severity, ToolRunResult};
use crate::targets::FileKind;
use crate::tool::{Tool, ToolContext, ToolScope};
use crate::tsparse::TsParser;
use anyhow::Result;
use serde_json::json;
use std::collections::{BTreeSet, HashMap, HashSet, VecDeque};

pub struct UnusedClassesTool;

const ID: &str = "unused-classes";

impl Tool for UnusedClassesTool {
    fn id(&self) -> &'static str {
        ID
    }

    fn title(&self) -> &'static str {
        "Unused CSS-module classes"
    }

    fn scope(&self) -> ToolScope {
        ToolScope::Entities {
            impacted_by: &[FileKind::Source, FileKind::CssModule],
        }
    }

    fn run(&self, ctx: &ToolContext) -> Result<ToolRunResult> {
        let scope: BTreeSet<&String> = ctx.scoped.entities.iter().collect();
        if scope.is_empty() {
            return Ok(ToolRunResult::default());
        }

        // Parse facts for every module in the corpus: compose edges can
        // reach outside the scoped set in both directions.
        let mut facts: HashMap<String, ModuleFacts> = HashMap::new();
        for module in &ctx.targets.css_module_files {
            if let Ok(content) = std::fs::read_to_string(ctx.root.join(module)) {
                facts.insert(module.clone(), parse_module(&content));
            }
        }

        // Compose edges: using (module, class) implies using its targets.
        let mut compose_edges: HashMap<(String, String), Vec<(String, String)>> = HashMap::new();
        for (module, module_facts) in &facts {
            for class in &module_facts.classes {
                for reference in &class.composes {
                    let target_module = match &reference.from {
                        None => Some(module.clone()),
                        Some(spec) if spec == "global" => None,
                        Some(spec) => resolve_from(module, spec),
                    };
                    if let Some(target) = target_module {
                        if facts.contains_key(&target) {
                            compose_edges
                                .entry((module.clone(), class.name.clone()))
                                .or_default()
                                .push((target, reference.class_name.clone()));
                        }
                    }
                }
            }
        }

        // Modules whose direct usage matters: the scoped set plus any
        // module with a compose path into it (reverse reachability).
        let mut relevant: BTreeSet<String> = scope.iter().map(|m| (*m).to_string()).collect();
        let mut frontier: VecDeque<String> = relevant.iter().cloned().collect();
        while let Some(module) = frontier.pop_front() {
            for ((src_module, _), targets) in &compose_edges {
                if targets.iter().any(|(t, _)| *t == module) && relevant.insert(src_module.clone())
                {
                    frontier.push_back(src_module.clone());
                }
            }
        }

        // Direct usage seeds from importers' syntax trees.
        let parser = TsParser::new();
        let mut used: HashSet<(String, String)> = HashSet::new();
        let mut dynamic_modules: BTreeSet<String> = BTreeSet::new();
        let mut importer_facts_cache: HashMap<String, Option<crate::tsparse::SourceFacts>> =
            HashMap::new();

        for module in &relevant {
            let importers: Vec<String> = match ctx.index {
                Some(index) => index.importers(module).cloned().collect(),
                None => Vec::new(),
            };
            for importer in importers {
                let source_facts = importer_facts_cache
                    .entry(importer.clone())
                    .or_insert_with(|| parser.parse_file(&ctx.root.join(&importer)).ok());
                let Some(source_facts) = source_facts else {
                    continue;
                };

                // Local bindings bound to this module in this importer
                let bindings: HashSet<&str> = source_facts
                    .imports
                    .iter()
                    .filter(|imp| {
                        resolve_from_source(&importer, &imp.specifier, ctx)
                            .is_some_and(|resolved| resolved == *module)
                    })
                    .flat_map(|imp| imp.bindings.iter().map(|b| b.as_str()))
                    .collect();
                if bindings.is_empty() {
                    continue;
                }

                for access in &source_facts.property_accesses {
                    if bindings.contains(access.object.as_str()) {
                        used.insert((module.clone(), access.property.clone()));
                    }
                }
                for destructure in &source_facts.destructures {
                    if bindings.contains(destructure.object.as_str()) {
                        for property in &destructure.properties {
                            used.insert((module.clone(), property.clone()));
                        }
                    }
                }
                if source_facts
                    .dynamic_accesses
                    .iter()
                    .any(|d| bindings.contains(d.object.as_str()))
                {
                    dynamic_modules.insert(module.clone());
                }
            }
        }

        // Fixed-point propagation: a used class pulls in everything it
        // composes. Terminates when the worklist drains.
        let mut worklist: VecDeque<(String, String)> = used.iter().cloned().collect();
        while let Some(node) = worklist.pop_front() {
            if let Some(targets) = compose_edges.get(&node) {
                for target in targets {
                    if used.insert(target.clone()) {
                        worklist.push_back(target.clone());
                    }
                }
            }
        }

        let mut findings = Vec::new();
        let mut declared_in_scope = 0usize;
        for module in &scope {
            let Some(module_facts) = facts.get(*module) else {
                continue;
            };
            if module_facts.keep_all {
                continue;
            }
            let dynamic = dynamic_modules.contains(*module);
            declared_in_scope += module_facts.classes.len();
            for class in &module_facts.classes {
                if class.keep || used.contains(&((*module).clone(), class.name.clone())) {
                    continue;
                }
                let severity = if dynamic { Severity::Info } else { Severity::Warn };
                let message = if dynamic {
                    format!(
                        "Class `{}` is never referenced by name (dynamic access present, cannot prove unused)",
                        class.name
                    )
                } else {
                    format!("Class `{}` is declared but never used", class.name)
                };
                findings.push(
                    Finding::new(ID, "unused-class", severity, message)
                        .with_file((*module).clone())
                        .with_line(class.line as u32)
                        .with_hint(
                            "Remove the class, or mark it /* styleguard-keep */ if referenced indirectly",
                        )
                        .with_data(json!({ "class": class.name, "dynamicAccess": dynamic }))
                        .with_fingerprint(&class.name),
                );
            }
        }

        let stats = json!({
            "modulesAnalyzed": scope.len(),
            "classesDeclared": declared_in_scope,
            "classesUsed": used.len(),
        });

        Ok(ToolRunResult {
            findings,
            stats: Some(stats),
            artifacts: Vec::new(),
        })
    }
}

/// Resolve a `composes ... from` specifier relative to the composing module.
fn resolve_from(module: &str, spec: &str) -> Option<String> {
    if !(spec.starts_with("./") || spec.starts_with("../")) {
        return None;
    }
    let dir = match module.rfind('/') {
        Some(pos) => &module[..pos],
        None => "",
    };
    let joined = if dir.is_empty() {
        spec.to_string()
    } else {
        format!("{}/{}", dir, spec)
    };
    Some(crate::paths::lexical_normalize(&joined))
}

/// Resolve a TS import specifier relative to the importing source file,
/// honoring configured aliases.
fn resolve_from_source(source: &str, spec: &str, ctx: &ToolContext) -> Option<String> {
    if spec.starts_with("./") || spec.starts_with("../") {
        return resolve_from(source, spec);
    }
    for (prefix, replacement) in &ctx.config.index.aliases {
        if let Some(rest) = spec.strip_prefix(prefix) {
            return Some(crate::paths::lexical_normalize(&format!(
                "{}{}",
                replacement, rest
            )));
        }
    }
    None
}
