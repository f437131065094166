//! TypeScript/TSX front end using Tree-sitter
//!
//! Extracts the two facts the pipeline needs from source files: import
//! declarations (for the workspace index) and identifier accesses
//! (member, subscript, destructuring) for usage propagation.

use std::path::Path;
use thiserror::Error;
use tree_sitter::{Node, Parser, Tree};

/// Error types for parsing operations
#[derive(Error, Debug)]
pub enum ParseError {
    #[error("Failed to read file: {0}")]
    FileRead(#[from] std::io::Error),

    #[error("Failed to parse file: {0}")]
    ParseFailed(String),

    #[error("Tree-sitter error: {0}")]
    TreeSitter(String),
}

/// One `import ... from '...'` declaration.
#[derive(Debug, Clone)]
pub struct ImportDecl {
    /// The raw module specifier, quotes stripped
    pub specifier: String,
    /// Local names bound by this import (default binding, namespace
    /// binding, named-import locals). Empty for side-effect imports.
    pub bindings: Vec<String>,
    pub line: usize,
}

/// `object.property` or `object["property"]` with a literal key.
#[derive(Debug, Clone)]
pub struct PropertyAccess {
    pub object: String,
    pub property: String,
    pub line: usize,
}

/// `object[expr]` with a non-literal key; usage cannot be proven.
#[derive(Debug, Clone)]
pub struct DynamicAccess {
    pub object: String,
    pub line: usize,
}

/// `const { a, b } = object`.
#[derive(Debug, Clone)]
pub struct Destructure {
    pub object: String,
    pub properties: Vec<String>,
    pub line: usize,
}

/// Everything extracted from one source file.
#[derive(Debug, Clone, Default)]
pub struct SourceFacts {
    pub imports: Vec<ImportDecl>,
    pub property_accesses: Vec<PropertyAccess>,
    pub dynamic_accesses: Vec<DynamicAccess>,
    pub destructures: Vec<Destructure>,
}

/// TypeScript source parser (TSX grammar for .tsx/.jsx files)
pub struct TsParser {
    typescript: tree_sitter::Language,
    tsx: tree_sitter::Language,
}

impl Default for TsParser {
    fn default() -> Self {
        Self {
            typescript: tree_sitter_typescript::LANGUAGE_TYPESCRIPT.into(),
            tsx: tree_sitter_typescript::LANGUAGE_TSX.into(),
        }
    }
}

impl TsParser {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn parse_file(&self, file_path: &Path) -> Result<SourceFacts, ParseError> {
        let source = std::fs::read_to_string(file_path)?;
        let is_tsx = matches!(
            file_path.extension().and_then(|e| e.to_str()),
            Some("tsx") | Some("jsx")
        );
        self.parse_source(&source, is_tsx)
    }

    pub fn parse_source(&self, source: &str, is_tsx: bool) -> Result<SourceFacts, ParseError> {
        let tree = self.parse_tree(source, is_tsx)?;
        let mut facts = SourceFacts::default();
        let root = tree.root_node();

        let mut cursor = root.walk();
        for child in root.children(&mut cursor) {
            if child.kind() == "import_statement" {
                if let Some(import) = extract_import(&child, source) {
                    facts.imports.push(import);
                }
            }
        }

        extract_accesses(&root, source, &mut facts);
        Ok(facts)
    }

    fn parse_tree(&self, source: &str, is_tsx: bool) -> Result<Tree, ParseError> {
        let language = if is_tsx { &self.tsx } else { &self.typescript };
        let mut parser = Parser::new();
        parser
            .set_language(language)
            .map_err(|e| ParseError::TreeSitter(e.to_string()))?;
        parser
            .parse(source, None)
            .ok_or_else(|| ParseError::ParseFailed("Failed to parse TypeScript source".to_string()))
    }
}

fn node_text(node: &Node, source: &str) -> Option<String> {
    node.utf8_text(source.as_bytes()).ok().map(|s| s.to_string())
}

fn strip_quotes(s: &str) -> String {
    s.trim_matches(|c| c == '\'' || c == '"' || c == '`').to_string()
}

/// Extract an import_statement: module specifier plus the local bindings.
fn extract_import(node: &Node, source: &str) -> Option<ImportDecl> {
    let specifier = node
        .child_by_field_name("source")
        .and_then(|s| node_text(&s, source))
        .map(|s| strip_quotes(&s))?;

    let mut bindings = Vec::new();
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        if child.kind() == "import_clause" {
            extract_import_clause(&child, source, &mut bindings);
        }
    }

    Some(ImportDecl {
        specifier,
        bindings,
        line: node.start_position().row + 1,
    })
}

fn extract_import_clause(node: &Node, source: &str, bindings: &mut Vec<String>) {
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        match child.kind() {
            // Default import: import styles from './x.module.css'
            "identifier" => {
                if let Some(name) = node_text(&child, source) {
                    bindings.push(name);
                }
            }
            // Namespace import: import * as styles from './x.module.css'
            "namespace_import" => {
                let mut inner = child.walk();
                for ns_child in child.children(&mut inner) {
                    if ns_child.kind() == "identifier" {
                        if let Some(name) = node_text(&ns_child, source) {
                            bindings.push(name);
                        }
                    }
                }
            }
            // Named imports: import { a, b as c } from 'mod'
            "named_imports" => {
                let mut inner = child.walk();
                for spec in child.children(&mut inner) {
                    if spec.kind() != "import_specifier" {
                        continue;
                    }
                    // Local binding is the alias if present, else the name
                    let local = spec
                        .child_by_field_name("alias")
                        .or_else(|| spec.child_by_field_name("name"));
                    if let Some(name) = local.and_then(|n| node_text(&n, source)) {
                        bindings.push(name);
                    }
                }
            }
            _ => {}
        }
    }
}

/// Recursively walk the tree recording identifier accesses.
fn extract_accesses(node: &Node, source: &str, facts: &mut SourceFacts) {
    match node.kind() {
        "member_expression" => {
            let object = node.child_by_field_name("object");
            let property = node.child_by_field_name("property");
            if let (Some(obj), Some(prop)) = (object, property) {
                if obj.kind() == "identifier" && prop.kind() == "property_identifier" {
                    if let (Some(o), Some(p)) = (node_text(&obj, source), node_text(&prop, source))
                    {
                        facts.property_accesses.push(PropertyAccess {
                            object: o,
                            property: p,
                            line: node.start_position().row + 1,
                        });
                    }
                }
            }
        }
        "subscript_expression" => {
            if let Some(obj) = node.child_by_field_name("object") {
                if obj.kind() == "identifier" {
                    if let Some(o) = node_text(&obj, source) {
                        let index = node.child_by_field_name("index");
                        match index {
                            Some(idx) if idx.kind() == "string" => {
                                if let Some(text) = node_text(&idx, source) {
                                    facts.property_accesses.push(PropertyAccess {
                                        object: o,
                                        property: strip_quotes(&text),
                                        line: node.start_position().row + 1,
                                    });
                                }
                            }
                            _ => {
                                facts.dynamic_accesses.push(DynamicAccess {
                                    object: o,
                                    line: node.start_position().row + 1,
                                });
                            }
                        }
                    }
                }
            }
        }
        "variable_declarator" => {
            let name = node.child_by_field_name("name");
            let value = node.child_by_field_name("value");
            if let (Some(pattern), Some(val)) = (name, value) {
                if pattern.kind() == "object_pattern" && val.kind() == "identifier" {
                    if let Some(object) = node_text(&val, source) {
                        let properties = extract_pattern_keys(&pattern, source);
                        if !properties.is_empty() {
                            facts.destructures.push(Destructure {
                                object,
                                properties,
                                line: node.start_position().row + 1,
                            });
                        }
                    }
                }
            }
        }
        _ => {}
    }

    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        extract_accesses(&child, source, facts);
    }
}

/// Keys bound by an object_pattern: `{ a, b: renamed, c = default }`.
fn extract_pattern_keys(pattern: &Node, source: &str) -> Vec<String> {
    let mut keys = Vec::new();
    let mut cursor = pattern.walk();
    for child in pattern.children(&mut cursor) {
        match child.kind() {
            "shorthand_property_identifier_pattern" => {
                if let Some(name) = node_text(&child, source) {
                    keys.push(name);
                }
            }
            "pair_pattern" => {
                if let Some(key) = child
                    .child_by_field_name("key")
                    .and_then(|k| node_text(&k, source))
                {
                    keys.push(strip_quotes(&key));
                }
            }
            "object_assignment_pattern" => {
                // { foo = fallback }: the left side carries the key
                if let Some(left) = child.child_by_field_name("left") {
                    if let Some(name) = node_text(&left, source) {
                        keys.push(name);
                    }
                }
            }
            _ => {}
        }
    }
    keys
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_default_import() {
        let parser = TsParser::new();
        let facts = parser
            .parse_source("import styles from './button.module.css';\n", false)
            .unwrap();
        assert_eq!(facts.imports.len(), 1);
        assert_eq!(facts.imports[0].specifier, "./button.module.css");
        assert_eq!(facts.imports[0].bindings, vec!["styles"]);
    }

    #[test]
    fn extracts_member_and_subscript_access() {
        let parser = TsParser::new();
        let src = r#"
import styles from './a.module.css';
const a = styles.primary;
const b = styles["secondary"];
const c = styles[dynamicKey];
"#;
        let facts = parser.parse_source(src, false).unwrap();
        let props: Vec<&str> = facts
            .property_accesses
            .iter()
            .map(|p| p.property.as_str())
            .collect();
        assert!(props.contains(&"primary"));
        assert!(props.contains(&"secondary"));
        assert_eq!(facts.dynamic_accesses.len(), 1);
        assert_eq!(facts.dynamic_accesses[0].object, "styles");
    }

    #[test]
    fn extracts_destructuring() {
        let parser = TsParser::new();
        let src = "import styles from './a.module.css';\nconst { header, footer: f } = styles;\n";
        let facts = parser.parse_source(src, false).unwrap();
        assert_eq!(facts.destructures.len(), 1);
        assert_eq!(facts.destructures[0].object, "styles");
        assert_eq!(facts.destructures[0].properties, vec!["header", "footer"]);
    }

    #[test]
    fn parses_tsx_with_jsx() {
        let parser = TsParser::new();
        let src = r#"
import styles from './card.module.css';
export function Card() {
  return <div className={styles.card}>hi</div>;
}
"#;
        let facts = parser.parse_source(src, true).unwrap();
        assert_eq!(facts.imports.len(), 1);
        assert!(facts
            .property_accesses
            .iter()
            .any(|p| p.object == "styles" && p.property == "card"));
    }
}
