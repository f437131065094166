//! CSS front end: rule blocks, declarations, and CSS-module class facts
//!
//! A small block scanner rather than a full grammar: the pipeline only
//! needs selectors, property/value pairs, local class names, and
//! `composes:` references. Grouping at-rules (@media, @supports, @layer)
//! are descended into; other at-rules are skipped.

use regex::Regex;
use std::collections::{HashMap, HashSet};
use std::sync::LazyLock;

/// Inline marker that keeps a class even when it looks unused.
pub const KEEP_MARKER: &str = "styleguard-keep";
/// File-level marker that keeps every class in the file.
pub const KEEP_ALL_MARKER: &str = "styleguard-keep-all";

static CLASS_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\.([A-Za-z_][A-Za-z0-9_-]*)").unwrap());
static GLOBAL_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r":global\([^)]*\)").unwrap());

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Declaration {
    /// Lowercased property name
    pub property: String,
    pub value: String,
}

#[derive(Debug, Clone)]
pub struct CssRule {
    pub selector: String,
    pub declarations: Vec<Declaration>,
    /// 1-indexed line of the selector
    pub line: usize,
}

/// A `composes:` reference from one class to another.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComposesRef {
    pub class_name: String,
    /// None = same file; Some("./x.module.css") = cross-file;
    /// Some("global") = global scope (no local propagation)
    pub from: Option<String>,
}

/// A locally-declared CSS-module class.
#[derive(Debug, Clone)]
pub struct CssClass {
    pub name: String,
    pub line: usize,
    pub composes: Vec<ComposesRef>,
    /// Suppressed by an inline keep marker
    pub keep: bool,
}

#[derive(Debug, Clone, Default)]
pub struct ModuleFacts {
    pub classes: Vec<CssClass>,
    pub keep_all: bool,
}

/// Parse all rule blocks, descending into grouping at-rules.
pub fn parse_rules(content: &str) -> Vec<CssRule> {
    let stripped = strip_comments(content);
    let mut rules = Vec::new();
    parse_block(&stripped, 1, &mut rules);
    rules
}

/// Parse the class-level facts of a CSS module file.
pub fn parse_module(content: &str) -> ModuleFacts {
    let mut keep_lines: HashSet<usize> = HashSet::new();
    let mut keep_all = false;
    for (idx, line) in content.lines().enumerate() {
        if line.contains(KEEP_ALL_MARKER) {
            keep_all = true;
        } else if line.contains(KEEP_MARKER) {
            keep_lines.insert(idx + 1);
        }
    }

    let rules = parse_rules(content);
    let mut order: Vec<String> = Vec::new();
    let mut by_name: HashMap<String, CssClass> = HashMap::new();

    for rule in &rules {
        let local_selector = GLOBAL_RE.replace_all(&rule.selector, "");
        let composes: Vec<ComposesRef> = rule
            .declarations
            .iter()
            .filter(|d| d.property == "composes")
            .flat_map(|d| parse_composes_value(&d.value))
            .collect();
        let keep = keep_lines.contains(&rule.line)
            || (rule.line > 1 && keep_lines.contains(&(rule.line - 1)));

        for cap in CLASS_RE.captures_iter(&local_selector) {
            let name = cap[1].to_string();
            match by_name.get_mut(&name) {
                Some(existing) => {
                    // Same class declared again: merge compose edges,
                    // keep the earliest line.
                    for c in &composes {
                        if !existing.composes.contains(c) {
                            existing.composes.push(c.clone());
                        }
                    }
                    existing.keep |= keep;
                }
                None => {
                    order.push(name.clone());
                    by_name.insert(
                        name.clone(),
                        CssClass {
                            name,
                            line: rule.line,
                            composes: composes.clone(),
                            keep,
                        },
                    );
                }
            }
        }
    }

    ModuleFacts {
        classes: order
            .into_iter()
            .filter_map(|name| by_name.remove(&name))
            .collect(),
        keep_all,
    }
}

/// `composes: a b from './x.module.css'` → refs for a and b.
fn parse_composes_value(value: &str) -> Vec<ComposesRef> {
    let tokens: Vec<&str> = value.split_whitespace().collect();
    let from_pos = tokens.iter().position(|t| *t == "from");
    let (names, from) = match from_pos {
        Some(pos) => {
            let from = tokens
                .get(pos + 1)
                .map(|t| t.trim_matches(|c| c == '\'' || c == '"').to_string());
            (&tokens[..pos], from)
        }
        None => (&tokens[..], None),
    };
    names
        .iter()
        .map(|name| ComposesRef {
            class_name: (*name).to_string(),
            from: from.clone(),
        })
        .collect()
}

/// Replace comment bodies with spaces, preserving line structure so
/// recorded line numbers stay valid.
fn strip_comments(content: &str) -> String {
    let bytes: Vec<char> = content.chars().collect();
    let mut out = String::with_capacity(content.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == '/' && i + 1 < bytes.len() && bytes[i + 1] == '*' {
            out.push(' ');
            out.push(' ');
            i += 2;
            while i < bytes.len() {
                if bytes[i] == '*' && i + 1 < bytes.len() && bytes[i + 1] == '/' {
                    out.push(' ');
                    out.push(' ');
                    i += 2;
                    break;
                }
                out.push(if bytes[i] == '\n' { '\n' } else { ' ' });
                i += 1;
            }
        } else {
            out.push(bytes[i]);
            i += 1;
        }
    }
    out
}

/// Grouping at-rules whose body contains nested rules.
fn is_grouping_at_rule(prelude: &str) -> bool {
    let p = prelude.trim_start();
    p.starts_with("@media")
        || p.starts_with("@supports")
        || p.starts_with("@layer")
        || p.starts_with("@container")
}

/// Scan one block level, appending parsed rules. `start_line` is the
/// 1-indexed line of the first character of `content`.
fn parse_block(content: &str, start_line: usize, rules: &mut Vec<CssRule>) {
    let chars: Vec<char> = content.chars().collect();
    let mut pos = 0usize;
    let mut line = start_line;
    let mut prelude = String::new();
    let mut prelude_line = line;
    let mut prelude_started = false;

    while pos < chars.len() {
        let c = chars[pos];
        match c {
            '\n' => {
                line += 1;
                prelude.push(c);
                pos += 1;
            }
            '{' => {
                let (body, body_lines, next_pos) = capture_block(&chars, pos + 1);
                if is_grouping_at_rule(&prelude) {
                    parse_block(&body, line, rules);
                } else if !prelude.trim().starts_with('@') {
                    let selector = collapse_ws(&prelude);
                    if !selector.is_empty() {
                        rules.push(CssRule {
                            selector,
                            declarations: parse_declarations(&body),
                            line: prelude_line,
                        });
                    }
                }
                line += body_lines;
                pos = next_pos;
                prelude.clear();
                prelude_started = false;
            }
            ';' => {
                // Block-less at-rule (@import, @charset) or stray semicolon
                prelude.clear();
                prelude_started = false;
                pos += 1;
            }
            _ => {
                if !prelude_started && !c.is_whitespace() {
                    prelude_started = true;
                    prelude_line = line;
                }
                prelude.push(c);
                pos += 1;
            }
        }
    }
}

/// Capture a brace-balanced block body starting just after `{`.
/// Returns (body, newline count consumed including the closing `}`, next position).
fn capture_block(chars: &[char], mut pos: usize) -> (String, usize, usize) {
    let mut depth = 1usize;
    let mut body = String::new();
    let mut newlines = 0usize;
    let mut in_string: Option<char> = None;

    while pos < chars.len() {
        let c = chars[pos];
        if let Some(quote) = in_string {
            if c == quote {
                in_string = None;
            }
        } else {
            match c {
                '\'' | '"' => in_string = Some(c),
                '{' => depth += 1,
                '}' => {
                    depth -= 1;
                    if depth == 0 {
                        return (body, newlines, pos + 1);
                    }
                }
                _ => {}
            }
        }
        if c == '\n' {
            newlines += 1;
        }
        body.push(c);
        pos += 1;
    }

    (body, newlines, pos)
}

/// Split a rule body into declarations. Segments containing braces come
/// from nested blocks and are skipped.
fn parse_declarations(body: &str) -> Vec<Declaration> {
    let mut declarations = Vec::new();
    for segment in body.split(';') {
        if segment.contains('{') || segment.contains('}') {
            continue;
        }
        if let Some((property, value)) = segment.split_once(':') {
            let property = property.trim().to_lowercase();
            let value = collapse_ws(value);
            if !property.is_empty() && !value.is_empty() {
                declarations.push(Declaration { property, value });
            }
        }
    }
    declarations
}

fn collapse_ws(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_simple_rules() {
        let css = ".btn {\n  color: red;\n  padding: 4px;\n}\n.other { color: blue }\n";
        let rules = parse_rules(css);
        assert_eq!(rules.len(), 2);
        assert_eq!(rules[0].selector, ".btn");
        assert_eq!(rules[0].line, 1);
        assert_eq!(rules[0].declarations.len(), 2);
        assert_eq!(rules[0].declarations[0].property, "color");
        assert_eq!(rules[0].declarations[0].value, "red");
        assert_eq!(rules[1].line, 5);
    }

    #[test]
    fn descends_into_media_blocks() {
        let css = "@media (max-width: 600px) {\n  .narrow { display: none; }\n}\n";
        let rules = parse_rules(css);
        assert_eq!(rules.len(), 1);
        assert_eq!(rules[0].selector, ".narrow");
        assert_eq!(rules[0].line, 2);
    }

    #[test]
    fn comments_do_not_shift_lines() {
        let css = "/* header\nstyles */\n.btn { color: red; }\n";
        let rules = parse_rules(css);
        assert_eq!(rules[0].line, 3);
    }

    #[test]
    fn module_classes_with_composes() {
        let css = r#"
.base { padding: 2px; }
.fancy {
  composes: base;
  color: teal;
}
.imported {
  composes: chip from './chips.module.css';
}
"#;
        let facts = parse_module(css);
        let names: Vec<&str> = facts.classes.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["base", "fancy", "imported"]);
        let fancy = &facts.classes[1];
        assert_eq!(fancy.composes.len(), 1);
        assert_eq!(fancy.composes[0].class_name, "base");
        assert_eq!(fancy.composes[0].from, None);
        let imported = &facts.classes[2];
        assert_eq!(
            imported.composes[0].from.as_deref(),
            Some("./chips.module.css")
        );
    }

    #[test]
    fn keep_markers() {
        let css = "/* styleguard-keep */\n.kept { color: red; }\n.plain { color: blue; }\n";
        let facts = parse_module(css);
        assert!(facts.classes[0].keep);
        assert!(!facts.classes[1].keep);
        assert!(!facts.keep_all);

        let all = "/* styleguard-keep-all */\n.a { color: red; }\n";
        assert!(parse_module(all).keep_all);
    }

    #[test]
    fn global_selectors_are_not_local_classes() {
        let css = ".local :global(.vendor-class) { color: red; }\n";
        let facts = parse_module(css);
        let names: Vec<&str> = facts.classes.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["local"]);
    }
}
