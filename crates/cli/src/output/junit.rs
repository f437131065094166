//! JUnit XML output for CI platforms that consume test reports
//!
//! One testcase per new finding: errors become `<failure>`, warnings are
//! recorded as passing cases with `<system-out>`, info passes silently.

use styleguard_core::{Report, Severity};

pub fn render(report: &Report) -> String {
    let findings = &report.findings;
    let failure_count = findings
        .iter()
        .filter(|f| f.severity == Severity::Error)
        .count();
    let testcase_count = findings.len().max(1);

    let mut xml = String::from("<?xml version=\"1.0\" encoding=\"UTF-8\"?>");
    xml.push_str(&format!(
        "<testsuites name=\"styleguard\" tests=\"{}\" failures=\"{}\" errors=\"0\" skipped=\"0\">",
        testcase_count, failure_count
    ));
    xml.push_str(&format!(
        "<testsuite name=\"styleguard\" tests=\"{}\" failures=\"{}\" errors=\"0\" skipped=\"0\">",
        testcase_count, failure_count
    ));

    if findings.is_empty() {
        // Empty suite: include a placeholder passing test
        xml.push_str("<testcase name=\"no findings\" classname=\"styleguard\"/>");
    } else {
        for finding in findings {
            let classname = format!("styleguard.{}.{}", finding.tool, finding.rule_id);
            let location = match (&finding.file, finding.line) {
                (Some(file), Some(line)) => format!("{}:{}", file, line),
                (Some(file), None) => file.clone(),
                _ => String::new(),
            };
            let name = if location.is_empty() {
                finding.message.clone()
            } else {
                format!("{} ({})", finding.message, location)
            };

            xml.push_str(&format!(
                "<testcase name=\"{}\" classname=\"{}\"",
                escape_xml(&name),
                escape_xml(&classname)
            ));

            match finding.severity {
                Severity::Error => {
                    xml.push('>');
                    xml.push_str(&format!(
                        "<failure message=\"{}\">",
                        escape_xml(&finding.message)
                    ));
                    if let Some(hint) = &finding.hint {
                        xml.push_str(&escape_xml(hint));
                    }
                    xml.push_str("</failure></testcase>");
                }
                Severity::Warn => {
                    xml.push('>');
                    xml.push_str("<system-out>");
                    xml.push_str(&escape_xml(&finding.message));
                    if let Some(hint) = &finding.hint {
                        xml.push_str(&format!("\nHint: {}", escape_xml(hint)));
                    }
                    xml.push_str("</system-out></testcase>");
                }
                Severity::Info => {
                    xml.push_str("/>");
                }
            }
        }
    }

    xml.push_str("</testsuite></testsuites>");
    xml
}

fn escape_xml(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escapes_special_chars() {
        assert_eq!(escape_xml("a < b & \"c\""), "a &lt; b &amp; &quot;c&quot;");
    }
}
