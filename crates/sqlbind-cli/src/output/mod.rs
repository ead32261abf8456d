//! Output formatting

use miette::{IntoDiagnostic, Result};
use sqlbind_core::{Diagnostic, Severity};

use crate::args::OutputFormat;

/// Output formatter for diagnostics
pub struct OutputFormatter {
    format: OutputFormat,
    file_name: String,
}

impl OutputFormatter {
    pub fn new(format: OutputFormat, file_name: String) -> Self {
        Self { format, file_name }
    }

    /// Print diagnostics in the configured format
    pub fn print_diagnostics(&self, diagnostics: &[Diagnostic], source: &str) -> Result<()> {
        match self.format {
            OutputFormat::Human => {
                eprint!("{}", self.render_human(diagnostics, source));
                Ok(())
            }
            OutputFormat::Json => {
                println!("{}", self.render_json(diagnostics)?);
                Ok(())
            }
            OutputFormat::Sarif => {
                println!("{}", self.render_sarif(diagnostics, source)?);
                Ok(())
            }
        }
    }

    fn render_human(&self, diagnostics: &[Diagnostic], source: &str) -> String {
        let mut out = String::new();
        for diag in diagnostics {
            let severity_str = match diag.severity {
                Severity::Error => "\x1b[31merror\x1b[0m",
                Severity::Warning => "\x1b[33mwarning\x1b[0m",
                Severity::Info => "\x1b[34minfo\x1b[0m",
            };

            out.push_str(&format!(
                "{}[{}]: {}\n",
                severity_str,
                diag.code(),
                diag.message
            ));

            if let Some(span) = &diag.span {
                let (line, col) = offset_to_line_col(source, span.offset);
                out.push_str(&format!("  --> {}:{}:{}\n", self.file_name, line, col));

                if let Some(source_line) = get_source_line(source, line) {
                    // a statement may span lines; underline the first one
                    let width = source_line.len().saturating_sub(col - 1).max(1);
                    out.push_str("   |\n");
                    out.push_str(&format!("{:>3} | {}\n", line, source_line));
                    out.push_str(&format!(
                        "   | {}{}\n",
                        " ".repeat(col - 1),
                        "^".repeat(span.length.clamp(1, width))
                    ));
                }
            }

            if let Some(help) = &diag.help {
                out.push_str(&format!("   = help: {}\n", help));
            }

            out.push('\n');
        }
        out
    }

    fn render_json(&self, diagnostics: &[Diagnostic]) -> Result<String> {
        let output = serde_json::json!({
            "file": self.file_name,
            "diagnostics": diagnostics
        });
        serde_json::to_string_pretty(&output).into_diagnostic()
    }

    fn render_sarif(&self, diagnostics: &[Diagnostic], source: &str) -> Result<String> {
        let results: Vec<serde_json::Value> = diagnostics
            .iter()
            .map(|d| {
                let mut location = serde_json::json!({
                    "physicalLocation": {
                        "artifactLocation": {
                            "uri": self.file_name
                        }
                    }
                });
                if let Some(span) = &d.span {
                    let (line, col) = offset_to_line_col(source, span.offset);
                    location["physicalLocation"]["region"] = serde_json::json!({
                        "startLine": line,
                        "startColumn": col
                    });
                }

                serde_json::json!({
                    "ruleId": d.code(),
                    "level": match d.severity {
                        Severity::Error => "error",
                        Severity::Warning => "warning",
                        Severity::Info => "note",
                    },
                    "message": {
                        "text": d.message
                    },
                    "locations": [location]
                })
            })
            .collect();

        let sarif = serde_json::json!({
            "$schema": "https://raw.githubusercontent.com/oasis-tcs/sarif-spec/master/Schemata/sarif-schema-2.1.0.json",
            "version": "2.1.0",
            "runs": [{
                "tool": {
                    "driver": {
                        "name": "sqlbind",
                        "version": env!("CARGO_PKG_VERSION")
                    }
                },
                "results": results
            }]
        });

        serde_json::to_string_pretty(&sarif).into_diagnostic()
    }
}

/// Convert byte offset to line and column (1-indexed)
fn offset_to_line_col(source: &str, offset: usize) -> (usize, usize) {
    let mut line = 1;
    let mut col = 1;

    for (i, ch) in source.char_indices() {
        if i >= offset {
            break;
        }
        if ch == '\n' {
            line += 1;
            col = 1;
        } else {
            col += 1;
        }
    }

    (line, col)
}

/// Get a specific line from source (1-indexed)
fn get_source_line(source: &str, line: usize) -> Option<&str> {
    source.lines().nth(line.saturating_sub(1))
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlbind_core::{DiagnosticKind, Span};

    const SOURCE: &str = "SELECT a FROM t;\nSELECT nope FROM t;";

    fn diagnostic() -> Diagnostic {
        Diagnostic::error(DiagnosticKind::ColumnNotFound, "column not found: nope")
            .with_span(Span::new(17, 18))
    }

    #[test]
    fn test_offset_to_line_col() {
        assert_eq!(offset_to_line_col(SOURCE, 0), (1, 1));
        assert_eq!(offset_to_line_col(SOURCE, 17), (2, 1));
        assert_eq!(offset_to_line_col(SOURCE, 24), (2, 8));
    }

    #[test]
    fn test_human_points_at_statement() {
        let formatter = OutputFormatter::new(OutputFormat::Human, "q.sql".to_string());
        let out = formatter.render_human(&[diagnostic()], SOURCE);
        assert!(out.contains("[E0002]: column not found: nope"));
        assert!(out.contains("--> q.sql:2:1"));
        assert!(out.contains("  2 | SELECT nope FROM t;"));
    }

    #[test]
    fn test_sarif_has_region() {
        let formatter = OutputFormatter::new(OutputFormat::Sarif, "q.sql".to_string());
        let out = formatter.render_sarif(&[diagnostic()], SOURCE).unwrap();
        let sarif: serde_json::Value = serde_json::from_str(&out).unwrap();
        let result = &sarif["runs"][0]["results"][0];
        assert_eq!(result["ruleId"], "E0002");
        assert_eq!(
            result["locations"][0]["physicalLocation"]["region"]["startLine"],
            2
        );
    }

    #[test]
    fn test_json_lists_diagnostics() {
        let formatter = OutputFormatter::new(OutputFormat::Json, "q.sql".to_string());
        let out = formatter.render_json(&[diagnostic()]).unwrap();
        let json: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(json["file"], "q.sql");
        assert_eq!(json["diagnostics"].as_array().unwrap().len(), 1);
    }
}
