//! Output formatters for diagnostics.
//!
//! Human-facing formats print 1-based columns; JSON keeps the raw
//! zero-based `column`/`end_column` next to the 1-based lines.

use std::path::Path;

use colored::Colorize;
use serde::Serialize;

use crate::diagnostics::{Diagnostic, FileReport};
use crate::rules::RuleSeverity;

/// Output format for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable colored output.
    Pretty,
    /// JSON output for tooling integration.
    Json,
    /// Compact one-line-per-diagnostic.
    Compact,
    /// GitHub Actions format.
    Github,
}

/// Format one file's diagnostics according to the specified output format.
pub fn format_diagnostics(
    file: &Path,
    diagnostics: &[Diagnostic],
    format: OutputFormat,
    show_fixes: bool,
) -> String {
    match format {
        OutputFormat::Pretty => format_pretty(file, diagnostics, show_fixes),
        OutputFormat::Json => format_json(diagnostics.iter().map(|d| (file, d))),
        OutputFormat::Compact => format_compact(file, diagnostics),
        OutputFormat::Github => format_github(file, diagnostics),
    }
}

/// All diagnostics of a run as a single JSON array.
pub fn format_reports_json(reports: &[FileReport]) -> String {
    format_json(
        reports
            .iter()
            .flat_map(|r| r.diagnostics.iter().map(move |d| (r.path.as_path(), d))),
    )
}

fn severity_name(severity: RuleSeverity) -> &'static str {
    match severity {
        RuleSeverity::Error => "error",
        RuleSeverity::Warning => "warning",
        RuleSeverity::Info => "info",
        RuleSeverity::Hint => "hint",
    }
}

/// Format diagnostics in human-readable colored output.
fn format_pretty(file: &Path, diagnostics: &[Diagnostic], show_fixes: bool) -> String {
    if diagnostics.is_empty() {
        return String::new();
    }

    let mut output = String::new();

    // File header
    output.push_str(&format!(
        "\n{}\n",
        file.display().to_string().bold().underline()
    ));

    for diag in diagnostics {
        let (marker, label) = match diag.severity {
            RuleSeverity::Error => ("✖".red(), "error".red().bold()),
            RuleSeverity::Warning => ("⚠".yellow(), "warning".yellow().bold()),
            RuleSeverity::Info => ("ℹ".blue(), "info".blue().bold()),
            RuleSeverity::Hint => ("💡".dimmed(), "hint".dimmed()),
        };

        output.push_str(&format!(
            "\n  {} {} {} [{}]\n",
            marker,
            format!("{}:{}", diag.line, diag.column + 1).dimmed(),
            label,
            diag.rule_id.cyan()
        ));
        output.push_str(&format!("    {} {}\n", "→".dimmed(), diag.rule_name.bold()));
        output.push_str(&format!("    {}\n", diag.message));

        if let Some(ref snippet) = diag.source_snippet {
            let gutter = diag.line.to_string();
            output.push_str(&format!("\n    {} │ {}\n", gutter, snippet.dimmed()));

            // Multi-line spans are underlined to the end of the first line.
            let end = if diag.end_line == diag.line {
                diag.end_column
            } else {
                snippet.len()
            };
            if end > diag.column {
                let carets = "^".repeat(end - diag.column);
                let carets = match diag.severity {
                    RuleSeverity::Error => carets.red(),
                    RuleSeverity::Warning => carets.yellow(),
                    _ => carets.blue(),
                };
                output.push_str(&format!(
                    "    {} │ {}{}\n",
                    " ".repeat(gutter.len()),
                    " ".repeat(diag.column),
                    carets
                ));
            }
        }

        if show_fixes {
            if let Some(ref fix) = diag.fix_template {
                output.push_str(&format!(
                    "\n    {} {}\n",
                    "Fix:".green().bold(),
                    fix.green()
                ));
            }
        }
    }

    output.push('\n');
    output
}

#[derive(Serialize)]
struct JsonDiagnostic<'a> {
    file: String,
    line: usize,
    column: usize,
    end_line: usize,
    end_column: usize,
    severity: &'static str,
    rule_id: &'a str,
    rule_name: &'a str,
    category: &'static str,
    message: &'a str,
    fix: Option<&'a str>,
    source: Option<&'a str>,
}

fn format_json<'a>(diagnostics: impl Iterator<Item = (&'a Path, &'a Diagnostic)>) -> String {
    let entries: Vec<JsonDiagnostic<'_>> = diagnostics
        .map(|(file, diag)| JsonDiagnostic {
            file: file.display().to_string(),
            line: diag.line,
            column: diag.column,
            end_line: diag.end_line,
            end_column: diag.end_column,
            severity: severity_name(diag.severity),
            rule_id: &diag.rule_id,
            rule_name: &diag.rule_name,
            category: diag.category.key(),
            message: &diag.message,
            fix: diag.fix_template.as_deref(),
            source: diag.source_snippet.as_deref(),
        })
        .collect();

    serde_json::to_string_pretty(&entries).unwrap_or_default()
}

/// Format diagnostics in compact one-line format.
fn format_compact(file: &Path, diagnostics: &[Diagnostic]) -> String {
    diagnostics
        .iter()
        .map(|diag| {
            let severity = match diag.severity {
                RuleSeverity::Error => "E",
                RuleSeverity::Warning => "W",
                RuleSeverity::Info => "I",
                RuleSeverity::Hint => "H",
            };
            format!(
                "{}:{}:{}: {} [{}] {}\n",
                file.display(),
                diag.line,
                diag.column + 1,
                severity,
                diag.rule_id,
                diag.message
            )
        })
        .collect()
}

/// Format diagnostics as GitHub Actions workflow commands.
fn format_github(file: &Path, diagnostics: &[Diagnostic]) -> String {
    diagnostics
        .iter()
        .map(|diag| {
            let level = match diag.severity {
                RuleSeverity::Error => "error",
                RuleSeverity::Warning => "warning",
                RuleSeverity::Info | RuleSeverity::Hint => "notice",
            };
            format!(
                "::{} file={},line={},col={},endLine={},endColumn={},title={}::{}\n",
                level,
                file.display(),
                diag.line,
                diag.column + 1,
                diag.end_line,
                diag.end_column + 1,
                diag.rule_id,
                escape_github(&diag.message)
            )
        })
        .collect()
}

/// Workflow command data escaping.
fn escape_github(message: &str) -> String {
    message
        .replace('%', "%25")
        .replace('\r', "%0D")
        .replace('\n', "%0A")
}

/// Summary statistics for diagnostics.
#[derive(Debug, Default)]
pub struct DiagnosticSummary {
    pub total: usize,
    pub errors: usize,
    pub warnings: usize,
    pub info: usize,
    pub hints: usize,
    pub files_with_issues: usize,
    pub total_files: usize,
}

impl DiagnosticSummary {
    /// Count the diagnostics of a whole run.
    pub fn from_reports(reports: &[FileReport]) -> Self {
        let mut summary = Self {
            total_files: reports.len(),
            ..Self::default()
        };

        for report in reports {
            if !report.diagnostics.is_empty() {
                summary.files_with_issues += 1;
            }
            for diag in &report.diagnostics {
                summary.total += 1;
                match diag.severity {
                    RuleSeverity::Error => summary.errors += 1,
                    RuleSeverity::Warning => summary.warnings += 1,
                    RuleSeverity::Info => summary.info += 1,
                    RuleSeverity::Hint => summary.hints += 1,
                }
            }
        }

        summary
    }

    /// Format the summary as a human-readable string.
    pub fn format_pretty(&self) -> String {
        format!(
            "{} in {} of {} files ({} {}, {} {}, {} info, {} hints)",
            format!("{} issues", self.total).bold(),
            self.files_with_issues,
            self.total_files,
            self.errors.to_string().red().bold(),
            if self.errors == 1 { "error" } else { "errors" },
            self.warnings.to_string().yellow().bold(),
            if self.warnings == 1 {
                "warning"
            } else {
                "warnings"
            },
            self.info,
            self.hints
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::RuleCategory;
    use crate::syntax::TextSpan;
    use std::path::PathBuf;

    fn create_test_diagnostic() -> Diagnostic {
        Diagnostic {
            line: 10,
            column: 30,
            end_line: 10,
            end_column: 38,
            span: TextSpan::new(200, 208),
            severity: RuleSeverity::Warning,
            rule_id: "FAWRN0001".to_string(),
            rule_name: "Missing required properties".to_string(),
            category: RuleCategory::DataAccess,
            message: "FindList call may be missing required field(s) Id".to_string(),
            fix_template: Some("m => m.Id == 1".to_string()),
            source_snippet: Some(
                "        var models = _handler.FindList(m => m.Name == \"Test\");".to_string(),
            ),
        }
    }

    #[test]
    fn test_format_compact() {
        let diag = create_test_diagnostic();
        let output = format_compact(Path::new("Service.cs"), &[diag]);
        assert_eq!(
            output,
            "Service.cs:10:31: W [FAWRN0001] FindList call may be missing required field(s) Id\n"
        );
    }

    #[test]
    fn test_format_github() {
        let mut diag = create_test_diagnostic();
        diag.severity = RuleSeverity::Error;
        diag.message = "50% done\nnext".to_string();
        let output = format_github(Path::new("Service.cs"), &[diag]);
        assert!(output.starts_with("::error file=Service.cs,line=10,col=31,"));
        assert!(output.ends_with("::50%25 done%0Anext\n"));
    }

    #[test]
    fn test_json_uses_category_keys() {
        colored::control::set_override(false);
        let report = FileReport {
            path: PathBuf::from("Service.cs"),
            diagnostics: vec![create_test_diagnostic()],
        };
        let value: serde_json::Value =
            serde_json::from_str(&format_reports_json(&[report])).unwrap();
        assert_eq!(value[0]["category"], "data-access");
        assert_eq!(value[0]["severity"], "warning");
        assert_eq!(value[0]["column"], 30);
    }

    #[test]
    fn test_pretty_underlines_the_span() {
        colored::control::set_override(false);
        let output = format_pretty(Path::new("Service.cs"), &[create_test_diagnostic()], false);
        let caret_line = output.lines().find(|l| l.contains('^')).unwrap();
        assert!(caret_line.ends_with(&format!("{}{}", " ".repeat(30), "^".repeat(8))));
        assert!(!output.contains("Fix:"));
    }

    #[test]
    fn test_summary() {
        let reports = vec![
            FileReport {
                path: PathBuf::from("A.cs"),
                diagnostics: vec![
                    create_test_diagnostic(),
                    Diagnostic {
                        severity: RuleSeverity::Error,
                        ..create_test_diagnostic()
                    },
                ],
            },
            FileReport {
                path: PathBuf::from("B.cs"),
                diagnostics: vec![],
            },
        ];

        let summary = DiagnosticSummary::from_reports(&reports);
        assert_eq!(summary.total, 2);
        assert_eq!(summary.errors, 1);
        assert_eq!(summary.warnings, 1);
        assert_eq!(summary.files_with_issues, 1);
        assert_eq!(summary.total_files, 2);
    }
}
