//! Diagnostics engine: parses a set of C# sources into one compilation and
//! runs every rule over each document.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::OnceLock;

use rayon::prelude::*;
use regex::Regex;
use tracing::{debug, warn};

use crate::fix::TextEdit;
use crate::rules::required_fields;
use crate::rules::{AnalysisContext, RuleCategory, RuleDescriptor, RuleSession, RuleSet, RuleSeverity};
use crate::semantic::{Compilation, SemanticModel};
use crate::syntax::{self, CompilationUnit, LineIndex, TextSpan};

/// A `#pragma warning disable|restore` line.
#[derive(Debug, Clone)]
pub struct PragmaDirective {
    /// Line number where the directive appears (1-indexed).
    pub line: usize,
    /// `true` for `disable`, `false` for `restore`.
    pub disable: bool,
    /// Rule IDs named by the directive, or None for all rules.
    pub rules: Option<HashSet<String>>,
}

impl PragmaDirective {
    /// Check if this directive applies to a specific rule.
    pub fn applies_to(&self, rule_id: &str) -> bool {
        match &self.rules {
            None => true,
            Some(rules) => rules.contains(&rule_id.to_ascii_uppercase()),
        }
    }
}

fn pragma_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^\s*#\s*pragma\s+warning\s+(disable|restore)\b([^/\n]*)")
            .expect("pragma pattern is valid")
    })
}

/// Parse `#pragma warning` directives from source code.
///
/// Supports:
/// - `#pragma warning disable` - suppress every rule until restored
/// - `#pragma warning disable FAWRN0001, FAINF0001` - suppress specific rules
/// - `#pragma warning restore [ids]` - end a suppression
pub fn parse_pragma_directives(content: &str) -> Vec<PragmaDirective> {
    content
        .lines()
        .enumerate()
        .filter_map(|(line_idx, line)| {
            let caps = pragma_pattern().captures(line)?;
            let disable = caps.get(1).is_some_and(|m| m.as_str() == "disable");
            let ids: HashSet<String> = caps
                .get(2)
                .map_or("", |m| m.as_str())
                .split(',')
                .map(|s| s.trim().to_ascii_uppercase())
                .filter(|s| !s.is_empty())
                .collect();
            Some(PragmaDirective {
                line: line_idx + 1,
                disable,
                rules: (!ids.is_empty()).then_some(ids),
            })
        })
        .collect()
}

/// Whether the directives in effect at `line` disable `rule_id`. The last
/// directive above the line that names the rule wins.
fn is_suppressed(line: usize, rule_id: &str, directives: &[PragmaDirective]) -> bool {
    directives
        .iter()
        .filter(|d| d.line < line && d.applies_to(rule_id))
        .last()
        .is_some_and(|d| d.disable)
}

/// Generated sources are skipped: `*.g.cs`, `*.designer.cs`, `*.generated.cs`
/// or an `<auto-generated` marker in the leading comment block.
pub fn is_generated(path: &Path, content: &str) -> bool {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_ascii_lowercase())
        .unwrap_or_default();
    if [".g.cs", ".g.i.cs", ".designer.cs", ".generated.cs"]
        .iter()
        .any(|suffix| name.ends_with(suffix))
    {
        return true;
    }
    content
        .lines()
        .map(str::trim)
        .take_while(|line| {
            line.is_empty() || line.starts_with("//") || line.starts_with("/*") || line.starts_with('*')
        })
        .any(|line| line.contains("<auto-generated"))
}

/// A diagnostic message produced by the linter.
#[derive(Debug, Clone)]
pub struct Diagnostic {
    /// Line number (1-indexed).
    pub line: usize,

    /// Column start (0-indexed, bytes).
    pub column: usize,

    /// Line of the end of the range (1-indexed).
    pub end_line: usize,

    /// Column end (0-indexed, bytes).
    pub end_column: usize,

    /// Byte range in the source document.
    pub span: TextSpan,

    /// Severity of the diagnostic.
    pub severity: RuleSeverity,

    /// Rule ID that triggered this diagnostic.
    pub rule_id: String,

    /// Human-readable rule name.
    pub rule_name: String,

    /// Category of the rule.
    pub category: RuleCategory,

    /// The diagnostic message.
    pub message: String,

    /// Optional fix template.
    pub fix_template: Option<String>,

    /// The source line that triggered the diagnostic.
    pub source_snippet: Option<String>,
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}:{}: {:?} [{}] {}",
            self.line, self.column, self.severity, self.rule_id, self.message
        )
    }
}

/// A document handed to the engine.
#[derive(Debug, Clone)]
pub struct SourceFile {
    pub path: PathBuf,
    pub content: String,
}

impl SourceFile {
    pub fn new(path: impl Into<PathBuf>, content: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            content: content.into(),
        }
    }
}

/// A source file together with its syntax tree.
#[derive(Debug)]
pub struct ParsedFile {
    pub path: PathBuf,
    pub content: String,
    pub unit: CompilationUnit,
    pub line_index: LineIndex,
    pub generated: bool,
}

/// Every parsed document of one run and the compilation built from them.
#[derive(Debug)]
pub struct Project {
    files: Vec<ParsedFile>,
    compilation: Compilation,
}

impl Project {
    /// Parse `sources` in parallel and declare all of their types. Syntax
    /// errors are recovered; a file is left out only when no tree can be
    /// built for it.
    pub fn new(sources: Vec<SourceFile>) -> Self {
        let files: Vec<ParsedFile> = sources
            .into_par_iter()
            .filter_map(|source| {
                let output = match syntax::parse(&source.content) {
                    Ok(output) => output,
                    Err(err) => {
                        warn!(path = %source.path.display(), error = %err, "Skipping unparsable file");
                        return None;
                    }
                };
                for err in &output.errors {
                    debug!(path = %source.path.display(), error = %err, "Recovered from parse error");
                }
                Some(ParsedFile {
                    generated: is_generated(&source.path, &source.content),
                    line_index: LineIndex::new(&source.content),
                    unit: output.unit,
                    path: source.path,
                    content: source.content,
                })
            })
            .collect();
        let compilation = Compilation::new(files.iter().map(|f| &f.unit));
        Self { files, compilation }
    }

    pub fn files(&self) -> &[ParsedFile] {
        &self.files
    }

    pub fn file(&self, path: &Path) -> Option<&ParsedFile> {
        self.files.iter().find(|f| f.path == path)
    }

    pub fn compilation(&self) -> &Compilation {
        &self.compilation
    }

    pub fn model(&self, file: &ParsedFile) -> SemanticModel<'_> {
        SemanticModel::new(&self.compilation, &file.unit)
    }
}

/// Diagnostics for one file.
#[derive(Debug, Clone)]
pub struct FileReport {
    pub path: PathBuf,
    pub diagnostics: Vec<Diagnostic>,
}

/// Diagnostics engine for C# code analysis.
pub struct DiagnosticsEngine {
    rule_set: RuleSet,
}

impl DiagnosticsEngine {
    /// Create a new diagnostics engine.
    pub fn new() -> Self {
        Self {
            rule_set: RuleSet::new(),
        }
    }

    pub fn rule_set(&self) -> &RuleSet {
        &self.rule_set
    }

    /// Analyze a single document as a project of its own.
    pub fn analyze(&self, content: &str, path: &Path) -> Vec<Diagnostic> {
        let project = Project::new(vec![SourceFile::new(path, content)]);
        self.analyze_project(&project)
            .into_iter()
            .next()
            .map(|report| report.diagnostics)
            .unwrap_or_default()
    }

    /// Run every rule over every non-generated file of `project`.
    pub fn analyze_project(&self, project: &Project) -> Vec<FileReport> {
        let sessions = self.start_sessions(project.compilation());
        project
            .files()
            .par_iter()
            .filter(|file| {
                if file.generated {
                    debug!(path = %file.path.display(), "Skipping generated file");
                }
                !file.generated
            })
            .map(|file| FileReport {
                path: file.path.clone(),
                diagnostics: self.analyze_file(project, file, &sessions),
            })
            .collect()
    }

    fn start_sessions(
        &self,
        compilation: &Compilation,
    ) -> Vec<(&'static RuleDescriptor, Box<dyn RuleSession>)> {
        self.rule_set
            .analyzers
            .iter()
            .filter_map(|analyzer| {
                let session = analyzer.start(compilation)?;
                Some((analyzer.descriptor(), session))
            })
            .collect()
    }

    fn analyze_file(
        &self,
        project: &Project,
        file: &ParsedFile,
        sessions: &[(&'static RuleDescriptor, Box<dyn RuleSession>)],
    ) -> Vec<Diagnostic> {
        let model = project.model(file);
        let ctx = AnalysisContext {
            path: &file.path,
            source: &file.content,
            unit: &file.unit,
            resolver: &model,
        };
        let pragmas = parse_pragma_directives(&file.content);

        let mut diagnostics: Vec<Diagnostic> = sessions
            .iter()
            .flat_map(|(descriptor, session)| {
                session
                    .analyze(&ctx)
                    .into_iter()
                    .map(|finding| create_diagnostic(file, descriptor, finding.span, finding.message))
            })
            .filter(|d| !is_suppressed(d.line, &d.rule_id, &pragmas))
            .collect();
        diagnostics.sort_by_key(|d| (d.span.start, d.span.end));
        debug!(path = %file.path.display(), count = diagnostics.len(), "Analyzed file");
        diagnostics
    }

    /// Predicate fixes for the FAWRN0001 diagnostics of `file`, one edit per
    /// site. Cancellation is checked between sites.
    pub fn fix_edits(
        &self,
        project: &Project,
        file: &ParsedFile,
        diagnostics: &[Diagnostic],
        cancel: &AtomicBool,
    ) -> Vec<TextEdit> {
        let model = project.model(file);
        let mut edits = Vec::new();
        for diagnostic in diagnostics {
            if cancel.load(Ordering::Relaxed) {
                debug!(path = %file.path.display(), "Fix batch cancelled");
                break;
            }
            if diagnostic.rule_id != required_fields::DESCRIPTOR.id {
                continue;
            }
            match required_fields::fix_at(&file.unit, diagnostic.span, &file.content, &model) {
                Some(edit) => edits.push(edit),
                None => debug!(span = %diagnostic.span, "No fix for stale diagnostic"),
            }
        }
        edits
    }
}

impl Default for DiagnosticsEngine {
    fn default() -> Self {
        Self::new()
    }
}

fn create_diagnostic(
    file: &ParsedFile,
    descriptor: &RuleDescriptor,
    span: TextSpan,
    message: String,
) -> Diagnostic {
    let (line, column) = file.line_index.line_col(span.start);
    let (end_line, end_column) = file.line_index.line_col(span.end);
    Diagnostic {
        line: line + 1,
        column,
        end_line: end_line + 1,
        end_column,
        span,
        severity: descriptor.severity,
        rule_id: descriptor.id.to_string(),
        rule_name: descriptor.name.to_string(),
        category: descriptor.category,
        message,
        fix_template: descriptor.fix_template.map(String::from),
        source_snippet: file.content.lines().nth(line).map(String::from),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MODEL: &str = r#"
namespace FlowAccount.Core.Attributes
{
    public class NotOptionalAttribute : System.Attribute { }
}

namespace Flowaccount.Data
{
    public interface IDataHandler<T>
    {
        System.Collections.Generic.List<T> FindList(System.Linq.Expressions.Expression<System.Func<T, bool>> predicate);
    }
}

namespace Shop
{
    using FlowAccount.Core.Attributes;

    public class Model
    {
        [NotOptional]
        public int Id { get; set; }
        public string Name { get; set; }
    }
}
"#;

    const SERVICE: &str = r#"using Flowaccount.Data;
using Shop;

public class SampleService
{
    private IDataHandler<Model> _handler;

    public void Query()
    {
        var models = _handler.FindList(m => m.Name == "Test");
    }
}
"#;

    fn project(service: &str) -> Project {
        Project::new(vec![
            SourceFile::new("Model.cs", MODEL),
            SourceFile::new("Service.cs", service),
        ])
    }

    fn report<'a>(reports: &'a [FileReport], path: &str) -> &'a [Diagnostic] {
        reports
            .iter()
            .find(|r| r.path == Path::new(path))
            .map(|r| r.diagnostics.as_slice())
            .unwrap_or_default()
    }

    #[test]
    fn test_entity_declared_in_another_file() {
        let engine = DiagnosticsEngine::new();
        let reports = engine.analyze_project(&project(SERVICE));
        let diagnostics = report(&reports, "Service.cs");
        assert_eq!(diagnostics.len(), 1);
        let d = &diagnostics[0];
        assert_eq!(d.rule_id, "FAWRN0001");
        assert_eq!((d.line, d.column), (10, 30));
        assert_eq!(d.span.text(SERVICE), "FindList");
        assert_eq!(d.message, "FindList call may be missing required field(s) Id");
        assert!(report(&reports, "Model.cs").is_empty());
    }

    #[test]
    fn test_pragma_disable_and_restore() {
        let suppressed = SERVICE.replace(
            "        var models",
            "#pragma warning disable FAWRN0001\n        var models",
        );
        let engine = DiagnosticsEngine::new();
        let reports = engine.analyze_project(&project(&suppressed));
        assert!(report(&reports, "Service.cs").is_empty());

        let restored = SERVICE.replace(
            "        var models",
            "#pragma warning disable FAWRN0001\n#pragma warning restore FAWRN0001\n        var models",
        );
        let reports = engine.analyze_project(&project(&restored));
        assert_eq!(report(&reports, "Service.cs").len(), 1);
    }

    #[test]
    fn test_parse_pragma_directives() {
        let content = "#pragma warning disable\n#pragma warning restore fawrn0001, FAINF0001 // done\nint x;";
        let directives = parse_pragma_directives(content);
        assert_eq!(directives.len(), 2);
        assert!(directives[0].disable);
        assert!(directives[0].rules.is_none());
        assert!(!directives[1].disable);
        let rules = directives[1].rules.as_ref().unwrap();
        assert!(rules.contains("FAWRN0001") && rules.contains("FAINF0001"));

        assert!(is_suppressed(3, "FAINF0002", &directives));
        assert!(!is_suppressed(3, "FAWRN0001", &directives));
    }

    #[test]
    fn test_generated_files_are_skipped() {
        assert!(is_generated(Path::new("obj/Model.g.cs"), ""));
        assert!(is_generated(Path::new("Form1.Designer.cs"), ""));
        assert!(is_generated(
            Path::new("Client.cs"),
            "// <auto-generated>\n//   by a tool\n// </auto-generated>\nclass C {}"
        ));
        assert!(!is_generated(Path::new("Client.cs"), "class C {}\n// <auto-generated>"));

        let engine = DiagnosticsEngine::new();
        let project = Project::new(vec![
            SourceFile::new("Model.cs", MODEL),
            SourceFile::new("Service.g.cs", SERVICE),
        ]);
        let reports = engine.analyze_project(&project);
        assert!(reports.iter().all(|r| r.path != Path::new("Service.g.cs")));
    }

    #[test]
    fn test_fix_edits_for_flagged_sites() {
        let engine = DiagnosticsEngine::new();
        let project = project(SERVICE);
        let reports = engine.analyze_project(&project);
        let file = project.file(Path::new("Service.cs")).unwrap();
        let edits = engine.fix_edits(
            &project,
            file,
            report(&reports, "Service.cs"),
            &AtomicBool::new(false),
        );
        assert_eq!(edits.len(), 1);
        assert_eq!(
            edits[0].new_text,
            "m.Name == \"Test\" && m.Id == /* FIXME: replace with actual value */ default"
        );
    }
}
