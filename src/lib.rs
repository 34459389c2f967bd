//! flowlint - static analysis rules for FlowAccount C# services.
//!
//! This crate parses C# sources into a host-independent syntax tree, binds
//! them into a single compilation and runs a small set of rules over every
//! document: blocking task calls, raw SQL through EF Core and data-access
//! predicates that leave out `[NotOptional]` entity fields. The last rule
//! comes with a fixer that appends the missing comparisons.
//!
//! # Usage
//!
//! ```rust,no_run
//! use flowlint::{LintConfig, Linter};
//!
//! let linter = Linter::new(LintConfig::default());
//! let reports = linter.lint_paths(&["src/Services".into()]).unwrap();
//!
//! for report in reports {
//!     for diag in &report.diagnostics {
//!         println!("{}: {}", report.path.display(), diag);
//!     }
//! }
//! ```

pub mod backend;
pub mod capabilities;
pub mod config;
pub mod diagnostics;
pub mod fix;
pub mod handlers;
pub mod output;
pub mod rules;
pub mod semantic;
pub mod syntax;

use std::path::{Path, PathBuf};
use std::sync::atomic::AtomicBool;

use anyhow::{Context, Result};
use rayon::prelude::*;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

pub use config::LintOverrides;
pub use diagnostics::{Diagnostic, DiagnosticsEngine, FileReport, Project, SourceFile};
pub use fix::{apply_edits, FixOutcome, TextEdit};
pub use rules::{LintLevel, RuleCategory, RuleDescriptor, RuleSet, RuleSeverity};

/// Configuration for the linter.
#[derive(Debug, Clone)]
pub struct LintConfig {
    /// Rule categories to enable; empty means all.
    pub categories: Vec<RuleCategory>,

    /// Specific rule IDs to disable.
    pub disabled_rules: Vec<String>,

    /// Minimum severity to report.
    pub min_severity: RuleSeverity,

    /// Whether to include fix suggestions in output.
    pub show_fixes: bool,

    /// `flowlint.toml` severity overrides.
    pub overrides: LintOverrides,
}

impl Default for LintConfig {
    fn default() -> Self {
        Self {
            categories: vec![],
            disabled_rules: vec![],
            min_severity: RuleSeverity::Hint,
            show_fixes: true,
            overrides: LintOverrides::default(),
        }
    }
}

/// Outcome of `--fix` for one file.
#[derive(Debug, Clone)]
pub struct FileFix {
    pub path: PathBuf,
    pub outcome: FixOutcome,
}

/// Every `*.cs` file under `paths`; files named directly are kept whatever
/// their extension. `bin/` and `obj/` build output is skipped.
pub fn collect_sources(paths: &[PathBuf]) -> Vec<PathBuf> {
    paths
        .iter()
        .flat_map(|path| {
            if path.is_dir() {
                WalkDir::new(path)
                    .into_iter()
                    .filter_entry(|e| e.depth() == 0 || !is_skipped_dir(e))
                    .filter_map(|e| e.ok())
                    .filter(|e| e.file_type().is_file())
                    .filter(|e| e.path().extension().is_some_and(|ext| ext == "cs"))
                    .map(|e| e.path().to_path_buf())
                    .collect::<Vec<_>>()
            } else {
                vec![path.clone()]
            }
        })
        .collect()
}

fn is_skipped_dir(entry: &walkdir::DirEntry) -> bool {
    let name = entry.file_name().to_string_lossy();
    entry.file_type().is_dir() && (name == "bin" || name == "obj" || name.starts_with('.'))
}

/// Read `files` in parallel, skipping (and logging) unreadable ones.
pub fn read_sources(files: &[PathBuf]) -> Vec<SourceFile> {
    files
        .par_iter()
        .filter_map(|path| match std::fs::read_to_string(path) {
            Ok(content) => Some(SourceFile::new(path.clone(), content)),
            Err(err) => {
                warn!(path = %path.display(), error = %err, "Cannot read source file");
                None
            }
        })
        .collect()
}

/// The main linter struct.
pub struct Linter {
    engine: DiagnosticsEngine,
    config: LintConfig,
}

impl Linter {
    /// Create a new linter with the given configuration.
    pub fn new(config: LintConfig) -> Self {
        Self {
            engine: DiagnosticsEngine::new(),
            config,
        }
    }

    pub fn config(&self) -> &LintConfig {
        &self.config
    }

    pub fn engine(&self) -> &DiagnosticsEngine {
        &self.engine
    }

    /// Lint a single file on its own.
    pub fn lint_file<P: AsRef<Path>>(&self, path: P) -> Result<Vec<Diagnostic>> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?;
        Ok(self.lint_str(&content, path))
    }

    /// Lint a string of content as a single-file project.
    pub fn lint_str(&self, content: &str, path: impl AsRef<Path>) -> Vec<Diagnostic> {
        let diagnostics = self.engine.analyze(content, path.as_ref());
        self.filter_diagnostics(diagnostics)
    }

    /// Lint every C# file under `paths` as one compilation.
    pub fn lint_paths(&self, paths: &[PathBuf]) -> Result<Vec<FileReport>> {
        let files = collect_sources(paths);
        if files.is_empty() {
            anyhow::bail!("no C# files found under the given paths");
        }
        Ok(self.lint_sources(read_sources(&files)))
    }

    /// Lint in-memory sources as one compilation.
    pub fn lint_sources(&self, sources: Vec<SourceFile>) -> Vec<FileReport> {
        let project = Project::new(sources);
        self.lint_project(&project)
    }

    pub fn lint_project(&self, project: &Project) -> Vec<FileReport> {
        info!(files = project.files().len(), "Linting project");
        self.engine
            .analyze_project(project)
            .into_iter()
            .map(|report| FileReport {
                diagnostics: self.filter_diagnostics(report.diagnostics),
                path: report.path,
            })
            .collect()
    }

    /// Apply the required-field fix to every flagged predicate. Each file's
    /// edits are merged independently; overlapping ones are skipped and can
    /// be picked up by running the fix again.
    pub fn fix_sources(&self, sources: Vec<SourceFile>, cancel: &AtomicBool) -> Vec<FileFix> {
        let project = Project::new(sources);
        let reports = self.lint_project(&project);
        reports
            .iter()
            .filter_map(|report| {
                let file = project.file(&report.path)?;
                let edits = self.engine.fix_edits(&project, file, &report.diagnostics, cancel);
                if edits.is_empty() {
                    return None;
                }
                let outcome = apply_edits(&file.content, edits, cancel);
                debug!(
                    path = %report.path.display(),
                    applied = outcome.applied,
                    skipped = outcome.skipped,
                    "Fixed file"
                );
                Some(FileFix {
                    path: report.path.clone(),
                    outcome,
                })
            })
            .collect()
    }

    /// Filter diagnostics based on configuration.
    pub fn filter_diagnostics(&self, diagnostics: Vec<Diagnostic>) -> Vec<Diagnostic> {
        diagnostics
            .into_iter()
            .filter_map(|mut d| {
                if let Some(level) = self.config.overrides.effective_level(&d.rule_id, d.category) {
                    match level.to_severity() {
                        None => return None,
                        Some(sev) => d.severity = sev,
                    }
                }

                // Filter by minimum severity (CLI --severity flag)
                if d.severity < self.config.min_severity {
                    return None;
                }

                // Filter by disabled rules (CLI --disable flag)
                if self
                    .config
                    .disabled_rules
                    .iter()
                    .any(|id| id.eq_ignore_ascii_case(&d.rule_id))
                {
                    return None;
                }

                // Filter by categories if specified (CLI --categories flag)
                if !self.config.categories.is_empty()
                    && !self.config.categories.contains(&d.category)
                {
                    return None;
                }

                Some(d)
            })
            .collect()
    }
}
