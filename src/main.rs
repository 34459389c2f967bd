//! flowlint CLI - lint FlowAccount C# services from the command line.

use std::collections::HashMap;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::atomic::AtomicBool;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use colored::Colorize;
use tracing::warn;

use flowlint::config::{discover_config, load_config};
use flowlint::output::{format_diagnostics, format_reports_json, DiagnosticSummary, OutputFormat};
use flowlint::{
    collect_sources, read_sources, FileReport, LintConfig, LintOverrides, Linter, RuleCategory,
    RuleSeverity,
};

/// flowlint - static analysis for FlowAccount C# services
#[derive(Parser, Debug)]
#[command(name = "flowlint")]
#[command(version)]
#[command(about = "Lint C# sources for FlowAccount data-access and async rules", long_about = None)]
struct Args {
    /// Files or directories to lint
    #[arg(required = true)]
    paths: Vec<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "pretty")]
    format: OutputFormatArg,

    /// Minimum severity to report
    #[arg(short, long, value_enum, default_value = "hint")]
    severity: SeverityArg,

    /// Rule categories to check (comma-separated)
    #[arg(short, long, value_delimiter = ',')]
    categories: Option<Vec<CategoryArg>>,

    /// Rules to disable (comma-separated rule IDs)
    #[arg(long, value_delimiter = ',')]
    disable: Option<Vec<String>>,

    /// Show fix suggestions
    #[arg(long, default_value = "true")]
    show_fixes: bool,

    /// Exit with error code on warnings
    #[arg(long)]
    error_on_warnings: bool,

    /// Only show files with diagnostics
    #[arg(short, long)]
    quiet: bool,

    /// Show rule statistics
    #[arg(long)]
    stats: bool,

    /// Maximum number of diagnostics to show (0 for unlimited)
    #[arg(long, default_value = "0")]
    max_diagnostics: usize,

    /// Rewrite predicates flagged by FAWRN0001 in place
    #[arg(long)]
    fix: bool,

    /// Use this flowlint.toml instead of discovering one from the first path
    #[arg(long)]
    config: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum OutputFormatArg {
    /// Human-readable colored output
    Pretty,
    /// JSON output for tooling integration
    Json,
    /// Compact one-line-per-diagnostic
    Compact,
    /// GitHub Actions format
    Github,
}

#[derive(Debug, Clone, Copy, ValueEnum, PartialEq)]
enum SeverityArg {
    Error,
    Warning,
    Info,
    Hint,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum CategoryArg {
    Reliability,
    DataAccess,
    Security,
}

impl From<OutputFormatArg> for OutputFormat {
    fn from(arg: OutputFormatArg) -> Self {
        match arg {
            OutputFormatArg::Pretty => OutputFormat::Pretty,
            OutputFormatArg::Json => OutputFormat::Json,
            OutputFormatArg::Compact => OutputFormat::Compact,
            OutputFormatArg::Github => OutputFormat::Github,
        }
    }
}

impl From<SeverityArg> for RuleSeverity {
    fn from(arg: SeverityArg) -> Self {
        match arg {
            SeverityArg::Error => RuleSeverity::Error,
            SeverityArg::Warning => RuleSeverity::Warning,
            SeverityArg::Info => RuleSeverity::Info,
            SeverityArg::Hint => RuleSeverity::Hint,
        }
    }
}

impl From<CategoryArg> for RuleCategory {
    fn from(arg: CategoryArg) -> Self {
        match arg {
            CategoryArg::Reliability => RuleCategory::Reliability,
            CategoryArg::DataAccess => RuleCategory::DataAccess,
            CategoryArg::Security => RuleCategory::Security,
        }
    }
}

fn init_logging() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();
}

fn load_overrides(args: &Args) -> Result<LintOverrides> {
    match &args.config {
        Some(path) => load_config(path),
        None => match args.paths.first() {
            Some(first) => discover_config(first),
            None => Ok(LintOverrides::default()),
        },
    }
}

fn main() -> ExitCode {
    init_logging();
    let args = Args::parse();

    match run(&args) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("{}: {:#}", "Error".red().bold(), err);
            ExitCode::from(2)
        }
    }
}

fn run(args: &Args) -> Result<ExitCode> {
    let config = LintConfig {
        categories: args
            .categories
            .clone()
            .map(|cats| cats.into_iter().map(Into::into).collect())
            .unwrap_or_default(),
        disabled_rules: args.disable.clone().unwrap_or_default(),
        min_severity: args.severity.into(),
        show_fixes: args.show_fixes,
        overrides: load_overrides(args).context("loading lint configuration")?,
    };
    let linter = Linter::new(config);
    for id in &linter.config().disabled_rules {
        if linter.engine().rule_set().get(id).is_none() {
            eprintln!("{} unknown rule '{}'", "Warning:".yellow().bold(), id);
        }
    }

    let files = collect_sources(&args.paths);
    if files.is_empty() {
        eprintln!("{}", "No C# files found to lint.".yellow());
        return Ok(ExitCode::SUCCESS);
    }
    let sources = read_sources(&files);

    let sources = if args.fix {
        apply_fixes(&linter, sources)?
    } else {
        sources
    };

    let reports = linter.lint_sources(sources);
    Ok(report(args, &reports))
}

/// Rewrite flagged predicates on disk and return the updated sources for
/// the final lint pass.
fn apply_fixes(
    linter: &Linter,
    mut sources: Vec<flowlint::SourceFile>,
) -> Result<Vec<flowlint::SourceFile>> {
    let fixes = linter.fix_sources(sources.clone(), &AtomicBool::new(false));
    let mut fixed: HashMap<PathBuf, String> = HashMap::new();
    for fix in fixes {
        if fix.outcome.applied == 0 {
            continue;
        }
        std::fs::write(&fix.path, &fix.outcome.text)
            .with_context(|| format!("writing {}", fix.path.display()))?;
        eprintln!(
            "{} {} ({} fixed{})",
            "Fixed".green().bold(),
            fix.path.display(),
            fix.outcome.applied,
            if fix.outcome.skipped > 0 {
                format!(", {} left for another pass", fix.outcome.skipped)
            } else {
                String::new()
            }
        );
        fixed.insert(fix.path, fix.outcome.text);
    }

    for source in &mut sources {
        if let Some(text) = fixed.remove(&source.path) {
            source.content = text;
        }
    }
    if !fixed.is_empty() {
        warn!(files = fixed.len(), "Fixed files missing from the source list");
    }
    Ok(sources)
}

fn report(args: &Args, reports: &[FileReport]) -> ExitCode {
    let summary = DiagnosticSummary::from_reports(reports);
    let mut rule_counts: HashMap<&str, usize> = HashMap::new();
    for diag in reports.iter().flat_map(|r| &r.diagnostics) {
        *rule_counts.entry(diag.rule_id.as_str()).or_insert(0) += 1;
    }

    // Apply max diagnostics limit
    let mut shown: Vec<FileReport> = reports.to_vec();
    if args.max_diagnostics > 0 && summary.total > args.max_diagnostics {
        let mut budget = args.max_diagnostics;
        for report in &mut shown {
            let keep = report.diagnostics.len().min(budget);
            report.diagnostics.truncate(keep);
            budget -= keep;
        }
        eprintln!(
            "{} Showing first {} of {} diagnostics",
            "Note:".blue().bold(),
            args.max_diagnostics,
            summary.total
        );
    }

    let output_format: OutputFormat = args.format.into();
    if output_format == OutputFormat::Json {
        println!("{}", format_reports_json(&shown));
    } else {
        for report in &shown {
            if report.diagnostics.is_empty() && args.quiet {
                continue;
            }
            let output = format_diagnostics(
                &report.path,
                &report.diagnostics,
                output_format,
                args.show_fixes,
            );
            print!("{}", output);
        }

        if summary.total > 0 {
            println!();
            println!("{} {}", "Found".bold(), summary.format_pretty());
        } else {
            println!("{}", "✓ No issues found!".green().bold());
        }

        if args.stats && !rule_counts.is_empty() {
            println!();
            println!("{}", "Rule Statistics:".bold().underline());
            let mut sorted_rules: Vec<_> = rule_counts.into_iter().collect();
            sorted_rules.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(b.0)));
            for (rule_id, count) in sorted_rules {
                println!("  {:12} {}", rule_id, count);
            }
        }
    }

    if summary.errors > 0 || (args.error_on_warnings && summary.warnings > 0) {
        ExitCode::from(1)
    } else {
        ExitCode::SUCCESS
    }
}
