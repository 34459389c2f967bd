//! Rule registry and the analyzer interface every rule implements.
//!
//! A rule is an [`Analyzer`]: it describes itself with a static
//! [`RuleDescriptor`] and, once per compilation, may start a
//! [`RuleSession`] that is then run against each document.

pub mod raw_sql;
pub mod required_fields;
pub mod task_blocking;

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::semantic::{SymbolResolver, TypeLookup};
use crate::syntax::{CompilationUnit, TextSpan};

/// Static metadata for a rule.
#[derive(Debug, Clone)]
pub struct RuleDescriptor {
    /// Unique identifier for the rule.
    pub id: &'static str,

    /// Human-readable name.
    pub name: &'static str,

    pub category: RuleCategory,

    /// Default severity of violations.
    pub severity: RuleSeverity,

    /// Detailed description.
    pub description: &'static str,

    /// Suggested fix template.
    pub fix_template: Option<&'static str>,
}

/// Categories of rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Hash)]
pub enum RuleCategory {
    /// Async/threading misuse.
    Reliability,
    /// Query construction against the data layer.
    DataAccess,
    /// Injection-prone APIs.
    Security,
}

impl RuleCategory {
    pub const ALL: [RuleCategory; 3] = [
        RuleCategory::Reliability,
        RuleCategory::DataAccess,
        RuleCategory::Security,
    ];

    /// Key used for this category in `flowlint.toml` and on the command line.
    pub fn key(self) -> &'static str {
        match self {
            RuleCategory::Reliability => "reliability",
            RuleCategory::DataAccess => "data-access",
            RuleCategory::Security => "security",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        match key.to_ascii_lowercase().replace('_', "-").as_str() {
            "reliability" => Some(RuleCategory::Reliability),
            "data-access" | "dataaccess" => Some(RuleCategory::DataAccess),
            "security" => Some(RuleCategory::Security),
            _ => None,
        }
    }
}

/// Severity of rule violations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum RuleSeverity {
    /// Hint - suggestions for improvement.
    Hint = 0,
    /// Info - informational guidance.
    Info = 1,
    /// Warning - code may have issues.
    Warning = 2,
    /// Error - code is wrong and must be fixed.
    Error = 3,
}

/// Level a rule is configured at, as in a `[lints]` table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LintLevel {
    Allow,
    Warn,
    Deny,
    Forbid,
}

impl LintLevel {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "allow" => Some(LintLevel::Allow),
            "warn" => Some(LintLevel::Warn),
            "deny" => Some(LintLevel::Deny),
            "forbid" => Some(LintLevel::Forbid),
            _ => None,
        }
    }

    /// Severity a diagnostic is reported at, or `None` when the rule is off.
    pub fn to_severity(self) -> Option<RuleSeverity> {
        match self {
            LintLevel::Allow => None,
            LintLevel::Warn => Some(RuleSeverity::Warning),
            LintLevel::Deny | LintLevel::Forbid => Some(RuleSeverity::Error),
        }
    }
}

/// One document, its syntax tree and the symbol queries available for it.
pub struct AnalysisContext<'a> {
    pub path: &'a Path,
    pub source: &'a str,
    pub unit: &'a CompilationUnit,
    pub resolver: &'a dyn SymbolResolver,
}

/// A rule violation before it is positioned and decorated by the engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Finding {
    pub span: TextSpan,
    pub message: String,
}

impl Finding {
    pub fn new(span: TextSpan, message: impl Into<String>) -> Self {
        Self {
            span,
            message: message.into(),
        }
    }
}

pub trait Analyzer: Send + Sync {
    fn descriptor(&self) -> &'static RuleDescriptor;

    /// Prepare per-compilation state. Returning `None` switches the rule
    /// off for this compilation, e.g. when the types it targets are absent.
    fn start(&self, types: &dyn TypeLookup) -> Option<Box<dyn RuleSession>>;
}

pub trait RuleSession: Send + Sync {
    fn analyze(&self, ctx: &AnalysisContext<'_>) -> Vec<Finding>;
}

/// Collection of all rules.
pub struct RuleSet {
    pub analyzers: Vec<Box<dyn Analyzer>>,
}

impl RuleSet {
    pub fn new() -> Self {
        Self {
            analyzers: vec![
                Box::new(required_fields::RequiredFieldsAnalyzer),
                Box::new(task_blocking::TaskBlockingAnalyzer),
                Box::new(raw_sql::RawSqlAnalyzer),
            ],
        }
    }

    pub fn descriptors(&self) -> impl Iterator<Item = &'static RuleDescriptor> + '_ {
        self.analyzers.iter().map(|a| a.descriptor())
    }

    /// Get rules by category.
    pub fn by_category(&self, category: RuleCategory) -> Vec<&'static RuleDescriptor> {
        self.descriptors()
            .filter(|d| d.category == category)
            .collect()
    }

    /// Get a rule by ID.
    pub fn get(&self, id: &str) -> Option<&'static RuleDescriptor> {
        self.descriptors().find(|d| d.id.eq_ignore_ascii_case(id))
    }
}

impl Default for RuleSet {
    fn default() -> Self {
        Self::new()
    }
}
