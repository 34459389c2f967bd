//! `flowlint.toml` discovery and parsing.
//!
//! Reads the `[lints]` table of every `flowlint.toml` from the linted path
//! up to the filesystem root (or up to a file with `root = true`) and
//! produces a [`LintOverrides`] set that the linter uses to change default
//! rule severities.
//!
//! # flowlint.toml format
//!
//! ```toml
//! root = true
//!
//! [lints]
//! # Set the default level for every rule:
//! all = "warn"
//!
//! # Override individual categories:
//! reliability = "deny"
//! data-access = "deny"
//! security    = "allow"
//!
//! # Override individual rules:
//! FAINF0002 = "allow"
//! FAWRN0001 = { level = "forbid" }
//! ```
//!
//! Files closer to the linted path are merged on top of those further up
//! (closest wins).

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::debug;

use crate::rules::{LintLevel, RuleCategory};

/// Name of the configuration file looked up next to the sources.
pub const CONFIG_FILE: &str = "flowlint.toml";

/// Severity overrides extracted from `[lints]` tables.
#[derive(Debug, Clone, Default)]
pub struct LintOverrides {
    /// The files this config was loaded from, outermost first.
    pub sources: Vec<PathBuf>,

    /// Level applied to every rule when set (`all = "warn"`).
    pub all: Option<LintLevel>,

    /// Per-category severity overrides.
    pub categories: HashMap<RuleCategory, LintLevel>,

    /// Per-rule severity overrides (upper-cased rule ID → level).
    pub rules: HashMap<String, LintLevel>,
}

impl LintOverrides {
    /// Resolve the effective [`LintLevel`] for a given rule.
    ///
    /// Precedence (highest → lowest):
    /// 1. Per-rule override (`FAINF0002 = "allow"`)
    /// 2. Per-category override (`security = "deny"`)
    /// 3. `all = "..."`
    /// 4. `None` – use the rule's built-in default severity.
    pub fn effective_level(&self, rule_id: &str, category: RuleCategory) -> Option<LintLevel> {
        if let Some(&level) = self.rules.get(&rule_id.to_ascii_uppercase()) {
            return Some(level);
        }
        if let Some(&level) = self.categories.get(&category) {
            return Some(level);
        }
        self.all
    }

    /// Merge another config on top of this one (other wins on conflicts).
    pub fn merge(&mut self, other: &LintOverrides) {
        if other.all.is_some() {
            self.all = other.all;
        }
        for (&cat, &level) in &other.categories {
            self.categories.insert(cat, level);
        }
        for (rule, &level) in &other.rules {
            self.rules.insert(rule.clone(), level);
        }
        self.sources.extend(other.sources.iter().cloned());
    }

    /// Returns `true` when no overrides are configured.
    pub fn is_empty(&self) -> bool {
        self.all.is_none() && self.categories.is_empty() && self.rules.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Discovery
// ---------------------------------------------------------------------------

/// Every `flowlint.toml` from `start` upwards, closest first.
pub fn find_config_files(start: &Path) -> Vec<PathBuf> {
    let mut dir = if start.is_file() {
        match start.parent() {
            Some(parent) => parent.to_path_buf(),
            None => return Vec::new(),
        }
    } else {
        start.to_path_buf()
    };

    let mut found = Vec::new();
    loop {
        let candidate = dir.join(CONFIG_FILE);
        if candidate.is_file() {
            found.push(candidate);
        }
        if !dir.pop() {
            return found;
        }
    }
}

/// Discover and load the lint config for a given path.
///
/// Files are merged outermost first; a file with `root = true` stops the
/// walk so nothing above it applies.
pub fn discover_config(path: &Path) -> Result<LintOverrides> {
    let mut chain = Vec::new();
    for file in find_config_files(path) {
        let (overrides, is_root) = load_file(&file)?;
        chain.push(overrides);
        if is_root {
            break;
        }
    }

    let mut config = LintOverrides::default();
    for overrides in chain.iter().rev() {
        config.merge(overrides);
    }
    debug!(files = ?config.sources, "Loaded lint configuration");
    Ok(config)
}

/// Load a single config file, ignoring `root`.
pub fn load_config(path: &Path) -> Result<LintOverrides> {
    load_file(path).map(|(overrides, _)| overrides)
}

fn load_file(path: &Path) -> Result<(LintOverrides, bool)> {
    let content =
        std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    let doc: toml::Value =
        toml::from_str(&content).with_context(|| format!("parsing {}", path.display()))?;

    let mut config = LintOverrides {
        sources: vec![path.to_path_buf()],
        ..Default::default()
    };
    if let Some(table) = doc.get("lints").and_then(|l| l.as_table()) {
        merge_toml_table(&mut config, table);
    }
    let is_root = doc.get("root").and_then(|r| r.as_bool()).unwrap_or(false);
    Ok((config, is_root))
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Parse a single TOML value into a [`LintLevel`].
///
/// Supports both:
///   - `"warn"` (plain string)
///   - `{ level = "warn" }` (table form)
fn parse_lint_level(value: &toml::Value) -> Option<LintLevel> {
    match value {
        toml::Value::String(s) => LintLevel::from_str(s),
        toml::Value::Table(t) => t
            .get("level")
            .and_then(|v| v.as_str())
            .and_then(LintLevel::from_str),
        _ => None,
    }
}

/// Merge a TOML table of lint entries into a [`LintOverrides`].
fn merge_toml_table(config: &mut LintOverrides, table: &toml::value::Table) {
    for (key, value) in table {
        let Some(level) = parse_lint_level(value) else {
            debug!(key = %key, "Ignoring lint entry without a valid level");
            continue;
        };

        if key == "all" {
            config.all = Some(level);
        } else if let Some(cat) = RuleCategory::from_key(key) {
            config.categories.insert(cat, level);
        } else {
            // Assume it's a rule ID
            config.rules.insert(key.to_ascii_uppercase(), level);
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn lints_table(toml_str: &str) -> LintOverrides {
        let doc: toml::Value = toml::from_str(toml_str).unwrap();
        let table = doc.get("lints").unwrap().as_table().unwrap();
        let mut config = LintOverrides::default();
        merge_toml_table(&mut config, table);
        config
    }

    #[test]
    fn test_parse_simple_levels() {
        let config = lints_table(
            r#"
[lints]
all = "warn"
reliability = "deny"
data-access = "forbid"
fainf0002 = "allow"
"#,
        );

        assert_eq!(config.all, Some(LintLevel::Warn));
        assert_eq!(
            config.categories.get(&RuleCategory::Reliability),
            Some(&LintLevel::Deny)
        );
        assert_eq!(
            config.categories.get(&RuleCategory::DataAccess),
            Some(&LintLevel::Forbid)
        );
        assert_eq!(config.rules.get("FAINF0002"), Some(&LintLevel::Allow));
    }

    #[test]
    fn test_parse_table_form() {
        let config = lints_table(
            r#"
[lints]
security = { level = "deny" }
FAWRN0001 = { priority = 1 }
"#,
        );
        assert_eq!(
            config.categories.get(&RuleCategory::Security),
            Some(&LintLevel::Deny)
        );
        assert!(config.rules.is_empty());
    }

    #[test]
    fn test_effective_level_precedence() {
        let mut config = LintOverrides::default();
        config.all = Some(LintLevel::Warn);
        config
            .categories
            .insert(RuleCategory::Reliability, LintLevel::Deny);
        config
            .rules
            .insert("FAINF0001".to_string(), LintLevel::Allow);

        assert_eq!(
            config.effective_level("FAINF0001", RuleCategory::Reliability),
            Some(LintLevel::Allow)
        );
        assert_eq!(
            config.effective_level("FAINF0003", RuleCategory::Reliability),
            Some(LintLevel::Deny)
        );
        assert_eq!(
            config.effective_level("FAWRN0001", RuleCategory::DataAccess),
            Some(LintLevel::Warn)
        );
        assert_eq!(
            LintOverrides::default().effective_level("FAWRN0001", RuleCategory::DataAccess),
            None
        );
    }

    #[test]
    fn test_discovery_merges_closest_last_and_stops_at_root() {
        let temp = tempfile::tempdir().unwrap();
        let outer = temp.path();
        let project = outer.join("repo");
        let src = project.join("src");
        std::fs::create_dir_all(&src).unwrap();

        std::fs::write(outer.join(CONFIG_FILE), "[lints]\nsecurity = \"deny\"\n").unwrap();
        std::fs::write(
            project.join(CONFIG_FILE),
            "root = true\n[lints]\nall = \"warn\"\nFAINF0002 = \"deny\"\n",
        )
        .unwrap();
        std::fs::write(src.join(CONFIG_FILE), "[lints]\nFAINF0002 = \"allow\"\n").unwrap();
        std::fs::write(src.join("Service.cs"), "class Service {}").unwrap();

        let config = discover_config(&src.join("Service.cs")).unwrap();
        assert_eq!(config.sources.len(), 2);
        assert_eq!(config.all, Some(LintLevel::Warn));
        assert_eq!(config.rules.get("FAINF0002"), Some(&LintLevel::Allow));
        assert!(config.categories.is_empty());
    }

    #[test]
    fn test_invalid_toml_reports_path() {
        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join(CONFIG_FILE);
        std::fs::write(&path, "[lints\nall = ").unwrap();
        let err = load_config(&path).unwrap_err();
        assert!(format!("{err}").contains(CONFIG_FILE));
    }
}
