//! FAINF0002: raw SQL through Entity Framework Core.

use super::{
    AnalysisContext, Analyzer, Finding, RuleCategory, RuleDescriptor, RuleSession, RuleSeverity,
};
use crate::semantic::{SymbolResolver, Ty, TypeLookup};
use crate::syntax::visit::invocations;
use crate::syntax::{Expr, ExprKind};

pub static DESCRIPTOR: RuleDescriptor = RuleDescriptor {
    id: "FAINF0002",
    name: "Raw SQL query",
    category: RuleCategory::Security,
    severity: RuleSeverity::Warning,
    description: "FromSqlRaw, SqlQueryRaw and ExecuteSqlRaw take SQL text as-is. Building that \
                  text from user input opens the query to SQL injection.",
    fix_template: Some("context.Set<Entity>().FromSql($\"SELECT * FROM Entity WHERE Id = {id}\")"),
};

const EF_CORE_NAMESPACE: &str = "Microsoft.EntityFrameworkCore";

const RAW_SQL_METHODS: &[&str] = &[
    "FromSqlRaw",
    "SqlQueryRaw",
    "ExecuteSqlRaw",
    "ExecuteSqlRawAsync",
];

pub struct RawSqlAnalyzer;

impl Analyzer for RawSqlAnalyzer {
    fn descriptor(&self) -> &'static RuleDescriptor {
        &DESCRIPTOR
    }

    fn start(&self, _types: &dyn TypeLookup) -> Option<Box<dyn RuleSession>> {
        Some(Box::new(RawSqlSession))
    }
}

struct RawSqlSession;

impl RuleSession for RawSqlSession {
    fn analyze(&self, ctx: &AnalysisContext<'_>) -> Vec<Finding> {
        let imports_ef = ctx
            .resolver
            .imported_namespaces()
            .iter()
            .any(|ns| ns == EF_CORE_NAMESPACE);
        invocations(ctx.unit)
            .into_iter()
            .filter_map(|call| check(call, ctx.resolver, imports_ef))
            .collect()
    }
}

/// A raw-SQL call is reported when it binds to a method declared in the EF
/// Core namespace, or, when it binds to nothing in source, when EF Core is
/// what the receiver or the document's imports point at.
fn check(call: &Expr, resolver: &dyn SymbolResolver, imports_ef: bool) -> Option<Finding> {
    let ExprKind::Invocation { callee, .. } = &call.kind else {
        return None;
    };
    let name = call.invoked_name()?;
    if !RAW_SQL_METHODS.contains(&name.name()) {
        return None;
    }

    let from_ef = match resolver.method_of(call) {
        Some(method) => resolver.namespace_of(method.containing_def).as_deref() == Some(EF_CORE_NAMESPACE),
        None => imports_ef || receiver_is_external_ef(callee, resolver),
    };
    if !from_ef {
        return None;
    }

    let span = match &callee.kind {
        ExprKind::MemberAccess { .. } => name.span,
        _ => call.span,
    };
    Some(Finding::new(
        span,
        format!(
            "{} runs raw SQL; pass an interpolated FromSql/SqlQuery string so values are parameterized",
            name.name()
        ),
    ))
}

fn receiver_is_external_ef(callee: &Expr, resolver: &dyn SymbolResolver) -> bool {
    let ExprKind::MemberAccess { target, .. } = &callee.kind else {
        return false;
    };
    matches!(
        resolver.type_of(target),
        Some(Ty::External { name, .. }) if name.starts_with(EF_CORE_NAMESPACE)
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::semantic::{Compilation, SemanticModel};
    use crate::syntax::parse;
    use std::path::Path;

    const EF_STUBS: &str = r#"
namespace Microsoft.EntityFrameworkCore
{
    public class DbContext
    {
        public DbSet<TEntity> Set<TEntity>() => default;
    }
    public class DbSet<TEntity>
    {
        public void FromSqlRaw(string sql) { }
        public void SqlQueryRaw(string sql) { }
    }
}

public class Entity { }
"#;

    fn findings(source: &str) -> Vec<String> {
        let unit = parse(source).unwrap().unit;
        let compilation = Compilation::new([&unit]);
        let model = SemanticModel::new(&compilation, &unit);
        let session = RawSqlAnalyzer.start(&compilation).unwrap();
        let ctx = AnalysisContext {
            path: Path::new("Queries.cs"),
            source,
            unit: &unit,
            resolver: &model,
        };
        session
            .analyze(&ctx)
            .into_iter()
            .map(|f| f.span.text(source).to_string())
            .collect()
    }

    #[test]
    fn test_source_declared_ef_methods_are_reported() {
        let source = format!(
            "{EF_STUBS}{}",
            r#"
public class TestClass
{
    private Microsoft.EntityFrameworkCore.DbContext _context;

    public void Execute()
    {
        _context.Set<Entity>().FromSqlRaw("SELECT * FROM Entity");
        _context.Set<Entity>().SqlQueryRaw("SELECT * FROM Entity");
    }
}
"#
        );
        assert_eq!(findings(&source), vec!["FromSqlRaw", "SqlQueryRaw"]);
    }

    #[test]
    fn test_lookalike_outside_ef_is_ignored() {
        let source = format!(
            "{EF_STUBS}{}",
            r#"
public class OtherLib
{
    public class DbSet<T>
    {
        public void FromSqlRaw(string sql) { }
        public void SqlQueryRaw(string sql) { }
    }
}

public class AnotherClass
{
    private OtherLib.DbSet<Entity> _set;

    public void Execute()
    {
        _set.FromSqlRaw("SELECT * FROM Entity");
        _set.SqlQueryRaw("SELECT * FROM Entity");
    }
}
"#
        );
        assert!(findings(&source).is_empty());
    }

    #[test]
    fn test_external_ef_calls_need_the_import() {
        let with_import = r#"
using Microsoft.EntityFrameworkCore;

public class Repo
{
    public void Purge(AppDbContext db) => db.Database.ExecuteSqlRaw("DELETE FROM Audit");
}
"#;
        assert_eq!(findings(with_import), vec!["ExecuteSqlRaw"]);

        let without_import = r#"
public class Repo
{
    public void Purge(Dapper.Connection db) => db.ExecuteSqlRaw("DELETE FROM Audit");
}
"#;
        assert!(findings(without_import).is_empty());
    }
}
