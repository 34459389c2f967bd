//! FAWRN0001: data-access predicates that skip required entity fields.
//!
//! A call on `IDataHandler<TEntity>` whose first lambda argument never
//! touches one of the entity's `[NotOptional]` members is reported at the
//! method name. The [`fixer`] appends a placeholder comparison for each
//! missing member.

#[cfg(test)]
pub(crate) mod fake;
pub mod fixer;
pub mod metadata;
pub mod predicate;

use tracing::debug;

use self::metadata::{Anchors, EntityMetadata};
use self::predicate::Predicate;
use super::{
    AnalysisContext, Analyzer, Finding, RuleCategory, RuleDescriptor, RuleSession, RuleSeverity,
};
use crate::semantic::{MemberId, SymbolResolver, TypeLookup};
use crate::syntax::visit::invocations;
use crate::syntax::{Expr, ExprKind};

pub use self::fixer::{fix_at, synthesize_fix};

pub static DESCRIPTOR: RuleDescriptor = RuleDescriptor {
    id: "FAWRN0001",
    name: "Missing required properties",
    category: RuleCategory::DataAccess,
    severity: RuleSeverity::Warning,
    description: "Queries through IDataHandler<T> should filter on every property of T marked \
                  [NotOptional]. Leaving one out usually means a query that scans more rows \
                  than intended or crosses a tenant boundary.",
    fix_template: Some(
        "m => m.Name == \"Test\" && m.Id == /* FIXME: replace with actual value */ default",
    ),
};

pub struct RequiredFieldsAnalyzer;

impl Analyzer for RequiredFieldsAnalyzer {
    fn descriptor(&self) -> &'static RuleDescriptor {
        &DESCRIPTOR
    }

    fn start(&self, types: &dyn TypeLookup) -> Option<Box<dyn RuleSession>> {
        let anchors = Anchors::resolve(types);
        if anchors.is_none() {
            debug!("Access interface or marker attribute not declared; FAWRN0001 off");
        }
        Some(Box::new(RequiredFieldsSession { anchors: anchors? }))
    }
}

struct RequiredFieldsSession {
    anchors: Anchors,
}

impl RuleSession for RequiredFieldsSession {
    fn analyze(&self, ctx: &AnalysisContext<'_>) -> Vec<Finding> {
        invocations(ctx.unit)
            .into_iter()
            .filter_map(|call| check(call, ctx.resolver, self.anchors))
            .collect()
    }
}

/// Decide whether `call` is an access call whose predicate misses required
/// members.
pub fn check(
    call: &Expr,
    resolver: &(impl SymbolResolver + ?Sized),
    anchors: Anchors,
) -> Option<Finding> {
    let metadata = metadata::resolve(call, resolver, anchors)?;
    if metadata.required.is_empty() {
        return None;
    }
    let predicate = predicate::extract(call)?;

    let missing = missing_fields(&metadata, &predicate, resolver);
    if missing.is_empty() {
        return None;
    }

    let names: Vec<String> = missing
        .iter()
        .filter_map(|&member| resolver.member_name(member))
        .collect();
    debug!(method = %metadata.method.name, missing = ?names, "Predicate misses required fields");
    Some(Finding::new(
        location(call),
        format!(
            "{} call may be missing required field(s) {}",
            metadata.method.name,
            names.join(", ")
        ),
    ))
}

/// Required members the predicate never references, in required order.
pub(crate) fn missing_fields(
    metadata: &EntityMetadata,
    predicate: &Predicate<'_>,
    resolver: &(impl SymbolResolver + ?Sized),
) -> Vec<MemberId> {
    let referenced = predicate::referenced_members(predicate.body, resolver);
    metadata
        .required
        .iter()
        .copied()
        .filter(|member| !referenced.contains(member))
        .collect()
}

/// The method-name token for member calls, otherwise the whole invocation.
fn location(call: &Expr) -> crate::syntax::TextSpan {
    match &call.kind {
        ExprKind::Invocation { callee, .. } => match &callee.kind {
            ExprKind::MemberAccess { name, .. } => name.span,
            _ => call.span,
        },
        _ => call.span,
    }
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use super::fake::FakeModel;
    use super::*;
    use crate::semantic::{Builtin, Compilation, SemanticModel, Ty, TypeKind};
    use crate::syntax::{parse, parse_expression};

    const ANCHORS: &str = r#"
namespace FlowAccount.Core.Attributes
{
    public class NotOptionalAttribute : System.Attribute { }
}
namespace Flowaccount.Data
{
    public interface IDataHandler<T> where T : class
    {
        IList<T> FindList(Expression<Func<T, bool>> where);
    }
}
"#;

    fn run(source: &str, model: impl FnOnce(&Expr) -> FakeModel) -> Option<Finding> {
        let call = parse_expression(source).unwrap();
        let model = model(&call);
        let anchors = Anchors::resolve(&model)?;
        check(&call, &model, anchors)
    }

    /// Messages reported for `source` compiled together with the anchors.
    fn compiled(source: &str) -> Vec<String> {
        let source = format!("{ANCHORS}{source}");
        let unit = parse(&source).unwrap().unit;
        let compilation = Compilation::new([&unit]);
        let model = SemanticModel::new(&compilation, &unit);
        let session = RequiredFieldsAnalyzer.start(&compilation).unwrap();
        let ctx = AnalysisContext {
            path: Path::new("Example.cs"),
            source: &source,
            unit: &unit,
            resolver: &model,
        };
        session.analyze(&ctx).into_iter().map(|f| f.message).collect()
    }

    fn entity(required: &[&str], other: &[&str]) -> impl FnOnce(&Expr) -> FakeModel {
        let required: Vec<String> = required.iter().map(|s| s.to_string()).collect();
        let other: Vec<String> = other.iter().map(|s| s.to_string()).collect();
        move |call| {
            let required: Vec<&str> = required.iter().map(String::as_str).collect();
            let other: Vec<&str> = other.iter().map(String::as_str).collect();
            FakeModel::with_entity(&required, &other).bind(call)
        }
    }

    #[test]
    fn test_no_required_fields_never_fires() {
        for source in ["h.FindList(m => m.Name == \"a\")", "h.FindList(m => true)"] {
            assert_eq!(run(source, entity(&[], &["Id", "Name"])), None);
        }
    }

    #[test]
    fn test_all_required_referenced() {
        let source = r#"h.FindList(m => m.Id == 1 && m.Name == "Test")"#;
        assert_eq!(run(source, entity(&["Id"], &["Name"])), None);
    }

    #[test]
    fn test_missing_required_reported_at_method_name() {
        let source = r#"h.FindList(m => m.Name == "Test")"#;
        let finding = run(source, entity(&["Id"], &["Name"])).unwrap();
        assert_eq!(finding.span.text(source), "FindList");
        assert_eq!(finding.message, "FindList call may be missing required field(s) Id");
    }

    #[test]
    fn test_partially_referenced_still_fires() {
        let source = "h.FindList(m => m.Id == 1)";
        let finding = run(source, entity(&["Id", "Email", "TenantId"], &[])).unwrap();
        assert_eq!(
            finding.message,
            "FindList call may be missing required field(s) Email, TenantId"
        );
    }

    #[test]
    fn test_nested_member_with_same_name_does_not_count() {
        let source = "h.FindList(m => m.Parent.Id == 1)";
        assert!(run(source, entity(&["Id"], &["Parent"])).is_some());
    }

    #[test]
    fn test_value_type_entity_is_skipped() {
        let source = "h.FindList(m => m.Name == \"a\")";
        let finding = run(source, |call| {
            let (mut model, marker) = FakeModel::with_anchors();
            let point = model.add_type("Shop.Point", TypeKind::Struct);
            model.add_member(point, "Id", &[marker]);
            model.entity = Some(Ty::named(point, Vec::new()));
            model.bind(call)
        });
        assert_eq!(finding, None);

        let finding = run(source, |call| {
            let (mut model, _) = FakeModel::with_anchors();
            model.entity = Some(Ty::Builtin(Builtin::Int));
            model.bind(call)
        });
        assert_eq!(finding, None);
    }

    #[test]
    fn test_same_named_attribute_elsewhere_is_ignored() {
        let source = "h.FindList(m => m.Name == \"a\")";
        let finding = run(source, |call| {
            let (mut model, _) = FakeModel::with_anchors();
            let lookalike = model.add_type("Other.Attributes.NotOptionalAttribute", TypeKind::Class);
            let entity = model.add_type("Shop.Model", TypeKind::Class);
            model.add_member(entity, "Id", &[lookalike]);
            model.add_member(entity, "Name", &[]);
            model.entity = Some(Ty::named(entity, Vec::new()));
            model.bind(call)
        });
        assert_eq!(finding, None);
    }

    #[test]
    fn test_inherited_required_fields_participate() {
        let source = "h.FindList(m => m.Name == \"a\")";
        let finding = run(source, |call| {
            let (mut model, marker) = FakeModel::with_anchors();
            let base = model.add_type("Shop.Entity", TypeKind::Class);
            model.add_member(base, "TenantId", &[marker]);
            let entity = model.add_type("Shop.Model", TypeKind::Class);
            model.set_base(entity, base);
            model.add_member(entity, "Id", &[marker]);
            model.add_member(entity, "Name", &[]);
            model.entity = Some(Ty::named(entity, Vec::new()));
            model.bind(call)
        })
        .unwrap();
        assert_eq!(
            finding.message,
            "FindList call may be missing required field(s) Id, TenantId"
        );
    }

    #[test]
    fn test_hidden_base_member_is_not_required() {
        let source = "h.FindList(m => m.Name == \"a\")";
        let finding = run(source, |call| {
            let (mut model, marker) = FakeModel::with_anchors();
            let base = model.add_type("Shop.Entity", TypeKind::Class);
            model.add_member(base, "Id", &[marker]);
            model.add_member(base, "TenantId", &[marker]);
            let entity = model.add_type("Shop.Model", TypeKind::Class);
            model.set_base(entity, base);
            model.add_member(entity, "Id", &[]);
            model.add_member(entity, "Name", &[]);
            model.entity = Some(Ty::named(entity, Vec::new()));
            model.bind(call)
        })
        .unwrap();
        assert_eq!(
            finding.message,
            "FindList call may be missing required field(s) TenantId"
        );
    }

    #[test]
    fn test_hidden_member_in_source_is_not_required() {
        let messages = compiled(
            r#"
namespace Shop
{
    using FlowAccount.Core.Attributes;
    using Flowaccount.Data;

    public class Base
    {
        [NotOptional]
        public int Id { get; set; }
    }

    public class Model : Base
    {
        public new int Id { get; set; }
        public string Name { get; set; }
    }

    public class Service
    {
        private IDataHandler<Model> _h;

        public void Load() => _h.FindList(m => m.Name == "a");
    }
}
"#,
        );
        assert!(messages.is_empty(), "{messages:?}");
    }

    #[test]
    fn test_call_through_derived_interface_is_checked() {
        let messages = compiled(
            r#"
namespace Shop
{
    using FlowAccount.Core.Attributes;
    using Flowaccount.Data;

    public class Plain
    {
        [NotOptional]
        public int Id { get; set; }
        public string Name { get; set; }
    }

    public interface IPlainHandler : IDataHandler<Plain> { }

    public class Service
    {
        private IPlainHandler _h;

        public void Load() => _h.FindList(m => m.Name == "a");
    }
}
"#,
        );
        assert_eq!(
            messages,
            vec!["FindList call may be missing required field(s) Id"]
        );
    }

    #[test]
    fn test_calls_inside_switch_sections_are_checked() {
        let messages = compiled(
            r#"
namespace Shop
{
    using FlowAccount.Core.Attributes;
    using Flowaccount.Data;

    public class Plain
    {
        [NotOptional]
        public int Id { get; set; }
        public string Name { get; set; }
    }

    public class Service
    {
        private IDataHandler<Plain> _h;

        public void Load(int k)
        {
            switch (k)
            {
                case 1:
                    _h.FindList(m => m.Name == "a");
                    break;
                default:
                    _h.FindList(m => m.Id == 2);
                    break;
            }
        }
    }
}
"#,
        );
        assert_eq!(
            messages,
            vec!["FindList call may be missing required field(s) Id"]
        );
    }

    #[test]
    fn test_other_receivers_are_skipped() {
        let source = "h.FindList(m => m.Name == \"a\")";
        let finding = run(source, |call| {
            let mut model = FakeModel::with_entity(&["Id"], &["Name"]);
            let other = model.add_type("Shop.IRepository`1", TypeKind::Interface);
            model.access = Some(other);
            model.bind(call)
        });
        assert_eq!(finding, None);
    }

    #[test]
    fn test_unsupported_lambdas_are_skipped() {
        for source in [
            "h.FindList((a, b) => a.Name == b.Name)",
            "h.FindList(m => { var n = 1; return m.Name == null; })",
            "h.FindList()",
        ] {
            assert_eq!(run(source, entity(&["Id"], &["Name"])), None, "{source}");
        }
    }

    #[test]
    fn test_block_body_with_sole_return_is_checked() {
        let source = "h.FindList(m => { return m.Name == null; })";
        assert!(run(source, entity(&["Id"], &["Name"])).is_some());
    }

    #[test]
    fn test_missing_anchor_disables_rule() {
        let model = FakeModel::new();
        assert!(RequiredFieldsAnalyzer.start(&model).is_none());
        let (model, _) = FakeModel::with_anchors();
        assert!(RequiredFieldsAnalyzer.start(&model).is_some());
    }
}
