//! Rewrites a flagged predicate so it compares every required field.

use tracing::debug;

use super::metadata::{self, Anchors};
use super::predicate::{self, Predicate};
use super::missing_fields;
use crate::fix::TextEdit;
use crate::semantic::SymbolResolver;
use crate::syntax::ast::{BinaryOp, CompilationUnit};
use crate::syntax::visit::invocation_named_at;
use crate::syntax::{Expr, ExprKind, TextSpan};

/// Right-hand side of every synthesized comparison.
pub const PLACEHOLDER: &str = "/* FIXME: replace with actual value */ default";

/// Title of the quick fix.
pub const FIX_TITLE: &str = "Add missing required properties to lambda";

/// Build the edit that appends a placeholder comparison for every missing
/// required field to the predicate of `call`.
///
/// Resolution is redone from scratch; `None` when the call no longer
/// qualifies or nothing is missing.
pub fn synthesize_fix(
    call: &Expr,
    source: &str,
    resolver: &(impl SymbolResolver + ?Sized),
) -> Option<TextEdit> {
    let anchors = Anchors::resolve(resolver)?;
    let metadata = metadata::resolve(call, resolver, anchors)?;
    let predicate = predicate::extract(call)?;

    let missing = missing_fields(&metadata, &predicate, resolver);
    if missing.is_empty() {
        debug!(call = %call.span, "Nothing left to add");
        return None;
    }

    let names: Vec<String> = missing
        .iter()
        .filter_map(|&member| resolver.member_name(member))
        .collect();
    Some(TextEdit::new(
        predicate.body_span(),
        combine(&predicate, source, &names),
    ))
}

/// Locate the invocation whose method name sits at `name_span` and build
/// its fix. Diagnostics on non-member calls point at the whole invocation,
/// so that span is accepted too.
pub fn fix_at(
    unit: &CompilationUnit,
    span: TextSpan,
    source: &str,
    resolver: &(impl SymbolResolver + ?Sized),
) -> Option<TextEdit> {
    let call = invocation_named_at(unit, span).or_else(|| {
        crate::syntax::visit::invocations(unit)
            .into_iter()
            .find(|call| call.span == span)
    })?;
    synthesize_fix(call, source, resolver)
}

/// The original body followed by one `&&` term per missing field, all on
/// the original line.
fn combine(predicate: &Predicate<'_>, source: &str, fields: &[String]) -> String {
    let original = predicate.body.span.text(source);
    let mut combined = if binds_looser_than_and(predicate.body) {
        format!("({original})")
    } else {
        original.to_string()
    };
    for field in fields {
        combined.push_str(" && ");
        combined.push_str(predicate.parameter);
        combined.push('.');
        combined.push_str(field);
        combined.push_str(" == ");
        combined.push_str(PLACEHOLDER);
    }
    combined
}

/// Whether `expr` would regroup if it became the left operand of `&&`.
fn binds_looser_than_and(expr: &Expr) -> bool {
    match &expr.kind {
        ExprKind::Binary { op, .. } => op.precedence() < BinaryOp::And.precedence(),
        ExprKind::Conditional { .. }
        | ExprKind::Assign { .. }
        | ExprKind::Lambda(_)
        | ExprKind::Throw(_)
        | ExprKind::Other { .. } => true,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::required_fields::fake::FakeModel;
    use crate::syntax::parse_expression;

    fn fix(source: &str, required: &[&str], other: &[&str]) -> Option<String> {
        let call = parse_expression(source).unwrap();
        let model = FakeModel::with_entity(required, other).bind(&call);
        synthesize_fix(&call, source, &model).map(|edit| edit.apply(source))
    }

    #[test]
    fn test_appends_missing_fields_in_declaration_order() {
        let fixed = fix(r#"h.FindList(m => m.Name == "Test")"#, &["Id", "Email"], &["Name"]);
        assert_eq!(
            fixed.as_deref(),
            Some(
                r#"h.FindList(m => m.Name == "Test" && m.Id == /* FIXME: replace with actual value */ default && m.Email == /* FIXME: replace with actual value */ default)"#
            )
        );
    }

    #[test]
    fn test_only_missing_fields_are_added() {
        let fixed = fix("h.FindList(m => m.Email != null)", &["Id", "Email"], &[]).unwrap();
        assert!(fixed.contains("m.Email != null && m.Id == "));
        assert!(!fixed.contains("m.Email == "));
    }

    #[test]
    fn test_nothing_missing_is_no_fix() {
        assert_eq!(fix("h.FindList(m => m.Id == 1)", &["Id"], &["Name"]), None);
    }

    #[test]
    fn test_looser_operators_are_parenthesized() {
        let fixed = fix("h.FindList(m => m.Name == null || m.Name == \"a\")", &["Id"], &["Name"]).unwrap();
        assert!(fixed.starts_with("h.FindList(m => (m.Name == null || m.Name == \"a\") && m.Id == "));

        let fixed = fix("h.FindList(m => m.Name == null && m.Age > 3)", &["Id"], &["Name", "Age"]).unwrap();
        assert!(fixed.starts_with("h.FindList(m => m.Name == null && m.Age > 3 && m.Id == "));
    }

    #[test]
    fn test_block_body_collapses_to_expression() {
        let fixed = fix("h.FindList(x => { return x.Name == \"a\"; })", &["Id"], &["Name"]).unwrap();
        assert_eq!(
            fixed,
            "h.FindList(x => x.Name == \"a\" && x.Id == /* FIXME: replace with actual value */ default)"
        );
    }

    #[test]
    fn test_multiline_body_keeps_its_layout() {
        let source = "h.FindList(m =>\n    m.Name == \"a\")";
        let fixed = fix(source, &["Id"], &["Name"]).unwrap();
        assert!(fixed.starts_with("h.FindList(m =>\n    m.Name == \"a\" && m.Id == "));
    }

    #[test]
    fn test_fix_is_idempotent() {
        let first = fix(r#"h.FindList(m => m.Name == "Test")"#, &["Id", "Email"], &["Name"]).unwrap();
        assert_eq!(fix(&first, &["Id", "Email"], &["Name"]), None);
    }
}
