use crate::semantic::{MemberId, SymbolResolver};
use crate::syntax::ast::{Lambda, LambdaBody, Stmt};
use crate::syntax::visit::walk_descendants;
use crate::syntax::{Expr, ExprKind, TextSpan};

/// The filter lambda passed to an access call.
#[derive(Debug, Clone, Copy)]
pub struct Predicate<'a> {
    pub lambda: &'a Lambda,
    /// Name of the single lambda parameter, as written.
    pub parameter: &'a str,
    /// The logical body: the expression body, or the value of the sole
    /// `return` of a block body.
    pub body: &'a Expr,
}

impl Predicate<'_> {
    /// Span of the lambda body as written, braces included for a block body.
    pub fn body_span(&self) -> TextSpan {
        self.lambda.body.span()
    }
}

/// The first lambda argument of `call`, if it has exactly one parameter and
/// a body that reduces to a single expression.
pub fn extract(call: &Expr) -> Option<Predicate<'_>> {
    let ExprKind::Invocation { args, .. } = &call.kind else {
        return None;
    };
    let lambda = args.iter().find_map(|arg| match &arg.value.kind {
        ExprKind::Lambda(lambda) => Some(lambda),
        _ => None,
    })?;

    let [param] = lambda.params.as_slice() else {
        return None;
    };

    let body = match &lambda.body {
        LambdaBody::Expr(expr) => expr.as_ref(),
        LambdaBody::Block(block) => match block.stmts.as_slice() {
            [Stmt::Return {
                value: Some(value), ..
            }] => value,
            _ => return None,
        },
    };

    Some(Predicate {
        lambda,
        parameter: param.name.text.as_str(),
        body,
    })
}

/// Members reached through member-access expressions anywhere in `body`,
/// in first-occurrence order, each once.
pub fn referenced_members(body: &Expr, resolver: &(impl SymbolResolver + ?Sized)) -> Vec<MemberId> {
    let mut members = Vec::new();
    walk_descendants(body, |expr| {
        if !matches!(expr.kind, ExprKind::MemberAccess { .. }) {
            return;
        }
        if let Some(member) = resolver.member_of(expr) {
            if !members.contains(&member) {
                members.push(member);
            }
        }
    });
    members
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::syntax::parse_expression;

    fn parameter_and_body(source: &str) -> Option<(String, String)> {
        let call = parse_expression(source).unwrap();
        let predicate = extract(&call)?;
        Some((
            predicate.parameter.to_string(),
            predicate.body.span.text(source).to_string(),
        ))
    }

    #[test]
    fn test_expression_bodied_lambda() {
        assert_eq!(
            parameter_and_body(r#"h.FindList(m => m.Name == "Test")"#),
            Some(("m".to_string(), r#"m.Name == "Test""#.to_string()))
        );
    }

    #[test]
    fn test_first_lambda_argument_wins() {
        assert_eq!(
            parameter_and_body("h.Find(10, x => x.Id > 0, y => y.Id < 5)"),
            Some(("x".to_string(), "x.Id > 0".to_string()))
        );
    }

    #[test]
    fn test_parenthesized_and_typed_parameter() {
        assert_eq!(
            parameter_and_body("h.Find((Model m) => m.Id == 1)"),
            Some(("m".to_string(), "m.Id == 1".to_string()))
        );
        assert_eq!(
            parameter_and_body("h.Find((m) => m.Id == 1)"),
            Some(("m".to_string(), "m.Id == 1".to_string()))
        );
    }

    #[test]
    fn test_block_body_with_sole_return() {
        let source = "h.Find(m => { return m.Id == 1; })";
        let call = parse_expression(source).unwrap();
        let predicate = extract(&call).unwrap();
        assert_eq!(predicate.body.span.text(source), "m.Id == 1");
        assert_eq!(predicate.body_span().text(source), "{ return m.Id == 1; }");
    }

    #[test]
    fn test_unsupported_shapes() {
        assert_eq!(parameter_and_body("h.Find((a, b) => a.Id == b.Id)"), None);
        assert_eq!(parameter_and_body("h.Find(() => true)"), None);
        assert_eq!(parameter_and_body("h.Find(m => { var x = 1; return m.Id == x; })"), None);
        assert_eq!(parameter_and_body("h.Find(m => { return; })"), None);
        assert_eq!(parameter_and_body("h.Find(filter)"), None);
    }
}
