//! Read-only traversal over the syntax tree.
//!
//! Each `visit_*` method defaults to the matching `walk_*` function, so an
//! implementor overrides only the nodes it cares about and calls `walk_*`
//! to keep descending.

use super::ast::{
    Block, CompilationUnit, Expr, ExprKind, LambdaBody, MemberDecl, MethodBody, MethodDecl,
    NamespaceMember, Stmt, TypeDecl,
};
use super::TextSpan;

pub trait Visitor<'ast> {
    fn visit_unit(&mut self, unit: &'ast CompilationUnit) {
        walk_unit(self, unit);
    }

    fn visit_namespace_member(&mut self, member: &'ast NamespaceMember) {
        walk_namespace_member(self, member);
    }

    fn visit_type_decl(&mut self, decl: &'ast TypeDecl) {
        walk_type_decl(self, decl);
    }

    fn visit_member(&mut self, member: &'ast MemberDecl) {
        walk_member(self, member);
    }

    fn visit_method(&mut self, method: &'ast MethodDecl) {
        walk_method(self, method);
    }

    fn visit_block(&mut self, block: &'ast Block) {
        walk_block(self, block);
    }

    fn visit_stmt(&mut self, stmt: &'ast Stmt) {
        walk_stmt(self, stmt);
    }

    fn visit_expr(&mut self, expr: &'ast Expr) {
        walk_expr(self, expr);
    }
}

pub fn walk_unit<'ast, V: Visitor<'ast> + ?Sized>(v: &mut V, unit: &'ast CompilationUnit) {
    for member in &unit.members {
        v.visit_namespace_member(member);
    }
}

pub fn walk_namespace_member<'ast, V: Visitor<'ast> + ?Sized>(
    v: &mut V,
    member: &'ast NamespaceMember,
) {
    match member {
        NamespaceMember::Namespace(ns) => {
            for member in &ns.members {
                v.visit_namespace_member(member);
            }
        }
        NamespaceMember::Type(decl) => v.visit_type_decl(decl),
    }
}

pub fn walk_type_decl<'ast, V: Visitor<'ast> + ?Sized>(v: &mut V, decl: &'ast TypeDecl) {
    for param in &decl.primary_params {
        if let Some(default) = &param.default {
            v.visit_expr(default);
        }
    }
    for member in &decl.members {
        v.visit_member(member);
    }
}

pub fn walk_member<'ast, V: Visitor<'ast> + ?Sized>(v: &mut V, member: &'ast MemberDecl) {
    match member {
        MemberDecl::Field(field) => {
            if let Some(init) = &field.initializer {
                v.visit_expr(init);
            }
        }
        MemberDecl::Property(prop) => {
            if let Some(init) = &prop.initializer {
                v.visit_expr(init);
            }
            if let Some(body) = &prop.expression_body {
                v.visit_expr(body);
            }
            for accessor in &prop.accessors {
                match accessor {
                    MethodBody::Block(block) => v.visit_block(block),
                    MethodBody::Expr(expr) => v.visit_expr(expr),
                }
            }
        }
        MemberDecl::Method(method) => v.visit_method(method),
        MemberDecl::Type(decl) => v.visit_type_decl(decl),
    }
}

pub fn walk_method<'ast, V: Visitor<'ast> + ?Sized>(v: &mut V, method: &'ast MethodDecl) {
    for param in &method.params {
        if let Some(default) = &param.default {
            v.visit_expr(default);
        }
    }
    match &method.body {
        Some(MethodBody::Block(block)) => v.visit_block(block),
        Some(MethodBody::Expr(expr)) => v.visit_expr(expr),
        None => {}
    }
}

pub fn walk_block<'ast, V: Visitor<'ast> + ?Sized>(v: &mut V, block: &'ast Block) {
    for stmt in &block.stmts {
        v.visit_stmt(stmt);
    }
}

pub fn walk_stmt<'ast, V: Visitor<'ast> + ?Sized>(v: &mut V, stmt: &'ast Stmt) {
    match stmt {
        Stmt::Local(local) => {
            if let Some(init) = &local.init {
                v.visit_expr(init);
            }
        }
        Stmt::Expr(expr) => v.visit_expr(expr),
        Stmt::Return { value, .. } | Stmt::Throw { value, .. } => {
            if let Some(value) = value {
                v.visit_expr(value);
            }
        }
        Stmt::If {
            cond,
            then,
            otherwise,
            ..
        } => {
            v.visit_expr(cond);
            v.visit_stmt(then);
            if let Some(otherwise) = otherwise {
                v.visit_stmt(otherwise);
            }
        }
        Stmt::Foreach { iterable, body, .. } => {
            v.visit_expr(iterable);
            v.visit_stmt(body);
        }
        Stmt::For {
            init,
            cond,
            step,
            body,
            ..
        } => {
            for stmt in init {
                v.visit_stmt(stmt);
            }
            if let Some(cond) = cond {
                v.visit_expr(cond);
            }
            for expr in step {
                v.visit_expr(expr);
            }
            v.visit_stmt(body);
        }
        Stmt::While { cond, body, .. } => {
            v.visit_expr(cond);
            v.visit_stmt(body);
        }
        Stmt::Using { resource, body, .. } => {
            v.visit_stmt(resource);
            if let Some(body) = body {
                v.visit_stmt(body);
            }
        }
        Stmt::Try {
            body,
            catches,
            finally,
            ..
        } => {
            v.visit_block(body);
            for catch in catches {
                v.visit_block(&catch.body);
            }
            if let Some(finally) = finally {
                v.visit_block(finally);
            }
        }
        Stmt::Switch {
            value, sections, ..
        } => {
            v.visit_expr(value);
            for section in sections {
                for label in &section.labels {
                    v.visit_expr(label);
                }
                for stmt in &section.stmts {
                    v.visit_stmt(stmt);
                }
            }
        }
        Stmt::Block(block) => v.visit_block(block),
        Stmt::Jump(_) | Stmt::Error(_) => {}
    }
}

pub fn walk_expr<'ast, V: Visitor<'ast> + ?Sized>(v: &mut V, expr: &'ast Expr) {
    match &expr.kind {
        ExprKind::Name(_)
        | ExprKind::GenericName { .. }
        | ExprKind::Literal(_)
        | ExprKind::This
        | ExprKind::Base
        | ExprKind::Default(_)
        | ExprKind::TypeOf(_) => {}
        ExprKind::MemberAccess { target, .. } => v.visit_expr(target),
        ExprKind::Invocation { callee, args } => {
            v.visit_expr(callee);
            for arg in args {
                v.visit_expr(&arg.value);
            }
        }
        ExprKind::ElementAccess { target, args, .. } => {
            v.visit_expr(target);
            for arg in args {
                v.visit_expr(&arg.value);
            }
        }
        ExprKind::Lambda(lambda) => match &lambda.body {
            LambdaBody::Expr(body) => v.visit_expr(body),
            LambdaBody::Block(block) => v.visit_block(block),
        },
        ExprKind::Unary { operand, .. }
        | ExprKind::Cast { operand, .. }
        | ExprKind::Is { operand, .. }
        | ExprKind::As { operand, .. } => v.visit_expr(operand),
        ExprKind::Paren(inner) | ExprKind::Throw(inner) => v.visit_expr(inner),
        ExprKind::Binary { lhs, rhs, .. } => {
            v.visit_expr(lhs);
            v.visit_expr(rhs);
        }
        ExprKind::Assign { target, value } => {
            v.visit_expr(target);
            v.visit_expr(value);
        }
        ExprKind::Conditional {
            cond,
            then,
            otherwise,
        } => {
            v.visit_expr(cond);
            v.visit_expr(then);
            v.visit_expr(otherwise);
        }
        ExprKind::New {
            args, initializer, ..
        } => {
            for arg in args {
                v.visit_expr(&arg.value);
            }
            for item in initializer {
                v.visit_expr(item);
            }
        }
        ExprKind::Other { operands } => {
            for operand in operands {
                v.visit_expr(operand);
            }
        }
    }
}

struct ExprCallback<F>(F);

impl<'ast, F: FnMut(&'ast Expr)> Visitor<'ast> for ExprCallback<F> {
    fn visit_expr(&mut self, expr: &'ast Expr) {
        (self.0)(expr);
        walk_expr(self, expr);
    }
}

/// Call `f` on `expr` and every expression nested inside it, including
/// the bodies of nested lambdas, in pre-order.
pub fn walk_descendants<'ast>(expr: &'ast Expr, f: impl FnMut(&'ast Expr)) {
    ExprCallback(f).visit_expr(expr);
}

/// Every expression in the document, in pre-order.
pub fn each_expr<'ast>(unit: &'ast CompilationUnit, f: impl FnMut(&'ast Expr)) {
    ExprCallback(f).visit_unit(unit);
}

/// All invocation expressions in the document, outermost first.
pub fn invocations(unit: &CompilationUnit) -> Vec<&Expr> {
    let mut found = Vec::new();
    each_expr(unit, |expr| {
        if expr.is_invocation() {
            found.push(expr);
        }
    });
    found
}

/// The invocation whose invoked member name sits exactly at `name_span`.
pub fn invocation_named_at(unit: &CompilationUnit, name_span: TextSpan) -> Option<&Expr> {
    invocations(unit)
        .into_iter()
        .find(|call| call.invoked_name().is_some_and(|name| name.span == name_span))
}
