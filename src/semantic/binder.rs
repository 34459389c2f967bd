use std::collections::{BTreeSet, HashMap};

use super::compilation::{Compilation, MemberKind, TypeContext};
use super::resolver::{MethodSymbol, Symbol, SymbolResolver, TypeLookup};
use super::types::{Builtin, MemberId, Ty, TypeId, TypeKind};
use crate::syntax::ast::{
    Argument, BinaryOp, Block, CompilationUnit, Expr, ExprId, ExprKind, Ident, Lambda, LambdaBody,
    Literal, MemberDecl, MethodBody, NamespaceMember, Stmt, TypeDecl, TypeSyntax, UnaryOp,
};

/// Binding results for one document against a shared [`Compilation`].
///
/// Every method body, initializer and lambda is bound once up front; the
/// query methods are plain table lookups keyed by [`ExprId`].
#[derive(Debug)]
pub struct SemanticModel<'c> {
    compilation: &'c Compilation,
    symbols: HashMap<ExprId, Symbol>,
    types: HashMap<ExprId, Ty>,
    methods: HashMap<ExprId, MethodSymbol>,
    imports: BTreeSet<String>,
}

impl<'c> SemanticModel<'c> {
    pub fn new(compilation: &'c Compilation, unit: &CompilationUnit) -> Self {
        let mut binder = Binder {
            compilation,
            ctx: TypeContext::for_unit(unit),
            frames: Vec::new(),
            symbols: HashMap::new(),
            types: HashMap::new(),
            methods: HashMap::new(),
            imports: BTreeSet::new(),
        };
        binder.record_imports();
        binder.bind_namespace_members(&unit.members);

        SemanticModel {
            compilation,
            symbols: binder.symbols,
            types: binder.types,
            methods: binder.methods,
            imports: binder.imports,
        }
    }

    pub fn compilation(&self) -> &'c Compilation {
        self.compilation
    }

    pub fn symbol(&self, id: ExprId) -> Option<&Symbol> {
        self.symbols.get(&id)
    }

    pub fn ty(&self, id: ExprId) -> Option<&Ty> {
        self.types.get(&id)
    }

    pub fn method(&self, id: ExprId) -> Option<&MethodSymbol> {
        self.methods.get(&id)
    }
}

impl TypeLookup for Compilation {
    fn type_by_metadata_name(&self, name: &str) -> Option<TypeId> {
        Compilation::type_by_metadata_name(self, name)
    }
}

impl TypeLookup for SemanticModel<'_> {
    fn type_by_metadata_name(&self, name: &str) -> Option<TypeId> {
        self.compilation.type_by_metadata_name(name)
    }
}

impl SymbolResolver for SemanticModel<'_> {
    fn method_of(&self, call: &Expr) -> Option<MethodSymbol> {
        self.methods.get(&call.id).cloned()
    }

    fn symbol_of(&self, expr: &Expr) -> Option<Symbol> {
        self.symbols.get(&expr.id).cloned()
    }

    fn type_of(&self, expr: &Expr) -> Option<Ty> {
        self.types.get(&expr.id).cloned()
    }

    fn type_kind(&self, ty: &Ty) -> TypeKind {
        self.compilation.type_kind(ty)
    }

    fn data_members(&self, def: TypeId) -> Vec<MemberId> {
        self.compilation.data_members(def)
    }

    fn has_attribute(&self, member: MemberId, attribute: TypeId) -> bool {
        self.compilation.member(member).attributes.contains(&attribute)
    }

    fn member_name(&self, member: MemberId) -> Option<String> {
        Some(self.compilation.member(member).name.clone())
    }

    fn namespace_of(&self, def: TypeId) -> Option<String> {
        Some(self.compilation.type_symbol(def).namespace.clone())
    }

    fn imported_namespaces(&self) -> Vec<String> {
        self.imports.iter().cloned().collect()
    }
}

/// How a member-access target was classified.
enum Receiver {
    Instance(Ty),
    Static(Ty),
}

impl Receiver {
    fn ty(&self) -> &Ty {
        match self {
            Receiver::Instance(ty) | Receiver::Static(ty) => ty,
        }
    }
}

struct Binder<'c> {
    compilation: &'c Compilation,
    ctx: TypeContext,
    frames: Vec<Vec<(String, Ty)>>,
    symbols: HashMap<ExprId, Symbol>,
    types: HashMap<ExprId, Ty>,
    methods: HashMap<ExprId, MethodSymbol>,
    imports: BTreeSet<String>,
}

impl<'c> Binder<'c> {
    fn record_imports(&mut self) {
        for level in &self.ctx.levels {
            self.imports
                .extend(level.imported_namespaces().map(str::to_string));
        }
    }

    // -----------------------------------------------------------------
    // Declarations
    // -----------------------------------------------------------------

    fn bind_namespace_members(&mut self, members: &[NamespaceMember]) {
        for member in members {
            match member {
                NamespaceMember::Namespace(ns) => {
                    self.ctx.enter_namespace(&ns.name.dotted(), &ns.usings);
                    self.record_imports();
                    self.bind_namespace_members(&ns.members);
                    self.ctx.levels.pop();
                }
                NamespaceMember::Type(decl) => self.bind_type(decl),
            }
        }
    }

    fn bind_type(&mut self, decl: &TypeDecl) {
        let Some(id) = self.compilation.declared_id(decl, &self.ctx) else {
            return;
        };
        self.ctx.enclosing.push(id);
        self.frames.push(Vec::new());
        for param in &decl.primary_params {
            let ty = self.compilation.resolve_type(&param.ty, &self.ctx);
            self.declare_local(param.name.name(), ty);
        }

        for member in &decl.members {
            match member {
                MemberDecl::Field(field) => {
                    if let Some(init) = &field.initializer {
                        let expected = self.resolve(&field.ty);
                        self.bind_expr(init, Some(&expected));
                    }
                }
                MemberDecl::Property(prop) => {
                    let expected = self.resolve(&prop.ty);
                    for body in [&prop.initializer, &prop.expression_body].into_iter().flatten() {
                        self.bind_expr(body, Some(&expected));
                    }
                    for accessor in &prop.accessors {
                        self.frames.push(Vec::new());
                        self.declare_local("value", expected.clone());
                        match accessor {
                            MethodBody::Block(block) => self.bind_block(block),
                            MethodBody::Expr(expr) => {
                                self.bind_expr(expr, None);
                            }
                        }
                        self.frames.pop();
                    }
                }
                MemberDecl::Method(method) => {
                    self.ctx.method_type_params =
                        method.type_params.iter().map(|p| p.name().to_string()).collect();
                    self.frames.push(Vec::new());
                    for param in &method.params {
                        let ty = self.resolve(&param.ty);
                        if let Some(default) = &param.default {
                            self.bind_expr(default, Some(&ty));
                        }
                        self.declare_local(param.name.name(), ty);
                    }
                    match &method.body {
                        Some(MethodBody::Block(block)) => self.bind_block(block),
                        Some(MethodBody::Expr(expr)) => {
                            self.bind_expr(expr, None);
                        }
                        None => {}
                    }
                    self.frames.pop();
                    self.ctx.method_type_params.clear();
                }
                MemberDecl::Type(nested) => self.bind_type(nested),
            }
        }

        self.frames.pop();
        self.ctx.enclosing.pop();
    }

    // -----------------------------------------------------------------
    // Statements
    // -----------------------------------------------------------------

    fn bind_block(&mut self, block: &Block) {
        self.frames.push(Vec::new());
        for stmt in &block.stmts {
            self.bind_stmt(stmt);
        }
        self.frames.pop();
    }

    fn bind_stmt(&mut self, stmt: &Stmt) {
        match stmt {
            Stmt::Local(local) => {
                let declared = local.ty.as_ref().map(|ty| self.resolve(ty));
                let init = local
                    .init
                    .as_ref()
                    .map(|init| self.bind_expr(init, declared.as_ref()));
                let ty = declared.or(init).unwrap_or(Ty::Unknown);
                self.declare_local(local.name.name(), ty);
            }
            Stmt::Expr(expr) => {
                self.bind_expr(expr, None);
            }
            Stmt::Return { value, .. } | Stmt::Throw { value, .. } => {
                if let Some(value) = value {
                    self.bind_expr(value, None);
                }
            }
            Stmt::If {
                cond,
                then,
                otherwise,
                ..
            } => {
                self.bind_expr(cond, Some(&Ty::Builtin(Builtin::Bool)));
                self.bind_scoped(then);
                if let Some(otherwise) = otherwise {
                    self.bind_scoped(otherwise);
                }
            }
            Stmt::Foreach {
                ty,
                name,
                iterable,
                body,
                ..
            } => {
                let collection = self.bind_expr(iterable, None);
                let element = match ty {
                    Some(ty) => self.resolve(ty),
                    None => element_type(&collection),
                };
                self.frames.push(Vec::new());
                self.declare_local(name.name(), element);
                self.bind_stmt(body);
                self.frames.pop();
            }
            Stmt::For {
                init,
                cond,
                step,
                body,
                ..
            } => {
                self.frames.push(Vec::new());
                for stmt in init {
                    self.bind_stmt(stmt);
                }
                if let Some(cond) = cond {
                    self.bind_expr(cond, None);
                }
                for expr in step {
                    self.bind_expr(expr, None);
                }
                self.bind_stmt(body);
                self.frames.pop();
            }
            Stmt::While { cond, body, .. } => {
                self.bind_expr(cond, None);
                self.bind_scoped(body);
            }
            Stmt::Using { resource, body, .. } => match body {
                Some(body) => {
                    self.frames.push(Vec::new());
                    self.bind_stmt(resource);
                    self.bind_stmt(body);
                    self.frames.pop();
                }
                // `using var x = ...;` declares into the enclosing block.
                None => self.bind_stmt(resource),
            },
            Stmt::Try {
                body,
                catches,
                finally,
                ..
            } => {
                self.bind_block(body);
                for catch in catches {
                    self.frames.push(Vec::new());
                    if let (Some(ty), Some(name)) = (&catch.ty, &catch.name) {
                        let ty = self.resolve(ty);
                        self.declare_local(name.name(), ty);
                    }
                    self.bind_block(&catch.body);
                    self.frames.pop();
                }
                if let Some(finally) = finally {
                    self.bind_block(finally);
                }
            }
            Stmt::Switch {
                value, sections, ..
            } => {
                let value_ty = self.bind_expr(value, None);
                let expected = (!value_ty.is_unknown()).then_some(&value_ty);
                // Locals declared in one section are in scope for the others.
                self.frames.push(Vec::new());
                for section in sections {
                    for label in &section.labels {
                        self.bind_expr(label, expected);
                    }
                    for stmt in &section.stmts {
                        self.bind_stmt(stmt);
                    }
                }
                self.frames.pop();
            }
            Stmt::Block(block) => self.bind_block(block),
            Stmt::Jump(_) | Stmt::Error(_) => {}
        }
    }

    fn bind_scoped(&mut self, stmt: &Stmt) {
        self.frames.push(Vec::new());
        self.bind_stmt(stmt);
        self.frames.pop();
    }

    // -----------------------------------------------------------------
    // Expressions
    // -----------------------------------------------------------------

    fn bind_expr(&mut self, expr: &Expr, expected: Option<&Ty>) -> Ty {
        let ty = self.bind_expr_kind(expr, expected);
        if !ty.is_unknown() {
            self.types.insert(expr.id, ty.clone());
        }
        ty
    }

    fn bind_expr_kind(&mut self, expr: &Expr, expected: Option<&Ty>) -> Ty {
        match &expr.kind {
            ExprKind::Literal(literal) => literal_type(literal),
            ExprKind::Name(name) => self.bind_name(expr, name),
            ExprKind::GenericName { name, type_args } => {
                let args = type_args.iter().map(|t| self.resolve(t)).collect();
                let ty = self.compilation.resolve_path(&[name.name()], args, &self.ctx);
                self.symbols.insert(expr.id, Symbol::Type(ty));
                Ty::Unknown
            }
            ExprKind::This => self.this_type(),
            ExprKind::Base => self.base_type(),
            ExprKind::MemberAccess { target, name, .. } => {
                self.bind_member_access(expr, target, name)
            }
            ExprKind::Invocation { callee, args } => self.bind_invocation(expr, callee, args),
            ExprKind::ElementAccess { target, args, .. } => {
                let target_ty = self.bind_expr(target, None);
                self.bind_args_unexpected(args);
                match target_ty {
                    Ty::Array(elem) => *elem,
                    _ => Ty::Unknown,
                }
            }
            ExprKind::Lambda(lambda) => {
                self.bind_lambda(lambda, expected);
                expected.cloned().unwrap_or(Ty::Unknown)
            }
            ExprKind::Unary { op, operand } => {
                let operand_ty = self.bind_expr(operand, None);
                match op {
                    UnaryOp::Not => Ty::Builtin(Builtin::Bool),
                    UnaryOp::Await => awaited_type(&operand_ty),
                    _ => operand_ty,
                }
            }
            ExprKind::Binary { op, lhs, rhs } => {
                let lhs_ty = self.bind_expr(lhs, None);
                let rhs_ty = self.bind_expr(rhs, Some(&lhs_ty));
                match op {
                    op if op.is_comparison() => Ty::Builtin(Builtin::Bool),
                    BinaryOp::Coalesce => {
                        if lhs_ty.is_unknown() {
                            rhs_ty
                        } else {
                            lhs_ty
                        }
                    }
                    BinaryOp::Add
                        if lhs_ty == Ty::Builtin(Builtin::String)
                            || rhs_ty == Ty::Builtin(Builtin::String) =>
                    {
                        Ty::Builtin(Builtin::String)
                    }
                    _ => lhs_ty,
                }
            }
            ExprKind::Assign { target, value } => {
                let target_ty = self.bind_expr(target, None);
                let expected = (!target_ty.is_unknown()).then_some(&target_ty);
                let value_ty = self.bind_expr(value, expected);
                if target_ty.is_unknown() {
                    value_ty
                } else {
                    target_ty
                }
            }
            ExprKind::Conditional {
                cond,
                then,
                otherwise,
            } => {
                self.bind_expr(cond, Some(&Ty::Builtin(Builtin::Bool)));
                let then_ty = self.bind_expr(then, expected);
                let otherwise_ty = self.bind_expr(otherwise, expected);
                if then_ty.is_unknown() {
                    otherwise_ty
                } else {
                    then_ty
                }
            }
            ExprKind::Paren(inner) => self.bind_expr(inner, expected),
            ExprKind::Cast { ty, operand } => {
                self.bind_expr(operand, None);
                self.resolve(ty)
            }
            ExprKind::As { operand, ty } => {
                self.bind_expr(operand, None);
                self.resolve(ty)
            }
            ExprKind::Is { operand, .. } => {
                self.bind_expr(operand, None);
                Ty::Builtin(Builtin::Bool)
            }
            ExprKind::New {
                ty,
                args,
                initializer,
            } => {
                let created = match ty {
                    Some(ty) => self.resolve(ty),
                    None => expected.cloned().unwrap_or(Ty::Unknown),
                };
                self.bind_args_unexpected(args);
                self.bind_initializer(&created, initializer);
                created
            }
            ExprKind::Default(ty) => match ty {
                Some(ty) => self.resolve(ty),
                None => expected.cloned().unwrap_or(Ty::Unknown),
            },
            ExprKind::TypeOf(_) => Ty::External {
                name: "System.Type".to_string(),
                args: Vec::new(),
            },
            ExprKind::Throw(inner) => {
                self.bind_expr(inner, None);
                Ty::Unknown
            }
            ExprKind::Other { operands } => {
                for operand in operands {
                    self.bind_expr(operand, None);
                }
                Ty::Unknown
            }
        }
    }

    fn bind_name(&mut self, expr: &Expr, name: &Ident) -> Ty {
        let text = name.name();
        if let Some(ty) = self.lookup_local(text) {
            self.symbols.insert(expr.id, Symbol::Local(text.to_string()));
            return ty;
        }
        if let Some((member, _, args)) = self.lookup_enclosing_member(text, MemberKind::is_data) {
            self.symbols.insert(expr.id, Symbol::Member(member));
            return self.compilation.member(member).ty.substitute(&args, &[]);
        }
        if let Some(def) = self.compilation.lookup_type(&[text], 0, &self.ctx) {
            self.symbols
                .insert(expr.id, Symbol::Type(Ty::named(def, Vec::new())));
        }
        Ty::Unknown
    }

    /// Classify a member-access target as a value or a type name.
    fn bind_receiver(&mut self, target: &Expr) -> Receiver {
        if let Some(path) = type_path(target) {
            if self.lookup_local(path[0]).is_none()
                && self
                    .lookup_enclosing_member(path[0], |_| true)
                    .is_none()
            {
                if let Some(def) = self.compilation.lookup_type(&path, 0, &self.ctx) {
                    let ty = Ty::named(def, Vec::new());
                    self.symbols.insert(target.id, Symbol::Type(ty.clone()));
                    return Receiver::Static(ty);
                }
            }
        }
        if let ExprKind::GenericName { name, type_args } = &target.kind {
            let args: Vec<Ty> = type_args.iter().map(|t| self.resolve(t)).collect();
            let ty = self
                .compilation
                .resolve_path(&[name.name()], args, &self.ctx);
            self.symbols.insert(target.id, Symbol::Type(ty.clone()));
            return Receiver::Static(ty);
        }
        Receiver::Instance(self.bind_expr(target, None))
    }

    fn bind_member_access(&mut self, expr: &Expr, target: &Expr, name: &Ident) -> Ty {
        let receiver = self.bind_receiver(target);
        let receiver_ty = receiver.ty();
        if let Ty::Array(_) = receiver_ty {
            if name.name() == "Length" {
                return Ty::Builtin(Builtin::Int);
            }
        }
        let Ty::Named { def, args } = receiver_ty else {
            return Ty::Unknown;
        };
        let found = self
            .compilation
            .lookup_members(*def, args, name.name())
            .into_iter()
            .find(|(member, ..)| self.compilation.member(*member).kind.is_data());
        match found {
            Some((member, _, owner_args)) => {
                self.symbols.insert(expr.id, Symbol::Member(member));
                self.compilation
                    .member(member)
                    .ty
                    .substitute(&owner_args, &[])
            }
            None => Ty::Unknown,
        }
    }

    fn bind_invocation(&mut self, expr: &Expr, callee: &Expr, args: &[Argument]) -> Ty {
        let (candidates, explicit_args, name) = match &callee.kind {
            ExprKind::MemberAccess {
                target,
                name,
                type_args,
                ..
            } => {
                let receiver = self.bind_receiver(target);
                let candidates = match receiver.ty() {
                    Ty::Named { def, args } => self.compilation.lookup_members(*def, args, name.name()),
                    _ => Vec::new(),
                };
                let explicit: Vec<Ty> = type_args.iter().map(|t| self.resolve(t)).collect();
                (candidates, explicit, name.name().to_string())
            }
            ExprKind::Name(name) if self.lookup_local(name.name()).is_none() => {
                let candidates = self.enclosing_members(name.name());
                (candidates, Vec::new(), name.name().to_string())
            }
            ExprKind::GenericName { name, type_args } => {
                let candidates = self.enclosing_members(name.name());
                let explicit: Vec<Ty> = type_args.iter().map(|t| self.resolve(t)).collect();
                (candidates, explicit, name.name().to_string())
            }
            _ => {
                self.bind_expr(callee, None);
                (Vec::new(), Vec::new(), String::new())
            }
        };

        let chosen = candidates.into_iter().find(|(member, ..)| {
            let symbol = self.compilation.member(*member);
            symbol.kind == MemberKind::Method && symbol.accepts_arity(args.len())
        });
        let Some((member, owner, owner_args)) = chosen else {
            self.bind_args_unexpected(args);
            return Ty::Unknown;
        };

        self.symbols.insert(callee.id, Symbol::Member(member));
        self.methods.insert(
            expr.id,
            MethodSymbol {
                member,
                name,
                containing_def: owner,
                containing_args: owner_args.clone(),
            },
        );

        let compilation = self.compilation;
        let method = compilation.member(member);
        let method_args: &[Ty] = if explicit_args.len() == method.type_params.len() {
            &explicit_args
        } else {
            &[]
        };
        for (i, arg) in args.iter().enumerate() {
            let expected = method
                .param_for(i, arg.name.as_ref().map(Ident::name))
                .map(|p| p.ty.substitute(&owner_args, method_args));
            self.bind_expr(&arg.value, expected.as_ref());
        }
        method.ty.substitute(&owner_args, method_args)
    }

    fn bind_args_unexpected(&mut self, args: &[Argument]) {
        for arg in args {
            self.bind_expr(&arg.value, None);
        }
    }

    fn bind_lambda(&mut self, lambda: &Lambda, expected: Option<&Ty>) {
        let inferred = lambda_param_types(expected);
        self.frames.push(Vec::new());
        for (i, param) in lambda.params.iter().enumerate() {
            let ty = match &param.ty {
                Some(ty) => self.resolve(ty),
                None => inferred.get(i).cloned().unwrap_or(Ty::Unknown),
            };
            self.declare_local(param.name.name(), ty);
        }
        match &lambda.body {
            LambdaBody::Expr(body) => {
                self.bind_expr(body, None);
            }
            LambdaBody::Block(block) => self.bind_block(block),
        }
        self.frames.pop();
    }

    /// Object initializer entries `Member = value` bind against the created type.
    fn bind_initializer(&mut self, created: &Ty, items: &[Expr]) {
        for item in items {
            let ExprKind::Assign { target, value } = &item.kind else {
                self.bind_expr(item, None);
                continue;
            };
            let (ExprKind::Name(name), Ty::Named { def, args }) = (&target.kind, created) else {
                self.bind_expr(item, None);
                continue;
            };
            let found = self
                .compilation
                .lookup_members(*def, args, name.name())
                .into_iter()
                .find(|(member, ..)| self.compilation.member(*member).kind.is_data());
            let member_ty = match found {
                Some((member, _, owner_args)) => {
                    self.symbols.insert(target.id, Symbol::Member(member));
                    let ty = self.compilation.member(member).ty.substitute(&owner_args, &[]);
                    self.types.insert(target.id, ty.clone());
                    ty
                }
                None => Ty::Unknown,
            };
            self.bind_expr(value, Some(&member_ty));
        }
    }

    // -----------------------------------------------------------------
    // Scopes
    // -----------------------------------------------------------------

    fn resolve(&self, ty: &TypeSyntax) -> Ty {
        self.compilation.resolve_type(ty, &self.ctx)
    }

    fn declare_local(&mut self, name: &str, ty: Ty) {
        if let Some(frame) = self.frames.last_mut() {
            frame.push((name.to_string(), ty));
        }
    }

    fn lookup_local(&self, name: &str) -> Option<Ty> {
        self.frames
            .iter()
            .rev()
            .flat_map(|frame| frame.iter().rev())
            .find(|(local, _)| local == name)
            .map(|(_, ty)| ty.clone())
    }

    fn this_type(&self) -> Ty {
        match self.ctx.enclosing.last() {
            Some(&def) => {
                let arity = self.compilation.type_symbol(def).type_params.len();
                Ty::named(def, (0..arity as u32).map(Ty::Param).collect())
            }
            None => Ty::Unknown,
        }
    }

    fn base_type(&self) -> Ty {
        match self.ctx.enclosing.last() {
            Some(&def) => self
                .compilation
                .type_symbol(def)
                .bases
                .first()
                .cloned()
                .unwrap_or(Ty::Unknown),
            None => Ty::Unknown,
        }
    }

    /// Members named `name` on the enclosing types, innermost type first.
    fn enclosing_members(&self, name: &str) -> Vec<(MemberId, TypeId, Vec<Ty>)> {
        let this = self.this_type();
        let mut found = Vec::new();
        for &def in self.ctx.enclosing.iter().rev() {
            let args = match &this {
                Ty::Named { def: this_def, args } if *this_def == def => args.clone(),
                _ => Vec::new(),
            };
            found.extend(self.compilation.lookup_members(def, &args, name));
        }
        found
    }

    fn lookup_enclosing_member(
        &self,
        name: &str,
        filter: impl Fn(MemberKind) -> bool,
    ) -> Option<(MemberId, TypeId, Vec<Ty>)> {
        self.enclosing_members(name)
            .into_iter()
            .find(|(member, ..)| filter(self.compilation.member(*member).kind))
    }
}

/// A chain of simple names and member accesses (`A.B.C`) read as a dotted path.
fn type_path(expr: &Expr) -> Option<Vec<&str>> {
    match &expr.kind {
        ExprKind::Name(name) => Some(vec![name.name()]),
        ExprKind::MemberAccess {
            target,
            name,
            type_args,
            conditional: false,
        } if type_args.is_empty() => {
            let mut path = type_path(target)?;
            path.push(name.name());
            Some(path)
        }
        _ => None,
    }
}

fn literal_type(literal: &Literal) -> Ty {
    match literal {
        Literal::Int(_) => Ty::Builtin(Builtin::Int),
        Literal::Real(_) => Ty::Builtin(Builtin::Double),
        Literal::String(_) => Ty::Builtin(Builtin::String),
        Literal::Char(_) => Ty::Builtin(Builtin::Char),
        Literal::Bool(_) => Ty::Builtin(Builtin::Bool),
        Literal::Null => Ty::Unknown,
    }
}

/// Element type of a collection iterated with `foreach`.
fn element_type(collection: &Ty) -> Ty {
    match collection {
        Ty::Array(elem) => (**elem).clone(),
        Ty::Named { args, .. } | Ty::External { args, .. } if args.len() == 1 => args[0].clone(),
        _ => Ty::Unknown,
    }
}

fn awaited_type(ty: &Ty) -> Ty {
    match ty.external_simple_name() {
        Some("Task" | "ValueTask") => ty.type_args().first().cloned().unwrap_or(Ty::Unknown),
        _ => Ty::Unknown,
    }
}

/// Parameter types of a lambda converted to `expected`, looking through
/// `Expression<..>` to the delegate type.
fn lambda_param_types(expected: Option<&Ty>) -> Vec<Ty> {
    let Some(mut ty) = expected else {
        return Vec::new();
    };
    if ty.external_simple_name() == Some("Expression") && ty.type_args().len() == 1 {
        ty = &ty.type_args()[0];
    }
    let args = ty.type_args();
    match ty.external_simple_name() {
        Some("Func") if !args.is_empty() => args[..args.len() - 1].to_vec(),
        Some("Action" | "Predicate" | "Comparison") => args.to_vec(),
        _ => Vec::new(),
    }
}
