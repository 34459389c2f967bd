//! Lowers the `tree-sitter-c-sharp` concrete tree into the typed AST.
//!
//! The grammar does the parsing and the error recovery; this module keeps
//! the parts the binder and the rules look at and gives every expression an
//! [`ExprId`]. Forms the AST has no node for are kept as
//! [`ExprKind::Other`] so invocations nested inside them are still found.

use tree_sitter::{Node, Parser, Tree};

use super::ast::{
    Argument, AttributeSyntax, BinaryOp, Block, CatchClause, CompilationUnit, Expr, ExprId,
    ExprKind, FieldDecl, Ident, Lambda, LambdaBody, LambdaParam, Literal, LocalDecl, MemberDecl,
    MethodBody, MethodDecl, NamespaceDecl, NamespaceMember, ParamDecl, PropertyDecl,
    QualifiedName, Stmt, SwitchSection, TypeDecl, TypeDeclKind, TypeSyntax, UnaryOp,
    UsingDirective,
};
use super::{SyntaxError, TextSpan};

/// A parsed document plus the places the grammar had to recover.
#[derive(Debug, Clone)]
pub struct ParseOutput {
    pub unit: CompilationUnit,
    pub errors: Vec<SyntaxError>,
}

/// Parse a whole source file. Syntax errors are recovered by the grammar and
/// returned alongside the tree; only a parser that cannot run is an error.
pub fn parse(source: &str) -> Result<ParseOutput, SyntaxError> {
    let tree = parse_tree(source)?;
    let root = tree.root_node();
    let mut lowerer = Lowerer::new(source, 0);
    let unit = lowerer.unit(root);
    let mut errors = Vec::new();
    lowerer.collect_errors(root, &mut errors);
    Ok(ParseOutput { unit, errors })
}

const EXPRESSION_PREFIX: &str = "class __Expression { object __value = ";
const EXPRESSION_SUFFIX: &str = "\n; }";

/// Parse a single expression, rejecting trailing input and syntax errors.
pub fn parse_expression(source: &str) -> Result<Expr, SyntaxError> {
    let wrapped = format!("{EXPRESSION_PREFIX}{source}{EXPRESSION_SUFFIX}");
    let tree = parse_tree(&wrapped)?;
    let root = tree.root_node();

    let mut lowerer = Lowerer::new(&wrapped, EXPRESSION_PREFIX.len());
    let mut errors = Vec::new();
    lowerer.collect_errors(root, &mut errors);
    if let Some(err) = errors.into_iter().next() {
        return Err(err);
    }

    let start = EXPRESSION_PREFIX.len() + (source.len() - source.trim_start().len());
    let end = EXPRESSION_PREFIX.len() + source.trim_end().len();
    match root.named_descendant_for_byte_range(start, end) {
        Some(node) if node.start_byte() == start && node.end_byte() == end => {
            Ok(lowerer.expr(node))
        }
        _ => Err(SyntaxError::new(
            "expected a single expression",
            TextSpan::new(0, source.len()),
        )),
    }
}

fn parse_tree(source: &str) -> Result<Tree, SyntaxError> {
    let mut parser = Parser::new();
    parser
        .set_language(&tree_sitter_c_sharp::LANGUAGE.into())
        .map_err(|err| SyntaxError::new(err.to_string(), TextSpan::default()))?;
    parser
        .parse(source, None)
        .ok_or_else(|| SyntaxError::new("parser produced no tree", TextSpan::default()))
}

const TYPE_DECLARATIONS: &[&str] = &[
    "class_declaration",
    "interface_declaration",
    "struct_declaration",
    "enum_declaration",
    "record_declaration",
    "record_struct_declaration",
];

const STATEMENTS: &[&str] = &[
    "block",
    "break_statement",
    "checked_statement",
    "continue_statement",
    "do_statement",
    "empty_statement",
    "expression_statement",
    "fixed_statement",
    "for_statement",
    "foreach_statement",
    "goto_statement",
    "if_statement",
    "labeled_statement",
    "local_declaration_statement",
    "local_function_statement",
    "lock_statement",
    "return_statement",
    "switch_statement",
    "throw_statement",
    "try_statement",
    "unsafe_statement",
    "using_statement",
    "while_statement",
    "yield_statement",
];

/// Node kinds read as expressions, including the ones lowered to
/// [`ExprKind::Other`].
const EXPRESSIONS: &[&str] = &[
    "alias_qualified_name",
    "anonymous_method_expression",
    "anonymous_object_creation_expression",
    "array_creation_expression",
    "as_expression",
    "assignment_expression",
    "await_expression",
    "base",
    "base_expression",
    "binary_expression",
    "boolean_literal",
    "cast_expression",
    "character_literal",
    "checked_expression",
    "conditional_access_expression",
    "conditional_expression",
    "declaration_expression",
    "default_expression",
    "element_access_expression",
    "element_binding_expression",
    "generic_name",
    "identifier",
    "implicit_array_creation_expression",
    "implicit_object_creation_expression",
    "implicit_stackalloc_expression",
    "initializer_expression",
    "integer_literal",
    "interpolated_string_expression",
    "invocation_expression",
    "is_expression",
    "is_pattern_expression",
    "lambda_expression",
    "member_access_expression",
    "member_binding_expression",
    "null_literal",
    "object_creation_expression",
    "parenthesized_expression",
    "postfix_unary_expression",
    "predefined_type",
    "prefix_unary_expression",
    "qualified_name",
    "query_expression",
    "range_expression",
    "raw_string_literal",
    "real_literal",
    "ref_expression",
    "sizeof_expression",
    "stackalloc_array_creation_expression",
    "string_literal",
    "switch_expression",
    "this",
    "this_expression",
    "throw_expression",
    "tuple_expression",
    "typeof_expression",
    "verbatim_string_literal",
    "with_expression",
];

const PARAM_MODIFIERS: &[&str] = &["this", "ref", "out", "in", "params", "scoped", "readonly"];

fn children(node: Node<'_>) -> Vec<Node<'_>> {
    let mut cursor = node.walk();
    node.children(&mut cursor).collect()
}

/// Named children minus comments, with `#if`/`#else` regions flattened into
/// the enclosing list.
fn items(node: Node<'_>) -> Vec<Node<'_>> {
    let mut found = Vec::new();
    push_items(node, &mut found);
    found
}

fn push_items<'t>(node: Node<'t>, found: &mut Vec<Node<'t>>) {
    let condition = node
        .kind()
        .starts_with("preproc_")
        .then(|| node.child_by_field_name("condition"))
        .flatten()
        .map(|c| c.id());
    let mut cursor = node.walk();
    for child in node.named_children(&mut cursor) {
        if Some(child.id()) == condition {
            continue;
        }
        match child.kind() {
            "preproc_if" | "preproc_elif" | "preproc_else" => push_items(child, found),
            _ if child.is_extra() => {}
            _ => found.push(child),
        }
    }
}

fn child_of_kind<'t>(node: Node<'t>, kinds: &[&str]) -> Option<Node<'t>> {
    items(node).into_iter().find(|c| kinds.contains(&c.kind()))
}

fn has_token(node: Node<'_>, token: &str) -> bool {
    children(node)
        .iter()
        .any(|c| !c.is_named() && c.kind() == token)
}

/// The named node following the first `=` token, if any.
fn value_after_eq(node: Node<'_>) -> Option<Node<'_>> {
    children(node)
        .into_iter()
        .skip_while(|c| c.is_named() || c.kind() != "=")
        .skip(1)
        .find(|c| c.is_named() && !c.is_extra())
}

fn is_type_node(kind: &str) -> bool {
    matches!(
        kind,
        "identifier"
            | "generic_name"
            | "qualified_name"
            | "alias_qualified_name"
            | "predefined_type"
            | "nullable_type"
            | "array_type"
            | "pointer_type"
            | "tuple_type"
            | "implicit_type"
            | "ref_type"
            | "scoped_type"
            | "function_pointer_type"
    )
}

fn binary_op(symbol: &str) -> Option<BinaryOp> {
    Some(match symbol {
        "??" => BinaryOp::Coalesce,
        "||" => BinaryOp::Or,
        "&&" => BinaryOp::And,
        "|" => BinaryOp::BitOr,
        "^" => BinaryOp::BitXor,
        "&" => BinaryOp::BitAnd,
        "==" => BinaryOp::Eq,
        "!=" => BinaryOp::NotEq,
        "<" => BinaryOp::Lt,
        ">" => BinaryOp::Gt,
        "<=" => BinaryOp::Le,
        ">=" => BinaryOp::Ge,
        "+" => BinaryOp::Add,
        "-" => BinaryOp::Sub,
        "*" => BinaryOp::Mul,
        "/" => BinaryOp::Div,
        "%" => BinaryOp::Rem,
        _ => return None,
    })
}

struct Lowerer<'s> {
    source: &'s str,
    /// Subtracted from every byte offset; non-zero when the text was wrapped.
    base: usize,
    next_id: u32,
    /// Receiver of the `?.` being lowered, taken by the first member or
    /// element binding inside it.
    binding: Option<Expr>,
}

impl<'s> Lowerer<'s> {
    fn new(source: &'s str, base: usize) -> Self {
        Self {
            source,
            base,
            next_id: 0,
            binding: None,
        }
    }

    fn span(&self, node: Node<'_>) -> TextSpan {
        TextSpan::new(
            node.start_byte().saturating_sub(self.base),
            node.end_byte().saturating_sub(self.base),
        )
    }

    fn text(&self, node: Node<'_>) -> &'s str {
        self.source.get(node.byte_range()).unwrap_or_default()
    }

    fn ident(&self, node: Node<'_>) -> Ident {
        Ident {
            text: self.text(node).to_string(),
            span: self.span(node),
        }
    }

    fn mk(&mut self, kind: ExprKind, span: TextSpan) -> Expr {
        let id = ExprId(self.next_id);
        self.next_id += 1;
        Expr { id, kind, span }
    }

    fn collect_errors(&self, node: Node<'_>, errors: &mut Vec<SyntaxError>) {
        if node.is_error() {
            errors.push(SyntaxError::new("unexpected syntax", self.span(node)));
            return;
        }
        if node.is_missing() {
            errors.push(SyntaxError::new(
                format!("missing '{}'", node.kind()),
                self.span(node),
            ));
            return;
        }
        if node.has_error() {
            for child in children(node) {
                self.collect_errors(child, errors);
            }
        }
    }

    // ---------------------------------------------------------------------
    // Declarations
    // ---------------------------------------------------------------------

    fn unit(&mut self, root: Node<'_>) -> CompilationUnit {
        let (usings, members) = self.namespace_body(&items(root));
        CompilationUnit {
            usings,
            members,
            span: self.span(root),
        }
    }

    /// Usings and members of a namespace body. A file-scoped namespace takes
    /// every declaration after it.
    fn namespace_body(&mut self, nodes: &[Node<'_>]) -> (Vec<UsingDirective>, Vec<NamespaceMember>) {
        let mut usings = Vec::new();
        let mut members = Vec::new();
        for (index, &node) in nodes.iter().enumerate() {
            match node.kind() {
                "using_directive" => usings.extend(self.using_directive(node)),
                "namespace_declaration" => {
                    let body = node
                        .child_by_field_name("body")
                        .or_else(|| child_of_kind(node, &["declaration_list"]));
                    let inner = body.map(items).unwrap_or_default();
                    let (ns_usings, ns_members) = self.namespace_body(&inner);
                    members.push(NamespaceMember::Namespace(NamespaceDecl {
                        name: self.namespace_name(node),
                        usings: ns_usings,
                        members: ns_members,
                        file_scoped: false,
                        span: self.span(node),
                    }));
                }
                "file_scoped_namespace_declaration" => {
                    let name_id = node.child_by_field_name("name").map(|n| n.id());
                    let mut inner: Vec<Node<'_>> = items(node)
                        .into_iter()
                        .filter(|c| Some(c.id()) != name_id)
                        .collect();
                    inner.extend_from_slice(&nodes[index + 1..]);
                    let (ns_usings, ns_members) = self.namespace_body(&inner);
                    let end = inner.last().map_or(node.end_byte(), |n| n.end_byte());
                    members.push(NamespaceMember::Namespace(NamespaceDecl {
                        name: self.namespace_name(node),
                        usings: ns_usings,
                        members: ns_members,
                        file_scoped: true,
                        span: TextSpan::new(
                            self.span(node).start,
                            end.saturating_sub(self.base),
                        ),
                    }));
                    break;
                }
                kind if TYPE_DECLARATIONS.contains(&kind) => {
                    if let Some(decl) = self.type_decl(node) {
                        members.push(NamespaceMember::Type(decl));
                    }
                }
                _ => {}
            }
        }
        (usings, members)
    }

    fn namespace_name(&self, node: Node<'_>) -> QualifiedName {
        match node.child_by_field_name("name") {
            Some(name) => self.qualified_name(name),
            None => QualifiedName {
                parts: Vec::new(),
                span: self.span(node),
            },
        }
    }

    fn using_directive(&self, node: Node<'_>) -> Option<UsingDirective> {
        let all = children(node);
        let named: Vec<Node<'_>> = all
            .iter()
            .copied()
            .filter(|c| c.is_named() && !c.is_extra())
            .collect();
        let (alias, target) = match all.iter().position(|c| !c.is_named() && c.kind() == "=") {
            Some(eq) => {
                let alias = all[..eq].iter().rev().find(|c| c.kind() == "identifier");
                let target = all[eq + 1..].iter().find(|c| c.is_named() && !c.is_extra());
                (alias.map(|a| self.ident(*a)), *target?)
            }
            None => (None, *named.last()?),
        };
        Some(UsingDirective {
            alias,
            name: self.qualified_name(target),
            is_static: has_token(node, "static"),
            is_global: has_token(node, "global"),
            span: self.span(node),
        })
    }

    fn qualified_name(&self, node: Node<'_>) -> QualifiedName {
        let mut parts = Vec::new();
        self.name_parts(node, &mut parts);
        QualifiedName {
            parts,
            span: self.span(node),
        }
    }

    fn name_parts(&self, node: Node<'_>, parts: &mut Vec<Ident>) {
        match node.kind() {
            "qualified_name" => match (
                node.child_by_field_name("qualifier"),
                node.child_by_field_name("name"),
            ) {
                (Some(qualifier), Some(name)) => {
                    self.name_parts(qualifier, parts);
                    self.name_parts(name, parts);
                }
                _ => {
                    for child in items(node) {
                        self.name_parts(child, parts);
                    }
                }
            },
            // `global::` is dropped.
            "alias_qualified_name" => {
                if let Some(name) = node
                    .child_by_field_name("name")
                    .or_else(|| items(node).into_iter().last())
                {
                    self.name_parts(name, parts);
                }
            }
            "generic_name" => {
                if let Some(name) = child_of_kind(node, &["identifier"]) {
                    parts.push(self.ident(name));
                }
            }
            _ => parts.push(self.ident(node)),
        }
    }

    fn attributes(&self, node: Node<'_>) -> Vec<AttributeSyntax> {
        items(node)
            .into_iter()
            .filter(|c| c.kind() == "attribute_list")
            .flat_map(items)
            .filter(|a| a.kind() == "attribute")
            .filter_map(|attribute| {
                let name = attribute
                    .child_by_field_name("name")
                    .or_else(|| items(attribute).into_iter().next())?;
                Some(AttributeSyntax {
                    name: self.qualified_name(name),
                    span: self.span(attribute),
                })
            })
            .collect()
    }

    fn modifiers(&self, node: Node<'_>) -> Vec<String> {
        children(node)
            .into_iter()
            .filter(|c| c.kind() == "modifier")
            .map(|c| self.text(c).to_string())
            .collect()
    }

    fn type_decl(&mut self, node: Node<'_>) -> Option<TypeDecl> {
        let kind = match node.kind() {
            "class_declaration" => TypeDeclKind::Class,
            "interface_declaration" => TypeDeclKind::Interface,
            "struct_declaration" => TypeDeclKind::Struct,
            "enum_declaration" => TypeDeclKind::Enum,
            "record_struct_declaration" => TypeDeclKind::RecordStruct,
            "record_declaration" if has_token(node, "struct") => TypeDeclKind::RecordStruct,
            "record_declaration" => TypeDeclKind::Record,
            _ => return None,
        };
        let name = node.child_by_field_name("name")?;

        let type_params = child_of_kind(node, &["type_parameter_list"])
            .map(|list| self.type_params(list))
            .unwrap_or_default();
        let primary_params = child_of_kind(node, &["parameter_list"])
            .map(|list| self.params(list))
            .unwrap_or_default();
        let bases: Vec<TypeSyntax> = child_of_kind(node, &["base_list"])
            .map(|list| {
                items(list)
                    .into_iter()
                    .filter_map(|base| match base.kind() {
                        "primary_constructor_base_type" => base
                            .child_by_field_name("type")
                            .or_else(|| items(base).into_iter().next()),
                        kind if is_type_node(kind) => Some(base),
                        _ => None,
                    })
                    .map(|base| self.type_syntax(base))
                    .collect()
            })
            .unwrap_or_default();

        let members = match kind {
            TypeDeclKind::Enum => Vec::new(),
            _ => node
                .child_by_field_name("body")
                .filter(|body| body.kind() == "declaration_list")
                .or_else(|| child_of_kind(node, &["declaration_list"]))
                .map(|body| self.members(body))
                .unwrap_or_default(),
        };

        Some(TypeDecl {
            kind,
            attributes: self.attributes(node),
            modifiers: self.modifiers(node),
            name: self.ident(name),
            type_params,
            primary_params,
            bases,
            members,
            span: self.span(node),
        })
    }

    fn type_params(&self, list: Node<'_>) -> Vec<Ident> {
        items(list)
            .into_iter()
            .filter(|p| p.kind() == "type_parameter")
            .filter_map(|p| {
                p.child_by_field_name("name")
                    .or_else(|| child_of_kind(p, &["identifier"]))
            })
            .map(|name| self.ident(name))
            .collect()
    }

    fn members(&mut self, body: Node<'_>) -> Vec<MemberDecl> {
        let mut members = Vec::new();
        for node in items(body) {
            match node.kind() {
                "field_declaration" => members.extend(self.fields(node)),
                "property_declaration" => members.extend(self.property(node)),
                "method_declaration" | "constructor_declaration" => {
                    members.extend(self.method(node).map(MemberDecl::Method));
                }
                kind if TYPE_DECLARATIONS.contains(&kind) => {
                    members.extend(self.type_decl(node).map(MemberDecl::Type));
                }
                _ => {}
            }
        }
        members
    }

    fn fields(&mut self, node: Node<'_>) -> Vec<MemberDecl> {
        let Some(declaration) = child_of_kind(node, &["variable_declaration"]) else {
            return Vec::new();
        };
        let attributes = self.attributes(node);
        let modifiers = self.modifiers(node);
        self.declarators(declaration)
            .into_iter()
            .map(|(ty, name, initializer)| {
                MemberDecl::Field(FieldDecl {
                    attributes: attributes.clone(),
                    modifiers: modifiers.clone(),
                    ty,
                    name,
                    initializer,
                    span: self.span(node),
                })
            })
            .collect()
    }

    /// Each declarator of a `variable_declaration` with the shared type.
    fn declarators(&mut self, declaration: Node<'_>) -> Vec<(TypeSyntax, Ident, Option<Expr>)> {
        let Some(ty) = declaration.child_by_field_name("type") else {
            return Vec::new();
        };
        let ty = self.type_syntax(ty);
        let mut found = Vec::new();
        for declarator in items(declaration) {
            if declarator.kind() != "variable_declarator" {
                continue;
            }
            let Some(name) = declarator
                .child_by_field_name("name")
                .or_else(|| child_of_kind(declarator, &["identifier"]))
            else {
                continue;
            };
            let init = declarator
                .child_by_field_name("value")
                .or_else(|| {
                    child_of_kind(declarator, &["equals_value_clause"])
                        .and_then(|clause| items(clause).into_iter().next())
                })
                .or_else(|| value_after_eq(declarator))
                .map(|value| self.expr(value));
            found.push((ty.clone(), self.ident(name), init));
        }
        found
    }

    fn property(&mut self, node: Node<'_>) -> Option<MemberDecl> {
        let ty = self.type_syntax(node.child_by_field_name("type")?);
        let name = self.ident(node.child_by_field_name("name")?);

        let mut initializer = None;
        let mut expression_body = None;
        if let Some(value) = node.child_by_field_name("value") {
            if value.kind() == "arrow_expression_clause" {
                expression_body = self.arrow_body(value);
            } else {
                initializer = Some(self.expr(value));
            }
        } else if let Some(arrow) = child_of_kind(node, &["arrow_expression_clause"]) {
            expression_body = self.arrow_body(arrow);
        }

        let accessors: Vec<MethodBody> = node
            .child_by_field_name("accessors")
            .or_else(|| child_of_kind(node, &["accessor_list"]))
            .map(|list| {
                items(list)
                    .into_iter()
                    .filter(|a| a.kind() == "accessor_declaration")
                    .filter_map(|accessor| self.function_body(accessor))
                    .collect()
            })
            .unwrap_or_default();

        Some(MemberDecl::Property(PropertyDecl {
            attributes: self.attributes(node),
            modifiers: self.modifiers(node),
            ty,
            name,
            initializer,
            expression_body,
            accessors,
            span: self.span(node),
        }))
    }

    fn arrow_body(&mut self, arrow: Node<'_>) -> Option<Expr> {
        let expr = items(arrow).into_iter().next()?;
        Some(self.expr(expr))
    }

    /// A `{ ... }` or `=> ...` body; `None` for `;`.
    fn function_body(&mut self, node: Node<'_>) -> Option<MethodBody> {
        let body = node
            .child_by_field_name("body")
            .or_else(|| child_of_kind(node, &["block", "arrow_expression_clause"]))?;
        match body.kind() {
            "block" => Some(MethodBody::Block(self.block(body))),
            "arrow_expression_clause" => self.arrow_body(body).map(MethodBody::Expr),
            _ => None,
        }
    }

    fn method(&mut self, node: Node<'_>) -> Option<MethodDecl> {
        let name = self.ident(node.child_by_field_name("name")?);
        let return_type = if node.kind() == "constructor_declaration" {
            None
        } else {
            let ty = node
                .child_by_field_name("returns")
                .or_else(|| node.child_by_field_name("type"))?;
            Some(self.type_syntax(ty))
        };
        let type_params = node
            .child_by_field_name("type_parameters")
            .or_else(|| child_of_kind(node, &["type_parameter_list"]))
            .map(|list| self.type_params(list))
            .unwrap_or_default();
        let params = node
            .child_by_field_name("parameters")
            .or_else(|| child_of_kind(node, &["parameter_list"]))
            .map(|list| self.params(list))
            .unwrap_or_default();

        Some(MethodDecl {
            attributes: self.attributes(node),
            modifiers: self.modifiers(node),
            return_type,
            name,
            type_params,
            params,
            body: self.function_body(node),
            span: self.span(node),
        })
    }

    fn params(&mut self, list: Node<'_>) -> Vec<ParamDecl> {
        let mut params = Vec::new();
        for param in items(list) {
            if !matches!(param.kind(), "parameter" | "parameter_array") {
                continue;
            }
            let Some(name) = param.child_by_field_name("name") else {
                continue;
            };
            let ty = match param
                .child_by_field_name("type")
                .or_else(|| items(param).into_iter().find(|c| is_type_node(c.kind()) && c.id() != name.id()))
            {
                Some(ty) => self.type_syntax(ty),
                None => self.var_type(param),
            };
            let default = value_after_eq(param).map(|value| self.expr(value));
            params.push(ParamDecl {
                modifiers: self.param_modifiers(param),
                ty,
                name: self.ident(name),
                default,
                span: self.span(param),
            });
        }
        params
    }

    fn param_modifiers(&self, param: Node<'_>) -> Vec<String> {
        children(param)
            .into_iter()
            .filter(|c| c.kind() == "modifier" || (!c.is_named() && PARAM_MODIFIERS.contains(&c.kind())))
            .map(|c| self.text(c).to_string())
            .collect()
    }

    fn var_type(&self, node: Node<'_>) -> TypeSyntax {
        let span = TextSpan::new(self.span(node).start, self.span(node).start);
        TypeSyntax {
            path: vec![Ident {
                text: "var".to_string(),
                span,
            }],
            args: Vec::new(),
            nullable: false,
            array_rank: 0,
            span,
        }
    }

    // ---------------------------------------------------------------------
    // Types
    // ---------------------------------------------------------------------

    fn type_syntax(&self, node: Node<'_>) -> TypeSyntax {
        let span = self.span(node);
        let inner = || {
            node.child_by_field_name("type")
                .or_else(|| items(node).into_iter().next())
        };
        match node.kind() {
            "nullable_type" => match inner() {
                Some(inner) => TypeSyntax {
                    nullable: true,
                    span,
                    ..self.type_syntax(inner)
                },
                None => self.simple_type(node),
            },
            "array_type" => match inner() {
                Some(inner) => {
                    let element = self.type_syntax(inner);
                    TypeSyntax {
                        array_rank: element.array_rank + 1,
                        span,
                        ..element
                    }
                }
                None => self.simple_type(node),
            },
            "pointer_type" | "ref_type" | "scoped_type" => match inner() {
                Some(inner) => TypeSyntax {
                    span,
                    ..self.type_syntax(inner)
                },
                None => self.simple_type(node),
            },
            "tuple_type" => TypeSyntax {
                path: vec![Ident {
                    text: "ValueTuple".to_string(),
                    span,
                }],
                args: items(node)
                    .into_iter()
                    .filter_map(|element| {
                        element
                            .child_by_field_name("type")
                            .or_else(|| items(element).into_iter().next())
                    })
                    .map(|ty| self.type_syntax(ty))
                    .collect(),
                nullable: false,
                array_rank: 0,
                span,
            },
            "generic_name" | "qualified_name" | "alias_qualified_name" => {
                let mut path = Vec::new();
                self.name_parts(node, &mut path);
                TypeSyntax {
                    path,
                    args: self.type_args(self.last_simple_name(node)),
                    nullable: false,
                    array_rank: 0,
                    span,
                }
            }
            _ => self.simple_type(node),
        }
    }

    fn simple_type(&self, node: Node<'_>) -> TypeSyntax {
        TypeSyntax {
            path: vec![self.ident(node)],
            args: Vec::new(),
            nullable: false,
            array_rank: 0,
            span: self.span(node),
        }
    }

    /// The rightmost simple name of a possibly qualified name.
    fn last_simple_name<'t>(&self, node: Node<'t>) -> Node<'t> {
        match node.kind() {
            "qualified_name" | "alias_qualified_name" => node
                .child_by_field_name("name")
                .or_else(|| items(node).into_iter().last())
                .map_or(node, |name| self.last_simple_name(name)),
            _ => node,
        }
    }

    fn type_args(&self, node: Node<'_>) -> Vec<TypeSyntax> {
        if node.kind() != "generic_name" {
            return Vec::new();
        }
        child_of_kind(node, &["type_argument_list"])
            .map(|list| {
                items(list)
                    .into_iter()
                    .map(|arg| self.type_syntax(arg))
                    .collect()
            })
            .unwrap_or_default()
    }

    fn optional_type(&self, node: Option<Node<'_>>) -> Option<TypeSyntax> {
        let ty = self.type_syntax(node?);
        (!ty.is_var()).then_some(ty)
    }

    // ---------------------------------------------------------------------
    // Statements
    // ---------------------------------------------------------------------

    fn block(&mut self, node: Node<'_>) -> Block {
        let mut stmts = Vec::new();
        for child in items(node) {
            self.stmts(child, &mut stmts);
        }
        Block {
            stmts,
            span: self.span(node),
        }
    }

    /// A single statement; declarations of several locals become a block.
    fn stmt(&mut self, node: Node<'_>) -> Stmt {
        let mut stmts = Vec::new();
        self.stmts(node, &mut stmts);
        if stmts.len() == 1 {
            if let Some(stmt) = stmts.pop() {
                return stmt;
            }
        }
        Stmt::Block(Block {
            stmts,
            span: self.span(node),
        })
    }

    fn stmts(&mut self, node: Node<'_>, out: &mut Vec<Stmt>) {
        let span = self.span(node);
        let field = |name: &str| node.child_by_field_name(name);
        match node.kind() {
            "block" => out.push(Stmt::Block(self.block(node))),
            "expression_statement" => {
                if let Some(expr) = items(node).into_iter().next() {
                    out.push(Stmt::Expr(self.expr(expr)));
                }
            }
            "local_declaration_statement" => {
                let using = has_token(node, "using");
                let Some(declaration) = child_of_kind(node, &["variable_declaration"]) else {
                    return;
                };
                for local in self.locals(declaration, span) {
                    out.push(if using {
                        Stmt::Using {
                            resource: Box::new(Stmt::Local(local)),
                            body: None,
                            span,
                        }
                    } else {
                        Stmt::Local(local)
                    });
                }
            }
            "return_statement" | "yield_statement" => {
                let value = items(node).into_iter().next().map(|v| self.expr(v));
                out.push(Stmt::Return { value, span });
            }
            "throw_statement" => {
                let value = items(node).into_iter().next().map(|v| self.expr(v));
                out.push(Stmt::Throw { value, span });
            }
            "if_statement" => {
                let (Some(cond), Some(then)) = (field("condition"), field("consequence")) else {
                    return self.fallback(node, out);
                };
                let cond = self.expr(cond);
                let then = Box::new(self.stmt(then));
                let otherwise = field("alternative").map(|alt| {
                    let alt = if alt.kind() == "else_clause" {
                        items(alt).into_iter().next().unwrap_or(alt)
                    } else {
                        alt
                    };
                    Box::new(self.stmt(alt))
                });
                out.push(Stmt::If {
                    cond,
                    then,
                    otherwise,
                    span,
                });
            }
            "foreach_statement" => {
                let (Some(left), Some(right), Some(body)) =
                    (field("left"), field("right"), field("body"))
                else {
                    return self.fallback(node, out);
                };
                let ty = self.optional_type(field("type"));
                let name = self.ident(left);
                let iterable = self.expr(right);
                let body = Box::new(self.stmt(body));
                out.push(Stmt::Foreach {
                    ty,
                    name,
                    iterable,
                    body,
                    span,
                });
            }
            "for_statement" => {
                let Some(body) = field("body") else {
                    return self.fallback(node, out);
                };
                let mut cursor = node.walk();
                let initializers: Vec<Node<'_>> =
                    node.children_by_field_name("initializer", &mut cursor).collect();
                let updates: Vec<Node<'_>> =
                    node.children_by_field_name("update", &mut cursor).collect();
                let mut init = Vec::new();
                for initializer in initializers {
                    if initializer.kind() == "variable_declaration" {
                        init.extend(
                            self.locals(initializer, self.span(initializer))
                                .into_iter()
                                .map(Stmt::Local),
                        );
                    } else if initializer.is_named() {
                        init.push(Stmt::Expr(self.expr(initializer)));
                    }
                }
                let cond = field("condition").map(|c| self.expr(c));
                let step = updates
                    .into_iter()
                    .filter(|u| u.is_named())
                    .map(|u| self.expr(u))
                    .collect();
                let body = Box::new(self.stmt(body));
                out.push(Stmt::For {
                    init,
                    cond,
                    step,
                    body,
                    span,
                });
            }
            "while_statement" | "do_statement" => {
                let (Some(cond), Some(body)) = (field("condition"), field("body")) else {
                    return self.fallback(node, out);
                };
                let cond = self.expr(cond);
                let body = Box::new(self.stmt(body));
                out.push(Stmt::While { cond, body, span });
            }
            "using_statement" => {
                let Some(body) = field("body") else {
                    return self.fallback(node, out);
                };
                let resource = items(node)
                    .into_iter()
                    .find(|c| c.id() != body.id())
                    .map(|resource| {
                        if resource.kind() == "variable_declaration" {
                            let mut locals: Vec<Stmt> = self
                                .locals(resource, self.span(resource))
                                .into_iter()
                                .map(Stmt::Local)
                                .collect();
                            if locals.len() == 1 {
                                locals.remove(0)
                            } else {
                                Stmt::Block(Block {
                                    stmts: locals,
                                    span: self.span(resource),
                                })
                            }
                        } else {
                            Stmt::Expr(self.expr(resource))
                        }
                    })
                    .unwrap_or(Stmt::Jump(span));
                let body = Box::new(self.stmt(body));
                out.push(Stmt::Using {
                    resource: Box::new(resource),
                    body: Some(body),
                    span,
                });
            }
            "try_statement" => {
                let Some(body) = field("body") else {
                    return self.fallback(node, out);
                };
                let body = self.block(body);
                let mut catches = Vec::new();
                let mut finally = None;
                for clause in items(node) {
                    match clause.kind() {
                        "catch_clause" => {
                            let declaration = child_of_kind(clause, &["catch_declaration"]);
                            let ty = declaration
                                .and_then(|d| d.child_by_field_name("type"))
                                .map(|ty| self.type_syntax(ty));
                            let name = declaration
                                .and_then(|d| d.child_by_field_name("name"))
                                .map(|name| self.ident(name));
                            let Some(catch_body) = clause
                                .child_by_field_name("body")
                                .or_else(|| child_of_kind(clause, &["block"]))
                            else {
                                continue;
                            };
                            catches.push(CatchClause {
                                ty,
                                name,
                                body: self.block(catch_body),
                            });
                        }
                        "finally_clause" => {
                            finally = child_of_kind(clause, &["block"]).map(|b| self.block(b));
                        }
                        _ => {}
                    }
                }
                out.push(Stmt::Try {
                    body,
                    catches,
                    finally,
                    span,
                });
            }
            "switch_statement" => {
                let Some(value) = field("value") else {
                    return self.fallback(node, out);
                };
                let value = self.expr(value);
                let sections: Vec<SwitchSection> = field("body")
                    .or_else(|| child_of_kind(node, &["switch_body"]))
                    .map(|body| {
                        items(body)
                            .into_iter()
                            .filter(|s| s.kind() == "switch_section")
                            .map(|section| self.switch_section(section))
                            .collect()
                    })
                    .unwrap_or_default();
                out.push(Stmt::Switch {
                    value,
                    sections,
                    span,
                });
            }
            "local_function_statement" => match self.function_body(node) {
                Some(MethodBody::Block(block)) => out.push(Stmt::Block(block)),
                Some(MethodBody::Expr(expr)) => out.push(Stmt::Expr(expr)),
                None => {}
            },
            "break_statement" | "continue_statement" | "empty_statement" | "goto_statement" => {
                out.push(Stmt::Jump(span));
            }
            "ERROR" => {
                out.push(Stmt::Error(span));
                self.nested(node, out);
            }
            _ => self.fallback(node, out),
        }
    }

    /// Statements without a dedicated node (`lock`, `checked`, `fixed`,
    /// labels): their nested statements and expressions, in order.
    fn fallback(&mut self, node: Node<'_>, out: &mut Vec<Stmt>) {
        let mut stmts = Vec::new();
        self.nested(node, &mut stmts);
        out.push(Stmt::Block(Block {
            stmts,
            span: self.span(node),
        }));
    }

    fn nested(&mut self, node: Node<'_>, out: &mut Vec<Stmt>) {
        for child in items(node) {
            let kind = child.kind();
            if STATEMENTS.contains(&kind) || kind == "ERROR" {
                self.stmts(child, out);
            } else if EXPRESSIONS.contains(&kind) {
                out.push(Stmt::Expr(self.expr(child)));
            } else {
                out.extend(self.operands(child).into_iter().map(Stmt::Expr));
            }
        }
    }

    fn locals(&mut self, declaration: Node<'_>, span: TextSpan) -> Vec<LocalDecl> {
        self.declarators(declaration)
            .into_iter()
            .map(|(ty, name, init)| LocalDecl {
                ty: (!ty.is_var()).then_some(ty),
                name,
                init,
                span,
            })
            .collect()
    }

    fn switch_section(&mut self, node: Node<'_>) -> SwitchSection {
        let mut labels = Vec::new();
        let mut stmts = Vec::new();
        for child in items(node) {
            let kind = child.kind();
            if STATEMENTS.contains(&kind) || kind == "ERROR" {
                self.stmts(child, &mut stmts);
            } else if EXPRESSIONS.contains(&kind) {
                labels.push(self.expr(child));
            } else {
                labels.extend(self.operands(child));
            }
        }
        SwitchSection {
            labels,
            stmts,
            span: self.span(node),
        }
    }

    // ---------------------------------------------------------------------
    // Expressions
    // ---------------------------------------------------------------------

    /// Every expression nested under `node`, outermost first, skipping the
    /// structure in between.
    fn operands(&mut self, node: Node<'_>) -> Vec<Expr> {
        let mut found = Vec::new();
        for child in items(node) {
            if EXPRESSIONS.contains(&child.kind()) {
                found.push(self.expr(child));
            } else {
                found.extend(self.operands(child));
            }
        }
        found
    }

    fn other(&mut self, node: Node<'_>) -> Expr {
        let operands = self.operands(node);
        self.mk(ExprKind::Other { operands }, self.span(node))
    }

    fn boxed(&mut self, node: Node<'_>) -> Box<Expr> {
        Box::new(self.expr(node))
    }

    fn expr(&mut self, node: Node<'_>) -> Expr {
        let span = self.span(node);
        let field = |name: &str| node.child_by_field_name(name);
        let kind = match node.kind() {
            "identifier" | "predefined_type" | "implicit_parameter" => {
                ExprKind::Name(self.ident(node))
            }
            "generic_name" => match child_of_kind(node, &["identifier"]) {
                Some(name) => ExprKind::GenericName {
                    name: self.ident(name),
                    type_args: self.type_args(node),
                },
                None => return self.other(node),
            },
            "qualified_name" => match (field("qualifier"), field("name")) {
                (Some(qualifier), Some(name)) => ExprKind::MemberAccess {
                    target: self.boxed(qualifier),
                    name: self.simple_name(name),
                    type_args: self.type_args(name),
                    conditional: false,
                },
                _ => return self.other(node),
            },
            "alias_qualified_name" => match field("name") {
                Some(name) => return self.expr(name),
                None => return self.other(node),
            },
            "this" | "this_expression" => ExprKind::This,
            "base" | "base_expression" => ExprKind::Base,
            "integer_literal" => ExprKind::Literal(Literal::Int(self.text(node).to_string())),
            "real_literal" => ExprKind::Literal(Literal::Real(self.text(node).to_string())),
            "character_literal" => ExprKind::Literal(Literal::Char(self.text(node).to_string())),
            "string_literal"
            | "verbatim_string_literal"
            | "raw_string_literal"
            | "interpolated_string_expression" => {
                ExprKind::Literal(Literal::String(self.text(node).to_string()))
            }
            "boolean_literal" => ExprKind::Literal(Literal::Bool(self.text(node) == "true")),
            "null_literal" => ExprKind::Literal(Literal::Null),

            "member_access_expression" => match (field("expression"), field("name")) {
                (Some(target), Some(name)) => ExprKind::MemberAccess {
                    target: self.boxed(target),
                    name: self.simple_name(name),
                    type_args: self.type_args(name),
                    conditional: false,
                },
                _ => return self.other(node),
            },
            "conditional_access_expression" => return self.conditional_access(node),
            "member_binding_expression" => {
                let Some(name) = field("name").or_else(|| items(node).into_iter().last()) else {
                    return self.other(node);
                };
                match self.binding.take() {
                    Some(target) => ExprKind::MemberAccess {
                        target: Box::new(target),
                        name: self.simple_name(name),
                        type_args: self.type_args(name),
                        conditional: true,
                    },
                    None => ExprKind::Name(self.simple_name(name)),
                }
            }
            "element_binding_expression" => {
                let args = match child_of_kind(node, &["bracketed_argument_list"]) {
                    Some(list) => self.arguments(list),
                    None => self.arguments(node),
                };
                match self.binding.take() {
                    Some(target) => ExprKind::ElementAccess {
                        target: Box::new(target),
                        args,
                        conditional: true,
                    },
                    None => ExprKind::Other {
                        operands: args.into_iter().map(|a| a.value).collect(),
                    },
                }
            }
            "invocation_expression" => match field("function") {
                Some(function) => {
                    let callee = self.boxed(function);
                    let args = field("arguments")
                        .or_else(|| child_of_kind(node, &["argument_list"]))
                        .map(|list| self.arguments(list))
                        .unwrap_or_default();
                    ExprKind::Invocation { callee, args }
                }
                None => return self.other(node),
            },
            "element_access_expression" => match field("expression") {
                Some(target) => {
                    let target = self.boxed(target);
                    let args = field("subscript")
                        .or_else(|| child_of_kind(node, &["bracketed_argument_list"]))
                        .map(|list| self.arguments(list))
                        .unwrap_or_default();
                    ExprKind::ElementAccess {
                        target,
                        args,
                        conditional: false,
                    }
                }
                None => return self.other(node),
            },
            "lambda_expression" => match self.lambda(node) {
                Some(lambda) => ExprKind::Lambda(lambda),
                None => return self.other(node),
            },
            "prefix_unary_expression" => {
                let operator = children(node).into_iter().find(|c| !c.is_named());
                let op = match operator.map(|o| o.kind()) {
                    Some("!") => UnaryOp::Not,
                    Some("-") => UnaryOp::Neg,
                    Some("+") => UnaryOp::Plus,
                    Some("~") => UnaryOp::BitNot,
                    Some("++") => UnaryOp::PreIncrement,
                    Some("--") => UnaryOp::PreDecrement,
                    _ => return self.other(node),
                };
                match items(node).into_iter().last() {
                    Some(operand) => ExprKind::Unary {
                        op,
                        operand: self.boxed(operand),
                    },
                    None => return self.other(node),
                }
            }
            "postfix_unary_expression" => {
                let Some(operand) = items(node).into_iter().next() else {
                    return self.other(node);
                };
                let op = match children(node).into_iter().rev().find(|c| !c.is_named()).map(|o| o.kind()) {
                    Some("++") => UnaryOp::PostIncrement,
                    Some("--") => UnaryOp::PostDecrement,
                    // Null-forgiving `x!` has no effect on binding.
                    _ => return self.expr(operand),
                };
                ExprKind::Unary {
                    op,
                    operand: self.boxed(operand),
                }
            }
            "await_expression" => match items(node).into_iter().last() {
                Some(operand) => ExprKind::Unary {
                    op: UnaryOp::Await,
                    operand: self.boxed(operand),
                },
                None => return self.other(node),
            },
            "binary_expression" => {
                let (Some(lhs), Some(rhs)) = (field("left"), field("right")) else {
                    return self.other(node);
                };
                let operator = field("operator")
                    .or_else(|| children(node).into_iter().find(|c| !c.is_named()))
                    .map(|o| o.kind());
                match operator {
                    Some("as") => ExprKind::As {
                        operand: self.boxed(lhs),
                        ty: self.type_syntax(rhs),
                    },
                    Some("is") => ExprKind::Is {
                        operand: self.boxed(lhs),
                        ty: Some(self.type_syntax(rhs)),
                        negated: false,
                    },
                    Some(symbol) => match binary_op(symbol) {
                        Some(op) => ExprKind::Binary {
                            op,
                            lhs: self.boxed(lhs),
                            rhs: self.boxed(rhs),
                        },
                        None => return self.other(node),
                    },
                    None => return self.other(node),
                }
            }
            "as_expression" => match (field("left"), field("right")) {
                (Some(operand), Some(ty)) => ExprKind::As {
                    operand: self.boxed(operand),
                    ty: self.type_syntax(ty),
                },
                _ => return self.other(node),
            },
            "is_expression" => match (field("left"), field("right")) {
                (Some(operand), Some(ty)) => ExprKind::Is {
                    operand: self.boxed(operand),
                    ty: Some(self.type_syntax(ty)),
                    negated: false,
                },
                _ => return self.other(node),
            },
            "is_pattern_expression" => match (field("expression"), field("pattern")) {
                (Some(operand), Some(pattern)) => {
                    let (ty, negated) = self.pattern_type(pattern);
                    ExprKind::Is {
                        operand: self.boxed(operand),
                        ty,
                        negated,
                    }
                }
                _ => return self.other(node),
            },
            "assignment_expression" => match (field("left"), field("right")) {
                (Some(target), Some(value)) => ExprKind::Assign {
                    target: self.boxed(target),
                    value: self.boxed(value),
                },
                _ => return self.other(node),
            },
            "conditional_expression" => {
                match (field("condition"), field("consequence"), field("alternative")) {
                    (Some(cond), Some(then), Some(otherwise)) => ExprKind::Conditional {
                        cond: self.boxed(cond),
                        then: self.boxed(then),
                        otherwise: self.boxed(otherwise),
                    },
                    _ => return self.other(node),
                }
            }
            "parenthesized_expression" | "checked_expression" => {
                match items(node).into_iter().next() {
                    Some(inner) => ExprKind::Paren(self.boxed(inner)),
                    None => return self.other(node),
                }
            }
            "cast_expression" => match (field("type"), field("value")) {
                (Some(ty), Some(operand)) => ExprKind::Cast {
                    ty: self.type_syntax(ty),
                    operand: self.boxed(operand),
                },
                _ => return self.other(node),
            },
            "object_creation_expression"
            | "implicit_object_creation_expression"
            | "array_creation_expression"
            | "implicit_array_creation_expression" => {
                let ty = field("type").map(|ty| self.type_syntax(ty));
                let args = field("arguments")
                    .or_else(|| child_of_kind(node, &["argument_list"]))
                    .map(|list| self.arguments(list))
                    .unwrap_or_default();
                let initializer = field("initializer")
                    .or_else(|| child_of_kind(node, &["initializer_expression"]))
                    .map(|init| self.initializer(init))
                    .unwrap_or_default();
                ExprKind::New {
                    ty,
                    args,
                    initializer,
                }
            }
            "initializer_expression" => ExprKind::New {
                ty: None,
                args: Vec::new(),
                initializer: self.initializer(node),
            },
            "default_expression" => ExprKind::Default(field("type").map(|ty| self.type_syntax(ty))),
            "typeof_expression" => match field("type").or_else(|| items(node).into_iter().next()) {
                Some(ty) => ExprKind::TypeOf(self.type_syntax(ty)),
                None => return self.other(node),
            },
            "throw_expression" => match items(node).into_iter().next() {
                Some(inner) => ExprKind::Throw(self.boxed(inner)),
                None => return self.other(node),
            },
            // `out var x` reads as the declared name.
            "declaration_expression" => match field("name") {
                Some(name) => ExprKind::Name(self.ident(name)),
                None => return self.other(node),
            },
            _ => return self.other(node),
        };
        self.mk(kind, span)
    }

    fn simple_name(&self, node: Node<'_>) -> Ident {
        match node.kind() {
            "generic_name" => match child_of_kind(node, &["identifier"]) {
                Some(name) => self.ident(name),
                None => self.ident(node),
            },
            _ => self.ident(node),
        }
    }

    /// `a?.B().C`: the receiver is handed to the member binding that starts
    /// the chain after `?`.
    fn conditional_access(&mut self, node: Node<'_>) -> Expr {
        let Some(condition) = node.child_by_field_name("condition") else {
            return self.other(node);
        };
        let receiver = self.expr(condition);
        let Some(chain) = items(node).into_iter().find(|c| c.id() != condition.id()) else {
            return receiver;
        };

        let outer = self.binding.replace(receiver);
        let lowered = self.expr(chain);
        let unused = std::mem::replace(&mut self.binding, outer);
        match unused {
            None => Expr {
                span: self.span(node),
                ..lowered
            },
            Some(receiver) => {
                let span = self.span(node);
                self.mk(
                    ExprKind::Other {
                        operands: vec![receiver, lowered],
                    },
                    span,
                )
            }
        }
    }

    fn arguments(&mut self, list: Node<'_>) -> Vec<Argument> {
        let mut args = Vec::new();
        for arg in items(list) {
            if arg.kind() != "argument" {
                continue;
            }
            let name = arg.child_by_field_name("name");
            let Some(value) = items(arg)
                .into_iter()
                .find(|c| Some(c.id()) != name.map(|n| n.id()))
            else {
                continue;
            };
            let modifier = children(arg)
                .into_iter()
                .find(|c| !c.is_named() && matches!(c.kind(), "ref" | "out" | "in"))
                .map(|c| c.kind().to_string());
            args.push(Argument {
                name: name.map(|n| self.ident(n)),
                modifier,
                value: self.expr(value),
            });
        }
        args
    }

    /// Initializer entries, with nested collection initializers flattened.
    fn initializer(&mut self, node: Node<'_>) -> Vec<Expr> {
        let mut entries = Vec::new();
        for item in items(node) {
            if item.kind() == "initializer_expression" {
                entries.extend(self.initializer(item));
            } else {
                entries.push(self.expr(item));
            }
        }
        entries
    }

    fn lambda(&mut self, node: Node<'_>) -> Option<Lambda> {
        let params_node = node.child_by_field_name("parameters")?;
        let body_node = node.child_by_field_name("body")?;
        let is_async = children(node)
            .into_iter()
            .take_while(|c| c.id() != params_node.id())
            .any(|c| self.text(c) == "async");

        let (params, parenthesized) = match params_node.kind() {
            "parameter_list" => {
                let params = items(params_node)
                    .into_iter()
                    .filter(|p| p.kind() == "parameter")
                    .filter_map(|p| {
                        let name = p.child_by_field_name("name")?;
                        Some(LambdaParam {
                            ty: self.optional_type(p.child_by_field_name("type")),
                            name: self.ident(name),
                        })
                    })
                    .collect();
                (params, true)
            }
            _ => (
                vec![LambdaParam {
                    ty: None,
                    name: self.ident(params_node),
                }],
                false,
            ),
        };

        let body = match body_node.kind() {
            "block" => LambdaBody::Block(self.block(body_node)),
            _ => LambdaBody::Expr(self.boxed(body_node)),
        };
        Some(Lambda {
            params,
            parenthesized,
            is_async,
            body,
        })
    }

    /// The type tested by an `is` pattern and whether it is negated.
    fn pattern_type(&self, pattern: Node<'_>) -> (Option<TypeSyntax>, bool) {
        match pattern.kind() {
            "negated_pattern" => match items(pattern).into_iter().next() {
                Some(inner) => (self.pattern_type(inner).0, true),
                None => (None, true),
            },
            "type_pattern" | "declaration_pattern" | "recursive_pattern" => (
                pattern
                    .child_by_field_name("type")
                    .or_else(|| items(pattern).into_iter().find(|c| is_type_node(c.kind())))
                    .map(|ty| self.type_syntax(ty)),
                false,
            ),
            "constant_pattern" => (None, false),
            kind if is_type_node(kind) && kind != "identifier" => {
                (Some(self.type_syntax(pattern)), false)
            }
            _ => (None, false),
        }
    }
}
