//! Syntax tree node types.

use super::TextSpan;

/// Identity of an expression node, unique within one parsed document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ExprId(pub u32);

#[derive(Debug, Clone, PartialEq)]
pub struct Ident {
    pub text: String,
    pub span: TextSpan,
}

impl Ident {
    /// The identifier without a leading verbatim `@`.
    pub fn name(&self) -> &str {
        self.text.strip_prefix('@').unwrap_or(&self.text)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct QualifiedName {
    pub parts: Vec<Ident>,
    pub span: TextSpan,
}

impl QualifiedName {
    pub fn dotted(&self) -> String {
        self.parts
            .iter()
            .map(Ident::name)
            .collect::<Vec<_>>()
            .join(".")
    }

    pub fn last(&self) -> Option<&Ident> {
        self.parts.last()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CompilationUnit {
    pub usings: Vec<UsingDirective>,
    pub members: Vec<NamespaceMember>,
    pub span: TextSpan,
}

#[derive(Debug, Clone, PartialEq)]
pub struct UsingDirective {
    pub alias: Option<Ident>,
    pub name: QualifiedName,
    pub is_static: bool,
    pub is_global: bool,
    pub span: TextSpan,
}

#[derive(Debug, Clone, PartialEq)]
pub enum NamespaceMember {
    Namespace(NamespaceDecl),
    Type(TypeDecl),
}

#[derive(Debug, Clone, PartialEq)]
pub struct NamespaceDecl {
    pub name: QualifiedName,
    pub usings: Vec<UsingDirective>,
    pub members: Vec<NamespaceMember>,
    pub file_scoped: bool,
    pub span: TextSpan,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeDeclKind {
    Class,
    Interface,
    Struct,
    Record,
    RecordStruct,
    Enum,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AttributeSyntax {
    pub name: QualifiedName,
    pub span: TextSpan,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TypeDecl {
    pub kind: TypeDeclKind,
    pub attributes: Vec<AttributeSyntax>,
    pub modifiers: Vec<String>,
    pub name: Ident,
    pub type_params: Vec<Ident>,
    pub primary_params: Vec<ParamDecl>,
    pub bases: Vec<TypeSyntax>,
    pub members: Vec<MemberDecl>,
    pub span: TextSpan,
}

#[derive(Debug, Clone, PartialEq)]
pub enum MemberDecl {
    Field(FieldDecl),
    Property(PropertyDecl),
    Method(MethodDecl),
    Type(TypeDecl),
}

#[derive(Debug, Clone, PartialEq)]
pub struct FieldDecl {
    pub attributes: Vec<AttributeSyntax>,
    pub modifiers: Vec<String>,
    pub ty: TypeSyntax,
    pub name: Ident,
    pub initializer: Option<Expr>,
    pub span: TextSpan,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PropertyDecl {
    pub attributes: Vec<AttributeSyntax>,
    pub modifiers: Vec<String>,
    pub ty: TypeSyntax,
    pub name: Ident,
    pub initializer: Option<Expr>,
    pub expression_body: Option<Expr>,
    /// Bodies of `get`/`set`/`init` accessors that have one.
    pub accessors: Vec<MethodBody>,
    pub span: TextSpan,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MethodDecl {
    pub attributes: Vec<AttributeSyntax>,
    pub modifiers: Vec<String>,
    /// `None` for constructors.
    pub return_type: Option<TypeSyntax>,
    pub name: Ident,
    pub type_params: Vec<Ident>,
    pub params: Vec<ParamDecl>,
    pub body: Option<MethodBody>,
    pub span: TextSpan,
}

#[derive(Debug, Clone, PartialEq)]
pub enum MethodBody {
    Block(Block),
    Expr(Expr),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ParamDecl {
    pub modifiers: Vec<String>,
    pub ty: TypeSyntax,
    pub name: Ident,
    pub default: Option<Expr>,
    pub span: TextSpan,
}

/// A type as written: `Ns.Name<Arg, ...>?[]`.
#[derive(Debug, Clone, PartialEq)]
pub struct TypeSyntax {
    pub path: Vec<Ident>,
    pub args: Vec<TypeSyntax>,
    pub nullable: bool,
    pub array_rank: u8,
    pub span: TextSpan,
}

impl TypeSyntax {
    pub fn last_name(&self) -> &str {
        self.path.last().map_or("", Ident::name)
    }

    pub fn is_var(&self) -> bool {
        self.path.len() == 1 && self.args.is_empty() && self.last_name() == "var"
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Block {
    pub stmts: Vec<Stmt>,
    pub span: TextSpan,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LocalDecl {
    /// `None` for `var`.
    pub ty: Option<TypeSyntax>,
    pub name: Ident,
    pub init: Option<Expr>,
    pub span: TextSpan,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CatchClause {
    pub ty: Option<TypeSyntax>,
    pub name: Option<Ident>,
    pub body: Block,
}

/// One `case ...:`/`default:` group and the statements under it.
#[derive(Debug, Clone, PartialEq)]
pub struct SwitchSection {
    /// Case values and any expressions inside patterns or `when` clauses.
    pub labels: Vec<Expr>,
    pub stmts: Vec<Stmt>,
    pub span: TextSpan,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Stmt {
    Local(LocalDecl),
    Expr(Expr),
    Return {
        value: Option<Expr>,
        span: TextSpan,
    },
    Throw {
        value: Option<Expr>,
        span: TextSpan,
    },
    If {
        cond: Expr,
        then: Box<Stmt>,
        otherwise: Option<Box<Stmt>>,
        span: TextSpan,
    },
    Foreach {
        ty: Option<TypeSyntax>,
        name: Ident,
        iterable: Expr,
        body: Box<Stmt>,
        span: TextSpan,
    },
    For {
        init: Vec<Stmt>,
        cond: Option<Expr>,
        step: Vec<Expr>,
        body: Box<Stmt>,
        span: TextSpan,
    },
    While {
        cond: Expr,
        body: Box<Stmt>,
        span: TextSpan,
    },
    Using {
        resource: Box<Stmt>,
        body: Option<Box<Stmt>>,
        span: TextSpan,
    },
    Try {
        body: Block,
        catches: Vec<CatchClause>,
        finally: Option<Block>,
        span: TextSpan,
    },
    Switch {
        value: Expr,
        sections: Vec<SwitchSection>,
        span: TextSpan,
    },
    Block(Block),
    /// `break`, `continue` and empty statements.
    Jump(TextSpan),
    /// A statement the grammar could not make sense of.
    Error(TextSpan),
}

impl Stmt {
    pub fn span(&self) -> TextSpan {
        match self {
            Stmt::Local(local) => local.span,
            Stmt::Expr(expr) => expr.span,
            Stmt::Return { span, .. }
            | Stmt::Throw { span, .. }
            | Stmt::If { span, .. }
            | Stmt::Foreach { span, .. }
            | Stmt::For { span, .. }
            | Stmt::While { span, .. }
            | Stmt::Using { span, .. }
            | Stmt::Try { span, .. }
            | Stmt::Switch { span, .. } => *span,
            Stmt::Block(block) => block.span,
            Stmt::Jump(span) | Stmt::Error(span) => *span,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Expr {
    pub id: ExprId,
    pub kind: ExprKind,
    pub span: TextSpan,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ExprKind {
    Name(Ident),
    GenericName {
        name: Ident,
        type_args: Vec<TypeSyntax>,
    },
    Literal(Literal),
    This,
    Base,
    MemberAccess {
        target: Box<Expr>,
        name: Ident,
        type_args: Vec<TypeSyntax>,
        conditional: bool,
    },
    Invocation {
        callee: Box<Expr>,
        args: Vec<Argument>,
    },
    ElementAccess {
        target: Box<Expr>,
        args: Vec<Argument>,
        conditional: bool,
    },
    Lambda(Lambda),
    Unary {
        op: UnaryOp,
        operand: Box<Expr>,
    },
    Binary {
        op: BinaryOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
    Assign {
        target: Box<Expr>,
        value: Box<Expr>,
    },
    Conditional {
        cond: Box<Expr>,
        then: Box<Expr>,
        otherwise: Box<Expr>,
    },
    Paren(Box<Expr>),
    Cast {
        ty: TypeSyntax,
        operand: Box<Expr>,
    },
    New {
        ty: Option<TypeSyntax>,
        args: Vec<Argument>,
        initializer: Vec<Expr>,
    },
    Default(Option<TypeSyntax>),
    TypeOf(TypeSyntax),
    Is {
        operand: Box<Expr>,
        ty: Option<TypeSyntax>,
        negated: bool,
    },
    As {
        operand: Box<Expr>,
        ty: TypeSyntax,
    },
    Throw(Box<Expr>),
    /// A form without a dedicated node (`switch` expressions, tuples, query
    /// syntax and the like). Only its operand expressions are kept.
    Other {
        operands: Vec<Expr>,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Int(String),
    Real(String),
    String(String),
    Char(String),
    Bool(bool),
    Null,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Argument {
    pub name: Option<Ident>,
    pub modifier: Option<String>,
    pub value: Expr,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Lambda {
    pub params: Vec<LambdaParam>,
    pub parenthesized: bool,
    pub is_async: bool,
    pub body: LambdaBody,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LambdaParam {
    pub ty: Option<TypeSyntax>,
    pub name: Ident,
}

#[derive(Debug, Clone, PartialEq)]
pub enum LambdaBody {
    Expr(Box<Expr>),
    Block(Block),
}

impl LambdaBody {
    pub fn span(&self) -> TextSpan {
        match self {
            LambdaBody::Expr(expr) => expr.span,
            LambdaBody::Block(block) => block.span,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Not,
    Neg,
    Plus,
    BitNot,
    Await,
    PreIncrement,
    PreDecrement,
    PostIncrement,
    PostDecrement,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Coalesce,
    Or,
    And,
    BitOr,
    BitXor,
    BitAnd,
    Eq,
    NotEq,
    Lt,
    Gt,
    Le,
    Ge,
    Add,
    Sub,
    Mul,
    Div,
    Rem,
}

impl BinaryOp {
    /// Binding power; higher binds tighter.
    pub fn precedence(self) -> u8 {
        match self {
            BinaryOp::Coalesce => 1,
            BinaryOp::Or => 2,
            BinaryOp::And => 3,
            BinaryOp::BitOr => 4,
            BinaryOp::BitXor => 5,
            BinaryOp::BitAnd => 6,
            BinaryOp::Eq | BinaryOp::NotEq => 7,
            BinaryOp::Lt | BinaryOp::Gt | BinaryOp::Le | BinaryOp::Ge => 8,
            BinaryOp::Add | BinaryOp::Sub => 9,
            BinaryOp::Mul | BinaryOp::Div | BinaryOp::Rem => 10,
        }
    }

    /// Precedence of relational operators, shared by `is` and `as`.
    pub const RELATIONAL: u8 = 8;

    pub fn is_right_associative(self) -> bool {
        self == BinaryOp::Coalesce
    }

    pub fn is_comparison(self) -> bool {
        matches!(
            self,
            BinaryOp::Eq
                | BinaryOp::NotEq
                | BinaryOp::Lt
                | BinaryOp::Gt
                | BinaryOp::Le
                | BinaryOp::Ge
                | BinaryOp::And
                | BinaryOp::Or
        )
    }

    pub fn symbol(self) -> &'static str {
        match self {
            BinaryOp::Coalesce => "??",
            BinaryOp::Or => "||",
            BinaryOp::And => "&&",
            BinaryOp::BitOr => "|",
            BinaryOp::BitXor => "^",
            BinaryOp::BitAnd => "&",
            BinaryOp::Eq => "==",
            BinaryOp::NotEq => "!=",
            BinaryOp::Lt => "<",
            BinaryOp::Gt => ">",
            BinaryOp::Le => "<=",
            BinaryOp::Ge => ">=",
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Rem => "%",
        }
    }
}

impl Expr {
    /// The member-name identifier of an invocation's callee, if the callee
    /// is a member access or a simple name.
    pub fn invoked_name(&self) -> Option<&Ident> {
        let ExprKind::Invocation { callee, .. } = &self.kind else {
            return None;
        };
        match &callee.kind {
            ExprKind::MemberAccess { name, .. } => Some(name),
            ExprKind::Name(name) | ExprKind::GenericName { name, .. } => Some(name),
            _ => None,
        }
    }

    pub fn is_invocation(&self) -> bool {
        matches!(self.kind, ExprKind::Invocation { .. })
    }
}
