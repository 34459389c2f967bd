use super::types::{MemberId, Ty, TypeId, TypeKind};
use crate::syntax::Expr;

/// What an expression refers to.
#[derive(Debug, Clone, PartialEq)]
pub enum Symbol {
    Member(MemberId),
    Local(String),
    Type(Ty),
}

/// A resolved method call: the method and the constructed type it was
/// found on.
#[derive(Debug, Clone, PartialEq)]
pub struct MethodSymbol {
    pub member: MemberId,
    pub name: String,
    pub containing_def: TypeId,
    pub containing_args: Vec<Ty>,
}

/// Compilation-wide queries that do not depend on a particular document.
pub trait TypeLookup {
    /// Resolve a type by metadata name (`Ns.Name`N`).
    fn type_by_metadata_name(&self, name: &str) -> Option<TypeId>;
}

/// Symbol and type queries the rules run against. Implemented by the
/// semantic model of one document; tests substitute simple fakes.
pub trait SymbolResolver: TypeLookup {
    /// The method an invocation binds to.
    fn method_of(&self, call: &Expr) -> Option<MethodSymbol>;

    fn symbol_of(&self, expr: &Expr) -> Option<Symbol>;

    fn type_of(&self, expr: &Expr) -> Option<Ty>;

    fn type_kind(&self, ty: &Ty) -> TypeKind;

    /// Fields and properties of a type, own declarations first and then
    /// inherited ones, each in declaration order.
    fn data_members(&self, def: TypeId) -> Vec<MemberId>;

    /// Whether `member` carries an attribute whose class is exactly `attribute`.
    fn has_attribute(&self, member: MemberId, attribute: TypeId) -> bool;

    fn member_name(&self, member: MemberId) -> Option<String>;

    /// Namespace a declared type lives in (`""` for the global namespace).
    fn namespace_of(&self, def: TypeId) -> Option<String>;

    /// Namespaces imported with `using` anywhere in the document.
    fn imported_namespaces(&self) -> Vec<String>;

    /// The member an expression refers to, if it is a field, property or method.
    fn member_of(&self, expr: &Expr) -> Option<MemberId> {
        match self.symbol_of(expr)? {
            Symbol::Member(member) => Some(member),
            _ => None,
        }
    }
}
