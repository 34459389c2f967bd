//! Symbol tables and binding for the parsed documents of one lint run.
//!
//! [`Compilation`] declares every type and member across all documents;
//! [`SemanticModel`] binds the expressions of one document against it and
//! answers the [`SymbolResolver`] queries the rules are written against.

pub mod binder;
pub mod compilation;
pub mod resolver;
pub mod types;

pub use binder::SemanticModel;
pub use compilation::{Compilation, MemberKind, MemberSymbol, TypeContext, TypeSymbol};
pub use resolver::{MethodSymbol, Symbol, SymbolResolver, TypeLookup};
pub use types::{Builtin, MemberId, Ty, TypeId, TypeKind};
