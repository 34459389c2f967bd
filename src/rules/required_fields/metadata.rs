use crate::semantic::{MemberId, MethodSymbol, SymbolResolver, Ty, TypeId, TypeLookup};
use crate::syntax::Expr;

/// Metadata name of the generic data-access interface.
pub const ACCESS_INTERFACE: &str = "Flowaccount.Data.IDataHandler`1";

/// Metadata name of the attribute that marks a field as required in queries.
pub const MARKER_ATTRIBUTE: &str = "FlowAccount.Core.Attributes.NotOptionalAttribute";

/// The two types the rule is anchored on, looked up once per compilation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Anchors {
    pub access_interface: TypeId,
    pub marker: TypeId,
}

impl Anchors {
    /// `None` when either type is not part of the compilation, in which
    /// case no call can match.
    pub fn resolve(types: &(impl TypeLookup + ?Sized)) -> Option<Self> {
        Some(Self {
            access_interface: types.type_by_metadata_name(ACCESS_INTERFACE)?,
            marker: types.type_by_metadata_name(MARKER_ATTRIBUTE)?,
        })
    }
}

/// What the access call is querying.
#[derive(Debug, Clone, PartialEq)]
pub struct EntityMetadata {
    pub method: MethodSymbol,
    pub entity: Ty,
    /// Marked members of the entity, in declaration order, own members
    /// before inherited ones.
    pub required: Vec<MemberId>,
}

/// Resolve an invocation on the access interface to its entity type and the
/// entity's required members.
pub fn resolve(
    call: &Expr,
    resolver: &(impl SymbolResolver + ?Sized),
    anchors: Anchors,
) -> Option<EntityMetadata> {
    let method = resolver.method_of(call)?;
    if method.containing_def != anchors.access_interface || method.containing_args.len() != 1 {
        return None;
    }

    let entity = method.containing_args[0].clone();
    if !resolver.type_kind(&entity).is_class_like() {
        return None;
    }
    let Ty::Named { def, .. } = &entity else {
        return None;
    };

    let required = resolver
        .data_members(*def)
        .into_iter()
        .filter(|&member| resolver.has_attribute(member, anchors.marker))
        .collect();

    Some(EntityMetadata {
        method,
        entity,
        required,
    })
}
