//! In-memory resolver for exercising the rule without a compilation.

use std::collections::{HashMap, HashSet};

use super::metadata::{ACCESS_INTERFACE, MARKER_ATTRIBUTE};
use crate::semantic::{
    MemberId, MethodSymbol, Symbol, SymbolResolver, Ty, TypeId, TypeKind, TypeLookup,
};
use crate::syntax::visit::walk_descendants;
use crate::syntax::{Expr, ExprId, ExprKind};

struct FakeType {
    metadata_name: String,
    kind: TypeKind,
    base: Option<TypeId>,
}

struct FakeMember {
    name: String,
    owner: TypeId,
    attributes: Vec<TypeId>,
    is_data: bool,
}

#[derive(Default)]
pub struct FakeModel {
    types: Vec<FakeType>,
    members: Vec<FakeMember>,
    symbols: HashMap<ExprId, MemberId>,
    methods: HashMap<ExprId, MethodSymbol>,
    /// Receiver type used by [`FakeModel::bind`].
    pub access: Option<TypeId>,
    pub entity: Option<Ty>,
}

impl FakeModel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_type(&mut self, metadata_name: &str, kind: TypeKind) -> TypeId {
        self.types.push(FakeType {
            metadata_name: metadata_name.to_string(),
            kind,
            base: None,
        });
        TypeId(self.types.len() as u32 - 1)
    }

    pub fn set_base(&mut self, derived: TypeId, base: TypeId) {
        self.types[derived.0 as usize].base = Some(base);
    }

    pub fn add_member(&mut self, owner: TypeId, name: &str, attributes: &[TypeId]) -> MemberId {
        self.members.push(FakeMember {
            name: name.to_string(),
            owner,
            attributes: attributes.to_vec(),
            is_data: true,
        });
        MemberId(self.members.len() as u32 - 1)
    }

    /// Both anchors plus the access interface as the call receiver.
    pub fn with_anchors() -> (Self, TypeId) {
        let mut model = Self::new();
        let access = model.add_type(ACCESS_INTERFACE, TypeKind::Interface);
        let marker = model.add_type(MARKER_ATTRIBUTE, TypeKind::Class);
        model.access = Some(access);
        (model, marker)
    }

    /// Anchors and a `Shop.Model` class whose `required` members carry the
    /// marker and whose `other` members do not.
    pub fn with_entity(required: &[&str], other: &[&str]) -> Self {
        let (mut model, marker) = Self::with_anchors();
        let entity = model.add_type("Shop.Model", TypeKind::Class);
        for name in required {
            model.add_member(entity, name, &[marker]);
        }
        for name in other {
            model.add_member(entity, name, &[]);
        }
        model.entity = Some(Ty::named(entity, Vec::new()));
        model
    }

    /// Bind `call` as `FindList` on the access interface constructed over
    /// the entity, and every `x.Name` inside it to the entity member of
    /// that name.
    pub fn bind(mut self, call: &Expr) -> Self {
        let (Some(access), Some(entity)) = (self.access, self.entity.clone()) else {
            return self;
        };
        let method = self.members.len() as u32;
        self.members.push(FakeMember {
            name: "FindList".to_string(),
            owner: access,
            attributes: Vec::new(),
            is_data: false,
        });
        self.methods.insert(
            call.id,
            MethodSymbol {
                member: MemberId(method),
                name: "FindList".to_string(),
                containing_def: access,
                containing_args: vec![entity.clone()],
            },
        );

        let Ty::Named { def, .. } = entity else {
            return self;
        };
        let chain = self.data_members(def);
        let mut bound = Vec::new();
        walk_descendants(call, |expr| {
            if let ExprKind::MemberAccess { target, name, .. } = &expr.kind {
                if matches!(target.kind, ExprKind::Name(_)) {
                    bound.push((expr.id, name.name().to_string()));
                }
            }
        });
        for (id, name) in bound {
            if let Some(&member) = chain
                .iter()
                .find(|&&m| self.members[m.0 as usize].name == name)
            {
                self.symbols.insert(id, member);
            }
        }
        self
    }
}

impl TypeLookup for FakeModel {
    fn type_by_metadata_name(&self, name: &str) -> Option<TypeId> {
        self.types
            .iter()
            .position(|t| t.metadata_name == name)
            .map(|i| TypeId(i as u32))
    }
}

impl SymbolResolver for FakeModel {
    fn method_of(&self, call: &Expr) -> Option<MethodSymbol> {
        self.methods.get(&call.id).cloned()
    }

    fn symbol_of(&self, expr: &Expr) -> Option<Symbol> {
        self.symbols.get(&expr.id).map(|&m| Symbol::Member(m))
    }

    fn type_of(&self, _expr: &Expr) -> Option<Ty> {
        None
    }

    fn type_kind(&self, ty: &Ty) -> TypeKind {
        match ty {
            Ty::Named { def, .. } => self.types[def.0 as usize].kind,
            Ty::Builtin(builtin) => builtin.kind(),
            _ => TypeKind::Unknown,
        }
    }

    fn data_members(&self, def: TypeId) -> Vec<MemberId> {
        let mut found = Vec::new();
        let mut hidden: HashSet<&str> = HashSet::new();
        let mut current = Some(def);
        while let Some(owner) = current {
            let declared: Vec<_> = self
                .members
                .iter()
                .enumerate()
                .filter(|(_, m)| m.owner == owner)
                .collect();
            found.extend(
                declared
                    .iter()
                    .filter(|(_, m)| m.is_data && !hidden.contains(m.name.as_str()))
                    .map(|(i, _)| MemberId(*i as u32)),
            );
            hidden.extend(declared.iter().map(|(_, m)| m.name.as_str()));
            current = self.types[owner.0 as usize].base;
        }
        found
    }

    fn has_attribute(&self, member: MemberId, attribute: TypeId) -> bool {
        self.members[member.0 as usize].attributes.contains(&attribute)
    }

    fn member_name(&self, member: MemberId) -> Option<String> {
        self.members.get(member.0 as usize).map(|m| m.name.clone())
    }

    fn namespace_of(&self, def: TypeId) -> Option<String> {
        let name = &self.types.get(def.0 as usize)?.metadata_name;
        Some(name.rsplit_once('.').map_or("", |(ns, _)| ns).to_string())
    }

    fn imported_namespaces(&self) -> Vec<String> {
        Vec::new()
    }
}
