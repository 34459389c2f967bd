use std::collections::{HashMap, HashSet};

use tracing::debug;

use super::types::{Builtin, MemberId, Ty, TypeId, TypeKind};
use crate::syntax::ast::{
    AttributeSyntax, CompilationUnit, MemberDecl, NamespaceMember, ParamDecl, TypeDecl,
    TypeDeclKind, TypeSyntax, UsingDirective,
};
use crate::syntax::TextSpan;

#[derive(Debug, Clone)]
pub struct TypeSymbol {
    pub name: String,
    /// Dotted name including namespace and enclosing types.
    pub full_name: String,
    pub namespace: String,
    /// `Ns.Outer+Inner`1` style name.
    pub metadata_name: String,
    pub kind: TypeKind,
    pub type_params: Vec<String>,
    pub bases: Vec<Ty>,
    pub members: Vec<MemberId>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemberKind {
    Field,
    Property,
    Method,
    Constructor,
}

impl MemberKind {
    pub fn is_data(self) -> bool {
        matches!(self, MemberKind::Field | MemberKind::Property)
    }
}

#[derive(Debug, Clone)]
pub struct ParamSymbol {
    pub name: String,
    pub ty: Ty,
    pub optional: bool,
    pub is_params: bool,
}

#[derive(Debug, Clone)]
pub struct MemberSymbol {
    pub name: String,
    pub kind: MemberKind,
    pub containing: TypeId,
    /// Field or property type, or a method's return type.
    pub ty: Ty,
    pub params: Vec<ParamSymbol>,
    pub type_params: Vec<String>,
    pub attributes: Vec<TypeId>,
    pub is_static: bool,
    pub span: TextSpan,
}

impl MemberSymbol {
    /// Whether a call with `count` arguments can bind to this method.
    pub fn accepts_arity(&self, count: usize) -> bool {
        let required = self
            .params
            .iter()
            .filter(|p| !p.optional && !p.is_params)
            .count();
        let variadic = self.params.iter().any(|p| p.is_params);
        count >= required && (variadic || count <= self.params.len())
    }

    /// Declared type of the parameter receiving argument `index` (or the
    /// named argument `name`).
    pub fn param_for(&self, index: usize, name: Option<&str>) -> Option<&ParamSymbol> {
        if let Some(name) = name {
            return self.params.iter().find(|p| p.name == name);
        }
        self.params
            .get(index)
            .or_else(|| self.params.last().filter(|p| p.is_params))
    }
}

#[derive(Debug, Clone)]
enum UsingKind {
    Namespace(String),
    Alias(String, String),
    Static(String),
}

/// One namespace level of a name-lookup context with its using directives.
#[derive(Debug, Clone)]
pub struct ScopeLevel {
    pub namespace: String,
    usings: Vec<UsingKind>,
}

impl ScopeLevel {
    pub fn new(namespace: impl Into<String>, usings: &[UsingDirective]) -> Self {
        let usings = usings
            .iter()
            .map(|u| {
                let target = u.name.dotted();
                match (&u.alias, u.is_static) {
                    (Some(alias), _) => UsingKind::Alias(alias.name().to_string(), target),
                    (None, true) => UsingKind::Static(target),
                    (None, false) => UsingKind::Namespace(target),
                }
            })
            .collect();
        Self {
            namespace: namespace.into(),
            usings,
        }
    }

    /// Namespaces imported by plain `using` directives at this level.
    pub fn imported_namespaces(&self) -> impl Iterator<Item = &str> {
        self.usings.iter().filter_map(|u| match u {
            UsingKind::Namespace(ns) => Some(ns.as_str()),
            _ => None,
        })
    }
}

/// Where a type name is being resolved: namespace levels (outermost
/// first), enclosing type declarations and method type parameters.
#[derive(Debug, Clone, Default)]
pub struct TypeContext {
    pub levels: Vec<ScopeLevel>,
    pub enclosing: Vec<TypeId>,
    pub method_type_params: Vec<String>,
}

impl TypeContext {
    pub fn for_unit(unit: &CompilationUnit) -> Self {
        Self {
            levels: vec![ScopeLevel::new("", &unit.usings)],
            enclosing: Vec::new(),
            method_type_params: Vec::new(),
        }
    }

    pub fn namespace(&self) -> &str {
        self.levels.last().map_or("", |l| l.namespace.as_str())
    }

    pub fn enter_namespace(&mut self, name: &str, usings: &[UsingDirective]) {
        let full = qualify(self.namespace(), name);
        self.levels.push(ScopeLevel::new(full, usings));
    }
}

pub(crate) fn qualify(namespace: &str, name: &str) -> String {
    if namespace.is_empty() {
        name.to_string()
    } else {
        format!("{namespace}.{name}")
    }
}

/// All types and members declared across a set of parsed documents.
///
/// Built once and then shared read-only between per-document semantic
/// models.
#[derive(Debug, Default)]
pub struct Compilation {
    types: Vec<TypeSymbol>,
    members: Vec<MemberSymbol>,
    by_full_name: HashMap<(String, usize), TypeId>,
    by_metadata_name: HashMap<String, TypeId>,
}

impl Compilation {
    pub fn new<'u>(units: impl IntoIterator<Item = &'u CompilationUnit>) -> Self {
        let units: Vec<&CompilationUnit> = units.into_iter().collect();
        let mut compilation = Compilation::default();

        for unit in &units {
            compilation.declare_members(&unit.members, "");
        }
        for unit in &units {
            let mut ctx = TypeContext::for_unit(unit);
            compilation.define_members(&unit.members, &mut ctx);
        }

        debug!(
            units = units.len(),
            types = compilation.types.len(),
            members = compilation.members.len(),
            "Built compilation"
        );
        compilation
    }

    pub fn type_symbol(&self, id: TypeId) -> &TypeSymbol {
        &self.types[id.0 as usize]
    }

    pub fn member(&self, id: MemberId) -> &MemberSymbol {
        &self.members[id.0 as usize]
    }

    pub fn type_count(&self) -> usize {
        self.types.len()
    }

    /// Look a type up by its metadata name, e.g. `Flowaccount.Data.IDataHandler`1`.
    pub fn type_by_metadata_name(&self, name: &str) -> Option<TypeId> {
        self.by_metadata_name.get(name).copied()
    }

    pub fn find_type(&self, full_name: &str, arity: usize) -> Option<TypeId> {
        self.by_full_name
            .get(&(full_name.to_string(), arity))
            .copied()
    }

    pub fn type_kind(&self, ty: &Ty) -> TypeKind {
        match ty {
            Ty::Named { def, .. } => self.type_symbol(*def).kind,
            Ty::Param(_) | Ty::MethodParam(_) => TypeKind::TypeParameter,
            Ty::Builtin(b) => b.kind(),
            Ty::Array(_) => TypeKind::Array,
            Ty::External { .. } => TypeKind::External,
            Ty::Unknown => TypeKind::Unknown,
        }
    }

    // -----------------------------------------------------------------
    // Declaration pass
    // -----------------------------------------------------------------

    fn declare_members(&mut self, members: &[NamespaceMember], namespace: &str) {
        for member in members {
            match member {
                NamespaceMember::Namespace(ns) => {
                    let full = qualify(namespace, &ns.name.dotted());
                    self.declare_members(&ns.members, &full);
                }
                NamespaceMember::Type(decl) => {
                    self.declare_type(decl, namespace, None);
                }
            }
        }
    }

    fn declare_type(&mut self, decl: &TypeDecl, namespace: &str, outer: Option<TypeId>) {
        let name = decl.name.name().to_string();
        let arity = decl.type_params.len();
        let (full_name, metadata_base) = match outer {
            Some(outer) => {
                let outer = self.type_symbol(outer);
                (
                    format!("{}.{name}", outer.full_name),
                    format!("{}+{name}", outer.metadata_name),
                )
            }
            None => (qualify(namespace, &name), qualify(namespace, &name)),
        };
        let key = (full_name.clone(), arity);

        let id = match self.by_full_name.get(&key) {
            Some(&id) => id,
            None => {
                let id = TypeId(self.types.len() as u32);
                let metadata_name = if arity == 0 {
                    metadata_base
                } else {
                    format!("{metadata_base}`{arity}")
                };
                self.by_metadata_name.insert(metadata_name.clone(), id);
                self.by_full_name.insert(key, id);
                self.types.push(TypeSymbol {
                    name,
                    full_name,
                    namespace: namespace.to_string(),
                    metadata_name,
                    kind: decl_kind(decl.kind),
                    type_params: decl.type_params.iter().map(|p| p.name().to_string()).collect(),
                    bases: Vec::new(),
                    members: Vec::new(),
                });
                id
            }
        };

        for member in &decl.members {
            if let MemberDecl::Type(nested) = member {
                self.declare_type(nested, namespace, Some(id));
            }
        }
    }

    // -----------------------------------------------------------------
    // Definition pass
    // -----------------------------------------------------------------

    fn define_members(&mut self, members: &[NamespaceMember], ctx: &mut TypeContext) {
        for member in members {
            match member {
                NamespaceMember::Namespace(ns) => {
                    ctx.enter_namespace(&ns.name.dotted(), &ns.usings);
                    self.define_members(&ns.members, ctx);
                    ctx.levels.pop();
                }
                NamespaceMember::Type(decl) => self.define_type(decl, ctx),
            }
        }
    }

    /// The id a declaration was registered under during the declaration pass.
    pub fn declared_id(&self, decl: &TypeDecl, ctx: &TypeContext) -> Option<TypeId> {
        let full_name = match ctx.enclosing.last() {
            Some(outer) => format!("{}.{}", self.type_symbol(*outer).full_name, decl.name.name()),
            None => qualify(ctx.namespace(), decl.name.name()),
        };
        self.find_type(&full_name, decl.type_params.len())
    }

    fn define_type(&mut self, decl: &TypeDecl, ctx: &mut TypeContext) {
        let Some(id) = self.declared_id(decl, ctx) else {
            return;
        };
        ctx.enclosing.push(id);

        let bases: Vec<Ty> = decl.bases.iter().map(|b| self.resolve_type(b, ctx)).collect();
        for base in bases {
            let symbol = &mut self.types[id.0 as usize];
            if !symbol.bases.contains(&base) {
                symbol.bases.push(base);
            }
        }

        if matches!(decl.kind, TypeDeclKind::Record | TypeDeclKind::RecordStruct) {
            for param in &decl.primary_params {
                let ty = self.resolve_type(&param.ty, ctx);
                self.add_member(MemberSymbol {
                    name: param.name.name().to_string(),
                    kind: MemberKind::Property,
                    containing: id,
                    ty,
                    params: Vec::new(),
                    type_params: Vec::new(),
                    attributes: Vec::new(),
                    is_static: false,
                    span: param.span,
                });
            }
        }

        for member in &decl.members {
            match member {
                MemberDecl::Field(field) => {
                    let symbol = MemberSymbol {
                        name: field.name.name().to_string(),
                        kind: MemberKind::Field,
                        containing: id,
                        ty: self.resolve_type(&field.ty, ctx),
                        params: Vec::new(),
                        type_params: Vec::new(),
                        attributes: self.resolve_attributes(&field.attributes, ctx),
                        is_static: is_static(&field.modifiers),
                        span: field.span,
                    };
                    self.add_member(symbol);
                }
                MemberDecl::Property(prop) => {
                    let symbol = MemberSymbol {
                        name: prop.name.name().to_string(),
                        kind: MemberKind::Property,
                        containing: id,
                        ty: self.resolve_type(&prop.ty, ctx),
                        params: Vec::new(),
                        type_params: Vec::new(),
                        attributes: self.resolve_attributes(&prop.attributes, ctx),
                        is_static: is_static(&prop.modifiers),
                        span: prop.span,
                    };
                    self.add_member(symbol);
                }
                MemberDecl::Method(method) => {
                    ctx.method_type_params =
                        method.type_params.iter().map(|p| p.name().to_string()).collect();
                    let symbol = MemberSymbol {
                        name: method.name.name().to_string(),
                        kind: if method.return_type.is_some() {
                            MemberKind::Method
                        } else {
                            MemberKind::Constructor
                        },
                        containing: id,
                        ty: match &method.return_type {
                            Some(ty) => self.resolve_type(ty, ctx),
                            None => Ty::Unknown,
                        },
                        params: self.resolve_params(&method.params, ctx),
                        type_params: ctx.method_type_params.clone(),
                        attributes: self.resolve_attributes(&method.attributes, ctx),
                        is_static: is_static(&method.modifiers),
                        span: method.span,
                    };
                    ctx.method_type_params.clear();
                    self.add_member(symbol);
                }
                MemberDecl::Type(nested) => self.define_type(nested, ctx),
            }
        }

        ctx.enclosing.pop();
    }

    fn add_member(&mut self, symbol: MemberSymbol) {
        let id = MemberId(self.members.len() as u32);
        self.types[symbol.containing.0 as usize].members.push(id);
        self.members.push(symbol);
    }

    fn resolve_params(&self, params: &[ParamDecl], ctx: &TypeContext) -> Vec<ParamSymbol> {
        params
            .iter()
            .map(|p| ParamSymbol {
                name: p.name.name().to_string(),
                ty: self.resolve_type(&p.ty, ctx),
                optional: p.default.is_some(),
                is_params: p.modifiers.iter().any(|m| m == "params"),
            })
            .collect()
    }

    fn resolve_attributes(&self, attributes: &[AttributeSyntax], ctx: &TypeContext) -> Vec<TypeId> {
        attributes
            .iter()
            .filter_map(|attr| {
                let mut names: Vec<&str> = attr.name.parts.iter().map(|p| p.name()).collect();
                let last = names.pop()?;
                if !last.ends_with("Attribute") {
                    let suffixed = format!("{last}Attribute");
                    let mut candidate = names.clone();
                    candidate.push(&suffixed);
                    if let Some(id) = self.lookup_type(&candidate, 0, ctx) {
                        return Some(id);
                    }
                }
                names.push(last);
                self.lookup_type(&names, 0, ctx)
            })
            .collect()
    }

    // -----------------------------------------------------------------
    // Name lookup
    // -----------------------------------------------------------------

    /// Resolve a written type in the given context. Names that match no
    /// declared type become [`Ty::External`].
    pub fn resolve_type(&self, syntax: &TypeSyntax, ctx: &TypeContext) -> Ty {
        if syntax.is_var() {
            return Ty::Unknown;
        }
        let args: Vec<Ty> = syntax
            .args
            .iter()
            .map(|arg| self.resolve_type(arg, ctx))
            .collect();
        let names: Vec<&str> = syntax.path.iter().map(|p| p.name()).collect();
        let mut ty = self.resolve_path(&names, args, ctx);
        for _ in 0..syntax.array_rank {
            ty = Ty::Array(Box::new(ty));
        }
        ty
    }

    pub fn resolve_path(&self, names: &[&str], args: Vec<Ty>, ctx: &TypeContext) -> Ty {
        if names.len() == 1 && args.is_empty() {
            let name = names[0];
            if let Some(builtin) = Builtin::from_keyword(name) {
                return Ty::Builtin(builtin);
            }
            if let Some(i) = ctx.method_type_params.iter().position(|p| p == name) {
                return Ty::MethodParam(i as u32);
            }
            if let Some(&inner) = ctx.enclosing.last() {
                let params = &self.type_symbol(inner).type_params;
                if let Some(i) = params.iter().position(|p| p == name) {
                    return Ty::Param(i as u32);
                }
            }
        }
        match self.lookup_type(names, args.len(), ctx) {
            Some(def) => Ty::Named { def, args },
            None => Ty::External {
                name: names.join("."),
                args,
            },
        }
    }

    /// Find a declared type by (possibly dotted) name and arity, searching
    /// enclosing types, then each namespace level innermost first together
    /// with its using directives.
    pub fn lookup_type(&self, names: &[&str], arity: usize, ctx: &TypeContext) -> Option<TypeId> {
        let (first, _) = names.split_first()?;
        let dotted = names.join(".");

        for &outer in ctx.enclosing.iter().rev() {
            let nested = format!("{}.{dotted}", self.type_symbol(outer).full_name);
            if let Some(id) = self.find_type(&nested, arity) {
                return Some(id);
            }
        }

        for level in ctx.levels.iter().rev() {
            if let Some(id) = self.find_type(&qualify(&level.namespace, &dotted), arity) {
                return Some(id);
            }
            for using in &level.usings {
                let candidate = match using {
                    UsingKind::Alias(alias, target) if alias.as_str() == *first => {
                        let rest = &names[1..];
                        if rest.is_empty() {
                            target.clone()
                        } else {
                            format!("{target}.{}", rest.join("."))
                        }
                    }
                    UsingKind::Namespace(ns) if names.len() == 1 => qualify(ns, &dotted),
                    UsingKind::Static(ty) => qualify(ty, &dotted),
                    _ => continue,
                };
                if let Some(id) = self.find_type(&candidate, arity) {
                    return Some(id);
                }
            }
        }

        let mut namespace = ctx.namespace();
        while let Some(dot) = namespace.rfind('.') {
            namespace = &namespace[..dot];
            if let Some(id) = self.find_type(&qualify(namespace, &dotted), arity) {
                return Some(id);
            }
        }
        None
    }

    /// Members called `name` on `def` and its base types, nearest first,
    /// each paired with the declaring type and its type arguments as seen
    /// from `args`.
    pub fn lookup_members(
        &self,
        def: TypeId,
        args: &[Ty],
        name: &str,
    ) -> Vec<(MemberId, TypeId, Vec<Ty>)> {
        let mut found = Vec::new();
        for (owner, owner_args) in self.type_chain(def, args) {
            for &member in &self.type_symbol(owner).members {
                if self.member(member).name == name {
                    found.push((member, owner, owner_args.clone()));
                }
            }
        }
        found
    }

    /// `def` followed by all of its base types (breadth first, each once)
    /// with type arguments substituted down the chain.
    pub fn type_chain(&self, def: TypeId, args: &[Ty]) -> Vec<(TypeId, Vec<Ty>)> {
        let mut chain = vec![(def, args.to_vec())];
        let mut seen = HashSet::from([def]);
        let mut next = 0;
        while next < chain.len() {
            let (current, current_args) = chain[next].clone();
            next += 1;
            for base in &self.type_symbol(current).bases {
                if let Ty::Named { def, args } = base.substitute(&current_args, &[]) {
                    if seen.insert(def) {
                        chain.push((def, args));
                    }
                }
            }
        }
        chain
    }

    /// Fields and properties of `def`: its own in declaration order, then
    /// those inherited from base types, nearest base first. A base member
    /// hidden by a same-named member of a more derived type is left out.
    pub fn data_members(&self, def: TypeId) -> Vec<MemberId> {
        let mut hidden: HashSet<&str> = HashSet::new();
        let mut members = Vec::new();
        for (owner, _) in self.type_chain(def, &[]) {
            let declared = &self.type_symbol(owner).members;
            members.extend(declared.iter().copied().filter(|&m| {
                let member = self.member(m);
                member.kind.is_data() && !hidden.contains(member.name.as_str())
            }));
            hidden.extend(declared.iter().map(|&m| self.member(m).name.as_str()));
        }
        members
    }
}

fn decl_kind(kind: TypeDeclKind) -> TypeKind {
    match kind {
        TypeDeclKind::Class | TypeDeclKind::Record => TypeKind::Class,
        TypeDeclKind::Interface => TypeKind::Interface,
        TypeDeclKind::Struct | TypeDeclKind::RecordStruct => TypeKind::Struct,
        TypeDeclKind::Enum => TypeKind::Enum,
    }
}

fn is_static(modifiers: &[String]) -> bool {
    modifiers.iter().any(|m| m == "static" || m == "const")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::syntax::parse;

    fn compile(sources: &[&str]) -> Compilation {
        let units: Vec<_> = sources.iter().map(|s| parse(s).unwrap().unit).collect();
        Compilation::new(&units)
    }

    const ENTITIES: &str = r#"
namespace FlowAccount.Core.Attributes
{
    public class NotOptionalAttribute : System.Attribute { }
}
namespace Other
{
    public class NotOptionalAttribute : System.Attribute { }
}
namespace Flowaccount.Data
{
    using FlowAccount.Core.Attributes;

    public interface IDataHandler<T> where T : class
    {
        IList<T> FindList(Expression<Func<T, bool>> where);
    }

    public class EntityBase
    {
        [NotOptional]
        public int TenantId { get; set; }
    }

    public partial class Model : EntityBase
    {
        [NotOptional]
        public int Id { get; set; }
    }

    public partial class Model
    {
        [Other.NotOptional]
        public string Name { get; set; }
        public string Email;
    }
}
"#;

    #[test]
    fn test_metadata_names() {
        let compilation = compile(&[ENTITIES]);
        let handler = compilation
            .type_by_metadata_name("Flowaccount.Data.IDataHandler`1")
            .unwrap();
        assert_eq!(compilation.type_symbol(handler).kind, TypeKind::Interface);
        assert_eq!(compilation.type_symbol(handler).type_params, vec!["T"]);
        assert!(compilation
            .type_by_metadata_name("FlowAccount.Core.Attributes.NotOptionalAttribute")
            .is_some());
        assert!(compilation.type_by_metadata_name("Flowaccount.Data.IDataHandler").is_none());
    }

    #[test]
    fn test_partials_merge_and_attributes_resolve_by_namespace() {
        let compilation = compile(&[ENTITIES]);
        let model = compilation.type_by_metadata_name("Flowaccount.Data.Model").unwrap();
        let marker = compilation
            .type_by_metadata_name("FlowAccount.Core.Attributes.NotOptionalAttribute")
            .unwrap();
        let other = compilation
            .type_by_metadata_name("Other.NotOptionalAttribute")
            .unwrap();

        let names: Vec<_> = compilation
            .data_members(model)
            .into_iter()
            .map(|m| compilation.member(m).name.clone())
            .collect();
        assert_eq!(names, vec!["Id", "Name", "Email", "TenantId"]);

        let id = compilation.lookup_members(model, &[], "Id")[0].0;
        assert_eq!(compilation.member(id).attributes, vec![marker]);
        let name = compilation.lookup_members(model, &[], "Name")[0].0;
        assert_eq!(compilation.member(name).attributes, vec![other]);
    }

    #[test]
    fn test_hidden_base_members_are_left_out() {
        let compilation = compile(&[r#"
public class Base
{
    public int Id { get; set; }
    public int TenantId { get; set; }
}
public class Model : Base
{
    public new int Id { get; set; }
    public string Name { get; set; }
}
"#]);
        let model = compilation.type_by_metadata_name("Model").unwrap();
        let owners: Vec<_> = compilation
            .data_members(model)
            .into_iter()
            .map(|m| {
                let member = compilation.member(m);
                (member.name.clone(), compilation.type_symbol(member.containing).name.clone())
            })
            .collect();
        assert_eq!(
            owners,
            vec![
                ("Id".to_string(), "Model".to_string()),
                ("Name".to_string(), "Model".to_string()),
                ("TenantId".to_string(), "Base".to_string()),
            ]
        );
    }

    #[test]
    fn test_method_signature_keeps_type_parameters() {
        let compilation = compile(&[ENTITIES]);
        let handler = compilation
            .type_by_metadata_name("Flowaccount.Data.IDataHandler`1")
            .unwrap();
        let model = compilation.type_by_metadata_name("Flowaccount.Data.Model").unwrap();
        let found = compilation.lookup_members(handler, &[Ty::named(model, vec![])], "FindList");
        assert_eq!(found.len(), 1);
        let (method, owner, owner_args) = &found[0];
        assert_eq!(*owner, handler);
        let param = &compilation.member(*method).params[0].ty;
        let substituted = param.substitute(owner_args, &[]);
        assert_eq!(substituted.external_simple_name(), Some("Expression"));
        let func = &substituted.type_args()[0];
        assert_eq!(func.type_args()[0], Ty::named(model, vec![]));
    }

    #[test]
    fn test_types_resolve_across_documents() {
        let compilation = compile(&[
            "namespace A { public class Entity { } }",
            "using A; namespace B { public class Holder { public Entity Value; } }",
        ]);
        let holder = compilation.type_by_metadata_name("B.Holder").unwrap();
        let entity = compilation.type_by_metadata_name("A.Entity").unwrap();
        let value = compilation.data_members(holder)[0];
        assert_eq!(compilation.member(value).ty, Ty::named(entity, vec![]));
    }

    #[test]
    fn test_nested_type_metadata_name() {
        let compilation = compile(&["public class Outer { public class Inner<T> { } }"]);
        assert!(compilation.type_by_metadata_name("Outer+Inner`1").is_some());
        assert!(compilation.find_type("Outer.Inner", 1).is_some());
    }
}
