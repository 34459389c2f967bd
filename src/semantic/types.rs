use std::fmt;

/// Index of a source-declared type in its [`Compilation`](super::Compilation).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TypeId(pub u32);

/// Index of a field, property, method or constructor in its compilation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MemberId(pub u32);

/// Predefined types spelled with a keyword.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Builtin {
    Bool,
    Byte,
    SByte,
    Char,
    Short,
    UShort,
    Int,
    UInt,
    Long,
    ULong,
    Float,
    Double,
    Decimal,
    String,
    Object,
    Dynamic,
    Void,
}

impl Builtin {
    pub fn from_keyword(word: &str) -> Option<Self> {
        Some(match word {
            "bool" => Builtin::Bool,
            "byte" => Builtin::Byte,
            "sbyte" => Builtin::SByte,
            "char" => Builtin::Char,
            "short" => Builtin::Short,
            "ushort" => Builtin::UShort,
            "int" => Builtin::Int,
            "uint" => Builtin::UInt,
            "long" => Builtin::Long,
            "ulong" => Builtin::ULong,
            "float" => Builtin::Float,
            "double" => Builtin::Double,
            "decimal" => Builtin::Decimal,
            "string" => Builtin::String,
            "object" => Builtin::Object,
            "dynamic" => Builtin::Dynamic,
            "void" => Builtin::Void,
            _ => return None,
        })
    }

    pub fn keyword(self) -> &'static str {
        match self {
            Builtin::Bool => "bool",
            Builtin::Byte => "byte",
            Builtin::SByte => "sbyte",
            Builtin::Char => "char",
            Builtin::Short => "short",
            Builtin::UShort => "ushort",
            Builtin::Int => "int",
            Builtin::UInt => "uint",
            Builtin::Long => "long",
            Builtin::ULong => "ulong",
            Builtin::Float => "float",
            Builtin::Double => "double",
            Builtin::Decimal => "decimal",
            Builtin::String => "string",
            Builtin::Object => "object",
            Builtin::Dynamic => "dynamic",
            Builtin::Void => "void",
        }
    }

    pub fn kind(self) -> TypeKind {
        match self {
            Builtin::String | Builtin::Object => TypeKind::Class,
            Builtin::Dynamic | Builtin::Void => TypeKind::Unknown,
            _ => TypeKind::Struct,
        }
    }
}

/// A resolved type reference.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Ty {
    /// A source-declared type, possibly constructed with type arguments.
    Named { def: TypeId, args: Vec<Ty> },
    /// The n-th type parameter of the enclosing type declaration.
    Param(u32),
    /// The n-th type parameter of the enclosing method.
    MethodParam(u32),
    Builtin(Builtin),
    Array(Box<Ty>),
    /// A type that is not declared in the compilation, named as written.
    External { name: String, args: Vec<Ty> },
    Unknown,
}

impl Ty {
    pub fn named(def: TypeId, args: Vec<Ty>) -> Self {
        Ty::Named { def, args }
    }

    pub fn is_unknown(&self) -> bool {
        matches!(self, Ty::Unknown)
    }

    /// Replace type and method parameters with the given arguments.
    /// Parameters without a matching argument become [`Ty::Unknown`].
    pub fn substitute(&self, type_args: &[Ty], method_args: &[Ty]) -> Ty {
        match self {
            Ty::Param(i) => type_args.get(*i as usize).cloned().unwrap_or(Ty::Unknown),
            Ty::MethodParam(i) => method_args
                .get(*i as usize)
                .cloned()
                .unwrap_or(Ty::Unknown),
            Ty::Named { def, args } => Ty::Named {
                def: *def,
                args: args
                    .iter()
                    .map(|a| a.substitute(type_args, method_args))
                    .collect(),
            },
            Ty::External { name, args } => Ty::External {
                name: name.clone(),
                args: args
                    .iter()
                    .map(|a| a.substitute(type_args, method_args))
                    .collect(),
            },
            Ty::Array(elem) => Ty::Array(Box::new(elem.substitute(type_args, method_args))),
            Ty::Builtin(_) | Ty::Unknown => self.clone(),
        }
    }

    /// For an external type, the last segment of its written name.
    pub fn external_simple_name(&self) -> Option<&str> {
        match self {
            Ty::External { name, .. } => name.rsplit('.').next(),
            _ => None,
        }
    }

    pub fn type_args(&self) -> &[Ty] {
        match self {
            Ty::Named { args, .. } | Ty::External { args, .. } => args,
            _ => &[],
        }
    }
}

impl fmt::Display for Ty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn write_args(f: &mut fmt::Formatter<'_>, args: &[Ty]) -> fmt::Result {
            if args.is_empty() {
                return Ok(());
            }
            write!(f, "<")?;
            for (i, arg) in args.iter().enumerate() {
                if i > 0 {
                    write!(f, ", ")?;
                }
                write!(f, "{arg}")?;
            }
            write!(f, ">")
        }

        match self {
            Ty::Named { def, args } => {
                write!(f, "#{}", def.0)?;
                write_args(f, args)
            }
            Ty::Param(i) => write!(f, "!{i}"),
            Ty::MethodParam(i) => write!(f, "!!{i}"),
            Ty::Builtin(b) => write!(f, "{}", b.keyword()),
            Ty::Array(elem) => write!(f, "{elem}[]"),
            Ty::External { name, args } => {
                write!(f, "{name}")?;
                write_args(f, args)
            }
            Ty::Unknown => write!(f, "?"),
        }
    }
}

/// Coarse classification of a type, mirroring what a compiler reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeKind {
    Class,
    Interface,
    Struct,
    Enum,
    TypeParameter,
    Array,
    External,
    Unknown,
}

impl TypeKind {
    /// Reference types declared as classes (records included).
    pub fn is_class_like(self) -> bool {
        self == TypeKind::Class
    }
}
