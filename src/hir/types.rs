//! The type graph.
//!
//! Named declarations live in the arena of the AST that declares them and are
//! referred to everywhere else by [`TypeId`]. [`Type`] is the closed set of
//! type expressions a field, argument or typedef can carry.

use std::fmt;

use smol_str::SmolStr;

use crate::base::FqName;
use crate::syntax::Annotation;

use super::scope::ScopeId;

// ============================================================================
// IDS
// ============================================================================

/// Index of a parsed translation unit in the coordinator's arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct AstId(pub(crate) u32);

impl AstId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// A named type: the declaring AST plus the declaration's slot in it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TypeId {
    pub ast: AstId,
    pub index: u32,
}

// ============================================================================
// TYPE EXPRESSIONS
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Primitive {
    Bool,
    Int8,
    Uint8,
    Int16,
    Uint16,
    Int32,
    Uint32,
    Int64,
    Uint64,
    Float,
    Double,
    String,
    Void,
}

impl Primitive {
    pub const ALL: [Primitive; 13] = [
        Self::Bool,
        Self::Int8,
        Self::Uint8,
        Self::Int16,
        Self::Uint16,
        Self::Int32,
        Self::Uint32,
        Self::Int64,
        Self::Uint64,
        Self::Float,
        Self::Double,
        Self::String,
        Self::Void,
    ];

    pub fn from_keyword(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|p| p.keyword() == name)
    }

    /// Spelling in `.hal` source.
    pub fn keyword(self) -> &'static str {
        match self {
            Self::Bool => "bool",
            Self::Int8 => "int8_t",
            Self::Uint8 => "uint8_t",
            Self::Int16 => "int16_t",
            Self::Uint16 => "uint16_t",
            Self::Int32 => "int32_t",
            Self::Uint32 => "uint32_t",
            Self::Int64 => "int64_t",
            Self::Uint64 => "uint64_t",
            Self::Float => "float",
            Self::Double => "double",
            Self::String => "string",
            Self::Void => "void",
        }
    }

    pub fn is_integer(self) -> bool {
        self.integer_bits().is_some()
    }

    pub fn is_signed(self) -> bool {
        matches!(self, Self::Int8 | Self::Int16 | Self::Int32 | Self::Int64)
    }

    pub fn integer_bits(self) -> Option<u32> {
        match self {
            Self::Int8 | Self::Uint8 => Some(8),
            Self::Int16 | Self::Uint16 => Some(16),
            Self::Int32 | Self::Uint32 => Some(32),
            Self::Int64 | Self::Uint64 => Some(64),
            _ => None,
        }
    }

    /// Whether `value` fits this integer type.
    pub fn holds(self, value: i128) -> bool {
        let Some(bits) = self.integer_bits() else {
            return false;
        };
        if self.is_signed() {
            let max = (1i128 << (bits - 1)) - 1;
            (-max - 1..=max).contains(&value)
        } else {
            (0..(1i128 << bits)).contains(&value)
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HandleKind {
    Handle,
    Memory,
    Pointer,
}

impl HandleKind {
    pub fn from_keyword(name: &str) -> Option<Self> {
        match name {
            "handle" => Some(Self::Handle),
            "memory" => Some(Self::Memory),
            "pointer" => Some(Self::Pointer),
            _ => None,
        }
    }

    pub fn keyword(self) -> &'static str {
        match self {
            Self::Handle => "handle",
            Self::Memory => "memory",
            Self::Pointer => "pointer",
        }
    }
}

/// A resolved type expression.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Type {
    Primitive(Primitive),
    Handle(HandleKind),
    Array { element: Box<Type>, len: u32 },
    Vector(Box<Type>),
    TypeDef(TypeId),
    Enum(TypeId),
    Struct(TypeId),
    Union(TypeId),
    Interface(TypeId),
}

impl Type {
    /// Resolve a built-in keyword (`int32_t`, `handle`, ...).
    pub fn builtin(name: &str) -> Option<Type> {
        Primitive::from_keyword(name)
            .map(Type::Primitive)
            .or_else(|| HandleKind::from_keyword(name).map(Type::Handle))
    }

    /// A reference to a named declaration of the given kind.
    pub fn named(kind: DeclKind, id: TypeId) -> Type {
        match kind {
            DeclKind::Interface => Type::Interface(id),
            DeclKind::Struct => Type::Struct(id),
            DeclKind::Union => Type::Union(id),
            DeclKind::Enum => Type::Enum(id),
            DeclKind::TypeDef => Type::TypeDef(id),
        }
    }

    pub fn type_id(&self) -> Option<TypeId> {
        match self {
            Type::TypeDef(id)
            | Type::Enum(id)
            | Type::Struct(id)
            | Type::Union(id)
            | Type::Interface(id) => Some(*id),
            Type::Primitive(_) | Type::Handle(_) | Type::Array { .. } | Type::Vector(_) => None,
        }
    }

    pub fn is_interface(&self) -> bool {
        matches!(self, Type::Interface(_))
    }
}

// ============================================================================
// DECLARATIONS
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeclKind {
    Interface,
    Struct,
    Union,
    Enum,
    TypeDef,
}

impl DeclKind {
    pub fn keyword(self) -> &'static str {
        match self {
            Self::Interface => "interface",
            Self::Struct => "struct",
            Self::Union => "union",
            Self::Enum => "enum",
            Self::TypeDef => "typedef",
        }
    }

    /// Kinds that open a scope for nested declarations.
    pub fn has_scope(self) -> bool {
        matches!(self, Self::Interface | Self::Struct | Self::Union)
    }
}

impl fmt::Display for DeclKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.keyword())
    }
}

/// A declared (named) type.
///
/// The shell (name, kind, scope, enumerator names) exists from the moment the
/// file is lowered; the body is attached once resolution of the file
/// finishes.
#[derive(Debug, Clone)]
pub struct NamedType {
    pub(crate) fq_name: FqName,
    pub(crate) kind: DeclKind,
    pub(crate) scope: Option<ScopeId>,
    pub(crate) parent: Option<u32>,
    pub(crate) annotations: Vec<Annotation>,
    pub(crate) value_names: Vec<SmolStr>,
    pub(crate) body: Option<DeclBody>,
}

impl NamedType {
    pub fn fq_name(&self) -> &FqName {
        &self.fq_name
    }

    pub fn name(&self) -> &str {
        self.fq_name.simple_name()
    }

    pub fn kind(&self) -> DeclKind {
        self.kind
    }

    /// Scope holding nested declarations (interfaces, structs, unions).
    pub fn scope(&self) -> Option<ScopeId> {
        self.scope
    }

    /// Index of the enclosing declaration in the same AST.
    pub fn parent(&self) -> Option<u32> {
        self.parent
    }

    pub fn is_top_level(&self) -> bool {
        self.parent.is_none()
    }

    pub fn annotations(&self) -> &[Annotation] {
        &self.annotations
    }

    pub fn annotation(&self, name: &str) -> Option<&Annotation> {
        self.annotations.iter().find(|a| a.name == name)
    }

    pub fn body(&self) -> Option<&DeclBody> {
        self.body.as_ref()
    }

    pub fn interface(&self) -> Option<&InterfaceDecl> {
        match &self.body {
            Some(DeclBody::Interface(decl)) => Some(decl),
            _ => None,
        }
    }

    pub fn enum_decl(&self) -> Option<&EnumDecl> {
        match &self.body {
            Some(DeclBody::Enum(decl)) => Some(decl),
            _ => None,
        }
    }

    /// Struct or union fields; empty for everything else.
    pub fn fields(&self) -> &[Field] {
        match &self.body {
            Some(DeclBody::Struct(fields) | DeclBody::Union(fields)) => fields,
            _ => &[],
        }
    }

    pub fn typedef_target(&self) -> Option<&Type> {
        match &self.body {
            Some(DeclBody::TypeDef(target)) => Some(target),
            _ => None,
        }
    }

    /// Names of the enumerators declared directly on this enum.
    pub fn value_names(&self) -> &[SmolStr] {
        &self.value_names
    }
}

#[derive(Debug, Clone)]
pub enum DeclBody {
    TypeDef(Type),
    Enum(EnumDecl),
    Struct(Vec<Field>),
    Union(Vec<Field>),
    Interface(InterfaceDecl),
}

/// A struct/union field or a method parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    pub name: SmolStr,
    pub ty: Type,
}

#[derive(Debug, Clone)]
pub struct EnumDecl {
    /// An integer primitive, or a parent enum whose values this one extends.
    pub storage: Type,
    pub values: Vec<EnumValue>,
}

impl EnumDecl {
    pub fn parent(&self) -> Option<TypeId> {
        match self.storage {
            Type::Enum(id) => Some(id),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct EnumValue {
    pub name: SmolStr,
    pub expr: ConstValue,
}

/// Enumerator initializer after name resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConstValue {
    Literal(i128),
    /// Another enumerator: the enum that declares it and its position.
    Reference { ty: TypeId, index: usize },
    /// Previous enumerator plus one (zero for the first).
    Implicit,
}

#[derive(Debug, Clone)]
pub struct Method {
    pub name: SmolStr,
    pub oneway: bool,
    pub args: Vec<Field>,
    pub results: Vec<Field>,
    pub annotations: Vec<Annotation>,
}

#[derive(Debug, Clone)]
pub struct InterfaceDecl {
    pub super_interface: Option<TypeId>,
    pub methods: Vec<Method>,
}

/// Stable identity handed to version-compatibility tooling.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TypeIdentity {
    pub fq_name: FqName,
    /// SHA-256 (hex) of the declaring file.
    pub hash: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_keywords() {
        assert_eq!(Type::builtin("int32_t"), Some(Type::Primitive(Primitive::Int32)));
        assert_eq!(Type::builtin("memory"), Some(Type::Handle(HandleKind::Memory)));
        assert_eq!(Type::builtin("IFoo"), None);
    }

    #[test]
    fn test_integer_ranges() {
        assert!(Primitive::Int8.holds(-128));
        assert!(!Primitive::Int8.holds(128));
        assert!(Primitive::Uint8.holds(255));
        assert!(!Primitive::Uint8.holds(-1));
        assert!(Primitive::Uint64.holds(u64::MAX as i128));
        assert!(!Primitive::Float.holds(0));
    }
}
