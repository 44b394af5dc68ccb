//! Raw syntax tree for `.hal` files.
//!
//! Names are kept exactly as written (unresolved text plus range); the HIR
//! lowering and resolution passes give them meaning.

use smol_str::SmolStr;
use text_size::TextRange;

/// A name as written in source, e.g. `IFoo`, `Status:OK` or
/// `android.hardware.foo@1.0::IFoo.Inner`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NameRef {
    pub text: SmolStr,
    pub range: TextRange,
}

/// One parsed file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SourceFile {
    pub package: Option<NameRef>,
    pub imports: Vec<NameRef>,
    pub declarations: Vec<Declaration>,
}

impl SourceFile {
    /// The top-level interface declaration, if any.
    pub fn interface(&self) -> Option<&Declaration> {
        self.declarations
            .iter()
            .find(|decl| matches!(decl.kind, DeclarationKind::Interface(_)))
    }
}

/// `@name` or `@name(key="value", ...)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Annotation {
    pub name: SmolStr,
    pub params: Vec<(SmolStr, SmolStr)>,
    pub range: TextRange,
}

impl Annotation {
    pub fn param(&self, key: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, value)| value.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Declaration {
    pub name: SmolStr,
    pub range: TextRange,
    pub annotations: Vec<Annotation>,
    pub kind: DeclarationKind,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeclarationKind {
    Interface(InterfaceBody),
    Struct(CompoundBody),
    Union(CompoundBody),
    Enum(EnumBody),
    TypeDef(TypeExpr),
}

impl DeclarationKind {
    pub fn keyword(&self) -> &'static str {
        match self {
            Self::Interface(_) => "interface",
            Self::Struct(_) => "struct",
            Self::Union(_) => "union",
            Self::Enum(_) => "enum",
            Self::TypeDef(_) => "typedef",
        }
    }

    /// Declarations nested inside this one.
    pub fn members(&self) -> &[Declaration] {
        match self {
            Self::Interface(body) => &body.members,
            Self::Struct(body) | Self::Union(body) => &body.members,
            Self::Enum(_) | Self::TypeDef(_) => &[],
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InterfaceBody {
    pub extends: Option<NameRef>,
    pub members: Vec<Declaration>,
    pub methods: Vec<MethodDecl>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompoundBody {
    pub members: Vec<Declaration>,
    pub fields: Vec<FieldDecl>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumBody {
    pub storage: Option<TypeExpr>,
    pub values: Vec<EnumValueDecl>,
}

/// A typed name: struct field or method parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDecl {
    pub name: SmolStr,
    pub range: TextRange,
    pub ty: TypeExpr,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodDecl {
    pub name: SmolStr,
    pub range: TextRange,
    pub annotations: Vec<Annotation>,
    pub oneway: bool,
    pub args: Vec<FieldDecl>,
    pub results: Vec<FieldDecl>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumValueDecl {
    pub name: SmolStr,
    pub range: TextRange,
    pub value: Option<ConstExpr>,
}

/// Enumerator initializer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConstExpr {
    Literal { value: i128, range: TextRange },
    /// `OTHER` or `Type:VALUE`
    Reference(NameRef),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeExpr {
    /// Primitive keyword or a (partially) qualified type name.
    Named(NameRef),
    Vector {
        element: Box<TypeExpr>,
        range: TextRange,
    },
    Array {
        element: Box<TypeExpr>,
        len: u32,
        range: TextRange,
    },
}

impl TypeExpr {
    pub fn range(&self) -> TextRange {
        match self {
            Self::Named(name) => name.range,
            Self::Vector { range, .. } | Self::Array { range, .. } => *range,
        }
    }
}
