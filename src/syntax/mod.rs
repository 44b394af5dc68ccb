//! Raw syntax tree produced by the parser.
//!
//! The tree mirrors the source text; it knows nothing about packages,
//! imports or other files. See [`crate::hir`] for the resolved model.

pub mod ast;

pub use ast::{
    Annotation, CompoundBody, ConstExpr, Declaration, DeclarationKind, EnumBody, EnumValueDecl,
    FieldDecl, InterfaceBody, MethodDecl, NameRef, SourceFile, TypeExpr,
};
