//! High-level IR: resolved translation units.
//!
//! ## Key Types
//!
//! - [`Ast`] - One parsed and resolved `.hal` file
//! - [`NamedType`] - A declared interface, struct, union, enum or typedef
//! - [`Type`] - A resolved type expression (closed sum type)
//! - [`Scope`] - Per-file and per-type symbol tables
//!
//! ## Phases
//!
//! ```text
//! syntax::SourceFile
//!     │
//!     ▼
//! lower            ← declaration shells, scopes (no other file consulted)
//!     │               AST registered with the coordinator here
//!     ▼
//! resolve          ← imports, type names, enum values, inheritance
//!     │
//!     ▼
//! imports/constants ← read-only queries used by the backends
//! ```

mod ast;
mod constants;
mod imports;
mod lower;
mod resolve;
mod scope;
mod types;

pub use ast::{Ast, Import};
pub use constants::{check_enum_values, enum_values, storage_primitive};
pub use imports::{
    JavaCompatReport, all_imported_names, exported_types, imported_packages,
    imported_packages_hierarchy, is_java_compatible, is_package_java_compatible,
    package_needs_java_code,
};
pub use resolve::ResolutionPolicy;
pub use scope::{Scope, ScopeId};
pub use types::{
    AstId, ConstValue, DeclBody, DeclKind, EnumDecl, EnumValue, Field, HandleKind, InterfaceDecl,
    Method, NamedType, Primitive, Type, TypeId, TypeIdentity,
};

pub(crate) use constants::evaluate_enum_value;
pub(crate) use lower::lower;
pub(crate) use resolve::resolve;
