//! One translation unit: a parsed and resolved `.hal` file.

use std::path::{Path, PathBuf};

use indexmap::{IndexMap, IndexSet};

use crate::base::FqName;

use super::scope::{Scope, ScopeId};
use super::types::{AstId, DeclKind, NamedType, TypeId};

/// An entry of the file's import list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Import {
    pub ast: AstId,
    /// For `import pkg@v::Type;` of a type living in `types.hal`: the only
    /// types this import makes visible. `None` imports the whole file.
    pub types: Option<Vec<TypeId>>,
}

impl Import {
    pub fn exposes(&self, id: TypeId) -> bool {
        self.types.as_ref().is_none_or(|types| types.contains(&id))
    }
}

#[derive(Debug, Clone)]
pub struct Ast {
    pub(crate) id: AstId,
    pub(crate) fq_name: FqName,
    pub(crate) path: PathBuf,
    pub(crate) content_hash: String,
    pub(crate) scopes: Vec<Scope>,
    pub(crate) types: Vec<NamedType>,
    pub(crate) interface: Option<u32>,
    pub(crate) defined: IndexMap<FqName, u32>,
    pub(crate) imports: Vec<Import>,
    pub(crate) imported_names: IndexSet<FqName>,
    pub(crate) syntax_error_count: usize,
}

impl Ast {
    pub fn id(&self) -> AstId {
        self.id
    }

    /// `pkg@M.m::Name` of the file (`Name` is `types` for types files).
    pub fn fq_name(&self) -> &FqName {
        &self.fq_name
    }

    /// `pkg@M.m`
    pub fn package(&self) -> FqName {
        self.fq_name.package_and_version()
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// SHA-256 of the file contents, lower-case hex.
    pub fn content_hash(&self) -> &str {
        &self.content_hash
    }

    pub fn syntax_error_count(&self) -> usize {
        self.syntax_error_count
    }

    pub fn is_types_file(&self) -> bool {
        self.fq_name.is_types_file()
    }

    pub fn root_scope(&self) -> &Scope {
        &self.scopes[ScopeId::ROOT.index()]
    }

    pub fn scope(&self, id: ScopeId) -> &Scope {
        &self.scopes[id.index()]
    }

    pub fn type_id(&self, index: u32) -> TypeId {
        TypeId {
            ast: self.id,
            index,
        }
    }

    pub fn named_type(&self, index: u32) -> &NamedType {
        &self.types[index as usize]
    }

    /// Every declaration of the file, outer before inner, in source order.
    pub fn types(&self) -> impl Iterator<Item = (TypeId, &NamedType)> {
        self.types
            .iter()
            .enumerate()
            .map(|(index, ty)| (self.type_id(index as u32), ty))
    }

    /// Declarations of the root scope, in source order.
    pub fn top_level_types(&self) -> impl Iterator<Item = (TypeId, &NamedType)> {
        self.root_scope()
            .symbols()
            .map(|(_, index)| (self.type_id(index), self.named_type(index)))
    }

    /// Declarations nested directly inside `parent`, in source order.
    pub fn nested_types(&self, parent: TypeId) -> impl Iterator<Item = (TypeId, &NamedType)> {
        self.types()
            .filter(move |(_, ty)| ty.parent() == Some(parent.index))
    }

    /// The interface this file declares, if any.
    pub fn interface(&self) -> Option<TypeId> {
        self.interface.map(|index| self.type_id(index))
    }

    pub fn is_interface(&self) -> bool {
        self.interface.is_some()
    }

    /// Look a top-level name up in this file.
    pub fn find_top_level(&self, name: &str) -> Option<TypeId> {
        self.root_scope().get(name).map(|index| self.type_id(index))
    }

    /// Look a fully-qualified name up among this file's declarations.
    pub fn find_defined(&self, fq_name: &FqName) -> Option<TypeId> {
        self.defined.get(fq_name).map(|&index| self.type_id(index))
    }

    /// Every declaration keyed by its full name.
    pub fn defined_types(&self) -> &IndexMap<FqName, u32> {
        &self.defined
    }

    pub fn imports(&self) -> &[Import] {
        &self.imports
    }

    /// External names this file actually references, in first-use order.
    pub fn imported_names(&self) -> &IndexSet<FqName> {
        &self.imported_names
    }

    /// Descend from `start` through nested declaration names.
    pub fn descend(&self, start: TypeId, path: &[smol_str::SmolStr]) -> Option<TypeId> {
        debug_assert_eq!(start.ast, self.id);
        let mut current = start.index;
        for component in path {
            let scope = self.named_type(current).scope()?;
            current = self.scope(scope).get(component)?;
        }
        Some(self.type_id(current))
    }

    /// True if every top-level declaration is a typedef.
    pub fn declares_only_typedefs(&self) -> bool {
        self.top_level_types()
            .all(|(_, ty)| ty.kind() == DeclKind::TypeDef)
    }
}
