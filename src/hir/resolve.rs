//! Phase 2: imports, name lookup and declaration bodies.
//!
//! Runs after the file's shells are registered with the coordinator. Name
//! lookup order for a bare name:
//!
//! 1. the scope chain, innermost first (`A.B` descends into `A`'s scope)
//! 2. a file of the same package named after the type
//! 3. the imports, in declaration order, top-level types only
//!
//! The first match wins unless [`ResolutionPolicy::RejectAmbiguous`] is in
//! effect, in which case a name visible through two imports is an error.
//! Names carrying a package or version are completed from the current file
//! and resolved through the coordinator.

use indexmap::IndexSet;
use rustc_hash::FxHashSet;

use crate::base::{FqName, FqNameError};
use crate::error::{CompileError, Result};
use crate::project::{Coordinator, Enforcement, builtin};
use crate::syntax::{
    ConstExpr, Declaration, DeclarationKind, EnumBody, FieldDecl, InterfaceBody, NameRef,
    SourceFile, TypeExpr,
};

use super::ast::Import;
use super::scope::ScopeId;
use super::types::{
    AstId, ConstValue, DeclBody, EnumDecl, EnumValue, Field, InterfaceDecl, Method, Primitive,
    Type, TypeId,
};

/// What to do when a bare name is visible through more than one import.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResolutionPolicy {
    /// The earliest import declaring the name wins.
    #[default]
    FirstMatch,
    /// Fail with [`CompileError::AmbiguousType`].
    RejectAmbiguous,
}

pub(crate) fn resolve(coordinator: &mut Coordinator, id: AstId, file: &SourceFile) -> Result<()> {
    let ast = coordinator.ast(id);
    let fq_name = ast.fq_name().clone();
    let is_interface = ast.is_interface();
    let slots = ast.types.len();
    let mut resolver = Resolver {
        fq_name,
        is_interface,
        bodies: vec![None; slots],
        imports: Vec::new(),
        imported_names: IndexSet::new(),
        coordinator,
        id,
    };

    resolver.add_explicit_imports(&file.imports)?;
    resolver.add_implicit_imports()?;

    let mut next = 0;
    for decl in &file.declarations {
        resolver.build(decl, ScopeId::ROOT, &mut next)?;
    }
    resolver.commit();
    Ok(())
}

struct Resolver<'c> {
    coordinator: &'c mut Coordinator,
    id: AstId,
    fq_name: FqName,
    is_interface: bool,
    bodies: Vec<Option<DeclBody>>,
    imports: Vec<Import>,
    imported_names: IndexSet<FqName>,
}

impl Resolver<'_> {
    // =========================================================================
    // Imports
    // =========================================================================

    fn add_explicit_imports(&mut self, imports: &[NameRef]) -> Result<()> {
        for import in imports {
            let fq = FqName::parse(&import.text)?;
            if !fq.has_package() || fq.version().is_none() {
                return Err(FqNameError {
                    input: import.text.to_string(),
                    reason: "imports must name a package and version",
                }
                .into());
            }

            if fq.is_package() {
                for member in self.coordinator.package_interfaces(&fq)? {
                    if member != self.fq_name {
                        let ast = self.coordinator.parse(&member, Enforcement::Full)?;
                        self.add_import(ast, None);
                    }
                }
                continue;
            }

            if fq.nested().is_empty() && self.coordinator.source_exists(&fq) {
                let ast = self.coordinator.parse(&fq, Enforcement::Full)?;
                self.add_import(ast, None);
                continue;
            }

            // `import pkg@v::Type;` for a type declared in the package's types.hal
            let types = fq.types_for_package();
            if fq.nested().is_empty() && self.coordinator.source_exists(&types) {
                let ast = self.coordinator.parse(&types, Enforcement::Full)?;
                let found = fq
                    .name()
                    .and_then(|name| self.coordinator.ast(ast).find_top_level(name));
                if let Some(found) = found {
                    self.add_import(ast, Some(found));
                    continue;
                }
            }

            return Err(CompileError::unresolved(
                fq.to_string(),
                format!("import in {}", self.fq_name),
            ));
        }
        Ok(())
    }

    fn add_implicit_imports(&mut self) -> Result<()> {
        if !self.fq_name.is_types_file() {
            let types = self.fq_name.types_for_package();
            if self.coordinator.source_exists(&types) {
                let ast = self.coordinator.parse(&types, Enforcement::Full)?;
                self.add_import(ast, None);
            }
        }
        if self.is_interface && !builtin::is_root_interface(&self.fq_name) {
            let ast = self
                .coordinator
                .parse(&builtin::root_interface(), Enforcement::Full)?;
            self.add_import(ast, None);
        }
        Ok(())
    }

    fn add_import(&mut self, ast: AstId, only: Option<TypeId>) {
        if ast == self.id {
            return;
        }
        match self.imports.iter_mut().find(|import| import.ast == ast) {
            Some(existing) => match (&mut existing.types, only) {
                (None, _) => {}
                (types @ Some(_), None) => *types = None,
                (Some(types), Some(id)) => {
                    if !types.contains(&id) {
                        types.push(id);
                    }
                }
            },
            None => self.imports.push(Import {
                ast,
                types: only.map(|id| vec![id]),
            }),
        }
    }

    // =========================================================================
    // Declarations
    // =========================================================================

    fn build(&mut self, decl: &Declaration, scope: ScopeId, next: &mut u32) -> Result<()> {
        let index = *next;
        *next += 1;
        let id = TypeId {
            ast: self.id,
            index,
        };
        let inner = self
            .coordinator
            .ast(self.id)
            .named_type(index)
            .scope()
            .unwrap_or(scope);

        let body = match &decl.kind {
            DeclarationKind::TypeDef(target) => DeclBody::TypeDef(self.resolve_type(target, scope)?),
            DeclarationKind::Struct(body) => DeclBody::Struct(self.fields(&body.fields, inner)?),
            DeclarationKind::Union(body) => DeclBody::Union(self.fields(&body.fields, inner)?),
            DeclarationKind::Enum(body) => DeclBody::Enum(self.enum_body(id, body, scope)?),
            DeclarationKind::Interface(body) => {
                DeclBody::Interface(self.interface_body(id, body, scope, inner)?)
            }
        };
        self.bodies[index as usize] = Some(body);

        for member in decl.kind.members() {
            self.build(member, inner, next)?;
        }
        Ok(())
    }

    fn fields(&mut self, decls: &[FieldDecl], scope: ScopeId) -> Result<Vec<Field>> {
        decls
            .iter()
            .map(|decl| {
                Ok(Field {
                    name: decl.name.clone(),
                    ty: self.resolve_type(&decl.ty, scope)?,
                })
            })
            .collect()
    }

    fn interface_body(
        &mut self,
        id: TypeId,
        body: &InterfaceBody,
        scope: ScopeId,
        inner: ScopeId,
    ) -> Result<InterfaceDecl> {
        let super_interface = match &body.extends {
            Some(name) => {
                let fq = FqName::parse(&name.text)?;
                match self.lookup_type(&fq, scope)? {
                    Some(Type::Interface(parent)) => Some(parent),
                    Some(_) => {
                        return Err(CompileError::InvalidSuperInterface {
                            name: name.text.to_string(),
                            interface: self.fq_name.to_string(),
                        });
                    }
                    None => return Err(CompileError::unresolved(name.text.as_str(), self.context(scope))),
                }
            }
            None if builtin::is_root_interface(&self.fq_name) => None,
            None => Some(self.root_interface()?),
        };

        if let Some(parent) = super_interface {
            self.check_inheritance(id, parent)?;
        }

        let mut methods = Vec::with_capacity(body.methods.len());
        for method in &body.methods {
            if method.oneway && !method.results.is_empty() {
                return Err(CompileError::DeclarationMismatch {
                    path: self.coordinator.ast(self.id).path().to_path_buf(),
                    reason: format!("oneway method '{}' cannot generate results", method.name),
                });
            }
            methods.push(Method {
                name: method.name.clone(),
                oneway: method.oneway,
                args: self.fields(&method.args, inner)?,
                results: self.fields(&method.results, inner)?,
                annotations: method.annotations.clone(),
            });
        }

        Ok(InterfaceDecl {
            super_interface,
            methods,
        })
    }

    fn root_interface(&mut self) -> Result<TypeId> {
        let root = builtin::root_interface();
        let ast = self.coordinator.parse(&root, Enforcement::Full)?;
        let id = self
            .coordinator
            .ast(ast)
            .interface()
            .ok_or_else(|| CompileError::InvalidSuperInterface {
                name: root.to_string(),
                interface: self.fq_name.to_string(),
            })?;
        self.record(id);
        Ok(id)
    }

    fn super_of(&self, id: TypeId) -> Option<TypeId> {
        if id.ast == self.id {
            match self.bodies.get(id.index as usize) {
                Some(Some(DeclBody::Interface(decl))) => decl.super_interface,
                _ => None,
            }
        } else {
            self.coordinator
                .named_type(id)
                .interface()
                .and_then(|decl| decl.super_interface)
        }
    }

    fn check_inheritance(&self, id: TypeId, parent: TypeId) -> Result<()> {
        let mut seen = FxHashSet::default();
        let mut current = Some(parent);
        while let Some(link) = current {
            if link == id || !seen.insert(link) {
                return Err(CompileError::InheritanceCycle(
                    self.coordinator.named_type(id).fq_name().to_string(),
                ));
            }
            current = self.super_of(link);
        }
        Ok(())
    }

    fn enum_body(&mut self, id: TypeId, body: &EnumBody, scope: ScopeId) -> Result<EnumDecl> {
        let storage = match &body.storage {
            Some(expr) => self.resolve_type(expr, scope)?,
            None => Type::Primitive(Primitive::Int32),
        };
        match &storage {
            Type::Primitive(p) if p.is_integer() => {}
            Type::Enum(parent) => self.check_enum_chain(id, *parent)?,
            _ => {
                return Err(CompileError::NotAnEnum {
                    name: body
                        .storage
                        .as_ref()
                        .map(describe_type_expr)
                        .unwrap_or_default(),
                    context: format!(
                        "storage type of {} must be an integer or an enum",
                        self.coordinator.named_type(id).fq_name()
                    ),
                });
            }
        }

        let mut values = Vec::with_capacity(body.values.len());
        for value in &body.values {
            let expr = match &value.value {
                None => ConstValue::Implicit,
                Some(ConstExpr::Literal { value, .. }) => ConstValue::Literal(*value),
                Some(ConstExpr::Reference(name)) => {
                    self.enum_value_ref(name, id, &storage, scope)?
                }
            };
            values.push(EnumValue {
                name: value.name.clone(),
                expr,
            });
        }
        Ok(EnumDecl { storage, values })
    }

    fn enum_parent(&self, id: TypeId) -> Option<TypeId> {
        if id.ast == self.id {
            match self.bodies.get(id.index as usize) {
                Some(Some(DeclBody::Enum(decl))) => decl.parent(),
                _ => None,
            }
        } else {
            self.coordinator.named_type(id).enum_decl().and_then(EnumDecl::parent)
        }
    }

    fn check_enum_chain(&self, id: TypeId, parent: TypeId) -> Result<()> {
        let mut seen = FxHashSet::default();
        let mut current = Some(parent);
        while let Some(link) = current {
            if link == id || !seen.insert(link) {
                return Err(CompileError::InheritanceCycle(
                    self.coordinator.named_type(id).fq_name().to_string(),
                ));
            }
            current = self.enum_parent(link);
        }
        Ok(())
    }

    /// `Type:VALUE`, or a bare `VALUE` of the enum being declared.
    fn enum_value_ref(
        &mut self,
        name: &NameRef,
        current: TypeId,
        storage: &Type,
        scope: ScopeId,
    ) -> Result<ConstValue> {
        let fq = FqName::parse(&name.text)?;
        let (target, value) = match fq.value() {
            Some(value) => {
                let type_name = fq.without_value();
                match self.lookup_type(&type_name, scope)? {
                    Some(Type::Enum(target)) => (target, value.to_string()),
                    Some(_) => {
                        return Err(CompileError::NotAnEnum {
                            name: type_name.to_string(),
                            context: self.context(scope),
                        });
                    }
                    None => {
                        return Err(CompileError::unresolved(
                            type_name.to_string(),
                            self.context(scope),
                        ));
                    }
                }
            }
            None if fq.is_bare() && fq.nested().is_empty() => {
                (current, fq.name().unwrap_or_default().to_string())
            }
            None => {
                return Err(CompileError::UnresolvedEnumValue {
                    name: name.text.to_string(),
                    context: self.context(scope),
                });
            }
        };

        let mut seen = FxHashSet::default();
        let mut cursor = Some(target);
        while let Some(enum_id) = cursor {
            if !seen.insert(enum_id) {
                break;
            }
            let names = self.coordinator.named_type(enum_id).value_names();
            if let Some(index) = names.iter().position(|n| *n == value) {
                return Ok(ConstValue::Reference { ty: enum_id, index });
            }
            cursor = if enum_id == current {
                match storage {
                    Type::Enum(parent) => Some(*parent),
                    _ => None,
                }
            } else {
                self.enum_parent(enum_id)
            };
        }

        Err(CompileError::UnresolvedEnumValue {
            name: name.text.to_string(),
            context: self.coordinator.named_type(target).fq_name().to_string(),
        })
    }

    // =========================================================================
    // Type lookup
    // =========================================================================

    fn resolve_type(&mut self, expr: &TypeExpr, scope: ScopeId) -> Result<Type> {
        match expr {
            TypeExpr::Named(name) => {
                let fq = FqName::parse(&name.text)?;
                self.lookup_type(&fq, scope)?
                    .ok_or_else(|| CompileError::unresolved(name.text.as_str(), self.context(scope)))
            }
            TypeExpr::Vector { element, .. } => {
                Ok(Type::Vector(Box::new(self.resolve_type(element, scope)?)))
            }
            TypeExpr::Array { element, len, .. } => Ok(Type::Array {
                element: Box::new(self.resolve_type(element, scope)?),
                len: *len,
            }),
        }
    }

    fn lookup_type(&mut self, fq: &FqName, scope: ScopeId) -> Result<Option<Type>> {
        if fq.value().is_some() {
            return Ok(None);
        }
        if fq.is_bare() && fq.nested().is_empty() {
            if let Some(builtin) = fq.name().and_then(Type::builtin) {
                return Ok(Some(builtin));
            }
        }

        let found = if fq.is_bare() {
            self.lookup_bare(fq, scope)?
        } else {
            let full = fq.apply_defaults(&self.fq_name);
            tracing::trace!(name = %fq, resolved = %full, "qualified lookup");
            self.coordinator.lookup_qualified(&full)?
        };

        Ok(found.map(|id| {
            self.record(id);
            Type::named(self.coordinator.named_type(id).kind(), id)
        }))
    }

    fn lookup_bare(&mut self, fq: &FqName, scope: ScopeId) -> Result<Option<TypeId>> {
        let Some(name) = fq.name() else {
            return Ok(None);
        };
        let nested = fq.nested();

        let ast = self.coordinator.ast(self.id);
        let mut current = Some(scope);
        while let Some(scope_id) = current {
            let scope = ast.scope(scope_id);
            if let Some(index) = scope.get(name) {
                return Ok(ast.descend(ast.type_id(index), nested));
            }
            current = scope.parent();
        }

        let sibling = self.fq_name.with_name(name);
        if sibling != self.fq_name && self.coordinator.source_exists(&sibling) {
            let id = self.coordinator.parse(&sibling, Enforcement::Full)?;
            let ast = self.coordinator.ast(id);
            if let Some(top) = ast.find_top_level(name) {
                tracing::trace!(%name, file = %sibling, "found in sibling file");
                return Ok(ast.descend(top, nested));
            }
        }

        let mut matches: Vec<TypeId> = Vec::new();
        for import in &self.imports {
            let ast = self.coordinator.ast(import.ast);
            let Some(found) = ast
                .find_top_level(name)
                .filter(|top| import.exposes(*top))
                .and_then(|top| ast.descend(top, nested))
            else {
                continue;
            };
            if self.coordinator.policy() == ResolutionPolicy::FirstMatch {
                return Ok(Some(found));
            }
            if !matches.contains(&found) {
                matches.push(found);
            }
        }

        match matches.as_slice() {
            [] => Ok(None),
            [only] => Ok(Some(*only)),
            _ => Err(CompileError::AmbiguousType {
                name: fq.to_string(),
                context: self.context(scope),
                candidates: matches
                    .iter()
                    .map(|id| self.coordinator.named_type(*id).fq_name().to_string())
                    .collect(),
            }),
        }
    }

    fn record(&mut self, id: TypeId) {
        if id.ast != self.id {
            let name = self.coordinator.named_type(id).fq_name().clone();
            self.imported_names.insert(name);
        }
    }

    /// Name of the declaration owning `scope`, for messages.
    fn context(&self, scope: ScopeId) -> String {
        let ast = self.coordinator.ast(self.id);
        match ast.scope(scope).owner() {
            Some(owner) => ast.named_type(owner).fq_name().to_string(),
            None => self.fq_name.to_string(),
        }
    }

    fn commit(self) {
        let ast = self.coordinator.ast_mut(self.id);
        for (named, body) in ast.types.iter_mut().zip(self.bodies) {
            named.body = body;
        }
        ast.imports = self.imports;
        ast.imported_names = self.imported_names;
    }
}

fn describe_type_expr(expr: &TypeExpr) -> String {
    match expr {
        TypeExpr::Named(name) => name.text.to_string(),
        TypeExpr::Vector { element, .. } => format!("vec<{}>", describe_type_expr(element)),
        TypeExpr::Array { element, len, .. } => format!("{}[{len}]", describe_type_expr(element)),
    }
}
