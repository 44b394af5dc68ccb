//! Phase 1: turn a raw syntax tree into declaration shells and scopes.
//!
//! Nothing outside the file is consulted here. Every declaration gets its
//! slot (pre-order, source order), its full name and, for compound kinds, a
//! child scope. Bodies are attached by [`super::resolve`] once the AST is
//! registered with the coordinator.

use std::path::PathBuf;

use indexmap::{IndexMap, IndexSet};
use rustc_hash::FxHashSet;
use smol_str::SmolStr;

use crate::base::FqName;
use crate::error::{CompileError, Result};
use crate::syntax::{Declaration, DeclarationKind, FieldDecl, SourceFile};

use super::ast::Ast;
use super::scope::{Scope, ScopeId};
use super::types::{AstId, DeclKind, NamedType};

pub(crate) fn lower(
    id: AstId,
    fq_name: FqName,
    path: PathBuf,
    content_hash: String,
    file: &SourceFile,
) -> Result<Ast> {
    let package = fq_name.package_and_version();
    let mut lowering = Lowering {
        scopes: vec![Scope::new(None, None)],
        types: Vec::new(),
        defined: IndexMap::new(),
        interface: None,
    };

    for decl in &file.declarations {
        lowering.declare(decl, ScopeId::ROOT, None, &package)?;
    }

    Ok(Ast {
        id,
        fq_name,
        path,
        content_hash,
        scopes: lowering.scopes,
        types: lowering.types,
        interface: lowering.interface,
        defined: lowering.defined,
        imports: Vec::new(),
        imported_names: IndexSet::new(),
        syntax_error_count: 0,
    })
}

pub(crate) fn decl_kind(kind: &DeclarationKind) -> DeclKind {
    match kind {
        DeclarationKind::Interface(_) => DeclKind::Interface,
        DeclarationKind::Struct(_) => DeclKind::Struct,
        DeclarationKind::Union(_) => DeclKind::Union,
        DeclarationKind::Enum(_) => DeclKind::Enum,
        DeclarationKind::TypeDef(_) => DeclKind::TypeDef,
    }
}

struct Lowering {
    scopes: Vec<Scope>,
    types: Vec<NamedType>,
    defined: IndexMap<FqName, u32>,
    interface: Option<u32>,
}

impl Lowering {
    fn declare(
        &mut self,
        decl: &Declaration,
        scope: ScopeId,
        parent: Option<u32>,
        enclosing: &FqName,
    ) -> Result<()> {
        let index = self.types.len() as u32;
        let fq_name = enclosing.nested_in(decl.name.clone());

        if !self.scopes[scope.index()].insert(decl.name.clone(), index) {
            return Err(CompileError::DuplicateDeclaration {
                name: decl.name.to_string(),
                scope: enclosing.to_string(),
            });
        }

        let kind = decl_kind(&decl.kind);
        let child_scope = kind.has_scope().then(|| {
            self.scopes.push(Scope::new(Some(scope), Some(index)));
            ScopeId((self.scopes.len() - 1) as u32)
        });

        let value_names = match &decl.kind {
            DeclarationKind::Enum(body) => {
                unique_names(body.values.iter().map(|v| &v.name), &fq_name)?
            }
            DeclarationKind::Struct(body) | DeclarationKind::Union(body) => {
                unique_fields(&body.fields, &fq_name)?;
                Vec::new()
            }
            DeclarationKind::Interface(body) => {
                unique_names(body.methods.iter().map(|m| &m.name), &fq_name)?;
                for method in &body.methods {
                    unique_fields(method.args.iter().chain(&method.results), &fq_name)?;
                }
                Vec::new()
            }
            DeclarationKind::TypeDef(_) => Vec::new(),
        };

        if kind == DeclKind::Interface && parent.is_none() {
            self.interface = Some(index);
        }

        self.defined.insert(fq_name.clone(), index);
        self.types.push(NamedType {
            fq_name: fq_name.clone(),
            kind,
            scope: child_scope,
            parent,
            annotations: decl.annotations.clone(),
            value_names,
            body: None,
        });

        if let Some(child_scope) = child_scope {
            for member in decl.kind.members() {
                self.declare(member, child_scope, Some(index), &fq_name)?;
            }
        }
        Ok(())
    }
}

fn unique_names<'a>(
    names: impl Iterator<Item = &'a SmolStr>,
    scope: &FqName,
) -> Result<Vec<SmolStr>> {
    let mut seen = FxHashSet::default();
    let mut out = Vec::new();
    for name in names {
        if !seen.insert(name.clone()) {
            return Err(CompileError::DuplicateDeclaration {
                name: name.to_string(),
                scope: scope.to_string(),
            });
        }
        out.push(name.clone());
    }
    Ok(out)
}

fn unique_fields<'a>(fields: impl IntoIterator<Item = &'a FieldDecl>, scope: &FqName) -> Result<()> {
    unique_names(fields.into_iter().map(|f| &f.name), scope).map(|_| ())
}
