//! Import-graph queries.
//!
//! Used by the backends to build dependency lists and by the managed-language
//! emission to decide whether a package can be expressed at all.

use std::collections::{BTreeSet, VecDeque};

use rustc_hash::FxHashSet;

use crate::base::FqName;
use crate::error::Result;
use crate::project::{Coordinator, Enforcement};

use super::types::{AstId, DeclKind, Type, TypeId};

/// Packages whose names `ast` actually references, excluding its own.
pub fn imported_packages(coordinator: &Coordinator, ast: AstId) -> BTreeSet<FqName> {
    let ast = coordinator.ast(ast);
    let own = ast.package();
    ast.imported_names()
        .iter()
        .map(FqName::package_and_version)
        .filter(|package| *package != own)
        .collect()
}

/// Transitive closure of [`imported_packages`] over whole packages.
///
/// Every member file of each newly reached package is parsed and its direct
/// packages are queued; a package is expanded at most once.
pub fn imported_packages_hierarchy(
    coordinator: &mut Coordinator,
    ast: AstId,
) -> Result<BTreeSet<FqName>> {
    let own = coordinator.ast(ast).package();
    let mut visited = BTreeSet::new();
    let mut queue: VecDeque<FqName> = imported_packages(coordinator, ast).into_iter().collect();

    while let Some(package) = queue.pop_front() {
        if !visited.insert(package.clone()) {
            continue;
        }
        for member in coordinator.package_interfaces(&package)? {
            let id = coordinator.parse(&member, Enforcement::Full)?;
            for next in imported_packages(coordinator, id) {
                if !visited.contains(&next) {
                    queue.push_back(next);
                }
            }
        }
    }

    visited.remove(&own);
    tracing::trace!(count = visited.len(), "imported package hierarchy");
    Ok(visited)
}

/// Every name referenced by `ast` or by any file it transitively imports.
pub fn all_imported_names(coordinator: &Coordinator, ast: AstId) -> BTreeSet<FqName> {
    let mut names = BTreeSet::new();
    let mut seen = FxHashSet::default();
    let mut queue = VecDeque::from([ast]);

    while let Some(id) = queue.pop_front() {
        if !seen.insert(id) {
            continue;
        }
        let unit = coordinator.ast(id);
        names.extend(unit.imported_names().iter().cloned());
        queue.extend(unit.imports().iter().map(|import| import.ast));
    }
    names
}

/// Outcome of [`is_package_java_compatible`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JavaCompatReport {
    pub compatible: bool,
    /// Files examined, in visiting order; the last one is the culprit when
    /// `compatible` is false.
    pub visited: Vec<FqName>,
}

/// Walk a package's members, then its imported packages' members, in FIFO
/// order, stopping at the first file that cannot be expressed in Java.
pub fn is_package_java_compatible(
    coordinator: &mut Coordinator,
    package: &FqName,
) -> Result<JavaCompatReport> {
    let start = package.package_and_version();
    let mut seen = BTreeSet::from([start.clone()]);
    let mut queue = VecDeque::from([start]);
    let mut visited = Vec::new();

    while let Some(package) = queue.pop_front() {
        for member in coordinator.package_interfaces(&package)? {
            let id = coordinator.parse(&member, Enforcement::Full)?;
            visited.push(member);
            if !is_java_compatible(coordinator, id) {
                tracing::debug!(file = ?visited.last(), "not Java compatible");
                return Ok(JavaCompatReport {
                    compatible: false,
                    visited,
                });
            }
            for next in imported_packages(coordinator, id) {
                if seen.insert(next.clone()) {
                    queue.push_back(next);
                }
            }
        }
    }

    Ok(JavaCompatReport {
        compatible: true,
        visited,
    })
}

/// Whether every declaration of the file can be expressed in Java.
pub fn is_java_compatible(coordinator: &Coordinator, ast: AstId) -> bool {
    let mut seen = FxHashSet::default();
    coordinator.ast(ast).types().all(|(id, named)| match named.kind() {
        DeclKind::Union => false,
        DeclKind::Struct | DeclKind::Enum => {
            type_is_java_compatible(coordinator, &Type::named(named.kind(), id), &mut seen)
        }
        DeclKind::TypeDef => named
            .typedef_target()
            .is_none_or(|target| type_is_java_compatible(coordinator, target, &mut seen)),
        DeclKind::Interface => named.interface().is_none_or(|decl| {
            decl.methods.iter().all(|method| {
                method
                    .args
                    .iter()
                    .chain(&method.results)
                    .all(|field| type_is_java_compatible(coordinator, &field.ty, &mut seen))
            })
        }),
    })
}

fn type_is_java_compatible(
    coordinator: &Coordinator,
    ty: &Type,
    seen: &mut FxHashSet<TypeId>,
) -> bool {
    match ty {
        Type::Primitive(_) | Type::Enum(_) | Type::Interface(_) => true,
        Type::Handle(_) | Type::Union(_) => false,
        Type::Array { element, .. } | Type::Vector(element) => {
            type_is_java_compatible(coordinator, element, seen)
        }
        Type::Struct(id) => {
            !seen.insert(*id)
                || coordinator
                    .named_type(*id)
                    .fields()
                    .iter()
                    .all(|field| type_is_java_compatible(coordinator, &field.ty, seen))
        }
        Type::TypeDef(id) => coordinator
            .named_type(*id)
            .typedef_target()
            .is_none_or(|target| type_is_java_compatible(coordinator, target, seen)),
    }
}

/// Enums annotated `@export`, in declaration order.
pub fn exported_types(coordinator: &Coordinator, ast: AstId) -> Vec<TypeId> {
    coordinator
        .ast(ast)
        .types()
        .filter(|(_, named)| named.kind() == DeclKind::Enum && named.annotation("export").is_some())
        .map(|(id, _)| id)
        .collect()
}

/// A Java library is needed when the package has any interface file, or its
/// `types.hal` declares anything besides typedefs.
pub fn package_needs_java_code(
    coordinator: &Coordinator,
    members: &[FqName],
    types_ast: Option<AstId>,
) -> bool {
    members.iter().any(|member| !member.is_types_file())
        || types_ast.is_some_and(|id| !coordinator.ast(id).declares_only_typedefs())
}
