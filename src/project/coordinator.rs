//! The coordinator: the single owner of every parsed translation unit.
//!
//! Requests are keyed by file name (`pkg@M.m::Name`). Each file is parsed at
//! most once per invocation; later requests get the same [`AstId`] back, and
//! requests for a file that failed get [`CompileError::PreviouslyFailed`].
//!
//! Parsing is two-phase. Lowering builds declaration shells and registers the
//! AST *before* resolution starts, so files of one package that import each
//! other can find each other's declarations.

use std::borrow::Cow;
use std::collections::VecDeque;
use std::path::{Path, PathBuf};

use rustc_hash::{FxHashMap, FxHashSet};
use sha2::{Digest, Sha256};
use walkdir::WalkDir;

use crate::base::constants::{HAL_EXTENSION, HASH_REGISTRY_FILE};
use crate::base::{FqName, FqNameError, LineIndex};
use crate::error::{CompileError, Result};
use crate::hir::{
    self, Ast, AstId, DeclKind, NamedType, ResolutionPolicy, TypeId, TypeIdentity,
};
use crate::parser;
use crate::syntax::{DeclarationKind, SourceFile};

use super::builtin;
use super::hash_registry::HashRegistry;
use super::package_roots::PackageRootTable;

/// Whether frozen hashes from `current.txt` are checked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Enforcement {
    NoHash,
    #[default]
    Full,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Slot {
    Parsed(AstId),
    Failed,
}

#[derive(Debug)]
pub struct Coordinator {
    roots: PackageRootTable,
    policy: ResolutionPolicy,
    asts: Vec<Ast>,
    cache: FxHashMap<FqName, Slot>,
    /// ASTs whose resolution has started but not finished, innermost last.
    in_progress: Vec<AstId>,
    registries: FxHashMap<PathBuf, HashRegistry>,
}

impl Coordinator {
    pub fn new(roots: PackageRootTable) -> Self {
        Self {
            roots,
            policy: ResolutionPolicy::default(),
            asts: Vec::new(),
            cache: FxHashMap::default(),
            in_progress: Vec::new(),
            registries: FxHashMap::default(),
        }
    }

    pub fn with_policy(mut self, policy: ResolutionPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn roots(&self) -> &PackageRootTable {
        &self.roots
    }

    pub fn policy(&self) -> ResolutionPolicy {
        self.policy
    }

    // =========================================================================
    // Arena access
    // =========================================================================

    pub fn ast(&self, id: AstId) -> &Ast {
        &self.asts[id.index()]
    }

    pub(crate) fn ast_mut(&mut self, id: AstId) -> &mut Ast {
        &mut self.asts[id.index()]
    }

    pub fn asts(&self) -> &[Ast] {
        &self.asts
    }

    pub fn named_type(&self, id: TypeId) -> &NamedType {
        self.ast(id.ast).named_type(id.index)
    }

    /// The AST already parsed for `fq_name`'s file, if any.
    pub fn cached(&self, fq_name: &FqName) -> Option<AstId> {
        match self.cache.get(&fq_name.file_name()) {
            Some(Slot::Parsed(id)) => Some(*id),
            _ => None,
        }
    }

    pub(crate) fn is_in_progress(&self, id: AstId) -> bool {
        self.in_progress.contains(&id)
    }

    // =========================================================================
    // Parsing
    // =========================================================================

    /// Parse (or fetch from cache) the file declaring `fq_name`.
    pub fn parse(&mut self, fq_name: &FqName, enforcement: Enforcement) -> Result<AstId> {
        let file = fq_name.file_name();
        if !file.is_fully_qualified() {
            return Err(FqNameError {
                input: fq_name.to_string(),
                reason: "expected package, version and name",
            }
            .into());
        }

        self.check_import_cycle(&file)?;
        match self.cache.get(&file) {
            Some(&Slot::Parsed(id)) => {
                tracing::trace!(%file, "cache hit");
                return Ok(id);
            }
            Some(Slot::Failed) => return Err(CompileError::PreviouslyFailed(file)),
            None => {}
        }

        let first_new = self.asts.len();
        let result = self.parse_uncached(&file, enforcement);
        if result.is_err() {
            self.cache.insert(file, Slot::Failed);
            self.invalidate_dependents(first_new);
        }
        result
    }

    /// Marks failed every AST registered since `first_new` that references a
    /// failed file, directly or through another such AST.
    fn invalidate_dependents(&mut self, first_new: usize) {
        let mut failed: FxHashSet<FqName> = self.asts[first_new..]
            .iter()
            .filter(|ast| matches!(self.cache.get(ast.fq_name()), Some(Slot::Failed)))
            .map(|ast| ast.fq_name().clone())
            .collect();

        loop {
            let dependents: Vec<FqName> = self.asts[first_new..]
                .iter()
                .filter(|ast| !failed.contains(ast.fq_name()))
                .filter(|ast| {
                    self.referenced_files(ast)
                        .any(|file| failed.contains(&file))
                })
                .map(|ast| ast.fq_name().clone())
                .collect();
            if dependents.is_empty() {
                break;
            }
            failed.extend(dependents);
        }

        for file in failed {
            tracing::debug!(%file, "invalidated");
            self.cache.insert(file, Slot::Failed);
        }
    }

    /// Files `ast` imports or names a type from.
    fn referenced_files<'a>(&'a self, ast: &'a Ast) -> impl Iterator<Item = FqName> + 'a {
        ast.imports()
            .iter()
            .map(move |import| self.ast(import.ast).fq_name().clone())
            .chain(ast.imported_names().iter().map(FqName::file_name))
    }

    /// A file reached while resolving another package must not lead back to
    /// that package.
    fn check_import_cycle(&self, file: &FqName) -> Result<()> {
        let Some(&importer) = self.in_progress.last() else {
            return Ok(());
        };
        let importer = self.ast(importer).fq_name();
        if importer.same_package(file) {
            return Ok(());
        }

        let target = file.package_and_version();
        let reentered = self
            .in_progress
            .iter()
            .any(|&id| self.ast(id).package() == target);
        if reentered || self.package_reaches(&target, &importer.package_and_version()) {
            return Err(CompileError::ImportCycle {
                importer: importer.clone(),
                imported: file.clone(),
            });
        }
        Ok(())
    }

    /// Whether `to` is reachable from `from` through the imports of files
    /// that finished resolving.
    fn package_reaches(&self, from: &FqName, to: &FqName) -> bool {
        let mut seen = FxHashSet::default();
        let mut queue = VecDeque::from([from.clone()]);
        while let Some(package) = queue.pop_front() {
            if &package == to {
                return true;
            }
            if !seen.insert(package.clone()) {
                continue;
            }
            let finished = self.asts.iter().filter(|ast| {
                ast.package() == package
                    && self.cached(ast.fq_name()) == Some(ast.id())
                    && !self.is_in_progress(ast.id())
            });
            for ast in finished {
                queue.extend(
                    self.referenced_files(ast)
                        .map(|file| file.package_and_version())
                        .filter(|next| *next != package && !seen.contains(next)),
                );
            }
        }
        false
    }

    fn parse_uncached(&mut self, file: &FqName, enforcement: Enforcement) -> Result<AstId> {
        let (path, source) = self.read_source(file)?;
        tracing::debug!(%file, path = %path.display(), "parsing");

        let content_hash = sha256_hex(source.as_bytes());
        if enforcement == Enforcement::Full {
            self.check_frozen(file, &content_hash)?;
        }

        let parsed = parser::parse(&source);
        if let Some(first) = parsed.errors.first() {
            let position = LineIndex::new(&source).line_col(first.range.start());
            return Err(CompileError::ParseSyntax {
                path,
                count: parsed.errors.len(),
                first: format!("{position}: {}", first.format()),
            });
        }
        check_declarations(file, &path, &parsed.file)?;

        let id = AstId(self.asts.len() as u32);
        let ast = hir::lower(id, file.clone(), path, content_hash, &parsed.file)?;
        self.asts.push(ast);
        self.cache.insert(file.clone(), Slot::Parsed(id));

        self.in_progress.push(id);
        let result = hir::resolve(self, id, &parsed.file);
        self.in_progress.pop();
        result?;

        tracing::debug!(%file, "resolved");
        Ok(id)
    }

    fn read_source(&self, file: &FqName) -> Result<(PathBuf, Cow<'static, str>)> {
        let path = match self.roots.file_path(file) {
            Ok(path) => path,
            Err(err) => {
                return builtin::source_for(file)
                    .map(|src| (PathBuf::from(builtin::BUILTIN_PATH), Cow::Borrowed(src)))
                    .ok_or(err);
            }
        };
        if path.is_file() {
            let text = std::fs::read_to_string(&path).map_err(|e| CompileError::io(&path, e))?;
            return Ok((path, Cow::Owned(text)));
        }
        match builtin::source_for(file) {
            Some(src) => Ok((PathBuf::from(builtin::BUILTIN_PATH), Cow::Borrowed(src))),
            None => Err(CompileError::SourceNotFound {
                fq_name: file.clone(),
                path,
            }),
        }
    }

    fn check_frozen(&mut self, file: &FqName, actual: &str) -> Result<()> {
        let Ok(root) = self.roots.root_dir(file) else {
            return Ok(());
        };
        if !self.registries.contains_key(&root) {
            let registry = HashRegistry::load(&root.join(HASH_REGISTRY_FILE))?;
            self.registries.insert(root.clone(), registry);
        }
        let recorded = self
            .registries
            .get(&root)
            .map(|r| r.hashes(file))
            .unwrap_or_default();
        if recorded.is_empty() || recorded.iter().any(|h| h == actual) {
            return Ok(());
        }
        Err(CompileError::FrozenInterfaceViolation {
            fq_name: file.clone(),
            recorded: recorded.to_vec(),
            actual: actual.to_string(),
        })
    }

    // =========================================================================
    // Sources and packages
    // =========================================================================

    /// Whether a file (on disk or embedded) exists for `fq_name`.
    pub fn source_exists(&self, fq_name: &FqName) -> bool {
        self.roots
            .file_path(&fq_name.file_name())
            .is_ok_and(|path| path.is_file())
            || builtin::source_for(fq_name).is_some()
    }

    /// Files of a package, sorted by name.
    pub fn package_interfaces(&self, package: &FqName) -> Result<Vec<FqName>> {
        let package = package.package_and_version();
        let dir = self.roots.package_dir(&package);
        let root = builtin::root_interface();

        let dir = match dir {
            Ok(dir) if dir.is_dir() => dir,
            Ok(_) | Err(_) if root.same_package(&package) => return Ok(vec![root]),
            Ok(dir) => {
                return Err(CompileError::SourceNotFound {
                    fq_name: package,
                    path: dir,
                });
            }
            Err(err) => return Err(err),
        };

        let mut members = Vec::new();
        for entry in WalkDir::new(&dir)
            .min_depth(1)
            .max_depth(1)
            .sort_by_file_name()
        {
            let entry = entry.map_err(|e| CompileError::io(&dir, e.into()))?;
            let path = entry.path();
            if !entry.file_type().is_file()
                || path.extension().and_then(|e| e.to_str()) != Some(HAL_EXTENSION)
            {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                members.push(package.with_name(stem));
            }
        }
        tracing::trace!(%package, count = members.len(), "package members");
        Ok(members)
    }

    /// Resolve a fully-qualified type name: its own file first, then the
    /// package's `types.hal`, then nested components.
    pub fn lookup_qualified(&mut self, fq_name: &FqName) -> Result<Option<TypeId>> {
        let Some(name) = fq_name.name() else {
            return Ok(None);
        };
        let file = if self.source_exists(fq_name) {
            fq_name.file_name()
        } else {
            let types = fq_name.types_for_package();
            if !self.source_exists(&types) {
                return Ok(None);
            }
            types
        };
        let id = self.parse(&file, Enforcement::Full)?;
        let ast = self.ast(id);
        Ok(ast
            .find_top_level(name)
            .and_then(|top| ast.descend(top, fq_name.nested())))
    }

    // =========================================================================
    // Identities and hashes
    // =========================================================================

    pub fn type_identity(&self, id: TypeId) -> TypeIdentity {
        TypeIdentity {
            fq_name: self.named_type(id).fq_name().clone(),
            hash: self.ast(id.ast).content_hash().to_string(),
        }
    }

    /// The interface followed by its ancestors up to the root.
    pub fn super_chain(&self, id: TypeId) -> Vec<TypeId> {
        let mut chain = vec![id];
        let mut current = id;
        while let Some(next) = self
            .named_type(current)
            .interface()
            .and_then(|decl| decl.super_interface)
        {
            if chain.contains(&next) {
                break;
            }
            chain.push(next);
            current = next;
        }
        chain
    }

    /// Content hashes along the interface chain, most derived first.
    pub fn hash_chain(&self, id: TypeId) -> Vec<String> {
        self.super_chain(id)
            .into_iter()
            .map(|link| self.ast(link.ast).content_hash().to_string())
            .collect()
    }

    /// Evaluated value of an enumerator.
    pub fn enum_value(&self, ty: TypeId, index: usize) -> Result<i128> {
        hir::evaluate_enum_value(self, ty, index)
    }
}

/// Lower-case hex SHA-256.
pub fn sha256_hex(bytes: &[u8]) -> String {
    Sha256::digest(bytes)
        .iter()
        .map(|b| format!("{b:02x}"))
        .collect()
}

/// A file must declare the package and the kind of content its name implies.
fn check_declarations(file: &FqName, path: &Path, source: &SourceFile) -> Result<()> {
    let mismatch = |reason: String| CompileError::DeclarationMismatch {
        path: path.to_path_buf(),
        reason,
    };

    let expected = file.package_and_version();
    let declared = source
        .package
        .as_ref()
        .and_then(|p| FqName::parse(&p.text).ok())
        .unwrap_or_default();
    if declared != expected {
        return Err(mismatch(format!(
            "declares package '{declared}', expected '{expected}'"
        )));
    }

    let interfaces: Vec<_> = source
        .declarations
        .iter()
        .filter(|d| matches!(d.kind, DeclarationKind::Interface(_)))
        .collect();

    if file.is_types_file() {
        if let Some(iface) = interfaces.first() {
            return Err(mismatch(format!(
                "declares interface '{}'; types files may only declare types",
                iface.name
            )));
        }
        return Ok(());
    }

    let name = file.name().unwrap_or_default();
    match source.declarations.as_slice() {
        [decl] if interfaces.len() == 1 && decl.name == name => Ok(()),
        _ => Err(mismatch(format!(
            "must declare exactly one top-level {} '{name}'",
            DeclKind::Interface
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sha256_hex() {
        assert_eq!(
            sha256_hex(b""),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn test_check_declarations() {
        let path = Path::new("IFoo.hal");
        let name = FqName::parse("test@1.0::IFoo").unwrap();

        let good = parser::parse("package test@1.0; interface IFoo {};").file;
        assert!(check_declarations(&name, path, &good).is_ok());

        let wrong_package = parser::parse("package other@1.0; interface IFoo {};").file;
        assert!(check_declarations(&name, path, &wrong_package).is_err());

        let wrong_name = parser::parse("package test@1.0; interface IBar {};").file;
        assert!(check_declarations(&name, path, &wrong_name).is_err());

        let types = FqName::parse("test@1.0::types").unwrap();
        assert!(check_declarations(&types, path, &good).is_err());
    }

    #[test]
    fn test_root_interface_without_package_root() {
        let mut coordinator = Coordinator::new(PackageRootTable::new("/nonexistent"));
        let id = coordinator
            .parse(&builtin::root_interface(), Enforcement::Full)
            .unwrap();
        let ast = coordinator.ast(id);
        assert!(ast.is_interface());
        let iface = coordinator.named_type(ast.interface().unwrap());
        let decl = iface.interface().unwrap();
        assert!(decl.super_interface.is_none());
        assert_eq!(decl.methods.len(), 5);
    }

    #[test]
    fn test_unknown_package_root() {
        let mut coordinator = Coordinator::new(PackageRootTable::new("/nonexistent"));
        let err = coordinator
            .parse(&FqName::parse("nowhere@1.0::IFoo").unwrap(), Enforcement::Full)
            .unwrap_err();
        assert!(matches!(err, CompileError::UnknownPackageRoot(_)));
    }
}
