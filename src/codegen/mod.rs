//! Output formats.
//!
//! ## Key Types
//!
//! - [`FormatRegistry`] - The closed set of formats selectable with `-L`
//! - [`OutputHandler`] - One format: output mode, validation, generation
//! - [`GenerationContext`] - Everything a generation function may touch
//!
//! Generation functions first finish all parsing they need through
//! `&mut Coordinator`, then project the resolved ASTs through shared borrows.
//! Each backend matches [`Type`](crate::hir::Type) exhaustively; the dispatch
//! layer knows nothing about individual backends beyond the registry.

use std::io::Write;
use std::path::{Path, PathBuf};

use rustc_hash::FxHashSet;

use crate::base::FqName;
use crate::error::{CompileError, Result};
use crate::hir::{self, AstId, Primitive, Type, TypeId};
use crate::project::{Coordinator, Enforcement};

mod build_files;
mod cpp;
mod cpp_impl;
mod export;
mod formatter;
mod hash;
mod java;
mod vts;

pub use formatter::{FormatOptions, Formatter, write_file};

/// Header line every generated file starts with, in the target's comment
/// syntax.
pub(crate) const GENERATED_BANNER: &str = "This file is autogenerated by hal-gen. Do not edit manually.";

// ============================================================================
// REGISTRY
// ============================================================================

/// What the `-o` argument means for a format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    /// `-o` names a directory; required.
    NeedsDirectory,
    /// `-o` names a single file; required.
    NeedsSingleFile,
    /// `-o` defaults to the source tree root.
    NeedsSourceTreeRoot,
    /// Nothing is written; `-o` is ignored.
    NotNeeded,
}

pub type ValidateFn = fn(&FqName, &str) -> Result<()>;
pub type GenerateFn = fn(&FqName, &mut GenerationContext<'_>) -> Result<()>;

/// One `-L` format.
#[derive(Clone)]
pub struct OutputHandler {
    pub name: &'static str,
    pub description: &'static str,
    pub mode: OutputMode,
    validator: ValidateFn,
    generator: GenerateFn,
}

impl OutputHandler {
    pub(crate) fn new(
        name: &'static str,
        description: &'static str,
        mode: OutputMode,
        validator: ValidateFn,
        generator: GenerateFn,
    ) -> Self {
        Self {
            name,
            description,
            mode,
            validator,
            generator,
        }
    }

    /// Check that `target` has the shape this format needs.
    pub fn validate(&self, target: &FqName) -> Result<()> {
        (self.validator)(target, self.name)
    }

    pub fn generate(&self, target: &FqName, context: &mut GenerationContext<'_>) -> Result<()> {
        tracing::debug!(format = self.name, %target, "generating");
        (self.generator)(target, context)
    }
}

impl std::fmt::Debug for OutputHandler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OutputHandler")
            .field("name", &self.name)
            .field("mode", &self.mode)
            .finish_non_exhaustive()
    }
}

/// The fixed set of output formats, in `-h` order.
#[derive(Debug, Clone)]
pub struct FormatRegistry {
    handlers: Vec<OutputHandler>,
}

impl Default for FormatRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl FormatRegistry {
    pub fn new() -> Self {
        use OutputMode::*;

        let handler = OutputHandler::new;

        Self {
            handlers: vec![
                handler(
                    "check",
                    "Parses the interface to see if valid but doesn't write any files.",
                    NotNeeded,
                    validate_for_source,
                    generate_check,
                ),
                handler(
                    "c++",
                    "Generates C++ headers and sources for talking to interfaces.",
                    NeedsDirectory,
                    validate_for_source,
                    cpp::generate_all,
                ),
                handler(
                    "c++-headers",
                    "Generates C++ headers for interface files.",
                    NeedsDirectory,
                    validate_for_source,
                    cpp::generate_headers,
                ),
                handler(
                    "c++-sources",
                    "Generates C++ sources for interface files.",
                    NeedsDirectory,
                    validate_for_source,
                    cpp::generate_sources,
                ),
                handler(
                    "export-header",
                    "Generates a header file from @export enumerations to help maintain legacy code.",
                    NeedsSingleFile,
                    validate_is_package,
                    export::generate_header,
                ),
                handler(
                    "c++-impl",
                    "Generates boilerplate implementation of an interface in C++ (for convenience).",
                    NeedsDirectory,
                    validate_for_source,
                    cpp_impl::generate_all,
                ),
                handler(
                    "c++-impl-headers",
                    "c++-impl but headers only",
                    NeedsDirectory,
                    validate_for_source,
                    cpp_impl::generate_headers,
                ),
                handler(
                    "c++-impl-sources",
                    "c++-impl but sources only",
                    NeedsDirectory,
                    validate_for_source,
                    cpp_impl::generate_sources,
                ),
                handler(
                    "java",
                    "Generates Java library for talking to interfaces in Java.",
                    NeedsDirectory,
                    validate_for_source,
                    java::generate,
                ),
                handler(
                    "java-constants",
                    "Like export-header but for Java (always created by -Lmakefile if @export exists).",
                    NeedsDirectory,
                    validate_is_package,
                    export::generate_java_constants,
                ),
                handler(
                    "vts",
                    "Generates vts proto files for use in vtsd.",
                    NeedsDirectory,
                    validate_for_source,
                    vts::generate,
                ),
                handler(
                    "makefile",
                    "Generates makefiles for -Ljava and -Ljava-constants.",
                    NeedsSourceTreeRoot,
                    validate_is_package,
                    build_files::generate_makefile,
                ),
                handler(
                    "androidbp",
                    "Generates Soong bp files for -Lc++-headers and -Lc++-sources.",
                    NeedsSourceTreeRoot,
                    validate_is_package,
                    build_files::generate_android_bp,
                ),
                handler(
                    "androidbp-impl",
                    "Generates boilerplate bp files for implementation created with -Lc++-impl.",
                    NeedsDirectory,
                    validate_is_package,
                    build_files::generate_android_bp_impl,
                ),
                handler(
                    "hash",
                    "Prints hashes of interface in `current.txt` format to standard out.",
                    NotNeeded,
                    validate_for_source,
                    hash::generate,
                ),
            ],
        }
    }

    pub fn lookup(&self, name: &str) -> Option<&OutputHandler> {
        self.handlers.iter().find(|h| h.name == name)
    }

    pub fn handlers(&self) -> &[OutputHandler] {
        &self.handlers
    }

    /// The `-L` table shown by `-h`.
    pub fn usage_table(&self) -> String {
        let mut out = String::new();
        for handler in &self.handlers {
            out.push_str(&format!("  {:<18}{}\n", handler.name, handler.description));
        }
        out
    }
}

// ============================================================================
// VALIDATION
// ============================================================================

fn require_package_and_version(target: &FqName, format: &str) -> Result<()> {
    if !target.has_package() {
        return Err(CompileError::validation(target, format, "expecting package name"));
    }
    if target.version().is_none() {
        return Err(CompileError::validation(target, format, "expecting package version"));
    }
    Ok(())
}

/// A file or a whole package. A dotted name is only accepted as
/// `types.Name` for `java`, which limits output to that one type.
pub fn validate_for_source(target: &FqName, format: &str) -> Result<()> {
    require_package_and_version(target, format)?;
    if target.nested().is_empty() && target.value().is_none() {
        return Ok(());
    }
    if format == "java" && target.is_types_file() && target.nested().len() == 1 {
        return Ok(());
    }
    Err(CompileError::validation(
        target,
        format,
        "a dotted name is only valid as types.<Name> with -Ljava",
    ))
}

/// A bare package: `pkg@M.m` with no name.
pub fn validate_is_package(target: &FqName, format: &str) -> Result<()> {
    require_package_and_version(target, format)?;
    if target.name().is_some() {
        return Err(CompileError::validation(
            target,
            format,
            "expecting only package name and version",
        ));
    }
    Ok(())
}

// ============================================================================
// GENERATION
// ============================================================================

/// State shared by every generation function.
pub struct GenerationContext<'a> {
    pub coordinator: &'a mut Coordinator,
    /// Name the tool is invoked as, written into build rules.
    pub tool_name: &'a str,
    /// Output directory or file; empty for formats that write nothing.
    pub output_path: PathBuf,
    /// `-t`: build files for tests.
    pub for_test: bool,
    pub stdout: &'a mut dyn Write,
}

impl<'a> GenerationContext<'a> {
    pub fn new(coordinator: &'a mut Coordinator, stdout: &'a mut dyn Write) -> Self {
        Self {
            coordinator,
            tool_name: "hal-gen",
            output_path: PathBuf::new(),
            for_test: false,
            stdout,
        }
    }

    pub fn with_output_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.output_path = path.into();
        self
    }

    pub fn with_tool_name(mut self, tool_name: &'a str) -> Self {
        self.tool_name = tool_name;
        self
    }

    pub fn for_test(mut self, for_test: bool) -> Self {
        self.for_test = for_test;
        self
    }

    /// `output_path` extended by path components.
    pub fn output_dir<I, S>(&self, components: I) -> PathBuf
    where
        I: IntoIterator<Item = S>,
        S: AsRef<Path>,
    {
        let mut dir = self.output_path.clone();
        for component in components {
            dir.push(component);
        }
        dir
    }
}

/// Generate one file directly, or each member of a package target in turn,
/// stopping at the first failure.
pub(crate) fn for_file_or_package(
    target: &FqName,
    context: &mut GenerationContext<'_>,
    generate_file: GenerateFn,
) -> Result<()> {
    if target.is_fully_qualified() {
        return generate_file(target, context);
    }
    for member in context.coordinator.package_interfaces(target)? {
        generate_file(&member, context)?;
    }
    Ok(())
}

/// Parse a file and evaluate its constants. Everything a backend projects
/// afterwards is resolved.
pub(crate) fn parse_checked(coordinator: &mut Coordinator, fq_name: &FqName) -> Result<AstId> {
    let id = coordinator.parse(fq_name, Enforcement::Full)?;
    hir::check_enum_values(coordinator, coordinator.ast(id))?;
    Ok(id)
}

/// Parse every member of a package, returning them in member order.
pub(crate) fn parse_package(
    coordinator: &mut Coordinator,
    package: &FqName,
) -> Result<Vec<(FqName, AstId)>> {
    let members = coordinator.package_interfaces(package)?;
    let mut parsed = Vec::with_capacity(members.len());
    for member in members {
        let id = parse_checked(coordinator, &member)?;
        parsed.push((member, id));
    }
    Ok(parsed)
}

/// `IFoo` -> `Foo`; anything else unchanged.
pub(crate) fn base_name(fq_name: &FqName) -> String {
    let name = fq_name.name().unwrap_or_default();
    if fq_name.is_interface_name() {
        name[1..].to_string()
    } else {
        name.to_string()
    }
}

/// Follow typedefs to the type they name.
pub(crate) fn strip_typedefs<'a>(coordinator: &'a Coordinator, ty: &'a Type) -> &'a Type {
    let mut seen = FxHashSet::default();
    let mut current = ty;
    while let Type::TypeDef(id) = current {
        match coordinator.named_type(*id).typedef_target() {
            Some(target) if seen.insert(*id) => current = target,
            _ => break,
        }
    }
    current
}

/// Integer type an enum is stored as.
pub(crate) fn enum_storage(coordinator: &Coordinator, id: TypeId) -> Primitive {
    hir::storage_primitive(coordinator, id).unwrap_or(Primitive::Int32)
}

fn generate_check(target: &FqName, context: &mut GenerationContext<'_>) -> Result<()> {
    for_file_or_package(target, context, check_file)
}

fn check_file(file: &FqName, context: &mut GenerationContext<'_>) -> Result<()> {
    parse_checked(context.coordinator, file).map(|_| ())
}
