//! Build rules for generated code: `Android.mk` for the Java libraries,
//! `Android.bp` for the C++ libraries and for a stub implementation.

use std::collections::BTreeSet;
use std::path::PathBuf;

use crate::base::FqName;
use crate::base::constants::{SYSTEM_PACKAGE_PREFIXES, SYSTEM_PROCESS_PACKAGES, TRANSPORT_PACKAGES};
use crate::error::{CompileError, Result};
use crate::hir::{self, AstId, DeclKind};
use crate::project::{Coordinator, builtin};

use super::{Formatter, GENERATED_BANNER, GenerationContext, base_name, parse_package, write_file};

const MAKEFILE_RULE: &str =
    "################################################################################";

/// Packages shipped inside the transport library; never linked separately.
fn is_transport_package(package: &FqName) -> bool {
    TRANSPORT_PACKAGES.contains(&package.package_string().as_str())
}

fn is_system_package(package: &FqName) -> bool {
    SYSTEM_PACKAGE_PREFIXES
        .iter()
        .any(|prefix| package.in_package(prefix))
}

fn is_system_process_package(package: &FqName) -> bool {
    SYSTEM_PROCESS_PACKAGES.contains(&package.to_string().as_str())
}

/// `android.hardware.foo-V1.0`
fn java_library_name(package: &FqName) -> String {
    format!("{}-V{}", package.package_string(), package.version_string())
}

/// Directory of the package below `output_path`, mirroring its location in
/// the source tree: `<out>/hardware/interfaces/foo/1.0/`.
fn package_output_dir(context: &GenerationContext<'_>, package: &FqName) -> Result<PathBuf> {
    let roots = context.coordinator.roots();
    let root = roots
        .find(package)
        .ok_or_else(|| CompileError::UnknownPackageRoot(package.package_and_version()))?;
    Ok(context
        .output_path
        .join(root.path())
        .join(roots.package_path(package, false)?))
}

/// `-r` options for the package, everything it imports and the root
/// interface, sorted and deduplicated.
fn root_options(coordinator: &Coordinator, package: &FqName, imported: &BTreeSet<FqName>) -> Result<BTreeSet<String>> {
    let roots = coordinator.roots();
    let mut options = BTreeSet::new();
    for import in imported {
        options.insert(roots.root_option(import)?);
    }
    options.insert(roots.root_option(package)?);
    options.insert(roots.root_option(&builtin::root_interface())?);
    Ok(options)
}

/// Parse every member and collect the packages they import transitively.
fn parse_with_hierarchy(
    coordinator: &mut Coordinator,
    package: &FqName,
) -> Result<(Vec<(FqName, AstId)>, BTreeSet<FqName>)> {
    let members = parse_package(coordinator, package)?;
    let mut hierarchy = BTreeSet::new();
    for (_, id) in &members {
        hierarchy.extend(hir::imported_packages_hierarchy(coordinator, *id)?);
    }
    Ok((members, hierarchy))
}

// ============================================================================
// ANDROID.MK
// ============================================================================

pub(super) fn generate_makefile(package: &FqName, context: &mut GenerationContext<'_>) -> Result<()> {
    let (members, imported) = parse_with_hierarchy(context.coordinator, package)?;
    let java_compatible = hir::is_package_java_compatible(context.coordinator, package)?.compatible;

    let coordinator: &Coordinator = context.coordinator;
    let has_constants = members
        .iter()
        .any(|(_, id)| !hir::exported_types(coordinator, *id).is_empty());
    if !java_compatible && !has_constants {
        tracing::warn!(%package, "not Java compatible; no Java makefile created");
        return Ok(());
    }

    let names: Vec<FqName> = members.iter().map(|(name, _)| name.clone()).collect();
    let types_ast = members
        .iter()
        .find(|(name, _)| name.is_types_file())
        .map(|(_, id)| *id);
    if !hir::package_needs_java_code(coordinator, &names, types_ast) {
        return Ok(());
    }

    let makefile = Makefile {
        coordinator,
        package,
        tool_name: context.tool_name,
        options: root_options(coordinator, package, &imported)?,
        intermediate_dir: format!(
            "{}/{}",
            coordinator.roots().package_root_to_path(package)?,
            coordinator.roots().package_path(package, true)?
        ),
    };
    let mut out = Formatter::new();
    out.line(format!("# {GENERATED_BANNER}"))
        .blank()
        .line("LOCAL_PATH := $(call my-dir)");

    let library = java_library_name(package);
    if java_compatible {
        for static_suffix in ["", "-static"] {
            let is_static = !static_suffix.is_empty();
            makefile.emit_header(&mut out, &format!("{library}-java{static_suffix}"));
            if !imported.is_empty() {
                let kind = if is_static { "STATIC_" } else { "" };
                out.blank().line(format!("LOCAL_{kind}JAVA_LIBRARIES := \\"));
                out.indented(|out| {
                    for import in &imported {
                        out.line(format!("{}-java{static_suffix} \\", java_library_name(import)));
                    }
                });
            }
            for (member, id) in &members {
                makefile.emit_member(&mut out, member, *id);
            }
            out.blank()
                .line(format!(
                    "include $(BUILD_{}JAVA_LIBRARY)",
                    if is_static { "STATIC_" } else { "" }
                ))
                .blank();
        }
    }

    if has_constants {
        makefile.emit_header(&mut out, &format!("{library}-java-constants"));
        makefile.emit_constants(&mut out, &names);
        out.line("# Avoid dependency cycle of framework.jar -> this-library -> framework.jar")
            .line("LOCAL_NO_STANDARD_LIBRARIES := true")
            .line("LOCAL_JAVA_LIBRARIES := core-oj")
            .blank()
            .line("include $(BUILD_STATIC_JAVA_LIBRARY)")
            .blank();
    }

    out.blank()
        .line("include $(call all-makefiles-under,$(LOCAL_PATH))");

    let path = package_output_dir(context, package)?.join("Android.mk");
    write_file(&path, &out.finish())
}

struct Makefile<'a> {
    coordinator: &'a Coordinator,
    package: &'a FqName,
    tool_name: &'a str,
    options: BTreeSet<String>,
    /// `android/hardware/foo/V1_0/`
    intermediate_dir: String,
}

impl Makefile<'_> {
    fn emit_header(&self, out: &mut Formatter, module: &str) {
        out.blank()
            .line(MAKEFILE_RULE)
            .blank()
            .line("include $(CLEAR_VARS)")
            .line(format!("LOCAL_MODULE := {module}"))
            .line("LOCAL_MODULE_CLASS := JAVA_LIBRARIES")
            .blank()
            .line("intermediates := $(call local-generated-sources-dir, COMMON)")
            .blank()
            .line(format!("HIDL := $(HOST_OUT_EXECUTABLES)/{}$(HOST_EXECUTABLE_SUFFIX)", self.tool_name));
    }

    fn emit_tool(&self, out: &mut Formatter, language: &str, target: &str) {
        out.line("$(GEN): PRIVATE_OUTPUT_DIR := $(intermediates)")
            .line("$(GEN): PRIVATE_CUSTOM_TOOL = \\");
        out.indent().indent();
        out.line("$(PRIVATE_HIDL) -o $(PRIVATE_OUTPUT_DIR) \\")
            .line(format!("-L{language} \\"));
        for option in &self.options {
            out.line(format!("-r{option} \\"));
        }
        out.line(target);
        out.unindent().unindent();
        out.blank();
    }

    /// One GEN rule per file, or per non-typedef type of `types.hal`, sorted
    /// by name.
    fn emit_member(&self, out: &mut Formatter, member: &FqName, id: AstId) {
        if !member.is_types_file() {
            self.emit_type_rule(out, member, id, None);
            return;
        }
        let ast = self.coordinator.ast(id);
        let mut types: Vec<_> = ast
            .top_level_types()
            .filter(|(_, named)| named.kind() != DeclKind::TypeDef)
            .map(|(_, named)| named.fq_name())
            .collect();
        types.sort();
        for fq_name in types {
            self.emit_type_rule(out, member, id, Some(&fq_name.local_name()));
        }
    }

    fn emit_type_rule(&self, out: &mut Formatter, member: &FqName, id: AstId, type_name: Option<&str>) {
        let file = member.name().unwrap_or_default();
        let heading = match type_name {
            Some(type_name) => format!("# Build {file}.hal ({type_name})"),
            None => format!("# Build {file}.hal"),
        };
        out.blank()
            .line("#")
            .line(heading)
            .line("#")
            .line(format!(
                "GEN := $(intermediates)/{}{}.java",
                self.intermediate_dir,
                type_name.unwrap_or(file)
            ))
            .line("$(GEN): $(HIDL)")
            .line("$(GEN): PRIVATE_HIDL := $(HIDL)")
            .line(format!("$(GEN): PRIVATE_DEPS := $(LOCAL_PATH)/{file}.hal"));
        for dependency in self.coordinator.ast(id).imported_names() {
            if dependency.same_package(member) {
                let dependency = dependency.name().unwrap_or_default();
                out.line(format!("$(GEN): PRIVATE_DEPS += $(LOCAL_PATH)/{dependency}.hal"))
                    .line(format!("$(GEN): $(LOCAL_PATH)/{dependency}.hal"));
            }
        }
        let target = match type_name {
            Some(type_name) => format!("{}::{file}.{type_name}", self.package),
            None => format!("{}::{file}", self.package),
        };
        self.emit_tool(out, "java", &target);
        out.line(format!("$(GEN): $(LOCAL_PATH)/{file}.hal"))
            .line("\t$(transform-generated-source)")
            .line("LOCAL_GENERATED_SOURCES += $(GEN)");
    }

    fn emit_constants(&self, out: &mut Formatter, members: &[FqName]) {
        out.blank()
            .line("#")
            .line(format!("GEN := $(intermediates)/{}Constants.java", self.intermediate_dir))
            .line("$(GEN): $(HIDL)");
        for member in members {
            out.line(format!("$(GEN): $(LOCAL_PATH)/{}.hal", member.name().unwrap_or_default()));
        }
        out.blank().line("$(GEN): PRIVATE_HIDL := $(HIDL)");
        self.emit_tool(out, "java-constants", &self.package.to_string());
        out.line("$(GEN):")
            .line("\t$(transform-generated-source)")
            .line("LOCAL_GENERATED_SOURCES += $(GEN)")
            .blank();
    }
}

// ============================================================================
// ANDROID.BP
// ============================================================================

pub(super) fn generate_android_bp(package: &FqName, context: &mut GenerationContext<'_>) -> Result<()> {
    let (members, imported) = parse_with_hierarchy(context.coordinator, package)?;
    let coordinator: &Coordinator = context.coordinator;
    let names: Vec<FqName> = members.into_iter().map(|(name, _)| name).collect();

    let library = package.to_string();
    let filegroup = format!("{library}_hal");
    let gen_sources = format!("{library}_genc++");
    let gen_headers = format!("{library}_genc++_headers");
    let prefix = format!(
        "{}/{}",
        coordinator.roots().package_root_to_path(package)?,
        coordinator.roots().package_path(package, false)?
    );
    let options = root_options(coordinator, package, &imported)?;

    let mut out = Formatter::new();
    out.line(format!("// {GENERATED_BANNER}")).blank();

    out.block("filegroup {", "}", |out| {
        out.line(format!("name: \"{filegroup}\","));
        out.block("srcs: [", "],", |out| {
            for name in &names {
                out.line(format!("\"{}.hal\",", name.name().unwrap_or_default()));
            }
        });
    })
    .blank();

    let genrule = |out: &mut Formatter, name: &str, language: &str, outputs: Vec<String>| {
        out.block("genrule {", "}", |out| {
            let options: Vec<String> = options.iter().map(|option| format!("-r{option}")).collect();
            out.line(format!("name: \"{name}\","))
                .line(format!("tools: [\"{}\"],", context.tool_name))
                .line(format!(
                    "cmd: \"$(location {}) -o $(genDir) -L{language} {} {package}\",",
                    context.tool_name,
                    options.join(" ")
                ));
            out.block("srcs: [", "],", |out| {
                out.line(format!("\":{filegroup}\","));
            });
            out.block("out: [", "],", |out| {
                for output in &outputs {
                    out.line(format!("\"{prefix}{output}\","));
                }
            });
        })
        .blank();
    };

    let sources: Vec<String> = names
        .iter()
        .map(|name| {
            if name.is_types_file() {
                "types.cpp".to_string()
            } else {
                format!("{}All.cpp", base_name(name))
            }
        })
        .collect();
    genrule(&mut out, &gen_sources, "c++-sources", sources);

    let mut headers = Vec::new();
    for name in &names {
        let file = name.name().unwrap_or_default();
        headers.push(format!("{file}.h"));
        if name.is_types_file() {
            headers.push("hwtypes.h".to_string());
        } else {
            let base = base_name(name);
            for class in ["IHw", "BnHw", "BpHw", "Bs"] {
                headers.push(format!("{class}{base}.h"));
            }
        }
    }
    genrule(&mut out, &gen_headers, "c++-headers", headers);

    if is_transport_package(package) {
        out.line(format!("// {package} is exported from libhidltransport"));
    } else {
        let library_section = LibrarySection {
            package,
            library: &library,
            gen_sources: &gen_sources,
            gen_headers: &gen_headers,
            imported: &imported,
            for_test: context.for_test,
        };
        library_section.emit(&mut out, false);
        if !is_system_package(package) {
            out.blank();
            library_section.emit(&mut out, true);
        }
    }

    let path = package_output_dir(context, package)?.join("Android.bp");
    write_file(&path, &out.finish())
}

struct LibrarySection<'a> {
    package: &'a FqName,
    library: &'a str,
    gen_sources: &'a str,
    gen_headers: &'a str,
    imported: &'a BTreeSet<FqName>,
    for_test: bool,
}

impl LibrarySection<'_> {
    fn emit(&self, out: &mut Formatter, vendor: bool) {
        out.block("cc_library {", "}", |out| {
            let suffix = if vendor { "_vendor" } else { "" };
            out.line(format!("name: \"{}{suffix}\",", self.library))
                .line("defaults: [\"hidl-module-defaults\"],")
                .line(format!("generated_sources: [\"{}\"],", self.gen_sources))
                .line(format!("generated_headers: [\"{}\"],", self.gen_headers))
                .line(format!("export_generated_headers: [\"{}\"],", self.gen_headers));
            if vendor {
                out.line("vendor: true,");
            } else {
                out.line("vendor_available: true,");
                if !self.for_test {
                    out.block("vndk: {", "},", |out| {
                        out.line("enabled: true,");
                        if is_system_process_package(self.package) {
                            out.line("support_system_process: true,");
                        }
                    });
                }
            }
            out.block("shared_libs: [", "],", |out| {
                for library in ["libhidlbase", "libhidltransport", "libhwbinder", "liblog", "libutils", "libcutils"] {
                    out.line(format!("\"{library}\","));
                }
                self.emit_dependencies(out, vendor);
            });
            out.block("export_shared_lib_headers: [", "],", |out| {
                for library in ["libhidlbase", "libhidltransport", "libhwbinder", "libutils"] {
                    out.line(format!("\"{library}\","));
                }
                self.emit_dependencies(out, vendor);
            });
        });
    }

    fn emit_dependencies(&self, out: &mut Formatter, vendor: bool) {
        for import in self.imported {
            if is_transport_package(import) {
                continue;
            }
            let suffix = if vendor && !is_system_package(import) { "_vendor" } else { "" };
            out.line(format!("\"{import}{suffix}\","));
        }
    }
}

pub(super) fn generate_android_bp_impl(
    package: &FqName,
    context: &mut GenerationContext<'_>,
) -> Result<()> {
    let members = parse_package(context.coordinator, package)?;
    let coordinator: &Coordinator = context.coordinator;
    let mut imported = BTreeSet::new();
    for (_, id) in &members {
        imported.extend(hir::imported_packages(coordinator, *id));
    }

    let mut out = Formatter::new();
    out.block("cc_library_shared {", "}", |out| {
        out.line(format!("name: \"{package}-impl\","))
            .line("relative_install_path: \"hw\",")
            .line("proprietary: true,");
        out.block("srcs: [", "],", |out| {
            for (name, _) in members.iter().filter(|(name, _)| !name.is_types_file()) {
                out.line(format!("\"{}.cpp\",", base_name(name)));
            }
        });
        out.block("shared_libs: [", "],", |out| {
            for library in ["libhidlbase", "libhidltransport", "libutils"] {
                out.line(format!("\"{library}\","));
            }
            out.line(format!("\"{package}\","));
            for import in imported.iter().filter(|import| !is_transport_package(import)) {
                out.line(format!("\"{import}\","));
            }
        });
    });

    write_file(&context.output_path.join("Android.bp"), &out.finish())
}
