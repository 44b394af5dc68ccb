//! Constants of `@export` enums, for code that cannot use the generated
//! bindings: a C header (`export-header`) and a Java `Constants` class
//! (`java-constants`).
//!
//! Recognized annotation parameters:
//!
//! - `name` - name of the emitted typedef / class; empty emits an anonymous
//!   C enum and no Java class
//! - `value_prefix`, `value_suffix` - wrapped around every enumerator name
//! - `export_parent` - `"false"` leaves out values inherited from a parent
//!   enum

use std::path::PathBuf;

use crate::base::FqName;
use crate::error::Result;
use crate::hir::{self, TypeId};
use crate::project::Coordinator;

use super::cpp::literal;
use super::java::{java_literal, java_package, java_primitive};
use super::{Formatter, GENERATED_BANNER, GenerationContext, enum_storage, parse_package, write_file};

pub(super) fn generate_header(target: &FqName, context: &mut GenerationContext<'_>) -> Result<()> {
    let path = context.output_path.clone();
    generate(target, context, Language::C, path)
}

pub(super) fn generate_java_constants(
    target: &FqName,
    context: &mut GenerationContext<'_>,
) -> Result<()> {
    let roots = context.coordinator.roots();
    let mut path = context.output_path.join(roots.package_root_to_path(target)?);
    path.push(roots.package_path(target, true)?);
    path.push("Constants.java");
    generate(target, context, Language::Java, path)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Language {
    C,
    Java,
}

fn generate(
    package: &FqName,
    context: &mut GenerationContext<'_>,
    language: Language,
    path: PathBuf,
) -> Result<()> {
    let mut exported = Vec::new();
    for (_, id) in parse_package(context.coordinator, package)? {
        exported.extend(hir::exported_types(context.coordinator, id));
    }
    if exported.is_empty() {
        tracing::debug!(%package, "no exported types");
        return Ok(());
    }

    let coordinator: &Coordinator = context.coordinator;
    let mut out = Formatter::new();
    out.line(format!("// {GENERATED_BANNER}"))
        .line(format!("// Source: {package}"))
        .line(format!("// Root: {}", coordinator.roots().root_option(package)?))
        .blank();

    let guard = format!(
        "HIDL_GENERATED_{}_EXPORTED_CONSTANTS_H_",
        package.token_name().to_uppercase()
    );
    match language {
        Language::Java => {
            out.line(format!("package {};", java_package(package)))
                .blank()
                .line("public class Constants {");
            out.indent();
        }
        Language::C => {
            out.line(format!("#ifndef {guard}"))
                .line(format!("#define {guard}"))
                .blank()
                .line("#ifdef __cplusplus")
                .line("extern \"C\" {")
                .line("#endif")
                .blank();
        }
    }

    for id in exported {
        emit_exported(&mut out, coordinator, id, language)?;
    }

    match language {
        Language::Java => {
            out.unindent();
            out.line("}");
        }
        Language::C => {
            out.line("#ifdef __cplusplus")
                .line("}")
                .line("#endif")
                .blank()
                .line(format!("#endif  // {guard}"));
        }
    }
    write_file(&path, &out.finish())
}

fn emit_exported(
    out: &mut Formatter,
    coordinator: &Coordinator,
    id: TypeId,
    language: Language,
) -> Result<()> {
    let named = coordinator.named_type(id);
    let annotation = named.annotation("export");
    let param = |key: &str| annotation.and_then(|a| a.param(key));
    let name = param("name").unwrap_or(named.name());
    let prefix = param("value_prefix").unwrap_or_default();
    let suffix = param("value_suffix").unwrap_or_default();
    let export_parent = param("export_parent") != Some("false");

    let storage = enum_storage(coordinator, id);
    let mut values = hir::enum_values(coordinator, id)?;
    if !export_parent {
        let own = named.value_names().len();
        values.drain(..values.len().saturating_sub(own));
    }

    match language {
        Language::Java => {
            let java = java_primitive(storage);
            if !name.is_empty() {
                out.line(format!("public final class {name} {{"));
                out.indent();
            }
            for (value_name, value) in &values {
                out.line(format!(
                    "public static final {java} {prefix}{value_name}{suffix} = {};",
                    java_literal(storage, *value)
                ));
            }
            if !name.is_empty() {
                out.unindent();
                out.line("};");
            }
            out.blank();
        }
        Language::C => {
            let open = if name.is_empty() { "enum {" } else { "typedef enum {" };
            out.block(
                open,
                if name.is_empty() { "};".to_string() } else { format!("}} {name};") },
                |out| {
                    for (value_name, value) in &values {
                        out.line(format!(
                            "{prefix}{value_name}{suffix} = {},",
                            literal(storage, *value)
                        ));
                    }
                },
            )
            .blank();
        }
    }
    Ok(())
}
