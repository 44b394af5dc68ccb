//! Skeleton C++ implementation of an interface.
//!
//! `IFoo.hal` yields `Foo.h` and `Foo.cpp` directly in the output directory,
//! declaring `struct Foo : public IFoo` in an `implementation` namespace with
//! one stub per method. Types files produce nothing.

use crate::base::FqName;
use crate::error::Result;
use crate::hir::{Method, TypeId};

use super::cpp::{Cpp, close_namespaces, include_path, open_namespaces};
use super::{Formatter, GenerationContext, base_name, for_file_or_package, parse_checked, write_file};

pub(super) fn generate_all(target: &FqName, context: &mut GenerationContext<'_>) -> Result<()> {
    for_file_or_package(target, context, all_for_file)
}

pub(super) fn generate_headers(target: &FqName, context: &mut GenerationContext<'_>) -> Result<()> {
    for_file_or_package(target, context, header_for_file)
}

pub(super) fn generate_sources(target: &FqName, context: &mut GenerationContext<'_>) -> Result<()> {
    for_file_or_package(target, context, source_for_file)
}

fn all_for_file(file: &FqName, context: &mut GenerationContext<'_>) -> Result<()> {
    header_for_file(file, context)?;
    source_for_file(file, context)
}

fn header_for_file(file: &FqName, context: &mut GenerationContext<'_>) -> Result<()> {
    if file.is_types_file() {
        return Ok(());
    }
    let id = parse_checked(context.coordinator, file)?;
    let cpp = Cpp::new(context.coordinator, id);
    let Some(iface) = context.coordinator.ast(id).interface() else {
        return Ok(());
    };
    let path = context.output_path.join(format!("{}.h", base_name(file)));
    write_file(&path, &header(&cpp, file, iface))
}

fn source_for_file(file: &FqName, context: &mut GenerationContext<'_>) -> Result<()> {
    if file.is_types_file() {
        return Ok(());
    }
    let id = parse_checked(context.coordinator, file)?;
    let cpp = Cpp::new(context.coordinator, id);
    let Some(iface) = context.coordinator.ast(id).interface() else {
        return Ok(());
    };
    let path = context.output_path.join(format!("{}.cpp", base_name(file)));
    write_file(&path, &source(&cpp, file, iface))
}

/// Methods grouped by declaring interface, most derived first, without the
/// root interface.
fn method_groups<'a>(cpp: &Cpp<'a>, iface: TypeId) -> Vec<(TypeId, Vec<&'a Method>)> {
    let mut groups: Vec<(TypeId, Vec<&'a Method>)> = Vec::new();
    for (declaring, method) in cpp.chain_methods(iface) {
        if cpp.is_root(declaring) {
            continue;
        }
        match groups.last_mut() {
            Some((current, methods)) if *current == declaring => methods.push(method),
            _ => groups.push((declaring, vec![method])),
        }
    }
    groups.reverse();
    groups
}

fn header(cpp: &Cpp<'_>, file: &FqName, iface: TypeId) -> String {
    let name = file.name().unwrap_or_default();
    let base = base_name(file);
    let guard = format!("{}_{}_H", file.token_name(), base).to_uppercase();

    let mut out = Formatter::new();
    out.line(format!("#ifndef {guard}"))
        .line(format!("#define {guard}"))
        .blank()
        .line(format!("#include {}", include_path(file, &format!("{name}.h"))))
        .line("#include <hidl/MQDescriptor.h>")
        .line("#include <hidl/Status.h>")
        .blank();
    open_namespaces(&mut out, file);
    out.line("namespace implementation {").blank();

    out.line(format!("struct {base} : public {} {{", cpp.qualified(iface)));
    out.indented(|out| {
        for (declaring, methods) in method_groups(cpp, iface) {
            out.line(format!("// Methods from {} follow.", cpp.qualified(declaring)));
            for method in methods {
                out.line(format!("{} override;", cpp.signature(declaring, method, "")));
            }
            out.blank();
        }
    });
    out.line("};").blank();

    out.line(format!("extern \"C\" {name}* HIDL_FETCH_{name}(const char* name);"))
        .blank()
        .line("}  // namespace implementation");
    close_namespaces(&mut out, file);
    out.blank().line(format!("#endif  // {guard}"));
    out.finish()
}

fn source(cpp: &Cpp<'_>, file: &FqName, iface: TypeId) -> String {
    let name = file.name().unwrap_or_default();
    let base = base_name(file);

    let mut out = Formatter::new();
    out.line(format!("#include \"{base}.h\"")).blank();
    open_namespaces(&mut out, file);
    out.line("namespace implementation {").blank();

    for (declaring, methods) in method_groups(cpp, iface) {
        out.line(format!("// Methods from {} follow.", cpp.qualified(declaring)));
        for method in methods {
            out.block(
                format!("{} {{", cpp.signature(declaring, method, &format!("{base}::"))),
                "}",
                |out| {
                    out.line("// TODO implement");
                    match cpp.elided_result(method) {
                        Some(result) => out.line(format!(
                            "return {} {{}};",
                            cpp.type_name(&result.ty)
                        )),
                        None => out.line("return ::android::hardware::Void();"),
                    };
                },
            )
            .blank();
        }
    }

    out.block(
        format!("{name}* HIDL_FETCH_{name}(const char* /* name */) {{"),
        "}",
        |out| {
            out.line(format!("return new {base}();"));
        },
    )
    .blank()
    .line("}  // namespace implementation");
    close_namespaces(&mut out, file);
    out.finish()
}
