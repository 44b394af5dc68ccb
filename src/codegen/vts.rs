//! VTS component specifications (`.vts` text protos).

use crate::base::FqName;
use crate::error::Result;
use crate::hir::{self, AstId, DeclKind, HandleKind, Method, Primitive, Type, TypeId};
use crate::project::{Coordinator, builtin};

use super::cpp::namespace;
use super::{Formatter, GenerationContext, base_name, enum_storage, for_file_or_package, parse_checked, write_file};

pub(super) fn generate(target: &FqName, context: &mut GenerationContext<'_>) -> Result<()> {
    for_file_or_package(target, context, generate_file)
}

fn generate_file(file: &FqName, context: &mut GenerationContext<'_>) -> Result<()> {
    let id = parse_checked(context.coordinator, file)?;
    let roots = context.coordinator.roots();
    let mut path = context.output_path.join(roots.package_root_to_path(file)?);
    path.push(roots.package_path(file, false)?);
    path.push(format!("{}.vts", base_name(file)));

    let text = Vts {
        coordinator: context.coordinator,
    }
    .component(id)?;
    write_file(&path, &text)
}

struct Vts<'a> {
    coordinator: &'a Coordinator,
}

impl Vts<'_> {
    fn qualified(&self, id: TypeId) -> String {
        let fq_name = self.coordinator.named_type(id).fq_name();
        format!("{}::{}", namespace(fq_name), fq_name.local_name().replace('.', "::"))
    }

    fn component(&self, id: AstId) -> Result<String> {
        let ast = self.coordinator.ast(id);
        let file = ast.fq_name();
        let component_name = match ast.interface() {
            Some(iface) => self.coordinator.named_type(iface).name().to_string(),
            None => "types".to_string(),
        };

        let mut out = Formatter::new();
        out.line("component_class: HAL_HIDL")
            .line(format!("component_type_version: {}", file.version_string()))
            .line(format!("component_name: \"{component_name}\""))
            .blank()
            .line(format!("package: \"{}\"", file.package_string()))
            .blank();

        let root = builtin::root_interface();
        for name in hir::all_imported_names(self.coordinator, id) {
            if name != root {
                out.line(format!("import: \"{name}\""));
            }
        }
        out.blank();

        match ast.interface() {
            Some(iface) => {
                out.line("interface: {");
                out.indent();
                for (child, named) in ast.nested_types(iface) {
                    if named.kind() != DeclKind::TypeDef {
                        self.emit_attribute(&mut out, child)?;
                    }
                }
                for link in self.coordinator.super_chain(iface).into_iter().rev() {
                    for method in self
                        .coordinator
                        .named_type(link)
                        .interface()
                        .map(|decl| decl.methods.as_slice())
                        .unwrap_or_default()
                    {
                        self.emit_api(&mut out, method);
                    }
                }
                out.unindent();
                out.line("}");
            }
            None => {
                for (child, named) in ast.top_level_types() {
                    if named.kind() != DeclKind::TypeDef {
                        self.emit_attribute(&mut out, child)?;
                    }
                }
            }
        }
        Ok(out.finish())
    }

    fn emit_attribute(&self, out: &mut Formatter, id: TypeId) -> Result<()> {
        out.line("attribute: {");
        out.indent();
        self.emit_declaration(out, id)?;
        out.unindent();
        out.line("}").blank();
        Ok(())
    }

    /// The body of a named declaration.
    fn emit_declaration(&self, out: &mut Formatter, id: TypeId) -> Result<()> {
        let named = self.coordinator.named_type(id);
        out.line(format!("name: \"{}\"", self.qualified(id)));
        match named.kind() {
            DeclKind::Enum => {
                let storage = enum_storage(self.coordinator, id);
                out.line("type: TYPE_ENUM").line("enum_value: {");
                out.indent();
                out.line(format!("scalar_type: \"{}\"", scalar_type(storage))).blank();
                for (name, value) in hir::enum_values(self.coordinator, id)? {
                    out.line(format!("enumerator: \"{name}\""))
                        .line("scalar_value: {")
                        .indented(|out| {
                            out.line(format!("{}: {value}", scalar_type(storage)));
                        })
                        .line("}");
                }
                out.unindent();
                out.line("}");
            }
            DeclKind::Struct | DeclKind::Union => {
                let (type_name, value_name) = match named.kind() {
                    DeclKind::Union => ("TYPE_UNION", "union_value"),
                    _ => ("TYPE_STRUCT", "struct_value"),
                };
                out.line(format!("type: {type_name}"));
                for (child, nested) in self.coordinator.ast(id.ast).nested_types(id) {
                    if nested.kind() == DeclKind::TypeDef {
                        continue;
                    }
                    out.line(format!("sub_{value_name}: {{"));
                    out.indent();
                    self.emit_declaration(out, child)?;
                    out.unindent();
                    out.line("}");
                }
                for field in named.fields() {
                    out.line(format!("{value_name}: {{"));
                    out.indent();
                    out.line(format!("name: \"{}\"", field.name));
                    self.emit_reference(out, &field.ty);
                    out.unindent();
                    out.line("}");
                }
            }
            DeclKind::TypeDef => {
                if let Some(target) = named.typedef_target() {
                    self.emit_reference(out, target);
                }
            }
            DeclKind::Interface => {
                out.line("type: TYPE_HIDL_INTERFACE");
            }
        }
        Ok(())
    }

    /// A type used as a field, argument or element.
    fn emit_reference(&self, out: &mut Formatter, ty: &Type) {
        match ty {
            Type::Primitive(Primitive::String) => {
                out.line("type: TYPE_STRING");
            }
            Type::Primitive(Primitive::Void) => {
                out.line("type: TYPE_VOID");
            }
            Type::Primitive(primitive) => {
                out.line("type: TYPE_SCALAR")
                    .line(format!("scalar_type: \"{}\"", scalar_type(*primitive)));
            }
            Type::Handle(HandleKind::Handle) => {
                out.line("type: TYPE_HANDLE");
            }
            Type::Handle(HandleKind::Memory) => {
                out.line("type: TYPE_HIDL_MEMORY");
            }
            Type::Handle(HandleKind::Pointer) => {
                out.line("type: TYPE_POINTER");
            }
            Type::Array { element, len } => {
                out.line("type: TYPE_ARRAY")
                    .line(format!("vector_size: {len}"))
                    .line("vector_value: {");
                out.indented(|out| self.emit_reference(out, element));
                out.line("}");
            }
            Type::Vector(element) => {
                out.line("type: TYPE_VECTOR").line("vector_value: {");
                out.indented(|out| self.emit_reference(out, element));
                out.line("}");
            }
            Type::TypeDef(id) => match self.coordinator.named_type(*id).typedef_target() {
                Some(target) => self.emit_reference(out, target),
                None => {
                    out.line(format!("predefined_type: \"{}\"", self.qualified(*id)));
                }
            },
            Type::Enum(id) => self.emit_predefined(out, "TYPE_ENUM", *id),
            Type::Struct(id) => self.emit_predefined(out, "TYPE_STRUCT", *id),
            Type::Union(id) => self.emit_predefined(out, "TYPE_UNION", *id),
            Type::Interface(id) => self.emit_predefined(out, "TYPE_HIDL_INTERFACE", *id),
        }
    }

    fn emit_predefined(&self, out: &mut Formatter, kind: &str, id: TypeId) {
        out.line(format!("type: {kind}"))
            .line(format!("predefined_type: \"{}\"", self.qualified(id)));
    }

    fn emit_api(&self, out: &mut Formatter, method: &Method) {
        out.line("api: {");
        out.indent();
        out.line(format!("name: \"{}\"", method.name));
        for result in &method.results {
            out.line("return_type_hidl: {");
            out.indented(|out| self.emit_reference(out, &result.ty));
            out.line("}");
        }
        for arg in &method.args {
            out.line("arg: {");
            out.indented(|out| self.emit_reference(out, &arg.ty));
            out.line("}");
        }
        if method.oneway {
            out.line("is_oneway: true");
        }
        out.unindent();
        out.line("}").blank();
    }
}

/// Scalar spelling in VTS protos (`bool_t` for `bool`).
fn scalar_type(primitive: Primitive) -> &'static str {
    match primitive {
        Primitive::Bool => "bool_t",
        other => other.keyword(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scalar_type() {
        assert_eq!(scalar_type(Primitive::Bool), "bool_t");
        assert_eq!(scalar_type(Primitive::Uint16), "uint16_t");
    }
}
