//! Java bindings.
//!
//! An interface file becomes one `IFoo.java` holding the interface, its
//! nested types and callback interfaces. A types file becomes one file per
//! top-level declaration other than typedefs; the target `pkg@v::types.Name`
//! limits output to that one declaration. Files land in
//! `<out>/<package components>/V<M>_<m>/`.
//!
//! Only files whose whole type graph avoids handles, memory, pointers and
//! unions can be expressed; anything else is rejected before writing.

use crate::base::FqName;
use crate::error::{CompileError, Result};
use crate::hir::{self, DeclKind, Method, Primitive, Type, TypeId};
use crate::project::Coordinator;

use super::{
    Formatter, GENERATED_BANNER, GenerationContext, enum_storage, for_file_or_package,
    parse_checked, write_file,
};

const FORMAT: &str = "java";

pub(super) fn generate(target: &FqName, context: &mut GenerationContext<'_>) -> Result<()> {
    for_file_or_package(target, context, generate_file)
}

fn generate_file(target: &FqName, context: &mut GenerationContext<'_>) -> Result<()> {
    let file = target.file_name();
    let limit = target.nested().first();
    let id = parse_checked(context.coordinator, &file)?;
    if !hir::is_java_compatible(context.coordinator, id) {
        return Err(CompileError::validation(
            &file,
            FORMAT,
            "cannot be expressed in Java (uses handles, memory, pointers or unions)",
        ));
    }

    let dir = context.output_dir(file.package_and_version_components(true));
    let java = Java {
        coordinator: context.coordinator,
        file: &file,
    };
    let ast = context.coordinator.ast(id);

    if let Some(iface) = ast.interface() {
        let name = context.coordinator.named_type(iface).name();
        return write_file(&dir.join(format!("{name}.java")), &java.interface_file(iface)?);
    }

    let declarations: Vec<TypeId> = match limit {
        Some(name) => {
            let found = ast
                .find_top_level(name)
                .ok_or_else(|| CompileError::unresolved(name.as_str(), file.to_string()))?;
            vec![found]
        }
        None => ast
            .top_level_types()
            .filter(|(_, named)| named.kind() != DeclKind::TypeDef)
            .map(|(id, _)| id)
            .collect(),
    };
    for id in declarations {
        let name = context.coordinator.named_type(id).name();
        write_file(&dir.join(format!("{name}.java")), &java.types_file(id)?)?;
    }
    Ok(())
}

/// `android.hardware.foo.V1_0`
pub(crate) fn java_package(fq_name: &FqName) -> String {
    fq_name.package_and_version_components(true).join(".")
}

/// The Java primitive an integer, float or bool is carried as.
pub(crate) fn java_primitive(primitive: Primitive) -> &'static str {
    match primitive {
        Primitive::Bool => "boolean",
        Primitive::Int8 | Primitive::Uint8 => "byte",
        Primitive::Int16 | Primitive::Uint16 => "short",
        Primitive::Int32 | Primitive::Uint32 => "int",
        Primitive::Int64 | Primitive::Uint64 => "long",
        Primitive::Float => "float",
        Primitive::Double => "double",
        Primitive::String => "String",
        Primitive::Void => "void",
    }
}

/// A constant of `storage` in Java syntax. Java has no unsigned types, so
/// unsigned values are reinterpreted at their width.
pub(crate) fn java_literal(storage: Primitive, value: i128) -> String {
    let Some(bits) = storage.integer_bits() else {
        return value.to_string();
    };
    let modulus = 1i128 << bits;
    let mut wrapped = value.rem_euclid(modulus);
    if wrapped >= modulus / 2 {
        wrapped -= modulus;
    }
    match bits {
        64 => format!("{wrapped}L"),
        _ => wrapped.to_string(),
    }
}

fn boxed(java: &str) -> String {
    match java {
        "boolean" => "Boolean".to_string(),
        "byte" => "Byte".to_string(),
        "short" => "Short".to_string(),
        "int" => "Integer".to_string(),
        "long" => "Long".to_string(),
        "float" => "Float".to_string(),
        "double" => "Double".to_string(),
        other => other.to_string(),
    }
}

struct Java<'a> {
    coordinator: &'a Coordinator,
    file: &'a FqName,
}

impl Java<'_> {
    fn unsupported(&self, what: &str) -> CompileError {
        CompileError::validation(self.file, FORMAT, format!("{what} cannot be expressed in Java"))
    }

    fn qualified(&self, id: TypeId) -> String {
        let fq_name = self.coordinator.named_type(id).fq_name();
        format!("{}.{}", java_package(fq_name), fq_name.local_name())
    }

    fn java_type(&self, ty: &Type) -> Result<String> {
        match ty {
            Type::Primitive(primitive) => Ok(java_primitive(*primitive).to_string()),
            Type::Handle(kind) => Err(self.unsupported(kind.keyword())),
            Type::Union(id) => Err(self.unsupported(&self.qualified(*id))),
            Type::Array { element, .. } => Ok(format!("{}[]", self.java_type(element)?)),
            Type::Vector(element) => Ok(format!(
                "java.util.ArrayList<{}>",
                boxed(&self.java_type(element)?)
            )),
            Type::TypeDef(id) => match self.coordinator.named_type(*id).typedef_target() {
                Some(target) => self.java_type(target),
                None => Err(CompileError::unresolved(
                    self.qualified(*id),
                    self.file.to_string(),
                )),
            },
            Type::Enum(id) => Ok(java_primitive(enum_storage(self.coordinator, *id)).to_string()),
            Type::Struct(id) | Type::Interface(id) => Ok(self.qualified(*id)),
        }
    }

    /// Field initializer so that every field starts out non-null.
    fn initializer(&self, ty: &Type) -> Result<Option<String>> {
        Ok(match ty {
            Type::Primitive(Primitive::String) => Some("new String()".to_string()),
            Type::Primitive(_) | Type::Enum(_) | Type::Interface(_) => None,
            Type::Handle(kind) => return Err(self.unsupported(kind.keyword())),
            Type::Union(id) => return Err(self.unsupported(&self.qualified(*id))),
            Type::Array { .. } => {
                let mut dims = String::new();
                let mut element = ty;
                while let Type::Array { element: inner, len } = element {
                    dims.push_str(&format!("[{len}]"));
                    element = inner.as_ref();
                }
                let base = self.java_type(element)?;
                let base = base.split('<').next().unwrap_or_default();
                Some(format!("new {base}{dims}"))
            }
            Type::Vector(_) | Type::Struct(_) => Some(format!("new {}()", self.java_type(ty)?)),
            Type::TypeDef(id) => match self.coordinator.named_type(*id).typedef_target() {
                Some(target) => self.initializer(target)?,
                None => None,
            },
        })
    }

    fn begin(&self, out: &mut Formatter) {
        out.line(format!("// {GENERATED_BANNER}"))
            .line(format!("// Source: {}", self.file))
            .blank()
            .line(format!("package {};", java_package(self.file)))
            .blank();
    }

    fn types_file(&self, id: TypeId) -> Result<String> {
        let mut out = Formatter::new();
        self.begin(&mut out);
        self.emit_declaration(&mut out, id, false)?;
        Ok(out.finish())
    }

    fn emit_declaration(&self, out: &mut Formatter, id: TypeId, nested: bool) -> Result<()> {
        let named = self.coordinator.named_type(id);
        let modifiers = if nested { "public static final" } else { "public final" };
        match named.kind() {
            DeclKind::Enum => {
                let storage = enum_storage(self.coordinator, id);
                let java = java_primitive(storage);
                let values = hir::enum_values(self.coordinator, id)?;
                out.line(format!("{modifiers} class {} {{", named.name()));
                out.indent();
                for (name, value) in &values {
                    out.line(format!(
                        "public static final {java} {name} = {};",
                        java_literal(storage, *value)
                    ));
                }
                out.blank();
                out.block(
                    format!("public static final String toString({java} o) {{"),
                    "}",
                    |out| {
                        for (name, _) in &values {
                            out.block(format!("if (o == {name}) {{"), "}", |out| {
                                out.line(format!("return \"{name}\";"));
                            });
                        }
                        out.line(format!("return \"0x\" + {}.toHexString(o);", boxed(java)));
                    },
                );
                out.unindent();
                out.line("};").blank();
            }
            DeclKind::Struct => {
                out.line(format!("{modifiers} class {} {{", named.name()));
                out.indent();
                for (child, _) in self.coordinator.ast(id.ast).nested_types(id) {
                    self.emit_declaration(out, child, true)?;
                }
                for field in named.fields() {
                    let ty = self.java_type(&field.ty)?;
                    match self.initializer(&field.ty)? {
                        Some(init) => out.line(format!("public {ty} {} = {init};", field.name)),
                        None => out.line(format!("public {ty} {};", field.name)),
                    };
                }
                out.blank();
                out.line("@Override");
                out.block("public final String toString() {", "}", |out| {
                    out.line("java.lang.StringBuilder builder = new java.lang.StringBuilder();")
                        .line("builder.append(\"{\");");
                    for (index, field) in named.fields().iter().enumerate() {
                        let separator = if index == 0 { "" } else { ", " };
                        out.line(format!("builder.append(\"{separator}.{} = \");", field.name))
                            .line(format!("builder.append(this.{});", field.name));
                    }
                    out.line("builder.append(\"}\");")
                        .line("return builder.toString();");
                });
                out.unindent();
                out.line("};").blank();
            }
            DeclKind::Union => return Err(self.unsupported(&self.qualified(id))),
            DeclKind::TypeDef | DeclKind::Interface => {}
        }
        Ok(())
    }

    fn param(&self, field: &hir::Field) -> Result<String> {
        Ok(format!("{} {}", self.java_type(&field.ty)?, field.name))
    }

    fn params(&self, fields: &[hir::Field]) -> Result<String> {
        let params = fields
            .iter()
            .map(|field| self.param(field))
            .collect::<Result<Vec<_>>>()?;
        Ok(params.join(", "))
    }

    fn emit_method(&self, out: &mut Formatter, method: &Method) -> Result<()> {
        let mut args = self.params(&method.args)?;
        let returns = match method.results.as_slice() {
            [] => "void".to_string(),
            [only] => self.java_type(&only.ty)?,
            results => {
                let values = self.params(results)?;
                out.line("@java.lang.FunctionalInterface");
                out.block(
                    format!("public interface {}Callback {{", method.name),
                    "}",
                    |out| {
                        out.line(format!("public void onValues({values});"));
                    },
                )
                .blank();
                if !args.is_empty() {
                    args.push_str(", ");
                }
                args.push_str(&format!("{}Callback _hidl_cb", method.name));
                "void".to_string()
            }
        };
        out.line(format!(
            "{returns} {}({args})\n    throws android.os.RemoteException;",
            method.name
        ));
        Ok(())
    }

    fn interface_file(&self, iface: TypeId) -> Result<String> {
        let named = self.coordinator.named_type(iface);
        let name = named.name();
        let mut out = Formatter::new();
        self.begin(&mut out);

        let parent = named
            .interface()
            .and_then(|decl| decl.super_interface)
            .map(|parent| self.qualified(parent))
            .unwrap_or_else(|| "android.os.IHwInterface".to_string());
        out.line(format!("public interface {name} extends {parent} {{"));
        out.indent();
        out.line(format!(
            "public static final String kInterfaceName = \"{}\";",
            self.file
        ))
        .blank();

        for (child, _) in self.coordinator.ast(iface.ast).nested_types(iface) {
            self.emit_declaration(&mut out, child, true)?;
        }

        if named.interface().is_some_and(|decl| decl.super_interface.is_none()) {
            out.line("android.os.IHwBinder asBinder();").blank();
        }

        for method in named.interface().map(|decl| decl.methods.as_slice()).unwrap_or_default() {
            self.emit_method(&mut out, method)?;
            out.blank();
        }
        out.unindent();
        out.line("}");
        Ok(out.finish())
    }
}
