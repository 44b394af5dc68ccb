//! C++ bindings.
//!
//! An interface file `IFoo.hal` yields `IFoo.h` (the abstract interface),
//! `IHwFoo.h` (wire helpers), `BnHwFoo.h` / `BpHwFoo.h` (binder stub and
//! proxy), `BsFoo.h` (passthrough wrapper) and `FooAll.cpp`. A `types.hal`
//! yields `types.h`, `hwtypes.h` and `types.cpp`. Files are written below
//! `<out>/<package components>/<M.m>/`.

use std::collections::BTreeSet;

use rustc_hash::FxHashSet;

use crate::base::FqName;
use crate::error::Result;
use crate::hir::{self, Ast, AstId, DeclKind, Field, HandleKind, Method, Primitive, Type, TypeId};
use crate::project::Coordinator;

use super::{
    Formatter, GENERATED_BANNER, GenerationContext, base_name, enum_storage, for_file_or_package,
    parse_checked, strip_typedefs, write_file,
};

pub(super) fn generate_all(target: &FqName, context: &mut GenerationContext<'_>) -> Result<()> {
    for_file_or_package(target, context, all_for_file)
}

pub(super) fn generate_headers(target: &FqName, context: &mut GenerationContext<'_>) -> Result<()> {
    for_file_or_package(target, context, headers_for_file)
}

pub(super) fn generate_sources(target: &FqName, context: &mut GenerationContext<'_>) -> Result<()> {
    for_file_or_package(target, context, sources_for_file)
}

fn all_for_file(file: &FqName, context: &mut GenerationContext<'_>) -> Result<()> {
    headers_for_file(file, context)?;
    sources_for_file(file, context)
}

fn headers_for_file(file: &FqName, context: &mut GenerationContext<'_>) -> Result<()> {
    let id = parse_checked(context.coordinator, file)?;
    let dir = context.output_dir(file.package_and_version_components(false));
    for (name, text) in Cpp::new(context.coordinator, id).headers()? {
        write_file(&dir.join(name), &text)?;
    }
    Ok(())
}

fn sources_for_file(file: &FqName, context: &mut GenerationContext<'_>) -> Result<()> {
    let id = parse_checked(context.coordinator, file)?;
    let dir = context.output_dir(file.package_and_version_components(false));
    let (name, text) = Cpp::new(context.coordinator, id).source()?;
    write_file(&dir.join(name), &text)
}

/// `::android::hardware::foo::V1_0`.
pub(crate) fn namespace(fq_name: &FqName) -> String {
    let mut out = String::new();
    for component in fq_name.package_and_version_components(true) {
        out.push_str("::");
        out.push_str(&component);
    }
    out
}

/// `<android/hardware/foo/1.0/IFoo.h>`.
pub(crate) fn include_path(file: &FqName, header: &str) -> String {
    format!(
        "<{}/{header}>",
        file.package_and_version_components(false).join("/")
    )
}

pub(crate) fn open_namespaces(out: &mut Formatter, fq_name: &FqName) {
    for component in fq_name.package_and_version_components(true) {
        out.line(format!("namespace {component} {{"));
    }
}

pub(crate) fn close_namespaces(out: &mut Formatter, fq_name: &FqName) {
    for component in fq_name.package_and_version_components(true).iter().rev() {
        out.line(format!("}}  // namespace {component}"));
    }
}

/// Enumerator literal with the suffix its storage type needs.
pub(crate) fn literal(storage: Primitive, value: i128) -> String {
    match storage.integer_bits() {
        Some(64) if storage.is_signed() => format!("{value}ll"),
        Some(64) => format!("{value}ull"),
        Some(_) if !storage.is_signed() => format!("{value}u"),
        _ => value.to_string(),
    }
}

/// `int32_t` -> `Int32`, `bool` -> `Bool`: the suffix of parcel accessors.
fn accessor_suffix(primitive: Primitive) -> String {
    let keyword = primitive.keyword().trim_end_matches("_t");
    let mut chars = keyword.chars();
    chars
        .next()
        .map(|first| first.to_ascii_uppercase().to_string() + chars.as_str())
        .unwrap_or_default()
}

fn hash_bytes(hex: &str) -> String {
    hex.as_bytes()
        .chunks(2)
        .map(|pair| format!("0x{}", String::from_utf8_lossy(pair)))
        .collect::<Vec<_>>()
        .join(",")
}

// ============================================================================
// WIRE FORMAT
// ============================================================================

/// How a value crosses the binder boundary.
enum Wire {
    Scalar {
        suffix: String,
        cast: Option<Primitive>,
    },
    Buffer,
    NativeHandle,
    Binder(TypeId),
    Nothing,
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Direction {
    Read,
    Write,
}

impl Direction {
    fn embedded_fn(self) -> &'static str {
        match self {
            Self::Read => "readEmbeddedFromParcel",
            Self::Write => "writeEmbeddedToParcel",
        }
    }
}

/// A parcel as seen from generated code: how to call its methods and how to
/// pass it to helpers.
#[derive(Clone, Copy)]
struct Parcel {
    access: &'static str,
    arg: &'static str,
}

const PROXY_DATA: Parcel = Parcel {
    access: "_hidl_data.",
    arg: "&_hidl_data",
};
const PROXY_REPLY: Parcel = Parcel {
    access: "_hidl_reply.",
    arg: "_hidl_reply",
};
const STUB_DATA: Parcel = Parcel {
    access: "_hidl_data.",
    arg: "_hidl_data",
};
const STUB_REPLY: Parcel = Parcel {
    access: "_hidl_reply->",
    arg: "_hidl_reply",
};

const GOTO_ERROR: &str = "goto _hidl_error;";
const RETURN_ERROR: &str = "return _hidl_err;";
const RETURN_VOID: &str = "return;";

/// IBase methods every derived interface overrides with generated bodies.
const REFLECTION_METHODS: [&str; 3] = ["interfaceChain", "interfaceDescriptor", "getHashChain"];

fn check(on_error: &str) -> String {
    format!("if (_hidl_err != ::android::OK) {{ {on_error} }}")
}

// ============================================================================
// EMISSION
// ============================================================================

pub(crate) struct Cpp<'a> {
    coordinator: &'a Coordinator,
    ast: &'a Ast,
}

impl<'a> Cpp<'a> {
    pub(crate) fn new(coordinator: &'a Coordinator, id: AstId) -> Self {
        Self {
            coordinator,
            ast: coordinator.ast(id),
        }
    }

    fn file(&self) -> &'a FqName {
        self.ast.fq_name()
    }

    fn headers(&self) -> Result<Vec<(String, String)>> {
        let Some(iface) = self.ast.interface() else {
            return Ok(vec![
                ("types.h".to_string(), self.types_header()?),
                ("hwtypes.h".to_string(), self.hw_types_header()),
            ]);
        };
        let name = self.coordinator.named_type(iface).name();
        let base = base_name(self.file());
        Ok(vec![
            (format!("{name}.h"), self.interface_header(iface)?),
            (format!("IHw{base}.h"), self.hw_interface_header(iface)),
            (format!("BnHw{base}.h"), self.stub_header(iface)),
            (format!("BpHw{base}.h"), self.proxy_header(iface)),
            (format!("Bs{base}.h"), self.passthrough_header(iface)),
        ])
    }

    fn source(&self) -> Result<(String, String)> {
        match self.ast.interface() {
            Some(iface) => Ok((
                format!("{}All.cpp", base_name(self.file())),
                self.interface_source(iface)?,
            )),
            None => Ok(("types.cpp".to_string(), self.types_source()?)),
        }
    }

    // ------------------------------------------------------------------------
    // Names and types
    // ------------------------------------------------------------------------

    pub(crate) fn qualified(&self, id: TypeId) -> String {
        let fq_name = self.coordinator.named_type(id).fq_name();
        format!("{}::{}", namespace(fq_name), fq_name.local_name().replace('.', "::"))
    }

    /// Name of a generated class (`BpHw`, `BnHw`, `Bs`) for an interface.
    fn class_name(&self, prefix: &str, iface: TypeId) -> String {
        let fq_name = self.coordinator.named_type(iface).fq_name();
        format!("{}::{prefix}{}", namespace(fq_name), base_name(fq_name))
    }

    pub(crate) fn type_name(&self, ty: &Type) -> String {
        match ty {
            Type::Primitive(Primitive::String) => "::android::hardware::hidl_string".to_string(),
            Type::Primitive(primitive) => primitive.keyword().to_string(),
            Type::Handle(HandleKind::Handle) => "::android::hardware::hidl_handle".to_string(),
            Type::Handle(HandleKind::Memory) => "::android::hardware::hidl_memory".to_string(),
            Type::Handle(HandleKind::Pointer) => "void*".to_string(),
            Type::Array { .. } => {
                let mut dims = Vec::new();
                let mut element = ty;
                while let Type::Array { element: inner, len } = element {
                    dims.push(len.to_string());
                    element = inner.as_ref();
                }
                format!(
                    "::android::hardware::hidl_array<{}, {}>",
                    self.type_name(element),
                    dims.join(", ")
                )
            }
            Type::Vector(element) => {
                format!("::android::hardware::hidl_vec<{}>", self.type_name(element))
            }
            Type::TypeDef(id) | Type::Enum(id) | Type::Struct(id) | Type::Union(id) => {
                self.qualified(*id)
            }
            Type::Interface(id) => format!("::android::sp<{}>", self.qualified(*id)),
        }
    }

    /// Passed by value rather than by const reference.
    pub(crate) fn is_scalar(&self, ty: &Type) -> bool {
        match strip_typedefs(self.coordinator, ty) {
            Type::Primitive(primitive) => !matches!(primitive, Primitive::String | Primitive::Void),
            Type::Handle(kind) => *kind == HandleKind::Pointer,
            Type::Enum(_) => true,
            Type::Array { .. }
            | Type::Vector(_)
            | Type::TypeDef(_)
            | Type::Struct(_)
            | Type::Union(_)
            | Type::Interface(_) => false,
        }
    }

    /// Whether a value owns out-of-line data that travels in child buffers.
    fn needs_embedded(&self, ty: &Type) -> bool {
        self.needs_embedded_in(ty, &mut FxHashSet::default())
    }

    fn needs_embedded_in(&self, ty: &Type, seen: &mut FxHashSet<TypeId>) -> bool {
        match ty {
            Type::Primitive(primitive) => *primitive == Primitive::String,
            Type::Handle(kind) => *kind != HandleKind::Pointer,
            Type::Array { element, .. } => self.needs_embedded_in(element, seen),
            Type::Vector(_) => true,
            Type::TypeDef(id) => self
                .coordinator
                .named_type(*id)
                .typedef_target()
                .is_some_and(|target| self.needs_embedded_in(target, seen)),
            Type::Struct(id) => {
                seen.insert(*id)
                    && self
                        .coordinator
                        .named_type(*id)
                        .fields()
                        .iter()
                        .any(|field| self.needs_embedded_in(&field.ty, seen))
            }
            Type::Enum(_) | Type::Union(_) | Type::Interface(_) => false,
        }
    }

    fn wire(&self, ty: &Type) -> Wire {
        match strip_typedefs(self.coordinator, ty) {
            Type::Primitive(Primitive::Void) => Wire::Nothing,
            Type::Primitive(Primitive::String) => Wire::Buffer,
            Type::Primitive(primitive) => Wire::Scalar {
                suffix: accessor_suffix(*primitive),
                cast: None,
            },
            Type::Enum(id) => {
                let storage = enum_storage(self.coordinator, *id);
                Wire::Scalar {
                    suffix: accessor_suffix(storage),
                    cast: Some(storage),
                }
            }
            Type::Handle(HandleKind::Handle) => Wire::NativeHandle,
            Type::Handle(HandleKind::Memory | HandleKind::Pointer)
            | Type::Array { .. }
            | Type::Vector(_)
            | Type::Struct(_)
            | Type::Union(_) => Wire::Buffer,
            Type::Interface(id) => Wire::Binder(*id),
            Type::TypeDef(_) => Wire::Nothing,
        }
    }

    // ------------------------------------------------------------------------
    // Methods
    // ------------------------------------------------------------------------

    /// Every method an interface answers, root interface first, with the
    /// interface that declares it.
    pub(crate) fn chain_methods(&self, iface: TypeId) -> Vec<(TypeId, &'a Method)> {
        let coordinator = self.coordinator;
        coordinator
            .super_chain(iface)
            .into_iter()
            .rev()
            .flat_map(move |link| {
                coordinator
                    .named_type(link)
                    .interface()
                    .into_iter()
                    .flat_map(move |decl| decl.methods.iter().map(move |m| (link, m)))
            })
            .collect()
    }

    fn own_methods(&self, iface: TypeId) -> &'a [Method] {
        self.coordinator
            .named_type(iface)
            .interface()
            .map(|decl| decl.methods.as_slice())
            .unwrap_or_default()
    }

    pub(crate) fn is_root(&self, iface: TypeId) -> bool {
        self.coordinator
            .named_type(iface)
            .interface()
            .is_none_or(|decl| decl.super_interface.is_none())
    }

    /// A method of the root interface, found by name.
    fn root_method(&self, iface: TypeId, name: &str) -> Option<(TypeId, &'a Method)> {
        let root = *self.coordinator.super_chain(iface).last()?;
        self.own_methods(root)
            .iter()
            .find(|m| m.name == name)
            .map(|m| (root, m))
    }

    pub(crate) fn elided_result<'m>(&self, method: &'m Method) -> Option<&'m Field> {
        match method.results.as_slice() {
            [only] if self.is_scalar(&only.ty) => Some(only),
            _ => None,
        }
    }

    fn needs_callback(&self, method: &Method) -> bool {
        !method.results.is_empty() && self.elided_result(method).is_none()
    }

    pub(crate) fn return_type(&self, method: &Method) -> String {
        match self.elided_result(method) {
            Some(result) => format!("::android::hardware::Return<{}>", self.type_name(&result.ty)),
            None => "::android::hardware::Return<void>".to_string(),
        }
    }

    fn param(&self, ty: &Type, name: &str) -> String {
        if self.is_scalar(ty) {
            format!("{} {name}", self.type_name(ty))
        } else {
            format!("const {}& {name}", self.type_name(ty))
        }
    }

    fn params(&self, declaring: TypeId, method: &Method) -> String {
        let mut params: Vec<String> = method
            .args
            .iter()
            .map(|arg| self.param(&arg.ty, &arg.name))
            .collect();
        if self.needs_callback(method) {
            params.push(format!(
                "{}::{}_cb _hidl_cb",
                self.qualified(declaring),
                method.name
            ));
        }
        params.join(", ")
    }

    pub(crate) fn signature(&self, declaring: TypeId, method: &Method, qualifier: &str) -> String {
        format!(
            "{} {qualifier}{}({})",
            self.return_type(method),
            method.name,
            self.params(declaring, method)
        )
    }

    fn call_args(&self, method: &Method) -> String {
        let mut args: Vec<&str> = method.args.iter().map(|arg| arg.name.as_str()).collect();
        if self.needs_callback(method) {
            args.push("_hidl_cb");
        }
        args.join(", ")
    }

    fn callback_typedef(&self, method: &Method) -> String {
        let params: Vec<String> = method
            .results
            .iter()
            .map(|result| self.param(&result.ty, &result.name))
            .collect();
        format!(
            "using {}_cb = std::function<void({})>;",
            method.name,
            params.join(", ")
        )
    }

    // ------------------------------------------------------------------------
    // File scaffolding
    // ------------------------------------------------------------------------

    fn guard(&self, name: &str) -> String {
        format!(
            "HIDL_GENERATED_{}_{}_H",
            self.file().token_name().to_uppercase(),
            name.to_uppercase()
        )
    }

    fn begin_header(&self, out: &mut Formatter, name: &str) {
        let guard = self.guard(name);
        out.line(format!("// {GENERATED_BANNER}"))
            .line(format!("// Source: {}", self.file()))
            .blank()
            .line(format!("#ifndef {guard}"))
            .line(format!("#define {guard}"))
            .blank();
    }

    fn end_header(&self, out: &mut Formatter, name: &str) {
        out.line(format!("#endif  // {}", self.guard(name)));
    }

    /// Files referenced by this one, plus the super interface's file.
    fn dependencies(&self) -> BTreeSet<FqName> {
        let own = self.file();
        let mut files: BTreeSet<FqName> = self
            .ast
            .imported_names()
            .iter()
            .map(FqName::file_name)
            .filter(|file| file != own)
            .collect();
        if let Some(parent) = self
            .ast
            .interface()
            .and_then(|iface| self.coordinator.named_type(iface).interface())
            .and_then(|decl| decl.super_interface)
        {
            files.insert(self.coordinator.named_type(parent).fq_name().file_name());
        }
        files
    }

    // ------------------------------------------------------------------------
    // Declarations
    // ------------------------------------------------------------------------

    fn emit_declaration(&self, out: &mut Formatter, id: TypeId) -> Result<()> {
        let named = self.coordinator.named_type(id);
        match named.kind() {
            DeclKind::Enum => {
                let storage = enum_storage(self.coordinator, id);
                let values = hir::enum_values(self.coordinator, id)?;
                out.block(
                    format!("enum class {} : {} {{", named.name(), storage.keyword()),
                    "};",
                    |out| {
                        for (name, value) in &values {
                            out.line(format!("{name} = {},", literal(storage, *value)));
                        }
                    },
                );
            }
            DeclKind::Struct | DeclKind::Union => {
                out.line(format!("{} {} final {{", named.kind().keyword(), named.name()));
                out.indent();
                for (child, _) in self.coordinator.ast(id.ast).nested_types(id) {
                    self.emit_declaration(out, child)?;
                    out.blank();
                }
                for field in named.fields() {
                    out.line(format!("{} {};", self.type_name(&field.ty), field.name));
                }
                out.unindent();
                out.line("};");
            }
            DeclKind::TypeDef => {
                if let Some(target) = named.typedef_target() {
                    out.line(format!("typedef {} {};", self.type_name(target), named.name()));
                }
            }
            DeclKind::Interface => {
                out.line(format!("struct {};", named.name()));
            }
        }
        Ok(())
    }

    /// `toString` declarations for every value type of the file.
    fn emit_to_string_decls(&self, out: &mut Formatter) {
        for (id, named) in self.ast.types() {
            match named.kind() {
                DeclKind::Enum => {
                    out.line(format!("std::string toString({} o);", self.qualified(id)));
                }
                DeclKind::Struct | DeclKind::Union => {
                    out.line(format!("std::string toString(const {}& o);", self.qualified(id)));
                }
                DeclKind::TypeDef | DeclKind::Interface => {}
            }
        }
    }

    fn emit_to_string(&self, out: &mut Formatter, id: TypeId) -> Result<()> {
        let named = self.coordinator.named_type(id);
        let qualified = self.qualified(id);
        match named.kind() {
            DeclKind::Enum => {
                let storage = enum_storage(self.coordinator, id);
                let values = hir::enum_values(self.coordinator, id)?;
                out.block(format!("std::string toString({qualified} o) {{"), "}", |out| {
                    out.line("using ::android::hardware::details::toHexString;");
                    for (name, _) in &values {
                        out.block(format!("if (o == {qualified}::{name}) {{"), "}", |out| {
                            out.line(format!("return \"{name}\";"));
                        });
                    }
                    out.line("std::string os;")
                        .line(format!(
                            "os += toHexString(static_cast<{}>(o));",
                            storage.keyword()
                        ))
                        .line("return os;");
                });
                out.blank();
            }
            DeclKind::Struct | DeclKind::Union => {
                out.block(
                    format!("std::string toString(const {qualified} &o) {{"),
                    "}",
                    |out| {
                        out.line("using ::android::hardware::toString;")
                            .line("std::string os;")
                            .line("os += \"{\";");
                        for (index, field) in named.fields().iter().enumerate() {
                            let separator = if index == 0 { "" } else { ", " };
                            out.line(format!("os += \"{separator}.{} = \";", field.name))
                                .line(format!("os += toString(o.{});", field.name));
                        }
                        out.line("os += \"}\";").line("return os;");
                    },
                );
                out.blank();
            }
            DeclKind::TypeDef | DeclKind::Interface => {}
        }
        Ok(())
    }

    fn embedded_types(&self) -> Vec<TypeId> {
        self.ast
            .types()
            .filter(|(id, named)| {
                matches!(named.kind(), DeclKind::Struct | DeclKind::Union)
                    && self.needs_embedded(&Type::named(named.kind(), *id))
            })
            .map(|(id, _)| id)
            .collect()
    }

    fn embedded_signature(&self, direction: Direction, id: TypeId) -> String {
        let parcel = match direction {
            Direction::Read => "const ::android::hardware::Parcel &parcel",
            Direction::Write => "::android::hardware::Parcel *parcel",
        };
        format!(
            "::android::status_t {}(const {} &obj, {parcel}, size_t parentHandle, size_t parentOffset)",
            direction.embedded_fn(),
            self.qualified(id)
        )
    }

    fn emit_embedded_decls(&self, out: &mut Formatter) {
        for id in self.embedded_types() {
            out.line(format!("{};", self.embedded_signature(Direction::Read, id)))
                .blank()
                .line(format!("{};", self.embedded_signature(Direction::Write, id)))
                .blank();
        }
    }

    fn emit_embedded_defs(&self, out: &mut Formatter) {
        for id in self.embedded_types() {
            let qualified = self.qualified(id);
            for direction in [Direction::Read, Direction::Write] {
                out.line(format!("{} {{", self.embedded_signature(direction, id)));
                out.indent();
                out.line("::android::status_t _hidl_err = ::android::OK;").blank();
                for field in self.coordinator.named_type(id).fields() {
                    if !self.needs_embedded(&field.ty) {
                        continue;
                    }
                    self.emit_embedded(
                        out,
                        direction,
                        &field.ty,
                        &format!("obj.{}", field.name),
                        "parcel",
                        "parentHandle",
                        &format!("parentOffset + offsetof({qualified}, {})", field.name),
                        RETURN_ERROR,
                        0,
                    );
                }
                out.line("return _hidl_err;");
                out.unindent();
                out.line("}").blank();
            }
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn emit_embedded(
        &self,
        out: &mut Formatter,
        direction: Direction,
        ty: &Type,
        expr: &str,
        parcel: &str,
        handle: &str,
        offset: &str,
        on_error: &str,
        depth: usize,
    ) {
        let call = |out: &mut Formatter, qualifier: &str| {
            out.line(format!(
                "_hidl_err = {qualifier}{}({expr}, {parcel}, {handle}, {offset});",
                direction.embedded_fn()
            ))
            .line(check(on_error));
        };
        match strip_typedefs(self.coordinator, ty) {
            Type::Primitive(Primitive::String) | Type::Handle(HandleKind::Handle | HandleKind::Memory) => {
                call(out, "::android::hardware::");
            }
            Type::Struct(id) if self.needs_embedded(ty) => {
                let fq_name = self.coordinator.named_type(*id).fq_name();
                call(out, &format!("{}::", namespace(fq_name)));
            }
            Type::Array { element, len } => {
                let index = format!("_hidl_index_{depth}");
                out.block(
                    format!("for (size_t {index} = 0; {index} < {len}; ++{index}) {{"),
                    "}",
                    |out| {
                        self.emit_embedded(
                            out,
                            direction,
                            element,
                            &format!("{expr}[{index}]"),
                            parcel,
                            handle,
                            &format!("{offset} + {index} * sizeof({})", self.type_name(element)),
                            on_error,
                            depth + 1,
                        );
                    },
                );
            }
            Type::Vector(element) => {
                let child = format!("_hidl_child_{depth}");
                out.block("{", "}", |out| {
                    out.line(format!("size_t {child};")).line(format!(
                        "_hidl_err = ::android::hardware::{}({expr}, {parcel}, {handle}, {offset}, &{child});",
                        direction.embedded_fn()
                    ));
                    out.line(check(on_error));
                    if self.needs_embedded(element) {
                        let index = format!("_hidl_index_{depth}");
                        out.block(
                            format!("for (size_t {index} = 0; {index} < {expr}.size(); ++{index}) {{"),
                            "}",
                            |out| {
                                self.emit_embedded(
                                    out,
                                    direction,
                                    element,
                                    &format!("{expr}[{index}]"),
                                    parcel,
                                    &child,
                                    &format!("{index} * sizeof({})", self.type_name(element)),
                                    on_error,
                                    depth + 1,
                                );
                            },
                        );
                    }
                });
            }
            Type::Primitive(_)
            | Type::Handle(_)
            | Type::TypeDef(_)
            | Type::Enum(_)
            | Type::Struct(_)
            | Type::Union(_)
            | Type::Interface(_) => {}
        }
    }

    fn emit_write(&self, out: &mut Formatter, parcel: Parcel, ty: &Type, expr: &str, on_error: &str) {
        let access = parcel.access;
        match self.wire(ty) {
            Wire::Nothing => return,
            Wire::Scalar { suffix, cast: None } => {
                out.line(format!("_hidl_err = {access}write{suffix}({expr});"));
            }
            Wire::Scalar {
                suffix,
                cast: Some(storage),
            } => {
                out.line(format!(
                    "_hidl_err = {access}write{suffix}(static_cast<{}>({expr}));",
                    storage.keyword()
                ));
            }
            Wire::NativeHandle => {
                out.line(format!("_hidl_err = {access}writeNativeHandleNoDup({expr});"));
            }
            Wire::Binder(iface) => {
                out.line(format!(
                    "_hidl_err = {access}writeStrongBinder(::android::hardware::toBinder<{}>({expr}));",
                    self.qualified(iface)
                ));
            }
            Wire::Buffer => {
                let handle = format!("_hidl_{expr}_parent");
                out.line(format!("size_t {handle};")).line(format!(
                    "_hidl_err = {access}writeBuffer(&{expr}, sizeof({expr}), &{handle});"
                ));
                if self.needs_embedded(ty) {
                    out.line(check(on_error));
                    self.emit_embedded(
                        out,
                        Direction::Write,
                        ty,
                        expr,
                        parcel.arg,
                        &handle,
                        "0 /* parentOffset */",
                        on_error,
                        0,
                    );
                }
            }
        }
        out.line(check(on_error)).blank();
    }

    /// Read into `var`, which is already declared.
    fn emit_read(&self, out: &mut Formatter, parcel: Parcel, ty: &Type, var: &str, on_error: &str) {
        let access = parcel.access;
        match self.wire(ty) {
            Wire::Nothing => return,
            Wire::Scalar { suffix, cast: None } => {
                out.line(format!("_hidl_err = {access}read{suffix}(&{var});"));
            }
            Wire::Scalar {
                suffix,
                cast: Some(storage),
            } => {
                out.line(format!(
                    "_hidl_err = {access}read{suffix}(reinterpret_cast<{} *>(&{var}));",
                    storage.keyword()
                ));
            }
            Wire::NativeHandle => {
                out.line(format!("const native_handle_t *_hidl_{var}_ptr;"))
                    .line(format!(
                        "_hidl_err = {access}readNullableNativeHandleNoDup(&_hidl_{var}_ptr);"
                    ))
                    .line(check(on_error))
                    .line(format!("{var} = _hidl_{var}_ptr;"));
            }
            Wire::Binder(iface) => {
                out.line(format!(
                    "::android::sp<::android::hardware::IBinder> _hidl_{var}_binder;"
                ))
                .line(format!(
                    "_hidl_err = {access}readNullableStrongBinder(&_hidl_{var}_binder);"
                ))
                .line(check(on_error))
                .line(format!(
                    "{var} = ::android::hardware::fromBinder<{}, {}, {}>(_hidl_{var}_binder);",
                    self.qualified(iface),
                    self.class_name("BpHw", iface),
                    self.class_name("BnHw", iface)
                ));
            }
            Wire::Buffer => {
                let pointer = format!("_hidl_{var}_ptr");
                let handle = format!("_hidl_{var}_parent");
                out.line(format!("const {} *{pointer};", self.type_name(ty)))
                    .line(format!("size_t {handle};"))
                    .line(format!(
                        "_hidl_err = {access}readBuffer(sizeof(*{pointer}), &{handle}, reinterpret_cast<const void **>(&{pointer}));"
                    ))
                    .line(check(on_error));
                if self.needs_embedded(ty) {
                    self.emit_embedded(
                        out,
                        Direction::Read,
                        ty,
                        &format!("*{pointer}"),
                        parcel.arg,
                        &handle,
                        "0 /* parentOffset */",
                        on_error,
                        0,
                    );
                }
                out.line(format!("{var} = *{pointer};")).blank();
                return;
            }
        }
        out.line(check(on_error)).blank();
    }

    // ------------------------------------------------------------------------
    // Headers
    // ------------------------------------------------------------------------

    fn types_header(&self) -> Result<String> {
        let mut out = Formatter::new();
        self.begin_header(&mut out, "types");
        for file in self.dependencies() {
            out.line(format!("#include {}", include_path(&file, &format!("{}.h", file.simple_name()))));
        }
        out.line("#include <hidl/HidlSupport.h>")
            .line("#include <hidl/MQDescriptor.h>")
            .line("#include <utils/NativeHandle.h>")
            .line("#include <utils/misc.h>")
            .blank();
        open_namespaces(&mut out, self.file());
        out.blank();
        for (id, _) in self.ast.top_level_types() {
            self.emit_declaration(&mut out, id)?;
            out.blank();
        }
        self.emit_to_string_decls(&mut out);
        out.blank();
        close_namespaces(&mut out, self.file());
        out.blank();
        self.end_header(&mut out, "types");
        Ok(out.finish())
    }

    fn hw_include(&self, out: &mut Formatter) {
        for file in self.dependencies() {
            if file.is_types_file() {
                out.line(format!("#include {}", include_path(&file, "hwtypes.h")));
            } else {
                let base = base_name(&file);
                out.line(format!("#include {}", include_path(&file, &format!("BnHw{base}.h"))))
                    .line(format!("#include {}", include_path(&file, &format!("BpHw{base}.h"))));
            }
        }
    }

    fn hw_types_header(&self) -> String {
        let mut out = Formatter::new();
        self.begin_header(&mut out, "hwtypes");
        out.line(format!("#include {}", include_path(self.file(), "types.h")));
        self.hw_include(&mut out);
        out.blank()
            .line("#include <hidl/Status.h>")
            .line("#include <hwbinder/IBinder.h>")
            .line("#include <hwbinder/Parcel.h>")
            .blank();
        open_namespaces(&mut out, self.file());
        out.blank();
        self.emit_embedded_decls(&mut out);
        close_namespaces(&mut out, self.file());
        out.blank();
        self.end_header(&mut out, "hwtypes");
        out.finish()
    }

    fn interface_header(&self, iface: TypeId) -> Result<String> {
        let named = self.coordinator.named_type(iface);
        let name = named.name();
        let mut out = Formatter::new();
        self.begin_header(&mut out, name);

        for file in self.dependencies() {
            out.line(format!("#include {}", include_path(&file, &format!("{}.h", file.simple_name()))));
        }
        out.blank()
            .line("#include <hidl/HidlSupport.h>")
            .line("#include <hidl/MQDescriptor.h>")
            .line("#include <hidl/Status.h>")
            .line("#include <utils/NativeHandle.h>")
            .line("#include <utils/misc.h>")
            .blank();
        open_namespaces(&mut out, self.file());
        out.blank();

        let super_interface = named.interface().and_then(|decl| decl.super_interface);
        match super_interface {
            Some(parent) => out.line(format!("struct {name} : public {} {{", self.qualified(parent))),
            None => out.line(format!("struct {name} : virtual public ::android::RefBase {{")),
        };
        out.indent();
        out.line("static const char* descriptor;").blank();

        for (child, _) in self.ast.nested_types(iface) {
            self.emit_declaration(&mut out, child)?;
            out.blank();
        }

        out.line(format!(
            "virtual bool isRemote() const{} {{ return false; }}",
            if super_interface.is_some() { " override" } else { "" }
        ))
        .blank();

        for method in self.own_methods(iface) {
            if self.needs_callback(method) {
                out.line(self.callback_typedef(method));
            }
            out.line(format!("virtual {} = 0;", self.signature(iface, method, "")))
                .blank();
        }

        if super_interface.is_some() {
            for reflection in REFLECTION_METHODS {
                if let Some((root, method)) = self.root_method(iface, reflection) {
                    out.line(format!("virtual {} override;", self.signature(root, method, "")));
                }
            }
            out.blank();
        }

        out.line(format!(
            "static ::android::hardware::Return<::android::sp<{name}>> castFrom(const ::android::sp<{name}>& parent, bool emitError = false);"
        ))
        .blank()
        .line(format!(
            "static ::android::sp<{name}> getService(const std::string &serviceName=\"default\", bool getStub=false);"
        ))
        .line("::android::status_t registerAsService(const std::string &serviceName=\"default\");");
        out.unindent();
        out.line("};").blank();

        self.emit_to_string_decls(&mut out);
        out.line(format!("std::string toString(const ::android::sp<{name}>& o);"))
            .blank();
        close_namespaces(&mut out, self.file());
        out.blank();
        self.end_header(&mut out, name);
        Ok(out.finish())
    }

    fn hw_interface_header(&self, iface: TypeId) -> String {
        let name = self.coordinator.named_type(iface).name();
        let header = format!("IHw{}", base_name(self.file()));
        let mut out = Formatter::new();
        self.begin_header(&mut out, &header);
        out.line(format!("#include {}", include_path(self.file(), &format!("{name}.h"))))
            .blank();
        self.hw_include(&mut out);
        out.blank()
            .line("#include <hidl/Status.h>")
            .line("#include <hwbinder/IBinder.h>")
            .line("#include <hwbinder/Parcel.h>")
            .blank();
        open_namespaces(&mut out, self.file());
        out.blank();
        self.emit_embedded_decls(&mut out);
        close_namespaces(&mut out, self.file());
        out.blank();
        self.end_header(&mut out, &header);
        out.finish()
    }

    fn stub_header(&self, iface: TypeId) -> String {
        let name = self.coordinator.named_type(iface).name();
        let stub = format!("BnHw{}", base_name(self.file()));
        let mut out = Formatter::new();
        self.begin_header(&mut out, &stub);
        out.line(format!(
            "#include {}",
            include_path(self.file(), &format!("IHw{}.h", base_name(self.file())))
        ))
        .blank();
        open_namespaces(&mut out, self.file());
        out.blank();

        let base_class = if self.is_root(iface) {
            "::android::hardware::BHwBinder"
        } else {
            "::android::hidl::base::V1_0::BnHwBase"
        };
        out.line(format!("struct {stub} : public {base_class} {{"));
        out.indent();
        out.line(format!("explicit {stub}(const ::android::sp<{name}> &_hidl_impl);"))
            .blank()
            .line(format!("virtual ~{stub}();"))
            .blank()
            .line("::android::status_t onTransact(uint32_t _hidl_code, const ::android::hardware::Parcel &_hidl_data, ::android::hardware::Parcel *_hidl_reply, uint32_t _hidl_flags = 0, TransactCallback _hidl_cb = nullptr) override;")
            .blank()
            .line(format!("::android::sp<{name}> getImpl() {{ return _hidl_mImpl; }}"))
            .blank();
        for method in self.own_methods(iface) {
            out.line(format!(
                "static ::android::status_t _hidl_{}(::android::hidl::base::V1_0::BnHwBase* _hidl_this, const ::android::hardware::Parcel &_hidl_data, ::android::hardware::Parcel *_hidl_reply, TransactCallback _hidl_cb);",
                method.name
            ));
        }
        out.unindent();
        out.line("private:");
        out.indented(|out| {
            out.line(format!("::android::sp<{name}> _hidl_mImpl;"));
        });
        out.line("};").blank();
        close_namespaces(&mut out, self.file());
        out.blank();
        self.end_header(&mut out, &stub);
        out.finish()
    }

    fn proxy_header(&self, iface: TypeId) -> String {
        let name = self.coordinator.named_type(iface).name();
        let proxy = format!("BpHw{}", base_name(self.file()));
        let mut out = Formatter::new();
        self.begin_header(&mut out, &proxy);
        out.line("#include <hidl/HidlTransportSupport.h>")
            .blank()
            .line(format!(
                "#include {}",
                include_path(self.file(), &format!("IHw{}.h", base_name(self.file())))
            ))
            .blank();
        open_namespaces(&mut out, self.file());
        out.blank();
        out.line(format!(
            "struct {proxy} : public ::android::hardware::BpInterface<{name}>, public ::android::hardware::details::HidlInstrumentor {{"
        ));
        out.indent();
        out.line(format!(
            "explicit {proxy}(const ::android::sp<::android::hardware::IBinder> &_hidl_impl);"
        ))
        .blank()
        .line("virtual bool isRemote() const override { return true; }")
        .blank();
        let mut current = None;
        for (declaring, method) in self.chain_methods(iface) {
            if current != Some(declaring) {
                current = Some(declaring);
                out.line(format!(
                    "// Methods from {} follow.",
                    self.coordinator.named_type(declaring).fq_name()
                ));
            }
            out.line(format!("{} override;", self.signature(declaring, method, "")));
        }
        out.unindent();
        out.line("};").blank();
        close_namespaces(&mut out, self.file());
        out.blank();
        self.end_header(&mut out, &proxy);
        out.finish()
    }

    fn passthrough_header(&self, iface: TypeId) -> String {
        let name = self.coordinator.named_type(iface).name();
        let passthrough = format!("Bs{}", base_name(self.file()));
        let mut out = Formatter::new();
        self.begin_header(&mut out, &passthrough);
        out.line("#include <android-base/macros.h>")
            .line("#include <cutils/trace.h>")
            .line("#include <future>")
            .line(format!("#include {}", include_path(self.file(), &format!("{name}.h"))))
            .blank()
            .line("#include <hidl/HidlPassthroughSupport.h>")
            .line("#include <hidl/TaskRunner.h>")
            .blank();
        open_namespaces(&mut out, self.file());
        out.blank();
        out.line(format!(
            "struct {passthrough} : {name}, ::android::hardware::details::HidlInstrumentor {{"
        ));
        out.indent();
        out.line(format!("explicit {passthrough}(const ::android::sp<{name}> impl);"))
            .blank();
        for (declaring, method) in self.chain_methods(iface) {
            out.block(
                format!("{} override {{", self.signature(declaring, method, "")),
                "}",
                |out| {
                    out.line(format!("return mImpl->{}({});", method.name, self.call_args(method)));
                },
            );
        }
        out.blank();
        out.unindent();
        out.line("private:");
        out.indented(|out| {
            out.line(format!("const ::android::sp<{name}> mImpl;"));
        });
        out.line("};").blank();
        close_namespaces(&mut out, self.file());
        out.blank();
        self.end_header(&mut out, &passthrough);
        out.finish()
    }

    // ------------------------------------------------------------------------
    // Sources
    // ------------------------------------------------------------------------

    fn types_source(&self) -> Result<String> {
        let mut out = Formatter::new();
        out.line(format!("#define LOG_TAG \"{}\"", self.file()))
            .blank()
            .line("#include <log/log.h>")
            .line("#include <cutils/trace.h>")
            .line("#include <hidl/HidlTransportSupport.h>")
            .blank()
            .line("#include <hidl/Static.h>")
            .line("#include <hwbinder/ProcessState.h>")
            .line(format!("#include {}", include_path(self.file(), "hwtypes.h")))
            .blank();
        open_namespaces(&mut out, self.file());
        out.blank();
        for (id, _) in self.ast.types() {
            self.emit_to_string(&mut out, id)?;
        }
        self.emit_embedded_defs(&mut out);
        close_namespaces(&mut out, self.file());
        Ok(out.finish())
    }

    fn interface_source(&self, iface: TypeId) -> Result<String> {
        let named = self.coordinator.named_type(iface);
        let name = named.name();
        let base = base_name(self.file());
        let proxy = format!("BpHw{base}");
        let stub = format!("BnHw{base}");
        let passthrough = format!("Bs{base}");
        let package = self.file().package_and_version();

        let mut out = Formatter::new();
        out.line(format!("#define LOG_TAG \"{}\"", self.file()))
            .blank()
            .line("#include <android/log.h>")
            .line("#include <cutils/trace.h>")
            .line("#include <hidl/HidlTransportSupport.h>")
            .blank();
        for header in [&proxy, &stub, &passthrough] {
            out.line(format!("#include {}", include_path(self.file(), &format!("{header}.h"))));
        }
        out.line("#include <hidl/Static.h>")
            .line("#include <hwbinder/ProcessState.h>")
            .line("#include <utils/Trace.h>")
            .blank();
        open_namespaces(&mut out, self.file());
        out.blank();

        out.line(format!("const char* {name}::descriptor(\"{}\");", self.file()))
            .blank();

        if !self.is_root(iface) {
            self.emit_reflection(&mut out, iface);
        }

        out.block(
            format!(
                "::android::hardware::Return<::android::sp<{name}>> {name}::castFrom(const ::android::sp<{name}>& parent, bool /* emitError */) {{"
            ),
            "}",
            |out| {
                out.line("return parent;");
            },
        )
        .blank();

        // Proxy.
        out.line(format!(
            "{proxy}::{proxy}(const ::android::sp<::android::hardware::IBinder> &_hidl_impl)"
        ))
        .indented(|out| {
            out.line(format!(
                ": BpInterface<{name}>(_hidl_impl), ::android::hardware::details::HidlInstrumentor(\"{package}\", \"{name}\") {{"
            ));
        })
        .line("}")
        .blank();
        for (code, (declaring, method)) in self.chain_methods(iface).into_iter().enumerate() {
            self.emit_proxy_method(&mut out, &proxy, declaring, method, code + 1);
        }

        // Stub.
        out.line(format!("{stub}::{stub}(const ::android::sp<{name}> &_hidl_impl)"))
            .indented(|out| {
                out.line(": _hidl_mImpl(_hidl_impl) {");
            })
            .line("}")
            .blank()
            .line(format!("{stub}::~{stub}() {{"))
            .line("}")
            .blank();
        for method in self.own_methods(iface) {
            self.emit_stub_handler(&mut out, &stub, iface, method);
        }
        self.emit_on_transact(&mut out, &stub, iface);

        // Passthrough.
        out.line(format!("{passthrough}::{passthrough}(const ::android::sp<{name}> impl)"))
            .indented(|out| {
                out.line(format!(
                    ": ::android::hardware::details::HidlInstrumentor(\"{package}\", \"{name}\"), mImpl(impl) {{"
                ));
            })
            .line("}")
            .blank();

        out.block(
            format!(
                "::android::sp<{name}> {name}::getService(const std::string &serviceName, const bool getStub) {{"
            ),
            "}",
            |out| {
                out.line(format!(
                    "return ::android::hardware::details::getServiceInternal<{proxy}>(serviceName, true, getStub);"
                ));
            },
        )
        .blank()
        .block(
            format!("::android::status_t {name}::registerAsService(const std::string &serviceName) {{"),
            "}",
            |out| {
                out.line("return ::android::hardware::details::registerAsServiceInternal(this, serviceName);");
            },
        )
        .blank();

        for (id, _) in self.ast.types() {
            self.emit_to_string(&mut out, id)?;
        }
        out.block(
            format!("std::string toString(const ::android::sp<{name}>& o) {{"),
            "}",
            |out| {
                out.line("std::string os = \"[class or subclass of \";")
                    .line(format!("os += {name}::descriptor;"))
                    .line("os += \"]\";")
                    .line("os += o->isRemote() ? \"@remote\" : \"@local\";")
                    .line("return os;");
            },
        )
        .blank();
        self.emit_embedded_defs(&mut out);
        close_namespaces(&mut out, self.file());
        Ok(out.finish())
    }

    /// Generated bodies of `interfaceChain`, `interfaceDescriptor` and
    /// `getHashChain`.
    fn emit_reflection(&self, out: &mut Formatter, iface: TypeId) {
        let name = self.coordinator.named_type(iface).name();
        let chain = self.coordinator.super_chain(iface);
        for reflection in REFLECTION_METHODS {
            let Some((root, method)) = self.root_method(iface, reflection) else {
                continue;
            };
            out.line(format!("{} {{", self.signature(root, method, &format!("{name}::"))));
            out.indent();
            match reflection {
                "interfaceChain" => {
                    out.block("_hidl_cb({", "});", |out| {
                        for link in &chain {
                            out.line(format!("{}::descriptor,", self.qualified(*link)));
                        }
                    });
                }
                "interfaceDescriptor" => {
                    out.line(format!("_hidl_cb({name}::descriptor);"));
                }
                _ => {
                    out.block("_hidl_cb({", "});", |out| {
                        for link in &chain {
                            let hash = self.coordinator.ast(link.ast).content_hash();
                            out.line(format!(
                                "(uint8_t[32]){{{}}} /* {hash} */,",
                                hash_bytes(hash)
                            ));
                        }
                    });
                }
            }
            out.line("return ::android::hardware::Void();");
            out.unindent();
            out.line("}").blank();
        }
    }

    fn emit_proxy_method(
        &self,
        out: &mut Formatter,
        proxy: &str,
        declaring: TypeId,
        method: &Method,
        code: usize,
    ) {
        out.line(format!("{} {{", self.signature(declaring, method, &format!("{proxy}::"))));
        out.indent();
        out.line("::android::hardware::Parcel _hidl_data;")
            .line("::android::hardware::Parcel _hidl_reply;")
            .line("::android::status_t _hidl_err;")
            .line("::android::hardware::Status _hidl_status;");
        for result in &method.results {
            out.line(format!("{} _hidl_out_{};", self.type_name(&result.ty), result.name));
        }
        out.blank()
            .line(format!(
                "_hidl_err = _hidl_data.writeInterfaceToken({}::descriptor);",
                self.qualified(declaring)
            ))
            .line(check(GOTO_ERROR))
            .blank();
        for arg in &method.args {
            self.emit_write(out, PROXY_DATA, &arg.ty, &arg.name, GOTO_ERROR);
        }

        let flags = if method.oneway {
            "::android::hardware::IBinder::FLAG_ONEWAY"
        } else {
            "0"
        };
        out.line(format!(
            "_hidl_err = remote()->transact({code} /* {} */, _hidl_data, &_hidl_reply, {flags});",
            method.name
        ))
        .line(check(GOTO_ERROR))
        .blank();

        if !method.oneway {
            out.line("_hidl_err = ::android::hardware::readFromParcel(&_hidl_status, _hidl_reply);")
                .line(check(GOTO_ERROR))
                .blank()
                .line("if (!_hidl_status.isOk()) { return _hidl_status; }")
                .blank();
            for result in &method.results {
                let var = format!("_hidl_out_{}", result.name);
                self.emit_read(out, PROXY_REPLY, &result.ty, &var, GOTO_ERROR);
            }
            if self.needs_callback(method) {
                let outs: Vec<String> = method
                    .results
                    .iter()
                    .map(|result| format!("_hidl_out_{}", result.name))
                    .collect();
                out.line(format!("_hidl_cb({});", outs.join(", ")));
            }
        }

        out.line("_hidl_status.setFromStatusT(_hidl_err);");
        match self.elided_result(method) {
            Some(result) => out.line(format!(
                "return ::android::hardware::Return<{}>(_hidl_out_{});",
                self.type_name(&result.ty),
                result.name
            )),
            None => out.line("return ::android::hardware::Return<void>();"),
        };
        out.blank();
        out.unindent();
        out.line("_hidl_error:");
        out.indented(|out| {
            out.line("_hidl_status.setFromStatusT(_hidl_err);")
                .line(format!("return {}(_hidl_status);", self.return_type(method)));
        });
        out.line("}").blank();
    }

    fn emit_stub_handler(&self, out: &mut Formatter, stub: &str, iface: TypeId, method: &Method) {
        out.line(format!(
            "::android::status_t {stub}::_hidl_{}(::android::hidl::base::V1_0::BnHwBase* _hidl_this, const ::android::hardware::Parcel &_hidl_data, ::android::hardware::Parcel *_hidl_reply, TransactCallback _hidl_cb) {{",
            method.name
        ));
        out.indent();
        out.line("::android::status_t _hidl_err = ::android::OK;");
        for arg in &method.args {
            out.line(format!("{} {};", self.type_name(&arg.ty), arg.name));
        }
        out.blank()
            .block(
                format!(
                    "if (!_hidl_data.enforceInterface({}::descriptor)) {{",
                    self.qualified(iface)
                ),
                "}",
                |out| {
                    out.line("_hidl_err = ::android::BAD_TYPE;").line("return _hidl_err;");
                },
            )
            .blank();
        for arg in &method.args {
            self.emit_read(out, STUB_DATA, &arg.ty, &arg.name, RETURN_ERROR);
        }

        let target = format!("static_cast<{stub}*>(_hidl_this)->getImpl()");
        let args: Vec<&str> = method.args.iter().map(|arg| arg.name.as_str()).collect();
        let args = args.join(", ");
        let write_ok =
            "_hidl_err = ::android::hardware::writeToParcel(::android::hardware::Status::ok(), _hidl_reply);";

        if method.results.is_empty() {
            out.line(format!("{target}->{}({args});", method.name));
            if !method.oneway {
                out.line(write_ok)
                    .line("if (_hidl_cb != nullptr) { _hidl_cb(*_hidl_reply); }");
            }
        } else if let Some(result) = self.elided_result(method) {
            let var = format!("_hidl_out_{}", result.name);
            out.line(format!(
                "{} {var} = {target}->{}({args});",
                self.type_name(&result.ty),
                method.name
            ))
            .blank()
            .line(write_ok)
            .line(check(RETURN_ERROR))
            .blank();
            self.emit_write(out, STUB_REPLY, &result.ty, &var, RETURN_ERROR);
            out.line("_hidl_cb(*_hidl_reply);");
        } else {
            let params: Vec<String> = method
                .results
                .iter()
                .map(|result| self.param(&result.ty, &format!("_hidl_out_{}", result.name)))
                .collect();
            let separator = if args.is_empty() { "" } else { ", " };
            out.line(format!(
                "{target}->{}({args}{separator}[&]({}) {{",
                method.name,
                params.join(", ")
            ));
            out.indent();
            out.line(write_ok).line(check(RETURN_VOID)).blank();
            for result in &method.results {
                let var = format!("_hidl_out_{}", result.name);
                self.emit_write(out, STUB_REPLY, &result.ty, &var, RETURN_VOID);
            }
            out.line("_hidl_cb(*_hidl_reply);");
            out.unindent();
            out.line("});");
        }
        out.blank().line("return _hidl_err;");
        out.unindent();
        out.line("}").blank();
    }

    fn emit_on_transact(&self, out: &mut Formatter, stub: &str, iface: TypeId) {
        out.line(format!(
            "::android::status_t {stub}::onTransact(uint32_t _hidl_code, const ::android::hardware::Parcel &_hidl_data, ::android::hardware::Parcel *_hidl_reply, uint32_t _hidl_flags, TransactCallback _hidl_cb) {{"
        ));
        out.indent();
        out.line("::android::status_t _hidl_err = ::android::OK;").blank();
        out.line("switch (_hidl_code) {");
        out.indent();
        for (code, (declaring, method)) in self.chain_methods(iface).into_iter().enumerate() {
            out.line(format!("case {} /* {} */:", code + 1, method.name));
            out.block("{", "}", |out| {
                out.line("bool _hidl_is_oneway = _hidl_flags & ::android::hardware::IBinder::FLAG_ONEWAY;")
                    .line(format!(
                        "if (_hidl_is_oneway != {}) {{ return ::android::UNKNOWN_ERROR; }}",
                        method.oneway
                    ))
                    .blank()
                    .line(format!(
                        "_hidl_err = {}::_hidl_{}(this, _hidl_data, _hidl_reply, _hidl_cb);",
                        self.class_name("BnHw", declaring),
                        method.name
                    ))
                    .line("break;");
            });
            out.blank();
        }
        out.line("default:");
        out.block("{", "}", |out| {
            out.line("return ::android::hardware::BHwBinder::onTransact(_hidl_code, _hidl_data, _hidl_reply, _hidl_flags, _hidl_cb);");
        });
        out.unindent();
        out.line("}").blank();
        out.block("if (_hidl_err == ::android::UNEXPECTED_NULL) {", "}", |out| {
            out.line("_hidl_err = ::android::hardware::writeToParcel(::android::hardware::Status::fromExceptionCode(::android::hardware::Status::EX_NULL_POINTER), _hidl_reply);");
        });
        out.blank().line("return _hidl_err;");
        out.unindent();
        out.line("}").blank();
    }
}
