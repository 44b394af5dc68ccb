//! HIR layer tests
//!
//! Name resolution across files and packages, the import graph and the
//! Java compatibility walk, driven through a real coordinator.

use crate::helpers::*;
use halgen::hir::{
    self, DeclKind, ResolutionPolicy, Type, imported_packages_hierarchy,
    is_package_java_compatible,
};
use halgen::{CompileError, Enforcement};

// =============================================================================
// NAME RESOLUTION
// =============================================================================

#[test]
fn test_types_file_names_are_visible_to_interfaces() {
    let tree = Tree::new();
    foo_package(&tree);
    let mut coordinator = tree.coordinator();

    let id = coordinator
        .parse(&fq("test.foo@1.0::IFoo"), Enforcement::Full)
        .unwrap();
    let iface = coordinator.ast(id).interface().unwrap();
    let decl = coordinator.named_type(iface).interface().unwrap();

    let Type::Struct(point) = &decl.methods[2].args[0].ty else {
        panic!("expected a struct argument");
    };
    assert_eq!(
        coordinator.named_type(*point).fq_name().to_string(),
        "test.foo@1.0::Point"
    );
    assert!(matches!(decl.methods[1].args[0].ty, Type::Enum(_)));
    assert!(decl.methods[1].oneway);
}

#[test]
fn test_unknown_field_type_is_unresolved() {
    let tree = Tree::new();
    tree.hal(
        "test.bad@1.0::types",
        "package test.bad@1.0;\nstruct S { Missing m; };\n",
    );
    let mut coordinator = tree.coordinator();

    let err = coordinator
        .parse(&fq("test.bad@1.0::types"), Enforcement::Full)
        .unwrap_err();
    assert!(
        matches!(err, CompileError::UnresolvedType { ref name, .. } if name.contains("Missing")),
        "unexpected error: {err}"
    );
}

#[test]
fn test_nested_names_resolve_through_scopes() {
    let tree = Tree::new();
    tree.hal(
        "test.nest@1.0::types",
        r#"
        package test.nest@1.0;
        struct Outer {
            struct Inner { int32_t v; };
            Inner inner;
        };
        struct User { Outer.Inner copy; };
        "#,
    );
    let mut coordinator = tree.coordinator();
    let id = coordinator
        .parse(&fq("test.nest@1.0::types"), Enforcement::Full)
        .unwrap();

    let ast = coordinator.ast(id);
    let user = ast.find_top_level("User").unwrap();
    let Type::Struct(inner) = &coordinator.named_type(user).fields()[0].ty else {
        panic!("expected a struct field");
    };
    assert_eq!(coordinator.named_type(*inner).name(), "Inner");
    assert!(!coordinator.named_type(*inner).is_top_level());
}

#[test]
fn test_super_chain_ends_at_root_interface() {
    let tree = Tree::new();
    foo_package(&tree);
    tree.hal(
        "test.foo@1.0::IBar",
        "package test.foo@1.0;\ninterface IBar extends IFoo { bar(); };\n",
    );
    let mut coordinator = tree.coordinator();
    let id = coordinator
        .parse(&fq("test.foo@1.0::IBar"), Enforcement::Full)
        .unwrap();
    let iface = coordinator.ast(id).interface().unwrap();

    let names: Vec<String> = coordinator
        .super_chain(iface)
        .into_iter()
        .map(|ty| coordinator.named_type(ty).fq_name().to_string())
        .collect();
    assert_eq!(
        names,
        [
            "test.foo@1.0::IBar",
            "test.foo@1.0::IFoo",
            "android.hidl.base@1.0::IBase"
        ]
    );
    assert_eq!(coordinator.hash_chain(iface).len(), 3);
}

#[test]
fn test_extending_a_struct_is_rejected() {
    let tree = Tree::new();
    foo_package(&tree);
    tree.hal(
        "test.foo@1.0::IBad",
        "package test.foo@1.0;\ninterface IBad extends Point {};\n",
    );
    let mut coordinator = tree.coordinator();
    let err = coordinator
        .parse(&fq("test.foo@1.0::IBad"), Enforcement::Full)
        .unwrap_err();
    assert!(matches!(err, CompileError::InvalidSuperInterface { .. }));
}

#[test]
fn test_oneway_method_with_results_is_rejected() {
    let tree = Tree::new();
    tree.hal(
        "test.ow@1.0::IOw",
        "package test.ow@1.0;\ninterface IOw { oneway get() generates (int32_t v); };\n",
    );
    let mut coordinator = tree.coordinator();
    let err = coordinator
        .parse(&fq("test.ow@1.0::IOw"), Enforcement::Full)
        .unwrap_err();
    assert!(matches!(err, CompileError::DeclarationMismatch { .. }));
}

// =============================================================================
// AMBIGUOUS IMPORTS
// =============================================================================

fn ambiguous_tree() -> Tree {
    let tree = Tree::new();
    tree.hal(
        "test.a@1.0::types",
        "package test.a@1.0;\nstruct Data { int32_t a; };\n",
    )
    .hal(
        "test.b@1.0::types",
        "package test.b@1.0;\nstruct Data { int64_t b; };\n",
    )
    .hal(
        "test.c@1.0::types",
        "package test.c@1.0;\nimport test.a@1.0;\nimport test.b@1.0;\nstruct Holder { Data data; };\n",
    );
    tree
}

#[test]
fn test_first_import_wins_by_default() {
    let tree = ambiguous_tree();
    let mut coordinator = tree.coordinator();
    let id = coordinator
        .parse(&fq("test.c@1.0::types"), Enforcement::Full)
        .unwrap();

    let holder = coordinator.ast(id).find_top_level("Holder").unwrap();
    let data = coordinator.named_type(holder).fields()[0].ty.type_id().unwrap();
    assert_eq!(
        coordinator.named_type(data).fq_name().to_string(),
        "test.a@1.0::Data"
    );
}

#[test]
fn test_strict_imports_reject_ambiguous_names() {
    let tree = ambiguous_tree();
    let mut coordinator = tree
        .coordinator()
        .with_policy(ResolutionPolicy::RejectAmbiguous);
    let err = coordinator
        .parse(&fq("test.c@1.0::types"), Enforcement::Full)
        .unwrap_err();

    let CompileError::AmbiguousType { candidates, .. } = &err else {
        panic!("expected an ambiguity error, got {err}");
    };
    assert_eq!(*candidates, ["test.a@1.0::Data", "test.b@1.0::Data"]);
}

// =============================================================================
// IMPORT GRAPH
// =============================================================================

#[test]
fn test_hierarchy_over_diamond_imports() {
    let tree = Tree::new();
    tree.hal(
        "test.base@1.0::types",
        "package test.base@1.0;\nstruct B { int32_t x; };\n",
    )
    .hal(
        "test.left@1.0::types",
        "package test.left@1.0;\nimport test.base@1.0;\nstruct L { B b; };\n",
    )
    .hal(
        "test.right@1.0::types",
        "package test.right@1.0;\nimport test.base@1.0;\nstruct R { B b; };\n",
    )
    .hal(
        "test.top@1.0::types",
        "package test.top@1.0;\nimport test.left@1.0;\nimport test.right@1.0;\nstruct T { L l; R r; };\n",
    );
    let mut coordinator = tree.coordinator();
    let top = coordinator
        .parse(&fq("test.top@1.0::types"), Enforcement::Full)
        .unwrap();

    let direct: Vec<String> = hir::imported_packages(&coordinator, top)
        .iter()
        .map(ToString::to_string)
        .collect();
    assert_eq!(direct, ["test.left@1.0", "test.right@1.0"]);

    let all: Vec<String> = imported_packages_hierarchy(&mut coordinator, top)
        .unwrap()
        .iter()
        .map(ToString::to_string)
        .collect();
    assert_eq!(all, ["test.base@1.0", "test.left@1.0", "test.right@1.0"]);

    let names = hir::all_imported_names(&coordinator, top);
    assert!(names.contains(&fq("test.base@1.0::B")));
}

#[test]
fn test_same_file_is_parsed_once() {
    let tree = Tree::new();
    foo_package(&tree);
    let mut coordinator = tree.coordinator();

    let first = coordinator
        .parse(&fq("test.foo@1.0::IFoo"), Enforcement::Full)
        .unwrap();
    let count = coordinator.asts().len();
    let second = coordinator
        .parse(&fq("test.foo@1.0::IFoo"), Enforcement::Full)
        .unwrap();
    assert_eq!(first, second);
    assert_eq!(coordinator.asts().len(), count);

    // Parsing IFoo pulled in the package's types.hal.
    let types = coordinator
        .parse(&fq("test.foo@1.0::types"), Enforcement::Full)
        .unwrap();
    assert_eq!(coordinator.cached(&fq("test.foo@1.0::types")), Some(types));
}

#[test]
fn test_failed_file_stays_failed() {
    let tree = Tree::new();
    tree.hal(
        "test.bad@1.0::types",
        "package test.bad@1.0;\nstruct S { Missing m; };\n",
    );
    let mut coordinator = tree.coordinator();
    let file = fq("test.bad@1.0::types");

    assert!(coordinator.parse(&file, Enforcement::Full).is_err());
    let err = coordinator.parse(&file, Enforcement::Full).unwrap_err();
    assert!(matches!(err, CompileError::PreviouslyFailed(_)));
}

#[test]
fn test_failure_keeps_unrelated_imports_parsed() {
    let tree = Tree::new();
    tree.hal(
        "test.o@1.0::types",
        "package test.o@1.0;\nstruct Point { int32_t x; };\n",
    )
    .hal(
        "test.f@1.0::IFoo",
        "package test.f@1.0;\nimport test.o@1.0::types;\ninterface IFoo { f(Bar b); };\n",
    );
    let mut coordinator = tree.coordinator();

    let err = coordinator
        .parse(&fq("test.f@1.0::IFoo"), Enforcement::Full)
        .unwrap_err();
    assert!(matches!(err, CompileError::UnresolvedType { .. }), "unexpected error: {err}");

    assert!(coordinator.parse(&fq("test.o@1.0::types"), Enforcement::Full).is_ok());
    assert!(
        coordinator
            .parse(&fq("android.hidl.base@1.0::IBase"), Enforcement::Full)
            .is_ok()
    );
    let err = coordinator
        .parse(&fq("test.f@1.0::IFoo"), Enforcement::Full)
        .unwrap_err();
    assert!(matches!(err, CompileError::PreviouslyFailed(_)));
}

// =============================================================================
// CYCLES
// =============================================================================

#[test]
fn test_same_package_interfaces_may_reference_each_other() {
    let tree = Tree::new();
    tree.hal(
        "test.m@1.0::IA",
        "package test.m@1.0;\ninterface IA { f(IB b); };\n",
    )
    .hal(
        "test.m@1.0::IB",
        "package test.m@1.0;\ninterface IB { g(IA a); };\n",
    );
    let mut coordinator = tree.coordinator();

    let a = coordinator
        .parse(&fq("test.m@1.0::IA"), Enforcement::Full)
        .unwrap();
    let b = coordinator
        .parse(&fq("test.m@1.0::IB"), Enforcement::Full)
        .unwrap();
    assert_ne!(a, b);

    let ia = coordinator.ast(a).interface().unwrap();
    let ib = coordinator.ast(b).interface().unwrap();
    let f = &coordinator.named_type(ia).interface().unwrap().methods[0];
    let g = &coordinator.named_type(ib).interface().unwrap().methods[0];
    assert_eq!(f.args[0].ty, Type::Interface(ib));
    assert_eq!(g.args[0].ty, Type::Interface(ia));
}

#[test]
fn test_cross_package_file_cycle() {
    let tree = Tree::new();
    tree.hal(
        "test.a@1.0::IA",
        "package test.a@1.0;\nimport test.b@1.0::IB;\ninterface IA { f(IB b); };\n",
    )
    .hal(
        "test.b@1.0::IB",
        "package test.b@1.0;\nimport test.a@1.0::IA;\ninterface IB { g(IA a); };\n",
    );
    let mut coordinator = tree.coordinator();

    let err = coordinator
        .parse(&fq("test.a@1.0::IA"), Enforcement::Full)
        .unwrap_err();
    let CompileError::ImportCycle { importer, imported } = &err else {
        panic!("unexpected error: {err}");
    };
    assert_eq!(*importer, fq("test.b@1.0::IB"));
    assert_eq!(*imported, fq("test.a@1.0::IA"));
}

fn package_cycle_tree() -> Tree {
    let tree = Tree::new();
    tree.hal(
        "test.a@1.0::types",
        "package test.a@1.0;\nstruct Local { int32_t v; };\n",
    )
    .hal(
        "test.a@1.0::IA",
        "package test.a@1.0;\nimport test.b@1.0::types;\ninterface IA { f(Point p); };\n",
    )
    .hal(
        "test.b@1.0::types",
        "package test.b@1.0;\nimport test.a@1.0::types;\nstruct Point { Local l; };\n",
    );
    tree
}

#[test]
fn test_package_cycle_through_other_file() {
    let tree = package_cycle_tree();
    let mut coordinator = tree.coordinator();

    let err = coordinator
        .parse(&fq("test.a@1.0::IA"), Enforcement::Full)
        .unwrap_err();
    let CompileError::ImportCycle { importer, imported } = &err else {
        panic!("unexpected error: {err}");
    };
    assert_eq!(*importer, fq("test.b@1.0::types"));
    assert_eq!(*imported, fq("test.a@1.0::types"));
}

#[test]
fn test_package_cycle_through_finished_file() {
    let tree = package_cycle_tree();
    let mut coordinator = tree.coordinator();

    // On its own, test.b only looks at test.a's types file.
    coordinator
        .parse(&fq("test.b@1.0::types"), Enforcement::Full)
        .unwrap();

    let err = coordinator
        .parse(&fq("test.a@1.0::IA"), Enforcement::Full)
        .unwrap_err();
    let CompileError::ImportCycle { importer, imported } = &err else {
        panic!("unexpected error: {err}");
    };
    assert_eq!(*importer, fq("test.a@1.0::IA"));
    assert_eq!(*imported, fq("test.b@1.0::types"));
}

#[test]
fn test_interface_inheritance_cycle() {
    let tree = Tree::new();
    tree.hal(
        "test.i@1.0::IA",
        "package test.i@1.0;\ninterface IA extends IB { };\n",
    )
    .hal(
        "test.i@1.0::IB",
        "package test.i@1.0;\ninterface IB extends IA { };\n",
    );
    let mut coordinator = tree.coordinator();

    let err = coordinator
        .parse(&fq("test.i@1.0::IA"), Enforcement::Full)
        .unwrap_err();
    assert!(
        matches!(err, CompileError::InheritanceCycle(ref name) if name == "test.i@1.0::IA"),
        "unexpected error: {err}"
    );

    // IB finished against a half-built IA, so it is unusable too.
    let err = coordinator
        .parse(&fq("test.i@1.0::IB"), Enforcement::Full)
        .unwrap_err();
    assert!(matches!(err, CompileError::PreviouslyFailed(_)));
}

#[test]
fn test_enum_storage_cycle() {
    let tree = Tree::new();
    tree.hal(
        "test.e@1.0::types",
        "package test.e@1.0;\nenum A : B { X };\nenum B : A { Y };\n",
    );
    let mut coordinator = tree.coordinator();

    let err = coordinator
        .parse(&fq("test.e@1.0::types"), Enforcement::Full)
        .unwrap_err();
    assert!(
        matches!(err, CompileError::InheritanceCycle(_)),
        "unexpected error: {err}"
    );
}

#[test]
fn test_enum_value_cycle() {
    let tree = Tree::new();
    tree.hal(
        "test.c@1.0::types",
        "package test.c@1.0;\nenum E : int32_t { A = B, B = A };\n",
    );
    let mut coordinator = tree.coordinator();

    let id = coordinator
        .parse(&fq("test.c@1.0::types"), Enforcement::Full)
        .unwrap();
    let err = hir::check_enum_values(&coordinator, coordinator.ast(id)).unwrap_err();
    assert!(
        matches!(err, CompileError::ConstantCycle(ref name) if name.starts_with("test.c@1.0::E:")),
        "unexpected error: {err}"
    );
}

#[test]
fn test_long_implicit_enum() {
    let tree = Tree::new();
    let values: Vec<String> = (0..2000).map(|i| format!("V{i}")).collect();
    tree.hal(
        "test.l@1.0::types",
        &format!(
            "package test.l@1.0;\nenum Long : int32_t {{ {} }};\nenum More : Long {{ NEXT }};\n",
            values.join(", ")
        ),
    );
    let mut coordinator = tree.coordinator();

    let id = coordinator
        .parse(&fq("test.l@1.0::types"), Enforcement::Full)
        .unwrap();
    hir::check_enum_values(&coordinator, coordinator.ast(id)).unwrap();

    let more = coordinator.ast(id).find_top_level("More").unwrap();
    let all = hir::enum_values(&coordinator, more).unwrap();
    assert_eq!(all.len(), 2001);
    assert_eq!((all[1999].0.as_str(), all[1999].1), ("V1999", 1999));
    assert_eq!((all[2000].0.as_str(), all[2000].1), ("NEXT", 2000));
}

// =============================================================================
// JAVA COMPATIBILITY
// =============================================================================

#[test]
fn test_java_walk_stops_at_first_incompatible_file() {
    let tree = Tree::new();
    tree.hal(
        "test.j@1.0::IA",
        "package test.j@1.0;\ninterface IA { a(int32_t v); };\n",
    )
    .hal(
        "test.j@1.0::IB",
        "package test.j@1.0;\ninterface IB { b() generates (handle h); };\n",
    )
    .hal(
        "test.j@1.0::IC",
        "package test.j@1.0;\ninterface IC { c(); };\n",
    );
    let mut coordinator = tree.coordinator();

    let report = is_package_java_compatible(&mut coordinator, &fq("test.j@1.0")).unwrap();
    assert!(!report.compatible);
    assert_eq!(report.visited, [fq("test.j@1.0::IA"), fq("test.j@1.0::IB")]);
    assert_eq!(coordinator.cached(&fq("test.j@1.0::IC")), None);
}

#[test]
fn test_java_walk_follows_imported_packages() {
    let tree = Tree::new();
    tree.hal(
        "test.dep@1.0::types",
        "package test.dep@1.0;\nstruct P { int32_t i; };\nunion U { int32_t i; float f; };\n",
    )
    .hal(
        "test.user@1.0::types",
        "package test.user@1.0;\nimport test.dep@1.0;\nstruct S { P p; };\n",
    );
    let mut coordinator = tree.coordinator();

    let report = is_package_java_compatible(&mut coordinator, &fq("test.user@1.0")).unwrap();
    assert!(!report.compatible);
    assert_eq!(
        report.visited,
        [fq("test.user@1.0::types"), fq("test.dep@1.0::types")]
    );
}

#[test]
fn test_exported_enums_in_declaration_order() {
    let tree = Tree::new();
    foo_package(&tree);
    let mut coordinator = tree.coordinator();
    let id = coordinator
        .parse(&fq("test.foo@1.0::types"), Enforcement::Full)
        .unwrap();

    let exported = hir::exported_types(&coordinator, id);
    assert_eq!(exported.len(), 1);
    assert_eq!(coordinator.named_type(exported[0]).kind(), DeclKind::Enum);

    let values = hir::enum_values(&coordinator, exported[0]).unwrap();
    let values: Vec<(String, i128)> = values
        .into_iter()
        .map(|(name, value)| (name.to_string(), value))
        .collect();
    assert_eq!(
        values,
        [
            ("RED".to_string(), 0),
            ("GREEN".to_string(), 3),
            ("BLUE".to_string(), 4)
        ]
    );
}
