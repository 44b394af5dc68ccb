//! Project layer tests
//!
//! Package roots, package membership, the embedded root interface and
//! frozen hashes from `current.txt`.

use crate::helpers::*;
use halgen::project::{builtin, sha256_hex};
use halgen::{CompileError, Enforcement, PackageRootTable};

#[test]
fn test_package_members_are_sorted_hal_files() {
    let tree = Tree::new();
    foo_package(&tree);
    tree.hal("test.foo@1.0::IBar", "package test.foo@1.0;\ninterface IBar {};\n")
        .write("src/foo/1.0/Android.bp", "// not a member\n")
        .write("src/foo/1.0/notes.txt", "ignored\n");
    let coordinator = tree.coordinator();

    let members = coordinator.package_interfaces(&fq("test.foo@1.0")).unwrap();
    assert_eq!(
        members,
        [
            fq("test.foo@1.0::IBar"),
            fq("test.foo@1.0::IFoo"),
            fq("test.foo@1.0::types")
        ]
    );
}

#[test]
fn test_missing_package_directory() {
    let tree = Tree::new();
    let coordinator = tree.coordinator();
    let err = coordinator
        .package_interfaces(&fq("test.nothing@1.0"))
        .unwrap_err();
    assert!(matches!(err, CompileError::SourceNotFound { .. }));
}

#[test]
fn test_package_without_root_is_rejected() {
    let tree = Tree::new();
    let mut coordinator = tree.coordinator();
    let err = coordinator
        .parse(&fq("vendor.acme@1.0::IThing"), Enforcement::Full)
        .unwrap_err();
    assert!(matches!(err, CompileError::UnknownPackageRoot(_)));
}

#[test]
fn test_root_interface_is_embedded() {
    let tree = Tree::new();
    let mut coordinator = tree.coordinator();

    let root = builtin::root_interface();
    assert!(coordinator.source_exists(&root));
    let id = coordinator.parse(&root, Enforcement::Full).unwrap();
    let ast = coordinator.ast(id);
    assert_eq!(ast.path().to_string_lossy(), builtin::BUILTIN_PATH);

    let iface = ast.interface().unwrap();
    let decl = coordinator.named_type(iface).interface().unwrap();
    assert!(decl.super_interface.is_none());
    assert!(decl.methods.iter().any(|m| m.name == "interfaceChain"));
}

#[test]
fn test_root_interface_file_on_disk_wins() {
    let tree = Tree::new();
    tree.write(
        "system/libhidl/transport/base/1.0/IBase.hal",
        "package android.hidl.base@1.0;\ninterface IBase { ping(); };\n",
    );
    let mut coordinator = tree.coordinator();
    let id = coordinator
        .parse(&builtin::root_interface(), Enforcement::Full)
        .unwrap();
    assert!(coordinator.ast(id).path().ends_with("IBase.hal"));
    assert_ne!(coordinator.ast(id).path().to_string_lossy(), builtin::BUILTIN_PATH);
}

#[test]
fn test_file_declaring_wrong_name() {
    let tree = Tree::new();
    tree.hal("test.foo@1.0::IFoo", "package test.foo@1.0;\ninterface IOther {};\n");
    let mut coordinator = tree.coordinator();
    let err = coordinator
        .parse(&fq("test.foo@1.0::IFoo"), Enforcement::Full)
        .unwrap_err();
    assert!(matches!(err, CompileError::DeclarationMismatch { .. }));
}

#[test]
fn test_file_declaring_wrong_package() {
    let tree = Tree::new();
    tree.hal("test.foo@1.0::IFoo", "package test.foo@2.0;\ninterface IFoo {};\n");
    let mut coordinator = tree.coordinator();
    let err = coordinator
        .parse(&fq("test.foo@1.0::IFoo"), Enforcement::Full)
        .unwrap_err();
    assert!(matches!(err, CompileError::DeclarationMismatch { .. }));
}

#[test]
fn test_syntax_errors_reject_the_file() {
    let tree = Tree::new();
    tree.hal("test.foo@1.0::types", "package test.foo@1.0;\nstruct A { int32_t x }\n");
    let mut coordinator = tree.coordinator();
    let err = coordinator
        .parse(&fq("test.foo@1.0::types"), Enforcement::Full)
        .unwrap_err();
    assert!(matches!(err, CompileError::ParseSyntax { count, .. } if count >= 1));
}

// =============================================================================
// FROZEN HASHES
// =============================================================================

#[test]
fn test_matching_hash_is_accepted() {
    let tree = Tree::new();
    foo_package(&tree);
    tree.write(
        "src/current.txt",
        &format!(
            "# released\n{} test.foo@1.0::IFoo\n",
            sha256_hex(FOO_INTERFACE.as_bytes())
        ),
    );
    let mut coordinator = tree.coordinator();
    assert!(
        coordinator
            .parse(&fq("test.foo@1.0::IFoo"), Enforcement::Full)
            .is_ok()
    );
}

#[test]
fn test_changed_frozen_file_is_rejected() {
    let tree = Tree::new();
    foo_package(&tree);
    let stale = "0".repeat(64);
    tree.write("src/current.txt", &format!("{stale} test.foo@1.0::IFoo\n"));
    let mut coordinator = tree.coordinator();

    let err = coordinator
        .parse(&fq("test.foo@1.0::IFoo"), Enforcement::Full)
        .unwrap_err();
    let CompileError::FrozenInterfaceViolation {
        recorded, actual, ..
    } = &err
    else {
        panic!("expected a frozen hash violation, got {err}");
    };
    assert_eq!(*recorded, [stale]);
    assert_eq!(*actual, sha256_hex(FOO_INTERFACE.as_bytes()));
}

#[test]
fn test_hash_check_can_be_skipped() {
    let tree = Tree::new();
    foo_package(&tree);
    tree.write("src/current.txt", &format!("{} test.foo@1.0::IFoo\n", "0".repeat(64)));
    let mut coordinator = tree.coordinator();
    let id = coordinator
        .parse(&fq("test.foo@1.0::IFoo"), Enforcement::NoHash)
        .unwrap();
    assert_eq!(
        coordinator.ast(id).content_hash(),
        sha256_hex(FOO_INTERFACE.as_bytes())
    );
}

#[test]
fn test_malformed_registry_line() {
    let tree = Tree::new();
    foo_package(&tree);
    tree.write("src/current.txt", "not-a-hash test.foo@1.0::IFoo\n");
    let mut coordinator = tree.coordinator();
    let err = coordinator
        .parse(&fq("test.foo@1.0::IFoo"), Enforcement::Full)
        .unwrap_err();
    assert!(matches!(err, CompileError::HashRegistry { line: 1, .. }));
}

#[test]
fn test_roots_resolve_paths_below_tree() {
    let tree = Tree::new();
    let roots: PackageRootTable = tree.roots();
    let file = fq("test.foo.bar@2.1::IBaz");

    assert_eq!(
        roots.file_path(&file).unwrap(),
        tree.path().join("src/foo/bar/2.1/IBaz.hal")
    );
    assert_eq!(roots.package_path(&file, true).unwrap(), "foo/bar/V2_1/");
    assert_eq!(roots.root_option(&file).unwrap(), "test:src");
}
