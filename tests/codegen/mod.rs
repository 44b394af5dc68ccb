//! Output format tests
//!
//! Each format is run through the driver against a small package and the
//! files it leaves behind are checked.

use crate::helpers::*;
use halgen::CompileError;
use rstest::rstest;

fn foo_tree() -> Tree {
    let tree = Tree::new();
    foo_package(&tree);
    tree
}

// =============================================================================
// CHECK
// =============================================================================

#[test]
fn test_check_writes_no_files() {
    let tree = foo_tree();
    let before = tree.files_under("");

    let printed = tree
        .run(tree.options("check").target("test.foo@1.0"))
        .unwrap();

    assert!(printed.is_empty());
    assert_eq!(tree.files_under(""), before);
}

#[test]
fn test_check_explicit_root_interface() {
    let tree = Tree::new();
    tree.hal(
        "test@1.0::IFoo",
        "package test@1.0;\ninterface IFoo extends IBase { oneway doThing(); };\n",
    );
    let before = tree.files_under("");
    tree.run(tree.options_with_out("check").target("test@1.0::IFoo"))
        .unwrap();
    assert_eq!(tree.files_under(""), before);

    tree.hal(
        "test@1.0::IFoo",
        "package test@1.0;\ninterface IFoo extends IBase { get(Bar b); };\n",
    );
    let err = tree
        .run(tree.options("check").target("test@1.0::IFoo"))
        .unwrap_err();
    assert!(matches!(err, CompileError::UnresolvedType { ref name, .. } if name == "Bar"));
}

#[test]
fn test_check_rejects_enum_value_out_of_range() {
    let tree = Tree::new();
    tree.hal(
        "test.range@1.0::types",
        "package test.range@1.0;\nenum Small : uint8_t { A = 255, B };\n",
    );
    let err = tree
        .run(tree.options("check").target("test.range@1.0::types"))
        .unwrap_err();
    assert!(
        matches!(err, CompileError::ConstantOutOfRange { value: 256, .. }),
        "unexpected error: {err}"
    );
}

// =============================================================================
// C++
// =============================================================================

#[test]
fn test_cpp_for_package() {
    let tree = foo_tree();
    tree.run(tree.options_with_out("c++").target("test.foo@1.0"))
        .unwrap();

    assert_eq!(
        tree.files_under("out/test/foo/1.0"),
        [
            "BnHwFoo.h",
            "BpHwFoo.h",
            "BsFoo.h",
            "FooAll.cpp",
            "IFoo.h",
            "IHwFoo.h",
            "hwtypes.h",
            "types.cpp",
            "types.h",
        ]
    );

    let header = tree.read("out/test/foo/1.0/IFoo.h");
    assert!(header.contains("namespace foo"));
    assert!(header.contains("V1_0"));
    assert!(header.contains("struct IFoo"));
    let types = tree.read("out/test/foo/1.0/types.h");
    assert!(types.contains("enum class Color : uint8_t"));
}

#[rstest]
#[case("c++-headers", &["BnHwFoo.h", "BpHwFoo.h", "BsFoo.h", "IFoo.h", "IHwFoo.h"])]
#[case("c++-sources", &["FooAll.cpp"])]
fn test_cpp_split_formats(#[case] format: &str, #[case] expected: &[&str]) {
    let tree = foo_tree();
    tree.run(tree.options_with_out(format).target("test.foo@1.0::IFoo"))
        .unwrap();
    assert_eq!(tree.files_under("out/test/foo/1.0"), expected);
}

#[test]
fn test_package_batch_stops_at_first_bad_file() {
    let tree = Tree::new();
    tree.hal(
        "test.batch@1.0::IA",
        "package test.batch@1.0;\ninterface IA { a(); };\n",
    )
    .hal(
        "test.batch@1.0::IB",
        "package test.batch@1.0;\ninterface IB { b(Missing m); };\n",
    )
    .hal(
        "test.batch@1.0::IC",
        "package test.batch@1.0;\ninterface IC { c(); };\n",
    );

    let err = tree
        .run(tree.options_with_out("c++-headers").target("test.batch@1.0"))
        .unwrap_err();
    assert!(matches!(err, CompileError::UnresolvedType { .. }));

    let written = tree.files_under("out/test/batch/1.0");
    assert!(written.contains(&"IA.h".to_string()));
    assert!(!written.iter().any(|file| file.contains('C')));
}

#[test]
fn test_cpp_impl_skips_types_files() {
    let tree = foo_tree();
    tree.run(tree.options_with_out("c++-impl").target("test.foo@1.0"))
        .unwrap();

    assert_eq!(tree.files_under("out"), ["Foo.cpp", "Foo.h"]);
    let header = tree.read("out/Foo.h");
    assert!(header.contains("HIDL_FETCH_IFoo"));
    let source = tree.read("out/Foo.cpp");
    assert!(source.contains("// Methods from ::test::foo::V1_0::IFoo follow."));
    assert!(source.contains("return new Foo();"));
}

// =============================================================================
// JAVA
// =============================================================================

#[test]
fn test_java_for_package() {
    let tree = foo_tree();
    tree.run(tree.options_with_out("java").target("test.foo@1.0"))
        .unwrap();

    assert_eq!(
        tree.files_under("out/test/foo/V1_0"),
        ["Color.java", "IFoo.java", "Point.java"]
    );
    let iface = tree.read("out/test/foo/V1_0/IFoo.java");
    assert!(iface.starts_with("package test.foo.V1_0;") || iface.contains("\npackage test.foo.V1_0;"));
    assert!(iface.contains("kInterfaceName = \"test.foo@1.0::IFoo\""));
}

#[test]
fn test_java_single_type_of_types_file() {
    let tree = foo_tree();
    tree.run(tree.options_with_out("java").target("test.foo@1.0::types.Point"))
        .unwrap();
    assert_eq!(tree.files_under("out/test/foo/V1_0"), ["Point.java"]);
}

#[test]
fn test_java_rejects_handles() {
    let tree = Tree::new();
    tree.hal(
        "test.h@1.0::IH",
        "package test.h@1.0;\ninterface IH { get() generates (handle h); };\n",
    );
    let err = tree
        .run(tree.options_with_out("java").target("test.h@1.0::IH"))
        .unwrap_err();
    assert!(matches!(err, CompileError::Validation { .. }));
    assert!(tree.files_under("out").is_empty());
}

// =============================================================================
// EXPORTED CONSTANTS
// =============================================================================

#[test]
fn test_export_header() {
    let tree = foo_tree();
    let header = tree.out().join("constants.h");
    tree.run(
        tree.options("export-header")
            .output_path(&header)
            .target("test.foo@1.0"),
    )
    .unwrap();

    let text = tree.read("out/constants.h");
    assert!(text.contains("#ifndef HIDL_GENERATED_TEST_FOO_V1_0_EXPORTED_CONSTANTS_H_"));
    assert!(text.contains("typedef enum {"));
    assert!(text.contains("COLOR_GREEN = 3u,"));
    assert!(text.contains("} color_t;"));
}

#[test]
fn test_java_constants() {
    let tree = foo_tree();
    tree.run(tree.options_with_out("java-constants").target("test.foo@1.0"))
        .unwrap();

    let text = tree.read("out/test/foo/V1_0/Constants.java");
    assert!(text.contains("package test.foo.V1_0;"));
    assert!(text.contains("public final class color_t {"));
    assert!(text.contains("COLOR_BLUE = 4;"));
}

#[test]
fn test_nothing_exported_writes_nothing() {
    let tree = Tree::new();
    tree.hal(
        "test.plain@1.0::types",
        "package test.plain@1.0;\nenum E : int32_t { A };\n",
    );
    let header = tree.out().join("constants.h");
    tree.run(
        tree.options("export-header")
            .output_path(&header)
            .target("test.plain@1.0"),
    )
    .unwrap();
    assert!(!header.exists());
}

// =============================================================================
// VTS
// =============================================================================

#[test]
fn test_vts_component() {
    let tree = foo_tree();
    tree.run(tree.options_with_out("vts").target("test.foo@1.0"))
        .unwrap();

    assert_eq!(tree.files_under("out/test/foo/1.0"), ["Foo.vts", "types.vts"]);
    let text = tree.read("out/test/foo/1.0/Foo.vts");
    assert!(text.contains("component_class: HAL_HIDL"));
    assert!(text.contains("component_name: \"IFoo\""));
    assert!(text.contains("import: \"test.foo@1.0::Point\""));
    assert!(!text.contains("import: \"android.hidl.base@1.0::IBase\""));
}

// =============================================================================
// BUILD FILES
// =============================================================================

#[test]
fn test_makefile_for_java_package() {
    let tree = foo_tree();
    tree.run(tree.options("makefile").target("test.foo@1.0"))
        .unwrap();

    let text = tree.read("src/foo/1.0/Android.mk");
    assert!(text.contains("LOCAL_MODULE := test.foo-V1.0-java\n"));
    assert!(text.contains("LOCAL_MODULE := test.foo-V1.0-java-static"));
    assert!(text.contains("LOCAL_MODULE := test.foo-V1.0-java-constants"));
    assert!(text.contains("# Build types.hal (Point)"));
}

#[test]
fn test_makefile_skips_typedef_only_package() {
    let tree = Tree::new();
    tree.hal(
        "test.td@1.0::types",
        "package test.td@1.0;\ntypedef int32_t Id;\n",
    );
    tree.run(tree.options("makefile").target("test.td@1.0"))
        .unwrap();
    assert!(!tree.exists("src/td/1.0/Android.mk"));
}

#[test]
fn test_makefile_skips_package_java_cannot_express() {
    let tree = Tree::new();
    tree.hal(
        "test.h@1.0::IH",
        "package test.h@1.0;\ninterface IH { get() generates (handle h); };\n",
    );
    tree.run(tree.options("makefile").target("test.h@1.0"))
        .unwrap();
    assert!(!tree.exists("src/h/1.0/Android.mk"));
}

#[test]
fn test_android_bp() {
    let tree = foo_tree();
    tree.run(tree.options("androidbp").target("test.foo@1.0"))
        .unwrap();

    let text = tree.read("src/foo/1.0/Android.bp");
    assert!(text.contains("name: \"test.foo@1.0_hal\","));
    assert!(text.contains("\"IFoo.hal\","));
    assert!(text.contains("\"types.hal\","));
    assert!(text.contains("name: \"test.foo@1.0_genc++_headers\","));
}

#[test]
fn test_android_bp_impl() {
    let tree = foo_tree();
    tree.run(tree.options_with_out("androidbp-impl").target("test.foo@1.0"))
        .unwrap();
    let text = tree.read("out/Android.bp");
    assert!(text.contains("name: \"test.foo@1.0-impl\","));
}

// =============================================================================
// HASH
// =============================================================================

#[test]
fn test_hash_prints_current_txt_lines() {
    let tree = foo_tree();
    let printed = tree
        .run(tree.options("hash").target("test.foo@1.0"))
        .unwrap();

    let lines: Vec<&str> = printed.lines().collect();
    assert_eq!(lines.len(), 2);
    assert!(lines[0].ends_with(" test.foo@1.0::IFoo"));
    assert!(lines[1].ends_with(" test.foo@1.0::types"));
    assert_eq!(lines[0].split(' ').next().unwrap().len(), 64);
}

#[test]
fn test_hash_prints_even_when_frozen_hash_differs() {
    let tree = foo_tree();
    tree.write(
        "src/current.txt",
        &format!("{} test.foo@1.0::IFoo\n", "0".repeat(64)),
    );

    let err = tree
        .run(tree.options("check").target("test.foo@1.0::IFoo"))
        .unwrap_err();
    assert!(matches!(err, CompileError::FrozenInterfaceViolation { .. }));

    let printed = tree
        .run(tree.options("hash").target("test.foo@1.0::IFoo"))
        .unwrap();
    assert!(printed.ends_with(" test.foo@1.0::IFoo\n"));
    assert!(!printed.starts_with(&"0".repeat(64)));
}
