//! Driver and command-line tests

use std::process::Command;

use crate::helpers::*;
use halgen::{CompileError, Driver};

// =============================================================================
// DRIVER
// =============================================================================

#[test]
fn test_targets_run_in_order_until_first_failure() {
    let tree = Tree::new();
    foo_package(&tree);
    tree.hal(
        "test.bad@1.0::types",
        "package test.bad@1.0;\nstruct S { Missing m; };\n",
    )
    .hal(
        "test.later@1.0::ILater",
        "package test.later@1.0;\ninterface ILater { later(); };\n",
    );

    let err = tree
        .run(
            tree.options_with_out("c++-headers")
                .target("test.foo@1.0::IFoo")
                .target("test.bad@1.0")
                .target("test.later@1.0"),
        )
        .unwrap_err();

    assert!(matches!(err, CompileError::UnresolvedType { .. }));
    assert!(tree.exists("out/test/foo/1.0/IFoo.h"));
    assert!(tree.files_under("out/test/later").is_empty());
}

#[test]
fn test_targets_are_validated_per_format() {
    let tree = Tree::new();
    foo_package(&tree);

    let err = tree
        .run(tree.options("makefile").target("test.foo@1.0::IFoo"))
        .unwrap_err();
    assert!(matches!(err, CompileError::Validation { .. }));

    let err = tree
        .run(tree.options_with_out("c++").target("test.foo@1.0::types.Point"))
        .unwrap_err();
    assert!(matches!(err, CompileError::Validation { .. }));
}

#[test]
fn test_malformed_target() {
    let tree = Tree::new();
    let err = Driver::new(tree.options("check").target("test.foo@one")).unwrap_err();
    assert!(matches!(err, CompileError::InvalidFqName(_)));
    assert!(err.is_usage());
}

#[test]
fn test_repeated_package_root() {
    let tree = Tree::new();
    let err = Driver::new(
        tree.options("check")
            .package_root(TEST_ROOT)
            .target("test.foo@1.0"),
    )
    .unwrap_err();
    assert!(matches!(err, CompileError::PackageRootConflict { .. }));
}

#[test]
fn test_strict_imports_through_driver() {
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

    assert!(tree.run(tree.options("check").target("test.c@1.0")).is_ok());
    let err = tree
        .run(tree.options("check").strict_imports(true).target("test.c@1.0"))
        .unwrap_err();
    assert!(matches!(err, CompileError::AmbiguousType { .. }));
}

// =============================================================================
// COMMAND LINE
// =============================================================================

fn hal_gen() -> Command {
    let mut command = Command::new(env!("CARGO_BIN_EXE_hal-gen"));
    command.env_remove("ANDROID_BUILD_TOP");
    command
}

#[test]
fn test_cli_help_lists_formats_and_exits_one() {
    let output = hal_gen().arg("-h").output().unwrap();
    assert_eq!(output.status.code(), Some(1));
    let text = String::from_utf8_lossy(&output.stdout);
    assert!(text.contains("androidbp-impl"));
    assert!(text.contains("java-constants"));
}

#[test]
fn test_cli_version_succeeds() {
    let output = hal_gen().arg("--version").output().unwrap();
    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stdout).contains("hal-gen"));
}

#[test]
fn test_cli_without_arguments_fails() {
    let output = hal_gen().output().unwrap();
    assert_eq!(output.status.code(), Some(1));
}

#[test]
fn test_cli_unknown_format() {
    let tree = Tree::new();
    let output = hal_gen()
        .arg("-Lpython")
        .arg("-p")
        .arg(tree.path())
        .arg("test.foo@1.0")
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("ERROR:"));
    assert!(stderr.contains("python"));
}

#[test]
fn test_cli_prints_hashes() {
    let tree = Tree::new();
    foo_package(&tree);
    let output = hal_gen()
        .arg("-Lhash")
        .arg("-p")
        .arg(tree.path())
        .arg(format!("-r{TEST_ROOT}"))
        .arg("test.foo@1.0::IFoo")
        .output()
        .unwrap();
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.trim_end().ends_with(" test.foo@1.0::IFoo"));
}

#[test]
fn test_cli_root_from_environment() {
    let tree = Tree::new();
    foo_package(&tree);
    let output = hal_gen()
        .env("ANDROID_BUILD_TOP", tree.path())
        .args(["-Lcheck", "-r", TEST_ROOT, "test.foo@1.0"])
        .output()
        .unwrap();
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
}
