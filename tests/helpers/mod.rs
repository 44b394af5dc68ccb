//! Shared fixtures for the integration tests.
//!
//! A [`Tree`] is a throwaway source tree in a temporary directory. Packages
//! under the `test` prefix live in `<tmp>/src`; the default roots are added
//! after it, so the root base interface comes from the embedded copy.

#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use halgen::{Coordinator, CompileError, Driver, DriverOptions, FqName, PackageRootTable};
use tempfile::TempDir;
use walkdir::WalkDir;

/// `-r` option for the test root.
pub const TEST_ROOT: &str = "test:src";

pub fn fq(name: &str) -> FqName {
    FqName::parse(name).unwrap()
}

pub struct Tree {
    dir: TempDir,
}

impl Tree {
    pub fn new() -> Self {
        Self {
            dir: TempDir::new().unwrap(),
        }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Default output directory for formats that need one.
    pub fn out(&self) -> PathBuf {
        self.path().join("out")
    }

    /// Write the `.hal` source of a file, e.g. `test.foo@1.0::IFoo`.
    pub fn hal(&self, file: &str, source: &str) -> &Self {
        let path = self.roots().file_path(&fq(file)).unwrap();
        write(&path, source);
        self
    }

    /// Write an arbitrary file relative to the tree.
    pub fn write(&self, relative: &str, contents: &str) -> &Self {
        write(&self.path().join(relative), contents);
        self
    }

    pub fn read(&self, relative: &str) -> String {
        fs::read_to_string(self.path().join(relative)).unwrap()
    }

    pub fn exists(&self, relative: &str) -> bool {
        self.path().join(relative).exists()
    }

    pub fn roots(&self) -> PackageRootTable {
        let mut roots = PackageRootTable::new(self.path());
        roots.add("test", "src").unwrap();
        roots.add_defaults();
        roots
    }

    pub fn coordinator(&self) -> Coordinator {
        Coordinator::new(self.roots())
    }

    /// Options for `format` rooted at this tree with the test root.
    pub fn options(&self, format: &str) -> DriverOptions {
        DriverOptions::new(format)
            .root_path(self.path())
            .package_root(TEST_ROOT)
    }

    /// Like [`Tree::options`] with `-o <tmp>/out`.
    pub fn options_with_out(&self, format: &str) -> DriverOptions {
        self.options(format).output_path(self.out())
    }

    /// Run the driver, returning what it printed.
    pub fn run(&self, options: DriverOptions) -> Result<String, CompileError> {
        let mut driver = Driver::new(options)?;
        let mut stdout = Vec::new();
        driver.run(&mut stdout)?;
        Ok(String::from_utf8(stdout).unwrap())
    }

    /// Files below `relative`, as sorted `/`-separated relative paths.
    pub fn files_under(&self, relative: &str) -> Vec<String> {
        let base = self.path().join(relative);
        if !base.exists() {
            return Vec::new();
        }
        let mut files: Vec<String> = WalkDir::new(&base)
            .into_iter()
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.file_type().is_file())
            .map(|entry| {
                entry
                    .path()
                    .strip_prefix(&base)
                    .unwrap()
                    .to_string_lossy()
                    .replace('\\', "/")
            })
            .collect();
        files.sort();
        files
    }
}

fn write(path: &Path, contents: &str) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, contents).unwrap();
}

// ============================================================================
// SOURCES
// ============================================================================

pub const FOO_TYPES: &str = r#"
package test.foo@1.0;

@export(name="color_t", value_prefix="COLOR_")
enum Color : uint8_t {
    RED,
    GREEN = 3,
    BLUE,
};

struct Point {
    int32_t x;
    int32_t y;
};
"#;

pub const FOO_INTERFACE: &str = r#"
package test.foo@1.0;

interface IFoo {
    ping();
    oneway notify(Color color);
    move(Point from, int32_t dx) generates (bool ok, Point to);
    names() generates (vec<string> names);
};
"#;

/// A package with `types.hal` and `IFoo.hal`.
pub fn foo_package(tree: &Tree) {
    tree.hal("test.foo@1.0::types", FOO_TYPES)
        .hal("test.foo@1.0::IFoo", FOO_INTERFACE);
}
