//! Package-prefix to filesystem-root mapping.
//!
//! `-r android.hardware:hardware/interfaces` says that package
//! `android.hardware.foo@1.0` lives under
//! `<root path>/hardware/interfaces/foo/1.0/`. The most specific registered
//! prefix wins; prefixes only match on identifier boundaries.

use std::path::{Path, PathBuf};

use smol_str::SmolStr;

use crate::base::constants::DEFAULT_PACKAGE_ROOTS;
use crate::base::{FqName, FqNameError, is_identifier};
use crate::error::{CompileError, Result};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageRoot {
    prefix: Vec<SmolStr>,
    path: PathBuf,
}

impl PackageRoot {
    /// Dotted prefix, e.g. `android.hardware`.
    pub fn prefix(&self) -> String {
        self.prefix.join(".")
    }

    /// Root directory, relative to the table's root path unless absolute.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn covers(&self, package: &[SmolStr]) -> bool {
        package.len() >= self.prefix.len() && package[..self.prefix.len()] == self.prefix[..]
    }
}

#[derive(Debug, Clone)]
pub struct PackageRootTable {
    root_path: PathBuf,
    entries: Vec<PackageRoot>,
}

impl PackageRootTable {
    /// An empty table resolving roots against `root_path`.
    pub fn new(root_path: impl Into<PathBuf>) -> Self {
        Self {
            root_path: root_path.into(),
            entries: Vec::new(),
        }
    }

    /// A table holding only the default roots.
    pub fn with_defaults(root_path: impl Into<PathBuf>) -> Self {
        let mut table = Self::new(root_path);
        table.add_defaults();
        table
    }

    pub fn root_path(&self) -> &Path {
        &self.root_path
    }

    pub fn entries(&self) -> &[PackageRoot] {
        &self.entries
    }

    /// Register `prefix → path`. Registering a prefix twice is an error.
    pub fn add(&mut self, prefix: &str, path: impl Into<PathBuf>) -> Result<()> {
        let components: Vec<SmolStr> = prefix.split('.').map(SmolStr::new).collect();
        if components.iter().any(|c| !is_identifier(c)) {
            return Err(CompileError::InvalidFqName(FqNameError {
                input: prefix.to_string(),
                reason: "package root prefix must be a dotted identifier",
            }));
        }
        if self.entries.iter().any(|e| e.prefix == components) {
            return Err(CompileError::PackageRootConflict {
                prefix: prefix.to_string(),
            });
        }
        let path = path.into();
        tracing::debug!(prefix, path = %path.display(), "package root");
        self.entries.push(PackageRoot {
            prefix: components,
            path,
        });
        Ok(())
    }

    /// Add each default root whose prefix is not registered yet.
    pub fn add_defaults(&mut self) {
        for (prefix, path) in DEFAULT_PACKAGE_ROOTS {
            if !self.has_prefix(prefix) {
                // Defaults are valid dotted identifiers and not yet present.
                let _ = self.add(prefix, path);
            }
        }
    }

    pub fn has_prefix(&self, prefix: &str) -> bool {
        self.entries.iter().any(|e| e.prefix() == prefix)
    }

    /// The most specific root covering `fq_name`'s package.
    pub fn find(&self, fq_name: &FqName) -> Option<&PackageRoot> {
        self.entries
            .iter()
            .filter(|e| e.covers(fq_name.package()))
            .max_by_key(|e| e.prefix.len())
    }

    fn require(&self, fq_name: &FqName) -> Result<&PackageRoot> {
        self.find(fq_name)
            .ok_or_else(|| CompileError::UnknownPackageRoot(fq_name.package_and_version()))
    }

    /// Directory of the package root, e.g. `<root>/hardware/interfaces`.
    pub fn root_dir(&self, fq_name: &FqName) -> Result<PathBuf> {
        Ok(self.root_path.join(&self.require(fq_name)?.path))
    }

    /// Directory of the package version, e.g. `<root>/hardware/interfaces/foo/1.0`.
    pub fn package_dir(&self, fq_name: &FqName) -> Result<PathBuf> {
        let entry = self.require(fq_name)?;
        let mut dir = self.root_path.join(&entry.path);
        for component in &fq_name.package()[entry.prefix.len()..] {
            dir.push(component.as_str());
        }
        dir.push(fq_name.version_string());
        Ok(dir)
    }

    /// Source file of `pkg@M.m::Name`.
    pub fn file_path(&self, fq_name: &FqName) -> Result<PathBuf> {
        let mut path = self.package_dir(fq_name)?;
        path.push(format!(
            "{}.{}",
            fq_name.name().unwrap_or_default(),
            crate::base::constants::HAL_EXTENSION
        ));
        Ok(path)
    }

    /// Package path below its root, with trailing slash: `foo/1.0/` or,
    /// sanitized, `foo/V1_0/`.
    pub fn package_path(&self, fq_name: &FqName, sanitized: bool) -> Result<String> {
        let entry = self.require(fq_name)?;
        let mut out = String::new();
        for component in &fq_name.package()[entry.prefix.len()..] {
            out.push_str(component);
            out.push('/');
        }
        if sanitized {
            out.push_str(&fq_name.sanitized_version());
        } else {
            out.push_str(&fq_name.version_string());
        }
        out.push('/');
        Ok(out)
    }

    /// `prefix:root` as accepted by `-r`.
    pub fn root_option(&self, fq_name: &FqName) -> Result<String> {
        let entry = self.require(fq_name)?;
        Ok(format!("{}:{}", entry.prefix(), entry.path.display()))
    }

    /// The root prefix as a path: `android/hardware`.
    pub fn package_root_to_path(&self, fq_name: &FqName) -> Result<String> {
        Ok(self.require(fq_name)?.prefix.join("/"))
    }
}
